//! dashcode - Grafana resources as code
//!
//! Reconciles declared Grafana library panels, stored as JSON or YAML files,
//! against a Grafana instance's HTTP API.

pub mod config;
pub mod error;
pub mod grafana;
pub mod provider;
pub mod reconcile;
pub mod resource;

pub use error::{Error, Result};
