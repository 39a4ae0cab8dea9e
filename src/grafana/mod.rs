//! Grafana API interaction module
//!
//! This module provides the core functionality for talking to a Grafana
//! instance: authentication, the HTTP client and the library element bindings.
//!
//! # Module Structure
//!
//! - [`auth`] - Token and basic-auth credentials
//! - [`client`] - Main Grafana client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//! - [`library_elements`] - Typed `/api/library-elements` bindings
//!
//! # Example
//!
//! ```ignore
//! use dashcode::grafana::{auth::Credentials, client::GrafanaClient, library_elements};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GrafanaClient::new("http://localhost:3000", Credentials::Anonymous, timeout)?;
//!     let panels = library_elements::list(&client).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
pub mod library_elements;
