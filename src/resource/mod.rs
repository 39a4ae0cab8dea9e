//! Resource abstraction layer
//!
//! Declared resources, the per-kind handlers that map them onto Grafana,
//! and the registry the reconciliation driver looks handlers up in.
//!
//! # Architecture
//!
//! - [`model`] - The declared resource type
//! - [`handler`] - `Handler`, `Provider` and `ClientProvider` traits
//! - [`library_panel`] - Handler for Grafana library panels
//! - [`registry`] - Handlers keyed by kind
//! - [`manifest`] - JSON/YAML resource files
//!
//! # Example
//!
//! ```ignore
//! use dashcode::resource::Registry;
//!
//! async fn list_panels(registry: &Registry) -> dashcode::Result<Vec<String>> {
//!     let handler = registry.handler("LibraryPanel")?;
//!     handler.list_remote().await
//! }
//! ```

pub mod handler;
pub mod library_panel;
pub mod manifest;
pub mod model;
mod registry;

pub use handler::{ClientProvider, Handler, Provider};
pub use library_panel::LibraryPanelHandler;
pub use manifest::Format;
pub use model::{Metadata, Resource, API_VERSION};
pub use registry::Registry;
