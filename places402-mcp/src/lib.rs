#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! MCP server for the x402 Places API.
//!
//! Three tools are exposed to an MCP host over stdio: `search_places`,
//! `get_service_info` and `check_health`. Searches are paid automatically
//! with x402 micropayments when a wallet key is configured; without one the
//! server answers searches with demo data.
//!
//! # Architecture
//!
//! - [`capability`] decides once, at startup, whether payments are possible
//!   and builds the matching [`backend::HttpBackend`].
//! - [`dispatch::Dispatcher`] validates arguments and routes each call to the
//!   paid path, the demo path, or the free info endpoints.
//! - [`classify`] turns backend failures into outcomes, and [`format`]
//!   renders every outcome into one [`types::ResponseEnvelope`].
//! - [`server::PlacesServer`] adapts the dispatcher to [`rmcp`].
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use places402_mcp::{config::Settings, dispatch::Dispatcher};
//!
//! let settings = Settings::new("https://places-api.x402hub.xyz")?
//!     .with_credential(std::env::var("PRIVATE_KEY").ok());
//! let dispatcher = Dispatcher::from_settings(settings)?;
//! let envelope = dispatcher.invoke("search_places", &arguments).await;
//! ```

pub mod backend;
pub mod capability;
pub mod classify;
pub mod config;
pub mod demo;
pub mod dispatch;
pub mod format;
pub mod payload;
pub mod server;
pub mod tools;
pub mod types;

pub use backend::{Backend, BackendError, HttpBackend};
pub use capability::{Capability, PaymentMode};
pub use config::{ConfigError, Settings};
pub use dispatch::Dispatcher;
pub use server::PlacesServer;
pub use types::{Outcome, ResponseEnvelope};
