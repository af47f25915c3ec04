//! Monitoring SDK Observability Module
//!
//! Structured logging for the monitoring SDK and the programs embedding it.
//!
//! # Features
//!
//! - **Multiple Output Formats**: Pretty, JSON, and compact output formats
//! - **Environment-based Filtering**: Dynamic log level control via `RUST_LOG`
//!
//! # Example
//!
//! ```ignore
//! use monitoring_observability::{init_tracing, LogFormat};
//!
//! fn main() {
//!     init_tracing(LogFormat::Compact, Some("debug")).unwrap();
//!     tracing::info!("exporter started");
//! }
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
