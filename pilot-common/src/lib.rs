//! Common utilities shared across pilot crates.
//!
//! Right now this is the process-wide logging setup. Everything here is
//! dependency-light so the driver, config and binary crates can all pull it
//! in without dragging a browser client along.
//!
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`LogFormat`]: text or JSON log encoding, deserializable from config
//!
//! # Examples
//!
//! ```rust
//! use pilot_common::observability::LogConfig;
//! use pilot_common::LogFormat;
//!
//! let cfg = LogConfig {
//!     format: LogFormat::Json,
//!     ..LogConfig::default()
//! };
//! assert_eq!(cfg.app_name, "pilot");
//! assert_eq!(cfg.default_filter, "info");
//! ```
pub mod observability;

pub use observability::LogFormat;
