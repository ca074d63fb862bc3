//! # Observability Module
//!
//! Structured logging for the Snowball node, as JSON for log aggregation or
//! pretty-printed for development.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use snowball_node::observability::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::parse("json"));
//! ```

mod logging;

pub use logging::{init_logging, LogFormat};
