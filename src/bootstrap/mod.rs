//! Bootstrap layer: modules that run before any service starts.
//!
//! - **logger**: tracing-subscriber initialisation and component spans.

pub mod logger;
