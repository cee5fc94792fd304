// Library root: the binary entry point is src/main.rs.
// Exposes internals for integration tests.

pub mod bootstrap;
pub mod core;
pub mod subsystems;
pub mod supervisor;

pub use bootstrap::logger;
pub use self::core::{config, error, profile};
