//! Application-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    /// The profile names a service whose code was left out of this build.
    #[error("service '{service}' required by profile '{profile}' is not compiled in")]
    ServiceUnavailable { service: String, profile: String },

    #[error("service '{service}' failed: {message}")]
    Service { service: String, message: String },

    #[error("service task panicked: {0}")]
    ServicePanicked(String),

    #[error("services did not stop within the grace period: {}", .0.join(", "))]
    ShutdownTimeout(Vec<String>),
}

impl AppError {
    /// Shorthand for a failure reported by a running service.
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            service: service.into(),
            message: message.into(),
        }
    }
}
