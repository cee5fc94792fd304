//! Service runtime: the start contract shared by every edge service.
//!
//! # Start capability
//!
//! A service is started through a [`StartFunction`]: a plain function that
//! takes the service's [`ServiceContext`] and returns its run future. Calling
//! the function only builds the future; nothing happens until the supervisor
//! spawns and polls it. The future runs until the service's work is done or
//! the shared shutdown token is cancelled, and reports the outcome as a
//! `Result`.
//!
//! # Heartbeat loop
//!
//! Services without a work loop of their own park in [`run_until_shutdown`],
//! which refreshes their health entry on every heartbeat tick.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ServicesConfig;
use crate::error::AppError;
use crate::supervisor::health::HealthReporter;

/// A boxed, owned future returned by a [`StartFunction`].
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// Entry point of a service.
pub type StartFunction = fn(ServiceContext) -> ServiceFuture;

/// Everything a service receives from the supervisor when it starts.
#[derive(Clone)]
pub struct ServiceContext {
    /// Name of the service being started.
    pub name: &'static str,
    /// Shared shutdown token. Cancelled on signal or when a sibling fails.
    pub shutdown: CancellationToken,
    /// Resolved configuration for all services.
    pub config: Arc<ServicesConfig>,
    /// Health handle writing under `name`.
    pub health: HealthReporter,
}

impl ServiceContext {
    /// Failure attributed to this service.
    pub fn fail(&self, message: impl Into<String>) -> AppError {
        AppError::service(self.name, message)
    }
}

/// Park until `ctx.shutdown` is cancelled, touching health every
/// `ctx.config.heartbeat`.
pub async fn run_until_shutdown(ctx: &ServiceContext) {
    let mut ticker = tokio::time::interval(ctx.config.heartbeat.max(Duration::from_millis(1)));
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;

            _ = ctx.shutdown.cancelled() => {
                info!("shutdown requested, stopping");
                break;
            }

            _ = ticker.tick() => {
                debug!("heartbeat");
                ctx.health.touch().await;
            }
        }
    }
}

/// Check that `endpoint` is a `host:port` socket address.
pub fn parse_endpoint(ctx: &ServiceContext, endpoint: &str) -> Result<std::net::SocketAddr, AppError> {
    endpoint
        .parse()
        .map_err(|e| ctx.fail(format!("invalid endpoint '{endpoint}': {e}")))
}
