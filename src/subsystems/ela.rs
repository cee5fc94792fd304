//! Edge Lifecycle Agent.
//!
//! Owns the node's lifecycle endpoint. Only the start contract lives here:
//! validate the endpoint, report running, heartbeat until shutdown.

use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::runtime::{self, ServiceContext, ServiceFuture};

pub const NAME: &str = "ela";

/// Start function registered for `ela`.
pub fn run(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(serve(ctx))
}

async fn serve(ctx: ServiceContext) -> Result<(), AppError> {
    let cfg = &ctx.config.ela;
    let endpoint = runtime::parse_endpoint(&ctx, &cfg.endpoint)?;

    info!(%endpoint, "lifecycle agent running");
    ctx.health
        .set_running_with("serving", Some(json!({ "endpoint": endpoint.to_string() })))
        .await;

    runtime::run_until_shutdown(&ctx).await;

    ctx.health.set_stopped().await;
    Ok(())
}
