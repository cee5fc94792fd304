//! Edge Dataplane Agent.
//!
//! Bridges the node to its traffic-steering dataplane. Only started under the
//! `nts` profile.

use serde_json::json;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::runtime::{self, ServiceContext, ServiceFuture};

pub const NAME: &str = "eda";

/// Start function registered for `eda`.
pub fn run(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(serve(ctx))
}

async fn serve(ctx: ServiceContext) -> Result<(), AppError> {
    let cfg = &ctx.config.eda;
    let endpoint = runtime::parse_endpoint(&ctx, &cfg.endpoint)?;
    if cfg.dataplane_socket.trim().is_empty() {
        return Err(ctx.fail("dataplane_socket must not be empty"));
    }

    info!(%endpoint, dataplane_socket = %cfg.dataplane_socket, "dataplane agent running");
    ctx.health
        .set_running_with(
            "serving",
            Some(json!({
                "endpoint": endpoint.to_string(),
                "dataplane_socket": cfg.dataplane_socket,
            })),
        )
        .await;

    runtime::run_until_shutdown(&ctx).await;

    ctx.health.set_stopped().await;
    Ok(())
}
