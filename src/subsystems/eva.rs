//! Edge Virtualization Agent.
//!
//! Deploys applications onto the node. At start it makes sure the
//! application image directory exists, then serves until shutdown.

use serde_json::json;
use tracing::{debug, info};

use crate::error::AppError;
use crate::subsystems::runtime::{self, ServiceContext, ServiceFuture};

pub const NAME: &str = "eva";

/// Start function registered for `eva`.
pub fn run(ctx: ServiceContext) -> ServiceFuture {
    Box::pin(serve(ctx))
}

async fn serve(ctx: ServiceContext) -> Result<(), AppError> {
    let cfg = &ctx.config.eva;
    let endpoint = runtime::parse_endpoint(&ctx, &cfg.endpoint)?;

    tokio::fs::create_dir_all(&cfg.app_image_dir).await.map_err(|e| {
        ctx.fail(format!(
            "cannot create image dir '{}': {e}",
            cfg.app_image_dir.display()
        ))
    })?;
    debug!(image_dir = %cfg.app_image_dir.display(), "image dir ready");

    info!(%endpoint, "virtualization agent running");
    ctx.health
        .set_running_with(
            "serving",
            Some(json!({
                "endpoint": endpoint.to_string(),
                "app_image_dir": cfg.app_image_dir.display().to_string(),
            })),
        )
        .await;

    runtime::run_until_shutdown(&ctx).await;

    ctx.health.set_stopped().await;
    Ok(())
}
