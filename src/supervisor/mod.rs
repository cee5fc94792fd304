//! Supervisor: starts the profile's services and watches them until they stop.
//!
//! Every [`ServiceEntry`] is spawned as its own Tokio task, in list order, and
//! all of them share one [`CancellationToken`]. List order is spawn order
//! only; services do not wait for one another.
//!
//! Behaviour:
//! - A service that returns `Err` (or panics) cancels the token so its
//!   siblings stop; the first such error is returned once every task exits.
//! - A service that returns `Ok` is recorded as stopped; siblings keep running.
//! - Once the token is cancelled, services get `grace` to exit. Anything
//!   still running after that is aborted.

pub mod health;
pub mod registry;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::ServicesConfig;
use crate::error::AppError;
use crate::logger;
use crate::subsystems::runtime::ServiceContext;

use health::{HealthRegistry, ServiceState};
use registry::ServiceEntry;

/// Run `services` until all of them have exited.
pub async fn run(
    services: Vec<ServiceEntry>,
    config: Arc<ServicesConfig>,
    health: HealthRegistry,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<(), AppError> {
    if services.is_empty() {
        warn!("no services to run");
        return Ok(());
    }

    info!(
        services = ?services.iter().map(|s| s.name).collect::<Vec<_>>(),
        "starting services"
    );

    let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();
    // Task id to service name, so panics and aborts can be attributed.
    let mut names: HashMap<task::Id, &'static str> = HashMap::with_capacity(services.len());
    // Names of services that have not reported back yet.
    let mut pending: Vec<&'static str> = Vec::with_capacity(services.len());

    for entry in services {
        let reporter = health.reporter(entry.name);
        reporter.set_starting().await;

        let ctx = ServiceContext {
            name: entry.name,
            shutdown: shutdown.clone(),
            config: config.clone(),
            health: reporter,
        };
        let fut = (entry.start)(ctx);
        debug!(service = entry.name, "spawning service");
        let handle = set.spawn(fut.instrument(logger::component(entry.name)));
        names.insert(handle.id(), entry.name);
        pending.push(entry.name);
    }

    let grace_token = shutdown.clone();
    let grace_timer = async move {
        grace_token.cancelled().await;
        tokio::time::sleep(grace).await;
    };
    tokio::pin!(grace_timer);

    let mut first_err: Option<AppError> = None;
    let mut aborted: Vec<&'static str> = Vec::new();
    let mut grace_expired = false;

    loop {
        tokio::select! {
            res = set.join_next_with_id() => {
                let Some(res) = res else { break };
                let id = match &res {
                    Ok((id, _)) => *id,
                    Err(e) => e.id(),
                };
                let name = names.get(&id).copied().unwrap_or("unknown");
                pending.retain(|n| *n != name);

                match res {
                    Ok((_, Ok(()))) => {
                        aborted.retain(|n| *n != name);
                        info!(service = name, "service exited");
                        // A service that returns without writing a terminal state is stopped.
                        let reporter = health.reporter(name);
                        let terminal = reporter.get_current().await.is_some_and(|h| {
                            matches!(h.state, ServiceState::Stopped | ServiceState::Failed)
                        });
                        if !terminal {
                            reporter.set_stopped().await;
                        }
                    }
                    Ok((_, Err(e))) => {
                        aborted.retain(|n| *n != name);
                        error!(service = name, "service failed: {e}");
                        health.reporter(name).set_failed(e.to_string()).await;
                        shutdown.cancel();
                        first_err.get_or_insert(e);
                    }
                    Err(e) if e.is_cancelled() => {
                        // Aborted after the grace period; recorded below.
                    }
                    Err(e) => {
                        aborted.retain(|n| *n != name);
                        error!(service = name, "service panicked: {e}");
                        health.reporter(name).set_failed("panicked").await;
                        shutdown.cancel();
                        first_err.get_or_insert_with(|| {
                            AppError::ServicePanicked(format!("{name}: {e}"))
                        });
                    }
                }
            }

            _ = &mut grace_timer, if !grace_expired => {
                grace_expired = true;
                aborted = pending.clone();
                warn!(services = ?aborted, ?grace, "grace period elapsed, aborting services");
                set.abort_all();
            }
        }
    }

    for name in &aborted {
        health.reporter(*name).set_failed("aborted after shutdown grace period").await;
    }

    match first_err {
        Some(e) => Err(e),
        None if !aborted.is_empty() => Err(AppError::ShutdownTimeout(
            aborted.iter().map(|n| n.to_string()).collect(),
        )),
        None => {
            info!("all services stopped");
            Ok(())
        }
    }
}
