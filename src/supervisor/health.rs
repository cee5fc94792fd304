//! Health registry: push-based service state.
//!
//! Each running service holds a [`HealthReporter`] and writes its state when
//! it changes (start, heartbeat, stop, failure). The supervisor writes the
//! terminal states it observes from the outside (failed, aborted). The
//! [`HealthRegistry`] keeps the last state per service and hands out sorted
//! snapshots without touching the services.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

// ── ServiceState ──────────────────────────────────────────────────────────────

/// Lifecycle state of a single service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Starting,
    Running,
    Stopped,
    Failed,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
            ServiceState::Failed => "failed",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ServiceHealth ─────────────────────────────────────────────────────────────

/// Health snapshot for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Service name (`"ela"`, `"eva"`, `"eda"`).
    pub id: String,
    pub state: ServiceState,
    /// Human-readable status message.
    pub message: String,
    /// Optional structured extra fields (endpoint, paths, …).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// RFC 3339 timestamp of the write.
    pub updated_at: String,
}

impl ServiceHealth {
    fn new(id: &str, state: ServiceState, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            state,
            message: message.into(),
            details: None,
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Only a running service counts as healthy.
    pub fn is_healthy(&self) -> bool {
        self.state == ServiceState::Running
    }
}

// ── HealthRegistry ────────────────────────────────────────────────────────────

/// Shared registry of per-service health states. Cheap to clone.
#[derive(Clone, Default)]
pub struct HealthRegistry {
    inner: Arc<RwLock<HashMap<String, ServiceHealth>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reporter handle writing under `id`.
    pub fn reporter(&self, id: impl Into<String>) -> HealthReporter {
        HealthReporter {
            id: id.into(),
            registry: self.clone(),
        }
    }

    /// Snapshot all current states, sorted by id.
    pub async fn snapshot(&self) -> Vec<ServiceHealth> {
        let map = self.inner.read().await;
        let mut v: Vec<_> = map.values().cloned().collect();
        v.sort_by(|a, b| a.id.cmp(&b.id));
        v
    }

    pub async fn get(&self, id: &str) -> Option<ServiceHealth> {
        self.inner.read().await.get(id).cloned()
    }

    /// `true` if every registered service is running, or none is registered.
    pub async fn all_healthy(&self) -> bool {
        self.inner.read().await.values().all(ServiceHealth::is_healthy)
    }
}

// ── HealthReporter ────────────────────────────────────────────────────────────

/// Per-service write handle into the [`HealthRegistry`].
#[derive(Clone)]
pub struct HealthReporter {
    id: String,
    registry: HealthRegistry,
}

impl HealthReporter {
    pub async fn set_starting(&self) {
        self.write(ServiceHealth::new(&self.id, ServiceState::Starting, "starting"))
            .await;
    }

    pub async fn set_running(&self) {
        self.set_running_with("ok", None).await;
    }

    /// Mark running with a custom message and optional structured details.
    pub async fn set_running_with(
        &self,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let mut h = ServiceHealth::new(&self.id, ServiceState::Running, message);
        h.details = details;
        self.write(h).await;
    }

    /// Refresh the timestamp of the current state, keeping message and details.
    pub async fn touch(&self) {
        let mut map = self.registry.inner.write().await;
        if let Some(h) = map.get_mut(&self.id) {
            h.updated_at = chrono::Utc::now().to_rfc3339();
        }
    }

    pub async fn set_stopped(&self) {
        self.write(ServiceHealth::new(&self.id, ServiceState::Stopped, "stopped"))
            .await;
    }

    pub async fn set_failed(&self, message: impl Into<String>) {
        self.write(ServiceHealth::new(&self.id, ServiceState::Failed, message))
            .await;
    }

    /// Current state of this service, `None` before the first write.
    pub async fn get_current(&self) -> Option<ServiceHealth> {
        self.registry.get(&self.id).await
    }

    async fn write(&self, h: ServiceHealth) {
        self.registry.inner.write().await.insert(self.id.clone(), h);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
