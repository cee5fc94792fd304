//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that the supervisor and the
//! services consume. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;
use std::time::Duration;

use crate::profile::Profile;

// ── Services ─────────────────────────────────────────────────────────────────

/// Edge Lifecycle Agent configuration (`[services.ela]`).
#[derive(Debug, Clone)]
pub struct ElaConfig {
    /// Socket address the agent serves on.
    pub endpoint: String,
}

/// Edge Virtualization Agent configuration (`[services.eva]`).
#[derive(Debug, Clone)]
pub struct EvaConfig {
    /// Socket address the agent serves on.
    pub endpoint: String,
    /// Directory holding application images, already resolved against `work_dir`.
    pub app_image_dir: PathBuf,
}

/// Edge Dataplane Agent configuration (`[services.eda]`).
#[derive(Debug, Clone)]
pub struct EdaConfig {
    /// Socket address the agent serves on.
    pub endpoint: String,
    /// Control socket of the dataplane.
    pub dataplane_socket: String,
}

/// Per-service configuration shared with every running service.
#[derive(Debug, Clone)]
pub struct ServicesConfig {
    /// Interval between service heartbeats.
    pub heartbeat: Duration,
    pub ela: ElaConfig,
    pub eva: EvaConfig,
    pub eda: EdaConfig,
}

// ── Config (root) ────────────────────────────────────────────────────────────

/// Fully-resolved appliance configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Optional log file (absolute, or resolved against `work_dir`).
    pub log_file: Option<PathBuf>,
    /// Profile from env or file; `None` means the compiled default applies.
    pub profile: Option<Profile>,
    /// How long services get to stop after shutdown is requested.
    pub shutdown_grace: Duration,
    pub services: ServicesConfig,
}

impl Config {
    /// The profile to run, with `cli` taking precedence over config.
    pub fn effective_profile(&self, cli: Option<Profile>) -> Profile {
        cli.or(self.profile).unwrap_or_else(Profile::compiled_default)
    }
}
