//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape: serde target before resolution.
#[derive(Deserialize)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub appliance: RawAppliance,
    #[serde(default)]
    pub services: RawServices,
}

#[derive(Deserialize)]
pub(super) struct RawAppliance {
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl Default for RawAppliance {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            log_file: None,
            profile: None,
            shutdown_grace_ms: default_shutdown_grace_ms(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

// ── Services ─────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawServices {
    #[serde(default)]
    pub ela: RawEla,
    #[serde(default)]
    pub eva: RawEva,
    #[serde(default)]
    pub eda: RawEda,
}

#[derive(Deserialize)]
pub(super) struct RawEla {
    #[serde(default = "default_ela_endpoint")]
    pub endpoint: String,
}

impl Default for RawEla {
    fn default() -> Self {
        Self { endpoint: default_ela_endpoint() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawEva {
    #[serde(default = "default_eva_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_app_image_dir")]
    pub app_image_dir: String,
}

impl Default for RawEva {
    fn default() -> Self {
        Self {
            endpoint: default_eva_endpoint(),
            app_image_dir: default_app_image_dir(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawEda {
    #[serde(default = "default_eda_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_dataplane_socket")]
    pub dataplane_socket: String,
}

impl Default for RawEda {
    fn default() -> Self {
        Self {
            endpoint: default_eda_endpoint(),
            dataplane_socket: default_dataplane_socket(),
        }
    }
}

// ── Default functions (used by serde) ────────────────────────────────────────

pub(super) fn default_work_dir() -> String {
    "~/.edge-appliance".to_string()
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_shutdown_grace_ms() -> u64 {
    5_000
}

pub(super) fn default_heartbeat_secs() -> u64 {
    30
}

pub(super) fn default_ela_endpoint() -> String {
    "0.0.0.0:42101".to_string()
}

pub(super) fn default_eva_endpoint() -> String {
    "0.0.0.0:42102".to_string()
}

pub(super) fn default_app_image_dir() -> String {
    "images".to_string()
}

pub(super) fn default_eda_endpoint() -> String {
    "0.0.0.0:42103".to_string()
}

pub(super) fn default_dataplane_socket() -> String {
    "/var/run/eda/dataplane.sock".to_string()
}
