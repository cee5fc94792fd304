//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `EDGE_WORK_DIR`,
//! `EDGE_LOG_LEVEL` and `EDGE_PROFILE` env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs (`Config`, `ServicesConfig`, …).
//! - **raw**: Raw TOML deserialization types; kept private.
//! - **load**: `merge_toml`, `load`, `load_from`, `load_defaults`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{Overrides, expand_home, load, load_defaults, load_from};
pub use types::*;

impl Config {
    /// Config for unit tests: everything under `work_dir`, short timings.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            log_file: None,
            profile: None,
            shutdown_grace: std::time::Duration::from_millis(200),
            services: ServicesConfig {
                heartbeat: std::time::Duration::from_secs(1),
                ela: ElaConfig {
                    endpoint: "127.0.0.1:42101".into(),
                },
                eva: EvaConfig {
                    endpoint: "127.0.0.1:42102".into(),
                    app_image_dir: work_dir.join(raw::default_app_image_dir()),
                },
                eda: EdaConfig {
                    endpoint: "127.0.0.1:42103".into(),
                    dataplane_socket: work_dir.join("dataplane.sock").display().to_string(),
                },
            },
        }
    }
}
