//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `EDGE_WORK_DIR`, `EDGE_LOG_LEVEL` and `EDGE_PROFILE` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::profile::Profile;

use super::raw::RawConfig;
use super::types::*;

/// Values that replace what the config file says. Read from the environment
/// by [`load`]; tests build them directly instead of mutating env vars.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub profile: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            work_dir: env::var("EDGE_WORK_DIR").ok(),
            log_level: env::var("EDGE_LOG_LEVEL").ok(),
            profile: env::var("EDGE_PROFILE").ok(),
        }
    }
}

/// Deep-merge two TOML values.
/// Tables are merged recursively; for every other type the overlay value
/// replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow its `[meta] base` chain and return the merged
/// value. `visited` holds canonical paths already seen so cycles fail fast.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let base = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
        .map(str::to_owned);

    match base {
        Some(base_str) => {
            let base_path = if Path::new(&base_str).is_absolute() {
                PathBuf::from(base_str)
            } else {
                path.parent().unwrap_or(Path::new(".")).join(base_str)
            };
            let base_val = load_raw_merged(&base_path, visited)?;
            Ok(merge_toml(base_val, overlay_val))
        }
        None => Ok(overlay_val),
    }
}

/// Load config from the given path, or `config/default.toml`, then apply
/// env-var overrides. Without an explicit path and without
/// `config/default.toml`, the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = Overrides::from_env();

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        load_defaults(&overrides)
    }
}

/// Built-in configuration: every field at its serde default.
pub fn load_defaults(overrides: &Overrides) -> Result<Config, AppError> {
    let empty = toml::Value::Table(toml::map::Map::new());
    let parsed: RawConfig = Deserialize::deserialize(empty)
        .map_err(|e: toml::de::Error| AppError::Config(format!("built-in defaults: {e}")))?;
    resolve(parsed, overrides)
}

/// Load a config file (following `[meta] base` chains) and apply `overrides`.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &Overrides) -> Result<Config, AppError> {
    let a = parsed.appliance;

    let work_dir = expand_home(overrides.work_dir.as_deref().unwrap_or(&a.work_dir));
    let log_level = overrides.log_level.clone().unwrap_or(a.log_level);

    let profile = overrides
        .profile
        .as_deref()
        .or(a.profile.as_deref())
        .map(str::parse::<Profile>)
        .transpose()?;

    if a.heartbeat_secs == 0 {
        return Err(AppError::Config(
            "appliance.heartbeat_secs must be at least 1".into(),
        ));
    }

    let log_file = a
        .log_file
        .filter(|f| !f.trim().is_empty())
        .map(|f| relative_to(&work_dir, &f));

    let s = parsed.services;
    let services = ServicesConfig {
        heartbeat: Duration::from_secs(a.heartbeat_secs),
        ela: ElaConfig {
            endpoint: s.ela.endpoint,
        },
        eva: EvaConfig {
            endpoint: s.eva.endpoint,
            app_image_dir: relative_to(&work_dir, &s.eva.app_image_dir),
        },
        eda: EdaConfig {
            endpoint: s.eda.endpoint,
            dataplane_socket: s.eda.dataplane_socket,
        },
    };

    Ok(Config {
        work_dir,
        log_level,
        log_file,
        profile,
        shutdown_grace: Duration::from_millis(a.shutdown_grace_ms),
        services,
    })
}

/// Resolve `path` against `base` unless it is already absolute. `~` is expanded.
fn relative_to(base: &Path, path: &str) -> PathBuf {
    let p = expand_home(path);
    if p.is_absolute() { p } else { base.join(p) }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
