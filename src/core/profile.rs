//! Deployment profiles.
//!
//! A profile decides which services the appliance starts. Exactly one profile
//! is active per process; it is resolved once at startup from the CLI, the
//! environment, or the config file, falling back to [`Profile::compiled_default`].

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Deployment profile of the edge node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Container-network-interface deployment.
    Cni,
    /// Network-traffic-shaping deployment (adds the dataplane agent).
    Nts,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Cni, Profile::Nts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Cni => "cni",
            Profile::Nts => "nts",
        }
    }

    /// Ordered service names started under this profile.
    pub fn service_names(&self) -> &'static [&'static str] {
        match self {
            Profile::Cni => &["eva", "ela"],
            Profile::Nts => &["ela", "eva", "eda"],
        }
    }

    /// Profile used when nothing else selects one.
    ///
    /// `cni` only when it is the sole profile feature; `nts` otherwise.
    pub fn compiled_default() -> Self {
        if cfg!(feature = "cni") && !cfg!(feature = "nts") {
            Profile::Cni
        } else {
            Profile::Nts
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cni" => Ok(Profile::Cni),
            "nts" => Ok(Profile::Nts),
            other => Err(AppError::Config(format!(
                "unknown profile '{other}' (expected one of: cni, nts)"
            ))),
        }
    }
}
