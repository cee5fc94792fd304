//! Service registry: which services a profile starts, and in what order.
//!
//! The registry is plain data: building a list resolves names to start
//! functions and never calls them.

use std::fmt;

use crate::error::AppError;
use crate::profile::Profile;
use crate::subsystems::runtime::StartFunction;

/// A named start function.
#[derive(Clone, Copy)]
pub struct ServiceEntry {
    pub name: &'static str,
    pub start: StartFunction,
}

impl ServiceEntry {
    pub const fn new(name: &'static str, start: StartFunction) -> Self {
        Self { name, start }
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Services compiled into this binary.
pub fn compiled() -> Vec<ServiceEntry> {
    #[allow(unused_mut)]
    let mut entries = Vec::new();

    #[cfg(feature = "service-ela")]
    entries.push(ServiceEntry::new(
        crate::subsystems::ela::NAME,
        crate::subsystems::ela::run,
    ));

    #[cfg(feature = "service-eva")]
    entries.push(ServiceEntry::new(
        crate::subsystems::eva::NAME,
        crate::subsystems::eva::run,
    ));

    #[cfg(feature = "service-eda")]
    entries.push(ServiceEntry::new(
        crate::subsystems::eda::NAME,
        crate::subsystems::eda::run,
    ));

    entries
}

/// Look up a compiled service by name.
pub fn lookup(name: &str) -> Option<ServiceEntry> {
    compiled().into_iter().find(|e| e.name == name)
}

/// Ordered service list for `profile`.
///
/// Fails if the profile names a service that was left out of this build.
pub fn services_for(profile: Profile) -> Result<Vec<ServiceEntry>, AppError> {
    profile
        .service_names()
        .iter()
        .map(|name| {
            lookup(name).ok_or_else(|| AppError::ServiceUnavailable {
                service: (*name).to_string(),
                profile: profile.to_string(),
            })
        })
        .collect()
}
