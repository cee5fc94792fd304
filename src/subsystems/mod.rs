//! Edge services started by the supervisor.

#[cfg(feature = "service-eda")]
pub mod eda;
#[cfg(feature = "service-ela")]
pub mod ela;
#[cfg(feature = "service-eva")]
pub mod eva;
pub mod runtime;
