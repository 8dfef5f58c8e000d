// src/health/mod.rs
mod board;
mod checker;
mod probe;
mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use board::StatusBoard;
pub use checker::{classify, StatusAggregator};
pub use probe::{extract_status, HealthProbe, HttpProbe, ProbeError, MAX_BODY_BYTES};
pub use status::{HealthState, ServiceDescriptor, ServiceStatus};
