// src/health/status.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Static description of one monitored service and its healthy-value contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: String,
    pub probe_url: Url,
    /// Exact, case-sensitive value of `status_field` that counts as healthy.
    pub healthy_value: String,
    pub status_field: String,
    pub docs_url: Option<Url>,
}

impl ServiceDescriptor {
    pub fn new(name: impl Into<String>, probe_url: Url, healthy_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            probe_url,
            healthy_value: healthy_value.into(),
            status_field: "status".to_string(),
            docs_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthState {
    Unknown,
    Healthy,
    Unhealthy,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthState::Unknown => "Unknown",
            HealthState::Healthy => "Healthy",
            HealthState::Unhealthy => "Unhealthy",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub service_name: String,
    pub state: HealthState,
    /// Last value observed in the status field; empty when the probe failed.
    pub raw_value: String,
    pub checked_at: Option<DateTime<Utc>>,
    pub response_time_ms: Option<u64>,
}

impl ServiceStatus {
    pub fn unknown(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            state: HealthState::Unknown,
            raw_value: String::new(),
            checked_at: None,
            response_time_ms: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.state == HealthState::Healthy
    }

    /// Text shown to the user. Failures and unhealthy reports are not told apart
    /// beyond whatever raw value the service sent back.
    pub fn label(&self) -> &str {
        match self.state {
            HealthState::Unknown => "Checking...",
            _ if self.raw_value.is_empty() => "Offline",
            _ => self.raw_value.as_str(),
        }
    }
}
