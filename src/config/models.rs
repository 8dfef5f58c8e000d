// src/config/models.rs
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::health::ServiceDescriptor;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub probe_url: Url,
    pub healthy_value: String,
    #[serde(default = "default_status_field")]
    pub status_field: String,
    #[serde(default)]
    pub docs_url: Option<Url>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// 0 disables the background refresh loop.
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

const MAX_TIMEOUT_SECS: u64 = 60;

fn default_status_field() -> String {
    "status".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_title() -> String {
    "Service Status".to_string()
}

fn default_dashboard_port() -> u16 {
    3000
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            refresh_interval_secs: 0,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            port: default_dashboard_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

impl From<&ServiceConfig> for ServiceDescriptor {
    fn from(cfg: &ServiceConfig) -> Self {
        ServiceDescriptor {
            name: cfg.name.clone(),
            probe_url: cfg.probe_url.clone(),
            healthy_value: cfg.healthy_value.clone(),
            status_field: cfg.status_field.clone(),
            docs_url: cfg.docs_url.clone(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.services.is_empty() {
            bail!("At least one service must be configured");
        }

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                bail!("Service name must not be empty");
            }
            if !seen.insert(service.name.as_str()) {
                bail!("Duplicate service name: {}", service.name);
            }
            if service.healthy_value.is_empty() {
                bail!("Service {}: healthy_value must not be empty", service.name);
            }
            if service.status_field.is_empty() {
                bail!("Service {}: status_field must not be empty", service.name);
            }
            match service.probe_url.scheme() {
                "http" | "https" => {}
                other => bail!(
                    "Service {}: unsupported probe URL scheme '{}'",
                    service.name,
                    other
                ),
            }
        }

        if self.probe.timeout_secs == 0 || self.probe.timeout_secs > MAX_TIMEOUT_SECS {
            bail!(
                "probe.timeout_secs must be between 1 and {}, got {}",
                MAX_TIMEOUT_SECS,
                self.probe.timeout_secs
            );
        }

        if self.metrics.enabled {
            if self.metrics.port == self.dashboard.port {
                bail!("metrics.port and dashboard.port must differ");
            }
            if !self.metrics.path.starts_with('/') {
                bail!("metrics.path must start with '/'");
            }
        }

        Ok(())
    }

    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        self.services.iter().map(ServiceDescriptor::from).collect()
    }
}
