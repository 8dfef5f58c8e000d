// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Probe metrics
    pub probes_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,

    // Service metrics
    pub service_health_status: IntGaugeVec,
    pub healthy_services: IntGauge,
    pub total_services: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probes_total = IntCounterVec::new(
            Opts::new("sb_probes_total", "Total number of health probes"),
            &["service", "outcome"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new("sb_probe_duration_seconds", "Health probe duration in seconds"),
            &["service"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let service_health_status = IntGaugeVec::new(
            Opts::new(
                "sb_service_health_status",
                "Service health status (1=healthy, 0=unhealthy)",
            ),
            &["service"],
        )?;
        registry.register(Box::new(service_health_status.clone()))?;

        let healthy_services =
            IntGauge::new("sb_healthy_services", "Number of healthy services")?;
        registry.register(Box::new(healthy_services.clone()))?;

        let total_services = IntGauge::new("sb_total_services", "Total number of services")?;
        registry.register(Box::new(total_services.clone()))?;

        Ok(Self {
            probes_total,
            probe_duration_seconds,
            service_health_status,
            healthy_services,
            total_services,
        })
    }

    pub fn record_probe(&self, service: &str, outcome: &str, duration: Duration) {
        self.probes_total
            .with_label_values(&[service, outcome])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[service])
            .observe(duration.as_secs_f64());
    }

    pub fn update_service_health(&self, service: &str, healthy: bool) {
        let value = if healthy { 1 } else { 0 };
        self.service_health_status
            .with_label_values(&[service])
            .set(value);
    }

    pub fn update_service_counts(&self, healthy: usize, total: usize) {
        self.healthy_services.set(healthy as i64);
        self.total_services.set(total as i64);
    }
}
