// src/health/checker.rs
use super::probe::{HealthProbe, ProbeError};
use super::{HealthState, ServiceDescriptor, ServiceStatus};
use crate::metrics::MetricsCollector;
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Runs probes and reduces each outcome to a `ServiceStatus`.
///
/// Probe failures never escape: every error is folded into an `Unhealthy`
/// status for that one service.
pub struct StatusAggregator {
    probe: Arc<dyn HealthProbe>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StatusAggregator {
    pub fn new(probe: Arc<dyn HealthProbe>, metrics: Option<Arc<MetricsCollector>>) -> Self {
        Self { probe, metrics }
    }

    pub async fn check(&self, descriptor: &ServiceDescriptor) -> ServiceStatus {
        let start = Instant::now();
        let outcome = self.probe.probe(descriptor).await;
        let elapsed = start.elapsed();

        match &outcome {
            Ok(raw) if *raw == descriptor.healthy_value => {
                debug!("Service {} is healthy ({})", descriptor.name, raw);
            }
            Ok(raw) => {
                warn!(
                    "Service {} reported '{}', expected '{}'",
                    descriptor.name, raw, descriptor.healthy_value
                );
            }
            Err(e) => {
                warn!("Service {} probe failed: {}", descriptor.name, e);
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(&descriptor.name, outcome_label(descriptor, &outcome), elapsed);
        }

        let (state, raw_value) = classify(descriptor, outcome);

        ServiceStatus {
            service_name: descriptor.name.clone(),
            state,
            raw_value,
            checked_at: Some(Utc::now()),
            response_time_ms: Some(elapsed.as_millis() as u64),
        }
    }

    /// Probe every descriptor concurrently. The result is index-aligned with
    /// `descriptors` no matter which probe finishes first.
    pub async fn check_all(&self, descriptors: &[ServiceDescriptor]) -> Vec<ServiceStatus> {
        join_all(descriptors.iter().map(|d| self.check(d))).await
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }
}

/// Healthy only on an exact, case-sensitive match. A failed probe keeps no raw value.
pub fn classify(
    descriptor: &ServiceDescriptor,
    outcome: Result<String, ProbeError>,
) -> (HealthState, String) {
    match outcome {
        Ok(raw) if raw == descriptor.healthy_value => (HealthState::Healthy, raw),
        Ok(raw) => (HealthState::Unhealthy, raw),
        Err(_) => (HealthState::Unhealthy, String::new()),
    }
}

fn outcome_label(descriptor: &ServiceDescriptor, outcome: &Result<String, ProbeError>) -> &'static str {
    match outcome {
        Ok(raw) if *raw == descriptor.healthy_value => "healthy",
        Ok(_) => "unexpected_value",
        Err(e) => e.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::testing::{descriptor, ScriptedProbe};
    use proptest::prelude::*;
    use std::sync::atomic::Ordering;
    use tokio::time::Duration;

    #[test]
    fn classify_exact_match_only() {
        let d = descriptor("backend", "UP");
        assert_eq!(
            classify(&d, Ok("UP".to_string())),
            (HealthState::Healthy, "UP".to_string())
        );
        assert_eq!(
            classify(&d, Ok("up".to_string())),
            (HealthState::Unhealthy, "up".to_string())
        );
        assert_eq!(
            classify(&d, Err(ProbeError::Timeout(Duration::from_secs(5)))),
            (HealthState::Unhealthy, String::new())
        );
    }

    proptest! {
        #[test]
        fn any_other_value_is_unhealthy(healthy in "[a-zA-Z]{1,12}", seen in "[a-zA-Z]{0,12}") {
            prop_assume!(healthy != seen);
            let d = descriptor("svc", &healthy);
            let (state, raw) = classify(&d, Ok(seen.clone()));
            prop_assert_eq!(state, HealthState::Unhealthy);
            prop_assert_eq!(raw, seen);
        }

        #[test]
        fn case_variants_are_unhealthy(healthy in "[a-z]{1,12}") {
            let d = descriptor("svc", &healthy);
            let (state, _) = classify(&d, Ok(healthy.to_uppercase()));
            prop_assert_eq!(state, HealthState::Unhealthy);
        }
    }

    #[tokio::test]
    async fn check_all_keeps_input_order() {
        // First service answers last.
        let probe = Arc::new(ScriptedProbe::new(&[
            ("backend", 150, Some("UP")),
            ("ai-service", 0, Some("healthy")),
            ("broken", 50, None),
        ]));
        let aggregator = StatusAggregator::new(probe.clone(), None);
        let descriptors = vec![
            descriptor("backend", "UP"),
            descriptor("ai-service", "healthy"),
            descriptor("broken", "UP"),
        ];

        let results = aggregator.check_all(&descriptors).await;

        assert_eq!(results.len(), 3);
        let names: Vec<_> = results.iter().map(|s| s.service_name.as_str()).collect();
        assert_eq!(names, vec!["backend", "ai-service", "broken"]);
        assert_eq!(results[0].state, HealthState::Healthy);
        assert_eq!(results[1].state, HealthState::Healthy);
        assert_eq!(results[2].state, HealthState::Unhealthy);
        assert_eq!(results[2].raw_value, "");
        assert!(results.iter().all(|s| s.checked_at.is_some()));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn probes_run_concurrently() {
        let probe = Arc::new(ScriptedProbe::new(&[
            ("a", 300, Some("UP")),
            ("b", 300, Some("UP")),
            ("c", 300, Some("UP")),
        ]));
        let aggregator = StatusAggregator::new(probe, None);
        let descriptors = vec![descriptor("a", "UP"), descriptor("b", "UP"), descriptor("c", "UP")];

        let start = Instant::now();
        aggregator.check_all(&descriptors).await;
        assert!(start.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn failure_does_not_leak_into_sibling() {
        let probe = Arc::new(ScriptedProbe::new(&[("down", 0, None), ("up", 0, Some("healthy"))]));
        let aggregator = StatusAggregator::new(probe, None);

        let results = aggregator
            .check_all(&[descriptor("down", "UP"), descriptor("up", "healthy")])
            .await;

        assert_eq!(results[0].state, HealthState::Unhealthy);
        assert_eq!(results[1].state, HealthState::Healthy);
        assert_eq!(results[1].raw_value, "healthy");
    }

    #[tokio::test]
    async fn repeated_checks_agree() {
        let probe = Arc::new(ScriptedProbe::new(&[("a", 0, Some("UP")), ("b", 0, Some("DOWN"))]));
        let aggregator = StatusAggregator::new(probe, None);
        let descriptors = vec![descriptor("a", "UP"), descriptor("b", "UP")];

        let strip = |v: Vec<ServiceStatus>| -> Vec<(HealthState, String)> {
            v.into_iter().map(|s| (s.state, s.raw_value)).collect()
        };
        let first = strip(aggregator.check_all(&descriptors).await);
        let second = strip(aggregator.check_all(&descriptors).await);
        assert_eq!(first, second);
    }
}
