// src/health/board.rs
use super::{HealthState, ServiceDescriptor, ServiceStatus, StatusAggregator};
use crate::metrics::MetricsCollector;
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug)]
struct Slot {
    cycle: u64,
    status: ServiceStatus,
}

/// Session state: the latest status of every configured service.
///
/// Slots are keyed by service name and seeded `Unknown`. Each probe writes only
/// its own slot, and a slot never goes back to a result from an older refresh
/// cycle than the one that last wrote it.
pub struct StatusBoard {
    descriptors: Vec<ServiceDescriptor>,
    aggregator: StatusAggregator,
    slots: DashMap<String, Slot>,
    cycle: AtomicU64,
    metrics: Option<Arc<MetricsCollector>>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl StatusBoard {
    pub fn new(
        descriptors: Vec<ServiceDescriptor>,
        aggregator: StatusAggregator,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        let slots = DashMap::new();
        for descriptor in &descriptors {
            slots.insert(
                descriptor.name.clone(),
                Slot {
                    cycle: 0,
                    status: ServiceStatus::unknown(descriptor.name.clone()),
                },
            );
        }

        if let Some(metrics) = &metrics {
            metrics.update_service_counts(0, descriptors.len());
        }

        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            descriptors,
            aggregator,
            slots,
            cycle: AtomicU64::new(0),
            metrics,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn descriptors(&self) -> &[ServiceDescriptor] {
        &self.descriptors
    }

    /// Current statuses in configuration order.
    pub fn snapshot(&self) -> Vec<ServiceStatus> {
        self.descriptors
            .iter()
            .filter_map(|d| self.slots.get(&d.name).map(|slot| slot.status.clone()))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<ServiceStatus> {
        self.slots.get(name).map(|slot| slot.status.clone())
    }

    /// Probe every service once. Each slot is updated the moment its own probe
    /// finishes; the returned vector holds this cycle's results in
    /// configuration order.
    pub async fn refresh(&self) -> Vec<ServiceStatus> {
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let span = info_span!("refresh", cycle, id = %Uuid::new_v4());

        async move {
            let results = join_all(self.descriptors.iter().map(|descriptor| async move {
                let status = self.aggregator.check(descriptor).await;
                self.apply(cycle, status.clone());
                status
            }))
            .await;

            let healthy = results.iter().filter(|s| s.is_healthy()).count();
            if let Some(metrics) = &self.metrics {
                let current_healthy = self
                    .slots
                    .iter()
                    .filter(|slot| slot.status.state == HealthState::Healthy)
                    .count();
                metrics.update_service_counts(current_healthy, self.descriptors.len());
            }

            info!(
                "Refresh complete: {} healthy, {} unhealthy",
                healthy,
                results.len() - healthy
            );
            results
        }
        .instrument(span)
        .await
    }

    /// Store `status` unless its slot already holds a newer cycle's result.
    /// The per-service health gauge follows the slot, never a dropped result.
    fn apply(&self, cycle: u64, status: ServiceStatus) -> bool {
        match self.slots.get_mut(&status.service_name) {
            Some(mut slot) if slot.cycle <= cycle => {
                if let Some(metrics) = &self.metrics {
                    metrics.update_service_health(&status.service_name, status.is_healthy());
                }
                slot.cycle = cycle;
                slot.status = status;
                true
            }
            Some(slot) => {
                debug!(
                    "Dropping stale result for {} from cycle {} (have {})",
                    status.service_name, cycle, slot.cycle
                );
                false
            }
            None => false,
        }
    }

    /// Refresh on a fixed period until `shutdown` is called. The first tick
    /// fires one period from now.
    pub async fn start(self: Arc<Self>, every: Duration) {
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!("Starting status refresh loop with interval: {:?}", every);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Status refresh loop shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
