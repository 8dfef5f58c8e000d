// src/health/testing.rs
use super::probe::{HealthProbe, ProbeError};
use super::ServiceDescriptor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::{sleep, Duration};
use url::Url;

/// Answers from a fixed table of `(service, delay_ms, value)`; a `None` value
/// makes the probe fail.
pub struct ScriptedProbe {
    answers: HashMap<String, (u64, Option<&'static str>)>,
    pub calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(answers: &[(&str, u64, Option<&'static str>)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, delay, answer)| (name.to_string(), (*delay, *answer)))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, descriptor: &ServiceDescriptor) -> Result<String, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, answer) = self
            .answers
            .get(&descriptor.name)
            .copied()
            .unwrap_or((0, None));
        sleep(Duration::from_millis(delay)).await;
        answer
            .map(str::to_owned)
            .ok_or_else(|| ProbeError::MalformedBody("scripted failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Answers by call order, whatever the service; the last entry repeats.
pub struct SequencedProbe {
    answers: Vec<(u64, Option<&'static str>)>,
    calls: AtomicUsize,
}

impl SequencedProbe {
    pub fn new(answers: &[(u64, Option<&'static str>)]) -> Self {
        Self {
            answers: answers.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HealthProbe for SequencedProbe {
    async fn probe(&self, _descriptor: &ServiceDescriptor) -> Result<String, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, answer) = self
            .answers
            .get(call)
            .or_else(|| self.answers.last())
            .copied()
            .unwrap_or((0, None));
        sleep(Duration::from_millis(delay)).await;
        answer
            .map(str::to_owned)
            .ok_or_else(|| ProbeError::MalformedBody("scripted failure".to_string()))
    }

    fn name(&self) -> &'static str {
        "sequenced"
    }
}

pub fn descriptor(name: &str, healthy: &str) -> ServiceDescriptor {
    ServiceDescriptor::new(
        name,
        Url::parse(&format!("http://{}.local/health", name)).unwrap(),
        healthy,
    )
}
