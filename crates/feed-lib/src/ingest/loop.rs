//! Ingestion loop
//!
//! State machine: `Idle -> Running(n) -> Sleeping(n) -> Running(n + 1) -> ... -> Stopped`.
//! Nothing on the data path stops the loop: fetch failures degrade a single
//! reading, sink failures degrade a single round. Only the round budget or a
//! shutdown signal ends it.

use crate::domain::DomainSpec;
use crate::error::{FetchError, IngestError, Result};
use crate::fetcher::{synthetic_sample, Fetcher};
use crate::health::{components, HealthRegistry};
use crate::models::{Entity, Reading};
use crate::observability::{IngestMetrics, StructuredLogger};
use crate::sink::CsvSink;
use crate::window::SlidingWindow;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::watch;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

type FetchOutcome = std::result::Result<f64, FetchError>;

/// What to do with an entity whose fetch failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Substitute a random value from the domain's synthetic range
    #[default]
    Synthetic,
    /// Leave the entity out of this round
    Skip,
}

/// Configuration for one ingestion loop
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    /// Delay between the end of one round and the start of the next (default: 60 seconds)
    pub interval: Duration,
    /// Window capacity in readings (default: 10)
    pub capacity: usize,
    /// Number of rounds before stopping; `None` runs until shutdown
    pub max_rounds: Option<u64>,
    /// Upper bound on a single upstream fetch (default: 10 seconds)
    pub fetch_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            capacity: 10,
            max_rounds: None,
            fetch_timeout: Duration::from_secs(10),
            failure_policy: FailurePolicy::Synthetic,
        }
    }
}

/// Observable state of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running(u64),
    Sleeping(u64),
    Stopped,
}

/// Outcome of a single round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: u64,
    /// Readings appended to the window this round
    pub readings: Vec<Reading>,
    /// Entities whose fetch failed
    pub fetch_failures: Vec<String>,
    pub sink_written: bool,
}

/// Outcome of a whole `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub domain: String,
    pub rounds_completed: u64,
    /// Rounds that failed to publish or faulted
    pub degraded_rounds: u64,
    pub stopped_by_shutdown: bool,
}

/// Periodic fetch -> window -> sink loop for one domain
pub struct IngestionLoop {
    domain: DomainSpec,
    fetcher: Arc<dyn Fetcher>,
    sink: CsvSink,
    window: SlidingWindow<Reading>,
    config: IngestionConfig,
    health: Option<HealthRegistry>,
    metrics: IngestMetrics,
    logger: StructuredLogger,
    state_tx: watch::Sender<LoopState>,
    #[cfg(test)]
    fault_round: Option<u64>,
}

impl IngestionLoop {
    /// Create a loop writing `<sink_dir>/<domain.sink_file>`
    pub fn new(
        domain: DomainSpec,
        fetcher: Arc<dyn Fetcher>,
        sink_dir: &Path,
        config: IngestionConfig,
    ) -> Self {
        let sink = CsvSink::new(sink_dir.join(&domain.sink_file), domain.schema.clone());
        let (state_tx, _) = watch::channel(LoopState::Idle);

        Self {
            logger: StructuredLogger::new(&domain.name),
            window: SlidingWindow::new(config.capacity),
            domain,
            fetcher,
            sink,
            config,
            health: None,
            metrics: IngestMetrics::new(),
            state_tx,
            #[cfg(test)]
            fault_round: None,
        }
    }

    /// Report round outcomes to a health registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    /// Make `run_round` fail with a schedule fault in the given round
    #[cfg(test)]
    pub(crate) fn fault_in_round(mut self, round: u64) -> Self {
        self.fault_round = Some(round);
        self
    }

    pub fn domain(&self) -> &DomainSpec {
        &self.domain
    }

    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    pub fn window(&self) -> &SlidingWindow<Reading> {
        &self.window
    }

    /// Subscribe to state transitions
    pub fn state(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    fn set_state(&self, state: LoopState) {
        self.state_tx.send_replace(state);
    }

    /// Run until the round budget is exhausted or shutdown is signalled
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> LoopSummary {
        self.logger.log_started(
            self.domain.catalog.len(),
            self.window.capacity(),
            self.config.interval,
            self.config.max_rounds,
        );

        let component = components::ingest(&self.domain.name);
        if let Some(health) = &self.health {
            health.register(&component).await;
        }

        if let Err(e) = self.sink.ensure_initialized() {
            // Not fatal: the first round's write retries the same path
            self.logger.log_sink_failure(0, &e);
        }

        let mut summary = LoopSummary {
            domain: self.domain.name.clone(),
            rounds_completed: 0,
            degraded_rounds: 0,
            stopped_by_shutdown: false,
        };

        let mut round = 0u64;
        loop {
            if shutdown_requested(&mut shutdown) {
                summary.stopped_by_shutdown = true;
                break;
            }

            round += 1;
            self.set_state(LoopState::Running(round));

            match self.run_round(round).await {
                Ok(report) if report.sink_written => {}
                Ok(_) => summary.degraded_rounds += 1,
                Err(e) => {
                    self.logger.log_schedule_fault(round, &e);
                    summary.degraded_rounds += 1;
                }
            }
            summary.rounds_completed = round;

            if self.config.max_rounds.is_some_and(|max| round >= max) {
                break;
            }

            self.set_state(LoopState::Sleeping(round));
            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = shutdown.recv() => {
                    summary.stopped_by_shutdown = true;
                    break;
                }
            }
        }

        self.set_state(LoopState::Stopped);
        let reason = if summary.stopped_by_shutdown {
            "shutdown requested"
        } else {
            "round budget exhausted"
        };
        if let Some(health) = &self.health {
            health
                .set_degraded(&component, format!("stopped: {}", reason))
                .await;
        }
        self.logger.log_stopped(summary.rounds_completed, reason);

        summary
    }

    /// Execute one round: fetch all, append in catalog order, publish
    pub async fn run_round(&mut self, round: u64) -> Result<RoundReport> {
        #[cfg(test)]
        if self.fault_round == Some(round) {
            return Err(IngestError::ScheduleFault {
                round,
                message: "injected fault".to_string(),
            });
        }

        let start = Instant::now();
        let outcomes = self.fetch_all(round).await?;

        let mut readings = Vec::with_capacity(outcomes.len());
        let mut fetch_failures = Vec::new();

        for (entity, outcome) in outcomes {
            match outcome {
                // Timestamp is taken here, not at round start
                Ok(value) => readings.push(Reading::now(&entity, value)),
                Err(source) => {
                    let error = IngestError::FetchFailure {
                        entity: entity.name.clone(),
                        source,
                    };
                    self.logger
                        .log_fetch_failure(round, &entity.name, self.fetcher.source(), &error);
                    fetch_failures.push(entity.name.clone());

                    if self.config.failure_policy == FailurePolicy::Synthetic {
                        let value = synthetic_sample(&self.domain.synthetic_range);
                        readings.push(Reading::now(&entity, value).mark_synthetic());
                    }
                }
            }
        }

        self.window.extend(readings.iter().cloned());
        self.metrics
            .inc_fetch_failures(&self.domain.name, fetch_failures.len() as u64);
        self.metrics
            .set_window_size(&self.domain.name, self.window.len());

        let component = components::ingest(&self.domain.name);
        let sink_written = match self.sink.write(&self.window.snapshot()) {
            Ok(()) => {
                if let Some(health) = &self.health {
                    health.set_healthy(&component).await;
                }
                true
            }
            Err(e) => {
                self.logger.log_sink_failure(round, &e);
                self.metrics.inc_sink_write_failures(&self.domain.name);
                if let Some(health) = &self.health {
                    health
                        .set_degraded(&component, format!("round {}: {}", round, e))
                        .await;
                }
                false
            }
        };

        let elapsed = start.elapsed();
        self.metrics.observe_round(&self.domain.name, elapsed);
        self.logger.log_round(
            round,
            readings.len(),
            fetch_failures.len(),
            self.window.len(),
            elapsed,
        );

        Ok(RoundReport {
            round,
            readings,
            fetch_failures,
            sink_written,
        })
    }

    /// Fetch every entity concurrently; results come back in catalog order
    async fn fetch_all(&self, round: u64) -> Result<Vec<(Entity, FetchOutcome)>> {
        let fetch_timeout = self.config.fetch_timeout;

        let handles: Vec<_> = self
            .domain
            .catalog
            .entities()
            .iter()
            .cloned()
            .map(|entity| {
                let fetcher = Arc::clone(&self.fetcher);
                let task_entity = entity.clone();
                let handle = tokio::spawn(async move {
                    match timeout(fetch_timeout, fetcher.fetch(&task_entity)).await {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Timeout(fetch_timeout)),
                    }
                });
                (entity, handle)
            })
            .collect();

        // Every task is already running; awaiting in order only fixes the
        // order results are consumed in.
        let mut outcomes = Vec::with_capacity(handles.len());
        for (entity, handle) in handles {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(e) if e.is_panic() => Err(FetchError::Panicked(e.to_string())),
                Err(e) => {
                    return Err(IngestError::ScheduleFault {
                        round,
                        message: format!("fetch task for '{}' cancelled: {}", entity.name, e),
                    })
                }
            };
            debug!(
                domain = %self.domain.name,
                entity = %entity.name,
                ok = outcome.is_ok(),
                "Fetch settled"
            );
            outcomes.push((entity, outcome));
        }

        Ok(outcomes)
    }
}

fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) -> bool {
    match shutdown.try_recv() {
        Ok(()) | Err(TryRecvError::Closed) => true,
        Err(TryRecvError::Lagged(_)) => true,
        Err(TryRecvError::Empty) => false,
    }
}

/// Builder for creating an ingestion loop
#[derive(Clone)]
pub struct IngestionLoopBuilder {
    domain: DomainSpec,
    fetcher: Option<Arc<dyn Fetcher>>,
    sink_dir: Option<PathBuf>,
    health: Option<HealthRegistry>,
    config: IngestionConfig,
}

impl IngestionLoopBuilder {
    pub fn new(domain: DomainSpec) -> Self {
        Self {
            domain,
            fetcher: None,
            sink_dir: None,
            health: None,
            config: IngestionConfig::default(),
        }
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Directory the sink file is written into
    pub fn sink_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sink_dir = Some(dir.into());
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn config(mut self, config: IngestionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn max_rounds(mut self, max_rounds: Option<u64>) -> Self {
        self.config.max_rounds = max_rounds;
        self
    }

    pub fn fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.config.fetch_timeout = fetch_timeout;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn domain_name(&self) -> &str {
        &self.domain.name
    }

    /// Build the loop
    pub fn build(self) -> anyhow::Result<IngestionLoop> {
        let fetcher = self
            .fetcher
            .ok_or_else(|| anyhow::anyhow!("Fetcher is required"))?;
        let sink_dir = self
            .sink_dir
            .ok_or_else(|| anyhow::anyhow!("Sink directory is required"))?;
        if self.domain.catalog.is_empty() {
            anyhow::bail!("Domain '{}' has an empty catalog", self.domain.name);
        }

        let ingestion = IngestionLoop::new(self.domain, fetcher, &sink_dir, self.config);
        Ok(match self.health {
            Some(health) => ingestion.with_health(health),
            None => ingestion,
        })
    }
}
