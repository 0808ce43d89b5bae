//! Runs several ingestion loops side by side
//!
//! Loops for different domains are independent tasks on the same runtime;
//! there is no ordering between their rounds. A single broadcast channel
//! stops all of them.

use super::{IngestionLoopBuilder, LoopSummary};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

/// What to do when a bounded loop exhausts its round budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestartPolicy {
    #[default]
    Never,
    /// Start a fresh loop (empty window) after the delay
    After(Duration),
}

/// Owns the loop definitions and the shutdown channel
pub struct IngestionSupervisor {
    loops: Vec<IngestionLoopBuilder>,
    restart: RestartPolicy,
}

impl Default for IngestionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestionSupervisor {
    pub fn new() -> Self {
        Self {
            loops: Vec::new(),
            restart: RestartPolicy::Never,
        }
    }

    /// Add a loop; it is built (and rebuilt on restart) from this builder
    pub fn add(mut self, builder: IngestionLoopBuilder) -> Self {
        self.loops.push(builder);
        self
    }

    pub fn restart_policy(mut self, policy: RestartPolicy) -> Self {
        self.restart = policy;
        self
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Spawn every loop onto the current runtime
    pub fn start(self) -> SupervisorHandle {
        let (shutdown_tx, _) = broadcast::channel(1);
        let restart = self.restart;

        let tasks = self
            .loops
            .into_iter()
            .map(|builder| {
                // Subscribe before spawning so an early shutdown is not missed
                let shutdown_rx = shutdown_tx.subscribe();
                tokio::spawn(supervise(builder, restart, shutdown_rx))
            })
            .collect();

        info!(restart = ?restart, "Ingestion supervisor started");
        SupervisorHandle { shutdown_tx, tasks }
    }
}

async fn supervise(
    builder: IngestionLoopBuilder,
    restart: RestartPolicy,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Vec<LoopSummary> {
    let mut summaries = Vec::new();

    loop {
        // Subscribe before checking so a shutdown sent in between reaches the run
        let run_rx = shutdown_rx.resubscribe();
        if !matches!(shutdown_rx.try_recv(), Err(TryRecvError::Empty)) {
            break;
        }

        let ingestion = match builder.clone().build() {
            Ok(ingestion) => ingestion,
            Err(e) => {
                error!(
                    domain = %builder.domain_name(),
                    error = %e,
                    "Failed to build ingestion loop"
                );
                break;
            }
        };

        let summary = ingestion.run(run_rx).await;
        let stopped_by_shutdown = summary.stopped_by_shutdown;
        summaries.push(summary);

        if stopped_by_shutdown {
            break;
        }

        match restart {
            RestartPolicy::Never => break,
            RestartPolicy::After(delay) => {
                info!(
                    domain = %builder.domain_name(),
                    delay_secs = delay.as_secs(),
                    "Restarting ingestion loop"
                );
                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = shutdown_rx.recv() => break,
                }
            }
        }
    }

    summaries
}

/// Handle to running loops
pub struct SupervisorHandle {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<Vec<LoopSummary>>>,
}

impl SupervisorHandle {
    /// Signal every loop to stop at its next boundary
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for every loop to finish, returning one summary per run
    pub async fn join(self) -> Vec<LoopSummary> {
        let mut summaries = Vec::new();
        for task in self.tasks {
            match task.await {
                Ok(runs) => summaries.extend(runs),
                Err(e) => error!(error = %e, "Ingestion task failed"),
            }
        }
        summaries
    }

    /// Shut down and wait
    pub async fn stop(self) -> Vec<LoopSummary> {
        self.shutdown();
        self.join().await
    }
}
