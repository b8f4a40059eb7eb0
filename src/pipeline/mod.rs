//! Fan-out Pipeline
//!
//! Routes each ingested record to the sinks it asks for, and lets formats be
//! enabled or disabled while records are flowing.
//!
//! # Architecture
//!
//! ```text
//!   ingest()  ──▶ ingestion channel ──▶ Dispatcher ──┬──▶ json sink task
//!                                          │         ├──▶ csv sink task
//!                                     (lock: resolve)└──▶ sqlite sink task
//!                                          │
//!                                   ┌──────┴───────┐
//!                                   │ SinkRegistry │
//!                                   └──────┬───────┘
//!                                     (lock: insert/remove)
//!                                          │
//!   register() ──▶ control channel ──▶ Registry Mutator
//! ```
//!
//! Both channels are bounded (see [`PipelineConfig`]). A sink that falls
//! behind applies backpressure through the dispatcher to `ingest()`.
//!
//! # Shutdown
//!
//! [`Pipeline::shutdown`] stops intake, lets the dispatcher drain every
//! record it has already accepted, stops the mutator, then retires each
//! sink and waits for it to finish writing.

mod dispatcher;
mod mutator;
mod registry;

pub use mutator::{RegistrationOutcome, RegistrationRequest};
pub use registry::{Route, SinkEntry, SinkRegistry};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::sink::{SinkFormat, SinkStats};
use crate::types::{Ingest, Record};

use dispatcher::Dispatcher;
use mutator::{RegistrationCommand, RegistryMutator};

/// Control channel depth; registration traffic is tiny
const CONTROL_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Pipeline is shut down")]
    Closed,
}

struct PipelineTasks {
    dispatcher: JoinHandle<()>,
    mutator: JoinHandle<()>,
}

/// Handle to the running pipeline. Cheap to share behind an `Arc`.
pub struct Pipeline {
    ingest_tx: mpsc::Sender<Arc<Record>>,
    control_tx: mpsc::Sender<RegistrationCommand>,
    registry: Arc<SinkRegistry>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Option<PipelineTasks>>,
    data_dir: PathBuf,
}

impl Pipeline {
    /// Spawn the dispatcher and mutator. No format is enabled yet.
    pub fn start(config: &PipelineConfig, data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let registry = Arc::new(SinkRegistry::new());
        let (ingest_tx, ingest_rx) = mpsc::channel(config.ingest_channel_capacity.max(1));
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(1);

        let dispatcher = Dispatcher::new(registry.clone(), ingest_rx);
        let dispatcher = tokio::spawn(dispatcher.run(shutdown_tx.subscribe()));

        let mutator = RegistryMutator::new(
            registry.clone(),
            data_dir.clone(),
            config.sink_channel_capacity.max(1),
            control_rx,
        );
        let mutator = tokio::spawn(mutator.run(shutdown_tx.subscribe()));

        info!(
            "Pipeline started (ingest_capacity={}, sink_capacity={})",
            config.ingest_channel_capacity, config.sink_channel_capacity
        );

        Self {
            ingest_tx,
            control_tx,
            registry,
            shutdown_tx,
            tasks: Mutex::new(Some(PipelineTasks {
                dispatcher,
                mutator,
            })),
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Stamp a validated ingest and hand it to the dispatcher.
    ///
    /// Returns once the record is queued; persistence happens asynchronously.
    pub async fn ingest(&self, ingest: Ingest) -> Result<Arc<Record>, PipelineError> {
        let record = Arc::new(Record::stamp(ingest));
        self.ingest_tx
            .send(record.clone())
            .await
            .map_err(|_| PipelineError::Closed)?;
        Ok(record)
    }

    /// Apply a registration request and wait for its outcome
    pub async fn register(
        &self,
        request: RegistrationRequest,
    ) -> Result<RegistrationOutcome, PipelineError> {
        let (respond_to, response) = oneshot::channel();
        self.control_tx
            .send(RegistrationCommand {
                request,
                respond_to: Some(respond_to),
            })
            .await
            .map_err(|_| PipelineError::Closed)?;
        response.await.map_err(|_| PipelineError::Closed)
    }

    pub async fn enable(&self, format_name: &str) -> Result<RegistrationOutcome, PipelineError> {
        self.register(RegistrationRequest::enable(format_name)).await
    }

    pub async fn disable(&self, format_name: &str) -> Result<RegistrationOutcome, PipelineError> {
        self.register(RegistrationRequest::disable(format_name)).await
    }

    /// Enable every supported format, as done at startup
    pub async fn enable_all(&self) -> Result<Vec<(SinkFormat, RegistrationOutcome)>, PipelineError> {
        let mut outcomes = Vec::with_capacity(SinkFormat::ALL.len());
        for format in SinkFormat::ALL {
            let outcome = self.enable(format.name()).await?;
            match &outcome {
                RegistrationOutcome::Enabled | RegistrationOutcome::AlreadyEnabled => {
                    info!("Format '{}' available", format);
                }
                other => warn!("Format '{}' unavailable: {:?}", format, other),
            }
            outcomes.push((format, outcome));
        }
        Ok(outcomes)
    }

    /// Formats currently accepting records
    pub fn formats(&self) -> Vec<SinkFormat> {
        self.registry.formats()
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    /// Drain and stop everything. Safe to call more than once; later calls
    /// return an empty report.
    pub async fn shutdown(&self) -> Vec<(SinkFormat, SinkStats)> {
        let tasks = self.tasks.lock().take();
        let Some(tasks) = tasks else {
            return Vec::new();
        };

        info!("Pipeline shutting down");
        let _ = self.shutdown_tx.send(());

        if let Err(e) = tasks.dispatcher.await {
            error!("Dispatcher task failed: {}", e);
        }
        if let Err(e) = tasks.mutator.await {
            error!("Registry mutator task failed: {}", e);
        }

        let mut report = Vec::new();
        for (format, entry) in self.registry.drain() {
            match entry.retire().await {
                Ok(stats) => report.push((format, stats)),
                Err(e) => error!("Sink task for '{}' failed: {}", format, e),
            }
        }

        info!("Pipeline stopped");
        report
    }
}
