//! Registry Mutator
//!
//! Single consumer of registration requests. Opens, spawns and retires sink
//! tasks and is the only writer of the registry map.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{error, info, warn};

use super::registry::{SinkEntry, SinkRegistry};
use crate::sink::{Sink, SinkFormat, SinkStats};

/// Request to enable or disable one format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub format_name: String,
    pub enable: bool,
}

impl RegistrationRequest {
    pub fn enable(format_name: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            enable: true,
        }
    }

    pub fn disable(format_name: impl Into<String>) -> Self {
        Self {
            format_name: format_name.into(),
            enable: false,
        }
    }
}

/// Result of applying a registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// A new sink task is now consuming records
    Enabled,
    /// The format already had a live sink; nothing changed
    AlreadyEnabled,
    /// The sink drained every record forwarded to it and exited
    Disabled(SinkStats),
    /// Disable requested for a format with no live sink; nothing changed
    NotRegistered,
    /// The name is not a supported format
    UnknownFormat,
    /// The sink could not be opened or did not exit cleanly
    Failed(String),
}

pub(crate) struct RegistrationCommand {
    pub(crate) request: RegistrationRequest,
    pub(crate) respond_to: Option<oneshot::Sender<RegistrationOutcome>>,
}

pub(crate) struct RegistryMutator {
    registry: Arc<SinkRegistry>,
    data_dir: PathBuf,
    sink_channel_capacity: usize,
    control_rx: mpsc::Receiver<RegistrationCommand>,
}

impl RegistryMutator {
    pub(crate) fn new(
        registry: Arc<SinkRegistry>,
        data_dir: PathBuf,
        sink_channel_capacity: usize,
        control_rx: mpsc::Receiver<RegistrationCommand>,
    ) -> Self {
        Self {
            registry,
            data_dir,
            sink_channel_capacity,
            control_rx,
        }
    }

    pub(crate) async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!("Registry mutator started");

        loop {
            tokio::select! {
                maybe_command = self.control_rx.recv() => {
                    let Some(command) = maybe_command else { break };
                    let outcome = self.apply(&command.request).await;
                    if let Some(respond_to) = command.respond_to {
                        let _ = respond_to.send(outcome);
                    }
                }

                _ = shutdown.recv() => {
                    // Pending requests are dropped; their callers see the pipeline as closed
                    self.control_rx.close();
                    break;
                }
            }
        }

        info!("Registry mutator stopped");
    }

    pub(crate) async fn apply(&self, request: &RegistrationRequest) -> RegistrationOutcome {
        let format = match request.format_name.parse::<SinkFormat>() {
            Ok(format) => format,
            Err(e) => {
                warn!("Registration rejected: {}", e);
                return RegistrationOutcome::UnknownFormat;
            }
        };

        if request.enable {
            self.enable(format).await
        } else {
            self.disable(format).await
        }
    }

    async fn enable(&self, format: SinkFormat) -> RegistrationOutcome {
        if self.registry.contains(format) {
            warn!("Attempt to enable format '{}' but already enabled", format);
            return RegistrationOutcome::AlreadyEnabled;
        }

        // Opened outside the lock; a failure here only affects this format
        let sink = match Sink::open(format, &self.data_dir).await {
            Ok(sink) => sink,
            Err(e) => {
                error!("Failed to open sink for format '{}': {}", format, e);
                return RegistrationOutcome::Failed(e.to_string());
            }
        };

        let (sender, receiver) = mpsc::channel(self.sink_channel_capacity);
        let task = tokio::spawn(sink.run(receiver));

        match self.registry.insert(format, SinkEntry::new(sender, task)) {
            Ok(()) => {
                info!("Format '{}' enabled", format);
                RegistrationOutcome::Enabled
            }
            Err(spare) => {
                warn!("Attempt to enable format '{}' but already enabled", format);
                let _ = spare.retire().await;
                RegistrationOutcome::AlreadyEnabled
            }
        }
    }

    async fn disable(&self, format: SinkFormat) -> RegistrationOutcome {
        let Some(entry) = self.registry.remove(format) else {
            warn!("Attempt to disable format '{}' but it is not registered", format);
            return RegistrationOutcome::NotRegistered;
        };

        info!("Format '{}' disabled, draining sink", format);
        match entry.retire().await {
            Ok(stats) => {
                info!(
                    "Sink for '{}' exited ({} written, {} failed)",
                    format, stats.written, stats.failed
                );
                RegistrationOutcome::Disabled(stats)
            }
            Err(e) => {
                error!("Sink task for '{}' did not exit cleanly: {}", format, e);
                RegistrationOutcome::Failed(e.to_string())
            }
        }
    }
}
