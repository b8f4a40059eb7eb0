//! Dispatcher
//!
//! Single consumer of the ingestion channel. Records are handled strictly
//! one at a time in arrival order, which is what gives every sink a FIFO
//! view of the records routed to it.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::registry::{Route, SinkRegistry};
use crate::types::Record;

pub(crate) struct Dispatcher {
    registry: Arc<SinkRegistry>,
    ingest_rx: mpsc::Receiver<Arc<Record>>,
}

impl Dispatcher {
    pub(crate) fn new(registry: Arc<SinkRegistry>, ingest_rx: mpsc::Receiver<Arc<Record>>) -> Self {
        Self {
            registry,
            ingest_rx,
        }
    }

    pub(crate) async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!("Dispatcher started");

        loop {
            tokio::select! {
                maybe_record = self.ingest_rx.recv() => {
                    match maybe_record {
                        Some(record) => {
                            dispatch(&self.registry, record).await;
                        }
                        None => break,
                    }
                }

                _ = shutdown.recv() => {
                    // Refuse new records but deliver everything already accepted
                    self.ingest_rx.close();
                    let mut drained = 0usize;
                    while let Some(record) = self.ingest_rx.recv().await {
                        dispatch(&self.registry, record).await;
                        drained += 1;
                    }
                    info!("Dispatcher drained {} buffered records", drained);
                    break;
                }
            }
        }

        info!("Dispatcher stopped");
    }
}

/// Forward one record to every requested sink that is enabled.
///
/// The registry lock is taken once to resolve all routes and released
/// before any send. Unknown or disabled formats are skipped with a warning;
/// the remaining formats still receive the record. Returns the number of
/// sinks the record was handed to.
pub(crate) async fn dispatch(registry: &SinkRegistry, record: Arc<Record>) -> usize {
    let routes = registry.resolve(&record.formats);
    let mut delivered = 0;

    for route in routes {
        match route {
            Route::Deliver(format, sender) => {
                if sender.send(record.clone()).await.is_ok() {
                    delivered += 1;
                    debug!(checksum = %record.checksum, format = %format, "Record sent to sink");
                } else {
                    warn!(
                        checksum = %record.checksum,
                        format = %format,
                        "Sink for format '{}' exited before accepting record",
                        format
                    );
                }
            }
            Route::Disabled(format) => {
                warn!(
                    checksum = %record.checksum,
                    "Attempt to use format '{}' which is not enabled",
                    format
                );
            }
            Route::Unknown(name) => {
                warn!(
                    checksum = %record.checksum,
                    "Attempt to use invalid format '{}'",
                    name
                );
            }
        }
    }

    delivered
}
