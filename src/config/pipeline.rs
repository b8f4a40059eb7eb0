//! Fan-out pipeline sizing

use serde::{Deserialize, Serialize};

/// Channel capacities for the fan-out pipeline.
///
/// Both channels are bounded. When a sink falls behind its channel fills,
/// the dispatcher blocks on it, the ingestion channel fills, and ingest
/// requests wait. There is no buffering beyond these two capacities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Records buffered between the HTTP boundary and the dispatcher
    #[serde(default = "default_ingest_capacity")]
    pub ingest_channel_capacity: usize,
    /// Records buffered between the dispatcher and each sink
    #[serde(default = "default_sink_capacity")]
    pub sink_channel_capacity: usize,
}

fn default_ingest_capacity() -> usize {
    64
}

fn default_sink_capacity() -> usize {
    16
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest_channel_capacity: default_ingest_capacity(),
            sink_channel_capacity: default_sink_capacity(),
        }
    }
}
