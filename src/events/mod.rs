//! Fire-and-forget progress events for observability.
//!
//! The pipeline emits structured [`ProgressEvent`]s over a broadcast channel.
//! Emission never blocks and never fails scheduling: with no subscriber the
//! event is simply dropped, and a slow subscriber lags rather than exerting
//! backpressure. Every event is mirrored as a `tracing` record.

use crate::types::ToolKind;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer size for the broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Structured event describing one observable pipeline transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum ProgressEvent {
    /// A pipeline phase began.
    PhaseStarted {
        /// Phase name (`planning`, `researching`, `reporting`, `done`).
        phase: String,
    },
    /// A topic block was enqueued.
    TopicQueued {
        /// The new block's id.
        topic_id: u64,
        /// Present when the block was discovered mid-run.
        parent_id: Option<u64>,
    },
    /// A worker claimed a topic block.
    TopicClaimed {
        /// The claimed block.
        topic_id: u64,
    },
    /// A topic block completed with a summary.
    TopicCompleted {
        /// The completed block.
        topic_id: u64,
    },
    /// A topic block reached `Failed`.
    TopicFailed {
        /// The failed block.
        topic_id: u64,
        /// Why it failed.
        reason: String,
    },
    /// A discovered subtopic was dropped because the queue was at capacity.
    TopicDropped {
        /// The dropped proposal.
        topic: String,
        /// The discovering block, if any.
        parent_id: Option<u64>,
    },
    /// A citation was registered.
    CitationIssued {
        /// The registered id.
        citation_id: String,
        /// The collaborator that produced it.
        tool: ToolKind,
    },
    /// Cooperative cancellation was observed.
    RunCancelled,
}

/// Broadcast sender for [`ProgressEvent`]s.
///
/// Cheap to clone; every component that needs to report progress holds one.
#[derive(Clone)]
pub struct ProgressSink {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressSink {
    /// Creates a sink with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Opens a new subscription. Events emitted before this call are not
    /// replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Emits an event. Never blocks; a missing subscriber is not an error.
    pub fn emit(&self, event: ProgressEvent) {
        tracing::trace!(event = ?event, "progress");
        let _ = self.tx.send(event);
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
