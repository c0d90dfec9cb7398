//! Core types for the CORAL research pipeline.
//!
//! Everything that crosses a component boundary lives here: topic blocks and
//! their state machine, tool traces, citations and their scoped identifiers,
//! and the crate-wide error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============= Topic Types =============

/// Lifecycle state of a [`TopicBlock`].
///
/// Legal transitions are `Pending -> Researching` (at most once, via
/// `claim_next`) and `Researching -> Completed | Failed` (at most once).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicState {
    /// Enqueued, waiting to be claimed.
    Pending,
    /// Claimed and exclusively owned by a worker.
    Researching,
    /// Terminal: research produced a summary.
    Completed,
    /// Terminal: research was abandoned with a failure reason.
    Failed,
}

impl TopicState {
    /// Whether this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TopicState::Completed | TopicState::Failed)
    }
}

impl std::fmt::Display for TopicState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TopicState::Pending => "pending",
            TopicState::Researching => "researching",
            TopicState::Completed => "completed",
            TopicState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One schedulable unit of research work with its own state and evidence trail.
///
/// A block is owned by the [`TopicQueue`](crate::queue::TopicQueue) except
/// while `Researching`, when the claiming worker holds the only mutable copy
/// and merges it back through `complete` or `fail`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicBlock {
    /// Queue-assigned identifier, immutable after creation.
    pub id: u64,
    /// The subtopic under research.
    pub topic: String,
    /// Set when this block was discovered by a worker mid-run.
    pub parent_id: Option<u64>,
    /// Current lifecycle state.
    pub state: TopicState,
    /// Research iterations consumed so far.
    pub iteration_count: u32,
    /// Iteration budget before the block is failed as exhausted.
    pub max_iterations: u32,
    /// Record of every tool call that produced usable evidence, in call order.
    #[serde(default)]
    pub traces: Vec<ToolTrace>,
    /// Child-topic proposals surfaced while researching, in discovery order.
    #[serde(default)]
    pub discovered: Vec<String>,
    /// Research notes, set when the block completes. May contain inline
    /// citation markers such as `[CIT-3-01]`.
    pub summary: Option<String>,
    /// Set only when the block failed.
    pub failure_reason: Option<String>,
}

impl TopicBlock {
    /// Creates a fresh `Pending` block. Only the queue assigns ids.
    pub(crate) fn new(id: u64, topic: String, parent_id: Option<u64>, max_iterations: u32) -> Self {
        Self {
            id,
            topic,
            parent_id,
            state: TopicState::Pending,
            iteration_count: 0,
            max_iterations,
            traces: Vec::new(),
            discovered: Vec::new(),
            summary: None,
            failure_reason: None,
        }
    }

    /// Consumes one unit of the iteration budget.
    ///
    /// Returns the 1-based iteration number, or [`PipelineError::TopicExhausted`]
    /// once the budget is spent. The caller is expected to fail the block at
    /// that point; the queue never retries on its own.
    pub fn begin_iteration(&mut self) -> Result<u32> {
        if self.iteration_count >= self.max_iterations {
            return Err(PipelineError::TopicExhausted {
                topic_id: self.id,
                limit: self.max_iterations,
            });
        }
        self.iteration_count += 1;
        Ok(self.iteration_count)
    }
}

// ============= Tool Types =============

/// The kinds of external tool collaborators a worker may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum ToolKind {
    RagHybrid,
    RagNaive,
    WebSearch,
    PaperSearch,
    RunCode,
}

impl ToolKind {
    /// All known tool kinds, in a stable order.
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::RagHybrid,
            ToolKind::RagNaive,
            ToolKind::WebSearch,
            ToolKind::PaperSearch,
            ToolKind::RunCode,
        ]
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolKind::RagHybrid => "rag_hybrid",
            ToolKind::RagNaive => "rag_naive",
            ToolKind::WebSearch => "web_search",
            ToolKind::PaperSearch => "paper_search",
            ToolKind::RunCode => "run_code",
        };
        write!(f, "{}", s)
    }
}

/// Record of one external tool invocation and its cited result.
///
/// Immutable once created. Never created for a call that produced no usable
/// result: a failed call leaves only a gap in the citation sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Citation id reserved before the call executed.
    pub citation_id: String,
    /// Which collaborator was invoked.
    pub tool: ToolKind,
    /// The query sent to the collaborator.
    pub query: String,
    /// Short description of what the call produced.
    pub summary: String,
    /// When the call completed.
    pub timestamp: DateTime<Utc>,
}

/// Successful result of a tool collaborator call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Raw reference data (search hits, paper metadata, code output).
    pub payload: serde_json::Value,
    /// Short human-readable summary for the tool trace.
    pub summary: String,
    /// Canonical source identity (e.g. a DOI) used to collapse repeat
    /// sources into one reference number.
    pub dedup_key: Option<String>,
}

// ============= Citation Types =============

/// Scope of a citation id: the global planning scope or one topic block.
///
/// The derived ordering is the report numbering order: all plan citations
/// first by sequence, then topic citations by (topic id, sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
#[allow(missing_docs)]
pub enum CitationScope {
    Plan { seq: u32 },
    Topic { topic_id: u64, seq: u32 },
}

/// A reserved citation identifier: the formatted key plus its structured
/// scope, so numbering never has to parse id strings.
///
/// Reserving an id advances the scope counter immediately; an id discarded
/// after a tool failure is never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationId {
    key: String,
    scope: CitationScope,
}

impl CitationId {
    /// A plan-scope id, e.g. `PLAN-03`.
    pub(crate) fn plan(seq: u32) -> Self {
        Self {
            key: format!("PLAN-{:02}", seq),
            scope: CitationScope::Plan { seq },
        }
    }

    /// A topic-scope id, e.g. `CIT-3-01`.
    pub(crate) fn topic(topic_id: u64, seq: u32) -> Self {
        Self {
            key: format!("CIT-{}-{:02}", topic_id, seq),
            scope: CitationScope::Topic { topic_id, seq },
        }
    }

    /// The formatted id string.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The structured scope this id was issued in.
    pub fn scope(&self) -> CitationScope {
        self.scope
    }
}

impl std::fmt::Display for CitationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// A registered citation. Created once during a tool call and never mutated
/// afterwards, except to receive its `ref_number` during reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// The formatted id key (`PLAN-NN` or `CIT-<topic>-NN`).
    pub citation_id: String,
    /// Structured scope, the authority for numbering order.
    pub scope: CitationScope,
    /// Which collaborator produced the evidence.
    pub tool: ToolKind,
    /// Raw reference data carried through to the report's reference list.
    pub payload: serde_json::Value,
    /// Canonical source identity for source-level dedup.
    pub dedup_key: Option<String>,
    /// Final 1-based reference number, assigned only by
    /// [`build_ref_number_map`](crate::citations::CitationRegistry::build_ref_number_map).
    pub ref_number: Option<u32>,
}

impl Citation {
    /// Builds a citation from a reserved id and a successful tool result.
    pub fn from_output(id: &CitationId, tool: ToolKind, output: &ToolOutput) -> Self {
        Self {
            citation_id: id.key().to_string(),
            scope: id.scope(),
            tool,
            payload: output.payload.clone(),
            dedup_key: output.dedup_key.clone(),
            ref_number: None,
        }
    }
}

// ============= Error Types =============

/// Error taxonomy for the pipeline.
///
/// Only [`InvalidTransition`](PipelineError::InvalidTransition) and
/// [`DuplicateCitation`](PipelineError::DuplicateCitation) abort a run; they
/// indicate queue or registry corruption. Everything else is contained at the
/// block or call level.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Enqueue attempted while the queue is at `max_length`.
    #[error("topic queue is at capacity")]
    QueueFull,

    /// A terminal transition was requested for a block that is not
    /// `Researching`. Indicates state corruption; aborts the run.
    #[error("invalid transition for topic {topic_id} in state {state}")]
    InvalidTransition {
        /// The offending block.
        topic_id: u64,
        /// The state it was actually in.
        state: TopicState,
    },

    /// A citation id was registered twice. Indicates registry corruption;
    /// aborts the run.
    #[error("duplicate citation id: {0}")]
    DuplicateCitation(String),

    /// A tool collaborator call failed. Absorbed at the worker level; the
    /// call produces no citation.
    #[error("tool call failed: {0}")]
    Tool(String),

    /// No collaborator is registered for the requested tool kind.
    #[error("no collaborator registered for tool kind {0}")]
    ToolUnavailable(ToolKind),

    /// A block consumed its whole iteration budget without completing.
    #[error("topic {topic_id} exhausted its budget of {limit} iterations")]
    TopicExhausted {
        /// The exhausted block.
        topic_id: u64,
        /// Its iteration budget.
        limit: u32,
    },

    /// Cooperative cancellation was requested; already-completed work stands.
    #[error("cancellation requested")]
    Cancelled,

    /// Configuration could not be loaded or validated.
    #[error("configuration error: {0}")]
    Config(#[from] crate::utils::config::ConfigError),

    /// Snapshot serialization or IO failure.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl PipelineError {
    /// Whether this error must terminate the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidTransition { .. } | PipelineError::DuplicateCitation(_)
        )
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;
