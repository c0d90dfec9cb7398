//! Research agents: the per-topic behavior seam.
//!
//! The pipeline core schedules topics and accounts for citations; *what* a
//! worker actually does with a claimed topic — which tools to call, when the
//! topic is answered, which subtopics to propose — is supplied by a
//! [`ResearchAgent`] implementation. Agents reach the outside world only
//! through the [`ToolSession`](crate::coordinator::ToolSession) they are
//! handed, which enforces the citation contract for every call.

/// Deterministic web-search agent.
pub mod search;

pub use search::SearchAgent;

use crate::coordinator::ToolSession;
use crate::types::{Result, TopicBlock};
use async_trait::async_trait;

/// What one research iteration concluded.
#[derive(Debug, Clone)]
pub enum IterationOutcome {
    /// The topic needs more iterations. Newly proposed subtopics, if any,
    /// are enqueued by the worker (and dropped when the queue is full).
    Continue {
        /// Subtopic proposals surfaced by this iteration.
        discovered: Vec<String>,
    },
    /// The topic is answered. `summary` becomes the block's research notes
    /// and may carry inline citation markers such as `[CIT-3-01]`.
    Complete {
        /// The finished research notes.
        summary: String,
        /// Subtopic proposals surfaced by this iteration.
        discovered: Vec<String>,
    },
}

/// One research iteration over a claimed topic block.
///
/// The worker owns `block` exclusively for the duration of the call; the
/// agent records evidence by pushing the [`ToolTrace`](crate::types::ToolTrace)s
/// returned from [`ToolSession::invoke`] onto `block.traces`. Tool failures
/// surface as `Ok(None)` from the session and simply leave no citation; an
/// `Err` from this method counts as a failed iteration and is absorbed by
/// the worker until the block's budget runs out.
#[async_trait]
pub trait ResearchAgent: Send + Sync {
    /// Runs one iteration. Called with `block.iteration_count` already
    /// advanced for this attempt.
    async fn run_iteration(
        &self,
        block: &mut TopicBlock,
        session: &ToolSession,
    ) -> Result<IterationOutcome>;
}
