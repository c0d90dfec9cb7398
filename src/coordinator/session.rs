//! Tool sessions: the per-call citation contract.

use crate::citations::CitationRegistry;
use crate::events::{ProgressEvent, ProgressSink};
use crate::tools::ToolRegistry;
use crate::types::{Citation, PipelineError, Result, ToolKind, ToolTrace};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// The citation scope a session issues ids in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionScope {
    Plan,
    Topic(u64),
}

/// Mediates every tool call a planner or agent makes.
///
/// For each call the session checks cancellation, reserves the next citation
/// id in its scope *before* the collaborator runs, and on success registers
/// the citation and returns the matching [`ToolTrace`]. A failed call is
/// absorbed: the reserved id is discarded (leaving a gap in the sequence)
/// and no citation exists for it.
pub struct ToolSession {
    scope: SessionScope,
    registry: Arc<CitationRegistry>,
    tools: Arc<ToolRegistry>,
    cancel: CancellationToken,
    events: ProgressSink,
}

impl ToolSession {
    /// A session issuing ids in the global plan scope.
    pub fn plan(
        registry: Arc<CitationRegistry>,
        tools: Arc<ToolRegistry>,
        cancel: CancellationToken,
        events: ProgressSink,
    ) -> Self {
        Self {
            scope: SessionScope::Plan,
            registry,
            tools,
            cancel,
            events,
        }
    }

    /// A session issuing ids in one topic's scope.
    pub fn topic(
        topic_id: u64,
        registry: Arc<CitationRegistry>,
        tools: Arc<ToolRegistry>,
        cancel: CancellationToken,
        events: ProgressSink,
    ) -> Self {
        Self {
            scope: SessionScope::Topic(topic_id),
            registry,
            tools,
            cancel,
            events,
        }
    }

    /// Whether a collaborator is registered for `kind`.
    pub fn has_tool(&self, kind: ToolKind) -> bool {
        self.tools.has_tool(kind)
    }

    /// Executes one tool call under the citation contract.
    ///
    /// Returns `Ok(Some(trace))` when the call produced usable data and its
    /// citation is registered, `Ok(None)` when the call failed (no citation
    /// exists for it), and `Err` only for cancellation or a fatal registry
    /// violation.
    pub async fn invoke(
        &self,
        kind: ToolKind,
        query: &str,
        params: Value,
    ) -> Result<Option<ToolTrace>> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let id = match self.scope {
            SessionScope::Plan => self.registry.next_plan_id(),
            SessionScope::Topic(topic_id) => self.registry.next_topic_id(topic_id),
        };

        match self.tools.invoke(kind, query, params).await {
            Ok(output) => {
                let citation = Citation::from_output(&id, kind, &output);
                self.registry.register(citation)?;
                self.events.emit(ProgressEvent::CitationIssued {
                    citation_id: id.key().to_string(),
                    tool: kind,
                });
                Ok(Some(ToolTrace {
                    citation_id: id.key().to_string(),
                    tool: kind,
                    query: query.to_string(),
                    summary: output.summary,
                    timestamp: Utc::now(),
                }))
            }
            Err(e) => {
                warn!(
                    citation_id = %id,
                    tool = %kind,
                    error = %e,
                    "tool call failed, discarding reserved citation id"
                );
                Ok(None)
            }
        }
    }
}
