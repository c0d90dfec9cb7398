//! Mock implementations for testing.
//!
//! This module provides scripted tool collaborators, research agents, and
//! planners that can be used across different test files without
//! duplication. None of them touch the network; everything is deterministic
//! apart from task interleaving.

use async_trait::async_trait;
use coral::agents::{IterationOutcome, ResearchAgent};
use coral::coordinator::ToolSession;
use coral::planner::{ResearchPlan, TopicPlanner};
use coral::tools::ResearchTool;
use coral::types::{PipelineError, Result, ToolKind, ToolOutput, TopicBlock};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Tool collaborator returning a canned payload derived from the query.
///
/// Configurable with a fixed dedup key, an artificial delay, or permanent
/// failure. Counts its invocations.
pub struct StubTool {
    kind: ToolKind,
    dedup_key: Option<String>,
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
}

impl StubTool {
    /// A tool that always succeeds.
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            dedup_key: None,
            delay: Duration::ZERO,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A tool that always fails.
    pub fn failing(kind: ToolKind) -> Self {
        Self {
            fail: true,
            ..Self::new(kind)
        }
    }

    /// Stamps every output with the same canonical source identity.
    pub fn with_dedup_key(mut self, key: &str) -> Self {
        self.dedup_key = Some(key.to_string());
        self
    }

    /// Sleeps before answering, to widen interleaving windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times the tool was invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchTool for StubTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn description(&self) -> &str {
        "canned test collaborator"
    }

    async fn invoke(&self, query: &str, _params: Value) -> Result<ToolOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PipelineError::Tool("stub tool failure".into()));
        }
        Ok(ToolOutput {
            payload: json!({
                "title": format!("Result for {}", query),
                "url": format!("https://example.org/{}", query.replace(' ', "-")),
            }),
            summary: format!("stub result for \"{}\"", query),
            dedup_key: self.dedup_key.clone(),
        })
    }
}

/// Agent that makes one tool call per iteration and completes as soon as a
/// call produces a citation, embedding the citation marker in its notes.
pub struct CitingAgent {
    tool: ToolKind,
}

impl CitingAgent {
    pub fn new(tool: ToolKind) -> Self {
        Self { tool }
    }
}

#[async_trait]
impl ResearchAgent for CitingAgent {
    async fn run_iteration(
        &self,
        block: &mut TopicBlock,
        session: &ToolSession,
    ) -> Result<IterationOutcome> {
        match session.invoke(self.tool, &block.topic, json!({})).await? {
            Some(trace) => {
                let summary = format!("Notes on {} [{}]", block.topic, trace.citation_id);
                block.traces.push(trace);
                Ok(IterationOutcome::Complete {
                    summary,
                    discovered: Vec::new(),
                })
            }
            None => Ok(IterationOutcome::Continue {
                discovered: Vec::new(),
            }),
        }
    }
}

/// Agent that proposes child subtopics from every root topic, then behaves
/// like [`CitingAgent`] everywhere.
pub struct DiscoveringAgent {
    tool: ToolKind,
    children_per_root: usize,
}

impl DiscoveringAgent {
    pub fn new(tool: ToolKind, children_per_root: usize) -> Self {
        Self {
            tool,
            children_per_root,
        }
    }
}

#[async_trait]
impl ResearchAgent for DiscoveringAgent {
    async fn run_iteration(
        &self,
        block: &mut TopicBlock,
        session: &ToolSession,
    ) -> Result<IterationOutcome> {
        let discovered = if block.parent_id.is_none() && block.iteration_count == 1 {
            (1..=self.children_per_root)
                .map(|n| format!("{}/child-{}", block.topic, n))
                .collect()
        } else {
            Vec::new()
        };

        match session.invoke(self.tool, &block.topic, json!({})).await? {
            Some(trace) => {
                let summary = format!("Notes on {} [{}]", block.topic, trace.citation_id);
                block.traces.push(trace);
                Ok(IterationOutcome::Complete {
                    summary,
                    discovered,
                })
            }
            None => Ok(IterationOutcome::Continue { discovered }),
        }
    }
}

/// Agent that never completes a topic; every iteration burns budget.
pub struct NeverCompletingAgent;

#[async_trait]
impl ResearchAgent for NeverCompletingAgent {
    async fn run_iteration(
        &self,
        _block: &mut TopicBlock,
        _session: &ToolSession,
    ) -> Result<IterationOutcome> {
        Ok(IterationOutcome::Continue {
            discovered: Vec::new(),
        })
    }
}

/// Agent that tracks how many workers run it simultaneously.
///
/// Completes each topic after a short sleep so overlapping claims are
/// observable; `max_seen` records the high-water mark.
pub struct TrackingAgent {
    active: AtomicUsize,
    max_seen: AtomicUsize,
    delay: Duration,
}

impl TrackingAgent {
    pub fn new(delay: Duration) -> Self {
        Self {
            active: AtomicUsize::new(0),
            max_seen: AtomicUsize::new(0),
            delay,
        }
    }

    /// The largest number of concurrently running iterations observed.
    pub fn max_seen(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResearchAgent for TrackingAgent {
    async fn run_iteration(
        &self,
        block: &mut TopicBlock,
        _session: &ToolSession,
    ) -> Result<IterationOutcome> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        Ok(IterationOutcome::Complete {
            summary: format!("Notes on {}", block.topic),
            discovered: Vec::new(),
        })
    }
}

/// Planner that returns a fixed list of subtopics, optionally citing one
/// piece of plan-scope evidence first.
pub struct ListPlanner {
    subtopics: Vec<String>,
    cite_with: Option<ToolKind>,
}

impl ListPlanner {
    pub fn new(subtopics: Vec<&str>) -> Self {
        Self {
            subtopics: subtopics.into_iter().map(String::from).collect(),
            cite_with: None,
        }
    }

    /// Makes one plan-scope tool call before returning the decomposition.
    pub fn citing(mut self, tool: ToolKind) -> Self {
        self.cite_with = Some(tool);
        self
    }
}

#[async_trait]
impl TopicPlanner for ListPlanner {
    async fn plan(&self, topic: &str, session: &ToolSession) -> Result<ResearchPlan> {
        if let Some(tool) = self.cite_with {
            session.invoke(tool, topic, json!({})).await?;
        }
        Ok(ResearchPlan {
            rephrased: format!("Survey: {}", topic),
            subtopics: self.subtopics.clone(),
        })
    }
}
