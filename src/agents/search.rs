//! A deterministic agent that answers a topic with one web search.

use crate::agents::{IterationOutcome, ResearchAgent};
use crate::coordinator::ToolSession;
use crate::types::{Result, ToolKind, TopicBlock};
use async_trait::async_trait;
use serde_json::json;

/// Searches the web once per iteration and completes the topic as soon as a
/// search produces results.
///
/// This is the built-in agent used by the CLI; real deployments substitute
/// an LLM-driven [`ResearchAgent`] that decides tool calls per iteration.
pub struct SearchAgent {
    num_results: usize,
}

impl SearchAgent {
    /// Creates the agent, requesting `num_results` hits per search.
    pub fn new(num_results: usize) -> Self {
        Self { num_results }
    }
}

impl Default for SearchAgent {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl ResearchAgent for SearchAgent {
    async fn run_iteration(
        &self,
        block: &mut TopicBlock,
        session: &ToolSession,
    ) -> Result<IterationOutcome> {
        let trace = session
            .invoke(
                ToolKind::WebSearch,
                &block.topic,
                json!({ "num_results": self.num_results }),
            )
            .await?;

        match trace {
            Some(trace) => {
                let summary = format!(
                    "Findings for \"{}\": {} [{}]",
                    block.topic, trace.summary, trace.citation_id
                );
                block.traces.push(trace);
                Ok(IterationOutcome::Complete {
                    summary,
                    discovered: Vec::new(),
                })
            }
            // Search failed; burn the iteration and try again next round.
            None => Ok(IterationOutcome::Continue {
                discovered: Vec::new(),
            }),
        }
    }
}
