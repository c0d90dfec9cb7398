//! Planning-phase collaborator: rephrase a topic and decompose it.
//!
//! Planning is single-threaded and runs before any worker starts. Evidence a
//! planner consults goes through its [`ToolSession`] and is cited in the
//! global `PLAN-*` scope, so planning sources participate in the final
//! reference numbering ahead of all research-phase citations.

use crate::coordinator::ToolSession;
use crate::types::{Result, ToolKind};
use async_trait::async_trait;
use serde_json::json;

/// Output of the planning phase.
#[derive(Debug, Clone)]
pub struct ResearchPlan {
    /// The user topic rephrased as a report title.
    pub rephrased: String,
    /// Initial subtopics, in the order they should be enqueued.
    pub subtopics: Vec<String>,
}

/// Rephrases the user topic and proposes the initial decomposition.
#[async_trait]
pub trait TopicPlanner: Send + Sync {
    /// Produces the plan. Evidence gathered through `session` is cited in
    /// the plan scope.
    async fn plan(&self, topic: &str, session: &ToolSession) -> Result<ResearchPlan>;
}

/// Deterministic planner that decomposes a topic along fixed facets.
///
/// The built-in planner used by the CLI; real deployments substitute an
/// LLM-driven [`TopicPlanner`]. When a web-search collaborator is available
/// it runs one seeding search so the decomposition itself is backed by a
/// `PLAN-*` citation.
pub struct FacetPlanner {
    facets: Vec<String>,
    seed_results: usize,
}

impl FacetPlanner {
    /// Creates a planner over the given facets.
    pub fn new(facets: Vec<String>) -> Self {
        Self {
            facets,
            seed_results: 5,
        }
    }
}

impl Default for FacetPlanner {
    fn default() -> Self {
        Self::new(vec![
            "overview and background".into(),
            "current state of the art".into(),
            "key challenges and open problems".into(),
            "future outlook".into(),
        ])
    }
}

#[async_trait]
impl TopicPlanner for FacetPlanner {
    async fn plan(&self, topic: &str, session: &ToolSession) -> Result<ResearchPlan> {
        if session.has_tool(ToolKind::WebSearch) {
            // Seeding search; a failure just means the plan goes uncited.
            session
                .invoke(
                    ToolKind::WebSearch,
                    topic,
                    json!({ "num_results": self.seed_results }),
                )
                .await?;
        }

        Ok(ResearchPlan {
            rephrased: format!("A structured survey of {}", topic),
            subtopics: self
                .facets
                .iter()
                .map(|facet| format!("{}: {}", topic, facet))
                .collect(),
        })
    }
}
