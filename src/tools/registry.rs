//! Tool trait and registry.

use crate::types::{PipelineError, Result, ToolKind, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An external tool collaborator.
///
/// Implementations may be slow or blocking internally; `invoke` is the only
/// suspension point a worker passes through, and no queue or registry lock
/// is held across it.
#[async_trait]
pub trait ResearchTool: Send + Sync {
    /// The kind this collaborator serves.
    fn kind(&self) -> ToolKind;
    /// Short human-readable description.
    fn description(&self) -> &str;
    /// Executes one call. An `Err` yields no citation for the call.
    async fn invoke(&self, query: &str, params: Value) -> Result<ToolOutput>;
}

/// Registry mapping each [`ToolKind`] to its collaborator.
pub struct ToolRegistry {
    tools: HashMap<ToolKind, Arc<dyn ResearchTool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in collaborators (currently the
    /// daedra-backed web search, when the `web-search` feature is enabled).
    pub fn with_default_tools() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "web-search")]
        registry.register(Arc::new(crate::tools::search::WebSearchTool::new()));

        registry
    }

    /// Registers a collaborator, replacing any previous one of the same kind.
    pub fn register(&mut self, tool: Arc<dyn ResearchTool>) {
        self.tools.insert(tool.kind(), tool);
    }

    /// Looks up the collaborator for a kind.
    pub fn get(&self, kind: ToolKind) -> Option<Arc<dyn ResearchTool>> {
        self.tools.get(&kind).cloned()
    }

    /// Invokes the collaborator registered for `kind`.
    pub async fn invoke(&self, kind: ToolKind, query: &str, params: Value) -> Result<ToolOutput> {
        match self.tools.get(&kind) {
            Some(tool) => tool.invoke(query, params).await,
            None => Err(PipelineError::ToolUnavailable(kind)),
        }
    }

    /// The kinds with a registered collaborator.
    pub fn kinds(&self) -> Vec<ToolKind> {
        self.tools.keys().copied().collect()
    }

    /// Whether a collaborator is registered for `kind`.
    pub fn has_tool(&self, kind: ToolKind) -> bool {
        self.tools.contains_key(&kind)
    }
}
