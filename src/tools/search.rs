//! Web search collaborator using daedra
//!
//! Provides the `web_search` tool kind via the daedra crate, which uses
//! DuckDuckGo as the search backend.

use crate::tools::registry::ResearchTool;
use crate::types::{PipelineError, Result, ToolKind, ToolOutput};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Default number of results when the caller does not specify one.
const DEFAULT_NUM_RESULTS: usize = 10;

/// Web search tool powered by daedra.
pub struct WebSearchTool;

impl WebSearchTool {
    /// Creates the tool.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResearchTool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &str {
        "Search the web for information using DuckDuckGo"
    }

    async fn invoke(&self, query: &str, params: Value) -> Result<ToolOutput> {
        let num_results = params
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_NUM_RESULTS);

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                let results: Vec<Value> = response
                    .data
                    .iter()
                    .map(|r| {
                        json!({
                            "title": r.title,
                            "url": r.url,
                            "description": r.description
                        })
                    })
                    .collect();

                if results.is_empty() {
                    return Err(PipelineError::Tool(format!(
                        "no results for \"{}\"",
                        query
                    )));
                }

                let summary = format!("{} web results for \"{}\"", results.len(), query);
                Ok(ToolOutput {
                    payload: json!({
                        "query": query,
                        "results": results,
                        "count": results.len()
                    }),
                    summary,
                    dedup_key: None,
                })
            }
            Err(e) => Err(PipelineError::Tool(format!("search failed: {}", e))),
        }
    }
}
