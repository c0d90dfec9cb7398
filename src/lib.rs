//! # C.O.R.A.L - Concurrent Orchestrated Research Agent Library
//!
//! A multi-phase, multi-agent deep-research pipeline: a dynamically growing
//! queue of research subtopics drained under bounded parallelism, where every
//! tool call emits a uniquely-identified, deduplicated citation that is
//! resolved into a stable reference numbering for the final report.
//!
//! ## Overview
//!
//! CORAL can be used in two ways:
//!
//! 1. **As a standalone CLI** - Run the `coral-research` binary
//! 2. **As a library** - Wire your own planner, agent, and tool
//!    collaborators into the pipeline
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use coral::agents::SearchAgent;
//! use coral::phases::PhaseOrchestrator;
//! use coral::planner::FacetPlanner;
//! use coral::tools::ToolRegistry;
//! use coral::utils::config::PipelineConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = PhaseOrchestrator::new(
//!         PipelineConfig::default(),
//!         Arc::new(ToolRegistry::with_default_tools()),
//!         Arc::new(FacetPlanner::default()),
//!         Arc::new(SearchAgent::default()),
//!     );
//!
//!     let report = orchestrator.run("solid-state batteries").await?;
//!     println!("{}", report.to_markdown());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline Contract
//!
//! - Topics are served strictly in enqueue order and claimed exclusively:
//!   no block is ever researched twice, and subtopics discovered mid-run
//!   join the same FIFO under the same capacity cap.
//! - Citation ids are issued before each tool call (`PLAN-NN` during
//!   planning, `CIT-<topic>-NN` during research) and are strictly
//!   increasing per scope; a failed call leaves only a gap.
//! - Final reference numbers are a pure function of the registered citation
//!   set, independent of worker completion order, with repeat sources
//!   collapsed by their dedup key.
//! - Cancellation is cooperative; a cancelled run still yields a valid
//!   report over everything that completed.
//!
//! ## Modules
//!
//! - [`agents`] - Per-topic research behavior behind the `ResearchAgent` trait
//! - [`citations`] - Citation id issuance, dedup, and deterministic numbering
//! - [`coordinator`] - Bounded-parallel drain of the topic queue
//! - [`events`] - Fire-and-forget progress events
//! - [`phases`] - Planning → Researching → Reporting orchestration
//! - [`planner`] - Topic decomposition behind the `TopicPlanner` trait
//! - [`queue`] - FIFO topic state machine with exclusive claiming
//! - [`report`] - Outline and citation-resolved report assembly
//! - [`snapshot`] - Serializable pipeline state
//! - [`tools`] - External tool collaborators
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Research agent behavior and the built-in search agent.
pub mod agents;
/// Citation registry: id issuance, dedup, numbering.
pub mod citations;
/// Command-line interface definitions.
pub mod cli;
/// Bounded-parallel coordinator and tool sessions.
pub mod coordinator;
/// Progress event reporting.
pub mod events;
/// Phase orchestration for a research run.
pub mod phases;
/// Planning-phase topic decomposition.
pub mod planner;
/// FIFO topic queue and state machine.
pub mod queue;
/// Report assembly and rendering.
pub mod report;
/// Snapshot persistence.
pub mod snapshot;
/// External tool collaborators.
pub mod tools;
/// Core types (topics, citations, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{IterationOutcome, ResearchAgent, SearchAgent};
pub use citations::{CitationRegistry, RegistrySnapshot};
pub use coordinator::{ParallelCoordinator, ToolSession};
pub use events::{ProgressEvent, ProgressSink};
pub use phases::{Phase, PhaseOrchestrator};
pub use planner::{FacetPlanner, ResearchPlan, TopicPlanner};
pub use queue::{QueueStats, TopicQueue};
pub use report::{Report, ReportAssembler};
pub use snapshot::PipelineSnapshot;
pub use tools::{ResearchTool, ToolRegistry};
pub use types::{
    Citation, CitationId, CitationScope, PipelineError, Result, ToolKind, ToolOutput, ToolTrace,
    TopicBlock, TopicState,
};
pub use utils::config::{ConfigError, CoralConfig, PipelineConfig};
