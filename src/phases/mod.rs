//! Phase orchestration: Planning → Researching → Reporting → Done.
//!
//! A [`PhaseOrchestrator`] owns one research run end to end. Planning is
//! single-threaded and seeds the queue; Researching delegates to the
//! [`ParallelCoordinator`]; Reporting freezes the registry and assembles the
//! report. Transitions are strictly forward; a cancelled run skips ahead to
//! Reporting and covers whatever completed.

use crate::agents::ResearchAgent;
use crate::citations::CitationRegistry;
use crate::coordinator::{ParallelCoordinator, ToolSession};
use crate::events::{ProgressEvent, ProgressSink};
use crate::planner::{ResearchPlan, TopicPlanner};
use crate::queue::TopicQueue;
use crate::report::{Report, ReportAssembler};
use crate::snapshot::PipelineSnapshot;
use crate::tools::ToolRegistry;
use crate::types::{PipelineError, Result};
use crate::utils::config::PipelineConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The phases of a research run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Rephrase and decompose the user topic.
    Planning,
    /// Drain the topic queue under bounded parallelism.
    Researching,
    /// Freeze citations and assemble the report.
    Reporting,
    /// The run is finished.
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Planning => "planning",
            Phase::Researching => "researching",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// Sequences one research run through its phases.
///
/// An orchestrator owns its queue and registry and is good for a single
/// [`run`](PhaseOrchestrator::run); build a fresh one per research topic.
pub struct PhaseOrchestrator {
    config: PipelineConfig,
    queue: Arc<TopicQueue>,
    registry: Arc<CitationRegistry>,
    tools: Arc<ToolRegistry>,
    planner: Arc<dyn TopicPlanner>,
    agent: Arc<dyn ResearchAgent>,
    events: ProgressSink,
    cancel: CancellationToken,
    phase: RwLock<Phase>,
}

impl PhaseOrchestrator {
    /// Creates an orchestrator with a fresh queue and registry.
    pub fn new(
        config: PipelineConfig,
        tools: Arc<ToolRegistry>,
        planner: Arc<dyn TopicPlanner>,
        agent: Arc<dyn ResearchAgent>,
    ) -> Self {
        let queue = Arc::new(TopicQueue::new(
            config.max_queue_length,
            config.max_iterations,
        ));
        Self {
            config,
            queue,
            registry: Arc::new(CitationRegistry::new()),
            tools,
            planner,
            agent,
            events: ProgressSink::default(),
            cancel: CancellationToken::new(),
            phase: RwLock::new(Phase::Planning),
        }
    }

    /// The progress sink; subscribe before calling `run` to observe events.
    pub fn events(&self) -> &ProgressSink {
        &self.events
    }

    /// A handle for cooperative cancellation of this run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.read()
    }

    /// The shared topic queue.
    pub fn queue(&self) -> Arc<TopicQueue> {
        Arc::clone(&self.queue)
    }

    /// The shared citation registry.
    pub fn registry(&self) -> Arc<CitationRegistry> {
        Arc::clone(&self.registry)
    }

    /// Captures a serializable snapshot of the run's current state.
    pub fn snapshot(&self, topic: &str) -> PipelineSnapshot {
        PipelineSnapshot::capture(topic, &self.queue, &self.registry)
    }

    /// Runs the full pipeline on `topic` and returns the assembled report.
    ///
    /// A cancelled run is not an error: the report covers every block that
    /// completed before the signal was observed. Only fatal invariant
    /// violations propagate as `Err`.
    pub async fn run(&self, topic: &str) -> Result<Report> {
        self.enter(Phase::Planning);
        let plan = self.run_planning(topic).await?;

        self.enter(Phase::Researching);
        let coordinator = ParallelCoordinator::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.registry),
            Arc::clone(&self.tools),
            Arc::clone(&self.agent),
            self.config.max_parallel_topics,
            self.events.clone(),
            self.cancel.clone(),
        );
        coordinator.run().await?;

        self.enter(Phase::Reporting);
        let ref_map = self.registry.apply_ref_numbers();
        let report = ReportAssembler::new(&plan.rephrased).assemble(
            &self.queue.all_blocks(),
            &self.registry.all_citations(),
            &ref_map,
        );
        let stats = self.queue.stats();
        info!(
            completed = stats.completed,
            failed = stats.failed,
            citations = self.registry.len(),
            references = report.references.len(),
            "report assembled"
        );

        self.enter(Phase::Done);
        Ok(report)
    }

    /// Plans the run and seeds the queue with the initial decomposition.
    async fn run_planning(&self, topic: &str) -> Result<ResearchPlan> {
        let session = ToolSession::plan(
            Arc::clone(&self.registry),
            Arc::clone(&self.tools),
            self.cancel.clone(),
            self.events.clone(),
        );
        let plan = match self.planner.plan(topic, &session).await {
            Ok(plan) => plan,
            // Cancelled before planning finished: report over nothing.
            Err(PipelineError::Cancelled) => ResearchPlan {
                rephrased: topic.to_string(),
                subtopics: Vec::new(),
            },
            Err(e) => return Err(e),
        };

        for subtopic in &plan.subtopics {
            match self.queue.enqueue(subtopic, None) {
                Ok(id) => self.events.emit(ProgressEvent::TopicQueued {
                    topic_id: id,
                    parent_id: None,
                }),
                Err(PipelineError::QueueFull) => {
                    warn!(topic = %subtopic, "queue full, dropping planned subtopic");
                    self.events.emit(ProgressEvent::TopicDropped {
                        topic: subtopic.clone(),
                        parent_id: None,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(plan)
    }

    fn enter(&self, next: Phase) {
        let mut phase = self.phase.write();
        debug_assert!(next >= *phase, "phase transitions are forward-only");
        *phase = next;
        info!(phase = %next, "phase started");
        self.events.emit(ProgressEvent::PhaseStarted {
            phase: next.to_string(),
        });
    }
}
