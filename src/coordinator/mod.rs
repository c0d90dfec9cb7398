//! Bounded-parallel drain of the topic queue.
//!
//! The coordinator drives up to `max_parallel_topics` concurrent workers
//! (series mode is the special case of one). Admission is gated by a
//! semaphore; each worker claims one pending topic, iterates it through a
//! [`ResearchAgent`], and resolves it to a terminal state. Workers share
//! nothing but the queue and the registry, and touch both only through
//! their atomic operation sets.
//!
//! Subtopics discovered mid-iteration are enqueued through the ordinary
//! `enqueue` path; when the queue is full the proposal is dropped with a
//! warning and a [`ProgressEvent::TopicDropped`] event.

/// The per-call citation contract.
pub mod session;

pub use session::ToolSession;

use crate::agents::{IterationOutcome, ResearchAgent};
use crate::citations::CitationRegistry;
use crate::events::{ProgressEvent, ProgressSink};
use crate::queue::TopicQueue;
use crate::tools::ToolRegistry;
use crate::types::{PipelineError, Result, TopicBlock};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Reason recorded on blocks failed by cooperative cancellation.
const CANCELLED_REASON: &str = "run cancelled";

/// Drives concurrent workers over the topic queue until it is drained.
pub struct ParallelCoordinator {
    worker: Worker,
    semaphore: Arc<Semaphore>,
    max_parallel: usize,
}

impl ParallelCoordinator {
    /// Creates a coordinator over shared queue and registry.
    ///
    /// `max_parallel` is clamped to at least 1; passing 1 yields strict
    /// series execution in FIFO order.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        queue: Arc<TopicQueue>,
        registry: Arc<CitationRegistry>,
        tools: Arc<ToolRegistry>,
        agent: Arc<dyn ResearchAgent>,
        max_parallel: usize,
        events: ProgressSink,
        cancel: CancellationToken,
    ) -> Self {
        let max_parallel = max_parallel.max(1);
        Self {
            worker: Worker {
                queue,
                registry,
                tools,
                agent,
                events,
                cancel,
            },
            semaphore: Arc::new(Semaphore::new(max_parallel)),
            max_parallel,
        }
    }

    /// The admission cap.
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Runs until the queue is drained and no worker is in flight.
    ///
    /// A cancelled run returns `Ok(())` once in-flight workers have wound
    /// down; already-completed blocks and registered citations stand.
    /// Fatal errors (invalid transition, duplicate citation) cancel the
    /// remaining workers and propagate.
    pub async fn run(&self) -> Result<()> {
        let mut workers: JoinSet<Result<()>> = JoinSet::new();
        let mut fatal: Option<PipelineError> = None;

        loop {
            // Admit new workers while capacity and claimable topics remain.
            while fatal.is_none() && !self.worker.cancel.is_cancelled() {
                let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
                    break;
                };
                let Some(block) = self.worker.queue.claim_next() else {
                    break;
                };
                self.worker.events.emit(ProgressEvent::TopicClaimed {
                    topic_id: block.id,
                });
                let worker = self.worker.clone();
                workers.spawn(async move {
                    let _permit = permit;
                    worker.run_topic(block).await
                });
            }

            if workers.is_empty() {
                // Nothing in flight and nothing claimable: drained,
                // cancelled, or aborting on a fatal error.
                break;
            }

            if let Some(joined) = workers.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        error!(error = %e, "worker aborted, cancelling run");
                        self.worker.cancel.cancel();
                        fatal.get_or_insert(e);
                    }
                    Err(join_err) => {
                        // A panicked worker leaves its block stuck in
                        // Researching; surface loudly but keep draining.
                        error!(error = %join_err, "worker task panicked");
                    }
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        if self.worker.cancel.is_cancelled() {
            self.worker.events.emit(ProgressEvent::RunCancelled);
            info!("research cancelled, partial results retained");
        } else {
            debug!("topic queue drained");
        }
        Ok(())
    }
}

/// Shared handles for one worker task.
#[derive(Clone)]
struct Worker {
    queue: Arc<TopicQueue>,
    registry: Arc<CitationRegistry>,
    tools: Arc<ToolRegistry>,
    agent: Arc<dyn ResearchAgent>,
    events: ProgressSink,
    cancel: CancellationToken,
}

impl Worker {
    /// Owns `block` exclusively from claim to terminal transition.
    async fn run_topic(&self, mut block: TopicBlock) -> Result<()> {
        let session = ToolSession::topic(
            block.id,
            Arc::clone(&self.registry),
            Arc::clone(&self.tools),
            self.cancel.clone(),
            self.events.clone(),
        );

        loop {
            if self.cancel.is_cancelled() {
                return self.fail_block(block, CANCELLED_REASON.to_string());
            }

            if let Err(exhausted) = block.begin_iteration() {
                let reason = exhausted.to_string();
                return self.fail_block(block, reason);
            }

            match self.agent.run_iteration(&mut block, &session).await {
                Ok(IterationOutcome::Complete {
                    summary,
                    discovered,
                }) => {
                    self.propose(&mut block, discovered);
                    block.summary = Some(summary);
                    let id = block.id;
                    self.queue.complete(block)?;
                    self.events
                        .emit(ProgressEvent::TopicCompleted { topic_id: id });
                    return Ok(());
                }
                Ok(IterationOutcome::Continue { discovered }) => {
                    self.propose(&mut block, discovered);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(PipelineError::Cancelled) => {
                    // Handled at the top of the loop.
                }
                Err(e) => {
                    warn!(topic_id = block.id, error = %e, "research iteration failed");
                }
            }
        }
    }

    fn fail_block(&self, block: TopicBlock, reason: String) -> Result<()> {
        let id = block.id;
        self.queue.fail(block, reason.clone())?;
        self.events.emit(ProgressEvent::TopicFailed {
            topic_id: id,
            reason,
        });
        Ok(())
    }

    /// Records and enqueues discovered subtopics; drops them when full.
    fn propose(&self, block: &mut TopicBlock, discovered: Vec<String>) {
        for topic in discovered {
            block.discovered.push(topic.clone());
            match self.queue.enqueue(&topic, Some(block.id)) {
                Ok(id) => self.events.emit(ProgressEvent::TopicQueued {
                    topic_id: id,
                    parent_id: Some(block.id),
                }),
                Err(PipelineError::QueueFull) => {
                    warn!(parent_id = block.id, %topic, "queue full, dropping discovered subtopic");
                    self.events.emit(ProgressEvent::TopicDropped {
                        topic,
                        parent_id: Some(block.id),
                    });
                }
                Err(e) => warn!(parent_id = block.id, error = %e, "enqueue failed"),
            }
        }
    }
}
