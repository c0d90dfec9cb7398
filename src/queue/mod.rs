//! Topic queue: the FIFO state machine over research topics.
//!
//! The queue owns an arena of [`TopicBlock`] records addressed by id, plus a
//! FIFO of pending ids. Blocks are never deleted, only marked terminal, so
//! the arena doubles as the run's historical record and `max_length` caps the
//! total number of topics a run may create.
//!
//! All mutation goes through the operation set on [`TopicQueue`]; there is no
//! separate unsynchronized core. The single mutex is held only for the brief
//! enqueue/claim/resolve critical sections, never across an await point.

use crate::types::{PipelineError, Result, TopicBlock, TopicState};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;

/// Counts of blocks per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Total blocks ever created.
    pub total: usize,
    /// Blocks waiting to be claimed.
    pub pending: usize,
    /// Blocks currently owned by workers.
    pub researching: usize,
    /// Blocks that completed with a summary.
    pub completed: usize,
    /// Blocks that failed or were exhausted.
    pub failed: usize,
}

struct QueueInner {
    blocks: Vec<TopicBlock>,
    pending: VecDeque<u64>,
}

/// FIFO scheduler for research topics with exclusive claiming and a hard
/// capacity bound.
///
/// Dynamic subtopic discovery mid-drain goes through the same
/// [`enqueue`](TopicQueue::enqueue) path as planning-phase decomposition, so
/// the ordering and capacity invariants hold uniformly.
pub struct TopicQueue {
    inner: Mutex<QueueInner>,
    max_length: usize,
    default_max_iterations: u32,
}

impl TopicQueue {
    /// Creates an empty queue.
    ///
    /// `max_length` caps the total number of blocks the queue will ever hold;
    /// `default_max_iterations` is the iteration budget stamped onto each new
    /// block.
    pub fn new(max_length: usize, default_max_iterations: u32) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                blocks: Vec::new(),
                pending: VecDeque::new(),
            }),
            max_length,
            default_max_iterations,
        }
    }

    /// Appends a new `Pending` block and returns its id.
    ///
    /// Fails with [`PipelineError::QueueFull`] when the queue is at capacity;
    /// the queue is left unmodified in that case. `parent_id` marks blocks
    /// discovered by a worker mid-run.
    pub fn enqueue(&self, topic: impl Into<String>, parent_id: Option<u64>) -> Result<u64> {
        let topic = topic.into();
        let mut inner = self.inner.lock();
        if inner.blocks.len() >= self.max_length {
            return Err(PipelineError::QueueFull);
        }
        let id = inner.blocks.len() as u64;
        inner.blocks.push(TopicBlock::new(
            id,
            topic.clone(),
            parent_id,
            self.default_max_iterations,
        ));
        inner.pending.push_back(id);
        debug!(topic_id = id, parent = ?parent_id, %topic, "topic enqueued");
        Ok(id)
    }

    /// Atomically claims the earliest-enqueued `Pending` block.
    ///
    /// The block transitions to `Researching` and a copy is handed to the
    /// caller, which owns it exclusively until it calls
    /// [`complete`](TopicQueue::complete) or [`fail`](TopicQueue::fail).
    /// Returns `None` when no `Pending` block exists. Two concurrent callers
    /// never receive the same block.
    pub fn claim_next(&self) -> Option<TopicBlock> {
        let mut inner = self.inner.lock();
        let id = inner.pending.pop_front()?;
        let entry = &mut inner.blocks[id as usize];
        entry.state = TopicState::Researching;
        debug!(topic_id = id, "topic claimed");
        Some(entry.clone())
    }

    /// Merges a claimed block back as `Completed`.
    ///
    /// The caller's copy (with its traces, discoveries, and summary) becomes
    /// the authoritative record. Fails with
    /// [`PipelineError::InvalidTransition`] if the stored block is not
    /// `Researching`.
    pub fn complete(&self, block: TopicBlock) -> Result<()> {
        self.resolve(block, TopicState::Completed, None)
    }

    /// Merges a claimed block back as `Failed` with a reason.
    ///
    /// Same transition rules as [`complete`](TopicQueue::complete).
    pub fn fail(&self, block: TopicBlock, reason: impl Into<String>) -> Result<()> {
        self.resolve(block, TopicState::Failed, Some(reason.into()))
    }

    fn resolve(&self, mut block: TopicBlock, to: TopicState, reason: Option<String>) -> Result<()> {
        let mut inner = self.inner.lock();
        let id = block.id;
        let stored_state = match inner.blocks.get(id as usize) {
            Some(entry) => entry.state,
            None => {
                return Err(PipelineError::InvalidTransition {
                    topic_id: id,
                    state: block.state,
                });
            }
        };
        if stored_state != TopicState::Researching {
            return Err(PipelineError::InvalidTransition {
                topic_id: id,
                state: stored_state,
            });
        }
        block.state = to;
        block.failure_reason = reason;
        debug!(topic_id = id, state = %to, "topic resolved");
        inner.blocks[id as usize] = block;
        Ok(())
    }

    /// True iff no block is `Pending` or `Researching`.
    pub fn is_drained(&self) -> bool {
        let inner = self.inner.lock();
        inner.blocks.iter().all(|b| b.state.is_terminal())
    }

    /// Total number of blocks ever created.
    pub fn len(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    /// True iff no block was ever enqueued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The hard capacity bound.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// A copy of one block, if it exists.
    pub fn get(&self, id: u64) -> Option<TopicBlock> {
        self.inner.lock().blocks.get(id as usize).cloned()
    }

    /// Copies of all blocks, in creation order.
    pub fn all_blocks(&self) -> Vec<TopicBlock> {
        self.inner.lock().blocks.clone()
    }

    /// Per-state counts.
    pub fn stats(&self) -> QueueStats {
        let inner = self.inner.lock();
        let mut stats = QueueStats {
            total: inner.blocks.len(),
            ..QueueStats::default()
        };
        for block in &inner.blocks {
            match block.state {
                TopicState::Pending => stats.pending += 1,
                TopicState::Researching => stats.researching += 1,
                TopicState::Completed => stats.completed += 1,
                TopicState::Failed => stats.failed += 1,
            }
        }
        stats
    }
}
