//! Snapshot persistence for the pipeline state.
//!
//! A snapshot captures every TopicBlock (with its tool traces) plus the
//! citation registry's citations and counters. The round trip is lossless
//! where it matters: reloading a snapshot reproduces an identical
//! `build_ref_number_map()` output for the same registered set, and resumed
//! counters never reissue an already-used citation id.

use crate::citations::{CitationRegistry, RegistrySnapshot};
use crate::queue::TopicQueue;
use crate::types::{PipelineError, Result, TopicBlock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

/// Serializable image of one research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    /// Identifier of this snapshot.
    pub run_id: Uuid,
    /// The user topic the run was started with.
    pub topic: String,
    /// When the snapshot was taken.
    pub created_at: DateTime<Utc>,
    /// Every block ever created, in creation order.
    pub topics: Vec<TopicBlock>,
    /// Registry citations and counters.
    pub registry: RegistrySnapshot,
}

impl PipelineSnapshot {
    /// Captures the current state of a run.
    pub fn capture(topic: &str, queue: &TopicQueue, registry: &CitationRegistry) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            topic: topic.to_string(),
            created_at: Utc::now(),
            topics: queue.all_blocks(),
            registry: registry.snapshot(),
        }
    }

    /// Writes the snapshot as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Snapshot(format!("serialize: {}", e)))?;
        fs::write(path.as_ref(), json).map_err(|e| {
            PipelineError::Snapshot(format!("write {}: {}", path.as_ref().display(), e))
        })
    }

    /// Reads a snapshot back from JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Snapshot(format!("read {}: {}", path.as_ref().display(), e))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| PipelineError::Snapshot(format!("parse: {}", e)))
    }

    /// Rebuilds a citation registry from the snapshot.
    pub fn restore_registry(&self) -> Result<CitationRegistry> {
        CitationRegistry::from_snapshot(self.registry.clone())
    }
}
