//! Report assembly: outline, citation resolution, and references.
//!
//! Runs after the registry is frozen. Assembly is deterministic: given the
//! same blocks, citations, and ref-number map it produces the same report,
//! independent of the order in which workers finished.

use crate::types::{Citation, ToolKind, TopicBlock, TopicState};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Inline citation markers: `[PLAN-NN]` or `[CIT-<topic>-NN]`.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(PLAN-\d+|CIT-\d+-\d+)\]").expect("marker pattern compiles"));

/// One second-level outline entry with its subsection titles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSection {
    /// Section title (the researched topic).
    pub title: String,
    /// Subsection titles (completed child topics).
    pub subsections: Vec<String>,
}

/// One deduplicated entry in the references list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// Final 1-based position in the reference list.
    pub ref_number: u32,
    /// Every citation id that resolved to this entry.
    pub citation_ids: Vec<String>,
    /// The collaborator that produced the source.
    pub tool: ToolKind,
    /// Human-readable source label.
    pub label: String,
    /// Source link, when the payload carries one.
    pub url: Option<String>,
}

/// A subtopic the report could not cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedTopic {
    /// The block's id.
    pub topic_id: u64,
    /// The subtopic.
    pub topic: String,
    /// Why it is missing from the report.
    pub reason: String,
}

/// The assembled research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report title (the rephrased user topic).
    pub title: String,
    /// Three-level outline: title, sections, subsections.
    pub outline: Vec<OutlineSection>,
    /// Markdown body with citation markers resolved to `[<ref_number>]`.
    pub body: String,
    /// Deduplicated references ordered by `ref_number`.
    pub references: Vec<ReferenceEntry>,
    /// Failed or never-researched subtopics, stated explicitly.
    pub skipped: Vec<SkippedTopic>,
}

impl Report {
    /// Renders the full report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("# {}\n\n{}", self.title, self.body);

        if !self.references.is_empty() {
            out.push_str("## References\n\n");
            for entry in &self.references {
                match &entry.url {
                    Some(url) => {
                        out.push_str(&format!("{}. {} — {}\n", entry.ref_number, entry.label, url))
                    }
                    None => out.push_str(&format!("{}. {}\n", entry.ref_number, entry.label)),
                }
            }
            out.push('\n');
        }

        if !self.skipped.is_empty() {
            out.push_str("## Skipped subtopics\n\n");
            for skipped in &self.skipped {
                out.push_str(&format!("- {} ({})\n", skipped.topic, skipped.reason));
            }
            out.push('\n');
        }

        out
    }
}

/// Builds the final report from completed blocks and the frozen registry.
pub struct ReportAssembler {
    title: String,
}

impl ReportAssembler {
    /// Creates an assembler with the report title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Assembles the report.
    ///
    /// Sections come from completed root topics in creation order, with
    /// completed direct children as subsections; completed blocks whose
    /// parent did not complete are gathered under a trailing "Further
    /// findings" section. Markers that do not resolve against `ref_map` are
    /// stripped, never left dangling.
    pub fn assemble(
        &self,
        blocks: &[TopicBlock],
        citations: &[Citation],
        ref_map: &BTreeMap<String, u32>,
    ) -> Report {
        let completed: Vec<&TopicBlock> = blocks
            .iter()
            .filter(|b| b.state == TopicState::Completed)
            .collect();
        let roots: Vec<&TopicBlock> = completed
            .iter()
            .copied()
            .filter(|b| b.parent_id.is_none())
            .collect();
        let children_of = |parent: u64| -> Vec<&TopicBlock> {
            completed
                .iter()
                .copied()
                .filter(|b| b.parent_id == Some(parent))
                .collect()
        };
        let root_ids: Vec<u64> = roots.iter().map(|b| b.id).collect();
        let orphans: Vec<&TopicBlock> = completed
            .iter()
            .copied()
            .filter(|b| match b.parent_id {
                Some(parent) => !root_ids.contains(&parent),
                None => false,
            })
            .collect();

        let mut outline = Vec::new();
        let mut body = String::new();

        for root in &roots {
            let children = children_of(root.id);
            outline.push(OutlineSection {
                title: root.topic.clone(),
                subsections: children.iter().map(|c| c.topic.clone()).collect(),
            });

            body.push_str(&format!("## {}\n\n", root.topic));
            body.push_str(&self.resolve_markers(root.summary.as_deref().unwrap_or(""), ref_map));
            body.push_str("\n\n");
            for child in children {
                body.push_str(&format!("### {}\n\n", child.topic));
                body.push_str(
                    &self.resolve_markers(child.summary.as_deref().unwrap_or(""), ref_map),
                );
                body.push_str("\n\n");
            }
        }

        if !orphans.is_empty() {
            outline.push(OutlineSection {
                title: "Further findings".into(),
                subsections: orphans.iter().map(|b| b.topic.clone()).collect(),
            });
            body.push_str("## Further findings\n\n");
            for orphan in orphans {
                body.push_str(&format!("### {}\n\n", orphan.topic));
                body.push_str(
                    &self.resolve_markers(orphan.summary.as_deref().unwrap_or(""), ref_map),
                );
                body.push_str("\n\n");
            }
        }

        Report {
            title: self.title.clone(),
            outline,
            body,
            references: Self::references(citations, ref_map),
            skipped: Self::skipped(blocks),
        }
    }

    /// Rewrites resolvable markers to `[<ref_number>]` and strips the rest.
    fn resolve_markers(&self, text: &str, ref_map: &BTreeMap<String, u32>) -> String {
        MARKER
            .replace_all(text, |caps: &regex::Captures<'_>| {
                match ref_map.get(&caps[1]) {
                    Some(number) => format!("[{}]", number),
                    None => String::new(),
                }
            })
            .into_owned()
    }

    /// One entry per distinct source, ordered by `ref_number`.
    ///
    /// `citations` must be in numbering order (plan scope first, then topic
    /// scopes), as produced by the registry; the first citation of each
    /// number supplies the label and url.
    fn references(citations: &[Citation], ref_map: &BTreeMap<String, u32>) -> Vec<ReferenceEntry> {
        let mut by_number: BTreeMap<u32, ReferenceEntry> = BTreeMap::new();
        for citation in citations {
            let Some(&number) = ref_map.get(&citation.citation_id) else {
                continue;
            };
            by_number
                .entry(number)
                .or_insert_with(|| ReferenceEntry {
                    ref_number: number,
                    citation_ids: Vec::new(),
                    tool: citation.tool,
                    label: Self::label_for(citation),
                    url: Self::url_for(citation),
                })
                .citation_ids
                .push(citation.citation_id.clone());
        }
        by_number.into_values().collect()
    }

    fn label_for(citation: &Citation) -> String {
        if let Some(title) = citation.payload.get("title").and_then(|v| v.as_str()) {
            return title.to_string();
        }
        if let Some(query) = citation.payload.get("query").and_then(|v| v.as_str()) {
            return format!("Search results for \"{}\"", query);
        }
        citation.tool.to_string()
    }

    fn url_for(citation: &Citation) -> Option<String> {
        if let Some(url) = citation.payload.get("url").and_then(|v| v.as_str()) {
            return Some(url.to_string());
        }
        citation
            .payload
            .get("doi")
            .and_then(|v| v.as_str())
            .map(|doi| format!("https://doi.org/{}", doi.trim_start_matches("doi:")))
    }

    /// Failed blocks with their reasons, plus blocks a cancelled run never
    /// reached.
    fn skipped(blocks: &[TopicBlock]) -> Vec<SkippedTopic> {
        blocks
            .iter()
            .filter_map(|block| match block.state {
                TopicState::Failed => Some(SkippedTopic {
                    topic_id: block.id,
                    topic: block.topic.clone(),
                    reason: block
                        .failure_reason
                        .clone()
                        .unwrap_or_else(|| "failed".into()),
                }),
                TopicState::Pending | TopicState::Researching => Some(SkippedTopic {
                    topic_id: block.id,
                    topic: block.topic.clone(),
                    reason: "never researched".into(),
                }),
                TopicState::Completed => None,
            })
            .collect()
    }
}
