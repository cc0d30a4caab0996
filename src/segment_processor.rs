/*!
 * Segment record handling.
 *
 * Documents arrive as ordered YAML lists of segment records. This module
 * loads and saves them, derives schedulable units from them, understands
 * the `Volume_X_Chapter_Y` identifier scheme, and applies chapter or
 * segment range filters before a run.
 */

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app_config::{FilterConfig, FilterMode};
use crate::translation::scheduler::{Unit, UnitKind};
use crate::translation::retry::{FinalState, UnitOutcome};

/// Identifier scheme: optional volume prefix, then chapter number
static CHAPTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Volume_\d+_)?Chapter_(\d+)").unwrap()
});

/// Trailing segment number within a chapter, when the document splits chapters
static SEGMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Segment_(\d+)").unwrap()
});

/// One document segment as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Stable identifier, e.g. `Chapter_12` or `Volume_2_Chapter_5_Segment_3`
    pub id: String,

    /// Chapter title carried by the first segment of a chapter
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Segment body text
    pub content: String,
}

impl SegmentRecord {
    /// Chapter number parsed from the identifier, if it follows the scheme
    pub fn chapter_number(&self) -> Option<u32> {
        CHAPTER_REGEX
            .captures(&self.id)
            .and_then(|caps| caps.get(2))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Segment number within the chapter, if the identifier carries one
    pub fn segment_number(&self) -> Option<usize> {
        SEGMENT_REGEX
            .captures(&self.id)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

/// Load an ordered segment record list from a YAML document
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<SegmentRecord>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let records: Vec<SegmentRecord> = serde_yaml::from_str(&content)
        .with_context(|| format!("Malformed segment document: {}", path.display()))?;
    Ok(records)
}

/// Save segment records as a YAML document
pub fn save_records(path: impl AsRef<Path>, records: &[SegmentRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let yaml = serde_yaml::to_string(records).context("Failed to serialize segment records")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write document: {}", path.display()))?;
    Ok(())
}

/// Build content units from records, ordinal following record position
pub fn content_units(records: &[SegmentRecord]) -> Vec<Unit> {
    records
        .iter()
        .enumerate()
        .map(|(ordinal, record)| Unit {
            id: record.id.clone(),
            ordinal,
            text: record.content.clone(),
            kind: UnitKind::Content,
        })
        .collect()
}

/// Build title units from records that carry a title.
///
/// Ordinal points back at the record the title came from, so translated
/// titles can be merged without a lookup table.
pub fn title_units(records: &[SegmentRecord]) -> Vec<Unit> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| !record.title.trim().is_empty())
        .map(|(ordinal, record)| Unit {
            id: record.id.clone(),
            ordinal,
            text: record.title.clone(),
            kind: UnitKind::Title,
        })
        .collect()
}

/// Merge translated titles back into the records.
///
/// Failed title outcomes leave the original title in place; the caller
/// reports them separately.
pub fn merge_titles(records: &mut [SegmentRecord], outcomes: &[UnitOutcome]) {
    for outcome in outcomes {
        if let FinalState::Translated(text) = &outcome.state {
            if let Some(record) = records.get_mut(outcome.ordinal) {
                record.title = text.clone();
            }
        }
    }
}

/// Apply the configured range filter to the record list, keeping order
pub fn filter_records(records: Vec<SegmentRecord>, filter: &FilterConfig) -> Vec<SegmentRecord> {
    match filter.mode {
        FilterMode::Off => records,
        FilterMode::Chapter => records
            .into_iter()
            .filter(|record| {
                let Some(chapter) = record.chapter_number() else { return false };
                filter.start_chapter.is_none_or(|start| chapter >= start)
                    && filter.end_chapter.is_none_or(|end| chapter <= end)
            })
            .collect(),
        FilterMode::Segment => records
            .into_iter()
            .enumerate()
            .filter(|(position, _)| {
                // Segment filtering is positional, 1-based like the identifiers
                let n = position + 1;
                filter.start_segment.is_none_or(|start| n >= start)
                    && filter.end_segment.is_none_or(|end| n <= end)
            })
            .map(|(_, record)| record)
            .collect(),
    }
}
