//! Result Formatter
//!
//! Stamps stage outputs with generation metadata. Pure and deterministic; the
//! timestamp is always supplied by the caller.

use crate::types::StageKind;
use chrono::{DateTime, Utc};

/// Stamp an artifact's text with its generation metadata.
///
/// Research gets a report header, the blog gets a generated-on comment so the
/// stamp survives markdown rendering. Other stage outputs carry their own
/// formatting from the prompt templates and pass through unchanged.
pub fn stamp(text: &str, kind: StageKind, timestamp: DateTime<Utc>) -> String {
    match kind {
        StageKind::Research => format!(
            "# Research Report (Generated {})\n\n{}",
            timestamp.format("%Y-%m-%d"),
            text
        ),
        StageKind::Blog => format!(
            "<!-- Generated on {} -->\n\n{}",
            timestamp.format("%Y-%m-%d"),
            text
        ),
        StageKind::Titles | StageKind::Keywords | StageKind::Qa => text.to_string(),
    }
}
