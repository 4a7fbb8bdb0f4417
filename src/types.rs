//! Shared value types for the Quill content generation engine.

use crate::error::QuillError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One step of the content pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageKind {
    Research,
    Titles,
    Keywords,
    Blog,
    Qa,
}

impl StageKind {
    /// All stages in pipeline order. Invalidation cascades follow this order.
    pub const ALL: [StageKind; 5] = [
        StageKind::Research,
        StageKind::Titles,
        StageKind::Keywords,
        StageKind::Blog,
        StageKind::Qa,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StageKind::Research => "research",
            StageKind::Titles => "titles",
            StageKind::Keywords => "keywords",
            StageKind::Blog => "blog",
            StageKind::Qa => "qa",
        }
    }
}

/// Output of one completed pipeline stage.
///
/// Immutable once produced; regeneration replaces the artifact wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageArtifact {
    pub kind: StageKind,
    pub content: String,
    pub generated_at: DateTime<Utc>,
}

impl StageArtifact {
    pub fn new(kind: StageKind, content: String, generated_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            content,
            generated_at,
        }
    }
}

/// Speaker of a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One turn of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp,
        }
    }
}

/// Valid word-limit range for blog generation, matching the original slider.
pub const WORD_LIMIT_MIN: u32 = 300;
pub const WORD_LIMIT_MAX: u32 = 2000;
pub const WORD_LIMIT_DEFAULT: u32 = 800;

/// Target blog length in words. A soft target passed to generation, not an
/// enforced postcondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLimit(u32);

impl WordLimit {
    pub fn new(value: u32) -> Result<Self, QuillError> {
        if !(WORD_LIMIT_MIN..=WORD_LIMIT_MAX).contains(&value) {
            return Err(QuillError::InvalidParameter {
                name: "word_limit",
                message: format!(
                    "must be between {} and {}, got {}",
                    WORD_LIMIT_MIN, WORD_LIMIT_MAX, value
                ),
            });
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl Default for WordLimit {
    fn default() -> Self {
        Self(WORD_LIMIT_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_limit_bounds() {
        assert!(WordLimit::new(300).is_ok());
        assert!(WordLimit::new(2000).is_ok());
        assert!(WordLimit::new(299).is_err());
        assert!(WordLimit::new(2001).is_err());
        assert_eq!(WordLimit::default().get(), 800);
    }

    #[test]
    fn test_stage_kind_order() {
        assert_eq!(StageKind::ALL[0], StageKind::Research);
        assert_eq!(StageKind::ALL[4], StageKind::Qa);
        assert_eq!(StageKind::Blog.label(), "blog");
    }
}
