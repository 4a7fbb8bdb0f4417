//! Quill: Staged Blog Content Generation
//!
//! A content-generation engine that drives an LLM completion service through a
//! five-stage pipeline (research, titles, keywords, blog, Q&A) and a
//! blog-grounded conversational assistant.

pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod types;
