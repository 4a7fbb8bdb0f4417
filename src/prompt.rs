//! Prompt Template Registry
//!
//! One parameterized template per pipeline stage plus the two chat variants.
//! Rendering is a pure function of (kind, named parameters): freshness context
//! (`current_date`, `current_year`) is always supplied by the caller so the
//! registry never reads wall-clock time.

use crate::error::QuillError;
use std::collections::HashMap;

pub const PARAM_TOPIC: &str = "topic";
pub const PARAM_CURRENT_DATE: &str = "current_date";
pub const PARAM_CURRENT_YEAR: &str = "current_year";
pub const PARAM_TITLE: &str = "title";
pub const PARAM_KEYWORDS: &str = "keywords";
pub const PARAM_WORD_LIMIT: &str = "word_limit";
pub const PARAM_BLOG_CONTENT: &str = "blog_content";
pub const PARAM_HISTORY: &str = "history";
pub const PARAM_USER_INPUT: &str = "user_input";

const RESEARCH_TEMPLATE: &str = "\
As a professional research assistant, gather comprehensive and CURRENT information about: {topic}

Today's date is {current_date}. Prioritize information from the last 6 months.

Provide:
1. Key facts and statistics (with sources cited as clickable links)
2. Current trends and developments (with clickable sources where applicable)
3. Common misconceptions
4. Expert opinions or quotes (with attribution)
5. Related subtopics worth exploring

FOR CURRENT INFORMATION:
- Clearly indicate when information was published (month and year)
- For each fact/statistic, include the publication date
- If data is older than 6 months, flag it as potentially outdated
- Format all sources as clickable markdown links: [Source Name](URL)

Format your response with clear headings for each section.
Include markdown formatting for better readability.
";

const TITLES_TEMPLATE: &str = "\
You're an expert content strategist. Suggest 5 engaging blog title options about {topic}.
The titles should be:
- SEO-friendly
- Appealing to readers
- Reflective of current trends (mention if relevant)

Format your response as a numbered list with no additional commentary.

Example format:
1. Title One [Trending in 2025]
2. Title Two
3. Title Three
";

const KEYWORDS_TEMPLATE: &str = "\
Suggest 10-15 relevant keywords and important concepts that should be included
in a blog post titled: {title}

Include:
- Current year ({current_year}) where relevant
- Trending terms related to the topic
- Long-tail keywords

Format as a comma-separated list with no additional commentary.
";

const BLOG_TEMPLATE: &str = "\
Write a comprehensive, SEO-optimized blog post with the following details:

Title: {title}
Keywords to include: {keywords}
Word limit: Approximately {word_limit} words
Current date: {current_date}

Requirements:
- Target approximately {word_limit} words
- Use markdown formatting
- Include headings (H2, H3) for proper structure
- Write in a professional yet engaging tone
- Include relevant examples where appropriate
- End with a conclusion and call-to-action
- Format all sources as clickable markdown links: [Source Name](URL)

STRICT CURRENT INFORMATION REQUIREMENTS:
- Clearly state the publication date for all facts/statistics
- If using older data, explain why it's still relevant
- Include at least 3 recent (last 6 months) references with clickable links
- For time-sensitive topics, note when readers should check for updates

Structure:
# [Title]
*Last updated: [Month Year]*

## Introduction
## [Main Section 1]
## [Main Section 2]
## Conclusion
## References
";

const QA_TEMPLATE: &str = "\
Today's date is {current_date}. Based on the following blog content, generate a comprehensive Q&A section:

{blog_content}

Create 5-8 thoughtful questions a reader might have after reading this content,
and provide detailed answers using information from the blog.

For each answer:
- Note how current the information is
- If data is older than 6 months, suggest checking for updates
- Include reference dates for all facts
- Format all sources as clickable markdown links: [Source Name](URL)

Format as:

## Frequently Asked Questions (Updated {current_date})

### [Question 1]
[Answer 1 with date references and clickable links]

### [Question 2]
[Answer 2 with date references and clickable links]
";

const CHAT_WITH_REFERENCE_TEMPLATE: &str = "\
**Current Date**: {current_date}

**Blog Content Reference**:
{blog_content}

**Conversation History**:
{history}

**User Question**: {user_input}

**Instructions**:
- Answer specifically about the referenced blog content
- Include dates for any facts/statistics
- Flag potentially outdated information
- Format sources as [Source](URL)
- Keep responses professional but conversational

**Response**:
";

const CHAT_GENERAL_TEMPLATE: &str = "\
**Current Date**: {current_date}

**Conversation History**:
{history}

**User Message**: {user_input}

**Response**:
";

/// The templates the registry knows how to render: one per pipeline stage,
/// plus the blog-grounded and general chat variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Research,
    Titles,
    Keywords,
    Blog,
    Qa,
    ChatWithReference,
    ChatGeneral,
}

impl PromptKind {
    pub fn name(&self) -> &'static str {
        match self {
            PromptKind::Research => "research",
            PromptKind::Titles => "titles",
            PromptKind::Keywords => "keywords",
            PromptKind::Blog => "blog",
            PromptKind::Qa => "qa",
            PromptKind::ChatWithReference => "chat_with_reference",
            PromptKind::ChatGeneral => "chat_general",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            PromptKind::Research => RESEARCH_TEMPLATE,
            PromptKind::Titles => TITLES_TEMPLATE,
            PromptKind::Keywords => KEYWORDS_TEMPLATE,
            PromptKind::Blog => BLOG_TEMPLATE,
            PromptKind::Qa => QA_TEMPLATE,
            PromptKind::ChatWithReference => CHAT_WITH_REFERENCE_TEMPLATE,
            PromptKind::ChatGeneral => CHAT_GENERAL_TEMPLATE,
        }
    }

    /// Parameter names that must be present for rendering to succeed.
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            PromptKind::Research => &[PARAM_TOPIC, PARAM_CURRENT_DATE],
            PromptKind::Titles => &[PARAM_TOPIC],
            PromptKind::Keywords => &[PARAM_TITLE, PARAM_CURRENT_YEAR],
            PromptKind::Blog => &[
                PARAM_TITLE,
                PARAM_KEYWORDS,
                PARAM_WORD_LIMIT,
                PARAM_CURRENT_DATE,
            ],
            PromptKind::Qa => &[PARAM_BLOG_CONTENT, PARAM_CURRENT_DATE],
            PromptKind::ChatWithReference => &[
                PARAM_CURRENT_DATE,
                PARAM_BLOG_CONTENT,
                PARAM_HISTORY,
                PARAM_USER_INPUT,
            ],
            PromptKind::ChatGeneral => &[PARAM_CURRENT_DATE, PARAM_HISTORY, PARAM_USER_INPUT],
        }
    }
}

/// Named parameters supplied to a render call.
#[derive(Debug, Clone, Default)]
pub struct PromptParams(HashMap<&'static str, String>);

impl PromptParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.0.insert(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Render the request text for a template.
///
/// Fails with `MissingParameter` if any declared parameter is absent. No
/// stage-specific business logic lives here beyond string interpolation.
pub fn render(kind: PromptKind, params: &PromptParams) -> Result<String, QuillError> {
    let mut rendered = kind.template().to_string();
    for &name in kind.required_params() {
        let value = params.get(name).ok_or(QuillError::MissingParameter {
            template: kind.name(),
            name,
        })?;
        rendered = rendered.replace(&format!("{{{}}}", name), value);
    }
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_research() {
        let params = PromptParams::new()
            .with(PARAM_TOPIC, "EV industry")
            .with(PARAM_CURRENT_DATE, "2025-06-01");
        let text = render(PromptKind::Research, &params).unwrap();
        assert!(text.contains("EV industry"));
        assert!(text.contains("Today's date is 2025-06-01"));
        assert!(!text.contains("{topic}"));
    }

    #[test]
    fn test_render_missing_parameter() {
        let params = PromptParams::new().with(PARAM_TOPIC, "EV industry");
        let err = render(PromptKind::Research, &params).unwrap_err();
        assert_eq!(
            err,
            QuillError::MissingParameter {
                template: "research",
                name: PARAM_CURRENT_DATE,
            }
        );
    }

    #[test]
    fn test_render_blog_interpolates_all_params() {
        let params = PromptParams::new()
            .with(PARAM_TITLE, "Future of EVs")
            .with(PARAM_KEYWORDS, "ev, battery, 2025")
            .with(PARAM_WORD_LIMIT, "800")
            .with(PARAM_CURRENT_DATE, "June 2025");
        let text = render(PromptKind::Blog, &params).unwrap();
        assert!(text.contains("Title: Future of EVs"));
        assert!(text.contains("Approximately 800 words"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_chat_general_omits_reference_section() {
        let params = PromptParams::new()
            .with(PARAM_CURRENT_DATE, "2025-06-01")
            .with(PARAM_HISTORY, "User: hi\nAssistant: hello")
            .with(PARAM_USER_INPUT, "what next?");
        let text = render(PromptKind::ChatGeneral, &params).unwrap();
        assert!(!text.contains("Blog Content Reference"));
        assert!(text.contains("**User Message**: what next?"));
    }
}
