//! Stage Pipeline Coordinator
//!
//! State machine over the five generation stages (Research, Titles, Keywords,
//! Blog, Q&A). Enforces each stage's input preconditions, caches completed
//! artifacts keyed by input equality, and invalidates downstream stages when
//! an upstream input changes. All artifacts and stage states are owned by the
//! coordinator; callers trigger transitions and observe state, nothing else.

use crate::error::QuillError;
use crate::format;
use crate::prompt::{self, PromptKind, PromptParams};
use crate::provider::{CompletionClient, ModelConfig};
use crate::types::{StageArtifact, StageKind, WordLimit};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Lifecycle of a single stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageState {
    NotStarted,
    InProgress,
    Completed(StageArtifact),
    Failed(QuillError),
}

impl StageState {
    pub fn is_completed(&self) -> bool {
        matches!(self, StageState::Completed(_))
    }
}

/// Per-stage slot: current state plus the input values the cached artifact
/// was generated from. Cache validity is input equality, not mere presence.
#[derive(Debug, Clone)]
struct StageSlot {
    state: StageState,
    inputs: Vec<String>,
}

impl StageSlot {
    fn new() -> Self {
        Self {
            state: StageState::NotStarted,
            inputs: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.state = StageState::NotStarted;
        self.inputs.clear();
    }
}

/// Owns one pipeline run: the input parameters, the five stage slots, and the
/// model configuration passed to the completion client.
#[derive(Debug)]
pub struct PipelineCoordinator {
    model: ModelConfig,
    topic: Option<String>,
    selected_title: Option<String>,
    keywords: Option<String>,
    word_limit: WordLimit,
    research: StageSlot,
    titles: StageSlot,
    keyword_suggestions: StageSlot,
    blog: StageSlot,
    qa: StageSlot,
}

impl PipelineCoordinator {
    pub fn new(model: ModelConfig) -> Self {
        Self {
            model,
            topic: None,
            selected_title: None,
            keywords: None,
            word_limit: WordLimit::default(),
            research: StageSlot::new(),
            titles: StageSlot::new(),
            keyword_suggestions: StageSlot::new(),
            blog: StageSlot::new(),
            qa: StageSlot::new(),
        }
    }

    fn slot(&self, kind: StageKind) -> &StageSlot {
        match kind {
            StageKind::Research => &self.research,
            StageKind::Titles => &self.titles,
            StageKind::Keywords => &self.keyword_suggestions,
            StageKind::Blog => &self.blog,
            StageKind::Qa => &self.qa,
        }
    }

    fn slot_mut(&mut self, kind: StageKind) -> &mut StageSlot {
        match kind {
            StageKind::Research => &mut self.research,
            StageKind::Titles => &mut self.titles,
            StageKind::Keywords => &mut self.keyword_suggestions,
            StageKind::Blog => &mut self.blog,
            StageKind::Qa => &mut self.qa,
        }
    }

    /// Reset `from` and every stage after it in pipeline order.
    fn invalidate_from(&mut self, from: StageKind) {
        let start = StageKind::ALL.iter().position(|k| *k == from).unwrap_or(0);
        for kind in &StageKind::ALL[start..] {
            self.slot_mut(*kind).reset();
        }
    }

    // ------------------------------------------------------------------
    // Input setters. Each setter performs the invalidation its parameter
    // transitively implies; stage functions never invalidate on their own.
    // ------------------------------------------------------------------

    /// Set the pipeline topic. Changing it discards every cached artifact.
    pub fn set_topic(&mut self, topic: &str) -> Result<(), QuillError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(QuillError::InvalidParameter {
                name: "topic",
                message: "topic must be non-empty".to_string(),
            });
        }
        if self.topic.as_deref() != Some(topic) {
            self.invalidate_from(StageKind::Research);
            self.selected_title = None;
            self.keywords = None;
            self.topic = Some(topic.to_string());
        }
        Ok(())
    }

    /// Select the title driving the Keywords and Blog stages. May come from
    /// the parsed title candidates or be user-supplied custom text.
    pub fn select_title(&mut self, title: &str) -> Result<(), QuillError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(QuillError::InvalidParameter {
                name: "selected_title",
                message: "selected title must be non-empty".to_string(),
            });
        }
        if self.selected_title.as_deref() != Some(title) {
            self.invalidate_from(StageKind::Keywords);
            self.selected_title = Some(title.to_string());
        }
        Ok(())
    }

    /// Set the comma-delimited keyword string, machine-suggested or
    /// user-edited. Free text, never re-parsed into structured entities.
    pub fn set_keywords(&mut self, keywords: &str) -> Result<(), QuillError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(QuillError::InvalidParameter {
                name: "keywords",
                message: "keywords must be non-empty".to_string(),
            });
        }
        if self.keywords.as_deref() != Some(keywords) {
            self.invalidate_from(StageKind::Blog);
            self.keywords = Some(keywords.to_string());
        }
        Ok(())
    }

    /// Set the target blog length.
    pub fn set_word_limit(&mut self, limit: u32) -> Result<(), QuillError> {
        let limit = WordLimit::new(limit)?;
        if self.word_limit != limit {
            self.invalidate_from(StageKind::Blog);
            self.word_limit = limit;
        }
        Ok(())
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn selected_title(&self) -> Option<&str> {
        self.selected_title.as_deref()
    }

    pub fn keywords(&self) -> Option<&str> {
        self.keywords.as_deref()
    }

    pub fn word_limit(&self) -> WordLimit {
        self.word_limit
    }

    // ------------------------------------------------------------------
    // Stage invocations. Each performs at most one completion call.
    // ------------------------------------------------------------------

    /// Gather current research findings for the topic.
    pub async fn research(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        self.run_stage(StageKind::Research, client).await
    }

    /// Generate the numbered title suggestions for the topic.
    pub async fn generate_titles(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        self.run_stage(StageKind::Titles, client).await
    }

    /// Suggest keywords for the selected title.
    pub async fn suggest_keywords(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        self.run_stage(StageKind::Keywords, client).await
    }

    /// Generate the full blog post from the selected title, keywords, and
    /// word limit.
    pub async fn generate_blog(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        self.run_stage(StageKind::Blog, client).await
    }

    /// Generate the Q&A section from the current blog artifact.
    ///
    /// The prompt is fed the current export (body plus any prior Q&A), and
    /// the result replaces the prior section so regeneration never
    /// accumulates duplicates. The cache key is the blog body alone, so
    /// re-invocation on an unchanged blog is idempotent.
    pub async fn generate_qa(
        &mut self,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        self.run_stage(StageKind::Qa, client).await
    }

    async fn run_stage(
        &mut self,
        kind: StageKind,
        client: &dyn CompletionClient,
    ) -> Result<StageArtifact, QuillError> {
        // Precondition guard: leaves the stage untouched on violation.
        let inputs = self.stage_inputs(kind)?;

        if let StageState::Completed(artifact) = &self.slot(kind).state {
            if self.slot(kind).inputs == inputs {
                return Ok(artifact.clone());
            }
        }

        let request_text = self.render_stage_prompt(kind, Utc::now())?;
        self.slot_mut(kind).state = StageState::InProgress;
        info!(
            stage = kind.label(),
            provider = client.provider_name(),
            "stage generation started"
        );

        match client.complete(&request_text, &self.model).await {
            Ok(text) => {
                let now = Utc::now();
                let artifact = StageArtifact::new(kind, format::stamp(&text, kind, now), now);
                let slot = self.slot_mut(kind);
                slot.state = StageState::Completed(artifact.clone());
                slot.inputs = inputs;
                info!(stage = kind.label(), "stage generation completed");
                Ok(artifact)
            }
            Err(err) => {
                warn!(stage = kind.label(), error = %err, "stage generation failed");
                let slot = self.slot_mut(kind);
                slot.state = StageState::Failed(err.clone());
                slot.inputs.clear();
                Err(err)
            }
        }
    }

    /// The input values a stage's cached artifact is keyed by. Fails with
    /// `PrecedenceViolation` when a required input or prerequisite stage is
    /// missing.
    fn stage_inputs(&self, kind: StageKind) -> Result<Vec<String>, QuillError> {
        let missing = |what: &str| QuillError::PrecedenceViolation {
            stage: kind,
            missing: what.to_string(),
        };
        match kind {
            StageKind::Research | StageKind::Titles => {
                let topic = self.topic.as_ref().ok_or_else(|| missing("topic is not set"))?;
                Ok(vec![topic.clone()])
            }
            StageKind::Keywords => {
                let title = self
                    .selected_title
                    .as_ref()
                    .ok_or_else(|| missing("selected title is not set"))?;
                Ok(vec![title.clone()])
            }
            StageKind::Blog => {
                let title = self
                    .selected_title
                    .as_ref()
                    .ok_or_else(|| missing("selected title is not set"))?;
                let keywords = self
                    .keywords
                    .as_ref()
                    .ok_or_else(|| missing("keywords are not set"))?;
                Ok(vec![
                    title.clone(),
                    keywords.clone(),
                    self.word_limit.get().to_string(),
                ])
            }
            StageKind::Qa => {
                let blog = self
                    .artifact(StageKind::Blog)
                    .ok_or_else(|| missing("blog has not been generated"))?;
                Ok(vec![blog.content.clone()])
            }
        }
    }

    fn render_stage_prompt(
        &self,
        kind: StageKind,
        now: DateTime<Utc>,
    ) -> Result<String, QuillError> {
        let params = match kind {
            StageKind::Research => PromptParams::new()
                .with(prompt::PARAM_TOPIC, self.topic.clone().unwrap_or_default())
                .with(prompt::PARAM_CURRENT_DATE, now.format("%Y-%m-%d").to_string()),
            StageKind::Titles => PromptParams::new()
                .with(prompt::PARAM_TOPIC, self.topic.clone().unwrap_or_default()),
            StageKind::Keywords => PromptParams::new()
                .with(
                    prompt::PARAM_TITLE,
                    self.selected_title.clone().unwrap_or_default(),
                )
                .with(prompt::PARAM_CURRENT_YEAR, now.format("%Y").to_string()),
            StageKind::Blog => PromptParams::new()
                .with(
                    prompt::PARAM_TITLE,
                    self.selected_title.clone().unwrap_or_default(),
                )
                .with(
                    prompt::PARAM_KEYWORDS,
                    self.keywords.clone().unwrap_or_default(),
                )
                .with(prompt::PARAM_WORD_LIMIT, self.word_limit.get().to_string())
                .with(prompt::PARAM_CURRENT_DATE, now.format("%B %Y").to_string()),
            StageKind::Qa => PromptParams::new()
                .with(
                    prompt::PARAM_BLOG_CONTENT,
                    self.export_markdown().unwrap_or_default(),
                )
                .with(prompt::PARAM_CURRENT_DATE, now.format("%B %Y").to_string()),
        };
        prompt::render(stage_prompt_kind(kind), &params)
    }

    // ------------------------------------------------------------------
    // State observation for the presentation boundary.
    // ------------------------------------------------------------------

    pub fn stage_state(&self, kind: StageKind) -> &StageState {
        &self.slot(kind).state
    }

    /// The cached artifact of a completed stage, if any.
    pub fn artifact(&self, kind: StageKind) -> Option<&StageArtifact> {
        match &self.slot(kind).state {
            StageState::Completed(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// Ordered title candidates parsed from the Titles artifact. Empty until
    /// the Titles stage completes.
    pub fn title_candidates(&self) -> Vec<String> {
        self.artifact(StageKind::Titles)
            .map(|a| parse_title_candidates(&a.content))
            .unwrap_or_default()
    }

    /// The current blog artifact with any Q&A section, as a single text blob
    /// suitable for export by the host. `None` until the blog exists.
    pub fn export_markdown(&self) -> Option<String> {
        let blog = self.artifact(StageKind::Blog)?;
        match self.artifact(StageKind::Qa) {
            Some(qa) => Some(format!("{}\n\n{}", blog.content, qa.content)),
            None => Some(blog.content.clone()),
        }
    }
}

fn stage_prompt_kind(kind: StageKind) -> PromptKind {
    match kind {
        StageKind::Research => PromptKind::Research,
        StageKind::Titles => PromptKind::Titles,
        StageKind::Keywords => PromptKind::Keywords,
        StageKind::Blog => PromptKind::Blog,
        StageKind::Qa => PromptKind::Qa,
    }
}

/// Split a Titles artifact into ordered candidate strings.
///
/// Accepts lines with or without a leading ordinal marker ("1. " or "1) "),
/// strips the marker when present, and discards blank lines. Order is
/// significant: rank 1 is the top suggestion.
pub fn parse_title_candidates(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_ordinal_marker(line).to_string())
        .collect()
}

fn strip_ordinal_marker(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(stripped) => stripped.trim_start(),
        None => line,
    }
}
