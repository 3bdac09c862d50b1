//! Contracts with the external collaborators: ranking data, on-page data,
//! text generation and session persistence.
//!
//! The engine only ever talks to these traits. Concrete HTTP adapters live
//! in [`crate::providers`], the SQLite store in [`crate::database`].

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::brief::BriefStep;
use crate::session::{SessionState, SessionSummary};
use crate::types::{
    ContentBrief, Keyword, LengthConstraints, MarketSettings, OnPageElements, OutlineItem,
    SerpResult,
};

/// Text the legacy on-page scraper put in `Full_Text` when it gave up
pub const LEGACY_PARSE_FAILURE_TEXT: &str = "Could not parse";
/// Value the legacy on-page scraper put in `H1s[0]` when it gave up
pub const LEGACY_PARSE_FAILED_HEADING: &str = "PARSE_FAILED";

#[async_trait]
pub trait RankingService: Send + Sync {
    /// Ranked organic URLs plus "People Also Ask" questions for one keyword
    async fn get_serp_urls(&self, keyword: &str, market: &MarketSettings) -> anyhow::Result<SerpResult>;
}

/// Result of scraping one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnPageOutcome {
    Parsed(OnPageElements),
    Failed { reason: String },
}

impl OnPageOutcome {
    /// Map a payload that may carry the old sentinel values onto a tagged outcome
    pub fn from_legacy(elements: OnPageElements) -> Self {
        if elements.full_text.trim_start().starts_with(LEGACY_PARSE_FAILURE_TEXT) {
            return OnPageOutcome::Failed {
                reason: elements.full_text,
            };
        }
        if elements.h1s.first().map(String::as_str) == Some(LEGACY_PARSE_FAILED_HEADING) {
            return OnPageOutcome::Failed {
                reason: "page content could not be parsed".to_string(),
            };
        }
        OnPageOutcome::Parsed(elements)
    }
}

#[async_trait]
pub trait OnPageService: Send + Sync {
    async fn get_on_page_elements(&self, url: &str) -> anyhow::Result<OnPageOutcome>;
}

/// Everything a brief step prompt may draw on
#[derive(Debug, Clone, Serialize)]
pub struct BriefStepRequest {
    pub step: BriefStep,
    pub competitor_data_json: String,
    pub subject_info: String,
    pub brand_info: String,
    /// Combined subject/brand/file/URL text, step 1 only
    pub context_text: Option<String>,
    pub previous_steps_data: ContentBrief,
    pub ground_truth_text: String,
    pub user_feedback: Option<String>,
    pub available_keywords: Option<Vec<Keyword>>,
    pub template_headings: Option<Vec<String>>,
    pub length_constraints: Option<LengthConstraints>,
    pub paa_questions: Option<Vec<String>>,
    pub is_regeneration: bool,
    pub language: String,
}

/// Follow-up instruction when a section missed its length target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LengthCorrection {
    Expand {
        current_body: String,
        current_words: usize,
        shortfall: usize,
        minimum_words: usize,
    },
    Trim {
        current_body: String,
        current_words: usize,
        target_words: usize,
    },
}

/// Request for the body of one article section
#[derive(Debug, Clone, Serialize)]
pub struct SectionRequest {
    pub brief: ContentBrief,
    pub content_so_far: String,
    pub section: OutlineItem,
    pub upcoming_headings: Vec<String>,
    pub language: String,
    pub global_word_target: Option<u32>,
    pub words_written_so_far: usize,
    pub total_sections: usize,
    pub current_section_index: usize,
    pub strict_mode: bool,
    pub correction: Option<LengthCorrection>,
}

/// Request for a single replacement paragraph
#[derive(Debug, Clone, Serialize)]
pub struct ParagraphRequest {
    pub brief: ContentBrief,
    pub original_paragraph: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
    pub section_heading: Option<String>,
    pub section_guidelines: Vec<String>,
    pub feedback: String,
    pub language: String,
}

/// Ordered stream of text chunks
pub type TextStream = BoxStream<'static, anyhow::Result<String>>;

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce the brief section for `request.step`, as a partial brief
    async fn generate_brief_step(&self, request: &BriefStepRequest) -> anyhow::Result<ContentBrief>;

    /// Stream the body text of one section
    async fn generate_section(&self, request: &SectionRequest) -> anyhow::Result<TextStream>;

    async fn regenerate_paragraph(&self, request: &ParagraphRequest) -> anyhow::Result<String>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, state: &SessionState) -> anyhow::Result<()>;
    async fn load(&self, id: &str) -> anyhow::Result<Option<SessionState>>;
    async fn list(&self) -> anyhow::Result<Vec<SessionSummary>>;
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}
