//! Data types shared by the analysis engine, the brief state machine and the
//! article generator.
//!
//! Competitor fields keep the capitalised names (`URL`, `Weighted_Score`,
//! `H1s`, ...) on the wire so stored sessions stay compatible with existing
//! data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Keywords & SERP data
// ============================================================================

/// A target keyword with its monthly search volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub keyword: String,
    pub volume: u64,
}

impl Keyword {
    pub fn new(keyword: impl Into<String>, volume: u64) -> Self {
        Self {
            keyword: keyword.into(),
            volume,
        }
    }

    /// Lower-cased text used to join keywords against SERP results
    pub fn join_key(&self) -> String {
        self.keyword.trim().to_lowercase()
    }
}

/// A URL at a given position on a results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedUrl {
    pub url: String,
    pub rank: u32,
}

/// Results for a single keyword
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpResult {
    pub urls: Vec<RankedUrl>,
    #[serde(default)]
    pub paa_questions: Vec<String>,
}

/// One keyword a competitor ranks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub keyword: String,
    pub rank: u32,
    pub volume: u64,
}

/// Headings and text scraped from a competitor page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnPageElements {
    #[serde(rename = "H1s", default)]
    pub h1s: Vec<String>,
    #[serde(rename = "H2s", default)]
    pub h2s: Vec<String>,
    #[serde(rename = "H3s", default)]
    pub h3s: Vec<String>,
    #[serde(rename = "Word_Count", default)]
    pub word_count: u64,
    #[serde(rename = "Full_Text", default)]
    pub full_text: String,
}

/// A competitor page aggregated across all keywords
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorPage {
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Weighted_Score")]
    pub weighted_score: u64,
    pub rankings: Vec<Ranking>,
    #[serde(rename = "H1s", default)]
    pub h1s: Vec<String>,
    #[serde(rename = "H2s", default)]
    pub h2s: Vec<String>,
    #[serde(rename = "H3s", default)]
    pub h3s: Vec<String>,
    #[serde(rename = "Word_Count", default)]
    pub word_count: u64,
    #[serde(rename = "Full_Text", default)]
    pub full_text: String,
    #[serde(default)]
    pub is_starred: bool,
}

impl CompetitorPage {
    pub fn from_parts(url: String, weighted_score: u64, rankings: Vec<Ranking>, page: OnPageElements) -> Self {
        Self {
            url,
            weighted_score,
            rankings,
            h1s: page.h1s,
            h2s: page.h2s,
            h3s: page.h3s,
            word_count: page.word_count,
            full_text: page.full_text,
            is_starred: false,
        }
    }
}

// ============================================================================
// Market & subject inputs
// ============================================================================

/// Where and in which language the analysis runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSettings {
    pub country: String,
    pub serp_language: String,
    pub output_language: String,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            country: "United States".to_string(),
            serp_language: "en".to_string(),
            output_language: "English".to_string(),
        }
    }
}

/// Free-form context the user gives about the page to write
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInputs {
    #[serde(default)]
    pub subject_info: String,
    #[serde(default)]
    pub brand_info: String,
    /// Text extracted from an uploaded reference file
    #[serde(default)]
    pub file_context: String,
    /// Reference URLs the user wants considered
    #[serde(default)]
    pub reference_urls: Vec<String>,
    /// Markdown template whose headings steer the outline
    #[serde(default)]
    pub template_markdown: Option<String>,
}

impl SubjectInputs {
    /// Combined subject, brand, file and URL context for the first brief step
    pub fn combined_context(&self) -> String {
        let mut parts = Vec::new();
        if !self.subject_info.trim().is_empty() {
            parts.push(format!("Subject:\n{}", self.subject_info.trim()));
        }
        if !self.brand_info.trim().is_empty() {
            parts.push(format!("Brand:\n{}", self.brand_info.trim()));
        }
        if !self.file_context.trim().is_empty() {
            parts.push(format!("Reference document:\n{}", self.file_context.trim()));
        }
        if !self.reference_urls.is_empty() {
            parts.push(format!("Reference URLs:\n{}", self.reference_urls.join("\n")));
        }
        parts.join("\n\n")
    }
}

// ============================================================================
// Content brief
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalAndAudience {
    #[serde(default)]
    pub page_goal: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub search_intent: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStrategy {
    #[serde(default)]
    pub primary_keyword: String,
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    #[serde(default)]
    pub long_tail_keywords: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorInsight {
    pub url: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    #[serde(default)]
    pub competitors: Vec<CompetitorInsight>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGap {
    pub topic: String,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGaps {
    #[serde(default)]
    pub gaps: Vec<ContentGap>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    #[serde(alias = "h1")]
    H1,
    #[serde(alias = "h2")]
    H2,
    #[serde(alias = "h3")]
    H3,
}

impl HeadingLevel {
    pub fn depth(self) -> usize {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }

    /// Markdown heading line for `text` at this level
    pub fn markdown(self, text: &str) -> String {
        format!("{} {}", "#".repeat(self.depth()), text)
    }
}

/// One node of the article outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineItem {
    pub heading: String,
    pub level: HeadingLevel,
    #[serde(default)]
    pub guidelines: Vec<String>,
    #[serde(default)]
    pub children: Vec<OutlineItem>,
    #[serde(default)]
    pub targeted_keywords: Vec<String>,
    #[serde(default)]
    pub competitor_coverage: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_word_count: Option<u32>,
}

impl OutlineItem {
    pub fn new(heading: impl Into<String>, level: HeadingLevel) -> Self {
        Self {
            heading: heading.into(),
            level,
            guidelines: Vec::new(),
            children: Vec::new(),
            targeted_keywords: Vec::new(),
            competitor_coverage: Vec::new(),
            target_word_count: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStructure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count_target: Option<u32>,
    #[serde(default)]
    pub outline: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub question: String,
    #[serde(default)]
    pub guidance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faqs {
    #[serde(default)]
    pub questions: Vec<FaqItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnPageSeo {
    #[serde(default)]
    pub title_tag: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub h1: String,
    #[serde(default)]
    pub url_slug: String,
}

/// The accumulating brief. Each section is written by exactly one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBrief {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_and_audience: Option<GoalAndAudience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_strategy: Option<KeywordStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_analysis: Option<CompetitiveAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_gaps: Option<ContentGaps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_structure: Option<ArticleStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Faqs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_page_seo: Option<OnPageSeo>,
}

impl ContentBrief {
    /// Merge a partial brief into this one. Sections present in `partial`
    /// overwrite, absent ones are left untouched.
    pub fn merge(&mut self, partial: ContentBrief) {
        if partial.goal_and_audience.is_some() {
            self.goal_and_audience = partial.goal_and_audience;
        }
        if partial.keyword_strategy.is_some() {
            self.keyword_strategy = partial.keyword_strategy;
        }
        if partial.competitive_analysis.is_some() {
            self.competitive_analysis = partial.competitive_analysis;
        }
        if partial.content_gaps.is_some() {
            self.content_gaps = partial.content_gaps;
        }
        if partial.article_structure.is_some() {
            self.article_structure = partial.article_structure;
        }
        if partial.faqs.is_some() {
            self.faqs = partial.faqs;
        }
        if partial.on_page_seo.is_some() {
            self.on_page_seo = partial.on_page_seo;
        }
    }

    pub fn outline(&self) -> &[OutlineItem] {
        self.article_structure
            .as_ref()
            .map(|s| s.outline.as_slice())
            .unwrap_or(&[])
    }

    pub fn primary_keyword(&self) -> Option<&str> {
        self.keyword_strategy
            .as_ref()
            .map(|k| k.primary_keyword.trim())
            .filter(|k| !k.is_empty())
    }
}

// ============================================================================
// Article
// ============================================================================

/// Word-count budget for article generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthConstraints {
    #[serde(default)]
    pub global_target: Option<u32>,
    /// Per-heading targets, used when an outline item carries none
    #[serde(default)]
    pub section_targets: BTreeMap<String, u32>,
    #[serde(default)]
    pub strict_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub content: String,
}
