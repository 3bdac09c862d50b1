//! Common fakes and fixtures for brief engine tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use seo_brief::brief::BriefStep;
use seo_brief::services::{
    BriefStepRequest, GenerationService, OnPageOutcome, OnPageService, ParagraphRequest,
    RankingService, SectionRequest, TextStream,
};
use seo_brief::types::*;

// ============================================================================
// Ranking and on-page fakes
// ============================================================================

/// Returns a fixed SERP per keyword and records every lookup
#[derive(Default)]
pub struct ScriptedRanking {
    pub serps: HashMap<String, SerpResult>,
    pub fail_for: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedRanking {
    pub fn with(mut self, keyword: &str, urls: &[(&str, u32)], paa: &[&str]) -> Self {
        self.serps.insert(
            keyword.to_string(),
            SerpResult {
                urls: urls
                    .iter()
                    .map(|(url, rank)| RankedUrl {
                        url: url.to_string(),
                        rank: *rank,
                    })
                    .collect(),
                paa_questions: paa.iter().map(|q| q.to_string()).collect(),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RankingService for ScriptedRanking {
    async fn get_serp_urls(&self, keyword: &str, _market: &MarketSettings) -> anyhow::Result<SerpResult> {
        self.calls.lock().unwrap().push(keyword.to_string());
        if self.fail_for.as_deref() == Some(keyword) {
            anyhow::bail!("quota exceeded");
        }
        Ok(self.serps.get(keyword).cloned().unwrap_or_default())
    }
}

/// Parses every page to a small fixed document unless told otherwise
#[derive(Default)]
pub struct ScriptedOnPage {
    pub failed_urls: Vec<String>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedOnPage {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OnPageService for ScriptedOnPage {
    async fn get_on_page_elements(&self, url: &str) -> anyhow::Result<OnPageOutcome> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.failed_urls.iter().any(|u| u == url) {
            return Ok(OnPageOutcome::from_legacy(OnPageElements {
                full_text: "Could not parse the page".to_string(),
                ..Default::default()
            }));
        }
        Ok(OnPageOutcome::Parsed(OnPageElements {
            h1s: vec![format!("Page {}", url)],
            h2s: vec!["Fit".to_string(), "Grip".to_string()],
            h3s: Vec::new(),
            word_count: 4,
            full_text: format!("Full text of {}", url),
        }))
    }
}

// ============================================================================
// Generation fake
// ============================================================================

/// Counts calls, answers brief steps with a canned section and streams
/// section bodies of scripted lengths
#[derive(Default)]
pub struct FakeGenerator {
    /// Word counts handed out to successive section calls (default 50)
    pub section_words: Mutex<VecDeque<usize>>,
    /// Zero-based section call that fails
    pub fail_section_call: Option<usize>,
    pub fail_step: Option<BriefStep>,
    pub outline: Vec<OutlineItem>,
    pub paragraph_reply: String,
    pub brief_requests: Mutex<Vec<BriefStepRequest>>,
    pub section_requests: Mutex<Vec<SectionRequest>>,
    pub paragraph_requests: Mutex<Vec<ParagraphRequest>>,
}

impl FakeGenerator {
    pub fn with_section_words(words: &[usize]) -> Self {
        Self {
            section_words: Mutex::new(words.iter().copied().collect()),
            ..Default::default()
        }
    }

    pub fn brief_calls(&self) -> usize {
        self.brief_requests.lock().unwrap().len()
    }

    pub fn brief_requests(&self) -> Vec<BriefStepRequest> {
        self.brief_requests.lock().unwrap().clone()
    }

    pub fn section_calls(&self) -> usize {
        self.section_requests.lock().unwrap().len()
    }

    pub fn section_requests(&self) -> Vec<SectionRequest> {
        self.section_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate_brief_step(&self, request: &BriefStepRequest) -> anyhow::Result<ContentBrief> {
        self.brief_requests.lock().unwrap().push(request.clone());
        if self.fail_step == Some(request.step) {
            anyhow::bail!("model overloaded");
        }
        Ok(partial_brief(request.step, &self.outline))
    }

    async fn generate_section(&self, request: &SectionRequest) -> anyhow::Result<TextStream> {
        let call = {
            let mut requests = self.section_requests.lock().unwrap();
            requests.push(request.clone());
            requests.len() - 1
        };
        if self.fail_section_call == Some(call) {
            anyhow::bail!("stream reset");
        }
        let words = self.section_words.lock().unwrap().pop_front().unwrap_or(50);
        let chunks: Vec<anyhow::Result<String>> = body_of(words)
            .split_inclusive(' ')
            .collect::<Vec<_>>()
            .chunks(7)
            .map(|c| Ok(c.concat()))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn regenerate_paragraph(&self, request: &ParagraphRequest) -> anyhow::Result<String> {
        self.paragraph_requests.lock().unwrap().push(request.clone());
        Ok(self.paragraph_reply.clone())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// `n` words of filler text
pub fn body_of(n: usize) -> String {
    vec!["word"; n].join(" ")
}

/// The section a brief step writes, with recognisable content
pub fn partial_brief(step: BriefStep, outline: &[OutlineItem]) -> ContentBrief {
    let mut brief = ContentBrief::default();
    match step {
        BriefStep::GoalAndAudience => {
            brief.goal_and_audience = Some(GoalAndAudience {
                page_goal: "Rank for trail shoes".to_string(),
                target_audience: "Trail runners".to_string(),
                search_intent: "commercial".to_string(),
            })
        }
        BriefStep::KeywordStrategy => {
            brief.keyword_strategy = Some(KeywordStrategy {
                primary_keyword: "trail shoes".to_string(),
                ..Default::default()
            })
        }
        BriefStep::CompetitiveAnalysis => {
            brief.competitive_analysis = Some(CompetitiveAnalysis::default())
        }
        BriefStep::ContentGaps => brief.content_gaps = Some(ContentGaps::default()),
        BriefStep::Structure => {
            brief.article_structure = Some(ArticleStructure {
                word_count_target: None,
                outline: outline.to_vec(),
            })
        }
        BriefStep::Faqs => brief.faqs = Some(Faqs::default()),
        BriefStep::OnPageSeo => {
            brief.on_page_seo = Some(OnPageSeo {
                title_tag: "Best Trail Shoes".to_string(),
                ..Default::default()
            })
        }
    }
    brief
}

pub fn keywords() -> Vec<Keyword> {
    vec![Keyword::new("trail shoes", 900), Keyword::new("running shoes", 300)]
}

pub fn competitor(url: &str, score: u64) -> CompetitorPage {
    CompetitorPage::from_parts(
        url.to_string(),
        score,
        vec![Ranking {
            keyword: "trail shoes".to_string(),
            rank: 1,
            volume: 900,
        }],
        OnPageElements {
            h1s: vec!["Trail Shoes".to_string()],
            full_text: format!("Everything {} says about trail shoes", url),
            word_count: 6,
            ..Default::default()
        },
    )
}

/// Outline item with an explicit word target
pub fn section(heading: &str, target: Option<u32>) -> OutlineItem {
    let mut item = OutlineItem::new(heading, HeadingLevel::H2);
    item.target_word_count = target;
    item
}

/// Brief holding only an outline and FAQs
pub fn brief_with(outline: Vec<OutlineItem>, faqs: &[&str]) -> ContentBrief {
    ContentBrief {
        article_structure: Some(ArticleStructure {
            word_count_target: None,
            outline,
        }),
        faqs: (!faqs.is_empty()).then(|| Faqs {
            questions: faqs
                .iter()
                .map(|q| FaqItem {
                    question: q.to_string(),
                    guidance: String::new(),
                })
                .collect(),
        }),
        ..Default::default()
    }
}
