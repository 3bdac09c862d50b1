//! The analysis run: keywords in, scored competitor pages out.
//!
//! Every external call is awaited one at a time and followed by a fixed
//! pause so the data provider is never hit in bursts. Nothing is committed
//! until the whole run succeeds.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use seo_brief_sdk::{
    log_phase_complete, log_phase_failed, log_phase_start, log_task_complete, log_task_failed,
    log_task_start, ActivityLog,
};

use crate::analysis::scoring::{merge_paa_questions, ScoreAccumulator};
use crate::cancel::{run_cancellable, throttle, CancellationToken};
use crate::error::{BriefError, BriefResult};
use crate::services::{OnPageOutcome, OnPageService, RankingService};
use crate::types::{CompetitorPage, Keyword, MarketSettings};

pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_MAX_COMPETITORS: usize = 10;

const ANALYSIS_PHASE: usize = 0;
const TOTAL_PHASES: usize = 9;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Pause after every ranking and on-page call
    pub request_delay: Duration,
    /// How many top-scored URLs get their content fetched
    pub max_competitors: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            max_competitors: DEFAULT_MAX_COMPETITORS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutput {
    pub competitors: Vec<CompetitorPage>,
    pub paa_questions: Vec<String>,
}

pub struct AnalysisEngine {
    ranking: Arc<dyn RankingService>,
    on_page: Arc<dyn OnPageService>,
    config: AnalysisConfig,
}

/// Reject empty lists and blank keywords, collapse duplicates by join key
pub fn validate_keywords(keywords: &[Keyword]) -> BriefResult<Vec<Keyword>> {
    if keywords.is_empty() {
        return Err(BriefError::Validation(
            "at least one keyword is required".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(keywords.len());
    for kw in keywords {
        if kw.keyword.trim().is_empty() {
            return Err(BriefError::Validation("keywords must not be blank".to_string()));
        }
        if seen.insert(kw.join_key()) {
            unique.push(Keyword::new(kw.keyword.trim(), kw.volume));
        }
    }
    Ok(unique)
}

impl AnalysisEngine {
    pub fn new(
        ranking: Arc<dyn RankingService>,
        on_page: Arc<dyn OnPageService>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            ranking,
            on_page,
            config,
        }
    }

    /// Run the full analysis. On any failure the activity log records the
    /// error and no competitor data is returned.
    pub async fn run_analysis(
        &self,
        keywords: &[Keyword],
        market: &MarketSettings,
        log: &mut ActivityLog,
        cancel: &CancellationToken,
    ) -> BriefResult<AnalysisOutput> {
        let keywords = validate_keywords(keywords)?;

        log_phase_start!(ANALYSIS_PHASE, "Competitor Analysis", TOTAL_PHASES);
        match self.run_inner(&keywords, market, log, cancel).await {
            Ok(output) => {
                log_phase_complete!(ANALYSIS_PHASE, "Competitor Analysis");
                Ok(output)
            }
            Err(err) => {
                log.push(format!("Analysis aborted: {}", err));
                log_phase_failed!(ANALYSIS_PHASE, "Competitor Analysis", &err);
                Err(err)
            }
        }
    }

    async fn run_inner(
        &self,
        keywords: &[Keyword],
        market: &MarketSettings,
        log: &mut ActivityLog,
        cancel: &CancellationToken,
    ) -> BriefResult<AnalysisOutput> {
        let mut scores = ScoreAccumulator::new();
        let mut paa_questions = Vec::new();
        let total = keywords.len();

        for (i, kw) in keywords.iter().enumerate() {
            let task_id = format!("serp_{}", i + 1);
            log_task_start!(ANALYSIS_PHASE, &task_id, format!("SERP for \"{}\"", kw.keyword), total);
            log.push(format!(
                "Fetching SERP for \"{}\" ({}/{}, volume {})",
                kw.keyword,
                i + 1,
                total,
                kw.volume
            ));

            let serp = run_cancellable(cancel, self.ranking.get_serp_urls(&kw.keyword, market))
                .await?
                .map_err(|e| {
                    log_task_failed!(&task_id, format!("{:#}", e));
                    BriefError::external("ranking service", format!("\"{}\": {:#}", kw.keyword, e))
                })?;

            scores.fold(kw, &serp.urls);
            let added = merge_paa_questions(&mut paa_questions, &serp.paa_questions);
            log.push(format!(
                "Got {} ranked URLs and {} new PAA questions for \"{}\"",
                serp.urls.len(),
                added,
                kw.keyword
            ));
            log_task_complete!(&task_id, format!("{} URLs", serp.urls.len()));

            throttle(cancel, self.config.request_delay).await?;
        }

        let unique_urls = scores.len();
        let top = scores.top(self.config.max_competitors);
        log.push(format!(
            "Scored {} unique URLs, fetching content for the top {}",
            unique_urls,
            top.len()
        ));

        let mut competitors = Vec::with_capacity(top.len());
        let total = top.len();
        for (i, entry) in top.into_iter().enumerate() {
            let task_id = format!("onpage_{}", i + 1);
            log_task_start!(ANALYSIS_PHASE, &task_id, format!("Content of {}", entry.url), total);
            log.push(format!(
                "Fetching on-page content for {} ({}/{}, score {})",
                entry.url,
                i + 1,
                total,
                entry.score
            ));

            let outcome = run_cancellable(cancel, self.on_page.get_on_page_elements(&entry.url))
                .await?
                .map_err(|e| {
                    log_task_failed!(&task_id, format!("{:#}", e));
                    BriefError::external("on-page service", format!("{}: {:#}", entry.url, e))
                })?;

            let page = match outcome {
                OnPageOutcome::Parsed(page) => page,
                OnPageOutcome::Failed { reason } => {
                    log_task_failed!(&task_id, &reason);
                    return Err(BriefError::external(
                        "on-page service",
                        format!("{}: {}", entry.url, reason),
                    ));
                }
            };

            log.push(format!(
                "Parsed {}: {} words, {} H2s",
                entry.url,
                page.word_count,
                page.h2s.len()
            ));
            log_task_complete!(&task_id, format!("{} words", page.word_count));
            competitors.push(CompetitorPage::from_parts(entry.url, entry.score, entry.rankings, page));

            throttle(cancel, self.config.request_delay).await?;
        }

        log.push(format!(
            "Analysis complete: {} competitors, {} PAA questions",
            competitors.len(),
            paa_questions.len()
        ));

        Ok(AnalysisOutput {
            competitors,
            paa_questions,
        })
    }
}
