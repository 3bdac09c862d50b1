//! Tests for competitor scoring and the analysis run

use super::common::*;
use seo_brief::analysis::*;
use seo_brief::cancel::CancellationToken;
use seo_brief::error::BriefError;
use seo_brief::types::{Keyword, MarketSettings, Ranking};
use seo_brief_sdk::ActivityLog;
use std::sync::Arc;
use std::time::Duration;

fn no_delay() -> AnalysisConfig {
    AnalysisConfig {
        request_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn engine(ranking: &Arc<ScriptedRanking>, on_page: &Arc<ScriptedOnPage>, config: AnalysisConfig) -> AnalysisEngine {
    AnalysisEngine::new(ranking.clone(), on_page.clone(), config)
}

// ============================================================================
// Scoring
// ============================================================================

#[tokio::test]
async fn test_single_keyword_single_result() {
    let ranking = Arc::new(ScriptedRanking::default().with("x", &[("https://a.com", 1)], &[]));
    let on_page = Arc::new(ScriptedOnPage::default());
    let mut log = ActivityLog::new();

    let output = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("x", 1000)],
            &MarketSettings::default(),
            &mut log,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.competitors.len(), 1);
    let page = &output.competitors[0];
    assert_eq!(page.url, "https://a.com");
    assert_eq!(page.weighted_score, 10000);
    assert_eq!(
        page.rankings,
        vec![Ranking {
            keyword: "x".to_string(),
            rank: 1,
            volume: 1000
        }]
    );
    assert!(!page.is_starred);
}

#[tokio::test]
async fn test_rank_beyond_ten_adds_nothing() {
    let ranking = Arc::new(
        ScriptedRanking::default()
            .with("a", &[("https://a.com", 1)], &[])
            .with("b", &[("https://a.com", 12)], &[]),
    );
    let on_page = Arc::new(ScriptedOnPage::default());

    let output = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("a", 100), Keyword::new("b", 50)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let page = &output.competitors[0];
    assert_eq!(page.weighted_score, 1000);
    assert_eq!(page.rankings.len(), 2);
    assert_eq!(weighted_score(&page.rankings), page.weighted_score);
}

#[tokio::test]
async fn test_top_competitors_only_are_fetched() {
    let ranking = Arc::new(ScriptedRanking::default().with(
        "trail shoes",
        &[("https://c.com", 3), ("https://a.com", 1), ("https://b.com", 2)],
        &["Are trail shoes worth it?"],
    ));
    let on_page = Arc::new(ScriptedOnPage::default());
    let config = AnalysisConfig {
        request_delay: Duration::ZERO,
        max_competitors: 2,
    };

    let output = engine(&ranking, &on_page, config)
        .run_analysis(
            &[Keyword::new("trail shoes", 900)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let urls: Vec<&str> = output.competitors.iter().map(|c| c.url.as_str()).collect();
    assert_eq!(urls, vec!["https://a.com", "https://b.com"]);
    assert_eq!(on_page.calls(), vec!["https://a.com", "https://b.com"]);
    assert_eq!(output.paa_questions, vec!["Are trail shoes worth it?"]);
}

#[tokio::test]
async fn test_paa_questions_merge_across_keywords() {
    let ranking = Arc::new(
        ScriptedRanking::default()
            .with("a", &[("https://a.com", 1)], &["Q1", "Q2"])
            .with("b", &[("https://a.com", 2)], &["Q2", "Q3"]),
    );
    let on_page = Arc::new(ScriptedOnPage::default());

    let output = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("a", 10), Keyword::new("b", 10)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(output.paa_questions, vec!["Q1", "Q2", "Q3"]);
}

#[tokio::test]
async fn test_duplicate_keywords_are_fetched_once() {
    let ranking = Arc::new(ScriptedRanking::default().with("Trail Shoes", &[("https://a.com", 1)], &[]));
    let on_page = Arc::new(ScriptedOnPage::default());

    let output = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("Trail Shoes", 900), Keyword::new("trail shoes ", 10)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(ranking.calls(), vec!["Trail Shoes"]);
    assert_eq!(output.competitors[0].weighted_score, 9000);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_empty_keywords_rejected_before_any_call() {
    let ranking = Arc::new(ScriptedRanking::default());
    let on_page = Arc::new(ScriptedOnPage::default());

    let err = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BriefError::Validation(_)));
    assert!(ranking.calls().is_empty());
}

#[tokio::test]
async fn test_ranking_failure_aborts_and_logs() {
    let ranking = Arc::new(ScriptedRanking {
        fail_for: Some("b".to_string()),
        ..ScriptedRanking::default().with("a", &[("https://a.com", 1)], &[])
    });
    let on_page = Arc::new(ScriptedOnPage::default());
    let mut log = ActivityLog::new();

    let err = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("a", 10), Keyword::new("b", 10)],
            &MarketSettings::default(),
            &mut log,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BriefError::ExternalService { .. }));
    assert!(err.to_string().contains("quota exceeded"));
    assert!(on_page.calls().is_empty());
    assert!(log.messages().any(|m| m.starts_with("Analysis aborted")));
}

#[tokio::test]
async fn test_unparseable_page_aborts() {
    let ranking = Arc::new(ScriptedRanking::default().with("a", &[("https://a.com", 1)], &[]));
    let on_page = Arc::new(ScriptedOnPage {
        failed_urls: vec!["https://a.com".to_string()],
        ..Default::default()
    });

    let err = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("a", 10)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        BriefError::ExternalService { service, message } => {
            assert_eq!(service, "on-page service");
            assert!(message.contains("Could not parse"));
        }
        other => panic!("expected external service error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_run_stops() {
    let ranking = Arc::new(ScriptedRanking::default().with("a", &[("https://a.com", 1)], &[]));
    let on_page = Arc::new(ScriptedOnPage::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine(&ranking, &on_page, no_delay())
        .run_analysis(
            &[Keyword::new("a", 10)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(err, BriefError::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_after_every_call() {
    let ranking = Arc::new(
        ScriptedRanking::default()
            .with("a", &[("https://a.com", 1)], &[])
            .with("b", &[("https://a.com", 2)], &[]),
    );
    let on_page = Arc::new(ScriptedOnPage::default());
    let config = AnalysisConfig {
        request_delay: Duration::from_millis(1000),
        ..Default::default()
    };

    let started = tokio::time::Instant::now();
    engine(&ranking, &on_page, config)
        .run_analysis(
            &[Keyword::new("a", 10), Keyword::new("b", 10)],
            &MarketSettings::default(),
            &mut ActivityLog::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    // Two SERP calls and one on-page call
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

// ============================================================================
// Ground truth and stars
// ============================================================================

#[test]
fn test_ground_truth_starred_first_then_score() {
    let mut competitors = vec![
        competitor("https://a.com", 100),
        competitor("https://b.com", 300),
        competitor("https://c.com", 200),
        competitor("https://d.com", 50),
    ];
    assert_eq!(toggle_star(&mut competitors, "https://d.com"), Some(true));

    let urls: Vec<&str> = get_ground_truth_competitors(&competitors)
        .iter()
        .map(|c| c.url.as_str())
        .collect();
    assert_eq!(urls, vec!["https://d.com", "https://b.com", "https://c.com"]);
}

#[test]
fn test_toggle_star_leaves_scores_alone() {
    let mut competitors = vec![competitor("https://a.com", 100)];

    assert_eq!(toggle_star(&mut competitors, "https://missing.com"), None);
    assert_eq!(toggle_star(&mut competitors, "https://a.com"), Some(true));
    assert_eq!(toggle_star(&mut competitors, "https://a.com"), Some(false));
    assert_eq!(competitors[0].weighted_score, 100);
}

#[test]
fn test_full_text_only_when_asked() {
    let competitors = vec![competitor("https://a.com", 100)];

    assert!(competitor_data_json(&competitors, true).contains("Full_Text"));
    assert!(!competitor_data_json(&competitors, false).contains("Full_Text"));
    assert!(ground_truth_text(&competitors).contains("Everything https://a.com says"));
}
