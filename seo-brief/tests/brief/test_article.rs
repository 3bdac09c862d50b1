//! Tests for article generation: section order, length correction, FAQ
//! budgets and partial results

use super::common::*;
use seo_brief::article::*;
use seo_brief::cancel::CancellationToken;
use seo_brief::error::BriefError;
use seo_brief::services::LengthCorrection;
use seo_brief::types::{HeadingLevel, LengthConstraints, OutlineItem};
use std::collections::BTreeMap;
use std::sync::Arc;

async fn generate(
    generator: &Arc<FakeGenerator>,
    outline: Vec<OutlineItem>,
    faqs: &[&str],
    constraints: &LengthConstraints,
) -> Result<seo_brief::types::GeneratedArticle, ArticleFailure> {
    ArticleGenerator::new(generator.clone())
        .generate_article(
            &brief_with(outline, faqs),
            &keywords(),
            constraints,
            "English",
            &CancellationToken::new(),
        )
        .await
}

// ============================================================================
// Length correction
// ============================================================================

#[tokio::test]
async fn test_short_section_expanded_then_long_one_trimmed() {
    let generator = Arc::new(FakeGenerator::with_section_words(&[600, 1600, 900]));

    let article = generate(
        &generator,
        vec![section("Fit", Some(1000))],
        &[],
        &LengthConstraints::default(),
    )
    .await
    .unwrap();

    let requests = generator.section_requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].correction.is_none());
    match &requests[1].correction {
        Some(LengthCorrection::Expand {
            current_words,
            shortfall,
            minimum_words,
            ..
        }) => {
            assert_eq!(*current_words, 600);
            assert_eq!(*shortfall, 400);
            assert_eq!(*minimum_words, 850);
        }
        other => panic!("expected expansion, got {:?}", other),
    }
    assert!(matches!(
        requests[2].correction,
        Some(LengthCorrection::Trim {
            current_words: 1600,
            target_words: 1000,
            ..
        })
    ));

    assert!(article.content.starts_with("## Fit\n\n"));
    assert_eq!(word_count(&article.content), 902);
}

#[tokio::test]
async fn test_body_within_range_needs_no_correction() {
    let generator = Arc::new(FakeGenerator::with_section_words(&[900]));

    generate(
        &generator,
        vec![section("Fit", Some(1000))],
        &[],
        &LengthConstraints::default(),
    )
    .await
    .unwrap();

    assert_eq!(generator.section_calls(), 1);
}

#[tokio::test]
async fn test_strict_mode_trims_earlier() {
    let outline = vec![section("Fit", Some(1000))];

    let relaxed = Arc::new(FakeGenerator::with_section_words(&[1300]));
    generate(&relaxed, outline.clone(), &[], &LengthConstraints::default())
        .await
        .unwrap();
    assert_eq!(relaxed.section_calls(), 1);

    let strict = Arc::new(FakeGenerator::with_section_words(&[1300, 1000]));
    let constraints = LengthConstraints {
        strict_mode: true,
        ..Default::default()
    };
    generate(&strict, outline, &[], &constraints).await.unwrap();
    assert_eq!(strict.section_calls(), 2);
}

#[tokio::test]
async fn test_correction_happens_at_most_once_per_direction() {
    // Expansion still comes back short: no second expansion
    let generator = Arc::new(FakeGenerator::with_section_words(&[100, 200]));

    let article = generate(
        &generator,
        vec![section("Fit", Some(1000))],
        &[],
        &LengthConstraints::default(),
    )
    .await
    .unwrap();

    assert_eq!(generator.section_calls(), 2);
    assert_eq!(word_count(&article.content), 202);
}

#[tokio::test]
async fn test_section_targets_by_heading() {
    let generator = Arc::new(FakeGenerator::with_section_words(&[300, 450]));
    let constraints = LengthConstraints {
        section_targets: BTreeMap::from([("Grip".to_string(), 500)]),
        ..Default::default()
    };

    generate(&generator, vec![section("Grip", None)], &[], &constraints)
        .await
        .unwrap();

    let requests = generator.section_requests();
    assert_eq!(requests[0].section.target_word_count, Some(500));
    assert_eq!(requests.len(), 2);
}

// ============================================================================
// Order, context and FAQs
// ============================================================================

#[tokio::test]
async fn test_sections_in_pre_order_with_lookahead() {
    let generator = Arc::new(FakeGenerator::default());
    let mut intro = section("Intro", None);
    intro.children = vec![OutlineItem::new("Why", HeadingLevel::H3)];
    let outline = vec![intro, section("Fit", None), section("Grip", None), section("Care", None)];

    let article = generate(&generator, outline, &["Are they waterproof?"], &LengthConstraints::default())
        .await
        .unwrap();

    let requests = generator.section_requests();
    let headings: Vec<&str> = requests.iter().map(|r| r.section.heading.as_str()).collect();
    assert_eq!(
        headings,
        vec!["Intro", "Why", "Fit", "Grip", "Care", "Are they waterproof?"]
    );
    assert!(requests[0].section.children.is_empty());
    assert_eq!(requests[0].upcoming_headings, vec!["Why", "Fit", "Grip"]);
    assert_eq!(requests[4].upcoming_headings, vec!["Are they waterproof?"]);
    assert!(requests.iter().all(|r| r.total_sections == 6));
    assert_eq!(requests[2].current_section_index, 2);

    // Each request sees everything written before it, heading included
    assert!(requests[1].content_so_far.contains("## Intro"));
    assert!(requests[1].content_so_far.ends_with("### Why\n\n"));

    assert_eq!(article.title, "trail shoes");
    assert!(article.content.contains("### Why\n\n"));
    assert!(article
        .content
        .contains("## Frequently Asked Questions\n\n### Are they waterproof?\n\n"));
}

#[tokio::test]
async fn test_faq_budget_spreads_what_is_left() {
    let generator = Arc::new(FakeGenerator::with_section_words(&[400, 297, 295]));
    let constraints = LengthConstraints {
        global_target: Some(1000),
        ..Default::default()
    };

    generate(&generator, vec![section("Intro", None)], &["Why?", "How?"], &constraints)
        .await
        .unwrap();

    let targets: Vec<Option<u32>> = generator
        .section_requests()
        .iter()
        .map(|r| r.section.target_word_count)
        .collect();
    // 406 words before the first question, 705 before the second
    assert_eq!(targets, vec![None, Some(297), Some(295)]);
}

#[tokio::test]
async fn test_events_follow_the_stream() {
    let generator = Arc::new(FakeGenerator::with_section_words(&[10]));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let article = ArticleGenerator::new(generator.clone())
        .with_events(tx)
        .generate_article(
            &brief_with(vec![section("Fit", None)], &[]),
            &keywords(),
            &LengthConstraints::default(),
            "English",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(
        events.first(),
        Some(&ArticleEvent::SectionStarted {
            index: 0,
            total: 1,
            heading: "Fit".to_string()
        })
    );
    assert_eq!(
        events.last(),
        Some(&ArticleEvent::SectionFinished { index: 0, words: 10 })
    );

    let streamed: String = events
        .iter()
        .filter_map(|e| match e {
            ArticleEvent::Chunk(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(streamed.trim(), article.content.trim());
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failure_keeps_the_partial_article() {
    let generator = Arc::new(FakeGenerator {
        fail_section_call: Some(1),
        ..Default::default()
    });

    let failure = generate(
        &generator,
        vec![section("Fit", None), section("Grip", None)],
        &[],
        &LengthConstraints::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(failure.error, BriefError::ExternalService { .. }));
    assert!(failure.error.to_string().contains("Grip"));
    assert!(failure.partial.content.starts_with("## Fit\n\n"));
    assert!(failure.partial.content.contains(&body_of(50)));
    assert_eq!(failure.partial.title, "trail shoes");
}

#[tokio::test]
async fn test_cancelled_before_the_first_section() {
    let generator = Arc::new(FakeGenerator::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let failure = ArticleGenerator::new(generator.clone())
        .generate_article(
            &brief_with(vec![section("Fit", None)], &[]),
            &keywords(),
            &LengthConstraints::default(),
            "English",
            &cancel,
        )
        .await
        .unwrap_err();

    assert_eq!(failure.error, BriefError::Cancelled);
    assert!(failure.partial.content.is_empty());
    assert_eq!(generator.section_calls(), 0);
}
