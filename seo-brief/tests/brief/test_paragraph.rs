//! Tests for single-paragraph rewrites

use super::common::*;
use seo_brief::article::*;
use seo_brief::error::BriefError;
use seo_brief::types::KeywordStrategy;

const DOC: &str = "## Fit and Sizing\n\
\n\
Trail shoes should fit snugly.\n\
\n\
Leave a thumb's width at the toe.\n\
\n\
## Grip\n\
\n\
Deep lugs bite into mud.";

fn sized_brief() -> seo_brief::types::ContentBrief {
    let mut fit = section("Fit and sizing", None);
    fit.guidelines = vec!["Explain half sizes".to_string()];
    let mut brief = brief_with(vec![fit, section("Grip", None)], &[]);
    brief.keyword_strategy = Some(KeywordStrategy {
        primary_keyword: "trail shoes".to_string(),
        ..Default::default()
    });
    brief
}

#[test]
fn test_context_around_the_paragraph() {
    let ctx = paragraph_context(DOC, 4, &sized_brief()).unwrap();

    assert_eq!(ctx.original, "Leave a thumb's width at the toe.");
    assert_eq!(ctx.before, vec!["Trail shoes should fit snugly."]);
    assert_eq!(ctx.after, vec!["Deep lugs bite into mud."]);
    assert_eq!(ctx.heading.as_deref(), Some("Fit and Sizing"));
    // Outline match ignores case
    assert_eq!(ctx.guidelines, vec!["Explain half sizes"]);
}

#[test]
fn test_context_is_capped_at_five_lines_per_side() {
    let doc = (0..12).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
    let ctx = paragraph_context(&doc, 6, &Default::default()).unwrap();

    assert_eq!(ctx.before, vec!["line 1", "line 2", "line 3", "line 4", "line 5"]);
    assert_eq!(ctx.after, vec!["line 7", "line 8", "line 9", "line 10", "line 11"]);
    assert!(ctx.heading.is_none());
    assert!(ctx.guidelines.is_empty());
}

#[tokio::test]
async fn test_regenerate_and_splice() {
    let generator = FakeGenerator {
        paragraph_reply: "  Go half a size up for long descents.\n".to_string(),
        ..Default::default()
    };

    let text = regenerate_paragraph(&generator, &sized_brief(), DOC, 4, "mention downhill", "English")
        .await
        .unwrap();
    assert_eq!(text, "Go half a size up for long descents.");

    let requests = generator.paragraph_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].feedback, "mention downhill");
    assert_eq!(requests[0].section_heading.as_deref(), Some("Fit and Sizing"));

    let updated = splice_paragraph(DOC, 4, &text);
    assert!(updated.contains("Go half a size up"));
    assert!(!updated.contains("thumb's width"));
    assert_eq!(updated.lines().count(), DOC.lines().count());
}

#[tokio::test]
async fn test_rejects_headings_and_empty_feedback() {
    let generator = FakeGenerator::default();

    let err = regenerate_paragraph(&generator, &sized_brief(), DOC, 0, "shorter", "English")
        .await
        .unwrap_err();
    assert!(matches!(err, BriefError::Validation(_)));

    let err = regenerate_paragraph(&generator, &sized_brief(), DOC, 2, "   ", "English")
        .await
        .unwrap_err();
    assert!(matches!(err, BriefError::Validation(_)));

    assert!(generator.paragraph_requests.lock().unwrap().is_empty());
}
