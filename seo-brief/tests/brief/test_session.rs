//! Tests for session snapshots and the session stores

use super::common::*;
use seo_brief::brief::{Action, BriefStep, View};
use seo_brief::database::Database;
use seo_brief::services::SessionStore;
use seo_brief::session::{MemoryStore, SessionState};
use seo_brief::types::{GeneratedArticle, Keyword, MarketSettings, SubjectInputs};

fn rich_session() -> SessionState {
    let mut session = SessionState::new(
        "trail shoes",
        vec![
            Keyword::new("trail shoes", 900),
            Keyword::new("Waterproof Trail Shoes", 120),
            Keyword::new("running shoes", 300),
        ],
        MarketSettings {
            country: "Germany".to_string(),
            serp_language: "de".to_string(),
            output_language: "German".to_string(),
        },
        SubjectInputs {
            subject_info: "Trail running shoes".to_string(),
            template_markdown: Some("## Fit\n## Grip".to_string()),
            ..Default::default()
        },
    );
    session.competitors = vec![competitor("https://a.com", 9000)];
    session.paa_questions = vec!["Are trail shoes worth it?".to_string()];
    session.length_constraints.global_target = Some(1800);
    session.wizard.brief = brief_with(vec![section("Fit", Some(300))], &["Why?"]);
    session.wizard.step = 8;
    session.wizard.view = View::Dashboard;
    session.wizard.stale_steps.extend([4, 5]);
    session.wizard.apply(Action::SetFeedback {
        step: BriefStep::Structure,
        text: "add a care section".to_string(),
    });
    session.article = Some(GeneratedArticle {
        title: "Best Trail Shoes".to_string(),
        content: "## Fit\n\nSnug.".to_string(),
    });
    session
}

// ============================================================================
// Snapshot format
// ============================================================================

#[test]
fn test_snapshot_round_trips_byte_for_byte() {
    let session = rich_session();
    let json = serde_json::to_string(&session).unwrap();

    let restored: SessionState = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, session);
    assert_eq!(serde_json::to_string(&restored).unwrap(), json);
}

#[test]
fn test_transient_flags_are_not_persisted() {
    let mut session = rich_session();
    session.wizard.is_loading = true;
    session.wizard.is_feeling_lucky = true;
    session.wizard.error = Some("boom".to_string());

    let json = serde_json::to_string(&session).unwrap();
    let restored: SessionState = serde_json::from_str(&json).unwrap();

    assert!(!restored.wizard.is_loading);
    assert!(!restored.wizard.is_feeling_lucky);
    assert!(restored.wizard.error.is_none());
    assert_eq!(restored.wizard.stale_steps, session.wizard.stale_steps);
}

#[test]
fn test_competitor_fields_keep_their_wire_names() {
    let json = serde_json::to_value(rich_session()).unwrap();
    let page = &json["competitors"][0];

    assert_eq!(page["URL"], "https://a.com");
    assert_eq!(page["Weighted_Score"], 9000);
    assert!(page.get("H1s").is_some());
    assert!(page.get("Full_Text").is_some());
}

#[test]
fn test_keyword_order_survives_and_map_is_case_folded() {
    let session = rich_session();
    let restored: SessionState =
        serde_json::from_str(&serde_json::to_string(&session).unwrap()).unwrap();

    let order: Vec<&str> = restored.keywords.iter().map(|k| k.keyword.as_str()).collect();
    assert_eq!(order, vec!["trail shoes", "Waterproof Trail Shoes", "running shoes"]);
    assert_eq!(restored.keyword_map().get("waterproof trail shoes"), Some(&120));
}

#[test]
fn test_summary() {
    let summary = rich_session().summary();
    assert_eq!(summary.view, View::Dashboard);
    assert_eq!(summary.step, 8);
    assert_eq!(summary.competitor_count, 1);
}

// ============================================================================
// Stores
// ============================================================================

async fn exercise_store(store: &dyn SessionStore) {
    let mut first = rich_session();
    let second = SessionState::new("second", keywords(), MarketSettings::default(), SubjectInputs::default());

    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();
    assert_eq!(store.load(&first.id).await.unwrap(), Some(first.clone()));
    assert!(store.load("missing").await.unwrap().is_none());

    first.name = "renamed".to_string();
    first.touch();
    store.save(&first).await.unwrap();

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[0].name, "renamed");

    assert!(store.delete(&second.id).await.unwrap());
    assert!(!store.delete(&second.id).await.unwrap());
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_memory_store() {
    let store = MemoryStore::new();
    exercise_store(&store).await;
    assert_eq!(store.save_count(), 3);
}

#[tokio::test]
async fn test_sqlite_store() {
    let db = Database::new_in_memory().unwrap();
    db.initialize_schema().unwrap();
    exercise_store(&db).await;
}

#[tokio::test]
async fn test_stores_keep_the_same_bytes() {
    let session = rich_session();
    let store = MemoryStore::new();
    store.save(&session).await.unwrap();

    let raw = store.raw(&session.id).await.unwrap();
    assert_eq!(raw, serde_json::to_string(&session).unwrap());
}
