//! Competitive analysis: SERP scoring, competitor selection and the
//! ground-truth subset used in prompts.

pub mod engine;
pub mod ground_truth;
pub mod scoring;

pub use engine::{validate_keywords, AnalysisConfig, AnalysisEngine, AnalysisOutput};
pub use ground_truth::{competitor_data_json, get_ground_truth_competitors, ground_truth_text};
pub use scoring::{rank_weight, weighted_score, ScoreAccumulator};

use crate::types::CompetitorPage;

/// Flip the star on a competitor. Scores are left as they are.
/// Returns the new state, or `None` if the URL is unknown.
pub fn toggle_star(competitors: &mut [CompetitorPage], url: &str) -> Option<bool> {
    let page = competitors.iter_mut().find(|c| c.url == url)?;
    page.is_starred = !page.is_starred;
    Some(page.is_starred)
}
