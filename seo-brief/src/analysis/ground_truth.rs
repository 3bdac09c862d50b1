//! Selection and rendering of the competitor text used to ground prompts.

use serde::Serialize;
use std::collections::HashSet;

use crate::types::{CompetitorPage, Ranking};

/// Maximum number of competitors fed to the model as ground truth
pub const GROUND_TRUTH_LIMIT: usize = 3;

/// Per-competitor cap on full text placed in a prompt
pub const MAX_GROUND_TRUTH_CHARS: usize = 15_000;

/// Starred competitors first (input order), then the highest-scored
/// unstarred ones, deduplicated by URL, at most three.
pub fn get_ground_truth_competitors(competitors: &[CompetitorPage]) -> Vec<&CompetitorPage> {
    let mut seen = HashSet::new();
    let mut selected = Vec::with_capacity(GROUND_TRUTH_LIMIT);

    for page in competitors.iter().filter(|c| c.is_starred) {
        if selected.len() == GROUND_TRUTH_LIMIT {
            return selected;
        }
        if seen.insert(page.url.as_str()) {
            selected.push(page);
        }
    }

    let mut rest: Vec<&CompetitorPage> = competitors.iter().filter(|c| !c.is_starred).collect();
    // Stable: equal scores keep input order.
    rest.sort_by(|a, b| b.weighted_score.cmp(&a.weighted_score));

    for page in rest {
        if selected.len() == GROUND_TRUTH_LIMIT {
            break;
        }
        if seen.insert(page.url.as_str()) {
            selected.push(page);
        }
    }
    selected
}

/// Render the ground-truth competitors as one prompt block
pub fn ground_truth_text(competitors: &[CompetitorPage]) -> String {
    get_ground_truth_competitors(competitors)
        .iter()
        .enumerate()
        .map(|(i, page)| {
            format!(
                "--- COMPETITOR {} ({}) ---\nH1: {}\nWord count: {}\n\n{}",
                i + 1,
                page.url,
                page.h1s.join(" | "),
                page.word_count,
                truncate_chars(&page.full_text, MAX_GROUND_TRUTH_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Serialize)]
struct CompetitorSummary<'a> {
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "Weighted_Score")]
    weighted_score: u64,
    rankings: &'a [Ranking],
    #[serde(rename = "H1s")]
    h1s: &'a [String],
    #[serde(rename = "H2s")]
    h2s: &'a [String],
    #[serde(rename = "H3s")]
    h3s: &'a [String],
    #[serde(rename = "Word_Count")]
    word_count: u64,
    #[serde(rename = "Full_Text", skip_serializing_if = "Option::is_none")]
    full_text: Option<&'a str>,
    is_starred: bool,
}

/// Competitor list as JSON for prompts; full text only when asked for
pub fn competitor_data_json(competitors: &[CompetitorPage], include_full_text: bool) -> String {
    let summaries: Vec<CompetitorSummary<'_>> = competitors
        .iter()
        .map(|c| CompetitorSummary {
            url: &c.url,
            weighted_score: c.weighted_score,
            rankings: &c.rankings,
            h1s: &c.h1s,
            h2s: &c.h2s,
            h3s: &c.h3s,
            word_count: c.word_count,
            full_text: include_full_text
                .then(|| truncate_chars(&c.full_text, MAX_GROUND_TRUTH_CHARS)),
            is_starred: c.is_starred,
        })
        .collect();
    serde_json::to_string(&summaries).unwrap_or_else(|_| "[]".to_string())
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
