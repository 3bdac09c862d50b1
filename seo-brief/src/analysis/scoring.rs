//! Rank-decayed, volume-weighted competitor scoring.
//!
//! A URL earns `volume × max(0, 11 − rank)` for every keyword it ranks for:
//! rank 1 weighs 10, rank 10 weighs 1, rank 11 and beyond weigh nothing.

use std::collections::HashMap;

use crate::types::{Keyword, RankedUrl, Ranking};

/// Positional weight of a rank
pub fn rank_weight(rank: u32) -> u64 {
    u64::from(11u32.saturating_sub(rank))
}

/// Weighted score over a set of rankings
pub fn weighted_score(rankings: &[Ranking]) -> u64 {
    rankings.iter().map(|r| r.volume * rank_weight(r.rank)).sum()
}

/// Running per-URL state during an analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlScore {
    pub url: String,
    pub score: u64,
    pub rankings: Vec<Ranking>,
}

/// Folds SERP results into per-URL scores, remembering first-seen order so
/// ties resolve deterministically.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    entries: Vec<UrlScore>,
    index: HashMap<String, usize>,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every URL returned for `keyword`
    pub fn fold(&mut self, keyword: &Keyword, urls: &[RankedUrl]) {
        for ranked in urls {
            let slot = match self.index.get(&ranked.url) {
                Some(&i) => i,
                None => {
                    self.entries.push(UrlScore {
                        url: ranked.url.clone(),
                        score: 0,
                        rankings: Vec::new(),
                    });
                    self.index.insert(ranked.url.clone(), self.entries.len() - 1);
                    self.entries.len() - 1
                }
            };
            let entry = &mut self.entries[slot];
            entry.rankings.push(Ranking {
                keyword: keyword.keyword.clone(),
                rank: ranked.rank,
                volume: keyword.volume,
            });
            entry.score += keyword.volume * rank_weight(ranked.rank);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest scores first, first-seen order among equals, at most `n`
    pub fn top(mut self, n: usize) -> Vec<UrlScore> {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(n);
        self.entries
    }
}

/// Append questions not seen before, keeping first-appearance order
pub fn merge_paa_questions(known: &mut Vec<String>, incoming: &[String]) -> usize {
    let mut added = 0;
    for question in incoming {
        let question = question.trim();
        if question.is_empty() || known.iter().any(|q| q == question) {
            continue;
        }
        known.push(question.to_string());
        added += 1;
    }
    added
}
