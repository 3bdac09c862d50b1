//! Section length correction thresholds.
//!
//! All ratios are applied to the section's `target_word_count` and checked
//! against a fresh word count after every pass.

use crate::services::LengthCorrection;

/// Below this share of the target a section is expanded once
pub const EXPAND_BELOW_RATIO: f64 = 0.70;
/// Minimum acceptable length asked for in the expansion instruction
pub const EXPAND_MINIMUM_RATIO: f64 = 0.85;
/// Above this share of the target a section is trimmed (strict mode)
pub const TRIM_ABOVE_RATIO_STRICT: f64 = 1.20;
/// Above this share of the target a section is trimmed
pub const TRIM_ABOVE_RATIO: f64 = 1.50;

pub fn needs_expansion(words: usize, target: u32) -> bool {
    target > 0 && (words as f64) < f64::from(target) * EXPAND_BELOW_RATIO
}

pub fn needs_trim(words: usize, target: u32, strict: bool) -> bool {
    let ratio = if strict {
        TRIM_ABOVE_RATIO_STRICT
    } else {
        TRIM_ABOVE_RATIO
    };
    target > 0 && (words as f64) > f64::from(target) * ratio
}

pub fn minimum_words(target: u32) -> usize {
    (f64::from(target) * EXPAND_MINIMUM_RATIO).ceil() as usize
}

pub fn expansion(body: &str, words: usize, target: u32) -> LengthCorrection {
    LengthCorrection::Expand {
        current_body: body.to_string(),
        current_words: words,
        shortfall: (target as usize).saturating_sub(words),
        minimum_words: minimum_words(target),
    }
}

pub fn trim(body: &str, words: usize, target: u32) -> LengthCorrection {
    LengthCorrection::Trim {
        current_body: body.to_string(),
        current_words: words,
        target_words: target as usize,
    }
}
