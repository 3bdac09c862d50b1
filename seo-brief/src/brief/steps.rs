//! The seven brief steps, what each produces and which later steps it
//! invalidates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BriefError;
use crate::types::ContentBrief;

/// Step counter value once every step is done (the dashboard)
pub const DASHBOARD_STEP: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BriefStep {
    GoalAndAudience = 1,
    KeywordStrategy = 2,
    CompetitiveAnalysis = 3,
    ContentGaps = 4,
    Structure = 5,
    Faqs = 6,
    OnPageSeo = 7,
}

/// Order in which the wizard shows the steps. Display position `n` (1-based)
/// generates `WIZARD_ORDER[n - 1]`.
pub const WIZARD_ORDER: [BriefStep; 7] = [
    BriefStep::GoalAndAudience,
    BriefStep::KeywordStrategy,
    BriefStep::CompetitiveAnalysis,
    BriefStep::ContentGaps,
    BriefStep::Structure,
    BriefStep::Faqs,
    BriefStep::OnPageSeo,
];

impl BriefStep {
    pub const ALL: [BriefStep; 7] = WIZARD_ORDER;

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn title(self) -> &'static str {
        match self {
            BriefStep::GoalAndAudience => "Goal & Audience",
            BriefStep::KeywordStrategy => "Keyword Strategy",
            BriefStep::CompetitiveAnalysis => "Competitive Analysis",
            BriefStep::ContentGaps => "Content Gaps",
            BriefStep::Structure => "Structure & Outline",
            BriefStep::Faqs => "FAQs",
            BriefStep::OnPageSeo => "On-Page SEO",
        }
    }

    /// Field of [`ContentBrief`] this step writes
    pub fn section_key(self) -> &'static str {
        match self {
            BriefStep::GoalAndAudience => "goal_and_audience",
            BriefStep::KeywordStrategy => "keyword_strategy",
            BriefStep::CompetitiveAnalysis => "competitive_analysis",
            BriefStep::ContentGaps => "content_gaps",
            BriefStep::Structure => "article_structure",
            BriefStep::Faqs => "faqs",
            BriefStep::OnPageSeo => "on_page_seo",
        }
    }

    /// Steps that must be regenerated once this one changes
    pub fn dependents(self) -> &'static [BriefStep] {
        use BriefStep::*;
        match self {
            GoalAndAudience => &[
                KeywordStrategy,
                CompetitiveAnalysis,
                ContentGaps,
                Structure,
                Faqs,
                OnPageSeo,
            ],
            KeywordStrategy => &[ContentGaps, Structure, Faqs, OnPageSeo],
            CompetitiveAnalysis => &[ContentGaps, Structure, Faqs, OnPageSeo],
            ContentGaps => &[Structure, Faqs, OnPageSeo],
            Structure => &[Faqs, OnPageSeo],
            Faqs | OnPageSeo => &[],
        }
    }

    /// Steps 3 and 4 reason over the competitors' full text
    pub fn needs_full_competitor_text(self) -> bool {
        matches!(self, BriefStep::CompetitiveAnalysis | BriefStep::ContentGaps)
    }

    /// Logical step generated when the wizard advances from display step `display`
    pub fn after_display(display: u8) -> Option<BriefStep> {
        WIZARD_ORDER.get(usize::from(display)).copied()
    }

    /// Whether `brief` already holds this step's section
    pub fn is_present_in(self, brief: &ContentBrief) -> bool {
        match self {
            BriefStep::GoalAndAudience => brief.goal_and_audience.is_some(),
            BriefStep::KeywordStrategy => brief.keyword_strategy.is_some(),
            BriefStep::CompetitiveAnalysis => brief.competitive_analysis.is_some(),
            BriefStep::ContentGaps => brief.content_gaps.is_some(),
            BriefStep::Structure => brief.article_structure.is_some(),
            BriefStep::Faqs => brief.faqs.is_some(),
            BriefStep::OnPageSeo => brief.on_page_seo.is_some(),
        }
    }
}

impl TryFrom<u8> for BriefStep {
    type Error = BriefError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(BriefStep::GoalAndAudience),
            2 => Ok(BriefStep::KeywordStrategy),
            3 => Ok(BriefStep::CompetitiveAnalysis),
            4 => Ok(BriefStep::ContentGaps),
            5 => Ok(BriefStep::Structure),
            6 => Ok(BriefStep::Faqs),
            7 => Ok(BriefStep::OnPageSeo),
            other => Err(BriefError::State(other)),
        }
    }
}

impl From<BriefStep> for u8 {
    fn from(step: BriefStep) -> u8 {
        step.number()
    }
}

impl fmt::Display for BriefStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step {}: {}", self.number(), self.title())
    }
}
