//! Assembles the input contract of each brief step.

use crate::analysis::{competitor_data_json, ground_truth_text};
use crate::brief::state::WizardState;
use crate::brief::steps::BriefStep;
use crate::inputs::extract_template_headings;
use crate::services::BriefStepRequest;
use crate::types::{CompetitorPage, Keyword, LengthConstraints, MarketSettings, SubjectInputs};

/// Everything outside the wizard state that steps draw on
#[derive(Debug, Clone, Copy)]
pub struct BriefContext<'a> {
    pub competitors: &'a [CompetitorPage],
    pub keywords: &'a [Keyword],
    pub paa_questions: &'a [String],
    pub subject: &'a SubjectInputs,
    pub length_constraints: &'a LengthConstraints,
    pub market: &'a MarketSettings,
}

/// Build the request for `step`.
///
/// | Step | Extra inputs |
/// |---|---|
/// | 1 | combined subject/brand/file/URL context |
/// | 2 | available keywords with volumes |
/// | 3, 4 | competitors' full text |
/// | 5 | template headings, length constraints |
/// | 6 | PAA questions |
/// | 7 | none |
pub fn build_step_request(
    step: BriefStep,
    state: &WizardState,
    ctx: &BriefContext<'_>,
    feedback: Option<String>,
    is_regeneration: bool,
) -> BriefStepRequest {
    let template_headings = ctx
        .subject
        .template_markdown
        .as_deref()
        .map(extract_template_headings)
        .filter(|h| !h.is_empty());

    BriefStepRequest {
        step,
        competitor_data_json: competitor_data_json(ctx.competitors, step.needs_full_competitor_text()),
        subject_info: ctx.subject.subject_info.clone(),
        brand_info: ctx.subject.brand_info.clone(),
        context_text: (step == BriefStep::GoalAndAudience).then(|| ctx.subject.combined_context()),
        previous_steps_data: state.brief.clone(),
        ground_truth_text: ground_truth_text(ctx.competitors),
        user_feedback: feedback.filter(|f| !f.trim().is_empty()),
        available_keywords: (step == BriefStep::KeywordStrategy).then(|| ctx.keywords.to_vec()),
        template_headings: if step == BriefStep::Structure {
            template_headings
        } else {
            None
        },
        length_constraints: (step == BriefStep::Structure).then(|| ctx.length_constraints.clone()),
        paa_questions: (step == BriefStep::Faqs).then(|| ctx.paa_questions.to_vec()),
        is_regeneration,
        language: ctx.market.output_language.clone(),
    }
}
