//! Drives the brief state machine against the generation service.
//!
//! Generation failures are never retried here: they are recorded on the
//! state, surfaced to the caller, and leave the wizard on the last good step.

use std::sync::Arc;

use seo_brief_sdk::{
    log_agent_complete, log_agent_failed, log_agent_start, log_phase_complete, log_phase_failed,
    log_phase_start,
};

use crate::brief::request::{build_step_request, BriefContext};
use crate::brief::state::{Action, GenerationMode, View, WizardState};
use crate::brief::steps::BriefStep;
use crate::cancel::CancellationToken;
use crate::error::{BriefError, BriefResult};
use crate::services::GenerationService;

const TOTAL_PHASES: usize = 9;
const AGENT_NAME: &str = "Brief Writer";

/// What a call to [`BriefWizard::regenerate`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerateOutcome {
    Regenerated(BriefStep),
    /// Step number outside 1..=7, or a step the wizard has not reached
    /// yet. Nothing happened.
    Ignored,
}

pub struct BriefWizard {
    generator: Arc<dyn GenerationService>,
}

impl BriefWizard {
    pub fn new(generator: Arc<dyn GenerationService>) -> Self {
        Self { generator }
    }

    async fn generate(
        &self,
        step: BriefStep,
        mode: GenerationMode,
        feedback: Option<String>,
        state: &mut WizardState,
        ctx: &BriefContext<'_>,
    ) -> BriefResult<()> {
        let request = build_step_request(
            step,
            state,
            ctx,
            feedback,
            mode == GenerationMode::Regenerate,
        );
        let task_id = format!("brief_step_{}", step.number());

        state.apply(Action::StepRequested(step));
        log_phase_start!(usize::from(step.number()), step.title(), TOTAL_PHASES);
        log_agent_start!(&task_id, AGENT_NAME, format!("Generating {}", step));

        match self.generator.generate_brief_step(&request).await {
            Ok(partial) => {
                if !step.is_present_in(&partial) {
                    tracing::warn!(step = step.number(), "generation returned no section for step");
                }
                state.apply(Action::StepGenerated {
                    step,
                    partial,
                    mode,
                });
                log_agent_complete!(&task_id, AGENT_NAME);
                log_phase_complete!(usize::from(step.number()), step.title());
                Ok(())
            }
            Err(e) => {
                let err = BriefError::external("generation service", format!("{}: {:#}", step, e));
                log_agent_failed!(&task_id, AGENT_NAME, &err);
                log_phase_failed!(usize::from(step.number()), step.title(), &err);
                state.apply(Action::StepFailed {
                    step,
                    error: err.to_string(),
                    mode,
                });
                Err(err)
            }
        }
    }

    /// Generate step 1 after a finished analysis and open the wizard
    pub async fn start(&self, state: &mut WizardState, ctx: &BriefContext<'_>) -> BriefResult<()> {
        let step = BriefStep::GoalAndAudience;
        let feedback = state.feedback_for(step).map(str::to_string);
        self.generate(step, GenerationMode::Initial, feedback, state, ctx)
            .await
    }

    /// Advance the wizard by one step. From step 7 this moves to the
    /// dashboard without a generation call. Outside the wizard it does nothing.
    pub async fn next(&self, state: &mut WizardState, ctx: &BriefContext<'_>) -> BriefResult<()> {
        if state.view != View::Briefing || state.is_done() {
            return Ok(());
        }
        match BriefStep::after_display(state.step) {
            Some(step) => {
                let feedback = state.feedback_for(step).map(str::to_string);
                self.generate(step, GenerationMode::Next, feedback, state, ctx)
                    .await
            }
            None => {
                state.apply(Action::Finish);
                Ok(())
            }
        }
    }

    /// Regenerate an already generated step with optional feedback. When no
    /// feedback is passed, the feedback recorded for the step is used.
    pub async fn regenerate(
        &self,
        state: &mut WizardState,
        ctx: &BriefContext<'_>,
        step: u8,
        feedback: Option<String>,
    ) -> BriefResult<RegenerateOutcome> {
        let step = match BriefStep::try_from(step) {
            Ok(step) => step,
            Err(err) => {
                tracing::debug!(%err, "ignoring regenerate request");
                return Ok(RegenerateOutcome::Ignored);
            }
        };
        if !state.is_done() && step.number() > state.step {
            tracing::debug!(step = step.number(), current = state.step, "ignoring regenerate of an ungenerated step");
            return Ok(RegenerateOutcome::Ignored);
        }
        let feedback = feedback.or_else(|| state.feedback_for(step).map(str::to_string));
        self.generate(step, GenerationMode::Regenerate, feedback, state, ctx)
            .await?;
        Ok(RegenerateOutcome::Regenerated(step))
    }

    /// Keep advancing while the wizard is idle until the dashboard is
    /// reached. Stops on the first error, which is returned as is.
    pub async fn run_autopilot(
        &self,
        state: &mut WizardState,
        ctx: &BriefContext<'_>,
        cancel: &CancellationToken,
    ) -> BriefResult<()> {
        self.run_autopilot_with(state, ctx, cancel, |_| {}).await
    }

    /// [`run_autopilot`](Self::run_autopilot), calling `on_step` after every
    /// successful advance
    pub async fn run_autopilot_with<F>(
        &self,
        state: &mut WizardState,
        ctx: &BriefContext<'_>,
        cancel: &CancellationToken,
        mut on_step: F,
    ) -> BriefResult<()>
    where
        F: FnMut(&WizardState),
    {
        state.apply(Action::StartAutopilot);
        while state.autopilot_may_advance() {
            if cancel.is_cancelled() {
                state.apply(Action::StopAutopilot);
                return Err(BriefError::Cancelled);
            }
            self.next(state, ctx).await?;
            on_step(state);
        }
        state.apply(Action::StopAutopilot);
        Ok(())
    }
}
