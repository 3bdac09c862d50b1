//! Wizard state and its reducer.
//!
//! All brief-related state (view, step counter, stale set, feedback and the
//! brief itself) lives in one [`WizardState`]; the only way to change it is
//! [`WizardState::apply`], so the step/stale coupling is enforced in one place.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::brief::steps::{BriefStep, DASHBOARD_STEP};
use crate::types::ContentBrief;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Keyword and subject entry
    #[default]
    Input,
    /// Analysis or first step in progress
    Analyzing,
    /// Step-by-step wizard
    Briefing,
    /// All steps done
    Dashboard,
    /// Article generation and editing
    Article,
}

/// How a step result came about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// First step right after analysis
    Initial,
    /// Wizard advancing by one
    Next,
    /// User asked for a step again
    Regenerate,
}

#[derive(Debug, Clone)]
pub enum Action {
    AnalysisStarted,
    /// Competitors are in; the view stays on `Analyzing` until step 1 lands
    AnalysisCompleted,
    AnalysisFailed(String),
    StepRequested(BriefStep),
    StepGenerated {
        step: BriefStep,
        partial: ContentBrief,
        mode: GenerationMode,
    },
    StepFailed {
        step: BriefStep,
        error: String,
        mode: GenerationMode,
    },
    /// Leave step 7 for the dashboard
    Finish,
    SetFeedback {
        step: BriefStep,
        text: String,
    },
    StartAutopilot,
    StopAutopilot,
    OpenArticle,
    OpenDashboard,
    DismissError,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub view: View,
    /// 1..=7 while briefing, 8 once done
    pub step: u8,
    #[serde(default)]
    pub stale_steps: BTreeSet<u8>,
    #[serde(default)]
    pub user_feedbacks: BTreeMap<u8, String>,
    #[serde(default)]
    pub brief: ContentBrief,
    #[serde(skip)]
    pub is_loading: bool,
    #[serde(skip)]
    pub error: Option<String>,
    #[serde(skip)]
    pub is_feeling_lucky: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            view: View::Input,
            step: 1,
            stale_steps: BTreeSet::new(),
            user_feedbacks: BTreeMap::new(),
            brief: ContentBrief::default(),
            is_loading: false,
            error: None,
            is_feeling_lucky: false,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        !self.is_loading && self.error.is_none()
    }

    pub fn is_done(&self) -> bool {
        self.step >= DASHBOARD_STEP
    }

    /// Autopilot keeps going only while idle on the wizard view
    pub fn autopilot_may_advance(&self) -> bool {
        self.is_feeling_lucky && self.is_idle() && self.view == View::Briefing && !self.is_done()
    }

    pub fn is_stale(&self, step: BriefStep) -> bool {
        self.stale_steps.contains(&step.number())
    }

    pub fn feedback_for(&self, step: BriefStep) -> Option<&str> {
        self.user_feedbacks
            .get(&step.number())
            .map(String::as_str)
            .filter(|f| !f.trim().is_empty())
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::AnalysisStarted => {
                self.view = View::Analyzing;
                self.is_loading = true;
                self.error = None;
            }
            Action::AnalysisCompleted => {
                self.is_loading = false;
            }
            Action::AnalysisFailed(error) => {
                self.view = View::Input;
                self.is_loading = false;
                self.is_feeling_lucky = false;
                self.error = Some(error);
            }
            Action::StepRequested(_) => {
                self.is_loading = true;
                self.error = None;
            }
            Action::StepGenerated {
                step,
                partial,
                mode,
            } => {
                self.brief.merge(partial);
                self.is_loading = false;
                self.error = None;
                let n = step.number();
                self.stale_steps.remove(&n);
                self.user_feedbacks.remove(&n);
                match mode {
                    GenerationMode::Initial => {
                        self.view = View::Briefing;
                        self.step = n;
                    }
                    GenerationMode::Next => {
                        self.step = n;
                    }
                    GenerationMode::Regenerate => {
                        // Article view is only reachable from a finished brief
                        if matches!(self.view, View::Dashboard | View::Article) {
                            self.stale_steps
                                .extend(step.dependents().iter().map(|s| s.number()));
                        }
                    }
                }
            }
            Action::StepFailed { error, mode, .. } => {
                self.is_loading = false;
                self.is_feeling_lucky = false;
                self.error = Some(error);
                if mode == GenerationMode::Initial {
                    self.view = View::Input;
                }
            }
            Action::Finish => {
                self.step = DASHBOARD_STEP;
                self.view = View::Dashboard;
                self.is_loading = false;
                self.is_feeling_lucky = false;
            }
            Action::SetFeedback { step, text } => {
                if text.trim().is_empty() {
                    self.user_feedbacks.remove(&step.number());
                } else {
                    self.user_feedbacks.insert(step.number(), text);
                }
            }
            Action::StartAutopilot => {
                self.is_feeling_lucky = true;
                self.error = None;
            }
            Action::StopAutopilot => {
                self.is_feeling_lucky = false;
            }
            Action::OpenArticle => {
                if self.is_done() {
                    self.view = View::Article;
                }
            }
            Action::OpenDashboard => {
                if self.is_done() {
                    self.view = View::Dashboard;
                }
            }
            Action::DismissError => {
                self.error = None;
            }
            Action::Reset => {
                *self = WizardState::default();
            }
        }
    }
}
