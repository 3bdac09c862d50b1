//! The seven-step brief wizard.
//!
//! - `steps` - step identities, the fixed dependency table and wizard order
//! - `state` - [`WizardState`] and its reducer
//! - `request` - per-step input contract
//! - `wizard` - async drivers: start, next, regenerate, autopilot

pub mod request;
pub mod state;
pub mod steps;
pub mod wizard;

pub use request::{build_step_request, BriefContext};
pub use state::{Action, GenerationMode, View, WizardState};
pub use steps::{BriefStep, DASHBOARD_STEP, WIZARD_ORDER};
pub use wizard::{BriefWizard, RegenerateOutcome};
