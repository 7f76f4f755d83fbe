//! Pure `(state, event) -> state` transitions for the dashboard.

use serde::{Deserialize, Serialize};
use shared::domain::FilterSelection;

use super::events::{DashboardEvent, UiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    SubmitAchievements,
    Seed,
}

/// `Idle -> Submitting -> (success | failure) -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "kind", rename_all = "snake_case")]
pub enum MutationPhase {
    #[default]
    Idle,
    Submitting(MutationKind),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub identity: Option<String>,
    pub dataset_filter: FilterSelection,
    pub inputs_filter: FilterSelection,
    pub phase: MutationPhase,
    pub notice: Option<String>,
    pub last_error: Option<UiError>,
}

impl DashboardState {
    pub fn is_idle(&self) -> bool {
        self.phase == MutationPhase::Idle
    }

    /// Whether the achievement form's submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        self.is_idle() && self.identity.is_some()
    }
}

pub fn reduce(mut state: DashboardState, event: DashboardEvent) -> DashboardState {
    match event {
        DashboardEvent::IdentitySelected(identity) => {
            state.identity = identity.filter(|name| !name.trim().is_empty());
        }
        DashboardEvent::DatasetFilterChanged(selection) => {
            state.dataset_filter = selection;
        }
        DashboardEvent::InputsFilterChanged(selection) => {
            state.inputs_filter = selection;
        }
        DashboardEvent::MutationStarted(kind) => {
            if state.is_idle() {
                state.phase = MutationPhase::Submitting(kind);
                state.last_error = None;
                state.notice = None;
            }
        }
        DashboardEvent::MutationSucceeded { kind, notice } => {
            if state.phase == MutationPhase::Submitting(kind) {
                state.phase = MutationPhase::Idle;
                state.notice = Some(notice);
            }
        }
        DashboardEvent::MutationFailed { kind, error } => {
            if state.phase == MutationPhase::Submitting(kind) {
                state.phase = MutationPhase::Idle;
                state.last_error = Some(error);
            }
        }
        DashboardEvent::ActionRejected(error) => {
            state.last_error = Some(error);
        }
    }
    state
}
