//! Dashboard events and structured error reporting.

use serde::{Deserialize, Serialize};
use shared::domain::FilterSelection;

use crate::{export::ExportError, sync::SyncError, ServiceError};

use super::reducer::MutationKind;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// Local sign-in; `None` signs out. No credentials are exchanged.
    IdentitySelected(Option<String>),
    DatasetFilterChanged(FilterSelection),
    InputsFilterChanged(FilterSelection),
    MutationStarted(MutationKind),
    MutationSucceeded {
        kind: MutationKind,
        notice: String,
    },
    MutationFailed {
        kind: MutationKind,
        error: UiError,
    },
    /// A user action was refused before any request went out.
    ActionRejected(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiErrorCategory {
    /// Request never reached the service or got no usable response.
    Transport,
    /// Service answered with a failure status.
    Server,
    /// Client-side check failed; nothing was sent.
    Precondition,
    /// Another mutation is still in flight.
    Busy,
    /// Local file handling failed.
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiErrorContext {
    SubmitAchievements,
    Seed,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(
        category: UiErrorCategory,
        context: UiErrorContext,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            context,
            message: message.into(),
        }
    }

    pub fn from_service(context: UiErrorContext, err: &ServiceError) -> Self {
        let category = match err {
            ServiceError::Status { .. } => UiErrorCategory::Server,
            ServiceError::Transport(_) | ServiceError::Decode(_) => UiErrorCategory::Transport,
        };
        Self::new(category, context, err.user_message())
    }

    pub fn from_sync(context: UiErrorContext, err: &SyncError) -> Self {
        match err {
            SyncError::Service(inner) => Self::from_service(context, inner),
            SyncError::NoIdentitySelected | SyncError::InvalidForm(_) => {
                Self::new(UiErrorCategory::Precondition, context, err.to_string())
            }
            SyncError::Busy => Self::new(UiErrorCategory::Busy, context, err.to_string()),
        }
    }

    pub fn from_export(err: &ExportError) -> Self {
        match err {
            ExportError::Service(inner) => Self::from_service(UiErrorContext::Export, inner),
            ExportError::InvalidFilename(_) => Self::new(
                UiErrorCategory::Precondition,
                UiErrorContext::Export,
                err.to_string(),
            ),
            ExportError::Io { .. } | ExportError::Aborted(_) => {
                Self::new(UiErrorCategory::Io, UiErrorContext::Export, err.to_string())
            }
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn server_detail_is_kept_verbatim() {
        let err = ServiceError::Status {
            status: 404,
            detail: Some("KAM 'Zed' not found.".into()),
        };
        let ui = UiError::from_service(UiErrorContext::SubmitAchievements, &err);
        assert_eq!(ui.category(), UiErrorCategory::Server);
        assert_eq!(ui.message(), "KAM 'Zed' not found.");
    }

    #[test]
    fn transport_failures_get_generic_message() {
        let err = ServiceError::Transport("connection refused".into());
        let ui = UiError::from_service(UiErrorContext::Seed, &err);
        assert_eq!(ui.category(), UiErrorCategory::Transport);
        assert_eq!(ui.message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn status_without_detail_gets_generic_message() {
        let err = ServiceError::Status {
            status: 500,
            detail: None,
        };
        let ui = UiError::from_service(UiErrorContext::Export, &err);
        assert_eq!(ui.category(), UiErrorCategory::Server);
        assert_eq!(ui.message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn missing_identity_is_a_precondition_failure() {
        let ui = UiError::from_sync(
            UiErrorContext::SubmitAchievements,
            &SyncError::NoIdentitySelected,
        );
        assert_eq!(ui.category(), UiErrorCategory::Precondition);
        assert_eq!(ui.context(), UiErrorContext::SubmitAchievements);
    }
}
