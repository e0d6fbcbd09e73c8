//! Result type of the user-facing account actions.
//!
//! Every action resolves to an [`ActionOutcome`]; callers never see the
//! underlying storage, media or auth errors. The wire shape is the uniform
//! `{ "success": bool, "message": string }`.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Generic failure message shown for any internal error.
pub const UNKNOWN_ERROR: &str = "Unknown error.";

/// Why an action failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No signed-in user.
    Unauthorized,
    /// Email and password did not match an account.
    InvalidCredentials,
    /// Submitted input was rejected before any work was done.
    Validation(String),
    /// Anything else; details are only logged.
    Unknown,
}

/// Explicit result of an account action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "ActionResponse")]
pub enum ActionOutcome {
    Success(&'static str),
    Failure(FailureKind),
}

impl ActionOutcome {
    #[must_use]
    pub const fn unknown() -> Self {
        Self::Failure(FailureKind::Unknown)
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Failure(FailureKind::Validation(message.into()))
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// User-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) => *message,
            Self::Failure(FailureKind::Unauthorized) => "You must be signed in.",
            Self::Failure(FailureKind::InvalidCredentials) => "Invalid email or password",
            Self::Failure(FailureKind::Validation(message)) => message.as_str(),
            Self::Failure(FailureKind::Unknown) => UNKNOWN_ERROR,
        }
    }
}

/// Serialized form of an [`ActionOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl From<ActionOutcome> for ActionResponse {
    fn from(outcome: ActionOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message().to_owned(),
        }
    }
}

// Actions always answer 200; the body carries success or failure.
impl IntoResponse for ActionOutcome {
    fn into_response(self) -> Response {
        Json(ActionResponse::from(self)).into_response()
    }
}
