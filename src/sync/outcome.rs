use crate::calendar::Event;

pub const AUTH_FAILED_MESSAGE: &str = "authentication failed, redirect to login";
pub const NETWORK_ERROR_MESSAGE: &str = "could not reach the event service";
pub const TIMEOUT_MESSAGE: &str = "request to the event service timed out";

/// Why a remote call did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Session invalid or expired; the caller should force a new login.
    Authentication,
    Conflict,
    Validation,
    NotFoundOrForbidden,
    UnknownServer,
    /// The server could not be reached or did not answer in time.
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Succeeded,
    Failed(FailureKind),
}

/// Normalized result of a remote call: a status and a display message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub status: OutcomeStatus,
    pub message: String,
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Succeeded,
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed(kind),
            message: message.into(),
        }
    }

    pub fn authentication_failed() -> Self {
        Self::failure(FailureKind::Authentication, AUTH_FAILED_MESSAGE)
    }

    pub fn network_error() -> Self {
        Self::failure(FailureKind::Network, NETWORK_ERROR_MESSAGE)
    }

    pub fn timed_out() -> Self {
        Self::failure(FailureKind::Network, TIMEOUT_MESSAGE)
    }

    pub fn from_transport_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            tracing::error!("Request to the event service timed out: {}", err);
            Self::timed_out()
        } else {
            tracing::error!("Could not reach the event service: {}", err);
            Self::network_error()
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == OutcomeStatus::Succeeded
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.status {
            OutcomeStatus::Succeeded => None,
            OutcomeStatus::Failed(kind) => Some(kind),
        }
    }

    pub fn requires_login(&self) -> bool {
        self.failure_kind() == Some(FailureKind::Authentication)
    }
}

/// Outcome of the list operation, carrying the converted events on success.
#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    Fetched {
        events: Vec<Event>,
        /// Events dropped because they could not be converted.
        skipped: usize,
    },
    Failed(ActionOutcome),
}

impl ListOutcome {
    pub fn outcome(&self) -> ActionOutcome {
        match self {
            ListOutcome::Fetched { .. } => ActionOutcome::success("events fetched"),
            ListOutcome::Failed(outcome) => outcome.clone(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, ListOutcome::Fetched { .. })
    }
}
