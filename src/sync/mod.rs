pub mod account;
pub mod auth_api;
pub mod credentials;
pub mod event_api;
pub mod http;
pub mod outcome;

pub use account::{validate_account, AccountErrors, AccountFieldError};
pub use auth_api::{AuthApi, HttpAuthClient, LoginOutcome};
pub use credentials::Credentials;
pub use event_api::{EventApi, EventPayload, EventUpdate, HttpEventClient};
pub use http::ClientError;
pub use outcome::{ActionOutcome, FailureKind, ListOutcome, OutcomeStatus};
