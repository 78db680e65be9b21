use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::storage::config::ServerConfig;
use crate::sync::account::validate_account;
use crate::sync::credentials::Credentials;
use crate::sync::http::{build_client, normalize_base_url, timeout_of, ClientError};
use crate::sync::outcome::{ActionOutcome, FailureKind};

pub const INVALID_LOGIN: &str = "invalid username or password";
pub const UNEXPECTED_LOGIN_ERROR: &str = "unexpected error logging in";
pub const MISSING_TOKEN: &str = "error with authentication token";
pub const USER_REGISTERED: &str = "user registered";
pub const USER_ALREADY_REGISTERED: &str = "user already registered";
pub const UNEXPECTED_REGISTER_ERROR: &str = "unexpected error registering user";

#[derive(Debug, Serialize)]
struct AccountBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn(Credentials),
    Failed(ActionOutcome),
}

/// Account endpoints; the only calls made without a bearer token.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> LoginOutcome;

    async fn register(&self, username: &str, password: &str) -> ActionOutcome;
}

pub struct HttpAuthClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAuthClient {
    pub fn new(config: &ServerConfig) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            client: build_client(timeout_of(config))?,
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        if let Err(outcome) = check_account(username, password) {
            return LoginOutcome::Failed(outcome);
        }

        let url = format!("{}/login", self.base_url);
        tracing::info!("Logging in as {}", username);

        let response = match self
            .client
            .post(&url)
            .json(&AccountBody { username, password })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return LoginOutcome::Failed(ActionOutcome::from_transport_error(&e)),
        };

        let status = response.status().as_u16();
        tracing::info!("Login response status: {}", status);

        match status {
            201 => match response.json::<TokenResponse>().await {
                Ok(TokenResponse { token: Some(token) }) => LoginOutcome::LoggedIn(Credentials::new(token)),
                Ok(TokenResponse { token: None }) => {
                    tracing::error!("Login succeeded without a token in the body");
                    LoginOutcome::Failed(ActionOutcome::failure(FailureKind::UnknownServer, MISSING_TOKEN))
                }
                Err(e) => {
                    tracing::error!("Could not decode login response: {}", e);
                    LoginOutcome::Failed(unexpected_login())
                }
            },
            400 | 404 => {
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!("Login rejected ({}): {}", status, detail);
                LoginOutcome::Failed(login_failure(status))
            }
            _ => {
                let detail = response.text().await.unwrap_or_default();
                tracing::error!("Unexpected login status {}: {}", status, detail);
                LoginOutcome::Failed(login_failure(status))
            }
        }
    }

    async fn register(&self, username: &str, password: &str) -> ActionOutcome {
        if let Err(outcome) = check_account(username, password) {
            return outcome;
        }

        let url = format!("{}/users", self.base_url);
        tracing::info!("Registering user {}", username);

        let response = match self
            .client
            .post(&url)
            .json(&AccountBody { username, password })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return ActionOutcome::from_transport_error(&e),
        };

        let status = response.status().as_u16();
        tracing::info!("Register response status: {}", status);

        if !matches!(status, 201 | 409) {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!("Registration rejected ({}): {}", status, detail);
        }

        register_outcome(status)
    }
}

fn check_account(username: &str, password: &str) -> Result<(), ActionOutcome> {
    validate_account(username, password).map_err(|errors| {
        tracing::warn!("Not sending account request for {}: {}", username, errors.summary());
        ActionOutcome::failure(FailureKind::Validation, errors.summary())
    })
}

fn unexpected_login() -> ActionOutcome {
    ActionOutcome::failure(FailureKind::UnknownServer, UNEXPECTED_LOGIN_ERROR)
}

fn login_failure(status: u16) -> ActionOutcome {
    match status {
        400 | 404 => ActionOutcome::failure(FailureKind::Authentication, INVALID_LOGIN),
        _ => unexpected_login(),
    }
}

fn register_outcome(status: u16) -> ActionOutcome {
    match status {
        201 => ActionOutcome::success(USER_REGISTERED),
        409 => ActionOutcome::failure(FailureKind::Conflict, USER_ALREADY_REGISTERED),
        400 => ActionOutcome::failure(FailureKind::Validation, INVALID_LOGIN),
        _ => ActionOutcome::failure(FailureKind::UnknownServer, UNEXPECTED_REGISTER_ERROR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejections_are_invalid_credentials() {
        assert_eq!(
            login_failure(404),
            ActionOutcome::failure(FailureKind::Authentication, INVALID_LOGIN)
        );
        assert_eq!(
            login_failure(400),
            ActionOutcome::failure(FailureKind::Authentication, INVALID_LOGIN)
        );
        assert_eq!(login_failure(500), unexpected_login());
    }

    #[test]
    fn short_credentials_are_rejected_locally() {
        let outcome = check_account("ab", "short").unwrap_err();

        assert_eq!(outcome.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(
            outcome.message,
            "username must have at least 3 characters; password must have at least 8 characters"
        );
        assert!(check_account("alice", "long-enough").is_ok());
    }

    #[test]
    fn register_status_mapping() {
        assert!(register_outcome(201).succeeded());
        assert_eq!(register_outcome(409).failure_kind(), Some(FailureKind::Conflict));
        assert_eq!(register_outcome(400).failure_kind(), Some(FailureKind::Validation));
        assert_eq!(register_outcome(503).failure_kind(), Some(FailureKind::UnknownServer));
    }
}
