use std::ops::RangeInclusive;

use thiserror::Error;

pub const USERNAME_CHARS: RangeInclusive<usize> = 3..=20;
pub const PASSWORD_CHARS: RangeInclusive<usize> = 8..=64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountFieldError {
    #[error("required")]
    Required,
    #[error("must have at least {min} characters")]
    TooShort { min: usize },
    #[error("must have at most {max} characters")]
    TooLong { max: usize },
}

/// Per-field problems with a username/password pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("invalid account fields")]
pub struct AccountErrors {
    pub username: Option<AccountFieldError>,
    pub password: Option<AccountFieldError>,
}

impl AccountErrors {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }

    pub fn summary(&self) -> String {
        [("username", &self.username), ("password", &self.password)]
            .iter()
            .filter_map(|(name, error)| error.as_ref().map(|e| format!("{} {}", name, e)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn check_length(value: &str, bounds: &RangeInclusive<usize>) -> Option<AccountFieldError> {
    let len = value.chars().count();
    if len == 0 {
        Some(AccountFieldError::Required)
    } else if len < *bounds.start() {
        Some(AccountFieldError::TooShort { min: *bounds.start() })
    } else if len > *bounds.end() {
        Some(AccountFieldError::TooLong { max: *bounds.end() })
    } else {
        None
    }
}

/// Checks the credentials the account endpoints accept, before any request.
pub fn validate_account(username: &str, password: &str) -> Result<(), AccountErrors> {
    let errors = AccountErrors {
        username: check_length(username, &USERNAME_CHARS),
        password: check_length(password, &PASSWORD_CHARS),
    };
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
