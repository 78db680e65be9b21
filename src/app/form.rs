use thiserror::Error;

use crate::calendar::{format_for_input, parse_timestamp, Event};
use crate::sync::EventPayload;

pub const MAX_DESCRIPTION_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("invalid value")]
    InvalidTimestamp,
    #[error("the end of the event must come after its beginning")]
    EndBeforeBegin,
    #[error("description must not be empty")]
    DescriptionEmpty,
    #[error("description must have at most 100 characters")]
    DescriptionTooLong,
}

/// Per-field validation errors; any present error blocks submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("event form has invalid fields")]
pub struct FormErrors {
    pub begin: Option<FieldError>,
    pub end: Option<FieldError>,
    pub description: Option<FieldError>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.begin.is_none() && self.end.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormErrors),
    #[error("a request is already in flight")]
    RequestInFlight,
    #[error("event is not being edited")]
    NotEditing,
    #[error("new event form is collapsed")]
    Collapsed,
}

/// Marks a session's request as pending for as long as it lives.
///
/// Dropping it clears the flag, so a submit future that is cancelled
/// mid-request does not leave the session locked.
pub(crate) struct InFlight<'a> {
    flag: &'a mut bool,
}

impl<'a> InFlight<'a> {
    pub(crate) fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

/// In-progress form values exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventForm {
    pub begin: String,
    pub end: String,
    pub description: String,
}

impl EventForm {
    pub fn new(begin: impl Into<String>, end: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
            description: description.into(),
        }
    }

    pub fn for_event(event: &Event) -> Self {
        Self {
            begin: format_for_input(event.begin),
            end: format_for_input(event.end),
            description: event.description.clone(),
        }
    }

    pub fn validate(&self) -> Result<EventPayload, FormErrors> {
        let mut errors = FormErrors::default();

        let begin = match parse_timestamp(&self.begin) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!("Rejecting begin field: {}", e);
                errors.begin = Some(FieldError::InvalidTimestamp);
                None
            }
        };
        let end = match parse_timestamp(&self.end) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::debug!("Rejecting end field: {}", e);
                errors.end = Some(FieldError::InvalidTimestamp);
                None
            }
        };

        if let (Some(begin), Some(end)) = (begin, end)
            && end < begin
        {
            errors.end = Some(FieldError::EndBeforeBegin);
        }

        let description_len = self.description.chars().count();
        if description_len == 0 {
            errors.description = Some(FieldError::DescriptionEmpty);
        } else if description_len > MAX_DESCRIPTION_CHARS {
            errors.description = Some(FieldError::DescriptionTooLong);
        }

        match (begin, end) {
            (Some(begin), Some(end)) if errors.is_empty() => Ok(EventPayload {
                begin,
                end,
                description: self.description.clone(),
            }),
            _ => Err(errors),
        }
    }
}
