use crate::app::form::{EventForm, InFlight, SubmitError};
use crate::app::list_controller::EventListController;
use crate::sync::{ActionOutcome, Credentials, EventApi, EventPayload};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionStatus {
    Pending,
    Succeeded(ActionOutcome),
    Failed(ActionOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewEventState {
    Collapsed,
    Expanded(Option<SubmissionStatus>),
}

/// Creation form: collapsed or expanded, with the status of the last submit.
pub struct NewEventSession {
    state: NewEventState,
    form: EventForm,
    in_flight: bool,
}

impl NewEventSession {
    pub fn new() -> Self {
        Self {
            state: NewEventState::Collapsed,
            form: EventForm::default(),
            in_flight: false,
        }
    }

    pub fn state(&self) -> &NewEventState {
        &self.state
    }

    pub fn form(&self) -> &EventForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EventForm {
        &mut self.form
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
    }

    pub fn toggle(&mut self) {
        self.state = match self.state {
            NewEventState::Collapsed => NewEventState::Expanded(None),
            NewEventState::Expanded(_) => NewEventState::Collapsed,
        };
    }

    pub fn begin_submit(&mut self) -> Result<EventPayload, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::RequestInFlight);
        }
        if self.state == NewEventState::Collapsed {
            return Err(SubmitError::Collapsed);
        }

        let payload = self.form.validate()?;
        self.in_flight = true;
        self.state = NewEventState::Expanded(Some(SubmissionStatus::Pending));
        Ok(payload)
    }

    /// Settles the in-flight request. The form values are kept either way.
    /// Returns whether the event list should be refreshed.
    pub fn finish_submit(&mut self, outcome: &ActionOutcome) -> bool {
        self.in_flight = false;
        let status = if outcome.succeeded() {
            SubmissionStatus::Succeeded(outcome.clone())
        } else {
            tracing::warn!("Event creation failed: {}", outcome.message);
            SubmissionStatus::Failed(outcome.clone())
        };
        if let NewEventState::Expanded(current) = &mut self.state {
            *current = Some(status);
        }
        outcome.succeeded()
    }

    pub async fn submit(
        &mut self,
        list: &mut EventListController,
        api: &dyn EventApi,
        credentials: &Credentials,
    ) -> Result<ActionOutcome, SubmitError> {
        let payload = self.begin_submit()?;
        let outcome = {
            let _pending = PendingCreate {
                _in_flight: InFlight::new(&mut self.in_flight),
                state: &mut self.state,
            };
            api.create(credentials, &payload).await
        };
        if self.finish_submit(&outcome) {
            list.request_refresh();
        }
        Ok(outcome)
    }
}

/// Pending state of one create request. If the request is abandoned before
/// it settles, the session forgets the `Pending` status along with the flag.
struct PendingCreate<'a> {
    _in_flight: InFlight<'a>,
    state: &'a mut NewEventState,
}

impl Drop for PendingCreate<'_> {
    fn drop(&mut self) {
        if *self.state == NewEventState::Expanded(Some(SubmissionStatus::Pending)) {
            *self.state = NewEventState::Expanded(None);
        }
    }
}

impl Default for NewEventSession {
    fn default() -> Self {
        Self::new()
    }
}
