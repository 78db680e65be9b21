use crate::app::form::{EventForm, InFlight, SubmitError};
use crate::app::list_controller::EventListController;
use crate::calendar::Event;
use crate::sync::{ActionOutcome, Credentials, EventApi, EventUpdate};

#[derive(Debug, Clone, PartialEq)]
pub enum EditMode {
    Listing,
    Editing(EventForm),
}

/// Per-event list/edit state machine.
pub struct EventEditSession {
    event_id: String,
    mode: EditMode,
    in_flight: bool,
}

impl EventEditSession {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            mode: EditMode::Listing,
            in_flight: false,
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn mode(&self) -> &EditMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, EditMode::Editing(_))
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
    }

    /// Enters edit mode with the form pre-filled from `event`.
    pub fn edit(&mut self, event: &Event) {
        if self.mode == EditMode::Listing {
            self.mode = EditMode::Editing(EventForm::for_event(event));
        }
    }

    pub fn form_mut(&mut self) -> Option<&mut EventForm> {
        match &mut self.mode {
            EditMode::Editing(form) => Some(form),
            EditMode::Listing => None,
        }
    }

    pub fn cancel(&mut self) {
        self.mode = EditMode::Listing;
    }

    /// Validates the edited values and marks a request as in flight.
    pub fn begin_submit(&mut self) -> Result<EventUpdate, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::RequestInFlight);
        }
        let EditMode::Editing(form) = &self.mode else {
            return Err(SubmitError::NotEditing);
        };

        let payload = form.validate()?;
        self.in_flight = true;
        Ok(EventUpdate::new(self.event_id.clone(), payload))
    }

    /// Settles the in-flight request. A failure keeps the edit form open and
    /// is only logged.
    pub fn finish_submit(&mut self, outcome: &ActionOutcome) {
        self.in_flight = false;
        if outcome.succeeded() {
            self.mode = EditMode::Listing;
        } else {
            tracing::warn!("Update of event {} failed: {}", self.event_id, outcome.message);
        }
    }

    pub async fn submit(
        &mut self,
        list: &mut EventListController,
        api: &dyn EventApi,
        credentials: &Credentials,
    ) -> Result<ActionOutcome, SubmitError> {
        let update = self.begin_submit()?;
        let outcome = {
            let _in_flight = InFlight::new(&mut self.in_flight);
            list.update(api, credentials, &update).await
        };
        self.finish_submit(&outcome);
        Ok(outcome)
    }
}
