pub mod edit_session;
pub mod event_store;
pub mod form;
pub mod list_controller;
pub mod new_event_session;

pub use edit_session::{EditMode, EventEditSession};
pub use event_store::EventStore;
pub use form::{EventForm, FieldError, FormErrors, SubmitError};
pub use list_controller::EventListController;
pub use new_event_session::{NewEventSession, NewEventState, SubmissionStatus};
