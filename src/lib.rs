pub mod app;
pub mod calendar;
pub mod storage;
pub mod sync;

pub use app::{EventEditSession, EventListController, EventStore, NewEventSession};
pub use calendar::{is_visible_on, Event};
pub use sync::{ActionOutcome, Credentials, EventApi, FailureKind, HttpEventClient, ListOutcome};
