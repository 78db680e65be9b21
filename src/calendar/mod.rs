pub mod event;
pub mod date_range;
pub mod timestamp;

pub use event::Event;
pub use date_range::{is_visible_on, is_day_within};
pub use timestamp::{parse_timestamp, format_for_input, format_for_wire, TimestampParseError};
