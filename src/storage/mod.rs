pub mod config;
pub mod session;

pub use config::{Config, ServerConfig, SessionConfig};
pub use session::{SessionError, StoredSession, TokenStorage};
