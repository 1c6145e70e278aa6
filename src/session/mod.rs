pub mod message;
pub mod store;

pub use message::{Message, Role};
pub use store::{
    sanitize_name, DeleteOutcome, SessionError, SessionRecord, SessionStore, SessionSummary,
    SystemPrompt,
};
