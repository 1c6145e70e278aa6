pub mod chat;
pub mod gemini_client;
pub mod model;
pub mod prompt;
pub mod response;

pub use chat::ChatDriver;
pub use gemini_client::GeminiClient;
pub use model::{LanguageModel, RemoteFile};
pub use prompt::PromptBuilder;
pub use response::ResponseParser;
