pub mod app;
pub mod chat_log;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod openai;
pub mod state;
pub mod status;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use chat_log::{Bubble, ChatLog, TypingIndicator};
pub use config::Config;
pub use dispatcher::{RequestSettings, Session, Submission};
pub use error::{ChatError, ChatResult};
pub use openai::{CompletionApi, CompletionRequest, OpenAIClient};
pub use state::{ChatMessage, ChatRole, History};
pub use status::{ConnectionStatus, StatusState};
