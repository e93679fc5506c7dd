pub mod ai;
pub mod chapters;
pub mod config;
pub mod error;
pub mod explanation;
pub mod provider;
pub mod share;
pub mod speech;
pub mod state;
pub mod subscribe;

// Re-export main types for convenience
pub use ai::{Backend, ExplanationClient, GeminiClient, OllamaClient, OpenAIClient};
pub use chapters::{ChapterInfo, CHAPTERS, DEFAULT_LANGUAGE, LANGUAGES};
pub use config::Config;
pub use error::{ExplainError, ShareError};
pub use explanation::Explanation;
pub use provider::Provider;
pub use share::{ShareCard, ShareOutcome, Sharer};
pub use speech::{CommandVoice, Narrator, SpeechEvent};
pub use state::{RequestStatus, Selection, Session, VerseRequest, FETCH_ERROR_MESSAGE};
pub use subscribe::SubscriptionForm;
