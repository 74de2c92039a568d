pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use client::{AnswerClient, AnswerSource, DEFAULT_ENDPOINT};
pub use config::Config;
pub use error::SendError;
pub use pipeline::{PendingAnswer, SendPipeline};
pub use state::{ConversationState, Message, Sender};
pub use store::{Change, ConversationStore, Outcome, FAILURE_DESCRIPTION, FALLBACK_MESSAGE};
