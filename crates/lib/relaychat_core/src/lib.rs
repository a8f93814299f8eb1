//! # relaychat_core
//!
//! Core chat model for Relaychat: messages, the append-only conversation,
//! the browser-independent chat session state container, dictation feed,
//! HTML rendering, and the client side of the relay call.

pub mod conversation;
pub mod dictation;
pub mod message;
pub mod relay;
pub mod render;
pub mod session;
pub mod wire;

pub use conversation::ConversationView;
pub use message::{Message, MessageId, Role};
pub use session::{ChatSession, KeyAction, PendingSubmission, SpeechSupport};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
