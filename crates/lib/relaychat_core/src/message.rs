//! Chat message types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a message within one page session.
///
/// Assigned by [`ConversationView`](crate::ConversationView) in strictly
/// increasing order, so ids sort the same way messages were appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Sequence number within the conversation (starts at 1).
    pub fn seq(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label shown above the message content.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You:",
            Role::Assistant => "AI:",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single exchanged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}
