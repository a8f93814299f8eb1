//! Append-only conversation view.

use crate::message::{Message, MessageId, Role};

/// Ordered sequence of messages for the current page session.
///
/// Insertion order is display order. The only mutation is [`append`](Self::append);
/// existing messages are never edited or removed.
#[derive(Debug, Clone, Default)]
pub struct ConversationView {
    messages: Vec<Message>,
    next_seq: u64,
    revision: u64,
}

impl ConversationView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns its freshly assigned id.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> MessageId {
        self.next_seq += 1;
        let id = MessageId::new(self.next_seq);
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
        });
        self.revision += 1;
        id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bumped on every append.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_preserves_order_and_assigns_increasing_ids() {
        let mut view = ConversationView::new();
        let a = view.append(Role::User, "one");
        let b = view.append(Role::Assistant, "two");
        let c = view.append(Role::User, "three");

        assert!(a < b && b < c);
        let contents: Vec<_> = view.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(view.revision(), 3);
    }

    #[test]
    fn earlier_messages_are_untouched_by_later_appends() {
        let mut view = ConversationView::new();
        let first = view.append(Role::User, "hello");
        let snapshot = view.get(first).cloned().unwrap();

        view.append(Role::Assistant, "hi");
        view.append(Role::User, "again");

        assert_eq!(view.get(first), Some(&snapshot));
        assert_eq!(view.messages()[0], snapshot);
    }

    #[test]
    fn empty_view() {
        let view = ConversationView::new();
        assert!(view.is_empty());
        assert!(view.last().is_none());
        assert_eq!(view.revision(), 0);
    }
}
