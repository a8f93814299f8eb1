//! Chat session state container.
//!
//! Holds everything the chat UI shows: the draft, the conversation, the last
//! error and the dictation toggle. All changes go through the transition
//! methods below, so the behaviour can be exercised without a browser.
//!
//! Overlapping submissions are refused: while one relay call is outstanding
//! [`ChatSession::begin_submit`] returns `None`, which keeps replies in
//! submission order.

use futures::{Stream, StreamExt};
use tracing::{debug, error};

use crate::conversation::ConversationView;
use crate::dictation::{Dictation, DictationEvent, DictationState};
use crate::message::{MessageId, Role};
use crate::relay::{RelayClient, RelayFailure};
use crate::render;

/// User-visible text for any failed relay call.
pub const RELAY_FAILURE_MESSAGE: &str = "Failed to get a response from the server.";

/// Key that submits the draft.
pub const SUBMIT_KEY: &str = "Enter";

/// Whether the runtime can do speech recognition.
///
/// Without it the chat form is disabled entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechSupport {
    Supported,
    Unsupported,
}

/// What the host should do with a key press in the input area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Suppress the key's default effect and call `submit`.
    Submit,
    /// Let the key through.
    Default,
}

/// A submission whose relay call has not resolved yet.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending submission must be completed"]
pub struct PendingSubmission {
    message_id: MessageId,
    text: String,
}

impl PendingSubmission {
    /// The optimistic user message appended for this submission.
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Text to send to the relay.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    draft: String,
    conversation: ConversationView,
    error: Option<String>,
    dictation: Dictation,
    speech: SpeechSupport,
    in_flight: Option<MessageId>,
    seen_revision: u64,
}

impl ChatSession {
    pub fn new(speech: SpeechSupport) -> Self {
        Self {
            draft: String::new(),
            conversation: ConversationView::new(),
            error: None,
            dictation: Dictation::default(),
            speech,
            in_flight: None,
            seen_revision: 0,
        }
    }

    // ---- read access ----

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn conversation(&self) -> &ConversationView {
        &self.conversation
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// False when speech recognition is unavailable: no input, no send, no mic.
    pub fn form_enabled(&self) -> bool {
        self.speech == SpeechSupport::Supported
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.dictation.is_listening()
    }

    pub fn dictation(&self) -> &Dictation {
        &self.dictation
    }

    /// Whether `submit` would do anything right now.
    pub fn can_submit(&self) -> bool {
        self.form_enabled() && !self.is_sending() && !self.draft.trim().is_empty()
    }

    /// Returns true once after each conversation change.
    pub fn take_scroll_request(&mut self) -> bool {
        let revision = self.conversation.revision();
        let changed = revision != self.seen_revision;
        self.seen_revision = revision;
        changed
    }

    pub fn render_html(&self) -> String {
        render::render_session(self)
    }

    // ---- transitions ----

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if self.form_enabled() {
            self.draft = text.into();
        }
    }

    /// Clears the draft and the dictation buffer.
    pub fn clear_draft(&mut self) {
        self.draft.clear();
        self.dictation.reset_transcript();
    }

    pub fn append_user_message(&mut self, content: impl Into<String>) -> MessageId {
        self.conversation.append(Role::User, content)
    }

    pub fn append_assistant_message(&mut self, content: impl Into<String>) -> MessageId {
        self.conversation.append(Role::Assistant, content)
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Maps a key press in the input area to an action.
    pub fn handle_key(&self, key: &str) -> KeyAction {
        if self.form_enabled() && key == SUBMIT_KEY {
            KeyAction::Submit
        } else {
            KeyAction::Default
        }
    }

    /// First half of `submit`: appends the user message and marks a call in flight.
    ///
    /// Returns `None` without touching state when the draft is blank, the form
    /// is disabled, or another submission is outstanding.
    pub fn begin_submit(&mut self) -> Option<PendingSubmission> {
        if !self.can_submit() {
            return None;
        }

        let text = self.draft.clone();
        let message_id = self.append_user_message(text.clone());
        self.clear_error();
        self.in_flight = Some(message_id);
        debug!(%message_id, "submission started");

        Some(PendingSubmission { message_id, text })
    }

    /// Second half of `submit`: applies the relay outcome.
    ///
    /// On success appends the assistant reply and clears the draft. On failure
    /// sets the fixed error string and leaves the draft as it is.
    pub fn complete_submit(
        &mut self,
        pending: PendingSubmission,
        outcome: Result<String, RelayFailure>,
    ) {
        if self.in_flight == Some(pending.message_id) {
            self.in_flight = None;
        }

        match outcome {
            Ok(reply) => {
                self.append_assistant_message(reply);
                self.clear_draft();
            }
            Err(e) => {
                error!(message_id = %pending.message_id, error = %e, "relay call failed");
                self.set_error(RELAY_FAILURE_MESSAGE);
            }
        }
    }

    /// Submits the draft through `relay`. Returns false when nothing was sent.
    pub async fn submit<R>(&mut self, relay: &R) -> bool
    where
        R: RelayClient + ?Sized,
    {
        let Some(pending) = self.begin_submit() else {
            return false;
        };
        let outcome = relay.send(pending.text()).await;
        self.complete_submit(pending, outcome);
        true
    }

    /// Flips the dictation toggle. Stopping keeps the draft.
    pub fn toggle_dictation(&mut self) -> DictationState {
        if !self.form_enabled() {
            return DictationState::Idle;
        }
        self.dictation.toggle()
    }

    /// Merges one dictation event. Returns false once the session has ended.
    pub fn apply_dictation_event(&mut self, event: DictationEvent) -> bool {
        match event {
            DictationEvent::Transcript(text) => {
                if !text.is_empty() && self.dictation.update_transcript(&text) {
                    self.draft = text;
                }
                true
            }
            DictationEvent::Stop => {
                self.dictation.stop();
                false
            }
        }
    }

    /// Drains a dictation stream into the draft until it stops or ends.
    pub async fn follow_dictation<S>(&mut self, mut events: S)
    where
        S: Stream<Item = DictationEvent> + Unpin,
    {
        while let Some(event) = events.next().await {
            if !self.apply_dictation_event(event) {
                return;
            }
        }
        self.dictation.stop();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(SpeechSupport::Supported)
    }
}
