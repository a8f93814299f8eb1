//! Voice dictation state and transcript feed.
//!
//! A speech recognizer is modelled as a producer ([`DictationFeed`]) pushing
//! [`DictationEvent`]s into a lazy stream ([`DictationStream`]). Exactly one
//! subscriber drains the stream and merges transcript updates into the draft;
//! the stream ends on an explicit [`DictationEvent::Stop`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::channel::mpsc;
use thiserror::Error;

/// Listening state of the dictation toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictationState {
    #[default]
    Idle,
    Listening,
}

/// Event emitted by a speech recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    /// The rolling transcript of the current utterance.
    Transcript(String),
    /// Capture ended.
    Stop,
}

#[derive(Debug, Error)]
pub enum DictationError {
    #[error("Dictation stream closed")]
    Closed,
}

/// Dictation toggle plus the last transcript seen while listening.
#[derive(Debug, Clone, Default)]
pub struct Dictation {
    state: DictationState,
    transcript: String,
}

impl Dictation {
    pub fn is_listening(&self) -> bool {
        self.state == DictationState::Listening
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Flips idle ↔ listening and returns the new state.
    pub fn toggle(&mut self) -> DictationState {
        self.state = match self.state {
            DictationState::Idle => DictationState::Listening,
            DictationState::Listening => DictationState::Idle,
        };
        self.state
    }

    pub fn stop(&mut self) {
        self.state = DictationState::Idle;
    }

    /// Records a transcript update. Ignored while idle.
    pub fn update_transcript(&mut self, text: &str) -> bool {
        if !self.is_listening() {
            return false;
        }
        self.transcript.clear();
        self.transcript.push_str(text);
        true
    }

    pub fn reset_transcript(&mut self) {
        self.transcript.clear();
    }
}

/// Producer half handed to the speech recognizer.
#[derive(Debug, Clone)]
pub struct DictationFeed {
    tx: mpsc::UnboundedSender<DictationEvent>,
}

impl DictationFeed {
    pub fn transcript(&self, text: impl Into<String>) -> Result<(), DictationError> {
        self.send(DictationEvent::Transcript(text.into()))
    }

    /// Ends the stream. Further sends fail with [`DictationError::Closed`].
    pub fn stop(&self) -> Result<(), DictationError> {
        self.send(DictationEvent::Stop)?;
        self.tx.close_channel();
        Ok(())
    }

    fn send(&self, event: DictationEvent) -> Result<(), DictationError> {
        self.tx
            .unbounded_send(event)
            .map_err(|_| DictationError::Closed)
    }
}

/// Consumer half: a stream of dictation events.
#[derive(Debug)]
pub struct DictationStream {
    rx: mpsc::UnboundedReceiver<DictationEvent>,
}

impl Stream for DictationStream {
    type Item = DictationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

/// Opens a new dictation session.
pub fn dictation_channel() -> (DictationFeed, DictationStream) {
    let (tx, rx) = mpsc::unbounded();
    (DictationFeed { tx }, DictationStream { rx })
}

/// Identifies one dictation session opened through a [`DictationSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictationToken(u32);

impl DictationToken {
    pub fn from_id(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Holds the feed of the current dictation session.
///
/// A recognizer may report its end after a newer session was opened; those
/// late calls carry an old token and leave the current session alone.
#[derive(Debug, Default)]
pub struct DictationSlot {
    current: Option<(DictationToken, DictationFeed)>,
    last_id: u32,
}

impl DictationSlot {
    /// Stops any current session and opens a new one.
    pub fn open(&mut self) -> (DictationToken, DictationStream) {
        self.close_current();
        self.last_id = self.last_id.wrapping_add(1);
        let token = DictationToken(self.last_id);
        let (feed, stream) = dictation_channel();
        self.current = Some((token, feed));
        (token, stream)
    }

    pub fn current(&self) -> Option<DictationToken> {
        self.current.as_ref().map(|(token, _)| *token)
    }

    /// Feed for `token`, if it is still the current session.
    pub fn feed(&self, token: DictationToken) -> Option<&DictationFeed> {
        self.current
            .as_ref()
            .filter(|(current, _)| *current == token)
            .map(|(_, feed)| feed)
    }

    /// Stops the session for `token`. Returns false if it is not current.
    pub fn close(&mut self, token: DictationToken) -> bool {
        if self.current() != Some(token) {
            return false;
        }
        self.close_current();
        true
    }

    pub fn close_current(&mut self) {
        if let Some((_, feed)) = self.current.take() {
            // Already closed when the recognizer ended first.
            let _ = feed.stop();
        }
    }

    /// True when a different session has replaced `token`.
    pub fn is_stale(&self, token: DictationToken) -> bool {
        matches!(self.current(), Some(current) if current != token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn toggle_flips_state() {
        let mut d = Dictation::default();
        assert_eq!(d.toggle(), DictationState::Listening);
        assert_eq!(d.toggle(), DictationState::Idle);
    }

    #[test]
    fn transcript_ignored_while_idle() {
        let mut d = Dictation::default();
        assert!(!d.update_transcript("hello"));
        assert_eq!(d.transcript(), "");

        d.toggle();
        assert!(d.update_transcript("hello"));
        assert!(d.update_transcript("hello world"));
        assert_eq!(d.transcript(), "hello world");
    }

    #[tokio::test]
    async fn feed_delivers_events_in_order_then_ends() {
        let (feed, mut stream) = dictation_channel();
        feed.transcript("hel").unwrap();
        feed.transcript("hello").unwrap();
        feed.stop().unwrap();

        assert_eq!(stream.next().await, Some(DictationEvent::Transcript("hel".into())));
        assert_eq!(stream.next().await, Some(DictationEvent::Transcript("hello".into())));
        assert_eq!(stream.next().await, Some(DictationEvent::Stop));
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn late_end_of_old_session_leaves_new_one_open() {
        let mut slot = DictationSlot::default();
        let (old, _old_stream) = slot.open();
        slot.close_current();
        let (new, _new_stream) = slot.open();

        assert_ne!(old, new);
        assert!(!slot.close(old));
        assert!(slot.is_stale(old));
        assert!(!slot.is_stale(new));
        assert!(slot.feed(old).is_none());
        slot.feed(new).expect("new feed").transcript("still here").unwrap();

        assert!(slot.close(new));
        assert!(slot.current().is_none());
    }

    #[tokio::test]
    async fn opening_a_session_stops_the_previous_stream() {
        let mut slot = DictationSlot::default();
        let (_first, mut first_stream) = slot.open();
        let (second, _second_stream) = slot.open();

        assert_eq!(first_stream.next().await, Some(DictationEvent::Stop));
        assert_eq!(first_stream.next().await, None);
        assert_eq!(slot.current(), Some(second));
    }

    #[test]
    fn send_after_stop_fails() {
        let (feed, _stream) = dictation_channel();
        feed.stop().unwrap();
        assert!(matches!(feed.transcript("late"), Err(DictationError::Closed)));
    }
}
