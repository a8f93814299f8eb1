//! Browser bindings for the chat session.
//!
//! The page glue (`app.js`) owns the DOM and the speech recognizer; every
//! piece of chat state lives in [`ChatApp`].

use std::cell::RefCell;
use std::rc::Rc;

use futures::StreamExt;
use js_sys::{Function, Promise};
use relaychat_core::dictation::{DictationSlot, DictationState, DictationStream, DictationToken};
use relaychat_core::relay::{HttpRelayClient, RelayClient};
use relaychat_core::{ChatSession, KeyAction, SpeechSupport};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

/// Routes `tracing` output to the browser console.
#[wasm_bindgen(start)]
pub fn start() {
    // Only fails if a subscriber is already installed.
    let _ = tracing_wasm::try_set_as_global_default();
}

/// Returns the version of the relaychat core.
#[wasm_bindgen]
pub fn version() -> String {
    relaychat_core::version().to_string()
}

/// Chat session handle exported to JavaScript.
#[wasm_bindgen]
pub struct ChatApp {
    session: Rc<RefCell<ChatSession>>,
    relay: Rc<HttpRelayClient>,
    dictation: Rc<RefCell<DictationSlot>>,
    on_change: Function,
}

#[wasm_bindgen]
impl ChatApp {
    /// `origin` is the page origin serving `/api/chat`; `on_change` is called
    /// whenever state changes outside a direct method call.
    #[wasm_bindgen(constructor)]
    pub fn new(
        origin: &str,
        speech_supported: bool,
        on_change: Function,
    ) -> Result<ChatApp, JsError> {
        let relay = HttpRelayClient::new(origin).map_err(|e| JsError::new(&e.to_string()))?;
        let speech = if speech_supported {
            SpeechSupport::Supported
        } else {
            SpeechSupport::Unsupported
        };
        Ok(ChatApp {
            session: Rc::new(RefCell::new(ChatSession::new(speech))),
            relay: Rc::new(relay),
            dictation: Rc::new(RefCell::new(DictationSlot::default())),
            on_change,
        })
    }

    pub fn draft(&self) -> String {
        self.session.borrow().draft().to_string()
    }

    #[wasm_bindgen(js_name = setDraft)]
    pub fn set_draft(&self, text: String) {
        self.session.borrow_mut().set_draft(text);
    }

    pub fn error(&self) -> Option<String> {
        self.session.borrow().error().map(str::to_string)
    }

    #[wasm_bindgen(js_name = formEnabled)]
    pub fn form_enabled(&self) -> bool {
        self.session.borrow().form_enabled()
    }

    #[wasm_bindgen(js_name = isSending)]
    pub fn is_sending(&self) -> bool {
        self.session.borrow().is_sending()
    }

    #[wasm_bindgen(js_name = isListening)]
    pub fn is_listening(&self) -> bool {
        self.session.borrow().is_listening()
    }

    /// True when the key should submit; the caller must prevent its default.
    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(&self, key: &str) -> bool {
        self.session.borrow().handle_key(key) == KeyAction::Submit
    }

    /// Submits the draft. The user message is appended before this returns;
    /// the promise resolves to whether anything was sent.
    pub fn submit(&self) -> Promise {
        let pending = self.session.borrow_mut().begin_submit();
        let session = Rc::clone(&self.session);
        let relay = Rc::clone(&self.relay);
        let on_change = self.on_change.clone();

        future_to_promise(async move {
            let Some(pending) = pending else {
                return Ok(JsValue::FALSE);
            };
            let outcome = relay.send(pending.text()).await;
            session.borrow_mut().complete_submit(pending, outcome);
            notify(&on_change);
            Ok(JsValue::TRUE)
        })
    }

    /// Starts or stops dictation. Returns the new session's token while
    /// listening, `undefined` once stopped.
    #[wasm_bindgen(js_name = toggleDictation)]
    pub fn toggle_dictation(&self) -> Option<u32> {
        let state = self.session.borrow_mut().toggle_dictation();
        match state {
            DictationState::Listening => {
                let (token, stream) = self.dictation.borrow_mut().open();
                spawn_local(follow(
                    Rc::clone(&self.session),
                    Rc::clone(&self.dictation),
                    token,
                    stream,
                    self.on_change.clone(),
                ));
                Some(token.id())
            }
            DictationState::Idle => {
                self.dictation.borrow_mut().close_current();
                None
            }
        }
    }

    /// Rolling transcript from the recognizer started with `token`.
    #[wasm_bindgen(js_name = onTranscript)]
    pub fn on_transcript(&self, token: u32, text: String) {
        if let Some(feed) = self.dictation.borrow().feed(DictationToken::from_id(token))
            && let Err(e) = feed.transcript(text)
        {
            warn!(error = %e, "dropping transcript update");
        }
    }

    /// The recognizer started with `token` stopped on its own.
    #[wasm_bindgen(js_name = onDictationEnd)]
    pub fn on_dictation_end(&self, token: u32) {
        if !self.dictation.borrow_mut().close(DictationToken::from_id(token)) {
            debug!(token, "ignoring end of a replaced dictation session");
        }
    }

    #[wasm_bindgen(js_name = renderHtml)]
    pub fn render_html(&self) -> String {
        self.session.borrow().render_html()
    }

    /// True once after each conversation change; the page scrolls to the bottom.
    #[wasm_bindgen(js_name = takeScrollRequest)]
    pub fn take_scroll_request(&self) -> bool {
        self.session.borrow_mut().take_scroll_request()
    }
}

/// Merges dictation events into the session until the feed stops.
///
/// Events still queued after a newer session took over are dropped.
async fn follow(
    session: Rc<RefCell<ChatSession>>,
    dictation: Rc<RefCell<DictationSlot>>,
    token: DictationToken,
    mut events: DictationStream,
    on_change: Function,
) {
    while let Some(event) = events.next().await {
        if dictation.borrow().is_stale(token) {
            break;
        }
        let more = session.borrow_mut().apply_dictation_event(event);
        notify(&on_change);
        if !more {
            break;
        }
    }
}

fn notify(on_change: &Function) {
    if let Err(e) = on_change.call0(&JsValue::NULL) {
        warn!(error = ?e, "on_change callback failed");
    }
}
