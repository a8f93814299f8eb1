//! HTML rendering of the conversation.
//!
//! Assistant content is Markdown and is rendered as rich text; any raw HTML it
//! contains is escaped. User content is always literal text.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};
use pulldown_cmark_escape::FmtWriter;

use crate::message::{Message, Role};
use crate::session::ChatSession;

/// Shown instead of the chat form when speech recognition is unavailable.
pub const SPEECH_UNSUPPORTED_NOTICE: &str = "Browser does not support speech recognition.";

/// Link schemes allowed in rendered assistant content. Relative URLs are always allowed.
const SAFE_URL_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // Writing into a String cannot fail.
    let _ = pulldown_cmark_escape::escape_html(FmtWriter(&mut out), text);
    out
}

/// True for relative URLs and for the schemes in [`SAFE_URL_SCHEMES`].
///
/// Whitespace and control characters are ignored, as browsers do when
/// resolving a scheme.
pub fn is_safe_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    match cleaned.find([':', '/', '?', '#']) {
        Some(i) if cleaned[i..].starts_with(':') => {
            let scheme = &cleaned[..i];
            SAFE_URL_SCHEMES
                .iter()
                .any(|safe| scheme.eq_ignore_ascii_case(safe))
        }
        _ => true,
    }
}

fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        CowStr::Borrowed("")
    }
}

/// Renders Markdown to HTML, turning embedded raw HTML into escaped text and
/// blanking link or image URLs with an unsafe scheme.
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub fn render_message(message: &Message) -> String {
    let body = match message.role {
        Role::Assistant => render_markdown(&message.content),
        Role::User => format!("<p>{}</p>", escape_html(&message.content)),
    };
    format!(
        r#"<div class="message message-{role}" data-id="{id}"><p class="label">{label}</p><div class="content">{body}</div></div>"#,
        role = message.role.as_str(),
        id = message.id,
        label = message.role.label(),
    )
}

pub fn render_messages<'a>(messages: impl IntoIterator<Item = &'a Message>) -> String {
    messages.into_iter().map(render_message).collect()
}

/// Renders the whole message pane: conversation followed by the error line, if any.
///
/// With speech recognition unavailable only the static notice is rendered.
pub fn render_session(session: &ChatSession) -> String {
    if !session.form_enabled() {
        return format!(r#"<span class="notice">{SPEECH_UNSUPPORTED_NOTICE}</span>"#);
    }

    let mut out = render_messages(session.conversation().iter());
    if let Some(error) = session.error() {
        out.push_str(&format!(r#"<p class="error">{}</p>"#, escape_html(error)));
    }
    out
}
