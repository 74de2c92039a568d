//! HTML fragment rendering for web hosts

use std::fmt::Write;

use crate::state::{ConversationState, Sender};

use super::links::Segment;
use super::render::{build_view, Align, ViewItem, ERROR_TITLE, THINKING_TEXT};

/// Links open in a new browsing context
pub const LINK_TARGET: &str = "_blank";
/// ...with no opener handle and no referrer
pub const LINK_REL: &str = "noopener noreferrer";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_segments(out: &mut String, segments: &[Segment]) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&escape(text)),
            Segment::Link(href) => {
                let href = escape(href);
                let _ = write!(
                    out,
                    r#"<a href="{href}" target="{LINK_TARGET}" rel="{LINK_REL}">{href}</a>"#
                );
            }
        }
    }
}

/// Render the message area as an HTML fragment.
pub fn render_html(state: &ConversationState) -> String {
    let mut out = String::from(r#"<div class="askpanel-log">"#);

    for item in build_view(state) {
        match item {
            ViewItem::Message { sender, align, segments } => {
                let class = match sender {
                    Sender::User => "user",
                    Sender::Bot => "bot",
                };
                let side = match align {
                    Align::Left => "left",
                    Align::Right => "right",
                };
                let _ = write!(
                    out,
                    r#"<div class="askpanel-msg {class}" style="text-align:{side}"><span style="white-space:pre-line">"#
                );
                render_segments(&mut out, &segments);
                out.push_str("</span></div>");
            }
            ViewItem::Thinking => {
                let _ = write!(out, r#"<div class="askpanel-thinking">{THINKING_TEXT}...</div>"#);
            }
            ViewItem::ErrorBanner(error) => {
                let _ = write!(
                    out,
                    r#"<div class="askpanel-error">{ERROR_TITLE}<br />{}</div>"#,
                    escape(&error)
                );
            }
        }
    }

    out.push_str("</div>");
    out
}
