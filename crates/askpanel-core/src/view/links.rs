/// Bare URL detection for bot messages
use regex::Regex;
use std::sync::OnceLock;

static URL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Characters peeled off the end of a match and kept as plain text
const TRAILING_PUNCTUATION: &[char] = &['.', ',', '!', '?', ')'];

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r"https?://\S+").expect("Failed to compile URL regex"))
}

/// A run of message text, either plain or a link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Link(String),
}

impl Segment {
    pub fn as_str(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Link(href) => href,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Segment::Link(_))
    }
}

/// Split `text` into plain and link segments.
///
/// Matches are found left to right. Trailing `.,!?)` is moved out of the link
/// and back into the plain text that follows it, so joining every segment's
/// `as_str()` gives back `text` exactly. Adjacent plain runs are merged.
pub fn linkify(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut cursor = 0;

    for mat in url_regex().find_iter(text) {
        plain.push_str(&text[cursor..mat.start()]);

        let href = mat.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if !plain.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut plain)));
        }
        segments.push(Segment::Link(href.to_string()));

        plain.push_str(&mat.as_str()[href.len()..]);
        cursor = mat.end();
    }

    plain.push_str(&text[cursor..]);
    if !plain.is_empty() {
        segments.push(Segment::Text(plain));
    }

    segments
}

/// Every link target in `text`, in order
pub fn links_in(text: &str) -> Vec<String> {
    linkify(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Link(href) => Some(href),
            Segment::Text(_) => None,
        })
        .collect()
}
