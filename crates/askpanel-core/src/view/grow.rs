use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use unicode_width::UnicodeWidthChar;

use crate::state::ConversationState;
use crate::store::Change;

/// How tall the input control may get, in the host's units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSizing {
    pub line_height: u16,
    /// Space around the text (borders, padding)
    pub padding: u16,
    pub min: u16,
    pub max: u16,
}

impl InputSizing {
    /// Pixel sizing used by the embedded web widget
    pub const WIDGET: Self = Self {
        line_height: 20,
        padding: 16,
        min: 36,
        max: 96,
    };

    /// Row sizing for a bordered terminal input box
    pub const fn terminal(max_rows: u16) -> Self {
        Self {
            line_height: 1,
            padding: 2,
            min: 3,
            max: max_rows.saturating_add(2),
        }
    }

    /// Height needed to show `text` at `width` columns, clamped.
    pub fn height_for(&self, text: &str, width: u16) -> u16 {
        let lines = wrapped_line_count(text, width);
        let wanted = u16::try_from(lines)
            .unwrap_or(u16::MAX)
            .saturating_mul(self.line_height)
            .saturating_add(self.padding);
        wanted.clamp(self.min, self.max.max(self.min))
    }
}

/// Hard-wrap `text` at `width` display columns, one entry per row.
/// Wide characters (CJK, emoji) take two columns and never straddle a row
/// break. A width of zero disables wrapping.
pub fn wrap_rows(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let mut row = String::new();
        let mut used = 0;
        for c in line.chars() {
            let w = c.width().unwrap_or(0);
            if width > 0 && used > 0 && used + w > width {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(c);
            used += w;
        }
        rows.push(row);
    }
    rows
}

/// Number of rows `text` occupies when hard-wrapped at `width` columns
pub fn wrapped_line_count(text: &str, width: u16) -> usize {
    wrap_rows(text, width).len()
}

/// Recomputes the input height whenever the draft changes.
#[derive(Debug)]
pub struct AutoGrow {
    sizing: InputSizing,
    width: Arc<AtomicU16>,
    height: Arc<AtomicU16>,
}

impl AutoGrow {
    pub fn new(sizing: InputSizing) -> Self {
        Self {
            sizing,
            width: Arc::new(AtomicU16::new(0)),
            height: Arc::new(AtomicU16::new(sizing.min)),
        }
    }

    pub fn observer(&self) -> impl FnMut(Change, &ConversationState) + Send + 'static {
        let sizing = self.sizing;
        let width = Arc::clone(&self.width);
        let height = Arc::clone(&self.height);
        move |change, state| {
            if change == Change::Draft {
                let h = sizing.height_for(&state.draft, width.load(Ordering::Relaxed));
                height.store(h, Ordering::Relaxed);
            }
        }
    }

    /// The text area got a new width; refit the current draft.
    pub fn resize(&self, width: u16, draft: &str) {
        if self.width.swap(width, Ordering::Relaxed) != width {
            self.height
                .store(self.sizing.height_for(draft, width), Ordering::Relaxed);
        }
    }

    pub fn height(&self) -> u16 {
        self.height.load(Ordering::Relaxed)
    }

    pub fn sizing(&self) -> InputSizing {
        self.sizing
    }
}
