use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::state::ConversationState;
use crate::store::Change;

/// Keeps the newest message in view.
///
/// Subscribe [`AutoScroll::observer`] to the store; any change to the log or
/// to `pending` arms a request. The host reports its layout with
/// [`AutoScroll::layout`], which retargets to the bottom when armed, and calls
/// [`AutoScroll::tick`] on its animation clock to ease the offset toward the
/// target. Nothing here writes to the store.
#[derive(Debug, Default)]
pub struct AutoScroll {
    requested: Arc<AtomicBool>,
    offset: u16,
    target: u16,
    max_offset: u16,
}

impl AutoScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer(&self) -> impl FnMut(Change, &ConversationState) + Send + 'static {
        let requested = Arc::clone(&self.requested);
        move |change, _| {
            if matches!(change, Change::Log | Change::Pending) {
                requested.store(true, Ordering::Relaxed);
            }
        }
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }

    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn target(&self) -> u16 {
        self.target
    }

    /// Report the current content and viewport height.
    pub fn layout(&mut self, content_height: u16, viewport_height: u16) {
        self.max_offset = content_height.saturating_sub(viewport_height);
        if self.requested.swap(false, Ordering::Relaxed) {
            self.target = self.max_offset;
        }
        self.target = self.target.min(self.max_offset);
        self.offset = self.offset.min(self.max_offset);
    }

    /// Move half the remaining distance toward the target. Returns whether
    /// the offset changed.
    pub fn tick(&mut self) -> bool {
        if self.offset == self.target {
            return false;
        }
        let distance = self.offset.abs_diff(self.target);
        let step = distance.div_ceil(2);
        if self.offset < self.target {
            self.offset += step;
        } else {
            self.offset -= step;
        }
        true
    }

    /// Manual scroll. Takes effect immediately and stops any animation.
    pub fn scroll_by(&mut self, delta: i32) {
        let next = (i32::from(self.offset) + delta).clamp(0, i32::from(self.max_offset));
        self.offset = u16::try_from(next).unwrap_or(self.max_offset);
        self.target = self.offset;
    }
}
