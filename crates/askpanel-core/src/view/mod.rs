//! Presentation layer: read-only transforms from state to something a host
//! can draw, plus the auto-scroll and auto-grow reactors.

pub mod grow;
pub mod html;
pub mod links;
pub mod render;
pub mod scroll;

pub use grow::{AutoGrow, InputSizing};
pub use html::render_html;
pub use links::{linkify, links_in, Segment};
pub use render::{build_view, Align, ViewItem};
pub use scroll::AutoScroll;
