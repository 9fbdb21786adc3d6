//! Rendering of AI answers into chat-friendly text.

pub mod renderer;

pub use renderer::{render_reply, suggestions_section, RenderOptions, RenderedReply, SECTION_DIVIDER};
