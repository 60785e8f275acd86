//! Terminal UI built on ratatui.
//!
//! - `render`: frame layout, title/tab/status bars and overlays
//! - `input`: keyboard dispatch
//! - `styles`: palette and text styles
//! - `tabs`: one module per tab, plus the attendance panel and form overlays

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
