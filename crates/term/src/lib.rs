//! Terminal front-end module.
//!
//! Renders level snapshots into a plain framebuffer and flushes it with
//! crossterm. No widget toolkit; the view is a handful of text rows.

pub mod belt_view;
pub mod fb;
pub mod input;
pub mod renderer;

pub use conveyor_sorter_core as core;
pub use conveyor_sorter_types as types;

pub use belt_view::{BeltView, Viewport};
pub use fb::{Cell, FrameBuffer, Rgb, Style};
pub use input::{map_key, step_lane, UiAction};
pub use renderer::TerminalRenderer;
