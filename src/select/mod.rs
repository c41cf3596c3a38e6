//! Interactive tree selector
//!
//! The selector keeps its state (`Selector`) apart from the terminal
//! session (`terminal::run`) so that navigation can be driven from tests
//! without a terminal.
//!
//! # Module Structure
//!
//! - `keys` - Key bindings
//! - `state` - Cursor, collapsed directories and lazy expansion
//! - `render` - In-place frame drawing
//! - `terminal` - Raw mode, event loop and editor hand-off
//! - `clipboard` - Copy through the platform clipboard tool

mod clipboard;
mod keys;
mod render;
mod state;
mod terminal;

pub use keys::{Action, action_for};
pub use render::Renderer;
pub use state::{Outcome, Selector};
pub use terminal::run;
