//! Terminal handling

mod event;
mod terminal;

pub use event::{matches_token, KeyQuitListener, QuitInput};
pub use terminal::Tui;
