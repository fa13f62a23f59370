//! TUI components for hostscope
//!
//! This crate renders reconciled snapshots as a single refreshing dashboard
//! and listens for the quit input while the terminal is in raw mode.

pub mod tui;
pub mod ui;

pub use tui::{matches_token, KeyQuitListener, QuitInput, Tui};
pub use ui::components::{RankedList, StatusBar};
pub use ui::screens::{DashboardScreen, DashboardView};
pub use ui::{Layout, Theme};
