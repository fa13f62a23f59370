use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the dashboard screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DashboardAreas {
    pub header: Rect,
    pub firewall: Rect,
    pub auth: Rect,
    pub ban: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Header row, three stacked panels, status bar
    ///
    /// The auth panel lists four tables and gets the largest share.
    pub fn dashboard(area: Rect) -> DashboardAreas {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),      // Header
                Constraint::Percentage(28), // Firewall
                Constraint::Percentage(44), // Auth
                Constraint::Min(6),         // Bans
                Constraint::Length(1),      // Status bar
            ])
            .split(area);

        DashboardAreas {
            header: chunks[0],
            firewall: chunks[1],
            auth: chunks[2],
            ban: chunks[3],
            status: chunks[4],
        }
    }
}
