use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Bottom row: how to quit on the left, refresh cadence on the right
pub struct StatusBar<'a> {
    quit_token: &'a str,
    interval: Duration,
    missing_sources: usize,
}

impl<'a> StatusBar<'a> {
    pub fn new(quit_token: &'a str, interval: Duration) -> Self {
        Self {
            quit_token,
            interval,
            missing_sources: 0,
        }
    }

    /// Number of log files that could not be read this cycle
    pub fn missing_sources(mut self, count: usize) -> Self {
        self.missing_sources = count;
        self
    }

    fn quit_hint(&self) -> Line<'static> {
        let key = if self.quit_token.chars().count() == 1 {
            self.quit_token.to_string()
        } else {
            format!("{} ⏎", self.quit_token)
        };

        Line::from(vec![
            Span::styled(format!("[{}]", key), Theme::status_bar_key()),
            Span::styled(" Quit  ", Theme::status_bar()),
            Span::styled("[Esc]", Theme::status_bar_key()),
            Span::styled(" Quit", Theme::status_bar()),
        ])
    }

    fn right_text(&self) -> String {
        let mut text = format!("refresh every {}", format_interval(self.interval));
        match self.missing_sources {
            0 => {}
            1 => text.push_str(" · 1 log missing"),
            n => text.push_str(&format!(" · {} logs missing", n)),
        }
        text
    }
}

/// "5s" for whole seconds, "0.5s" otherwise
pub fn format_interval(interval: Duration) -> String {
    if interval.subsec_nanos() == 0 {
        format!("{}s", interval.as_secs())
    } else {
        let secs = format!("{:.3}", interval.as_secs_f64());
        format!("{}s", secs.trim_end_matches('0'))
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let left = self.quit_hint();
        let left_width = left.width() as u16;
        buf.set_line(area.x + 1, area.y, &left, area.width.saturating_sub(2));

        let right = self.right_text();
        let right_width = Span::raw(right.as_str()).width() as u16;
        let right_x = area.x + area.width.saturating_sub(right_width + 2);
        // Drop the right side rather than overlap the hint on narrow terminals
        if right_x > area.x + left_width + 2 {
            let span = Span::styled(right, Theme::status_bar());
            buf.set_span(right_x, area.y, &span, right_width);
        }
    }
}
