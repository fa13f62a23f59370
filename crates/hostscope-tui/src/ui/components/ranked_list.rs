use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::ui::Theme;

/// Lines for a top-N table: a heading, then one padded row per entry
///
/// `unit` is the noun shown after the count, e.g. "blocks". Rows whose key
/// is `highlighted` get the active-ban style and a trailing marker.
pub struct RankedList<'a> {
    heading: String,
    entries: &'a [(&'a str, u64)],
    key_width: usize,
    key_style: Style,
    unit: &'a str,
    highlighted: Option<&'a dyn Fn(&str) -> bool>,
}

impl<'a> RankedList<'a> {
    pub fn new(heading: impl Into<String>, entries: &'a [(&'a str, u64)]) -> Self {
        Self {
            heading: heading.into(),
            entries,
            key_width: 39,
            key_style: Theme::text(),
            unit: "hits",
            highlighted: None,
        }
    }

    pub fn key_width(mut self, width: usize) -> Self {
        self.key_width = width;
        self
    }

    pub fn key_style(mut self, style: Style) -> Self {
        self.key_style = style;
        self
    }

    pub fn unit(mut self, unit: &'a str) -> Self {
        self.unit = unit;
        self
    }

    pub fn highlight(mut self, predicate: &'a dyn Fn(&str) -> bool) -> Self {
        self.highlighted = Some(predicate);
        self
    }

    pub fn lines(self) -> Vec<Line<'static>> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push(Line::from(Span::styled(self.heading, Theme::text())));

        if self.entries.is_empty() {
            lines.push(Line::from(Span::styled("  (none)", Theme::text_dim())));
            return lines;
        }

        for &(key, count) in self.entries {
            let active = self.highlighted.is_some_and(|f| f(key));
            let key_style = if active { Theme::active_ban() } else { self.key_style };

            let mut spans = vec![
                Span::styled(format!("  {:<width$}", key, width = self.key_width), key_style),
                Span::styled(format!(" ({} {})", count, self.unit), Theme::text()),
            ];
            if active {
                spans.push(Span::styled(" [active]", Theme::active_ban()));
            }
            lines.push(Line::from(spans));
        }

        lines
    }
}
