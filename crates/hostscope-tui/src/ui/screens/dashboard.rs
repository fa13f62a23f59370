use std::time::Duration;

use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use hostscope_types::{Category, DisplayLimits, LogKind, ReconciledSnapshot, SourceStatus};

use crate::ui::{components::RankedList, components::StatusBar, Layout, Theme};

/// Column widths for table keys
const IP_WIDTH: usize = 39;
const USER_WIDTH: usize = 15;
const PORT_WIDTH: usize = 6;

/// Everything the dashboard needs besides the snapshot
#[derive(Clone, Debug)]
pub struct DashboardView {
    pub limits: DisplayLimits,
    pub quit_token: String,
    pub interval: Duration,
    pub updated_at: DateTime<Local>,
}

/// Single screen summarizing the three logs and live ban state
pub struct DashboardScreen;

impl DashboardScreen {
    pub fn render(frame: &mut Frame, snapshot: &ReconciledSnapshot, view: &DashboardView) {
        let areas = Layout::dashboard(frame.area());

        frame.render_widget(Paragraph::new(Self::header_line(view)), areas.header);

        for (kind, area) in [
            (LogKind::Firewall, areas.firewall),
            (LogKind::Auth, areas.auth),
            (LogKind::Ban, areas.ban),
        ] {
            Self::render_panel(frame, area, kind, snapshot, view);
        }

        let missing = LogKind::ALL
            .iter()
            .filter(|kind| snapshot.aggregated.sources.get(**kind).is_missing())
            .count();
        let status = StatusBar::new(&view.quit_token, view.interval).missing_sources(missing);
        frame.render_widget(status, areas.status);
    }

    fn render_panel(
        frame: &mut Frame,
        area: Rect,
        kind: LogKind,
        snapshot: &ReconciledSnapshot,
        view: &DashboardView,
    ) {
        let color = kind.color();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border(color))
            .title(Span::styled(format!(" {} ", kind.title()), Theme::panel_title(color)));

        let lines = Self::panel_lines(kind, snapshot, &view.limits);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    pub fn header_line(view: &DashboardView) -> Line<'static> {
        Line::from(vec![
            Span::styled("hostscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("Log Analysis Summary - Last Updated: ", Theme::text()),
            Span::styled(
                view.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                Theme::title(),
            ),
        ])
    }

    /// Body lines of one panel, including the "no data" state
    pub fn panel_lines(
        kind: LogKind,
        snapshot: &ReconciledSnapshot,
        limits: &DisplayLimits,
    ) -> Vec<Line<'static>> {
        let missing = match snapshot.aggregated.sources.get(kind) {
            SourceStatus::Missing { path, reason } => Some(no_data_line(path, reason)),
            SourceStatus::Loaded { .. } => None,
        };

        match kind {
            LogKind::Firewall => missing.map_or_else(|| firewall_lines(snapshot, limits), |l| vec![l]),
            LogKind::Auth => missing.map_or_else(|| auth_lines(snapshot, limits), |l| vec![l]),
            // Live state is still worth showing without the history file
            LogKind::Ban => match missing {
                Some(line) => {
                    let mut lines = vec![line];
                    lines.extend(live_ban_lines(snapshot));
                    lines
                }
                None => {
                    let mut lines = ban_history_lines(snapshot);
                    lines.extend(live_ban_lines(snapshot));
                    lines.extend(top_banned_lines(snapshot, limits));
                    lines
                }
            },
        }
    }

    /// The whole dashboard as plain text, for non-terminal output
    pub fn plain_text(snapshot: &ReconciledSnapshot, view: &DashboardView) -> String {
        let mut out = line_text(&Self::header_line(view));
        out.push('\n');

        for kind in LogKind::ALL {
            out.push_str(&format!("\n== {} ==\n", kind.title()));
            for line in Self::panel_lines(kind, snapshot, &view.limits) {
                out.push_str(&line_text(&line));
                out.push('\n');
            }
        }

        out
    }
}

fn line_text(line: &Line) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

fn no_data_line(path: &str, reason: &str) -> Line<'static> {
    Line::from(Span::styled(format!("No data: {}: {}", path, reason), Theme::no_data()))
}

fn stat_line(label: &str, value: impl ToString, style: ratatui::style::Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Theme::text()),
        Span::styled(value.to_string(), style),
    ])
}

fn firewall_lines(snapshot: &ReconciledSnapshot, limits: &DisplayLimits) -> Vec<Line<'static>> {
    let agg = &snapshot.aggregated;
    let ips = agg.blocked_ips.top_n(limits.limit(Category::BlockedIps));
    let ports = agg.targeted_ports.top_n(limits.limit(Category::TargetedPorts));

    let mut lines = vec![stat_line(
        "Total Blocked Connections",
        agg.blocked_connections(),
        Theme::good(),
    )];
    lines.extend(
        RankedList::new(format!("Top {} Blocked IPs:", ips.len()), &ips)
            .key_width(IP_WIDTH)
            .key_style(Theme::good())
            .unit("blocks")
            .lines(),
    );
    lines.extend(
        RankedList::new("Most Targeted Ports:", &ports)
            .key_width(PORT_WIDTH)
            .key_style(Theme::good())
            .unit("attempts")
            .lines(),
    );
    lines
}

fn auth_lines(snapshot: &ReconciledSnapshot, limits: &DisplayLimits) -> Vec<Line<'static>> {
    let agg = &snapshot.aggregated;
    let mut lines = vec![
        stat_line("Failed Login Attempts", agg.failed_logins, Theme::bad()),
        stat_line("Successful Logins", agg.successful_logins, Theme::good()),
    ];

    let tables = [
        (Category::FailedUsernames, "Usernames for Failed Logins", USER_WIDTH, "attempts"),
        (Category::FailedIps, "IPs for Failed Logins", IP_WIDTH, "attempts"),
        (Category::SuccessfulUsernames, "Usernames for Successful Logins", USER_WIDTH, "logins"),
        (Category::SuccessfulIps, "IPs for Successful Logins", IP_WIDTH, "logins"),
    ];

    for (category, title, width, unit) in tables {
        let entries = agg.table(category).top_n(limits.limit(category));
        let style = match category {
            Category::FailedUsernames | Category::FailedIps => Theme::bad(),
            _ => Theme::good(),
        };
        lines.extend(
            RankedList::new(format!("Top {} {}:", entries.len(), title), &entries)
                .key_width(width)
                .key_style(style)
                .unit(unit)
                .lines(),
        );
    }

    lines
}

fn ban_history_lines(snapshot: &ReconciledSnapshot) -> Vec<Line<'static>> {
    let agg = &snapshot.aggregated;
    vec![
        stat_line("Total Bans", agg.total_bans, Theme::bad()),
        stat_line("Distinct Banned IPs", agg.banned_ips.len(), Theme::bad()),
    ]
}

fn live_ban_lines(snapshot: &ReconciledSnapshot) -> Vec<Line<'static>> {
    let live = &snapshot.live;
    if !live.reachable {
        return vec![Line::from(Span::styled(
            "Live ban state unavailable",
            Theme::text_dim(),
        ))];
    }

    let jails = if live.jails.is_empty() {
        "(none)".to_string()
    } else {
        live.jails.join(", ")
    };

    vec![
        stat_line("Currently Banned IPs", live.currently_banned_total, Theme::bad()),
        stat_line("Active Jails", jails, Theme::text()),
        stat_line(
            "Banned Now and in History",
            snapshot.currently_banned_and_historical.len(),
            Theme::active_ban(),
        ),
    ]
}

fn top_banned_lines(snapshot: &ReconciledSnapshot, limits: &DisplayLimits) -> Vec<Line<'static>> {
    let entries = snapshot
        .aggregated
        .banned_ips
        .top_n(limits.limit(Category::BannedIps));
    let is_active = |ip: &str| snapshot.is_active_ban(ip);

    RankedList::new(format!("Top {} Banned IPs:", entries.len()), &entries)
        .key_width(IP_WIDTH)
        .key_style(Theme::bad())
        .unit("bans")
        .highlight(&is_active)
        .lines()
}
