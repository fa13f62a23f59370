//! Shared types for hostscope
//!
//! This crate contains the event and snapshot structures passed between the
//! classifier, the aggregator, the live ban reader and the presentation layer.

use ratatui::style::Color;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// Log Sources
// ============================================================================

/// The three fixed log formats hostscope understands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    /// UFW firewall block lines (kern.log / ufw.log)
    Firewall,
    /// sshd authentication lines (auth.log)
    Auth,
    /// fail2ban action lines (fail2ban.log)
    Ban,
}

impl LogKind {
    pub const ALL: [LogKind; 3] = [LogKind::Firewall, LogKind::Auth, LogKind::Ban];

    /// Panel title for this source
    pub fn title(&self) -> &'static str {
        match self {
            Self::Firewall => "UFW Log",
            Self::Auth => "Auth Log",
            Self::Ban => "Fail2ban Log",
        }
    }

    /// Short lowercase name, used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Firewall => "firewall",
            Self::Auth => "auth",
            Self::Ban => "ban",
        }
    }

    /// Border color for this source's panel
    pub fn color(&self) -> Color {
        match self {
            Self::Firewall => Color::Blue,
            Self::Auth => Color::Yellow,
            Self::Ban => Color::Red,
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a source could be read during the last cycle
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// File was read; `lines` counts every line seen, matched or not
    Loaded { lines: u64 },
    /// File could not be opened; `reason` is short, e.g. "not found"
    Missing { path: String, reason: String },
}

impl Default for SourceStatus {
    fn default() -> Self {
        Self::Loaded { lines: 0 }
    }
}

impl SourceStatus {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Per-source read status for one cycle
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub firewall: SourceStatus,
    pub auth: SourceStatus,
    pub ban: SourceStatus,
}

impl SourceReport {
    pub fn get(&self, kind: LogKind) -> &SourceStatus {
        match kind {
            LogKind::Firewall => &self.firewall,
            LogKind::Auth => &self.auth,
            LogKind::Ban => &self.ban,
        }
    }

    pub fn set(&mut self, kind: LogKind, status: SourceStatus) {
        match kind {
            LogKind::Firewall => self.firewall = status,
            LogKind::Auth => self.auth = status,
            LogKind::Ban => self.ban = status,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// A firewall block line; either field may be missing from the line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockEvent {
    pub source_ip: Option<String>,
    pub dest_port: Option<String>,
}

/// Outcome of an authentication attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
    /// "Failed password" line
    Failed,
    /// "Invalid user" line without a failed password
    Invalid,
    /// "Accepted" line
    Accepted,
}

impl AuthOutcome {
    /// Failed and Invalid both count as failed logins
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Accepted)
    }
}

/// An authentication line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthEvent {
    pub outcome: AuthOutcome,
    pub username: Option<String>,
    pub source_ip: Option<String>,
}

/// A historical fail2ban ban line
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BanEvent {
    pub ip: Option<String>,
}

/// Any classified log line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogEvent {
    Block(BlockEvent),
    Auth(AuthEvent),
    Ban(BanEvent),
}

// ============================================================================
// Aggregates
// ============================================================================

/// Key -> count table that remembers first-seen order
///
/// `top_n` sorts by descending count with a stable sort, so equal counts keep
/// the order in which their keys were first inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `key`
    pub fn increment(&mut self, key: &str) {
        self.add(key, 1);
    }

    /// Add `n` occurrences of `key`
    pub fn add(&mut self, key: &str, n: u64) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += n,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), n));
            }
        }
    }

    /// Count for `key`, zero if never seen
    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map_or(0, |&i| self.entries[i].1)
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-seen order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Up to `n` entries by descending count, ties in first-seen order
    pub fn top_n(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> =
            self.entries.iter().map(|(k, c)| (k.as_str(), *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Named frequency tables of a snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    BlockedIps,
    TargetedPorts,
    FailedUsernames,
    FailedIps,
    SuccessfulUsernames,
    SuccessfulIps,
    BannedIps,
}

/// Result of one full pass over the three log files
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedSnapshot {
    pub blocked_ips: FrequencyTable,
    pub targeted_ports: FrequencyTable,

    pub failed_logins: u64,
    pub successful_logins: u64,
    pub failed_usernames: FrequencyTable,
    pub failed_ips: FrequencyTable,
    pub successful_usernames: FrequencyTable,
    pub successful_ips: FrequencyTable,

    /// Number of ban lines seen, including ones without a parsable IP
    pub total_bans: u64,
    pub banned_ips: FrequencyTable,

    pub sources: SourceReport,
}

impl AggregatedSnapshot {
    pub fn table(&self, category: Category) -> &FrequencyTable {
        match category {
            Category::BlockedIps => &self.blocked_ips,
            Category::TargetedPorts => &self.targeted_ports,
            Category::FailedUsernames => &self.failed_usernames,
            Category::FailedIps => &self.failed_ips,
            Category::SuccessfulUsernames => &self.successful_usernames,
            Category::SuccessfulIps => &self.successful_ips,
            Category::BannedIps => &self.banned_ips,
        }
    }

    /// Total blocked connections that carried a source IP
    pub fn blocked_connections(&self) -> u64 {
        self.blocked_ips.total()
    }
}

/// fail2ban's view of what is banned right now
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LiveBanState {
    /// False when the service could not be asked at all
    pub reachable: bool,
    pub jails: Vec<String>,
    pub currently_banned: BTreeSet<String>,
    pub currently_banned_total: u64,
}

impl LiveBanState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.jails.is_empty() && self.currently_banned.is_empty() && self.currently_banned_total == 0
    }
}

/// Historical and live ban views merged for one cycle
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReconciledSnapshot {
    pub aggregated: AggregatedSnapshot,
    pub live: LiveBanState,
    /// IPs both found in the ban log and banned right now
    pub currently_banned_and_historical: BTreeSet<String>,
}

impl ReconciledSnapshot {
    pub fn is_active_ban(&self, ip: &str) -> bool {
        self.currently_banned_and_historical.contains(ip)
    }
}

// ============================================================================
// Display
// ============================================================================

fn default_limit() -> usize {
    5
}

/// How many rows to show for each frequency table
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayLimits {
    pub blocked_ips: usize,
    pub targeted_ports: usize,
    pub failed_usernames: usize,
    pub failed_ips: usize,
    pub successful_usernames: usize,
    pub successful_ips: usize,
    pub banned_ips: usize,
}

impl Default for DisplayLimits {
    fn default() -> Self {
        Self {
            blocked_ips: default_limit(),
            targeted_ports: default_limit(),
            failed_usernames: default_limit(),
            failed_ips: default_limit(),
            successful_usernames: default_limit(),
            successful_ips: default_limit(),
            banned_ips: default_limit(),
        }
    }
}

impl DisplayLimits {
    pub fn limit(&self, category: Category) -> usize {
        match category {
            Category::BlockedIps => self.blocked_ips,
            Category::TargetedPorts => self.targeted_ports,
            Category::FailedUsernames => self.failed_usernames,
            Category::FailedIps => self.failed_ips,
            Category::SuccessfulUsernames => self.successful_usernames,
            Category::SuccessfulIps => self.successful_ips,
            Category::BannedIps => self.banned_ips,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_orders_by_count_then_first_seen() {
        let mut table = FrequencyTable::new();
        for key in ["a", "b", "c", "b", "c", "d"] {
            table.increment(key);
        }

        let top = table.top_n(10);
        assert_eq!(top, vec![("b", 2), ("c", 2), ("a", 1), ("d", 1)]);
    }

    #[test]
    fn test_top_n_bounds() {
        let mut table = FrequencyTable::new();
        table.add("22", 3);
        table.add("80", 1);

        assert!(table.top_n(0).is_empty());
        assert_eq!(table.top_n(1), vec![("22", 3)]);
        assert_eq!(table.top_n(usize::MAX).len(), 2);
        assert!(FrequencyTable::new().top_n(5).is_empty());
    }

    #[test]
    fn test_total_and_get() {
        let mut table = FrequencyTable::new();
        table.add("10.0.0.5", 3);
        table.increment("10.0.0.6");

        assert_eq!(table.total(), 4);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("10.0.0.5"), 3);
        assert_eq!(table.get("missing"), 0);
    }

    #[test]
    fn test_display_limits_default_to_five() {
        let limits = DisplayLimits::default();
        assert_eq!(limits.limit(Category::BannedIps), 5);
        assert_eq!(limits.limit(Category::TargetedPorts), 5);
    }

    #[test]
    fn test_source_report_set_get() {
        let mut report = SourceReport::default();
        report.set(
            LogKind::Auth,
            SourceStatus::Missing {
                path: "/var/log/auth.log".to_string(),
                reason: "not found".to_string(),
            },
        );
        assert!(report.get(LogKind::Auth).is_missing());
        assert!(!report.get(LogKind::Firewall).is_missing());
    }
}
