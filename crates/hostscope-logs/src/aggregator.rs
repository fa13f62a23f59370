use hostscope_types::{
    AggregatedSnapshot, AuthEvent, BanEvent, BlockEvent, Category, LogEvent, LogKind,
    SourceStatus,
};

/// Running counters for one pass over the log files
///
/// A fresh aggregator is built for every refresh cycle; ingesting the same
/// line twice counts it twice.
#[derive(Clone, Debug, Default)]
pub struct Aggregator {
    snapshot: AggregatedSnapshot,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the tables touched by a classified event
    pub fn ingest(&mut self, event: &LogEvent) {
        match event {
            LogEvent::Block(block) => self.ingest_block(block),
            LogEvent::Auth(auth) => self.ingest_auth(auth),
            LogEvent::Ban(ban) => self.ingest_ban(ban),
        }
    }

    fn ingest_block(&mut self, event: &BlockEvent) {
        if let Some(ip) = &event.source_ip {
            self.snapshot.blocked_ips.increment(ip);
        }
        if let Some(port) = &event.dest_port {
            self.snapshot.targeted_ports.increment(port);
        }
    }

    fn ingest_auth(&mut self, event: &AuthEvent) {
        let s = &mut self.snapshot;
        let (users, ips) = if event.outcome.is_failure() {
            s.failed_logins += 1;
            (&mut s.failed_usernames, &mut s.failed_ips)
        } else {
            s.successful_logins += 1;
            (&mut s.successful_usernames, &mut s.successful_ips)
        };

        if let Some(user) = &event.username {
            users.increment(user);
        }
        if let Some(ip) = &event.source_ip {
            ips.increment(ip);
        }
    }

    fn ingest_ban(&mut self, event: &BanEvent) {
        self.snapshot.total_bans += 1;
        if let Some(ip) = &event.ip {
            self.snapshot.banned_ips.increment(ip);
        }
    }

    /// Record how reading a source went
    pub fn set_source_status(&mut self, kind: LogKind, status: SourceStatus) {
        self.snapshot.sources.set(kind, status);
    }

    /// Up to `n` entries of a table; never fails for any `n`
    pub fn top_n(&self, category: Category, n: usize) -> Vec<(&str, u64)> {
        self.snapshot.table(category).top_n(n)
    }

    /// Sum of all counts in a table
    pub fn total(&self, category: Category) -> u64 {
        self.snapshot.table(category).total()
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> AggregatedSnapshot {
        self.snapshot.clone()
    }

    pub fn into_snapshot(self) -> AggregatedSnapshot {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineClassifier;

    fn feed(agg: &mut Aggregator, kind: LogKind, lines: &[&str]) {
        for line in lines {
            if let Some(event) = LineClassifier::classify(kind, line) {
                agg.ingest(&event);
            }
        }
    }

    #[test]
    fn test_repeated_block_lines() {
        let line = "kernel: [UFW BLOCK] IN=eth0 SRC=10.0.0.5 DST=10.0.0.1 PROTO=TCP DPT=22";
        let mut agg = Aggregator::new();
        feed(&mut agg, LogKind::Firewall, &[line, line, line]);

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.blocked_ips.get("10.0.0.5"), 3);
        assert_eq!(snapshot.targeted_ports.get("22"), 3);
        assert_eq!(agg.total(Category::BlockedIps), 3);
    }

    #[test]
    fn test_auth_counts() {
        let mut agg = Aggregator::new();
        feed(
            &mut agg,
            LogKind::Auth,
            &[
                "Failed password for invalid user bob from 1.2.3.4",
                "Accepted password for alice from 5.6.7.8",
            ],
        );

        let snapshot = agg.into_snapshot();
        assert_eq!(snapshot.failed_logins, 1);
        assert_eq!(snapshot.successful_logins, 1);
        assert_eq!(snapshot.failed_usernames.get("bob"), 1);
        assert_eq!(snapshot.failed_ips.get("1.2.3.4"), 1);
        assert_eq!(snapshot.successful_usernames.get("alice"), 1);
        assert_eq!(snapshot.successful_ips.get("5.6.7.8"), 1);
    }

    #[test]
    fn test_unparseable_fields_still_count() {
        let mut agg = Aggregator::new();
        feed(&mut agg, LogKind::Auth, &["pam: Failed password"]);
        feed(&mut agg, LogKind::Ban, &["NOTICE [sshd] Ban"]);

        let snapshot = agg.snapshot();
        assert_eq!(snapshot.failed_logins, 1);
        assert!(snapshot.failed_usernames.is_empty());
        assert_eq!(snapshot.total_bans, 1);
        assert!(snapshot.banned_ips.is_empty());
    }

    #[test]
    fn test_non_matching_lines_leave_counters_unchanged() {
        let mut agg = Aggregator::new();
        feed(&mut agg, LogKind::Firewall, &["kernel: [UFW ALLOW] SRC=1.1.1.1 DPT=80", ""]);
        feed(&mut agg, LogKind::Auth, &["sshd[1]: Connection closed by 1.1.1.1", "garbage"]);
        feed(&mut agg, LogKind::Ban, &["NOTICE [sshd] Unban 1.1.1.1"]);

        assert_eq!(agg.snapshot(), AggregatedSnapshot::default());
    }

    #[test]
    fn test_top_n_edges() {
        let mut agg = Aggregator::new();
        feed(
            &mut agg,
            LogKind::Ban,
            &["Ban 1.1.1.1", "Ban 2.2.2.2", "Ban 2.2.2.2"],
        );

        assert!(agg.top_n(Category::BannedIps, 0).is_empty());
        assert_eq!(
            agg.top_n(Category::BannedIps, 50),
            vec![("2.2.2.2", 2), ("1.1.1.1", 1)]
        );
        assert!(agg.top_n(Category::TargetedPorts, 3).is_empty());
    }
}
