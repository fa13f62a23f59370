use hostscope_types::{AggregatedSnapshot, LiveBanState, ReconciledSnapshot};

/// Merge the log-derived ban history with the live ban state
///
/// An empty live state is not an error: nothing is flagged as currently
/// banned and the historical tables pass through untouched.
pub fn reconcile(aggregated: AggregatedSnapshot, live: LiveBanState) -> ReconciledSnapshot {
    let currently_banned_and_historical = aggregated
        .banned_ips
        .keys()
        .filter(|ip| live.currently_banned.contains(*ip))
        .map(str::to_string)
        .collect();

    ReconciledSnapshot {
        aggregated,
        live,
        currently_banned_and_historical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn history() -> AggregatedSnapshot {
        let mut snapshot = AggregatedSnapshot::default();
        snapshot.banned_ips.add("9.9.9.9", 3);
        snapshot.banned_ips.add("7.7.7.7", 1);
        snapshot.total_bans = 4;
        snapshot
    }

    #[test]
    fn test_intersection() {
        let live = LiveBanState {
            reachable: true,
            jails: vec!["sshd".to_string()],
            currently_banned: BTreeSet::from(["9.9.9.9".to_string(), "8.8.8.8".to_string()]),
            currently_banned_total: 2,
        };

        let reconciled = reconcile(history(), live);
        assert_eq!(
            reconciled.currently_banned_and_historical,
            BTreeSet::from(["9.9.9.9".to_string()])
        );
        assert!(reconciled.is_active_ban("9.9.9.9"));
        assert!(!reconciled.is_active_ban("8.8.8.8"));
    }

    #[test]
    fn test_empty_live_state_keeps_history() {
        let reconciled = reconcile(history(), LiveBanState::empty());

        assert!(reconciled.currently_banned_and_historical.is_empty());
        assert_eq!(reconciled.aggregated, history());
        assert_eq!(reconciled.live.currently_banned_total, 0);
    }
}
