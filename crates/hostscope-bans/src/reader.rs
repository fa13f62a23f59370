use std::collections::BTreeSet;

use tracing::{debug, warn};

use hostscope_types::LiveBanState;

use crate::service::{BanService, BanServiceError};
use crate::status::parse_jail_status;

/// Builds a fresh [`LiveBanState`] from the ban service on every call
///
/// Never fails: an unreachable service yields an empty state, and a jail
/// whose status cannot be read is skipped while the others are kept.
pub struct LiveBanReader<S> {
    service: S,
}

impl<S: BanService> LiveBanReader<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub async fn read(&self) -> LiveBanState {
        let jails = match self.service.query_jails().await {
            Ok(jails) => jails,
            Err(BanServiceError::Disabled) => {
                debug!("Live ban queries disabled");
                return LiveBanState::empty();
            }
            Err(e) => {
                warn!(error = %e, "Ban service unavailable, reporting no live bans");
                return LiveBanState::empty();
            }
        };

        let mut currently_banned = BTreeSet::new();
        let mut currently_banned_total = 0u64;

        for jail in &jails {
            let text = match self.service.query_jail_status(jail).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(jail = %jail, error = %e, "Skipping jail status");
                    continue;
                }
            };

            let status = parse_jail_status(&text);
            if status.currently_banned.is_none() && status.banned_ips.is_empty() {
                debug!(jail = %jail, "Jail status had no ban fields");
            }
            currently_banned_total += status.currently_banned.unwrap_or(0);
            currently_banned.extend(status.banned_ips);
        }

        LiveBanState {
            reachable: true,
            jails,
            currently_banned,
            currently_banned_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DisabledBanService;
    use std::collections::HashMap;

    /// Scripted service: `None` jails means the service is down
    struct FakeService {
        jails: Option<Vec<String>>,
        statuses: HashMap<String, String>,
    }

    impl FakeService {
        fn new(jails: &[&str]) -> Self {
            Self {
                jails: Some(jails.iter().map(|j| j.to_string()).collect()),
                statuses: HashMap::new(),
            }
        }

        fn down() -> Self {
            Self {
                jails: None,
                statuses: HashMap::new(),
            }
        }

        fn status(mut self, jail: &str, text: &str) -> Self {
            self.statuses.insert(jail.to_string(), text.to_string());
            self
        }
    }

    impl BanService for FakeService {
        async fn query_jails(&self) -> Result<Vec<String>, BanServiceError> {
            self.jails
                .clone()
                .ok_or_else(|| BanServiceError::Unparseable("socket unavailable".to_string()))
        }

        async fn query_jail_status(&self, jail: &str) -> Result<String, BanServiceError> {
            self.statuses
                .get(jail)
                .cloned()
                .ok_or_else(|| BanServiceError::Unparseable(format!("no jail {jail}")))
        }
    }

    const SSHD: &str = "   |- Currently banned:\t2\n   `- Banned IP list:\t9.9.9.9 8.8.8.8\n";

    #[tokio::test]
    async fn test_single_jail() {
        let reader = LiveBanReader::new(FakeService::new(&["sshd"]).status("sshd", SSHD));
        let state = reader.read().await;

        assert!(state.reachable);
        assert_eq!(state.jails, vec!["sshd"]);
        assert_eq!(state.currently_banned_total, 2);
        assert_eq!(
            state.currently_banned,
            BTreeSet::from(["9.9.9.9".to_string(), "8.8.8.8".to_string()])
        );
    }

    #[tokio::test]
    async fn test_failing_jail_keeps_partial_results() {
        let service = FakeService::new(&["broken", "sshd", "garbled"])
            .status("sshd", SSHD)
            .status("garbled", "????");
        let state = LiveBanReader::new(service).read().await;

        assert_eq!(state.jails.len(), 3);
        assert_eq!(state.currently_banned_total, 2);
        assert_eq!(state.currently_banned.len(), 2);
    }

    #[tokio::test]
    async fn test_jails_are_unioned() {
        let service = FakeService::new(&["sshd", "recidive"])
            .status("sshd", SSHD)
            .status(
                "recidive",
                "|- Currently banned:\t1\n`- Banned IP list:\t8.8.8.8\n",
            );
        let state = LiveBanReader::new(service).read().await;

        assert_eq!(state.currently_banned_total, 3);
        assert_eq!(state.currently_banned.len(), 2);
    }

    #[tokio::test]
    async fn test_service_down_is_empty() {
        let state = LiveBanReader::new(FakeService::down()).read().await;
        assert_eq!(state, LiveBanState::empty());
    }

    #[tokio::test]
    async fn test_disabled_service_is_empty() {
        let state = LiveBanReader::new(DisabledBanService).read().await;
        assert!(state.is_empty());
        assert!(!state.reachable);
    }

    #[tokio::test]
    async fn test_answering_service_without_jails_is_reachable() {
        let state = LiveBanReader::new(FakeService::new(&[])).read().await;
        assert!(state.reachable);
        assert!(state.jails.is_empty());
        assert_eq!(state.currently_banned_total, 0);
    }
}
