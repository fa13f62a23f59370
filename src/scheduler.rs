//! Periodic refresh loop with an interruptible wait

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hostscope_bans::{reconcile, BanService, LiveBanReader};
use hostscope_logs::{collect, LogSources};

use crate::present::Presenter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub final_state: SchedulerState,
}

/// Collects, reconciles and presents a fresh snapshot every interval
///
/// Cancellation is checked before each cycle and raced against every wait,
/// so a quit request ends the run without waiting out the interval. A cycle
/// already in progress is allowed to finish.
pub struct RefreshScheduler<S, P> {
    sources: LogSources,
    reader: LiveBanReader<S>,
    presenter: P,
    interval: Duration,
    cancel: CancellationToken,
    once: bool,
    state: SchedulerState,
}

impl<S: BanService, P: Presenter> RefreshScheduler<S, P> {
    pub fn new(
        sources: LogSources,
        reader: LiveBanReader<S>,
        presenter: P,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sources,
            reader,
            presenter,
            interval,
            cancel,
            once: false,
            state: SchedulerState::Idle,
        }
    }

    /// Stop after the first cycle
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// One full refresh: parse the logs, read live bans, present
    pub async fn run_cycle(&mut self) -> Result<()> {
        let started = Instant::now();

        let sources = self.sources.clone();
        let aggregated = tokio::task::spawn_blocking(move || collect(&sources))
            .await
            .context("Log collection task failed")?;

        let live = self.reader.read().await;
        let snapshot = reconcile(aggregated, live);

        self.presenter.present(&snapshot)?;
        debug!(elapsed = ?started.elapsed(), "Refresh cycle complete");
        Ok(())
    }

    /// Run cycles until cancelled, or once when so configured
    pub async fn run(&mut self) -> Result<RunSummary> {
        self.state = SchedulerState::Running;
        info!(interval = ?self.interval, once = self.once, "Refresh loop started");

        let mut cycles = 0u64;
        let result = loop {
            if self.cancel.is_cancelled() {
                break Ok(());
            }
            if let Err(e) = self.run_cycle().await {
                break Err(e);
            }
            cycles += 1;

            if self.once || self.cancel.is_cancelled() {
                break Ok(());
            }

            let cancelled = tokio::select! {
                _ = self.cancel.cancelled() => true,
                _ = tokio::time::sleep(self.interval) => false,
            };
            if cancelled {
                break Ok(());
            }
        };

        self.state = SchedulerState::Stopping;
        let finished = self.presenter.finish();
        self.state = SchedulerState::Stopped;
        info!(cycles, "Refresh loop stopped");

        result?;
        finished?;

        Ok(RunSummary {
            cycles,
            final_state: self.state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostscope_bans::BanServiceError;
    use hostscope_types::{LogKind, ReconciledSnapshot, SourceStatus};
    use std::io::Write;
    use std::path::Path;

    #[derive(Default)]
    struct RecordingPresenter {
        snapshots: Vec<ReconciledSnapshot>,
        finished: bool,
    }

    impl Presenter for RecordingPresenter {
        fn present(&mut self, snapshot: &ReconciledSnapshot) -> Result<()> {
            self.snapshots.push(snapshot.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            self.finished = true;
            Ok(())
        }
    }

    struct FakeService;

    impl BanService for FakeService {
        async fn query_jails(&self) -> Result<Vec<String>, BanServiceError> {
            Ok(vec!["sshd".to_string()])
        }

        async fn query_jail_status(&self, _jail: &str) -> Result<String, BanServiceError> {
            Ok("|- Currently banned: 1\n`- Banned IP list: 9.9.9.9\n".to_string())
        }
    }

    fn write_log(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn sources(dir: &Path) -> LogSources {
        LogSources {
            firewall: write_log(
                dir,
                "ufw.log",
                &["Jan 1 kernel: [UFW BLOCK] IN=eth0 SRC=10.0.0.5 DST=10.0.0.1 DPT=22"],
            ),
            auth: write_log(
                dir,
                "auth.log",
                &["sshd[1]: Failed password for bob from 1.2.3.4 port 22 ssh2"],
            ),
            ban: write_log(
                dir,
                "fail2ban.log",
                &["fail2ban.actions [1]: NOTICE [sshd] Ban 9.9.9.9"],
            ),
        }
    }

    fn scheduler(
        sources: LogSources,
        interval: Duration,
        cancel: CancellationToken,
    ) -> RefreshScheduler<FakeService, RecordingPresenter> {
        RefreshScheduler::new(
            sources,
            LiveBanReader::new(FakeService),
            RecordingPresenter::default(),
            interval,
            cancel,
        )
    }

    #[tokio::test]
    async fn test_cancel_interrupts_wait() {
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let mut scheduler = scheduler(sources(tmp.path()), Duration::from_secs(5), cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });

        let started = Instant::now();
        let summary = scheduler.run().await.unwrap();
        canceller.await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.final_state, SchedulerState::Stopped);
        assert!(scheduler.presenter().finished);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut scheduler = scheduler(sources(tmp.path()), Duration::from_secs(5), cancel);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        let summary = scheduler.run().await.unwrap();
        assert_eq!(summary.cycles, 0);
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(scheduler.presenter().snapshots.is_empty());
    }

    #[tokio::test]
    async fn test_once_presents_reconciled_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let mut scheduler =
            scheduler(sources(tmp.path()), Duration::from_secs(60), CancellationToken::new())
                .once(true);

        let summary = scheduler.run().await.unwrap();
        assert_eq!(summary.cycles, 1);

        let snapshot = &scheduler.presenter().snapshots[0];
        assert_eq!(snapshot.aggregated.blocked_ips.get("10.0.0.5"), 1);
        assert_eq!(snapshot.aggregated.failed_logins, 1);
        assert_eq!(snapshot.aggregated.total_bans, 1);
        assert!(snapshot.is_active_ban("9.9.9.9"));
    }

    #[tokio::test]
    async fn test_repeats_until_cancelled() {
        let tmp = tempfile::tempdir().unwrap();
        let cancel = CancellationToken::new();
        let mut scheduler =
            scheduler(sources(tmp.path()), Duration::from_millis(20), cancel.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            cancel.cancel();
        });

        let summary = scheduler.run().await.unwrap();
        canceller.await.unwrap();
        assert!(summary.cycles >= 2);
        assert_eq!(scheduler.presenter().snapshots.len() as u64, summary.cycles);
    }

    #[tokio::test]
    async fn test_missing_source_still_presents() {
        let tmp = tempfile::tempdir().unwrap();
        let mut paths = sources(tmp.path());
        paths.auth = tmp.path().join("absent.log");

        let mut scheduler =
            scheduler(paths, Duration::from_secs(60), CancellationToken::new()).once(true);
        scheduler.run().await.unwrap();

        let snapshot = &scheduler.presenter().snapshots[0];
        assert!(snapshot.aggregated.sources.get(LogKind::Auth).is_missing());
        assert_eq!(
            snapshot.aggregated.sources.get(LogKind::Firewall),
            &SourceStatus::Loaded { lines: 1 }
        );
        assert_eq!(snapshot.aggregated.failed_logins, 0);
    }
}
