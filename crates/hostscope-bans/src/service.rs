use std::future::Future;
use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::status;

/// Default upper bound for a single fail2ban-client invocation
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum BanServiceError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} did not answer within {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("unexpected output: {0}")]
    Unparseable(String),

    #[error("live ban queries are disabled")]
    Disabled,
}

/// Query capability of the ban-management service
pub trait BanService: Send + Sync {
    /// Names of the active jails
    fn query_jails(&self) -> impl Future<Output = Result<Vec<String>, BanServiceError>> + Send;

    /// Raw status text of one jail
    fn query_jail_status(
        &self,
        jail: &str,
    ) -> impl Future<Output = Result<String, BanServiceError>> + Send;
}

/// Talks to fail2ban through its command line client
#[derive(Clone, Debug)]
pub struct Fail2banClient {
    program: String,
    timeout: Duration,
}

impl Fail2banClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, args: &[&str]) -> Result<String, BanServiceError> {
        debug!(program = %self.program, ?args, "Querying ban service");

        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| BanServiceError::Timeout {
                program: self.program.clone(),
                timeout: self.timeout,
            })?
            .map_err(|source| BanServiceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BanServiceError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Fail2banClient {
    fn default() -> Self {
        Self::new("fail2ban-client")
    }
}

impl BanService for Fail2banClient {
    async fn query_jails(&self) -> Result<Vec<String>, BanServiceError> {
        let text = self.run(&["status"]).await?;
        status::parse_jail_list(&text)
            .ok_or_else(|| BanServiceError::Unparseable("no \"Jail list\" line".to_string()))
    }

    async fn query_jail_status(&self, jail: &str) -> Result<String, BanServiceError> {
        self.run(&["status", jail]).await
    }
}

/// Stand-in used when live ban queries are turned off; every query fails
/// with [`BanServiceError::Disabled`]
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledBanService;

impl BanService for DisabledBanService {
    async fn query_jails(&self) -> Result<Vec<String>, BanServiceError> {
        Err(BanServiceError::Disabled)
    }

    async fn query_jail_status(&self, _jail: &str) -> Result<String, BanServiceError> {
        Err(BanServiceError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let client = Fail2banClient::new("/nonexistent/fail2ban-client");
        let err = client.query_jails().await.unwrap_err();
        assert!(matches!(err, BanServiceError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_disabled_service_refuses_queries() {
        let err = DisabledBanService.query_jails().await.unwrap_err();
        assert!(matches!(err, BanServiceError::Disabled));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_client_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let program = tmp.path().join("slow-fail2ban-client");
        std::fs::write(&program, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let client = Fail2banClient::new(program.display().to_string())
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = client.query_jails().await.unwrap_err();

        assert!(matches!(err, BanServiceError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
