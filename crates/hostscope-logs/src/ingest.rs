use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use hostscope_types::{AggregatedSnapshot, LogKind, SourceStatus};

use crate::{Aggregator, LineClassifier};

/// Errors raised while reading a log source
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{kind} log file {}: {}", .path.display(), unavailable_reason(.source))]
    SourceUnavailable {
        kind: LogKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// Short description of why the source could not be read
    pub fn reason(&self) -> String {
        match self {
            Self::SourceUnavailable { source, .. } => unavailable_reason(source),
        }
    }
}

fn unavailable_reason(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "not found".to_string(),
        io::ErrorKind::PermissionDenied => "permission denied".to_string(),
        _ => err.to_string(),
    }
}

/// Paths of the three log files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSources {
    pub firewall: PathBuf,
    pub auth: PathBuf,
    pub ban: PathBuf,
}

impl LogSources {
    pub fn path(&self, kind: LogKind) -> &Path {
        match kind {
            LogKind::Firewall => &self.firewall,
            LogKind::Auth => &self.auth,
            LogKind::Ban => &self.ban,
        }
    }
}

/// Feed every line of `path` through the classifier into `aggregator`
///
/// Returns the number of lines read. Lines that are not valid UTF-8 are
/// decoded lossily and simply fail to match. A final line without a newline
/// may still be being written, so it is counted but not classified. A read
/// error part way through keeps what was counted so far.
pub fn ingest_file(
    path: &Path,
    kind: LogKind,
    aggregator: &mut Aggregator,
) -> Result<u64, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::SourceUnavailable {
        kind,
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = BufReader::new(file);
    let mut buf = Vec::with_capacity(512);
    let mut lines = 0u64;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                lines += 1;
                if buf.last() != Some(&b'\n') {
                    debug!(%kind, path = %path.display(), "Skipping unterminated final line");
                    break;
                }
                let line = String::from_utf8_lossy(&buf);
                if let Some(event) = LineClassifier::classify(kind, &line) {
                    aggregator.ingest(&event);
                }
            }
            Err(e) => {
                warn!(%kind, path = %path.display(), error = %e, "Stopped reading log early");
                break;
            }
        }
    }

    Ok(lines)
}

/// Read all three sources from the start into a fresh snapshot
///
/// A missing source is logged and reported in the snapshot's source status;
/// the other sources are still aggregated.
pub fn collect(sources: &LogSources) -> AggregatedSnapshot {
    let mut aggregator = Aggregator::new();

    for kind in LogKind::ALL {
        let path = sources.path(kind);
        let status = match ingest_file(path, kind, &mut aggregator) {
            Ok(lines) => {
                debug!(%kind, lines, "Ingested log");
                SourceStatus::Loaded { lines }
            }
            Err(e) => {
                warn!("{}", e);
                SourceStatus::Missing {
                    path: path.display().to_string(),
                    reason: e.reason(),
                }
            }
        };
        aggregator.set_source_status(kind, status);
    }

    aggregator.into_snapshot()
}
