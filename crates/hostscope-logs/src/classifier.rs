use std::sync::LazyLock;

use regex::Regex;

use hostscope_types::{AuthEvent, AuthOutcome, BanEvent, BlockEvent, LogEvent, LogKind};

/// Marker UFW writes on every dropped packet
const BLOCK_MARKER: &str = "UFW BLOCK";
const FAILED_PASSWORD: &str = "Failed password";
const INVALID_USER: &str = "Invalid user";
const ACCEPTED: &str = "Accepted";

static SRC_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"SRC=(\S+)"));
static DPT_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"DPT=(\d+)"));

static FAILED_USER_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"for (?:invalid user )?(\S+)"));
static INVALID_USER_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"Invalid user (\S+)"));
static ACCEPTED_USER_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"for (\S+)"));
static FROM_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"from (\S+)"));

// "Ban" as a whole word, so "Unban" and "Banned" lines are not counted
static BAN_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"\bBan\b(?:[ \t]+(\S+))?"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Classifies raw log lines into typed events
///
/// Non-matching lines are the common case and yield `None`.
pub struct LineClassifier;

impl LineClassifier {
    /// Classify a line of the given log kind
    pub fn classify(kind: LogKind, line: &str) -> Option<LogEvent> {
        match kind {
            LogKind::Firewall => Self::classify_block(line).map(LogEvent::Block),
            LogKind::Auth => Self::classify_auth(line).map(LogEvent::Auth),
            LogKind::Ban => Self::classify_ban(line).map(LogEvent::Ban),
        }
    }

    /// Parse a UFW block line
    pub fn classify_block(line: &str) -> Option<BlockEvent> {
        if !line.contains(BLOCK_MARKER) {
            return None;
        }

        Some(BlockEvent {
            source_ip: capture(&SRC_RE, line),
            dest_port: capture(&DPT_RE, line),
        })
    }

    /// Parse an sshd authentication line
    ///
    /// Checked in order: failed password, invalid user, accepted. An
    /// "Invalid user" line that also reports a failed password is counted once
    /// as a failed password.
    pub fn classify_auth(line: &str) -> Option<AuthEvent> {
        let (outcome, user_re) = if line.contains(FAILED_PASSWORD) {
            (AuthOutcome::Failed, &*FAILED_USER_RE)
        } else if line.contains(INVALID_USER) {
            (AuthOutcome::Invalid, &*INVALID_USER_RE)
        } else if line.contains(ACCEPTED) {
            (AuthOutcome::Accepted, &*ACCEPTED_USER_RE)
        } else {
            return None;
        };

        Some(AuthEvent {
            outcome,
            username: capture(user_re, line),
            source_ip: capture(&FROM_RE, line),
        })
    }

    /// Parse a fail2ban "Ban <ip>" line
    pub fn classify_ban(line: &str) -> Option<BanEvent> {
        let caps = BAN_RE.captures(line)?;
        Some(BanEvent {
            ip: caps.get(1).map(|m| m.as_str().to_string()),
        })
    }
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
