use std::sync::LazyLock;

use regex::Regex;

static JAIL_LIST_RE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)Jail list:[ \t]*(.*)$"));
static CURRENTLY_BANNED_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)Currently banned:[ \t]*(\d+)"));
static BANNED_LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?m)Banned IP list:[ \t]*(.*)$"));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

/// Fields pulled out of `fail2ban-client status <jail>`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JailStatus {
    pub currently_banned: Option<u64>,
    pub banned_ips: Vec<String>,
}

/// Parse the jail names out of `fail2ban-client status`
///
/// ```text
/// Status
/// |- Number of jail:      2
/// `- Jail list:   nginx-http-auth, sshd
/// ```
///
/// Returns `None` when the output has no "Jail list" line.
pub fn parse_jail_list(text: &str) -> Option<Vec<String>> {
    let caps = JAIL_LIST_RE.captures(text)?;
    let list = caps.get(1).map_or("", |m| m.as_str());

    Some(
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Parse the "Currently banned" count and "Banned IP list" of a jail
///
/// Missing fields stay empty; any other layout is not an error.
pub fn parse_jail_status(text: &str) -> JailStatus {
    let currently_banned = CURRENTLY_BANNED_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let banned_ips = BANNED_LIST_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    JailStatus {
        currently_banned,
        banned_ips,
    }
}
