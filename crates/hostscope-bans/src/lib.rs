//! Live ban state for hostscope
//!
//! This crate queries fail2ban for its jails and banned IPs and merges that
//! live view with the ban history parsed from the fail2ban log.

mod reader;
mod reconcile;
mod service;
mod status;

pub use reader::LiveBanReader;
pub use reconcile::reconcile;
pub use service::{
    BanService, BanServiceError, DisabledBanService, Fail2banClient, DEFAULT_QUERY_TIMEOUT,
};
pub use status::{parse_jail_list, parse_jail_status, JailStatus};

// Re-export types used in our public API
pub use hostscope_types::{LiveBanState, ReconciledSnapshot};
