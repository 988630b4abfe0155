//! Host-wide network counters: per-CPU softirq statistics and UDP error counters.

mod snmp;
mod softnet;

use std::path::PathBuf;

use crate::decoder::DecodeError;
use crate::fsutil::LoadError;

pub use snmp::{DEFAULT_SNMP_PATH, SnmpUdpMonitor, UdpSnmpStatistics};
pub use softnet::{CpuSoftnetStats, DEFAULT_SOFTNET_PATH, SoftnetStatsMonitor};

/// Initial read buffer size for the system tables.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Errors returned by the system monitors' `poll`.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to decode `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}
