//! Per-socket monitoring of `/proc/net/tcp` and `/proc/net/udp`.
//!
//! Callers register interest in sockets through a [`CandidateRegistry`] (any thread, any time)
//! and drive [`SocketMonitor::poll`] from one thread on their own schedule. Each poll streams
//! the kernel table, matches rows against the current registry snapshot and reports
//! registered sockets whose queue depths or drop counters changed.
//!
//! # Example
//!
//! ```no_run
//! use std::net::{Ipv4Addr, SocketAddrV4};
//! use netbuf_monitor::socket::{Protocol, SocketMonitor, SocketStatistics};
//!
//! let mut monitor = SocketMonitor::new(Protocol::Udp);
//! monitor.begin_monitoring(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 53))?;
//! monitor.begin_monitoring(Ipv4Addr::UNSPECIFIED)?;
//!
//! let mut print = |stats: &SocketStatistics| println!("{stats:?}");
//! monitor.poll(&mut print)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod candidate;
mod error;
mod handler;
mod monitor;
mod ownership;
mod tracker;

pub use candidate::{CandidateRegistry, Candidates};
pub use error::{InodeScanError, PollError};
pub use handler::{
    LoggingLifecycleListener, NoopLifecycleListener, SocketLifecycleListener, SocketStatistics,
    SocketStatisticsHandler,
};
pub use monitor::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ROW_LENGTH, DEFAULT_TCP_PATH, DEFAULT_UDP_PATH, Protocol,
    SocketMonitor, SocketMonitorBuilder,
};
pub use ownership::{MAX_NOT_OWNED_INODES, OwnedSocketFilter, ProcSelfFdInodes, SocketInodeSource};
