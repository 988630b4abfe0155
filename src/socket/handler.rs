use std::net::Ipv4Addr;

use crate::identifier::SocketIdentifier;

/// A changed sample of one monitored socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketStatistics {
    /// The address the socket was registered under. `0.0.0.0`-style wildcard registrations
    /// report the registered address, not the bound one.
    pub address: Ipv4Addr,
    /// The port the socket is bound to.
    pub port: u16,
    /// Identifier of the bound address and port, without the inode.
    pub identifier: SocketIdentifier,
    pub inode: u64,
    pub receive_queue_depth: u64,
    pub transmit_queue_depth: u64,
    /// Drop counter; only UDP sockets have one.
    pub drops: Option<u64>,
}

/// Receives statistics of sockets whose values changed since the previous poll.
pub trait SocketStatisticsHandler {
    fn on_statistics_updated(&mut self, stats: &SocketStatistics);
}

impl<F> SocketStatisticsHandler for F
where
    F: FnMut(&SocketStatistics),
{
    fn on_statistics_updated(&mut self, stats: &SocketStatistics) {
        self(stats)
    }
}

/// Notified when a registered socket shows up in, or disappears from, the kernel table.
pub trait SocketLifecycleListener {
    fn socket_monitoring_started(&mut self, address: Ipv4Addr, port: u16, inode: u64);

    fn socket_monitoring_stopped(&mut self, address: Ipv4Addr, port: u16, inode: u64);
}

/// Ignores every lifecycle event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLifecycleListener;

impl SocketLifecycleListener for NoopLifecycleListener {
    fn socket_monitoring_started(&mut self, _address: Ipv4Addr, _port: u16, _inode: u64) {}

    fn socket_monitoring_stopped(&mut self, _address: Ipv4Addr, _port: u16, _inode: u64) {}
}

/// Logs every lifecycle event at `info` level.
#[derive(Debug, Clone)]
pub struct LoggingLifecycleListener {
    protocol: &'static str,
}

impl LoggingLifecycleListener {
    pub fn new(protocol: &'static str) -> Self {
        Self { protocol }
    }
}

impl SocketLifecycleListener for LoggingLifecycleListener {
    fn socket_monitoring_started(&mut self, address: Ipv4Addr, port: u16, inode: u64) {
        log::info!(
            target: "socket lifecycle",
            "started monitoring {} socket {address}:{port} inode={inode}",
            self.protocol
        );
    }

    fn socket_monitoring_stopped(&mut self, address: Ipv4Addr, port: u16, inode: u64) {
        log::info!(
            target: "socket lifecycle",
            "stopped monitoring {} socket {address}:{port} inode={inode}",
            self.protocol
        );
    }
}
