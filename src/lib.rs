//! Netbuf Monitor: watches socket receive/transmit queues, UDP drop counters and softirq
//! overload through the kernel tables under `/proc/net`.
//!
//! The engine is driven by the caller: register sockets with a [`socket::CandidateRegistry`]
//! from any thread and call `poll` on the monitors from one thread on your own schedule.
//! [`run`] is the bundled daemon doing exactly that on a tokio interval.

pub mod config;
pub mod decoder;
pub mod error;
pub mod fsutil;
pub mod identifier;
pub mod socket;
pub mod system;
pub mod table;
pub mod tokenizer;

use std::sync::Arc;

use error::ResultOkLogExt;
use socket::{
    CandidateRegistry, LoggingLifecycleListener, Protocol, SocketMonitor, SocketStatistics,
};
use system::{CpuSoftnetStats, SnmpUdpMonitor, SoftnetStatsMonitor, UdpSnmpStatistics};

/// Every monitor the daemon polls per tick.
#[derive(Debug)]
struct Monitors {
    tcp: SocketMonitor,
    udp: SocketMonitor,
    softnet: SoftnetStatsMonitor,
    snmp: SnmpUdpMonitor,
}

impl Monitors {
    fn new(config: &config::Config, registry: &Arc<CandidateRegistry>) -> Self {
        let socket_monitor = |protocol: Protocol| {
            let mut builder = SocketMonitor::builder(protocol);
            builder
                .set_path(config.table_path(protocol.as_str()))
                .set_registry(Arc::clone(registry))
                .set_lifecycle_listener(LoggingLifecycleListener::new(protocol.as_str()));
            builder.build()
        };

        Self {
            tcp: socket_monitor(Protocol::Tcp),
            udp: socket_monitor(Protocol::Udp),
            softnet: SoftnetStatsMonitor::new(config.table_path("softnet_stat")),
            snmp: SnmpUdpMonitor::new(config.table_path("snmp")),
        }
    }

    fn poll_all(&mut self) {
        let before = std::time::Instant::now();

        for monitor in [&mut self.tcp, &mut self.udp] {
            let protocol = monitor.protocol();
            let mut report = |stats: &SocketStatistics| {
                log::info!(
                    target: "socket monitor",
                    "{protocol} {}:{} inode={} rx_queue={} tx_queue={} drops={}",
                    stats.address,
                    stats.port,
                    stats.inode,
                    stats.receive_queue_depth,
                    stats.transmit_queue_depth,
                    stats.drops.map_or_else(|| "-".to_owned(), |d| d.to_string())
                );
            };
            monitor.poll(&mut report).ok_log("socket monitor");
        }

        self.softnet
            .poll(|stats: &CpuSoftnetStats| {
                log::info!(
                    target: "softnet monitor",
                    "cpu={} processed={} dropped={} time_squeeze={}",
                    stats.cpu,
                    stats.processed,
                    stats.dropped,
                    stats.time_squeeze
                );
            })
            .ok_log("softnet monitor");

        self.snmp
            .poll(|stats: &UdpSnmpStatistics| {
                log::info!(
                    target: "snmp monitor",
                    "udp in_errors={} rcvbuf_errors={} csum_errors={}",
                    stats.in_errors,
                    stats.receive_buffer_errors,
                    stats.checksum_errors
                );
            })
            .ok_log("snmp monitor");

        log::trace!(
            "poll_all() took {} nanoseconds",
            before.elapsed().as_nanos()
        );
    }
}

/// Runs the Netbuf Monitor daemon.
///
/// Reads the [`config::Config`] from the environment, registers the configured sockets and
/// polls the TCP, UDP, softnet and SNMP monitors on every tick of the configured interval.
/// Polling runs on tokio's blocking pool; a failed poll is logged and retried on the next tick.
///
/// # Errors
///
/// Possible errors include:
/// - Invalid environment variables (see [`config`]).
/// - A configured socket that is not IPv4.
/// - A panic inside the blocking poll task.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;
    log::debug!("Final config: {config:?}");

    let registry = Arc::new(CandidateRegistry::new());
    registry.replace_all(config.sockets.iter().copied())?;
    if registry.is_empty() {
        log::warn!(
            "no sockets registered, set `{}` to monitor individual sockets",
            config::SOCKETS_VAR
        );
    }

    let mut monitors = Monitors::new(&config, &registry);
    let mut interval = tokio::time::interval(config.poll_interval);
    loop {
        interval.tick().await;
        monitors = tokio::task::spawn_blocking(move || {
            monitors.poll_all();
            monitors
        })
        .await?;
    }
}
