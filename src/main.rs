/// Entry point for the Netbuf Monitor daemon.
///
/// Polls `/proc/net/{tcp,udp,softnet_stat,snmp}` at a fixed cadence and logs registered
/// sockets whose queues or drop counters changed, plus softirq and UDP error counters.
/// `RUST_LOG` controls verbosity.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=info NETBUF_SOCKETS=0.0.0.0,127.0.0.1:53 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    netbuf_monitor::run().await
}
