//! Environment-driven configuration of the bundled daemon.
//!
//! | Variable                  | Default      | Meaning                                          |
//! |---------------------------|--------------|--------------------------------------------------|
//! | `NETBUF_PROC_NET`         | `/proc/net`  | directory holding `tcp`, `udp`, `snmp`, ...      |
//! | `NETBUF_SOCKETS`          | (none)       | comma-separated `a.b.c.d[:port][#inode]` specs   |
//! | `NETBUF_POLL_INTERVAL_MS` | `1000`       | poll cadence in milliseconds                     |

use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use crate::identifier::{self, SocketSpec};

pub const PROC_NET_VAR: &str = "NETBUF_PROC_NET";
pub const SOCKETS_VAR: &str = "NETBUF_SOCKETS";
pub const POLL_INTERVAL_VAR: &str = "NETBUF_POLL_INTERVAL_MS";

pub const DEFAULT_PROC_NET: &str = "/proc/net";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid `{var}` entry: {source}")]
    InvalidSocket {
        var: &'static str,
        #[source]
        source: identifier::Error,
    },
    #[error("invalid `{var}` value `{value}`: {source}")]
    InvalidInterval {
        var: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("`{var}` must be greater than zero")]
    ZeroInterval { var: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub proc_net: PathBuf,
    pub sockets: Vec<SocketSpec>,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_net: PathBuf::from(DEFAULT_PROC_NET),
            sockets: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable if set.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] if a socket spec cannot be parsed or the poll interval is not a
    /// positive number of milliseconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(proc_net) = lookup(PROC_NET_VAR).filter(|v| !v.trim().is_empty()) {
            config.proc_net = PathBuf::from(proc_net.trim());
        }

        if let Some(sockets) = lookup(SOCKETS_VAR) {
            config.sockets = sockets
                .split(',')
                .map(str::trim)
                .filter(|spec| !spec.is_empty())
                .map(|spec| {
                    spec.parse::<SocketSpec>()
                        .map_err(|source| Error::InvalidSocket {
                            var: SOCKETS_VAR,
                            source,
                        })
                })
                .collect::<Result<_>>()?;
        }

        if let Some(interval) = lookup(POLL_INTERVAL_VAR) {
            let millis = interval
                .trim()
                .parse::<u64>()
                .map_err(|source| Error::InvalidInterval {
                    var: POLL_INTERVAL_VAR,
                    value: interval.clone(),
                    source,
                })?;
            if millis == 0 {
                return Err(Error::ZeroInterval {
                    var: POLL_INTERVAL_VAR,
                });
            }
            config.poll_interval = Duration::from_millis(millis);
        }

        Ok(config)
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.proc_net.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.table_path("udp"), PathBuf::from("/proc/net/udp"));
    }

    #[test]
    fn test_all_variables() {
        let config = config(&[
            (PROC_NET_VAR, "/host/proc/net"),
            (SOCKETS_VAR, "127.0.0.1:53, 0.0.0.0 ,,10.0.0.1#77"),
            (POLL_INTERVAL_VAR, "250"),
        ])
        .unwrap();
        assert_eq!(config.proc_net, PathBuf::from("/host/proc/net"));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(
            config.sockets,
            vec![
                SocketSpec::Socket(SocketAddr::from(([127, 0, 0, 1], 53))),
                SocketSpec::Address(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
                SocketSpec::AddressWithInode(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 77),
            ]
        );
    }

    #[test]
    fn test_invalid_socket() {
        let err = config(&[(SOCKETS_VAR, "127.0.0.1:53,localhost")]).unwrap_err();
        assert!(matches!(err, Error::InvalidSocket { .. }));
    }

    #[test]
    fn test_invalid_interval() {
        let err = config(&[(POLL_INTERVAL_VAR, "soon")]).unwrap_err();
        assert!(matches!(err, Error::InvalidInterval { .. }));

        let err = config(&[(POLL_INTERVAL_VAR, "0")]).unwrap_err();
        assert!(matches!(err, Error::ZeroInterval { .. }));
    }
}
