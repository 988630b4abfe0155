use std::path::{Path, PathBuf};

use super::{DEFAULT_BUFFER_CAPACITY, PollError};
use crate::decoder::{self, ParsedRow, RowDecoder, RowFormat};
use crate::fsutil::FileLoader;

pub const DEFAULT_SNMP_PATH: &str = "/proc/net/snmp";

/// Host-wide UDP error counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UdpSnmpStatistics {
    pub in_errors: u64,
    pub receive_buffer_errors: u64,
    pub checksum_errors: u64,
}

/// Reads the `Udp:` counters of `/proc/net/snmp`.
#[derive(Debug)]
pub struct SnmpUdpMonitor {
    path: PathBuf,
    loader: FileLoader,
    decoder: RowDecoder,
}

impl Default for SnmpUdpMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SNMP_PATH)
    }
}

impl SnmpUdpMonitor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            loader: FileLoader::new(path.clone(), DEFAULT_BUFFER_CAPACITY),
            path,
            decoder: RowDecoder::new(RowFormat::SnmpUdp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file once and passes the current counters to `handler`.
    ///
    /// `handler` is not called if the file has no `Udp:` row.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Load`] if the file cannot be read and [`PollError::Decode`] if the
    /// `Udp:` row is malformed.
    pub fn poll<F>(&mut self, mut handler: F) -> Result<(), PollError>
    where
        F: FnMut(&UdpSnmpStatistics),
    {
        let contents = self.loader.load()?;
        decoder::decode_rows(&mut self.decoder, contents, |row| {
            if let ParsedRow::SnmpUdp(row) = row {
                handler(&UdpSnmpStatistics {
                    in_errors: row.in_errors,
                    receive_buffer_errors: row.receive_buffer_errors,
                    checksum_errors: row.checksum_errors,
                });
            }
        })
        .map_err(|source| PollError::Decode {
            path: self.path.clone(),
            source,
        })
    }
}
