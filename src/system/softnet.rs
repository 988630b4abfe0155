use std::path::{Path, PathBuf};

use super::{DEFAULT_BUFFER_CAPACITY, PollError};
use crate::decoder::{self, ParsedRow, RowDecoder, RowFormat, SoftnetRow};
use crate::fsutil::FileLoader;

pub const DEFAULT_SOFTNET_PATH: &str = "/proc/net/softnet_stat";

/// Softirq network counters of one CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSoftnetStats {
    /// Zero-based row of the CPU in `softnet_stat`.
    pub cpu: usize,
    /// Packets processed by the network softirq.
    pub processed: u64,
    /// Packets dropped because the backlog queue was full.
    pub dropped: u64,
    /// Times the softirq ran out of budget or time with work remaining.
    pub time_squeeze: u64,
}

/// Watches `/proc/net/softnet_stat` and reports CPUs whose counters changed.
#[derive(Debug)]
pub struct SoftnetStatsMonitor {
    path: PathBuf,
    loader: FileLoader,
    decoder: RowDecoder,
    last: Vec<Option<SoftnetRow>>,
}

impl Default for SoftnetStatsMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SOFTNET_PATH)
    }
}

impl SoftnetStatsMonitor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            loader: FileLoader::new(path.clone(), DEFAULT_BUFFER_CAPACITY),
            path,
            decoder: RowDecoder::new(RowFormat::Softnet),
            last: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table once and calls `handler` for every CPU whose counters changed since
    /// the previous poll. Every CPU is reported on the first poll.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Load`] if the table cannot be read and [`PollError::Decode`] if a
    /// row is malformed.
    pub fn poll<F>(&mut self, mut handler: F) -> Result<(), PollError>
    where
        F: FnMut(&CpuSoftnetStats),
    {
        let contents = self.loader.load()?;
        let last = &mut self.last;
        let mut cpu = 0;

        decoder::decode_rows(&mut self.decoder, contents, |row| {
            let ParsedRow::Softnet(row) = row else {
                return;
            };
            if last.len() <= cpu {
                last.resize(cpu + 1, None);
            }
            if last[cpu] != Some(row) {
                last[cpu] = Some(row);
                handler(&CpuSoftnetStats {
                    cpu,
                    processed: row.processed,
                    dropped: row.dropped,
                    time_squeeze: row.time_squeeze,
                });
            }
            cpu += 1;
        })
        .map_err(|source| PollError::Decode {
            path: self.path.clone(),
            source,
        })?;

        last.truncate(cpu);
        Ok(())
    }
}
