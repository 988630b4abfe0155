//! Restricts socket statistics to sockets owned by this process.

use std::collections::HashSet;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use super::error::InodeScanError;
use super::handler::{SocketStatistics, SocketStatisticsHandler};
use crate::identifier::decode::decode_ascii;

/// Bound on the negative cache before it is cleared.
pub const MAX_NOT_OWNED_INODES: usize = 4096;

/// Lists the socket inodes this process currently has open.
pub trait SocketInodeSource {
    /// Adds every currently owned socket inode to `inodes`.
    ///
    /// # Errors
    ///
    /// Returns an [`InodeScanError`] if the descriptor table cannot be read.
    fn collect_socket_inodes(&mut self, inodes: &mut HashSet<u64>) -> Result<(), InodeScanError>;
}

/// Reads socket inodes from the `socket:[<inode>]` link targets in `/proc/self/fd`.
#[derive(Debug, Clone)]
pub struct ProcSelfFdInodes {
    fd_dir: PathBuf,
}

impl Default for ProcSelfFdInodes {
    fn default() -> Self {
        Self::new("/proc/self/fd")
    }
}

impl ProcSelfFdInodes {
    pub fn new(fd_dir: impl Into<PathBuf>) -> Self {
        Self {
            fd_dir: fd_dir.into(),
        }
    }
}

impl SocketInodeSource for ProcSelfFdInodes {
    fn collect_socket_inodes(&mut self, inodes: &mut HashSet<u64>) -> Result<(), InodeScanError> {
        let entries = std::fs::read_dir(&self.fd_dir).map_err(|source| InodeScanError {
            path: self.fd_dir.clone(),
            source,
        })?;

        for entry in entries {
            let entry = entry.map_err(|source| InodeScanError {
                path: self.fd_dir.clone(),
                source,
            })?;
            // descriptors closed since the directory was listed have no link anymore
            let Ok(target) = std::fs::read_link(entry.path()) else {
                continue;
            };
            if let Some(inode) = socket_inode(target.as_os_str().as_bytes()) {
                inodes.insert(inode);
            }
        }
        Ok(())
    }
}

fn socket_inode(link: &[u8]) -> Option<u64> {
    let digits = link.strip_prefix(b"socket:[")?.strip_suffix(b"]")?;
    decode_ascii(digits).ok()
}

/// A [`SocketStatisticsHandler`] that forwards only statistics of sockets owned by this process.
///
/// Known owned inodes are remembered for the lifetime of the filter. An unknown inode triggers
/// one refresh from the [`SocketInodeSource`]; if it is still unknown it is remembered as not
/// owned until the negative cache reaches [`MAX_NOT_OWNED_INODES`] and is cleared.
#[derive(Debug)]
pub struct OwnedSocketFilter<H, S = ProcSelfFdInodes> {
    inner: H,
    source: S,
    owned: HashSet<u64>,
    not_owned: HashSet<u64>,
}

impl<H> OwnedSocketFilter<H, ProcSelfFdInodes> {
    pub fn new(inner: H) -> Self {
        Self::with_source(inner, ProcSelfFdInodes::default())
    }
}

impl<H, S> OwnedSocketFilter<H, S>
where
    S: SocketInodeSource,
{
    pub fn with_source(inner: H, source: S) -> Self {
        Self {
            inner,
            source,
            owned: HashSet::new(),
            not_owned: HashSet::new(),
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn into_inner(self) -> H {
        self.inner
    }

    fn is_owned(&mut self, inode: u64) -> bool {
        if self.owned.contains(&inode) {
            return true;
        }
        if self.not_owned.contains(&inode) {
            return false;
        }

        if let Err(err) = self.source.collect_socket_inodes(&mut self.owned) {
            log::warn!("dropping statistics for socket inode {inode}: {err}");
            return false;
        }
        if self.owned.contains(&inode) {
            return true;
        }

        if self.not_owned.len() >= MAX_NOT_OWNED_INODES {
            self.not_owned.clear();
        }
        self.not_owned.insert(inode);
        false
    }
}

impl<H, S> SocketStatisticsHandler for OwnedSocketFilter<H, S>
where
    H: SocketStatisticsHandler,
    S: SocketInodeSource,
{
    fn on_statistics_updated(&mut self, stats: &SocketStatistics) {
        if self.is_owned(stats.inode) {
            self.inner.on_statistics_updated(stats);
        }
    }
}
