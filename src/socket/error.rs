use std::path::PathBuf;

use crate::decoder::DecodeError;
use crate::fsutil::LoadError;

/// Errors returned by [`SocketMonitor::poll`](super::SocketMonitor::poll).
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("failed to decode socket table `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Error that occurs when the open file descriptors of this process cannot be listed.
#[derive(Debug, thiserror::Error)]
#[error("failed to list file descriptors in `{path}`: {source}")]
pub struct InodeScanError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
