use std::path::PathBuf;
use std::sync::Arc;

use super::candidate::CandidateRegistry;
use super::error::PollError;
use super::handler::{NoopLifecycleListener, SocketLifecycleListener, SocketStatisticsHandler};
use super::tracker::Tracker;
use crate::decoder::{ParsedRow, RowDecoder, RowFormat, RowSink};
use crate::fsutil::FileLoader;
use crate::identifier::{self, SocketSpec};
use crate::tokenizer::ChunkTokenizer;

pub const DEFAULT_TCP_PATH: &str = "/proc/net/tcp";
pub const DEFAULT_UDP_PATH: &str = "/proc/net/udp";

/// Bytes read from the socket table per read call.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Longest row that may be split across two reads.
pub const DEFAULT_MAX_ROW_LENGTH: usize = 1024;

/// The socket table a [`SocketMonitor`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub const fn default_path(self) -> &'static str {
        match self {
            Protocol::Tcp => DEFAULT_TCP_PATH,
            Protocol::Udp => DEFAULT_UDP_PATH,
        }
    }

    const fn row_format(self) -> RowFormat {
        match self {
            Protocol::Tcp => RowFormat::Tcp,
            Protocol::Udp => RowFormat::Udp,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Watches the registered sockets of one protocol in its `/proc/net` table.
///
/// [`poll`](Self::poll) must be called from one thread at a time. Registration goes through
/// the shared [`CandidateRegistry`] and may happen concurrently from any thread; it takes
/// effect on the next poll.
#[derive(Debug)]
pub struct SocketMonitor {
    protocol: Protocol,
    path: PathBuf,
    registry: Arc<CandidateRegistry>,
    loader: FileLoader,
    rows: ChunkTokenizer,
    decoder: RowDecoder,
    tracker: Tracker,
}

impl SocketMonitor {
    /// Creates a monitor for the default table of `protocol`.
    pub fn new(protocol: Protocol) -> Self {
        SocketMonitorBuilder::new(protocol).build()
    }

    pub fn builder(protocol: Protocol) -> SocketMonitorBuilder {
        SocketMonitorBuilder::new(protocol)
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Returns a handle for registering sockets from other threads.
    pub fn registry(&self) -> Arc<CandidateRegistry> {
        Arc::clone(&self.registry)
    }

    /// See [`CandidateRegistry::begin_monitoring`].
    ///
    /// # Errors
    ///
    /// Returns [`identifier::Error::UnsupportedAddressFamily`] for IPv6 specs.
    pub fn begin_monitoring(&self, spec: impl Into<SocketSpec>) -> identifier::Result<bool> {
        self.registry.begin_monitoring(spec)
    }

    /// See [`CandidateRegistry::end_monitoring`].
    ///
    /// # Errors
    ///
    /// Returns [`identifier::Error::UnsupportedAddressFamily`] for IPv6 specs.
    pub fn end_monitoring(&self, spec: impl Into<SocketSpec>) -> identifier::Result<bool> {
        self.registry.end_monitoring(spec)
    }

    /// Number of registered sockets currently present in the table.
    pub fn monitored_sockets(&self) -> usize {
        self.tracker.len()
    }

    /// Reads the socket table once and reports every registered socket whose values changed.
    ///
    /// Sockets seen for the first time are announced to the lifecycle listener before their
    /// statistics are reported. Tracked sockets that are no longer in the table, or no longer
    /// registered, are announced as stopped after the whole table has been read.
    ///
    /// # Arguments
    ///
    /// * `handler` - Receives the statistics of changed sockets.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Load`] if the table cannot be read and [`PollError::Decode`] if a
    /// row is malformed. A failed poll does not purge any tracked socket.
    pub fn poll<H>(&mut self, handler: &mut H) -> Result<(), PollError>
    where
        H: SocketStatisticsHandler + ?Sized,
    {
        let before = std::time::Instant::now();
        let candidates = self.registry.snapshot();

        let Self {
            path,
            loader,
            rows,
            decoder,
            tracker,
            ..
        } = self;
        rows.reset();
        decoder.reset();

        let mut sink = RowSink::new(decoder, |row| match row {
            ParsedRow::Tcp(row) => tracker.observe(&candidates, &row, None, handler),
            ParsedRow::Udp(row) => {
                tracker.observe(&candidates, &row.socket, Some(row.drops), handler)
            }
            ParsedRow::Softnet(_) | ParsedRow::SnmpUdp(_) => {}
        });
        let decode_error = |source| PollError::Decode {
            path: path.clone(),
            source,
        };
        let streamed = loader
            .stream(|chunk| rows.feed(chunk, &mut sink).map_err(decode_error))
            .and_then(|()| rows.finish(&mut sink).map_err(decode_error));
        drop(sink);

        if let Err(err) = streamed {
            tracker.abandon_poll();
            return Err(err);
        }
        tracker.finish_poll();
        log::trace!(
            "poll() of `{}` took {} nanoseconds",
            path.display(),
            before.elapsed().as_nanos()
        );
        Ok(())
    }
}

/// Configures a [`SocketMonitor`].
pub struct SocketMonitorBuilder {
    protocol: Protocol,
    path: Option<PathBuf>,
    chunk_size: usize,
    max_row_length: usize,
    registry: Option<Arc<CandidateRegistry>>,
    listener: Option<Box<dyn SocketLifecycleListener + Send>>,
}

impl SocketMonitorBuilder {
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            path: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_row_length: DEFAULT_MAX_ROW_LENGTH,
            registry: None,
            listener: None,
        }
    }

    /// Sets the path of the socket table.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a file in `/proc/net/{tcp,udp}` format.
    ///
    /// # Returns
    ///
    /// The builder with the table path set.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the number of bytes requested per read.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the longest row the monitor can reassemble across two reads.
    pub fn set_max_row_length(&mut self, max_row_length: usize) -> &mut Self {
        self.max_row_length = max_row_length;
        self
    }

    /// Shares an existing registry instead of creating a new one.
    pub fn set_registry(&mut self, registry: Arc<CandidateRegistry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    pub fn set_lifecycle_listener(
        &mut self,
        listener: impl SocketLifecycleListener + Send + 'static,
    ) -> &mut Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Builds the monitor. The table is opened on the first poll.
    pub fn build(self) -> SocketMonitor {
        let path = self
            .path
            .unwrap_or_else(|| PathBuf::from(self.protocol.default_path()));
        SocketMonitor {
            protocol: self.protocol,
            loader: FileLoader::new(path.clone(), self.chunk_size),
            path,
            registry: self.registry.unwrap_or_default(),
            rows: ChunkTokenizer::new(b'\n', self.max_row_length),
            decoder: RowDecoder::new(self.protocol.row_format()),
            tracker: Tracker::new(
                self.listener
                    .unwrap_or_else(|| Box::new(NoopLifecycleListener)),
            ),
        }
    }
}

impl std::fmt::Debug for SocketMonitorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketMonitorBuilder")
            .field("protocol", &self.protocol)
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .field("max_row_length", &self.max_row_length)
            .finish_non_exhaustive()
    }
}
