//! Column-position decoders for the kernel tables under `/proc/net`.
//!
//! A [`RowDecoder`] is a [`TokenHandler`] for the columns of one row. It counts columns,
//! suppresses header rows by comparing a packed prefix, and decodes only the columns the
//! selected [`RowFormat`] needs into a reused [`ParsedRow`]. [`RowSink`] drives it from an outer
//! row tokenizer and passes every decoded row on to a callback.

mod error;
mod snmp;
mod socket;
mod softnet;

pub use error::{Column, DecodeError, Result};
pub use snmp::SnmpUdpRow;
pub use socket::{SocketRow, TcpRow, UdpRow};
pub use softnet::SoftnetRow;

use crate::tokenizer::{Splitter, TokenHandler};

/// The kernel tables understood by [`RowDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// `/proc/net/tcp`
    Tcp,
    /// `/proc/net/udp`
    Udp,
    /// `/proc/net/softnet_stat`
    Softnet,
    /// The `Udp:` counters of `/proc/net/snmp`
    SnmpUdp,
}

impl RowFormat {
    /// Minimum number of columns a data row must have.
    pub const fn required_columns(self) -> usize {
        match self {
            RowFormat::Tcp => socket::TCP_COLUMNS,
            RowFormat::Udp => socket::UDP_COLUMNS,
            RowFormat::Softnet => softnet::SOFTNET_COLUMNS,
            RowFormat::SnmpUdp => snmp::SNMP_COLUMNS,
        }
    }

    fn empty_row(self) -> ParsedRow {
        match self {
            RowFormat::Tcp => ParsedRow::Tcp(TcpRow::default()),
            RowFormat::Udp => ParsedRow::Udp(UdpRow::default()),
            RowFormat::Softnet => ParsedRow::Softnet(SoftnetRow::default()),
            RowFormat::SnmpUdp => ParsedRow::SnmpUdp(SnmpUdpRow::default()),
        }
    }
}

/// One decoded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedRow {
    Tcp(TcpRow),
    Udp(UdpRow),
    Softnet(SoftnetRow),
    SnmpUdp(SnmpUdpRow),
}

/// Decodes the columns of one row at a time.
///
/// Call [`begin_row`](Self::begin_row) with the complete row, feed its columns through
/// [`TokenHandler`], then collect the result with [`take_row`](Self::take_row).
#[derive(Debug, Clone)]
pub struct RowDecoder {
    format: RowFormat,
    line: usize,
    column: usize,
    skip: bool,
    row: ParsedRow,
    finished: Option<ParsedRow>,
}

impl RowDecoder {
    pub fn new(format: RowFormat) -> Self {
        Self {
            format,
            line: 0,
            column: 0,
            skip: false,
            row: format.empty_row(),
            finished: None,
        }
    }

    pub const fn format(&self) -> RowFormat {
        self.format
    }

    /// Rewinds the line counter for a new pass over the file.
    pub fn reset(&mut self) {
        self.line = 0;
        self.column = 0;
        self.skip = false;
        self.row = self.format.empty_row();
        self.finished = None;
    }

    /// Prepares for the columns of `row`.
    pub fn begin_row(&mut self, row: &[u8]) {
        self.column = 0;
        self.row = self.format.empty_row();
        self.finished = None;
        self.skip = self.format == RowFormat::SnmpUdp && !snmp::is_udp_row(row);
    }

    /// Takes the row decoded since the last [`begin_row`](Self::begin_row), if any.
    pub fn take_row(&mut self) -> Option<ParsedRow> {
        self.finished.take()
    }
}

impl TokenHandler for RowDecoder {
    type Error = DecodeError;

    fn handle_token(&mut self, token: &[u8]) -> Result<()> {
        if self.column == 0
            && matches!(self.format, RowFormat::Tcp | RowFormat::Udp)
            && socket::is_header(token)
        {
            self.skip = true;
        }
        if !self.skip {
            let (line, column) = (self.line, self.column);
            match &mut self.row {
                ParsedRow::Tcp(row) => socket::decode_tcp_column(row, line, column, token)?,
                ParsedRow::Udp(row) => socket::decode_udp_column(row, line, column, token)?,
                ParsedRow::Softnet(row) => softnet::decode_softnet_column(row, line, column, token)?,
                ParsedRow::SnmpUdp(row) => snmp::decode_snmp_column(row, line, column, token)?,
            }
        }
        self.column += 1;
        Ok(())
    }

    fn complete(&mut self) -> Result<()> {
        let line = self.line;
        self.line += 1;
        if self.skip || self.column == 0 {
            return Ok(());
        }
        let expected = self.format.required_columns();
        if self.column < expected {
            return Err(DecodeError::MissingColumns {
                row: line,
                expected,
                found: self.column,
            });
        }
        self.finished = Some(self.row);
        Ok(())
    }
}

/// Row-level [`TokenHandler`]: splits every row into columns for a [`RowDecoder`] and passes
/// each decoded row to `on_row`.
pub struct RowSink<'a, F> {
    decoder: &'a mut RowDecoder,
    columns: Splitter,
    on_row: F,
}

impl<'a, F> RowSink<'a, F>
where
    F: FnMut(ParsedRow),
{
    pub fn new(decoder: &'a mut RowDecoder, on_row: F) -> Self {
        Self {
            decoder,
            columns: Splitter::new(b' ', true),
            on_row,
        }
    }
}

impl<F> TokenHandler for RowSink<'_, F>
where
    F: FnMut(ParsedRow),
{
    type Error = DecodeError;

    fn handle_token(&mut self, row: &[u8]) -> Result<()> {
        self.decoder.begin_row(row);
        self.columns.split(row, &mut *self.decoder)?;
        if let Some(parsed) = self.decoder.take_row() {
            (self.on_row)(parsed);
        }
        Ok(())
    }
}

/// Decodes every row of an in-memory file.
///
/// # Errors
///
/// Returns the first [`DecodeError`] encountered; rows decoded before it have already been
/// passed to `on_row`.
pub fn decode_rows<F>(decoder: &mut RowDecoder, src: &[u8], on_row: F) -> Result<()>
where
    F: FnMut(ParsedRow),
{
    decoder.reset();
    let mut sink = RowSink::new(decoder, on_row);
    Splitter::new(b'\n', true).split(src, &mut sink)
}
