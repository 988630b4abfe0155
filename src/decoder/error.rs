use crate::identifier::NumberError;
use crate::tokenizer;

/// Named columns read by the row decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    LocalAddress,
    Queues,
    Inode,
    Drops,
    Processed,
    Dropped,
    TimeSqueeze,
    InErrors,
    ReceiveBufferErrors,
    ChecksumErrors,
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Column::LocalAddress => "local_address",
            Column::Queues => "tx_queue:rx_queue",
            Column::Inode => "inode",
            Column::Drops => "drops",
            Column::Processed => "processed",
            Column::Dropped => "dropped",
            Column::TimeSqueeze => "time_squeeze",
            Column::InErrors => "InErrors",
            Column::ReceiveBufferErrors => "RcvbufErrors",
            Column::ChecksumErrors => "InCsumErrors",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur while decoding a row.
///
/// `row` is the zero-based line number within the file, header rows included.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid `{column}` in row {row}: {source}")]
    InvalidNumber {
        row: usize,
        column: Column,
        #[source]
        source: NumberError,
    },

    #[error("malformed `{column}` in row {row}: `{value}`")]
    MalformedColumn {
        row: usize,
        column: Column,
        value: String,
    },

    #[error("row {row} has {found} columns, expected at least {expected}")]
    MissingColumns {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Tokenizer(#[from] tokenizer::Error),
}

impl DecodeError {
    pub(crate) fn number(row: usize, column: Column) -> impl FnOnce(NumberError) -> Self {
        move |source| DecodeError::InvalidNumber {
            row,
            column,
            source,
        }
    }

    pub(crate) fn malformed(row: usize, column: Column, value: &[u8]) -> Self {
        DecodeError::MalformedColumn {
            row,
            column,
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DecodeError>;
