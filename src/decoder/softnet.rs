//! Columns of `/proc/net/softnet_stat`: one row per CPU, lower-case hex, no header.

use super::error::{Column, DecodeError, Result};
use crate::identifier::decode::{HexCase, decode_hex};

pub(super) const SOFTNET_COLUMNS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoftnetRow {
    pub processed: u64,
    pub dropped: u64,
    pub time_squeeze: u64,
}

pub(super) fn decode_softnet_column(
    row: &mut SoftnetRow,
    line: usize,
    column: usize,
    token: &[u8],
) -> Result<()> {
    let (field, name) = match column {
        0 => (&mut row.processed, Column::Processed),
        1 => (&mut row.dropped, Column::Dropped),
        2 => (&mut row.time_squeeze, Column::TimeSqueeze),
        _ => return Ok(()),
    };
    *field = decode_hex(token, HexCase::Lower).map_err(DecodeError::number(line, name))?;
    Ok(())
}
