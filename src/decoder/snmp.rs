//! The UDP counter row of `/proc/net/snmp`.
//!
//! The file pairs every header row with a data row carrying the same `Udp:` prefix, so the
//! header is told apart by its first eight bytes.

use super::error::{Column, DecodeError, Result};
use crate::identifier::decode::decode_ascii;

const UDP_PREFIX: u32 = u32::from_be_bytes(*b"Udp:");
const UDP_HEADER_PREFIX: u64 = u64::from_be_bytes(*b"Udp: InD");

const IN_ERRORS: usize = 3;
const RECEIVE_BUFFER_ERRORS: usize = 5;
const CHECKSUM_ERRORS: usize = 7;

pub(super) const SNMP_COLUMNS: usize = CHECKSUM_ERRORS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnmpUdpRow {
    pub in_errors: u64,
    pub receive_buffer_errors: u64,
    pub checksum_errors: u64,
}

/// Returns `true` only for the UDP data row.
pub(super) fn is_udp_row(row: &[u8]) -> bool {
    let is_udp = row
        .first_chunk::<4>()
        .is_some_and(|prefix| u32::from_be_bytes(*prefix) == UDP_PREFIX);
    let is_header = row
        .first_chunk::<8>()
        .is_some_and(|prefix| u64::from_be_bytes(*prefix) == UDP_HEADER_PREFIX);
    is_udp && !is_header
}

pub(super) fn decode_snmp_column(
    row: &mut SnmpUdpRow,
    line: usize,
    column: usize,
    token: &[u8],
) -> Result<()> {
    let (field, name) = match column {
        IN_ERRORS => (&mut row.in_errors, Column::InErrors),
        RECEIVE_BUFFER_ERRORS => (&mut row.receive_buffer_errors, Column::ReceiveBufferErrors),
        CHECKSUM_ERRORS => (&mut row.checksum_errors, Column::ChecksumErrors),
        _ => return Ok(()),
    };
    *field = decode_ascii(token).map_err(DecodeError::number(line, name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_udp_row() {
        assert!(is_udp_row(b"Udp: 1019 1 7 1104 3 0 2 0 0"));
        assert!(!is_udp_row(
            b"Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors"
        ));
        assert!(!is_udp_row(b"UdpLite: 0 0 0 0 0 0 0 0 0"));
        assert!(!is_udp_row(b"Tcp: 1 200 120000 -1"));
        assert!(!is_udp_row(b"Udp"));
    }

    #[test]
    fn test_decode_columns() {
        let mut row = SnmpUdpRow::default();
        for (column, token) in ["Udp:", "1019", "1", "7", "1104", "3", "0", "2", "0"]
            .iter()
            .enumerate()
        {
            decode_snmp_column(&mut row, 0, column, token.as_bytes()).unwrap();
        }
        assert_eq!(
            row,
            SnmpUdpRow {
                in_errors: 7,
                receive_buffer_errors: 3,
                checksum_errors: 2,
            }
        );
    }
}
