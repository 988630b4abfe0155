//! Columns of `/proc/net/tcp` and `/proc/net/udp`.
//!
//! ```text
//!   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops
//!  0: 00000000:4E50 00000000:0000 07 00000000:00000000 00:00000000 00000000     0        0 21682 2 0000000000000000 0
//! ```

use super::error::{Column, DecodeError, Result};
use crate::identifier::SocketIdentifier;
use crate::identifier::decode::{HexCase, decode_ascii, decode_hex};

const HEADER_SIGNATURE: u16 = u16::from_be_bytes(*b"sl");

const LOCAL_ADDRESS: usize = 1;
const QUEUES: usize = 4;
const INODE: usize = 9;
const DROPS: usize = 12;

pub(super) const TCP_COLUMNS: usize = INODE + 1;
pub(super) const UDP_COLUMNS: usize = DROPS + 1;

/// Fields shared by TCP and UDP socket table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SocketRow {
    /// Local address and port, without inode bits.
    pub identifier: SocketIdentifier,
    pub transmit_queue_depth: u64,
    pub receive_queue_depth: u64,
    pub inode: u64,
}

pub type TcpRow = SocketRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UdpRow {
    pub socket: SocketRow,
    pub drops: u64,
}

/// Returns `true` for the `sl  local_address ...` header row.
pub(super) fn is_header(first_column: &[u8]) -> bool {
    first_column
        .first_chunk::<2>()
        .is_some_and(|prefix| u16::from_be_bytes(*prefix) == HEADER_SIGNATURE)
}

pub(super) fn decode_tcp_column(
    row: &mut TcpRow,
    line: usize,
    column: usize,
    token: &[u8],
) -> Result<()> {
    match column {
        LOCAL_ADDRESS => row.identifier = decode_local_address(line, token)?,
        QUEUES => {
            let (tx, rx) = split_pair(token, 8, 8)
                .ok_or_else(|| DecodeError::malformed(line, Column::Queues, token))?;
            row.transmit_queue_depth =
                decode_hex(tx, HexCase::Upper).map_err(DecodeError::number(line, Column::Queues))?;
            row.receive_queue_depth =
                decode_hex(rx, HexCase::Upper).map_err(DecodeError::number(line, Column::Queues))?;
        }
        INODE => {
            row.inode = decode_ascii(token).map_err(DecodeError::number(line, Column::Inode))?;
        }
        _ => {}
    }
    Ok(())
}

pub(super) fn decode_udp_column(
    row: &mut UdpRow,
    line: usize,
    column: usize,
    token: &[u8],
) -> Result<()> {
    if column == DROPS {
        row.drops = decode_ascii(token).map_err(DecodeError::number(line, Column::Drops))?;
        return Ok(());
    }
    decode_tcp_column(&mut row.socket, line, column, token)
}

fn decode_local_address(line: usize, token: &[u8]) -> Result<SocketIdentifier> {
    let (address, port) = split_pair(token, 8, 4)
        .ok_or_else(|| DecodeError::malformed(line, Column::LocalAddress, token))?;
    let address = decode_hex(address, HexCase::Upper)
        .map_err(DecodeError::number(line, Column::LocalAddress))?;
    let port =
        decode_hex(port, HexCase::Upper).map_err(DecodeError::number(line, Column::LocalAddress))?;
    Ok(SocketIdentifier::from_kernel_hex(address as u32, port as u16))
}

/// Splits `AAAA:BBBB`, checking the width of both halves.
fn split_pair(token: &[u8], left: usize, right: usize) -> Option<(&[u8], &[u8])> {
    if token.len() != left + 1 + right || token[left] != b':' {
        return None;
    }
    Some((&token[..left], &token[left + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_is_header() {
        assert!(is_header(b"sl"));
        assert!(!is_header(b"0:"));
        assert!(!is_header(b"s"));
    }

    #[test]
    fn test_decode_local_address() {
        let id = decode_local_address(1, b"017AA8C0:0035").unwrap();
        assert_eq!(id.address(), Ipv4Addr::new(192, 168, 122, 1));
        assert_eq!(id.port(), 53);
        assert_eq!(id.inode(), 0);
    }

    #[test]
    fn test_decode_local_address_malformed() {
        for token in [&b"017AA8C00035"[..], b"017AA8C0-0035", b"0100007F:35"] {
            let err = decode_local_address(4, token).unwrap_err();
            assert!(
                matches!(
                    err,
                    DecodeError::MalformedColumn {
                        row: 4,
                        column: Column::LocalAddress,
                        ..
                    }
                ),
                "{err}"
            );
        }
    }

    #[test]
    fn test_decode_queues_and_drops() {
        let mut row = UdpRow::default();
        decode_udp_column(&mut row, 1, QUEUES, b"0000000A:000000A6").unwrap();
        decode_udp_column(&mut row, 1, INODE, b"15292").unwrap();
        decode_udp_column(&mut row, 1, DROPS, b"7").unwrap();
        assert_eq!(row.socket.transmit_queue_depth, 10);
        assert_eq!(row.socket.receive_queue_depth, 166);
        assert_eq!(row.socket.inode, 15292);
        assert_eq!(row.drops, 7);
    }

    #[test]
    fn test_lower_case_hex_is_rejected() {
        let mut row = TcpRow::default();
        let err = decode_tcp_column(&mut row, 2, QUEUES, b"0000000a:00000000").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidNumber {
                row: 2,
                column: Column::Queues,
                ..
            }
        ));
    }
}
