use std::net::IpAddr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported address family: `{0}` is not an IPv4 address")]
    UnsupportedAddressFamily(IpAddr),
    #[error("invalid socket spec `{spec}`: {reason}")]
    InvalidSpec { spec: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the hex and ASCII-decimal decoders in [`super::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NumberError {
    #[error("cannot decode a zero-length value")]
    Empty,
    #[error("cannot decode hex value of length {0}: expected an even length of at most 8")]
    InvalidLength(usize),
    #[error("invalid digit byte 0x{0:02x}")]
    InvalidDigit(u8),
    #[error("decimal value does not fit into 64 bits")]
    Overflow,
}
