//! Bit-packed identifiers for IPv4 sockets.
//!
//! A [`SocketIdentifier`] packs an IPv4 address, a port and (optionally) the low 16 bits of a
//! socket inode into a single comparable `u64`:
//!
//! | bits    | field                                 |
//! |---------|---------------------------------------|
//! | 0..=31  | IPv4 address, host order              |
//! | 32..=47 | port (`0` = match all ports)          |
//! | 48..=63 | inode (`0` = any inode)               |
//!
//! The four registration shapes a caller can ask for are modelled by [`SocketSpec`].

pub mod decode;
mod error;

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

pub use error::{Error, NumberError, Result};

const ADDRESS_MASK: u64 = 0x0000_0000_FFFF_FFFF;
const PORT_SHIFT: u32 = 32;
const PORT_MASK: u64 = 0x0000_FFFF_0000_0000;
const INODE_SHIFT: u32 = 48;
const INODE_MASK: u64 = 0xFFFF_0000_0000_0000;

/// A socket endpoint packed into 64 bits.
///
/// # Examples
///
/// ```
/// # use std::net::Ipv4Addr;
/// # use netbuf_monitor::identifier::SocketIdentifier;
/// let id = SocketIdentifier::new(Ipv4Addr::new(192, 168, 122, 1), 53);
/// assert_eq!(id.port(), 53);
/// assert_eq!(id.as_wildcard_port().port(), 0);
/// assert_eq!(id.address(), Ipv4Addr::new(192, 168, 122, 1));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SocketIdentifier(u64);

impl SocketIdentifier {
    /// Packs an address and port.
    #[inline]
    pub const fn new(address: Ipv4Addr, port: u16) -> Self {
        Self(((port as u64) << PORT_SHIFT) | address.to_bits() as u64)
    }

    /// Packs an address, port and inode.
    #[inline]
    pub const fn with_inode(address: Ipv4Addr, port: u16, inode: u64) -> Self {
        Self::new(address, port).overlay_inode(inode)
    }

    /// Packs an address with the port left as the match-all-ports wildcard.
    #[inline]
    pub const fn wildcard_port(address: Ipv4Addr) -> Self {
        Self::new(address, 0)
    }

    /// Packs an address and port as printed by the kernel in `/proc/net/{tcp,udp}`.
    ///
    /// The kernel prints the address as the hex value of a little-endian 32-bit word holding
    /// the octets in network order, so `raw_address` is byte-swapped into host order.
    #[inline]
    pub const fn from_kernel_hex(raw_address: u32, port: u16) -> Self {
        Self(((port as u64) << PORT_SHIFT) | raw_address.swap_bytes() as u64)
    }

    /// Packs a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`] for IPv6 socket addresses.
    pub fn from_socket_addr(addr: SocketAddr) -> Result<Self> {
        match addr {
            SocketAddr::V4(v4) => Ok(Self::new(*v4.ip(), v4.port())),
            SocketAddr::V6(v6) => Err(Error::UnsupportedAddressFamily(IpAddr::V6(*v6.ip()))),
        }
    }

    /// Packs an address as a match-all-ports identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`] for IPv6 addresses.
    pub fn from_ip_addr(addr: IpAddr) -> Result<Self> {
        Ok(Self::wildcard_port(ipv4(addr)?))
    }

    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn address(self) -> Ipv4Addr {
        Ipv4Addr::from_bits((self.0 & ADDRESS_MASK) as u32)
    }

    #[inline]
    pub const fn octets(self) -> [u8; 4] {
        self.address().octets()
    }

    #[inline]
    pub const fn port(self) -> u16 {
        ((self.0 & PORT_MASK) >> PORT_SHIFT) as u16
    }

    /// Returns the (truncated, 16-bit) inode carried by this identifier.
    #[inline]
    pub const fn inode(self) -> u16 {
        ((self.0 & INODE_MASK) >> INODE_SHIFT) as u16
    }

    #[inline]
    pub const fn is_wildcard_port(self) -> bool {
        self.port() == 0
    }

    /// Masks out the port, leaving address and inode bits untouched.
    #[inline]
    pub const fn as_wildcard_port(self) -> Self {
        Self(self.0 & !PORT_MASK)
    }

    /// Replaces the inode bits with the low 16 bits of `inode`.
    #[inline]
    pub const fn overlay_inode(self, inode: u64) -> Self {
        Self((self.0 & !INODE_MASK) | (inode << INODE_SHIFT))
    }
}

impl fmt::Debug for SocketIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SocketIdentifier({self})")
    }
}

impl fmt::Display for SocketIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.address(), self.port(), self.inode())
    }
}

impl From<SocketAddrV4> for SocketIdentifier {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

fn ipv4(addr: IpAddr) -> Result<Ipv4Addr> {
    match addr {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(_) => Err(Error::UnsupportedAddressFamily(addr)),
    }
}

/// What a caller asks to be monitored.
///
/// The string form accepted by [`SocketSpec::from_str`] is `a.b.c.d[:port][#inode]`.
///
/// # Examples
///
/// ```
/// # use std::net::{IpAddr, Ipv4Addr};
/// # use netbuf_monitor::identifier::SocketSpec;
/// let spec: SocketSpec = "192.168.122.1#15292".parse().unwrap();
/// assert_eq!(
///     spec,
///     SocketSpec::AddressWithInode(IpAddr::V4(Ipv4Addr::new(192, 168, 122, 1)), 15292)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketSpec {
    /// One exact socket.
    Socket(SocketAddr),
    /// Every port bound on an address.
    Address(IpAddr),
    /// One exact socket, only while backed by the given inode.
    SocketWithInode(SocketAddr, u64),
    /// Every port bound on an address, only for the given inode.
    AddressWithInode(IpAddr, u64),
}

impl SocketSpec {
    /// Returns the identifier under which this spec is registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`] for IPv6 specs.
    pub fn identifier(&self) -> Result<SocketIdentifier> {
        Ok(match *self {
            SocketSpec::Socket(addr) => SocketIdentifier::from_socket_addr(addr)?,
            SocketSpec::Address(ip) => SocketIdentifier::from_ip_addr(ip)?,
            SocketSpec::SocketWithInode(addr, inode) => {
                SocketIdentifier::from_socket_addr(addr)?.overlay_inode(inode)
            }
            SocketSpec::AddressWithInode(ip, inode) => {
                SocketIdentifier::from_ip_addr(ip)?.overlay_inode(inode)
            }
        })
    }

    /// Returns the address reported back to handlers for sockets matching this spec.
    ///
    /// Address-only specs report port `0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedAddressFamily`] for IPv6 specs.
    pub fn requested_address(&self) -> Result<SocketAddrV4> {
        match *self {
            SocketSpec::Socket(addr) | SocketSpec::SocketWithInode(addr, _) => match addr {
                SocketAddr::V4(v4) => Ok(v4),
                SocketAddr::V6(v6) => Err(Error::UnsupportedAddressFamily(IpAddr::V6(*v6.ip()))),
            },
            SocketSpec::Address(ip) | SocketSpec::AddressWithInode(ip, _) => {
                Ok(SocketAddrV4::new(ipv4(ip)?, 0))
            }
        }
    }
}

impl From<SocketAddr> for SocketSpec {
    fn from(addr: SocketAddr) -> Self {
        SocketSpec::Socket(addr)
    }
}

impl From<SocketAddrV4> for SocketSpec {
    fn from(addr: SocketAddrV4) -> Self {
        SocketSpec::Socket(SocketAddr::V4(addr))
    }
}

impl From<IpAddr> for SocketSpec {
    fn from(addr: IpAddr) -> Self {
        SocketSpec::Address(addr)
    }
}

impl From<Ipv4Addr> for SocketSpec {
    fn from(addr: Ipv4Addr) -> Self {
        SocketSpec::Address(IpAddr::V4(addr))
    }
}

impl FromStr for SocketSpec {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = |reason| Error::InvalidSpec {
            spec: s.to_owned(),
            reason,
        };

        let (endpoint, inode) = match s.trim().split_once('#') {
            Some((endpoint, inode)) => (
                endpoint,
                Some(inode.parse::<u64>().map_err(|_| invalid("inode is not a number"))?),
            ),
            None => (s.trim(), None),
        };

        let (host, port) = match endpoint.split_once(':') {
            Some((host, port)) => (
                host,
                Some(port.parse::<u16>().map_err(|_| invalid("port is not a number"))?),
            ),
            None => (endpoint, None),
        };
        let ip = Ipv4Addr::from_str(host).map_err(|_| invalid("host is not an IPv4 address"))?;

        Ok(match (port, inode) {
            (Some(port), None) => SocketSpec::Socket(SocketAddr::from((ip, port))),
            (None, None) => SocketSpec::Address(IpAddr::V4(ip)),
            (Some(port), Some(inode)) => {
                SocketSpec::SocketWithInode(SocketAddr::from((ip, port)), inode)
            }
            (None, Some(inode)) => SocketSpec::AddressWithInode(IpAddr::V4(ip), inode),
        })
    }
}
