//! Compact peer list: 6 bytes per peer (4 IPv4 octets + big-endian port), as
//! handed over by the tracker response parser.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use serde::{Deserialize, Serialize};

/// Size of one compact IPv4 peer record.
pub const COMPACT_PEER_LEN: usize = 6;

/// One peer endpoint decoded from a compact peer list.
///
/// `#[repr(C)]` so the host can receive an array of these directly
/// (`uint8_t address[4]; uint16_t port;`, 6 bytes, port in host byte order).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerDescriptor {
    address: [u8; 4],
    port: u16,
}

impl PeerDescriptor {
    pub fn new(address: [u8; 4], port: u16) -> Self {
        Self { address, port }
    }

    /// Parse one 6-byte record. Caller guarantees the length.
    fn from_record(record: &[u8]) -> Self {
        Self {
            address: [record[0], record[1], record[2], record[3]],
            port: u16::from_be_bytes([record[4], record[5]]),
        }
    }

    /// Address octets, most significant first.
    pub fn address(&self) -> [u8; 4] {
        self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.address)
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.ip(), self.port)
    }
}

impl fmt::Display for PeerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip(), self.port)
    }
}

impl From<PeerDescriptor> for SocketAddrV4 {
    fn from(peer: PeerDescriptor) -> Self {
        peer.socket_addr()
    }
}

impl From<PeerDescriptor> for SocketAddr {
    fn from(peer: PeerDescriptor) -> Self {
        SocketAddr::V4(peer.socket_addr())
    }
}

/// Error decoding a compact peer list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompactPeerError {
    #[error("malformed compact peer list: length {len} is not a multiple of 6")]
    MalformedInput { len: usize },
}

/// Decode a compact peer list into peers, preserving record order.
/// An empty buffer yields no peers. A length that is not a multiple of 6 is
/// rejected before any record is parsed.
pub fn decode(bytes: &[u8]) -> Result<Vec<PeerDescriptor>, CompactPeerError> {
    Ok(decode_iter(bytes)?.collect())
}

/// Lazy form of [`decode`]. Length is validated up front, so the iterator
/// itself cannot fail.
pub fn decode_iter(
    bytes: &[u8],
) -> Result<impl ExactSizeIterator<Item = PeerDescriptor> + '_, CompactPeerError> {
    peer_count(bytes.len())?;
    Ok(bytes
        .chunks_exact(COMPACT_PEER_LEN)
        .map(PeerDescriptor::from_record))
}

/// Number of peers in a compact list of `len` bytes, or an error if `len` is malformed.
pub fn peer_count(len: usize) -> Result<usize, CompactPeerError> {
    if len % COMPACT_PEER_LEN != 0 {
        return Err(CompactPeerError::MalformedInput { len });
    }
    Ok(len / COMPACT_PEER_LEN)
}
