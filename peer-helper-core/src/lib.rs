//! Native helpers for a BitTorrent client: compact peer list decoding and
//! piece bitfields. Host-driven: no I/O; the host VM calls in through `ffi`.

pub mod bits;
pub mod compact;
pub mod bitfield;
pub mod shared;

pub mod config;
pub mod logging;
pub mod ffi;

pub use bitfield::{BitfieldError, PieceBitfield};
pub use compact::{
    decode, decode_iter, peer_count, CompactPeerError, PeerDescriptor, COMPACT_PEER_LEN,
};
pub use config::Config;
pub use shared::SharedBitfield;
