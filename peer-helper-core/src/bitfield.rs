//! Piece bitfield: one bit per piece, MSB-first, exactly the payload of the
//! peer-wire `bitfield` message.

use crate::bits::{self, bit_mask};

/// Which pieces of a torrent a peer holds.
///
/// The buffer is always `ceil(num_pieces / 8)` bytes. Indices at or beyond
/// `num_pieces` are rejected, never clamped; pad bits in the last byte are
/// never reported as pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceBitfield {
    bytes: Vec<u8>,
    num_pieces: usize,
}

/// Error from a bitfield query, update or construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BitfieldError {
    #[error("piece index {index} out of range (num_pieces {num_pieces})")]
    OutOfRange { index: usize, num_pieces: usize },
    #[error("bitfield length {actual} does not match {expected} bytes for {num_pieces} pieces")]
    LengthMismatch {
        expected: usize,
        actual: usize,
        num_pieces: usize,
    },
    #[error("bitfield has pad bits set beyond piece {num_pieces}")]
    DirtyPadding { num_pieces: usize },
}

impl PieceBitfield {
    /// Empty bitfield over `num_pieces` pieces. Zero pieces is allowed.
    pub fn new(num_pieces: usize) -> Self {
        Self {
            bytes: vec![0; bits::byte_len(num_pieces)],
            num_pieces,
        }
    }

    /// Build a bitfield with every index in `indices` set. Duplicates are fine.
    /// Any out-of-range index fails the whole construction.
    pub fn from_indices<I>(indices: I, num_pieces: usize) -> Result<Self, BitfieldError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut bitfield = Self::new(num_pieces);
        for index in indices {
            bitfield.set(index)?;
        }
        Ok(bitfield)
    }

    /// Take a received payload as the initial state. Pad bits are copied as-is;
    /// use [`PieceBitfield::from_bytes_strict`] for untrusted peers.
    pub fn from_bytes(bytes: &[u8], num_pieces: usize) -> Result<Self, BitfieldError> {
        let expected = bits::byte_len(num_pieces);
        if bytes.len() != expected {
            return Err(BitfieldError::LengthMismatch {
                expected,
                actual: bytes.len(),
                num_pieces,
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
            num_pieces,
        })
    }

    /// Like [`PieceBitfield::from_bytes`], but also rejects set pad bits.
    pub fn from_bytes_strict(bytes: &[u8], num_pieces: usize) -> Result<Self, BitfieldError> {
        let bitfield = Self::from_bytes(bytes, num_pieces)?;
        if !bitfield.has_clean_padding() {
            return Err(BitfieldError::DirtyPadding { num_pieces });
        }
        Ok(bitfield)
    }

    fn check_index(&self, index: usize) -> Result<(), BitfieldError> {
        if index >= self.num_pieces {
            return Err(BitfieldError::OutOfRange {
                index,
                num_pieces: self.num_pieces,
            });
        }
        Ok(())
    }

    /// Whether piece `index` is present.
    pub fn has(&self, index: usize) -> Result<bool, BitfieldError> {
        self.check_index(index)?;
        let (byte, bit) = bits::locate(index);
        Ok(self.bytes[byte] & bit_mask(bit) != 0)
    }

    /// Mark piece `index` present. Returns `true` if the piece was newly set,
    /// `false` if it was already present (no change).
    pub fn set(&mut self, index: usize) -> Result<bool, BitfieldError> {
        self.check_index(index)?;
        let (byte, bit) = bits::locate(index);
        let mask = bit_mask(bit);
        if self.bytes[byte] & mask != 0 {
            return Ok(false);
        }
        self.bytes[byte] |= mask;
        Ok(true)
    }

    pub fn num_pieces(&self) -> usize {
        self.num_pieces
    }

    /// Payload length in bytes, `ceil(num_pieces / 8)`.
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Owned copy of the payload, ready to send as a `bitfield` message body.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// True when no bit past `num_pieces` is set.
    pub fn has_clean_padding(&self) -> bool {
        match self.bytes.last() {
            Some(last) => last & bits::padding_mask(self.num_pieces) == 0,
            None => true,
        }
    }

    /// Number of pieces present. Pad bits are not counted.
    pub fn count(&self) -> usize {
        let total: usize = self.bytes.iter().map(|b| b.count_ones() as usize).sum();
        let pad = match self.bytes.last() {
            Some(last) => (last & bits::padding_mask(self.num_pieces)).count_ones() as usize,
            None => 0,
        };
        total - pad
    }

    /// True when every piece is present. A zero-piece bitfield is complete.
    pub fn is_complete(&self) -> bool {
        self.count() == self.num_pieces
    }

    /// True when no piece is present.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Indices of present pieces, ascending.
    pub fn pieces(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_pieces).filter(move |&index| {
            let (byte, bit) = bits::locate(index);
            self.bytes[byte] & bit_mask(bit) != 0
        })
    }
}
