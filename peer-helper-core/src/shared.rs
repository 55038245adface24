//! Bitfield shared between callbacks of one torrent session (verification
//! completion, "have" notifier). One writer at a time; readers never observe a
//! half-applied `set`.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bitfield::{BitfieldError, PieceBitfield};

/// Cloneable handle to one session's bitfield.
#[derive(Debug, Clone)]
pub struct SharedBitfield {
    inner: Arc<RwLock<PieceBitfield>>,
}

impl SharedBitfield {
    pub fn new(bitfield: PieceBitfield) -> Self {
        Self {
            inner: Arc::new(RwLock::new(bitfield)),
        }
    }

    pub fn has(&self, index: usize) -> Result<bool, BitfieldError> {
        self.inner.read().has(index)
    }

    /// See [`PieceBitfield::set`]. Exactly one concurrent caller sees `true`
    /// for a given piece.
    pub fn set(&self, index: usize) -> Result<bool, BitfieldError> {
        self.inner.write().set(index)
    }

    pub fn num_pieces(&self) -> usize {
        self.inner.read().num_pieces()
    }

    pub fn count(&self) -> usize {
        self.inner.read().count()
    }

    /// Consistent copy of the current payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.read().to_bytes()
    }

    /// Consistent copy of the whole bitfield.
    pub fn snapshot(&self) -> PieceBitfield {
        self.inner.read().clone()
    }
}

impl From<PieceBitfield> for SharedBitfield {
    fn from(bitfield: PieceBitfield) -> Self {
        Self::new(bitfield)
    }
}
