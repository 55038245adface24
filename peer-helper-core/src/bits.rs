//! Bit addressing shared by the piece bitfield: MSB-first within each byte.

/// Bits per byte of a bitfield payload.
pub const BITS_PER_BYTE: usize = 8;

/// Mask selecting `bit_index` within a byte, most significant bit first.
/// `bit_mask(0) == 0b1000_0000`, `bit_mask(7) == 0b0000_0001`.
///
/// # Panics
///
/// Panics if `bit_index > 7`. Callers derive the index with `% 8`, so this only
/// fires on a programming error.
pub fn bit_mask(bit_index: usize) -> u8 {
    assert!(bit_index < BITS_PER_BYTE, "bit index {bit_index} out of range");
    0x80 >> bit_index
}

/// Split a piece index into (byte index, bit index).
pub fn locate(piece_index: usize) -> (usize, usize) {
    (piece_index / BITS_PER_BYTE, piece_index % BITS_PER_BYTE)
}

/// Number of bytes needed to hold `num_pieces` bits.
pub fn byte_len(num_pieces: usize) -> usize {
    num_pieces.div_ceil(BITS_PER_BYTE)
}

/// Mask of the pad bits in the last byte of a bitfield over `num_pieces`.
/// Zero when `num_pieces` is a multiple of 8 (no padding).
pub fn padding_mask(num_pieces: usize) -> u8 {
    match num_pieces % BITS_PER_BYTE {
        0 => 0,
        used => 0xFF >> used,
    }
}
