use std::os::raw::c_int;
use std::ptr;

use peer_helper_core::ffi::*;
use peer_helper_core::PeerDescriptor;

#[test]
fn abi_version_and_init() {
    assert_eq!(peer_helper_abi_version(), ABI_VERSION);
    assert_eq!(peer_helper_init(), 0);
    assert_eq!(peer_helper_init(), 0);
}

#[test]
fn decode_peers_into_host_array() {
    let bytes = [192, 168, 1, 1, 0x1A, 0xE1, 10, 0, 0, 7, 0x00, 0x50];
    let mut out = [PeerDescriptor::new([0; 4], 0); 4];
    let n = peer_helper_decode_peers(bytes.as_ptr(), bytes.len(), out.as_mut_ptr(), out.len());
    assert_eq!(n, 2);
    assert_eq!(out[0], PeerDescriptor::new([192, 168, 1, 1], 6881));
    assert_eq!(out[1], PeerDescriptor::new([10, 0, 0, 7], 80));
}

#[test]
fn decode_peers_errors() {
    let bytes = [1u8, 2, 3, 4, 5];
    let mut out = [PeerDescriptor::new([0; 4], 0); 1];
    assert_eq!(
        peer_helper_decode_peers(bytes.as_ptr(), bytes.len(), out.as_mut_ptr(), 1),
        ErrorCode::MalformedInput.code()
    );

    let twelve = [0u8; 12];
    assert_eq!(
        peer_helper_decode_peers(twelve.as_ptr(), twelve.len(), out.as_mut_ptr(), 1),
        ErrorCode::BufferTooSmall.code()
    );
    assert_eq!(
        peer_helper_decode_peers(ptr::null(), 6, out.as_mut_ptr(), 1),
        ErrorCode::InvalidArgument.code()
    );
    assert_eq!(peer_helper_decode_peers(ptr::null(), 0, ptr::null_mut(), 0), 0);
}

#[test]
fn bitfield_lifecycle() {
    let h = peer_helper_bitfield_create(10);
    assert!(!h.is_null());
    assert_eq!(peer_helper_bitfield_len(h), 2);
    assert_eq!(peer_helper_bitfield_has(h, 3), 0);
    assert_eq!(peer_helper_bitfield_set(h, 3), 1);
    assert_eq!(peer_helper_bitfield_set(h, 3), 0);
    assert_eq!(peer_helper_bitfield_set(h, 9), 1);
    assert_eq!(peer_helper_bitfield_has(h, 3), 1);
    assert_eq!(peer_helper_bitfield_has(h, 10), ErrorCode::OutOfRange.code());
    assert_eq!(peer_helper_bitfield_set(h, 10), ErrorCode::OutOfRange.code());
    assert_eq!(peer_helper_bitfield_count(h), 2);

    let mut buf = [0u8; 2];
    assert_eq!(peer_helper_bitfield_to_bytes(h, buf.as_mut_ptr(), buf.len()), 2);
    assert_eq!(buf, [0b0001_0000, 0b0100_0000]);
    assert_eq!(
        peer_helper_bitfield_to_bytes(h, buf.as_mut_ptr(), 1),
        ErrorCode::BufferTooSmall.code()
    );
    peer_helper_bitfield_destroy(h);
}

#[test]
fn bitfield_from_indices_all_or_nothing() {
    let ok = [3u32, 3, 5];
    let mut err: c_int = -99;
    let h = peer_helper_bitfield_from_indices(ok.as_ptr(), ok.len(), 8, &mut err);
    assert!(!h.is_null());
    assert_eq!(err, 0);
    assert_eq!(peer_helper_bitfield_count(h), 2);
    peer_helper_bitfield_destroy(h);

    let bad = [1u32, 8];
    let h = peer_helper_bitfield_from_indices(bad.as_ptr(), bad.len(), 8, &mut err);
    assert!(h.is_null());
    assert_eq!(err, ErrorCode::OutOfRange.code());

    let h = peer_helper_bitfield_from_indices(ptr::null(), 2, 8, &mut err);
    assert!(h.is_null());
    assert_eq!(err, ErrorCode::InvalidArgument.code());

    // Error slot is optional.
    let h = peer_helper_bitfield_from_indices(bad.as_ptr(), bad.len(), 8, ptr::null_mut());
    assert!(h.is_null());
}

#[test]
fn bitfield_from_bytes_length_mismatch() {
    let bytes = [0xFFu8, 0xC0];
    let mut err: c_int = -99;
    let h = peer_helper_bitfield_from_bytes(bytes.as_ptr(), bytes.len(), 10, &mut err);
    assert!(!h.is_null());
    assert_eq!(err, 0);
    assert_eq!(peer_helper_bitfield_count(h), 10);
    peer_helper_bitfield_destroy(h);

    for (len, num_pieces) in [(1, 10), (2, 20), (2, 8)] {
        err = -99;
        let h = peer_helper_bitfield_from_bytes(bytes.as_ptr(), len, num_pieces, &mut err);
        assert!(h.is_null(), "len={len} num_pieces={num_pieces}");
        assert_eq!(err, ErrorCode::LengthMismatch.code());
    }
    assert!(peer_helper_bitfield_from_bytes(bytes.as_ptr(), 1, 10, ptr::null_mut()).is_null());
}

#[test]
fn too_small_output_is_left_untouched() {
    let bytes = [1u8, 2, 3, 4, 0, 80, 5, 6, 7, 8, 0, 81];
    let sentinel = PeerDescriptor::new([9; 4], 9);
    let mut out = [sentinel; 1];
    assert_eq!(
        peer_helper_decode_peers(bytes.as_ptr(), bytes.len(), out.as_mut_ptr(), out.len()),
        ErrorCode::BufferTooSmall.code()
    );
    assert_eq!(out, [sentinel]);

    let h = peer_helper_bitfield_create(16);
    peer_helper_bitfield_set(h, 0);
    let mut buf = [0xAAu8; 1];
    assert_eq!(
        peer_helper_bitfield_to_bytes(h, buf.as_mut_ptr(), buf.len()),
        ErrorCode::BufferTooSmall.code()
    );
    assert_eq!(buf, [0xAA]);
    peer_helper_bitfield_destroy(h);
}

#[test]
fn null_handles_are_rejected() {
    let null = ptr::null_mut();
    assert_eq!(peer_helper_bitfield_has(null, 0), ErrorCode::InvalidArgument.code());
    assert_eq!(peer_helper_bitfield_set(null, 0), ErrorCode::InvalidArgument.code());
    assert_eq!(peer_helper_bitfield_len(null), ErrorCode::InvalidArgument.code());
    assert_eq!(peer_helper_bitfield_count(null), ErrorCode::InvalidArgument.code());
    peer_helper_bitfield_destroy(null);
}
