//! C ABI for loading peer-helper-core from the host VM's native-function loader.
//! Return codes: >= 0 success, negative values are [`ErrorCode`]s.

use std::ffi::c_void;
use std::os::raw::c_int;
use std::slice;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::bitfield::{BitfieldError, PieceBitfield};
use crate::compact::{self, CompactPeerError, PeerDescriptor};
use crate::config::{self, Config};
use crate::logging;

/// Bumped whenever a signature or return-code meaning below changes.
pub const ABI_VERSION: u8 = 2;

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Negative return codes shared by every entry point.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument = -1,
    MalformedInput = -2,
    OutOfRange = -3,
    LengthMismatch = -4,
    DirtyPadding = -5,
    BufferTooSmall = -6,
}

impl ErrorCode {
    pub fn code(self) -> c_int {
        self as c_int
    }
}

impl From<&BitfieldError> for ErrorCode {
    fn from(e: &BitfieldError) -> Self {
        match e {
            BitfieldError::OutOfRange { .. } => ErrorCode::OutOfRange,
            BitfieldError::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            BitfieldError::DirtyPadding { .. } => ErrorCode::DirtyPadding,
        }
    }
}

impl From<&CompactPeerError> for ErrorCode {
    fn from(e: &CompactPeerError) -> Self {
        match e {
            CompactPeerError::MalformedInput { .. } => ErrorCode::MalformedInput,
        }
    }
}

type Handle = RwLock<PieceBitfield>;

fn strict_padding() -> bool {
    CONFIG.get().map(|c| c.strict_padding).unwrap_or(false)
}

fn into_handle(bitfield: PieceBitfield) -> *mut c_void {
    Box::into_raw(Box::new(RwLock::new(bitfield))) as *mut c_void
}

/// Borrow the lock behind a handle. Null yields None.
fn handle<'a>(h: *mut c_void) -> Option<&'a Handle> {
    if h.is_null() {
        return None;
    }
    Some(unsafe { &*(h as *const Handle) })
}

/// Borrow `len` bytes at `ptr`. Null is accepted only for an empty slice.
fn input<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        let empty: &[T] = &[];
        return Some(empty);
    }
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { slice::from_raw_parts(ptr, len) })
}

fn clamp_count(n: usize) -> c_int {
    c_int::try_from(n).unwrap_or(ErrorCode::BufferTooSmall.code())
}

/// Store `code` through `out_err` unless it is null.
fn report(out_err: *mut c_int, code: c_int) {
    if !out_err.is_null() {
        unsafe {
            *out_err = code;
        }
    }
}

/// Returns the ABI version. Hosts check this before binding the other symbols.
#[no_mangle]
pub extern "C" fn peer_helper_abi_version() -> u8 {
    ABI_VERSION
}

/// Load config and install logging. Safe to call more than once; only the
/// first call takes effect. Returns 0.
#[no_mangle]
pub extern "C" fn peer_helper_init() -> c_int {
    let mut load_error = None;
    let cfg = CONFIG.get_or_init(|| {
        let (cfg, err) = config::load();
        load_error = err;
        cfg
    });
    let installed = logging::init_tracing(&cfg.log_level);
    if let Some(e) = load_error {
        tracing::warn!("falling back to default config: {e:#}");
    }
    tracing::debug!(
        installed,
        strict_padding = cfg.strict_padding,
        abi = ABI_VERSION,
        "peer-helper initialised"
    );
    0
}

/// Decode a compact peer list into `out_peers` (capacity `out_cap` entries).
/// Returns the number of peers written, -2 if `len` is not a multiple of 6,
/// -6 if `out_cap` is too small (nothing is written in that case).
#[no_mangle]
pub extern "C" fn peer_helper_decode_peers(
    bytes: *const u8,
    len: usize,
    out_peers: *mut PeerDescriptor,
    out_cap: usize,
) -> c_int {
    let Some(data) = input(bytes, len) else {
        return ErrorCode::InvalidArgument.code();
    };
    let peers = match compact::decode_iter(data) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting compact peer list");
            return ErrorCode::from(&e).code();
        }
    };
    let n = peers.len();
    if n == 0 {
        return 0;
    }
    let Ok(count) = c_int::try_from(n) else {
        return ErrorCode::BufferTooSmall.code();
    };
    if out_peers.is_null() || out_cap < n {
        return ErrorCode::BufferTooSmall.code();
    }
    let out = unsafe { slice::from_raw_parts_mut(out_peers, n) };
    for (slot, peer) in out.iter_mut().zip(peers) {
        *slot = peer;
    }
    tracing::debug!(peers = n, "decoded compact peer list");
    count
}

/// Create an empty bitfield over `num_pieces`. Free with `peer_helper_bitfield_destroy`.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_create(num_pieces: u32) -> *mut c_void {
    into_handle(PieceBitfield::new(num_pieces as usize))
}

/// Create a bitfield with every listed index set. Returns null if `indices` is
/// null with non-zero `len` (-1), or if any index is out of range (-3); the
/// code goes to `out_err` when it is non-null, 0 on success.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_from_indices(
    indices: *const u32,
    len: usize,
    num_pieces: u32,
    out_err: *mut c_int,
) -> *mut c_void {
    let Some(list) = input(indices, len) else {
        report(out_err, ErrorCode::InvalidArgument.code());
        return std::ptr::null_mut();
    };
    match PieceBitfield::from_indices(list.iter().map(|&i| i as usize), num_pieces as usize) {
        Ok(bf) => {
            report(out_err, 0);
            into_handle(bf)
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejecting piece list");
            report(out_err, ErrorCode::from(&e).code());
            std::ptr::null_mut()
        }
    }
}

/// Create a bitfield from a received `bitfield` payload. Returns null on a
/// length mismatch (-4), or on set pad bits when `strict_padding` is
/// configured (-5); the code goes to `out_err` when it is non-null, 0 on success.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_from_bytes(
    bytes: *const u8,
    len: usize,
    num_pieces: u32,
    out_err: *mut c_int,
) -> *mut c_void {
    let Some(data) = input(bytes, len) else {
        report(out_err, ErrorCode::InvalidArgument.code());
        return std::ptr::null_mut();
    };
    let res = if strict_padding() {
        PieceBitfield::from_bytes_strict(data, num_pieces as usize)
    } else {
        PieceBitfield::from_bytes(data, num_pieces as usize)
    };
    match res {
        Ok(bf) => {
            report(out_err, 0);
            into_handle(bf)
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejecting bitfield payload");
            report(out_err, ErrorCode::from(&e).code());
            std::ptr::null_mut()
        }
    }
}

/// Destroy a bitfield handle. No-op if h is null.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_destroy(h: *mut c_void) {
    if h.is_null() {
        return;
    }
    let _ = unsafe { Box::from_raw(h as *mut Handle) };
}

/// Returns 1 if piece `index` is present, 0 if not, negative on error.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_has(h: *mut c_void, index: u32) -> c_int {
    let Some(lock) = handle(h) else {
        return ErrorCode::InvalidArgument.code();
    };
    match lock.read().has(index as usize) {
        Ok(present) => c_int::from(present),
        Err(e) => ErrorCode::from(&e).code(),
    }
}

/// Mark piece `index` present. Returns 1 if newly set (send "have"), 0 if it
/// was already set, negative on error.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_set(h: *mut c_void, index: u32) -> c_int {
    let Some(lock) = handle(h) else {
        return ErrorCode::InvalidArgument.code();
    };
    match lock.write().set(index as usize) {
        Ok(newly_set) => c_int::from(newly_set),
        Err(e) => {
            tracing::warn!(error = %e, "set rejected");
            ErrorCode::from(&e).code()
        }
    }
}

/// Payload length in bytes, i.e. the buffer size `peer_helper_bitfield_to_bytes` needs.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_len(h: *mut c_void) -> c_int {
    let Some(lock) = handle(h) else {
        return ErrorCode::InvalidArgument.code();
    };
    clamp_count(lock.read().byte_len())
}

/// Copy the payload to out_buf. Returns bytes written, -6 if out_buf_len is too
/// small (nothing is written in that case).
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_to_bytes(
    h: *mut c_void,
    out_buf: *mut u8,
    out_buf_len: usize,
) -> c_int {
    let Some(lock) = handle(h) else {
        return ErrorCode::InvalidArgument.code();
    };
    let bf = lock.read();
    let bytes = bf.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    let Ok(written) = c_int::try_from(bytes.len()) else {
        return ErrorCode::BufferTooSmall.code();
    };
    if out_buf.is_null() || out_buf_len < bytes.len() {
        return ErrorCode::BufferTooSmall.code();
    }
    unsafe {
        out_buf.copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
    }
    written
}

/// Number of pieces present.
#[no_mangle]
pub extern "C" fn peer_helper_bitfield_count(h: *mut c_void) -> c_int {
    let Some(lock) = handle(h) else {
        return ErrorCode::InvalidArgument.code();
    };
    clamp_count(lock.read().count())
}
