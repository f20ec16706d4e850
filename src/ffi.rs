//! `extern "C"` bindings matching the five-entry-point ABI a generated
//! tree-sitter-style parser links against. Kept to pointer plumbing only.
//! Everything with actual logic lives in [`crate::scanner::Scanner`].
//!
//! The lexer driver interface itself (the concrete layout of `TSLexer`) is
//! out of scope. `RawLexer` below is the minimal shape this crate needs from
//! it; a real build links it against the generated parser's actual struct
//! instead.

use std::os::raw::{c_void, c_char};

use crate::lexer::Lexer;
use crate::scanner::Scanner;
use crate::token::{TokenId, ValidSymbols};

/// C layout of the host lexer, matching tree-sitter's `TSLexer`.
#[repr(C)]
pub struct RawLexer {
    pub lookahead: i32,
    pub result_symbol: i32,
    pub advance: unsafe extern "C" fn(*mut RawLexer, bool),
    pub mark_end: unsafe extern "C" fn(*mut RawLexer),
    pub get_column: unsafe extern "C" fn(*mut RawLexer) -> u32,
    pub is_at_included_range_start: unsafe extern "C" fn(*mut RawLexer) -> bool,
    pub eof: unsafe extern "C" fn(*mut RawLexer) -> bool,
}

/// Adapts a raw `*mut RawLexer` to the safe [`Lexer`] trait. Does not
/// implement `peek_ahead` losslessly: the real `TSLexer` has no such
/// primitive (see the trait's doc comment), so this falls back to treating
/// anything beyond the immediate lookahead byte as unknown (`0`), which is
/// sound but more conservative than the in-memory `StrLexer` tests use.
struct HostLexer {
    raw: *mut RawLexer,
}

impl Lexer for HostLexer {
    fn lookahead(&self) -> u8 {
        unsafe { (*self.raw).lookahead as u8 }
    }

    fn advance(&mut self, skip: bool) {
        unsafe {
            let advance_fn = (*self.raw).advance;
            advance_fn(self.raw, skip);
        }
    }

    fn mark_end(&mut self) {
        unsafe {
            let mark_end_fn = (*self.raw).mark_end;
            mark_end_fn(self.raw);
        }
    }

    fn eof(&self) -> bool {
        unsafe {
            let eof_fn = (*self.raw).eof;
            eof_fn(self.raw)
        }
    }

    fn set_result_symbol(&mut self, symbol: TokenId) {
        unsafe {
            (*self.raw).result_symbol = symbol as i32;
        }
    }

    fn peek_ahead(&self, offset: usize) -> u8 {
        if offset == 0 {
            self.lookahead()
        } else {
            0
        }
    }
}

/// # Safety
/// Returns an opaque, owned pointer the host must eventually pass to
/// [`markdown_scanner_destroy`] exactly once.
#[no_mangle]
pub unsafe extern "C" fn markdown_scanner_create() -> *mut c_void {
    Box::into_raw(Box::new(Scanner::new())) as *mut c_void
}

/// # Safety
/// `handle` must be a live pointer from [`markdown_scanner_create`]. `lexer`
/// must be a valid `TSLexer`-shaped pointer the host owns for the duration
/// of the call. `valid_symbols` must point to `len` readable `bool`s indexed
/// by the token's discriminant order.
#[no_mangle]
pub unsafe extern "C" fn markdown_scanner_scan(
    handle: *mut c_void,
    lexer: *mut RawLexer,
    valid_symbols: *const bool,
    len: usize,
) -> bool {
    let scanner = &mut *(handle as *mut Scanner);
    let flags = std::slice::from_raw_parts(valid_symbols, len);
    let mask = ValidSymbols::from_flags(flags);
    let mut host_lexer = HostLexer { raw: lexer };
    scanner.scan(&mut host_lexer, mask)
}

/// # Safety
/// `handle` must be live; `buffer` must point to at least 255 writable
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn markdown_scanner_serialize(handle: *mut c_void, buffer: *mut c_char) -> u32 {
    let scanner = &*(handle as *const Scanner);
    let mut out = [0u8; 255];
    let len = scanner.serialize(&mut out);
    std::ptr::copy_nonoverlapping(out.as_ptr(), buffer as *mut u8, len);
    len as u32
}

/// # Safety
/// `handle` must be live; `buffer` must point to at least `len` readable
/// bytes.
#[no_mangle]
pub unsafe extern "C" fn markdown_scanner_deserialize(handle: *mut c_void, buffer: *const c_char, len: u32) {
    let scanner = &mut *(handle as *mut Scanner);
    let bytes = std::slice::from_raw_parts(buffer as *const u8, len as usize);
    scanner.deserialize(bytes);
}

/// # Safety
/// `handle` must be a live pointer from [`markdown_scanner_create`] not
/// already destroyed.
#[no_mangle]
pub unsafe extern "C" fn markdown_scanner_destroy(handle: *mut c_void) {
    drop(Box::from_raw(handle as *mut Scanner));
}
