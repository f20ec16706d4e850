//! ASCII byte classification used throughout the scanner.
//!
//! CommonMark's block and delimiter grammar is defined entirely in terms of
//! ASCII whitespace and punctuation; Unicode-aware classification is a
//! Non-goal here (see the crate root docs), so every predicate in this module
//! only ever inspects the low 128 values of a byte.

use lazy_static::lazy_static;

const WHITESPACE: &[u8] = b" \t";
const PUNCTUATION: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

lazy_static! {
    static ref IS_WHITESPACE: [bool; 128] = build_table(WHITESPACE);
    static ref IS_PUNCTUATION: [bool; 128] = build_table(PUNCTUATION);
}

fn build_table(bytes: &[u8]) -> [bool; 128] {
    let mut table = [false; 128];
    for &b in bytes {
        table[b as usize] = true;
    }
    table
}

/// True for the ASCII space and tab characters that make up inline
/// whitespace (line endings are handled separately, since they terminate a
/// line rather than separating tokens within one).
#[inline]
pub fn is_space_or_tab(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// True for `\n`, `\r`, and form feed, i.e. bytes that end a line.
#[inline]
pub fn is_line_ending(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r')
}

/// True for any of the 32 ASCII punctuation characters CommonMark's flanking
/// rules are defined over.
#[inline]
pub fn is_ascii_punctuation(byte: u8) -> bool {
    byte < 128 && IS_PUNCTUATION[byte as usize]
}

/// True for ASCII whitespace, including line endings, used for "does the
/// line end here or is there trailing trivia" checks.
#[inline]
pub fn is_ascii_whitespace(byte: u8) -> bool {
    (byte < 128 && IS_WHITESPACE[byte as usize]) || is_line_ending(byte)
}

#[inline]
pub fn is_ascii_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}
