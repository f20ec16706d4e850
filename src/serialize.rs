//! Wire format for `Scanner::serialize`/`deserialize`: a fixed 7-byte header
//! of scalar counters followed by a variable-length encoding of the
//! open-block stack, all packed into the host's 255-byte buffer.

use crate::block::{Block, BlockStack, FenceKind, Looseness};
use crate::state::ScannerState;

const HEADER_LEN: usize = 7;
const MAX_LEN: usize = 255;

const TAG_BLOCK_QUOTE: u8 = 0;
const TAG_INDENTED_CODE: u8 = 1;
const TAG_FENCE_BACKTICK: u8 = 2;
const TAG_FENCE_TILDE: u8 = 3;
const TAG_LIST_TIGHT: u8 = 4;
const TAG_LIST_LOOSE: u8 = 5;

fn encode_block(block: &Block, out: &mut Vec<u8>) {
    match *block {
        Block::BlockQuote => out.push(TAG_BLOCK_QUOTE),
        Block::IndentedCodeBlock => out.push(TAG_INDENTED_CODE),
        Block::FencedCode { fence, fence_len } => {
            out.push(match fence {
                FenceKind::Backtick => TAG_FENCE_BACKTICK,
                FenceKind::Tilde => TAG_FENCE_TILDE,
            });
            out.push(fence_len);
        }
        Block::ListItem {
            looseness,
            content_indent,
        } => {
            out.push(match looseness {
                Looseness::Tight => TAG_LIST_TIGHT,
                Looseness::Loose => TAG_LIST_LOOSE,
            });
            out.push(content_indent);
        }
    }
}

/// Serialize `state` into `buffer`, returning the number of bytes written.
/// If the full stack wouldn't fit, the tail of the stack (the most deeply
/// nested, least-recently-opened-relative blocks) is silently dropped rather
/// than overflowing. An incremental reparse that needs those bytes will
/// simply re-derive them from source on its next full scan.
pub fn serialize(state: &ScannerState, buffer: &mut [u8; MAX_LEN]) -> usize {
    buffer[0] = state.matched_raw();
    buffer[1] = state.indentation.min(u8::MAX as u16) as u8;
    buffer[2] = state.column.min(u8::MAX as u16) as u8;
    buffer[3] = state.code_span_delimiter_len;
    buffer[4] = state.num_emphasis_delimiters;
    buffer[5] = state.num_emphasis_delimiters_left;
    buffer[6] = state.emphasis_delimiters_is_open as u8;

    let mut encoded = Vec::new();
    for block in state.open_blocks.iter() {
        let before = encoded.len();
        encode_block(block, &mut encoded);
        if HEADER_LEN + encoded.len() > MAX_LEN {
            encoded.truncate(before);
            break;
        }
    }

    let len = HEADER_LEN + encoded.len();
    buffer[HEADER_LEN..len].copy_from_slice(&encoded);
    len
}

/// Populate `state` from a previously-serialized buffer. An empty buffer
/// resets to fresh state (tree-sitter's convention for "no prior state"). A
/// corrupt or truncated buffer is handled by saturating unreadable tags to a
/// known one and stopping, never by panicking: this scanner has no error
/// return, and a bad incremental-reparse image must degrade instead of
/// aborting the host process.
pub fn deserialize(state: &mut ScannerState, buffer: &[u8]) {
    if buffer.is_empty() {
        state.reset();
        return;
    }

    state.set_matched_raw(buffer[0]);
    state.indentation = *buffer.get(1).unwrap_or(&0) as u16;
    state.column = *buffer.get(2).unwrap_or(&0) as u16;
    state.code_span_delimiter_len = *buffer.get(3).unwrap_or(&0);
    state.num_emphasis_delimiters = *buffer.get(4).unwrap_or(&0);
    state.num_emphasis_delimiters_left = *buffer.get(5).unwrap_or(&0);
    state.emphasis_delimiters_is_open = buffer.get(6).map(|&b| b != 0).unwrap_or(false);

    let mut blocks = BlockStack::new();
    let mut i = HEADER_LEN;
    while i < buffer.len() {
        match buffer[i] {
            TAG_BLOCK_QUOTE => {
                blocks.push(Block::BlockQuote);
                i += 1;
            }
            TAG_INDENTED_CODE => {
                blocks.push(Block::IndentedCodeBlock);
                i += 1;
            }
            TAG_FENCE_BACKTICK | TAG_FENCE_TILDE => {
                let Some(&fence_len) = buffer.get(i + 1) else {
                    break;
                };
                let fence = if buffer[i] == TAG_FENCE_BACKTICK {
                    FenceKind::Backtick
                } else {
                    FenceKind::Tilde
                };
                blocks.push(Block::FencedCode { fence, fence_len });
                i += 2;
            }
            TAG_LIST_TIGHT | TAG_LIST_LOOSE => {
                let Some(&content_indent) = buffer.get(i + 1) else {
                    break;
                };
                let content_indent = content_indent.clamp(2, 8);
                let mut item = Block::list_item(content_indent);
                if buffer[i] == TAG_LIST_LOOSE {
                    if let Block::ListItem { looseness, .. } = &mut item {
                        *looseness = Looseness::Loose;
                    }
                }
                blocks.push(item);
                i += 2;
            }
            // Unknown tag: saturate to an empty stack rather than
            // misinterpreting the remaining bytes as further tags.
            _ => break,
        }
    }
    state.open_blocks = blocks;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::block::Block;

    #[test]
    fn round_trips_header_and_stack() {
        let mut state = ScannerState::new();
        state.set_matched_raw(3);
        state.indentation = 2;
        state.column = 9;
        state.code_span_delimiter_len = 2;
        state.open_blocks.push(Block::BlockQuote);
        state.open_blocks.push(Block::list_item(4));
        state
            .open_blocks
            .push(Block::FencedCode { fence: FenceKind::Tilde, fence_len: 3 });

        let mut buffer = [0u8; MAX_LEN];
        let len = serialize(&state, &mut buffer);

        let mut restored = ScannerState::new();
        deserialize(&mut restored, &buffer[..len]);

        assert_eq!(restored.matched_raw(), 3);
        assert_eq!(restored.indentation, 2);
        assert_eq!(restored.column, 9);
        assert_eq!(restored.code_span_delimiter_len, 2);
        assert_eq!(restored.open_blocks.len(), 3);
        assert_eq!(restored.open_blocks.get(0), Some(&Block::BlockQuote));
    }

    #[test]
    fn empty_buffer_resets_state() {
        let mut state = ScannerState::new();
        state.set_matched_raw(7);
        state.open_blocks.push(Block::BlockQuote);
        deserialize(&mut state, &[]);
        assert_eq!(state.matched_raw(), 0);
        assert!(state.open_blocks.is_empty());
    }

    #[test]
    fn unknown_tag_byte_truncates_rather_than_panics() {
        let mut state = ScannerState::new();
        let buffer = [0u8, 0, 0, 0, 0, 0, 0, 200];
        deserialize(&mut state, &buffer);
        assert!(state.open_blocks.is_empty());
    }

    #[test]
    fn oversized_stack_is_truncated_not_overflowed() {
        let mut state = ScannerState::new();
        for _ in 0..200 {
            state.open_blocks.push(Block::BlockQuote);
        }
        let mut buffer = [0u8; MAX_LEN];
        let len = serialize(&state, &mut buffer);
        assert!(len <= MAX_LEN);
    }
}
