//! Phase B, re-matching the continuation syntax of each already-open
//! container block, one per `scan` call, before any new block can open on
//! this line.

use crate::block::Block;
use crate::lexer::Lexer;
use crate::phase::opener;
use crate::state::ScannerState;
use crate::token::{TokenId, ValidSymbols};

fn rest_of_line_is_blank(lexer: &dyn Lexer) -> bool {
    let mut i = 0;
    loop {
        let b = lexer.peek_ahead(i);
        if b == 0 || crate::byte::is_line_ending(b) {
            return true;
        }
        if !crate::byte::is_space_or_tab(b) {
            return false;
        }
        i += 1;
    }
}

/// Outcome of matching a single `ListItem` against the current line.
enum ListItemMatch {
    /// The item's continuation syntax held; emit this token.
    Token(TokenId),
    /// A blank line continues every open list item, but is not itself any
    /// one item's token. `matched` has already been advanced past this
    /// item, so the caller keeps walking the stack.
    BlankSkip,
    /// Neither held; the caller falls back to lazy continuation or closes
    /// the stack down to (and including) this block.
    NoMatch,
}

/// Re-match the block at `state.prefix_idx()` against the current line,
/// walking further down the stack in the same call when a blank line keeps
/// skipping past open list items rather than returning a separate zero-width
/// token per level.
///
/// Returns `Some(token)` on a successful continuation or close. Returns
/// `None` either when the block's continuation syntax doesn't hold (the
/// caller is then responsible for the lazy-continuation check and, failing
/// that, popping the block and emitting `BlockClose`/`BlockCloseLoose`), or
/// when a run of blank-line skips has walked `matched` past the whole
/// stack, in which case `state.phase()` now reads `Opening` and the caller
/// should dispatch there directly instead of treating this as a mismatch.
pub fn match_prefix(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    loop {
        let idx = state.prefix_idx();
        let block = *state.open_blocks.get(idx)?;

        match block {
            Block::BlockQuote => return match_block_quote(lexer, state, valid),
            Block::IndentedCodeBlock => return match_indented_code(lexer, state),
            Block::ListItem { content_indent, .. } => match match_list_item(lexer, state, content_indent) {
                ListItemMatch::Token(token) => return Some(token),
                ListItemMatch::BlankSkip => continue,
                ListItemMatch::NoMatch => return None,
            },
            Block::FencedCode { fence, fence_len } => return match_fenced_code(lexer, state, fence, fence_len, valid),
        }
    }
}

fn match_block_quote(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    if state.indentation > 3 || lexer.peek_ahead(0) != b'>' {
        return None;
    }
    if !valid.is_valid(TokenId::BlockContinuation) {
        return None;
    }
    crate::column::advance(lexer, state, false);
    if crate::byte::is_space_or_tab(lexer.lookahead()) {
        crate::column::advance(lexer, state, false);
    }
    state.indentation = 0;
    state.advance_matched(1);
    lexer.mark_end();
    Some(TokenId::BlockContinuation)
}

fn match_indented_code(lexer: &mut dyn Lexer, state: &mut ScannerState) -> Option<TokenId> {
    if state.indentation < 4 || rest_of_line_is_blank(lexer) {
        return None;
    }
    // The 4 columns were already consumed as leading whitespace by the
    // shared `Indentation` preamble; this just reclassifies them as the
    // block's own prefix rather than further nested indentation.
    state.indentation -= 4;
    state.advance_matched(2);
    lexer.mark_end();
    Some(TokenId::BlockContinuation)
}

fn match_list_item(lexer: &mut dyn Lexer, state: &mut ScannerState, content_indent: u8) -> ListItemMatch {
    if state.indentation >= content_indent as u16 {
        state.indentation -= content_indent as u16;
        state.advance_matched(1);
        lexer.mark_end();
        return ListItemMatch::Token(TokenId::BlockContinuation);
    }
    if rest_of_line_is_blank(lexer) {
        state.indentation = 0;
        state.advance_matched(1);
        return ListItemMatch::BlankSkip;
    }
    ListItemMatch::NoMatch
}

fn match_fenced_code(
    lexer: &mut dyn Lexer,
    state: &mut ScannerState,
    fence: crate::block::FenceKind,
    fence_len: u8,
    valid: ValidSymbols,
) -> Option<TokenId> {
    if let Some(token) = opener::try_close_fence(lexer, state, fence, fence_len, valid) {
        state.open_blocks.pop();
        state.advance_matched(1);
        return Some(token);
    }
    state.indentation = 0;
    state.advance_matched(2);
    lexer.mark_end();
    Some(TokenId::BlockContinuation)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::StrLexer;
    use crate::state::Phase;

    fn all_valid() -> ValidSymbols {
        ValidSymbols::all()
    }

    #[test]
    fn block_quote_continues_on_matching_marker() {
        let mut lexer = StrLexer::new("> b\n");
        let mut state = ScannerState::new();
        state.open_blocks.push(Block::BlockQuote);
        assert_eq!(
            match_prefix(&mut lexer, &mut state, all_valid()),
            Some(TokenId::BlockContinuation)
        );
        assert_eq!(lexer.position(), 2);
    }

    #[test]
    fn block_quote_fails_without_marker() {
        let mut lexer = StrLexer::new("b\n");
        let mut state = ScannerState::new();
        state.open_blocks.push(Block::BlockQuote);
        assert_eq!(match_prefix(&mut lexer, &mut state, all_valid()), None);
    }

    #[test]
    fn list_item_continues_when_indent_matches() {
        let mut lexer = StrLexer::new("item 2\n");
        let mut state = ScannerState::new();
        state.indentation = 2;
        state.open_blocks.push(Block::list_item(2));
        assert_eq!(
            match_prefix(&mut lexer, &mut state, all_valid()),
            Some(TokenId::BlockContinuation)
        );
        assert_eq!(state.indentation, 0);
    }

    #[test]
    fn blank_line_under_a_list_item_walks_straight_to_opening_with_no_token() {
        let mut lexer = StrLexer::new("\n");
        let mut state = ScannerState::new();
        state.indentation = 0;
        state.open_blocks.push(Block::list_item(4));
        assert_eq!(match_prefix(&mut lexer, &mut state, all_valid()), None);
        assert_eq!(state.phase(), Phase::Opening);
    }

    #[test]
    fn blank_line_skips_past_nested_list_items_in_one_call() {
        let mut lexer = StrLexer::new("\n");
        let mut state = ScannerState::new();
        state.indentation = 0;
        state.open_blocks.push(Block::list_item(2));
        state.open_blocks.push(Block::list_item(4));
        assert_eq!(match_prefix(&mut lexer, &mut state, all_valid()), None);
        assert_eq!(state.phase(), Phase::Opening);
    }

    #[test]
    fn fenced_code_closes_on_matching_fence() {
        let mut lexer = StrLexer::new("```\n");
        let mut state = ScannerState::new();
        state
            .open_blocks
            .push(Block::FencedCode { fence: crate::block::FenceKind::Backtick, fence_len: 3 });
        assert_eq!(
            match_prefix(&mut lexer, &mut state, all_valid()),
            Some(TokenId::BlockClose)
        );
    }

    #[test]
    fn fenced_code_continues_as_literal_line_otherwise() {
        let mut lexer = StrLexer::new("code\n");
        let mut state = ScannerState::new();
        state
            .open_blocks
            .push(Block::FencedCode { fence: crate::block::FenceKind::Backtick, fence_len: 3 });
        assert_eq!(
            match_prefix(&mut lexer, &mut state, all_valid()),
            Some(TokenId::BlockContinuation)
        );
    }
}
