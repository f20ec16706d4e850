//! Phase C, recognizing the opening syntax of a *new* block at the current
//! line position.
//!
//! Every recognizer here is split into a pure `classify` step that only
//! reads through `Lexer::peek_ahead` (never `advance`, never touches
//! `ScannerState`) and a `commit` step that performs the actual consumption
//! and state mutation once a classification has been chosen. This is what
//! lets `probe_opens_block` answer "would some opener match here" for the
//! lazy-continuation check as a genuinely pure predicate, instead of
//! re-entering the scanner with a `check_block` flag that has to remember to
//! undo its own side effects.

use crate::block::{Block, FenceKind, Looseness};
use crate::lexer::Lexer;
use crate::state::ScannerState;
use crate::token::{TokenId, ValidSymbols};

/// The result of successfully classifying the bytes ahead of the cursor as
/// some block opener. Carries everything `commit` needs to know how many
/// bytes/columns to consume and what to push onto the block stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plan {
    BlankLine,
    BlockQuote {
        with_space: bool,
    },
    IndentedCode,
    FencedCodeOpen {
        fence: FenceKind,
        fence_len: u8,
        run: usize,
    },
    AtxHeading {
        level: u8,
        hashes: usize,
    },
    SetextH1 {
        len: usize,
    },
    SetextH2 {
        len: usize,
    },
    SetextH2OrThematic {
        len: usize,
    },
    ThematicBreak {
        len: usize,
    },
    ListMarker {
        token: TokenId,
        marker_bytes: usize,
        marker_width: u16,
        post_spaces: u16,
    },
}

fn peek_run(lexer: &dyn Lexer, byte: u8) -> usize {
    let mut n = 0;
    while lexer.peek_ahead(n) == byte {
        n += 1;
    }
    n
}

fn is_line_end_or_eof(lexer: &dyn Lexer, offset: usize) -> bool {
    let b = lexer.peek_ahead(offset);
    b == 0 || crate::byte::is_line_ending(b)
}

/// True if everything from `offset` to the end of the line is space/tab.
fn rest_of_line_is_blank(lexer: &dyn Lexer, offset: usize) -> bool {
    let mut i = offset;
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

/// Scan a CommonMark thematic-break/setext-style run of `byte`, allowing
/// interspersed spaces/tabs but nothing else, to the end of the line.
/// Returns `(dash_count, total_len)` if every byte to the end of the line is
/// either `byte` or whitespace, else `None`.
fn scan_break_run(lexer: &dyn Lexer, byte: u8) -> Option<(usize, usize)> {
    let mut i = 0;
    let mut count = 0;
    loop {
        let b = lexer.peek_ahead(i);
        if b == 0 || crate::byte::is_line_ending(b) {
            return Some((count, i));
        }
        if b == byte {
            count += 1;
        } else if !crate::byte::is_space_or_tab(b) {
            return None;
        }
        i += 1;
    }
}

/// A run of `byte` with no interspersed whitespace at all (used for setext
/// underlines, which may not have internal spaces between the marker
/// characters, only trailing ones).
fn scan_tight_run_then_trailing_ws(lexer: &dyn Lexer, byte: u8) -> Option<usize> {
    let count = peek_run(lexer, byte);
    if count == 0 {
        return None;
    }
    if rest_of_line_is_blank(lexer, count) {
        Some(count)
    } else {
        None
    }
}

fn classify_dash(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    // Setext H2: a tight run of `-` with only trailing whitespace after it.
    let setext_len = scan_tight_run_then_trailing_ws(lexer, b'-');
    // Thematic break: `-` and whitespace only, at least 3 dashes total.
    let thematic = scan_break_run(lexer, b'-').filter(|&(dashes, _)| dashes >= 3);

    match (setext_len, thematic) {
        (Some(len), Some((_, total))) if valid.is_valid(TokenId::SetextH2UnderlineOrThematicBreak) => {
            Some(Plan::SetextH2OrThematic { len: total.max(len) })
        }
        (Some(len), Some(_)) if valid.is_valid(TokenId::ThematicBreak) => {
            Some(Plan::ThematicBreak { len })
        }
        (Some(len), _) if valid.is_valid(TokenId::SetextH2Underline) => {
            Some(Plan::SetextH2 { len })
        }
        (_, Some((_, total))) if valid.is_valid(TokenId::ThematicBreak) => {
            Some(Plan::ThematicBreak { len: total })
        }
        _ => classify_dash_list_marker(lexer, valid),
    }
}

fn classify_dash_list_marker(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    if !valid.is_valid(TokenId::ListMarkerMinus) {
        return None;
    }
    if crate::byte::is_space_or_tab(lexer.peek_ahead(1)) || is_line_end_or_eof(lexer, 1) {
        Some(list_marker_plan(
            TokenId::ListMarkerMinus,
            1,
            lexer,
            1,
        ))
    } else {
        None
    }
}

fn classify_star(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    let thematic = scan_break_run(lexer, b'*').filter(|&(stars, _)| stars >= 3);
    if let Some((_, len)) = thematic {
        if valid.is_valid(TokenId::ThematicBreak) {
            return Some(Plan::ThematicBreak { len });
        }
    }
    if !valid.is_valid(TokenId::ListMarkerStar) {
        return None;
    }
    if crate::byte::is_space_or_tab(lexer.peek_ahead(1)) || is_line_end_or_eof(lexer, 1) {
        Some(list_marker_plan(TokenId::ListMarkerStar, 1, lexer, 1))
    } else {
        None
    }
}

fn classify_underscore(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    if !valid.is_valid(TokenId::ThematicBreak) {
        return None;
    }
    let (underscores, len) = scan_break_run(lexer, b'_')?;
    if underscores >= 3 {
        Some(Plan::ThematicBreak { len })
    } else {
        None
    }
}

fn classify_plus(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    if !valid.is_valid(TokenId::ListMarkerPlus) {
        return None;
    }
    if crate::byte::is_space_or_tab(lexer.peek_ahead(1)) || is_line_end_or_eof(lexer, 1) {
        Some(list_marker_plan(TokenId::ListMarkerPlus, 1, lexer, 1))
    } else {
        None
    }
}

fn classify_ordered(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    let mut digits = 0;
    while digits < 9 && crate::byte::is_ascii_digit(lexer.peek_ahead(digits)) {
        digits += 1;
    }
    if digits == 0 {
        return None;
    }
    let delim = lexer.peek_ahead(digits);
    let token = match delim {
        b'.' if valid.is_valid(TokenId::ListMarkerDot) => TokenId::ListMarkerDot,
        b')' if valid.is_valid(TokenId::ListMarkerParenthesis) => TokenId::ListMarkerParenthesis,
        _ => return None,
    };
    let after = digits + 1;
    if !(crate::byte::is_space_or_tab(lexer.peek_ahead(after)) || is_line_end_or_eof(lexer, after)) {
        return None;
    }
    Some(list_marker_plan(token, digits + 1, lexer, after))
}

fn list_marker_plan(token: TokenId, marker_bytes: usize, lexer: &dyn Lexer, after: usize) -> Plan {
    let mut spaces = 0usize;
    while crate::byte::is_space_or_tab(lexer.peek_ahead(after + spaces)) {
        spaces += 1;
    }
    Plan::ListMarker {
        token,
        marker_bytes,
        marker_width: marker_bytes as u16,
        post_spaces: spaces as u16,
    }
}

fn classify_fence(lexer: &dyn Lexer, byte: u8, valid: ValidSymbols) -> Option<Plan> {
    if !valid.is_valid(TokenId::FencedCodeBlockStart) {
        return None;
    }
    let run = peek_run(lexer, byte);
    if run < 3 {
        return None;
    }
    let fence = if byte == b'`' {
        // Approximation preserved from the source this scanner is grounded
        // on: a backtick fence's info string is only recognized when empty
        // (immediate line end). CommonMark permits arbitrary info text
        // containing no backticks; see DESIGN.md.
        if !is_line_end_or_eof(lexer, run) {
            return None;
        }
        FenceKind::Backtick
    } else {
        FenceKind::Tilde
    };
    Some(Plan::FencedCodeOpen {
        fence,
        fence_len: run.min(255) as u8,
        run,
    })
}

fn classify_atx(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    let hashes = peek_run(lexer, b'#');
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let next = lexer.peek_ahead(hashes);
    if !(crate::byte::is_space_or_tab(next) || is_line_end_or_eof(lexer, hashes)) {
        return None;
    }
    let level = hashes as u8;
    if !valid.is_valid(TokenId::atx_heading(level)) {
        return None;
    }
    Some(Plan::AtxHeading { level, hashes })
}

fn classify_setext_h1(lexer: &dyn Lexer, valid: ValidSymbols) -> Option<Plan> {
    if !valid.is_valid(TokenId::SetextH1Underline) {
        return None;
    }
    scan_tight_run_then_trailing_ws(lexer, b'=').map(|len| Plan::SetextH1 { len })
}

fn classify_indented_code(lexer: &dyn Lexer, state: &ScannerState, valid: ValidSymbols) -> Option<Plan> {
    if state.indentation < 4 {
        return None;
    }
    if valid.is_valid(TokenId::LazyContinuation) {
        // An indented code block can never interrupt a paragraph.
        return None;
    }
    if rest_of_line_is_blank(lexer, 0) {
        return None;
    }
    Some(Plan::IndentedCode)
}

fn classify_block_quote(lexer: &dyn Lexer, state: &ScannerState, valid: ValidSymbols) -> Option<Plan> {
    if state.indentation > 3 || !valid.is_valid(TokenId::BlockQuoteStart) {
        return None;
    }
    if lexer.peek_ahead(0) != b'>' {
        return None;
    }
    Some(Plan::BlockQuote {
        with_space: crate::byte::is_space_or_tab(lexer.peek_ahead(1)),
    })
}

/// Classify the bytes ahead of the cursor as a block opener, without
/// consuming anything or mutating `state`. This is the function both
/// `open_block` (which commits the classification) and `probe_opens_block`
/// (the lazy-continuation predicate) are built on.
fn classify(lexer: &dyn Lexer, state: &ScannerState, valid: ValidSymbols) -> Option<Plan> {
    let byte = lexer.peek_ahead(0);

    if crate::byte::is_line_ending(byte) && valid.is_valid(TokenId::BlankLine) {
        return Some(Plan::BlankLine);
    }

    if let Some(plan) = classify_block_quote(lexer, state, valid) {
        return Some(plan);
    }

    if state.indentation >= 4 {
        return classify_indented_code(lexer, state, valid);
    }

    match byte {
        b'`' | b'~' => classify_fence(lexer, byte, valid),
        b'#' => classify_atx(lexer, valid),
        b'=' => classify_setext_h1(lexer, valid),
        b'-' => classify_dash(lexer, valid),
        b'*' => classify_star(lexer, valid),
        b'_' => classify_underscore(lexer, valid),
        b'+' => classify_plus(lexer, valid),
        b'0'..=b'9' => classify_ordered(lexer, valid),
        _ => None,
    }
}

fn consume_columns(lexer: &mut dyn Lexer, state: &mut ScannerState, n: usize) {
    for _ in 0..n {
        crate::column::advance(lexer, state, false);
    }
}

fn commit(lexer: &mut dyn Lexer, state: &mut ScannerState, plan: Plan) -> TokenId {
    let carried_looseness = state.take_carried_looseness();
    match plan {
        Plan::BlankLine => {
            state.open_blocks.loosen_all_list_items();
            state.advance_matched(1);
            TokenId::BlankLine
        }
        Plan::BlockQuote { with_space } => {
            consume_columns(lexer, state, 1 + with_space as usize);
            state.indentation = 0;
            state.open_blocks.push(Block::BlockQuote);
            state.advance_matched(2);
            lexer.mark_end();
            TokenId::BlockQuoteStart
        }
        Plan::IndentedCode => {
            state.indentation -= 4;
            state.open_blocks.push(Block::IndentedCodeBlock);
            state.advance_matched(2);
            lexer.mark_end();
            TokenId::IndentedChunkStart
        }
        Plan::FencedCodeOpen { fence, fence_len, run } => {
            consume_columns(lexer, state, run);
            state.indentation = 0;
            state
                .open_blocks
                .push(Block::FencedCode { fence, fence_len });
            state.advance_matched(2);
            lexer.mark_end();
            TokenId::FencedCodeBlockStart
        }
        Plan::AtxHeading { level, hashes } => {
            consume_columns(lexer, state, hashes);
            state.advance_matched(1);
            lexer.mark_end();
            TokenId::atx_heading(level)
        }
        Plan::SetextH1 { len } => {
            consume_columns(lexer, state, len);
            state.advance_matched(1);
            lexer.mark_end();
            TokenId::SetextH1Underline
        }
        Plan::SetextH2 { len } => {
            consume_columns(lexer, state, len);
            state.advance_matched(1);
            lexer.mark_end();
            TokenId::SetextH2Underline
        }
        Plan::SetextH2OrThematic { len } => {
            consume_columns(lexer, state, len);
            state.advance_matched(1);
            lexer.mark_end();
            TokenId::SetextH2UnderlineOrThematicBreak
        }
        Plan::ThematicBreak { len } => {
            consume_columns(lexer, state, len);
            state.advance_matched(1);
            lexer.mark_end();
            TokenId::ThematicBreak
        }
        Plan::ListMarker {
            token,
            marker_bytes,
            marker_width,
            post_spaces,
        } => {
            // CommonMark: 1-4 spaces after the marker all count toward its
            // content indent. 5+ spaces is itself an indented code block, so
            // only one space is consumed here and the rest is pushed back
            // into `indentation` for the opener dispatch that runs next.
            let consumed_spaces = if post_spaces > 4 { 1 } else { post_spaces };
            consume_columns(lexer, state, marker_bytes + consumed_spaces as usize);
            let content_indent =
                (state.indentation + marker_width + consumed_spaces).clamp(2, 8) as u8;
            state.indentation = if post_spaces > 4 { post_spaces - 1 } else { 0 };
            let looseness = if carried_looseness { Looseness::Loose } else { Looseness::Tight };
            state
                .open_blocks
                .push(Block::list_item_with_looseness(content_indent, looseness));
            state.advance_matched(2);
            lexer.mark_end();
            token
        }
    }
}

/// Phase C entry point: try to recognize and open a new block at the
/// current cursor position, mutating `state` and advancing `lexer` on
/// success.
pub fn open_block(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    let plan = classify(lexer, state, valid)?;
    Some(commit(lexer, state, plan))
}

/// Read-only predicate: would `open_block` succeed here? Used by the
/// line-prefix matcher's lazy-continuation check, which must not advance the
/// lexer or mutate state just to decide whether to emit `LazyContinuation`.
pub fn probe_opens_block(lexer: &dyn Lexer, state: &ScannerState, valid: ValidSymbols) -> bool {
    classify(lexer, state, valid).is_some()
}

/// Phase B helper: while the top of stack is `FencedCode`, check whether the
/// current line closes it. Returns the token to emit (always `BlockClose`,
/// gated by `valid` like every other token this scanner hands back) if so,
/// without popping the stack; the caller pops after committing.
pub fn try_close_fence(
    lexer: &mut dyn Lexer,
    state: &mut ScannerState,
    fence: FenceKind,
    fence_len: u8,
    valid: ValidSymbols,
) -> Option<TokenId> {
    if state.indentation > 3 || !valid.is_valid(TokenId::BlockClose) {
        return None;
    }
    let expected = match fence {
        FenceKind::Backtick => b'`',
        FenceKind::Tilde => b'~',
    };
    if lexer.peek_ahead(0) != expected {
        return None;
    }
    let run = peek_run(lexer, expected);
    if run < fence_len as usize {
        return None;
    }
    if !rest_of_line_is_blank(lexer, run) {
        return None;
    }
    consume_columns(lexer, state, run);
    lexer.mark_end();
    Some(TokenId::BlockClose)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::StrLexer;

    fn scan_open(text: &str, valid: ValidSymbols) -> Option<TokenId> {
        let mut lexer = StrLexer::new(text);
        let mut state = ScannerState::new();
        open_block(&mut lexer, &mut state, valid)
    }

    fn all_valid() -> ValidSymbols {
        ValidSymbols::all()
    }

    #[test]
    fn recognizes_atx_heading() {
        assert_eq!(scan_open("# hi", all_valid()), Some(TokenId::AtxH1Marker));
        assert_eq!(
            scan_open("###### hi", all_valid()),
            Some(TokenId::AtxH6Marker)
        );
        assert_eq!(scan_open("####### hi", all_valid()), None);
    }

    #[test]
    fn atx_requires_the_specific_level_bit() {
        let mask = ValidSymbols::all() - ValidSymbols::ATX_H1_MARKER;
        assert_eq!(scan_open("# hi", mask), None);
    }

    #[test]
    fn recognizes_thematic_break() {
        assert_eq!(scan_open("---\n", all_valid()), Some(TokenId::ThematicBreak));
        assert_eq!(scan_open("***\n", all_valid()), Some(TokenId::ThematicBreak));
        assert_eq!(scan_open("___\n", all_valid()), Some(TokenId::ThematicBreak));
        assert_eq!(scan_open("- - -\n", all_valid()), Some(TokenId::ThematicBreak));
    }

    #[test]
    fn dash_prefers_combined_token_when_ambiguous() {
        assert_eq!(
            scan_open("---\n", all_valid()),
            Some(TokenId::SetextH2UnderlineOrThematicBreak)
        );
    }

    #[test]
    fn short_dash_run_is_setext_not_thematic() {
        assert_eq!(scan_open("--\n", all_valid()), Some(TokenId::SetextH2Underline));
    }

    #[test]
    fn list_marker_wins_when_there_is_content() {
        assert_eq!(
            scan_open("- item\n", all_valid()),
            Some(TokenId::ListMarkerMinus)
        );
    }

    #[test]
    fn recognizes_ordered_markers() {
        assert_eq!(scan_open("1. a\n", all_valid()), Some(TokenId::ListMarkerDot));
        assert_eq!(
            scan_open("12) a\n", all_valid()),
            Some(TokenId::ListMarkerParenthesis)
        );
        assert_eq!(scan_open("1a. a\n", all_valid()), None);
    }

    #[test]
    fn recognizes_fenced_code_open() {
        assert_eq!(
            scan_open("```\n", all_valid()),
            Some(TokenId::FencedCodeBlockStart)
        );
        assert_eq!(
            scan_open("~~~ruby\n", all_valid()),
            Some(TokenId::FencedCodeBlockStart)
        );
        // Backtick fence with an info string does not open (approximation).
        assert_eq!(scan_open("```ruby\n", all_valid()), None);
    }

    #[test]
    fn recognizes_block_quote() {
        assert_eq!(scan_open("> hi", all_valid()), Some(TokenId::BlockQuoteStart));
    }

    #[test]
    fn recognizes_blank_line() {
        assert_eq!(scan_open("\n", all_valid()), Some(TokenId::BlankLine));
    }

    #[test]
    fn fence_close_requires_matching_or_longer_run() {
        let mut lexer = StrLexer::new("``\n");
        let mut state = ScannerState::new();
        assert_eq!(
            try_close_fence(&mut lexer, &mut state, FenceKind::Backtick, 3, all_valid()),
            None
        );

        let mut lexer = StrLexer::new("````\n");
        let mut state = ScannerState::new();
        assert_eq!(
            try_close_fence(&mut lexer, &mut state, FenceKind::Backtick, 3, all_valid()),
            Some(TokenId::BlockClose)
        );
    }

    #[test]
    fn fence_close_declines_when_mask_forbids_it() {
        let mut lexer = StrLexer::new("```\n");
        let mut state = ScannerState::new();
        let mask = ValidSymbols::all() - ValidSymbols::BLOCK_CLOSE;
        assert_eq!(
            try_close_fence(&mut lexer, &mut state, FenceKind::Backtick, 3, mask),
            None
        );
    }
}
