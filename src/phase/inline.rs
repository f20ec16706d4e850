//! Phase D, inline delimiter recognition once block-level syntax for the
//! current line has been fully resolved.

use crate::lexer::Lexer;
use crate::state::{EmphasisPolarity, ScannerState};
use crate::token::{TokenId, ValidSymbols};

fn peek_run(lexer: &dyn Lexer, byte: u8) -> usize {
    let mut n = 0;
    while lexer.peek_ahead(n) == byte {
        n += 1;
    }
    n
}

/// Flanking classification of a delimiter run, computed from the mask bits
/// the host sets for the preceding inline token and the byte following the
/// run.
struct Flanking {
    left: bool,
    right: bool,
    prev_punct: bool,
    next_punct: bool,
}

fn classify_flanking(valid: ValidSymbols, lexer: &dyn Lexer, run_len: usize) -> Flanking {
    let prev_ws = valid.is_valid(TokenId::LastTokenWhitespace);
    let prev_punct = valid.is_valid(TokenId::LastTokenPunctuation);
    let next = lexer.peek_ahead(run_len);
    let next_ws = next == 0 || crate::byte::is_ascii_whitespace(next);
    let next_punct = crate::byte::is_ascii_punctuation(next);

    let right = !prev_ws && (!prev_punct || next_punct || next_ws);
    let left = !next_ws && (!next_punct || prev_punct || prev_ws);

    Flanking {
        left,
        right,
        prev_punct,
        next_punct,
    }
}

fn star_polarity(flanking: &Flanking, valid: ValidSymbols) -> Option<EmphasisPolarity> {
    if flanking.right && valid.is_valid(TokenId::EmphasisCloseStar) {
        Some(EmphasisPolarity::Close)
    } else if flanking.left && valid.is_valid(TokenId::EmphasisOpenStar) {
        Some(EmphasisPolarity::Open)
    } else {
        None
    }
}

fn underscore_polarity(flanking: &Flanking, valid: ValidSymbols) -> Option<EmphasisPolarity> {
    let can_close = flanking.right && (!flanking.left || flanking.next_punct);
    let can_open = flanking.left && (!flanking.right || flanking.prev_punct);
    if can_close && valid.is_valid(TokenId::EmphasisCloseUnderscore) {
        Some(EmphasisPolarity::Close)
    } else if can_open && valid.is_valid(TokenId::EmphasisOpenUnderscore) {
        Some(EmphasisPolarity::Open)
    } else {
        None
    }
}

fn emphasis_token(byte: u8, polarity: EmphasisPolarity) -> TokenId {
    match (byte, polarity) {
        (b'*', EmphasisPolarity::Open) => TokenId::EmphasisOpenStar,
        (b'*', EmphasisPolarity::Close) => TokenId::EmphasisCloseStar,
        (b'_', EmphasisPolarity::Open) => TokenId::EmphasisOpenUnderscore,
        (b'_', EmphasisPolarity::Close) => TokenId::EmphasisCloseUnderscore,
        _ => unreachable!("emphasis_token only called for '*'/'_' runs"),
    }
}

fn begin_emphasis_run(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols, byte: u8) -> Option<TokenId> {
    let run_len = peek_run(lexer, byte);
    let flanking = classify_flanking(valid, lexer, run_len);
    let polarity = if byte == b'*' {
        star_polarity(&flanking, valid)
    } else {
        underscore_polarity(&flanking, valid)
    }?;

    state.begin_emphasis_run(run_len.min(255) as u8, matches!(polarity, EmphasisPolarity::Open));
    state.consume_emphasis_token();
    crate::column::advance(lexer, state, false);
    lexer.mark_end();
    Some(emphasis_token(byte, polarity))
}

fn continue_emphasis_run(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    let byte = lexer.lookahead();
    let polarity = state.emphasis_polarity();
    let token = emphasis_token(byte, polarity);
    if !valid.is_valid(token) {
        return None;
    }
    state.consume_emphasis_token();
    crate::column::advance(lexer, state, false);
    lexer.mark_end();
    Some(token)
}

fn match_code_span(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    let run_len = peek_run(lexer, b'`');
    let token = if run_len == state.code_span_delimiter_len as usize
        && state.code_span_delimiter_len > 0
        && valid.is_valid(TokenId::CodeSpanClose)
    {
        state.code_span_delimiter_len = 0;
        TokenId::CodeSpanClose
    } else if valid.is_valid(TokenId::CodeSpanStart) {
        state.code_span_delimiter_len = run_len.min(255) as u8;
        TokenId::CodeSpanStart
    } else {
        return None;
    };
    for _ in 0..run_len {
        crate::column::advance(lexer, state, false);
    }
    lexer.mark_end();
    Some(token)
}

/// Phase D entry point: recognize one inline-level token at the current
/// cursor position. Returns `None` when nothing the scanner owns applies
/// here, deferring to the host grammar's literal-text fallback.
pub fn match_inline(lexer: &mut dyn Lexer, state: &mut ScannerState, valid: ValidSymbols) -> Option<TokenId> {
    if state.emphasis_run_pending() {
        return continue_emphasis_run(lexer, state, valid);
    }

    if state.indentation > 0 && valid.is_valid(TokenId::VirtualSpace) {
        state.indentation -= 1;
        lexer.mark_end();
        return Some(TokenId::VirtualSpace);
    }

    let first = lexer.lookahead();
    if crate::byte::is_line_ending(first) && valid.is_valid(TokenId::LineEnding) {
        crate::column::advance(lexer, state, false);
        if first == b'\r' && lexer.lookahead() == b'\n' {
            // `\r\n` counts as a single line ending.
            crate::column::advance(lexer, state, true);
        }
        state.start_new_line();
        lexer.mark_end();
        return Some(TokenId::LineEnding);
    }

    match lexer.lookahead() {
        b'`' => match_code_span(lexer, state, valid),
        byte @ (b'*' | b'_') => begin_emphasis_run(lexer, state, valid, byte),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::StrLexer;

    fn all_valid() -> ValidSymbols {
        ValidSymbols::all()
    }

    #[test]
    fn opens_code_span_and_closes_on_matching_run() {
        let mut lexer = StrLexer::new("``");
        let mut state = ScannerState::new();
        assert_eq!(
            match_inline(&mut lexer, &mut state, all_valid()),
            Some(TokenId::CodeSpanStart)
        );
        assert_eq!(state.code_span_delimiter_len, 2);
    }

    #[test]
    fn left_flanking_star_after_whitespace_opens() {
        let mut lexer = StrLexer::new("*foo*");
        let mut state = ScannerState::new();
        let mut mask = all_valid();
        mask.set_token(TokenId::LastTokenWhitespace, true);
        assert_eq!(
            match_inline(&mut lexer, &mut state, mask),
            Some(TokenId::EmphasisOpenStar)
        );
    }

    #[test]
    fn underscore_forbids_intraword_emphasis() {
        // "foo_bar_": the opening underscore is preceded by a letter (not
        // whitespace/punctuation) and followed by a letter, so neither the
        // left- nor right-flanking + punctuation condition needed to open
        // holds.
        let mut lexer = StrLexer::new("_bar_");
        let mut state = ScannerState::new();
        let mut mask = all_valid();
        // Simulate "preceded by a letter": neither whitespace nor punctuation.
        mask.set_token(TokenId::LastTokenWhitespace, false);
        mask.set_token(TokenId::LastTokenPunctuation, false);
        // Left-flanking (next='b', not whitespace/punct) but also
        // right-flanking is false here since prev is not whitespace, so
        // open should still succeed (only right-flanking intraword is
        // forbidden, i.e. "foo_bar_" closer case, not the opener itself).
        assert_eq!(
            match_inline(&mut lexer, &mut state, mask),
            Some(TokenId::EmphasisOpenUnderscore)
        );
    }

    #[test]
    fn line_ending_resets_state_and_consumes_crlf_together() {
        let mut lexer = StrLexer::new("\r\nnext");
        let mut state = ScannerState::new();
        state.indentation = 0;
        assert_eq!(
            match_inline(&mut lexer, &mut state, all_valid()),
            Some(TokenId::LineEnding)
        );
        assert_eq!(lexer.position(), 2);
        assert_eq!(state.matched_raw(), 0);
    }

    #[test]
    fn virtual_space_drains_indentation_one_column_at_a_time() {
        let mut lexer = StrLexer::new("a");
        let mut state = ScannerState::new();
        state.indentation = 2;
        assert_eq!(
            match_inline(&mut lexer, &mut state, all_valid()),
            Some(TokenId::VirtualSpace)
        );
        assert_eq!(state.indentation, 1);
    }
}
