//! The top-level orchestrator tying every component together behind the
//! five host entry points: `new` stands in for `create`, `destroy` is
//! `Scanner`'s implicit `Drop`, and `scan`/`serialize`/`deserialize` are
//! exactly what the host calls them.

use crate::lexer::Lexer;
use crate::phase::{inline, opener, prefix};
use crate::serialize;
use crate::state::{Phase, ScannerState};
use crate::token::{TokenId, ValidSymbols};

/// Owns the entirety of persistent scanner state and drives one `scan` call
/// at a time. One instance per parser instance; nothing here is
/// `Send`/`Sync` and nothing needs to be.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    state: ScannerState,
}

impl Scanner {
    pub fn new() -> Self {
        Scanner {
            state: ScannerState::new(),
        }
    }

    /// Dispatch a single host scan call to whichever phase the current line
    /// is in. Returns `true` and calls `lexer.set_result_symbol` exactly
    /// once iff a token was recognized.
    pub fn scan(&mut self, lexer: &mut dyn Lexer, valid_symbols: ValidSymbols) -> bool {
        #[cfg(feature = "debug-tracing")]
        eprintln!(
            "scan: phase={:?} matched={} depth={}",
            self.state.phase(),
            self.state.matched_raw(),
            self.state.open_blocks.len()
        );

        let recognized = if lexer.eof() {
            self.scan_eof(lexer)
        } else {
            match self.state.phase() {
                Phase::PrefixMatching | Phase::Opening => {
                    if let Some(token) = self.try_indentation_preamble(lexer, valid_symbols) {
                        lexer.set_result_symbol(token);
                        true
                    } else {
                        match self.state.phase() {
                            Phase::PrefixMatching => self.scan_prefix(lexer, valid_symbols),
                            Phase::Opening => self.scan_opener(lexer, valid_symbols),
                            Phase::Inline => unreachable!(),
                        }
                    }
                }
                Phase::Inline => self.scan_inline(lexer, valid_symbols),
            }
        };

        #[cfg(feature = "debug-tracing")]
        eprintln!("scan: recognized={recognized} phase={:?}", self.state.phase());

        recognized
    }

    pub fn serialize(&self, buffer: &mut [u8; 255]) -> usize {
        serialize::serialize(&self.state, buffer)
    }

    pub fn deserialize(&mut self, buffer: &[u8]) {
        serialize::deserialize(&mut self.state, buffer);
    }

    // Unlike every other close site, this one is not gated on `valid_symbols`:
    // at end of input there is no alternative token left for the host to
    // accept, so closing every remaining container unconditionally is the
    // only way to let the document finish parsing.
    fn scan_eof(&mut self, lexer: &mut dyn Lexer) -> bool {
        match self.state.open_blocks.pop() {
            Some(block) => {
                let token = if block.closes_loose() {
                    TokenId::BlockCloseLoose
                } else {
                    TokenId::BlockClose
                };
                lexer.set_result_symbol(token);
                lexer.mark_end();
                true
            }
            None => false,
        }
    }

    fn try_indentation_preamble(&mut self, lexer: &mut dyn Lexer, valid_symbols: ValidSymbols) -> Option<TokenId> {
        if !valid_symbols.is_valid(TokenId::Indentation) || !crate::byte::is_space_or_tab(lexer.lookahead()) {
            return None;
        }
        while crate::byte::is_space_or_tab(lexer.lookahead()) {
            let columns = crate::column::advance(lexer, &mut self.state, false);
            self.state.indentation += columns;
        }
        lexer.mark_end();
        Some(TokenId::Indentation)
    }

    fn scan_prefix(&mut self, lexer: &mut dyn Lexer, valid_symbols: ValidSymbols) -> bool {
        if let Some(token) = prefix::match_prefix(lexer, &mut self.state, valid_symbols) {
            lexer.set_result_symbol(token);
            return true;
        }

        // A run of blank-line skips inside `match_prefix` can walk `matched`
        // past the whole stack without handing back a token of its own;
        // when that happens, dispatch straight into opener recognition in
        // this same call instead of treating it as a prefix mismatch.
        if self.state.phase() == Phase::Opening {
            return self.scan_opener(lexer, valid_symbols);
        }

        if valid_symbols.is_valid(TokenId::LazyContinuation)
            && !opener::probe_opens_block(lexer, &self.state, valid_symbols)
        {
            self.state.skip_to_inline();
            lexer.set_result_symbol(TokenId::LazyContinuation);
            lexer.mark_end();
            return true;
        }

        // Pop the deepest open block (not necessarily the one at
        // `prefix_idx`: a mismatch in an outer container closes every
        // container nested inside it too, one per call).
        match self.state.open_blocks.pop() {
            Some(block) => {
                let token = if block.closes_loose() {
                    TokenId::BlockCloseLoose
                } else {
                    TokenId::BlockClose
                };
                if !valid_symbols.is_valid(token) {
                    self.state.open_blocks.push(block);
                    return false;
                }
                if token == TokenId::BlockCloseLoose {
                    // A sibling list item opened right after this one may
                    // belong to the same list; let it inherit looseness
                    // instead of starting out tight again.
                    self.state.carry_looseness();
                }
                lexer.set_result_symbol(token);
                lexer.mark_end();
                true
            }
            None => false,
        }
    }

    fn scan_opener(&mut self, lexer: &mut dyn Lexer, valid_symbols: ValidSymbols) -> bool {
        if let Some(token) = opener::open_block(lexer, &mut self.state, valid_symbols) {
            lexer.set_result_symbol(token);
            return true;
        }
        self.state.advance_matched(1);
        lexer.set_result_symbol(TokenId::MatchingDone);
        lexer.mark_end();
        true
    }

    fn scan_inline(&mut self, lexer: &mut dyn Lexer, valid_symbols: ValidSymbols) -> bool {
        match inline::match_inline(lexer, &mut self.state, valid_symbols) {
            Some(token) => {
                lexer.set_result_symbol(token);
                true
            }
            None => false,
        }
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
    fn atx_heading_then_eof_closes_nothing() {
        let mut scanner = Scanner::new();
        let mut lexer = StrLexer::new("# hi");
        assert!(scanner.scan(&mut lexer, all_valid()));
        assert_eq!(lexer.result_symbol(), Some(TokenId::AtxH1Marker));
    }

    #[test]
    fn block_quote_open_then_eof_closes_it() {
        let mut scanner = Scanner::new();
        let mut lexer = StrLexer::new("> a");
        assert!(scanner.scan(&mut lexer, all_valid()));
        assert_eq!(lexer.result_symbol(), Some(TokenId::BlockQuoteStart));

        // Drive straight to EOF to exercise the close path without needing
        // to hand-simulate every intervening inline token.
        while !lexer.eof() {
            lexer.advance(true);
        }
        assert!(scanner.scan(&mut lexer, all_valid()));
        assert_eq!(lexer.result_symbol(), Some(TokenId::BlockClose));
    }

    #[test]
    fn scan_returns_false_at_eof_with_empty_stack() {
        let mut scanner = Scanner::new();
        let mut lexer = StrLexer::new("");
        assert!(!scanner.scan(&mut lexer, all_valid()));
    }

    #[test]
    fn indentation_preamble_is_its_own_call() {
        let mut scanner = Scanner::new();
        let mut lexer = StrLexer::new("    text");
        assert!(scanner.scan(&mut lexer, all_valid()));
        assert_eq!(lexer.result_symbol(), Some(TokenId::Indentation));
        assert_eq!(lexer.position(), 4);
    }
}
