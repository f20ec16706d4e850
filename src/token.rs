//! The token alphabet the scanner can emit, and the mask the host uses to
//! tell the scanner which of them the grammar would currently accept.

use bitflags::bitflags;

/// Every token this scanner can hand back to the host as `result_symbol`.
///
/// `AtxH1Marker..AtxH6Marker` must stay contiguous and in this exact order:
/// `TokenId::atx_heading(level)` relies on the discriminants being laid out
/// `level - 1` apart from `AtxH1Marker`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TokenId {
    LineEnding,
    Indentation,
    VirtualSpace,
    MatchingDone,
    BlockClose,
    BlockCloseLoose,
    BlockContinuation,
    LazyContinuation,
    BlockQuoteStart,
    IndentedChunkStart,
    AtxH1Marker,
    AtxH2Marker,
    AtxH3Marker,
    AtxH4Marker,
    AtxH5Marker,
    AtxH6Marker,
    SetextH1Underline,
    SetextH2Underline,
    SetextH2UnderlineOrThematicBreak,
    ThematicBreak,
    ListMarkerMinus,
    ListMarkerPlus,
    ListMarkerStar,
    ListMarkerParenthesis,
    ListMarkerDot,
    FencedCodeBlockStart,
    BlankLine,
    CodeSpanStart,
    CodeSpanClose,
    /// Mask-only: the host sets this to tell the scanner the previously
    /// emitted inline token was whitespace. Never emitted as a result symbol.
    LastTokenWhitespace,
    /// Mask-only, see `LastTokenWhitespace`.
    LastTokenPunctuation,
    EmphasisOpenStar,
    EmphasisOpenUnderscore,
    EmphasisCloseStar,
    EmphasisCloseUnderscore,
}

impl TokenId {
    /// Returns the marker token for an ATX heading of the given `level`
    /// (1..=6), per the contiguous layout documented above.
    pub fn atx_heading(level: u8) -> TokenId {
        debug_assert!((1..=6).contains(&level));
        const MARKERS: [TokenId; 6] = [
            TokenId::AtxH1Marker,
            TokenId::AtxH2Marker,
            TokenId::AtxH3Marker,
            TokenId::AtxH4Marker,
            TokenId::AtxH5Marker,
            TokenId::AtxH6Marker,
        ];
        MARKERS[(level - 1) as usize]
    }

    fn as_flag(self) -> ValidSymbols {
        match self {
            TokenId::LineEnding => ValidSymbols::LINE_ENDING,
            TokenId::Indentation => ValidSymbols::INDENTATION,
            TokenId::VirtualSpace => ValidSymbols::VIRTUAL_SPACE,
            TokenId::MatchingDone => ValidSymbols::MATCHING_DONE,
            TokenId::BlockClose => ValidSymbols::BLOCK_CLOSE,
            TokenId::BlockCloseLoose => ValidSymbols::BLOCK_CLOSE_LOOSE,
            TokenId::BlockContinuation => ValidSymbols::BLOCK_CONTINUATION,
            TokenId::LazyContinuation => ValidSymbols::LAZY_CONTINUATION,
            TokenId::BlockQuoteStart => ValidSymbols::BLOCK_QUOTE_START,
            TokenId::IndentedChunkStart => ValidSymbols::INDENTED_CHUNK_START,
            TokenId::AtxH1Marker => ValidSymbols::ATX_H1_MARKER,
            TokenId::AtxH2Marker => ValidSymbols::ATX_H2_MARKER,
            TokenId::AtxH3Marker => ValidSymbols::ATX_H3_MARKER,
            TokenId::AtxH4Marker => ValidSymbols::ATX_H4_MARKER,
            TokenId::AtxH5Marker => ValidSymbols::ATX_H5_MARKER,
            TokenId::AtxH6Marker => ValidSymbols::ATX_H6_MARKER,
            TokenId::SetextH1Underline => ValidSymbols::SETEXT_H1_UNDERLINE,
            TokenId::SetextH2Underline => ValidSymbols::SETEXT_H2_UNDERLINE,
            TokenId::SetextH2UnderlineOrThematicBreak => {
                ValidSymbols::SETEXT_H2_UNDERLINE_OR_THEMATIC_BREAK
            }
            TokenId::ThematicBreak => ValidSymbols::THEMATIC_BREAK,
            TokenId::ListMarkerMinus => ValidSymbols::LIST_MARKER_MINUS,
            TokenId::ListMarkerPlus => ValidSymbols::LIST_MARKER_PLUS,
            TokenId::ListMarkerStar => ValidSymbols::LIST_MARKER_STAR,
            TokenId::ListMarkerParenthesis => ValidSymbols::LIST_MARKER_PARENTHESIS,
            TokenId::ListMarkerDot => ValidSymbols::LIST_MARKER_DOT,
            TokenId::FencedCodeBlockStart => ValidSymbols::FENCED_CODE_BLOCK_START,
            TokenId::BlankLine => ValidSymbols::BLANK_LINE,
            TokenId::CodeSpanStart => ValidSymbols::CODE_SPAN_START,
            TokenId::CodeSpanClose => ValidSymbols::CODE_SPAN_CLOSE,
            TokenId::LastTokenWhitespace => ValidSymbols::LAST_TOKEN_WHITESPACE,
            TokenId::LastTokenPunctuation => ValidSymbols::LAST_TOKEN_PUNCTUATION,
            TokenId::EmphasisOpenStar => ValidSymbols::EMPHASIS_OPEN_STAR,
            TokenId::EmphasisOpenUnderscore => ValidSymbols::EMPHASIS_OPEN_UNDERSCORE,
            TokenId::EmphasisCloseStar => ValidSymbols::EMPHASIS_CLOSE_STAR,
            TokenId::EmphasisCloseUnderscore => ValidSymbols::EMPHASIS_CLOSE_UNDERSCORE,
        }
    }
}

bitflags! {
    /// The boolean mask the host passes into `Scanner::scan`, indicating
    /// which tokens the grammar would currently accept.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ValidSymbols: u64 {
        const LINE_ENDING = 1 << 0;
        const INDENTATION = 1 << 1;
        const VIRTUAL_SPACE = 1 << 2;
        const MATCHING_DONE = 1 << 3;
        const BLOCK_CLOSE = 1 << 4;
        const BLOCK_CLOSE_LOOSE = 1 << 5;
        const BLOCK_CONTINUATION = 1 << 6;
        const LAZY_CONTINUATION = 1 << 7;
        const BLOCK_QUOTE_START = 1 << 8;
        const INDENTED_CHUNK_START = 1 << 9;
        const ATX_H1_MARKER = 1 << 10;
        const ATX_H2_MARKER = 1 << 11;
        const ATX_H3_MARKER = 1 << 12;
        const ATX_H4_MARKER = 1 << 13;
        const ATX_H5_MARKER = 1 << 14;
        const ATX_H6_MARKER = 1 << 15;
        const SETEXT_H1_UNDERLINE = 1 << 16;
        const SETEXT_H2_UNDERLINE = 1 << 17;
        const SETEXT_H2_UNDERLINE_OR_THEMATIC_BREAK = 1 << 18;
        const THEMATIC_BREAK = 1 << 19;
        const LIST_MARKER_MINUS = 1 << 20;
        const LIST_MARKER_PLUS = 1 << 21;
        const LIST_MARKER_STAR = 1 << 22;
        const LIST_MARKER_PARENTHESIS = 1 << 23;
        const LIST_MARKER_DOT = 1 << 24;
        const FENCED_CODE_BLOCK_START = 1 << 25;
        const BLANK_LINE = 1 << 26;
        const CODE_SPAN_START = 1 << 27;
        const CODE_SPAN_CLOSE = 1 << 28;
        const LAST_TOKEN_WHITESPACE = 1 << 29;
        const LAST_TOKEN_PUNCTUATION = 1 << 30;
        const EMPHASIS_OPEN_STAR = 1 << 31;
        const EMPHASIS_OPEN_UNDERSCORE = 1 << 32;
        const EMPHASIS_CLOSE_STAR = 1 << 33;
        const EMPHASIS_CLOSE_UNDERSCORE = 1 << 34;
    }
}

impl ValidSymbols {
    /// Build a mask from a flat array indexed by `TokenId` discriminant, the
    /// shape a generated parser typically hands the external scanner in
    /// (tree-sitter passes a `[bool; N]` slice keyed by symbol id).
    pub fn from_flags(flags: &[bool]) -> Self {
        const ORDER: [TokenId; 35] = [
            TokenId::LineEnding,
            TokenId::Indentation,
            TokenId::VirtualSpace,
            TokenId::MatchingDone,
            TokenId::BlockClose,
            TokenId::BlockCloseLoose,
            TokenId::BlockContinuation,
            TokenId::LazyContinuation,
            TokenId::BlockQuoteStart,
            TokenId::IndentedChunkStart,
            TokenId::AtxH1Marker,
            TokenId::AtxH2Marker,
            TokenId::AtxH3Marker,
            TokenId::AtxH4Marker,
            TokenId::AtxH5Marker,
            TokenId::AtxH6Marker,
            TokenId::SetextH1Underline,
            TokenId::SetextH2Underline,
            TokenId::SetextH2UnderlineOrThematicBreak,
            TokenId::ThematicBreak,
            TokenId::ListMarkerMinus,
            TokenId::ListMarkerPlus,
            TokenId::ListMarkerStar,
            TokenId::ListMarkerParenthesis,
            TokenId::ListMarkerDot,
            TokenId::FencedCodeBlockStart,
            TokenId::BlankLine,
            TokenId::CodeSpanStart,
            TokenId::CodeSpanClose,
            TokenId::LastTokenWhitespace,
            TokenId::LastTokenPunctuation,
            TokenId::EmphasisOpenStar,
            TokenId::EmphasisOpenUnderscore,
            TokenId::EmphasisCloseStar,
            TokenId::EmphasisCloseUnderscore,
        ];
        let mut mask = ValidSymbols::empty();
        for (&token, &is_set) in ORDER.iter().zip(flags.iter()) {
            if is_set {
                mask |= token.as_flag();
            }
        }
        mask
    }

    #[inline]
    pub fn is_valid(&self, token: TokenId) -> bool {
        self.contains(token.as_flag())
    }

    pub fn with(mut self, token: TokenId) -> Self {
        self.insert(token.as_flag());
        self
    }

    pub fn set_token(&mut self, token: TokenId, value: bool) {
        let flag = token.as_flag();
        if value {
            self.insert(flag);
        } else {
            self.remove(flag);
        }
    }
}

impl FromIterator<TokenId> for ValidSymbols {
    fn from_iter<I: IntoIterator<Item = TokenId>>(iter: I) -> Self {
        let mut mask = ValidSymbols::empty();
        for token in iter {
            mask |= token.as_flag();
        }
        mask
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn atx_heading_levels_are_contiguous() {
        assert_eq!(TokenId::atx_heading(1), TokenId::AtxH1Marker);
        assert_eq!(TokenId::atx_heading(6), TokenId::AtxH6Marker);
    }

    #[test]
    fn mask_round_trips_individual_bits() {
        let mask = ValidSymbols::from_iter([TokenId::BlankLine, TokenId::LineEnding]);
        assert!(mask.is_valid(TokenId::BlankLine));
        assert!(mask.is_valid(TokenId::LineEnding));
        assert!(!mask.is_valid(TokenId::ThematicBreak));
    }

    #[test]
    fn set_false_clears_bit() {
        let mut mask = ValidSymbols::from_iter([TokenId::BlankLine]);
        mask.set_token(TokenId::BlankLine, false);
        assert!(!mask.is_valid(TokenId::BlankLine));
    }
}
