//! Token types for the pattern language.
//!
//! Tokens are parsed on demand, one at a time, during each match attempt and
//! discarded immediately after use; there is no persistent AST.

use crate::unicode::PropertyClass;

use super::recognizers::Recognizer;

/// One parsed unit of the pattern language.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternToken {
    pub kind: TokenKind,
    /// Invert the membership test (never the end-of-text test).
    pub negated: bool,
    /// A token that matches but never occupies a capture slot.
    pub non_capturing: bool,
    pub quantifier: Quantifier,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Zero-width, start of text only.
    Start,
    /// Zero-width, end of text only.
    End,
    /// Any single grapheme cluster.
    Any,
    /// A literal grapheme cluster.
    Grapheme(String),
    /// Membership in a Unicode property.
    Property(PropertyClass),
    /// A quoted span: opener to the first unescaped closer.
    Quote { open: char, close: char },
    /// Balanced nested punctuation: opener to the matching closer.
    Pair { open: char, close: char },
    /// A built-in recognizer.
    Recognizer(Recognizer),
}

/// Repetition bounds for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// No bounds written; the sequence matcher resolves them contextually.
    Unspecified,
    Exactly(usize),
    /// `lo <= hi`, enforced at parse time.
    Between(usize, usize),
    AtLeast(usize),
}

impl Quantifier {
    /// The resolved `(min, max)` bounds; `Unspecified` defaults to
    /// one-or-more. The trailing-`{..}` special case is handled by the
    /// sequence matcher before calling this.
    pub fn bounds(self) -> (usize, usize) {
        match self {
            Quantifier::Unspecified => (1, usize::MAX),
            Quantifier::Exactly(n) => (n, n),
            Quantifier::Between(lo, hi) => (lo, hi),
            Quantifier::AtLeast(n) => (n, usize::MAX),
        }
    }
}

impl PatternToken {
    /// A plain literal grapheme: non-capturing, exactly once.
    pub fn literal(grapheme: &str) -> Self {
        PatternToken {
            kind: TokenKind::Grapheme(grapheme.to_string()),
            negated: false,
            non_capturing: true,
            quantifier: Quantifier::Exactly(1),
        }
    }
}
