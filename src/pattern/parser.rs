//! Parser for the pattern language: one token at a cursor.
//!
//! There is no pattern AST. The sequence matcher asks for the next token at
//! its current pattern position, uses it, and throws it away; parsing the
//! same pattern text always yields the same tokens.

use phf::{Map, phf_map};

use crate::text::Text;
use crate::unicode::{self, PropertyClass, props};

use super::recognizers::Recognizer;
use super::token::{PatternToken, Quantifier, TokenKind};

/// Errors that abort a pattern operation.
///
/// Match *failure* is never an error; it is reported as `None`/`false`/empty
/// results. These variants cover the two fatal categories (malformed
/// patterns, bad backreferences) plus the invalid explicit start index.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// A `"?`-style quoted-span token is missing its closing quote.
    UnclosedQuote(char),
    /// A `(?`-style pair token is missing its closing bracket.
    UnclosedPair(char),
    /// A `{...}` token is missing its closing brace.
    MissingBrace,
    /// Explicit repetition bounds with `min > max`.
    InvalidRepetition { min: usize, max: usize },
    /// A `{name}` that is no keyword, Unicode property, or character name.
    UnknownName(String),
    /// A backreference outside 0-9.
    InvalidBackref(i64),
    /// A backreference to a capture slot that was never filled.
    UnsetCapture(usize),
    /// A zero start index passed to `find` (indices are 1-based).
    InvalidStartIndex,
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnclosedQuote(open) => {
                write!(f, "Pattern's closing quote for {open:?} is missing")
            }
            Self::UnclosedPair(open) => {
                write!(f, "Pattern's closing bracket for {open:?} is missing")
            }
            Self::MissingBrace => write!(f, "Missing closing '}}' in pattern"),
            Self::InvalidRepetition { min, max } => {
                write!(
                    f,
                    "Minimum repetitions ({min}) is greater than the maximum ({max})"
                )
            }
            Self::UnknownName(name) => {
                write!(f, "Not a valid property or character name: {name}")
            }
            Self::InvalidBackref(n) => {
                write!(f, "Invalid backref index: {n} (only 0-9 are allowed)")
            }
            Self::UnsetCapture(n) => write!(f, "There is no capture number {n}"),
            Self::InvalidStartIndex => write!(f, "Invalid index: 0"),
        }
    }
}

impl std::error::Error for PatternError {}

/// What a `{...}` keyword resolves to.
#[derive(Clone, Copy)]
enum Keyword {
    Start,
    End,
    Recognize(Recognizer),
    Property(&'static str),
}

/// Keyword table, queried with the lowercased name. Please keep entries
/// sorted alphabetically for readability.
static KEYWORDS: Map<&'static str, Keyword> = phf_map! {
    "alphanum" => Keyword::Recognize(Recognizer::Alphanumeric),
    "alphanumeric" => Keyword::Recognize(Recognizer::Alphanumeric),
    "anum" => Keyword::Recognize(Recognizer::Alphanumeric),
    "authority" => Keyword::Recognize(Recognizer::Authority),
    "crlf" => Keyword::Recognize(Recognizer::Newline),
    "digit" => Keyword::Property(props::DECIMAL_DIGIT),
    "email" => Keyword::Recognize(Recognizer::Email),
    "emoji" => Keyword::Property(props::EMOJI),
    "end" => Keyword::End,
    "host" => Keyword::Recognize(Recognizer::Host),
    "id" => Keyword::Recognize(Recognizer::Id),
    "int" => Keyword::Recognize(Recognizer::Int),
    "ip" => Keyword::Recognize(Recognizer::Ip),
    "ipv4" => Keyword::Recognize(Recognizer::Ipv4),
    "ipv6" => Keyword::Recognize(Recognizer::Ipv6),
    "newline" => Keyword::Recognize(Recognizer::Newline),
    "nl" => Keyword::Recognize(Recognizer::Newline),
    "num" => Keyword::Recognize(Recognizer::Num),
    "start" => Keyword::Start,
    "uri" => Keyword::Recognize(Recognizer::Uri),
    "url" => Keyword::Recognize(Recognizer::Url),
    "whitespace" => Keyword::Property(props::WHITE_SPACE),
    "word" => Keyword::Recognize(Recognizer::Id),
    "ws" => Keyword::Property(props::WHITE_SPACE),
};

/// Parse the next token of `pattern` at `*index`, advancing the cursor.
pub fn parse_next_token(pattern: &Text, index: &mut usize) -> Result<PatternToken, PatternError> {
    let first = pattern.main_char(*index);

    // Quoted span: "?", '?', «?», ...
    if let Some(open) = first.filter(|&c| unicode::is_quotation_mark(c))
        && pattern.grapheme(*index + 1) == Some("?")
    {
        *index += 2;
        let close = unicode::closing_quote(open).unwrap_or(open);
        if !eat_char(pattern, index, close) {
            return Err(PatternError::UnclosedQuote(open));
        }
        return Ok(PatternToken {
            kind: TokenKind::Quote { open, close },
            negated: false,
            non_capturing: false,
            quantifier: Quantifier::Exactly(1),
        });
    }

    // Nested punctuation: (?), [?], ...
    if let Some(open) = first.filter(|&c| unicode::is_left_of_pair(c))
        && pattern.grapheme(*index + 1) == Some("?")
    {
        *index += 2;
        let close = unicode::closing_bracket(open).unwrap_or(open);
        if !eat_char(pattern, index, close) {
            return Err(PatternError::UnclosedPair(open));
        }
        return Ok(PatternToken {
            kind: TokenKind::Pair { open, close },
            negated: false,
            non_capturing: false,
            quantifier: Quantifier::Exactly(1),
        });
    }

    // Named tokens: {id}, {2-3 digit}, {!ws}, {1{}, ...
    if pattern.grapheme(*index) == Some("{") {
        *index += 1;
        return parse_braced(pattern, index);
    }

    // Anything else is one literal grapheme cluster.
    let g = pattern.grapheme(*index).unwrap_or_default().to_string();
    *index += 1;
    Ok(PatternToken::literal(&g))
}

fn parse_braced(pattern: &Text, index: &mut usize) -> Result<PatternToken, PatternError> {
    skip_whitespace(pattern, index);

    let quantifier = if pattern.main_char(*index).is_some_and(|c| c.is_ascii_digit()) {
        let min = parse_int(pattern, index);
        skip_whitespace(pattern, index);
        if eat_char(pattern, index, '+') {
            Quantifier::AtLeast(min)
        } else if eat_char(pattern, index, '-') {
            let max = parse_int(pattern, index);
            if min > max {
                return Err(PatternError::InvalidRepetition { min, max });
            }
            Quantifier::Between(min, max)
        } else {
            Quantifier::Exactly(min)
        }
    } else {
        Quantifier::Unspecified
    };

    skip_whitespace(pattern, index);
    let negated = eat_char(pattern, index, '!');

    let token = |kind: TokenKind| PatternToken {
        kind,
        negated,
        non_capturing: false,
        quantifier,
    };

    let name = if eat_str(pattern, index, "..") {
        Some("..".to_string())
    } else {
        parse_name(pattern, index)
    };

    let Some(name) = name else {
        // Literal character, e.g. {1?}
        skip_whitespace(pattern, index);
        let g = pattern
            .grapheme(*index)
            .ok_or(PatternError::MissingBrace)?
            .to_string();
        *index += 1;
        if !eat_char(pattern, index, '}') {
            return Err(PatternError::MissingBrace);
        }
        return Ok(token(TokenKind::Grapheme(g)));
    };

    if name != ".." && name.chars().count() == 1 {
        // Single letter names: {1+ A}
        skip_whitespace(pattern, index);
        if !eat_char(pattern, index, '}') {
            return Err(PatternError::MissingBrace);
        }
        return Ok(token(TokenKind::Grapheme(name)));
    }

    skip_whitespace(pattern, index);
    if !eat_char(pattern, index, '}') {
        return Err(PatternError::MissingBrace);
    }

    if name == ".." {
        // {..} is match-any; {!..} is the end anchor.
        if negated {
            return Ok(PatternToken {
                kind: TokenKind::End,
                negated: false,
                non_capturing: true,
                quantifier,
            });
        }
        return Ok(token(TokenKind::Any));
    }

    if let Some(keyword) = KEYWORDS.get(name.to_ascii_lowercase().as_str()) {
        return match keyword {
            Keyword::Start => Ok(PatternToken {
                kind: TokenKind::Start,
                negated,
                non_capturing: !negated,
                quantifier,
            }),
            Keyword::End => Ok(PatternToken {
                kind: TokenKind::End,
                negated,
                non_capturing: !negated,
                quantifier,
            }),
            Keyword::Recognize(r) => Ok(token(TokenKind::Recognizer(*r))),
            Keyword::Property(p) => {
                let class = PropertyClass::by_name(p)
                    .ok_or_else(|| PatternError::UnknownName(name.clone()))?;
                Ok(token(TokenKind::Property(class)))
            }
        };
    }

    if let Some(class) = PropertyClass::by_name(&name) {
        return Ok(token(TokenKind::Property(class)));
    }

    if let Some(ch) = unicode::character_by_name(&name) {
        return Ok(token(TokenKind::Grapheme(ch.to_string())));
    }

    Err(PatternError::UnknownName(name))
}

// ─── Cursor helpers ──────────────────────────────────────────────────────────

fn skip_whitespace(pattern: &Text, index: &mut usize) {
    while pattern.main_char(*index).is_some_and(char::is_whitespace) {
        *index += 1;
    }
}

fn eat_char(pattern: &Text, index: &mut usize, ch: char) -> bool {
    let mut buf = [0u8; 4];
    if pattern.grapheme(*index) == Some(&*ch.encode_utf8(&mut buf)) {
        *index += 1;
        true
    } else {
        false
    }
}

fn eat_str(pattern: &Text, index: &mut usize, s: &str) -> bool {
    let mut n = 0;
    for ch in s.chars() {
        let mut buf = [0u8; 4];
        if pattern.grapheme(*index + n) != Some(&*ch.encode_utf8(&mut buf)) {
            return false;
        }
        n += 1;
    }
    *index += n;
    true
}

pub(crate) fn parse_int(pattern: &Text, index: &mut usize) -> usize {
    let mut value: usize = 0;
    while let Some(d) = pattern.main_char(*index).and_then(|c| c.to_digit(10)) {
        match value.checked_mul(10).and_then(|v| v.checked_add(d as usize)) {
            Some(v) => value = v,
            None => break,
        }
        *index += 1;
    }
    value
}

/// Read a property-style name: a run of ASCII alphanumerics, spaces,
/// underscores and hyphens, with trailing spaces trimmed. `None` when the
/// cursor is not at such a run.
fn parse_name(pattern: &Text, index: &mut usize) -> Option<String> {
    skip_whitespace(pattern, index);
    let mut name = String::new();
    while let Some(g) = pattern.grapheme(*index) {
        let ok = g.len() == 1
            && g.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '_' || c == '-');
        if !ok {
            break;
        }
        name.push_str(g);
        *index += 1;
    }
    while name.ends_with(' ') {
        name.pop();
    }
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(s: &str) -> PatternToken {
        let pat = Text::new(s);
        let mut i = 0;
        parse_next_token(&pat, &mut i).expect("parse should succeed")
    }

    fn parse_err(s: &str) -> PatternError {
        let pat = Text::new(s);
        let mut i = 0;
        parse_next_token(&pat, &mut i).expect_err("parse should fail")
    }

    // --- Literals ---

    #[test]
    fn bare_grapheme_is_literal() {
        let t = parse_one("xy");
        assert_eq!(t.kind, TokenKind::Grapheme("x".to_string()));
        assert!(t.non_capturing);
        assert_eq!(t.quantifier, Quantifier::Exactly(1));
    }

    #[test]
    fn bare_literal_advances_one_cluster() {
        let pat = Text::new("e\u{0301}x");
        let mut i = 0;
        let t = parse_next_token(&pat, &mut i).unwrap();
        assert_eq!(t.kind, TokenKind::Grapheme("e\u{0301}".to_string()));
        assert_eq!(i, 1);
    }

    #[test]
    fn braced_literal_char() {
        let t = parse_one("{1?}");
        assert_eq!(t.kind, TokenKind::Grapheme("?".to_string()));
        assert!(!t.non_capturing, "brace-form literals capture");
        assert_eq!(t.quantifier, Quantifier::Exactly(1));
    }

    #[test]
    fn braced_single_letter() {
        let t = parse_one("{3 A}");
        assert_eq!(t.kind, TokenKind::Grapheme("A".to_string()));
        assert_eq!(t.quantifier, Quantifier::Exactly(3));
    }

    // --- Quotes and pairs ---

    #[test]
    fn quote_token() {
        let t = parse_one("\"?\"");
        assert_eq!(t.kind, TokenKind::Quote { open: '"', close: '"' });
        assert!(!t.non_capturing);
    }

    #[test]
    fn curly_quote_uses_mirror() {
        let t = parse_one("\u{2018}?\u{2019}");
        assert_eq!(
            t.kind,
            TokenKind::Quote {
                open: '\u{2018}',
                close: '\u{2019}'
            }
        );
    }

    #[test]
    fn pair_token() {
        let t = parse_one("(?)");
        assert_eq!(t.kind, TokenKind::Pair { open: '(', close: ')' });
    }

    #[test]
    fn unclosed_quote_is_parse_error() {
        assert_eq!(parse_err("\"?x"), PatternError::UnclosedQuote('"'));
    }

    #[test]
    fn unclosed_pair_is_parse_error() {
        assert_eq!(parse_err("[?x"), PatternError::UnclosedPair('['));
    }

    #[test]
    fn quote_without_question_mark_is_literal() {
        let t = parse_one("\"x\"");
        assert_eq!(t.kind, TokenKind::Grapheme("\"".to_string()));
    }

    // --- Quantifier headers ---

    #[test]
    fn exact_count() {
        let t = parse_one("{2digit}");
        assert_eq!(t.quantifier, Quantifier::Exactly(2));
    }

    #[test]
    fn range_count() {
        let t = parse_one("{2-3 digit}");
        assert_eq!(t.quantifier, Quantifier::Between(2, 3));
    }

    #[test]
    fn unbounded_count() {
        let t = parse_one("{4+ws}");
        assert_eq!(t.quantifier, Quantifier::AtLeast(4));
    }

    #[test]
    fn unspecified_bounds() {
        let t = parse_one("{digit}");
        assert_eq!(t.quantifier, Quantifier::Unspecified);
    }

    #[test]
    fn min_above_max_is_error() {
        assert_eq!(
            parse_err("{5-2 digit}"),
            PatternError::InvalidRepetition { min: 5, max: 2 }
        );
    }

    #[test]
    fn missing_brace_is_error() {
        assert_eq!(parse_err("{digit"), PatternError::MissingBrace);
    }

    // --- Names ---

    #[test]
    fn any_token() {
        let t = parse_one("{..}");
        assert_eq!(t.kind, TokenKind::Any);
    }

    #[test]
    fn negated_any_is_end_anchor() {
        let t = parse_one("{!..}");
        assert_eq!(t.kind, TokenKind::End);
        assert!(!t.negated);
        assert!(t.non_capturing);
    }

    #[test]
    fn anchors_non_capturing_unless_negated() {
        let start = parse_one("{start}");
        assert_eq!(start.kind, TokenKind::Start);
        assert!(start.non_capturing);
        let negated = parse_one("{!end}");
        assert_eq!(negated.kind, TokenKind::End);
        assert!(negated.negated);
        assert!(!negated.non_capturing);
    }

    #[test]
    fn keywords_case_insensitive() {
        let t = parse_one("{EMAIL}");
        assert_eq!(t.kind, TokenKind::Recognizer(Recognizer::Email));
        let t = parse_one("{Word}");
        assert_eq!(t.kind, TokenKind::Recognizer(Recognizer::Id));
    }

    #[test]
    fn negated_class() {
        let t = parse_one("{!ws}");
        assert!(t.negated);
        assert!(matches!(t.kind, TokenKind::Property(_)));
    }

    #[test]
    fn unicode_property_name() {
        let t = parse_one("{Lu}");
        assert!(matches!(t.kind, TokenKind::Property(_)));
    }

    #[test]
    fn unicode_character_name() {
        let t = parse_one("{BULLET}");
        assert_eq!(t.kind, TokenKind::Grapheme("\u{2022}".to_string()));
    }

    #[test]
    fn unknown_name_is_error() {
        assert!(matches!(
            parse_err("{zzznotathing}"),
            PatternError::UnknownName(_)
        ));
    }
}
