//! Unicode property and name lookups for the pattern language.
//!
//! Property membership is tested through the `regex` crate's `\p{...}`
//! classes, compiled on first use and cached per property name. Character
//! names go through `unicode_names2`. Quotation marks and bracket pairs are
//! mirrored through hand tables, since no crate exposes the pairing data
//! directly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;

thread_local! {
    static PROP_CACHE: RefCell<HashMap<String, Option<Rc<Regex>>>> =
        RefCell::new(HashMap::new());
}

/// A named Unicode property, usable as a membership test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyClass {
    name: String,
}

impl PropertyClass {
    /// Look up a property by name. Names are matched the way `\p{...}`
    /// accepts them; spaces and hyphens are treated as underscores.
    /// Returns `None` for names the Unicode tables don't know.
    pub fn by_name(name: &str) -> Option<PropertyClass> {
        let canon = name.trim().replace([' ', '-'], "_");
        if canon.is_empty() {
            return None;
        }
        compiled(&canon).map(|_| PropertyClass { name: canon })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Test whether `ch` has this property.
    pub fn contains(&self, ch: char) -> bool {
        match compiled(&self.name) {
            Some(re) => {
                let mut buf = [0u8; 4];
                re.is_match(ch.encode_utf8(&mut buf))
            }
            None => false,
        }
    }
}

/// Fetch (or build) the anchored `\p{name}` matcher for a property name.
fn compiled(name: &str) -> Option<Rc<Regex>> {
    PROP_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        cache
            .entry(name.to_string())
            .or_insert_with(|| {
                let pattern = format!(r"\A\p{{{}}}", name);
                Regex::new(&pattern).ok().map(Rc::new)
            })
            .clone()
    })
}

/// Well-known properties used by the pattern keywords and recognizers.
pub mod props {
    pub const DECIMAL_DIGIT: &str = "Nd";
    pub const WHITE_SPACE: &str = "White_Space";
    pub const EMOJI: &str = "Emoji";
    pub const XID_START: &str = "XID_Start";
    pub const XID_CONTINUE: &str = "XID_Continue";
}

pub fn is_alphabetic(ch: char) -> bool {
    ch.is_alphabetic()
}

/// Decimal-digit property (`Nd`), not just ASCII `0-9`.
pub fn is_decimal_digit(ch: char) -> bool {
    match compiled(props::DECIMAL_DIGIT) {
        Some(re) => {
            let mut buf = [0u8; 4];
            re.is_match(ch.encode_utf8(&mut buf))
        }
        None => false,
    }
}

/// Look up a character by its Unicode name (e.g. `BULLET`).
pub fn character_by_name(name: &str) -> Option<char> {
    unicode_names2::character(name)
        .or_else(|| unicode_names2::character(&name.to_ascii_uppercase()))
}

// Quotation marks that can open a quoted span, with their closing partner.
// Symmetric quotes close with themselves.
const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('`', '`'),
    ('\u{2018}', '\u{2019}'), // ‘ ’
    ('\u{201C}', '\u{201D}'), // “ ”
    ('\u{2039}', '\u{203A}'), // ‹ ›
    ('\u{00AB}', '\u{00BB}'), // « »
    ('\u{201A}', '\u{2018}'), // ‚ ‘
    ('\u{201E}', '\u{201C}'), // „ “
    ('\u{300C}', '\u{300D}'), // 「 」
    ('\u{300E}', '\u{300F}'), // 『 』
    ('\u{FF02}', '\u{FF02}'), // fullwidth "
    ('\u{FF07}', '\u{FF07}'), // fullwidth '
];

// Paired punctuation (bracket-likes), opener to closer.
const BRACKET_PAIRS: &[(char, char)] = &[
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('\u{27E8}', '\u{27E9}'), // ⟨ ⟩
    ('\u{27E6}', '\u{27E7}'), // ⟦ ⟧
    ('\u{27EA}', '\u{27EB}'), // ⟪ ⟫
    ('\u{2985}', '\u{2986}'), // ⦅ ⦆
    ('\u{2983}', '\u{2984}'), // ⦃ ⦄
    ('\u{3008}', '\u{3009}'), // 〈 〉
    ('\u{300A}', '\u{300B}'), // 《 》
    ('\u{3010}', '\u{3011}'), // 【 】
    ('\u{3014}', '\u{3015}'), // 〔 〕
    ('\u{3016}', '\u{3017}'), // 〖 〗
    ('\u{301A}', '\u{301B}'), // 〚 〛
    ('\u{FF08}', '\u{FF09}'), // （ ）
    ('\u{FF3B}', '\u{FF3D}'), // ［ ］
    ('\u{FF5B}', '\u{FF5D}'), // ｛ ｝
];

/// Is `ch` a quotation mark that can open a quoted-span token?
pub fn is_quotation_mark(ch: char) -> bool {
    QUOTE_PAIRS.iter().any(|&(open, _)| open == ch)
}

/// The closing quote for an opening quote, if `ch` is one.
pub fn closing_quote(ch: char) -> Option<char> {
    QUOTE_PAIRS
        .iter()
        .find(|&&(open, _)| open == ch)
        .map(|&(_, close)| close)
}

/// Is `ch` paired punctuation (either side of a bracket pair)?
pub fn is_paired_punctuation(ch: char) -> bool {
    BRACKET_PAIRS
        .iter()
        .any(|&(open, close)| open == ch || close == ch)
}

/// Is `ch` the left (opening) side of a bracket pair?
pub fn is_left_of_pair(ch: char) -> bool {
    BRACKET_PAIRS.iter().any(|&(open, _)| open == ch)
}

/// The closing bracket for an opening bracket, if `ch` is one.
pub fn closing_bracket(ch: char) -> Option<char> {
    BRACKET_PAIRS
        .iter()
        .find(|&&(open, _)| open == ch)
        .map(|&(_, close)| close)
}
