//! Built-in recognizers: specialized matchers behind pattern keywords such as
//! `{email}`, `{ipv4}` or `{num}`.
//!
//! Each recognizer is a pure function of the text and a start position,
//! returning the number of grapheme clusters consumed, or `None` on failure.

use crate::text::Text;
use crate::unicode::{self, PropertyClass, props};

/// Identity of a built-in recognizer. Dispatch is a closed match, not a
/// function pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognizer {
    Email,
    Ipv4,
    Ipv6,
    Ip,
    Host,
    Authority,
    Uri,
    Url,
    Id,
    Int,
    Num,
    Alphanumeric,
    Newline,
}

impl Recognizer {
    /// Run the recognizer at `pos`. Returns clusters consumed, or `None`.
    pub fn run(self, text: &Text, pos: usize) -> Option<usize> {
        match self {
            Recognizer::Email => match_email(text, pos),
            Recognizer::Ipv4 => match_ipv4(text, pos),
            Recognizer::Ipv6 => match_ipv6(text, pos),
            Recognizer::Ip => match_ip(text, pos),
            Recognizer::Host => match_host(text, pos),
            Recognizer::Authority => match_authority(text, pos),
            Recognizer::Uri => match_uri(text, pos),
            Recognizer::Url => match_url(text, pos),
            Recognizer::Id => match_id(text, pos),
            Recognizer::Int => match_int(text, pos),
            Recognizer::Num => match_num(text, pos),
            Recognizer::Alphanumeric => match_alphanumeric(text, pos),
            Recognizer::Newline => match_newline(text, pos),
        }
    }
}

// ─── Cluster-level helpers ───────────────────────────────────────────────────

/// The cluster at `i` when it is a single ASCII scalar.
fn ascii_at(text: &Text, i: usize) -> Option<char> {
    text.grapheme(i).and_then(|g| {
        if g.len() == 1 {
            g.chars().next()
        } else {
            None
        }
    })
}

/// True when the cluster at `i` exists and is not pure ASCII.
fn non_ascii_at(text: &Text, i: usize) -> bool {
    text.grapheme(i).is_some_and(|g| !g.is_ascii())
}

/// Consume the cluster at `*i` if it is the single ASCII char `ch`.
fn eat_char(text: &Text, i: &mut usize, ch: char) -> bool {
    if ascii_at(text, *i) == Some(ch) {
        *i += 1;
        true
    } else {
        false
    }
}

/// Consume the clusters spelling the ASCII string `s`, all or nothing.
fn eat_str(text: &Text, i: &mut usize, s: &str) -> bool {
    let mut n = 0;
    for ch in s.chars() {
        if ascii_at(text, *i + n) != Some(ch) {
            return false;
        }
        n += 1;
    }
    *i += n;
    true
}

/// Consume one cluster satisfying `pred` (which sees the single-ASCII char,
/// if any, and whether the cluster is non-ASCII).
fn eat_if(text: &Text, i: &mut usize, pred: impl Fn(Option<char>, bool) -> bool) -> bool {
    if *i >= text.len() {
        return false;
    }
    if pred(ascii_at(text, *i), non_ascii_at(text, *i)) {
        *i += 1;
        true
    } else {
        false
    }
}

/// Consume as many clusters satisfying `pred` as possible; returns the count.
fn eat_many(text: &Text, i: &mut usize, pred: impl Fn(Option<char>, bool) -> bool) -> usize {
    let mut n = 0;
    while eat_if(text, i, &pred) {
        n += 1;
    }
    n
}

fn is_hex(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_hexdigit())
}

fn is_digit(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_digit())
}

fn is_alnum(c: Option<char>) -> bool {
    c.is_some_and(|c| c.is_ascii_alphanumeric())
}

// ─── Recognizers ─────────────────────────────────────────────────────────────

// email = local "@" host
// local = 1-64 ([a-zA-Z0-9] | specials | non-ascii)
// host  = dns-label ("." dns-label)*, label 1-63, host total <= 255
fn match_email(text: &Text, pos: usize) -> Option<usize> {
    // Word-edge guard.
    if pos > 0 && text.main_char(pos - 1).is_some_and(unicode::is_alphabetic) {
        return None;
    }

    let mut i = pos;

    const ALLOWED_LOCAL: &str = "!#$%&\u{2018}*+\u{2013}/=?^_`.{|}~";
    let mut local_len = 0usize;
    while eat_if(text, &mut i, |c, non_ascii| {
        non_ascii || is_alnum(c) || c.is_some_and(|c| ALLOWED_LOCAL.contains(c))
    }) {
        local_len += 1;
        if local_len > 64 {
            return None;
        }
    }
    if local_len == 0 || !eat_char(text, &mut i, '@') {
        return None;
    }

    let mut host_len = 0usize;
    loop {
        let label_len = eat_many(text, &mut i, |c, non_ascii| {
            non_ascii || is_alnum(c) || c == Some('-')
        });
        if label_len == 0 || label_len > 63 {
            return None;
        }
        host_len += label_len;
        if host_len > 255 {
            return None;
        }
        host_len += 1; // account for the separating dot
        if !eat_char(text, &mut i, '.') {
            break;
        }
    }

    Some(i - pos)
}

fn match_ipv6(text: &Text, pos: usize) -> Option<usize> {
    // Don't start in the middle of a hex run or address.
    if pos > 0 {
        let prev = ascii_at(text, pos - 1);
        if is_hex(prev) || prev == Some(':') {
            return None;
        }
    }

    let mut i = pos;
    const NUM_GROUPS: usize = 8;
    let mut double_colon = false;
    for group in 0..NUM_GROUPS {
        for _ in 0..4 {
            if !eat_if(text, &mut i, |c, _| is_hex(c)) {
                break;
            }
        }
        if eat_if(text, &mut i, |c, _| is_hex(c)) {
            return None; // five hex digits in a group
        }

        if group == NUM_GROUPS - 1 {
            break;
        }
        if !eat_char(text, &mut i, ':') {
            if double_colon {
                break;
            }
            return None;
        }
        if eat_char(text, &mut i, ':') {
            if double_colon {
                return None;
            }
            double_colon = true;
        }
    }
    Some(i - pos)
}

fn match_ipv4(text: &Text, pos: usize) -> Option<usize> {
    // Don't start in the middle of a digit run or dotted sequence.
    if pos > 0 {
        let prev = ascii_at(text, pos - 1);
        if is_digit(prev) || prev == Some('.') {
            return None;
        }
    }

    let mut i = pos;
    const NUM_GROUPS: usize = 4;
    for group in 0..NUM_GROUPS {
        let mut digits = 0;
        for _ in 0..3 {
            if !eat_if(text, &mut i, |c, _| is_digit(c)) {
                break;
            }
            digits += 1;
        }
        if digits == 0 {
            return None;
        }
        if eat_if(text, &mut i, |c, _| is_digit(c)) {
            return None; // four digits in a group
        }
        if group == NUM_GROUPS - 1 {
            break;
        }
        if !eat_char(text, &mut i, '.') {
            return None;
        }
    }
    Some(i - pos)
}

fn match_ip(text: &Text, pos: usize) -> Option<usize> {
    match_ipv6(text, pos).or_else(|| match_ipv4(text, pos))
}

const NON_HOST: &str = "/#?:@ \t\r\n<>[]{}\\^|\"`";

fn match_host(text: &Text, pos: usize) -> Option<usize> {
    if let Some(len) = match_ip(text, pos).filter(|&len| len > 0) {
        return Some(len);
    }

    let mut i = pos;
    if eat_char(text, &mut i, '[') {
        let ip_len = match_ip(text, i).filter(|&len| len > 0)?;
        i += ip_len;
        if eat_char(text, &mut i, ']') {
            return Some(i - pos);
        }
        return None;
    }

    if !eat_if(text, &mut i, |c, _| c.is_some_and(|c| c.is_ascii_alphabetic())) {
        return None;
    }
    eat_many(text, &mut i, |c, non_ascii| {
        non_ascii || c.is_some_and(|c| !NON_HOST.contains(c))
    });
    Some(i - pos)
}

fn match_authority(text: &Text, pos: usize) -> Option<usize> {
    const NON_SEGMENT: &str = "/#?:@ \t\r\n<>[]{}\\^|\"`.";

    let mut i = pos;

    // Optional user@ prefix.
    let user_len = eat_many(text, &mut i, |c, non_ascii| {
        non_ascii || c.is_some_and(|c| !NON_SEGMENT.contains(c))
    });
    if user_len < 1 || !eat_char(text, &mut i, '@') {
        i = pos; // no user part
    }

    let host_len = match_host(text, i).filter(|&len| len > 0)?;
    i += host_len;

    if eat_char(text, &mut i, ':') && eat_many(text, &mut i, |c, _| is_digit(c)) == 0 {
        return None;
    }
    Some(i - pos)
}

// URI = scheme ":" ["//" authority] path ["?" query] ["#" fragment]
fn match_uri(text: &Text, pos: usize) -> Option<usize> {
    // Word-edge guard.
    if pos > 0 && text.main_char(pos - 1).is_some_and(unicode::is_alphabetic) {
        return None;
    }

    let mut i = pos;

    // Scheme.
    if !eat_if(text, &mut i, |c, _| c.is_some_and(|c| c.is_ascii_alphabetic())) {
        return None;
    }
    eat_many(text, &mut i, |c, _| {
        is_alnum(c) || matches!(c, Some('+') | Some('.') | Some('-'))
    });
    if !eat_char(text, &mut i, ':') {
        return None;
    }

    // Authority.
    let mut authority_len = 0;
    if eat_str(text, &mut i, "//") {
        if let Some(len) = match_authority(text, i).filter(|&len| len > 0) {
            authority_len = len;
            i += len;
        }
    }

    // Path, query, fragment.
    let path_start = i;
    if eat_char(text, &mut i, '/') || authority_len == 0 {
        const NON_PATH: &str = " \"#?<>[]{}\\^`|";
        eat_many(text, &mut i, |c, non_ascii| {
            non_ascii || c.is_some_and(|c| !NON_PATH.contains(c))
        });

        const NON_QUERY: &str = " \"#<>[]{}\\^`|";
        if eat_char(text, &mut i, '?') {
            eat_many(text, &mut i, |c, non_ascii| {
                non_ascii || c.is_some_and(|c| !NON_QUERY.contains(c))
            });
        }
        if eat_char(text, &mut i, '#') {
            eat_many(text, &mut i, |c, non_ascii| {
                non_ascii || c.is_some_and(|c| !NON_QUERY.contains(c))
            });
        }
    }

    if authority_len == 0 && i == path_start {
        return None;
    }
    Some(i - pos)
}

fn match_url(text: &Text, pos: usize) -> Option<usize> {
    const SCHEMES: &[&str] = &["https:", "http:", "ftp:", "wss:", "ws:"];
    let mut lookahead = pos;
    if !SCHEMES.iter().any(|s| eat_str(text, &mut lookahead, s)) {
        return None;
    }
    match_uri(text, pos)
}

fn match_id(text: &Text, pos: usize) -> Option<usize> {
    let xid_start = PropertyClass::by_name(props::XID_START)?;
    let xid_continue = PropertyClass::by_name(props::XID_CONTINUE)?;

    if !text.main_char(pos).is_some_and(|c| xid_start.contains(c)) {
        return None;
    }
    let mut i = pos + 1;
    while text.main_char(i).is_some_and(|c| xid_continue.contains(c)) {
        i += 1;
    }
    Some(i - pos)
}

fn match_int(text: &Text, pos: usize) -> Option<usize> {
    // Don't restart inside a number: "2023-06" is not "2023" then "-06".
    if pos > 0 && text.main_char(pos - 1).is_some_and(unicode::is_decimal_digit) {
        return None;
    }
    let mut i = pos;
    let negative = eat_char(text, &mut i, '-');
    let digits = eat_decimal_digits(text, &mut i);
    if digits == 0 {
        return None;
    }
    Some(usize::from(negative) + digits)
}

fn match_num(text: &Text, pos: usize) -> Option<usize> {
    let mut i = pos;
    let negative = eat_char(text, &mut i, '-');
    let pre = eat_decimal_digits(text, &mut i);
    let point = eat_char(text, &mut i, '.');
    let post = if point {
        eat_decimal_digits(text, &mut i)
    } else {
        0
    };
    if pre == 0 && post == 0 {
        return None;
    }
    Some(usize::from(negative) + pre + usize::from(point) + post)
}

/// Consume clusters whose main scalar has the decimal-digit property.
fn eat_decimal_digits(text: &Text, i: &mut usize) -> usize {
    let mut n = 0;
    while text.main_char(*i).is_some_and(unicode::is_decimal_digit) {
        *i += 1;
        n += 1;
    }
    n
}

fn match_alphanumeric(text: &Text, pos: usize) -> Option<usize> {
    let c = text.main_char(pos)?;
    if c.is_alphabetic() || c.is_numeric() {
        Some(1)
    } else {
        None
    }
}

fn match_newline(text: &Text, pos: usize) -> Option<usize> {
    match text.grapheme(pos)? {
        // CRLF is a single grapheme cluster under UAX #29.
        "\n" | "\r\n" => Some(1),
        "\r" if text.grapheme(pos + 1) == Some("\n") => Some(2),
        _ => None,
    }
}
