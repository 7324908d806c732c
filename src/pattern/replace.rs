//! Replacement: backreference substitution, ordered rule lists, callback
//! mapping, and pattern escaping.
//!
//! Backreferences in replacement text are a caller-chosen marker pattern
//! followed by a single digit `0`-`9` (slot 0 is the whole match), with an
//! optional `;` separator. Captures made by Pair tokens re-enter the full
//! rule list before substitution when recursion is on, which is what makes
//! nested bracketed-expression rewriting work.

use crate::text::Text;
use crate::unicode;

use super::matcher::{CaptureSlots, Match, match_sequence};
use super::parser::{PatternError, parse_int};
use super::search::Pattern;

/// One replacement rule. In a rule list, earlier rules win at any given
/// position.
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Pattern,
    pub replacement: Text,
}

impl Rule {
    pub fn new(pattern: impl Into<Text>, replacement: impl Into<Text>) -> Self {
        Self {
            pattern: Pattern::new(pattern),
            replacement: replacement.into(),
        }
    }
}

impl Pattern {
    /// Replace every match with `replacement`, substituting backreferences
    /// marked by `backref`.
    ///
    /// Matches are found left to right and never overlap; a zero-length
    /// match still advances the scan by one cluster. With `recursive`, Pair
    /// captures are rewritten by the same rule before substitution.
    pub fn replace(
        &self,
        text: &Text,
        replacement: &Text,
        backref: &Pattern,
        recursive: bool,
    ) -> Result<Text, PatternError> {
        let rule = [Rule {
            pattern: self.clone(),
            replacement: replacement.clone(),
        }];
        let recursive_rules: &[Rule] = if recursive { &rule } else { &[] };

        let prefilter = self.prefilter();
        let mut out = String::new();
        let mut nonmatching = 0usize;
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some(g) = prefilter {
                while pos < text.len() && text.grapheme(pos) != Some(g) {
                    pos += 1;
                }
            }

            let mut slots = CaptureSlots::new();
            let Some(len) = match_sequence(text, pos, &self.text, 0, Some(&mut slots), 1)? else {
                pos += 1;
                continue;
            };
            slots.set_whole_match(pos, len);

            let substituted =
                apply_backrefs(text, recursive_rules, replacement, backref, &slots)?;
            if pos > nonmatching {
                out.push_str(text.slice(nonmatching, pos - nonmatching).as_str());
            }
            out.push_str(substituted.as_str());
            nonmatching = pos + len;
            pos += len.max(1);
        }
        if nonmatching < text.len() {
            out.push_str(text.slice(nonmatching, text.len() - nonmatching).as_str());
        }
        Ok(Text::new(&out))
    }

    /// Replace every match with the result of `f`, scanning like
    /// [`replace`](Self::replace).
    ///
    /// With `recursive`, each capture is itself mapped, bottom-up, before
    /// the enclosing match is handed to `f`; the captures `f` sees already
    /// reflect the substitution, the enclosing matched span does not.
    pub fn map<F>(&self, text: &Text, recursive: bool, mut f: F) -> Result<Text, PatternError>
    where
        F: FnMut(&Match) -> Text,
    {
        self.map_inner(text, recursive, &mut f)
    }

    fn map_inner(
        &self,
        text: &Text,
        recursive: bool,
        f: &mut dyn FnMut(&Match) -> Text,
    ) -> Result<Text, PatternError> {
        let prefilter = self.prefilter();
        let mut out = String::new();
        let mut nonmatching = 0usize;
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some(g) = prefilter {
                while pos < text.len() && text.grapheme(pos) != Some(g) {
                    pos += 1;
                }
            }

            let mut slots = CaptureSlots::new();
            let Some(len) = match_sequence(text, pos, &self.text, 0, Some(&mut slots), 0)? else {
                pos += 1;
                continue;
            };

            let mut captures = Vec::new();
            for c in slots.occupied() {
                let mut capture = text.slice(c.index, c.length);
                if recursive {
                    capture = self.map_inner(&capture, recursive, f)?;
                }
                captures.push(capture);
            }
            let m = Match {
                index: pos + 1,
                text: text.slice(pos, len),
                captures,
            };
            let substituted = f(&m);

            if pos > nonmatching {
                out.push_str(text.slice(nonmatching, pos - nonmatching).as_str());
            }
            out.push_str(substituted.as_str());
            nonmatching = pos + len;
            pos += len.max(1);
        }
        if nonmatching < text.len() {
            out.push_str(text.slice(nonmatching, text.len() - nonmatching).as_str());
        }
        Ok(Text::new(&out))
    }

    /// Call `f` for every match, for side effects only.
    ///
    /// With `recursive`, captures are visited bottom-up before the
    /// enclosing match.
    pub fn each<F>(&self, text: &Text, recursive: bool, mut f: F) -> Result<(), PatternError>
    where
        F: FnMut(&Match),
    {
        self.each_inner(text, recursive, &mut f)
    }

    fn each_inner(
        &self,
        text: &Text,
        recursive: bool,
        f: &mut dyn FnMut(&Match),
    ) -> Result<(), PatternError> {
        let prefilter = self.prefilter();
        let mut pos = 0usize;
        while pos < text.len() {
            if let Some(g) = prefilter {
                while pos < text.len() && text.grapheme(pos) != Some(g) {
                    pos += 1;
                }
            }

            let mut slots = CaptureSlots::new();
            let Some(len) = match_sequence(text, pos, &self.text, 0, Some(&mut slots), 0)? else {
                pos += 1;
                continue;
            };

            let mut captures = Vec::new();
            for c in slots.occupied() {
                let capture = text.slice(c.index, c.length);
                if recursive {
                    self.each_inner(&capture, recursive, f)?;
                }
                captures.push(capture);
            }
            f(&Match {
                index: pos + 1,
                text: text.slice(pos, len),
                captures,
            });
            pos += len.max(1);
        }
        Ok(())
    }

    /// Strip one leading match and/or all trailing match-to-end spans.
    pub fn trim(
        &self,
        text: &Text,
        trim_left: bool,
        trim_right: bool,
    ) -> Result<Text, PatternError> {
        let mut first = 0usize;
        let mut last = text.len();

        if trim_left
            && let Some(len) = match_sequence(text, 0, &self.text, 0, None, 0)?
            && len > 0
        {
            first = len;
        }

        if trim_right {
            for i in (first..text.len()).rev() {
                if let Some(len) = match_sequence(text, i, &self.text, 0, None, 0)?
                    && len > 0
                    && i + len == text.len()
                {
                    last = i;
                }
            }
        }
        Ok(text.slice(first, last.saturating_sub(first)))
    }

    /// A pattern matching `text` literally: `{` and every grapheme that
    /// could begin a token (`?`, quotation marks, opening brackets) is
    /// wrapped in a `{1g}` literal form.
    pub fn escape(text: &Text) -> Pattern {
        let mut out = String::new();
        for g in text.graphemes() {
            let main = g.chars().next();
            if g == "{" {
                out.push_str("{1{}");
            } else if g == "?"
                || main.is_some_and(|c| {
                    unicode::is_quotation_mark(c) || unicode::is_left_of_pair(c)
                })
            {
                out.push_str("{1");
                out.push_str(g);
                out.push('}');
            } else {
                out.push_str(g);
            }
        }
        Pattern::new(&*out)
    }
}

/// Apply every rule, first match wins at each position, left to right.
///
/// This is the multi-rule replacement pass that recursive backreferences
/// re-enter.
pub fn replace_all(
    text: &Text,
    rules: &[Rule],
    backref: &Pattern,
    recursive: bool,
) -> Result<Text, PatternError> {
    if rules.is_empty() {
        return Ok(text.clone());
    }

    let mut out = String::new();
    let mut nonmatching = 0usize;
    let mut pos = 0usize;
    'scan: while pos < text.len() {
        for rule in rules {
            let mut slots = CaptureSlots::new();
            let Some(len) =
                match_sequence(text, pos, &rule.pattern.text, 0, Some(&mut slots), 1)?
            else {
                continue;
            };
            slots.set_whole_match(pos, len);

            if pos > nonmatching {
                out.push_str(text.slice(nonmatching, pos - nonmatching).as_str());
            }
            let recursive_rules: &[Rule] = if recursive { rules } else { &[] };
            let substituted =
                apply_backrefs(text, recursive_rules, &rule.replacement, backref, &slots)?;
            out.push_str(substituted.as_str());
            pos += len.max(1);
            nonmatching = pos;
            continue 'scan;
        }
        pos += 1;
    }
    if nonmatching < text.len() {
        out.push_str(text.slice(nonmatching, text.len() - nonmatching).as_str());
    }
    Ok(Text::new(&out))
}

/// Substitute backreferences in `replacement` from `captures`.
///
/// `text` is the subject the captures index into. A marker match not
/// followed by a digit is not a backreference and is copied verbatim.
fn apply_backrefs(
    text: &Text,
    recursive_rules: &[Rule],
    replacement: &Text,
    backref: &Pattern,
    captures: &CaptureSlots,
) -> Result<Text, PatternError> {
    if backref.text.is_empty() {
        return Ok(replacement.clone());
    }

    let prefilter = backref.prefilter();
    let mut out = String::new();
    let mut nonmatching = 0usize;
    let mut pos = 0usize;
    while pos < replacement.len() {
        if let Some(g) = prefilter {
            while pos < replacement.len() && replacement.grapheme(pos) != Some(g) {
                pos += 1;
            }
        }

        let Some(marker_len) = match_sequence(replacement, pos, &backref.text, 0, None, 0)? else {
            pos += 1;
            continue;
        };

        let mut after = pos + marker_len;
        let number = parse_int(replacement, &mut after);
        if after == pos + marker_len {
            // A marker with no number is not a backref.
            pos += 1;
            continue;
        }
        if number > 9 {
            return Err(PatternError::InvalidBackref(number as i64));
        }
        let mut backref_len = after - pos;
        if replacement.grapheme(pos + backref_len) == Some(";") {
            backref_len += 1; // the separator is consumed, not copied
        }

        let capture = captures
            .get(number)
            .ok_or(PatternError::UnsetCapture(number))?;
        let mut capture_text = text.slice(capture.index, capture.length);
        if capture.recursive && !recursive_rules.is_empty() {
            capture_text = replace_all(&capture_text, recursive_rules, backref, true)?;
        }

        if pos > nonmatching {
            out.push_str(replacement.slice(nonmatching, pos - nonmatching).as_str());
        }
        out.push_str(capture_text.as_str());
        pos += backref_len;
        nonmatching = pos;
    }
    if nonmatching < replacement.len() {
        out.push_str(
            replacement
                .slice(nonmatching, replacement.len() - nonmatching)
                .as_str(),
        );
    }
    Ok(Text::new(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(text: &str, pattern: &str, replacement: &str) -> String {
        Pattern::new(pattern)
            .replace(&Text::new(text), &Text::new(replacement), &Pattern::new("\\"), false)
            .unwrap()
            .as_str()
            .to_string()
    }

    // --- replace ---

    #[test]
    fn replace_every_int_with_hash() {
        assert_eq!(replace("2023-06-01", "{int}", "#"), "#-#-#");
    }

    #[test]
    fn replace_keeps_unmatched_text() {
        assert_eq!(replace("a1b22c", "{digit}", "."), "a.b.c");
        assert_eq!(replace("abc", "{digit}", "."), "abc");
    }

    #[test]
    fn replace_with_backref_to_whole_match() {
        assert_eq!(replace("a1b", "{digit}", "<\\0>"), "a<1>b");
    }

    #[test]
    fn replace_backref_swaps_captures() {
        assert_eq!(replace("foo:bar", "{id}:{id}", "\\2:\\1"), "bar:foo");
    }

    #[test]
    fn replace_backref_semicolon_separator() {
        assert_eq!(replace("a1b", "{digit}", "\\1;x"), "a1xb");
    }

    #[test]
    fn replace_marker_without_digit_is_verbatim() {
        assert_eq!(replace("a1b", "{digit}", "\\x"), "a\\xb");
    }

    #[test]
    fn replace_zero_length_matches_advance() {
        // {0-1 digit} matches zero-length at every non-digit position.
        assert_eq!(replace("ab", "{0-1 digit}", "-"), "-a-b");
    }

    #[test]
    fn replace_invalid_backref_is_error() {
        let err = Pattern::new("{digit}")
            .replace(
                &Text::new("1"),
                &Text::new("\\12"),
                &Pattern::new("\\"),
                false,
            )
            .unwrap_err();
        assert_eq!(err, PatternError::InvalidBackref(12));
    }

    #[test]
    fn replace_unset_capture_is_error() {
        let err = Pattern::new("{digit}")
            .replace(
                &Text::new("1"),
                &Text::new("\\3"),
                &Pattern::new("\\"),
                false,
            )
            .unwrap_err();
        assert_eq!(err, PatternError::UnsetCapture(3));
    }

    #[test]
    fn replace_with_custom_marker() {
        let out = Pattern::new("{id}")
            .replace(
                &Text::new("hi"),
                &Text::new("[@0]"),
                &Pattern::new("@"),
                false,
            )
            .unwrap();
        assert_eq!(out, "[hi]");
    }

    // --- recursive replacement ---

    #[test]
    fn recursive_pair_rewrite() {
        // Rewrite nested brackets inside-out: [x] -> (x), recursively.
        let out = Pattern::new("[?]")
            .replace(
                &Text::new("a[b[c]d]e"),
                &Text::new("(\\1)"),
                &Pattern::new("\\"),
                true,
            )
            .unwrap();
        assert_eq!(out, "a(b(c)d)e");
    }

    #[test]
    fn non_recursive_pair_substitutes_raw_capture() {
        let out = Pattern::new("[?]")
            .replace(
                &Text::new("a[b[c]d]e"),
                &Text::new("(\\1)"),
                &Pattern::new("\\"),
                false,
            )
            .unwrap();
        assert_eq!(out, "a(b[c]d)e");
    }

    // --- replace_all ---

    #[test]
    fn rule_list_first_match_wins() {
        let rules = [Rule::new("ab", "X"), Rule::new("a", "Y")];
        let out = replace_all(&Text::new("aab"), &rules, &Pattern::new("\\"), false).unwrap();
        assert_eq!(out, "YX");
    }

    #[test]
    fn rule_list_priority_not_longest() {
        // The earlier, shorter rule shadows the longer one.
        let rules = [Rule::new("a", "Y"), Rule::new("ab", "X")];
        let out = replace_all(&Text::new("ab"), &rules, &Pattern::new("\\"), false).unwrap();
        assert_eq!(out, "Yb");
    }

    #[test]
    fn empty_rule_list_is_identity() {
        let out = replace_all(&Text::new("abc"), &[], &Pattern::new("\\"), false).unwrap();
        assert_eq!(out, "abc");
    }

    // --- map / each ---

    #[test]
    fn map_transforms_matches() {
        let out = Pattern::new("{digit}")
            .map(&Text::new("a1b2"), false, |m| {
                Text::new(&format!("<{}>", m.text))
            })
            .unwrap();
        assert_eq!(out, "a<1>b<2>");
    }

    #[test]
    fn map_recursive_substitutes_captures_first() {
        // Every bracketed span becomes its capture wrapped in braces; inner
        // spans are rewritten before the outer callback sees them.
        let out = Pattern::new("[?]")
            .map(&Text::new("x[a[b]c]y"), true, |m| {
                Text::new(&format!("{{{}}}", m.captures[0]))
            })
            .unwrap();
        assert_eq!(out, "x{a{b}c}y");
    }

    #[test]
    fn each_visits_matches_in_order() {
        let mut seen = Vec::new();
        Pattern::new("{digit}")
            .each(&Text::new("a1b2"), false, |m| {
                seen.push((m.index, m.text.as_str().to_string()));
            })
            .unwrap();
        assert_eq!(seen, vec![(2, "1".to_string()), (4, "2".to_string())]);
    }

    #[test]
    fn each_recursive_visits_bottom_up() {
        let mut seen = Vec::new();
        Pattern::new("[?]")
            .each(&Text::new("[a[b]]"), true, |m| {
                seen.push(m.text.as_str().to_string());
            })
            .unwrap();
        assert_eq!(seen, vec!["[b]".to_string(), "[a[b]]".to_string()]);
    }

    // --- trim ---

    #[test]
    fn trim_both_sides() {
        let p = Pattern::new("{ws}");
        let out = p.trim(&Text::new("  hello  "), true, true).unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn trim_one_side() {
        let p = Pattern::new("{ws}");
        assert_eq!(p.trim(&Text::new(" x "), true, false).unwrap(), "x ");
        assert_eq!(p.trim(&Text::new(" x "), false, true).unwrap(), " x");
    }

    // --- escape ---

    #[test]
    fn escape_wraps_special_graphemes() {
        let p = Pattern::escape(&Text::new("a{b?c(d"));
        assert_eq!(p.as_text().as_str(), "a{1{}b{1?}c{1(}d");
    }

    #[test]
    fn escape_round_trip_matches_original() {
        for s in ["plain", "{2-3 digit}", "say \"hi\" (now)?", "[?]\\{..}"] {
            let text = Text::new(s);
            let p = Pattern::escape(&text);
            assert!(
                p.matches(&text).unwrap(),
                "escape({s:?}) should match the original"
            );
        }
    }
}
