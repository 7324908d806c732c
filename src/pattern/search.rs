//! Searching and splitting: the public operations that scan a text for
//! pattern matches.
//!
//! All positions handed to callers are 1-based grapheme indices; internal
//! scanning is 0-based.

use std::fmt;

use crate::text::Text;
use crate::unicode;

use super::matcher::{CaptureSlots, Match, match_sequence};
use super::parser::PatternError;

/// A pattern in the matching mini-language.
///
/// The pattern text is interpreted directly on every match attempt; parse
/// errors therefore surface from the operation that hits them, not from
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub(crate) text: Text,
}

impl Pattern {
    pub fn new(pattern: impl Into<Text>) -> Self {
        Self {
            text: pattern.into(),
        }
    }

    /// The pattern source text.
    pub fn as_text(&self) -> &Text {
        &self.text
    }

    /// The literal first grapheme to skip ahead to during scans, when the
    /// pattern starts with one (not a brace, quote, or bracket form).
    pub(crate) fn prefilter(&self) -> Option<&str> {
        let g = self.text.grapheme(0)?;
        let main = g.chars().next()?;
        if g == "{" || unicode::is_quotation_mark(main) || unicode::is_paired_punctuation(main) {
            None
        } else {
            Some(g)
        }
    }

    /// Scan start positions in `from..text.len()` for the leftmost match.
    /// Returns the 0-based start and consumed length.
    fn find_at(
        &self,
        text: &Text,
        from: usize,
        captures: Option<&mut CaptureSlots>,
    ) -> Result<Option<(usize, usize)>, PatternError> {
        let prefilter = self.prefilter();
        let mut captures = captures;
        let mut i = from;
        while i < text.len() {
            if let Some(g) = prefilter {
                while i < text.len() && text.grapheme(i) != Some(g) {
                    i += 1;
                }
            }
            if let Some(len) =
                match_sequence(text, i, &self.text, 0, captures.as_deref_mut(), 0)?
            {
                return Ok(Some((i, len)));
            }
            i += 1;
        }
        Ok(None)
    }

    /// Like [`find_at`](Self::find_at), without captures.
    pub(crate) fn find_span(
        &self,
        text: &Text,
        from: usize,
    ) -> Result<Option<(usize, usize)>, PatternError> {
        self.find_at(text, from, None)
    }

    /// Find the first match at or after the 1-based index `from`.
    ///
    /// Negative indices count back from the end of the text; 0 is invalid.
    pub fn find(&self, text: &Text, from: i64) -> Result<Option<Match>, PatternError> {
        if from == 0 {
            return Err(PatternError::InvalidStartIndex);
        }
        let first = if from < 0 {
            text.len() as i64 + from + 1
        } else {
            from
        };
        if first < 1 || first > text.len() as i64 {
            return Ok(None);
        }

        let mut slots = CaptureSlots::new();
        match self.find_at(text, first as usize - 1, Some(&mut slots))? {
            Some((at, len)) => Ok(Some(Match {
                index: at + 1,
                text: text.slice(at, len),
                captures: collect_captures(text, &slots),
            })),
            None => Ok(None),
        }
    }

    /// Does the pattern match anywhere in the text?
    ///
    /// A `{start}`-led pattern is only tried at the start; a `{end}`-ended
    /// pattern is scanned backward testing match-to-end.
    pub fn has(&self, text: &Text) -> Result<bool, PatternError> {
        if self.text.as_str().starts_with("{start}") {
            Ok(match_sequence(text, 0, &self.text, 0, None, 0)?.is_some())
        } else if self.text.as_str().ends_with("{end}") {
            for i in (0..text.len()).rev() {
                if let Some(len) = match_sequence(text, i, &self.text, 0, None, 0)?
                    && i + len == text.len()
                {
                    return Ok(true);
                }
            }
            Ok(false)
        } else {
            Ok(self.find_span(text, 0)?.is_some())
        }
    }

    /// Does the pattern match the whole text?
    pub fn matches(&self, text: &Text) -> Result<bool, PatternError> {
        Ok(match_sequence(text, 0, &self.text, 0, None, 0)? == Some(text.len()))
    }

    /// Test for a match starting exactly at the 1-based position `pos`.
    pub fn match_at(&self, text: &Text, pos: usize) -> Result<Option<Match>, PatternError> {
        if pos == 0 {
            return Err(PatternError::InvalidStartIndex);
        }
        let start = pos - 1;
        if start > text.len() {
            return Ok(None);
        }
        let mut slots = CaptureSlots::new();
        match match_sequence(text, start, &self.text, 0, Some(&mut slots), 0)? {
            Some(len) => Ok(Some(Match {
                index: pos,
                text: text.slice(start, len),
                captures: collect_captures(text, &slots),
            })),
            None => Ok(None),
        }
    }

    /// The capture list of a whole-text match, or `None` if the pattern
    /// does not consume the entire text.
    pub fn captures(&self, text: &Text) -> Result<Option<Vec<Text>>, PatternError> {
        let mut slots = CaptureSlots::new();
        match match_sequence(text, 0, &self.text, 0, Some(&mut slots), 0)? {
            Some(len) if len == text.len() => Ok(Some(collect_captures(text, &slots))),
            _ => Ok(None),
        }
    }

    /// All non-overlapping matches, left to right.
    ///
    /// The scan advances by at least one cluster past each match, so
    /// zero-length matches make progress. An empty pattern yields an empty
    /// list.
    pub fn find_all(&self, text: &Text) -> Result<Vec<Match>, PatternError> {
        if self.text.is_empty() {
            return Ok(Vec::new());
        }
        let mut matches = Vec::new();
        let mut from = 1usize;
        while let Some(m) = self.find(text, from as i64)? {
            from = m.index + m.text.len().max(1);
            matches.push(m);
        }
        Ok(matches)
    }

    /// Iterate over matches with an owned forward cursor.
    ///
    /// The iterator is single-owner and forward-only.
    pub fn by_match(&self, text: &Text) -> MatchIter {
        MatchIter {
            pattern: self.clone(),
            text: text.clone(),
            pos: 1,
        }
    }

    /// Split the text around matches, keeping empty chunks.
    ///
    /// An empty text yields no chunks; an empty pattern yields one chunk per
    /// grapheme cluster. A zero-length match at the current position is
    /// retried one position later so every position cannot split.
    pub fn split(&self, text: &Text) -> Result<Vec<Text>, PatternError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        if self.text.is_empty() {
            return Ok(text.graphemes().map(Text::new).collect());
        }

        let mut chunks = Vec::new();
        let mut i = 0usize;
        loop {
            let mut found = self.find_span(text, i)?;
            if found == Some((i, 0)) {
                found = self.find_span(text, i + 1)?;
            }
            let Some((at, len)) = found else {
                break;
            };
            chunks.push(text.slice(i, at - i));
            i = (at + len).max(i + 1);
        }
        chunks.push(text.slice(i, text.len() - i));
        Ok(chunks)
    }

    /// Iterate over split chunks with an owned forward cursor.
    pub fn by_split(&self, text: &Text) -> SplitIter {
        SplitIter {
            pattern: self.clone(),
            text: text.clone(),
            pos: 0,
            done: false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.text.as_str();
        let quote = if s.contains('/') && !s.contains('|') {
            '|'
        } else {
            '/'
        };
        write!(f, "${quote}{s}{quote}")
    }
}

pub(crate) fn collect_captures(text: &Text, slots: &CaptureSlots) -> Vec<Text> {
    slots
        .occupied()
        .map(|c| text.slice(c.index, c.length))
        .collect()
}

/// Iterator over successive matches. See [`Pattern::by_match`].
pub struct MatchIter {
    pattern: Pattern,
    text: Text,
    /// 1-based next search position.
    pos: usize,
}

impl Iterator for MatchIter {
    type Item = Result<Match, PatternError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos > self.text.len() {
            return None;
        }
        match self.pattern.find(&self.text, self.pos as i64) {
            Ok(Some(m)) => {
                self.pos = m.index + m.text.len().max(1);
                Some(Ok(m))
            }
            Ok(None) => {
                self.pos = self.text.len() + 1;
                None
            }
            Err(err) => {
                self.pos = self.text.len() + 1;
                Some(Err(err))
            }
        }
    }
}

/// Iterator over split chunks. See [`Pattern::by_split`].
pub struct SplitIter {
    pattern: Pattern,
    text: Text,
    /// 0-based start of the next chunk.
    pos: usize,
    done: bool,
}

impl Iterator for SplitIter {
    type Item = Result<Text, PatternError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let len = self.text.len();

        if self.pos >= len {
            self.done = true;
            if !self.pattern.text.is_empty() && self.pos == len {
                // A match consumed through the very end: one trailing empty
                // chunk.
                return Some(Ok(Text::new("")));
            }
            return None;
        }

        if self.pattern.text.is_empty() {
            let chunk = self.text.slice(self.pos, 1);
            self.pos += 1;
            return Some(Ok(chunk));
        }

        let start = self.pos;
        let mut found = match self.pattern.find_span(&self.text, start) {
            Ok(found) => found,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };
        if found == Some((start, 0)) {
            found = match self.pattern.find_span(&self.text, start + 1) {
                Ok(found) => found,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
        }

        match found {
            Some((at, match_len)) => {
                self.pos = (at + match_len).max(self.pos + 1);
                Some(Ok(self.text.slice(start, at - start)))
            }
            None => {
                self.done = true;
                Some(Ok(self.text.slice(start, len - start)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(text: &str, pattern: &str, from: i64) -> Option<(usize, String)> {
        Pattern::new(pattern)
            .find(&Text::new(text), from)
            .unwrap()
            .map(|m| (m.index, m.text.as_str().to_string()))
    }

    fn split(text: &str, pattern: &str) -> Vec<String> {
        Pattern::new(pattern)
            .split(&Text::new(text))
            .unwrap()
            .into_iter()
            .map(|t| t.as_str().to_string())
            .collect()
    }

    // --- find ---

    #[test]
    fn find_first() {
        assert_eq!(find("one two", "{id}", 1), Some((1, "one".to_string())));
    }

    #[test]
    fn find_from_index() {
        assert_eq!(find("one two", "{id}", 3), Some((3, "e".to_string())));
        assert_eq!(find("one two", "{id}", 5), Some((5, "two".to_string())));
    }

    #[test]
    fn find_negative_index_counts_from_end() {
        assert_eq!(find("one two", "{id}", -3), Some((5, "two".to_string())));
    }

    #[test]
    fn find_zero_index_is_error() {
        assert_eq!(
            Pattern::new("x").find(&Text::new("x"), 0),
            Err(PatternError::InvalidStartIndex)
        );
    }

    #[test]
    fn find_past_end_is_none() {
        assert_eq!(find("abc", "a", 4), None);
        assert_eq!(find("", "a", 1), None);
    }

    #[test]
    fn find_returns_captures() {
        let m = Pattern::new("{int}-{int}")
            .find(&Text::new("date 2023-06"), 1)
            .unwrap()
            .unwrap();
        assert_eq!(m.index, 6);
        assert_eq!(m.captures, vec![Text::new("2023"), Text::new("06")]);
    }

    // --- has / matches / captures / match_at ---

    #[test]
    fn has_plain() {
        let p = Pattern::new("{digit}");
        assert!(p.has(&Text::new("abc1")).unwrap());
        assert!(!p.has(&Text::new("abc")).unwrap());
    }

    #[test]
    fn has_start_anchor_only_tries_position_zero() {
        let p = Pattern::new("{start}ab");
        assert!(p.has(&Text::new("abc")).unwrap());
        assert!(!p.has(&Text::new("xabc")).unwrap());
    }

    #[test]
    fn has_end_anchor_scans_backward() {
        let p = Pattern::new("ab{end}");
        assert!(p.has(&Text::new("xab")).unwrap());
        assert!(!p.has(&Text::new("abx")).unwrap());
    }

    #[test]
    fn matches_requires_full_consumption() {
        let p = Pattern::new("{id}");
        assert!(p.matches(&Text::new("hello")).unwrap());
        assert!(!p.matches(&Text::new("hello!")).unwrap());
    }

    #[test]
    fn matches_agrees_with_find_all_presence() {
        // For anchor-free patterns: has == (find_all non-empty).
        for (text, pattern) in [
            ("a1b2", "{digit}"),
            ("a1b2", "{3+digit}"),
            ("hello", "{ws}"),
        ] {
            let p = Pattern::new(pattern);
            let t = Text::new(text);
            assert_eq!(
                p.has(&t).unwrap(),
                !p.find_all(&t).unwrap().is_empty(),
                "mismatch for {pattern} on {text}"
            );
        }
    }

    #[test]
    fn captures_on_full_match_only() {
        let p = Pattern::new("{id}:{id}");
        let caps = p.captures(&Text::new("foo:bar")).unwrap().unwrap();
        assert_eq!(caps, vec![Text::new("foo"), Text::new("bar")]);
        assert!(p.captures(&Text::new("foo:bar!")).unwrap().is_none());
    }

    #[test]
    fn match_at_positions() {
        let p = Pattern::new("{digit}");
        let t = Text::new("ab12");
        assert!(p.match_at(&t, 1).unwrap().is_none());
        let m = p.match_at(&t, 3).unwrap().unwrap();
        assert_eq!(m.text, "1");
        assert_eq!(p.match_at(&t, 0), Err(PatternError::InvalidStartIndex));
    }

    // --- find_all ---

    #[test]
    fn find_all_non_overlapping() {
        let p = Pattern::new("{int}");
        let found = p.find_all(&Text::new("2023-06-01")).unwrap();
        let texts: Vec<_> = found.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["2023", "06", "01"]);
    }

    #[test]
    fn find_all_empty_pattern_is_empty() {
        let p = Pattern::new("");
        assert!(p.find_all(&Text::new("abc")).unwrap().is_empty());
    }

    #[test]
    fn find_all_advances_past_zero_length_matches() {
        // {0-1 digit} can match zero-length anywhere.
        let p = Pattern::new("{0-1 digit}");
        let found = p.find_all(&Text::new("ab")).unwrap();
        assert_eq!(found.len(), 2);
    }

    // --- by_match ---

    #[test]
    fn by_match_iterates_matches() {
        let p = Pattern::new("{digit}");
        let found: Vec<_> = p
            .by_match(&Text::new("a1b2"))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].index, 2);
        assert_eq!(found[1].index, 4);
    }

    #[test]
    fn by_match_surfaces_pattern_errors() {
        let p = Pattern::new("{nope!}");
        let mut it = p.by_match(&Text::new("abc"));
        assert!(matches!(it.next(), Some(Err(_))));
        assert!(it.next().is_none());
    }

    // --- split ---

    #[test]
    fn split_keeps_empty_chunks() {
        assert_eq!(split("a,b,,c", ","), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn split_empty_pattern_is_per_cluster() {
        assert_eq!(split("ab\u{0301}c", ""), vec!["a", "b\u{0301}", "c"]);
    }

    #[test]
    fn split_empty_text_is_empty() {
        assert!(split("", ",").is_empty());
    }

    #[test]
    fn split_trailing_separator_gives_empty_chunk() {
        assert_eq!(split("a,b,", ","), vec!["a", "b", ""]);
    }

    #[test]
    fn split_on_runs() {
        // Unspecified bounds are one-or-more: the whole space run is one
        // separator.
        assert_eq!(split("a  b c", "{ws}"), vec!["a", "b", "c"]);
    }

    #[test]
    fn by_split_matches_split() {
        let p = Pattern::new(",");
        let t = Text::new("a,b,,c");
        let eager = p.split(&t).unwrap();
        let lazy: Vec<_> = p.by_split(&t).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(eager, lazy);
    }

    // --- Display ---

    #[test]
    fn display_quotes_pattern() {
        assert_eq!(Pattern::new("{id}").to_string(), "$/{id}/");
        assert_eq!(Pattern::new("a/b").to_string(), "$|a/b|");
    }
}
