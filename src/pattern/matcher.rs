//! Single-token matching and the backtracking sequence matcher.
//!
//! The sequence matcher parses one token of the pattern at a time and
//! recurses on the remainder, so recursion depth is bounded by the number of
//! pattern tokens, never by the text. Pair/Quote spans are consumed by
//! iterative forward scans.

use crate::text::Text;

use super::parser::{PatternError, parse_next_token};
use super::token::{PatternToken, Quantifier, TokenKind};

/// Capacity of the capture buffer; slot 0 is the whole match during
/// replacement.
pub const MAX_CAPTURES: usize = 100;

/// Recursion guard for pathologically long patterns.
const MAX_DEPTH: usize = 10_000;

/// One recorded capture: a sub-span of the subject text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capture {
    pub index: usize,
    pub length: usize,
    pub occupied: bool,
    /// True iff produced by a Pair token; drives recursive re-expansion.
    pub recursive: bool,
}

/// Fixed-capacity capture buffer, zero-initialized per match attempt.
/// Writes at or beyond capacity are ignored.
#[derive(Debug)]
pub struct CaptureSlots {
    slots: [Capture; MAX_CAPTURES],
}

impl Default for CaptureSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSlots {
    pub fn new() -> Self {
        Self {
            slots: [Capture::default(); MAX_CAPTURES],
        }
    }

    pub fn get(&self, i: usize) -> Option<&Capture> {
        self.slots.get(i).filter(|c| c.occupied)
    }

    fn set(&mut self, i: usize, capture: Capture) {
        if let Some(slot) = self.slots.get_mut(i) {
            *slot = capture;
        }
    }

    /// Mark slot 0 as the whole match (replacement flows only).
    pub(crate) fn set_whole_match(&mut self, index: usize, length: usize) {
        self.slots[0] = Capture {
            index,
            length,
            occupied: true,
            recursive: false,
        };
    }

    /// The contiguous run of filled slots, in token order.
    pub fn occupied(&self) -> impl Iterator<Item = &Capture> {
        self.slots.iter().take_while(|c| c.occupied)
    }
}

/// The result of a successful pattern match.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// 1-based grapheme position of the match start.
    pub index: usize,
    /// The matched span.
    pub text: Text,
    /// Captured sub-spans, in the order their tokens appear in the pattern.
    pub captures: Vec<Text>,
}

// ─── Single-token matching ───────────────────────────────────────────────────

fn eq_char(grapheme: &str, ch: char) -> bool {
    let mut buf = [0u8; 4];
    grapheme == ch.encode_utf8(&mut buf)
}

/// Match one token at `pos`, honoring negation. Returns clusters consumed
/// (zero-width tokens consume 0), or `None` on failure. Running out of text
/// fails consuming tokens regardless of negation.
pub fn match_token(text: &Text, pos: usize, token: &PatternToken) -> Option<usize> {
    match &token.kind {
        TokenKind::Start => {
            if (pos == 0) != token.negated {
                Some(0)
            } else {
                None
            }
        }
        TokenKind::End => {
            if (pos >= text.len()) != token.negated {
                Some(0)
            } else {
                None
            }
        }
        TokenKind::Any => {
            if pos < text.len() {
                Some(1)
            } else {
                None
            }
        }
        TokenKind::Grapheme(g) => {
            let cur = text.grapheme(pos)?;
            if (cur == g.as_str()) != token.negated {
                Some(1)
            } else {
                None
            }
        }
        TokenKind::Property(class) => {
            let cur = text.main_char(pos)?;
            if class.contains(cur) != token.negated {
                Some(1)
            } else {
                None
            }
        }
        TokenKind::Pair { open, close } => {
            let cur = text.grapheme(pos)?;
            if !eq_char(cur, *open) {
                return if token.negated { Some(1) } else { None };
            }
            let mut depth = 1usize;
            let mut consumed = 1usize;
            while depth > 0 {
                let Some(c) = text.grapheme(pos + consumed) else {
                    return if token.negated { Some(1) } else { None };
                };
                if eq_char(c, *open) {
                    depth += 1;
                } else if eq_char(c, *close) {
                    depth -= 1;
                }
                consumed += 1;
            }
            if token.negated { None } else { Some(consumed) }
        }
        TokenKind::Quote { open, close } => {
            let cur = text.grapheme(pos)?;
            if !eq_char(cur, *open) {
                return if token.negated { Some(1) } else { None };
            }
            let mut i = pos + 1;
            while let Some(c) = text.grapheme(i) {
                if eq_char(c, *close) {
                    return if token.negated {
                        None
                    } else {
                        Some(i - pos + 1)
                    };
                }
                if c == "\\" {
                    i += 1; // the escaped grapheme cannot close the quote
                }
                i += 1;
            }
            if token.negated { Some(1) } else { None }
        }
        TokenKind::Recognizer(r) => match r.run(text, pos) {
            Some(len) => {
                if token.negated {
                    None
                } else {
                    Some(len)
                }
            }
            None => {
                if token.negated {
                    Some(1)
                } else {
                    None
                }
            }
        },
    }
}

// ─── Sequence matching ───────────────────────────────────────────────────────

/// Match the whole remaining pattern against the text at `text_pos`.
///
/// Returns the total clusters consumed, `Ok(None)` on match failure, or an
/// error for a malformed pattern. Captures are recorded into `captures`
/// (when provided) at `capture_index` and up, only on success.
pub fn match_sequence(
    text: &Text,
    text_pos: usize,
    pattern: &Text,
    pattern_pos: usize,
    captures: Option<&mut CaptureSlots>,
    capture_index: usize,
) -> Result<Option<usize>, PatternError> {
    match_seq_at(text, text_pos, pattern, pattern_pos, captures, capture_index, 0)
}

#[allow(clippy::too_many_arguments)]
fn match_seq_at(
    text: &Text,
    text_pos: usize,
    pattern: &Text,
    pattern_pos: usize,
    mut captures: Option<&mut CaptureSlots>,
    capture_index: usize,
    depth: usize,
) -> Result<Option<usize>, PatternError> {
    if pattern_pos >= pattern.len() {
        return Ok(Some(0)); // end of the pattern
    }
    if depth > MAX_DEPTH {
        return Ok(None);
    }

    let start_pos = text_pos;
    let mut ppos = pattern_pos;
    let token = parse_next_token(pattern, &mut ppos)?;
    let pattern_done = ppos >= pattern.len();

    // A trailing {..} greedily claims the rest of the text.
    if token.kind == TokenKind::Any && pattern_done {
        let remaining = text.len() - text_pos;
        let (min, max) = match token.quantifier {
            Quantifier::Unspecified => {
                let n = remaining.max(1);
                (n, n)
            }
            q => q.bounds(),
        };
        if remaining < min {
            return Ok(None);
        }
        let consumed = remaining.min(max);
        record_capture(&mut captures, &token, capture_index, text_pos, consumed);
        return Ok(Some(consumed));
    }

    let (min, max) = token.quantifier.bounds();
    let next_capture_index = capture_index + usize::from(!token.non_capturing);

    // Zero-minimum tokens: first try skipping the token entirely.
    if min == 0 && !pattern_done {
        let skipped = match_seq_at(
            text,
            text_pos,
            pattern,
            ppos,
            captures.as_deref_mut(),
            next_capture_index,
            depth + 1,
        )?;
        if let Some(next_len) = skipped {
            record_capture(&mut captures, &token, capture_index, text_pos, 0);
            return Ok(Some(next_len));
        }
    }

    let capture_start = text_pos;
    let mut text_pos = text_pos;
    let mut count = 0usize;
    let mut capture_len = 0usize;
    let mut next_len: Option<usize> = Some(0);

    while count < max {
        let Some(len) = match_token(text, text_pos, &token) else {
            break;
        };
        capture_len += len;
        text_pos += len;
        count += 1;

        if !pattern_done {
            next_len = if count < min {
                None
            } else {
                match_seq_at(
                    text,
                    text_pos,
                    pattern,
                    ppos,
                    captures.as_deref_mut(),
                    next_capture_index,
                    depth + 1,
                )?
            };
        } else {
            next_len = Some(0);
        }

        if len == 0 {
            if next_len.is_some() {
                // A zero-length repetition that satisfies the remainder;
                // further repetitions would never make progress. One such
                // repetition stands in for any remaining minimum.
                count = max;
                break;
            }
            return Ok(None);
        }

        if !pattern_done && next_len.is_some() {
            break; // the remainder wants to stop here
        }
        if text_pos >= text.len() {
            break;
        }
    }

    let Some(next_len) = next_len.filter(|_| count >= min) else {
        return Ok(None);
    };

    record_capture(&mut captures, &token, capture_index, capture_start, capture_len);
    Ok(Some((text_pos - start_pos) + next_len))
}

/// Record a successful token's span. Pair/Quote captures exclude one
/// delimiter grapheme on each side.
fn record_capture(
    captures: &mut Option<&mut CaptureSlots>,
    token: &PatternToken,
    slot: usize,
    start: usize,
    length: usize,
) {
    let Some(caps) = captures.as_deref_mut() else {
        return;
    };
    if token.non_capturing || slot >= MAX_CAPTURES {
        return;
    }
    let capture = match token.kind {
        TokenKind::Pair { .. } | TokenKind::Quote { .. } if length >= 2 => Capture {
            index: start + 1,
            length: length - 2,
            occupied: true,
            recursive: matches!(token.kind, TokenKind::Pair { .. }),
        },
        _ => Capture {
            index: start,
            length,
            occupied: true,
            recursive: false,
        },
    };
    caps.set(slot, capture);
}
