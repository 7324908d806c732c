//! Pattern matching engine over grapheme clusters.
//!
//! Patterns are interpreted directly against the text; there is no compiled
//! form. Tokens are greedy only as far as the rest of the pattern allows
//! (shortest extension first), and every capturing token records one
//! backreferenceable sub-span.
//!
//! # Pattern syntax
//!
//! | Form          | Meaning                                                |
//! |---------------|--------------------------------------------------------|
//! | `x`           | Literal grapheme `x`, non-capturing                    |
//! | `"?"`, `'?'`… | Quoted span using the mirrored closer, capturing       |
//! | `(?)`, `[?]`… | Balanced nested pair, capturing, recursive             |
//! | `{N}`         | Exactly N repetitions of the following name/char       |
//! | `{N-M}`       | Between N and M repetitions                            |
//! | `{N+}`        | At least N repetitions                                 |
//! | `{!name}`     | Negated class                                          |
//! | `{..}`        | Match any (greedy to the end when trailing)            |
//! | `{start}`     | Start-of-text anchor                                   |
//! | `{end}`       | End-of-text anchor                                     |
//! | `{name}`      | Keyword, Unicode property, or Unicode character name   |
//!
//! Keywords: `authority`, `alphanum`/`anum`/`alphanumeric`, `crlf`, `digit`,
//! `email`, `emoji`, `host`, `id`/`word`, `int`, `ipv4`, `ipv6`, `ip`,
//! `nl`/`newline`, `num`, `ws`/`whitespace`, `uri`, `url`.
//!
//! In replacement text, a marker pattern followed by a digit `0`-`9` is a
//! backreference (`0` is the whole match); an optional trailing `;` is
//! consumed as a separator.

pub mod matcher;
pub mod parser;
pub mod recognizers;
pub mod replace;
pub mod search;
pub mod token;

pub use matcher::{Capture, CaptureSlots, MAX_CAPTURES, Match};
pub use parser::PatternError;
pub use recognizers::Recognizer;
pub use replace::{Rule, replace_all};
pub use search::{MatchIter, Pattern, SplitIter};
