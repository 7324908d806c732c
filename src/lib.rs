//! A pattern-matching mini-language for Unicode text, indexed by grapheme
//! cluster rather than byte or codepoint.
//!
//! # Example
//!
//! ```rust
//! use textpat::{Pattern, Text};
//!
//! let text = Text::new("Contact: bob@example.com (urgent)");
//!
//! // Named recognizers
//! let m = Pattern::new("{email}").find(&text, 1).unwrap().unwrap();
//! assert_eq!(m.text.as_str(), "bob@example.com");
//!
//! // Balanced pairs capture their inside
//! let m = Pattern::new("(?)").find(&text, 1).unwrap().unwrap();
//! assert_eq!(m.captures[0].as_str(), "urgent");
//!
//! // Backreference-driven replacement
//! let swapped = Pattern::new("{id}:{id}")
//!     .replace(
//!         &Text::new("key:value"),
//!         &Text::new("\\2:\\1"),
//!         &Pattern::new("\\"),
//!         false,
//!     )
//!     .unwrap();
//! assert_eq!(swapped.as_str(), "value:key");
//! ```

pub mod pattern;
pub mod text;
pub mod unicode;

pub use pattern::{
    Capture, CaptureSlots, MAX_CAPTURES, Match, MatchIter, Pattern, PatternError, Recognizer,
    Rule, SplitIter, replace_all,
};
pub use text::Text;
