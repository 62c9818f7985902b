//! JSON-LD keywords
//!
//! Every algorithm in the processor dispatches on these keywords. Keeping them
//! in a closed enum means a new keyword is a compile error in every `match`
//! that has to handle it, rather than a silently ignored string.

use std::fmt;
use std::str::FromStr;

/// A JSON-LD 1.1 keyword (including the framing keywords).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Keyword {
    Any,
    Base,
    Container,
    Context,
    Default,
    Direction,
    Embed,
    Explicit,
    Graph,
    Id,
    Import,
    Included,
    Index,
    Json,
    Language,
    List,
    Nest,
    None,
    Null,
    OmitDefault,
    Prefix,
    Preserve,
    Propagate,
    Protected,
    RequireAll,
    Reverse,
    Set,
    Type,
    Value,
    Version,
    Vocab,
}

impl Keyword {
    /// All keywords, in lexicographic order of their string form.
    pub const ALL: [Keyword; 31] = [
        Keyword::Any,
        Keyword::Base,
        Keyword::Container,
        Keyword::Context,
        Keyword::Default,
        Keyword::Direction,
        Keyword::Embed,
        Keyword::Explicit,
        Keyword::Graph,
        Keyword::Id,
        Keyword::Import,
        Keyword::Included,
        Keyword::Index,
        Keyword::Json,
        Keyword::Language,
        Keyword::List,
        Keyword::Nest,
        Keyword::None,
        Keyword::Null,
        Keyword::OmitDefault,
        Keyword::Prefix,
        Keyword::Preserve,
        Keyword::Propagate,
        Keyword::Protected,
        Keyword::RequireAll,
        Keyword::Reverse,
        Keyword::Set,
        Keyword::Type,
        Keyword::Value,
        Keyword::Version,
        Keyword::Vocab,
    ];

    /// The `@`-prefixed string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Keyword::Any => "@any",
            Keyword::Base => "@base",
            Keyword::Container => "@container",
            Keyword::Context => "@context",
            Keyword::Default => "@default",
            Keyword::Direction => "@direction",
            Keyword::Embed => "@embed",
            Keyword::Explicit => "@explicit",
            Keyword::Graph => "@graph",
            Keyword::Id => "@id",
            Keyword::Import => "@import",
            Keyword::Included => "@included",
            Keyword::Index => "@index",
            Keyword::Json => "@json",
            Keyword::Language => "@language",
            Keyword::List => "@list",
            Keyword::Nest => "@nest",
            Keyword::None => "@none",
            Keyword::Null => "@null",
            Keyword::OmitDefault => "@omitDefault",
            Keyword::Prefix => "@prefix",
            Keyword::Preserve => "@preserve",
            Keyword::Propagate => "@propagate",
            Keyword::Protected => "@protected",
            Keyword::RequireAll => "@requireAll",
            Keyword::Reverse => "@reverse",
            Keyword::Set => "@set",
            Keyword::Type => "@type",
            Keyword::Value => "@value",
            Keyword::Version => "@version",
            Keyword::Vocab => "@vocab",
        }
    }

    /// Parse a string into a keyword. Returns `None` for anything else,
    /// including keyword-like strings such as `@foo`.
    pub fn parse(s: &str) -> Option<Keyword> {
        let idx = Self::ALL.binary_search_by(|k| k.as_str().cmp(s)).ok()?;
        Some(Self::ALL[idx])
    }

    /// True for the keywords only meaningful inside a frame.
    pub const fn is_framing(self) -> bool {
        matches!(
            self,
            Keyword::Default
                | Keyword::Embed
                | Keyword::Explicit
                | Keyword::OmitDefault
                | Keyword::RequireAll
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Keyword::parse(s).ok_or(())
    }
}

/// Returns true if `s` is a JSON-LD keyword.
pub fn is_keyword(s: &str) -> bool {
    Keyword::parse(s).is_some()
}

/// Returns true if `s` has the form of a keyword: `@` followed by one or more
/// ASCII letters. Such strings are reserved even when they are not keywords.
pub fn looks_like_keyword(s: &str) -> bool {
    match s.strip_prefix('@') {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_alphabetic()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_sorted() {
        let mut sorted = Keyword::ALL;
        sorted.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(sorted, Keyword::ALL);
    }

    #[test]
    fn test_parse_round_trip() {
        for kw in Keyword::ALL {
            assert_eq!(Keyword::parse(kw.as_str()), Some(kw));
        }
        assert_eq!(Keyword::parse("@foo"), None);
        assert_eq!(Keyword::parse("id"), None);
        assert_eq!("@requireAll".parse::<Keyword>(), Ok(Keyword::RequireAll));
    }

    #[test]
    fn test_looks_like_keyword() {
        assert!(looks_like_keyword("@foo"));
        assert!(looks_like_keyword("@id"));
        assert!(!looks_like_keyword("@"));
        assert!(!looks_like_keyword("@foo.bar"));
        assert!(!looks_like_keyword("foo"));
    }

    #[test]
    fn test_framing_keywords() {
        assert!(Keyword::Embed.is_framing());
        assert!(Keyword::OmitDefault.is_framing());
        assert!(!Keyword::Graph.is_framing());
    }
}
