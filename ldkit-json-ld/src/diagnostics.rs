//! Non-fatal processing warnings
//!
//! Warnings never change the shape of the output; they are collected for
//! the caller to inspect after a call and mirrored to `tracing`.

use std::cell::RefCell;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// A term or key of the form `@foo` that is not a keyword was ignored
    KeywordLikeValue,
    /// A language tag is not well-formed BCP47
    MalformedLanguageTag,
    /// `@vocab` was set to a blank node identifier
    BlankNodeVocab,
    /// A term definition maps to a blank node identifier
    BlankNodeTerm,
}

impl WarningCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            WarningCode::KeywordLikeValue => "keyword-like value",
            WarningCode::MalformedLanguageTag => "malformed language tag",
            WarningCode::BlankNodeVocab => "blank node vocabulary mapping",
            WarningCode::BlankNodeTerm => "blank node term definition",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Per-call warning sink shared by the processors of one call.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: RefCell<Vec<Warning>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, code: WarningCode, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(code = %code, "{}", message);
        self.warnings.borrow_mut().push(Warning { code, message });
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.borrow().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Warning> {
        self.warnings.borrow().clone()
    }

    pub fn take(&self) -> Vec<Warning> {
        std::mem::take(&mut *self.warnings.borrow_mut())
    }
}
