use std::fmt;
use thiserror::Error;

/// JSON-LD error conditions.
///
/// The string form of each code is the condition name used by the JSON-LD
/// 1.1 API and Framing recommendations, so results can be compared against
/// external test vectors directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    CollidingKeywords,
    ConflictingIndexes,
    ContextOverflow,
    CyclicIriMapping,
    InvalidBaseDirection,
    InvalidBaseIri,
    InvalidContainerMapping,
    InvalidContextEntry,
    InvalidContextNullification,
    InvalidDefaultLanguage,
    InvalidEmbedValue,
    InvalidFrame,
    InvalidIdValue,
    InvalidImportValue,
    InvalidIncludedValue,
    InvalidIndexValue,
    InvalidIriMapping,
    InvalidJsonLiteral,
    InvalidKeywordAlias,
    InvalidLanguageMapping,
    InvalidLanguageMapValue,
    InvalidLanguageTaggedString,
    InvalidLanguageTaggedValue,
    InvalidLocalContext,
    InvalidNestValue,
    InvalidPrefixValue,
    InvalidPropagateValue,
    InvalidProtectedValue,
    InvalidRemoteContext,
    InvalidReverseProperty,
    InvalidReversePropertyMap,
    InvalidReversePropertyValue,
    InvalidReverseValue,
    InvalidScopedContext,
    InvalidSetOrListObject,
    InvalidTermDefinition,
    InvalidTypedValue,
    InvalidTypeMapping,
    InvalidTypeValue,
    InvalidValueObject,
    InvalidValueObjectValue,
    InvalidVersionValue,
    InvalidVocabMapping,
    IriConfusedWithPrefix,
    KeywordRedefinition,
    ListOfLists,
    LoadingDocumentFailed,
    LoadingRemoteContextFailed,
    MultipleContextLinkHeaders,
    ProcessingModeConflict,
    ProtectedTermRedefinition,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::CollidingKeywords => "colliding keywords",
            ErrorCode::ConflictingIndexes => "conflicting indexes",
            ErrorCode::ContextOverflow => "context overflow",
            ErrorCode::CyclicIriMapping => "cyclic IRI mapping",
            ErrorCode::InvalidBaseDirection => "invalid base direction",
            ErrorCode::InvalidBaseIri => "invalid base IRI",
            ErrorCode::InvalidContainerMapping => "invalid container mapping",
            ErrorCode::InvalidContextEntry => "invalid context entry",
            ErrorCode::InvalidContextNullification => "invalid context nullification",
            ErrorCode::InvalidDefaultLanguage => "invalid default language",
            ErrorCode::InvalidEmbedValue => "invalid @embed value",
            ErrorCode::InvalidFrame => "invalid frame",
            ErrorCode::InvalidIdValue => "invalid @id value",
            ErrorCode::InvalidImportValue => "invalid @import value",
            ErrorCode::InvalidIncludedValue => "invalid @included value",
            ErrorCode::InvalidIndexValue => "invalid @index value",
            ErrorCode::InvalidIriMapping => "invalid IRI mapping",
            ErrorCode::InvalidJsonLiteral => "invalid JSON literal",
            ErrorCode::InvalidKeywordAlias => "invalid keyword alias",
            ErrorCode::InvalidLanguageMapping => "invalid language mapping",
            ErrorCode::InvalidLanguageMapValue => "invalid language map value",
            ErrorCode::InvalidLanguageTaggedString => "invalid language-tagged string",
            ErrorCode::InvalidLanguageTaggedValue => "invalid language-tagged value",
            ErrorCode::InvalidLocalContext => "invalid local context",
            ErrorCode::InvalidNestValue => "invalid @nest value",
            ErrorCode::InvalidPrefixValue => "invalid @prefix value",
            ErrorCode::InvalidPropagateValue => "invalid @propagate value",
            ErrorCode::InvalidProtectedValue => "invalid @protected value",
            ErrorCode::InvalidRemoteContext => "invalid remote context",
            ErrorCode::InvalidReverseProperty => "invalid reverse property",
            ErrorCode::InvalidReversePropertyMap => "invalid reverse property map",
            ErrorCode::InvalidReversePropertyValue => "invalid reverse property value",
            ErrorCode::InvalidReverseValue => "invalid @reverse value",
            ErrorCode::InvalidScopedContext => "invalid scoped context",
            ErrorCode::InvalidSetOrListObject => "invalid set or list object",
            ErrorCode::InvalidTermDefinition => "invalid term definition",
            ErrorCode::InvalidTypedValue => "invalid typed value",
            ErrorCode::InvalidTypeMapping => "invalid type mapping",
            ErrorCode::InvalidTypeValue => "invalid type value",
            ErrorCode::InvalidValueObject => "invalid value object",
            ErrorCode::InvalidValueObjectValue => "invalid value object value",
            ErrorCode::InvalidVersionValue => "invalid @version value",
            ErrorCode::InvalidVocabMapping => "invalid vocab mapping",
            ErrorCode::IriConfusedWithPrefix => "IRI confused with prefix",
            ErrorCode::KeywordRedefinition => "keyword redefinition",
            ErrorCode::ListOfLists => "list of lists",
            ErrorCode::LoadingDocumentFailed => "loading document failed",
            ErrorCode::LoadingRemoteContextFailed => "loading remote context failed",
            ErrorCode::MultipleContextLinkHeaders => "multiple context link headers",
            ErrorCode::ProcessingModeConflict => "processing mode conflict",
            ErrorCode::ProtectedTermRedefinition => "protected term redefinition",
        }
    }

    /// Errors raised while processing a context (before any data is touched).
    pub const fn is_context_error(self) -> bool {
        matches!(
            self,
            ErrorCode::ContextOverflow
                | ErrorCode::CyclicIriMapping
                | ErrorCode::InvalidBaseDirection
                | ErrorCode::InvalidBaseIri
                | ErrorCode::InvalidContainerMapping
                | ErrorCode::InvalidContextEntry
                | ErrorCode::InvalidContextNullification
                | ErrorCode::InvalidDefaultLanguage
                | ErrorCode::InvalidImportValue
                | ErrorCode::InvalidIriMapping
                | ErrorCode::InvalidKeywordAlias
                | ErrorCode::InvalidLanguageMapping
                | ErrorCode::InvalidLocalContext
                | ErrorCode::InvalidPrefixValue
                | ErrorCode::InvalidPropagateValue
                | ErrorCode::InvalidProtectedValue
                | ErrorCode::InvalidRemoteContext
                | ErrorCode::InvalidReverseProperty
                | ErrorCode::InvalidScopedContext
                | ErrorCode::InvalidTermDefinition
                | ErrorCode::InvalidTypeMapping
                | ErrorCode::InvalidVersionValue
                | ErrorCode::InvalidVocabMapping
                | ErrorCode::KeywordRedefinition
                | ErrorCode::ProcessingModeConflict
                | ErrorCode::ProtectedTermRedefinition
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone)]
pub enum JsonLdError {
    #[error("{code}: {message}")]
    Processing { code: ErrorCode, message: String },

    #[error("{code}: <{url}>: {message}")]
    Loading {
        code: ErrorCode,
        url: String,
        message: String,
    },
}

impl JsonLdError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        JsonLdError::Processing {
            code,
            message: message.into(),
        }
    }

    pub fn loading(code: ErrorCode, url: impl Into<String>, message: impl Into<String>) -> Self {
        JsonLdError::Loading {
            code,
            url: url.into(),
            message: message.into(),
        }
    }

    /// The JSON-LD error condition.
    pub fn code(&self) -> ErrorCode {
        match self {
            JsonLdError::Processing { code, .. } | JsonLdError::Loading { code, .. } => *code,
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonLdError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_condition_name() {
        let err = JsonLdError::new(ErrorCode::CyclicIriMapping, "term 'a'");
        assert_eq!(err.to_string(), "cyclic IRI mapping: term 'a'");
        assert_eq!(err.code(), ErrorCode::CyclicIriMapping);
    }

    #[test]
    fn test_loading_error() {
        let err = JsonLdError::loading(
            ErrorCode::LoadingDocumentFailed,
            "http://example.org/doc",
            "not found",
        );
        assert_eq!(
            err.to_string(),
            "loading document failed: <http://example.org/doc>: not found"
        );
    }

    #[test]
    fn test_context_error_family() {
        assert!(ErrorCode::CyclicIriMapping.is_context_error());
        assert!(ErrorCode::ProtectedTermRedefinition.is_context_error());
        assert!(!ErrorCode::CollidingKeywords.is_context_error());
        assert!(!ErrorCode::LoadingDocumentFailed.is_context_error());
    }
}
