//! JSON-LD vocabulary constants for ldkit
//!
//! This crate provides a centralized location for the JSON-LD keywords and
//! the handful of IRIs the processing algorithms need to recognise.
//!
//! # Organization
//!
//! - `keyword` - the closed set of `@`-keywords and keyword-form detection
//! - `json_ld` - well-known JSON-LD IRIs (profiles, media types)

pub mod keyword;

pub use keyword::Keyword;

/// JSON-LD namespace and profile IRIs
pub mod json_ld {
    /// Profile requested when dereferencing a remote context document
    pub const CONTEXT_PROFILE: &str = "http://www.w3.org/ns/json-ld#context";

    /// Profile requested when dereferencing a frame document
    pub const FRAME_PROFILE: &str = "http://www.w3.org/ns/json-ld#frame";

    /// JSON-LD media type
    pub const MEDIA_TYPE: &str = "application/ld+json";
}
