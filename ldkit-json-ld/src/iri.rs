use url::Url;

/// Split a string of the form `prefix:suffix` at the first colon.
///
/// Returns None when there is no colon, or the colon is the first character
/// (`:suffix` is never a compact IRI).
pub fn split_prefix(s: &str) -> Option<(&str, &str)> {
    let colon_pos = s.find(':')?;
    if colon_pos == 0 {
        return None;
    }
    Some((&s[..colon_pos], &s[colon_pos + 1..]))
}

/// Returns true if the IRI is absolute (has an RFC 3986 scheme).
///
/// An absolute IRI starts with a scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
/// This handles all schemes (http, https, urn, did, mailto, ftp, ipfs, etc.)
/// without maintaining a hardcoded list.
pub fn is_absolute(iri: &str) -> bool {
    if let Some(colon_pos) = iri.find(':') {
        let scheme = &iri[..colon_pos];
        !scheme.is_empty()
            && scheme.as_bytes()[0].is_ascii_alphabetic()
            && scheme
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'.')
    } else {
        false
    }
}

/// Returns true for blank node identifiers (`_:label`).
pub fn is_blank_node(s: &str) -> bool {
    s.starts_with("_:")
}

/// Returns true if the IRI ends with an RFC 3986 gen-delim character.
///
/// Terms mapping to such IRIs may be used as compact IRI prefixes.
pub fn ends_with_gen_delim(iri: &str) -> bool {
    matches!(
        iri.as_bytes().last(),
        Some(b':' | b'/' | b'?' | b'#' | b'[' | b']' | b'@')
    )
}

/// Resolve a (possibly relative) IRI reference against a base IRI.
///
/// Without a base, or when the base cannot act as one, the reference is
/// returned unchanged.
pub fn resolve(base: Option<&str>, reference: &str) -> String {
    if is_absolute(reference) {
        return reference.to_string();
    }
    let Some(base) = base else {
        return reference.to_string();
    };
    match Url::parse(base).and_then(|b| b.join(reference)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => reference.to_string(),
    }
}

/// Express `iri` relative to `base`, if they share scheme and authority.
pub fn relativize(base: &str, iri: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let target = Url::parse(iri).ok()?;
    let relative = base.make_relative(&target)?;
    if relative.is_empty() {
        // The document itself: keep a non-empty reference.
        return Some(
            target
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|last| !last.is_empty())
                .map(|last| last.to_string())
                .unwrap_or_else(|| "./".to_string()),
        );
    }
    Some(relative)
}
