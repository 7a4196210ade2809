//! Namespaced identifiers.
//!
//! Every record handed to the store is keyed by strings of the form
//! `<Namespace>:<Value>` (`HGNC:1100`, `UMLS:C0011847`, `GO:0008150`). The
//! namespace is everything before the first colon.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ValidationError;

static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn identifier_regex() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*:\S(?:.*\S)?$")
            .expect("identifier pattern is a valid literal regex")
    })
}

/// Returns the namespace part of `id`, or `None` if there is no colon.
///
/// # Examples
///
/// ```
/// use biofusion::identifier::namespace_of;
///
/// assert_eq!(namespace_of("GO:0008150"), Some("GO"));
/// assert_eq!(namespace_of("orphan"), None);
/// ```
#[must_use]
pub fn namespace_of(id: &str) -> Option<&str> {
    id.split_once(':').map(|(ns, _)| ns)
}

/// Returns the value part of `id` (everything after the first colon).
#[must_use]
pub fn value_of(id: &str) -> Option<&str> {
    id.split_once(':').map(|(_, value)| value)
}

/// Returns true if `id` belongs to `namespace`.
#[must_use]
pub fn in_namespace(id: &str, namespace: &str) -> bool {
    namespace_of(id) == Some(namespace)
}

/// Checks that `id` is a well-formed namespaced identifier.
///
/// # Errors
/// `ValidationError::MalformedIdentifier` if the namespace is missing or
/// malformed, or the value is empty or padded with whitespace.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if identifier_regex().is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::MalformedIdentifier { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_split_at_first_colon() {
        assert_eq!(namespace_of("MONDO:0005015"), Some("MONDO"));
        assert_eq!(value_of("GenCoNet:DrugBank_ADR_1"), Some("DrugBank_ADR_1"));
        assert_eq!(value_of("X:a:b"), Some("a:b"));
    }

    #[test]
    fn test_in_namespace_is_exact() {
        assert!(in_namespace("HGNC:1100", "HGNC"));
        assert!(!in_namespace("HGNCSymbol:BRCA1", "HGNC"));
    }

    #[test]
    fn test_validate_accepts_common_vocabularies() {
        for id in [
            "HGNC:1100",
            "UMLS:C0011847",
            "DrugBank:DB00945",
            "dbSNP:rs429358",
            "SnoMedCT:73211009",
            "NDF-RT:N0000000001",
            "GO:0008150",
        ] {
            assert!(validate_id(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn test_validate_rejects_malformed() {
        for id in ["", "HGNC", ":1100", "HGNC:", "HGNC: 1100", "1HGNC:1", "HGNC:1100 "] {
            assert!(validate_id(id).is_err(), "{id:?} should be rejected");
        }
    }
}
