//! Relationships between entities.
//!
//! A relationship points at its endpoints through the identifier strings the
//! adapter used when it was created. Those strings need not be canonical; they
//! are resolved through the identity resolver whenever the endpoint entity is
//! needed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::value::Attributes;

/// Monotonic handle assigned by the store when a relationship is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(u64);

impl SequenceId {
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed relationship vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RelationLabel {
    Targets,
    AssociatesWith,
    Indicates,
    Contraindicates,
    Induces,
    Regulates,
    Codes,
    Eqtl,
    Interacts,
    HasAdr,
    AssociatedWithAdr,
    MolecularFunction,
    BiologicalProcess,
    CellularComponent,
}

impl RelationLabel {
    /// Every label, in declaration order.
    pub const ALL: [RelationLabel; 14] = [
        Self::Targets,
        Self::AssociatesWith,
        Self::Indicates,
        Self::Contraindicates,
        Self::Induces,
        Self::Regulates,
        Self::Codes,
        Self::Eqtl,
        Self::Interacts,
        Self::HasAdr,
        Self::AssociatedWithAdr,
        Self::MolecularFunction,
        Self::BiologicalProcess,
        Self::CellularComponent,
    ];

    /// Relationship type string (`:TYPE` in bulk export).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Targets => "TARGETS",
            Self::AssociatesWith => "ASSOCIATES_WITH",
            Self::Indicates => "INDICATES",
            Self::Contraindicates => "CONTRAINDICATES",
            Self::Induces => "INDUCES",
            Self::Regulates => "REGULATES",
            Self::Codes => "CODES",
            Self::Eqtl => "EQTL",
            Self::Interacts => "INTERACTS",
            Self::HasAdr => "HAS_ADR",
            Self::AssociatedWithAdr => "ASSOCIATED_WITH_ADR",
            Self::MolecularFunction => "MOLECULAR_FUNCTION",
            Self::BiologicalProcess => "BIOLOGICAL_PROCESS",
            Self::CellularComponent => "CELLULAR_COMPONENT",
        }
    }

    /// Gene Ontology membership labels.
    #[must_use]
    pub const fn is_ontology_membership(self) -> bool {
        matches!(
            self,
            Self::MolecularFunction | Self::BiologicalProcess | Self::CellularComponent
        )
    }
}

impl fmt::Display for RelationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownRelationLabel {
                label: s.to_string(),
            })
    }
}

impl TryFrom<String> for RelationLabel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RelationLabel> for String {
    fn from(label: RelationLabel) -> Self {
        label.as_str().to_string()
    }
}

/// A typed, directed, attributed link between two identifier strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub sequence_id: SequenceId,
    pub label: RelationLabel,
    pub source_ref: String,
    pub target_ref: String,
    pub attributes: Attributes,
}

impl Relationship {
    /// Digest of the attribute map, equal for exactly-equal maps.
    ///
    /// Used as a bucket key when grouping duplicate relationships; callers
    /// still compare maps for equality inside a bucket.
    #[must_use]
    pub fn attribute_fingerprint(&self) -> blake3::Hash {
        fingerprint(&self.attributes)
    }
}

/// Digest of an attribute map over its canonical (key-sorted) JSON encoding.
#[must_use]
pub fn fingerprint(attributes: &Attributes) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for (key, value) in attributes {
        hasher.update(key.as_bytes());
        hasher.update(&[0]);
        // Floats fold through their bit pattern to agree with `AttrValue`'s equality.
        match value {
            crate::value::AttrValue::Float(f) => {
                hasher.update(b"f");
                hasher.update(&f.to_bits().to_le_bytes());
            }
            other => {
                let encoded = serde_json::to_vec(other).unwrap_or_default();
                hasher.update(&encoded);
            }
        }
        hasher.update(&[0xff]);
    }
    hasher.finalize()
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Edge={{label: {}, source: {}, target: {}}}",
            self.label, self.source_ref, self.target_ref
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{attributes, AttrValue};

    fn rel(attrs: Attributes) -> Relationship {
        Relationship {
            sequence_id: SequenceId::new(1),
            label: RelationLabel::Indicates,
            source_ref: "DrugBank:DB1".to_string(),
            target_ref: "UMLS:C1".to_string(),
            attributes: attrs,
        }
    }

    #[test]
    fn test_label_round_trip() {
        for label in RelationLabel::ALL {
            assert_eq!(label.as_str().parse::<RelationLabel>().unwrap(), label);
        }
    }

    #[test]
    fn test_unknown_label() {
        let err = "TREATS".parse::<RelationLabel>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownRelationLabel { .. }));
    }

    #[test]
    fn test_label_serde() {
        let json = serde_json::to_string(&RelationLabel::AssociatedWithAdr).unwrap();
        assert_eq!(json, "\"ASSOCIATED_WITH_ADR\"");
        let back: RelationLabel = serde_json::from_str("\"EQTL\"").unwrap();
        assert_eq!(back, RelationLabel::Eqtl);
        assert!(serde_json::from_str::<RelationLabel>("\"NOPE\"").is_err());
    }

    #[test]
    fn test_fingerprint_matches_equality() {
        let a = rel(attributes([("source", "X".into()), ("num_pmids", 2i64.into())]));
        let b = rel(attributes([("num_pmids", 2i64.into()), ("source", "X".into())]));
        assert_eq!(a.attributes, b.attributes);
        assert_eq!(a.attribute_fingerprint(), b.attribute_fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_on_any_attribute() {
        let a = rel(attributes([("source", "X".into())]));
        let b = rel(attributes([("source", "Y".into())]));
        let c = rel(attributes([("source", "X".into()), ("pmid", AttrValue::Null)]));
        assert_ne!(a.attribute_fingerprint(), b.attribute_fingerprint());
        assert_ne!(a.attribute_fingerprint(), c.attribute_fingerprint());
        assert_ne!(
            fingerprint(&attributes([("n", 1i64.into())])),
            fingerprint(&attributes([("n", 1.0f64.into())]))
        );
    }
}
