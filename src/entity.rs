//! Entity types and identity.
//!
//! An entity is a typed record known by a *set* of namespaced identifiers.
//! Two entities of the same kind sharing any identifier are the same
//! real-world thing; the resolver merges them on insert.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identifier::{in_namespace, validate_id};

/// Stable arena handle for an entity held by the resolver.
///
/// Handles are never reused within a store, so a handle that no longer
/// resolves refers to an entity absorbed by a merge or removed by pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(u32);

impl EntityKey {
    /// Creates a key from a raw arena index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Closed set of entity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EntityKind {
    Drug,
    Gene,
    Disease,
    Variant,
    GoClass,
    AdverseDrugReaction,
    Rna,
    CircRna,
    ERna,
    LncRna,
    MiRna,
    NcRna,
    PiRna,
    Pseudogene,
    Ribozyme,
    RRna,
    ScaRna,
    ScRna,
    SnoRna,
    SnRna,
}

struct KindInfo {
    kind: EntityKind,
    label: &'static str,
    primary_namespace: &'static str,
}

/// Dispatch table: exported label and primary namespace per kind.
const KIND_TABLE: [KindInfo; 20] = [
    KindInfo { kind: EntityKind::Drug, label: "Drug", primary_namespace: "DrugBank" },
    KindInfo { kind: EntityKind::Gene, label: "Gene", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::Disease, label: "Disease", primary_namespace: "UMLS" },
    KindInfo { kind: EntityKind::Variant, label: "Variant", primary_namespace: "dbSNP" },
    KindInfo { kind: EntityKind::GoClass, label: "GOClass", primary_namespace: "GO" },
    KindInfo {
        kind: EntityKind::AdverseDrugReaction,
        label: "AdverseDrugReaction",
        primary_namespace: "GenCoNet",
    },
    KindInfo { kind: EntityKind::Rna, label: "RNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::CircRna, label: "CircRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::ERna, label: "ERNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::LncRna, label: "LncRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::MiRna, label: "MiRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::NcRna, label: "NcRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::PiRna, label: "PiRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::Pseudogene, label: "Pseudogene", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::Ribozyme, label: "Ribozyme", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::RRna, label: "RRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::ScaRna, label: "ScaRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::ScRna, label: "ScRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::SnoRna, label: "SnoRNA", primary_namespace: "HGNC" },
    KindInfo { kind: EntityKind::SnRna, label: "SnRNA", primary_namespace: "HGNC" },
];

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 20] = [
        Self::Drug,
        Self::Gene,
        Self::Disease,
        Self::Variant,
        Self::GoClass,
        Self::AdverseDrugReaction,
        Self::Rna,
        Self::CircRna,
        Self::ERna,
        Self::LncRna,
        Self::MiRna,
        Self::NcRna,
        Self::PiRna,
        Self::Pseudogene,
        Self::Ribozyme,
        Self::RRna,
        Self::ScaRna,
        Self::ScRna,
        Self::SnoRna,
        Self::SnRna,
    ];

    fn info(self) -> &'static KindInfo {
        // KIND_TABLE is laid out in declaration order.
        &KIND_TABLE[self as usize]
    }

    /// Label used in interchange documents and bulk export (`:LABEL`).
    #[must_use]
    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Namespace whose identifiers are preferred as the canonical id.
    #[must_use]
    pub fn primary_namespace(self) -> &'static str {
        self.info().primary_namespace
    }

    /// Parses an exported label.
    ///
    /// # Errors
    /// `ValidationError::UnknownEntityKind` if the label is not in the closed set.
    pub fn from_label(label: &str) -> Result<Self, ValidationError> {
        KIND_TABLE
            .iter()
            .find(|info| info.label == label)
            .map(|info| info.kind)
            .ok_or_else(|| ValidationError::UnknownEntityKind {
                label: label.to_string(),
            })
    }

    /// Returns true for the regulatory-RNA subtypes.
    #[must_use]
    pub const fn is_rna(self) -> bool {
        matches!(
            self,
            Self::Rna
                | Self::CircRna
                | Self::ERna
                | Self::LncRna
                | Self::MiRna
                | Self::NcRna
                | Self::PiRna
                | Self::Pseudogene
                | Self::Ribozyme
                | Self::RRna
                | Self::ScaRna
                | Self::ScRna
                | Self::SnoRna
                | Self::SnRna
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
    }
}

impl TryFrom<String> for EntityKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_label(&value)
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.label().to_string()
    }
}

/// A typed record known by a set of namespaced identifiers.
///
/// # Examples
///
/// ```
/// use biofusion::{Entity, EntityKind};
///
/// let gene = Entity::new(EntityKind::Gene, ["Entrez:672", "HGNC:1100"], ["BRCA1"]).unwrap();
/// assert_eq!(gene.canonical_id(), "HGNC:1100");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    #[serde(rename = "_label")]
    kind: EntityKind,
    ids: BTreeSet<String>,
    names: BTreeSet<String>,
}

impl Entity {
    /// Creates an entity from its kind, identifiers and display names.
    ///
    /// Empty or whitespace-only names are dropped.
    ///
    /// # Errors
    /// - `EmptyIdentifierSet` if no identifier is given
    /// - `MalformedIdentifier` if any identifier is not `<Namespace>:<Value>`
    pub fn new<I, N>(kind: EntityKind, ids: I, names: N) -> Result<Self, ValidationError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let ids: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Err(ValidationError::EmptyIdentifierSet);
        }
        for id in &ids {
            validate_id(id)?;
        }
        let names = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| !n.trim().is_empty())
            .collect();
        Ok(Self { kind, ids, names })
    }

    /// The entity category.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// All identifiers, sorted.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<String> {
        &self.ids
    }

    /// All display names, sorted.
    #[must_use]
    pub const fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Returns true if `id` is one of this entity's identifiers.
    #[must_use]
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// The identifier that represents this entity externally.
    ///
    /// The first identifier in the kind's primary namespace, or failing that
    /// the first identifier overall. Deterministic for a given id set.
    #[must_use]
    pub fn canonical_id(&self) -> &str {
        let primary = self.kind.primary_namespace();
        self.ids
            .iter()
            .find(|id| in_namespace(id, primary))
            .or_else(|| self.ids.iter().next())
            .map_or("", String::as_str)
    }

    /// Unions `other`'s identifiers and names into this entity.
    ///
    /// Returns true if anything was added.
    pub fn merge_from(&mut self, other: &Entity) -> bool {
        let before = (self.ids.len(), self.names.len());
        self.ids.extend(other.ids.iter().cloned());
        self.names.extend(other.names.iter().cloned());
        before != (self.ids.len(), self.names.len())
    }

    pub(crate) fn set_kind(&mut self, kind: EntityKind) {
        self.kind = kind;
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.ids.iter().map(String::as_str).collect();
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        write!(
            f,
            "{}={{ids: [{}], names: [{}]}}",
            self.kind,
            ids.join(","),
            names.join(",")
        )
    }
}
