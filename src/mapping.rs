//! Cross-vocabulary equivalence table.
//!
//! Built from two JSON documents derived from an ontology with cross
//! references (MONDO for diseases):
//!
//! - `lookup.json`: `{ "<classId>": { "label": "<name>" | null, "refs": ["<id>", ...] } }`
//! - `reverse_lookup.json`: `{ "<externalId>": ["<classId>", ...] }`
//!
//! The table is read once and never mutated during a run.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{FusionResult, SourceError};
use crate::identifier::{in_namespace, validate_id};

/// One equivalence class of the ontology.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EquivalenceClass {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub refs: Vec<String>,
}

/// Identifiers and names equivalent to a looked-up id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Equivalence {
    pub ids: BTreeSet<String>,
    pub names: BTreeSet<String>,
}

/// Read-only id → equivalence-class table.
#[derive(Debug, Clone, Default)]
pub struct CrossVocabularyTable {
    classes: HashMap<String, EquivalenceClass>,
    reverse: HashMap<String, Vec<String>>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, SourceError> {
    let text = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

impl CrossVocabularyTable {
    /// Builds a table from in-memory classes and reverse entries.
    pub fn from_entries<C, R, V>(classes: C, reverse: R) -> Self
    where
        C: IntoIterator<Item = (String, EquivalenceClass)>,
        R: IntoIterator<Item = (String, V)>,
        V: IntoIterator<Item = String>,
    {
        Self {
            classes: classes.into_iter().collect(),
            reverse: reverse
                .into_iter()
                .map(|(id, class_ids)| (id, class_ids.into_iter().collect()))
                .collect(),
        }
    }

    /// Loads `lookup.json` and `reverse_lookup.json`.
    ///
    /// # Errors
    /// `SourceError::Io` / `SourceError::Json` for unreadable or malformed files.
    pub fn from_paths(lookup: &Path, reverse_lookup: &Path) -> FusionResult<Self> {
        let classes: HashMap<String, EquivalenceClass> = read_json(lookup)?;
        let reverse: HashMap<String, Vec<String>> = read_json(reverse_lookup)?;
        info!(
            classes = classes.len(),
            external_ids = reverse.len(),
            "loaded cross-vocabulary table"
        );
        Ok(Self { classes, reverse })
    }

    fn classes_of<'a>(&'a self, id: &str) -> impl Iterator<Item = (&'a String, &'a EquivalenceClass)> {
        self.reverse
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|class_id| self.classes.get_key_value(class_id))
    }

    /// Everything equivalent to `id`, or `None` if `id` is not in the table.
    ///
    /// Ids are the class ids plus their cross references; names are the class
    /// labels. Entries that are not well-formed namespaced ids are skipped.
    #[must_use]
    pub fn equivalents(&self, id: &str) -> Option<Equivalence> {
        let mut found = false;
        let mut equivalence = Equivalence::default();
        for (class_id, class) in self.classes_of(id) {
            found = true;
            let candidates = std::iter::once(class_id).chain(class.refs.iter());
            equivalence
                .ids
                .extend(candidates.filter(|c| validate_id(c).is_ok()).cloned());
            if let Some(label) = class.label.as_ref().filter(|l| !l.trim().is_empty()) {
                equivalence.names.insert(label.clone());
            }
        }
        found.then_some(equivalence)
    }

    /// All cross references of every class `id` maps to, sorted.
    #[must_use]
    pub fn map_from(&self, id: &str) -> Vec<String> {
        let refs: BTreeSet<&String> = self
            .classes_of(id)
            .flat_map(|(_, class)| class.refs.iter())
            .collect();
        refs.into_iter().cloned().collect()
    }

    /// First cross reference of `id` in `namespace`.
    #[must_use]
    pub fn map_from_to(&self, id: &str, namespace: &str) -> Option<String> {
        self.classes_of(id)
            .flat_map(|(_, class)| class.refs.iter())
            .find(|r| in_namespace(r, namespace))
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
