//! The fusion pipeline.
//!
//! Stages run strictly in order:
//!
//! 1. load every source graph (entities before relationships),
//! 2. augment disease identifiers from the cross-vocabulary table,
//! 3. drop duplicate relationships,
//! 4. prune entities with no incident relationship.
//!
//! # Examples
//!
//! ```
//! use biofusion::{FusionPipeline, SourceGraph};
//!
//! let source = SourceGraph::from_json_str(r#"{
//!     "nodes": [{"_label": "Gene", "ids": ["HGNC:1"]}, {"_label": "Gene", "ids": ["HGNC:2"]},
//!               {"_label": "Gene", "ids": ["HGNC:3"]}],
//!     "edges": [{"_label": "CODES", "_source": "HGNC:1", "_target": "HGNC:2", "source": "x"}]
//! }"#).unwrap();
//!
//! let mut pipeline = FusionPipeline::new();
//! let report = pipeline.run(&[source], None).unwrap();
//! assert_eq!(report.entities_pruned, 1);
//! assert_eq!(pipeline.store().entity_count(), 2);
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::entity::{Entity, EntityKind};
use crate::error::{FusionResult, PipelineError};
use crate::mapping::CrossVocabularyTable;
use crate::relationship::SequenceId;
use crate::source::SourceGraph;
use crate::store::GraphStore;

/// Pipeline position. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loading,
    Augmented,
    Deduplicated,
    Pruned,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Augmented => "augmented",
            Self::Deduplicated => "deduplicated",
            Self::Pruned => "pruned",
        }
    }
}

/// Summary of one fusion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FusionReport {
    pub sources_loaded: usize,
    pub entities_inserted: usize,
    pub relationships_inserted: usize,
    pub merges: usize,
    pub kind_conflicts: usize,
    pub augmenting_inserts: usize,
    pub duplicates_removed: usize,
    pub entities_pruned: usize,
    pub final_entities: usize,
    pub final_relationships: usize,
}

/// Owns the store for one run and drives it through the stages.
#[derive(Debug)]
pub struct FusionPipeline {
    store: GraphStore,
    stage: Stage,
    report: FusionReport,
}

impl Default for FusionPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: GraphStore::new(),
            stage: Stage::Loading,
            report: FusionReport::default(),
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn store(&self) -> &GraphStore {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> GraphStore {
        self.store
    }

    fn ready_for(&self, requested: Stage) -> Result<(), PipelineError> {
        let expected_from = match requested {
            Stage::Loading | Stage::Augmented => Stage::Loading,
            Stage::Deduplicated => Stage::Augmented,
            Stage::Pruned => Stage::Deduplicated,
        };
        if self.stage != expected_from {
            return Err(PipelineError::OutOfOrder {
                requested: requested.as_str(),
                actual: self.stage.as_str(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, requested: Stage) -> Result<(), PipelineError> {
        self.ready_for(requested)?;
        self.stage = requested;
        Ok(())
    }

    /// Inserts every entity of `source`, then every relationship.
    ///
    /// # Errors
    /// `PipelineError::OutOfOrder` once the pipeline has left the loading stage.
    pub fn load_source(&mut self, source: &SourceGraph) -> FusionResult<()> {
        self.advance(Stage::Loading)?;
        for entity in &source.entities {
            self.store.add_entity(entity.clone());
        }
        for rel in &source.relationships {
            self.store.add_relationship(
                rel.label,
                rel.source_ref.clone(),
                rel.target_ref.clone(),
                rel.attributes.clone(),
            );
        }
        self.report.sources_loaded += 1;
        self.report.entities_inserted += source.entities.len();
        self.report.relationships_inserted += source.relationships.len();
        debug!(
            entities = source.entities.len(),
            relationships = source.relationships.len(),
            "loaded source graph"
        );
        Ok(())
    }

    /// Adds equivalent identifiers and names to every disease entity.
    ///
    /// Returns the number of augmenting inserts.
    ///
    /// # Errors
    /// `PipelineError::OutOfOrder` unless called right after loading.
    pub fn augment(&mut self, table: &CrossVocabularyTable) -> FusionResult<usize> {
        self.advance(Stage::Augmented)?;
        let _span = info_span!("augment").entered();

        // Ids are fixed before the first insert; merges during the pass
        // must not hide an entity's ids from lookup.
        let resolver = self.store.resolver();
        let ids: Vec<String> = resolver
            .keys_of_kind(EntityKind::Disease)
            .into_iter()
            .filter_map(|key| resolver.get(key))
            .flat_map(|entity| entity.ids().iter().cloned())
            .collect();

        let mut inserts = 0;
        for id in ids {
            let Some(equivalence) = table.equivalents(&id) else {
                continue;
            };
            let mut equivalent_ids = equivalence.ids;
            equivalent_ids.insert(id);
            let augmenting = Entity::new(EntityKind::Disease, equivalent_ids, equivalence.names)?;
            self.store.add_entity(augmenting);
            inserts += 1;
        }

        self.report.augmenting_inserts = inserts;
        info!(
            inserts,
            entities = self.store.entity_count(),
            "cross-vocabulary augmentation complete"
        );
        Ok(inserts)
    }

    /// Moves past augmentation without a table.
    ///
    /// # Errors
    /// `PipelineError::OutOfOrder` unless called right after loading.
    pub fn skip_augmentation(&mut self) -> FusionResult<()> {
        self.advance(Stage::Augmented)?;
        info!("cross-vocabulary augmentation skipped");
        Ok(())
    }

    /// Removes relationships that duplicate an earlier one exactly.
    ///
    /// Duplicates share a label, canonical source id, canonical target id and
    /// an equal attribute map. The lowest sequence id of each class survives.
    /// Returns the number removed.
    ///
    /// # Errors
    /// - `PipelineError::OutOfOrder` unless called right after augmentation
    /// - `ConsistencyError::UnknownEndpoint` if an endpoint id is unknown; the
    ///   store and the stage are left untouched
    pub fn deduplicate(&mut self) -> FusionResult<usize> {
        self.ready_for(Stage::Deduplicated)?;
        let _span = info_span!("deduplicate").entered();

        let mut duplicates: Vec<SequenceId> = Vec::new();
        for label in self.store.index().labels() {
            let mut groups: HashMap<(&str, &str, blake3::Hash), Vec<SequenceId>> = HashMap::new();
            for rel in self.store.relationships_by_label(label) {
                let (source, target) = self.store.endpoints(rel)?;
                let key = (
                    source.canonical_id(),
                    target.canonical_id(),
                    rel.attribute_fingerprint(),
                );
                let survivors = groups.entry(key).or_default();
                let is_duplicate = survivors.iter().any(|seq| {
                    self.store
                        .index()
                        .get(*seq)
                        .is_some_and(|kept| kept.attributes == rel.attributes)
                });
                if is_duplicate {
                    duplicates.push(rel.sequence_id);
                } else {
                    survivors.push(rel.sequence_id);
                }
            }
        }

        // Every endpoint resolved; only now does the stage move on.
        self.stage = Stage::Deduplicated;
        for seq in &duplicates {
            self.store.remove_relationship(*seq);
        }

        let removed = duplicates.len();
        self.report.duplicates_removed = removed;
        info!(
            removed,
            relationships = self.store.relationship_count(),
            "relationship deduplication complete"
        );
        Ok(removed)
    }

    /// Removes every entity none of whose ids is an endpoint alias.
    ///
    /// Returns the number removed.
    ///
    /// # Errors
    /// `PipelineError::OutOfOrder` unless called right after deduplication.
    pub fn prune(&mut self) -> FusionResult<usize> {
        self.advance(Stage::Pruned)?;
        let _span = info_span!("prune").entered();

        let index = self.store.index();
        let disconnected: Vec<_> = self
            .store
            .entities()
            .filter(|(_, entity)| !entity.ids().iter().any(|id| index.has_incident(id)))
            .map(|(key, _)| key)
            .collect();
        for key in &disconnected {
            self.store.remove_entity(*key);
        }

        let pruned = disconnected.len();
        self.report.entities_pruned = pruned;
        info!(pruned, entities = self.store.entity_count(), "pruning complete");
        Ok(pruned)
    }

    /// Runs every stage over `sources` in order.
    ///
    /// Augmentation is skipped when `mapping` is `None`.
    ///
    /// # Errors
    /// Any error of the individual stages.
    pub fn run(
        &mut self,
        sources: &[SourceGraph],
        mapping: Option<&CrossVocabularyTable>,
    ) -> FusionResult<FusionReport> {
        {
            let _span = info_span!("load", sources = sources.len()).entered();
            for source in sources {
                self.load_source(source)?;
            }
            info!(
                entities = self.store.entity_count(),
                relationships = self.store.relationship_count(),
                merges = self.store.resolver().merges(),
                "sources loaded"
            );
        }
        match mapping {
            Some(table) => {
                self.augment(table)?;
            }
            None => self.skip_augmentation()?,
        }
        self.deduplicate()?;
        self.prune()?;
        Ok(self.report())
    }

    /// Report of what the pipeline has done so far.
    #[must_use]
    pub fn report(&self) -> FusionReport {
        FusionReport {
            merges: self.store.resolver().merges(),
            kind_conflicts: self.store.resolver().kind_conflicts(),
            final_entities: self.store.entity_count(),
            final_relationships: self.store.relationship_count(),
            ..self.report.clone()
        }
    }
}
