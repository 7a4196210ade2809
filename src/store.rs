//! The fused graph held in memory for one run.
//!
//! [`GraphStore`] ties the identity resolver, the relationship index and the
//! sequence counter together. One store is built per run and handed from the
//! pipeline to the exporter.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entity::{Entity, EntityKey, EntityKind};
use crate::error::ConsistencyError;
use crate::index::RelationshipIndex;
use crate::relationship::{RelationLabel, Relationship, SequenceId};
use crate::resolver::{IdentityResolver, InsertOutcome};
use crate::source::{RelationshipRecord, SourceGraph};
use crate::value::Attributes;

/// Counts describing a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entities: usize,
    pub relationships: usize,
    pub entities_by_kind: BTreeMap<String, usize>,
    pub relationships_by_label: BTreeMap<String, usize>,
}

/// Resolver, relationship index and sequence counter for one run.
#[derive(Debug, Default)]
pub struct GraphStore {
    resolver: IdentityResolver,
    index: RelationshipIndex,
    next_sequence: u64,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, merging it with any entity sharing an identifier.
    pub fn add_entity(&mut self, entity: Entity) -> InsertOutcome {
        self.resolver.insert(entity)
    }

    /// Adds a relationship and returns its sequence id.
    ///
    /// Endpoints are not checked here; a reference to an unknown id surfaces
    /// when the relationship's endpoints are resolved.
    pub fn add_relationship(
        &mut self,
        label: RelationLabel,
        source_ref: impl Into<String>,
        target_ref: impl Into<String>,
        attributes: Attributes,
    ) -> SequenceId {
        self.next_sequence += 1;
        let sequence_id = SequenceId::new(self.next_sequence);
        self.index.add(Relationship {
            sequence_id,
            label,
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            attributes,
        });
        sequence_id
    }

    pub fn remove_relationship(&mut self, seq: SequenceId) -> Option<Relationship> {
        self.index.remove(seq)
    }

    /// Removes an entity together with every relationship touching it.
    pub fn remove_entity(&mut self, key: EntityKey) -> Option<Entity> {
        let entity = self.resolver.get(key)?;
        let incident: Vec<SequenceId> = self
            .index
            .incident_to(entity, None)
            .into_iter()
            .map(|rel| rel.sequence_id)
            .collect();
        for seq in incident {
            self.index.remove(seq);
        }
        self.resolver.remove(key)
    }

    /// Resolves both endpoints of `rel`.
    ///
    /// # Errors
    /// `ConsistencyError::UnknownEndpoint` naming the relationship and the id
    /// that no live entity owns.
    pub fn endpoints(&self, rel: &Relationship) -> Result<(&Entity, &Entity), ConsistencyError> {
        let lookup = |id: &str| {
            self.resolver
                .entity_for(id)
                .ok_or_else(|| ConsistencyError::UnknownEndpoint {
                    sequence_id: rel.sequence_id,
                    label: rel.label,
                    id: id.to_string(),
                })
        };
        Ok((lookup(&rel.source_ref)?, lookup(&rel.target_ref)?))
    }

    #[must_use]
    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    #[must_use]
    pub fn index(&self) -> &RelationshipIndex {
        &self.index
    }

    #[must_use]
    pub fn entity_for(&self, id: &str) -> Option<&Entity> {
        self.resolver.entity_for(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.resolver.iter()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.index.iter()
    }

    #[must_use]
    pub fn relationships_by_label(&self, label: RelationLabel) -> Vec<&Relationship> {
        self.index.by_label(label)
    }

    #[must_use]
    pub fn relationships_incident_to(
        &self,
        entity: &Entity,
        label: Option<RelationLabel>,
    ) -> Vec<&Relationship> {
        self.index.incident_to(entity, label)
    }

    #[must_use]
    pub fn relationships_between(
        &self,
        source: &Entity,
        target: &Entity,
        label: Option<RelationLabel>,
    ) -> Vec<&Relationship> {
        self.index.between(source, target, label)
    }

    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.resolver.len()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.index.len()
    }

    /// Entity kinds with at least one live entity, sorted.
    #[must_use]
    pub fn kinds_present(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.resolver.iter().map(|(_, e)| e.kind()).collect();
        kinds.sort_unstable();
        kinds.dedup();
        kinds
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let mut entities_by_kind = BTreeMap::new();
        for (_, entity) in self.resolver.iter() {
            *entities_by_kind
                .entry(entity.kind().label().to_string())
                .or_insert(0) += 1;
        }
        let relationships_by_label = self
            .index
            .label_counts()
            .into_iter()
            .map(|(label, count)| (label.as_str().to_string(), count))
            .collect();
        StoreStats {
            entities: self.resolver.len(),
            relationships: self.index.len(),
            entities_by_kind,
            relationships_by_label,
        }
    }

    /// Snapshot of the whole store as a source graph.
    ///
    /// Entities are ordered by canonical id, relationships by sequence id.
    #[must_use]
    pub fn to_document(&self) -> SourceGraph {
        let mut entities: Vec<Entity> = self.resolver.iter().map(|(_, e)| e.clone()).collect();
        entities.sort_by(|a, b| a.canonical_id().cmp(b.canonical_id()));
        let relationships = self
            .index
            .iter()
            .map(|rel| {
                RelationshipRecord::new(
                    rel.label,
                    rel.source_ref.clone(),
                    rel.target_ref.clone(),
                    rel.attributes.clone(),
                )
            })
            .collect();
        SourceGraph {
            entities,
            relationships,
        }
    }
}
