//! Secondary indices over relationships.
//!
//! Relationships are keyed by the alias string they were created with. An
//! entity accumulates aliases through merges, so incidence queries take the
//! entity and scan every one of its current ids.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::entity::Entity;
use crate::relationship::{RelationLabel, Relationship, SequenceId};

/// Relationships by sequence id, with label, source-alias and target-alias indices.
#[derive(Debug, Default)]
pub struct RelationshipIndex {
    relationships: BTreeMap<SequenceId, Relationship>,
    by_label: BTreeMap<RelationLabel, BTreeSet<SequenceId>>,
    by_source: HashMap<String, BTreeSet<SequenceId>>,
    by_target: HashMap<String, BTreeSet<SequenceId>>,
}

fn unlink(index: &mut HashMap<String, BTreeSet<SequenceId>>, key: &str, seq: SequenceId) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(&seq);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

impl RelationshipIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a relationship under all indices.
    ///
    /// A relationship already present under the same sequence id is replaced.
    pub fn add(&mut self, rel: Relationship) {
        let seq = rel.sequence_id;
        if self.relationships.contains_key(&seq) {
            self.remove(seq);
        }
        self.by_label.entry(rel.label).or_default().insert(seq);
        self.by_source
            .entry(rel.source_ref.clone())
            .or_default()
            .insert(seq);
        self.by_target
            .entry(rel.target_ref.clone())
            .or_default()
            .insert(seq);
        self.relationships.insert(seq, rel);
    }

    /// Removes a relationship from every index.
    pub fn remove(&mut self, seq: SequenceId) -> Option<Relationship> {
        let rel = self.relationships.remove(&seq)?;
        if let Some(bucket) = self.by_label.get_mut(&rel.label) {
            bucket.remove(&seq);
            if bucket.is_empty() {
                self.by_label.remove(&rel.label);
            }
        }
        unlink(&mut self.by_source, &rel.source_ref, seq);
        unlink(&mut self.by_target, &rel.target_ref, seq);
        Some(rel)
    }

    #[must_use]
    pub fn get(&self, seq: SequenceId) -> Option<&Relationship> {
        self.relationships.get(&seq)
    }

    /// All relationships, in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Relationships carrying `label`, in sequence order.
    #[must_use]
    pub fn by_label(&self, label: RelationLabel) -> Vec<&Relationship> {
        self.by_label
            .get(&label)
            .map(|seqs| self.collect(seqs.iter().copied()))
            .unwrap_or_default()
    }

    /// Relationships touching any current id of `entity`, in sequence order.
    ///
    /// Self-loops are reported once. `label` narrows the result when given.
    #[must_use]
    pub fn incident_to(&self, entity: &Entity, label: Option<RelationLabel>) -> Vec<&Relationship> {
        let mut seqs = BTreeSet::new();
        for id in entity.ids() {
            for index in [&self.by_source, &self.by_target] {
                if let Some(bucket) = index.get(id) {
                    seqs.extend(bucket.iter().copied());
                }
            }
        }
        self.filtered(seqs, label)
    }

    /// Relationships directed from any id of `source` to any id of `target`.
    #[must_use]
    pub fn between(
        &self,
        source: &Entity,
        target: &Entity,
        label: Option<RelationLabel>,
    ) -> Vec<&Relationship> {
        let outgoing = Self::gather(&self.by_source, source);
        let incoming = Self::gather(&self.by_target, target);
        let seqs: BTreeSet<SequenceId> = outgoing.intersection(&incoming).copied().collect();
        self.filtered(seqs, label)
    }

    /// Returns true if `id` is the source or target alias of any relationship.
    #[must_use]
    pub fn has_incident(&self, id: &str) -> bool {
        self.by_source.contains_key(id) || self.by_target.contains_key(id)
    }

    /// Labels with at least one relationship, sorted.
    #[must_use]
    pub fn labels(&self) -> Vec<RelationLabel> {
        self.by_label.keys().copied().collect()
    }

    /// Relationship count per label.
    #[must_use]
    pub fn label_counts(&self) -> BTreeMap<RelationLabel, usize> {
        self.by_label
            .iter()
            .map(|(label, seqs)| (*label, seqs.len()))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    fn gather(index: &HashMap<String, BTreeSet<SequenceId>>, entity: &Entity) -> BTreeSet<SequenceId> {
        entity
            .ids()
            .iter()
            .filter_map(|id| index.get(id))
            .flat_map(|bucket| bucket.iter().copied())
            .collect()
    }

    fn filtered(&self, seqs: BTreeSet<SequenceId>, label: Option<RelationLabel>) -> Vec<&Relationship> {
        self.collect(seqs.into_iter())
            .into_iter()
            .filter(|rel| label.map_or(true, |l| rel.label == l))
            .collect()
    }

    fn collect(&self, seqs: impl Iterator<Item = SequenceId>) -> Vec<&Relationship> {
        seqs.filter_map(|seq| self.relationships.get(&seq)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::value::Attributes;

    fn rel(seq: u64, label: RelationLabel, source: &str, target: &str) -> Relationship {
        Relationship {
            sequence_id: SequenceId::new(seq),
            label,
            source_ref: source.to_string(),
            target_ref: target.to_string(),
            attributes: Attributes::new(),
        }
    }

    fn seqs(rels: &[&Relationship]) -> Vec<u64> {
        rels.iter().map(|r| r.sequence_id.value()).collect()
    }

    #[test]
    fn test_by_label_in_sequence_order() {
        let mut index = RelationshipIndex::new();
        index.add(rel(2, RelationLabel::Codes, "HGNC:1", "HGNC:2"));
        index.add(rel(1, RelationLabel::Codes, "HGNC:3", "HGNC:4"));
        index.add(rel(3, RelationLabel::Targets, "DrugBank:DB1", "HGNC:1"));
        assert_eq!(seqs(&index.by_label(RelationLabel::Codes)), vec![1, 2]);
        assert_eq!(index.labels(), vec![RelationLabel::Targets, RelationLabel::Codes]);
        assert!(index.by_label(RelationLabel::Eqtl).is_empty());
    }

    #[test]
    fn test_incident_scans_all_aliases() {
        let mut index = RelationshipIndex::new();
        index.add(rel(1, RelationLabel::Targets, "DrugBank:DB1", "HGNC:1100"));
        index.add(rel(2, RelationLabel::AssociatesWith, "Entrez:672", "UMLS:C1"));
        let gene = Entity::new(EntityKind::Gene, ["HGNC:1100", "Entrez:672"], ["BRCA1"]).unwrap();

        assert_eq!(seqs(&index.incident_to(&gene, None)), vec![1, 2]);
        assert_eq!(
            seqs(&index.incident_to(&gene, Some(RelationLabel::AssociatesWith))),
            vec![2]
        );
    }

    #[test]
    fn test_self_loop_reported_once() {
        let mut index = RelationshipIndex::new();
        index.add(rel(1, RelationLabel::Interacts, "HGNC:1", "Entrez:1"));
        let gene = Entity::new(EntityKind::Gene, ["HGNC:1", "Entrez:1"], Vec::<String>::new()).unwrap();
        assert_eq!(index.incident_to(&gene, None).len(), 1);
    }

    #[test]
    fn test_between_is_directed() {
        let mut index = RelationshipIndex::new();
        index.add(rel(1, RelationLabel::Targets, "DrugBank:DB1", "HGNC:1"));
        index.add(rel(2, RelationLabel::Targets, "HGNC:1", "DrugBank:DB1"));
        let drug = Entity::new(EntityKind::Drug, ["DrugBank:DB1"], Vec::<String>::new()).unwrap();
        let gene = Entity::new(EntityKind::Gene, ["HGNC:1"], Vec::<String>::new()).unwrap();
        assert_eq!(seqs(&index.between(&drug, &gene, None)), vec![1]);
        assert_eq!(seqs(&index.between(&gene, &drug, Some(RelationLabel::Targets))), vec![2]);
    }

    #[test]
    fn test_remove_clears_every_index() {
        let mut index = RelationshipIndex::new();
        index.add(rel(1, RelationLabel::Regulates, "HGNC:1", "HGNC:2"));
        assert!(index.has_incident("HGNC:2"));

        let removed = index.remove(SequenceId::new(1)).unwrap();
        assert_eq!(removed.label, RelationLabel::Regulates);
        assert!(index.is_empty());
        assert!(!index.has_incident("HGNC:1"));
        assert!(!index.has_incident("HGNC:2"));
        assert!(index.labels().is_empty());
        assert!(index.remove(SequenceId::new(1)).is_none());
    }
}
