//! Identity resolution with merge-on-insert.
//!
//! Entities live in an arena addressed by [`EntityKey`]. An alias table maps
//! every known identifier string directly to the arena slot of the entity that
//! currently owns it. Merges repoint eagerly, so lookups never chase a chain.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::entity::{Entity, EntityKey, EntityKind};

/// What an insert did to the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// No incoming id was known; the entity got a fresh slot.
    Created(EntityKey),
    /// The entity was unioned into `survivor`; `absorbed` slots were freed.
    Merged {
        survivor: EntityKey,
        absorbed: Vec<EntityKey>,
    },
    /// Everything the entity carried was already known.
    Unchanged(EntityKey),
}

impl InsertOutcome {
    /// Key of the entity now holding the inserted ids.
    #[must_use]
    pub const fn key(&self) -> EntityKey {
        match self {
            Self::Created(key) | Self::Unchanged(key) => *key,
            Self::Merged { survivor, .. } => *survivor,
        }
    }

    #[must_use]
    pub const fn is_merge(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Alias table plus entity arena.
#[derive(Debug, Default)]
pub struct IdentityResolver {
    slots: Vec<Option<Entity>>,
    aliases: HashMap<String, EntityKey>,
    live: usize,
    merges: usize,
    kind_conflicts: usize,
}

impl IdentityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entity, merging it with every live entity sharing an id.
    ///
    /// The survivor is the lowest key among the matches and takes the
    /// incoming entity's kind. A match of a different kind is logged and
    /// counted as a kind conflict; the merge still happens.
    pub fn insert(&mut self, entity: Entity) -> InsertOutcome {
        let matched: BTreeSet<EntityKey> = entity
            .ids()
            .iter()
            .filter_map(|id| self.aliases.get(id).copied())
            .collect();

        let mut matched = matched.into_iter();
        let Some(survivor) = matched.next() else {
            return InsertOutcome::Created(self.allocate(entity));
        };
        let Some(mut merged) = self.take(survivor) else {
            return InsertOutcome::Created(self.allocate(entity));
        };

        let mut found = vec![(survivor, merged.clone())];
        let mut absorbed = Vec::new();
        for key in matched {
            if let Some(other) = self.take(key) {
                found.push((key, other));
                absorbed.push(key);
            }
        }

        for (key, existing) in &found {
            if existing.kind() != entity.kind() {
                self.kind_conflicts += 1;
                let shared: Vec<&str> = existing
                    .ids()
                    .intersection(entity.ids())
                    .map(String::as_str)
                    .collect();
                warn!(
                    existing_kind = %existing.kind(),
                    incoming_kind = %entity.kind(),
                    key = %key,
                    shared_ids = ?shared,
                    "identifier shared across entity kinds; incoming kind wins"
                );
            }
        }

        let mut changed = merged.kind() != entity.kind();
        for (_, other) in found.iter().skip(1) {
            changed |= merged.merge_from(other);
        }
        changed |= merged.merge_from(&entity);
        merged.set_kind(entity.kind());

        if changed || !absorbed.is_empty() {
            for id in merged.ids() {
                self.aliases.insert(id.clone(), survivor);
            }
        }
        self.slots[survivor.index()] = Some(merged);
        self.live += 1;

        if absorbed.is_empty() && !changed {
            return InsertOutcome::Unchanged(survivor);
        }

        self.merges += 1;
        debug!(survivor = %survivor, absorbed = absorbed.len(), "merged entity");
        InsertOutcome::Merged { survivor, absorbed }
    }

    /// Key of the live entity owning `id`.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<EntityKey> {
        self.aliases.get(id).copied()
    }

    #[must_use]
    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.slots.get(key.index()).and_then(Option::as_ref)
    }

    /// Live entity owning `id`.
    #[must_use]
    pub fn entity_for(&self, id: &str) -> Option<&Entity> {
        self.resolve(id).and_then(|key| self.get(key))
    }

    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    /// Number of live entities.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live entities in key order.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|entity| (EntityKey::new(index as u32), entity)))
    }

    /// Keys of every live entity of `kind`, in key order.
    #[must_use]
    pub fn keys_of_kind(&self, kind: EntityKind) -> Vec<EntityKey> {
        self.iter()
            .filter(|(_, entity)| entity.kind() == kind)
            .map(|(key, _)| key)
            .collect()
    }

    /// Removes an entity and every alias pointing at it.
    pub fn remove(&mut self, key: EntityKey) -> Option<Entity> {
        let entity = self.take(key)?;
        for id in entity.ids() {
            if self.aliases.get(id) == Some(&key) {
                self.aliases.remove(id);
            }
        }
        Some(entity)
    }

    /// Inserts that unioned into an existing entity and changed it.
    #[must_use]
    pub const fn merges(&self) -> usize {
        self.merges
    }

    /// Matches whose kind differed from the incoming entity's kind.
    #[must_use]
    pub const fn kind_conflicts(&self) -> usize {
        self.kind_conflicts
    }

    fn allocate(&mut self, entity: Entity) -> EntityKey {
        #[allow(clippy::cast_possible_truncation)]
        let key = EntityKey::new(self.slots.len() as u32);
        for id in entity.ids() {
            self.aliases.insert(id.clone(), key);
        }
        self.slots.push(Some(entity));
        self.live += 1;
        key
    }

    fn take(&mut self, key: EntityKey) -> Option<Entity> {
        let entity = self.slots.get_mut(key.index()).and_then(Option::take)?;
        self.live -= 1;
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(ids: &[&str], names: &[&str]) -> Entity {
        Entity::new(EntityKind::Gene, ids.iter().copied(), names.iter().copied()).unwrap()
    }

    fn assert_alias_invariant(resolver: &IdentityResolver) {
        for (key, entity) in resolver.iter() {
            for id in entity.ids() {
                assert_eq!(resolver.resolve(id), Some(key), "{id} must resolve to {key}");
            }
        }
    }

    #[test]
    fn test_insert_creates() {
        let mut r = IdentityResolver::new();
        let outcome = r.insert(gene(&["HGNC:1"], &["A"]));
        assert_eq!(outcome, InsertOutcome::Created(EntityKey::new(0)));
        assert_eq!(r.len(), 1);
        assert_eq!(r.entity_for("HGNC:1").unwrap().names().len(), 1);
    }

    #[test]
    fn test_insert_merges_on_shared_id() {
        let mut r = IdentityResolver::new();
        r.insert(gene(&["HGNC:1100"], &["BRCA1"]));
        let outcome = r.insert(gene(&["HGNC:1100", "Entrez:672"], &[]));
        assert!(outcome.is_merge());
        assert_eq!(r.len(), 1);
        assert_eq!(r.resolve("Entrez:672"), Some(EntityKey::new(0)));
        assert_eq!(r.merges(), 1);
        assert_alias_invariant(&r);
    }

    #[test]
    fn test_bridge_insert_collapses_two_entities() {
        let mut r = IdentityResolver::new();
        r.insert(gene(&["HGNC:1"], &["A"]));
        r.insert(gene(&["Entrez:1"], &["B"]));
        assert_eq!(r.len(), 2);

        let outcome = r.insert(gene(&["HGNC:1", "Entrez:1"], &[]));
        assert_eq!(
            outcome,
            InsertOutcome::Merged {
                survivor: EntityKey::new(0),
                absorbed: vec![EntityKey::new(1)],
            }
        );
        assert_eq!(r.len(), 1);
        assert!(r.get(EntityKey::new(1)).is_none());
        let merged = r.get(EntityKey::new(0)).unwrap();
        assert_eq!(merged.ids().len(), 2);
        assert_eq!(merged.names().len(), 2);
        assert_alias_invariant(&r);
    }

    #[test]
    fn test_reinsert_is_unchanged() {
        let mut r = IdentityResolver::new();
        let e = gene(&["HGNC:1", "Entrez:1"], &["A"]);
        r.insert(e.clone());
        let before: Vec<Entity> = r.iter().map(|(_, e)| e.clone()).collect();

        assert_eq!(r.insert(e), InsertOutcome::Unchanged(EntityKey::new(0)));
        let after: Vec<Entity> = r.iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(r.merges(), 0);
    }

    #[test]
    fn test_cross_kind_collision_incoming_kind_wins() {
        let mut r = IdentityResolver::new();
        r.insert(gene(&["HGNC:5"], &["X"]));
        let lnc = Entity::new(EntityKind::LncRna, ["HGNC:5"], ["X-AS1"]).unwrap();
        let outcome = r.insert(lnc);

        assert!(outcome.is_merge());
        assert_eq!(r.kind_conflicts(), 1);
        let e = r.entity_for("HGNC:5").unwrap();
        assert_eq!(e.kind(), EntityKind::LncRna);
        assert_eq!(e.names().len(), 2);
    }

    #[test]
    fn test_remove_drops_aliases_and_never_reuses_keys() {
        let mut r = IdentityResolver::new();
        let k = r.insert(gene(&["HGNC:1", "Entrez:1"], &[])).key();
        let removed = r.remove(k).unwrap();
        assert_eq!(removed.ids().len(), 2);
        assert!(r.is_empty());
        assert!(r.resolve("Entrez:1").is_none());

        let next = r.insert(gene(&["HGNC:1"], &[])).key();
        assert_ne!(next, k);
    }

    #[test]
    fn test_keys_of_kind() {
        let mut r = IdentityResolver::new();
        r.insert(gene(&["HGNC:1"], &[]));
        r.insert(Entity::new(EntityKind::Disease, ["UMLS:C1"], ["d"]).unwrap());
        r.insert(gene(&["HGNC:2"], &[]));
        assert_eq!(
            r.keys_of_kind(EntityKind::Gene),
            vec![EntityKey::new(0), EntityKey::new(2)]
        );
        assert_eq!(r.keys_of_kind(EntityKind::Disease), vec![EntityKey::new(1)]);
    }
}
