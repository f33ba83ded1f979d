//! In-memory containment hierarchy and the append-only integrity ledger.

use std::collections::{HashMap, HashSet};

use super::domain::{
    Entity, EntityId, EntityKind, EventId, IntegrityEvent, Representative, RepresentativeId,
};

/// Violations raised when a write would break the three-tier containment
/// rules. Validation happens before anything mutates, so a rejected write
/// leaves the graph untouched.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("entity {0} is not registered")]
    UnknownEntity(EntityId),
    #[error("parent {0} is not registered; upsert parents before children")]
    UnknownParent(EntityId),
    #[error("{} entities require a parent", .kind.label())]
    MissingParent { kind: EntityKind },
    #[error("the national root cannot name a parent")]
    RootHasParent,
    #[error("a {} cannot be a child of a {}", .child.label(), .parent.label())]
    TierMismatch { child: EntityKind, parent: EntityKind },
    #[error("national root already registered as {0}")]
    SecondRoot(EntityId),
    #[error("parent chain of {0} loops back onto itself")]
    HierarchyCycle(EntityId),
}

/// Three-tier containment hierarchy plus the representative roster.
///
/// Child lists keep insertion order; ordering carries no scoring weight.
#[derive(Debug, Default)]
pub struct EntityGraph {
    entities: HashMap<EntityId, Entity>,
    children: HashMap<EntityId, Vec<EntityId>>,
    root: Option<EntityId>,
    representatives: HashMap<RepresentativeId, Representative>,
}

impl EntityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity's static fields.
    pub fn upsert_entity(&mut self, entity: Entity) -> Result<(), HierarchyError> {
        self.validate(&entity)?;

        let previous = self.entities.get(&entity.id).cloned();
        if let Some(previous) = &previous {
            if previous.parent_id != entity.parent_id {
                if let Some(old_parent) = &previous.parent_id {
                    if let Some(siblings) = self.children.get_mut(old_parent) {
                        siblings.retain(|child| child != &entity.id);
                    }
                }
                if let Some(new_parent) = entity.parent_id.clone() {
                    self.children
                        .entry(new_parent)
                        .or_default()
                        .push(entity.id.clone());
                }
            }
        } else if let Some(parent) = entity.parent_id.clone() {
            self.children.entry(parent).or_default().push(entity.id.clone());
        }

        if entity.kind == EntityKind::National {
            self.root = Some(entity.id.clone());
        } else if previous.map(|existing| existing.kind) == Some(EntityKind::National)
            && self.root.as_ref() == Some(&entity.id)
        {
            self.root = None;
        }

        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    fn validate(&self, entity: &Entity) -> Result<(), HierarchyError> {
        match (entity.kind.parent_kind(), entity.parent_id.as_ref()) {
            (None, Some(_)) => return Err(HierarchyError::RootHasParent),
            (None, None) => {
                if let Some(root) = &self.root {
                    if root != &entity.id {
                        return Err(HierarchyError::SecondRoot(root.clone()));
                    }
                }
            }
            (Some(_), None) => return Err(HierarchyError::MissingParent { kind: entity.kind }),
            (Some(expected), Some(parent_id)) => {
                let parent = self
                    .entities
                    .get(parent_id)
                    .ok_or_else(|| HierarchyError::UnknownParent(parent_id.clone()))?;
                if parent.kind != expected {
                    return Err(HierarchyError::TierMismatch {
                        child: entity.kind,
                        parent: parent.kind,
                    });
                }
                self.ensure_acyclic(&entity.id, parent_id)?;
            }
        }

        // Re-kinding must not strand existing children in the wrong tier.
        if let Some(previous) = self.entities.get(&entity.id) {
            if previous.kind != entity.kind {
                for child_id in self.children.get(&entity.id).into_iter().flatten() {
                    if let Some(child) = self.entities.get(child_id) {
                        if child.kind.parent_kind() != Some(entity.kind) {
                            return Err(HierarchyError::TierMismatch {
                                child: child.kind,
                                parent: entity.kind,
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn ensure_acyclic(
        &self,
        entity_id: &EntityId,
        parent_id: &EntityId,
    ) -> Result<(), HierarchyError> {
        let mut cursor = Some(parent_id.clone());
        while let Some(current) = cursor {
            if &current == entity_id {
                return Err(HierarchyError::HierarchyCycle(entity_id.clone()));
            }
            cursor = self
                .entities
                .get(&current)
                .and_then(|entity| entity.parent_id.clone());
        }
        Ok(())
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Children in insertion order; `None` when the id was never registered.
    pub fn children(&self, id: &EntityId) -> Option<Vec<&Entity>> {
        if !self.entities.contains_key(id) {
            return None;
        }
        let resolved = self
            .children
            .get(id)
            .map(|ids| ids.iter().filter_map(|child| self.entities.get(child)).collect())
            .unwrap_or_default();
        Some(resolved)
    }

    pub fn parent(&self, id: &EntityId) -> Option<&Entity> {
        self.entities
            .get(id)?
            .parent_id
            .as_ref()
            .and_then(|parent| self.entities.get(parent))
    }

    pub fn root(&self) -> Option<&Entity> {
        self.root.as_ref().and_then(|id| self.entities.get(id))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Strict ancestor ids, parent first and the national root last.
    pub fn ancestors(&self, id: &EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut cursor = self.entities.get(id).and_then(|entity| entity.parent_id.clone());
        while let Some(current) = cursor {
            cursor = self
                .entities
                .get(&current)
                .and_then(|entity| entity.parent_id.clone());
            chain.push(current);
        }
        chain
    }

    /// Register or replace a representative. Every jurisdiction entry must
    /// already exist in the graph.
    pub fn upsert_representative(
        &mut self,
        representative: Representative,
    ) -> Result<(), HierarchyError> {
        for entity_id in &representative.jurisdiction {
            if !self.entities.contains_key(entity_id) {
                return Err(HierarchyError::UnknownEntity(entity_id.clone()));
            }
        }
        self.representatives
            .insert(representative.id.clone(), representative);
        Ok(())
    }

    pub fn representative(&self, id: &RepresentativeId) -> Option<&Representative> {
        self.representatives.get(id)
    }
}

/// Violations raised by the append-only integrity ledger.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LedgerError {
    #[error("integrity event {0} is already recorded")]
    DuplicateEvent(EventId),
    #[error("superseded event {0} was never recorded")]
    UnknownPredecessor(EventId),
    #[error("superseded event {predecessor} belongs to {actual}, not {expected}")]
    PredecessorEntityMismatch {
        predecessor: EventId,
        expected: EntityId,
        actual: EntityId,
    },
    #[error("severity must be a positive finite number, got {0}")]
    InvalidSeverity(f64),
}

/// Append-only store of integrity events with supersede-style corrections.
#[derive(Debug, Default)]
pub struct EventLedger {
    events: Vec<IntegrityEvent>,
    index: HashMap<EventId, usize>,
    superseded: HashSet<EventId>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: IntegrityEvent) -> Result<(), LedgerError> {
        if !(event.severity.is_finite() && event.severity > 0.0) {
            return Err(LedgerError::InvalidSeverity(event.severity));
        }
        if self.index.contains_key(&event.id) {
            return Err(LedgerError::DuplicateEvent(event.id));
        }
        if let Some(predecessor) = &event.supersedes {
            let position = self
                .index
                .get(predecessor)
                .copied()
                .ok_or_else(|| LedgerError::UnknownPredecessor(predecessor.clone()))?;
            let target = &self.events[position];
            if target.entity_id != event.entity_id {
                return Err(LedgerError::PredecessorEntityMismatch {
                    predecessor: predecessor.clone(),
                    expected: event.entity_id.clone(),
                    actual: target.entity_id.clone(),
                });
            }
        }

        if let Some(predecessor) = event.supersedes.clone() {
            self.superseded.insert(predecessor);
        }
        self.index.insert(event.id.clone(), self.events.len());
        self.events.push(event);
        Ok(())
    }

    /// Events currently counting against the entity, in recorded order.
    /// Superseded records are excluded.
    pub fn active_events(&self, entity_id: &EntityId) -> Vec<&IntegrityEvent> {
        self.events
            .iter()
            .filter(|event| &event.entity_id == entity_id && !self.superseded.contains(&event.id))
            .collect()
    }

    /// Full audit trail for the entity, superseded records included.
    pub fn recorded_events(&self, entity_id: &EntityId) -> Vec<&IntegrityEvent> {
        self.events
            .iter()
            .filter(|event| &event.entity_id == entity_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
