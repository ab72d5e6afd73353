//! Per-session entity index.
//!
//! Each client sees the world through its own runtime entity ids, so the same
//! player has a different runtime id in every session. The index maps the
//! server-side (java) entity id to what this session's client knows it as.
//! It belongs to the session's context and is never shared.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Entity id assigned by the downstream server; identical across sessions.
pub type JavaEntityId = i32;

/// Entity id this session's client uses on the wire.
pub type RuntimeEntityId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub java_id: JavaEntityId,
    pub runtime_id: RuntimeEntityId,
    pub kind: EntityKind,
}

impl Entity {
    pub fn player(java_id: JavaEntityId, runtime_id: RuntimeEntityId) -> Self {
        Self {
            java_id,
            runtime_id,
            kind: EntityKind::Player,
        }
    }

    pub fn other(java_id: JavaEntityId, runtime_id: RuntimeEntityId) -> Self {
        Self {
            java_id,
            runtime_id,
            kind: EntityKind::Other,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player
    }
}

#[derive(Debug, Default)]
pub struct EntityIndex {
    by_java_id: HashMap<JavaEntityId, Entity>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, returning the one it replaced.
    pub fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.by_java_id.insert(entity.java_id, entity)
    }

    pub fn remove(&mut self, java_id: JavaEntityId) -> Option<Entity> {
        self.by_java_id.remove(&java_id)
    }

    pub fn get_by_java_id(&self, java_id: JavaEntityId) -> Option<&Entity> {
        self.by_java_id.get(&java_id)
    }

    pub fn len(&self) -> usize {
        self.by_java_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_java_id.is_empty()
    }
}
