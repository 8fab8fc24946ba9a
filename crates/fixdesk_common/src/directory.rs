//! Actor directory: identity and role resolution.
//!
//! The workflow engine re-resolves the acting id on every call, so a
//! caller can never claim a role its directory entry does not carry.

use crate::actor::{Actor, Role};
use crate::division::Division;
use crate::error::DeskError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Identity, role, and division lookup
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Resolve an actor by id; `NotFound` if absent
    async fn resolve(&self, id: &str) -> Result<Actor, DeskError>;

    /// Every actor carrying the given role
    async fn find_by_role(&self, role: Role) -> Result<Vec<Actor>, DeskError>;

    /// Every actor carrying the given role within a division
    async fn find_by_role_and_division(
        &self,
        role: Role,
        division: Division,
    ) -> Result<Vec<Actor>, DeskError>;

    /// Register a new actor; `Conflict` if the id is taken
    async fn add(&self, actor: &Actor) -> Result<(), DeskError>;

    /// Every registered actor
    async fn list(&self) -> Result<Vec<Actor>, DeskError>;
}

/// In-memory directory for tests
pub struct MemoryDirectory {
    actors: Arc<Mutex<HashMap<String, Actor>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            actors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A directory pre-seeded with the given actors
    pub fn with_actors(actors: impl IntoIterator<Item = Actor>) -> Self {
        let directory = Self::new();
        {
            let mut map = directory.actors.lock().unwrap();
            for actor in actors {
                map.insert(actor.id.clone(), actor);
            }
        }
        directory
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActorDirectory for MemoryDirectory {
    async fn resolve(&self, id: &str) -> Result<Actor, DeskError> {
        self.actors
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| DeskError::NotFound(format!("actor {}", id)))
    }

    async fn find_by_role(&self, role: Role) -> Result<Vec<Actor>, DeskError> {
        let mut actors: Vec<Actor> = self
            .actors
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.role == role)
            .cloned()
            .collect();
        actors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(actors)
    }

    async fn find_by_role_and_division(
        &self,
        role: Role,
        division: Division,
    ) -> Result<Vec<Actor>, DeskError> {
        let mut actors: Vec<Actor> = self
            .actors
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.role == role && a.division == Some(division))
            .cloned()
            .collect();
        actors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(actors)
    }

    async fn add(&self, actor: &Actor) -> Result<(), DeskError> {
        let mut actors = self.actors.lock().unwrap();
        if actors.contains_key(&actor.id) {
            return Err(DeskError::Conflict(format!("actor {} already exists", actor.id)));
        }
        actors.insert(actor.id.clone(), actor.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Actor>, DeskError> {
        let mut actors: Vec<Actor> = self.actors.lock().unwrap().values().cloned().collect();
        actors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(actors)
    }
}
