//! Static entity catalogs
//!
//! A catalog maps human-readable entity names to lookup parameters. It is
//! fixed at process start and its declaration order is the order in which a
//! round's readings are appended to the window.

use crate::error::{IngestError, Result};
use crate::models::{Entity, LookupParams};
use std::collections::HashSet;

/// Ordered, immutable set of entities for one domain
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entities: Vec<Entity>,
}

impl Catalog {
    /// Create a catalog, rejecting duplicate names
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(IngestError::DuplicateEntity(entity.name.clone()));
            }
        }
        Ok(Self { entities })
    }

    /// Weather locations tracked by the dashboard
    pub fn locations() -> Self {
        Self {
            entities: vec![
                Entity::location("ELY MN", 47.903237, -91.867087),
                Entity::location("Death Valley CA", 36.5323, -116.93),
                Entity::location("Maryville MO", 40.346102, -94.872471),
            ],
        }
    }

    /// Companies tracked by the dashboard
    pub fn stocks() -> Self {
        Self {
            entities: vec![
                Entity::company("Nordstrom Inc", "JWN"),
                Entity::company("Lululemon Athletica Inc", "LULU"),
                Entity::company("Starbucks Corporation", "SBUX"),
                Entity::company("NIKE Inc", "NKE"),
                Entity::company("Amazon.com Inc", "AMZN"),
            ],
        }
    }

    /// Look up the parameters for an entity
    pub fn lookup(&self, name: &str) -> Result<&LookupParams> {
        self.get(name)
            .map(|e| &e.lookup_params)
            .ok_or_else(|| IngestError::UnknownEntity(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Check every name against the catalog, failing on the first miss
    pub fn validate<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in names {
            self.lookup(name.as_ref())?;
        }
        Ok(())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
