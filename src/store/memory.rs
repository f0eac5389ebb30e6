//! In-memory repositories and fixture loading.
//!
//! A [`MemoryRepository`] owns its collection; each instance is
//! independent, so tests can build one per case from seed data.

use super::{apply_draft, matches_all, Entity, Repository, WhereCondition};
use crate::error::{Result, StoreError};
use crate::models::{
    Agent, AnalyticsDataPoint, Application, Campus, Marketer, MarketerPerformance, RecordId,
    Student, User,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

struct Collection<E> {
    records: Vec<E>,
    next_id: u64,
}

/// A collection held in memory behind an async lock.
pub struct MemoryRepository<E> {
    inner: RwLock<Collection<E>>,
    latency: Duration,
}

impl<E: Entity> MemoryRepository<E> {
    /// Create a repository seeded with `records`.
    pub fn new(records: Vec<E>) -> Self {
        let next_id = records.iter().map(|r| r.id().get()).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Collection { records, next_id }),
            latency: Duration::ZERO,
        }
    }

    /// Simulate a round trip delay on every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn not_found(id: RecordId) -> StoreError {
        let err = StoreError::NotFound {
            table: E::TABLE,
            id: id.get(),
        };
        error!("{}", err);
        err
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for MemoryRepository<E> {
    async fn get_all(&self) -> Result<Vec<E>> {
        self.round_trip().await;
        Ok(self.inner.read().await.records.clone())
    }

    async fn get_by_id(&self, id: RecordId) -> Result<E> {
        self.round_trip().await;
        let inner = self.inner.read().await;
        inner
            .records
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, draft: E::Draft) -> Result<E> {
        self.round_trip().await;
        let prepared = E::prepare(draft).map_err(|e| {
            error!("Error creating {}: {}", E::TABLE, e);
            e
        })?;

        let mut inner = self.inner.write().await;
        let id = RecordId::new(inner.next_id)?;

        let mut record = serde_json::to_value(&prepared)?;
        if let Value::Object(map) = &mut record {
            map.insert("Id".to_string(), Value::from(id.get()));
        }
        let entity: E = serde_json::from_value(record)?;

        inner.next_id += 1;
        inner.records.push(entity.clone());
        debug!("Created {} {}", E::TABLE, id);
        Ok(entity)
    }

    async fn update(&self, id: RecordId, draft: E::Draft) -> Result<E> {
        self.round_trip().await;
        let mut inner = self.inner.write().await;
        let slot = inner
            .records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let updated = apply_draft(&*slot, &draft).map_err(|e| {
            error!("Error updating {} {}: {}", E::TABLE, id, e);
            e
        })?;

        *slot = updated.clone();
        debug!("Updated {} {}", E::TABLE, id);
        Ok(updated)
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        self.round_trip().await;
        let mut inner = self.inner.write().await;
        let position = inner
            .records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        inner.records.remove(position);
        debug!("Deleted {} {}", E::TABLE, id);
        Ok(true)
    }

    async fn fetch_where(&self, conditions: &[WhereCondition]) -> Result<Vec<E>> {
        self.round_trip().await;
        let inner = self.inner.read().await;
        let mut matched = Vec::new();
        for record in &inner.records {
            if matches_all(record, conditions)? {
                matched.push(record.clone());
            }
        }
        Ok(matched)
    }
}

/// Seed collections for mock mode, one JSON array per entity.
#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub students: Vec<Student>,
    pub applications: Vec<Application>,
    pub agents: Vec<Agent>,
    pub marketers: Vec<Marketer>,
    pub campuses: Vec<Campus>,
    pub marketer_performance: Vec<MarketerPerformance>,
    pub users: Vec<User>,
    pub analytics: Vec<AnalyticsDataPoint>,
}

impl Fixtures {
    /// Load every fixture file from `dir`. Missing files give empty
    /// collections; unreadable or malformed files are an error.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            warn!("Fixture directory {} not found", dir.display());
            return Ok(Self::default());
        }

        Ok(Self {
            students: load_collection(dir, "students.json")?,
            applications: load_collection(dir, "applications.json")?,
            agents: load_collection(dir, "agents.json")?,
            marketers: load_collection(dir, "marketers.json")?,
            campuses: load_collection(dir, "campuses.json")?,
            marketer_performance: load_collection(dir, "marketer_performance.json")?,
            users: load_collection(dir, "users.json")?,
            analytics: load_collection(dir, "analytics.json")?,
        })
    }
}

fn load_collection<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<Vec<T>> {
    let path = dir.join(file);
    if !path.exists() {
        debug!("No fixture at {}", path.display());
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| StoreError::Fixture(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| StoreError::Fixture(format!("cannot parse {}: {}", path.display(), e)))
}
