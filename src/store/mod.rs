//! Record store access.
//!
//! Every entity collection is reached through the [`Repository`] trait.
//! Two implementations exist: [`RemoteRepository`] talks to the hosted
//! record store over HTTP, [`MemoryRepository`] keeps the collection in
//! memory (seeded from JSON fixtures). Both speak the same record shape and
//! the same where-clause language.

pub mod client;
pub mod memory;
pub mod remote;

pub use client::StoreClient;
pub use memory::{Fixtures, MemoryRepository};
pub use remote::RemoteRepository;

use crate::config::{Config, DataMode};
use crate::error::Result;
use crate::models::{
    Agent, AnalyticsDataPoint, Application, Campus, Marketer, MarketerPerformance, RecordId,
    Student, User,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A record type stored in one table of the record store.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Caller-supplied fields for create/update.
    type Draft: Clone + Default + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Table name in the record store.
    const TABLE: &'static str;

    fn id(&self) -> RecordId;

    /// Fields requested when fetching.
    fn fields() -> Vec<FieldSelection>;

    /// Check required fields and fill defaults ahead of a create.
    fn prepare(draft: Self::Draft) -> Result<Self::Draft>;

    /// Check the required fields of a whole record, as it stands after an
    /// update is merged in.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Name of a field in a field-selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

/// A requested field; reference fields also request the target's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub field: FieldName,
    #[serde(rename = "referenceField", skip_serializing_if = "Option::is_none")]
    pub reference_field: Option<Box<FieldSelection>>,
}

impl FieldSelection {
    pub fn plain(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_string(),
            },
            reference_field: None,
        }
    }

    /// A reference field expanded to `{Id, Name}`.
    pub fn reference(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_string(),
            },
            reference_field: Some(Box::new(Self::plain("Name"))),
        }
    }

    pub fn plain_list(names: &[&str]) -> Vec<Self> {
        names.iter().map(|n| Self::plain(n)).collect()
    }
}

/// Comparison operator of a where-clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    Contains,
}

/// One where-clause: `field <op> any of values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereCondition {
    #[serde(rename = "FieldName")]
    pub field: String,
    #[serde(rename = "Operator")]
    pub operator: Operator,
    #[serde(rename = "Values")]
    pub values: Vec<String>,
}

impl WhereCondition {
    pub fn equal_to(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::EqualTo,
            values: vec![value.to_string()],
        }
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::Contains,
            values: vec![value.to_string()],
        }
    }

    /// Evaluate against a record in its wire form.
    ///
    /// `EqualTo` is exact string equality; `Contains` is a case-insensitive
    /// substring match. A reference field matches on either its id or its
    /// name.
    pub fn matches(&self, record: &Value) -> bool {
        let candidates = field_texts(record.get(&self.field));
        match self.operator {
            Operator::EqualTo => self
                .values
                .iter()
                .any(|v| candidates.iter().any(|c| c == v)),
            Operator::Contains => self.values.iter().any(|v| {
                let needle = v.to_lowercase();
                candidates.iter().any(|c| c.to_lowercase().contains(&needle))
            }),
        }
    }
}

/// Textual forms a field value can be matched against.
fn field_texts(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(Value::Bool(b)) => vec![b.to_string()],
        Some(Value::Object(map)) => ["Id", "Name"]
            .iter()
            .filter_map(|key| map.get(*key))
            .flat_map(|v| field_texts(Some(v)))
            .collect(),
        Some(Value::Array(items)) => items.iter().flat_map(|v| field_texts(Some(v))).collect(),
    }
}

/// Whether an entity satisfies every condition.
pub fn matches_all<E: Entity>(entity: &E, conditions: &[WhereCondition]) -> Result<bool> {
    if conditions.is_empty() {
        return Ok(true);
    }
    let record = serde_json::to_value(entity)?;
    Ok(conditions.iter().all(|c| c.matches(&record)))
}

/// Overlay the non-null fields of `patch` onto `base`. `Id` is never
/// overwritten.
fn merge_fields(base: &mut Value, patch: Value) {
    if let (Value::Object(target), Value::Object(fields)) = (base, patch) {
        for (key, value) in fields {
            if key == "Id" || value.is_null() {
                continue;
            }
            target.insert(key, value);
        }
    }
}

/// `current` with the supplied fields of `draft` merged in. The result must
/// still pass [`Entity::validate`].
pub fn apply_draft<E: Entity>(current: &E, draft: &E::Draft) -> Result<E> {
    let mut record = serde_json::to_value(current)?;
    merge_fields(&mut record, serde_json::to_value(draft)?);
    let updated: E = serde_json::from_value(record)?;
    updated.validate()?;
    Ok(updated)
}

/// CRUD access to one entity collection.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// The whole collection, in store order.
    async fn get_all(&self) -> Result<Vec<E>>;

    async fn get_by_id(&self, id: RecordId) -> Result<E>;

    /// Create a record; the store assigns the id.
    async fn create(&self, draft: E::Draft) -> Result<E>;

    /// Merge the supplied fields onto an existing record.
    async fn update(&self, id: RecordId, draft: E::Draft) -> Result<E>;

    /// Remove a record. Deleting an id twice fails the second time.
    async fn delete(&self, id: RecordId) -> Result<bool>;

    /// Fetch the records matching every condition.
    async fn fetch_where(&self, conditions: &[WhereCondition]) -> Result<Vec<E>>;
}

/// The full set of repositories the dashboard works with.
#[derive(Clone)]
pub struct Repositories {
    pub students: Arc<dyn Repository<Student>>,
    pub applications: Arc<dyn Repository<Application>>,
    pub agents: Arc<dyn Repository<Agent>>,
    pub marketers: Arc<dyn Repository<Marketer>>,
    pub campuses: Arc<dyn Repository<Campus>>,
    pub marketer_performance: Arc<dyn Repository<MarketerPerformance>>,
    pub users: Arc<dyn Repository<User>>,
}

impl Repositories {
    /// In-memory repositories seeded from fixtures.
    pub fn in_memory(fixtures: Fixtures, latency: Duration) -> Self {
        Self {
            students: Arc::new(MemoryRepository::new(fixtures.students).with_latency(latency)),
            applications: Arc::new(
                MemoryRepository::new(fixtures.applications).with_latency(latency),
            ),
            agents: Arc::new(MemoryRepository::new(fixtures.agents).with_latency(latency)),
            marketers: Arc::new(MemoryRepository::new(fixtures.marketers).with_latency(latency)),
            campuses: Arc::new(MemoryRepository::new(fixtures.campuses).with_latency(latency)),
            marketer_performance: Arc::new(
                MemoryRepository::new(fixtures.marketer_performance).with_latency(latency),
            ),
            users: Arc::new(MemoryRepository::new(fixtures.users).with_latency(latency)),
        }
    }

    /// Remote repositories sharing one client. Users have no table in the
    /// record store and stay in memory.
    pub fn remote(client: StoreClient, users: Vec<User>) -> Self {
        let client = Arc::new(client);
        Self {
            students: Arc::new(RemoteRepository::new(client.clone())),
            applications: Arc::new(RemoteRepository::new(client.clone())),
            agents: Arc::new(RemoteRepository::new(client.clone())),
            marketers: Arc::new(RemoteRepository::new(client.clone())),
            campuses: Arc::new(RemoteRepository::new(client.clone())),
            marketer_performance: Arc::new(RemoteRepository::new(client)),
            users: Arc::new(MemoryRepository::new(users)),
        }
    }

    /// Build repositories for the configured data mode.
    ///
    /// Also returns the monthly trend series from the fixtures; it is only
    /// used in mock mode and is empty otherwise.
    pub fn from_config(config: &Config) -> Result<(Self, Vec<AnalyticsDataPoint>)> {
        let fixtures = Fixtures::load(&config.data.fixtures_dir)?;

        match config.data.mode {
            DataMode::Mock => {
                info!(
                    "Using in-memory store seeded from {}",
                    config.data.fixtures_dir.display()
                );
                let latency = Duration::from_millis(config.data.latency_ms);
                let monthly = fixtures.analytics.clone();
                Ok((Self::in_memory(fixtures, latency), monthly))
            }
            DataMode::Live => {
                let client = StoreClient::new(&config.store)?;
                info!(
                    "Using record store at {} (project {})",
                    config.store.base_url, config.store.project_id
                );
                Ok((Self::remote(client, fixtures.users), Vec::new()))
            }
        }
    }
}
