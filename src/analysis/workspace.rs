//! Composite loads across collections.
//!
//! Pages that show applications next to their agents, marketers and
//! campuses load every collection at once. The load is all-or-nothing:
//! the first failing repository fails the whole workspace.

use crate::error::Result;
use crate::models::{Agent, Application, Campus, Marketer, Student};
use crate::store::Repositories;
use futures::try_join;
use tracing::debug;

/// Every collection the applications page works with.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub students: Vec<Student>,
    pub applications: Vec<Application>,
    pub agents: Vec<Agent>,
    pub marketers: Vec<Marketer>,
    pub campuses: Vec<Campus>,
}

impl Workspace {
    /// Load all collections concurrently and expand bare references.
    pub async fn load(repos: &Repositories) -> Result<Self> {
        let (students, applications, agents, marketers, campuses) = try_join!(
            repos.students.get_all(),
            repos.applications.get_all(),
            repos.agents.get_all(),
            repos.marketers.get_all(),
            repos.campuses.get_all(),
        )?;

        debug!(
            "Loaded {} students, {} applications, {} agents, {} marketers, {} campuses",
            students.len(),
            applications.len(),
            agents.len(),
            marketers.len(),
            campuses.len()
        );

        let mut workspace = Self {
            students,
            applications,
            agents,
            marketers,
            campuses,
        };
        workspace.resolve_references();
        Ok(workspace)
    }

    /// Expand bare-id references using the loaded collections. References
    /// already carrying a name, or pointing at missing records, are kept.
    pub fn resolve_references(&mut self) {
        let campuses = &self.campuses;
        for student in &mut self.students {
            student.campus = student.campus.take().map(|r| r.resolve_against(campuses));
        }

        for application in &mut self.applications {
            resolve_application(
                application,
                &self.students,
                campuses,
                &self.agents,
                &self.marketers,
            );
        }
    }
}

/// Expand the references of one application.
pub fn resolve_application(
    application: &mut Application,
    students: &[Student],
    campuses: &[Campus],
    agents: &[Agent],
    marketers: &[Marketer],
) {
    application.student = application
        .student
        .take()
        .map(|r| r.resolve_against(students));
    application.campus = application
        .campus
        .take()
        .map(|r| r.resolve_against(campuses));
    application.agent = application.agent.take().map(|r| r.resolve_against(agents));
    application.marketer = application
        .marketer
        .take()
        .map(|r| r.resolve_against(marketers));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{Marketer, RecordId};
    use crate::store::{Fixtures, Repository, WhereCondition};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn fixtures() -> Fixtures {
        Fixtures {
            agents: serde_json::from_value(json!([
                {"Id": 1, "Name": "Global Reach", "email": "g@x.com", "phone": "1"}
            ]))
            .unwrap(),
            campuses: serde_json::from_value(json!([{"Id": 4, "Name": "Sydney"}])).unwrap(),
            students: serde_json::from_value(json!([{"Id": 9, "Name": "Asha", "campus": 4}]))
                .unwrap(),
            applications: serde_json::from_value(json!([
                {"Id": 1, "Name": "Asha", "student": 9, "agent": 1, "campus": 4, "marketer": 77}
            ]))
            .unwrap(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_resolves_bare_references() {
        let repos = Repositories::in_memory(fixtures(), Duration::ZERO);
        let workspace = assert_ok!(Workspace::load(&repos).await);

        let application = &workspace.applications[0];
        let name = |r: &Option<crate::models::Ref>| {
            r.as_ref().and_then(|r| r.display_name()).map(str::to_string)
        };
        assert_eq!(name(&application.agent).as_deref(), Some("Global Reach"));
        assert_eq!(name(&application.campus).as_deref(), Some("Sydney"));
        assert_eq!(name(&application.student).as_deref(), Some("Asha"));
        // Marketer 77 does not exist and stays a bare id.
        assert_eq!(name(&application.marketer), None);
        assert_eq!(
            application.marketer.as_ref().map(|r| r.id().get()),
            Some(77)
        );

        assert_eq!(name(&workspace.students[0].campus).as_deref(), Some("Sydney"));
    }

    #[tokio::test]
    async fn test_load_fails_as_a_whole() {
        let mut repos = Repositories::in_memory(fixtures(), Duration::ZERO);
        repos.marketers = Arc::new(BrokenMarketers);
        let err = assert_err!(Workspace::load(&repos).await);
        assert!(matches!(err, StoreError::Upstream(_)));
    }

    struct BrokenMarketers;

    #[async_trait]
    impl Repository<Marketer> for BrokenMarketers {
        async fn get_all(&self) -> Result<Vec<Marketer>> {
            Err(StoreError::Upstream("table unavailable".to_string()))
        }

        async fn get_by_id(&self, id: RecordId) -> Result<Marketer> {
            Err(StoreError::NotFound {
                table: "marketer",
                id: id.get(),
            })
        }

        async fn create(&self, _draft: crate::models::MarketerDraft) -> Result<Marketer> {
            Err(StoreError::Upstream("table unavailable".to_string()))
        }

        async fn update(
            &self,
            _id: RecordId,
            _draft: crate::models::MarketerDraft,
        ) -> Result<Marketer> {
            Err(StoreError::Upstream("table unavailable".to_string()))
        }

        async fn delete(&self, _id: RecordId) -> Result<bool> {
            Err(StoreError::Upstream("table unavailable".to_string()))
        }

        async fn fetch_where(&self, _conditions: &[WhereCondition]) -> Result<Vec<Marketer>> {
            Err(StoreError::Upstream("table unavailable".to_string()))
        }
    }
}
