//! Analytics over the live collections.

use super::aggregator::{
    applications_by_marketer, dashboard_stats, performance_by, performance_with_filters,
};
use super::trends::{monthly_series, weekly_breakdown};
use super::workspace::Workspace;
use crate::error::Result;
use crate::filter::{filter_records, FilterCriteria};
use crate::models::{
    present, AnalyticsDataPoint, AppliedFilters, Application, DashboardStats, GroupBy,
    PerformanceSummary,
};
use crate::store::Repositories;
use tracing::{debug, info};

/// Dashboard and performance numbers computed from the repositories.
#[derive(Clone)]
pub struct AnalyticsService {
    repos: Repositories,
    /// Pre-aggregated monthly series. Empty means derive it from the
    /// applications.
    monthly: Vec<AnalyticsDataPoint>,
}

impl AnalyticsService {
    pub fn new(repos: Repositories, monthly: Vec<AnalyticsDataPoint>) -> Self {
        Self { repos, monthly }
    }

    /// Applications with agent, marketer, campus and student names filled
    /// in, then narrowed by `criteria`. Criteria see the expanded names.
    async fn applications(&self, criteria: Option<&FilterCriteria>) -> Result<Vec<Application>> {
        let workspace = Workspace::load(&self.repos).await?;
        let applications = match criteria {
            Some(criteria) => filter_records(&workspace.applications, criteria)?,
            None => workspace.applications,
        };
        debug!("Loaded {} applications for analytics", applications.len());
        Ok(applications)
    }

    /// Monthly trend series.
    pub async fn monthly_data(&self) -> Result<Vec<AnalyticsDataPoint>> {
        if !self.monthly.is_empty() {
            return Ok(self.monthly.clone());
        }
        let applications = self.repos.applications.get_all().await?;
        Ok(monthly_series(&applications))
    }

    /// Weekly trend series derived from the monthly one.
    pub async fn weekly_data(&self) -> Result<Vec<AnalyticsDataPoint>> {
        let monthly = self.monthly_data().await?;
        Ok(weekly_breakdown(&monthly))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        let applications = self.repos.applications.get_all().await?;
        let stats = dashboard_stats(&applications);
        info!(
            "Dashboard: {} applications, {} offers, {} COEs",
            stats.total_applications, stats.offers_issued, stats.coe_issued
        );
        Ok(stats)
    }

    pub async fn agent_performance(&self) -> Result<Vec<PerformanceSummary>> {
        let applications = self.applications(None).await?;
        Ok(performance_by(&applications, GroupBy::Agent))
    }

    pub async fn marketer_performance(&self) -> Result<Vec<PerformanceSummary>> {
        let applications = self.applications(None).await?;
        Ok(performance_by(&applications, GroupBy::Marketer))
    }

    /// Performance restricted by campus, course and intake. Other keys of
    /// `criteria` are ignored.
    pub async fn performance_by_filters(
        &self,
        group_by: GroupBy,
        criteria: &FilterCriteria,
    ) -> Result<Vec<PerformanceSummary>> {
        let criteria = criteria.restricted_to_enrolment();
        let applications = self.applications(Some(&criteria)).await?;
        let applied = AppliedFilters {
            campus: present(&criteria.campus).map(str::to_string),
            course: present(&criteria.course).map(str::to_string),
            intake: present(&criteria.intake).map(str::to_string),
        };
        Ok(performance_with_filters(&applications, group_by, &applied))
    }

    /// Applications credited to the named marketer.
    pub async fn applications_by_marketer(&self, name: &str) -> Result<Vec<Application>> {
        let applications = self.applications(None).await?;
        Ok(applications_by_marketer(&applications, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::UNKNOWN_MARKETER;
    use crate::models::{ApplicationDraft, RecordId};
    use crate::store::Fixtures;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::assert_ok;

    fn fixtures() -> Fixtures {
        Fixtures {
            agents: serde_json::from_value(json!([
                {"Id": 1, "Name": "A", "email": "a@x.com", "phone": "1"},
                {"Id": 2, "Name": "B", "email": "b@x.com", "phone": "2"}
            ]))
            .unwrap(),
            marketers: serde_json::from_value(json!([
                {"Id": 5, "Name": "Sita", "email": "s@x.com", "phone": "3", "company": "Reach"}
            ]))
            .unwrap(),
            campuses: serde_json::from_value(json!([
                {"Id": 1, "Name": "Sydney"},
                {"Id": 2, "Name": "Melbourne"}
            ]))
            .unwrap(),
            applications: serde_json::from_value(json!([
                {"Id": 1, "Name": "P", "agent": 1, "marketer": 5, "campus": {"Id": 1, "Name": "Sydney"}, "course": "MBA",
                 "offerStatus": "Issued", "amount": 1000, "created_at": "2024-02-01T00:00:00Z"},
                {"Id": 2, "Name": "Q", "agent": 1, "campus": {"Id": 2, "Name": "Melbourne"}, "course": "MBA",
                 "offerStatus": "Pending", "amount": 500, "created_at": "2024-02-11T00:00:00Z"},
                {"Id": 3, "Name": "R", "agent": 2, "marketer": 5, "campus": {"Id": 1, "Name": "Sydney"}, "course": "MIT",
                 "offerStatus": "Issued", "amount": 2000, "created_at": "2024-03-01T00:00:00Z"}
            ]))
            .unwrap(),
            ..Default::default()
        }
    }

    fn service(monthly: Vec<AnalyticsDataPoint>) -> AnalyticsService {
        AnalyticsService::new(Repositories::in_memory(fixtures(), Duration::ZERO), monthly)
    }

    #[tokio::test]
    async fn test_agent_performance_resolves_names() {
        let summaries = assert_ok!(service(Vec::new()).agent_performance().await);
        let a = summaries.iter().find(|s| s.name == "A").unwrap();
        assert_eq!(a.applications, 2);
        assert_eq!(a.conversion_rate, "50.0");
        let b = summaries.iter().find(|s| s.name == "B").unwrap();
        assert_eq!(b.total_amount, Decimal::from(2000));
    }

    #[tokio::test]
    async fn test_dashboard_totals() {
        let stats = assert_ok!(service(Vec::new()).dashboard_stats().await);
        assert_eq!(stats.total_applications, 3);
        assert_eq!(stats.offers_issued, 2);
        assert_eq!(stats.total_collection, Decimal::from(3000));
    }

    #[tokio::test]
    async fn test_marketer_performance_has_fallback() {
        let summaries = assert_ok!(service(Vec::new()).marketer_performance().await);
        let sita = summaries.iter().find(|s| s.name == "Sita").unwrap();
        assert_eq!(sita.applications, 2);
        let unknown = summaries.iter().find(|s| s.name == UNKNOWN_MARKETER).unwrap();
        assert_eq!(unknown.applications, 1);
    }

    #[tokio::test]
    async fn test_performance_by_filters_records_values() {
        let criteria = FilterCriteria {
            campus: Some("Sydney".to_string()),
            offer_status: Some("Pending".to_string()),
            ..Default::default()
        };
        let summaries = assert_ok!(
            service(Vec::new())
                .performance_by_filters(GroupBy::Agent, &criteria)
                .await
        );
        // Only the campus key applies; the offer status key is ignored.
        let total: usize = summaries.iter().map(|s| s.applications).sum();
        assert_eq!(total, 2);
        for summary in &summaries {
            let filters = summary.filters.as_ref().unwrap();
            assert_eq!(filters.campus.as_deref(), Some("Sydney"));
            assert_eq!(filters.course, None);
        }
    }

    #[tokio::test]
    async fn test_performance_without_filters_uses_everything() {
        let summaries = assert_ok!(
            service(Vec::new())
                .performance_by_filters(GroupBy::Marketer, &FilterCriteria::default())
                .await
        );
        let total: usize = summaries.iter().map(|s| s.applications).sum();
        assert_eq!(total, 3);
        assert!(summaries.iter().all(|s| s.filters.is_none()));
    }

    #[tokio::test]
    async fn test_applications_by_marketer() {
        let matched = assert_ok!(service(Vec::new()).applications_by_marketer("Sita").await);
        let ids: Vec<u64> = matched.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_monthly_from_fixture_series() {
        let series = vec![AnalyticsDataPoint {
            period: "Jan 2024".to_string(),
            total_applications: 10,
            offers_issued: 4,
            coe_issued: 2,
            total_collection: Decimal::from(4000),
        }];
        let service = service(series.clone());
        assert_eq!(assert_ok!(service.monthly_data().await), series);

        let weekly = assert_ok!(service.weekly_data().await);
        let applications: Vec<u64> = weekly.iter().map(|w| w.total_applications).collect();
        assert_eq!(applications, vec![4, 2, 2, 2]);
    }

    #[tokio::test]
    async fn test_monthly_derived_from_applications() {
        let series = assert_ok!(service(Vec::new()).monthly_data().await);
        let periods: Vec<&str> = series.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["Feb 2024", "Mar 2024"]);
        assert_eq!(series[0].total_applications, 2);
        assert_eq!(series[1].total_collection, Decimal::from(2000));
    }

    #[tokio::test]
    async fn test_performance_filters_match_bare_references() {
        let bare = Fixtures {
            agents: serde_json::from_value(json!([
                {"Id": 1, "Name": "A", "email": "a@x.com", "phone": "1"}
            ]))
            .unwrap(),
            campuses: serde_json::from_value(json!([{"Id": 1, "Name": "Sydney"}])).unwrap(),
            applications: serde_json::from_value(json!([
                {"Id": 1, "agent": 1, "campus": 1, "offerStatus": "Issued"}
            ]))
            .unwrap(),
            ..Default::default()
        };
        let service =
            AnalyticsService::new(Repositories::in_memory(bare, Duration::ZERO), Vec::new());
        let criteria = FilterCriteria {
            campus: Some("Sydney".to_string()),
            ..Default::default()
        };

        let summaries = assert_ok!(service.performance_by_filters(GroupBy::Agent, &criteria).await);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].name, "A");
        assert_eq!(summaries[0].applications, 1);
        assert_eq!(summaries[0].conversion_rate, "100.0");
    }

    #[tokio::test]
    async fn test_performance_filters_see_created_records() {
        let repos = Repositories::in_memory(fixtures(), Duration::ZERO);
        assert_ok!(
            repos
                .applications
                .create(ApplicationDraft {
                    name: Some("S".to_string()),
                    agent: Some(RecordId::parse("2").unwrap()),
                    campus: Some(RecordId::parse("2").unwrap()),
                    ..Default::default()
                })
                .await
        );
        let service = AnalyticsService::new(repos, Vec::new());
        let criteria = FilterCriteria {
            campus: Some("Melbourne".to_string()),
            ..Default::default()
        };

        let summaries = assert_ok!(service.performance_by_filters(GroupBy::Agent, &criteria).await);
        let mut counts: Vec<(String, usize)> = summaries
            .iter()
            .map(|s| (s.name.clone(), s.applications))
            .collect();
        counts.sort();
        assert_eq!(counts, vec![("A".to_string(), 1), ("B".to_string(), 1)]);
    }
}
