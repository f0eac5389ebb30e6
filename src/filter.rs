//! Application table filtering.
//!
//! A [`FilterCriteria`] is a flat set of optional constraints. It is turned
//! into where-clauses evaluated against applications whose references have
//! already been expanded, so a campus or agent name matches whether the
//! stored record holds a bare id or an `{Id, Name}` object.

use crate::analysis::Workspace;
use crate::error::Result;
use crate::models::{present, Application};
use crate::store::{matches_all, Repositories, WhereCondition};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Filter keys accepted by the applications table.
///
/// Blank values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub campus: Option<String>,
    pub course: Option<String>,
    pub agent: Option<String>,
    pub intake: Option<String>,
    pub location: Option<String>,
    /// Case-insensitive substring over the applicant name.
    pub search: Option<String>,
    #[serde(alias = "offerStatus")]
    pub offer_status: Option<String>,
    #[serde(alias = "gsStatus")]
    pub gs_status: Option<String>,
    #[serde(alias = "coeStatus")]
    pub coe_status: Option<String>,
    #[serde(alias = "visaStatus")]
    pub visa_status: Option<String>,
    pub marketer: Option<String>,
}

impl FilterCriteria {
    /// Keep only the campus/course/intake keys.
    pub fn restricted_to_enrolment(&self) -> Self {
        Self {
            campus: self.campus.clone(),
            course: self.course.clone(),
            intake: self.intake.clone(),
            ..Default::default()
        }
    }

    /// `(record field, value, exact)` for every supplied key. Blank values
    /// are skipped; the rest are matched exactly as given.
    fn constraints(&self) -> Vec<(&'static str, &str, bool)> {
        let keys: [(&'static str, &Option<String>, bool); 11] = [
            ("campus", &self.campus, true),
            ("course", &self.course, true),
            ("agent", &self.agent, true),
            ("intake", &self.intake, true),
            ("location", &self.location, true),
            ("Name", &self.search, false),
            ("offerStatus", &self.offer_status, true),
            ("gsStatus", &self.gs_status, true),
            ("coeStatus", &self.coe_status, true),
            ("visaStatus", &self.visa_status, true),
            ("marketer", &self.marketer, true),
        ];

        keys.into_iter()
            .filter_map(|(field, value, exact)| {
                present(value)?;
                value.as_deref().map(|v| (field, v, exact))
            })
            .collect()
    }

    /// True when no key constrains anything.
    pub fn is_empty(&self) -> bool {
        self.constraints().is_empty()
    }

    /// Where-clauses equivalent to these criteria, ANDed.
    pub fn to_conditions(&self) -> Vec<WhereCondition> {
        self.constraints()
            .into_iter()
            .map(|(field, value, exact)| {
                if exact {
                    WhereCondition::equal_to(field, value)
                } else {
                    WhereCondition::contains(field, value)
                }
            })
            .collect()
    }
}

/// Filter already-loaded applications.
///
/// Empty criteria return the input unchanged.
pub fn filter_records(records: &[Application], criteria: &FilterCriteria) -> Result<Vec<Application>> {
    let conditions = criteria.to_conditions();
    if conditions.is_empty() {
        return Ok(records.to_vec());
    }

    let mut matched = Vec::new();
    for record in records {
        if matches_all(record, &conditions)? {
            matched.push(record.clone());
        }
    }
    Ok(matched)
}

/// Runs criteria against a freshly loaded set of applications.
#[derive(Clone)]
pub struct FilterEngine {
    repos: Repositories,
}

impl FilterEngine {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Load the applications, expand their references and keep the
    /// matching ones.
    ///
    /// Returns `Ok(None)` without touching the store when the criteria are
    /// empty. Repository errors are returned unchanged.
    pub async fn apply(&self, criteria: &FilterCriteria) -> Result<Option<Vec<Application>>> {
        if criteria.is_empty() {
            debug!("No filter constraints, skipping query");
            return Ok(None);
        }

        let workspace = Workspace::load(&self.repos).await?;
        let rows = filter_records(&workspace.applications, criteria)?;
        debug!(
            "Filter matched {} of {} application(s)",
            rows.len(),
            workspace.applications.len()
        );
        Ok(Some(rows))
    }
}

/// What happened to the table when filters were applied.
#[derive(Debug)]
pub enum FilterOutcome {
    /// Rows were replaced by the filtered result.
    Applied(usize),
    /// Criteria were empty; rows are untouched.
    Unchanged,
    /// Filtering failed; the previous rows are still shown.
    Retained(crate::error::StoreError),
}

/// Rows currently shown in the applications table.
#[derive(Debug, Clone, Default)]
pub struct TableState {
    rows: Vec<Application>,
}

impl TableState {
    pub fn new(rows: Vec<Application>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Application] {
        &self.rows
    }

    /// Apply criteria through the engine. A failure keeps the previous
    /// rows and is reported as a warning rather than an error.
    pub async fn apply_filters(
        &mut self,
        engine: &FilterEngine,
        criteria: &FilterCriteria,
    ) -> FilterOutcome {
        match engine.apply(criteria).await {
            Ok(Some(rows)) => {
                let count = rows.len();
                self.rows = rows;
                FilterOutcome::Applied(count)
            }
            Ok(None) => FilterOutcome::Unchanged,
            Err(e) => {
                warn!("Failed to apply filters, keeping previous results: {}", e);
                FilterOutcome::Retained(e)
            }
        }
    }
}
