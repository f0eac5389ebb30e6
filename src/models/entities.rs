//! Stored entities and their drafts.
//!
//! A draft carries the caller-supplied fields for `create` and `update`.
//! Every draft field is optional; `Entity::prepare` checks the required
//! ones and fills defaults before a create.

use super::{amount, present, require, require_text, Named, RecordId, Ref};
use super::{CoeStatus, DecisionStatus, OfferStatus};
use crate::error::{Result, StoreError};
use crate::store::{Entity, FieldSelection};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

/// Where the applicant is applying from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Onshore,
    Offshore,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Onshore => write!(f, "Onshore"),
            Location::Offshore => write!(f, "Offshore"),
        }
    }
}

/// Marketing channel a marketer works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "Digital Marketing")]
    DigitalMarketing,
    #[serde(rename = "Content Marketing")]
    ContentMarketing,
    #[serde(rename = "Social Media")]
    SocialMedia,
    #[serde(rename = "SEO & Analytics")]
    SeoAnalytics,
    #[serde(rename = "Email Marketing")]
    EmailMarketing,
    #[default]
    #[serde(rename = "General Marketing")]
    GeneralMarketing,
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Specialization::DigitalMarketing => "Digital Marketing",
            Specialization::ContentMarketing => "Content Marketing",
            Specialization::SocialMedia => "Social Media",
            Specialization::SeoAnalytics => "SEO & Analytics",
            Specialization::EmailMarketing => "Email Marketing",
            Specialization::GeneralMarketing => "General Marketing",
        };
        f.write_str(label)
    }
}

/// Role of a dashboard user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An agent who books students.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl Entity for Agent {
    type Draft = AgentDraft;
    const TABLE: &'static str = "agent";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        FieldSelection::plain_list(&["Name", "email", "phone", "active"])
    }

    fn prepare(mut draft: AgentDraft) -> Result<AgentDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        require(&draft.email, "email", Self::TABLE)?;
        require(&draft.phone, "phone", Self::TABLE)?;
        draft.active.get_or_insert(true);
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)?;
        require_text(&self.email, "email", Self::TABLE)?;
        require_text(&self.phone, "phone", Self::TABLE)
    }
}

impl Named for Agent {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Marketer
// ---------------------------------------------------------------------------

/// A marketer who drives lead generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketer {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub specialization: Specialization,
    /// Qualitative label such as "Good" or "Excellent".
    #[serde(default)]
    pub performance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketerDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<Specialization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<String>,
}

impl Entity for Marketer {
    type Draft = MarketerDraft;
    const TABLE: &'static str = "marketer";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        FieldSelection::plain_list(&[
            "Name",
            "email",
            "phone",
            "company",
            "active",
            "specialization",
            "performance",
        ])
    }

    fn prepare(mut draft: MarketerDraft) -> Result<MarketerDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        require(&draft.email, "email", Self::TABLE)?;
        require(&draft.phone, "phone", Self::TABLE)?;
        require(&draft.company, "company", Self::TABLE)?;
        draft.active.get_or_insert(true);
        draft.specialization.get_or_insert(Specialization::GeneralMarketing);
        if present(&draft.performance).is_none() {
            draft.performance = Some("Good".to_string());
        }
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)?;
        require_text(&self.email, "email", Self::TABLE)?;
        require_text(&self.phone, "phone", Self::TABLE)?;
        require_text(&self.company, "company", Self::TABLE)
    }
}

impl Named for Marketer {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Campus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampusDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Entity for Campus {
    type Draft = CampusDraft;
    const TABLE: &'static str = "campus";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        FieldSelection::plain_list(&["Name", "location"])
    }

    fn prepare(draft: CampusDraft) -> Result<CampusDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)
    }
}

impl Named for Campus {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Student
// ---------------------------------------------------------------------------

/// A student profile. Pipeline statuses live on [`Application`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub intake: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<Ref>,
    #[serde(alias = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(alias = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(alias = "campusId", skip_serializing_if = "Option::is_none")]
    pub campus: Option<RecordId>,
}

impl Entity for Student {
    type Draft = StudentDraft;
    const TABLE: &'static str = "student";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        let mut fields = FieldSelection::plain_list(&[
            "Name",
            "course",
            "intake",
            "location",
            "created_at",
            "updated_at",
        ]);
        fields.push(FieldSelection::reference("campus"));
        fields
    }

    fn prepare(draft: StudentDraft) -> Result<StudentDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)
    }
}

impl Named for Student {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// One application moving through the offer / GS / visa / COE pipeline.
///
/// Course, intake and location are copied from the student so the
/// application table can be filtered without a join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student: Option<Ref>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus: Option<Ref>,
    #[serde(alias = "agent_name", default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Ref>,
    #[serde(alias = "marketer_name", default, skip_serializing_if = "Option::is_none")]
    pub marketer: Option<Ref>,
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub intake: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(rename = "offerStatus", alias = "offer_status", default)]
    pub offer_status: OfferStatus,
    #[serde(rename = "gsStatus", alias = "gs_status", default)]
    pub gs_status: DecisionStatus,
    #[serde(rename = "visaStatus", alias = "visa_status", default)]
    pub visa_status: DecisionStatus,
    #[serde(rename = "coeStatus", alias = "coe_status", default)]
    pub coe_status: CoeStatus,
    #[serde(default, with = "amount")]
    pub amount: Decimal,
    #[serde(default)]
    pub remarks: String,
    #[serde(alias = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Amount counted towards collections (only once the offer is issued).
    pub fn collectable_amount(&self) -> Decimal {
        if self.offer_status == OfferStatus::Issued {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "studentId", skip_serializing_if = "Option::is_none")]
    pub student: Option<RecordId>,
    #[serde(alias = "campusId", skip_serializing_if = "Option::is_none")]
    pub campus: Option<RecordId>,
    #[serde(
        alias = "agent_name",
        alias = "agentId",
        skip_serializing_if = "Option::is_none"
    )]
    pub agent: Option<RecordId>,
    #[serde(
        alias = "marketer_name",
        alias = "marketerId",
        skip_serializing_if = "Option::is_none"
    )]
    pub marketer: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(
        rename = "offerStatus",
        alias = "offer_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub offer_status: Option<OfferStatus>,
    #[serde(
        rename = "gsStatus",
        alias = "gs_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub gs_status: Option<DecisionStatus>,
    #[serde(
        rename = "visaStatus",
        alias = "visa_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub visa_status: Option<DecisionStatus>,
    #[serde(
        rename = "coeStatus",
        alias = "coe_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub coe_status: Option<CoeStatus>,
    #[serde(with = "amount::option", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl Entity for Application {
    type Draft = ApplicationDraft;
    const TABLE: &'static str = "application";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        let mut fields = FieldSelection::plain_list(&[
            "Name",
            "course",
            "intake",
            "location",
            "offerStatus",
            "gsStatus",
            "visaStatus",
            "coeStatus",
            "amount",
            "remarks",
            "created_at",
        ]);
        for reference in ["student", "campus", "agent", "marketer"] {
            fields.push(FieldSelection::reference(reference));
        }
        fields
    }

    fn prepare(mut draft: ApplicationDraft) -> Result<ApplicationDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        draft.offer_status.get_or_insert_with(OfferStatus::default);
        draft.gs_status.get_or_insert_with(DecisionStatus::default);
        draft.visa_status.get_or_insert_with(DecisionStatus::default);
        draft.coe_status.get_or_insert_with(CoeStatus::default);
        draft.amount.get_or_insert(Decimal::ZERO);
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)
    }
}

// ---------------------------------------------------------------------------
// MarketerPerformance
// ---------------------------------------------------------------------------

/// Roll-up counters for a marketer, maintained outside this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketerPerformance {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketer: Option<Ref>,
    #[serde(rename = "totalOffers", alias = "total_offers", default)]
    pub total_offers: u64,
    #[serde(rename = "totalCoes", alias = "total_coes", default)]
    pub total_coes: u64,
    #[serde(
        rename = "totalCollections",
        alias = "total_collections",
        default,
        with = "amount"
    )]
    pub total_collections: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketerPerformanceDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "marketerId", skip_serializing_if = "Option::is_none")]
    pub marketer: Option<RecordId>,
    #[serde(
        rename = "totalOffers",
        alias = "total_offers",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_offers: Option<u64>,
    #[serde(
        rename = "totalCoes",
        alias = "total_coes",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_coes: Option<u64>,
    #[serde(
        rename = "totalCollections",
        alias = "total_collections",
        with = "amount::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_collections: Option<Decimal>,
}

impl Entity for MarketerPerformance {
    type Draft = MarketerPerformanceDraft;
    const TABLE: &'static str = "marketer_performance";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        let mut fields =
            FieldSelection::plain_list(&["Name", "totalOffers", "totalCoes", "totalCollections"]);
        fields.push(FieldSelection::reference("marketer"));
        fields
    }

    fn prepare(mut draft: MarketerPerformanceDraft) -> Result<MarketerPerformanceDraft> {
        if draft.marketer.is_none() {
            return Err(StoreError::Validation(format!(
                "{} requires a 'marketer'",
                Self::TABLE
            )));
        }
        draft.total_offers.get_or_insert(0);
        draft.total_coes.get_or_insert(0);
        draft.total_collections.get_or_insert(Decimal::ZERO);
        Ok(draft)
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A dashboard user. Credentials are held by the authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "Id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(rename = "createdAt", alias = "created_at", default)]
    pub created_at: Option<NaiveDate>,
    #[serde(rename = "lastLogin", alias = "last_login", default)]
    pub last_login: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDraft {
    #[serde(rename = "Name", alias = "name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(
        rename = "createdAt",
        alias = "created_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<NaiveDate>,
}

impl Entity for User {
    type Draft = UserDraft;
    const TABLE: &'static str = "user";

    fn id(&self) -> RecordId {
        self.id
    }

    fn fields() -> Vec<FieldSelection> {
        FieldSelection::plain_list(&["Name", "email", "role", "active", "createdAt", "lastLogin"])
    }

    fn prepare(mut draft: UserDraft) -> Result<UserDraft> {
        require(&draft.name, "name", Self::TABLE)?;
        require(&draft.email, "email", Self::TABLE)?;
        if draft.role.is_none() {
            return Err(StoreError::Validation(format!(
                "{} requires a 'role'",
                Self::TABLE
            )));
        }
        draft.active.get_or_insert(true);
        draft
            .created_at
            .get_or_insert_with(|| Utc::now().date_naive());
        Ok(draft)
    }

    fn validate(&self) -> Result<()> {
        require_text(&self.name, "name", Self::TABLE)?;
        require_text(&self.email, "email", Self::TABLE)
    }
}
