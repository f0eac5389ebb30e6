//! Data models for the application pipeline.
//!
//! Records use the record store's canonical field names on the wire
//! (`Id`, `Name`, camelCase status fields) and accept the legacy
//! lowercase / snake_case spellings on input.

pub mod analytics;
pub mod entities;
pub mod status;

pub use analytics::{
    AnalyticsDataPoint, AppliedFilters, DashboardStats, GroupBy, PerformanceSummary,
};
pub use entities::{
    Agent, AgentDraft, Application, ApplicationDraft, Campus, CampusDraft, Location, Marketer,
    MarketerDraft, MarketerPerformance, MarketerPerformanceDraft, Specialization, Student,
    StudentDraft, User, UserDraft, UserRole,
};
pub use status::{CoeStatus, DecisionStatus, OfferStatus};

use crate::error::{Result, StoreError};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a stored record. Always a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Create an id, rejecting zero.
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(StoreError::InvalidArgument(
                "record id must be a positive integer".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Parse an id from user input such as `"12"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let value: i64 = trimmed.parse().map_err(|_| {
            StoreError::InvalidArgument(format!("'{}' is not a valid record id", raw))
        })?;
        if value <= 0 {
            return Err(StoreError::InvalidArgument(format!(
                "'{}' is not a valid record id",
                raw
            )));
        }
        Self::new(value as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Num(i64),
            Text(String),
        }

        let parsed = match RawId::deserialize(deserializer)? {
            RawId::Num(n) if n > 0 => RecordId::new(n as u64),
            RawId::Num(n) => RecordId::parse(&n.to_string()),
            RawId::Text(s) => RecordId::parse(&s),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// Something with an id and a display name.
pub trait Named {
    fn record_id(&self) -> RecordId;
    fn display_name(&self) -> &str;
}

/// Expanded form of a reference as returned by the store: `{Id, Name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    #[serde(rename = "Id", alias = "id")]
    pub id: RecordId,
    #[serde(rename = "Name", alias = "name", default)]
    pub name: String,
}

impl Named for RecordRef {
    fn record_id(&self) -> RecordId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

/// A reference to another record: either a bare id or an expanded object.
///
/// The store returns one or the other depending on the fetch path; both
/// deserialize into this type and are read through the same accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference<T> {
    Unresolved(RecordId),
    Resolved(T),
}

/// The reference shape used on every record.
pub type Ref = Reference<RecordRef>;

impl<T: Named> Reference<T> {
    /// Id of the referenced record, whichever form it arrived in.
    pub fn id(&self) -> RecordId {
        match self {
            Reference::Unresolved(id) => *id,
            Reference::Resolved(target) => target.record_id(),
        }
    }

    /// Display name, if the reference carries one.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Reference::Unresolved(_) => None,
            Reference::Resolved(target) => {
                let name = target.display_name().trim();
                if name.is_empty() {
                    None
                } else {
                    Some(name)
                }
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }
}

impl Ref {
    /// Expand a bare id using a loaded collection. Ids not in the
    /// collection stay unresolved.
    pub fn resolve_against<N: Named>(self, lookup: &[N]) -> Self {
        match self {
            Reference::Unresolved(id) => lookup
                .iter()
                .find(|n| n.record_id() == id)
                .map(|n| {
                    Reference::Resolved(RecordRef {
                        id,
                        name: n.display_name().to_string(),
                    })
                })
                .unwrap_or(Reference::Unresolved(id)),
            resolved => resolved,
        }
    }
}

/// Serde helpers for currency amounts.
///
/// Amounts are exact decimals. The store may hand back integers, floats,
/// numeric strings or null; they are written back as JSON numbers.
pub mod amount {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Int(u64),
        Float(f64),
        Text(String),
    }

    fn convert<E: serde::de::Error>(raw: RawAmount) -> Result<Decimal, E> {
        let value = match raw {
            RawAmount::Int(v) => Decimal::from(v),
            // Shortest round-trip text keeps 0.4 as 0.4 rather than its binary expansion.
            RawAmount::Float(v) if v.is_finite() => Decimal::from_str(&v.to_string())
                .map_err(|_| E::custom(format!("{} is out of range for an amount", v)))?,
            RawAmount::Float(_) => return Err(E::custom("amount must be a finite number")),
            RawAmount::Text(s) if s.trim().is_empty() => Decimal::ZERO,
            RawAmount::Text(s) => Decimal::from_str(s.trim())
                .map_err(|_| E::custom(format!("'{}' is not a valid amount", s)))?,
        };
        if value < Decimal::ZERO {
            return Err(E::custom("amount must be a non-negative number"));
        }
        Ok(value.normalize())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        match Option::<RawAmount>::deserialize(deserializer)? {
            Some(raw) => convert(raw),
            None => Ok(Decimal::ZERO),
        }
    }

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract().is_zero() {
            if let Some(whole) = value.to_u64() {
                return serializer.serialize_u64(whole);
            }
        }
        match value.to_f64() {
            Some(v) => serializer.serialize_f64(v),
            None => Err(S::Error::custom(format!("{} cannot be written as a number", value))),
        }
    }

    /// The same encoding for optional draft fields.
    pub mod option {
        use rust_decimal::Decimal;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Decimal>, D::Error> {
            Option::<super::RawAmount>::deserialize(deserializer)?
                .map(super::convert)
                .transpose()
        }

        pub fn serialize<S: Serializer>(
            value: &Option<Decimal>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}

/// Treat a missing or blank string as absent.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Fail with a validation error if a required text field is absent.
pub(crate) fn require(value: &Option<String>, field: &str, entity: &str) -> Result<()> {
    require_text(value.as_deref().unwrap_or_default(), field, entity)
}

/// Fail with a validation error if a required text field is blank.
pub(crate) fn require_text(value: &str, field: &str, entity: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!(
            "{} requires a non-empty '{}'",
            entity, field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_record_id_parse() {
        assert_eq!(RecordId::parse("12").unwrap().get(), 12);
        assert_eq!(RecordId::parse(" 7 ").unwrap().get(), 7);
        assert!(RecordId::parse("0").is_err());
        assert!(RecordId::parse("-3").is_err());
        assert!(RecordId::parse("abc").is_err());
        assert!(matches!(
            RecordId::parse("1.5"),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_record_id_accepts_numeric_strings() {
        let id: RecordId = serde_json::from_value(json!("9")).unwrap();
        assert_eq!(id.get(), 9);
        assert!(serde_json::from_value::<RecordId>(json!(0)).is_err());
    }

    #[test]
    fn test_reference_both_forms() {
        let bare: Ref = serde_json::from_value(json!(3)).unwrap();
        assert_eq!(bare, Reference::Unresolved(RecordId::new(3).unwrap()));
        assert_eq!(bare.display_name(), None);

        let expanded: Ref = serde_json::from_value(json!({"Id": 3, "Name": "Sunrise"})).unwrap();
        assert_eq!(expanded.id(), RecordId::new(3).unwrap());
        assert_eq!(expanded.display_name(), Some("Sunrise"));
    }

    #[test]
    fn test_reference_blank_name_is_unnamed() {
        let expanded: Ref = serde_json::from_value(json!({"Id": 3, "Name": "  "})).unwrap();
        assert!(expanded.is_resolved());
        assert_eq!(expanded.display_name(), None);
    }

    #[test]
    fn test_resolve_against_lookup() {
        let lookup = vec![RecordRef {
            id: RecordId::new(5).unwrap(),
            name: "Kathmandu".to_string(),
        }];
        let resolved = Reference::Unresolved(RecordId::new(5).unwrap()).resolve_against(&lookup);
        assert_eq!(resolved.display_name(), Some("Kathmandu"));

        let missing = Reference::Unresolved(RecordId::new(6).unwrap()).resolve_against(&lookup);
        assert!(!missing.is_resolved());
    }

    #[test]
    fn test_amount_forms() {
        #[derive(Deserialize, Serialize)]
        struct Row {
            #[serde(default, with = "amount")]
            amount: Decimal,
        }

        let parse = |v: serde_json::Value| serde_json::from_value::<Row>(v).map(|r| r.amount);
        assert_eq!(parse(json!({"amount": 1500})).unwrap(), Decimal::from(1500));
        assert_eq!(parse(json!({"amount": 1500.4})).unwrap(), Decimal::new(15004, 1));
        assert_eq!(parse(json!({"amount": 0.4})).unwrap(), Decimal::new(4, 1));
        assert_eq!(parse(json!({"amount": "2000.25"})).unwrap(), Decimal::new(200025, 2));
        assert_eq!(parse(json!({"amount": null})).unwrap(), Decimal::ZERO);
        assert_eq!(parse(json!({})).unwrap(), Decimal::ZERO);
        assert!(parse(json!({"amount": -5})).is_err());
        assert!(parse(json!({"amount": "-0.5"})).is_err());
    }

    #[test]
    fn test_amount_written_as_number() {
        #[derive(Serialize)]
        struct Row {
            #[serde(with = "amount")]
            amount: Decimal,
        }

        let whole = serde_json::to_value(Row { amount: Decimal::from(1200) }).unwrap();
        assert_eq!(whole, json!({"amount": 1200}));
        let fractional = serde_json::to_value(Row { amount: Decimal::new(15005, 1) }).unwrap();
        assert_eq!(fractional, json!({"amount": 1500.5}));
    }

    #[test]
    fn test_require_blank() {
        assert!(require(&Some("  ".to_string()), "email", "agent").is_err());
        assert!(require(&None, "email", "agent").is_err());
        assert!(require(&Some("a@b.c".to_string()), "email", "agent").is_ok());
    }
}
