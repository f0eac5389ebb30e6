//! Pipeline stage statuses.
//!
//! Each application moves through four independent gates: the university
//! offer, the genuine-student (GS) assessment, the visa decision and the
//! confirmation of enrollment (COE).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of the university offer letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OfferStatus {
    Issued,
    #[default]
    Pending,
    Declined,
}

/// Status of the GS assessment or the visa application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DecisionStatus {
    Approved,
    #[default]
    Pending,
    Declined,
}

/// Status of the confirmation of enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoeStatus {
    Issued,
    #[default]
    Pending,
    #[serde(rename = "Release Required")]
    ReleaseRequired,
}

impl OfferStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OfferStatus::Issued => "Issued",
            OfferStatus::Pending => "Pending",
            OfferStatus::Declined => "Declined",
        }
    }
}

impl DecisionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionStatus::Approved => "Approved",
            DecisionStatus::Pending => "Pending",
            DecisionStatus::Declined => "Declined",
        }
    }
}

impl CoeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CoeStatus::Issued => "Issued",
            CoeStatus::Pending => "Pending",
            CoeStatus::ReleaseRequired => "Release Required",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for CoeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
