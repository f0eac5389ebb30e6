//! Performance aggregation over applications.
//!
//! This module groups applications by agent or marketer and computes the
//! dashboard headline numbers.

use crate::models::{
    AppliedFilters, Application, CoeStatus, DashboardStats, GroupBy, OfferStatus,
    PerformanceSummary, Ref,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Bucket for applications with no resolvable agent.
pub const UNKNOWN_AGENT: &str = "Unknown Agent";

/// Bucket for applications with no resolvable marketer.
pub const UNKNOWN_MARKETER: &str = "Unknown Marketer";

/// Offers as a percentage of applications, rounded half-up to one decimal.
///
/// Returns `"0.0"` when there are no applications. The ratio is rounded
/// in integers, so an exact tie such as 23/80 (28.75%) gives `"28.8"`.
/// Rounding the `f64` percentage instead gives `"28.7"` there, because
/// the float lands on 28.749999...
pub fn conversion_rate(offers: usize, applications: usize) -> String {
    if applications == 0 {
        return "0.0".to_string();
    }
    let offers = offers as u128;
    let applications = applications as u128;
    let tenths = (offers * 2000 + applications) / (2 * applications);
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Display name of the bucket an application falls into.
pub fn bucket_name(record: &Application, group_by: GroupBy) -> &str {
    let (reference, fallback): (&Option<Ref>, &str) = match group_by {
        GroupBy::Agent => (&record.agent, UNKNOWN_AGENT),
        GroupBy::Marketer => (&record.marketer, UNKNOWN_MARKETER),
    };
    reference
        .as_ref()
        .and_then(|r| r.display_name())
        .unwrap_or(fallback)
}

#[derive(Default)]
struct Tally {
    applications: usize,
    offers_issued: usize,
    coe_issued: usize,
    total_amount: Decimal,
}

impl Tally {
    fn add(&mut self, record: &Application) {
        self.applications += 1;
        if record.offer_status == OfferStatus::Issued {
            self.offers_issued += 1;
        }
        if record.coe_status == CoeStatus::Issued {
            self.coe_issued += 1;
        }
        self.total_amount += record.collectable_amount();
    }
}

/// Group applications into performance buckets.
///
/// Buckets come out in the order their first application was seen.
pub fn performance_by(records: &[Application], group_by: GroupBy) -> Vec<PerformanceSummary> {
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, Tally> = HashMap::new();

    for record in records {
        let name = bucket_name(record, group_by);
        if !tallies.contains_key(name) {
            order.push(name.to_string());
        }
        tallies.entry(name.to_string()).or_default().add(record);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let tally = tallies.remove(&name)?;
            Some(PerformanceSummary {
                group_by,
                conversion_rate: conversion_rate(tally.offers_issued, tally.applications),
                name,
                applications: tally.applications,
                offers_issued: tally.offers_issued,
                coe_issued: tally.coe_issued,
                total_amount: tally.total_amount,
                filters: None,
            })
        })
        .collect()
}

/// Same as [`performance_by`], recording the filter values on each bucket.
pub fn performance_with_filters(
    records: &[Application],
    group_by: GroupBy,
    filters: &AppliedFilters,
) -> Vec<PerformanceSummary> {
    let mut summaries = performance_by(records, group_by);
    if !filters.is_empty() {
        for summary in &mut summaries {
            summary.filters = Some(filters.clone());
        }
    }
    summaries
}

/// Headline numbers over the whole collection.
pub fn dashboard_stats(records: &[Application]) -> DashboardStats {
    let mut tally = Tally::default();
    for record in records {
        tally.add(record);
    }

    DashboardStats {
        total_applications: tally.applications,
        offers_issued: tally.offers_issued,
        coe_issued: tally.coe_issued,
        total_collection: tally.total_amount,
    }
}

/// Applications whose marketer resolves to `name`.
pub fn applications_by_marketer(records: &[Application], name: &str) -> Vec<Application> {
    records
        .iter()
        .filter(|r| bucket_name(r, GroupBy::Marketer) == name)
        .cloned()
        .collect()
}

/// Sort buckets for display: most applications first, then by name.
pub fn sort_for_display(summaries: &mut [PerformanceSummary]) {
    summaries.sort_by(|a, b| {
        b.applications
            .cmp(&a.applications)
            .then_with(|| a.name.cmp(&b.name))
    });
}
