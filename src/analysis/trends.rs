//! Time-bucketed trend series.

use crate::models::{AnalyticsDataPoint, Application, CoeStatus, OfferStatus};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Weeks each month is split into.
pub const WEEKS_PER_MONTH: u64 = 4;

/// Split `value` over the weeks of a month. The remainder goes to week 1,
/// so the parts always sum to `value`.
pub fn split_monthly(value: u64) -> [u64; WEEKS_PER_MONTH as usize] {
    let base = value / WEEKS_PER_MONTH;
    let mut weeks = [base; WEEKS_PER_MONTH as usize];
    weeks[0] += value % WEEKS_PER_MONTH;
    weeks
}

/// Split a monthly collection amount the same way: whole-unit quarters,
/// with the rest (including any fraction) in week 1.
pub fn split_amount(value: Decimal) -> [Decimal; WEEKS_PER_MONTH as usize] {
    let weeks = Decimal::from(WEEKS_PER_MONTH);
    let base = (value / weeks).floor();
    let mut parts = [base; WEEKS_PER_MONTH as usize];
    parts[0] = value - base * Decimal::from(WEEKS_PER_MONTH - 1);
    parts
}

/// Derive a weekly series from a monthly one: four points per month,
/// labelled `"{period}-W{n}"`.
pub fn weekly_breakdown(monthly: &[AnalyticsDataPoint]) -> Vec<AnalyticsDataPoint> {
    let mut weekly = Vec::with_capacity(monthly.len() * WEEKS_PER_MONTH as usize);

    for month in monthly {
        let applications = split_monthly(month.total_applications);
        let offers = split_monthly(month.offers_issued);
        let coes = split_monthly(month.coe_issued);
        let collections = split_amount(month.total_collection);

        for week in 0..WEEKS_PER_MONTH as usize {
            weekly.push(AnalyticsDataPoint {
                period: format!("{}-W{}", month.period, week + 1),
                total_applications: applications[week],
                offers_issued: offers[week],
                coe_issued: coes[week],
                total_collection: collections[week],
            });
        }
    }

    weekly
}

/// Build a monthly series from application creation dates.
///
/// Applications without a creation date are left out. Months are labelled
/// like `"Mar 2024"` and come out in calendar order.
pub fn monthly_series(records: &[Application]) -> Vec<AnalyticsDataPoint> {
    let mut months: BTreeMap<(i32, u32), AnalyticsDataPoint> = BTreeMap::new();

    for record in records {
        let Some(created_at) = record.created_at else {
            continue;
        };
        let key = (created_at.year(), created_at.month());
        let point = months.entry(key).or_insert_with(|| AnalyticsDataPoint {
            period: month_label(key.0, key.1),
            total_applications: 0,
            offers_issued: 0,
            coe_issued: 0,
            total_collection: Decimal::ZERO,
        });

        point.total_applications += 1;
        if record.offer_status == OfferStatus::Issued {
            point.offers_issued += 1;
        }
        if record.coe_status == CoeStatus::Issued {
            point.coe_issued += 1;
        }
        point.total_collection += record.collectable_amount();
    }

    months.into_values().collect()
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}
