//! Pure view derivations over record snapshots.
//!
//! Every function here is deterministic in its inputs so callers may memoize
//! results keyed by snapshot revision and filter selection.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashSet},
};

use shared::{
    domain::{FilterSelection, MonthKey},
    protocol::{CumulativeMap, ProjectRow, ScoreRow},
};

/// A record attributed to one KAM for one calendar month.
pub trait MonthlyRecord {
    fn kam(&self) -> &str;
    fn month(&self) -> &str;

    /// Secondary display ordering within a (month, kam) group.
    fn tiebreak(&self) -> &str {
        ""
    }

    fn month_key(&self) -> Option<MonthKey> {
        MonthKey::from_iso_date(self.month()).ok()
    }
}

impl MonthlyRecord for ScoreRow {
    fn kam(&self) -> &str {
        &self.kam
    }

    fn month(&self) -> &str {
        &self.month
    }
}

impl MonthlyRecord for ProjectRow {
    fn kam(&self) -> &str {
        &self.kam
    }

    fn month(&self) -> &str {
        &self.month
    }

    fn tiebreak(&self) -> &str {
        &self.project_code
    }
}

/// Unique KAM names in first-seen order.
pub fn distinct_kams<R: MonthlyRecord>(rows: &[R]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kams = Vec::new();
    for row in rows {
        let kam = row.kam();
        if seen.insert(kam) {
            kams.push(kam.to_string());
        }
    }
    kams
}

/// Unique calendar months, ascending. Rows with a malformed month are skipped.
pub fn distinct_months<R: MonthlyRecord>(rows: &[R]) -> Vec<MonthKey> {
    rows.iter()
        .filter_map(MonthlyRecord::month_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn matches_selection<R: MonthlyRecord>(row: &R, selection: &FilterSelection) -> bool {
    if !selection.kam.matches(row.kam()) {
        return false;
    }
    if selection.month.is_all() {
        return true;
    }
    // A malformed month never equals a concrete month filter.
    row.month_key()
        .is_some_and(|month| selection.month.matches(&month))
}

/// Conjunctive KAM/month filter preserving input order.
pub fn filter_rows<R: MonthlyRecord + Clone>(rows: &[R], selection: &FilterSelection) -> Vec<R> {
    rows.iter()
        .filter(|row| matches_selection(*row, selection))
        .cloned()
        .collect()
}

/// Stable sort by month, then KAM, then the record's tiebreak key.
pub fn sort_for_display<R: MonthlyRecord>(rows: &mut [R]) {
    rows.sort_by(|a, b| {
        a.month()
            .cmp(b.month())
            .then_with(|| a.kam().cmp(b.kam()))
            .then_with(|| a.tiebreak().cmp(b.tiebreak()))
    });
}

/// Filtered and display-ordered rows for a table.
pub fn display_rows<R: MonthlyRecord + Clone>(rows: &[R], selection: &FilterSelection) -> Vec<R> {
    let mut filtered = filter_rows(rows, selection);
    sort_for_display(&mut filtered);
    filtered
}

/// Leaderboard order: highest cumulative total first, ties by name.
pub fn cumulative_ranking(cumulative: &CumulativeMap) -> Vec<(String, f64)> {
    let mut ranking: Vec<(String, f64)> = cumulative
        .iter()
        .map(|(kam, total)| (kam.clone(), *total))
        .collect();
    ranking.sort_by(|(a_kam, a_total), (b_kam, b_total)| {
        match b_total.total_cmp(a_total) {
            Ordering::Equal => a_kam.cmp(b_kam),
            other => other,
        }
    });
    ranking
}

/// Month-by-month `total` series for one KAM, as reported by the service.
pub fn monthly_totals(rows: &[ScoreRow], kam: &str) -> Vec<(MonthKey, f64)> {
    let mut series: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.kam == kam) {
        if let Some(month) = row.month_key() {
            *series.entry(month).or_default() += row.total;
        }
    }
    series.into_iter().collect()
}

#[cfg(test)]
#[path = "tests/derive_tests.rs"]
mod tests;
