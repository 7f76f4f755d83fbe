use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-KAM running total as returned by the scoring service.
pub type CumulativeMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub kam: String,
    pub month: String,
    pub points_gained_pp: f64,
    pub points_gained_lvp: f64,
    pub points_lost_sop_delay: f64,
    pub points_lost_volume_dec: f64,
    pub points_lost_pp_dec: f64,
    /// Authoritative; never re-derived from the component fields.
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoresResponse {
    pub monthly: Vec<ScoreRow>,
    pub cumulative_by_kam: CumulativeMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSource {
    Seed,
    Manual,
}

/// One project-month record. Dataset rows carry `source`; input rows do not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub kam: String,
    pub project_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub month: String,
    pub pp: f64,
    pub lvp: f64,
    pub sop_ym: String,
    pub foc2026_pp: f64,
    pub foc2026_sec: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RowSource>,
}

pub type DatasetRow = ProjectRow;
pub type InputRow = ProjectRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsResponse<T> {
    pub rows: Vec<T>,
    pub count: usize,
}

impl<T> Default for RowsResponse<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KamSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    pub kams: Vec<KamSummary>,
    #[serde(default)]
    pub months: Vec<String>,
}

impl StateResponse {
    pub fn kam_names(&self) -> Vec<String> {
        self.kams.iter().map(|kam| kam.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRequest {
    pub start_month: NaiveDate,
    pub months: u32,
    pub kam_names: Vec<String>,
    pub regions: Vec<String>,
    pub random_seed: u64,
}

impl Default for SeedRequest {
    fn default() -> Self {
        Self {
            start_month: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap_or_default(),
            months: 4,
            kam_names: ["Alice", "Bob", "Carla", "Dario"]
                .into_iter()
                .map(String::from)
                .collect(),
            regions: ["China Consumer", "China Industry", "JP", "TW"]
                .into_iter()
                .map(String::from)
                .collect(),
            random_seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMonthRequest {
    pub kam_name: String,
    pub month: NaiveDate,
    pub new_projects: u32,
    pub added_pp: f64,
    pub added_lvp: f64,
    pub avg_sop_month: u32,
    pub foc_ratio_pp: f64,
    pub foc_ratio_lvp: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputMonthResponse {
    pub status: String,
    pub kam: String,
    pub month: String,
    pub projects_created: u32,
    pub added_pp: f64,
    pub added_lvp: f64,
}

/// Server-generated CSV downloads. Bodies are opaque to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    MonthlyScores,
    CumulativeScores,
    Dataset,
    Inputs,
}

impl ExportKind {
    pub const ALL: [ExportKind; 4] = [
        ExportKind::MonthlyScores,
        ExportKind::CumulativeScores,
        ExportKind::Dataset,
        ExportKind::Inputs,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Self::MonthlyScores => "/scores_csv",
            Self::CumulativeScores => "/scores_cumulative_csv",
            Self::Dataset => "/dataset_csv",
            Self::Inputs => "/inputs_csv",
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            Self::MonthlyScores => "monthly_scores.csv",
            Self::CumulativeScores => "cumulative_scores.csv",
            Self::Dataset => "dataset_all_rows.csv",
            Self::Inputs => "inputs_manual_rows.csv",
        }
    }
}
