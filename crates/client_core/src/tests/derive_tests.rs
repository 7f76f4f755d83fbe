use super::*;
use shared::{
    domain::Filter,
    protocol::{DatasetRow, RowSource},
};

fn score(kam: &str, month: &str, total: f64) -> ScoreRow {
    ScoreRow {
        kam: kam.into(),
        month: month.into(),
        points_gained_pp: 0.0,
        points_gained_lvp: 0.0,
        points_lost_sop_delay: 0.0,
        points_lost_volume_dec: 0.0,
        points_lost_pp_dec: 0.0,
        total,
    }
}

fn project(kam: &str, code: &str, month: &str) -> DatasetRow {
    DatasetRow {
        kam: kam.into(),
        project_code: code.into(),
        project_name: Some(format!("Proj {code}")),
        month: month.into(),
        pp: 50.0,
        lvp: 20.0,
        sop_ym: "2026-05".into(),
        foc2026_pp: 25.0,
        foc2026_sec: 14.0,
        source: Some(RowSource::Seed),
    }
}

fn sample_dataset() -> Vec<DatasetRow> {
    vec![
        project("Bob", "BO-P2", "2025-10-01"),
        project("Alice", "AL-P1", "2025-09-01"),
        project("Bob", "BO-P1", "2025-10-01"),
        project("Carla", "CA-P1", "2025-09-01"),
        project("Alice", "AL-P3", "2025-10-01"),
        project("Alice", "AL-P1", "2025-11-01"),
        project("Dario", "DA-P1", "bad"),
    ]
}

fn month(raw: &str) -> MonthKey {
    raw.parse().expect("month")
}

fn selections() -> Vec<FilterSelection> {
    let kams = [
        Filter::All,
        Filter::Only("Alice".to_string()),
        Filter::Only("Bob".to_string()),
        Filter::Only("Nobody".to_string()),
        Filter::Only("All".to_string()),
    ];
    let months = [
        Filter::All,
        Filter::Only(month("2025-10")),
        Filter::Only(month("2025-09")),
        Filter::Only(month("2030-01")),
    ];
    kams.iter()
        .flat_map(|kam| {
            months
                .iter()
                .map(move |m| FilterSelection::new(kam.clone(), m.clone()))
        })
        .collect()
}

#[test]
fn filter_output_is_a_subset_satisfying_the_predicate() {
    let rows = sample_dataset();
    for selection in selections() {
        let filtered = filter_rows(&rows, &selection);
        for row in &filtered {
            assert!(rows.contains(row), "{row:?} not from source");
            assert!(selection.kam.matches(row.kam.as_str()));
            if let Filter::Only(expected) = &selection.month {
                assert_eq!(row.month_key().as_ref(), Some(expected));
            }
        }
        let expected_len = rows
            .iter()
            .filter(|row| matches_selection(*row, &selection))
            .count();
        assert_eq!(filtered.len(), expected_len, "selection {selection:?}");
    }
}

#[test]
fn all_all_filter_is_identity() {
    let rows = sample_dataset();
    assert_eq!(filter_rows(&rows, &FilterSelection::default()), rows);
}

#[test]
fn literal_all_kam_does_not_act_as_wildcard() {
    let rows = sample_dataset();
    let selection = FilterSelection::kam("All");
    assert!(filter_rows(&rows, &selection).is_empty());
}

#[test]
fn kam_and_month_predicates_are_conjunctive() {
    let rows = sample_dataset();
    let selection = FilterSelection::new(Filter::Only("Alice".into()), Filter::Only(month("2025-10")));
    let filtered = filter_rows(&rows, &selection);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].project_code, "AL-P3");
}

#[test]
fn malformed_month_matches_only_the_wildcard() {
    let rows = sample_dataset();
    let dario_all = filter_rows(&rows, &FilterSelection::kam("Dario"));
    assert_eq!(dario_all.len(), 1);

    for selection in selections().into_iter().filter(|s| !s.month.is_all()) {
        assert!(filter_rows(&rows, &selection)
            .iter()
            .all(|row| row.kam != "Dario"));
    }
}

#[test]
fn distinct_months_are_sorted_and_unique() {
    let months = distinct_months(&sample_dataset());
    let rendered: Vec<&str> = months.iter().map(MonthKey::as_str).collect();
    assert_eq!(rendered, vec!["2025-09", "2025-10", "2025-11"]);
    let mut deduped = months.clone();
    deduped.dedup();
    assert_eq!(deduped, months);
}

#[test]
fn distinct_kams_keep_first_seen_order() {
    assert_eq!(
        distinct_kams(&sample_dataset()),
        vec!["Bob", "Alice", "Carla", "Dario"]
    );
}

#[test]
fn empty_collections_derive_empty_views() {
    let rows: &[DatasetRow] = &[];
    assert!(distinct_kams(rows).is_empty());
    assert!(distinct_months(rows).is_empty());
    assert!(filter_rows(rows, &FilterSelection::kam("Alice")).is_empty());
    assert!(display_rows(rows, &FilterSelection::default()).is_empty());
}

#[test]
fn derivations_are_repeatable() {
    let rows = sample_dataset();
    let selection = FilterSelection::month(month("2025-10"));
    let first = display_rows(&rows, &selection);
    let second = display_rows(&rows, &selection);
    assert_eq!(first, second);
    assert_eq!(distinct_months(&rows), distinct_months(&rows));
}

#[test]
fn display_rows_sort_by_month_kam_and_project() {
    let ordered: Vec<(String, String)> = display_rows(&sample_dataset(), &FilterSelection::default())
        .into_iter()
        .map(|row| (row.month, row.project_code))
        .collect();
    assert_eq!(
        ordered,
        vec![
            ("2025-09-01".to_string(), "AL-P1".to_string()),
            ("2025-09-01".to_string(), "CA-P1".to_string()),
            ("2025-10-01".to_string(), "AL-P3".to_string()),
            ("2025-10-01".to_string(), "BO-P1".to_string()),
            ("2025-10-01".to_string(), "BO-P2".to_string()),
            ("2025-11-01".to_string(), "AL-P1".to_string()),
            ("bad".to_string(), "DA-P1".to_string()),
        ]
    );
}

#[test]
fn single_alice_score_filters_by_kam() {
    let monthly = vec![ScoreRow {
        kam: "Alice".into(),
        month: "2026-01-01".into(),
        points_gained_pp: 80.0,
        points_gained_lvp: 40.0,
        points_lost_sop_delay: 0.0,
        points_lost_volume_dec: 0.0,
        points_lost_pp_dec: 0.0,
        total: 120.0,
    }];

    let alice = filter_rows(&monthly, &FilterSelection::kam("Alice"));
    assert_eq!(alice, monthly);
    assert!(filter_rows(&monthly, &FilterSelection::kam("Bob")).is_empty());
}

#[test]
fn cumulative_ranking_orders_by_total_then_name() {
    let cumulative: CumulativeMap = [
        ("Carla".to_string(), 40.0),
        ("Alice".to_string(), 120.0),
        ("Bob".to_string(), -60.0),
        ("Dario".to_string(), 40.0),
    ]
    .into_iter()
    .collect();

    let names: Vec<String> = cumulative_ranking(&cumulative)
        .into_iter()
        .map(|(kam, _)| kam)
        .collect();
    assert_eq!(names, vec!["Alice", "Carla", "Dario", "Bob"]);
}

#[test]
fn monthly_totals_uses_reported_totals_in_month_order() {
    let rows = vec![
        score("Alice", "2026-02-01", -100.0),
        score("Bob", "2026-01-01", 30.0),
        score("Alice", "2026-01-01", 120.0),
    ];
    let series = monthly_totals(&rows, "Alice");
    assert_eq!(
        series,
        vec![(month("2026-01"), 120.0), (month("2026-02"), -100.0)]
    );
    assert!(monthly_totals(&rows, "Carla").is_empty());
}
