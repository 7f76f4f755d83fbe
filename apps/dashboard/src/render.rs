use shared::{
    domain::MonthKey,
    protocol::{ProjectRow, RowSource, ScoreRow},
};

pub fn scores_table(rows: &[ScoreRow]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<12} {:<8} {:>9} {:>9} {:>10} {:>10} {:>9} {:>9}",
        "KAM", "Month", "+PP", "+LVP", "-SOP", "-Volume", "-PP", "Total"
    )];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{:<12} {:<8} {:>9.1} {:>9.1} {:>10.1} {:>10.1} {:>9.1} {:>9.1}",
            row.kam,
            month_label(&row.month),
            row.points_gained_pp,
            row.points_gained_lvp,
            row.points_lost_sop_delay,
            row.points_lost_volume_dec,
            row.points_lost_pp_dec,
            row.total
        )
    }));
    lines
}

pub fn ranking_table(ranking: &[(String, f64)]) -> Vec<String> {
    let mut lines = vec![format!("{:>4} {:<12} {:>12}", "#", "KAM", "Cumulative")];
    lines.extend(
        ranking
            .iter()
            .enumerate()
            .map(|(idx, (kam, total))| format!("{:>4} {:<12} {:>12.1}", idx + 1, kam, total)),
    );
    lines
}

pub fn trend_table(series: &[(MonthKey, f64)]) -> Vec<String> {
    let mut lines = vec![format!("{:<8} {:>10}", "Month", "Total")];
    lines.extend(
        series
            .iter()
            .map(|(month, total)| format!("{:<8} {:>10.1}", month, total)),
    );
    lines
}

pub fn projects_table(rows: &[ProjectRow]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<12} {:<16} {:<8} {:>10} {:>10} {:<8} {:>10} {:>10} {:<6}",
        "KAM", "Project", "Month", "PP", "LVP", "SOP", "FOC PP", "FOC SEC", "Source"
    )];
    lines.extend(rows.iter().map(|row| {
        format!(
            "{:<12} {:<16} {:<8} {:>10.1} {:>10.1} {:<8} {:>10.1} {:>10.1} {:<6}",
            row.kam,
            row.project_code,
            month_label(&row.month),
            row.pp,
            row.lvp,
            row.sop_ym,
            row.foc2026_pp,
            row.foc2026_sec,
            source_label(row.source)
        )
    }));
    lines
}

/// `KAMs: a, b | Months: 2026-01, 2026-02`
pub fn domains_line(kams: &[String], months: &[MonthKey]) -> String {
    let months: Vec<&str> = months.iter().map(MonthKey::as_str).collect();
    format!("KAMs: {} | Months: {}", kams.join(", "), months.join(", "))
}

fn month_label(raw: &str) -> String {
    MonthKey::from_iso_date(raw)
        .map(|key| key.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn source_label(source: Option<RowSource>) -> &'static str {
    match source {
        Some(RowSource::Seed) => "seed",
        Some(RowSource::Manual) => "manual",
        None => "",
    }
}
