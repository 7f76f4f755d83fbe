//! Last-fetched snapshots of the four record collections.

use std::sync::Arc;

use shared::protocol::{
    CumulativeMap, DatasetRow, InputRow, KamSummary, ScoreRow, ScoresResponse, StateResponse,
};

/// Immutable collection snapshot. `revision` is unique across the whole store
/// and identifies the snapshot for view caching.
#[derive(Debug)]
pub struct Snapshot<T> {
    revision: u64,
    data: Arc<T>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            revision: self.revision,
            data: Arc::clone(&self.data),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn data(&self) -> &T {
        &self.data
    }
}

/// Each slot is `None` until its first successful fetch and is only ever
/// replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    last_revision: u64,
    state: Option<Snapshot<StateResponse>>,
    scores: Option<Snapshot<ScoresResponse>>,
    dataset: Option<Snapshot<Vec<DatasetRow>>>,
    inputs: Option<Snapshot<Vec<InputRow>>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp<T>(&mut self, data: T) -> Snapshot<T> {
        self.last_revision += 1;
        Snapshot {
            revision: self.last_revision,
            data: Arc::new(data),
        }
    }

    pub fn replace_state(&mut self, state: StateResponse) -> u64 {
        let snapshot = self.stamp(state);
        let revision = snapshot.revision;
        self.state = Some(snapshot);
        revision
    }

    pub fn replace_scores(&mut self, scores: ScoresResponse) -> u64 {
        let snapshot = self.stamp(scores);
        let revision = snapshot.revision;
        self.scores = Some(snapshot);
        revision
    }

    pub fn replace_dataset(&mut self, rows: Vec<DatasetRow>) -> u64 {
        let snapshot = self.stamp(rows);
        let revision = snapshot.revision;
        self.dataset = Some(snapshot);
        revision
    }

    pub fn replace_inputs(&mut self, rows: Vec<InputRow>) -> u64 {
        let snapshot = self.stamp(rows);
        let revision = snapshot.revision;
        self.inputs = Some(snapshot);
        revision
    }

    pub fn state(&self) -> Option<&Snapshot<StateResponse>> {
        self.state.as_ref()
    }

    pub fn scores(&self) -> Option<&Snapshot<ScoresResponse>> {
        self.scores.as_ref()
    }

    pub fn dataset(&self) -> Option<&Snapshot<Vec<DatasetRow>>> {
        self.dataset.as_ref()
    }

    pub fn inputs(&self) -> Option<&Snapshot<Vec<InputRow>>> {
        self.inputs.as_ref()
    }

    pub fn kams(&self) -> &[KamSummary] {
        self.state.as_ref().map_or(&[], |s| s.data().kams.as_slice())
    }

    pub fn score_rows(&self) -> &[ScoreRow] {
        self.scores
            .as_ref()
            .map_or(&[], |s| s.data().monthly.as_slice())
    }

    pub fn cumulative(&self) -> Option<&CumulativeMap> {
        self.scores.as_ref().map(|s| &s.data().cumulative_by_kam)
    }

    pub fn dataset_rows(&self) -> &[DatasetRow] {
        self.dataset.as_ref().map_or(&[], |s| s.data().as_slice())
    }

    pub fn input_rows(&self) -> &[InputRow] {
        self.inputs.as_ref().map_or(&[], |s| s.data().as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kam: &str, month: &str) -> DatasetRow {
        DatasetRow {
            kam: kam.into(),
            project_code: "AL-P1".into(),
            project_name: None,
            month: month.into(),
            pp: 10.0,
            lvp: 5.0,
            sop_ym: "2026-04".into(),
            foc2026_pp: 4.0,
            foc2026_sec: 2.0,
            source: None,
        }
    }

    #[test]
    fn absent_collections_read_as_empty() {
        let store = RecordStore::new();
        assert!(store.scores().is_none());
        assert!(store.score_rows().is_empty());
        assert!(store.dataset_rows().is_empty());
        assert!(store.input_rows().is_empty());
        assert!(store.kams().is_empty());
        assert!(store.cumulative().is_none());
    }

    #[test]
    fn replacement_is_wholesale_and_bumps_revision() {
        let mut store = RecordStore::new();
        let first = store.replace_dataset(vec![row("Alice", "2026-01-01"), row("Bob", "2026-01-01")]);
        let held = store.dataset().cloned().expect("snapshot");

        let second = store.replace_dataset(vec![row("Carla", "2026-02-01")]);
        assert!(second > first);
        assert_eq!(store.dataset_rows().len(), 1);
        assert_eq!(store.dataset_rows()[0].kam, "Carla");

        // Readers holding the old snapshot keep seeing it intact.
        assert_eq!(held.revision(), first);
        assert_eq!(held.data().len(), 2);
    }

    #[test]
    fn revisions_are_unique_across_slots() {
        let mut store = RecordStore::new();
        let a = store.replace_inputs(Vec::new());
        let b = store.replace_dataset(Vec::new());
        let c = store.replace_scores(ScoresResponse::default());
        assert!(a < b && b < c);
    }
}
