use std::{collections::HashMap, sync::Arc};

use shared::domain::FilterSelection;

use crate::derive::{display_rows, MonthlyRecord};

/// Memoized display rows keyed by `(snapshot revision, FilterSelection)`.
///
/// Entries from an older revision are dropped as soon as a newer revision is
/// requested. Results always equal a fresh `display_rows` call.
#[derive(Debug)]
pub struct ViewCache<T> {
    revision: Option<u64>,
    entries: HashMap<FilterSelection, Arc<Vec<T>>>,
    hits: u64,
    misses: u64,
}

impl<T> Default for ViewCache<T> {
    fn default() -> Self {
        Self {
            revision: None,
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T: MonthlyRecord + Clone> ViewCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// `source` is `None` when the backing collection was never fetched.
    pub fn view(&mut self, source: Option<(u64, &[T])>, selection: &FilterSelection) -> Arc<Vec<T>> {
        let Some((revision, rows)) = source else {
            self.clear();
            return Arc::new(Vec::new());
        };

        if self.revision != Some(revision) {
            self.entries.clear();
            self.revision = Some(revision);
        }

        if let Some(cached) = self.entries.get(selection) {
            self.hits += 1;
            return Arc::clone(cached);
        }

        self.misses += 1;
        let computed = Arc::new(display_rows(rows, selection));
        self.entries.insert(selection.clone(), Arc::clone(&computed));
        computed
    }

    pub fn clear(&mut self) {
        self.revision = None;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
