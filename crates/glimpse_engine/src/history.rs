//! Validated history view over what the store returned.
//!
//! Persisted entries that cannot become a PredictionRecord are set aside
//! and counted, never allowed to fail the whole load.

use std::collections::HashSet;
use tracing::warn;

use crate::analytics::{aggregate, AnalyticsSnapshot};
use crate::query::{query, HistoryQuery};
use crate::types::{Malformed, PredictionRecord, StoredRecord};

/// A persisted entry left out of the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedRecord {
    /// Position in store order
    pub position: usize,
    pub id: Option<u64>,
    pub reason: Malformed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    records: Vec<PredictionRecord>,
    excluded: Vec<ExcludedRecord>,
}

impl History {
    pub fn from_records(records: Vec<PredictionRecord>) -> Self {
        Self {
            records,
            excluded: Vec::new(),
        }
    }

    /// Validate stored entries in store order. A repeated id keeps the first
    /// occurrence.
    pub fn from_stored(entries: Vec<StoredRecord>) -> Self {
        let mut records = Vec::with_capacity(entries.len());
        let mut excluded = Vec::new();
        let mut seen = HashSet::new();

        for (position, entry) in entries.into_iter().enumerate() {
            let id = entry.id;
            let result = entry.validate().and_then(|record| {
                if seen.insert(record.id) {
                    Ok(record)
                } else {
                    Err(Malformed::DuplicateId(record.id.0))
                }
            });
            match result {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!("Excluding stored record at position {}: {}", position, reason);
                    excluded.push(ExcludedRecord {
                        position,
                        id,
                        reason,
                    });
                }
            }
        }

        Self { records, excluded }
    }

    pub fn records(&self) -> &[PredictionRecord] {
        &self.records
    }

    pub fn excluded(&self) -> &[ExcludedRecord] {
        &self.excluded
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn query(&self, q: &HistoryQuery) -> Vec<PredictionRecord> {
        query(&self.records, q)
    }

    /// Analytics over every valid record, with the exclusion count attached.
    pub fn analytics(&self) -> AnalyticsSnapshot {
        let mut snapshot = aggregate(&self.records);
        snapshot.excluded_records = self.excluded.len();
        snapshot
    }
}

/// History as the presentation layer holds it. An empty `Loaded` history is
/// not the same thing as `NotLoaded`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HistoryView {
    #[default]
    NotLoaded,
    Loaded(History),
}

impl HistoryView {
    pub fn is_loaded(&self) -> bool {
        matches!(self, HistoryView::Loaded(_))
    }

    pub fn history(&self) -> Option<&History> {
        match self {
            HistoryView::Loaded(history) => Some(history),
            HistoryView::NotLoaded => None,
        }
    }

    /// `None` until loaded; `Some(vec![])` when nothing matches
    pub fn query(&self, q: &HistoryQuery) -> Option<Vec<PredictionRecord>> {
        self.history().map(|h| h.query(q))
    }

    pub fn analytics(&self) -> Option<AnalyticsSnapshot> {
        self.history().map(History::analytics)
    }
}
