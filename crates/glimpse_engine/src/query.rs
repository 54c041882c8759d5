//! History filtering and sorting.
//!
//! Sorting is stable: records equal under the sort key keep their input
//! order in both directions, so toggling direction twice gives back the
//! same sequence.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use crate::types::{AssessmentType, PredictionRecord, RiskTier};

/// `all` or one specific value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter<T> {
    All,
    Only(T),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Filter::All
    }
}

impl<T: PartialEq> Filter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Filter::All => true,
            Filter::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Filter<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Filter::All)
        } else {
            s.parse().map(Filter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Timestamp,
    AssessmentType,
    RiskTier,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" | "date" => Ok(SortField::Timestamp),
            "assessment_type" | "type" => Ok(SortField::AssessmentType),
            "risk_tier" | "risk" => Ok(SortField::RiskTier),
            other => Err(format!("unknown sort field '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Ephemeral view settings for the history table. Defaults to everything,
/// newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub type_filter: Filter<AssessmentType>,
    #[serde(default)]
    pub risk_filter: Filter<RiskTier>,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

impl HistoryQuery {
    pub fn retains(&self, record: &PredictionRecord) -> bool {
        self.type_filter.matches(&record.assessment_type)
            && self.risk_filter.matches(&record.risk_tier)
    }

    fn compare(&self, a: &PredictionRecord, b: &PredictionRecord) -> Ordering {
        let ordering = match self.sort_field {
            SortField::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortField::AssessmentType => a.assessment_type.cmp(&b.assessment_type),
            SortField::RiskTier => a.risk_tier.cmp(&b.risk_tier),
        };
        match self.sort_direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Filter and sort `records` without touching the input slice.
pub fn query(records: &[PredictionRecord], q: &HistoryQuery) -> Vec<PredictionRecord> {
    let mut out: Vec<PredictionRecord> = records.iter().filter(|r| q.retains(r)).cloned().collect();
    // sort_by is stable; reversing the ordering keeps ties in input order
    out.sort_by(|a, b| q.compare(a, b));
    out
}
