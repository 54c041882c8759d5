//! History analytics: risk distribution, monthly trend, latest verdicts.
//!
//! Always computed over the complete history; view filters never feed in.
//! Every reduction picks the most recent record by (timestamp, id), so the
//! snapshot does not depend on input order.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{AssessmentType, PredictionRecord, RecordId, RiskTier};

/// Trend value for a type with no record in a month
pub const NO_DATA: u8 = 0;

/// Calendar month bucket. Year is part of the key so January 2023 and
/// January 2024 never merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short axis label, e.g. "Jan 2024"
    pub fn display_label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first = format!("{}-01", s.trim());
        NaiveDate::parse_from_str(&first, "%Y-%m-%d")
            .map(YearMonth::of)
            .map_err(|_| format!("invalid year-month '{}'", s))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Counts for one tier, split by assessment type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub tier: RiskTier,
    pub diabetes: usize,
    pub heart_disease: usize,
}

impl DistributionRow {
    fn empty(tier: RiskTier) -> Self {
        Self {
            tier,
            diabetes: 0,
            heart_disease: 0,
        }
    }

    pub fn count(&self, ty: AssessmentType) -> usize {
        match ty {
            AssessmentType::Diabetes => self.diabetes,
            AssessmentType::HeartDisease => self.heart_disease,
        }
    }

    pub fn total(&self) -> usize {
        self.diabetes + self.heart_disease
    }

    fn bump(&mut self, ty: AssessmentType) {
        match ty {
            AssessmentType::Diabetes => self.diabetes += 1,
            AssessmentType::HeartDisease => self.heart_disease += 1,
        }
    }
}

/// One month on the trend chart. Values are tier ordinals, `NO_DATA` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub month: YearMonth,
    pub diabetes: u8,
    pub heart_disease: u8,
}

impl TrendPoint {
    pub fn value(&self, ty: AssessmentType) -> u8 {
        match ty {
            AssessmentType::Diabetes => self.diabetes,
            AssessmentType::HeartDisease => self.heart_disease,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestByType {
    pub diabetes: Option<RiskTier>,
    pub heart_disease: Option<RiskTier>,
}

impl LatestByType {
    pub fn get(&self, ty: AssessmentType) -> Option<RiskTier> {
        match ty {
            AssessmentType::Diabetes => self.diabetes,
            AssessmentType::HeartDisease => self.heart_disease,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// Always three rows, low/medium/high
    pub risk_distribution: Vec<DistributionRow>,
    /// Ascending by month
    pub monthly_trend: Vec<TrendPoint>,
    pub latest_by_type: LatestByType,
    pub total_records: usize,
    /// Persisted entries left out because they could not be read
    pub excluded_records: usize,
}

impl AnalyticsSnapshot {
    pub fn count(&self, tier: RiskTier, ty: AssessmentType) -> usize {
        self.row(tier).map(|r| r.count(ty)).unwrap_or(0)
    }

    pub fn row(&self, tier: RiskTier) -> Option<&DistributionRow> {
        self.risk_distribution.iter().find(|r| r.tier == tier)
    }

    pub fn distribution_total(&self) -> usize {
        self.risk_distribution.iter().map(|r| r.total()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }
}

/// Ordering key for "most recent": timestamp, then id. The tier rides along
/// only to keep the max total.
type Recency = (NaiveDate, RecordId, RiskTier);

fn recency(record: &PredictionRecord) -> Recency {
    (record.timestamp, record.id, record.risk_tier)
}

fn keep_latest(slot: &mut Option<Recency>, candidate: Recency) {
    match *slot {
        Some(current) if current >= candidate => {}
        _ => *slot = Some(candidate),
    }
}

/// Derive the analytics snapshot from the full history.
pub fn aggregate(records: &[PredictionRecord]) -> AnalyticsSnapshot {
    let mut distribution: Vec<DistributionRow> =
        RiskTier::ALL.iter().map(|t| DistributionRow::empty(*t)).collect();
    let mut latest: BTreeMap<AssessmentType, Option<Recency>> = BTreeMap::new();
    let mut months: BTreeMap<YearMonth, BTreeMap<AssessmentType, Option<Recency>>> =
        BTreeMap::new();

    for record in records {
        if let Some(row) = distribution.iter_mut().find(|r| r.tier == record.risk_tier) {
            row.bump(record.assessment_type);
        }

        let key = recency(record);
        keep_latest(latest.entry(record.assessment_type).or_default(), key);
        keep_latest(
            months
                .entry(YearMonth::of(record.timestamp))
                .or_default()
                .entry(record.assessment_type)
                .or_default(),
            key,
        );
    }

    let tier_of = |slots: &BTreeMap<AssessmentType, Option<Recency>>, ty: AssessmentType| {
        slots.get(&ty).copied().flatten().map(|(_, _, tier)| tier)
    };

    let monthly_trend = months
        .iter()
        .map(|(month, slots)| TrendPoint {
            month: *month,
            diabetes: tier_of(slots, AssessmentType::Diabetes)
                .map(|t| t.ordinal())
                .unwrap_or(NO_DATA),
            heart_disease: tier_of(slots, AssessmentType::HeartDisease)
                .map(|t| t.ordinal())
                .unwrap_or(NO_DATA),
        })
        .collect();

    AnalyticsSnapshot {
        risk_distribution: distribution,
        monthly_trend,
        latest_by_type: LatestByType {
            diabetes: tier_of(&latest, AssessmentType::Diabetes),
            heart_disease: tier_of(&latest, AssessmentType::HeartDisease),
        },
        total_records: records.len(),
        excluded_records: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: u64, ty: AssessmentType, date: &str, tier: RiskTier) -> PredictionRecord {
        PredictionRecord {
            id: RecordId(id),
            assessment_type: ty,
            timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            votes: vec![],
            risk_tier: tier,
            confidence: None,
        }
    }

    #[test]
    fn test_year_month_format() {
        let ym: YearMonth = "2024-03".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2024, month: 3 });
        assert_eq!(ym.to_string(), "2024-03");
        assert_eq!(ym.display_label(), "Mar 2024");
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2024-03\"");
        assert!("2024-13".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_same_month_different_years_stay_apart() {
        let records = vec![
            rec(1, AssessmentType::Diabetes, "2023-01-20", RiskTier::High),
            rec(2, AssessmentType::Diabetes, "2024-01-05", RiskTier::Low),
        ];
        let snap = aggregate(&records);
        assert_eq!(snap.monthly_trend.len(), 2);
        assert_eq!(snap.monthly_trend[0].month.year, 2023);
        assert_eq!(snap.monthly_trend[0].diabetes, 3);
        assert_eq!(snap.monthly_trend[1].diabetes, 1);
    }

    #[test]
    fn test_month_bucket_keeps_most_recent_and_marks_absent() {
        let records = vec![
            rec(1, AssessmentType::Diabetes, "2024-02-01", RiskTier::High),
            rec(2, AssessmentType::Diabetes, "2024-02-20", RiskTier::Medium),
            rec(3, AssessmentType::Diabetes, "2024-02-10", RiskTier::Low),
        ];
        let snap = aggregate(&records);
        assert_eq!(snap.monthly_trend.len(), 1);
        assert_eq!(snap.monthly_trend[0].diabetes, 2);
        assert_eq!(snap.monthly_trend[0].heart_disease, NO_DATA);
    }

    #[test]
    fn test_latest_tie_breaks_on_higher_id() {
        let records = vec![
            rec(9, AssessmentType::HeartDisease, "2024-05-05", RiskTier::High),
            rec(4, AssessmentType::HeartDisease, "2024-05-05", RiskTier::Low),
        ];
        let snap = aggregate(&records);
        assert_eq!(snap.latest_by_type.heart_disease, Some(RiskTier::High));
        assert_eq!(snap.latest_by_type.diabetes, None);
    }
}
