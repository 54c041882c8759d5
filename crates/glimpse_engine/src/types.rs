//! Core record types shared by every engine component.
//!
//! Enum ordering is pinned: sorting by assessment type or risk tier uses the
//! declaration order below, never insertion order. Serialized forms are the
//! stable snake_case strings, independent of display language.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Date format used for screening dates on the wire.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Which screener a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Diabetes,
    HeartDisease,
}

impl AssessmentType {
    pub const ALL: [AssessmentType; 2] = [AssessmentType::Diabetes, AssessmentType::HeartDisease];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Diabetes => "diabetes",
            AssessmentType::HeartDisease => "heart_disease",
        }
    }

    /// Human label shown in the history table
    pub fn label(&self) -> &'static str {
        match self {
            AssessmentType::Diabetes => "Diabetes",
            AssessmentType::HeartDisease => "Heart Disease",
        }
    }
}

impl fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diabetes" => Ok(AssessmentType::Diabetes),
            "heart_disease" | "heart" => Ok(AssessmentType::HeartDisease),
            other => Err(format!("unknown assessment type '{}'", other)),
        }
    }
}

/// Tiered risk label. Ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }

    /// Chart encoding. Zero is reserved for "no data".
    pub fn ordinal(&self) -> u8 {
        match self {
            RiskTier::Low => 1,
            RiskTier::Medium => 2,
            RiskTier::High => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Average Risk",
            RiskTier::High => "High Risk",
        }
    }

    /// Chart color (hex)
    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Low => "#22c55e",
            RiskTier::Medium => "#f59e0b",
            RiskTier::High => "#ef4444",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exact wire strings only; whitespace and case variants are rejected.
impl FromStr for RiskTier {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            _ => Err(EngineError::UnrecognizedRiskTier(s.to_string())),
        }
    }
}

/// Store-assigned record id. Later appends get higher ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classifier's normalized verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVote {
    pub model_id: String,
    pub verdict: bool,
}

impl ModelVote {
    pub fn new(model_id: impl Into<String>, verdict: bool) -> Self {
        Self {
            model_id: model_id.into(),
            verdict,
        }
    }
}

/// One completed screening event. Never mutated after the store hands it out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: RecordId,
    pub assessment_type: AssessmentType,
    /// Date the screening was performed (may be backdated)
    pub timestamp: NaiveDate,
    /// Empty when the upstream service only returned a tier
    pub votes: Vec<ModelVote>,
    pub risk_tier: RiskTier,
    /// Confidence percentage shown next to the result, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

impl PredictionRecord {
    pub fn positive_votes(&self) -> usize {
        self.votes.iter().filter(|v| v.verdict).count()
    }
}

/// A record about to be appended; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub assessment_type: AssessmentType,
    pub timestamp: NaiveDate,
    pub votes: Vec<ModelVote>,
    pub risk_tier: RiskTier,
    pub confidence: Option<u8>,
}

impl NewRecord {
    pub fn into_record(self, id: RecordId) -> PredictionRecord {
        PredictionRecord {
            id,
            assessment_type: self.assessment_type,
            timestamp: self.timestamp,
            votes: self.votes,
            risk_tier: self.risk_tier,
            confidence: self.confidence,
        }
    }
}

/// Why a persisted record could not be turned into a PredictionRecord
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Malformed {
    MissingField(&'static str),
    UnknownAssessmentType(String),
    UnknownRiskTier(String),
    BadTimestamp(String),
    ConfidenceOutOfRange(u32),
    DuplicateVote(String),
    DuplicateId(u64),
}

impl fmt::Display for Malformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Malformed::MissingField(field) => write!(f, "missing field '{}'", field),
            Malformed::UnknownAssessmentType(s) => write!(f, "unknown assessment type '{}'", s),
            Malformed::UnknownRiskTier(s) => write!(f, "unknown risk tier '{}'", s),
            Malformed::BadTimestamp(s) => write!(f, "bad timestamp '{}'", s),
            Malformed::ConfidenceOutOfRange(c) => write!(f, "confidence {} out of range", c),
            Malformed::DuplicateVote(m) => write!(f, "duplicate vote for model '{}'", m),
            Malformed::DuplicateId(id) => write!(f, "id {} already used by an earlier record", id),
        }
    }
}

/// Loose shape of a record as persisted. Every field is optional so one bad
/// entry never fails a whole history load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub assessment_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub votes: Option<Vec<ModelVote>>,
    #[serde(default)]
    pub risk_tier: Option<String>,
    #[serde(default)]
    pub confidence: Option<u32>,
}

impl StoredRecord {
    pub fn validate(self) -> Result<PredictionRecord, Malformed> {
        let id = self.id.ok_or(Malformed::MissingField("id"))?;

        let raw_type = self
            .assessment_type
            .ok_or(Malformed::MissingField("assessment_type"))?;
        let assessment_type = raw_type
            .parse::<AssessmentType>()
            .map_err(|_| Malformed::UnknownAssessmentType(raw_type.clone()))?;

        let raw_ts = self.timestamp.ok_or(Malformed::MissingField("timestamp"))?;
        let timestamp = NaiveDate::parse_from_str(raw_ts.trim(), DATE_FORMAT)
            .map_err(|_| Malformed::BadTimestamp(raw_ts.clone()))?;

        let raw_tier = self.risk_tier.ok_or(Malformed::MissingField("risk_tier"))?;
        let risk_tier = raw_tier
            .parse::<RiskTier>()
            .map_err(|_| Malformed::UnknownRiskTier(raw_tier.clone()))?;

        let votes = self.votes.unwrap_or_default();
        let mut seen = HashSet::new();
        for vote in &votes {
            if !seen.insert(vote.model_id.as_str()) {
                return Err(Malformed::DuplicateVote(vote.model_id.clone()));
            }
        }

        let confidence = match self.confidence {
            Some(c) if c > 100 => return Err(Malformed::ConfidenceOutOfRange(c)),
            Some(c) => Some(c as u8),
            None => None,
        };

        Ok(PredictionRecord {
            id: RecordId(id),
            assessment_type,
            timestamp,
            votes,
            risk_tier,
            confidence,
        })
    }
}

impl From<&PredictionRecord> for StoredRecord {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            id: Some(record.id.0),
            assessment_type: Some(record.assessment_type.as_str().to_string()),
            timestamp: Some(record.timestamp.format(DATE_FORMAT).to_string()),
            votes: Some(record.votes.clone()),
            risk_tier: Some(record.risk_tier.as_str().to_string()),
            confidence: record.confidence.map(u32::from),
        }
    }
}
