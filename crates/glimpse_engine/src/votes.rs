//! Model vote normalization.
//!
//! The prediction service answers with one raw value per model slot. Slots
//! come from a fixed, versioned schema; the encodings vary (0/1 integers,
//! booleans, marker strings). This module turns them into strict booleans
//! and refuses anything ambiguous instead of guessing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};
use crate::types::ModelVote;

const POSITIVE_MARKERS: &[&str] = &["1", "true", "yes", "positive", "pos"];
const NEGATIVE_MARKERS: &[&str] = &["0", "false", "no", "negative", "neg"];

/// Fixed set of classifier slots for a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    #[serde(default = "default_schema_version")]
    pub version: String,

    #[serde(default = "default_slots")]
    pub slots: Vec<String>,
}

fn default_schema_version() -> String {
    "v1".to_string()
}

fn default_slots() -> Vec<String> {
    // Tabular foundation model, gradient-boosted trees, leaf-wise boosting
    vec!["tabpfn".to_string(), "xgb".to_string(), "lgb".to_string()]
}

impl Default for ModelSchema {
    fn default() -> Self {
        Self {
            version: default_schema_version(),
            slots: default_slots(),
        }
    }
}

impl ModelSchema {
    pub fn new(version: impl Into<String>, slots: &[&str]) -> Self {
        Self {
            version: version.into(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }

    /// Slots must be non-empty and unique
    pub fn validate(&self) -> EngineResult<()> {
        if self.slots.is_empty() {
            return Err(EngineError::Config(format!(
                "model schema {} has no slots",
                self.version
            )));
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if self.slots[..i].contains(slot) {
                return Err(EngineError::Config(format!(
                    "model schema {} lists slot '{}' twice",
                    self.version, slot
                )));
            }
        }
        Ok(())
    }
}

/// A raw per-model response value as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawVote {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<i64> for RawVote {
    fn from(n: i64) -> Self {
        RawVote::Number(n as f64)
    }
}

impl From<bool> for RawVote {
    fn from(b: bool) -> Self {
        RawVote::Flag(b)
    }
}

impl From<&str> for RawVote {
    fn from(s: &str) -> Self {
        RawVote::Text(s.to_string())
    }
}

impl std::fmt::Display for RawVote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawVote::Flag(b) => write!(f, "{}", b),
            RawVote::Number(n) => write!(f, "{}", n),
            RawVote::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Normalize one raw value into a verdict.
///
/// Numbers must be finite integers: 0 is negative, any other integer is
/// positive. Fractional values such as 0.5 are rejected rather than rounded,
/// since the prediction service only ever emits 0 or 1 per model.
pub fn normalize_value(slot: &str, raw: &RawVote) -> EngineResult<bool> {
    let invalid = || EngineError::InvalidVoteEncoding {
        slot: slot.to_string(),
        value: raw.to_string(),
    };

    match raw {
        RawVote::Flag(b) => Ok(*b),
        RawVote::Number(n) => {
            if !n.is_finite() || n.fract() != 0.0 {
                return Err(invalid());
            }
            Ok(*n != 0.0)
        }
        RawVote::Text(s) => {
            let marker = s.trim().to_ascii_lowercase();
            if POSITIVE_MARKERS.contains(&marker.as_str()) {
                Ok(true)
            } else if NEGATIVE_MARKERS.contains(&marker.as_str()) {
                Ok(false)
            } else {
                Err(invalid())
            }
        }
    }
}

/// Normalize a full response. Votes come back in schema slot order, so the
/// map's own iteration order never leaks into records.
pub fn normalize(
    raw: &BTreeMap<String, RawVote>,
    schema: &ModelSchema,
) -> EngineResult<Vec<ModelVote>> {
    let missing: Vec<String> = schema
        .slots
        .iter()
        .filter(|slot| !raw.contains_key(slot.as_str()))
        .cloned()
        .collect();
    let unexpected: Vec<String> = raw
        .keys()
        .filter(|key| !schema.contains(key))
        .cloned()
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() {
        return Err(EngineError::IncompleteVoteSet { missing, unexpected });
    }

    schema
        .slots
        .iter()
        .map(|slot| {
            let verdict = normalize_value(slot, &raw[slot.as_str()])?;
            Ok(ModelVote::new(slot.clone(), verdict))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, RawVote)]) -> BTreeMap<String, RawVote> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_numeric_encodings() {
        assert!(!normalize_value("xgb", &RawVote::from(0)).unwrap());
        assert!(normalize_value("xgb", &RawVote::from(1)).unwrap());
        assert!(normalize_value("xgb", &RawVote::from(-2)).unwrap());
        assert!(normalize_value("xgb", &RawVote::Number(0.5)).is_err());
        assert!(normalize_value("xgb", &RawVote::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_text_encodings() {
        assert!(normalize_value("lgb", &RawVote::from(" Positive ")).unwrap());
        assert!(!normalize_value("lgb", &RawVote::from("no")).unwrap());
        let err = normalize_value("lgb", &RawVote::from("maybe")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidVoteEncoding { ref slot, .. } if slot == "lgb"));
    }

    #[test]
    fn test_normalize_orders_by_schema() {
        let schema = ModelSchema::default();
        let votes = normalize(
            &raw(&[
                ("xgb", RawVote::from(0)),
                ("lgb", RawVote::from(1)),
                ("tabpfn", RawVote::from(true)),
            ]),
            &schema,
        )
        .unwrap();
        let ids: Vec<&str> = votes.iter().map(|v| v.model_id.as_str()).collect();
        assert_eq!(ids, vec!["tabpfn", "xgb", "lgb"]);
        assert_eq!(votes.iter().filter(|v| v.verdict).count(), 2);
    }

    #[test]
    fn test_missing_and_extra_slots() {
        let schema = ModelSchema::default();
        let err = normalize(
            &raw(&[
                ("tabpfn", RawVote::from(1)),
                ("svm", RawVote::from(1)),
                ("xgb", RawVote::from(0)),
            ]),
            &schema,
        )
        .unwrap_err();
        match err {
            EngineError::IncompleteVoteSet { missing, unexpected } => {
                assert_eq!(missing, vec!["lgb".to_string()]);
                assert_eq!(unexpected, vec!["svm".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_schema_validation() {
        assert!(ModelSchema::default().validate().is_ok());
        assert!(ModelSchema::new("v0", &[]).validate().is_err());
        assert!(ModelSchema::new("v2", &["a", "b", "a"]).validate().is_err());
    }

    #[test]
    fn test_raw_vote_deserializes_untagged() {
        let parsed: BTreeMap<String, RawVote> =
            serde_json::from_str(r#"{"tabpfn": 1, "xgb": "negative", "lgb": false}"#).unwrap();
        assert_eq!(parsed["tabpfn"], RawVote::Number(1.0));
        assert_eq!(parsed["xgb"], RawVote::Text("negative".to_string()));
        assert_eq!(parsed["lgb"], RawVote::Flag(false));
    }
}
