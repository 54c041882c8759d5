//! From a prediction-service response to a stored record.
//!
//! normalize -> classify -> append. Any classification failure returns
//! before the store is touched.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::store::RecordStore;
use crate::tier::{classify_for, Classification, ClassifierInput, TierPolicy};
use crate::types::{AssessmentType, NewRecord, PredictionRecord};
use crate::votes::{normalize, ModelSchema, RawVote};

/// Keys accepted for a tier carried inside an object response
const TIER_KEYS: &[&str] = &["risk_tier", "risk", "tier"];

/// One screening submitted for classification
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub assessment_type: AssessmentType,
    /// Screening date as entered by the user
    pub timestamp: NaiveDate,
    /// Raw prediction service payload
    pub response: Value,
    pub confidence: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedPrediction {
    pub record: PredictionRecord,
    pub classification: Classification,
}

fn raw_votes(response: &Value) -> EngineResult<BTreeMap<String, RawVote>> {
    let object = response.as_object().ok_or_else(|| {
        EngineError::UnexpectedResponse(format!("expected per-model votes, got {}", response))
    })?;

    object
        .iter()
        .map(|(slot, value)| {
            serde_json::from_value::<RawVote>(value.clone())
                .map(|raw| (slot.clone(), raw))
                .map_err(|_| EngineError::InvalidVoteEncoding {
                    slot: slot.clone(),
                    value: value.to_string(),
                })
        })
        .collect()
}

fn upstream_tier(response: &Value) -> EngineResult<String> {
    if let Some(tier) = response.as_str() {
        return Ok(tier.to_string());
    }
    if let Some(object) = response.as_object() {
        for key in TIER_KEYS {
            if let Some(tier) = object.get(*key).and_then(Value::as_str) {
                return Ok(tier.to_string());
            }
        }
    }
    Err(EngineError::UnexpectedResponse(format!(
        "expected a risk tier, got {}",
        response
    )))
}

/// Read a service payload according to the configured policy.
pub fn interpret(
    response: &Value,
    policy: TierPolicy,
    schema: &ModelSchema,
) -> EngineResult<ClassifierInput> {
    match policy {
        TierPolicy::VoteSum => {
            let votes = normalize(&raw_votes(response)?, schema)?;
            Ok(ClassifierInput::VoteBased(votes))
        }
        TierPolicy::Upstream => Ok(ClassifierInput::TierBased(upstream_tier(response)?)),
    }
}

/// Classify one response without storing anything.
pub fn evaluate(
    response: &Value,
    assessment_type: AssessmentType,
    config: &EngineConfig,
) -> EngineResult<(ClassifierInput, Classification)> {
    let input = interpret(response, config.policy, &config.schema)?;
    let classification = classify_for(&input, Some(assessment_type))?;
    Ok((input, classification))
}

/// Classify and append. The store is only written on success.
pub fn record_prediction<S: RecordStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    request: PredictionRequest,
) -> EngineResult<RecordedPrediction> {
    let evaluated = evaluate(&request.response, request.assessment_type, config);
    let (input, classification) = match evaluated {
        Ok(result) => result,
        Err(e) => {
            warn!(
                "Classification failed for {} screening on {}: {}",
                request.assessment_type, request.timestamp, e
            );
            return Err(e);
        }
    };

    let votes = match input {
        ClassifierInput::VoteBased(votes) => votes,
        ClassifierInput::TierBased(_) => Vec::new(),
    };

    let record = store.append(NewRecord {
        assessment_type: request.assessment_type,
        timestamp: request.timestamp,
        votes,
        risk_tier: classification.tier,
        confidence: request.confidence,
    })?;

    info!(
        "{} screening {} classified {}: {}",
        record.assessment_type, record.id, record.risk_tier, classification.message
    );

    Ok(RecordedPrediction {
        record,
        classification,
    })
}
