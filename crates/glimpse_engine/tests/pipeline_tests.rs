//! End-to-end: service payload -> classification -> JSONL history -> analytics.

use chrono::NaiveDate;
use serde_json::json;
use tempfile::tempdir;

use glimpse_engine::pipeline::{record_prediction, PredictionRequest};
use glimpse_engine::{
    AssessmentType, EngineConfig, EngineError, HistoryQuery, JsonlStore, RecordStore, RiskTier,
    TierPolicy,
};

fn request(
    ty: AssessmentType,
    date: (i32, u32, u32),
    response: serde_json::Value,
) -> PredictionRequest {
    PredictionRequest {
        assessment_type: ty,
        timestamp: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        response,
        confidence: None,
    }
}

#[test]
fn test_vote_sum_pipeline_into_jsonl() {
    let dir = tempdir().unwrap();
    let store = JsonlStore::new(dir.path().join("history.jsonl"));
    let config = EngineConfig::default();

    let recorded = record_prediction(
        &store,
        &config,
        request(
            AssessmentType::Diabetes,
            (2024, 1, 15),
            json!({"tabpfn": 1, "xgb": 0, "lgb": 1}),
        ),
    )
    .unwrap();
    assert_eq!(recorded.classification.tier, RiskTier::Medium);
    assert_eq!(recorded.classification.message, "2/3 models positive");

    record_prediction(
        &store,
        &config,
        request(
            AssessmentType::HeartDisease,
            (2024, 2, 1),
            json!({"tabpfn": 0, "xgb": 0, "lgb": 0}),
        ),
    )
    .unwrap();

    // A bad payload fails alone and leaves the history readable
    let err = record_prediction(
        &store,
        &config,
        request(
            AssessmentType::HeartDisease,
            (2024, 2, 2),
            json!({"tabpfn": 1, "xgb": "maybe", "lgb": 0}),
        ),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::InvalidVoteEncoding { .. }));

    let history = store.load().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(
        history.query(&HistoryQuery::default())[0].assessment_type,
        AssessmentType::HeartDisease
    );

    let snap = history.analytics();
    assert_eq!(snap.count(RiskTier::Medium, AssessmentType::Diabetes), 1);
    assert_eq!(snap.count(RiskTier::Low, AssessmentType::HeartDisease), 1);
    assert_eq!(snap.latest_by_type.diabetes, Some(RiskTier::Medium));
}

#[test]
fn test_upstream_policy_pipeline() {
    let dir = tempdir().unwrap();
    let store = JsonlStore::new(dir.path().join("history.jsonl"));
    let config = EngineConfig {
        policy: TierPolicy::Upstream,
        ..Default::default()
    };

    let recorded = record_prediction(
        &store,
        &config,
        request(AssessmentType::HeartDisease, (2024, 3, 3), json!({"risk_tier": "medium"})),
    )
    .unwrap();
    assert_eq!(recorded.record.risk_tier, RiskTier::Medium);
    assert!(recorded.record.votes.is_empty());
    assert!(recorded.classification.tally.is_none());
    assert!(recorded
        .classification
        .message
        .starts_with("Your heart disease risk appears to be moderate"));

    let err = record_prediction(
        &store,
        &config,
        request(AssessmentType::HeartDisease, (2024, 3, 4), json!("severe")),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::UnrecognizedRiskTier(_)));

    // Tiers pass through verbatim, so case and padding variants are refused
    let err = record_prediction(
        &store,
        &config,
        request(AssessmentType::Diabetes, (2024, 3, 5), json!({"risk_tier": " HIGH "})),
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::UnrecognizedRiskTier(ref s) if s == " HIGH "));
    assert_eq!(store.list().unwrap().len(), 1);
}
