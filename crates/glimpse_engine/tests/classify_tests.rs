//! Tests for vote normalization and tier classification.

use std::collections::BTreeMap;

use glimpse_engine::tier::vote_sum_tier;
use glimpse_engine::{
    classify, normalize, ClassifierInput, EngineError, ModelSchema, ModelVote, RawVote, RiskTier,
};

fn vote_input(bits: &[bool]) -> ClassifierInput {
    ClassifierInput::VoteBased(
        bits.iter()
            .enumerate()
            .map(|(i, b)| ModelVote::new(format!("model_{i}"), *b))
            .collect(),
    )
}

/// Every boolean vector of length n
fn all_vote_sets(n: usize) -> Vec<Vec<bool>> {
    (0..(1u32 << n))
        .map(|mask| (0..n).map(|i| mask & (1 << i) != 0).collect())
        .collect()
}

#[test]
fn test_all_negative_is_low_all_positive_is_high() {
    for n in 1..=5 {
        assert_eq!(classify(&vote_input(&vec![false; n])).unwrap().tier, RiskTier::Low);
        assert_eq!(classify(&vote_input(&vec![true; n])).unwrap().tier, RiskTier::High);
    }
}

#[test]
fn test_partial_agreement_is_medium_with_tally_message() {
    for n in 2..=5 {
        for set in all_vote_sets(n) {
            let v = set.iter().filter(|b| **b).count();
            if v == 0 || v == n {
                continue;
            }
            let result = classify(&vote_input(&set)).unwrap();
            assert_eq!(result.tier, RiskTier::Medium, "{set:?}");
            assert_eq!(result.message, format!("{v}/{n} models positive"));
        }
    }
}

#[test]
fn test_vote_order_does_not_matter() {
    let base = [true, false, true, false, false];
    let mut rotated = base;
    for _ in 0..base.len() {
        rotated.rotate_left(1);
        let mut reversed = rotated;
        reversed.reverse();
        let expected = classify(&vote_input(&base)).unwrap().tier;
        assert_eq!(classify(&vote_input(&rotated)).unwrap().tier, expected);
        assert_eq!(classify(&vote_input(&reversed)).unwrap().tier, expected);
    }
}

#[test]
fn test_three_model_scenarios() {
    let schema = ModelSchema::default();
    let cases = [
        ([1, 0, 1], RiskTier::Medium, Some("2/3 models positive")),
        ([0, 0, 0], RiskTier::Low, None),
        ([1, 1, 1], RiskTier::High, None),
    ];

    for (bits, tier, message) in cases {
        let raw: BTreeMap<String, RawVote> = schema
            .slots
            .iter()
            .zip(bits)
            .map(|(slot, b)| (slot.clone(), RawVote::from(b as i64)))
            .collect();
        let votes = normalize(&raw, &schema).unwrap();
        let result = classify(&ClassifierInput::VoteBased(votes)).unwrap();
        assert_eq!(result.tier, tier);
        if let Some(message) = message {
            assert_eq!(result.message, message);
        }
    }
}

#[test]
fn test_half_split_resolves_to_medium() {
    assert_eq!(vote_sum_tier(1, 2), RiskTier::Medium);
    assert_eq!(vote_sum_tier(3, 6), RiskTier::Medium);
}

#[test]
fn test_upstream_tier_validation() {
    for tier in ["low", "medium", "high"] {
        let result = classify(&ClassifierInput::TierBased(tier.to_string())).unwrap();
        assert_eq!(result.tier.as_str(), tier);
    }
    let err = classify(&ClassifierInput::TierBased("Average Risk".to_string())).unwrap_err();
    assert!(matches!(err, EngineError::UnrecognizedRiskTier(_)));
}

#[test]
fn test_normalizer_rejects_ambiguous_numbers() {
    let schema = ModelSchema::new("v1", &["only"]);
    let mut raw = BTreeMap::new();
    raw.insert("only".to_string(), RawVote::Number(0.7));
    let err = normalize(&raw, &schema).unwrap_err();
    assert!(matches!(err, EngineError::InvalidVoteEncoding { .. }));
}
