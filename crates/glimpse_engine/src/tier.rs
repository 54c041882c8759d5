//! Risk tier classification.
//!
//! Two upstream data shapes exist: raw per-model votes, or a single
//! pre-computed tier string. Both go through `classify`; which one applies
//! is the caller's configuration, never sniffed from the data.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineResult;
use crate::types::{AssessmentType, ModelVote, RiskTier};

/// Human message for a tier, naming the screener when known.
///
/// Vote-sum medium verdicts do not come through here; they carry the tally.
fn tier_message(tier: RiskTier, subject: Option<AssessmentType>) -> String {
    let risk = match subject {
        Some(ty) => format!("Your {} risk", ty.label().to_lowercase()),
        None => "Your risk".to_string(),
    };
    match tier {
        RiskTier::Low => format!("{} appears to be low based on the provided parameters.", risk),
        RiskTier::Medium => format!(
            concat!(
                "{} appears to be moderate. ",
                "Consider discussing the result with a healthcare professional."
            ),
            risk
        ),
        RiskTier::High => format!(
            "{} appears to be elevated. Please consult with a healthcare professional.",
            risk
        ),
    }
}

/// Which upstream shape the deployment receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierPolicy {
    #[default]
    VoteSum,
    Upstream,
}

impl std::fmt::Display for TierPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierPolicy::VoteSum => write!(f, "vote_sum"),
            TierPolicy::Upstream => write!(f, "upstream"),
        }
    }
}

/// Input to the classifier, tagged by policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierInput {
    VoteBased(Vec<ModelVote>),
    TierBased(String),
}

impl ClassifierInput {
    pub fn policy(&self) -> TierPolicy {
        match self {
            ClassifierInput::VoteBased(_) => TierPolicy::VoteSum,
            ClassifierInput::TierBased(_) => TierPolicy::Upstream,
        }
    }
}

/// Positive-vote tally behind a vote-sum verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub positive: usize,
    pub total: usize,
}

/// Classifier output handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub tier: RiskTier,
    pub message: String,
    /// Present for vote-sum verdicts only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tally: Option<VoteTally>,
}

/// Tier for `positive` of `total` votes.
///
/// An exact half split with an even slot count lands on medium like any
/// other partial agreement.
pub fn vote_sum_tier(positive: usize, total: usize) -> RiskTier {
    if positive == 0 {
        RiskTier::Low
    } else if positive >= total {
        RiskTier::High
    } else {
        RiskTier::Medium
    }
}

pub fn classify(input: &ClassifierInput) -> EngineResult<Classification> {
    classify_for(input, None)
}

/// `classify` with messages that name the screener the input came from
pub fn classify_for(
    input: &ClassifierInput,
    subject: Option<AssessmentType>,
) -> EngineResult<Classification> {
    let classification = match input {
        ClassifierInput::VoteBased(votes) => {
            let tally = VoteTally {
                positive: votes.iter().filter(|v| v.verdict).count(),
                total: votes.len(),
            };
            let tier = vote_sum_tier(tally.positive, tally.total);
            let message = match tier {
                RiskTier::Medium => format!("{}/{} models positive", tally.positive, tally.total),
                _ => tier_message(tier, subject),
            };
            Classification {
                tier,
                message,
                tally: Some(tally),
            }
        }
        ClassifierInput::TierBased(raw) => {
            let tier: RiskTier = raw.parse()?;
            Classification {
                tier,
                message: tier_message(tier, subject),
                tally: None,
            }
        }
    };

    debug!(
        "classified under {} policy: {}",
        input.policy(),
        classification.tier
    );
    Ok(classification)
}
