//! Glimpse Engine - risk aggregation and history analytics for the
//! diabetes and heart-disease screeners.
//!
//! Everything here is a pure function over values already in memory, except
//! the record store adapters. Inputs are passed explicitly; nothing reads
//! ambient session state.

pub mod analytics;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod pipeline;
pub mod query;
pub mod store;
pub mod tier;
pub mod types;
pub mod votes;

pub use analytics::{aggregate, AnalyticsSnapshot};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use history::{History, HistoryView};
pub use query::{query, HistoryQuery};
pub use store::{JsonlStore, MemoryStore, RecordStore};
pub use tier::{classify, classify_for, Classification, ClassifierInput, TierPolicy};
pub use types::*;
pub use votes::{normalize, ModelSchema, RawVote};
