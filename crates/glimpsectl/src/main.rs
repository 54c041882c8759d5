//! glimpsectl - command-line front end for the Glimpse engine
//!
//! Every command prints JSON on stdout; logs go to stderr.

mod cli;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;

use cli::{Cli, Commands};
use glimpse_engine::config::DEFAULT_CONFIG_PATH;
use glimpse_engine::pipeline::{evaluate, record_prediction, PredictionRequest};
use glimpse_engine::query::{Filter, SortDirection, SortField};
use glimpse_engine::{
    logging, AssessmentType, EngineConfig, HistoryQuery, JsonlStore, RecordStore, RiskTier,
    DATE_FORMAT,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(store) = cli.store {
        config.store.path = store;
    }

    logging::init(&config.logging.level);
    debug!("Using history file {}", config.store.path.display());

    let store = JsonlStore::new(config.store.path.clone());

    match cli.command {
        Commands::Classify {
            assessment_type,
            response,
            date,
            confidence,
            record,
        } => {
            let assessment_type: AssessmentType =
                assessment_type.parse().map_err(|e: String| anyhow!(e))?;
            let response: serde_json::Value =
                serde_json::from_str(&response).context("parsing --response as JSON")?;
            let timestamp = match date {
                Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .with_context(|| format!("parsing --date '{}'", raw))?,
                None => Local::now().date_naive(),
            };
            if confidence.map_or(false, |c| c > 100) {
                return Err(anyhow!("--confidence must be between 0 and 100"));
            }

            if record {
                let recorded = record_prediction(
                    &store,
                    &config,
                    PredictionRequest {
                        assessment_type,
                        timestamp,
                        response,
                        confidence,
                    },
                )?;
                print_json(&recorded)?;
            } else {
                let (_, classification) = evaluate(&response, assessment_type, &config)?;
                print_json(&classification)?;
            }
        }

        Commands::History {
            type_filter,
            risk_filter,
            sort,
            ascending,
        } => {
            let q = HistoryQuery {
                type_filter: type_filter
                    .parse::<Filter<AssessmentType>>()
                    .map_err(|e| anyhow!(e))?,
                risk_filter: risk_filter.parse::<Filter<RiskTier>>()?,
                sort_field: sort.parse::<SortField>().map_err(|e| anyhow!(e))?,
                sort_direction: if ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
            };
            let history = store.load().context("loading history")?;
            let records = history.query(&q);
            print_json(&json!({
                "records": records,
                "excluded_records": history.excluded().len(),
            }))?;
        }

        Commands::Analytics => {
            let history = store.load().context("loading history")?;
            print_json(&history.analytics())?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
