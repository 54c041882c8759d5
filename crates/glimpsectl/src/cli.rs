//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap. Execution lives in main.rs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Glimpse risk engine CLI
#[derive(Parser)]
#[command(name = "glimpsectl")]
#[command(about = "Glimpse - screening risk tiers and history analytics", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ./glimpse.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// History file (overrides store.path from config)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify one prediction-service response
    Classify {
        /// diabetes | heart_disease
        #[arg(long = "type")]
        assessment_type: String,

        /// Raw service payload as JSON, e.g. '{"tabpfn":1,"xgb":0,"lgb":1}'
        #[arg(long)]
        response: String,

        /// Screening date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Confidence percentage to store with the record
        #[arg(long)]
        confidence: Option<u8>,

        /// Append the result to the history
        #[arg(long)]
        record: bool,
    },

    /// List history with filters and sorting
    History {
        /// all | diabetes | heart_disease
        #[arg(long = "type", default_value = "all")]
        type_filter: String,

        /// all | low | medium | high
        #[arg(long = "risk", default_value = "all")]
        risk_filter: String,

        /// timestamp | assessment_type | risk_tier
        #[arg(long, default_value = "timestamp")]
        sort: String,

        /// Oldest first
        #[arg(long)]
        ascending: bool,
    },

    /// Risk distribution, monthly trend and latest verdicts
    Analytics,
}
