use api_types::{MoneyCents, transaction::TransactionKind};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/financeflow.toml";
const ENV_PREFIX: &str = "FINANCEFLOW";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_key: String,
    pub email: String,
    /// Only read from the config file or `FINANCEFLOW_PASSWORD`.
    pub password: String,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:54321".to_string(),
            api_key: String::new(),
            email: String::new(),
            password: String::new(),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn has_credentials(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Parser)]
#[command(name = "financeflow", version, about = "Track income, expenses and budgets")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the backend URL (e.g. https://xyz.supabase.co).
    #[arg(long)]
    base_url: Option<String>,
    /// Override the public API key.
    #[arg(long)]
    api_key: Option<String>,
    /// Override the sign-in email (password is never read from CLI).
    #[arg(long)]
    email: Option<String>,
    /// Override the log level.
    #[arg(long)]
    level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Show totals, recent transactions, expense breakdown and budgets.
    Dashboard {
        /// How many recent transactions to list.
        #[arg(long, default_value_t = 10)]
        recent: usize,
    },
    /// Record an income or an expense.
    Add {
        #[arg(long)]
        description: String,
        #[arg(long, allow_hyphen_values = true)]
        amount: MoneyCents,
        #[arg(long)]
        category: String,
        /// `income` or `expense`.
        #[arg(long = "type")]
        kind: TransactionKind,
        /// Defaults to now. Accepts `YYYY-MM-DD` or RFC 3339.
        #[arg(long, value_parser = parse_date)]
        date: Option<DateTime<Utc>>,
    },
    /// Delete a transaction by id.
    Delete { id: Uuid },
    /// Change the limit of an existing budget.
    Budget {
        #[arg(long)]
        category: String,
        #[arg(long)]
        limit: MoneyCents,
        #[arg(long)]
        spent: Option<MoneyCents>,
    },
}

fn parse_date(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    api_types::date::parse(raw).ok_or_else(|| format!("invalid date: {raw}"))
}

pub fn load() -> Result<(AppConfig, Command)> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(api_key) = args.api_key {
        settings.api_key = api_key;
    }
    if let Some(email) = args.email {
        settings.email = email;
    }
    if let Some(level) = args.level {
        settings.level = level;
    }

    Ok((settings, args.command))
}
