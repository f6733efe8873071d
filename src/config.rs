// src/config.rs
use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_PACING_SECS, HISTORY_TABLE, HTTP_TIMEOUT_SECS, LISTINGS_TABLE,
    LISTING_IDENTITY_COLUMN, LISTING_PAGE_SIZE, MAX_CONCURRENCY, STORE_READ_PAGE_SIZE,
    UPSERT_BATCH_SIZE,
};
use crate::error::AppError;
use crate::types::{ApiKey, ColumnName, TableName, ValidatedUrl, ValidationError};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// What to run (defaults to a full sync)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Load environment variables from this file instead of ./.env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Number of listings whose history is fetched in parallel (default: 1)
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

/// The stages a single invocation can run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sync listings, then the history records of every stored listing
    Sync,
    /// Sync listings only
    Listings,
    /// Sync history records for the listings already in the store
    History,
    /// Write a CSV snapshot of the listing API
    Export {
        /// Destination file
        #[arg(short, long, default_value = "imoveis.csv")]
        output: PathBuf,
    },
}

impl CommandLineInput {
    /// The command to run, with `sync` as the default.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Sync)
    }

    /// Loads `.env` (or the file given with `--env-file`) into the process environment.
    pub fn load_env_file(&self) -> Result<(), AppError> {
        match &self.env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    AppError::MissingConfiguration(format!(
                        "could not load env file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                log::debug!("Loaded environment from {}", path.display());
            }
            None => {
                if let Ok(path) = dotenvy::dotenv() {
                    log::debug!("Loaded environment from {}", path.display());
                }
            }
        }
        Ok(())
    }
}

/// Settings for the Vista API side of a run.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: ApiKey,
    pub listing_url: ValidatedUrl,
    pub detail_url: ValidatedUrl,
    pub listing_page_size: u32,
    pub timeout: Duration,
    pub max_attempts: u32,
    /// Pause after each per-listing detail request.
    pub pacing: Duration,
}

/// Settings for the Supabase store side of a run.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: ValidatedUrl,
    pub api_key: ApiKey,
    pub listings_table: TableName,
    pub history_table: TableName,
    pub identity_column: ColumnName,
    pub read_page_size: u32,
    pub batch_size: usize,
    pub timeout: Duration,
}

/// Resolved configuration for a full sync, built once at process start.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub concurrency: usize,
}

/// Reads configuration keys, remembering every required key that is absent.
struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
    missing: Vec<&'static str>,
}

impl<'a> EnvReader<'a> {
    fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &'static str) -> String {
        match self.optional(key) {
            Some(value) => value,
            None => {
                self.missing.push(key);
                String::new()
            }
        }
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, ValidationError> {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|_| ValidationError::InvalidNumber {
                key: key.to_string(),
                value: raw,
            }),
            None => Ok(default),
        }
    }

    fn at_least<T>(&self, key: &str, default: T, min: T) -> Result<T, ValidationError>
    where
        T: FromStr + PartialOrd + Copy + Into<u64>,
    {
        let value = self.parsed(key, default)?;
        if value < min {
            return Err(ValidationError::OutOfBounds {
                key: key.to_string(),
                value: value.into(),
                min: min.into(),
                max: u64::MAX,
            });
        }
        Ok(value)
    }

    fn seconds(&self, key: &str, default: f64) -> Result<Duration, ValidationError> {
        let secs: f64 = self.parsed(key, default)?;
        Duration::try_from_secs_f64(secs).map_err(|_| ValidationError::InvalidNumber {
            key: key.to_string(),
            value: secs.to_string(),
        })
    }

    /// Fails with every missing key at once.
    fn finish(&self) -> Result<(), AppError> {
        if self.missing.is_empty() {
            return Ok(());
        }
        Err(AppError::MissingConfiguration(format!(
            "the following environment variables are not set: {}",
            self.missing.join(", ")
        )))
    }
}

impl ApiConfig {
    /// Resolves the API settings from the process environment.
    pub fn resolve() -> Result<Self, AppError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Resolves the API settings from a key lookup.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mut env = EnvReader::new(lookup);
        let api_key = env.required("API_IMOVEIS_KEY");
        let listing_url = env.required("API_IMOVEIS_URL");
        env.finish()?;
        Self::build(&env, api_key, listing_url)
    }

    fn build(env: &EnvReader<'_>, api_key: String, listing_url: String) -> Result<Self, AppError> {
        let listing_url = ValidatedUrl::parse(&listing_url)?;
        let detail_url = match env.optional("API_IMOVEIS_DETALHES_URL") {
            Some(url) => ValidatedUrl::parse(&url)?,
            None => listing_url.with_last_segment("detalhes")?,
        };

        Ok(Self {
            api_key: ApiKey::new(api_key)?,
            listing_url,
            detail_url,
            listing_page_size: env.at_least("PAGINACAO_QTD", LISTING_PAGE_SIZE, 1)?,
            timeout: Duration::from_secs(env.at_least("HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS, 1)?),
            max_attempts: env.at_least("MAX_RETRIES_API", DEFAULT_MAX_ATTEMPTS, 1)?,
            pacing: env.seconds("SLEEP_ENTRE_REQ", DEFAULT_PACING_SECS)?,
        })
    }
}

impl SyncConfig {
    /// Resolves the full sync configuration from the process environment.
    pub fn resolve(cli: &CommandLineInput) -> Result<Self, AppError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), cli.concurrency)
    }

    /// Resolves the full sync configuration from a key lookup.
    ///
    /// `concurrency_override` (from the command line) wins over `SYNC_CONCURRENCY`.
    pub fn from_lookup(
        lookup: &dyn Fn(&str) -> Option<String>,
        concurrency_override: Option<usize>,
    ) -> Result<Self, AppError> {
        let mut env = EnvReader::new(lookup);
        let store_url = env.required("SUPABASE_URL");
        let store_key = env.required("SUPABASE_KEY");
        let api_key = env.required("API_IMOVEIS_KEY");
        let listing_url = env.required("API_IMOVEIS_URL");
        env.finish()?;

        let api = ApiConfig::build(&env, api_key, listing_url)?;

        let identity_column = ColumnName::new(
            env.optional("IMOVEIS_CODIGO_COL")
                .unwrap_or_else(|| LISTING_IDENTITY_COLUMN.to_string()),
        )?;
        if !identity_column.is_known_listing_identity() {
            log::warn!(
                "Listing identity column '{}' is not one of {:?}",
                identity_column,
                ColumnName::LISTING_IDENTITY_CANDIDATES
            );
        }

        let store = StoreConfig {
            url: ValidatedUrl::parse(&store_url)?,
            api_key: ApiKey::new(store_key)?,
            listings_table: TableName::new(
                env.optional("IMOVEIS_TABLE")
                    .unwrap_or_else(|| LISTINGS_TABLE.to_string()),
            )?,
            history_table: TableName::new(
                env.optional("PRONTUARIOS_TABLE")
                    .unwrap_or_else(|| HISTORY_TABLE.to_string()),
            )?,
            identity_column,
            read_page_size: env.at_least("PAGINATION_LIMIT", STORE_READ_PAGE_SIZE, 1)?,
            batch_size: env.at_least("UPSERT_BATCH_SIZE", UPSERT_BATCH_SIZE as u32, 1)? as usize,
            timeout: api.timeout,
        };

        let concurrency = match concurrency_override {
            Some(value) => value,
            None => env.parsed("SYNC_CONCURRENCY", 1usize)?,
        };
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(ValidationError::OutOfBounds {
                key: "SYNC_CONCURRENCY".to_string(),
                value: concurrency as u64,
                min: 1,
                max: MAX_CONCURRENCY as u64,
            }
            .into());
        }

        Ok(Self {
            api,
            store,
            concurrency,
        })
    }
}
