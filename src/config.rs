//! Command-line and environment configuration.
//!
//! Each binary parses its `Args` once and turns it into a config struct that
//! is handed to the library; nothing below reads the environment on its own.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::manifest::{Manifest, ManifestError};
use crate::text::Rule;

pub const DEFAULT_SEED_DIR: &str = "seed_data";
pub const DEFAULT_DATABASE: &str = "SatQuestions";
pub const DEFAULT_COLLECTION: &str = "original_exams";

/// Checked first for the connection string.
pub const MONGO_URI_ENV: &str = "mongo_felps";
/// Checked when [`MONGO_URI_ENV`] is unset.
pub const MONGO_URI_FALLBACK_ENV: &str = "MONGO_URI";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "no MongoDB connection string configured, set {} (or {}) or pass --mongo-uri",
        MONGO_URI_ENV,
        MONGO_URI_FALLBACK_ENV
    )]
    MissingConnectionString,

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Which exam files to process and where they live.
#[derive(clap::Args, Debug, Clone)]
pub struct SeedArgs {
    /// Directory holding the exam JSON files
    #[arg(long, env = "SEED_DIR", default_value = DEFAULT_SEED_DIR)]
    pub seed_dir: PathBuf,

    /// Manifest listing the exam files (defaults to <seed-dir>/manifest.yaml)
    #[arg(long, env = "EXAM_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Exam file name, may be repeated; overrides the manifest
    #[arg(long = "file", value_name = "FILE")]
    pub files: Vec<String>,
}

impl SeedArgs {
    pub fn manifest(&self) -> Result<Manifest, ManifestError> {
        Manifest::resolve(&self.files, self.manifest.as_deref(), &self.seed_dir)
    }
}

/// Check SAT exam seed files before they are imported
#[derive(Parser, Debug, Clone)]
#[command(name = "validate_exams")]
pub struct ValidateArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

/// Upsert SAT exam seed files into MongoDB, keyed by exam_id
#[derive(Parser, Debug, Clone)]
#[command(name = "import_exams")]
pub struct ImportArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    /// MongoDB connection string; falls back to $mongo_felps, then $MONGO_URI
    #[arg(long)]
    pub mongo_uri: Option<String>,

    /// Database name
    #[arg(long, env = "MONGODB_DB", default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Collection name
    #[arg(long, env = "MONGODB_COLLECTION", default_value = DEFAULT_COLLECTION)]
    pub collection: String,

    /// Import into an in-memory store instead of MongoDB
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Rewrite question text in the seed files with LaTeX clean-up rules
#[derive(Parser, Debug, Clone)]
#[command(name = "normalize_exams")]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub seed: SeedArgs,

    /// Rule to apply, may be repeated; all rules when omitted
    #[arg(long = "rule", value_enum, value_name = "RULE")]
    pub rules: Vec<Rule>,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ValidateConfig {
    pub seed_dir: PathBuf,
    pub manifest: Manifest,
}

impl ValidateConfig {
    pub fn from_args(args: &ValidateArgs) -> Result<Self, ConfigError> {
        Ok(Self {
            seed_dir: args.seed.seed_dir.clone(),
            manifest: args.seed.manifest()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// `None` only for dry runs
    pub mongo_uri: Option<String>,
    pub database: String,
    pub collection: String,
    pub seed_dir: PathBuf,
    pub manifest: Manifest,
    pub dry_run: bool,
}

impl ImportConfig {
    /// `env` looks up a variable by name, normally `std::env::var(..).ok()`.
    pub fn from_args(
        args: &ImportArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mongo_uri = args
            .mongo_uri
            .clone()
            .or_else(|| env(MONGO_URI_ENV))
            .or_else(|| env(MONGO_URI_FALLBACK_ENV))
            .filter(|uri| !uri.trim().is_empty());

        if mongo_uri.is_none() && !args.dry_run {
            return Err(ConfigError::MissingConnectionString);
        }

        Ok(Self {
            mongo_uri,
            database: args.database.clone(),
            collection: args.collection.clone(),
            seed_dir: args.seed.seed_dir.clone(),
            manifest: args.seed.manifest()?,
            dry_run: args.dry_run,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    pub seed_dir: PathBuf,
    pub manifest: Manifest,
    /// selected rules, always in [`Rule::ALL`] order
    pub rules: Vec<Rule>,
    pub dry_run: bool,
}

impl NormalizeConfig {
    pub fn from_args(args: &NormalizeArgs) -> Result<Self, ConfigError> {
        let rules = Rule::ALL
            .into_iter()
            .filter(|rule| args.rules.is_empty() || args.rules.contains(rule))
            .collect();

        Ok(Self {
            seed_dir: args.seed.seed_dir.clone(),
            manifest: args.seed.manifest()?,
            rules,
            dry_run: args.dry_run,
        })
    }
}
