// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::app_controller::AppController;
use crate::page::TextFragment;
use crate::providers::Gemini;
use crate::terminology::TerminologyStore;

mod app_config;
mod app_controller;
mod errors;
mod language_utils;
mod page;
mod providers;
mod terminology;
mod translation;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate one comic page (default command)
    Translate(TranslateArgs),

    /// Inspect or edit the terminology dictionary
    Terms {
        #[command(subcommand)]
        action: TermsAction,
    },
}

#[derive(Subcommand, Debug)]
enum TermsAction {
    /// List entries whose term or translation contains a keyword
    Search {
        /// Keyword to search for
        keyword: String,
    },
    /// Remove an entry by its source term
    Remove {
        /// Source-language term to remove
        term: String,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Page image file
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Detected text fragments for the page, as a JSON array
    #[arg(value_name = "FRAGMENTS")]
    fragments: PathBuf,

    /// Output file for the translation document; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Retranslate even when a cached result exists
    #[arg(short, long)]
    force: bool,
}

/// Bubblefish - AI comic page translation
///
/// Translates detected comic page text with a multi-stage fallback flow,
/// a shared terminology dictionary and a per-page result cache.
#[derive(Parser, Debug)]
#[command(name = "bubblefish")]
#[command(version)]
#[command(about = "AI-powered comic page translation")]
#[command(
    long_about = "Bubblefish translates detected comic page text using the Gemini API.

EXAMPLES:
    bubblefish translate page.png fragments.json       # Translate one page
    bubblefish translate -f page.png fragments.json    # Ignore the cached result
    bubblefish terms search 奇庫魯                      # Search the dictionary
    bubblefish terms remove キクル                      # Drop a dictionary entry

CONFIGURATION:
    Configuration is stored in conf.json by default; pass --config-path for a
    different file. A missing config file falls back to defaults. The API key
    comes from the config file or the GEMINI_API_KEY environment variable."
)]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");

            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => {
                    writeln!(stderr, "\x1B[1;31m{} {}\x1B[0m", now, record.args())
                }
                Level::Warn => {
                    writeln!(stderr, "\x1B[1;33m{} {}\x1B[0m", now, record.args())
                }
                _ => writeln!(stderr, "{} {}", now, record.args()),
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = CommandLineOptions::parse();

    let mut config = Config::from_file_or_default(&options.config_path)?;
    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }

    CustomLogger::init(config.log_level.to_level_filter())
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    match options.command {
        Commands::Translate(args) => run_translate(&config, args).await,
        Commands::Terms { action } => run_terms(&config, action),
    }
}

async fn run_translate(config: &Config, args: TranslateArgs) -> Result<()> {
    let image = fs::read(&args.image)
        .with_context(|| format!("Failed to read page image: {}", args.image.display()))?;

    let raw_fragments = fs::read_to_string(&args.fragments)
        .with_context(|| format!("Failed to read fragments file: {}", args.fragments.display()))?;
    let fragments: Vec<TextFragment> = serde_json::from_str(&raw_fragments)
        .with_context(|| format!("Failed to parse fragments file: {}", args.fragments.display()))?;

    let api_key = config
        .resolve_api_key()
        .ok_or_else(|| anyhow!("No API key in config or GEMINI_API_KEY environment variable"))?;

    let provider = Arc::new(Gemini::new(
        &config.provider.model,
        api_key,
        &config.provider.endpoint,
        Duration::from_secs(config.provider.timeout_secs),
    ));
    let controller = AppController::new(config, provider)?;

    let outcome = controller
        .translate_page(&image, fragments, args.force)
        .await
        .map_err(|e| anyhow!("Translation failed: {}", e))?;

    if outcome.from_cache {
        info!("Result served from cache");
    } else {
        info!("Result produced at stage {}", outcome.translation.stage);
    }
    if !outcome.translation.success {
        warn!("Page is degraded: source text kept untranslated, needs proofreading");
    }

    let json = serde_json::to_string_pretty(&outcome.translation)?;
    match args.output {
        Some(path) => fs::write(&path, json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}

fn run_terms(config: &Config, action: TermsAction) -> Result<()> {
    let store = TerminologyStore::load(
        &config.terminology_path,
        config.source_language.split('-').next().unwrap_or(&config.source_language),
        config.target_language.split('-').next().unwrap_or(&config.target_language),
    );

    match action {
        TermsAction::Search { keyword } => {
            let matches = store.search(&keyword);
            if matches.is_empty() {
                println!("No entries match {:?}", keyword);
            } else {
                for (term, entry) in matches {
                    println!("{} -> {}", term, entry.annotated());
                }
            }
        }
        TermsAction::Remove { term } => {
            if store.remove(&term)? {
                println!("Removed {}", term);
            } else {
                println!("No entry for {}", term);
            }
        }
    }

    Ok(())
}
