// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::PathBuf;

use yantwai::app_config::{self, Config, Provider};
use yantwai::app_controller::Controller;
use yantwai::credentials;
use yantwai::translation::CancelFlag;

/// CLI Wrapper for Provider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliProvider {
    OpenAI,
    Gemini,
    Vertex,
}

impl From<CliProvider> for Provider {
    fn from(cli_provider: CliProvider) -> Self {
        match cli_provider {
            CliProvider::OpenAI => Provider::OpenAi,
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Vertex => Provider::Vertex,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
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

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a segment document using AI providers
    Translate(RunArgs),

    /// Re-run only the failures recorded by an earlier translation run
    Retry(RunArgs),

    /// Generate shell completions for yantwai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input segment document (YAML list of id/title/content records)
    #[arg(value_name = "INPUT_FILE")]
    input_file: PathBuf,

    /// Provider for the content task
    #[arg(short, long, value_enum)]
    provider: Option<CliProvider>,

    /// Model name for the content task
    #[arg(short, long)]
    model: Option<String>,

    /// Source language name (e.g. 'Chinese', 'Japanese')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language name (e.g. 'Vietnamese', 'English')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Secret store path (provider name -> credential list, JSON)
    #[arg(short = 'k', long, default_value = "keys.json", env = "YANTWAI_KEYS")]
    keys_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// YANTwAI - Yet Another Novel Translation with AI
///
/// Translates segmented novel documents using AI providers, with
/// credential rotation, bounded concurrency and automatic retries.
#[derive(Parser, Debug)]
#[command(name = "yantwai")]
#[command(author = "YANTwAI Team")]
#[command(version = "0.1.0")]
#[command(about = "AI-powered novel translation tool")]
#[command(long_about = "YANTwAI translates segmented novel documents (YAML lists of chapter \
segments) using AI providers.

EXAMPLES:
    yantwai translate novel.yaml                   # Translate using default config
    yantwai translate -p gemini novel.yaml         # Use the Gemini API
    yantwai translate -m deepseek-chat novel.yaml  # Use a specific model
    yantwai translate -s Chinese -t English novel.yaml
    yantwai retry novel.yaml                       # Re-run recorded failures only
    yantwai completions bash > yantwai.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file
    doesn't exist, a default one will be created automatically. Credentials
    live in a separate JSON store (keys.json by default), keyed by provider
    name, each entry a list so multiple keys rotate round-robin.

SUPPORTED PROVIDERS:
    openai - OpenAI-compatible chat APIs (OpenAI, DeepSeek, ...)
    gemini - Google Gemini API
    vertex - Google Vertex AI (access token + project_id)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "yantwai", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run(args, false).await,
        Commands::Retry(args) => run(args, true).await,
    }
}

async fn run(options: RunArgs, retry_only: bool) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::from_file(&options.config_path)
        .with_context(|| format!("Failed to load config: {}", options.config_path))?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.content.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        config.content.model = model.clone();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    } else {
        log::set_max_level(level_filter(&config.log_level));
    }

    let store = credentials::load_store(&options.keys_path)?;
    let controller = Controller::new(config, &store)?;

    // Ctrl-C drains gracefully: pending units settle as retryable
    let cancel = CancelFlag::new();
    let signal_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested, letting in-flight requests finish");
            signal_flag.cancel();
        }
    });

    if retry_only {
        controller.run_retry(&options.input_file, &cancel).await
    } else {
        controller.run_translation(&options.input_file, &cancel).await
    }
}
