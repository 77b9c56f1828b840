// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sermonscribe::app_config::{Config, LogLevel, LookupProvider};
use sermonscribe::app_controller::Controller;
use sermonscribe::bridge::run_bridge;
use sermonscribe::providers::LexicalSimilarity;
use sermonscribe::pipeline::SermonPipeline;
use sermonscribe::scripture::ReferenceNormalizer;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn a transcript (or a folder of .txt transcripts) into sermon documents
    Process(ProcessArgs),

    /// Print a transcript with its scripture references normalized
    Normalize {
        /// Transcript file, or '-' for stdin
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Serve line-delimited JSON requests on stdin/stdout
    Bridge,

    /// Generate shell completions for sermonscribe
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ProcessArgs {
    /// Transcript file or directory to process
    #[arg(value_name = "INPUT")]
    input_path: PathBuf,

    /// Directory for the generated documents (default: next to each input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON array of reference candidates (single file only)
    #[arg(long)]
    candidates: Option<PathBuf>,

    /// Look verses up in this JSON file instead of the configured service
    #[arg(long)]
    verses: Option<PathBuf>,

    /// Topic-break similarity threshold (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f32>,

    /// Skip reference normalization
    #[arg(long)]
    no_normalize: bool,

    /// Skip topic segmentation
    #[arg(long)]
    no_segment: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// sermonscribe - structured documents from sermon transcripts
///
/// Finds the Bible passages quoted in a transcript, isolates each one in its
/// own paragraph and splits the rest at topic breaks.
#[derive(Parser, Debug)]
#[command(name = "sermonscribe")]
#[command(version)]
#[command(about = "Structured sermon documents with embedded Bible passages")]
#[command(long_about = "sermonscribe turns a speech-to-text sermon transcript into a document tree of \
paragraphs with embedded Bible passages.

EXAMPLES:
    sermonscribe process sunday.txt                      # Writes sunday.sermon.json
    sermonscribe process -f --verses kjv.json sermons/   # Whole folder, local verse file
    sermonscribe normalize sunday.txt                    # Show normalized references
    sermonscribe bridge < requests.jsonl                 # JSON lines in, JSON lines out
    sermonscribe completions bash > sermonscribe.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// Custom logger writing colored, timestamped lines to stderr
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself lets everything through; `set_max_level` filters.
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "sermonscribe", &mut std::io::stdout());
            Ok(())
        }
        Commands::Normalize { input } => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_normalize(&config, &input)
        }
        Commands::Bridge => {
            let config = load_config(&cli.config_path, cli.log_level)?;
            run_bridge_mode(config).await
        }
        Commands::Process(args) => {
            let mut config = load_config(&cli.config_path, cli.log_level)?;
            apply_process_overrides(&mut config, &args);
            config.validate().context("Configuration validation failed")?;
            run_process(config, args).await
        }
    }
}

/// Load or create the configuration and apply the log level from it unless
/// the command line already chose one.
fn load_config(config_path: &str, cli_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = Config::load_or_create(config_path)?;
    if let Some(level) = cli_level {
        config.log_level = level.into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }
    Ok(config)
}

fn apply_process_overrides(config: &mut Config, args: &ProcessArgs) {
    if let Some(verses) = &args.verses {
        config.lookup.provider = LookupProvider::JsonFile;
        config.lookup.verses_file = Some(verses.clone());
    }
    if let Some(threshold) = args.threshold {
        config.segmentation.similarity_threshold = threshold;
    }
    if args.no_normalize {
        config.normalizer.enabled = false;
    }
    if args.no_segment {
        config.segmentation.enabled = false;
    }
}

async fn run_process(config: Config, args: ProcessArgs) -> Result<()> {
    let controller = Controller::with_config(config)?;

    if args.input_path.is_file() {
        let output_dir = match &args.output {
            Some(dir) => dir.clone(),
            None => args.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        controller
            .run(args.input_path.clone(), output_dir, args.candidates.clone(), args.force_overwrite)
            .await?;
    } else if args.input_path.is_dir() {
        if args.candidates.is_some() {
            return Err(anyhow!("--candidates applies to a single file; use <name>.candidates.json files in folder mode"));
        }
        let summary = controller
            .run_folder(args.input_path.clone(), args.output.clone(), args.force_overwrite)
            .await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} transcript(s) failed", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    }

    Ok(())
}

fn run_normalize(config: &Config, input: &Path) -> Result<()> {
    let text = if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(input).context(format!("Failed to read {}", input.display()))?
    };

    let normalized = ReferenceNormalizer::new(config.normalizer.clone()).normalize(&text);
    info!("{} reference(s) rewritten", normalized.deltas.len());

    let mut stdout = std::io::stdout();
    stdout.write_all(normalized.text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

async fn run_bridge_mode(config: Config) -> Result<()> {
    config.validate().context("Configuration validation failed")?;
    let lookup = Controller::build_lookup(&config.lookup)?;
    let pipeline = SermonPipeline::new(config.pipeline_config(), lookup, Arc::new(LexicalSimilarity::new()));

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let stats = run_bridge(stdin, &mut stdout, &pipeline).await?;

    info!(
        "Bridge closed: {} request(s), {} succeeded, {} failed",
        stats.requests, stats.succeeded, stats.failed
    );
    Ok(())
}
