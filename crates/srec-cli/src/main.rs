//! `srec` binary entry point
//!
//! Parses the command line, sets up logging on stderr and hands the
//! subcommand to the library.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use srec_cli::{CommandContext, Commands, OutputFormat, TagSpec, commands};
use srec_formats::ChecksumPolicy;

#[derive(Parser)]
#[command(
    name = "srec",
    about = "Inspect and patch Motorola S-record files",
    version,
    long_about = "A command-line tool for Motorola S-record (S19/S28/S37) firmware images: \
                  summaries, hex dumps, string search, patching and checksum repair."
)]
struct Cli {
    /// Set the logging level (overrides RUST_LOG)
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<LogLevel>,

    /// Output format
    #[arg(short = 'f', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    /// How to treat records whose stored checksum is stale
    #[arg(
        long,
        global = true,
        env = "SREC_CHECKSUM_POLICY",
        default_value = "trust"
    )]
    checksum_policy: ChecksumPolicy,

    /// Name an address before the command runs: NAME=ADDR or NAME=ADDR:LEN
    #[arg(short, long = "tag", global = true, value_name = "NAME=ADDR[:LEN]")]
    tags: Vec<TagSpec>,

    /// Where modifying commands write the result (defaults to the input file)
    #[arg(short, long, global = true)]
    output: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.log_level {
        Some(level) => EnvFilter::new(Level::from(level).as_str()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let context = CommandContext {
        format: cli.format,
        checksum_policy: cli.checksum_policy,
        tags: cli.tags,
        output: cli.output,
    };

    commands::handle(cli.command, &context)
}
