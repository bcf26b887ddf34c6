//! es-scrub - scrub sensitive fields out of JSON events.
//!
//! Commands:
//! - `scrub`: read events, apply the configured rules, write the result
//! - `check`: validate the rules configuration and list the resolved rules

use clap::{Args, Parser, Subcommand};
use es_cli::{
    init_logging, scrub_stream, ExitCode, InputMode, LogConfig, LogFormat, LogLevel, StreamError,
};
use es_config::{load_rules, ConfigError, LoadOptions, LoadedRules};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Scrub sensitive fields out of JSON error-report events
#[derive(Parser)]
#[command(name = "es-scrub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Rules file (JSON or TOML); overrides ES_SCRUB_RULES and config dirs
    #[arg(long, short = 'r', global = true)]
    rules: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrub events from a file or stdin
    Scrub(ScrubArgs),

    /// Validate the rules configuration and print the resolved rules
    Check,
}

#[derive(Args, Debug)]
struct ScrubArgs {
    /// Input file; stdin when omitted or "-"
    input: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Treat input as JSON Lines (implied by .jsonl / .ndjson input)
    #[arg(long)]
    lines: bool,

    /// Pretty-print a single document
    #[arg(long)]
    pretty: bool,

    /// Exit with a non-zero code if any rule or scrub function failed
    #[arg(long)]
    strict: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => cli.global.log_level,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Scrub(args) => run_scrub(&cli.global, args),
        Commands::Check => run_check(&cli.global),
    };

    std::process::exit(exit_code.as_i32());
}

fn load(global: &GlobalOpts) -> Result<LoadedRules, ExitCode> {
    let options = LoadOptions {
        rules_path: global.rules.clone(),
        ..LoadOptions::default()
    };
    load_rules(&options).map_err(|e| report_config_error(&e))
}

fn report_config_error(error: &ConfigError) -> ExitCode {
    tracing::error!(code = error.code(), "{}", error);
    eprintln!("Error: {}", error);
    ExitCode::ConfigError
}

fn run_scrub(global: &GlobalOpts, args: &ScrubArgs) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let input = args
        .input
        .as_deref()
        .filter(|path| *path != Path::new("-"));
    let mode = match input {
        _ if args.lines => InputMode::Lines,
        Some(path) => InputMode::for_path(path),
        None => InputMode::Document,
    };

    let reader: Box<dyn io::BufRead> = match input {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(BufReader::new(file)),
            Err(e) => {
                eprintln!("Error: cannot open {}: {}", path.display(), e);
                return ExitCode::IoError;
            }
        },
        None => Box::new(BufReader::new(io::stdin().lock())),
    };

    let writer: Box<dyn io::Write> = match &args.output {
        Some(path) => match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => {
                eprintln!("Error: cannot create {}: {}", path.display(), e);
                return ExitCode::IoError;
            }
        },
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let outcome = match scrub_stream(&loaded.scrubber, reader, writer, mode, args.pretty) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            return match e {
                StreamError::Parse { .. } => ExitCode::InputError,
                StreamError::Read(_) | StreamError::Write(_) => ExitCode::IoError,
            };
        }
    };

    tracing::info!(
        events = outcome.events,
        fields_scrubbed = outcome.summary.fields_scrubbed,
        field_errors = outcome.summary.field_errors,
        rule_errors = outcome.summary.rule_errors,
        rules_source = %loaded.source,
        "scrub complete"
    );

    if args.strict && !outcome.summary.is_clean() {
        return ExitCode::ScrubErrors;
    }
    ExitCode::Clean
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let loaded = match load(global) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let rules: Vec<serde_json::Value> = loaded
        .scrubber
        .rules()
        .iter()
        .map(|rule| {
            serde_json::json!({
                "path": rule.path().to_string(),
                "keys": rule.keys(),
                "transform": rule.mask().name(),
            })
        })
        .collect();

    let report = serde_json::json!({
        "status": "ok",
        "source": loaded.source.to_string(),
        "path": loaded.path.as_ref().map(|p| p.display().to_string()),
        "sha256": loaded.sha256,
        "rules": rules,
        "warnings": loaded.warnings,
    });

    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::InternalError
        }
    }
}
