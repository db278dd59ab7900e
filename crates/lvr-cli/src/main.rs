#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use lvr_core::config;
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "lvr: revenue-projection landing page service",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file (TOML). Defaults to LVR_CONFIG, ./lvr.toml, then the user config dir.
    #[arg(long, global = true, env = "LVR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run the HTTP API",
        long_about = "Serve the projection API until ctrl-c or SIGTERM, then wait for queued notifications.",
        after_help = "EXAMPLES:\n    # Serve on the configured address\n    lvr serve\n\n    # Override bind address and database\n    lvr serve --bind 0.0.0.0:8080 --db /var/lib/lvr/lvr.sqlite3"
    )]
    Serve(cmd::serve::ServeArgs),

    #[command(
        about = "Normalize a payload file without storing it",
        long_about = "Run a projection payload through the normalizer and print the canonical record.",
        after_help = "EXAMPLES:\n    # Check a spreadsheet export\n    lvr normalize export.json\n\n    # Read stdin and emit the canonical JSON\n    cat export.json | lvr normalize - --json"
    )]
    Normalize(cmd::normalize::NormalizeArgs),

    #[command(
        about = "List recent projection runs",
        long_about = "Show the projection run audit log, newest first.",
        after_help = "EXAMPLES:\n    # Last 100 runs\n    lvr runs\n\n    # Last 10 runs as JSON\n    lvr runs --limit 10 --json"
    )]
    Runs(cmd::runs::RunsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("LVR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "lvr=debug,lvr_cli=debug,lvr_core=debug,tower_http=debug,info"
        } else {
            "lvr=info,lvr_cli=info,lvr_core=info,warn"
        })
    });

    let format = env::var("LVR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    let config = match config::resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            render_error(output, &CliError::new(format!("{e:#}")))?;
            return Err(e);
        }
    };
    if cli.verbose {
        info!(db = %config.storage.db_path.display(), bind = %config.server.bind, "resolved config");
    }

    match cli.command {
        Commands::Serve(ref args) => cmd::serve::run_serve(args, config),
        Commands::Normalize(ref args) => cmd::normalize::run_normalize(args, &config, output),
        Commands::Runs(ref args) => cmd::runs::run_runs(args, &config, output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["lvr", "--json", "runs"]);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_after_subcommand() {
        let cli = Cli::parse_from(["lvr", "runs", "--limit", "5", "--json"]);
        assert!(cli.output_mode().is_json());
        match cli.command {
            Commands::Runs(args) => assert_eq!(args.limit, Some(5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::parse_from(["lvr", "serve", "--bind", "0.0.0.0:9000", "--db", "x.db"]);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind.as_deref(), Some("0.0.0.0:9000"));
                assert_eq!(args.db, Some(PathBuf::from("x.db")));
                assert!(args.public_base_url.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn normalize_requires_a_file() {
        assert!(Cli::try_parse_from(["lvr", "normalize"]).is_err());
    }
}
