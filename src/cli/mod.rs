//! Command-line interface implementation
//!
//! Parses the command line, sets up logging and hands off to [`build`] to
//! run the selected entrypoint.
//!
//! The mode flag `--env=<mode>` is read straight from the raw arguments, and
//! flags the parser does not know are dropped before parsing, so theme
//! scripts can pass extra flags through without breaking the run.

mod build;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::entrypoint::Entrypoint;
use crate::mode::Mode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "THEMEKIT_LOG";

/// Flags passed through to the parser unchanged.
const KNOWN_FLAGS: &[&str] =
    &["-v", "--verbose", "--list", "--no-color", "-h", "--help", "-V", "--version"];

/// Dropped flags whose value may follow as a separate argument.
const VALUE_FLAGS: &[&str] = &["--env"];

/// themekit - build pipeline for front-end theme assets
#[derive(Parser, Debug)]
#[command(name = "themekit")]
#[command(about = "themekit - build pipeline for front-end theme assets")]
#[command(version)]
#[command(after_help = "Mode:\n  --env=<mode>  development (default) or production; the last valid flag wins")]
pub struct Cli {
    /// Entrypoint to run: build, watch, clean, styles, or any single task
    #[arg(default_value = "default")]
    pub entrypoint: String,

    /// Path to themekit.toml (default: search upward from the current directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show every task as it starts
    #[arg(short, long)]
    pub verbose: bool,

    /// List entrypoints and registered tasks, then exit
    #[arg(long)]
    pub list: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Drop flags the parser does not declare, keeping the program name,
/// positionals and `--config` with its value.
///
/// A separated value after `--env` (`--env production`) is dropped with the
/// flag; that shape never selects a mode. Entrypoint names are never taken
/// as such a value.
pub fn sanitize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let mut kept: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if arg == "--config" {
            kept.push(arg);
            kept.extend(args.next());
        } else if arg.starts_with("--config=")
            || KNOWN_FLAGS.contains(&arg.as_str())
            || !arg.starts_with('-')
        {
            kept.push(arg);
        } else {
            tracing::debug!(flag = %arg, "ignoring unrecognized flag");
            if VALUE_FLAGS.contains(&arg.as_str()) {
                if let Some(value) = args
                    .next_if(|next| !next.starts_with('-') && next.parse::<Entrypoint>().is_err())
                {
                    tracing::debug!(flag = %arg, %value, "ignoring value of unrecognized flag");
                }
            }
        }
    }

    kept
}

fn init_logging(verbose: bool) {
    let default = if verbose { "themekit=debug" } else { "themekit=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when embedded; keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run the CLI and return the exit code
pub fn run() -> ExitCode {
    let raw: Vec<String> = std::env::args().collect();
    let mode = Mode::from_args(raw.iter().skip(1), Mode::default());

    let cli = match Cli::try_parse_from(sanitize_args(raw)) {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_INVALID_ARGS } else { EXIT_SUCCESS };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(cli.verbose);
    tracing::debug!(%mode, entrypoint = %cli.entrypoint, "starting");

    if cli.list {
        return build::run_list(cli.config.as_deref());
    }

    build::run_entrypoint(&cli.entrypoint, mode, cli.config.as_deref(), cli.verbose, !cli.no_color)
}
