//! Facegate CLI - face enrollment and login against a verification service.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  64  Usage error (empty user id, invalid service URL)
  65  Face not recognized or enrollment rejected
  66  Camera unavailable (missing or empty frames directory)
  69  Verification service unavailable";

#[derive(Parser)]
#[command(name = "facegate")]
#[command(author, version, about = "Face enrollment and login for the facegate lock screen", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the verification service (overrides FACEGATE_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress user-facing output (errors are still reported)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register three face images under a user id
    Enroll {
        /// User id to enroll
        #[arg(short, long, value_name = "ID")]
        user: String,

        /// Directory of PNG/JPEG frames used as the camera
        #[arg(short, long, value_name = "DIR")]
        frames: PathBuf,

        /// JPEG quality of the submitted images (1-100)
        #[arg(long, default_value_t = facegate_core::DEFAULT_JPEG_QUALITY)]
        quality: u8,
    },

    /// Capture one face image and verify it against a user id
    Login {
        /// User id to log in as
        #[arg(short, long, value_name = "ID")]
        user: String,

        /// Directory of PNG/JPEG frames used as the camera
        #[arg(short, long, value_name = "DIR")]
        frames: PathBuf,

        /// JPEG quality of the submitted image (1-100)
        #[arg(long, default_value_t = facegate_core::DEFAULT_JPEG_QUALITY)]
        quality: u8,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "facegate_core=debug,facegate=debug,info"
    } else {
        "facegate_core=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Enroll {
            user,
            frames,
            quality,
        } => commands::enroll::execute(user, frames, quality, cli.api_url, cli.quiet).await,
        Commands::Login {
            user,
            frames,
            quality,
        } => commands::login::execute(user, frames, quality, cli.api_url, cli.quiet).await,
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(e) => ExitCode::from_anyhow(&e),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}
