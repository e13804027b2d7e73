//! `lovepack` is the primary CLI binary.

use clap::Parser;
use colored::Colorize;
use lovepack::handlers;
use lovepack::{BundleError, BundleResult, Cli, Command, DEPLOY_DIR_ENV};
use tracing_subscriber::EnvFilter;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "lovepack=info";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print an error with appropriate formatting based on error type.
fn print_error(e: &BundleError) {
    println!();
    match e {
        BundleError::ProjectNotFound(path) => {
            println!("  {} package.json not found", "error".bright_red().bold());
            println!();
            println!("    {}: {}", "Searched".dimmed(), path.display());
        }
        BundleError::UnsupportedPlatform(msg) => {
            println!("  {} Unsupported platform", "error".bright_red().bold());
            println!();
            println!("    {}", msg);
            println!();
            println!(
                "    {}: Set {} or pass {}",
                "hint".bright_blue().bold(),
                DEPLOY_DIR_ENV.bright_white(),
                "--deploy-dir".bright_white()
            );
        }
        BundleError::Parse { path, message } => {
            println!(
                "  {} Failed to parse {}",
                "error[parse]".bright_red().bold(),
                path.display().to_string().bright_white()
            );
            println!();
            println!("    {}", message);
        }
        // For all other errors, use a consistent styled format
        _ => {
            let msg = e.to_string();
            if let Some((prefix, rest)) = msg.split_once(": ")
                && prefix.len() < 40
                && prefix.to_lowercase().ends_with("error")
            {
                println!(
                    "  {} {}",
                    format!("error[{}]", prefix.to_lowercase().replace(" error", ""))
                        .bright_red()
                        .bold(),
                    rest.dimmed()
                );
            } else {
                println!("  {} {}", "error".bright_red().bold(), msg);
            }
        }
    }
    println!();
}

/// Initialize tracing from `RUST_LOG`, falling back to info for this crate.
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> BundleResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            path,
            deploy_dir,
            compiler_timeout,
            strict,
            json,
        } => handlers::build_mod(path, deploy_dir, compiler_timeout, strict, json).await,

        Command::Scan { path, json } => handlers::scan_mod(path, json).await,

        Command::Path { path, deploy_dir } => handlers::print_deploy_path(path, deploy_dir).await,
    }
}
