//! Build command handler.

use super::{absolute_arg, resolve_project_dir};
use crate::config::{BuildConfig, ConfigOverrides};
use crate::error::BundleResult;
use crate::pipeline::run_pipeline;
use crate::report::{PipelineReport, StepOutcome};
use colored::Colorize;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Run the full pipeline and print its report.
pub async fn build_mod(
    path: Option<String>,
    deploy_dir: Option<PathBuf>,
    compiler_timeout: Option<u64>,
    strict: bool,
    json: bool,
) -> BundleResult<()> {
    let dir = resolve_project_dir(path)?;
    let overrides = ConfigOverrides {
        deploy_dir: absolute_arg(deploy_dir)?,
        compiler_timeout_secs: compiler_timeout,
    };
    let config = BuildConfig::load(&dir, &overrides)?;

    let report = run_pipeline(&config).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if strict && report.has_failures() {
        if !json {
            println!("\n  Deployment incomplete with --strict. Fix the failed steps and retry.");
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Print a human-readable pipeline report.
pub fn print_report(report: &PipelineReport) {
    for skipped in &report.skipped_sources {
        println!(
            "  {} {} {}",
            "⚠".bright_yellow(),
            skipped.path.display().to_string().bold(),
            format!("(skipped: {})", skipped.reason).dimmed()
        );
    }

    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Success => {
                println!("  {} {}", "✓".bright_green(), step.name);
            }
            StepOutcome::Skipped { reason } => {
                println!(
                    "  {} {} {}",
                    "-".dimmed(),
                    step.name.dimmed(),
                    format!("({})", reason).dimmed()
                );
            }
            StepOutcome::Failed { reason } => {
                println!("  {} {}", "✗".bright_red(), step.name.bright_red());
                println!("      {} {}", "└─".dimmed(), reason.dimmed());
            }
        }
    }

    println!();
    let status = if report.has_failures() {
        "⚠".bright_yellow()
    } else {
        "✓".bright_green()
    };
    println!(
        "  {} Deployed to {}",
        status,
        report.deploy_root.display().to_string().bright_green()
    );
    println!(
        "    Patches: {}, Extra scripts: {}",
        report.descriptors,
        report.aux_scripts.len()
    );
    println!(
        "    {} {}",
        "patches.toml".dimmed(),
        report.manifest_sha256.dimmed()
    );

    let failed = report.failed_steps().count();
    if failed > 0 {
        println!(
            "    {}",
            if failed == 1 {
                "1 step failed".bright_yellow()
            } else {
                format!("{} steps failed", failed).bright_yellow()
            }
        );
    }
}
