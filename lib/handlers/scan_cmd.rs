//! Scan command handler.

use super::resolve_project_dir;
use crate::config::{BuildConfig, ConfigOverrides};
use crate::error::BundleResult;
use crate::manifest::{RenderOptions, render_patches};
use crate::scan::scan_project;
use colored::Colorize;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Scan a project and print its manifest (or descriptors as JSON). Writes nothing.
pub async fn scan_mod(path: Option<String>, json: bool) -> BundleResult<()> {
    let dir = resolve_project_dir(path)?;
    let config = BuildConfig::load(&dir, &ConfigOverrides::default())?;
    let result = scan_project(&config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let options = RenderOptions {
        honor_match_indent: config.honor_match_indent,
    };
    println!("{}", render_patches(&result.descriptors, &options));

    // Diagnostics go to stderr so the manifest can be redirected.
    for skipped in &result.skipped {
        eprintln!(
            "  {} {} {}",
            "⚠".bright_yellow(),
            skipped.path.display().to_string().bold(),
            format!("(skipped: {})", skipped.reason).dimmed()
        );
    }
    for descriptor in result.incomplete() {
        eprintln!(
            "  {} {}:{} {} leaves {} empty",
            "⚠".bright_yellow(),
            descriptor.source.display(),
            descriptor.line,
            descriptor.function_name.bold(),
            descriptor.missing_fields().join(", ")
        );
    }
    eprintln!(
        "  {} {} patches from {} files",
        "✓".bright_green(),
        result.descriptors.len(),
        result.files_scanned
    );

    Ok(())
}
