//! Path command handler.

use super::{absolute_arg, resolve_project_dir};
use crate::config::{BuildConfig, ConfigOverrides};
use crate::error::BundleResult;
use crate::project::ProjectManifest;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Print where `build` would deploy the project.
pub async fn print_deploy_path(path: Option<String>, deploy_dir: Option<PathBuf>) -> BundleResult<()> {
    let dir = resolve_project_dir(path)?;
    let overrides = ConfigOverrides {
        deploy_dir: absolute_arg(deploy_dir)?,
        ..Default::default()
    };
    let config = BuildConfig::load(&dir, &overrides)?;
    let project = ProjectManifest::load(&dir)?;

    println!("{}", config.resolve_deploy_root(&project.name)?.display());
    Ok(())
}
