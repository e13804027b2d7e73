//! Command handlers.

mod build_cmd;
mod path_cmd;
mod scan_cmd;

use crate::error::BundleResult;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use build_cmd::{build_mod, print_report};
pub use path_cmd::print_deploy_path;
pub use scan_cmd::scan_mod;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Resolve the project directory argument to an absolute path.
pub(crate) fn resolve_project_dir(path: Option<String>) -> BundleResult<PathBuf> {
    let dir = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    Ok(std::path::absolute(dir)?)
}

/// Make a CLI-supplied path absolute against the working directory.
pub(crate) fn absolute_arg(path: Option<PathBuf>) -> BundleResult<Option<PathBuf>> {
    path.map(std::path::absolute).transpose().map_err(Into::into)
}
