//! Deployment packager.
//!
//! Filesystem steps that lay a mod out under its deploy root. Every step
//! reports a [`StepOutcome`] instead of returning an error so that one
//! failure never stops the remaining steps.

use crate::constants::{LOVELY_DIR, SRC_DIR};
use crate::error::BundleResult;
use crate::report::StepOutcome;
use std::path::Path;
use walkdir::WalkDir;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Remove everything inside `root`, keeping `root` itself.
pub fn clear_directory(root: &Path) -> StepOutcome {
    if !root.exists() {
        return StepOutcome::skipped(format!("{} does not exist", root.display()));
    }
    outcome("clear", root, clear_entries(root))
}

/// Create the `lovely/` and `src/` directories.
pub fn create_skeleton(root: &Path) -> StepOutcome {
    let result: BundleResult<()> = [LOVELY_DIR, SRC_DIR]
        .iter()
        .try_for_each(|dir| std::fs::create_dir_all(root.join(dir)))
        .map_err(Into::into);
    outcome("skeleton", root, result)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> StepOutcome {
    let result = (|| -> BundleResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    })();
    outcome("write", path, result)
}

/// Recursively copy `source` into `root`, following symlinks.
pub fn copy_tree(source: &Path, root: &Path) -> StepOutcome {
    if !source.is_dir() {
        let reason = format!("build directory {} not found", source.display());
        tracing::warn!(step = "copy", path = %source.display(), "{}", reason);
        return StepOutcome::failed(reason);
    }
    outcome("copy", source, copy_entries(source, root))
}

fn clear_entries(root: &Path) -> BundleResult<()> {
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn copy_entries(source: &Path, root: &Path) -> BundleResult<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry?;
        let dest = root.join(entry.path().strip_prefix(source)?);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    tracing::debug!(files = copied, "copied build tree");
    Ok(copied)
}

fn outcome<T>(step: &str, path: &Path, result: BundleResult<T>) -> StepOutcome {
    match result {
        Ok(_) => StepOutcome::Success,
        Err(e) => {
            tracing::warn!(step, path = %path.display(), error = %e, "deployment step failed");
            StepOutcome::failed(e)
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clear_keeps_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("mod");
        std::fs::create_dir_all(root.join("lovely/deep")).unwrap();
        std::fs::write(root.join("stale.lua"), "x").unwrap();
        std::fs::write(root.join("lovely/deep/old.toml"), "x").unwrap();

        assert_eq!(clear_directory(&root), StepOutcome::Success);
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_clear_missing_root_is_skipped() {
        let dir = TempDir::new().unwrap();
        let outcome = clear_directory(&dir.path().join("absent"));
        assert!(matches!(outcome, StepOutcome::Skipped { .. }));
    }

    #[test]
    fn test_skeleton_creates_root_and_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("mods/my-mod");
        assert_eq!(create_skeleton(&root), StepOutcome::Success);
        assert!(root.join("lovely").is_dir());
        assert!(root.join("src").is_dir());
    }

    #[test]
    fn test_write_file_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lovely/patches.toml");
        assert_eq!(write_file(&path, "[manifest]"), StepOutcome::Success);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[manifest]");
    }

    #[test]
    fn test_copy_tree_recursive() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        let root = dir.path().join("deploy");
        std::fs::create_dir_all(build.join("lib/util")).unwrap();
        std::fs::write(build.join("main.lua"), "main").unwrap();
        std::fs::write(build.join("lib/util/str.lua"), "str").unwrap();
        std::fs::create_dir_all(build.join("empty")).unwrap();

        assert_eq!(copy_tree(&build, &root), StepOutcome::Success);
        assert_eq!(std::fs::read_to_string(root.join("main.lua")).unwrap(), "main");
        assert_eq!(
            std::fs::read_to_string(root.join("lib/util/str.lua")).unwrap(),
            "str"
        );
        assert!(root.join("empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_follows_symlinks() {
        let dir = TempDir::new().unwrap();
        let build = dir.path().join("build");
        let root = dir.path().join("deploy");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(dir.path().join("shared.lua"), "shared").unwrap();
        std::os::unix::fs::symlink(dir.path().join("shared.lua"), build.join("shared.lua"))
            .unwrap();

        assert_eq!(copy_tree(&build, &root), StepOutcome::Success);
        let meta = std::fs::symlink_metadata(root.join("shared.lua")).unwrap();
        assert!(meta.file_type().is_file());
    }

    #[test]
    fn test_copy_missing_build_dir_fails() {
        let dir = TempDir::new().unwrap();
        let outcome = copy_tree(&dir.path().join("build"), &dir.path().join("deploy"));
        assert!(outcome.is_failure());
    }
}
