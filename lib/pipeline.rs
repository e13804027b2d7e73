//! The full build-and-deploy pipeline.

use crate::config::BuildConfig;
use crate::constants::{LOVELY_DIR, PATCHES_FILE};
use crate::deploy;
use crate::error::BundleResult;
use crate::manifest::{RenderOptions, render_patches};
use crate::project::{ModMetadata, ProjectManifest};
use crate::report::{PipelineReport, compute_sha256};
use crate::scan::scan_project;
use crate::transpile::transpile_aux_scripts;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Scan, render and deploy a project.
///
/// Loading the project, resolving the deploy root and scanning are fatal.
/// Every later step is recorded in the report and never stops the run.
pub async fn run_pipeline(config: &BuildConfig) -> BundleResult<PipelineReport> {
    let project = ProjectManifest::load(&config.project_dir)?;
    let metadata = ModMetadata::from_project(&project);
    let deploy_root = config.resolve_deploy_root(&project.name)?;

    tracing::info!(
        id = %metadata.id,
        deploy_root = %deploy_root.display(),
        "building mod"
    );

    let scan = scan_project(config)?;
    let manifest = render_patches(
        &scan.descriptors,
        &RenderOptions {
            honor_match_indent: config.honor_match_indent,
        },
    );
    let metadata_json = metadata.render()?;

    let mut report = PipelineReport::new(deploy_root.clone());
    report.descriptors = scan.descriptors.len();
    report.skipped_sources = scan.skipped;
    report.manifest_sha256 = compute_sha256(manifest.as_bytes());
    report.metadata_sha256 = compute_sha256(metadata_json.as_bytes());

    report.record("clear", deploy::clear_directory(&deploy_root));
    report.record("skeleton", deploy::create_skeleton(&deploy_root));
    report.record(
        PATCHES_FILE,
        deploy::write_file(&deploy_root.join(LOVELY_DIR).join(PATCHES_FILE), &manifest),
    );
    report.record(
        metadata.file_name(),
        deploy::write_file(&deploy_root.join(metadata.file_name()), &metadata_json),
    );
    report.record("copy", deploy::copy_tree(&config.build_dir, &deploy_root));

    let aux = transpile_aux_scripts(config, &deploy_root, &metadata).await;
    report.steps.extend(aux.steps);
    report.aux_scripts = aux.deployed;

    if report.has_failures() {
        tracing::warn!(
            failed = report.failed_steps().count(),
            "deployment finished with failures"
        );
    } else {
        tracing::info!(descriptors = report.descriptors, "deployment finished");
    }

    Ok(report)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, ConfigOverrides};
    use crate::error::BundleError;
    use crate::report::StepOutcome;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_project(dir: &Path) {
        std::fs::write(
            dir.join("package.json"),
            r#"{
                "name": "my-mod",
                "displayName": "My Mod",
                "author": "Jane",
                "version": "0.1.0",
                "main": "main.ts"
            }"#,
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(
            dir.join("src/hooks.ts"),
            r#"
/**
 * @lovelyType pattern
 * @lovelyTarget game.lua
 * @lovelyPattern function love.load
 * @lovelyPosition after
 */
export function onLoad() {}
"#,
        )
        .unwrap();

        std::fs::create_dir_all(dir.join("build/lib")).unwrap();
        std::fs::write(dir.join("build/main.lua"), "-- main").unwrap();
        std::fs::write(dir.join("build/lib/util.lua"), "-- util").unwrap();
    }

    fn config(dir: &Path) -> BuildConfig {
        BuildConfig::from_sources(
            dir,
            ConfigFile::default(),
            Some(dir.join("deploy")),
            &ConfigOverrides::default(),
        )
    }

    #[tokio::test]
    async fn test_full_deployment_layout() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        let deploy = dir.path().join("deploy");
        std::fs::create_dir_all(&deploy).unwrap();
        std::fs::write(deploy.join("stale.lua"), "old").unwrap();

        let report = run_pipeline(&config(dir.path())).await.unwrap();

        assert!(!report.has_failures());
        assert_eq!(report.deploy_root, deploy);
        assert_eq!(report.descriptors, 1);
        assert!(report.aux_scripts.is_empty());

        assert!(!deploy.join("stale.lua").exists());
        assert!(deploy.join("src").is_dir());
        assert!(deploy.join("main.lua").is_file());
        assert!(deploy.join("lib/util.lua").is_file());
        assert!(!deploy.join("lovely/extra_lua.toml").exists());

        let patches = std::fs::read_to_string(deploy.join("lovely/patches.toml")).unwrap();
        assert!(patches.contains("[patches.pattern]"));
        assert!(patches.contains("payload = \"\"\"onLoad()\"\"\""));

        let metadata: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(deploy.join("my-mod.json")).unwrap())
                .unwrap();
        assert_eq!(metadata["main_file"], "main.lua");
        assert_eq!(metadata["prefix"], "my_mod");
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        let config = config(dir.path());

        let patches = dir.path().join("deploy/lovely/patches.toml");

        let first = run_pipeline(&config).await.unwrap();
        let first_patches = std::fs::read(&patches).unwrap();
        let second = run_pipeline(&config).await.unwrap();

        assert_eq!(first.manifest_sha256, second.manifest_sha256);
        assert_eq!(first.metadata_sha256, second.metadata_sha256);
        assert_eq!(std::fs::read(&patches).unwrap(), first_patches);
        assert_eq!(compute_sha256(&first_patches), first.manifest_sha256);
    }

    #[tokio::test]
    async fn test_missing_build_dir_is_recorded() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        std::fs::remove_dir_all(dir.path().join("build")).unwrap();

        let report = run_pipeline(&config(dir.path())).await.unwrap();

        let failed: Vec<_> = report.failed_steps().map(|s| s.name.as_str()).collect();
        assert_eq!(failed, vec!["copy"]);
        // Earlier steps still ran.
        assert!(dir.path().join("deploy/lovely/patches.toml").is_file());
        assert!(matches!(report.steps[0].outcome, StepOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_deploy_into_project_leaves_it_untouched() {
        let dir = TempDir::new().unwrap();
        write_project(dir.path());
        let file = ConfigFile {
            deploy_dir: Some(PathBuf::from("")),
            ..Default::default()
        };
        let config =
            BuildConfig::from_sources(dir.path(), file, None, &ConfigOverrides::default());

        let result = run_pipeline(&config).await;

        assert!(matches!(result, Err(BundleError::UnsafeDeployRoot { .. })));
        assert!(dir.path().join("src/hooks.ts").is_file());
        assert!(dir.path().join("build/main.lua").is_file());
    }

    #[tokio::test]
    async fn test_missing_project_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = run_pipeline(&config(dir.path())).await;
        assert!(matches!(result, Err(BundleError::ProjectNotFound(_))));
    }
}
