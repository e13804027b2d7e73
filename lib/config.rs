//! Build configuration.
//!
//! Resolved once at startup from built-in defaults, an optional `lovepack.toml`,
//! the environment and CLI overrides (in increasing precedence), then passed
//! down to every pipeline stage.

use crate::constants::{
    AUX_DIR_PLACEHOLDER, DEFAULT_AUX_DIR, DEFAULT_BUILD_DIR, DEFAULT_COMPILER_ARGS,
    DEFAULT_COMPILER_PROGRAM, DEFAULT_COMPILER_TIMEOUT_SECS, DEFAULT_HOST_APP,
    DEFAULT_INCLUDE_PATTERN, DEFAULT_POLL_INTERVAL_MS, DEPLOY_DIR_ENV, LOVEPACK_CONFIG_FILE,
};
use crate::error::{BundleError, BundleResult};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// External compiler invocation for auxiliary scripts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Program to run (resolved through PATH).
    pub program: String,

    /// Arguments; `${aux_dir}` is replaced with the absolute auxiliary directory.
    pub args: Vec<String>,

    /// Bound on one invocation including output detection.
    pub timeout_secs: u64,

    /// Upper bound of the backoff while polling for compiler output.
    pub poll_interval_ms: u64,
}

/// Contents of `lovepack.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub include: Option<String>,
    pub build_dir: Option<PathBuf>,
    pub aux_dir: Option<PathBuf>,
    pub deploy_dir: Option<PathBuf>,
    pub host_app: Option<String>,
    pub honor_match_indent: Option<bool>,
    pub compiler: Option<CompilerConfig>,
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub deploy_dir: Option<PathBuf>,
    pub compiler_timeout_secs: Option<u64>,
}

/// Fully resolved configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root (holds package.json).
    pub project_dir: PathBuf,

    /// Glob (relative to the project root) selecting scanned sources.
    pub include: String,

    /// Compiled build tree copied verbatim into the deploy root.
    pub build_dir: PathBuf,

    /// Auxiliary scripts directory.
    pub aux_dir: PathBuf,

    /// Explicit deploy root; platform default when absent.
    pub deploy_dir: Option<PathBuf>,

    /// Host application name used in the platform default.
    pub host_app: String,

    /// Emit the scanned `match_indent` instead of the fixed `true`.
    pub honor_match_indent: bool,

    /// Auxiliary compiler invocation.
    pub compiler: CompilerConfig,
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMPILER_PROGRAM.to_string(),
            args: DEFAULT_COMPILER_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_COMPILER_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CompilerConfig {
    /// Arguments with `${aux_dir}` substituted.
    pub fn resolved_args(&self, aux_dir: &Path) -> Vec<String> {
        let aux = aux_dir.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(AUX_DIR_PLACEHOLDER, &aux))
            .collect()
    }

    /// Invocation bound as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ConfigFile {
    /// Read `lovepack.toml` from the project root, if present.
    pub fn load(project_dir: &Path) -> BundleResult<Option<Self>> {
        let path = project_dir.join(LOVEPACK_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let file = toml::from_str(&content).map_err(|e| {
            BundleError::ConfigParseError(format!("{}: {}", LOVEPACK_CONFIG_FILE, e))
        })?;
        Ok(Some(file))
    }
}

impl BuildConfig {
    /// Resolve configuration for a project from all sources.
    pub fn load(project_dir: &Path, overrides: &ConfigOverrides) -> BundleResult<Self> {
        let file = ConfigFile::load(project_dir)?;
        let env_deploy_dir = std::env::var(DEPLOY_DIR_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Ok(Self::from_sources(
            project_dir,
            file.unwrap_or_default(),
            env_deploy_dir,
            overrides,
        ))
    }

    /// Merge already-read sources. Later sources win.
    pub fn from_sources(
        project_dir: &Path,
        file: ConfigFile,
        env_deploy_dir: Option<PathBuf>,
        overrides: &ConfigOverrides,
    ) -> Self {
        let mut compiler = file.compiler.unwrap_or_default();
        if let Some(secs) = overrides.compiler_timeout_secs {
            compiler.timeout_secs = secs;
        }

        let deploy_dir = overrides
            .deploy_dir
            .clone()
            .or(env_deploy_dir)
            .or(file.deploy_dir)
            .map(|p| project_dir.join(p));

        Self {
            project_dir: project_dir.to_path_buf(),
            include: file
                .include
                .unwrap_or_else(|| DEFAULT_INCLUDE_PATTERN.to_string()),
            build_dir: project_dir.join(
                file.build_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)),
            ),
            aux_dir: project_dir.join(
                file.aux_dir
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_AUX_DIR)),
            ),
            deploy_dir,
            host_app: file
                .host_app
                .unwrap_or_else(|| DEFAULT_HOST_APP.to_string()),
            honor_match_indent: file.honor_match_indent.unwrap_or(false),
            compiler,
        }
    }

    /// Deploy root for a mod: the explicit override or the platform default.
    ///
    /// The root is cleared before every deployment, so it must not be the
    /// project, the build tree or the auxiliary directory, nor contain them.
    pub fn resolve_deploy_root(&self, mod_name: &str) -> BundleResult<PathBuf> {
        let root = match &self.deploy_dir {
            Some(dir) => dir.clone(),
            None => platform_deploy_root(&self.host_app, mod_name)?,
        };
        self.check_deploy_root(&root)?;
        Ok(root)
    }

    fn check_deploy_root(&self, root: &Path) -> BundleResult<()> {
        let unsafe_root = |reason: String| BundleError::UnsafeDeployRoot {
            root: root.to_path_buf(),
            reason,
        };

        let protected = [
            ("project directory", &self.project_dir),
            ("build directory", &self.build_dir),
            ("auxiliary directory", &self.aux_dir),
        ];
        for (label, dir) in protected {
            if overlaps(root, dir, |r, d| d.starts_with(r)) {
                return Err(unsafe_root(format!(
                    "it is or contains the {} {}",
                    label,
                    dir.display()
                )));
            }
        }

        if overlaps(root, &self.build_dir, |r, b| r.starts_with(b)) {
            return Err(unsafe_root(format!(
                "it lies inside the build directory {}",
                self.build_dir.display()
            )));
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Platform default mods directory for `host_app`, joined with the mod name.
pub fn platform_deploy_root(host_app: &str, mod_name: &str) -> BundleResult<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").map(PathBuf::from).or_else(|_| {
            dirs::config_dir().ok_or_else(|| {
                BundleError::Generic("Could not determine config directory".to_string())
            })
        })?;
        Ok(appdata.join(host_app).join("Mods").join(mod_name))
    }
    #[cfg(target_os = "macos")]
    {
        let home = dirs::home_dir().ok_or_else(|| {
            BundleError::Generic("Could not determine home directory".to_string())
        })?;
        Ok(home
            .join("Library")
            .join("Application Support")
            .join(host_app)
            .join("Mods")
            .join(mod_name))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let _ = (host_app, mod_name);
        Err(BundleError::UnsupportedPlatform(format!(
            "no default mods directory on {}; set {} or pass --deploy-dir",
            std::env::consts::OS,
            DEPLOY_DIR_ENV
        )))
    }
}

/// Lexically normalize a path: make it absolute, drop `.` and fold `..`.
fn normalize(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Apply `test` to the lexical forms of both paths and, when both exist, to
/// their canonical forms too.
fn overlaps(a: &Path, b: &Path, test: impl Fn(&Path, &Path) -> bool) -> bool {
    if test(&normalize(a), &normalize(b)) {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => test(&a, &b),
        _ => false,
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
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig::from_sources(
            dir.path(),
            ConfigFile::default(),
            None,
            &ConfigOverrides::default(),
        );

        assert_eq!(config.include, "src/**/*.ts");
        assert_eq!(config.build_dir, dir.path().join("build"));
        assert_eq!(config.aux_dir, dir.path().join("extra_lua"));
        assert_eq!(config.host_app, "Balatro");
        assert!(!config.honor_match_indent);
        assert!(config.deploy_dir.is_none());
        assert_eq!(config.compiler, CompilerConfig::default());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("lovepack.toml"),
            r#"
include = "lib/**/*.ts"
build_dir = "out"
honor_match_indent = true

[compiler]
program = "tstl"
timeout_secs = 5
"#,
        )
        .unwrap();

        let config = BuildConfig::load(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.include, "lib/**/*.ts");
        assert_eq!(config.build_dir, dir.path().join("out"));
        assert!(config.honor_match_indent);
        assert_eq!(config.compiler.program, "tstl");
        assert_eq!(config.compiler.timeout_secs, 5);
        // Unset compiler keys keep their defaults.
        assert_eq!(config.compiler.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lovepack.toml"), "bogus = 1\n").unwrap();
        let result = BuildConfig::load(dir.path(), &ConfigOverrides::default());
        assert!(matches!(result, Err(BundleError::ConfigParseError(_))));
    }

    #[test]
    fn test_deploy_dir_precedence() {
        let dir = TempDir::new().unwrap();
        let file = ConfigFile {
            deploy_dir: Some(PathBuf::from("/from/file")),
            ..Default::default()
        };

        let config = BuildConfig::from_sources(
            dir.path(),
            file.clone(),
            Some(PathBuf::from("/from/env")),
            &ConfigOverrides::default(),
        );
        assert_eq!(config.deploy_dir, Some(PathBuf::from("/from/env")));

        let overrides = ConfigOverrides {
            deploy_dir: Some(PathBuf::from("/from/cli")),
            compiler_timeout_secs: Some(3),
        };
        let config = BuildConfig::from_sources(
            dir.path(),
            file,
            Some(PathBuf::from("/from/env")),
            &overrides,
        );
        assert_eq!(config.deploy_dir, Some(PathBuf::from("/from/cli")));
        assert_eq!(config.compiler.timeout_secs, 3);
        assert_eq!(
            config.resolve_deploy_root("my-mod").unwrap(),
            PathBuf::from("/from/cli")
        );
    }

    fn config_with_deploy(dir: &Path, deploy: &str) -> BuildConfig {
        let file = ConfigFile {
            deploy_dir: Some(PathBuf::from(deploy)),
            ..Default::default()
        };
        BuildConfig::from_sources(dir, file, None, &ConfigOverrides::default())
    }

    #[test]
    fn test_deploy_root_rejects_project_and_ancestors() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("my-mod");
        std::fs::create_dir_all(project.join("build")).unwrap();

        for deploy in ["", ".", "..", "./build", "build/out", "extra_lua"] {
            let config = config_with_deploy(&project, deploy);
            let result = config.resolve_deploy_root("my-mod");
            assert!(
                matches!(result, Err(BundleError::UnsafeDeployRoot { .. })),
                "{:?} should be rejected, got {:?}",
                deploy,
                result
            );
        }

        let cli = ConfigOverrides {
            deploy_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let config =
            BuildConfig::from_sources(&project, ConfigFile::default(), None, &cli);
        assert!(config.resolve_deploy_root("my-mod").is_err());
    }

    #[test]
    fn test_deploy_root_allows_siblings_and_subdirs() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("my-mod");
        std::fs::create_dir_all(&project).unwrap();

        let config = config_with_deploy(&project, "out");
        assert_eq!(
            config.resolve_deploy_root("my-mod").unwrap(),
            project.join("out")
        );

        let config = config_with_deploy(&project, "../mods/my-mod");
        assert!(config.resolve_deploy_root("my-mod").is_ok());
    }

    #[test]
    fn test_normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
    }

    #[test]
    fn test_resolved_args() {
        let compiler = CompilerConfig::default();
        let args = compiler.resolved_args(Path::new("/proj/extra_lua"));
        assert_eq!(args, vec!["tstl", "-p", "/proj/extra_lua/tsconfig.json"]);
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn test_unsupported_platform_without_override() {
        let result = platform_deploy_root("Balatro", "my-mod");
        assert!(matches!(result, Err(BundleError::UnsupportedPlatform(_))));
    }
}
