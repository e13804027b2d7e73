//! Auxiliary script transpiler.
//!
//! Compiles each script in the auxiliary directory with an external
//! compiler, optionally embeds the result as a Lua string, and deploys it
//! under `extra_lua/` together with a manifest that appends every deployed
//! script to the host entry file.

use crate::config::{BuildConfig, CompilerConfig};
use crate::constants::{
    COMPILE_TO_STRING_SENTINEL, DECLARATION_SUFFIX, EXTRA_LUA_DIR, EXTRA_LUA_MANIFEST_FILE,
    LOVELY_DIR, SOURCE_EXT, TARGET_EXT,
};
use crate::deploy;
use crate::error::{BundleError, BundleResult};
use crate::manifest::render_extra_lua;
use crate::project::ModMetadata;
use crate::report::{StepOutcome, StepReport};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime};
use tokio::process::Command;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Clock slack allowed when deciding whether an output was written by this invocation.
const MTIME_SLACK: Duration = Duration::from_secs(2);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One auxiliary script to compile and deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxScriptJob {
    /// Script file name, e.g. `util.ts`.
    pub file_name: String,

    /// Script path inside the auxiliary directory.
    pub source: PathBuf,

    /// Where the compiler writes its output (`<aux_dir>/<stem>.lua`).
    pub output: PathBuf,

    /// Final location under `<deploy>/extra_lua/`.
    pub deploy_path: PathBuf,
}

/// What a transpile pass did.
#[derive(Debug, Clone, Default)]
pub struct TranspileSummary {
    /// One step per job, plus the manifest write when scripts were deployed.
    pub steps: Vec<StepReport>,

    /// Deployed file names in job order.
    pub deployed: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl AuxScriptJob {
    /// Script name without its extension.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(&format!(".{}", SOURCE_EXT))
            .unwrap_or(&self.file_name)
    }

    /// Deployed file name, e.g. `util.lua`.
    pub fn target_name(&self) -> String {
        format!("{}.{}", self.stem(), TARGET_EXT)
    }

    /// Whether the script's first line carries the string-embedding sentinel.
    ///
    /// Only the first line is read.
    pub fn compile_to_string(&self) -> BundleResult<bool> {
        let mut reader = BufReader::new(File::open(&self.source)?);
        let mut first_line = Vec::new();
        reader.read_until(b'\n', &mut first_line)?;
        Ok(first_line.starts_with(COMPILE_TO_STRING_SENTINEL.as_bytes()))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Discover, compile and deploy every auxiliary script, then write the
/// auxiliary manifest when at least one script made it.
pub async fn transpile_aux_scripts(
    config: &BuildConfig,
    deploy_root: &Path,
    metadata: &ModMetadata,
) -> TranspileSummary {
    let jobs = match discover_jobs(&config.aux_dir, deploy_root) {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::warn!(dir = %config.aux_dir.display(), error = %e, "could not list auxiliary scripts");
            return TranspileSummary {
                steps: vec![StepReport {
                    name: "aux".to_string(),
                    outcome: StepOutcome::failed(e),
                }],
                deployed: Vec::new(),
            };
        }
    };

    let mut summary = run_jobs(&jobs, config, metadata).await;

    if !summary.deployed.is_empty() {
        let path = deploy_root.join(LOVELY_DIR).join(EXTRA_LUA_MANIFEST_FILE);
        let outcome = deploy::write_file(&path, &render_extra_lua(&summary.deployed));
        summary.steps.push(StepReport {
            name: EXTRA_LUA_MANIFEST_FILE.to_string(),
            outcome,
        });
    }

    summary
}

/// List eligible scripts in `aux_dir`, sorted by file name.
///
/// Eligible means a regular, non-hidden `.ts` file that is not a `.d.ts`
/// declaration. A missing directory yields no jobs.
pub fn discover_jobs(aux_dir: &Path, deploy_root: &Path) -> BundleResult<Vec<AuxScriptJob>> {
    if !aux_dir.is_dir() {
        tracing::debug!(dir = %aux_dir.display(), "no auxiliary directory");
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(aux_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let eligible = !name.starts_with('.')
            && name.ends_with(&format!(".{}", SOURCE_EXT))
            && !name.ends_with(DECLARATION_SUFFIX)
            && entry.path().is_file();
        if eligible {
            names.push(name);
        }
    }
    names.sort();

    let deploy_dir = deploy_root.join(EXTRA_LUA_DIR);
    let jobs = names
        .into_iter()
        .map(|file_name| {
            let mut job = AuxScriptJob {
                source: aux_dir.join(&file_name),
                file_name,
                output: PathBuf::new(),
                deploy_path: PathBuf::new(),
            };
            job.output = aux_dir.join(job.target_name());
            job.deploy_path = deploy_dir.join(job.target_name());
            job
        })
        .collect();

    Ok(jobs)
}

/// Run jobs one after another. A failing job is recorded and the rest continue.
pub async fn run_jobs(
    jobs: &[AuxScriptJob],
    config: &BuildConfig,
    metadata: &ModMetadata,
) -> TranspileSummary {
    let mut summary = TranspileSummary::default();

    for job in jobs {
        let name = format!("aux:{}", job.file_name);
        match run_job(job, config, &metadata.prefix).await {
            Ok(deployed) => {
                tracing::info!(file = %job.file_name, deployed = %deployed, "auxiliary script deployed");
                summary.deployed.push(deployed);
                summary.steps.push(StepReport {
                    name,
                    outcome: StepOutcome::Success,
                });
            }
            Err(e) => {
                tracing::warn!(file = %job.file_name, error = %e, "auxiliary script failed");
                summary.steps.push(StepReport {
                    name,
                    outcome: StepOutcome::failed(e),
                });
            }
        }
    }

    // Each invocation compiles the whole project, so earlier jobs' outputs
    // reappear in the staging directory.
    for job in jobs {
        if job.output.is_file() && std::fs::remove_file(&job.output).is_ok() {
            tracing::debug!(file = %job.output.display(), "removed leftover staging output");
        }
    }

    summary
}

/// Compile, optionally wrap, then deploy one script. Returns the deployed file name.
async fn run_job(job: &AuxScriptJob, config: &BuildConfig, prefix: &str) -> BundleResult<String> {
    let started_at = SystemTime::now();
    let deadline = Instant::now() + config.compiler.timeout();
    let aux_dir = std::path::absolute(&config.aux_dir)?;
    let compile_to_string = job.compile_to_string()?;

    invoke_compiler(job, &config.compiler, &config.project_dir, &aux_dir, deadline).await?;
    wait_for_output(job, &config.compiler, started_at, deadline).await?;

    let missing = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::NotFound => BundleError::CompilerOutputMissing {
            file: job.file_name.clone(),
            path: job.output.clone(),
        },
        _ => e.into(),
    };

    if compile_to_string {
        let body = std::fs::read_to_string(&job.output).map_err(missing)?;
        std::fs::write(&job.output, wrap_as_string(prefix, job.stem(), &body))?;
    }

    if let Some(parent) = job.deploy_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&job.output, &job.deploy_path).map_err(missing)?;
    std::fs::remove_file(&job.output)?;

    Ok(job.target_name())
}

/// Run the compiler once, bounded by the remaining time before `deadline`.
async fn invoke_compiler(
    job: &AuxScriptJob,
    compiler: &CompilerConfig,
    working_dir: &Path,
    aux_dir: &Path,
    deadline: Instant,
) -> BundleResult<()> {
    let args = compiler.resolved_args(aux_dir);
    tracing::debug!(file = %job.file_name, program = %compiler.program, ?args, "invoking compiler");

    let child = Command::new(&compiler.program)
        .args(&args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BundleError::CompilerSpawn {
            program: compiler.program.clone(),
            source,
        })?;

    let remaining = deadline.saturating_duration_since(Instant::now());
    let output = tokio::time::timeout(remaining, child.wait_with_output())
        .await
        .map_err(|_| BundleError::CompilerTimedOut {
            file: job.file_name.clone(),
            secs: compiler.timeout_secs,
        })??;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        tracing::info!(file = %job.file_name, "{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        tracing::warn!(file = %job.file_name, "{}", stderr.trim_end());
    }

    if !output.status.success() {
        return Err(BundleError::CompilerFailed {
            file: job.file_name.clone(),
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}

/// Poll for the job's output until it exists and was written after `started_at`.
///
/// Backoff doubles from 10ms up to the configured poll interval.
async fn wait_for_output(
    job: &AuxScriptJob,
    compiler: &CompilerConfig,
    started_at: SystemTime,
    deadline: Instant,
) -> BundleResult<()> {
    let threshold = started_at.checked_sub(MTIME_SLACK).unwrap_or(started_at);
    let mut attempts: u32 = 0;

    loop {
        let fresh = std::fs::metadata(&job.output)
            .and_then(|m| m.modified())
            .map(|modified| modified >= threshold)
            .unwrap_or(false);
        if fresh {
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(BundleError::CompilerTimedOut {
                file: job.file_name.clone(),
                secs: compiler.timeout_secs,
            });
        }

        let delay_ms = (10 * 2u64.pow(attempts.min(6))).min(compiler.poll_interval_ms.max(1));
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempts += 1;
    }
}

/// Embed compiled Lua as a global string: `<PREFIX>_<STEM>_CODE_STR = [=[...]=]`.
///
/// The long-bracket level is raised until the closing bracket does not occur
/// in `body`.
pub fn wrap_as_string(prefix: &str, stem: &str, body: &str) -> String {
    let mut level = 1;
    while body.contains(&format!("]{}]", "=".repeat(level))) {
        level += 1;
    }
    let eq = "=".repeat(level);

    format!(
        "{}_{}_CODE_STR = [{eq}[\n{}\n]{eq}]\n",
        to_identifier(prefix),
        to_identifier(stem),
        body
    )
}

/// Uppercase, with every character outside `[A-Za-z0-9_]` replaced by `_`.
fn to_identifier(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
