//! Constants for lovepack.
//!
//! This module contains all file, directory and annotation constants.
//! Review these to ensure they match the Lovely loader you deploy against.

//--------------------------------------------------------------------------------------------------
// Constants: Project Layout
//--------------------------------------------------------------------------------------------------

/// Project configuration file (npm package manifest).
pub const PROJECT_MANIFEST_FILE: &str = "package.json";

/// Optional packager configuration file.
pub const LOVEPACK_CONFIG_FILE: &str = "lovepack.toml";

/// Default glob for source modules scanned for patch annotations.
pub const DEFAULT_INCLUDE_PATTERN: &str = "src/**/*.ts";

/// Default directory holding the primary compiler's output.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Default directory holding auxiliary scripts.
pub const DEFAULT_AUX_DIR: &str = "extra_lua";

/// Default host application name (used for the Mods directory).
pub const DEFAULT_HOST_APP: &str = "Balatro";

//--------------------------------------------------------------------------------------------------
// Constants: Deployment Layout
//--------------------------------------------------------------------------------------------------

/// Directory inside the deploy root holding Lovely manifests.
pub const LOVELY_DIR: &str = "lovely";

/// Reserved source directory inside the deploy root (created empty).
pub const SRC_DIR: &str = "src";

/// Primary patch manifest file name.
pub const PATCHES_FILE: &str = "patches.toml";

/// Auxiliary manifest file name.
pub const EXTRA_LUA_MANIFEST_FILE: &str = "extra_lua.toml";

/// Deployed auxiliary scripts directory (also the `sources` prefix in manifests).
pub const EXTRA_LUA_DIR: &str = "extra_lua";

/// Host entry file auxiliary scripts are appended to.
pub const HOST_ENTRY_FILE: &str = "main.lua";

/// Version pinned in every manifest header.
pub const MANIFEST_VERSION: &str = "1.0.0";

//--------------------------------------------------------------------------------------------------
// Constants: Extensions
//--------------------------------------------------------------------------------------------------

/// Source scripting extension.
pub const SOURCE_EXT: &str = "ts";

/// Declaration-only file suffix (never compiled).
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Host-native scripting extension.
pub const TARGET_EXT: &str = "lua";

//--------------------------------------------------------------------------------------------------
// Constants: Annotations
//--------------------------------------------------------------------------------------------------

/// JSDoc tag naming the host file to patch.
pub const TAG_TARGET: &str = "lovelyTarget";

/// JSDoc tag holding the pattern used to locate the insertion point.
pub const TAG_PATTERN: &str = "lovelyPattern";

/// JSDoc tag holding the insertion position (before/after/at).
pub const TAG_POSITION: &str = "lovelyPosition";

/// JSDoc tag selecting the patch strategy section.
pub const TAG_TYPE: &str = "lovelyType";

/// JSDoc tag for indentation matching.
pub const TAG_MATCH_INDENT: &str = "lovelyMatchIndent";

/// JSDoc tag capturing an enclosing-scope local (repeatable).
pub const TAG_CAPTURE_LOCAL: &str = "lovelyCaptureLocal";

/// JSDoc tag prepended to the generated call.
pub const TAG_PAYLOAD_PREFIX: &str = "lovelyPayloadPrefix";

/// JSDoc tag appended to the generated call.
pub const TAG_PAYLOAD_SUFFIX: &str = "lovelyPayloadSuffix";

/// First-line marker requesting string-embedding mode for an auxiliary script.
pub const COMPILE_TO_STRING_SENTINEL: &str = "// $love2d-compile-to-string$ //";

//--------------------------------------------------------------------------------------------------
// Constants: Environment & Compiler
//--------------------------------------------------------------------------------------------------

/// Environment variable overriding the deploy root.
pub const DEPLOY_DIR_ENV: &str = "LOVEPACK_DEPLOY_DIR";

/// Placeholder substituted with the absolute auxiliary directory in compiler args.
pub const AUX_DIR_PLACEHOLDER: &str = "${aux_dir}";

/// Default compiler program.
pub const DEFAULT_COMPILER_PROGRAM: &str = "npx";

/// Default compiler arguments.
pub const DEFAULT_COMPILER_ARGS: &[&str] = &["tstl", "-p", "${aux_dir}/tsconfig.json"];

/// Default bound on a single compiler invocation, in seconds.
pub const DEFAULT_COMPILER_TIMEOUT_SECS: u64 = 120;

/// Upper bound on the output polling interval, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
