//! `lovepack` library.
//!
//! Turns a TypeScript mod project into a deployable Lovely mod: JSDoc patch
//! annotations become `lovely/patches.toml`, `package.json` becomes the mod
//! metadata, and the compiled build tree plus auxiliary scripts are copied
//! into the host's Mods directory.

pub mod commands;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod error;
pub mod handlers;
pub mod manifest;
pub mod pipeline;
pub mod project;
pub mod report;
pub mod scan;
pub mod transpile;

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use commands::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use manifest::*;
pub use pipeline::*;
pub use project::*;
pub use report::*;
pub use scan::*;
