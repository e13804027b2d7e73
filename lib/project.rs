//! Project configuration (package.json) and the derived mod metadata.

use crate::constants::{PROJECT_MANIFEST_FILE, TARGET_EXT};
use crate::error::{BundleError, BundleResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The subset of `package.json` the packager reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    /// Package name, doubles as the mod id.
    pub name: String,

    /// Human-readable mod name.
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,

    /// One author or many.
    #[serde(default)]
    pub author: Option<AuthorField>,

    /// Mod description.
    #[serde(default)]
    pub description: Option<String>,

    /// Mod version.
    #[serde(default)]
    pub version: Option<String>,

    /// Steamodded dependency list, passed through to the metadata untouched.
    #[serde(default)]
    pub smod_deps: Option<serde_json::Value>,

    /// Entry file in source form (e.g. `main.ts`).
    pub main: String,
}

/// `author` as npm allows it: a string, a list, or a person object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AuthorField {
    /// `"author": "Jane"`.
    One(String),
    /// `"author": ["Jane", "John"]`.
    Many(Vec<String>),
    /// `"author": { "name": "Jane", "email": "..." }`.
    Person { name: String },
}

/// Metadata document read by the host's mod loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModMetadata {
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Always a list, even when the project names a single author.
    pub author: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub prefix: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<serde_json::Value>,

    pub main_file: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ProjectManifest {
    /// Load `package.json` from a project directory.
    pub fn load(dir: &Path) -> BundleResult<Self> {
        let path = dir.join(PROJECT_MANIFEST_FILE);
        if !path.exists() {
            return Err(BundleError::ProjectNotFound(dir.to_path_buf()));
        }

        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    /// Parse `package.json` content.
    pub fn parse(content: &str) -> BundleResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| BundleError::InvalidProject(format!("{}: {}", PROJECT_MANIFEST_FILE, e)))
    }
}

impl AuthorField {
    /// Normalize to a list of author names.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            AuthorField::One(name) | AuthorField::Person { name } => vec![name],
            AuthorField::Many(names) => names,
        }
    }
}

impl ModMetadata {
    /// Derive metadata 1:1 from the project manifest.
    pub fn from_project(project: &ProjectManifest) -> Self {
        Self {
            id: project.name.clone(),
            name: project.display_name.clone(),
            author: project
                .author
                .clone()
                .map(AuthorField::into_vec)
                .unwrap_or_default(),
            description: project.description.clone(),
            prefix: mod_prefix(&project.name),
            version: project.version.clone(),
            dependencies: project.smod_deps.clone(),
            main_file: to_target_file(&project.main),
        }
    }

    /// File name of the metadata document inside the deploy root.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id)
    }

    /// Render as 2-space indented JSON (no trailing newline).
    pub fn render(&self) -> BundleResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Mod prefix: the package name with `-` replaced by `_`.
pub fn mod_prefix(name: &str) -> String {
    name.replace('-', "_")
}

/// Rewrite a trailing `.ts`/`.js` extension to the host-native `.lua`.
pub fn to_target_file(file: &str) -> String {
    match file
        .strip_suffix(".ts")
        .or_else(|| file.strip_suffix(".js"))
    {
        Some(stem) => format!("{}.{}", stem, TARGET_EXT),
        None => file.to_string(),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
