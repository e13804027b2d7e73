//! Lovely manifest rendering.
//!
//! Manifests are assembled as text in the exact layout the Lovely loader
//! reads. Payloads are written verbatim between `"""` delimiters, unescaped.

use crate::constants::{EXTRA_LUA_DIR, HOST_ENTRY_FILE, MANIFEST_VERSION};
use crate::scan::PatchDescriptor;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Options for rendering the primary manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Emit each descriptor's scanned `match_indent` instead of `true`.
    pub honor_match_indent: bool,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// The fixed `[manifest]` header.
pub fn manifest_header() -> String {
    format!("[manifest]\nversion = \"{}\"", MANIFEST_VERSION)
}

/// Render `patches.toml` from descriptors, one `[[patches]]` block each, in order.
pub fn render_patches(descriptors: &[PatchDescriptor], options: &RenderOptions) -> String {
    let mut out = manifest_header();

    for descriptor in descriptors {
        let payload = descriptor.payload();
        if payload.contains("\"\"\"") {
            tracing::warn!(
                function = %descriptor.function_name,
                file = %descriptor.source.display(),
                "payload contains the manifest's string delimiter; output will not parse"
            );
        }

        let match_indent = !options.honor_match_indent || descriptor.match_indent;

        out.push_str("\n\n[[patches]]");
        out.push_str(&format!("\n[patches.{}]", descriptor.patch_type));
        out.push_str(&format!("\ntarget = \"{}\"", descriptor.target));
        out.push_str(&format!("\npattern = \"{}\"", descriptor.pattern));
        out.push_str(&format!("\nposition = \"{}\"", descriptor.position));
        out.push_str(&format!("\nmatch_indent = {}", match_indent));
        out.push_str(&format!("\npayload = \"\"\"{}\"\"\"\n", payload));
    }

    out
}

/// Render `extra_lua.toml`, appending each deployed script to the host entry file.
///
/// `files` are file names inside the deployed auxiliary directory, in
/// discovery order.
pub fn render_extra_lua(files: &[String]) -> String {
    let blocks: Vec<String> = files
        .iter()
        .map(|file| {
            format!(
                "[[patches]]\n[patches.copy]\ntarget=\"{}\"\nsources=[\"{}/{}\"]\nposition=\"append\"\n",
                HOST_ENTRY_FILE, EXTRA_LUA_DIR, file
            )
        })
        .collect();

    format!("{}\n\n{}", manifest_header(), blocks.join("\n"))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
