//! Patch descriptors extracted from annotated functions.

use super::jsdoc::JsDocTag;
use crate::constants::{
    TAG_CAPTURE_LOCAL, TAG_MATCH_INDENT, TAG_PATTERN, TAG_PAYLOAD_PREFIX, TAG_PAYLOAD_SUFFIX,
    TAG_POSITION, TAG_TARGET, TAG_TYPE,
};
use serde::Serialize;
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One function's patch intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDescriptor {
    /// Host file to patch (e.g. `game.lua`).
    pub target: String,

    /// Pattern locating the insertion point.
    pub pattern: String,

    /// Insertion keyword understood by the loader (before/after/at).
    pub position: String,

    /// Patch strategy section; never empty for an emitted descriptor.
    #[serde(rename = "type")]
    pub patch_type: String,

    /// Scanned indentation flag. Defaults to true.
    pub match_indent: bool,

    /// Captured locals, in tag order, duplicates kept.
    pub locals: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_suffix: Option<String>,

    /// Enclosing function name.
    pub function_name: String,

    /// Source file, relative to the project root when possible.
    pub source: PathBuf,

    /// 1-based line of the function declaration.
    pub line: usize,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PatchDescriptor {
    /// Build a descriptor from one JSDoc block.
    ///
    /// Returns `None` when the block never sets a non-empty patch type.
    pub fn from_tags(function_name: impl Into<String>, tags: &[JsDocTag]) -> Option<Self> {
        let mut descriptor = Self {
            target: String::new(),
            pattern: String::new(),
            position: String::new(),
            patch_type: String::new(),
            match_indent: true,
            locals: Vec::new(),
            payload_prefix: None,
            payload_suffix: None,
            function_name: function_name.into(),
            source: PathBuf::new(),
            line: 0,
        };

        for tag in tags {
            match tag.name.as_str() {
                TAG_TARGET => descriptor.target = tag.text.clone(),
                TAG_PATTERN => descriptor.pattern = tag.text.clone(),
                TAG_POSITION => descriptor.position = tag.text.clone(),
                TAG_TYPE => descriptor.patch_type = tag.text.clone(),
                TAG_MATCH_INDENT => descriptor.match_indent = tag.text == "true",
                TAG_CAPTURE_LOCAL => descriptor.locals.push(tag.text.clone()),
                TAG_PAYLOAD_PREFIX => descriptor.payload_prefix = Some(strip_quotes(&tag.text)),
                TAG_PAYLOAD_SUFFIX => descriptor.payload_suffix = Some(tag.text.clone()),
                _ => {}
            }
        }

        (!descriptor.patch_type.is_empty()).then_some(descriptor)
    }

    /// Attach the declaration's location.
    pub fn located(mut self, source: impl Into<PathBuf>, line: usize) -> Self {
        self.source = source.into();
        self.line = line;
        self
    }

    /// Generated payload: `prefix + name(locals) + suffix`.
    pub fn payload(&self) -> String {
        format!(
            "{}{}({}){}",
            self.payload_prefix.as_deref().unwrap_or(""),
            self.function_name,
            self.locals.join(", "),
            self.payload_suffix.as_deref().unwrap_or("")
        )
    }

    /// Loader fields left empty by the annotation.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.target.is_empty() {
            missing.push("target");
        }
        if self.pattern.is_empty() {
            missing.push("pattern");
        }
        if self.position.is_empty() {
            missing.push("position");
        }
        missing
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Strip one pair of surrounding double quotes (`"foo"` → `foo`, `"` → empty).
fn strip_quotes(text: &str) -> String {
    if text.starts_with('"') && text.ends_with('"') {
        if text.len() >= 2 {
            text[1..text.len() - 1].to_string()
        } else {
            String::new()
        }
    } else {
        text.to_string()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, text: &str) -> JsDocTag {
        JsDocTag {
            name: name.into(),
            text: text.into(),
        }
    }

    #[test]
    fn test_payload_shape() {
        let d = PatchDescriptor::from_tags(
            "onLoad",
            &[
                tag("lovelyType", "pattern"),
                tag("lovelyCaptureLocal", "self"),
                tag("lovelyCaptureLocal", "dt"),
                tag("lovelyPayloadPrefix", "local r = "),
                tag("lovelyPayloadSuffix", " or r"),
            ],
        )
        .unwrap();
        assert_eq!(d.payload(), "local r = onLoad(self, dt) or r");
    }

    #[test]
    fn test_no_type_no_descriptor() {
        assert!(PatchDescriptor::from_tags("f", &[tag("lovelyTarget", "game.lua")]).is_none());
        assert!(PatchDescriptor::from_tags("f", &[tag("lovelyType", "")]).is_none());
    }

    #[test]
    fn test_last_write_wins_and_locals_accumulate() {
        let d = PatchDescriptor::from_tags(
            "f",
            &[
                tag("lovelyType", "regex"),
                tag("lovelyType", "pattern"),
                tag("lovelyCaptureLocal", "a"),
                tag("lovelyCaptureLocal", "a"),
                tag("lovelyUnknown", "x"),
            ],
        )
        .unwrap();
        assert_eq!(d.patch_type, "pattern");
        assert_eq!(d.locals, vec!["a", "a"]);
    }

    #[test]
    fn test_prefix_quote_stripping() {
        let quoted =
            PatchDescriptor::from_tags("f", &[tag("lovelyType", "p"), tag("lovelyPayloadPrefix", "\"foo\"")])
                .unwrap();
        assert_eq!(quoted.payload_prefix.as_deref(), Some("foo"));

        let bare =
            PatchDescriptor::from_tags("f", &[tag("lovelyType", "p"), tag("lovelyPayloadPrefix", "foo")])
                .unwrap();
        assert_eq!(bare.payload_prefix.as_deref(), Some("foo"));

        // Suffix quotes are kept.
        let suffix =
            PatchDescriptor::from_tags("f", &[tag("lovelyType", "p"), tag("lovelyPayloadSuffix", "\"x\"")])
                .unwrap();
        assert_eq!(suffix.payload(), "f()\"x\"");
    }

    #[test]
    fn test_match_indent_parsing() {
        let d = PatchDescriptor::from_tags("f", &[tag("lovelyType", "p")]).unwrap();
        assert!(d.match_indent);

        let d = PatchDescriptor::from_tags(
            "f",
            &[tag("lovelyType", "p"), tag("lovelyMatchIndent", "false")],
        )
        .unwrap();
        assert!(!d.match_indent);

        let d = PatchDescriptor::from_tags(
            "f",
            &[tag("lovelyType", "p"), tag("lovelyMatchIndent", "yes")],
        )
        .unwrap();
        assert!(!d.match_indent);
    }

    #[test]
    fn test_missing_fields() {
        let d = PatchDescriptor::from_tags(
            "f",
            &[tag("lovelyType", "p"), tag("lovelyTarget", "game.lua")],
        )
        .unwrap();
        assert_eq!(d.missing_fields(), vec!["pattern", "position"]);
    }

    #[test]
    fn test_strip_quotes_edge_cases() {
        assert_eq!(strip_quotes("\""), "");
        assert_eq!(strip_quotes("\"\""), "");
        assert_eq!(strip_quotes("\"a"), "\"a");
    }
}
