//! Minimal JSDoc block tag parser.
//!
//! Follows the TypeScript compiler's tag rules closely enough for custom tags:
//! a tag begins at `@name` when the `@` sits at the start of a comment line or
//! follows whitespace. Its text runs until the next tag and is trimmed.

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One `@tag text` entry of a JSDoc block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsDocTag {
    /// Tag name without the `@`.
    pub name: String,

    /// Comment text, trimmed; empty when the tag carries none.
    pub text: String,
}

struct TagBuilder {
    name: String,
    lines: Vec<String>,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns true when a block comment body (text between `/*` and `*/`) is JSDoc.
pub fn is_jsdoc(comment_text: &str) -> bool {
    comment_text.starts_with('*')
}

/// Parse the tags of a JSDoc block.
///
/// `comment_text` is the body between `/*` and `*/`, so it still carries the
/// second `*` of the opener. Text before the first tag is ignored.
pub fn parse_jsdoc(comment_text: &str) -> Vec<JsDocTag> {
    let body = comment_text.strip_prefix('*').unwrap_or(comment_text);

    let mut tags = Vec::new();
    let mut current: Option<TagBuilder> = None;

    for raw_line in body.lines() {
        let mut rest = strip_margin(raw_line);

        // A tag started on an earlier line continues on this one.
        if let Some(builder) = current.as_mut() {
            builder.lines.push(String::new());
        }

        while let Some(at) = find_tag_start(rest) {
            if let Some(builder) = current.as_mut() {
                append(builder, &rest[..at]);
            }
            if let Some(done) = current.take() {
                tags.push(done.finish());
            }

            let after = &rest[at + 1..];
            let name_len = after
                .find(|c: char| !is_tag_char(c))
                .unwrap_or(after.len());
            current = Some(TagBuilder {
                name: after[..name_len].to_string(),
                lines: vec![String::new()],
            });
            rest = &after[name_len..];
        }

        if let Some(builder) = current.as_mut() {
            append(builder, rest);
        }
    }

    if let Some(done) = current.take() {
        tags.push(done.finish());
    }

    tags
}

/// Drop leading whitespace and the `*` gutter of a comment line.
fn strip_margin(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed.strip_prefix('*').unwrap_or(trimmed)
}

/// Byte offset of the next `@` that opens a tag.
fn find_tag_start(s: &str) -> Option<usize> {
    let mut prev_ws = true;
    for (i, c) in s.char_indices() {
        if c == '@' && prev_ws {
            let next = s[i + 1..].chars().next();
            if next.is_some_and(|n| n.is_alphabetic() || n == '_') {
                return Some(i);
            }
        }
        prev_ws = c.is_whitespace();
    }
    None
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

fn append(builder: &mut TagBuilder, segment: &str) {
    if let Some(last) = builder.lines.last_mut() {
        last.push_str(segment);
    }
}

impl TagBuilder {
    fn finish(self) -> JsDocTag {
        let lines: Vec<&str> = self.lines.iter().map(|l| l.trim()).collect();
        JsDocTag {
            name: self.name,
            text: lines.join("\n").trim().to_string(),
        }
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
    fn test_multiline_block() {
        let body = "*\n * Hooks into love.load.\n * @lovelyType pattern\n * @lovelyTarget game.lua\n * @lovelyPattern function love.load\n ";
        assert_eq!(
            parse_jsdoc(body),
            vec![
                tag("lovelyType", "pattern"),
                tag("lovelyTarget", "game.lua"),
                tag("lovelyPattern", "function love.load"),
            ]
        );
    }

    #[test]
    fn test_single_line_block() {
        assert_eq!(
            parse_jsdoc("* @lovelyType pattern "),
            vec![tag("lovelyType", "pattern")]
        );
    }

    #[test]
    fn test_empty_tag_text() {
        assert_eq!(
            parse_jsdoc("*\n * @lovelyCaptureLocal\n * @lovelyType copy\n "),
            vec![tag("lovelyCaptureLocal", ""), tag("lovelyType", "copy")]
        );
    }

    #[test]
    fn test_continuation_lines_join() {
        assert_eq!(
            parse_jsdoc("*\n * @lovelyPattern first\n *   second\n "),
            vec![tag("lovelyPattern", "first\nsecond")]
        );
    }

    #[test]
    fn test_inline_tag_after_whitespace() {
        assert_eq!(
            parse_jsdoc("* @lovelyType pattern @lovelyPosition at "),
            vec![tag("lovelyType", "pattern"), tag("lovelyPosition", "at")]
        );
    }

    #[test]
    fn test_at_without_whitespace_stays_text() {
        assert_eq!(
            parse_jsdoc("* @lovelyTarget user@host.lua "),
            vec![tag("lovelyTarget", "user@host.lua")]
        );
    }

    #[test]
    fn test_quotes_are_preserved() {
        assert_eq!(
            parse_jsdoc("* @lovelyPayloadPrefix \"local x = \" "),
            vec![tag("lovelyPayloadPrefix", "\"local x = \"")]
        );
    }

    #[test]
    fn test_is_jsdoc() {
        assert!(is_jsdoc("* docs "));
        assert!(!is_jsdoc(" plain block "));
    }
}
