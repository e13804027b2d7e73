//! Annotation scanner.
//!
//! Walks the project's TypeScript sources and turns JSDoc-annotated top-level
//! functions into [`PatchDescriptor`]s, in file-then-declaration order.

mod descriptor;
mod jsdoc;


use crate::config::BuildConfig;
use crate::error::{BundleError, BundleResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use swc_common::comments::{CommentKind, Comments, SingleThreadedComments};
use swc_common::{BytePos, FileName, FilePathMapping, SourceMap, Spanned, sync::Lrc};
use swc_ecma_ast::{Decl, DefaultDecl, ExportDecl, ExportDefaultDecl, Module, ModuleDecl, ModuleItem, Stmt};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax, lexer::Lexer};

//--------------------------------------------------------------------------------------------------
// Re-Exports
//--------------------------------------------------------------------------------------------------

pub use descriptor::PatchDescriptor;
pub use jsdoc::{JsDocTag, is_jsdoc, parse_jsdoc};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Output of a project scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanResult {
    /// Descriptors in scan order.
    pub descriptors: Vec<PatchDescriptor>,

    /// Number of source files read and parsed.
    pub files_scanned: usize,

    /// Sources that could not be read or parsed.
    pub skipped: Vec<SkippedSource>,
}

/// A source file left out of the scan.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub reason: String,
}

/// A top-level function declaration and the positions its docs may attach to.
struct FunctionDecl {
    name: Option<String>,
    item_lo: BytePos,
    fn_lo: BytePos,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ScanResult {
    /// Descriptors leaving target, pattern or position empty.
    pub fn incomplete(&self) -> impl Iterator<Item = &PatchDescriptor> {
        self.descriptors
            .iter()
            .filter(|d| !d.missing_fields().is_empty())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Scan every source matched by the configured include pattern.
pub fn scan_project(config: &BuildConfig) -> BundleResult<ScanResult> {
    let sources = collect_sources(&config.project_dir, &config.include)?;
    let mut result = ScanResult::default();

    for path in sources {
        let relative = path
            .strip_prefix(&config.project_dir)
            .unwrap_or(&path)
            .to_path_buf();

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %relative.display(), error = %e, "skipping unreadable source");
                result.skipped.push(SkippedSource {
                    path: relative,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match scan_source(&relative, &text) {
            Ok(descriptors) => {
                result.files_scanned += 1;
                result.descriptors.extend(descriptors);
            }
            Err(e) => {
                tracing::warn!(file = %relative.display(), error = %e, "skipping unparsable source");
                result.skipped.push(SkippedSource {
                    path: relative,
                    reason: e.to_string(),
                });
            }
        }
    }

    for descriptor in result.incomplete() {
        tracing::warn!(
            file = %descriptor.source.display(),
            line = descriptor.line,
            function = %descriptor.function_name,
            missing = ?descriptor.missing_fields(),
            "patch annotation leaves loader fields empty"
        );
    }

    tracing::debug!(
        files = result.files_scanned,
        descriptors = result.descriptors.len(),
        "scan finished"
    );

    Ok(result)
}

/// Expand `include` under `project_dir`, returning regular files in sorted order.
pub fn collect_sources(project_dir: &Path, include: &str) -> BundleResult<Vec<PathBuf>> {
    let root = glob::Pattern::escape(&project_dir.to_string_lossy());
    let pattern = format!("{}/{}", root.trim_end_matches('/'), include);

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "unreadable path while expanding include pattern"),
        }
    }

    files.sort();
    Ok(files)
}

/// Extract descriptors from one TypeScript module.
///
/// `path` is used for diagnostics and recorded on each descriptor.
pub fn scan_source(path: &Path, source: &str) -> BundleResult<Vec<PatchDescriptor>> {
    let (module, comments, cm) = parse_with_comments(path, source)?;
    let mut descriptors = Vec::new();

    for decl in top_level_functions(&module) {
        let mut positions = vec![decl.item_lo];
        if decl.fn_lo != decl.item_lo {
            positions.push(decl.fn_lo);
        }

        let blocks: Vec<String> = positions
            .into_iter()
            .filter_map(|pos| comments.get_leading(pos))
            .flatten()
            .filter(|c| c.kind == CommentKind::Block && is_jsdoc(&c.text))
            .map(|c| c.text.to_string())
            .collect();

        if blocks.is_empty() {
            continue;
        }

        let line = cm.lookup_char_pos(decl.item_lo).line;
        let Some(name) = decl.name else {
            tracing::warn!(
                file = %path.display(),
                line,
                "ignoring annotations on anonymous default export"
            );
            continue;
        };

        for block in blocks {
            let tags = parse_jsdoc(&block);
            if let Some(descriptor) = PatchDescriptor::from_tags(name.as_str(), &tags) {
                descriptors.push(descriptor.located(path, line));
            }
        }
    }

    Ok(descriptors)
}

/// Parse a module as TypeScript, keeping its comments.
fn parse_with_comments(
    path: &Path,
    source: &str,
) -> BundleResult<(Module, SingleThreadedComments, Lrc<SourceMap>)> {
    let cm = Lrc::new(SourceMap::new(FilePathMapping::empty()));
    let file_name = Lrc::new(FileName::Real(path.to_path_buf()));
    let source_file = cm.new_source_file(file_name, source.to_string());
    let comments = SingleThreadedComments::default();

    let parsed = {
        let lexer = Lexer::new(
            Syntax::Typescript(TsSyntax {
                tsx: path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext == "tsx")
                    .unwrap_or(false),
                ..Default::default()
            }),
            Default::default(),
            StringInput::from(&*source_file),
            Some(&comments),
        );
        let mut parser = Parser::new_from(lexer);
        parser.parse_module()
    };

    let module = parsed.map_err(|e| BundleError::Parse {
        path: path.to_path_buf(),
        message: format!("{:?}", e),
    })?;

    Ok((module, comments, cm))
}

/// Top-level function declarations in source order.
fn top_level_functions(module: &Module) -> Vec<FunctionDecl> {
    module
        .body
        .iter()
        .filter_map(|item| {
            let (name, fn_lo) = match item {
                ModuleItem::Stmt(Stmt::Decl(Decl::Fn(f))) => {
                    (Some(f.ident.sym.to_string()), f.function.span.lo)
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(ExportDecl {
                    decl: Decl::Fn(f),
                    ..
                })) => (Some(f.ident.sym.to_string()), f.function.span.lo),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(ExportDefaultDecl {
                    decl: DefaultDecl::Fn(f),
                    ..
                })) => (
                    f.ident.as_ref().map(|ident| ident.sym.to_string()),
                    f.function.span.lo,
                ),
                _ => return None,
            };

            Some(FunctionDecl {
                name,
                item_lo: item.span().lo,
                fn_lo,
            })
        })
        .collect()
}
