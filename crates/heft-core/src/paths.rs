//! Module id normalization.

use crate::trie::split_path;
use std::path::{Component, Path, PathBuf};

/// Id given to a module whose source names no path at all.
pub const UNNAMED_MODULE: &str = "(unnamed)";

/// Turns a raw `sources` entry into a workspace-relative module id.
///
/// * virtual-module markers (`\0`) and URL schemes (`webpack://`,
///   `vite://`) are stripped; scheme paths are rooted at the workspace;
/// * plain relative paths resolve against `map_dir`, the directory of the
///   source map;
/// * the result is made relative to `root` when it lies below it, and
///   leading `..` segments that would escape are dropped.
///
/// A source that normalizes to nothing (a bare `webpack://`) keeps its raw
/// text, or becomes [`UNNAMED_MODULE`] when that has no path segment either.
pub fn normalize_module_id(source: &str, map_dir: &Path, root: &Path) -> String {
    let source = source.trim_start_matches('\0');
    let id = resolve_module_id(source, map_dir, root);
    if !id.is_empty() {
        id
    } else if split_path(source).is_empty() {
        UNNAMED_MODULE.to_string()
    } else {
        source.to_string()
    }
}

fn resolve_module_id(source: &str, map_dir: &Path, root: &Path) -> String {

    let resolved = match strip_scheme(source) {
        Some(rest) => root.join(rest.trim_start_matches('/')),
        None => map_dir.join(source),
    };

    let resolved = lexical_normalize(&resolved);
    let root = lexical_normalize(root);
    let relative = resolved.strip_prefix(&root).unwrap_or(&resolved);

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn strip_scheme(source: &str) -> Option<&str> {
    let (scheme, rest) = source.split_once("://")?;
    let is_scheme = !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    is_scheme.then_some(rest)
}

/// Resolves `.` and `..` without touching the filesystem.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                ) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
