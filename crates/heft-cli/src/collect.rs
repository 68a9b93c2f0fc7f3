//! Reads build output into artifacts.

use anyhow::{Context, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use heft_core::Artifact;
use heft_fs::FileSystem;
use std::path::{Component, Path, PathBuf};

/// Extensions treated as code chunks; everything else is an asset.
const CHUNK_EXTENSIONS: &[&str] = &["js", "mjs", "cjs"];

const URL_MARKERS: &[&str] = &["//# sourceMappingURL=", "//@ sourceMappingURL=", "/*# sourceMappingURL="];

/// Where a `sourceMappingURL` comment points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapUrl {
    /// `data:` URL carrying the map inline.
    Data(String),
    /// Path relative to the chunk.
    Relative(String),
    /// Anything with a scheme (`https://...`); not fetched.
    Remote(String),
}

/// Collects every file under `output_dir` as an artifact.
///
/// `*.map` files are never artifacts themselves. Chunks pick up their map
/// from a sibling `<file>.map` or from a trailing `sourceMappingURL`
/// comment. A map that can't be read is logged and the chunk is kept
/// without one.
pub async fn collect_artifacts<F: FileSystem>(fs: &F, output_dir: &Path) -> Result<Vec<Artifact>> {
    let files = fs
        .list_files(output_dir)
        .await
        .with_context(|| format!("Failed to list build output in {}", output_dir.display()))?;

    let mut artifacts = Vec::with_capacity(files.len());
    for path in files {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if extension == "map" {
            continue;
        }

        let file_name = relative_name(&path, output_dir);
        let code = fs
            .read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        if CHUNK_EXTENSIONS.contains(&extension) {
            let source_map = find_source_map(fs, &path, &code).await;
            let mut artifact = Artifact::chunk(file_name, code);
            if let Some(source_map) = source_map {
                artifact = artifact.with_source_map(source_map);
            }
            artifacts.push(artifact);
        } else {
            artifacts.push(Artifact::asset(file_name, code));
        }
    }

    tracing::debug!(count = artifacts.len(), dir = %output_dir.display(), "collected artifacts");
    Ok(artifacts)
}

/// `/`-separated path of `path` below `output_dir`.
fn relative_name(path: &Path, output_dir: &Path) -> String {
    let relative = path.strip_prefix(output_dir).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

async fn find_source_map<F: FileSystem>(fs: &F, chunk: &Path, code: &[u8]) -> Option<String> {
    let mut sibling = chunk.as_os_str().to_owned();
    sibling.push(".map");
    let sibling = PathBuf::from(sibling);

    if fs.exists(&sibling).await.unwrap_or(false) {
        return read_map(fs, &sibling).await;
    }

    match source_mapping_url(code)? {
        SourceMapUrl::Data(url) => match decode_data_url(&url) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!(chunk = %chunk.display(), "inline source map unreadable: {}", e);
                None
            }
        },
        SourceMapUrl::Relative(url) => {
            let url = url.split(['?', '#']).next().unwrap_or_default();
            let dir = chunk.parent().unwrap_or_else(|| Path::new(""));
            read_map(fs, &dir.join(url)).await
        }
        SourceMapUrl::Remote(url) => {
            tracing::debug!(chunk = %chunk.display(), url = %url, "skipping remote source map");
            None
        }
    }
}

async fn read_map<F: FileSystem>(fs: &F, path: &Path) -> Option<String> {
    match fs.read_to_string(path).await {
        Ok(map) => Some(map),
        Err(e) => {
            tracing::warn!(map = %path.display(), "failed to read source map: {}", e);
            None
        }
    }
}

/// Finds the `sourceMappingURL` comment on the last non-blank line.
pub fn source_mapping_url(code: &[u8]) -> Option<SourceMapUrl> {
    let last_line = code
        .rsplit(|b| *b == b'\n')
        .map(|line| line.trim_ascii())
        .find(|line| !line.is_empty())?;
    let last_line = std::str::from_utf8(last_line).ok()?;

    let url = URL_MARKERS
        .iter()
        .find_map(|marker| last_line.strip_prefix(*marker))?;
    let url = url.trim_end().trim_end_matches("*/").trim();
    if url.is_empty() {
        return None;
    }

    Some(if url.starts_with("data:") {
        SourceMapUrl::Data(url.to_string())
    } else if url.contains("://") {
        SourceMapUrl::Remote(url.to_string())
    } else {
        SourceMapUrl::Relative(url.to_string())
    })
}

fn decode_data_url(url: &str) -> Result<String> {
    let rest = url.strip_prefix("data:").context("not a data URL")?;
    let (meta, payload) = rest.split_once(',').context("data URL has no payload")?;

    if meta.split(';').any(|part| part == "base64") {
        let bytes = BASE64_STANDARD
            .decode(payload)
            .context("invalid base64 in data URL")?;
        String::from_utf8(bytes).context("inline source map is not UTF-8")
    } else {
        Ok(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_mapping_url_variants() {
        assert_eq!(
            source_mapping_url(b"main();\n//# sourceMappingURL=index.js.map\n"),
            Some(SourceMapUrl::Relative("index.js.map".to_string()))
        );
        assert_eq!(
            source_mapping_url(b"main();\r\n//@ sourceMappingURL=../maps/a.map\r\n\r\n"),
            Some(SourceMapUrl::Relative("../maps/a.map".to_string()))
        );
        assert_eq!(
            source_mapping_url(b"a\n/*# sourceMappingURL=data:application/json;base64,e30= */"),
            Some(SourceMapUrl::Data("data:application/json;base64,e30=".to_string()))
        );
        assert_eq!(
            source_mapping_url(b"a\n//# sourceMappingURL=https://cdn.example.com/a.map"),
            Some(SourceMapUrl::Remote("https://cdn.example.com/a.map".to_string()))
        );
    }

    #[test]
    fn test_comment_must_be_on_last_line() {
        assert_eq!(source_mapping_url(b"//# sourceMappingURL=a.map\nmain();\n"), None);
        assert_eq!(source_mapping_url(b""), None);
        assert_eq!(source_mapping_url(b"//# sourceMappingURL=\n"), None);
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(
            decode_data_url("data:application/json;charset=utf-8;base64,eyJ2ZXJzaW9uIjozfQ==").unwrap(),
            "{\"version\":3}"
        );
        assert_eq!(decode_data_url("data:application/json,{}").unwrap(), "{}");
        assert!(decode_data_url("data:application/json;base64,@@@").is_err());
    }

    #[test]
    fn test_relative_name_uses_forward_slashes() {
        assert_eq!(
            relative_name(Path::new("/app/dist/assets/index.js"), Path::new("/app/dist")),
            "assets/index.js"
        );
    }
}
