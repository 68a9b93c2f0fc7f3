//! Mapping decoder.
//!
//! Turns a raw source-map document into per-module, ordered mapping entries.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use sourcemap::{DecodedMap, SourceMap};
use std::collections::BTreeMap;

/// One generated position attributed to an original module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    /// Zero-based generated line.
    pub generated_line: u32,
    /// Zero-based generated column, in UTF-16 code units.
    pub generated_column: u32,
    /// Last column (inclusive) covered by this entry. `None` when the entry
    /// is the last position on its line.
    pub last_generated_column: Option<u32>,
    /// Zero-based line in the original source.
    pub original_line: u32,
    /// Zero-based column in the original source.
    pub original_column: u32,
    /// Original identifier name, if the map records one.
    pub name: Option<String>,
}

/// All mapping entries of one original module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMappings {
    /// Entries sorted by generated line, then generated column.
    pub entries: Vec<MappingEntry>,
    /// The module's `sourcesContent` entry.
    pub content: Option<String>,
}

/// Decoded mappings of one chunk, keyed by the raw `sources` entry.
///
/// Iteration follows the order in which modules first appear in the map.
#[derive(Debug, Clone, Default)]
pub struct SourceMappings {
    modules: IndexMap<String, ModuleMappings>,
}

impl SourceMappings {
    /// Iterates modules in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleMappings)> {
        self.modules
            .iter()
            .map(|(source, module)| (source.as_str(), module))
    }

    /// Looks up one module.
    pub fn get(&self, source: &str) -> Option<&ModuleMappings> {
        self.modules.get(source)
    }

    /// Number of modules with at least one entry.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when no generated position maps to an original module.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

struct Position {
    source: Option<String>,
    original_line: u32,
    original_column: u32,
    name: Option<String>,
}

/// Parses a raw source map and groups its positions by original module.
///
/// When two tokens share a generated position, the later one in the map
/// wins. Positions without a source (runtime helpers, generated glue) bound
/// the spans of their neighbours but are not attributed to any module.
///
/// # Errors
///
/// Returns [`Error::MalformedSourceMap`] if the document cannot be parsed.
pub fn decode(raw: &[u8]) -> Result<SourceMappings> {
    let map = parse(raw)?;

    let mut modules: IndexMap<String, ModuleMappings> = IndexMap::new();
    let mut positions: BTreeMap<(u32, u32), Position> = BTreeMap::new();

    for token in map.tokens() {
        let source = token.get_source().map(str::to_owned);
        if let Some(source) = &source {
            if !modules.contains_key(source) {
                let content = map
                    .get_source_contents(token.get_src_id())
                    .map(str::to_owned);
                modules.insert(
                    source.clone(),
                    ModuleMappings {
                        entries: Vec::new(),
                        content,
                    },
                );
            }
        }

        positions.insert(
            (token.get_dst_line(), token.get_dst_col()),
            Position {
                source,
                original_line: token.get_src_line(),
                original_column: token.get_src_col(),
                name: token.get_name().map(str::to_owned),
            },
        );
    }

    let mut positions = positions.into_iter().peekable();
    while let Some(((line, column), position)) = positions.next() {
        let last_generated_column = match positions.peek() {
            Some(((next_line, next_column), _)) if *next_line == line => Some(next_column - 1),
            _ => None,
        };

        let Some(source) = position.source else {
            continue;
        };
        if let Some(module) = modules.get_mut(&source) {
            module.entries.push(MappingEntry {
                generated_line: line,
                generated_column: column,
                last_generated_column,
                original_line: position.original_line,
                original_column: position.original_column,
                name: position.name,
            });
        }
    }

    // Every position of a module may have been overwritten by another module.
    modules.retain(|_, module| !module.entries.is_empty());

    Ok(SourceMappings { modules })
}

fn parse(raw: &[u8]) -> Result<SourceMap> {
    match sourcemap::decode_slice(raw)? {
        DecodedMap::Regular(map) => Ok(map),
        DecodedMap::Index(index) => Ok(index.flatten()?),
        _ => Err(Error::MalformedSourceMap {
            message: "unsupported source map flavor".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconstruct::GeneratedLines;
    use serde_json::json;
    use sourcemap::SourceMapBuilder;

    /// Tokens are `(generated_line, generated_column, source index)`.
    fn source_map(sources: &[&str], tokens: &[(u32, u32, Option<u32>)]) -> String {
        let mut builder = SourceMapBuilder::new(None);
        for source in sources {
            let src_id = builder.add_source(source);
            builder.set_source_contents(src_id, Some(format!("// {}", source).as_str()));
        }
        for &(line, column, source) in tokens {
            builder.add_raw(line, column, line, 0, source, None, false);
        }
        let mut out = Vec::new();
        builder.into_sourcemap().to_writer(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_groups_entries_by_module() {
        let raw = source_map(
            &["a.ts", "b.ts"],
            &[(0, 0, Some(0)), (0, 5, Some(1)), (1, 0, Some(0))],
        );

        let mappings = decode(raw.as_bytes()).unwrap();
        assert_eq!(mappings.len(), 2);

        let a = mappings.get("a.ts").unwrap();
        assert_eq!(a.entries.len(), 2);
        assert_eq!(a.entries[0].generated_line, 0);
        assert_eq!(a.entries[0].last_generated_column, Some(4));
        assert_eq!(a.entries[1].generated_line, 1);
        assert_eq!(a.entries[1].last_generated_column, None);
        assert_eq!(a.content.as_deref(), Some("// a.ts"));

        let b = mappings.get("b.ts").unwrap();
        assert_eq!(b.entries[0].generated_column, 5);
        assert_eq!(b.entries[0].last_generated_column, None);
    }

    #[test]
    fn test_generated_only_positions_bound_spans() {
        let raw = source_map(&["a.ts"], &[(0, 0, Some(0)), (0, 7, None)]);

        let mappings = decode(raw.as_bytes()).unwrap();
        let a = mappings.get("a.ts").unwrap();
        assert_eq!(a.entries.len(), 1);
        assert_eq!(a.entries[0].last_generated_column, Some(6));
    }

    #[test]
    fn test_modules_ordered_by_first_appearance() {
        let raw = source_map(&["z.ts", "a.ts"], &[(0, 0, Some(1)), (0, 3, Some(0))]);

        let mappings = decode(raw.as_bytes()).unwrap();
        let order: Vec<&str> = mappings.iter().map(|(source, _)| source).collect();
        assert_eq!(order, vec!["a.ts", "z.ts"]);
    }

    #[test]
    fn test_duplicate_position_last_write_wins() {
        // Both segments sit at column 0 of line 0; `b.ts` comes second.
        let raw = json!({
            "version": 3,
            "sources": ["a.ts", "b.ts"],
            "names": [],
            "mappings": "AAAA,ACAA",
        })
        .to_string();

        let mappings = decode(raw.as_bytes()).unwrap();
        assert!(mappings.get("a.ts").is_none());
        assert_eq!(mappings.get("b.ts").unwrap().entries.len(), 1);
    }

    #[test]
    fn test_index_map_sections_are_flattened() {
        let section = |source: &str| -> serde_json::Value {
            serde_json::from_str(&source_map(&[source], &[(0, 0, Some(0))])).unwrap()
        };
        let raw = json!({
            "version": 3,
            "sections": [
                { "offset": { "line": 0, "column": 0 }, "map": section("a.ts") },
                { "offset": { "line": 0, "column": 5 }, "map": section("b.ts") },
            ],
        })
        .to_string();

        let mappings = decode(raw.as_bytes()).unwrap();
        let order: Vec<&str> = mappings.iter().map(|(source, _)| source).collect();
        assert_eq!(order, vec!["a.ts", "b.ts"]);

        let lines = GeneratedLines::new(b"abcdefghij");
        let a = lines.reconstruct(&mappings.get("a.ts").unwrap().entries);
        let b = lines.reconstruct(&mappings.get("b.ts").unwrap().entries);
        assert_eq!(a.text, "abcde");
        assert_eq!(b.text, "fghij");
        assert!(a.missing_lines.is_empty() && b.missing_lines.is_empty());
        assert_eq!(mappings.get("b.ts").unwrap().content.as_deref(), Some("// b.ts"));
    }

    #[test]
    fn test_malformed_source_map() {
        let err = decode(b"{ not json").unwrap_err();
        assert!(matches!(err, Error::MalformedSourceMap { .. }));
    }

    #[test]
    fn test_map_without_mappings_is_empty() {
        let raw = source_map(&["a.ts"], &[]);
        let mappings = decode(raw.as_bytes()).unwrap();
        assert!(mappings.is_empty());
    }
}
