//! Source-map fragment serialization.
//!
//! A module's map contribution is measured as the byte length of a
//! standalone v3 document that holds only that module: its source path, its
//! `sourcesContent` entry, the names it uses and its mappings.

use crate::decoder::ModuleMappings;
use sourcemap::SourceMapBuilder;

/// Serializes the single-module map fragment for `source`.
///
/// Returns `None` when the module has no mappings.
pub fn module_fragment(source: &str, module: &ModuleMappings) -> Option<String> {
    if module.entries.is_empty() {
        return None;
    }

    let mut builder = SourceMapBuilder::new(None);
    let src_id = builder.add_source(source);
    builder.set_source_contents(src_id, module.content.as_deref());
    for entry in &module.entries {
        let name_id = entry.name.as_deref().map(|name| builder.add_name(name));
        builder.add_raw(
            entry.generated_line,
            entry.generated_column,
            entry.original_line,
            entry.original_column,
            Some(src_id),
            name_id,
            false,
        );
    }

    let mut out = Vec::new();
    builder.into_sourcemap().to_writer(&mut out).ok()?;
    String::from_utf8(out).ok()
}

/// Byte length of [`module_fragment`], 0 when there is none.
pub fn fragment_size(source: &str, module: &ModuleMappings) -> u64 {
    module_fragment(source, module).map_or(0, |fragment| fragment.len() as u64)
}
