//! Output file naming.

use heft_fs::FileSystem;
use std::path::Path;

/// Counter that distinguishes repeated report runs.
///
/// A report is written as `<name>.<ext>`. When that file already exists the
/// sequence hands out `<name>-<n>.<ext>`, with `n` only ever growing for
/// the lifetime of the value. The caller owns the sequence and keeps it
/// across runs (e.g. one per multi-target build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSequence {
    next: u32,
}

impl Default for ReportSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// The counter the next collision will use.
    pub fn peek(&self) -> u32 {
        self.next
    }

    /// Picks a file stem under `dir` that is free for every extension.
    ///
    /// Returns `name` itself when none of `name.<ext>` exist, otherwise the
    /// first `name-<n>` whose files are all free.
    pub async fn reserve<F: FileSystem + ?Sized>(
        &mut self,
        fs: &F,
        dir: &Path,
        name: &str,
        extensions: &[&str],
    ) -> std::io::Result<String> {
        if is_free(fs, dir, name, extensions).await? {
            return Ok(name.to_string());
        }

        loop {
            let candidate = format!("{}-{}", name, self.next);
            self.next += 1;
            if is_free(fs, dir, &candidate, extensions).await? {
                tracing::debug!(stem = %candidate, "report name taken, using numbered name");
                return Ok(candidate);
            }
        }
    }
}

async fn is_free<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
    stem: &str,
    extensions: &[&str],
) -> std::io::Result<bool> {
    for ext in extensions {
        if fs.exists(&dir.join(format!("{}.{}", stem, ext))).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heft_fs::MemoryFileSystem;

    #[tokio::test]
    async fn test_free_name_is_used_as_is() {
        let fs = MemoryFileSystem::new("/out").unwrap();
        let mut sequence = ReportSequence::new();

        let stem = sequence
            .reserve(&fs, Path::new("/out"), "stats", &["json"])
            .await
            .unwrap();
        assert_eq!(stem, "stats");
        assert_eq!(sequence.peek(), 1);
    }

    #[tokio::test]
    async fn test_collision_appends_growing_counter() {
        let fs = MemoryFileSystem::new("/out").unwrap();
        fs.add_file("stats.json", "{}").unwrap();
        let mut sequence = ReportSequence::new();

        let first = sequence
            .reserve(&fs, Path::new("/out"), "stats", &["json"])
            .await
            .unwrap();
        assert_eq!(first, "stats-1");

        fs.add_file("stats-1.json", "{}").unwrap();
        let second = sequence
            .reserve(&fs, Path::new("/out"), "stats", &["json"])
            .await
            .unwrap();
        assert_eq!(second, "stats-2");
    }

    #[tokio::test]
    async fn test_counter_never_reuses_lower_values() {
        let fs = MemoryFileSystem::new("/out").unwrap();
        fs.add_file("stats.html", "").unwrap();
        let mut sequence = ReportSequence::new();

        sequence.reserve(&fs, Path::new("/out"), "stats", &["html"]).await.unwrap();
        // A freed-up lower number is skipped
        let next = sequence
            .reserve(&fs, Path::new("/out"), "stats", &["html"])
            .await
            .unwrap();
        assert_eq!(next, "stats-2");
    }

    #[tokio::test]
    async fn test_stem_is_free_for_every_extension() {
        let fs = MemoryFileSystem::new("/out").unwrap();
        fs.add_file("stats.html", "").unwrap();
        let mut sequence = ReportSequence::new();

        let stem = sequence
            .reserve(&fs, Path::new("/out"), "stats", &["json", "html"])
            .await
            .unwrap();
        assert_eq!(stem, "stats-1");
    }
}
