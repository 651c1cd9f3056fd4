//! Zip export of a session root.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::vfs::error::WorkspaceError;
use crate::vfs::ops::walk_files;
use crate::vfs::policy::SandboxPolicy;

/// Packages every regular file under `root` into a deflate-compressed zip.
///
/// Entries are written in sorted root-relative path order with a fixed
/// timestamp and mode, so identical trees produce identical bytes.
///
/// # Errors
///
/// Returns an error if the tree cannot be walked, a file cannot be read,
/// or the zip writer fails.
pub fn build_zip(root: &Path) -> Result<Vec<u8>, WorkspaceError> {
    let policy = SandboxPolicy::new(root)?;
    let files = walk_files(&policy, policy.root())?;

    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for relative in &files {
        let path = policy.root().join(relative);
        let bytes = fs::read(&path).map_err(|e| WorkspaceError::io(&path, e))?;
        writer.start_file(relative.as_str(), options)?;
        writer
            .write_all(&bytes)
            .map_err(|e| WorkspaceError::io(&path, e))?;
    }

    let buffer = writer.finish()?.into_inner();
    debug!(entries = files.len(), bytes = buffer.len(), "Built workspace archive");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_entries_are_sorted_relative_paths() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join("src/nested"))?;
        fs::write(dir.path().join("src/nested/z.txt"), "z")?;
        fs::write(dir.path().join("README.md"), "# readme")?;
        fs::write(dir.path().join("src/a.txt"), "a")?;

        let bytes = build_zip(dir.path())?;
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).map(|f| f.name().to_string()))
            .collect::<Result<_, _>>()?;
        assert_eq!(names, ["README.md", "src/a.txt", "src/nested/z.txt"]);

        let mut content = String::new();
        archive.by_name("src/nested/z.txt")?.read_to_string(&mut content)?;
        assert_eq!(content, "z");
        Ok(())
    }

    #[test]
    fn test_identical_trees_produce_identical_bytes() -> anyhow::Result<()> {
        let first = tempdir()?;
        let second = tempdir()?;
        for dir in [&first, &second] {
            fs::create_dir_all(dir.path().join("docs"))?;
            fs::write(dir.path().join("docs/guide.md"), "guide")?;
            fs::write(dir.path().join("main.rs"), "fn main() {}")?;
        }

        assert_eq!(build_zip(first.path())?, build_zip(second.path())?);
        Ok(())
    }

    #[test]
    fn test_empty_root_is_a_valid_archive() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let archive = zip::ZipArchive::new(Cursor::new(build_zip(dir.path())?))?;
        assert_eq!(archive.len(), 0);
        Ok(())
    }
}
