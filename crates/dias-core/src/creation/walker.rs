//! Sorted directory traversal.
//!
//! Both the copier and the archiver need every directory (including empty
//! ones) and every file below a root, in a stable order, with a
//! `/`-separated relative name for each.

use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Kind of a walked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory, or a symbolic link to one. Links are not descended.
    Directory,
    /// Regular file, a link to one, or a link whose target is missing.
    File,
}

/// One entry found below a walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Full filesystem path.
    pub path: PathBuf,
    /// Path relative to the walk base, `/`-separated.
    pub relative: String,
    /// Directory or file.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

/// Result of one traversal.
#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    /// Entries in walk order.
    pub entries: Vec<TreeEntry>,
    /// Entries that could not be read; the walk continues past them.
    pub errors: Vec<String>,
}

impl TreeListing {
    /// Directories in walk order.
    pub fn directories(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Directory)
    }

    /// Files in walk order.
    pub fn files(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter().filter(|e| e.kind == EntryKind::File)
    }

    /// Number of files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Sum of file sizes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files().map(|e| e.size).sum()
    }
}

/// Walks `root` sorted by file name.
///
/// Relative names are computed against `base`, which must be `root` or one
/// of its ancestors. With `include_root` the root itself is the first entry.
///
/// # Examples
///
/// ```no_run
/// use dias_core::creation::walker::collect_tree;
/// use std::path::Path;
///
/// let root = Path::new("/data/pkg");
/// let listing = collect_tree(root, Path::new("/data"), true);
/// assert_eq!(listing.entries[0].relative, "pkg");
/// ```
#[must_use]
pub fn collect_tree(root: &Path, base: &Path, include_root: bool) -> TreeListing {
    let mut listing = TreeListing::default();
    let walker = WalkDir::new(root)
        .min_depth(usize::from(!include_root))
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                listing.errors.push(e.to_string());
                continue;
            }
        };

        let Some(relative) = relative_name(entry.path(), base) else {
            continue;
        };

        // Links are classified by their target; a dangling link stays a
        // file and fails when opened.
        let target = std::fs::metadata(entry.path()).ok();
        let (kind, size) = match target {
            Some(meta) if meta.is_dir() => (EntryKind::Directory, 0),
            Some(meta) => (EntryKind::File, meta.len()),
            None => (EntryKind::File, 0),
        };

        listing.entries.push(TreeEntry {
            path: entry.into_path(),
            relative,
            kind,
            size,
        });
    }

    listing
}

/// `/`-separated path of `path` relative to `base`.
#[must_use]
pub fn relative_name(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_tree() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("b/empty")).unwrap();
        fs::write(root.join("a.txt"), b"aaa").unwrap();
        fs::write(root.join("b/c.txt"), b"cc").unwrap();
        temp
    }

    #[test]
    fn test_collect_without_root() {
        let temp = sample_tree();
        let root = temp.path().join("root");
        let listing = collect_tree(&root, &root, false);

        let names: Vec<_> = listing.entries.iter().map(|e| e.relative.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b", "b/c.txt", "b/empty"]);
        assert_eq!(listing.file_count(), 2);
        assert_eq!(listing.total_size(), 5);
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn test_collect_with_root_relative_to_parent() {
        let temp = sample_tree();
        let root = temp.path().join("root");
        let listing = collect_tree(&root, temp.path(), true);

        assert_eq!(listing.entries[0].relative, "root");
        assert_eq!(listing.entries[0].kind, EntryKind::Directory);
        assert!(listing.entries.iter().any(|e| e.relative == "root/b/empty"));
        assert_eq!(listing.directories().count(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_links_classified_by_target() {
        let temp = sample_tree();
        let root = temp.path().join("root");
        std::os::unix::fs::symlink(root.join("b"), root.join("dir_link")).unwrap();
        std::os::unix::fs::symlink(root.join("a.txt"), root.join("file_link")).unwrap();
        std::os::unix::fs::symlink(root.join("gone"), root.join("zz_dangling")).unwrap();

        let listing = collect_tree(&root, &root, false);
        let kind_of = |name: &str| {
            listing
                .entries
                .iter()
                .find(|e| e.relative == name)
                .map(|e| (e.kind, e.size))
                .unwrap()
        };

        assert_eq!(kind_of("dir_link"), (EntryKind::Directory, 0));
        assert_eq!(kind_of("file_link"), (EntryKind::File, 3));
        assert_eq!(kind_of("zz_dangling"), (EntryKind::File, 0));
        assert!(!listing.entries.iter().any(|e| e.relative.starts_with("dir_link/")));
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(
            relative_name(Path::new("/a/b/c"), Path::new("/a")).as_deref(),
            Some("b/c")
        );
        assert_eq!(relative_name(Path::new("/a"), Path::new("/a")), None);
        assert_eq!(relative_name(Path::new("/x"), Path::new("/a")), None);
    }
}
