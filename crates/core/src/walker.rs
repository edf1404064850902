use crate::filters::{EntryKind, FilterSet};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// One step of the pruning walk.
#[derive(Debug)]
pub enum WalkEvent {
    /// Directory admitted; its children follow.
    Directory(PathBuf),
    /// Directory rejected; none of its descendants are visited.
    Pruned(PathBuf),
    /// File admitted for indexing.
    File(PathBuf),
    /// File rejected by a file or path pattern.
    Filtered(PathBuf),
    /// Neither a directory nor a regular file: directory symlinks, FIFOs,
    /// sockets and devices. Never read.
    Special(PathBuf),
    /// Entry that could not be read. The walk continues after it.
    Error(walkdir::Error),
}

/// Pre-order, lexically sorted, depth-first walk that consults the filter set
/// before descending into any directory. The root itself is never pruned.
pub struct Walker<'a> {
    entries: walkdir::IntoIter,
    filters: &'a FilterSet,
}

impl<'a> Walker<'a> {
    pub fn new(root: &Path, filters: &'a FilterSet) -> Self {
        Self {
            entries: WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter(),
            filters,
        }
    }
}

impl Iterator for Walker<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.entries.next()? {
            Ok(entry) => entry,
            Err(error) => return Some(WalkEvent::Error(error)),
        };

        let path = entry.path().to_path_buf();
        if entry.file_type().is_dir() {
            if entry.depth() == 0 || self.filters.admits(&path, EntryKind::Directory) {
                Some(WalkEvent::Directory(path))
            } else {
                self.entries.skip_current_dir();
                Some(WalkEvent::Pruned(path))
            }
        } else if !is_regular_file(&entry) {
            Some(WalkEvent::Special(path))
        } else if self.filters.admits(&path, EntryKind::File) {
            Some(WalkEvent::File(path))
        } else {
            Some(WalkEvent::Filtered(path))
        }
    }
}

/// Symlinks are not followed while walking, but one that resolves to a
/// regular file is read like the file itself.
fn is_regular_file(entry: &DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && std::fs::metadata(entry.path())
            .map(|metadata| metadata.is_file())
            .unwrap_or(false)
}
