//! Include/exclude policy applied to every entry of the walk.
//!
//! Path patterns are matched against the full path and apply to directories
//! and files alike. Directory patterns and file patterns are matched against
//! the base name of the entry. A missing pattern never rejects.

use crate::error::IndexError;
use crate::models::FilterPatterns;
use regex::Regex;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    include_file: Option<Regex>,
    exclude_file: Option<Regex>,
    include_dir: Option<Regex>,
    exclude_dir: Option<Regex>,
    include_path: Option<Regex>,
    exclude_path: Option<Regex>,
}

impl FilterSet {
    pub fn compile(patterns: &FilterPatterns) -> Result<Self, IndexError> {
        Ok(Self {
            include_file: compile_optional(patterns.include_file.as_deref())?,
            exclude_file: compile_optional(patterns.exclude_file.as_deref())?,
            include_dir: compile_optional(patterns.include_dir.as_deref())?,
            exclude_dir: compile_optional(patterns.exclude_dir.as_deref())?,
            include_path: compile_optional(patterns.include_path.as_deref())?,
            exclude_path: compile_optional(patterns.exclude_path.as_deref())?,
        })
    }

    /// Decides whether an entry is admitted. A rejected directory must be pruned
    /// by the caller; a rejected file is only skipped.
    pub fn admits(&self, path: &Path, kind: EntryKind) -> bool {
        let full_path = path.to_string_lossy();
        if !permits(&self.include_path, &self.exclude_path, &full_path) {
            return false;
        }

        let name = base_name(path);
        match kind {
            EntryKind::Directory => permits(&self.include_dir, &self.exclude_dir, &name),
            EntryKind::File => permits(&self.include_file, &self.exclude_file, &name),
        }
    }
}

fn compile_optional(pattern: Option<&str>) -> Result<Option<Regex>, IndexError> {
    match pattern {
        Some(pattern) if !pattern.is_empty() => Ok(Some(Regex::new(pattern)?)),
        _ => Ok(None),
    }
}

fn permits(include: &Option<Regex>, exclude: &Option<Regex>, haystack: &str) -> bool {
    let included = include.as_ref().map_or(true, |re| re.is_match(haystack));
    let excluded = exclude.as_ref().is_some_and(|re| re.is_match(haystack));
    included && !excluded
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_EXCLUDE_DIR, DEFAULT_INCLUDE_FILE};

    fn defaults() -> FilterSet {
        FilterSet::compile(&FilterPatterns {
            include_file: Some(DEFAULT_INCLUDE_FILE.to_string()),
            exclude_dir: Some(DEFAULT_EXCLUDE_DIR.to_string()),
            ..FilterPatterns::default()
        })
        .expect("default patterns compile")
    }

    #[test]
    fn empty_filter_set_admits_everything() {
        let filters = FilterSet::compile(&FilterPatterns::default()).expect("no patterns");
        assert!(filters.admits(Path::new("/a/.git"), EntryKind::Directory));
        assert!(filters.admits(Path::new("/a/b.bin"), EntryKind::File));
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let filters = FilterSet::compile(&FilterPatterns {
            include_file: Some(String::new()),
            exclude_dir: Some(String::new()),
            ..FilterPatterns::default()
        })
        .expect("empty patterns");
        assert!(filters.admits(Path::new("/a/sdk"), EntryKind::Directory));
        assert!(filters.admits(Path::new("/a/b.bin"), EntryKind::File));
    }

    #[test]
    fn directory_patterns_match_the_base_name() {
        let filters = defaults();
        assert!(!filters.admits(Path::new("/docs/.cache"), EntryKind::Directory));
        assert!(!filters.admits(Path::new("/docs/~tmp"), EntryKind::Directory));
        assert!(!filters.admits(Path::new("/docs/sdk-1.2"), EntryKind::Directory));
        assert!(filters.admits(Path::new("/docs/manuals"), EntryKind::Directory));
        // Only the base name counts for directory patterns.
        assert!(filters.admits(Path::new("/.hidden/manuals"), EntryKind::Directory));
    }

    #[test]
    fn file_patterns_do_not_apply_to_directories() {
        let filters = defaults();
        assert!(filters.admits(Path::new("/docs/reports"), EntryKind::Directory));
        assert!(!filters.admits(Path::new("/docs/reports"), EntryKind::File));
        assert!(filters.admits(Path::new("/docs/report.pdf"), EntryKind::File));
        assert!(filters.admits(Path::new("/docs/.report.pdf"), EntryKind::File));
    }

    #[test]
    fn path_patterns_apply_to_both_kinds() {
        let filters = FilterSet::compile(&FilterPatterns {
            include_path: Some("^/srv/".to_string()),
            exclude_path: Some("private".to_string()),
            ..FilterPatterns::default()
        })
        .expect("patterns compile");

        assert!(filters.admits(Path::new("/srv/docs"), EntryKind::Directory));
        assert!(!filters.admits(Path::new("/home/docs"), EntryKind::Directory));
        assert!(!filters.admits(Path::new("/srv/private/a.pdf"), EntryKind::File));
        assert!(!filters.admits(Path::new("/srv/privateer"), EntryKind::Directory));
        assert!(filters.admits(Path::new("/srv/docs/a.pdf"), EntryKind::File));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filters = FilterSet::compile(&FilterPatterns {
            include_file: Some(r"\.pdf$".to_string()),
            exclude_file: Some("^draft".to_string()),
            ..FilterPatterns::default()
        })
        .expect("patterns compile");

        assert!(!filters.admits(Path::new("/a/draft.pdf"), EntryKind::File));
        assert!(filters.admits(Path::new("/a/final.pdf"), EntryKind::File));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = FilterSet::compile(&FilterPatterns {
            exclude_dir: Some("(unclosed".to_string()),
            ..FilterPatterns::default()
        });
        assert!(matches!(result, Err(IndexError::RegexError(_))));
    }
}
