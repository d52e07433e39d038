//! Gitignore-style path matching over a boilerplate tree.
//! Used twice: once with the ignore patterns to enumerate the files that are
//! generated, once with the template patterns to decide which files a provider
//! transforms. Matching is purely path based and never opens files.

use crate::error::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compiled set of gitignore-style patterns anchored at a root directory.
///
/// Negation (`!pattern`), directory-only (`dir/`) and anchored (`/file`)
/// patterns follow gitignore semantics, including the rule that a file
/// cannot be re-included once one of its parent directories is excluded.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    gitignore: Gitignore,
}

impl PathMatcher {
    /// Compiles `patterns` relative to `root`.
    ///
    /// # Arguments
    /// * `root` - Directory the patterns are anchored at
    /// * `field` - Configuration field the patterns come from, used in errors
    /// * `patterns` - Ordered gitignore-style patterns
    ///
    /// # Errors
    /// * `Error::InvalidConfig` naming `field` if a pattern does not compile
    pub fn new<P, S>(root: P, field: &str, patterns: &[S]) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root.as_ref());
        for pattern in patterns {
            builder.add_line(None, pattern.as_ref()).map_err(|e| {
                Error::invalid_config(field, format!("invalid pattern '{}': {e}", pattern.as_ref()))
            })?;
        }
        let gitignore = builder
            .build()
            .map_err(|e| Error::invalid_config(field, format!("invalid patterns: {e}")))?;

        Ok(Self { gitignore })
    }

    /// Returns true if `relative` (or one of its parent directories) is matched.
    pub fn is_match<P: AsRef<Path>>(&self, relative: P, is_dir: bool) -> bool {
        self.gitignore.matched_path_or_any_parents(relative.as_ref(), is_dir).is_ignore()
    }

    /// Returns true if `relative` is not excluded by this pattern set.
    pub fn is_included<P: AsRef<Path>>(&self, relative: P, is_dir: bool) -> bool {
        !self.is_match(relative, is_dir)
    }

    /// Walks `root` and returns every file not excluded by this pattern set.
    ///
    /// Paths are relative to `root` and come out in a stable order: entries are
    /// sorted by file name at every directory level. Excluded directories are
    /// not descended into.
    pub fn included_files<P: AsRef<Path>>(&self, root: P) -> Result<Vec<PathBuf>> {
        let root = root.as_ref();
        let mut files = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let keep = self.is_included(relative, entry.file_type().is_dir());
            if !keep {
                debug!("Excluding '{}'", relative.display());
            }
            keep
        });

        for entry in walker {
            let entry = entry.map_err(|e| Error::GenerationError {
                stage: "Reading boilerplate",
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
                source: e.into(),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }
}
