//! Lists and reads the vendor headers under a library checkout.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{BindgenError, Result};

/// Conventional header locations, relative to the library root.
pub const SEARCH_DIRS: [&str; 2] = ["src", "include"];

const HEADER_EXTENSIONS: [&str; 3] = ["h", "hpp", "hh"];

#[derive(Debug, Clone)]
pub struct HeaderSource {
    root: PathBuf,
}

impl HeaderSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Search directories that actually exist, for `-I` forwarding.
    pub fn include_dirs(&self) -> Vec<PathBuf> {
        SEARCH_DIRS
            .iter()
            .map(|dir| self.root.join(dir))
            .filter(|dir| dir.is_dir())
            .collect()
    }

    /// Every header under the search directories, sorted so that downstream
    /// output order does not depend on directory iteration order.
    /// Entries the walk cannot read (dangling links, permission errors,
    /// link loops) are logged and skipped.
    pub fn list_headers(&self) -> Vec<PathBuf> {
        self.walk().0
    }

    /// Sorted headers plus the number of entries that could not be read.
    fn walk(&self) -> (Vec<PathBuf>, usize) {
        let mut headers = Vec::new();
        let mut unreadable = 0;

        for dir in self.include_dirs() {
            for entry in WalkDir::new(&dir).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                        warn!(path = %path, error = %e, "skipping unreadable entry");
                        unreadable += 1;
                        continue;
                    }
                };
                let path = entry.path();
                if path.is_file() && is_header(path) {
                    headers.push(path.to_path_buf());
                }
            }
        }

        headers.sort();
        debug!(root = %self.root.display(), count = headers.len(), unreadable, "listed headers");
        (headers, unreadable)
    }
}

/// Reads one header. A path that vanished since listing is reported as
/// `HeaderNotFound`, not as a generic I/O error.
pub fn read_header(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(BindgenError::HeaderNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| BindgenError::io(path, e))
}

fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_headers_from_both_search_dirs_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/utility")).unwrap();
        fs::create_dir_all(root.join("include")).unwrap();
        fs::write(root.join("src/utility/Zeta.h"), "").unwrap();
        fs::write(root.join("src/Alpha.hpp"), "").unwrap();
        fs::write(root.join("src/notes.txt"), "").unwrap();
        fs::write(root.join("include/Beta.h"), "").unwrap();

        let headers = HeaderSource::new(root).list_headers();
        let names: Vec<_> = headers
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            names,
            vec!["include/Beta.h", "src/Alpha.hpp", "src/utility/Zeta.h"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn dangling_links_are_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/Real.h"), "").unwrap();
        std::os::unix::fs::symlink(root.join("src/Gone.h"), root.join("src/Link.h")).unwrap();

        let (headers, unreadable) = HeaderSource::new(root).walk();

        assert_eq!(headers, vec![root.join("src/Real.h")]);
        assert_eq!(unreadable, 1);
    }

    #[test]
    fn missing_search_dirs_are_ignored() {
        let dir = tempdir().unwrap();
        let source = HeaderSource::new(dir.path());
        assert!(source.list_headers().is_empty());
        assert!(source.include_dirs().is_empty());
    }

    #[test]
    fn reading_a_missing_header_is_header_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("Gone.h");
        let err = read_header(&missing).unwrap_err();
        assert!(matches!(err, BindgenError::HeaderNotFound(p) if p == missing));
    }
}
