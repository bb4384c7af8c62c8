//! Event filtering by file name
//!
//! Events are dropped before routing when their file name matches:
//! 1. Configured gitignore-style patterns (negated patterns whitelist a name)
//! 2. Common editor swap/backup files, when enabled
//!
//! Watches are non-recursive, so patterns are matched against the final path
//! component only.

use crate::error::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Compiled ignore rules applied by the dispatch loop
pub struct PathFilter {
    /// Compiled configured patterns (None when no patterns are configured)
    patterns: Option<Gitignore>,

    /// Drop editor swap/backup files
    editor_temp_files: bool,
}

impl PathFilter {
    /// Compile the filter from configuration
    pub fn new(config: &IgnoreConfig) -> Result<Self> {
        let patterns = if config.patterns.is_empty() {
            None
        } else {
            let mut builder = GitignoreBuilder::new("/");
            for pattern in &config.patterns {
                builder.add_line(None, pattern)?;
            }
            Some(builder.build()?)
        };

        Ok(Self {
            patterns,
            editor_temp_files: config.editor_temp_files,
        })
    }

    /// Check if events for this path should be dropped
    pub fn is_ignored(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };

        // Configured patterns take precedence, including whitelists
        if let Some(ref patterns) = self.patterns {
            let matched = patterns.matched(Path::new(name), false);
            if matched.is_whitelist() {
                return false;
            }
            if matched.is_ignore() {
                return true;
            }
        }

        self.editor_temp_files && name.to_str().is_some_and(is_editor_temp)
    }
}

/// Common editor temporary files and OS litter
///
/// Covers Vim, Emacs, JetBrains safe-write and MacOS/Windows system files.
fn is_editor_temp(name: &str) -> bool {
    // Vim swap files (.swp, .swo, .swn, .swx)
    if name.ends_with(".swp")
        || name.ends_with(".swo")
        || name.ends_with(".swn")
        || name.ends_with(".swx")
    {
        return true;
    }

    // Vim writes a probe file named "4913" before saving
    if name == "4913" {
        return true;
    }

    // Vim/Emacs backup files
    if name.ends_with('~') {
        return true;
    }

    // Emacs auto-save (#*#) and lock (.#*) files
    if (name.len() > 1 && name.starts_with('#') && name.ends_with('#')) || name.starts_with(".#") {
        return true;
    }

    // JetBrains safe-write temp files
    if name.ends_with("___jb_tmp___") || name.ends_with("___jb_old___") {
        return true;
    }

    // MacOS/Windows system files
    name == ".DS_Store" || name.starts_with("._") || name == "Thumbs.db" || name == "desktop.ini"
}

/// Ignore configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IgnoreConfig {
    /// Drop editor swap/backup files (default: false)
    pub editor_temp_files: bool,

    /// Additional gitignore-style patterns matched against file names
    pub patterns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_ignores_nothing() {
        let filter = PathFilter::new(&IgnoreConfig::default()).unwrap();
        assert!(!filter.is_ignored(Path::new("/tmp/watched/file.swp")));
        assert!(!filter.is_ignored(Path::new("/tmp/watched/t.txt")));
    }

    #[test]
    fn test_editor_temp_files() {
        let config = IgnoreConfig {
            editor_temp_files: true,
            patterns: vec![],
        };
        let filter = PathFilter::new(&config).unwrap();

        assert!(filter.is_ignored(Path::new("/w/.main.rs.swp")));
        assert!(filter.is_ignored(Path::new("/w/notes.txt~")));
        assert!(filter.is_ignored(Path::new("/w/#draft.org#")));
        assert!(filter.is_ignored(Path::new("/w/.#draft.org")));
        assert!(filter.is_ignored(Path::new("/w/4913")));
        assert!(filter.is_ignored(Path::new("/w/.DS_Store")));
        assert!(filter.is_ignored(Path::new("/w/Main.java___jb_tmp___")));

        assert!(!filter.is_ignored(Path::new("/w/main.rs")));
        assert!(!filter.is_ignored(Path::new("/w/#")));
    }

    #[test]
    fn test_patterns_match_file_name() {
        let config = IgnoreConfig {
            editor_temp_files: false,
            patterns: vec!["*.tmp".to_string(), "partial-*".to_string()],
        };
        let filter = PathFilter::new(&config).unwrap();

        assert!(filter.is_ignored(Path::new("/data/upload.tmp")));
        assert!(filter.is_ignored(Path::new("relative/partial-0001.bin")));
        assert!(!filter.is_ignored(Path::new("/data/upload.bin")));
        // Editor built-ins are off
        assert!(!filter.is_ignored(Path::new("/data/.x.swp")));
    }

    #[test]
    fn test_whitelist_overrides_editor_builtins() {
        let config = IgnoreConfig {
            editor_temp_files: true,
            patterns: vec!["!keep.swp".to_string()],
        };
        let filter = PathFilter::new(&config).unwrap();

        assert!(!filter.is_ignored(Path::new("/w/keep.swp")));
        assert!(filter.is_ignored(Path::new("/w/other.swp")));
    }

    #[test]
    fn test_path_without_file_name_is_kept() {
        let config = IgnoreConfig {
            editor_temp_files: true,
            patterns: vec!["*".to_string()],
        };
        let filter = PathFilter::new(&config).unwrap();
        assert!(!filter.is_ignored(Path::new("/")));
    }
}
