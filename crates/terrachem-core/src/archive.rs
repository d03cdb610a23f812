//! Access to packaged material definitions
//!
//! The registry only needs two things from an archive: read a named text
//! entry and list entries matching a wildcard pattern.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Read-only source of named text entries
pub trait MaterialArchive {
    /// Human-readable name for log and error messages
    fn name(&self) -> String;

    fn load_text_entry(&self, entry: &str) -> Option<String>;

    /// Entry names matching `pattern` (`*` and `?` wildcards), sorted
    fn enumerate_entries(&self, pattern: &str) -> Vec<String>;
}

/// Case-insensitive wildcard match
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();

    // Iterative matcher with single-star backtracking
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((sp, sn)) = star {
            p = sp + 1;
            n = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Material definitions in a plain directory
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        // Fail early on missing directories instead of loading nothing
        std::fs::read_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MaterialArchive for DirArchive {
    fn name(&self) -> String {
        self.root.display().to_string()
    }

    fn load_text_entry(&self, entry: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(entry)).ok()
    }

    fn enumerate_entries(&self, pattern: &str) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to list {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| wildcard_match(pattern, name))
            .collect();
        names.sort();
        names
    }
}

/// In-memory archive, handy for tools and tests
#[derive(Default, Clone)]
pub struct MemoryArchive {
    name: String,
    entries: BTreeMap<String, String>,
}

impl MemoryArchive {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(entry, text);
        self
    }

    pub fn insert(&mut self, entry: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(entry.into(), text.into());
    }

    pub fn remove(&mut self, entry: &str) -> Option<String> {
        self.entries.remove(entry)
    }
}

impl MaterialArchive for MemoryArchive {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn load_text_entry(&self, entry: &str) -> Option<String> {
        self.entries.get(entry).cloned()
    }

    fn enumerate_entries(&self, pattern: &str) -> Vec<String> {
        // BTreeMap keys are already sorted
        self.entries
            .keys()
            .filter(|name| wildcard_match(pattern, name))
            .cloned()
            .collect()
    }
}
