use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use super::Corpus;
use crate::config::CorpusConfig;

/// Result of a single directory scan
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub corpus: Corpus,
    /// Matching files that could not be read as UTF-8, including dangling links
    pub skipped: usize,
    /// Identifiers seen more than once (later file replaced the earlier one)
    pub duplicates: usize,
}

/// Produces a corpus from a directory. Runs on a blocking thread.
pub trait CorpusSource: Send + Sync + 'static {
    fn scan(&self, root: &Path) -> ScanOutcome;
}

#[derive(Debug, Clone)]
pub struct CorpusScanner {
    extensions: Vec<String>,
    follow_links: bool,
}

impl CorpusScanner {
    pub fn new(config: &CorpusConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            follow_links: config.follow_links,
        }
    }

    /// Check whether a path looks like a transcript file
    pub fn is_text_file(&self, path: &Path) -> bool {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension {
            Some(ext) => self.extensions.iter().any(|allowed| *allowed == ext),
            None => false,
        }
    }

    /// Recursively read every text file under `root`.
    ///
    /// A missing root yields an empty corpus. Unreadable files are skipped.
    /// Hidden entries (names starting with `.`) below the root are ignored,
    /// symlinked files are read through to their target, and symlinked
    /// directories are only descended into when `follow_links` is set.
    /// Entries are visited depth-first in file-name order, so when two files
    /// share a stem the later one wins deterministically.
    pub fn scan(&self, root: &Path) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        if !root.is_dir() {
            info!("Corpus directory {:?} does not exist, using empty corpus", root);
            return outcome;
        }

        let walker = WalkDir::new(root)
            .follow_links(self.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable corpus entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            let file_type = entry.file_type();
            if !(file_type.is_file() || file_type.is_symlink()) || !self.is_text_file(path) {
                continue;
            }

            if file_type.is_symlink() {
                match fs::metadata(path) {
                    Ok(target) if target.is_file() => {}
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Skipping broken link {:?}: {}", path, e);
                        outcome.skipped += 1;
                        continue;
                    }
                }
            }

            let Some(identifier) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("Skipping {:?}: file name is not valid UTF-8", path);
                outcome.skipped += 1;
                continue;
            };

            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping {:?}: {}", path, e);
                    outcome.skipped += 1;
                    continue;
                }
            };

            if outcome.corpus.insert(identifier, text).is_some() {
                warn!(
                    "Duplicate conversation id '{}', {:?} replaces the earlier file",
                    identifier, path
                );
                outcome.duplicates += 1;
            }
        }

        debug!(
            "Scanned {:?}: {} conversations, {} skipped, {} duplicates",
            root,
            outcome.corpus.len(),
            outcome.skipped,
            outcome.duplicates
        );

        outcome
    }
}

impl CorpusSource for CorpusScanner {
    fn scan(&self, root: &Path) -> ScanOutcome {
        CorpusScanner::scan(self, root)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
