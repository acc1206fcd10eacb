//! Locating result artifacts to parse.
//!
//! Two strategies produce the same [`ParseTarget`] list: [`TreeCrawl`] walks the
//! results tree and is authoritative, [`LedgerReplay`] reads the success lines of a run
//! ledger and only ever opens the result files those lines name.

use super::error::EngineError;
use crate::core::io::ledger_line::{is_suspect_line, parse_success_line};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// One result artifact and the identities it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParseTarget {
    pub receptor: String,
    pub ligand: String,
    pub path: PathBuf,
}

pub trait JobDiscovery {
    /// Short name used in logs.
    fn mode(&self) -> &'static str;

    fn discover(&self) -> Result<Vec<ParseTarget>, EngineError>;
}

/// Which files a crawl treats as result artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetMatcher {
    Exact(String),
    /// Any file with this extension whose name does not mention `receptor`.
    Extension(String),
}

impl TargetMatcher {
    /// `*.<ext>` selects by extension, anything else is an exact file name.
    pub fn parse(name: &str) -> Self {
        match name.strip_prefix("*.") {
            Some(ext) if !ext.is_empty() => Self::Extension(ext.to_string()),
            _ => Self::Exact(name.to_string()),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        match self {
            Self::Exact(name) => file_name == name,
            Self::Extension(ext) => {
                file_name
                    .strip_suffix(ext.as_str())
                    .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
                    && !file_name.to_ascii_lowercase().contains("receptor")
            }
        }
    }
}

/// Walks `<root>/<receptor>/<ligand>/<artifact>`, naming targets after the two
/// directories enclosing each matching file.
pub struct TreeCrawl {
    root: PathBuf,
    matcher: TargetMatcher,
    scope: Vec<String>,
}

impl TreeCrawl {
    pub fn new(root: impl Into<PathBuf>, matcher: TargetMatcher) -> Self {
        Self {
            root: root.into(),
            matcher,
            scope: Vec::new(),
        }
    }

    /// Restricts the crawl to these receptor subdirectories of the root.
    pub fn with_scope(mut self, scope: Vec<String>) -> Self {
        self.scope = scope;
        self
    }

    /// An unreadable start directory is an error; anything unreadable below it is
    /// logged and skipped.
    fn walk(&self, start: &Path, found: &mut Vec<ParseTarget>) -> Result<(), EngineError> {
        let walker = WalkDir::new(start)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(EngineError::io(start, io::Error::from(e))),
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", start.display(), e);
                    continue;
                }
            };

            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            if !is_file || !self.matcher.matches(&entry.file_name().to_string_lossy()) {
                continue;
            }
            match target_for(entry.path()) {
                Some(target) => found.push(target),
                None => debug!(
                    "Ignoring artifact outside a job directory: {}",
                    entry.path().display()
                ),
            }
        }
        Ok(())
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

impl JobDiscovery for TreeCrawl {
    fn mode(&self) -> &'static str {
        "crawl"
    }

    fn discover(&self) -> Result<Vec<ParseTarget>, EngineError> {
        let starts: Vec<PathBuf> = if self.scope.is_empty() {
            vec![self.root.clone()]
        } else {
            self.scope
                .iter()
                .map(|name| self.root.join(name))
                .filter(|dir| {
                    let exists = dir.is_dir();
                    if !exists {
                        warn!("Scope directory {} does not exist; skipping.", dir.display());
                    }
                    exists
                })
                .collect()
        };

        let mut found = Vec::new();
        for start in &starts {
            self.walk(start, &mut found)?;
        }
        found.sort();
        info!("Crawl found {} result files under {}.", found.len(), self.root.display());
        Ok(found)
    }
}

fn target_for(path: &Path) -> Option<ParseTarget> {
    let ligand_dir = path.parent()?;
    let receptor_dir = ligand_dir.parent()?;
    Some(ParseTarget {
        receptor: receptor_dir.file_name()?.to_string_lossy().into_owned(),
        ligand: ligand_dir.file_name()?.to_string_lossy().into_owned(),
        path: path.to_path_buf(),
    })
}

/// Recovers targets from the success lines of a run ledger or summary report.
pub struct LedgerReplay {
    ledger: PathBuf,
    results_root: PathBuf,
    file_name: String,
}

impl LedgerReplay {
    pub fn new(
        ledger: impl Into<PathBuf>,
        results_root: impl Into<PathBuf>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            ledger: ledger.into(),
            results_root: results_root.into(),
            file_name: file_name.into(),
        }
    }
}

impl JobDiscovery for LedgerReplay {
    fn mode(&self) -> &'static str {
        "ledger"
    }

    fn discover(&self) -> Result<Vec<ParseTarget>, EngineError> {
        let bytes = fs::read(&self.ledger).map_err(|e| EngineError::io(&self.ledger, e))?;
        let text = String::from_utf8_lossy(&bytes);

        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        let mut suspect = 0usize;

        for line in text.lines() {
            let Some(entry) = parse_success_line(line) else {
                if is_suspect_line(line) {
                    suspect += 1;
                    debug!("Unparseable ledger line: {}", line);
                }
                continue;
            };
            let receptor = entry.receptor_id().to_string();
            if !seen.insert((receptor.clone(), entry.ligand_id.clone())) {
                continue;
            }
            let path = self
                .results_root
                .join(&receptor)
                .join(&entry.ligand_id)
                .join(&self.file_name);
            targets.push(ParseTarget {
                receptor,
                ligand: entry.ligand_id,
                path,
            });
        }

        if suspect > 0 {
            warn!(
                "{} line(s) in {} look like outcomes but do not match the success format.",
                suspect,
                self.ledger.display()
            );
        }
        info!(
            "Ledger {} names {} completed pairs.",
            self.ledger.display(),
            targets.len()
        );
        Ok(targets)
    }
}
