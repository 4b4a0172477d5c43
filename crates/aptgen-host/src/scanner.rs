//! Filesystem build context with stamp-based change detection.
//!
//! Each scan walks the base directory, fingerprints every file matching
//! the include globs with BLAKE3, and compares the fingerprints against
//! the stamp file written by the previous scan of the same base directory
//! and include set. Incremental scans report new or modified files; full
//! scans report everything. New stamps stay pending on the build context
//! until the processing pass commits them, so a failed pass leaves the
//! previous stamps in place and its files are reported again.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use aptgen_core::filter::{compile_globs, glob_path, matches_any};
use aptgen_core::{AptError, AptResult, BuildContext, ChangeScanner};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const STAMP_VERSION: u32 = 1;

// ── Stamp File ───────────────────────────────────────────────────────

/// Fingerprints recorded by one scan.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ScanStamp {
    version: u32,
    base_dir: String,
    includes: Vec<String>,
    /// `/`-separated relative path → BLAKE3 hex digest.
    fingerprints: BTreeMap<String, String>,
}

impl ScanStamp {
    fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<ScanStamp>(&contents) {
            Ok(stamp) if stamp.version == STAMP_VERSION => stamp,
            Ok(_) => Self::default(),
            Err(e) => {
                warn!(stamp = %path.display(), error = %e, "Ignoring unreadable scan stamp");
                Self::default()
            }
        }
    }

    fn save(&self, path: &Path) -> AptResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AptError::Serialization(format!("scan stamp: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn fingerprint(path: &Path) -> AptResult<String> {
    let bytes = std::fs::read(path)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Build Context ────────────────────────────────────────────────────

/// Stamp file path → stamp written by `commit`.
type PendingStamps = Rc<RefCell<BTreeMap<PathBuf, ScanStamp>>>;

/// Build context persisting scan stamps under a state directory.
#[derive(Debug, Clone)]
pub struct FsBuildContext {
    state_dir: PathBuf,
    incremental: bool,
    refreshed: Vec<PathBuf>,
    pending: PendingStamps,
}

impl FsBuildContext {
    pub fn new(state_dir: impl Into<PathBuf>, incremental: bool) -> Self {
        Self {
            state_dir: state_dir.into(),
            incremental,
            refreshed: Vec::new(),
            pending: PendingStamps::default(),
        }
    }

    pub fn incremental(state_dir: impl Into<PathBuf>) -> Self {
        Self::new(state_dir, true)
    }

    pub fn full(state_dir: impl Into<PathBuf>) -> Self {
        Self::new(state_dir, false)
    }

    pub fn is_incremental(&self) -> bool {
        self.incremental
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Paths passed to `refresh`, in call order.
    pub fn refreshed(&self) -> &[PathBuf] {
        &self.refreshed
    }

    /// Stamps scanned but not yet committed.
    pub fn pending_stamps(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl BuildContext for FsBuildContext {
    fn new_scanner(&self, base_dir: &Path) -> Box<dyn ChangeScanner> {
        Box::new(FsScanner {
            base: base_dir.to_path_buf(),
            state_dir: self.state_dir.clone(),
            incremental: self.incremental,
            includes: vec![aptgen_core::ALL_JAVA_FILES_FILTER.to_string()],
            included: Vec::new(),
            pending: Rc::clone(&self.pending),
        })
    }

    fn refresh(&mut self, path: &Path) {
        info!(path = %path.display(), "Generated sources refreshed");
        self.refreshed.push(path.to_path_buf());
    }

    fn commit(&mut self) -> AptResult<()> {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for (path, stamp) in &pending {
            stamp.save(path)?;
            debug!(stamp = %path.display(), files = stamp.fingerprints.len(), "Committed scan stamp");
        }
        Ok(())
    }

    fn discard(&mut self) {
        let discarded = std::mem::take(&mut *self.pending.borrow_mut());
        if !discarded.is_empty() {
            debug!(stamps = discarded.len(), "Discarded scan stamps");
        }
    }
}

// ── Scanner ──────────────────────────────────────────────────────────

/// Walks one base directory; see the module docs for change detection.
pub struct FsScanner {
    base: PathBuf,
    state_dir: PathBuf,
    incremental: bool,
    includes: Vec<String>,
    included: Vec<PathBuf>,
    pending: PendingStamps,
}

impl FsScanner {
    /// Stamp file for this base directory and include set.
    pub fn stamp_path(&self) -> PathBuf {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.base.display().to_string().as_bytes());
        for include in &self.includes {
            hasher.update(b"\n");
            hasher.update(include.as_bytes());
        }
        let key = hasher.finalize().to_hex();
        self.state_dir.join(format!("scan-{}.json", &key.as_str()[..16]))
    }
}

impl ChangeScanner for FsScanner {
    fn set_includes(&mut self, patterns: Vec<String>) {
        self.includes = patterns;
    }

    fn scan(&mut self) -> AptResult<()> {
        self.included.clear();
        if !self.base.is_dir() {
            debug!(base = %self.base.display(), "Source directory does not exist");
            return Ok(());
        }

        let patterns = compile_globs(&self.includes)?;
        let stamp_path = self.stamp_path();
        let previous = if self.incremental {
            ScanStamp::load(&stamp_path)
        } else {
            ScanStamp::default()
        };

        let mut fingerprints = BTreeMap::new();
        for entry in WalkDir::new(&self.base).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|e| AptError::Scan(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.base)
                .map_err(|e| AptError::Scan(e.to_string()))?
                .to_path_buf();
            if !matches_any(&patterns, &relative) {
                continue;
            }

            let key = glob_path(&relative);
            let digest = fingerprint(entry.path())?;
            if previous.fingerprints.get(&key) != Some(&digest) {
                self.included.push(relative);
            }
            fingerprints.insert(key, digest);
        }

        debug!(
            base = %self.base.display(),
            matched = fingerprints.len(),
            changed = self.included.len(),
            incremental = self.incremental,
            "Scanned source directory"
        );

        let stamp = ScanStamp {
            version: STAMP_VERSION,
            base_dir: self.base.display().to_string(),
            includes: self.includes.clone(),
            fingerprints,
        };
        self.pending.borrow_mut().insert(stamp_path, stamp);
        Ok(())
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.included.clone()
    }

    fn base_dir(&self) -> &Path {
        &self.base
    }
}
