//! Core types for annotation-processing runs.
//!
//! Defines classpath scopes, source-root kinds, plugin artifacts, processor
//! settings, the file working set, and the outcome of one invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

// ── Scopes and Kinds ─────────────────────────────────────────────────

/// Dependency scope the project model resolves classpath elements for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClasspathScope {
    Compile,
    Test,
}

impl ClasspathScope {
    pub fn for_test(is_for_test: bool) -> Self {
        if is_for_test {
            Self::Test
        } else {
            Self::Compile
        }
    }
}

impl std::fmt::Display for ClasspathScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Which source-root list a generated directory is registered into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRootKind {
    Main,
    Test,
}

impl SourceRootKind {
    pub fn for_test(is_for_test: bool) -> Self {
        if is_for_test {
            Self::Test
        } else {
            Self::Main
        }
    }
}

impl std::fmt::Display for SourceRootKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Test => write!(f, "test"),
        }
    }
}

// ── Plugin Artifacts ─────────────────────────────────────────────────

/// A jar the processing tool itself runs with (processor implementations,
/// their runtime). Artifacts without a file are not on the classpath.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginArtifact {
    pub id: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl PluginArtifact {
    pub fn new(id: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            file: Some(file.into()),
        }
    }

    /// An artifact that was declared but never resolved to a file.
    pub fn unresolved(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file: None,
        }
    }
}

// ── Processor Settings ───────────────────────────────────────────────

/// User-facing configuration shared by the main and test variants.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Single processor class name.
    pub processor: Option<String>,
    /// Processor class names; takes precedence over `processor`.
    pub processors: Option<Vec<String>>,
    /// Source file encoding passed as `-encoding`.
    pub source_encoding: Option<String>,
    /// Annotation processor options, emitted as `-A<key>=<value>`.
    pub options: BTreeMap<String, String>,
    /// Raw compiler options applied last; blank values are flag-only.
    pub compiler_options: BTreeMap<String, String>,
    /// Dotted package include patterns, e.g. `com.example.**.model.**`.
    pub includes: BTreeSet<String>,
    pub show_warnings: bool,
    /// Buffer compiler diagnostics and only log them when the task fails.
    pub log_only_on_error: bool,
    pub plugin_artifacts: Vec<PluginArtifact>,
}

impl ProcessorSettings {
    /// Settings naming a single processor, everything else defaulted.
    pub fn with_processor(processor: impl Into<String>) -> Self {
        Self {
            processor: Some(processor.into()),
            ..Self::default()
        }
    }
}

// ── File Working Set ─────────────────────────────────────────────────

/// Deduplicated set of absolute source files handed to the compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileWorkingSet {
    files: BTreeSet<PathBuf>,
}

impl FileWorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the file was already present.
    pub fn insert(&mut self, file: PathBuf) -> bool {
        self.files.insert(file)
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.files.contains(file)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.files.iter().cloned().collect()
    }
}

impl FromIterator<PathBuf> for FileWorkingSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

// ── Invocation Outcome ───────────────────────────────────────────────

/// Result of running the compile task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResult {
    pub success: bool,
    /// Buffered diagnostics; `None` when output was streamed.
    pub diagnostics: Option<String>,
}

/// Everything a caller may want to know about one processed run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvocationReport {
    pub result: InvocationResult,
    pub file_count: usize,
    pub arguments: Vec<String>,
    /// Output directory registered with the project, if any.
    pub registered_root: Option<PathBuf>,
    pub root_kind: SourceRootKind,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl InvocationReport {
    pub fn succeeded(&self) -> bool {
        self.result.success
    }
}

/// Terminal state of `AnnotationProcessor::execute`.
#[derive(Clone, Debug)]
pub enum ProcessOutcome {
    /// The working set was empty; the compiler was not invoked.
    NothingToProcess,
    /// The compile task ran; inspect the report for its result.
    Processed(InvocationReport),
}

impl ProcessOutcome {
    /// `false` only when the compile task itself reported failure.
    pub fn is_success(&self) -> bool {
        match self {
            Self::NothingToProcess => true,
            Self::Processed(report) => report.succeeded(),
        }
    }

    pub fn report(&self) -> Option<&InvocationReport> {
        match self {
            Self::NothingToProcess => None,
            Self::Processed(report) => Some(report),
        }
    }

    pub fn file_count(&self) -> usize {
        self.report().map(|r| r.file_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_follows_test_flag() {
        assert_eq!(ClasspathScope::for_test(false), ClasspathScope::Compile);
        assert_eq!(ClasspathScope::for_test(true), ClasspathScope::Test);
        assert_eq!(SourceRootKind::for_test(true), SourceRootKind::Test);
        assert_eq!(ClasspathScope::Test.to_string(), "test");
        assert_eq!(SourceRootKind::Main.to_string(), "main");
    }

    #[test]
    fn working_set_deduplicates() {
        let mut set = FileWorkingSet::new();
        assert!(set.insert(PathBuf::from("/src/A.java")));
        assert!(!set.insert(PathBuf::from("/src/A.java")));
        assert!(set.insert(PathBuf::from("/src/B.java")));
        assert_eq!(set.len(), 2);
        assert!(set.contains(Path::new("/src/B.java")));
    }

    #[test]
    fn working_set_iterates_in_path_order() {
        let set: FileWorkingSet = vec![
            PathBuf::from("/src/z/Z.java"),
            PathBuf::from("/src/a/A.java"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            set.to_vec(),
            vec![PathBuf::from("/src/a/A.java"), PathBuf::from("/src/z/Z.java")]
        );
    }

    #[test]
    fn settings_default_is_unconfigured() {
        let settings = ProcessorSettings::default();
        assert!(settings.processor.is_none());
        assert!(settings.processors.is_none());
        assert!(!settings.show_warnings);
        assert!(!settings.log_only_on_error);
        assert!(settings.includes.is_empty());
    }

    #[test]
    fn nothing_to_process_counts_as_success() {
        let outcome = ProcessOutcome::NothingToProcess;
        assert!(outcome.is_success());
        assert_eq!(outcome.file_count(), 0);
        assert!(outcome.report().is_none());
    }

    #[test]
    fn unresolved_artifact_has_no_file() {
        let a = PluginArtifact::unresolved("apt-runtime");
        assert!(a.file.is_none());
        let b = PluginArtifact::new("apt", "/repo/apt.jar");
        assert_eq!(b.file.as_deref(), Some(Path::new("/repo/apt.jar")));
    }
}
