//! Manifest-backed project model and the per-run build record.

use std::path::{Path, PathBuf};

use aptgen_core::{
    AptError, AptResult, ClasspathScope, ProcessOutcome, ProjectModel, SourceRootKind,
    PATH_SEPARATOR,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_source_directory() -> PathBuf {
    PathBuf::from("src/main/java")
}

fn default_test_source_directory() -> PathBuf {
    PathBuf::from("src/test/java")
}

fn default_state_directory() -> PathBuf {
    PathBuf::from("target/aptgen")
}

// ── Manifest ─────────────────────────────────────────────────────────

/// Project layout and dependency lists, as read from configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_source_directory")]
    pub source_directory: PathBuf,
    #[serde(default = "default_test_source_directory")]
    pub test_source_directory: PathBuf,
    #[serde(default)]
    pub compile_classpath: Vec<String>,
    /// File holding one path-separator-joined classpath line.
    #[serde(default)]
    pub compile_classpath_file: Option<PathBuf>,
    #[serde(default)]
    pub test_classpath: Vec<String>,
    #[serde(default)]
    pub test_classpath_file: Option<PathBuf>,
    #[serde(default = "default_state_directory")]
    pub state_directory: PathBuf,
}

impl Default for ProjectManifest {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            source_directory: default_source_directory(),
            test_source_directory: default_test_source_directory(),
            compile_classpath: Vec::new(),
            compile_classpath_file: None,
            test_classpath: Vec::new(),
            test_classpath_file: None,
            state_directory: default_state_directory(),
        }
    }
}

impl ProjectManifest {
    /// Anchor `base_dir` at `root` and every other path at `base_dir`.
    pub fn resolve(mut self, root: &Path) -> Self {
        self.base_dir = root.join(&self.base_dir);
        let base = self.base_dir.clone();
        let anchor = |path: &Path| base.join(path);

        self.source_directory = anchor(&self.source_directory);
        self.test_source_directory = anchor(&self.test_source_directory);
        self.state_directory = anchor(&self.state_directory);
        self.compile_classpath_file = self.compile_classpath_file.as_deref().map(anchor);
        self.test_classpath_file = self.test_classpath_file.as_deref().map(anchor);
        for entry in self
            .compile_classpath
            .iter_mut()
            .chain(self.test_classpath.iter_mut())
        {
            *entry = anchor(Path::new(entry.as_str())).display().to_string();
        }
        self
    }

    /// Resolve a configured path against `base_dir`.
    pub fn path(&self, relative: &Path) -> PathBuf {
        self.base_dir.join(relative)
    }

    fn classpath_for(&self, scope: ClasspathScope) -> (&[String], Option<&Path>) {
        match scope {
            ClasspathScope::Compile => (
                &self.compile_classpath,
                self.compile_classpath_file.as_deref(),
            ),
            ClasspathScope::Test => (&self.test_classpath, self.test_classpath_file.as_deref()),
        }
    }
}

fn read_classpath_file(path: &Path) -> AptResult<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AptError::DependencyResolution(format!(
            "cannot read classpath file {}: {e}",
            path.display()
        ))
    })?;
    Ok(contents
        .lines()
        .flat_map(|line| line.split(PATH_SEPARATOR))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect())
}

// ── Project Model ────────────────────────────────────────────────────

/// [`ProjectModel`] over a resolved [`ProjectManifest`].
#[derive(Clone, Debug)]
pub struct ManifestProject {
    manifest: ProjectManifest,
    source_roots: Vec<PathBuf>,
    test_source_roots: Vec<PathBuf>,
}

impl ManifestProject {
    pub fn new(manifest: ProjectManifest) -> Self {
        Self {
            manifest,
            source_roots: Vec::new(),
            test_source_roots: Vec::new(),
        }
    }

    pub fn manifest(&self) -> &ProjectManifest {
        &self.manifest
    }

    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    pub fn test_source_roots(&self) -> &[PathBuf] {
        &self.test_source_roots
    }
}

impl ProjectModel for ManifestProject {
    fn classpath_elements(&self, scope: ClasspathScope) -> AptResult<Vec<String>> {
        let (inline, file) = self.manifest.classpath_for(scope);
        let mut elements = inline.to_vec();
        if let Some(file) = file {
            elements.extend(read_classpath_file(file)?);
        }
        debug!(%scope, count = elements.len(), "Resolved classpath elements");
        Ok(elements)
    }

    fn add_source_root(&mut self, path: &Path, kind: SourceRootKind) {
        let roots = match kind {
            SourceRootKind::Main => &mut self.source_roots,
            SourceRootKind::Test => &mut self.test_source_roots,
        };
        if !roots.iter().any(|existing| existing == path) {
            roots.push(path.to_path_buf());
        }
    }
}

// ── Build Record ─────────────────────────────────────────────────────

/// JSON summary of one run, written next to the scan stamps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    pub mode: String,
    pub completed_at: DateTime<Utc>,
    pub success: bool,
    /// Size of the working set; zero when nothing needed processing.
    pub files: usize,
    pub source_roots: Vec<PathBuf>,
    pub test_source_roots: Vec<PathBuf>,
    pub refreshed: Vec<PathBuf>,
}

impl BuildRecord {
    pub fn new(
        mode: impl Into<String>,
        outcome: &ProcessOutcome,
        project: &ManifestProject,
        refreshed: &[PathBuf],
    ) -> Self {
        Self {
            mode: mode.into(),
            completed_at: outcome
                .report()
                .map(|report| report.completed_at)
                .unwrap_or_else(Utc::now),
            success: outcome.is_success(),
            files: outcome.file_count(),
            source_roots: project.source_roots().to_vec(),
            test_source_roots: project.test_source_roots().to_vec(),
            refreshed: refreshed.to_vec(),
        }
    }

    pub fn write_to(&self, path: &Path) -> AptResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AptError::Serialization(format!("build record: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
