//! In-memory collaborators.
//!
//! - **InMemoryProject**: classpath lists per scope and a source-root registry
//! - **SimulatedBuildContext**: virtual source trees with change tracking
//! - **SimulatedCompilerProvider**: a compiler that records every request
//!
//! Used by the test suites and by embedders that drive the orchestrator
//! without a real toolchain.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{AptError, AptResult};
use crate::filter::{compile_globs, matches_any};
use crate::host::{
    BuildContext, ChangeScanner, CompileRequest, CompilerProvider, JavaCompiler, ProjectModel,
};
use crate::types::{ClasspathScope, SourceRootKind};

// ── In-Memory Project ────────────────────────────────────────────────

/// Project model backed by plain vectors.
///
/// A scope whose classpath is `None` reports a dependency-resolution error.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProject {
    pub compile_classpath: Option<Vec<String>>,
    pub test_classpath: Option<Vec<String>>,
    pub source_roots: Vec<PathBuf>,
    pub test_source_roots: Vec<PathBuf>,
}

impl InMemoryProject {
    /// Both scopes resolved and empty.
    pub fn new() -> Self {
        Self {
            compile_classpath: Some(Vec::new()),
            test_classpath: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Neither scope resolved.
    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn with_compile_classpath<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compile_classpath = Some(elements.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_test_classpath<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_classpath = Some(elements.into_iter().map(Into::into).collect());
        self
    }

    /// Total number of registered roots across both lists.
    pub fn registration_count(&self) -> usize {
        self.source_roots.len() + self.test_source_roots.len()
    }
}

impl ProjectModel for InMemoryProject {
    fn classpath_elements(&self, scope: ClasspathScope) -> AptResult<Vec<String>> {
        let elements = match scope {
            ClasspathScope::Compile => &self.compile_classpath,
            ClasspathScope::Test => &self.test_classpath,
        };
        elements.clone().ok_or_else(|| {
            AptError::DependencyResolution(format!("{scope} scope has not been resolved"))
        })
    }

    fn add_source_root(&mut self, path: &Path, kind: SourceRootKind) {
        let roots = match kind {
            SourceRootKind::Main => &mut self.source_roots,
            SourceRootKind::Test => &mut self.test_source_roots,
        };
        if !roots.iter().any(|r| r == path) {
            roots.push(path.to_path_buf());
        }
    }
}

// ── Simulated Build Context ──────────────────────────────────────────

#[derive(Debug, Default)]
struct TreeState {
    incremental: bool,
    trees: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    changed: BTreeSet<(PathBuf, PathBuf)>,
    /// Reported by a scan, awaiting commit or discard.
    pending: BTreeSet<(PathBuf, PathBuf)>,
    refreshed: Vec<PathBuf>,
    commits: usize,
    scans: usize,
}

/// Virtual source trees with change tracking.
///
/// Added and touched files count as changed until a scan reports them.
/// Reported changes are restored by `discard` and dropped by `commit`.
#[derive(Clone, Debug)]
pub struct SimulatedBuildContext {
    state: Rc<RefCell<TreeState>>,
}

impl SimulatedBuildContext {
    /// Incremental context: scans report changed files only.
    pub fn new() -> Self {
        Self::with_mode(true)
    }

    /// Full-build context: scans report every matching file.
    pub fn full() -> Self {
        Self::with_mode(false)
    }

    fn with_mode(incremental: bool) -> Self {
        Self {
            state: Rc::new(RefCell::new(TreeState {
                incremental,
                ..TreeState::default()
            })),
        }
    }

    pub fn add_file(&self, base: &Path, relative: impl AsRef<Path>) {
        let rel = relative.as_ref().to_path_buf();
        let mut state = self.state.borrow_mut();
        state
            .trees
            .entry(base.to_path_buf())
            .or_default()
            .insert(rel.clone());
        state.changed.insert((base.to_path_buf(), rel));
    }

    /// Mark an existing file as modified.
    pub fn touch(&self, base: &Path, relative: impl AsRef<Path>) {
        let rel = relative.as_ref().to_path_buf();
        self.state
            .borrow_mut()
            .changed
            .insert((base.to_path_buf(), rel));
    }

    pub fn refreshed(&self) -> Vec<PathBuf> {
        self.state.borrow().refreshed.clone()
    }

    pub fn scan_count(&self) -> usize {
        self.state.borrow().scans
    }

    pub fn commit_count(&self) -> usize {
        self.state.borrow().commits
    }
}

impl Default for SimulatedBuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext for SimulatedBuildContext {
    fn new_scanner(&self, base_dir: &Path) -> Box<dyn ChangeScanner> {
        Box::new(SimulatedScanner {
            state: Rc::clone(&self.state),
            base: base_dir.to_path_buf(),
            includes: Vec::new(),
            included: Vec::new(),
        })
    }

    fn refresh(&mut self, path: &Path) {
        self.state.borrow_mut().refreshed.push(path.to_path_buf());
    }

    fn commit(&mut self) -> AptResult<()> {
        let mut state = self.state.borrow_mut();
        state.pending.clear();
        state.commits += 1;
        Ok(())
    }

    fn discard(&mut self) {
        let mut state = self.state.borrow_mut();
        let pending = std::mem::take(&mut state.pending);
        state.changed.extend(pending);
    }
}

struct SimulatedScanner {
    state: Rc<RefCell<TreeState>>,
    base: PathBuf,
    includes: Vec<String>,
    included: Vec<PathBuf>,
}

impl ChangeScanner for SimulatedScanner {
    fn set_includes(&mut self, patterns: Vec<String>) {
        self.includes = patterns;
    }

    fn scan(&mut self) -> AptResult<()> {
        let patterns = compile_globs(&self.includes)?;
        let mut state = self.state.borrow_mut();
        state.scans += 1;

        let candidates: Vec<PathBuf> = state
            .trees
            .get(&self.base)
            .map(|files| {
                files
                    .iter()
                    .filter(|rel| matches_any(&patterns, rel))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.included = if state.incremental {
            let changed: Vec<PathBuf> = candidates
                .into_iter()
                .filter(|rel| state.changed.contains(&(self.base.clone(), rel.clone())))
                .collect();
            for rel in &changed {
                let key = (self.base.clone(), rel.clone());
                state.changed.remove(&key);
                state.pending.insert(key);
            }
            changed
        } else {
            candidates
        };
        Ok(())
    }

    fn included_files(&self) -> Vec<PathBuf> {
        self.included.clone()
    }

    fn base_dir(&self) -> &Path {
        &self.base
    }
}

// ── Simulated Compiler ───────────────────────────────────────────────

/// Compiler that records requests and replays a canned result.
#[derive(Clone, Debug)]
pub struct SimulatedCompiler {
    success: bool,
    diagnostics: String,
    startable: bool,
    requests: Rc<RefCell<Vec<CompileRequest>>>,
}

impl JavaCompiler for SimulatedCompiler {
    fn name(&self) -> &str {
        "simulated-javac"
    }

    fn compile(&self, request: &CompileRequest, diagnostics: &mut dyn Write) -> AptResult<bool> {
        if !self.startable {
            return Err(AptError::Compiler("simulated compiler refused to start".into()));
        }
        self.requests.borrow_mut().push(request.clone());
        diagnostics.write_all(self.diagnostics.as_bytes())?;
        Ok(self.success)
    }
}

/// Provider handing out a [`SimulatedCompiler`], or nothing.
#[derive(Clone, Debug)]
pub struct SimulatedCompilerProvider {
    compiler: Option<SimulatedCompiler>,
    requests: Rc<RefCell<Vec<CompileRequest>>>,
}

impl SimulatedCompilerProvider {
    /// A compiler that succeeds without diagnostics.
    pub fn succeeding() -> Self {
        Self::available(true, "")
    }

    /// A compiler reporting `success` and writing `diagnostics`.
    pub fn available(success: bool, diagnostics: impl Into<String>) -> Self {
        let requests = Rc::new(RefCell::new(Vec::new()));
        Self {
            compiler: Some(SimulatedCompiler {
                success,
                diagnostics: diagnostics.into(),
                startable: true,
                requests: Rc::clone(&requests),
            }),
            requests,
        }
    }

    /// A compiler whose process cannot be started.
    pub fn broken() -> Self {
        let mut provider = Self::succeeding();
        if let Some(compiler) = provider.compiler.as_mut() {
            compiler.startable = false;
        }
        provider
    }

    /// No toolchain installed.
    pub fn missing() -> Self {
        Self {
            compiler: None,
            requests: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<CompileRequest> {
        self.requests.borrow().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl CompilerProvider for SimulatedCompilerProvider {
    fn system_compiler(&self) -> Option<Box<dyn JavaCompiler>> {
        self.compiler
            .clone()
            .map(|c| Box::new(c) as Box<dyn JavaCompiler>)
    }
}
