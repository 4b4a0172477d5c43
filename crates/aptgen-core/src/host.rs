//! Collaborator seams the orchestrator drives.
//!
//! The host build owns the project model, the change-tracking build
//! context, and the compiler toolchain. The orchestrator only sees them
//! through these traits, so every step can run against in-memory fakes.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AptResult;
use crate::types::{ClasspathScope, SourceRootKind};

// ── Project Model ────────────────────────────────────────────────────

/// The host project: dependency resolution and source-root registry.
pub trait ProjectModel {
    /// Ordered classpath elements for a scope.
    ///
    /// Fails with `AptError::DependencyResolution` when the scope's
    /// dependencies have not been resolved.
    fn classpath_elements(&self, scope: ClasspathScope) -> AptResult<Vec<String>>;

    /// Register a directory as an additional source root.
    fn add_source_root(&mut self, path: &Path, kind: SourceRootKind);
}

// ── Build Context ────────────────────────────────────────────────────

/// Change-aware directory scanner handed out by the build context.
///
/// In incremental builds only files changed since the previous build are
/// reported; otherwise every matching file is.
pub trait ChangeScanner {
    /// Replace the include globs (`/`-separated, `**` crosses directories).
    fn set_includes(&mut self, patterns: Vec<String>);

    fn scan(&mut self) -> AptResult<()>;

    /// Files found by the last `scan`, relative to `base_dir`.
    fn included_files(&self) -> Vec<PathBuf>;

    fn base_dir(&self) -> &Path;
}

/// Incremental-build service of the host.
pub trait BuildContext {
    fn new_scanner(&self, base_dir: &Path) -> Box<dyn ChangeScanner>;

    /// Tell the host that files under `path` changed.
    fn refresh(&mut self, path: &Path);

    /// Accept the changes reported by this pass's scans; later incremental
    /// scans no longer report them.
    fn commit(&mut self) -> AptResult<()> {
        Ok(())
    }

    /// Forget this pass's scans so the next incremental scan reports the
    /// same changes again.
    fn discard(&mut self) {}
}

// ── Compiler ─────────────────────────────────────────────────────────

/// One processing-only compile task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileRequest {
    pub compilation_units: Vec<PathBuf>,
    pub arguments: Vec<String>,
}

/// A Java compiler able to run annotation processors.
pub trait JavaCompiler {
    fn name(&self) -> &str;

    /// Run the task, writing diagnostics to `diagnostics`.
    ///
    /// `Ok(false)` means the compiler ran and reported errors; `Err` means
    /// it could not be run at all.
    fn compile(&self, request: &CompileRequest, diagnostics: &mut dyn Write) -> AptResult<bool>;
}

/// Locates the system compiler.
pub trait CompilerProvider {
    fn system_compiler(&self) -> Option<Box<dyn JavaCompiler>>;
}

// ── Build Host ───────────────────────────────────────────────────────

/// The host collaborators borrowed for the duration of one run.
pub struct BuildHost<'a> {
    pub project: &'a mut dyn ProjectModel,
    pub build_context: &'a mut dyn BuildContext,
    pub compilers: &'a dyn CompilerProvider,
}

impl<'a> BuildHost<'a> {
    pub fn new(
        project: &'a mut dyn ProjectModel,
        build_context: &'a mut dyn BuildContext,
        compilers: &'a dyn CompilerProvider,
    ) -> Self {
        Self {
            project,
            build_context,
            compilers,
        }
    }
}
