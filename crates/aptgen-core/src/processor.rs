//! Annotation processing orchestrator.
//!
//! `AnnotationProcessor` drives one processing pass:
//! prepare output → acquire compiler → validate processors → discover
//! files → assemble classpath and options → run `-proc:only` → register
//! the output directory with the project.
//!
//! Every error raised along the way is logged and re-raised as
//! `AptError::BuildFailed` with the original message. A compile task that
//! merely reports failure is not an error here; the outcome carries it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info};

use crate::classpath::build_classpath;
use crate::error::{AptError, AptResult};
use crate::filter::filter_files;
use crate::host::{BuildHost, CompileRequest, JavaCompiler};
use crate::options::{assemble_options, resolve_processor, OptionInputs};
use crate::sources::SourceSet;
use crate::types::{InvocationReport, InvocationResult, ProcessOutcome, ProcessorSettings};

/// Raised when no compiler can be found.
pub const TOOLCHAIN_MISSING_MESSAGE: &str = "You need to run build with JDK or have tools.jar on the classpath. \
     If this occurs during an IDE build make sure the IDE runs under a JDK as well";

// ── Annotation Processor ─────────────────────────────────────────────

/// One configured processing pass over a source set.
#[derive(Clone, Debug)]
pub struct AnnotationProcessor<S: SourceSet> {
    settings: ProcessorSettings,
    sources: S,
}

impl<S: SourceSet> AnnotationProcessor<S> {
    pub fn new(settings: ProcessorSettings, sources: S) -> Self {
        Self { settings, sources }
    }

    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    /// Run the pass against the host collaborators.
    ///
    /// Scanned changes are committed to the build context only when the
    /// pass succeeds; otherwise they are discarded so the next incremental
    /// pass reports them again.
    pub fn execute(&self, host: &mut BuildHost<'_>) -> AptResult<ProcessOutcome> {
        let outcome = self.run(host).and_then(|outcome| {
            if outcome.is_success() {
                host.build_context.commit()?;
            } else {
                host.build_context.discard();
            }
            Ok(outcome)
        });
        outcome.map_err(|e| {
            host.build_context.discard();
            error!(error = %e, "Annotation processing failed");
            AptError::build_failed(e)
        })
    }

    fn run(&self, host: &mut BuildHost<'_>) -> AptResult<ProcessOutcome> {
        let started = Instant::now();

        // Step 1: Output directory
        if let Some(output) = self.sources.output_directory() {
            prepare_output_directory(output)?;
        }

        // Step 2: Compiler
        let compiler = host
            .compilers
            .system_compiler()
            .ok_or_else(|| AptError::ToolchainMissing(TOOLCHAIN_MISSING_MESSAGE.into()))?;
        debug!(compiler = compiler.name(), "Using system compiler");

        // Step 3: Processor configuration
        let processor = resolve_processor(&self.settings)?;

        // Step 4: Working set
        let source_directory = self.sources.source_directory();
        let files = filter_files(
            &*host.build_context,
            source_directory,
            &self.settings.includes,
        )?;
        if files.is_empty() {
            debug!(
                source_directory = %source_directory.display(),
                "There are no sources to generate classes from (skipping)"
            );
            return Ok(ProcessOutcome::NothingToProcess);
        }

        // Step 5: Classpath and options
        let classpath = build_classpath(
            &*host.project,
            self.sources.classpath_scope(),
            &self.settings.plugin_artifacts,
        )?;
        let source_root = canonical_path(source_directory)?;
        let options = assemble_options(&OptionInputs::from_settings(
            &self.settings,
            &processor,
            classpath.as_deref(),
            self.sources.output_directory(),
            &source_root,
        ));

        // Step 6: Invoke
        let request = CompileRequest {
            compilation_units: files.to_vec(),
            arguments: options.to_arguments(),
        };
        info!(
            processor = %processor,
            files = files.len(),
            test = self.sources.is_for_test(),
            "Running annotation processors"
        );
        let result = self.invoke(compiler.as_ref(), &request)?;

        // Step 7: Register output
        let root_kind = self.sources.source_root_kind();
        let registered_root = match self.sources.output_directory() {
            Some(output) => {
                let absolute = std::path::absolute(output)?;
                host.project.add_source_root(&absolute, root_kind);
                host.build_context.refresh(&absolute);
                debug!(root = %absolute.display(), kind = %root_kind, "Registered generated sources");
                Some(absolute)
            }
            None => None,
        };

        Ok(ProcessOutcome::Processed(InvocationReport {
            result,
            file_count: files.len(),
            arguments: request.arguments,
            registered_root,
            root_kind,
            elapsed_ms: elapsed_millis(started.elapsed()),
            completed_at: Utc::now(),
        }))
    }

    /// Stream diagnostics to stderr, or buffer them and only log them
    /// when the task fails.
    fn invoke(
        &self,
        compiler: &dyn JavaCompiler,
        request: &CompileRequest,
    ) -> AptResult<InvocationResult> {
        if !self.settings.log_only_on_error {
            let stderr = std::io::stderr();
            let mut sink = stderr.lock();
            let success = compiler.compile(request, &mut sink)?;
            return Ok(InvocationResult {
                success,
                diagnostics: None,
            });
        }

        let mut buffer = Vec::new();
        let success = compiler.compile(request, &mut buffer)?;
        if success {
            return Ok(InvocationResult {
                success,
                diagnostics: None,
            });
        }

        let text = String::from_utf8_lossy(&buffer).into_owned();
        error!("{text}");
        Ok(InvocationResult {
            success,
            diagnostics: Some(text),
        })
    }
}

fn prepare_output_directory(output: &Path) -> AptResult<()> {
    if !output.exists() {
        std::fs::create_dir_all(output)?;
        debug!(output = %output.display(), "Created output directory");
    }
    Ok(())
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Canonical form when the path exists, absolute form otherwise.
fn canonical_path(path: &Path) -> AptResult<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(canonical) => Ok(canonical),
        Err(_) => Ok(std::path::absolute(path)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulated::{InMemoryProject, SimulatedBuildContext, SimulatedCompilerProvider};
    use crate::sources::{MainSources, TestSources};
    use crate::types::SourceRootKind;

    const SRC: &str = "/work/src/main/java";
    const TEST_SRC: &str = "/work/src/test/java";

    fn settings() -> ProcessorSettings {
        ProcessorSettings::with_processor("com.acme.EntityProcessor")
    }

    fn main_sources() -> MainSources {
        MainSources::new(SRC, None)
    }

    fn context_with(base: &str, files: &[&str]) -> SimulatedBuildContext {
        let ctx = SimulatedBuildContext::new();
        for f in files {
            ctx.add_file(Path::new(base), f);
        }
        ctx
    }

    fn run<S: SourceSet>(
        processor: &AnnotationProcessor<S>,
        project: &mut InMemoryProject,
        ctx: &mut SimulatedBuildContext,
        compilers: &SimulatedCompilerProvider,
    ) -> AptResult<ProcessOutcome> {
        let mut host = BuildHost::new(project, ctx, compilers);
        processor.execute(&mut host)
    }

    #[test]
    fn processes_changed_sources() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new().with_compile_classpath(["/lib/a.jar"]);
        let mut ctx = context_with(SRC, &["com/acme/User.java", "com/acme/Order.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let outcome = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.file_count(), 2);

        let requests = compilers.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].compilation_units.len(), 2);
        assert_eq!(&requests[0].arguments[..2], &["-cp", "/lib/a.jar"]);
        assert!(requests[0].arguments.contains(&"-proc:only".to_string()));
    }

    #[test]
    fn missing_processor_fails_before_discovery() {
        let processor = AnnotationProcessor::new(ProcessorSettings::default(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let err = run(&processor, &mut project, &mut ctx, &compilers).unwrap_err();
        assert!(matches!(err, AptError::BuildFailed { .. }));
        assert!(matches!(err.root_cause(), AptError::InvalidConfiguration(_)));
        assert_eq!(ctx.scan_count(), 0);
        assert_eq!(compilers.invocation_count(), 0);
    }

    #[test]
    fn missing_toolchain_is_fatal() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::missing();

        let err = run(&processor, &mut project, &mut ctx, &compilers).unwrap_err();
        assert!(err.to_string().contains("JDK"));
        assert!(matches!(err.root_cause(), AptError::ToolchainMissing(_)));
        assert_eq!(ctx.scan_count(), 0);
    }

    #[test]
    fn empty_working_set_short_circuits() {
        let out = tempfile::tempdir().unwrap();
        let sources = MainSources::new(SRC, Some(out.path().join("gen")));
        let processor = AnnotationProcessor::new(settings(), sources);
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["README.md"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let outcome = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(matches!(outcome, ProcessOutcome::NothingToProcess));
        assert!(outcome.is_success());
        assert_eq!(compilers.invocation_count(), 0);
        assert_eq!(project.registration_count(), 0);
        assert!(ctx.refreshed().is_empty());
    }

    #[test]
    fn second_run_without_changes_is_noop() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["com/acme/User.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let first = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert_eq!(first.file_count(), 1);
        let second = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(matches!(second, ProcessOutcome::NothingToProcess));
        assert_eq!(compilers.invocation_count(), 1);
    }

    #[test]
    fn failed_task_is_retried_on_next_run() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["com/acme/User.java"]);

        let failing = SimulatedCompilerProvider::available(false, "User.java:1: error\n");
        let first = run(&processor, &mut project, &mut ctx, &failing).unwrap();
        assert!(!first.is_success());
        assert_eq!(ctx.commit_count(), 0);

        let succeeding = SimulatedCompilerProvider::succeeding();
        let second = run(&processor, &mut project, &mut ctx, &succeeding).unwrap();
        assert!(second.is_success());
        assert_eq!(second.file_count(), 1);
        assert_eq!(succeeding.invocation_count(), 1);
        assert_eq!(ctx.commit_count(), 1);
    }

    #[test]
    fn build_fatal_error_keeps_changes_pending() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);

        let broken = SimulatedCompilerProvider::broken();
        run(&processor, &mut project, &mut ctx, &broken).unwrap_err();

        let succeeding = SimulatedCompilerProvider::succeeding();
        let outcome = run(&processor, &mut project, &mut ctx, &succeeding).unwrap();
        assert_eq!(outcome.file_count(), 1);
    }

    #[test]
    fn registers_main_output_once() {
        let out = tempfile::tempdir().unwrap();
        let gen = out.path().join("generated-sources/java");
        let sources = MainSources::new(SRC, Some(gen.clone()));
        let processor = AnnotationProcessor::new(settings(), sources);
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let outcome = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(gen.is_dir());
        assert_eq!(project.source_roots, vec![gen.clone()]);
        assert!(project.test_source_roots.is_empty());
        assert_eq!(ctx.refreshed(), vec![gen.clone()]);

        let report = outcome.report().unwrap();
        assert_eq!(report.registered_root.as_deref(), Some(gen.as_path()));
        assert_eq!(report.root_kind, SourceRootKind::Main);
        let s = report.arguments.iter().position(|a| a == "-s").unwrap();
        assert_eq!(report.arguments[s + 1], gen.display().to_string());
    }

    #[test]
    fn test_pass_uses_test_scope_and_roots() {
        let out = tempfile::tempdir().unwrap();
        let sources = TestSources::new(TEST_SRC, None, Some(out.path().to_path_buf()));
        let processor = AnnotationProcessor::new(settings(), sources);
        let mut project = InMemoryProject::new()
            .with_compile_classpath(["/main.jar"])
            .with_test_classpath(["/junit.jar"]);
        let mut ctx = context_with(TEST_SRC, &["FooTest.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert_eq!(compilers.requests()[0].arguments[1], "/junit.jar");
        assert!(project.source_roots.is_empty());
        assert_eq!(project.test_source_roots.len(), 1);
    }

    #[test]
    fn existing_output_directory_is_reused() {
        let out = tempfile::tempdir().unwrap();
        let sources = MainSources::new(SRC, Some(out.path().to_path_buf()));
        let processor = AnnotationProcessor::new(settings(), sources);
        let mut project = InMemoryProject::new();
        let mut ctx = SimulatedBuildContext::full();
        ctx.add_file(Path::new(SRC), "A.java");
        let compilers = SimulatedCompilerProvider::succeeding();

        run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert_eq!(compilers.invocation_count(), 2);
        assert_eq!(project.source_roots.len(), 1);
    }

    #[test]
    fn unresolved_dependencies_still_compile() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::unresolved();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        let args = &compilers.requests()[0].arguments;
        assert!(!args.contains(&"-cp".to_string()));
        assert_eq!(args[0], "-proc:only");
    }

    /// Project whose classpath lookup fails with something other than a
    /// dependency-resolution error.
    struct UnreadableProject;

    impl crate::host::ProjectModel for UnreadableProject {
        fn classpath_elements(
            &self,
            _scope: crate::types::ClasspathScope,
        ) -> AptResult<Vec<String>> {
            Err(AptError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "classpath index unreadable",
            )))
        }

        fn add_source_root(&mut self, _path: &Path, _kind: SourceRootKind) {}
    }

    #[test]
    fn classpath_io_failure_is_build_fatal() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = UnreadableProject;
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let mut host = BuildHost::new(&mut project, &mut ctx, &compilers);
        let err = processor.execute(&mut host).unwrap_err();
        assert!(matches!(err, AptError::BuildFailed { .. }));
        assert!(matches!(err.root_cause(), AptError::Io(_)));
        assert!(err.to_string().contains("classpath index unreadable"));
        assert_eq!(compilers.invocation_count(), 0);
    }

    #[test]
    fn failed_task_is_reported_not_raised() {
        let mut s = settings();
        s.log_only_on_error = true;
        let processor = AnnotationProcessor::new(s, main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::available(false, "A.java:1: error: boom\n");

        let outcome = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(!outcome.is_success());
        let report = outcome.report().unwrap();
        assert_eq!(
            report.result.diagnostics.as_deref(),
            Some("A.java:1: error: boom\n")
        );
    }

    #[test]
    fn successful_buffered_task_discards_diagnostics() {
        let mut s = settings();
        s.log_only_on_error = true;
        let processor = AnnotationProcessor::new(s, main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::available(true, "Note: generated 1 file\n");

        let outcome = run(&processor, &mut project, &mut ctx, &compilers).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.report().unwrap().result.diagnostics, None);
    }

    #[test]
    fn compiler_start_failure_is_build_fatal() {
        let processor = AnnotationProcessor::new(settings(), main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::broken();

        let err = run(&processor, &mut project, &mut ctx, &compilers).unwrap_err();
        assert!(matches!(err.root_cause(), AptError::Compiler(_)));
        assert_eq!(project.registration_count(), 0);
    }

    #[test]
    fn elapsed_time_saturates() {
        assert_eq!(elapsed_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(elapsed_millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn invalid_include_is_build_fatal() {
        let mut s = settings();
        s.includes.insert("com.acme***".into());
        let processor = AnnotationProcessor::new(s, main_sources());
        let mut project = InMemoryProject::new();
        let mut ctx = context_with(SRC, &["A.java"]);
        let compilers = SimulatedCompilerProvider::succeeding();

        let err = run(&processor, &mut project, &mut ctx, &compilers).unwrap_err();
        assert!(err.to_string().contains("com.acme***"));
    }
}
