//! # aptgen-core
//!
//! Drives a Java compiler's annotation-processing phase (`-proc:only`)
//! over the part of a source tree that actually changed.
//!
//! One processing pass:
//!
//! 1. selects the working set through the host's change-aware scanner,
//!    narrowed by dotted package include patterns;
//! 2. resolves the compile classpath, degrading to "no classpath" when the
//!    project cannot resolve its dependencies;
//! 3. assembles the compiler options in a fixed order, with user overrides
//!    applied last;
//! 4. runs the compile task and registers the generated-sources directory
//!    with the project.
//!
//! The host build (project model, incremental build context, compiler
//! toolchain) is reached only through the traits in [`host`]; the
//! [`simulated`] module provides in-memory versions of each.

#![deny(unsafe_code)]

pub mod classpath;
pub mod error;
pub mod filter;
pub mod host;
pub mod options;
pub mod processor;
pub mod simulated;
pub mod sources;
pub mod types;

// ── Re-exports ──────────────────────────────────────────────────────

pub use classpath::{build_classpath, join_elements, PATH_SEPARATOR};
pub use error::{AptError, AptResult};
pub use filter::{filter_files, include_globs, IncludePattern, ALL_JAVA_FILES_FILTER};
pub use host::{
    BuildContext, BuildHost, ChangeScanner, CompileRequest, CompilerProvider, JavaCompiler,
    ProjectModel,
};
pub use options::{assemble_options, resolve_processor, CompilerOptionMap, OptionInputs};
pub use processor::AnnotationProcessor;
pub use simulated::{InMemoryProject, SimulatedBuildContext, SimulatedCompilerProvider};
pub use sources::{MainSources, SourceSet, TestSources};
pub use types::{
    ClasspathScope, FileWorkingSet, InvocationReport, InvocationResult, PluginArtifact,
    ProcessOutcome, ProcessorSettings, SourceRootKind,
};
