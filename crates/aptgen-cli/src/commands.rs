//! `process` / `test-process` execution

use std::path::PathBuf;

use aptgen_core::{
    AnnotationProcessor, BuildHost, MainSources, ProcessOutcome, SourceSet, TestSources,
};
use aptgen_host::{BuildRecord, FsBuildContext, ManifestProject, SystemCompilerProvider};
use tracing::{debug, info};

use crate::config::AptgenConfig;
use crate::error::CliResult;

/// Which source set a run processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Main,
    Test,
}

impl Mode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Main => "process",
            Self::Test => "test-process",
        }
    }
}

/// Flags that shape the host collaborators.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report every matching source instead of only changed ones
    pub full: bool,
    /// Explicit `javac` executable
    pub javac: Option<PathBuf>,
}

/// Run one processing pass and write its build record.
pub fn execute(mode: Mode, config: &AptgenConfig, options: &RunOptions) -> CliResult<BuildRecord> {
    let manifest = config.project.clone();
    let settings = config.processor_settings();
    let section = &config.processor;

    let mut project = ManifestProject::new(manifest.clone());
    let mut build_context = FsBuildContext::new(&manifest.state_directory, !options.full);
    let compilers = match &options.javac {
        Some(javac) => SystemCompilerProvider::with_executable(javac),
        None => SystemCompilerProvider::new(),
    };

    let outcome = {
        let mut host = BuildHost::new(&mut project, &mut build_context, &compilers);
        match mode {
            Mode::Main => run(
                AnnotationProcessor::new(
                    settings,
                    MainSources::new(
                        manifest.source_directory.clone(),
                        section.output_directory.clone(),
                    ),
                ),
                &mut host,
            )?,
            Mode::Test => run(
                AnnotationProcessor::new(
                    settings,
                    TestSources::new(
                        manifest.test_source_directory.clone(),
                        section.output_directory.clone(),
                        section.test_output_directory.clone(),
                    ),
                ),
                &mut host,
            )?,
        }
    };

    let record = BuildRecord::new(mode.name(), &outcome, &project, build_context.refreshed());
    let record_path = manifest
        .state_directory
        .join(format!("{}-record.json", mode.name()));
    record.write_to(&record_path)?;
    debug!(record = %record_path.display(), "Wrote build record");
    Ok(record)
}

fn run<S: SourceSet>(
    processor: AnnotationProcessor<S>,
    host: &mut BuildHost<'_>,
) -> CliResult<ProcessOutcome> {
    info!(
        source_directory = %processor.sources().source_directory().display(),
        test = processor.sources().is_for_test(),
        "Starting annotation processing"
    );
    Ok(processor.execute(host)?)
}
