//! Main and test source sets.
//!
//! A source set only names the directory pair a run works on and whether
//! it is the test pass. The test flag selects the classpath scope and the
//! source-root list the output directory is registered into; nothing else
//! differs between the two.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{ClasspathScope, SourceRootKind};

/// Directory pair and mode for one processing pass.
pub trait SourceSet {
    fn source_directory(&self) -> &Path;

    fn output_directory(&self) -> Option<&Path>;

    fn is_for_test(&self) -> bool {
        false
    }

    fn classpath_scope(&self) -> ClasspathScope {
        ClasspathScope::for_test(self.is_for_test())
    }

    fn source_root_kind(&self) -> SourceRootKind {
        SourceRootKind::for_test(self.is_for_test())
    }
}

/// Production sources, e.g. `src/main/java`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainSources {
    pub source_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
}

impl MainSources {
    pub fn new(source_directory: impl Into<PathBuf>, output_directory: Option<PathBuf>) -> Self {
        Self {
            source_directory: source_directory.into(),
            output_directory,
        }
    }
}

impl SourceSet for MainSources {
    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn output_directory(&self) -> Option<&Path> {
        self.output_directory.as_deref()
    }
}

/// Test sources, e.g. `src/test/java`.
///
/// Generates into `test_output_directory`, falling back to the shared
/// `output_directory`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSources {
    pub source_directory: PathBuf,
    pub output_directory: Option<PathBuf>,
    pub test_output_directory: Option<PathBuf>,
}

impl TestSources {
    pub fn new(
        source_directory: impl Into<PathBuf>,
        output_directory: Option<PathBuf>,
        test_output_directory: Option<PathBuf>,
    ) -> Self {
        Self {
            source_directory: source_directory.into(),
            output_directory,
            test_output_directory,
        }
    }
}

impl SourceSet for TestSources {
    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn output_directory(&self) -> Option<&Path> {
        self.test_output_directory
            .as_deref()
            .or(self.output_directory.as_deref())
    }

    fn is_for_test(&self) -> bool {
        true
    }
}
