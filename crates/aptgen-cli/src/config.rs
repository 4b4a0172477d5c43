//! CLI configuration

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use aptgen_core::{PluginArtifact, ProcessorSettings};
use aptgen_host::ProjectManifest;
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "aptgen.toml";

/// `[processor]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessorSection {
    pub processor: Option<String>,
    pub processors: Option<Vec<String>>,
    pub source_encoding: Option<String>,
    pub output_directory: Option<PathBuf>,
    pub test_output_directory: Option<PathBuf>,
    pub includes: BTreeSet<String>,
    pub show_warnings: bool,
    pub log_only_on_error: bool,
    pub plugin_artifacts: Vec<PluginArtifact>,
    /// Annotation processor options (`-A<key>=<value>`)
    pub options: BTreeMap<String, String>,
    /// Raw compiler options, applied last
    pub compiler_options: BTreeMap<String, String>,
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AptgenConfig {
    #[serde(default)]
    pub project: ProjectManifest,

    #[serde(default)]
    pub processor: ProcessorSection,
}

impl AptgenConfig {
    /// Load configuration from file and anchor its paths.
    ///
    /// Paths resolve against `project.base_dir`, which itself resolves
    /// against the directory holding the configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.is_file() {
            return Err(CliError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path)?;
        let config: AptgenConfig = toml::from_str(&contents)?;

        let absolute = std::path::absolute(path)?;
        let root = absolute.parent().unwrap_or_else(|| Path::new("/"));
        Ok(config.resolve(root))
    }

    fn resolve(mut self, root: &Path) -> Self {
        self.project = self.project.resolve(root);
        let project = &self.project;
        let processor = &mut self.processor;
        processor.output_directory = processor
            .output_directory
            .as_deref()
            .map(|p| project.path(p));
        processor.test_output_directory = processor
            .test_output_directory
            .as_deref()
            .map(|p| project.path(p));
        for artifact in &mut processor.plugin_artifacts {
            artifact.file = artifact.file.as_deref().map(|f| project.path(f));
        }
        self
    }

    /// Settings shared by both processing variants.
    pub fn processor_settings(&self) -> ProcessorSettings {
        let section = &self.processor;
        ProcessorSettings {
            processor: section.processor.clone(),
            processors: section.processors.clone(),
            source_encoding: section.source_encoding.clone(),
            options: section.options.clone(),
            compiler_options: section.compiler_options.clone(),
            includes: section.includes.clone(),
            show_warnings: section.show_warnings,
            log_only_on_error: section.log_only_on_error,
            plugin_artifacts: section.plugin_artifacts.clone(),
        }
    }
}
