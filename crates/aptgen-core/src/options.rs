//! Compiler option assembly.
//!
//! Options are collected in a [`CompilerOptionMap`], an insertion-ordered
//! key/value builder. Writing an existing key replaces its value and keeps
//! the key where it was first inserted, so precedence is simply the order
//! of writes: defaults, then derived values, then user overrides.
//!
//! Emission order of the assembled map:
//!
//! | Key          | Value            | When                         |
//! |--------------|------------------|------------------------------|
//! | `cp`         | classpath        | classpath resolved           |
//! | `encoding`   | source encoding  | encoding configured          |
//! | `proc:only`  | -                | always                       |
//! | `processor`  | processor list   | always                       |
//! | `A<k>=<v>`   | -                | per annotation option        |
//! | `s`          | output directory | output directory configured  |
//! | `nowarn`     | -                | warnings disabled            |
//! | `sourcepath` | source root      | always                       |
//! | *overrides*  | as given         | user compiler options        |

use std::collections::BTreeMap;
use std::path::Path;

use tracing::error;

use crate::error::{AptError, AptResult};
use crate::types::ProcessorSettings;

// ── Option Keys ──────────────────────────────────────────────────────

pub const CLASSPATH: &str = "cp";
pub const ENCODING: &str = "encoding";
pub const PROC_ONLY: &str = "proc:only";
pub const PROCESSOR: &str = "processor";
pub const GENERATED_SOURCE_OUTPUT: &str = "s";
pub const NO_WARN: &str = "nowarn";
pub const SOURCEPATH: &str = "sourcepath";

/// Key for an annotation processor option; the whole `A<key>=<value>`
/// string is the flag, so distinct pairs never collide.
pub fn annotation_option_key(key: &str, value: &str) -> String {
    format!("A{key}={value}")
}

// ── Compiler Option Map ──────────────────────────────────────────────

/// Insertion-ordered option map with last-write-wins values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerOptionMap {
    entries: Vec<(String, Option<String>)>,
}

impl CompilerOptionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing key keeps its position.
    pub fn put(&mut self, key: impl Into<String>, value: Option<String>) -> &mut Self {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    pub fn put_value(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, Some(value.into()))
    }

    pub fn put_flag(&mut self, key: impl Into<String>) -> &mut Self {
        self.put(key, None)
    }

    /// Layer overrides on top; every key they name wins.
    pub fn merge<'a, I>(&mut self, overrides: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in overrides {
            self.put(key.clone(), Some(value.clone()));
        }
        self
    }

    /// `Some(None)` for a flag-only entry, `None` for an absent key.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Emit `-<key>` per entry, followed by the value as its own token
    /// when the value is not blank.
    pub fn to_arguments(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);
        for (key, value) in &self.entries {
            args.push(format!("-{key}"));
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                args.push(value.to_string());
            }
        }
        args
    }
}

// ── Processor Resolution ─────────────────────────────────────────────

/// Comma-joined `processors`, else `processor`, else a configuration error.
pub fn resolve_processor(settings: &ProcessorSettings) -> AptResult<String> {
    if let Some(processors) = settings.processors.as_ref().filter(|p| !p.is_empty()) {
        return Ok(processors.join(","));
    }
    match settings.processor.as_deref() {
        Some(processor) => Ok(processor.to_string()),
        None => {
            let message = "Either processor or processors need to be given";
            error!("{message}");
            Err(AptError::InvalidConfiguration(message.into()))
        }
    }
}

// ── Assembly ─────────────────────────────────────────────────────────

/// Inputs to [`assemble_options`].
#[derive(Clone, Debug)]
pub struct OptionInputs<'a> {
    pub processor: &'a str,
    pub classpath: Option<&'a str>,
    pub source_encoding: Option<&'a str>,
    pub processor_options: &'a BTreeMap<String, String>,
    pub output_directory: Option<&'a Path>,
    pub show_warnings: bool,
    /// Canonical absolute path of the source root.
    pub source_root: &'a Path,
    pub overrides: &'a BTreeMap<String, String>,
}

impl<'a> OptionInputs<'a> {
    /// Everything except processor, classpath, output and source root
    /// taken from `settings`.
    pub fn from_settings(
        settings: &'a ProcessorSettings,
        processor: &'a str,
        classpath: Option<&'a str>,
        output_directory: Option<&'a Path>,
        source_root: &'a Path,
    ) -> Self {
        Self {
            processor,
            classpath,
            source_encoding: settings.source_encoding.as_deref(),
            processor_options: &settings.options,
            output_directory,
            show_warnings: settings.show_warnings,
            source_root,
            overrides: &settings.compiler_options,
        }
    }
}

/// Build the option map in emission order and layer the overrides last.
pub fn assemble_options(inputs: &OptionInputs<'_>) -> CompilerOptionMap {
    let mut opts = CompilerOptionMap::new();

    if let Some(classpath) = inputs.classpath {
        opts.put_value(CLASSPATH, classpath);
    }
    if let Some(encoding) = inputs.source_encoding {
        opts.put_value(ENCODING, encoding);
    }
    opts.put_flag(PROC_ONLY);
    opts.put_value(PROCESSOR, inputs.processor);

    for (key, value) in inputs.processor_options {
        opts.put_flag(annotation_option_key(key, value));
    }

    if let Some(output) = inputs.output_directory {
        opts.put_value(GENERATED_SOURCE_OUTPUT, output.display().to_string());
    }
    if !inputs.show_warnings {
        opts.put_flag(NO_WARN);
    }
    opts.put_value(SOURCEPATH, inputs.source_root.display().to_string());

    opts.merge(inputs.overrides);
    opts
}
