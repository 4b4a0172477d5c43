//! Incremental source file filter.
//!
//! Turns dotted package include patterns into path globs, hands them to
//! the host's change-aware scanner, and resolves what it reports into an
//! absolute [`FileWorkingSet`]. On a rebuild with no source changes the
//! scanner reports nothing and the working set comes back empty.

use std::path::Path;

use glob::{MatchOptions, Pattern};
use tracing::debug;

use crate::error::{AptError, AptResult};
use crate::host::BuildContext;
use crate::types::FileWorkingSet;

/// Suffix appended to every translated package pattern.
pub const JAVA_FILE_FILTER: &str = "/*.java";

/// Include glob used when no package patterns are configured.
pub const ALL_JAVA_FILES_FILTER: &str = "**/*.java";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

// ── Include Patterns ─────────────────────────────────────────────────

/// A compiled include glob over `/`-separated relative paths.
#[derive(Clone, Debug)]
pub struct IncludePattern {
    glob: String,
    pattern: Pattern,
}

impl IncludePattern {
    /// Translate a dotted package pattern: `com.acme.**.bo.**` becomes
    /// `com/acme/**/bo/**/*.java`.
    pub fn from_package(package: &str) -> AptResult<Self> {
        let glob = format!("{}{}", package.replace('.', "/"), JAVA_FILE_FILTER);
        Self::from_glob(&glob).map_err(|e| match e {
            AptError::InvalidIncludePattern { reason, .. } => AptError::InvalidIncludePattern {
                pattern: package.to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_glob(glob: &str) -> AptResult<Self> {
        let pattern = Pattern::new(glob).map_err(|e| AptError::InvalidIncludePattern {
            pattern: glob.to_string(),
            reason: e.msg.to_string(),
        })?;
        Ok(Self {
            glob: glob.to_string(),
            pattern,
        })
    }

    /// The default pattern: every Java file at any depth.
    pub fn all_java_files() -> AptResult<Self> {
        Self::from_glob(ALL_JAVA_FILES_FILTER)
    }

    pub fn as_glob(&self) -> &str {
        &self.glob
    }

    /// Match a path relative to the scan base.
    pub fn matches(&self, relative: &Path) -> bool {
        self.pattern.matches_with(&glob_path(relative), MATCH_OPTIONS)
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn glob_path(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compile a list of globs as handed to `ChangeScanner::set_includes`.
pub fn compile_globs(globs: &[String]) -> AptResult<Vec<IncludePattern>> {
    globs.iter().map(|g| IncludePattern::from_glob(g)).collect()
}

/// True when any pattern matches.
pub fn matches_any(patterns: &[IncludePattern], relative: &Path) -> bool {
    patterns.iter().any(|p| p.matches(relative))
}

/// Include globs for a package pattern set; empty means every Java file.
pub fn include_globs<'a, I>(includes: I) -> AptResult<Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let translated = includes
        .into_iter()
        .map(|p| IncludePattern::from_package(p).map(|p| p.glob))
        .collect::<AptResult<Vec<_>>>()?;
    if translated.is_empty() {
        Ok(vec![ALL_JAVA_FILES_FILTER.to_string()])
    } else {
        Ok(translated)
    }
}

// ── File Filter ──────────────────────────────────────────────────────

/// Collect the files under `source_root` that need processing.
pub fn filter_files<'a, I>(
    build_context: &dyn BuildContext,
    source_root: &Path,
    includes: I,
) -> AptResult<FileWorkingSet>
where
    I: IntoIterator<Item = &'a String>,
{
    let globs = include_globs(includes)?;

    let mut scanner = build_context.new_scanner(source_root);
    scanner.set_includes(globs);
    scanner.scan()?;

    let included = scanner.included_files();
    if included.is_empty() {
        return Ok(FileWorkingSet::new());
    }

    let base = scanner.base_dir();
    let files: FileWorkingSet = included.iter().map(|rel| base.join(rel)).collect();
    debug!(
        source_root = %source_root.display(),
        files = files.len(),
        "Selected sources for annotation processing"
    );
    Ok(files)
}
