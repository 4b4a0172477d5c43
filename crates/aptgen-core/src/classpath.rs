//! Compile classpath resolution.

use std::path::Path;

use tracing::warn;

use crate::error::{AptError, AptResult};
use crate::host::ProjectModel;
use crate::types::{ClasspathScope, PluginArtifact};

/// Platform path-list separator (`File.pathSeparatorChar` in Java terms).
#[cfg(windows)]
pub const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const PATH_SEPARATOR: char = ':';

/// Resolve the classpath for `scope` and append the plugin artifacts.
///
/// Returns `None` when nothing is on the classpath, or when the project
/// could not resolve its dependencies. The latter is only logged: the
/// compiler will fail later with a clearer missing-class diagnostic. Any
/// other project-model error is returned.
pub fn build_classpath(
    project: &dyn ProjectModel,
    scope: ClasspathScope,
    plugin_artifacts: &[PluginArtifact],
) -> AptResult<Option<String>> {
    let mut elements = match project.classpath_elements(scope) {
        Ok(elements) => elements,
        Err(AptError::DependencyResolution(reason)) => {
            warn!(%scope, %reason, "Could not resolve classpath elements");
            return Ok(None);
        }
        Err(other) => return Err(other),
    };

    elements.extend(
        plugin_artifacts
            .iter()
            .filter_map(|a| a.file.as_deref())
            .map(absolute_display),
    );

    Ok(join_elements(&elements))
}

/// Join with [`PATH_SEPARATOR`]; `None` for an empty list.
pub fn join_elements(elements: &[String]) -> Option<String> {
    if elements.is_empty() {
        return None;
    }
    let separator = PATH_SEPARATOR.to_string();
    Some(elements.join(&separator))
}

fn absolute_display(file: &Path) -> String {
    std::path::absolute(file)
        .unwrap_or_else(|_| file.to_path_buf())
        .display()
        .to_string()
}
