//! `javac` child-process compiler.
//!
//! Arguments and compilation units are written to a temporary argument
//! file and passed as `javac @file`, which keeps large working sets clear
//! of command-line length limits.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use aptgen_core::{AptError, AptResult, CompileRequest, CompilerProvider, JavaCompiler};
use tracing::debug;

#[cfg(windows)]
const JAVAC: &str = "javac.exe";
#[cfg(not(windows))]
const JAVAC: &str = "javac";

// ── Compiler ─────────────────────────────────────────────────────────

/// Runs an installed `javac` executable.
#[derive(Clone, Debug)]
pub struct JavacCompiler {
    executable: PathBuf,
}

impl JavacCompiler {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn write_argument_file(&self, request: &CompileRequest) -> AptResult<tempfile::NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("aptgen-")
            .suffix(".args")
            .tempfile()?;
        for argument in &request.arguments {
            writeln!(file, "{}", quote_argument(argument))?;
        }
        for unit in &request.compilation_units {
            writeln!(file, "{}", quote_argument(&unit.display().to_string()))?;
        }
        file.flush()?;
        Ok(file)
    }
}

impl JavaCompiler for JavacCompiler {
    fn name(&self) -> &str {
        "javac"
    }

    fn compile(&self, request: &CompileRequest, diagnostics: &mut dyn Write) -> AptResult<bool> {
        let argument_file = self.write_argument_file(request)?;
        debug!(
            javac = %self.executable.display(),
            argfile = %argument_file.path().display(),
            units = request.compilation_units.len(),
            "Invoking javac"
        );

        let output = Command::new(&self.executable)
            .arg(format!("@{}", argument_file.path().display()))
            .output()
            .map_err(|e| {
                AptError::Compiler(format!("cannot run {}: {e}", self.executable.display()))
            })?;

        diagnostics.write_all(&output.stdout)?;
        diagnostics.write_all(&output.stderr)?;
        diagnostics.flush()?;

        debug!(status = %output.status, "javac finished");
        Ok(output.status.success())
    }
}

/// Quote one argument for a javac argument file.
pub fn quote_argument(argument: &str) -> String {
    let escaped = argument.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

// ── Provider ─────────────────────────────────────────────────────────

/// Locates `javac`: explicit override, then `$JAVA_HOME/bin`, then `PATH`.
#[derive(Clone, Debug, Default)]
pub struct SystemCompilerProvider {
    executable_override: Option<PathBuf>,
}

impl SystemCompilerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable_override: Some(executable.into()),
        }
    }

    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.executable_override {
            return explicit.is_file().then(|| explicit.clone());
        }

        let from_java_home = std::env::var_os("JAVA_HOME")
            .map(|home| PathBuf::from(home).join("bin").join(JAVAC))
            .filter(|candidate| candidate.is_file());
        if from_java_home.is_some() {
            return from_java_home;
        }

        std::env::var_os("PATH").and_then(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(JAVAC))
                .find(|candidate| candidate.is_file())
        })
    }
}

impl CompilerProvider for SystemCompilerProvider {
    fn system_compiler(&self) -> Option<Box<dyn JavaCompiler>> {
        self.locate().map(|executable| {
            debug!(javac = %executable.display(), "Located system compiler");
            Box::new(JavacCompiler::new(executable)) as Box<dyn JavaCompiler>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_spaces_and_escapes() {
        assert_eq!(quote_argument("-proc:only"), "\"-proc:only\"");
        assert_eq!(quote_argument("/my src/A.java"), "\"/my src/A.java\"");
        assert_eq!(quote_argument(r"C:\src"), r#""C:\\src""#);
        assert_eq!(quote_argument("say \"hi\""), r#""say \"hi\"""#);
    }

    #[test]
    fn missing_override_yields_no_compiler() {
        let provider = SystemCompilerProvider::with_executable("/definitely/not/javac");
        assert!(provider.system_compiler().is_none());
    }

    #[test]
    fn argument_file_lists_options_then_units() {
        let compiler = JavacCompiler::new("javac");
        let request = CompileRequest {
            compilation_units: vec![PathBuf::from("/src/A.java")],
            arguments: vec!["-proc:only".into(), "-processor".into(), "com.acme.P".into()],
        };
        let file = compiler.write_argument_file(&request).unwrap();
        let contents = std::fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            vec![
                "\"-proc:only\"",
                "\"-processor\"",
                "\"com.acme.P\"",
                "\"/src/A.java\""
            ]
        );
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn stub_javac(dir: &Path, exit_code: i32) -> PathBuf {
            let path = dir.join("javac");
            let script = format!(
                "#!/bin/sh\necho \"stub javac: $1\"\necho \"warning: stub\" 1>&2\nexit {exit_code}\n"
            );
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn request() -> CompileRequest {
            CompileRequest {
                compilation_units: vec![PathBuf::from("/src/A.java")],
                arguments: vec!["-proc:only".into()],
            }
        }

        #[test]
        fn exit_status_decides_success() {
            let dir = tempfile::tempdir().unwrap();
            let ok = JavacCompiler::new(stub_javac(dir.path(), 0));
            let mut sink = Vec::new();
            assert!(ok.compile(&request(), &mut sink).unwrap());
            let text = String::from_utf8(sink).unwrap();
            assert!(text.contains("stub javac: @"));
            assert!(text.contains("warning: stub"));

            let failing_dir = tempfile::tempdir().unwrap();
            let failing = JavacCompiler::new(stub_javac(failing_dir.path(), 1));
            assert!(!failing.compile(&request(), &mut Vec::new()).unwrap());
        }

        #[test]
        fn override_is_located() {
            let dir = tempfile::tempdir().unwrap();
            let javac = stub_javac(dir.path(), 0);
            let provider = SystemCompilerProvider::with_executable(&javac);
            assert_eq!(provider.locate(), Some(javac));
            assert_eq!(provider.system_compiler().unwrap().name(), "javac");
        }

        #[test]
        fn unstartable_executable_is_compiler_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("javac");
            std::fs::write(&path, "not executable").unwrap();
            let compiler = JavacCompiler::new(path);
            let err = compiler.compile(&request(), &mut Vec::new()).unwrap_err();
            assert!(matches!(err, AptError::Compiler(_)));
        }
    }
}
