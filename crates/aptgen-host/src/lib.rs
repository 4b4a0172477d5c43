//! # aptgen-host
//!
//! Real host collaborators for `aptgen-core`:
//!
//! - [`FsBuildContext`]: filesystem scanning with BLAKE3 stamp files, so
//!   repeated runs only see new or modified sources
//! - [`JavacCompiler`] / [`SystemCompilerProvider`]: an installed `javac`
//!   driven through an argument file
//! - [`ManifestProject`]: project layout and classpath from configuration,
//!   plus the [`BuildRecord`] written after each run

#![deny(unsafe_code)]

pub mod javac;
pub mod project;
pub mod scanner;

pub use javac::{quote_argument, JavacCompiler, SystemCompilerProvider};
pub use project::{BuildRecord, ManifestProject, ProjectManifest};
pub use scanner::{FsBuildContext, FsScanner};
