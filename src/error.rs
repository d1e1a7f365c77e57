//! Error types for the compiler abstraction and modules subsystem.
//!
//! Struct-variant-per-kind, grounded in the teacher's `ResolveError` shape.
//! The public API surface returns `Result<T, OvoError>`; `anyhow` is used
//! only at internal plumbing seams, same as the teacher.

use std::path::PathBuf;

use thiserror::Error;

use crate::compiler::CompilerKind;

/// Errors produced by the compiler abstraction and modules subsystem.
#[derive(Debug, Error)]
pub enum OvoError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A compile operation was requested against a backend that never even
    /// attempts it (e.g. a module interface on a backend with no modules
    /// support). An invocation the backend *does* attempt reports failure
    /// in-band via `CompileResult::success`, not this variant.
    #[error("compilation of {source_file:?} failed (exit code {exit_code:?})")]
    CompileFailed {
        source_file: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The link-side analogue of `CompileFailed`.
    #[error("linking {output:?} failed (exit code {exit_code:?})")]
    LinkFailed {
        output: PathBuf,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("cyclic module dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("module '{name}' required by '{required_by}' could not be resolved")]
    UnresolvedModule { name: String, required_by: String },

    #[error("no {kind:?} compiler could be detected on this system")]
    DetectionFailed { kind: CompilerKind },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OvoError>;
