//! Shared command-building helper for compiler backends.
//!
//! Mirrors the teacher's `CommandSpec` (program + args + env, built up with
//! a consuming builder) so each backend reads like straight-line flag
//! translation instead of `Command` boilerplate.
//!
//! A non-zero exit status is not a Rust-level error here: backends report
//! compile/link failure in-band via `CompileResult::success`/`LinkResult::
//! success` (the facade aggregates per-unit failures), so `run_timed` only
//! ever returns `Err` when the child process could not be spawned at all.

use std::path::PathBuf;
use std::time::Instant;

use crate::diagnostic::Diagnostic;
use crate::error::OvoError;
use crate::util::process::ProcessBuilder;

#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Run the command, returning raw output (success or not).
    pub fn run(&self) -> Result<std::process::Output, OvoError> {
        let mut pb = ProcessBuilder::new(&self.program).args(&self.args);
        for (k, v) in &self.env {
            pb = pb.env(k, v);
        }
        if let Some(ref cwd) = self.cwd {
            pb = pb.cwd(cwd);
        }
        pb.exec()
    }

    /// Run the command and time it. Returns the raw output alongside the
    /// wall-clock duration; only a spawn failure is an `Err`.
    pub fn run_timed(&self) -> Result<(std::process::Output, u64), OvoError> {
        let start = Instant::now();
        let output = self.run()?;
        Ok((output, start.elapsed().as_nanos() as u64))
    }
}

/// Build a `CompileResult` from a finished (successful or not) process
/// output. `object_file` is only populated when the process succeeded.
pub fn compile_result(
    output: std::process::Output,
    duration_ns: u64,
    object_file: Option<PathBuf>,
    diagnostics: Vec<Diagnostic>,
) -> crate::compiler::CompileResult {
    let success = output.status.success();
    crate::compiler::CompileResult {
        object_file: if success { object_file } else { None },
        diagnostics,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        duration_ns,
        success,
    }
}

/// Build a `LinkResult` from a finished process output.
pub fn link_result(
    output: std::process::Output,
    duration_ns: u64,
    output_path: Option<PathBuf>,
    diagnostics: Vec<Diagnostic>,
) -> crate::compiler::LinkResult {
    let success = output.status.success();
    crate::compiler::LinkResult {
        output: if success { output_path } else { None },
        diagnostics,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        duration_ns,
        success,
    }
}

/// Build a `ModuleInterfaceResult` from a finished process output.
pub fn module_interface_result(
    output: std::process::Output,
    duration_ns: u64,
    bmi_path: Option<PathBuf>,
    object_file: Option<PathBuf>,
    diagnostics: Vec<Diagnostic>,
) -> crate::compiler::ModuleInterfaceResult {
    let success = output.status.success();
    crate::compiler::ModuleInterfaceResult {
        bmi_path: if success { bmi_path } else { None },
        object_file: if success { object_file } else { None },
        diagnostics,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code(),
        duration_ns,
        success,
    }
}
