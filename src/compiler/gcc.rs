//! GCC backend.
//!
//! Generalizes the teacher's `GccToolchain` (`src/builder/toolchain/
//! gcc.rs`) from a fixed C/C++ compile-command builder into a full
//! `Compiler` implementation. GCC's C++20 modules support is still
//! experimental (`-fmodules-ts`), so its module handling is the simplest
//! of the five backends: one flag, no separate precompile step.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::command::{self, CommandSpec};
use crate::compiler::gnu_style;
use crate::compiler::{
    Capabilities, CompileOptions, CompileResult, Compiler, CompilerKind, LinkOptions, LinkResult,
    ModuleDepsResult, ModuleInterfaceResult,
};
use crate::diagnostic::parse_gcc_clang;
use crate::error::OvoError;
use crate::modules::scanner::scan_source;

fn with_env_cwd(mut spec: CommandSpec, opts: &CompileOptions) -> CommandSpec {
    for (k, v) in &opts.env {
        spec = spec.env(k.clone(), v.clone());
    }
    if let Some(cwd) = &opts.cwd {
        spec = spec.cwd(cwd.clone());
    }
    spec
}

#[derive(Debug, Clone)]
pub struct GccCompiler {
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ar: PathBuf,
}

impl GccCompiler {
    pub fn new(cc: PathBuf, cxx: PathBuf, ar: PathBuf) -> Self {
        GccCompiler { cc, cxx, ar }
    }

    /// Infer the C++ driver path from a C driver path.
    ///
    /// Handles the common patterns: `gcc`/`*-gcc` -> `g++`/`*-g++`, and a
    /// standalone `cc` -> `c++`.
    pub fn infer_cxx(cc: &Path) -> PathBuf {
        let cc_str = cc.to_string_lossy();

        if cc_str.ends_with("gcc") {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 2]));
        }

        let is_standalone_cc =
            cc_str == "cc" || cc_str.ends_with("/cc") || cc_str.ends_with("\\cc") || cc_str.ends_with("-cc");
        if is_standalone_cc {
            return PathBuf::from(format!("{}++", &cc_str[..cc_str.len() - 1]));
        }

        PathBuf::from(format!("{cc_str}++"))
    }
}

impl Compiler for GccCompiler {
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError> {
        let driver = gnu_style::driver_for_language(&self.cc, &self.cxx, opts.language);
        let output = source.with_extension("o");
        let args = gnu_style::compile_args(source, &output, opts);

        let (result, duration_ns) = with_env_cwd(CommandSpec::new(driver).args(args), opts).run_timed()?;
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let diagnostics = parse_gcc_clang(&stderr);

        Ok(command::compile_result(result, duration_ns, Some(output), diagnostics))
    }

    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError> {
        if opts.kind == crate::compiler::LinkKind::StaticLibrary {
            let args = gnu_style::archive_args(&opts.objects, &opts.output);
            let (result, duration_ns) = CommandSpec::new(&self.ar).args(args).run_timed()?;
            return Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), Vec::new()));
        }

        let args = gnu_style::link_args(opts);
        let mut spec = CommandSpec::new(&self.cxx).args(args);
        if let Some(cwd) = &opts.cwd {
            spec = spec.cwd(cwd.clone());
        }
        let (result, duration_ns) = spec.run_timed()?;
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let diagnostics = parse_gcc_clang(&stderr);

        Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), diagnostics))
    }

    fn scan_module_deps(&self, source: &Path, _opts: &CompileOptions) -> Result<ModuleDepsResult, OvoError> {
        let text = std::fs::read_to_string(source).map_err(OvoError::Io)?;
        let unit = scan_source(source, &text);
        Ok(ModuleDepsResult {
            dependencies: unit.dependencies.clone(),
            unit: Some(unit),
        })
    }

    fn compile_module_interface(
        &self,
        source: &Path,
        bmi_output: &Path,
        module_deps: &HashMap<String, PathBuf>,
        opts: &CompileOptions,
    ) -> Result<ModuleInterfaceResult, OvoError> {
        let object_file = bmi_output.with_extension("o");
        let mut args = vec!["-fmodules-ts".to_string(), "-c".to_string()];

        if let Some(std) = opts.cpp_standard {
            args.push(format!("-std={}", std.as_flag_value()));
        }
        for path in module_deps.values() {
            args.push(format!("-fmodule-file={}", path.display()));
        }
        args.push(source.display().to_string());
        args.push("-o".to_string());
        args.push(object_file.display().to_string());

        let (result, duration_ns) = with_env_cwd(CommandSpec::new(&self.cxx).args(args), opts).run_timed()?;
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let diagnostics = parse_gcc_clang(&stderr);

        Ok(command::module_interface_result(
            result,
            duration_ns,
            Some(bmi_output.to_path_buf()),
            Some(object_file),
            diagnostics,
        ))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_modules: true,
            supports_header_units: false,
            supports_module_dep_scan: false,
            supports_lto: true,
            supports_pgo: true,
            supports_sanitizers: true,
            supports_pch: true,
            supports_cross_compile: true,
            max_c_standard: Some(crate::standard::CStandard::C23),
            max_cpp_standard: Some(crate::standard::CppStandard::Cpp23),
            version: gnu_style::run_version(CommandSpec::new(&self.cc)),
            vendor: "gnu",
        }
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Gcc
    }

    fn path(&self) -> &Path {
        &self.cc
    }

    fn verify(&self) -> Result<(), OvoError> {
        match gnu_style::run_version(CommandSpec::new(&self.cc)) {
            Some(_) => Ok(()),
            None => Err(OvoError::DetectionFailed { kind: CompilerKind::Gcc }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_cxx_from_gcc() {
        assert_eq!(GccCompiler::infer_cxx(Path::new("gcc")), PathBuf::from("g++"));
        assert_eq!(
            GccCompiler::infer_cxx(Path::new("x86_64-linux-gnu-gcc")),
            PathBuf::from("x86_64-linux-gnu-g++")
        );
    }

    #[test]
    fn test_infer_cxx_from_standalone_cc() {
        assert_eq!(GccCompiler::infer_cxx(Path::new("cc")), PathBuf::from("c++"));
        assert_eq!(GccCompiler::infer_cxx(Path::new("/usr/bin/cc")), PathBuf::from("/usr/bin/c++"));
    }

    #[test]
    fn test_kind_and_path() {
        let c = GccCompiler::new(PathBuf::from("gcc"), PathBuf::from("g++"), PathBuf::from("ar"));
        assert_eq!(c.kind(), CompilerKind::Gcc);
        assert_eq!(c.path(), Path::new("gcc"));
        assert!(c.capabilities().supports_modules);
    }
}
