//! Clang backend (and Apple Clang, which shares the same flag dialect).
//!
//! Generalizes the teacher's `GccToolchain` the same way `gcc.rs` does, but
//! with real Clang module support: a two-step `--precompile` /
//! `-fmodule-output=` flow rather than GCC's single-flag `-fmodules-ts`
//! pass, since Clang splits interface compilation from codegen.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::command::{self, CommandSpec};
use crate::compiler::gnu_style;
use crate::compiler::{
    Capabilities, CompileOptions, CompileResult, Compiler, CompilerKind, LinkKind, LinkOptions, LinkResult,
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
pub struct ClangCompiler {
    pub cc: PathBuf,
    pub cxx: PathBuf,
    pub ar: PathBuf,
    pub apple: bool,
}

impl ClangCompiler {
    pub fn new(cc: PathBuf, cxx: PathBuf, ar: PathBuf, apple: bool) -> Self {
        ClangCompiler { cc, cxx, ar, apple }
    }
}

impl Compiler for ClangCompiler {
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
        if opts.kind == LinkKind::StaticLibrary {
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
        let std_flag = opts
            .cpp_standard
            .map(|s| format!("-std={}", s.as_flag_value()))
            .unwrap_or_else(|| "-std=c++20".to_string());

        let mut precompile_args = vec![std_flag.clone(), "--precompile".to_string()];
        for (name, path) in module_deps {
            precompile_args.push(format!("-fmodule-file={}={}", name, path.display()));
        }
        for dir in &opts.include_dirs {
            precompile_args.push(format!("-I{}", dir.display()));
        }
        precompile_args.push(source.display().to_string());
        precompile_args.push("-o".to_string());
        precompile_args.push(bmi_output.display().to_string());

        let (precompile, precompile_ns) =
            with_env_cwd(CommandSpec::new(&self.cxx).args(precompile_args), opts).run_timed()?;
        let mut diagnostics = parse_gcc_clang(&String::from_utf8_lossy(&precompile.stderr));
        if !precompile.status.success() {
            return Ok(command::module_interface_result(precompile, precompile_ns, None, None, diagnostics));
        }

        let object_file = bmi_output.with_extension("o");
        let codegen_args = vec![
            std_flag,
            "-c".to_string(),
            bmi_output.display().to_string(),
            "-o".to_string(),
            object_file.display().to_string(),
        ];
        let (codegen, codegen_ns) =
            with_env_cwd(CommandSpec::new(&self.cxx).args(codegen_args), opts).run_timed()?;
        diagnostics.extend(parse_gcc_clang(&String::from_utf8_lossy(&codegen.stderr)));

        Ok(command::module_interface_result(
            codegen,
            precompile_ns + codegen_ns,
            Some(bmi_output.to_path_buf()),
            Some(object_file),
            diagnostics,
        ))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_modules: true,
            supports_header_units: true,
            supports_module_dep_scan: false,
            supports_lto: true,
            supports_pgo: true,
            supports_sanitizers: true,
            supports_pch: true,
            supports_cross_compile: true,
            max_c_standard: Some(crate::standard::CStandard::C23),
            max_cpp_standard: Some(crate::standard::CppStandard::Cpp26),
            version: gnu_style::run_version(CommandSpec::new(&self.cc)),
            vendor: if self.apple { "apple" } else { "llvm" },
        }
    }

    fn kind(&self) -> CompilerKind {
        if self.apple {
            CompilerKind::AppleClang
        } else {
            CompilerKind::Clang
        }
    }

    fn path(&self) -> &Path {
        &self.cc
    }

    fn verify(&self) -> Result<(), OvoError> {
        match gnu_style::run_version(CommandSpec::new(&self.cc)) {
            Some(_) => Ok(()),
            None => Err(OvoError::DetectionFailed { kind: self.kind() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_apple_vs_plain() {
        let plain = ClangCompiler::new(PathBuf::from("clang"), PathBuf::from("clang++"), PathBuf::from("llvm-ar"), false);
        let apple = ClangCompiler::new(PathBuf::from("clang"), PathBuf::from("clang++"), PathBuf::from("llvm-ar"), true);
        assert_eq!(plain.kind(), CompilerKind::Clang);
        assert_eq!(apple.kind(), CompilerKind::AppleClang);
    }

    #[test]
    fn test_capabilities_support_modules() {
        let c = ClangCompiler::new(PathBuf::from("clang"), PathBuf::from("clang++"), PathBuf::from("llvm-ar"), false);
        assert!(c.capabilities().supports_modules);
    }
}
