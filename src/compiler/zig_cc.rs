//! zig-cc backend: `zig cc` / `zig c++`, a single `zig` binary standing in
//! for an entire GCC-like toolchain (including its own bundled `ar` and
//! cross-compilation sysroots).
//!
//! Flag translation is the shared GCC dialect from `gnu_style` — zig's C/C++
//! frontend is Clang under the hood — but every invocation is a subcommand
//! of the single `zig` executable rather than a standalone driver binary,
//! grounded in the teacher's `detect.rs` `ZIG_PATH`-then-PATH probing for
//! this backend's existence.

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
use crate::language::Language;
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
pub struct ZigCcCompiler {
    pub zig: PathBuf,
}

impl ZigCcCompiler {
    pub fn new(zig: PathBuf) -> Self {
        ZigCcCompiler { zig }
    }

    fn driver_subcommand(language: Language) -> &'static str {
        match language {
            Language::Cxx | Language::ObjCxx => "c++",
            Language::C | Language::ObjC | Language::Asm => "cc",
        }
    }
}

impl Compiler for ZigCcCompiler {
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError> {
        let output = source.with_extension("o");
        let args = gnu_style::compile_args(source, &output, opts);

        let spec = with_env_cwd(
            CommandSpec::new(&self.zig).arg(Self::driver_subcommand(opts.language)).args(args),
            opts,
        );
        let (result, duration_ns) = spec.run_timed()?;
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let diagnostics = parse_gcc_clang(&stderr);

        Ok(command::compile_result(result, duration_ns, Some(output), diagnostics))
    }

    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError> {
        if opts.kind == LinkKind::StaticLibrary {
            let args = gnu_style::archive_args(&opts.objects, &opts.output);
            let (result, duration_ns) = CommandSpec::new(&self.zig).arg("ar").args(args).run_timed()?;
            return Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), Vec::new()));
        }

        let args = gnu_style::link_args(opts);
        let mut spec = CommandSpec::new(&self.zig).arg("c++").args(args);
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
        precompile_args.push(source.display().to_string());
        precompile_args.push("-o".to_string());
        precompile_args.push(bmi_output.display().to_string());

        let (precompile, precompile_ns) =
            with_env_cwd(CommandSpec::new(&self.zig).arg("c++").args(precompile_args), opts).run_timed()?;
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
            with_env_cwd(CommandSpec::new(&self.zig).arg("c++").args(codegen_args), opts).run_timed()?;
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
            supports_pgo: false,
            supports_sanitizers: true,
            supports_pch: false,
            supports_cross_compile: true,
            max_c_standard: Some(crate::standard::CStandard::C23),
            max_cpp_standard: Some(crate::standard::CppStandard::Cpp23),
            version: CommandSpec::new(&self.zig)
                .arg("version")
                .run()
                .ok()
                .filter(|o| o.status.success())
                .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string()),
            vendor: "zig",
        }
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::ZigCc
    }

    fn path(&self) -> &Path {
        &self.zig
    }

    fn verify(&self) -> Result<(), OvoError> {
        let result = CommandSpec::new(&self.zig).arg("version").run();
        match result {
            Ok(output) if output.status.success() => Ok(()),
            _ => Err(OvoError::DetectionFailed { kind: CompilerKind::ZigCc }),
        }
    }
}
