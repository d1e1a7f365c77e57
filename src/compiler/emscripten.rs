//! Emscripten backend: `emcc`/`em++`, producing WebAssembly + JS glue.
//!
//! Flag translation follows the shared GCC dialect (`gnu_style`) since
//! emcc/em++ are Clang frontends; the distinguishing trait is the output
//! artifact shape (`.wasm` plus a `.js` host glue file for executables)
//! rather than flag syntax. Emscripten's C++20 modules support is not
//! production-ready, so this backend reports `supports_modules: false`
//! and a module interface request against it fails with a diagnostic
//! rather than attempting a best-effort compile.

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
pub struct EmscriptenCompiler {
    pub emcc: PathBuf,
    pub empp: PathBuf,
    pub emar: PathBuf,
}

impl EmscriptenCompiler {
    pub fn new(emcc: PathBuf, empp: PathBuf, emar: PathBuf) -> Self {
        EmscriptenCompiler { emcc, empp, emar }
    }

    fn driver(&self, language: crate::language::Language) -> &Path {
        match language {
            crate::language::Language::Cxx | crate::language::Language::ObjCxx => &self.empp,
            _ => &self.emcc,
        }
    }
}

impl Compiler for EmscriptenCompiler {
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError> {
        let output = source.with_extension("o");
        let args = gnu_style::compile_args(source, &output, opts);

        let spec = with_env_cwd(CommandSpec::new(self.driver(opts.language)).args(args), opts);
        let (result, duration_ns) = spec.run_timed()?;
        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        let diagnostics = parse_gcc_clang(&stderr);

        Ok(command::compile_result(result, duration_ns, Some(output), diagnostics))
    }

    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError> {
        if opts.kind == LinkKind::StaticLibrary {
            let args = gnu_style::archive_args(&opts.objects, &opts.output);
            let (result, duration_ns) = CommandSpec::new(&self.emar).args(args).run_timed()?;
            return Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), Vec::new()));
        }

        // Executables get a `.js` glue file alongside the `.wasm`; the
        // caller is responsible for recording both, this only drives emcc
        // with whatever output path it was given.
        let args = gnu_style::link_args(opts);
        let mut spec = CommandSpec::new(&self.empp).args(args);
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
        _bmi_output: &Path,
        _module_deps: &HashMap<String, PathBuf>,
        _opts: &CompileOptions,
    ) -> Result<ModuleInterfaceResult, OvoError> {
        Err(OvoError::CompileFailed {
            source_file: source.to_path_buf(),
            exit_code: None,
            stderr: "emscripten backend does not support compiling C++20 module interfaces".to_string(),
        })
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_modules: false,
            supports_header_units: false,
            supports_module_dep_scan: false,
            supports_lto: true,
            supports_pgo: false,
            supports_sanitizers: false,
            supports_pch: false,
            supports_cross_compile: false,
            max_c_standard: Some(crate::standard::CStandard::C17),
            max_cpp_standard: Some(crate::standard::CppStandard::Cpp17),
            version: gnu_style::run_version(CommandSpec::new(&self.emcc)),
            vendor: "emscripten",
        }
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Emscripten
    }

    fn path(&self) -> &Path {
        &self.emcc
    }

    fn verify(&self) -> Result<(), OvoError> {
        match gnu_style::run_version(CommandSpec::new(&self.emcc)) {
            Some(_) => Ok(()),
            None => Err(OvoError::DetectionFailed { kind: CompilerKind::Emscripten }),
        }
    }
}
