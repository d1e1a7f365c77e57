//! MSVC backend.
//!
//! Generalizes the teacher's `MsvcToolchain` from a fixed cl.exe command
//! builder into a full `Compiler` implementation. MSVC's flag syntax is
//! `/`-prefixed and unrelated to the GCC dialect the other four backends
//! share, so it gets its own translation here rather than reusing
//! `gnu_style`. Module interfaces use `/interface /ifcOutput` to produce an
//! IFC file and `/reference name=path` to consume one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::command::{self, CommandSpec};
use crate::compiler::{
    Capabilities, CompileOptions, CompileResult, Compiler, CompilerKind, LinkKind, LinkOptions, LinkResult,
    ModuleDepsResult, ModuleInterfaceResult, OutputKind,
};
use crate::diagnostic::parse_msvc;
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
pub struct MsvcCompiler {
    /// Path to `cl.exe`.
    pub cl: PathBuf,
    /// Path to `lib.exe`, used for static archives.
    pub lib: PathBuf,
    /// Path to `link.exe`, used for executables and DLLs.
    pub link: PathBuf,
}

impl MsvcCompiler {
    pub fn new(cl: PathBuf, lib: PathBuf, link: PathBuf) -> Self {
        MsvcCompiler { cl, lib, link }
    }

    fn compile_flags(opts: &CompileOptions) -> Vec<String> {
        let mut args = Vec::new();

        match opts.language {
            Language::Cxx | Language::ObjCxx => {
                args.push("/TP".to_string());
                if let Some(std) = opts.cpp_standard {
                    args.push(format!("/std:{}", std.as_msvc_flag_value()));
                }
            }
            Language::C | Language::ObjC | Language::Asm => {
                args.push("/TC".to_string());
                if let Some(std) = opts.c_standard {
                    args.push(format!("/std:{}", std.as_msvc_flag_value()));
                }
            }
        }

        args.push(opts.optimization.as_msvc_flag().to_string());
        if opts.debug_info {
            args.push("/Zi".to_string());
        }
        if opts.warnings_as_errors {
            args.push("/WX".to_string());
        }
        if opts.sanitize_address {
            args.push("/fsanitize=address".to_string());
        }
        // Thread and undefined-behavior sanitizers have no MSVC equivalent.

        match opts.output_kind {
            OutputKind::Object => {}
            OutputKind::Assembly => args.push("/FA".to_string()),
            OutputKind::Preprocessed => args.push("/E".to_string()),
            // LLVM IR / bitcode emission is a clang-cl extension MSVC's
            // cl.exe doesn't expose; fall back to ordinary object output.
            OutputKind::LlvmIr | OutputKind::Bitcode => {}
        }

        for dir in &opts.include_dirs {
            args.push(format!("/I{}", dir.display()));
        }
        for dir in &opts.system_include_dirs {
            args.push(format!("/external:I{}", dir.display()));
            args.push("/external:W0".to_string());
        }
        for (name, value) in &opts.defines {
            match value {
                Some(v) => args.push(format!("/D{name}={v}")),
                None => args.push(format!("/D{name}")),
            }
        }

        let mut module_names: Vec<&String> = opts.prebuilt_modules.keys().collect();
        module_names.sort();
        for name in module_names {
            args.push("/reference".to_string());
            args.push(format!("{name}={}", opts.prebuilt_modules[name].display()));
        }

        args.extend(opts.extra_flags.iter().cloned());
        args
    }
}

impl Compiler for MsvcCompiler {
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError> {
        let output = source.with_extension("obj");
        let mut args = Self::compile_flags(opts);
        args.push("/c".to_string());
        args.push(source.display().to_string());
        args.push(format!("/Fo{}", output.display()));

        let (result, duration_ns) = with_env_cwd(CommandSpec::new(&self.cl).args(args), opts).run_timed()?;
        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        let diagnostics = parse_msvc(&stdout);

        Ok(command::compile_result(result, duration_ns, Some(output), diagnostics))
    }

    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError> {
        if opts.kind == LinkKind::StaticLibrary {
            let mut args = vec![format!("/OUT:{}", opts.output.display())];
            args.extend(opts.objects.iter().map(|o| o.display().to_string()));
            let (result, duration_ns) = CommandSpec::new(&self.lib).args(args).run_timed()?;
            return Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), Vec::new()));
        }

        let mut args = vec![format!("/OUT:{}", opts.output.display())];
        if opts.kind == LinkKind::SharedLibrary {
            args.push("/DLL".to_string());
        }
        args.extend(opts.objects.iter().map(|o| o.display().to_string()));
        for dir in &opts.library_dirs {
            args.push(format!("/LIBPATH:{}", dir.display()));
        }
        for lib in &opts.libraries {
            args.push(format!("{lib}.lib"));
        }
        if opts.strip {
            args.push("/PDBALTPATH:none".to_string());
        }

        let mut spec = CommandSpec::new(&self.link).args(args);
        if let Some(cwd) = &opts.cwd {
            spec = spec.cwd(cwd.clone());
        }
        let (result, duration_ns) = spec.run_timed()?;
        Ok(command::link_result(result, duration_ns, Some(opts.output.clone()), Vec::new()))
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
        let object_file = bmi_output.with_extension("obj");
        let mut args = Self::compile_flags(opts);
        args.push("/interface".to_string());
        args.push(format!("/ifcOutput{}", bmi_output.display()));
        for (name, path) in module_deps {
            args.push("/reference".to_string());
            args.push(format!("{name}={}", path.display()));
        }
        args.push("/c".to_string());
        args.push(source.display().to_string());
        args.push(format!("/Fo{}", object_file.display()));

        let (result, duration_ns) = with_env_cwd(CommandSpec::new(&self.cl).args(args), opts).run_timed()?;
        let stdout = String::from_utf8_lossy(&result.stdout).into_owned();
        let diagnostics = parse_msvc(&stdout);

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
            supports_cross_compile: false,
            max_c_standard: Some(crate::standard::CStandard::C17),
            max_cpp_standard: Some(crate::standard::CppStandard::Cpp23),
            version: None,
            vendor: "microsoft",
        }
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Msvc
    }

    fn path(&self) -> &Path {
        &self.cl
    }

    fn verify(&self) -> Result<(), OvoError> {
        // cl.exe prints its banner to stderr and exits non-zero with no
        // input files; a successful spawn is enough confirmation here.
        match CommandSpec::new(&self.cl).run() {
            Ok(_) => Ok(()),
            Err(_) => Err(OvoError::DetectionFailed { kind: CompilerKind::Msvc }),
        }
    }
}
