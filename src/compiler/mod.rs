//! Compiler abstraction layer.
//!
//! A single object-safe `Compiler` trait is implemented by each of the five
//! supported backends (gcc, clang, msvc, emscripten, zig-cc); callers hold
//! a `Box<dyn Compiler>` and never branch on backend identity themselves.

pub mod clang;
pub mod command;
pub mod detect;
pub mod emscripten;
pub mod gcc;
pub mod gnu_style;
pub mod msvc;
pub mod zig_cc;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;
use crate::error::OvoError;
use crate::language::Language;
use crate::modules::{ModuleDependency, ModuleUnit};
use crate::standard::{CStandard, CppStandard, OptimizationLevel};
use crate::target::Target;

/// What a compile invocation should emit, beyond a plain object file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    #[default]
    Object,
    Assembly,
    Preprocessed,
    LlvmIr,
    Bitcode,
}

/// What a backend can and can't do, reported statically per instance and
/// consulted by callers (and `detect::select_compiler`) before an operation
/// is attempted. A capability flag here must correspond to an actual code
/// path in this backend's flag translation; it is not aspirational.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Capabilities {
    pub supports_modules: bool,
    pub supports_header_units: bool,
    pub supports_module_dep_scan: bool,
    pub supports_lto: bool,
    pub supports_pgo: bool,
    pub supports_sanitizers: bool,
    pub supports_pch: bool,
    pub supports_cross_compile: bool,
    pub max_c_standard: Option<CStandard>,
    pub max_cpp_standard: Option<CppStandard>,
    pub version: Option<String>,
    pub vendor: &'static str,
}

/// What a caller needs from a backend; matched against `Capabilities` by
/// `detect::select_compiler` to pick the best available one.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    pub min_c_standard: Option<CStandard>,
    pub min_cpp_standard: Option<CppStandard>,
    pub needs_modules: bool,
    pub cross_target: Option<Target>,
}

impl Requirements {
    /// Whether `caps` satisfies this requirement set.
    pub fn satisfied_by(&self, caps: &Capabilities) -> bool {
        if self.needs_modules && !caps.supports_modules {
            return false;
        }
        if let Some(min) = self.min_c_standard {
            if caps.max_c_standard.map(|max| max < min).unwrap_or(true) {
                return false;
            }
        }
        if let Some(min) = self.min_cpp_standard {
            if caps.max_cpp_standard.map(|max| max < min).unwrap_or(true) {
                return false;
            }
        }
        if self.cross_target.is_some() && !caps.supports_cross_compile {
            return false;
        }
        true
    }
}

/// Identifies which backend a `Compiler` trait object wraps. Used for
/// error reporting and cache-key isolation, never for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompilerKind {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
    Emscripten,
    ZigCc,
}

impl CompilerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerKind::Gcc => "gcc",
            CompilerKind::Clang => "clang",
            CompilerKind::AppleClang => "apple-clang",
            CompilerKind::Msvc => "msvc",
            CompilerKind::Emscripten => "emscripten",
            CompilerKind::ZigCc => "zig-cc",
        }
    }

    /// Whether this backend is GCC-like in flag syntax (as opposed to
    /// MSVC's `/`-prefixed flags).
    pub fn is_gcc_like(&self) -> bool {
        !matches!(self, CompilerKind::Msvc)
    }
}

/// Options controlling a single compile invocation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub language: Language,
    pub c_standard: Option<CStandard>,
    pub cpp_standard: Option<CppStandard>,
    pub optimization: OptimizationLevel,
    pub debug_info: bool,
    pub include_dirs: Vec<PathBuf>,
    pub system_include_dirs: Vec<PathBuf>,
    pub defines: Vec<(String, Option<String>)>,
    pub warnings: Vec<String>,
    pub extra_flags: Vec<String>,
    pub target: Option<Target>,
    pub position_independent: bool,
    pub warnings_as_errors: bool,
    pub output_kind: OutputKind,
    pub sanitize_address: bool,
    pub sanitize_thread: bool,
    pub sanitize_undefined: bool,
    /// Directory a backend may use to cache/lookup module BMIs it manages
    /// itself (e.g. clang's implicit module cache); distinct from the
    /// explicit `prebuilt_modules` map below.
    pub module_cache_dir: Option<PathBuf>,
    /// Module name -> BMI path, for every interface this compile depends on.
    /// Threaded in by the facade for every unit that imports a module, not
    /// just interface compiles.
    pub prebuilt_modules: HashMap<String, PathBuf>,
    pub verbose: bool,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            language: Language::Cxx,
            c_standard: None,
            cpp_standard: None,
            optimization: OptimizationLevel::default(),
            debug_info: false,
            include_dirs: Vec::new(),
            system_include_dirs: Vec::new(),
            defines: Vec::new(),
            warnings: Vec::new(),
            extra_flags: Vec::new(),
            target: None,
            position_independent: false,
            warnings_as_errors: false,
            output_kind: OutputKind::default(),
            sanitize_address: false,
            sanitize_thread: false,
            sanitize_undefined: false,
            module_cache_dir: None,
            prebuilt_modules: HashMap::new(),
            verbose: false,
            cwd: None,
            env: Vec::new(),
        }
    }
}

/// What kind of artifact a link step produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Executable,
    SharedLibrary,
    StaticLibrary,
}

/// Options controlling a single link invocation.
#[derive(Debug, Clone)]
pub struct LinkOptions {
    pub kind: LinkKind,
    pub objects: Vec<PathBuf>,
    pub output: PathBuf,
    pub library_dirs: Vec<PathBuf>,
    pub libraries: Vec<String>,
    pub rpaths: Vec<PathBuf>,
    pub framework_dirs: Vec<PathBuf>,
    pub frameworks: Vec<String>,
    pub linker_script: Option<PathBuf>,
    pub allow_undefined: bool,
    pub strip: bool,
    pub export_dynamic: bool,
    pub lto: bool,
    pub target: Option<Target>,
    pub verbose: bool,
    pub cwd: Option<PathBuf>,
}

/// Result of a compile attempt. Returned as `Ok` whether or not the
/// compiler accepted the source — `success` carries that, not the
/// `Result`'s own Err arm. Only a failure to even spawn the compiler
/// process surfaces as `Err(OvoError::Spawn)`.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub success: bool,
    pub object_file: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ns: u64,
}

/// Result of a link attempt, with the same success-carried-in-band
/// convention as `CompileResult`.
#[derive(Debug, Clone)]
pub struct LinkResult {
    pub success: bool,
    pub output: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ns: u64,
}

/// Result of scanning a translation unit for module dependencies.
#[derive(Debug, Clone, Default)]
pub struct ModuleDepsResult {
    pub unit: Option<ModuleUnit>,
    pub dependencies: Vec<ModuleDependency>,
}

/// Result of compiling a module interface unit into a BMI.
#[derive(Debug, Clone)]
pub struct ModuleInterfaceResult {
    pub success: bool,
    pub bmi_path: Option<PathBuf>,
    pub object_file: Option<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ns: u64,
}

/// A single compiler backend. Implementors wrap a resolved set of
/// executable paths (cc/cxx/ar/etc.) and translate OVO's options into the
/// backend's own flag syntax and process invocations.
pub trait Compiler: Send + Sync {
    /// Compile one translation unit to an object file.
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError>;

    /// Link objects into an executable, shared library, or static archive.
    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError>;

    /// Scan a translation unit for its module declaration and imports,
    /// without compiling it (a fast preprocessing-only pass).
    fn scan_module_deps(&self, source: &Path, opts: &CompileOptions) -> Result<ModuleDepsResult, OvoError>;

    /// Compile a module interface unit, producing a BMI (and, for backends
    /// that don't split interface/codegen, an object file alongside it).
    fn compile_module_interface(
        &self,
        source: &Path,
        bmi_output: &Path,
        module_deps: &HashMap<String, PathBuf>,
        opts: &CompileOptions,
    ) -> Result<ModuleInterfaceResult, OvoError>;

    /// Static capability flags for this backend.
    fn capabilities(&self) -> Capabilities;

    /// Which backend this is.
    fn kind(&self) -> CompilerKind;

    /// Path to the primary driver executable (cc/cxx entrypoint).
    fn path(&self) -> &Path;

    /// Verify the backend is actually invokable (runs `--version` or
    /// equivalent); used by detection after a candidate is found on PATH.
    fn verify(&self) -> Result<(), OvoError>;
}
