//! OVO core: the compiler abstraction layer and C++20 modules subsystem for
//! a C/C++ package manager and build driver.
//!
//! This crate covers the polymorphic interface over five compiler backends
//! (gcc, clang, msvc, emscripten, zig-cc), the module dependency graph with
//! cycle detection and topological scheduling, and a content-addressed BMI
//! cache. The manifest format, dependency resolver, network fetching, and
//! CLI surface live above this crate, not in it.

pub mod compiler;
pub mod diagnostic;
pub mod error;
pub mod facade;
pub mod language;
pub mod modules;
pub mod standard;
pub mod target;
pub mod util;

pub use compiler::detect::{detect_compiler, detect_specific, select_compiler};
pub use compiler::{
    Capabilities, CompileOptions, CompileResult, Compiler, CompilerKind, LinkKind, LinkOptions,
    LinkResult, ModuleDepsResult, ModuleInterfaceResult, OutputKind, Requirements,
};
pub use diagnostic::{Diagnostic, Level};
pub use error::{OvoError, Result};
pub use facade::{build, build_with_modules, BuildProgress};
pub use language::Language;
pub use modules::bmi_cache::BmiCache;
pub use modules::graph::ModuleGraph;
pub use modules::{DependencyKind, ModuleDependency, ModuleUnit};
pub use standard::{CStandard, CppStandard, OptimizationLevel};
pub use target::{Abi, Arch, Os, Target};
