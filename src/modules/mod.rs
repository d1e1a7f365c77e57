//! C++20 modules subsystem: scanning, dependency graph, and BMI caching.

pub mod bmi_cache;
pub mod graph;
pub mod scanner;

use std::path::PathBuf;

use crate::util::interning::InternedString;

/// How a translation unit relates to a named module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// `import foo;`
    Import,
    /// `import :partition;` (a partition of the current module)
    ImportPartition,
    /// `import "header.h";` / `import <header>;` (header unit)
    ImportHeaderUnit,
    /// `export import foo;` (re-exported from the current interface)
    ExportImport,
}

/// A single `import` declaration found while scanning a translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDependency {
    pub kind: DependencyKind,
    /// Module name for `Import`/`ImportPartition`/`ExportImport`; header path
    /// text for `ImportHeaderUnit` (never resolved to an in-graph source).
    pub name: InternedString,
    /// Set when `name` begins with `std` (`std`, `std.compat`, ...): the
    /// standard library import has no in-graph source and is skipped when
    /// resolving edges.
    pub is_std: bool,
}

/// Build state of a module unit, tracked by the graph scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    Pending,
    Scanning,
    Ready,
    Building,
    Built,
    Failed,
}

/// A single translation unit participating in the module graph: either a
/// module interface/implementation unit or a plain (non-module) source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleUnit {
    pub source: PathBuf,
    /// Name this unit provides as a module interface, if any.
    pub provides: Option<InternedString>,
    /// Whether `provides` was declared with `export module` (a true
    /// interface) as opposed to a plain `module X;` implementation unit.
    pub is_interface: bool,
    pub dependencies: Vec<ModuleDependency>,
    pub state: UnitState,
}

impl ModuleUnit {
    pub fn new(source: PathBuf) -> Self {
        ModuleUnit {
            source,
            provides: None,
            is_interface: false,
            dependencies: Vec::new(),
            state: UnitState::Pending,
        }
    }
}
