//! Lexical, line-oriented scanner for C++20 module declarations.
//!
//! Deliberately not a real preprocessor: multi-line declarations, macros
//! that expand to `import`/`module`, and conditional compilation are not
//! handled. This mirrors the teacher's header parser (`src/builder/
//! bindings/parser.rs`), which scans C headers line-by-line with trim and
//! prefix matching rather than a full grammar.

use std::path::Path;

use crate::modules::{DependencyKind, ModuleDependency, ModuleUnit};
use crate::util::interning::InternedString;

/// Scan source text for a module declaration and its imports.
pub fn scan_source(path: &Path, text: &str) -> ModuleUnit {
    let mut unit = ModuleUnit::new(path.to_path_buf());

    for raw_line in text.lines() {
        let line = strip_line_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("export module ") {
            if let Some(name) = extract_module_name(rest) {
                unit.provides = Some(InternedString::new(name));
                unit.is_interface = true;
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("module ") {
            // Implementation unit attachment: `module foo;` (no `export`).
            // Per the module-graph's own linkage step this does not set a
            // new interface name; record nothing here, the graph build
            // attaches it to its parent using package-level context the
            // scanner doesn't have.
            let _ = extract_module_name(rest);
            continue;
        }

        if line == "module;" {
            // Global module fragment opener, not a declaration to record.
            continue;
        }

        if let Some(rest) = line.strip_prefix("export import ") {
            if let Some(dep) = parse_import_target(rest, true) {
                unit.dependencies.push(dep);
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("import ") {
            if let Some(dep) = parse_import_target(rest, false) {
                unit.dependencies.push(dep);
            }
            continue;
        }
    }

    unit
}

fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn extract_module_name(rest: &str) -> Option<String> {
    let name = rest.trim().trim_end_matches(';').trim();
    // Drop a trailing partition fragment (`foo:part`) isn't valid for a
    // top-level name; partitions are declared as `module foo:part;`.
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn is_std_module(name: &str) -> bool {
    name == "std" || name.starts_with("std.") || name.starts_with("std:")
}

fn parse_import_target(rest: &str, exported: bool) -> Option<ModuleDependency> {
    let target = rest.trim().trim_end_matches(';').trim();
    if target.is_empty() {
        return None;
    }

    if let Some(partition) = target.strip_prefix(':') {
        let name = partition.trim();
        return Some(ModuleDependency {
            kind: if exported { DependencyKind::ExportImport } else { DependencyKind::ImportPartition },
            name: InternedString::new(name),
            is_std: false,
        });
    }

    if (target.starts_with('"') && target.ends_with('"') && target.len() >= 2)
        || (target.starts_with('<') && target.ends_with('>') && target.len() >= 2)
    {
        let header = &target[1..target.len() - 1];
        return Some(ModuleDependency {
            kind: if exported { DependencyKind::ExportImport } else { DependencyKind::ImportHeaderUnit },
            name: InternedString::new(header),
            is_std: false,
        });
    }

    Some(ModuleDependency {
        kind: if exported { DependencyKind::ExportImport } else { DependencyKind::Import },
        name: InternedString::new(target),
        is_std: is_std_module(target),
    })
}
