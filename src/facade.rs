//! Build facade: drives a `Compiler` backend over a set of translation
//! units, choosing between two execution strategies.
//!
//! `build()` compiles independent (non-module) translation units in
//! parallel via `rayon`, the way the teacher's `NativeBuilder` fans work out
//! across a thread pool. `build_with_modules()` instead walks a
//! `ModuleGraph` in topological order and compiles strictly sequentially,
//! since a module interface must exist before anything importing it can be
//! compiled — the BMI cache lets unchanged interfaces skip recompilation
//! even on this sequential path.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::compiler::{CompileOptions, Compiler, LinkOptions, LinkResult};
use crate::error::OvoError;
use crate::modules::bmi_cache::{BmiCache, BmiCacheEntry};
use crate::modules::{DependencyKind, ModuleGraph};

/// Atomic progress counters shared across the parallel compile stage and
/// whatever caller wants to report on it (a CLI progress bar, a log line).
#[derive(Clone)]
pub struct BuildProgress {
    compiled: Arc<AtomicUsize>,
    total: usize,
}

impl BuildProgress {
    pub fn new(total: usize) -> Self {
        BuildProgress {
            compiled: Arc::new(AtomicUsize::new(0)),
            total,
        }
    }

    fn tick(&self) {
        self.compiled.fetch_add(1, Ordering::SeqCst);
    }

    pub fn compiled(&self) -> usize {
        self.compiled.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.compiled() >= self.total
    }
}

/// Turn a per-unit compile failure (`CompileResult::success == false`) into
/// the `Err` the facade's own `Result`-returning API surfaces. Backends
/// themselves never do this — they report failure in-band — the facade is
/// where per-unit results get aggregated into a single build outcome.
fn require_compiled(source: &Path, result: crate::compiler::CompileResult) -> Result<PathBuf, OvoError> {
    if !result.success {
        return Err(OvoError::CompileFailed {
            source_file: source.to_path_buf(),
            exit_code: result.exit_code,
            stderr: result.stderr,
        });
    }
    Ok(result.object_file.expect("success implies object_file is set"))
}

/// Compile `sources` in parallel against a single backend and option set.
/// Stops at the first error per rayon's fail-fast `collect`, but other
/// in-flight compiles are not cancelled — they simply run to completion
/// and their results are discarded.
pub fn compile_all(
    compiler: &dyn Compiler,
    sources: &[PathBuf],
    opts: &CompileOptions,
    progress: Option<&BuildProgress>,
) -> Result<Vec<PathBuf>, OvoError> {
    let results: Result<Vec<PathBuf>, OvoError> = sources
        .par_iter()
        .map(|src| {
            let result = compiler.compile(src, opts)?;
            let object_file = require_compiled(src, result)?;
            if let Some(p) = progress {
                p.tick();
            }
            Ok(object_file)
        })
        .collect();
    results
}

/// Compile and link a set of non-module translation units into a single
/// artifact.
pub fn build(
    compiler: &dyn Compiler,
    sources: &[PathBuf],
    compile_opts: &CompileOptions,
    mut link_opts: LinkOptions,
) -> Result<LinkResult, OvoError> {
    let progress = BuildProgress::new(sources.len());
    let objects = compile_all(compiler, sources, compile_opts, Some(&progress))?;
    link_opts.objects = objects;
    let result = compiler.link(&link_opts)?;
    if !result.success {
        return Err(OvoError::LinkFailed {
            output: link_opts.output.clone(),
            exit_code: result.exit_code,
            stderr: result.stderr,
        });
    }
    Ok(result)
}

/// Compile a module graph in dependency order, producing object files ready
/// to link. Module interface units whose BMI is still valid (per the cache)
/// are skipped entirely; everything else is compiled one unit at a time, in
/// the order `ModuleGraph::topological_sort` returns.
///
/// Non-interface units inside the graph (plain implementation units that
/// `import` a module) are compiled with `Compiler::compile` rather than
/// `compile_module_interface` — any `-fmodule-file`-style flags they need to
/// consume their imports must already be present in `opts.extra_flags`,
/// since the plain `compile` signature carries no module-dependency map.
pub fn build_with_modules(
    compiler: &dyn Compiler,
    graph: &ModuleGraph,
    bmi_dir: &Path,
    cache_path: &Path,
    compiler_version: &str,
    opts: &CompileOptions,
) -> Result<Vec<PathBuf>, OvoError> {
    std::fs::create_dir_all(bmi_dir).map_err(OvoError::Io)?;

    let order = graph.topological_sort()?;
    let mut cache = BmiCache::load(cache_path);
    let mut valid_modules: HashSet<String> = HashSet::new();
    let mut bmi_paths: HashMap<String, PathBuf> = HashMap::new();
    let mut object_files = Vec::new();

    for idx in order {
        let unit = graph.node(idx);
        let dep_names: Vec<String> = unit
            .dependencies
            .iter()
            .filter(|d| d.kind != DependencyKind::ImportHeaderUnit)
            .map(|d| d.name.as_str().to_string())
            .collect();

        if !unit.is_interface {
            let mut unit_opts = opts.clone();
            unit_opts.prebuilt_modules = bmi_paths.clone();
            let result = compiler.compile(&unit.source, &unit_opts)?;
            let object_file = require_compiled(&unit.source, result)?;
            object_files.push(object_file);
            continue;
        }

        let name = unit
            .provides
            .map(|n| n.as_str().to_string())
            .expect("module interface unit always has a provided name");

        if cache.is_valid(&name, &unit.source, compiler.kind(), compiler_version, &valid_modules) {
            let entry = cache.get(&name).expect("is_valid implies a cache entry exists");
            bmi_paths.insert(name.clone(), entry.bmi_path.clone());

            // The object file lives alongside the BMI under one of two
            // conventions (gcc/clang emit "o", msvc emits "obj"); the cache
            // entry itself only tracks BMI validity, not the object path.
            let candidate_o = entry.bmi_path.with_extension("o");
            let candidate_obj = entry.bmi_path.with_extension("obj");
            if candidate_o.exists() {
                object_files.push(candidate_o);
            } else if candidate_obj.exists() {
                object_files.push(candidate_obj);
            } else {
                tracing::warn!(
                    "BMI cache hit for module '{name}' but its object file is missing; module will link without it"
                );
            }

            valid_modules.insert(name);
            continue;
        }

        let module_deps: HashMap<String, PathBuf> = dep_names
            .iter()
            .filter_map(|d| bmi_paths.get(d).map(|p| (d.clone(), p.clone())))
            .collect();

        let bmi_output = bmi_dir.join(format!("{name}.bmi"));
        let result = compiler.compile_module_interface(&unit.source, &bmi_output, &module_deps, opts)?;

        if !result.success {
            return Err(OvoError::CompileFailed {
                source_file: unit.source.clone(),
                exit_code: result.exit_code,
                stderr: result.stderr,
            });
        }
        let bmi_path = result
            .bmi_path
            .clone()
            .expect("success implies bmi_path is set");

        if let Some(obj) = &result.object_file {
            object_files.push(obj.clone());
        }
        bmi_paths.insert(name.clone(), bmi_path.clone());

        let entry = BmiCacheEntry::build(&name, &unit.source, &bmi_path, compiler.kind(), compiler_version, dep_names)
            .map_err(OvoError::Io)?;
        cache.insert(entry);
        valid_modules.insert(name);
    }

    cache.save(cache_path).map_err(OvoError::Io)?;
    Ok(object_files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_progress_tracks_total() {
        let p = BuildProgress::new(3);
        assert!(!p.is_complete());
        p.tick();
        p.tick();
        assert_eq!(p.compiled(), 2);
        p.tick();
        assert!(p.is_complete());
    }
}
