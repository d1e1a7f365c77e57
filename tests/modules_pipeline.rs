//! End-to-end test of scanning -> graph resolution -> scheduling ->
//! module-aware facade build, against a mock backend so the test doesn't
//! depend on any compiler being installed. Mirrors scenario S3/S5 from the
//! module-aware build design.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ovo_core::{
    build_with_modules, CompileOptions, CompileResult, Compiler, CompilerKind, Capabilities,
    LinkOptions, LinkResult, ModuleDepsResult, ModuleGraph, ModuleInterfaceResult, ModuleUnit,
    OvoError,
};
use tempfile::TempDir;

/// A fake backend that writes placeholder BMI/object files instead of
/// spawning a real compiler, and records every module interface it was
/// asked to (re)compile.
struct MockCompiler {
    compiled_interfaces: Mutex<Vec<String>>,
    /// Every non-interface `compile()` call, alongside the `prebuilt_modules`
    /// map it was invoked with — lets tests assert the facade threads
    /// accumulated BMI paths into every unit's compile, not just interfaces.
    compiled_sources: Mutex<Vec<(PathBuf, HashMap<String, PathBuf>)>>,
}

impl MockCompiler {
    fn new() -> Self {
        MockCompiler {
            compiled_interfaces: Mutex::new(Vec::new()),
            compiled_sources: Mutex::new(Vec::new()),
        }
    }
}

impl Compiler for MockCompiler {
    fn compile(&self, source: &Path, opts: &CompileOptions) -> Result<CompileResult, OvoError> {
        self.compiled_sources.lock().unwrap().push((source.to_path_buf(), opts.prebuilt_modules.clone()));

        let object_file = source.with_extension("o");
        std::fs::write(&object_file, b"obj").map_err(OvoError::Io)?;
        Ok(CompileResult {
            success: true,
            object_file: Some(object_file),
            diagnostics: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            duration_ns: 0,
        })
    }

    fn link(&self, opts: &LinkOptions) -> Result<LinkResult, OvoError> {
        std::fs::write(&opts.output, b"bin").map_err(OvoError::Io)?;
        Ok(LinkResult {
            success: true,
            output: Some(opts.output.clone()),
            diagnostics: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            duration_ns: 0,
        })
    }

    fn scan_module_deps(&self, _source: &Path, _opts: &CompileOptions) -> Result<ModuleDepsResult, OvoError> {
        Ok(ModuleDepsResult::default())
    }

    fn compile_module_interface(
        &self,
        _source: &Path,
        bmi_output: &Path,
        _module_deps: &HashMap<String, PathBuf>,
        _opts: &CompileOptions,
    ) -> Result<ModuleInterfaceResult, OvoError> {
        self.compiled_interfaces
            .lock()
            .unwrap()
            .push(bmi_output.display().to_string());

        std::fs::write(bmi_output, b"bmi").map_err(OvoError::Io)?;
        let object_file = bmi_output.with_extension("o");
        std::fs::write(&object_file, b"obj").map_err(OvoError::Io)?;

        Ok(ModuleInterfaceResult {
            success: true,
            bmi_path: Some(bmi_output.to_path_buf()),
            object_file: Some(object_file),
            diagnostics: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(0),
            duration_ns: 0,
        })
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_modules: true,
            ..Default::default()
        }
    }

    fn kind(&self) -> CompilerKind {
        CompilerKind::Clang
    }

    fn path(&self) -> &Path {
        Path::new("mock-cc")
    }

    fn verify(&self) -> Result<(), OvoError> {
        Ok(())
    }
}

fn write_unit(tmp: &TempDir, name: &str, text: &str) -> ModuleUnit {
    let path = tmp.path().join(format!("{name}.cppm"));
    std::fs::write(&path, text).unwrap();
    ovo_core::modules::scanner::scan_source(&path, text)
}

#[test]
fn test_two_unit_chain_compiles_in_dependency_order() {
    let tmp = TempDir::new().unwrap();
    let math = write_unit(&tmp, "math", "export module math;\nexport int add(int,int);\n");
    let app = write_unit(&tmp, "app", "export module app;\nimport math;\n");

    let mut graph = ModuleGraph::new();
    graph.add_unit(math);
    graph.add_unit(app);
    graph.resolve_dependencies().unwrap();

    let compiler = MockCompiler::new();
    let bmi_dir = tmp.path().join("bmi");
    let cache_path = tmp.path().join("bmi_cache");

    let objects = build_with_modules(&compiler, &graph, &bmi_dir, &cache_path, "1.0.0", &CompileOptions::default())
        .unwrap();

    assert_eq!(objects.len(), 2);
    let order = compiler.compiled_interfaces.lock().unwrap().clone();
    assert_eq!(order.len(), 2);
    assert!(order[0].contains("math"));
    assert!(order[1].contains("app"));
}

#[test]
fn test_rebuild_skips_unchanged_interface_via_cache() {
    let tmp = TempDir::new().unwrap();
    let math = write_unit(&tmp, "math", "export module math;\n");

    let mut graph = ModuleGraph::new();
    graph.add_unit(math);
    graph.resolve_dependencies().unwrap();

    let compiler = MockCompiler::new();
    let bmi_dir = tmp.path().join("bmi");
    let cache_path = tmp.path().join("bmi_cache");
    let opts = CompileOptions::default();

    build_with_modules(&compiler, &graph, &bmi_dir, &cache_path, "1.0.0", &opts).unwrap();
    assert_eq!(compiler.compiled_interfaces.lock().unwrap().len(), 1);

    // Second build against the same unchanged source and cache: the
    // interface must not be recompiled.
    build_with_modules(&compiler, &graph, &bmi_dir, &cache_path, "1.0.0", &opts).unwrap();
    assert_eq!(compiler.compiled_interfaces.lock().unwrap().len(), 1);
}

#[test]
fn test_touching_source_invalidates_cache_entry() {
    let tmp = TempDir::new().unwrap();
    let source_text = "export module math;\n";
    let math = write_unit(&tmp, "math", source_text);
    let source_path = math.source.clone();

    let mut graph = ModuleGraph::new();
    graph.add_unit(math);
    graph.resolve_dependencies().unwrap();

    let compiler = MockCompiler::new();
    let bmi_dir = tmp.path().join("bmi");
    let cache_path = tmp.path().join("bmi_cache");
    let opts = CompileOptions::default();

    build_with_modules(&compiler, &graph, &bmi_dir, &cache_path, "1.0.0", &opts).unwrap();
    assert_eq!(compiler.compiled_interfaces.lock().unwrap().len(), 1);

    // Advance the source's mtime by rewriting it with different content.
    std::thread::sleep(std::time::Duration::from_secs(1));
    std::fs::write(&source_path, "export module math;\nexport int extra();\n").unwrap();

    let mut graph2 = ModuleGraph::new();
    let unit2 = ovo_core::modules::scanner::scan_source(&source_path, &std::fs::read_to_string(&source_path).unwrap());
    graph2.add_unit(unit2);
    graph2.resolve_dependencies().unwrap();

    build_with_modules(&compiler, &graph2, &bmi_dir, &cache_path, "1.0.0", &opts).unwrap();
    assert_eq!(compiler.compiled_interfaces.lock().unwrap().len(), 2);
}

#[test]
fn test_non_interface_unit_receives_prebuilt_modules() {
    let tmp = TempDir::new().unwrap();
    let math = write_unit(&tmp, "math", "export module math;\nexport int add(int,int);\n");
    let uses_math = write_unit(&tmp, "uses_math", "import math;\nint call_it() { return add(1, 2); }\n");
    assert!(!uses_math.is_interface);

    let mut graph = ModuleGraph::new();
    graph.add_unit(math);
    graph.add_unit(uses_math);
    graph.resolve_dependencies().unwrap();

    let compiler = MockCompiler::new();
    let bmi_dir = tmp.path().join("bmi");
    let cache_path = tmp.path().join("bmi_cache");

    build_with_modules(&compiler, &graph, &bmi_dir, &cache_path, "1.0.0", &CompileOptions::default()).unwrap();

    let sources = compiler.compiled_sources.lock().unwrap();
    let (_, prebuilt) = sources
        .iter()
        .find(|(src, _)| src.to_string_lossy().contains("uses_math"))
        .expect("the non-interface unit was compiled");
    assert!(prebuilt.contains_key("math"), "math's BMI path must be threaded into the implementation unit's compile");
}
