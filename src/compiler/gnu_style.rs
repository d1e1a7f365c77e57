//! Shared GCC-style flag translation, reused by gcc/clang/zig-cc/emscripten.
//!
//! These four backends all accept the same `-I`/`-D`/`-std=`/`-O` flag
//! syntax (GCC's, which Clang and its derivatives mirror); only MSVC uses
//! a different prefix convention. Generalized from the teacher's
//! `GccToolchain::compile_command`/`link_*_command`.

use std::path::PathBuf;

use crate::compiler::command::CommandSpec;
use crate::compiler::{CompileOptions, LinkKind, LinkOptions, OutputKind};
use crate::language::Language;
use crate::target::Os;

pub fn compile_args(source: &std::path::Path, output: &std::path::Path, opts: &CompileOptions) -> Vec<String> {
    let mut args = Vec::new();
    match opts.output_kind {
        OutputKind::Object => args.push("-c".to_string()),
        OutputKind::Assembly => args.push("-S".to_string()),
        OutputKind::Preprocessed => args.push("-E".to_string()),
        OutputKind::LlvmIr => args.extend(["-emit-llvm".to_string(), "-S".to_string()]),
        OutputKind::Bitcode => args.extend(["-emit-llvm".to_string(), "-c".to_string()]),
    }

    match opts.language {
        Language::Cxx | Language::ObjCxx => {
            if let Some(std) = opts.cpp_standard {
                args.push(format!("-std={}", std.as_flag_value()));
            }
        }
        Language::C | Language::ObjC => {
            if let Some(std) = opts.c_standard {
                args.push(format!("-std={}", std.as_flag_value()));
            }
        }
        Language::Asm => {}
    }

    args.push(opts.optimization.as_gcc_flag().to_string());
    if opts.debug_info {
        args.push("-g".to_string());
    }
    if opts.position_independent {
        args.push("-fPIC".to_string());
    }
    if opts.warnings_as_errors {
        args.push("-Werror".to_string());
    }
    if opts.verbose {
        args.push("-v".to_string());
    }
    if opts.sanitize_address {
        args.push("-fsanitize=address".to_string());
        args.push("-fno-omit-frame-pointer".to_string());
    }
    if opts.sanitize_thread {
        args.push("-fsanitize=thread".to_string());
    }
    if opts.sanitize_undefined {
        args.push("-fsanitize=undefined".to_string());
    }
    if let Some(target) = &opts.target {
        args.push(format!("--target={}", target.as_triple_str()));
    }

    for dir in &opts.include_dirs {
        args.push(format!("-I{}", dir.display()));
    }
    for dir in &opts.system_include_dirs {
        args.push("-isystem".to_string());
        args.push(dir.display().to_string());
    }
    for (name, value) in &opts.defines {
        match value {
            Some(v) => args.push(format!("-D{name}={v}")),
            None => args.push(format!("-D{name}")),
        }
    }
    for warning in &opts.warnings {
        args.push(format!("-W{warning}"));
    }

    if let Some(dir) = &opts.module_cache_dir {
        args.push(format!("-fmodules-cache-path={}", dir.display()));
    }
    let mut module_names: Vec<&String> = opts.prebuilt_modules.keys().collect();
    module_names.sort();
    for name in module_names {
        args.push(format!("-fmodule-file={name}={}", opts.prebuilt_modules[name].display()));
    }

    args.extend(opts.extra_flags.iter().cloned());

    args.push(source.display().to_string());
    args.push("-o".to_string());
    args.push(output.display().to_string());
    args
}

pub fn archive_args(objects: &[PathBuf], output: &std::path::Path) -> Vec<String> {
    let mut args = vec!["rcs".to_string(), output.display().to_string()];
    args.extend(objects.iter().map(|o| o.display().to_string()));
    args
}

pub fn link_args(opts: &LinkOptions) -> Vec<String> {
    let mut args = Vec::new();

    match opts.kind {
        LinkKind::SharedLibrary => args.push("-shared".to_string()),
        LinkKind::Executable | LinkKind::StaticLibrary => {}
    }

    if opts.lto {
        args.push("-flto".to_string());
    }
    if opts.export_dynamic {
        args.push("-rdynamic".to_string());
    }
    if opts.verbose {
        args.push("-v".to_string());
    }
    if let Some(target) = &opts.target {
        args.push(format!("--target={}", target.as_triple_str()));
    }

    let is_macos = opts
        .target
        .as_ref()
        .map(|t| t.os == Os::MacOs)
        .unwrap_or(cfg!(target_os = "macos"));

    if is_macos {
        for dir in &opts.framework_dirs {
            args.push(format!("-F{}", dir.display()));
        }
        for framework in &opts.frameworks {
            args.push("-framework".to_string());
            args.push(framework.clone());
        }
        if opts.allow_undefined {
            args.push("-undefined".to_string());
            args.push("dynamic_lookup".to_string());
        }
    } else if opts.allow_undefined {
        args.push("-Wl,--allow-shlib-undefined".to_string());
    }

    if let Some(script) = &opts.linker_script {
        args.push(format!("-Wl,-T,{}", script.display()));
    }

    args.push("-o".to_string());
    args.push(opts.output.display().to_string());

    args.extend(opts.objects.iter().map(|o| o.display().to_string()));

    for dir in &opts.library_dirs {
        args.push(format!("-L{}", dir.display()));
    }
    for lib in &opts.libraries {
        args.push(format!("-l{lib}"));
    }
    for rpath in &opts.rpaths {
        args.push(format!("-Wl,-rpath,{}", rpath.display()));
    }
    if opts.strip {
        args.push("-s".to_string());
    }

    args
}

pub fn driver_for_language(cc: &std::path::Path, cxx: &std::path::Path, language: Language) -> PathBuf {
    match language {
        Language::Cxx | Language::ObjCxx => cxx.to_path_buf(),
        Language::C | Language::ObjC | Language::Asm => cc.to_path_buf(),
    }
}

pub fn run_version(cmd: CommandSpec) -> Option<String> {
    let output = cmd.arg("--version").run().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()?.lines().next().map(str::to_string)
}
