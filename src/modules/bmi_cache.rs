//! Content-addressed cache for compiled Binary Module Interfaces.
//!
//! The module-aware analogue of the teacher's `FingerprintCache`
//! (`src/builder/fingerprint.rs`): same mtime/hash-keyed validity check and
//! `load`/`save`/`matches` shape, but persisted as tab-separated text with
//! an explicit format-version header line rather than JSON, per the fixed
//! on-disk layout. A version mismatch or parse failure degrades to an
//! empty cache (a full rebuild) instead of a hard error.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::compiler::CompilerKind;
use crate::util::hash::sha256_file;

pub const BMI_CACHE_FORMAT_VERSION: u32 = 1;
const HEADER_MAGIC: &str = "OVO-BMI-CACHE";

/// A single cached BMI's validity key, plus the location of the BMI itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmiCacheEntry {
    pub module_name: String,
    pub source_path: PathBuf,
    pub bmi_path: PathBuf,
    pub source_mtime_secs: u64,
    pub source_hash: String,
    pub compiler_kind: String,
    pub compiler_version: String,
    /// Names of modules this one directly depends on, for the transitive
    /// validity check.
    pub dependency_names: Vec<String>,
}

impl BmiCacheEntry {
    /// Build an entry for `source`, hashing it and stamping its mtime now
    /// (i.e. immediately after a successful compile).
    pub fn build(
        module_name: &str,
        source: &Path,
        bmi_path: &Path,
        compiler_kind: CompilerKind,
        compiler_version: &str,
        dependency_names: Vec<String>,
    ) -> std::io::Result<Self> {
        let mtime = mtime_secs(source)?;
        let hash = sha256_file(source).map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        Ok(BmiCacheEntry {
            module_name: module_name.to_string(),
            source_path: source.to_path_buf(),
            bmi_path: bmi_path.to_path_buf(),
            source_mtime_secs: mtime,
            source_hash: hash,
            compiler_kind: compiler_kind.as_str().to_string(),
            compiler_version: compiler_version.to_string(),
            dependency_names,
        })
    }

    fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.module_name,
            self.source_path.display(),
            self.bmi_path.display(),
            self.source_mtime_secs,
            self.source_hash,
            self.compiler_kind,
            self.compiler_version,
            self.dependency_names.join(","),
        )
    }

    fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 8 {
            return None;
        }
        let deps = if fields[7].is_empty() {
            Vec::new()
        } else {
            fields[7].split(',').map(|s| s.to_string()).collect()
        };
        Some(BmiCacheEntry {
            module_name: fields[0].to_string(),
            source_path: PathBuf::from(fields[1]),
            bmi_path: PathBuf::from(fields[2]),
            source_mtime_secs: fields[3].parse().ok()?,
            source_hash: fields[4].to_string(),
            compiler_kind: fields[5].to_string(),
            compiler_version: fields[6].to_string(),
            dependency_names: deps,
        })
    }
}

fn mtime_secs(path: &Path) -> std::io::Result<u64> {
    let meta = std::fs::metadata(path)?;
    let modified = meta.modified()?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}

/// On-disk cache of BMI build results, keyed by module name.
#[derive(Debug, Default)]
pub struct BmiCache {
    entries: HashMap<String, BmiCacheEntry>,
}

impl BmiCache {
    pub fn new() -> Self {
        BmiCache::default()
    }

    /// Load from disk. A missing file, a format-version mismatch, or a
    /// malformed line all degrade to an empty cache rather than erroring —
    /// corruption here means "rebuild everything," not "fail the build."
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return BmiCache::new();
        };

        let mut lines = content.lines();
        let Some(header) = lines.next() else {
            return BmiCache::new();
        };

        let expected_header = format!("{HEADER_MAGIC}\tv{BMI_CACHE_FORMAT_VERSION}");
        if header != expected_header {
            tracing::warn!(
                "BMI cache at {} has an incompatible header ({:?}); rebuilding from scratch",
                path.display(),
                header
            );
            return BmiCache::new();
        }

        let mut entries = HashMap::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            match BmiCacheEntry::from_line(line) {
                Some(entry) => {
                    entries.insert(entry.module_name.clone(), entry);
                }
                None => {
                    tracing::warn!("skipping unparsable BMI cache line in {}", path.display());
                }
            }
        }

        BmiCache { entries }
    }

    /// Persist to disk in the tab-separated format, with the version header.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out = format!("{HEADER_MAGIC}\tv{BMI_CACHE_FORMAT_VERSION}\n");
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        for name in names {
            out.push_str(&self.entries[name].to_line());
            out.push('\n');
        }

        std::fs::write(path, out)
    }

    pub fn get(&self, module_name: &str) -> Option<&BmiCacheEntry> {
        self.entries.get(module_name)
    }

    pub fn insert(&mut self, entry: BmiCacheEntry) {
        self.entries.insert(entry.module_name.clone(), entry);
    }

    /// Whether the cached BMI for `module_name` is still valid: its source
    /// mtime must match the current file exactly, the compiler kind and
    /// version must match, the cached BMI file must still exist, and every
    /// direct dependency must itself be in `valid_modules` (the transitive
    /// check — callers walk the module graph bottom-up and build this set
    /// incrementally, so a stale dependency invalidates everything above it).
    /// An mtime change alone invalidates the entry; the stored content hash
    /// is not used as a fallback to resurrect a stale entry.
    pub fn is_valid(
        &self,
        module_name: &str,
        source: &Path,
        compiler_kind: CompilerKind,
        compiler_version: &str,
        valid_modules: &HashSet<String>,
    ) -> bool {
        let Some(entry) = self.entries.get(module_name) else {
            return false;
        };

        if !entry.bmi_path.exists() {
            return false;
        }

        if entry.compiler_kind != compiler_kind.as_str() || entry.compiler_version != compiler_version {
            return false;
        }

        let Ok(current_mtime) = mtime_secs(source) else {
            return false;
        };
        if current_mtime != entry.source_mtime_secs {
            return false;
        }

        entry
            .dependency_names
            .iter()
            .all(|dep| valid_modules.contains(dep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(name: &str, deps: Vec<&str>) -> BmiCacheEntry {
        BmiCacheEntry {
            module_name: name.to_string(),
            source_path: PathBuf::from(format!("{name}.cppm")),
            bmi_path: PathBuf::from(format!("{name}.pcm")),
            source_mtime_secs: 1000,
            source_hash: "deadbeef".to_string(),
            compiler_kind: "clang".to_string(),
            compiler_version: "17.0.0".to_string(),
            dependency_names: deps.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn test_roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bmi_cache");

        let mut cache = BmiCache::new();
        cache.insert(entry("math", vec![]));
        cache.insert(entry("app", vec!["math"]));
        cache.save(&path).unwrap();

        let loaded = BmiCache::load(&path);
        assert_eq!(loaded.get("math").unwrap().module_name, "math");
        assert_eq!(loaded.get("app").unwrap().dependency_names, vec!["math"]);
    }

    #[test]
    fn test_version_mismatch_yields_empty_cache() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bmi_cache");
        std::fs::write(&path, "OVO-BMI-CACHE\tv999\nmath\tmath.cppm\tmath.pcm\t1\tabc\tclang\t1\t\n").unwrap();

        let cache = BmiCache::load(&path);
        assert!(cache.get("math").is_none());
    }

    #[test]
    fn test_missing_file_yields_empty_cache() {
        let cache = BmiCache::load(Path::new("/nonexistent/path/bmi_cache"));
        assert!(cache.get("anything").is_none());
    }

    #[test]
    fn test_is_valid_checks_compiler_identity() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("math.cppm");
        std::fs::write(&source, "export module math;").unwrap();
        let bmi = tmp.path().join("math.pcm");
        std::fs::write(&bmi, "bmi-bytes").unwrap();

        let e = BmiCacheEntry::build("math", &source, &bmi, CompilerKind::Clang, "17.0.0", vec![]).unwrap();
        let mut cache = BmiCache::new();
        cache.insert(e);

        let valid = HashSet::new();
        assert!(cache.is_valid("math", &source, CompilerKind::Clang, "17.0.0", &valid));
        assert!(!cache.is_valid("math", &source, CompilerKind::Gcc, "17.0.0", &valid));
        assert!(!cache.is_valid("math", &source, CompilerKind::Clang, "18.0.0", &valid));
    }

    #[test]
    fn test_is_valid_requires_dependency_validity() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("app.cppm");
        std::fs::write(&source, "export module app; import math;").unwrap();
        let bmi = tmp.path().join("app.pcm");
        std::fs::write(&bmi, "bmi-bytes").unwrap();

        let e = BmiCacheEntry::build("app", &source, &bmi, CompilerKind::Clang, "17.0.0", vec!["math".to_string()]).unwrap();
        let mut cache = BmiCache::new();
        cache.insert(e);

        let empty = HashSet::new();
        assert!(!cache.is_valid("app", &source, CompilerKind::Clang, "17.0.0", &empty));

        let mut with_math = HashSet::new();
        with_math.insert("math".to_string());
        assert!(cache.is_valid("app", &source, CompilerKind::Clang, "17.0.0", &with_math));
    }

    #[test]
    fn test_mtime_change_alone_invalidates_entry() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("math.cppm");
        std::fs::write(&source, "export module math;").unwrap();
        let bmi = tmp.path().join("math.pcm");
        std::fs::write(&bmi, "bmi-bytes").unwrap();

        let e = BmiCacheEntry::build("math", &source, &bmi, CompilerKind::Clang, "17.0.0", vec![]).unwrap();
        let mut cache = BmiCache::new();
        cache.insert(e);

        let valid = HashSet::new();
        assert!(cache.is_valid("math", &source, CompilerKind::Clang, "17.0.0", &valid));

        // Rewrite with identical content: mtime advances, hash does not.
        std::thread::sleep(std::time::Duration::from_secs(1));
        std::fs::write(&source, "export module math;").unwrap();

        assert!(!cache.is_valid("math", &source, CompilerKind::Clang, "17.0.0", &valid));
    }

    #[test]
    fn test_is_valid_false_when_bmi_file_missing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("math.cppm");
        std::fs::write(&source, "export module math;").unwrap();
        let bmi = tmp.path().join("math.pcm"); // never created

        let e = BmiCacheEntry::build("math", &source, &bmi, CompilerKind::Gcc, "13.0.0", vec![]).unwrap();
        let mut cache = BmiCache::new();
        cache.insert(e);

        let valid = HashSet::new();
        assert!(!cache.is_valid("math", &source, CompilerKind::Gcc, "13.0.0", &valid));
    }
}
