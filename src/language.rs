//! Source language classification.
//!
//! A translation unit's language is derived from its filename extension via
//! a static mapping, not declared explicitly by the caller.

use std::path::Path;

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
    ObjC,
    ObjCxx,
    Asm,
}

impl Language {
    /// Get the language name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "c++",
            Language::ObjC => "objective-c",
            Language::ObjCxx => "objective-c++",
            Language::Asm => "assembler",
        }
    }

    /// Whether this language is some flavor of C++ (affects standard selection,
    /// exceptions/RTTI flags, and the choice of link driver).
    pub fn is_cxx_family(&self) -> bool {
        matches!(self, Language::Cxx | Language::ObjCxx)
    }
}

/// Classify a source file's language from its extension.
///
/// Returns `None` for unrecognized extensions (the caller decides whether
/// that is an error).
pub fn classify_extension(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;
    Some(match ext {
        "c" => Language::C,
        "cc" | "cpp" | "cxx" | "C" | "c++" | "cppm" | "ixx" | "mpp" => Language::Cxx,
        "m" => Language::ObjC,
        "mm" => Language::ObjCxx,
        "s" | "S" | "asm" => Language::Asm,
        "h" | "hh" | "hpp" | "hxx" => return None,
        _ => return None,
    })
}

/// Module-interface extensions: a subset of C++ sources that declare
/// `export module` (or are conventionally used for one).
pub fn is_module_interface_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("cppm") | Some("ixx") | Some("mpp")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classify_c() {
        assert_eq!(classify_extension(&PathBuf::from("foo.c")), Some(Language::C));
    }

    #[test]
    fn test_classify_cxx_variants() {
        for ext in ["cc", "cpp", "cxx", "C", "c++", "cppm", "ixx", "mpp"] {
            let p = PathBuf::from(format!("foo.{ext}"));
            assert_eq!(classify_extension(&p), Some(Language::Cxx), "ext={ext}");
        }
    }

    #[test]
    fn test_classify_objc() {
        assert_eq!(classify_extension(&PathBuf::from("foo.m")), Some(Language::ObjC));
        assert_eq!(classify_extension(&PathBuf::from("foo.mm")), Some(Language::ObjCxx));
    }

    #[test]
    fn test_classify_asm() {
        assert_eq!(classify_extension(&PathBuf::from("foo.s")), Some(Language::Asm));
        assert_eq!(classify_extension(&PathBuf::from("foo.S")), Some(Language::Asm));
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_extension(&PathBuf::from("foo.txt")), None);
        assert_eq!(classify_extension(&PathBuf::from("foo.h")), None);
    }

    #[test]
    fn test_is_module_interface_extension() {
        assert!(is_module_interface_extension(&PathBuf::from("a.cppm")));
        assert!(is_module_interface_extension(&PathBuf::from("a.ixx")));
        assert!(is_module_interface_extension(&PathBuf::from("a.mpp")));
        assert!(!is_module_interface_extension(&PathBuf::from("a.cpp")));
    }
}
