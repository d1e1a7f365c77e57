//! Language standards and optimization levels.
//!
//! Pure value types with a flag-string emission method per compiler dialect.
//! Parsing follows the teacher's `FromStr` + dedicated parse-error convention.

use std::fmt;
use std::str::FromStr;

/// C standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CStandard {
    C89,
    C99,
    C11,
    C17,
    C23,
}

impl CStandard {
    /// GCC/Clang flag value (e.g. "c11").
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CStandard::C89 => "c89",
            CStandard::C99 => "c99",
            CStandard::C11 => "c11",
            CStandard::C17 => "c17",
            CStandard::C23 => "c23",
        }
    }

    /// GNU-extension variant (e.g. "gnu11").
    pub fn as_gnu_flag_value(&self) -> &'static str {
        match self {
            CStandard::C89 => "gnu89",
            CStandard::C99 => "gnu99",
            CStandard::C11 => "gnu11",
            CStandard::C17 => "gnu17",
            CStandard::C23 => "gnu23",
        }
    }

    /// MSVC `/std:` flag value. MSVC has no selector below C17; anything
    /// older clamps up to `/std:c11` (the oldest MSVC actually accepts).
    pub fn as_msvc_flag_value(&self) -> &'static str {
        match self {
            CStandard::C89 | CStandard::C99 | CStandard::C11 => "c11",
            CStandard::C17 => "c17",
            CStandard::C23 => "clatest",
        }
    }
}

impl FromStr for CStandard {
    type Err = StandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "89" | "c89" | "C89" | "90" | "c90" | "C90" => Ok(CStandard::C89),
            "99" | "c99" | "C99" => Ok(CStandard::C99),
            "11" | "c11" | "C11" => Ok(CStandard::C11),
            "17" | "c17" | "C17" | "18" | "c18" | "C18" => Ok(CStandard::C17),
            "23" | "c23" | "C23" => Ok(CStandard::C23),
            _ => Err(StandardParseError(s.to_string())),
        }
    }
}

impl fmt::Display for CStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C{}",
            match self {
                CStandard::C89 => "89",
                CStandard::C99 => "99",
                CStandard::C11 => "11",
                CStandard::C17 => "17",
                CStandard::C23 => "23",
            }
        )
    }
}

/// C++ standard version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CppStandard {
    Cpp11,
    Cpp14,
    Cpp17,
    Cpp20,
    Cpp23,
    Cpp26,
}

impl CppStandard {
    /// GCC/Clang flag value (e.g. "c++17").
    pub fn as_flag_value(&self) -> &'static str {
        match self {
            CppStandard::Cpp11 => "c++11",
            CppStandard::Cpp14 => "c++14",
            CppStandard::Cpp17 => "c++17",
            CppStandard::Cpp20 => "c++20",
            CppStandard::Cpp23 => "c++23",
            CppStandard::Cpp26 => "c++26",
        }
    }

    /// MSVC `/std:` flag value ("c++latest" for anything MSVC has no
    /// dedicated selector for yet).
    pub fn as_msvc_flag_value(&self) -> &'static str {
        match self {
            CppStandard::Cpp11 | CppStandard::Cpp14 => "c++14",
            CppStandard::Cpp17 => "c++17",
            CppStandard::Cpp20 => "c++20",
            CppStandard::Cpp23 | CppStandard::Cpp26 => "c++latest",
        }
    }

    /// C++20 and later support modules.
    pub fn supports_modules(&self) -> bool {
        matches!(self, CppStandard::Cpp20 | CppStandard::Cpp23 | CppStandard::Cpp26)
    }
}

impl FromStr for CppStandard {
    type Err = StandardParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "11" | "c++11" | "cpp11" => Ok(CppStandard::Cpp11),
            "14" | "c++14" | "cpp14" => Ok(CppStandard::Cpp14),
            "17" | "c++17" | "cpp17" => Ok(CppStandard::Cpp17),
            "20" | "c++20" | "cpp20" => Ok(CppStandard::Cpp20),
            "23" | "c++23" | "cpp23" => Ok(CppStandard::Cpp23),
            "26" | "c++26" | "cpp26" => Ok(CppStandard::Cpp26),
            _ => Err(StandardParseError(s.to_string())),
        }
    }
}

impl fmt::Display for CppStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C++{}",
            match self {
                CppStandard::Cpp11 => "11",
                CppStandard::Cpp14 => "14",
                CppStandard::Cpp17 => "17",
                CppStandard::Cpp20 => "20",
                CppStandard::Cpp23 => "23",
                CppStandard::Cpp26 => "26",
            }
        )
    }
}

/// Error returned when parsing an invalid standard string.
#[derive(Debug, Clone)]
pub struct StandardParseError(pub String);

impl fmt::Display for StandardParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid language standard '{}'", self.0)
    }
}

impl std::error::Error for StandardParseError {}

/// Optimization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptimizationLevel {
    #[default]
    None,
    Debug,
    Size,
    SizeAggressive,
    Speed,
    Aggressive,
    FastMath,
}

impl OptimizationLevel {
    /// GCC/Clang flag (Clang prefers `-glldb` for debug info elsewhere, but
    /// optimization flags are shared between the two GCC-like dialects).
    pub fn as_gcc_flag(&self) -> &'static str {
        match self {
            OptimizationLevel::None => "-O0",
            OptimizationLevel::Debug => "-Og",
            OptimizationLevel::Size => "-Os",
            OptimizationLevel::SizeAggressive => "-Oz",
            OptimizationLevel::Speed => "-O2",
            OptimizationLevel::Aggressive => "-O3",
            OptimizationLevel::FastMath => "-Ofast",
        }
    }

    /// MSVC `/O` flag. MSVC has no `-Og`/`-Oz`/`-Ofast` equivalents; they
    /// collapse onto the closest selector MSVC actually exposes.
    pub fn as_msvc_flag(&self) -> &'static str {
        match self {
            OptimizationLevel::None | OptimizationLevel::Debug => "/Od",
            OptimizationLevel::Size | OptimizationLevel::SizeAggressive => "/O1",
            OptimizationLevel::Speed | OptimizationLevel::Aggressive | OptimizationLevel::FastMath => "/O2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_standard_roundtrip() {
        for (s, expect) in [
            ("11", CStandard::C11),
            ("c17", CStandard::C17),
            ("C23", CStandard::C23),
        ] {
            assert_eq!(CStandard::from_str(s).unwrap(), expect);
        }
    }

    #[test]
    fn test_c_standard_invalid() {
        assert!(CStandard::from_str("99999").is_err());
    }

    #[test]
    fn test_cpp_standard_msvc_flag() {
        assert_eq!(CppStandard::Cpp20.as_msvc_flag_value(), "c++20");
        assert_eq!(CppStandard::Cpp23.as_msvc_flag_value(), "c++latest");
        assert_eq!(CppStandard::Cpp26.as_msvc_flag_value(), "c++latest");
    }

    #[test]
    fn test_supports_modules() {
        assert!(!CppStandard::Cpp17.supports_modules());
        assert!(CppStandard::Cpp20.supports_modules());
        assert!(CppStandard::Cpp23.supports_modules());
        assert!(CppStandard::Cpp26.supports_modules());
    }

    #[test]
    fn test_optimization_flags() {
        assert_eq!(OptimizationLevel::None.as_gcc_flag(), "-O0");
        assert_eq!(OptimizationLevel::Aggressive.as_gcc_flag(), "-O3");
        assert_eq!(OptimizationLevel::FastMath.as_msvc_flag(), "/O2");
    }
}
