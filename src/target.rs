//! Target triples: architecture, operating system, and ABI.
//!
//! Generalizes the teacher's `TargetTriple` (arch/vendor/os/env strings) to
//! a closed enumeration per the data model, since OVO needs to branch on
//! these values when choosing flags, not just echo them back to a linker.

use std::fmt;
use std::str::FromStr;

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Aarch64,
    Riscv32,
    Riscv64,
    Wasm32,
    Wasm64,
    Mips,
    Mips64,
    PowerPc,
    PowerPc64,
    /// The architecture OVO itself is running on.
    Native,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
            Arch::Riscv32 => "riscv32",
            Arch::Riscv64 => "riscv64",
            Arch::Wasm32 => "wasm32",
            Arch::Wasm64 => "wasm64",
            Arch::Mips => "mips",
            Arch::Mips64 => "mips64",
            Arch::PowerPc => "powerpc",
            Arch::PowerPc64 => "powerpc64",
            Arch::Native => "native",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating system / environment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
    MacOs,
    FreeBsd,
    NetBsd,
    OpenBsd,
    Ios,
    Android,
    Wasi,
    Freestanding,
    /// The OS OVO itself is running on.
    Native,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOs => "macos",
            Os::FreeBsd => "freebsd",
            Os::NetBsd => "netbsd",
            Os::OpenBsd => "openbsd",
            Os::Ios => "ios",
            Os::Android => "android",
            Os::Wasi => "wasi",
            Os::Freestanding => "freestanding",
            Os::Native => "native",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary interface / libc flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abi {
    Gnu,
    Musl,
    Msvc,
    Eabi,
    None,
}

impl Abi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Abi::Gnu => "gnu",
            Abi::Musl => "musl",
            Abi::Msvc => "msvc",
            Abi::Eabi => "eabi",
            Abi::None => "none",
        }
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compilation target: architecture, OS, ABI, plus optional CPU tuning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub arch: Arch,
    pub os: Os,
    /// Defaults to `gnu` per the triple format, not `None`, unless the
    /// caller has a specific reason to omit an ABI component.
    pub abi: Abi,
    /// `-mcpu=`/`-march=`-style CPU name, e.g. "native", "apple-m1".
    pub cpu: Option<String>,
    /// `-mattr=`/`-mfpu=`-style feature strings, e.g. "+avx2".
    pub features: Vec<String>,
}

impl Target {
    pub fn new(arch: Arch, os: Os, abi: Abi) -> Self {
        Target {
            arch,
            os,
            abi,
            cpu: None,
            features: Vec::new(),
        }
    }

    /// The triple for the machine OVO itself is running on.
    pub fn host() -> Self {
        let arch = if cfg!(target_arch = "x86_64") {
            Arch::X86_64
        } else if cfg!(target_arch = "aarch64") {
            Arch::Aarch64
        } else if cfg!(target_arch = "arm") {
            Arch::Arm
        } else if cfg!(target_arch = "riscv64") {
            Arch::Riscv64
        } else if cfg!(target_arch = "riscv32") {
            Arch::Riscv32
        } else if cfg!(target_arch = "x86") {
            Arch::X86
        } else if cfg!(target_arch = "powerpc64") {
            Arch::PowerPc64
        } else if cfg!(target_arch = "powerpc") {
            Arch::PowerPc
        } else if cfg!(target_arch = "mips64") {
            Arch::Mips64
        } else if cfg!(target_arch = "mips") {
            Arch::Mips
        } else {
            Arch::X86_64
        };
        let (os, abi) = if cfg!(target_os = "linux") {
            (Os::Linux, Abi::Gnu)
        } else if cfg!(target_os = "macos") {
            (Os::MacOs, Abi::None)
        } else if cfg!(target_os = "windows") {
            (Os::Windows, Abi::Msvc)
        } else if cfg!(target_os = "freebsd") {
            (Os::FreeBsd, Abi::None)
        } else if cfg!(target_os = "netbsd") {
            (Os::NetBsd, Abi::None)
        } else if cfg!(target_os = "openbsd") {
            (Os::OpenBsd, Abi::None)
        } else if cfg!(target_os = "ios") {
            (Os::Ios, Abi::None)
        } else if cfg!(target_os = "android") {
            (Os::Android, Abi::None)
        } else {
            (Os::Linux, Abi::Gnu)
        };
        Target::new(arch, os, abi)
    }

    /// GNU-style triple string: `<arch>-<os>-<abi>`, no vendor field.
    pub fn as_triple_str(&self) -> String {
        format!("{}-{}-{}", self.arch, self.os, self.abi)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_triple_str())
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() != 3 {
            return Err(TargetParseError(s.to_string()));
        }
        let arch = match parts[0] {
            "x86" | "i686" | "i386" => Arch::X86,
            "x86_64" => Arch::X86_64,
            "arm" | "armv7" => Arch::Arm,
            "aarch64" | "arm64" => Arch::Aarch64,
            "riscv32" => Arch::Riscv32,
            "riscv64" | "riscv64gc" => Arch::Riscv64,
            "wasm32" => Arch::Wasm32,
            "wasm64" => Arch::Wasm64,
            "mips" => Arch::Mips,
            "mips64" => Arch::Mips64,
            "powerpc" => Arch::PowerPc,
            "powerpc64" => Arch::PowerPc64,
            "native" => Arch::Native,
            _ => return Err(TargetParseError(s.to_string())),
        };
        let os = match parts[1] {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "macos" | "darwin" => Os::MacOs,
            "freebsd" => Os::FreeBsd,
            "netbsd" => Os::NetBsd,
            "openbsd" => Os::OpenBsd,
            "ios" => Os::Ios,
            "android" => Os::Android,
            "wasi" => Os::Wasi,
            "freestanding" => Os::Freestanding,
            "native" => Os::Native,
            _ => return Err(TargetParseError(s.to_string())),
        };
        let abi = match parts[2] {
            "gnu" => Abi::Gnu,
            "musl" => Abi::Musl,
            "msvc" => Abi::Msvc,
            "eabi" | "eabihf" => Abi::Eabi,
            "none" => Abi::None,
            _ => return Err(TargetParseError(s.to_string())),
        };
        Ok(Target::new(arch, os, abi))
    }
}

/// Error returned when parsing a malformed target triple.
#[derive(Debug, Clone)]
pub struct TargetParseError(pub String);

impl fmt::Display for TargetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid target triple '{}'", self.0)
    }
}

impl std::error::Error for TargetParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_triple_is_non_empty() {
        let t = Target::host();
        assert!(!t.as_triple_str().is_empty());
    }

    #[test]
    fn test_parse_linux_gnu() {
        let t: Target = "x86_64-linux-gnu".parse().unwrap();
        assert_eq!(t.arch, Arch::X86_64);
        assert_eq!(t.os, Os::Linux);
        assert_eq!(t.abi, Abi::Gnu);
    }

    #[test]
    fn test_parse_macos() {
        let t: Target = "aarch64-macos-none".parse().unwrap();
        assert_eq!(t.arch, Arch::Aarch64);
        assert_eq!(t.os, Os::MacOs);
        assert_eq!(t.abi, Abi::None);
    }

    #[test]
    fn test_parse_windows_msvc() {
        let t: Target = "x86_64-windows-msvc".parse().unwrap();
        assert_eq!(t.abi, Abi::Msvc);
    }

    #[test]
    fn test_parse_invalid() {
        assert!("garbage".parse::<Target>().is_err());
    }

    #[test]
    fn test_parse_rejects_vendor_bearing_triple() {
        assert!("x86_64-unknown-linux-gnu".parse::<Target>().is_err());
    }

    #[test]
    fn test_roundtrip_display() {
        let t = Target::new(Arch::X86_64, Os::Linux, Abi::Gnu);
        assert_eq!(t.as_triple_str(), "x86_64-linux-gnu");
    }

    #[test]
    fn test_freestanding_and_native() {
        let t = Target::new(Arch::Native, Os::Freestanding, Abi::None);
        assert_eq!(t.as_triple_str(), "native-freestanding-none");
    }
}
