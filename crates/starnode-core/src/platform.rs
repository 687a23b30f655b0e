//! Target platform identifier used in release file names (`linux-amd64`, ...).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported operating system `{0}`")]
    UnsupportedOs(String),
    #[error("unsupported architecture `{0}`")]
    UnsupportedArch(String),
    #[error("platform must look like `<os>-<arch>`, got `{0}`")]
    Malformed(String),
}

/// OS and architecture in the naming scheme Prometheus release archives use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Platform this binary is running on.
    pub fn current() -> Result<Self, PlatformError> {
        Self::from_rust_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Map Rust's `std::env::consts` names onto release names.
    pub fn from_rust_target(os: &str, arch: &str) -> Result<Self, PlatformError> {
        let os = match os {
            "linux" => "linux",
            "macos" => "darwin",
            "freebsd" => "freebsd",
            "netbsd" => "netbsd",
            "openbsd" => "openbsd",
            other => return Err(PlatformError::UnsupportedOs(other.to_string())),
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "arm" => "armv7",
            "x86" => "386",
            "powerpc64" => "ppc64le",
            "s390x" => "s390x",
            "riscv64" => "riscv64",
            "mips64" => "mips64",
            other => return Err(PlatformError::UnsupportedArch(other.to_string())),
        };
        Ok(Platform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
    }

    /// `<os>-<arch>`, e.g. `linux-amd64`.
    pub fn identifier(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Parses an explicit override such as `linux-arm64`.
impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('-') {
            Some((os, arch)) if !os.is_empty() && !arch.is_empty() && !arch.contains('-') => {
                Ok(Platform {
                    os: os.to_ascii_lowercase(),
                    arch: arch.to_ascii_lowercase(),
                })
            }
            _ => Err(PlatformError::Malformed(s.to_string())),
        }
    }
}
