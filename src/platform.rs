//! Platform selection for platform-keyed mapping entries.

use std::fmt;

use rattler_conda_types::Platform;
use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};

/// Platform family used to pick a branch out of a per-platform package list.
///
/// Mapping files key their per-platform lists with the tokens `linux`,
/// `win64` and `osx`; every conda subdir of the host collapses onto one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Linux,
    Win64,
    Osx,
}

impl TargetPlatform {
    /// Derive the target from a conda host platform.
    ///
    /// Fails with [`ResolveError::UnsupportedPlatform`] for subdirs that are
    /// neither linux, windows nor osx (e.g. `noarch`, `emscripten-wasm32`).
    pub fn from_host(host: Platform) -> Result<Self> {
        if host.is_linux() {
            Ok(TargetPlatform::Linux)
        } else if host.is_windows() {
            Ok(TargetPlatform::Win64)
        } else if host.is_osx() {
            Ok(TargetPlatform::Osx)
        } else {
            Err(ResolveError::UnsupportedPlatform(host.to_string()))
        }
    }

    /// Target for the platform this process runs on.
    pub fn current() -> Result<Self> {
        Self::from_host(Platform::current())
    }

    /// Key used in per-platform mapping lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Linux => "linux",
            TargetPlatform::Win64 => "win64",
            TargetPlatform::Osx => "osx",
        }
    }

    pub fn is_linux(&self) -> bool {
        matches!(self, TargetPlatform::Linux)
    }

    /// Linux and osx both ship X11 through conda-forge.
    pub fn is_unix(&self) -> bool {
        matches!(self, TargetPlatform::Linux | TargetPlatform::Osx)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_subdirs_collapse() {
        for host in [Platform::Linux64, Platform::LinuxAarch64, Platform::LinuxPpc64le] {
            assert_eq!(TargetPlatform::from_host(host).unwrap(), TargetPlatform::Linux);
        }
    }

    #[test]
    fn windows_and_osx_subdirs() {
        assert_eq!(
            TargetPlatform::from_host(Platform::Win64).unwrap(),
            TargetPlatform::Win64
        );
        assert_eq!(
            TargetPlatform::from_host(Platform::OsxArm64).unwrap(),
            TargetPlatform::Osx
        );
        assert_eq!(
            TargetPlatform::from_host(Platform::Osx64).unwrap(),
            TargetPlatform::Osx
        );
    }

    #[test]
    fn noarch_is_unsupported() {
        let err = TargetPlatform::from_host(Platform::NoArch).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedPlatform(ref p) if p == "noarch"));
    }

    #[test]
    fn unix_family() {
        assert!(TargetPlatform::Linux.is_unix());
        assert!(TargetPlatform::Osx.is_unix());
        assert!(!TargetPlatform::Win64.is_unix());
        assert!(!TargetPlatform::Osx.is_linux());
    }

    #[test]
    fn tokens() {
        assert_eq!(TargetPlatform::Win64.to_string(), "win64");
        let parsed: TargetPlatform = serde_json::from_str("\"osx\"").unwrap();
        assert_eq!(parsed, TargetPlatform::Osx);
    }
}
