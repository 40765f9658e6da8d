//! Toolchain version parsing and install-verb selection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static RE_GO_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"go(\d+)\.(\d+)(?:\.(\d+))?").expect("valid version regex"));

/// First toolchain release where `install` accepts `module@version`.
pub const MODULE_INSTALL_SINCE: RuntimeVersion = RuntimeVersion::new(1, 16, 0);

/// (major, minor, patch) as reported by `go version`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuntimeVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RuntimeVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `go version` output. Anything unparsable yields `0.0.0`.
    pub fn parse(output: &str) -> Self {
        let Some(caps) = RE_GO_VERSION.captures(output) else {
            return Self::default();
        };
        let component = |idx: usize| {
            caps.get(idx)
                .and_then(|m| m.as_str().parse::<u32>().ok())
                .unwrap_or(0)
        };
        Self::new(component(1), component(2), component(3))
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Toolchain subcommand used to fetch and build a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallVerb {
    /// Legacy `go get`
    Get,
    /// `go install module@version`
    Install,
}

impl InstallVerb {
    pub fn for_runtime(version: RuntimeVersion) -> Self {
        if version < MODULE_INSTALL_SINCE {
            InstallVerb::Get
        } else {
            InstallVerb::Install
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallVerb::Get => "get",
            InstallVerb::Install => "install",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version_selects_legacy_verb() {
        let version = RuntimeVersion::parse("go version go1.15.6 linux/amd64\n");
        assert_eq!(version, RuntimeVersion::new(1, 15, 6));
        assert_eq!(InstallVerb::for_runtime(version), InstallVerb::Get);
    }

    #[test]
    fn test_parse_missing_patch_selects_modern_verb() {
        let version = RuntimeVersion::parse("go version go1.20 darwin/arm64");
        assert_eq!(version, RuntimeVersion::new(1, 20, 0));
        assert_eq!(InstallVerb::for_runtime(version), InstallVerb::Install);
    }

    #[test]
    fn test_parse_empty_defaults_to_zero() {
        let version = RuntimeVersion::parse("");
        assert_eq!(version, RuntimeVersion::default());
        assert_eq!(InstallVerb::for_runtime(version), InstallVerb::Get);
    }

    #[test]
    fn test_parse_garbage_defaults_to_zero() {
        assert_eq!(RuntimeVersion::parse("command not recognised"), RuntimeVersion::default());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(
            InstallVerb::for_runtime(RuntimeVersion::new(1, 16, 0)),
            InstallVerb::Install
        );
        assert_eq!(
            InstallVerb::for_runtime(RuntimeVersion::new(1, 15, 99)),
            InstallVerb::Get
        );
    }

    #[test]
    fn test_parse_prerelease_toolchain() {
        let version = RuntimeVersion::parse("go version go1.22rc1 linux/amd64");
        assert_eq!(version, RuntimeVersion::new(1, 22, 0));
        assert_eq!(version.to_string(), "1.22.0");
    }
}
