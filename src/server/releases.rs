//! Upstream release lookup.
//!
//! Parses the GitHub releases listing of `golang/tools` and decides whether
//! a newer stable gopls than the configured one exists.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Tag prefix of gopls releases in the `golang/tools` repository
pub const GOPLS_TAG_PREFIX: &str = "gopls/v";

static RE_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+)-?(\w+\.\d+)?").expect("valid release regex")
});

/// One entry of the releases listing. Other fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A parsed gopls release version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseVersion {
    /// `major.minor.patch`
    pub version: String,
    /// Pre-release suffix such as `pre.1`
    pub prerelease: Option<String>,
}

impl ReleaseVersion {
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prerelease {
            Some(pre) => write!(f, "{}-{pre}", self.version),
            None => f.write_str(&self.version),
        }
    }
}

/// Parse a releases listing.
pub fn parse_releases(json: &str) -> Result<Vec<Release>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parse a version string like `0.14.2` or `0.15.0-pre.1`.
pub fn parse_release_version(raw: &str) -> Option<ReleaseVersion> {
    let caps = RE_RELEASE.captures(raw)?;
    Some(ReleaseVersion {
        version: caps.get(1)?.as_str().to_string(),
        prerelease: caps.get(2).map(|m| m.as_str().to_string()),
    })
}

/// The newest gopls release, taken as the first gopls tag in the listing
/// (the API returns newest first).
///
/// Reads `tag_name`, which is always set, rather than the optional display
/// `name`. An unparsable newest tag yields `None` instead of falling back to
/// an older release.
pub fn latest_release(releases: &[Release]) -> Option<ReleaseVersion> {
    let tag = releases
        .iter()
        .find_map(|release| release.tag_name.strip_prefix(GOPLS_TAG_PREFIX))?;
    let parsed = parse_release_version(tag);
    if parsed.is_none() {
        log::warn!("Unrecognized gopls release tag: tag={GOPLS_TAG_PREFIX}{tag}");
    }
    parsed
}

fn numeric_parts(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

/// Component-wise comparison of dotted numeric versions. A version with
/// extra trailing components sorts after its prefix.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (numeric_parts(a), numeric_parts(b));
    for (x, y) in a.iter().zip(&b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Whether `latest` is a stable release newer than `local`.
pub fn is_newer(local: &str, latest: &ReleaseVersion) -> bool {
    if latest.is_prerelease() {
        return false;
    }
    compare_versions(local, &latest.version) == Ordering::Less
}
