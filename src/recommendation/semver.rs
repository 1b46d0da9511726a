use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// Shape of a version string accepted as an explicit override
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._+\-]*$").unwrap());

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Whether `version` is usable as an explicit override value
pub fn is_valid_version(version: &str) -> bool {
    VERSION_RE.is_match(version)
}

/// Replace any known qualifier suffix of `version` with `qualifier`
///
/// `1.0` -> `1.0-LOCAL`, `1.0-SNAPSHOT` -> `1.0-LOCAL`.
pub fn with_qualifier(version: &str, qualifier: &str, known: &[&str]) -> String {
    let base = known
        .iter()
        .filter(|q| !q.is_empty())
        .find_map(|q| version.strip_suffix(&format!("-{}", q)))
        .unwrap_or(version);

    format!("{}-{}", base, qualifier)
}

/// Newest candidate accepted by `filter` that is newer than `current_version`
///
/// Pre-releases are only considered when the current version is one.
/// Returns the candidate in its original spelling.
fn latest_matching(
    current_version: &str,
    available_versions: &[String],
    filter: impl Fn(&Version, &Version) -> bool,
) -> Option<String> {
    let current = parse_version(current_version)?;

    let (latest, parsed) = available_versions
        .iter()
        .filter_map(|v| parse_version(v).map(|parsed| (v, parsed)))
        .filter(|(_, v)| !current.pre.is_empty() || v.pre.is_empty())
        .filter(|(_, v)| filter(&current, v))
        .max_by(|(_, a), (_, b)| a.cmp(b))?;

    if parsed > current {
        Some(latest.clone())
    } else {
        None
    }
}

/// Calculate the latest patch version within the same major.minor
///
/// Returns the latest patch version if a newer patch exists,
/// or None if the current version is already the latest patch.
pub fn calculate_latest_patch(
    current_version: &str,
    available_versions: &[String],
) -> Option<String> {
    latest_matching(current_version, available_versions, |current, v| {
        v.major == current.major && v.minor == current.minor
    })
}

/// Calculate the latest minor version within the same major
///
/// Returns the latest minor.patch version if a newer minor exists,
/// or None if the current version is already the latest minor.
pub fn calculate_latest_minor(
    current_version: &str,
    available_versions: &[String],
) -> Option<String> {
    latest_matching(current_version, available_versions, |current, v| {
        v.major == current.major
    })
}

/// Calculate the latest major version
///
/// Returns the latest version if a newer major version exists,
/// or None if the current version is already the latest.
pub fn calculate_latest_major(
    current_version: &str,
    available_versions: &[String],
) -> Option<String> {
    latest_matching(current_version, available_versions, |_, _| true)
}
