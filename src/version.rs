//! Archive format versioning.
//!
//! Archives carry a `major.minor.patch` format version. Readers accept
//! anything at or above [`MIN_SUPPORTED_VERSION`]; archives newer than
//! [`CURRENT_FORMAT_VERSION`] are accepted with a warning since unknown
//! fields are carried through untouched.

use std::cmp::Ordering;

/// Format version written by this build.
pub const CURRENT_FORMAT_VERSION: &str = "1.1.0";

/// Oldest format version this build can read.
pub const MIN_SUPPORTED_VERSION: &str = "1.0.0";

/// Outcome of a successful compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    /// Between the minimum and the current format version.
    Supported,
    /// Newer than this build writes. Readable, but fields may be ignored.
    Newer { version: String },
}

impl Compatibility {
    /// Advisory message for newer archives.
    #[must_use]
    pub fn warning(&self) -> Option<String> {
        match self {
            Self::Supported => None,
            Self::Newer { version } => Some(format!(
                "Archive version {version} is newer than the supported version \
                 {CURRENT_FORMAT_VERSION}; some data may not be imported"
            )),
        }
    }
}

/// Blocking version problems.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: {0:?} (expected major.minor.patch)")]
    Malformed(String),

    #[error("Archive version {version} is older than the minimum supported version {minimum}")]
    TooOld { version: String, minimum: String },
}

/// Compare two versions component by component.
///
/// Missing or non-numeric components count as zero, so `"1.2"` equals `"1.2.0"`.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    parse_components(a).cmp(&parse_components(b))
}

fn parse_components(version: &str) -> [u64; 3] {
    let mut parts = [0u64; 3];
    for (slot, piece) in parts.iter_mut().zip(version.split('.')) {
        *slot = piece.trim().parse().unwrap_or(0);
    }
    parts
}

/// True iff `version` is exactly three dot-separated non-negative integers.
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    let pieces: Vec<&str> = version.split('.').collect();
    pieces.len() == 3
        && pieces
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// Decide whether an archive of `version` can be read.
///
/// # Errors
///
/// Returns [`VersionError::Malformed`] for anything that is not `x.y.z` and
/// [`VersionError::TooOld`] below [`MIN_SUPPORTED_VERSION`]. Newer versions
/// never fail.
pub fn check_compatibility(version: &str) -> Result<Compatibility, VersionError> {
    if !is_valid_version(version) {
        return Err(VersionError::Malformed(version.to_string()));
    }

    if compare_versions(version, MIN_SUPPORTED_VERSION) == Ordering::Less {
        return Err(VersionError::TooOld {
            version: version.to_string(),
            minimum: MIN_SUPPORTED_VERSION.to_string(),
        });
    }

    if compare_versions(version, CURRENT_FORMAT_VERSION) == Ordering::Greater {
        tracing::warn!(version, current = CURRENT_FORMAT_VERSION, "Archive is newer than this build");
        return Ok(Compatibility::Newer {
            version: version.to_string(),
        });
    }

    Ok(Compatibility::Supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
        assert_eq!(compare_versions("1.3.0", "1.2.9"), Ordering::Greater);
        assert_eq!(compare_versions("0.9.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
    }

    #[test]
    fn test_compare_missing_components_are_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("2", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_is_antisymmetric() {
        let versions = ["0.0.1", "0.1.0", "1.0.0", "1.0.1", "1.1.0", "2.0.0"];
        for a in versions {
            for b in versions {
                assert_eq!(compare_versions(a, b), compare_versions(b, a).reverse());
            }
        }
    }

    #[test]
    fn test_is_valid_version() {
        assert!(is_valid_version("1.0.0"));
        assert!(is_valid_version("10.20.30"));
        assert!(!is_valid_version("1.0"));
        assert!(!is_valid_version("1.0.0.0"));
        assert!(!is_valid_version("1.0.x"));
        assert!(!is_valid_version("-1.0.0"));
        assert!(!is_valid_version("1..0"));
        assert!(!is_valid_version(""));
    }

    #[test]
    fn test_check_compatibility_current() {
        assert_eq!(
            check_compatibility(CURRENT_FORMAT_VERSION),
            Ok(Compatibility::Supported)
        );
        assert_eq!(
            check_compatibility(MIN_SUPPORTED_VERSION),
            Ok(Compatibility::Supported)
        );
    }

    #[test]
    fn test_check_compatibility_too_old() {
        let err = check_compatibility("0.1.0").unwrap_err();
        assert!(matches!(err, VersionError::TooOld { .. }));
        assert!(err.to_string().contains("older than"));
    }

    #[test]
    fn test_check_compatibility_newer_only_warns() {
        let result = check_compatibility("99.0.0").unwrap();
        assert!(result.warning().unwrap().contains("99.0.0"));
    }

    #[test]
    fn test_check_compatibility_malformed() {
        assert!(matches!(
            check_compatibility("v1"),
            Err(VersionError::Malformed(_))
        ));
    }
}
