//! Release tag validation
//!
//! Tags may carry a leading `v`/`V`; the remainder must be SemVer.

use semver::Version;

use crate::core::error::PublishError;

/// Strip the conventional `v` prefix from a tag, if present.
pub fn normalize_tag(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// Parse a release tag into a version.
pub fn parse_release_tag(tag: &str) -> Result<Version, PublishError> {
    Version::parse(normalize_tag(tag)).map_err(|e| PublishError::InvalidTag {
        tag: tag.to_string(),
        message: e.to_string(),
    })
}

/// Whether a release tag denotes a prerelease version.
pub fn is_prerelease(tag: &str) -> bool {
    parse_release_tag(tag)
        .map(|version| !version.pre.is_empty())
        .unwrap_or(false)
}
