//! Version selection for install and update requests.
//!
//! The store keeps every pushed version side by side; [`resolve`] picks the
//! one a request refers to:
//!
//! | Request                     | Result                                   |
//! |-----------------------------|------------------------------------------|
//! | absent, empty or `latest`   | highest valid version                    |
//! | exact version (`1.2.3`)     | that version if literally present        |
//! | npm range (`^1.0.0`, `1.x`) | highest version satisfying the range     |
//!
//! Exact requests are never coerced to a nearby version.

pub mod range;

use semver::Version;
use std::cmp::Ordering;

pub use range::{NpmRange, are_ranges_compatible, is_semver_version_or_range, ranges_intersect, satisfies};

use crate::constants::LATEST;

/// How a request was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    Latest,
    Exact,
    Range,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The selected entry, exactly as it appears in the available list.
    pub version: String,
    pub kind: VersionKind,
}

/// Parse a version the way npm does, tolerating a leading `v` or `=`.
#[must_use]
pub fn parse_version(input: &str) -> Option<Version> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
    let trimmed = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);
    Version::parse(trimmed).ok()
}

/// Choose the version `requested` refers to among `available`.
#[must_use]
pub fn resolve(requested: Option<&str>, available: &[String]) -> Option<ResolvedVersion> {
    let requested = requested.map(str::trim).filter(|r| !r.is_empty() && *r != LATEST);

    let Some(requested) = requested else {
        return max_matching(available, |_| true).map(|version| ResolvedVersion {
            version,
            kind: VersionKind::Latest,
        });
    };

    if parse_version(requested).is_some() {
        return available.iter().find(|v| v.as_str() == requested).map(|v| ResolvedVersion {
            version: v.clone(),
            kind: VersionKind::Exact,
        });
    }

    let range = match NpmRange::parse(requested) {
        Ok(range) => range,
        Err(e) => {
            tracing::debug!("Cannot resolve '{requested}': {e}");
            return None;
        }
    };

    max_matching(available, |v| range.matches(v)).map(|version| ResolvedVersion {
        version,
        kind: VersionKind::Range,
    })
}

fn max_matching(available: &[String], accept: impl Fn(&Version) -> bool) -> Option<String> {
    available
        .iter()
        .filter_map(|raw| parse_version(raw).map(|parsed| (parsed, raw)))
        .filter(|(parsed, _)| accept(parsed))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw.clone())
}

/// Sort newest first; unparseable entries go last in lexical order.
pub fn sort_versions_desc(versions: &mut [String]) {
    versions.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => vb.cmp(&va),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}
