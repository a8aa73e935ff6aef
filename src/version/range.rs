//! npm-style version ranges on top of the `semver` crate.
//!
//! npm range syntax is a superset of what [`semver::VersionReq`] accepts:
//! `||` alternatives, whitespace-separated comparators, hyphen ranges,
//! bare versions meaning "exactly this version" and x-ranges. [`NpmRange`]
//! rewrites each alternative into `VersionReq` syntax and keeps one
//! `VersionReq` per alternative, so matching stays delegated to `semver`.
//!
//! Range intersection is not offered by `semver`; it is computed here by
//! turning every comparator set into a version interval.

use anyhow::{Result, bail};
use regex::Regex;
use semver::{BuildMetadata, Comparator, Op, Version, VersionReq};
use std::cmp::Ordering;
use std::sync::LazyLock;

static HYPHEN_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\S+)\s+-\s+(\S+)\s*$").expect("hyphen range regex is valid")
});

static VERSION_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(\.\d+(\.\d+(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?)?)?$")
        .expect("version body regex is valid")
});

const OPERATORS: &[&str] = &[">=", "<=", "~>", ">", "<", "=", "^", "~"];

/// A parsed npm range: one [`VersionReq`] per `||` alternative.
#[derive(Debug, Clone)]
pub struct NpmRange {
    source: String,
    alternatives: Vec<VersionReq>,
}

impl NpmRange {
    pub fn parse(input: &str) -> Result<Self> {
        let mut alternatives = Vec::new();
        for alternative in input.split("||") {
            let translated = translate_alternative(alternative)?;
            let req = VersionReq::parse(&translated).map_err(|e| {
                anyhow::anyhow!("Invalid version range '{input}' ({translated}): {e}")
            })?;
            alternatives.push(req);
        }

        Ok(Self {
            source: input.to_string(),
            alternatives,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    /// Whether some version could satisfy both ranges.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.alternatives.iter().any(|a| {
            let a = Interval::of_req(a);
            other.alternatives.iter().any(|b| !a.intersect(&Interval::of_req(b)).is_empty())
        })
    }
}

/// Rewrite one `||` alternative into `VersionReq` syntax.
fn translate_alternative(alternative: &str) -> Result<String> {
    let alternative = alternative.trim();

    if let Some(caps) = HYPHEN_RANGE.captures(alternative) {
        let lower = strip_wildcards(strip_v(&caps[1]));
        let upper = strip_wildcards(strip_v(&caps[2]));
        let mut parts = Vec::new();
        if !lower.is_empty() {
            check_body(lower, alternative)?;
            parts.push(format!(">={lower}"));
        }
        if !upper.is_empty() {
            check_body(upper, alternative)?;
            parts.push(format!("<={upper}"));
        }
        return Ok(if parts.is_empty() {
            "*".to_string()
        } else {
            parts.join(", ")
        });
    }

    // Join operators written apart from their version (">= 1.0.0")
    let mut tokens: Vec<String> = Vec::new();
    let mut pending_op: Option<String> = None;
    for token in alternative.split_whitespace() {
        if OPERATORS.contains(&token) {
            pending_op = Some(token.to_string());
            continue;
        }
        match pending_op.take() {
            Some(op) => tokens.push(format!("{op}{token}")),
            None => tokens.push(token.to_string()),
        }
    }
    if let Some(op) = pending_op {
        bail!("Dangling operator '{op}' in version range '{alternative}'");
    }

    let mut comparators = Vec::new();
    for token in &tokens {
        let op = OPERATORS.iter().find(|op| token.starts_with(**op)).copied().unwrap_or("");
        let body = strip_wildcards(strip_v(&token[op.len()..]));
        let op = if op == "~>" {
            "~"
        } else {
            op
        };

        if body.is_empty() {
            // "*", "x", ">=*": no constraint; "<*" can never match
            if op == "<" || op == ">" {
                bail!("Unsatisfiable comparator '{token}' in version range '{alternative}'");
            }
            continue;
        }
        check_body(body, alternative)?;

        let op = if op.is_empty() {
            "="
        } else {
            op
        };
        comparators.push(format!("{op}{body}"));
    }

    Ok(if comparators.is_empty() {
        "*".to_string()
    } else {
        comparators.join(", ")
    })
}

fn strip_v(body: &str) -> &str {
    body.strip_prefix(['v', 'V']).unwrap_or(body)
}

/// `1.x` -> `1`, `1.2.*` -> `1.2`, `x` -> ``.
fn strip_wildcards(body: &str) -> &str {
    let mut end = 0;
    for (index, segment) in body.split('.').enumerate() {
        if matches!(segment, "x" | "X" | "*") {
            break;
        }
        end = if index == 0 {
            segment.len()
        } else {
            end + 1 + segment.len()
        };
    }
    &body[..end]
}

fn check_body(body: &str, alternative: &str) -> Result<()> {
    if VERSION_BODY.is_match(body) {
        Ok(())
    } else {
        bail!("Invalid version '{body}' in range '{alternative}'")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: Version,
    inclusive: bool,
}

/// A contiguous set of versions; `None` bounds are unbounded.
#[derive(Debug, Clone, Default)]
struct Interval {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl Interval {
    fn of_req(req: &VersionReq) -> Self {
        req.comparators
            .iter()
            .fold(Self::default(), |acc, comparator| acc.intersect(&Self::of_comparator(comparator)))
    }

    fn of_comparator(c: &Comparator) -> Self {
        let full = c.minor.is_some() && c.patch.is_some();
        let minor = c.minor.unwrap_or(0);
        let patch = c.patch.unwrap_or(0);
        let base = Version {
            major: c.major,
            minor,
            patch,
            pre: c.pre.clone(),
            build: BuildMetadata::EMPTY,
        };
        // First version past a partial version ("1" -> 2.0.0, "1.2" -> 1.3.0)
        let past_partial = match c.minor {
            None => Version::new(c.major.saturating_add(1), 0, 0),
            Some(m) => Version::new(c.major, m.saturating_add(1), 0),
        };

        let at_least = |version: Version| Some(Bound {
            version,
            inclusive: true,
        });
        let below = |version: Version| Some(Bound {
            version,
            inclusive: false,
        });

        match c.op {
            Op::Exact | Op::Wildcard if full => Self {
                lower: at_least(base.clone()),
                upper: at_least(base),
            },
            Op::Exact | Op::Wildcard => Self {
                lower: at_least(base),
                upper: below(past_partial),
            },
            Op::Greater if full => Self {
                lower: below(base),
                upper: None,
            },
            Op::Greater => Self {
                lower: at_least(past_partial),
                upper: None,
            },
            Op::GreaterEq => Self {
                lower: at_least(base),
                upper: None,
            },
            Op::Less => Self {
                lower: None,
                upper: below(base),
            },
            Op::LessEq if full => Self {
                lower: None,
                upper: at_least(base),
            },
            Op::LessEq => Self {
                lower: None,
                upper: below(past_partial),
            },
            Op::Tilde => {
                let upper = match c.minor {
                    None => Version::new(c.major.saturating_add(1), 0, 0),
                    Some(m) => Version::new(c.major, m.saturating_add(1), 0),
                };
                Self {
                    lower: at_least(base),
                    upper: below(upper),
                }
            }
            Op::Caret => {
                let upper = if c.major > 0 || c.minor.is_none() {
                    Version::new(c.major.saturating_add(1), 0, 0)
                } else if minor > 0 || c.patch.is_none() {
                    Version::new(0, minor.saturating_add(1), 0)
                } else {
                    Version::new(0, 0, patch.saturating_add(1))
                };
                Self {
                    lower: at_least(base),
                    upper: below(upper),
                }
            }
            _ => Self::default(),
        }
    }

    fn intersect(&self, other: &Self) -> Self {
        let lower = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
                Ordering::Greater => a.clone(),
                Ordering::Less => b.clone(),
                Ordering::Equal => Bound {
                    version: a.version.clone(),
                    inclusive: a.inclusive && b.inclusive,
                },
            }),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => Some(match a.version.cmp(&b.version) {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal => Bound {
                    version: a.version.clone(),
                    inclusive: a.inclusive && b.inclusive,
                },
            }),
            (Some(a), None) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        Self {
            lower,
            upper,
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => match lower.version.cmp(&upper.version) {
                Ordering::Less => false,
                Ordering::Equal => !(lower.inclusive && upper.inclusive),
                Ordering::Greater => true,
            },
            _ => false,
        }
    }
}

/// Whether `specifier` is a semver version or an npm range.
#[must_use]
pub fn is_semver_version_or_range(specifier: &str) -> bool {
    super::parse_version(specifier).is_some() || NpmRange::parse(specifier).is_ok()
}

/// Whether `version` satisfies the npm range `range`.
pub fn satisfies(version: &str, range: &str) -> Result<bool> {
    let Some(version) = super::parse_version(version) else {
        bail!("Invalid version '{version}'");
    };
    Ok(NpmRange::parse(range)?.matches(&version))
}

/// Whether two npm ranges share at least one version.
pub fn ranges_intersect(a: &str, b: &str) -> Result<bool> {
    Ok(NpmRange::parse(a)?.intersects(&NpmRange::parse(b)?))
}

/// Two specifiers are compatible unless both are semver and provably disjoint.
#[must_use]
pub fn are_ranges_compatible(a: &str, b: &str) -> bool {
    if a.trim() == b.trim() {
        return true;
    }
    match ranges_intersect(a, b) {
        Ok(intersects) => intersects,
        Err(e) => {
            tracing::debug!("Cannot compare '{a}' with '{b}': {e}");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(range: &str, version: &str) -> bool {
        NpmRange::parse(range).unwrap().matches(&Version::parse(version).unwrap())
    }

    #[test]
    fn test_translation() {
        assert_eq!(translate_alternative("1.2.3").unwrap(), "=1.2.3");
        assert_eq!(translate_alternative(">= 1.0.0 < 2").unwrap(), ">=1.0.0, <2");
        assert_eq!(translate_alternative("1.2.3 - 2.3").unwrap(), ">=1.2.3, <=2.3");
        assert_eq!(translate_alternative("1.x").unwrap(), "=1");
        assert_eq!(translate_alternative("*").unwrap(), "*");
        assert_eq!(translate_alternative("").unwrap(), "*");
        assert_eq!(translate_alternative("^v1.2.0").unwrap(), "^1.2.0");
        assert_eq!(translate_alternative("~>1.2").unwrap(), "~1.2");
    }

    #[test]
    fn test_npm_range_matching() {
        assert!(matches("^1.2.0", "1.9.9"));
        assert!(!matches("^1.2.0", "2.0.0"));
        assert!(matches("~1.2.0", "1.2.7"));
        assert!(!matches("~1.2.0", "1.3.0"));
        assert!(matches("1.2.3", "1.2.3"));
        assert!(!matches("1.2.3", "1.2.4"));
        assert!(matches("1.x", "1.7.0"));
        assert!(matches(">=1.0.0 <2.0.0", "1.5.0"));
        assert!(!matches(">=1.0.0 <2.0.0", "2.0.0"));
        assert!(matches("^1.0.0 || ^3.0.0", "3.1.0"));
        assert!(!matches("^1.0.0 || ^3.0.0", "2.1.0"));
        assert!(matches("1.0.0 - 2.0.0", "2.0.0"));
        assert!(matches("*", "0.0.1"));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(NpmRange::parse("latest").is_err());
        assert!(NpmRange::parse("github:user/repo").is_err());
        assert!(NpmRange::parse("file:../lib").is_err());
        assert!(NpmRange::parse(">=").is_err());
        assert!(!is_semver_version_or_range("workspace:*"));
        assert!(is_semver_version_or_range("^17.0.0"));
        assert!(is_semver_version_or_range("1.2.3"));
    }

    #[test]
    fn test_intersection_of_carets() {
        assert!(!ranges_intersect("^16.0.0", "^17.0.0").unwrap());
        assert!(ranges_intersect("^17.0.0", "^17.0.2").unwrap());
        assert!(ranges_intersect("^0.2.3", "0.2.x").unwrap());
        assert!(!ranges_intersect("^0.2.3", "^0.3.0").unwrap());
        assert!(!ranges_intersect("^0.0.3", "0.0.4").unwrap());
    }

    #[test]
    fn test_intersection_edges() {
        assert!(ranges_intersect("<=2.0.0", ">=2.0.0").unwrap());
        assert!(!ranges_intersect("<2.0.0", ">=2.0.0").unwrap());
        assert!(!ranges_intersect(">1.2.3", "1.2.3").unwrap());
        assert!(ranges_intersect("^1.0.0 || ^3.0.0", "~3.2.0").unwrap());
        assert!(ranges_intersect("*", "^9.0.0").unwrap());
        assert!(!ranges_intersect("~1.2", "1.3.x").unwrap());
        assert!(ranges_intersect(">=1.0.0 <1.5.0", "1.4.x").unwrap());
    }

    #[test]
    fn test_compatibility_rules() {
        assert!(are_ranges_compatible("^17.0.0", "^17.0.2"));
        assert!(!are_ranges_compatible("^16.0.0", "^17.0.0"));
        assert!(are_ranges_compatible("latest", "^17.0.0"));
        assert!(are_ranges_compatible("github:user/repo", "github:user/repo"));
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies("17.0.2", "^17.0.0").unwrap());
        assert!(!satisfies("16.14.0", "^17.0.0").unwrap());
        assert!(satisfies("not-a-version", "^1.0.0").is_err());
        assert!(satisfies("1.0.0", "latest").is_err());
    }
}
