//! Package specifiers as typed on the command line: `name`, `name@1.2.3`,
//! `@scope/name@^1.0.0`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::core::NlmError;

static SPEC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(@[^/@\s]+/)?([^@\s]+)(?:@(.*))?$").expect("package spec regex is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    /// Requested version or range; `None` when the name stood alone.
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn parse(input: &str) -> Result<Self, NlmError> {
        let trimmed = input.trim();
        let invalid = || NlmError::InvalidPackageName {
            name: input.to_string(),
        };

        let caps = SPEC_PATTERN.captures(trimmed).ok_or_else(invalid)?;
        let scope = caps.get(1).map_or("", |m| m.as_str());
        let bare = &caps[2];

        if bare.starts_with('.')
            || bare.contains('/')
            || bare.contains('\\')
            || scope.starts_with("@.")
            || scope.contains('\\')
        {
            return Err(invalid());
        }

        let version = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            name: format!("{scope}{bare}"),
            version,
        })
    }
}

/// Whether `name` is usable as a package name on its own, with no version
/// part and nothing that would escape its store directory.
#[must_use]
pub fn is_valid_package_name(name: &str) -> bool {
    PackageSpec::parse(name).is_ok_and(|spec| spec.version.is_none() && spec.name == name)
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
