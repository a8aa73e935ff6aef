//! `package.json` ingestion.
//!
//! Only the fields nlm acts on are modeled. Fields that npm allows in more
//! than one shape (`browser`, `bin`, `man`, `exports`) are deserialized into
//! tagged unions and flattened once by [`PackageManifest::entry_points`].

pub mod spec;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub use spec::{PackageSpec, is_valid_package_name};

use crate::constants::MANIFEST_FILE_NAME;
use crate::version::parse_version;

/// `browser`: a replacement entry file or a map of substitutions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BrowserField {
    Path(String),
    /// Values are paths or `false` (module ignored in the browser).
    Map(BTreeMap<String, serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Named(BTreeMap<String, String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ManField {
    Single(String),
    Many(Vec<String>),
}

/// Recursive `exports` tree: subpath and condition maps, fallback arrays,
/// target strings and `null` for blocked subpaths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExportsTree {
    Target(String),
    Fallbacks(Vec<ExportsTree>),
    Conditions(BTreeMap<String, ExportsTree>),
    Blocked,
}

impl ExportsTree {
    /// Every target string in the tree.
    fn collect_targets(&self, out: &mut Vec<String>) {
        match self {
            Self::Target(target) => out.push(target.clone()),
            Self::Fallbacks(items) => items.iter().for_each(|item| item.collect_targets(out)),
            Self::Conditions(map) => map.values().for_each(|item| item.collect_targets(out)),
            Self::Blocked => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    /// Publish allow-list; `!` entries exclude.
    #[serde(default)]
    pub files: Vec<String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    pub main: Option<String>,
    pub module: Option<String>,
    pub browser: Option<BrowserField>,
    pub types: Option<String>,
    pub typings: Option<String>,
    pub bin: Option<BinField>,
    pub man: Option<ManField>,
    pub exports: Option<ExportsTree>,
}

impl PackageManifest {
    /// Parse descriptor text. Name and version must be present and usable
    /// as store path components.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let manifest: Self = serde_json::from_str(content)?;
        if manifest.name.trim().is_empty() {
            anyhow::bail!("package.json has no name");
        }
        if !is_valid_package_name(&manifest.name) {
            anyhow::bail!("package.json has an invalid name '{}'", manifest.name);
        }
        if manifest.version.trim().is_empty() {
            anyhow::bail!("package.json has no version");
        }
        if parse_version(&manifest.version).is_none() {
            anyhow::bail!("package.json has an invalid version '{}'", manifest.version);
        }
        Ok(manifest)
    }

    /// Dependencies a linked package needs: `dependencies` merged with
    /// `peerDependencies`, peers winning on duplicate names.
    #[must_use]
    pub fn link_requirements(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        merged.extend(self.peer_dependencies.clone());
        merged
    }

    /// Dependencies a consuming project declares: `dependencies` merged with
    /// `devDependencies`.
    #[must_use]
    pub fn declared_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        merged.extend(self.dev_dependencies.clone());
        merged
    }

    /// Files referenced as package entry points, `./` stripped and deduplicated.
    #[must_use]
    pub fn entry_points(&self) -> Vec<String> {
        let mut raw = vec![self.main.clone().unwrap_or_else(|| "index.js".to_string())];
        raw.extend(self.module.clone());
        raw.extend(self.types.clone());
        raw.extend(self.typings.clone());

        match &self.browser {
            Some(BrowserField::Path(path)) => raw.push(path.clone()),
            Some(BrowserField::Map(map)) => {
                raw.extend(map.values().filter_map(|v| v.as_str().map(str::to_string)));
            }
            None => {}
        }
        match &self.bin {
            Some(BinField::Single(path)) => raw.push(path.clone()),
            Some(BinField::Named(map)) => raw.extend(map.values().cloned()),
            None => {}
        }
        match &self.man {
            Some(ManField::Single(path)) => raw.push(path.clone()),
            Some(ManField::Many(paths)) => raw.extend(paths.iter().cloned()),
            None => {}
        }
        if let Some(exports) = &self.exports {
            exports.collect_targets(&mut raw);
        }

        let mut seen = std::collections::BTreeSet::new();
        raw.into_iter()
            .map(|path| path.trim_start_matches("./").to_string())
            .filter(|path| !path.is_empty() && !path.contains('*'))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }
}

/// Read `<dir>/package.json`. Missing, malformed or nameless descriptors
/// yield `None`.
#[must_use]
pub fn read_manifest(dir: &Path) -> Option<PackageManifest> {
    let path = dir.join(MANIFEST_FILE_NAME);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("No package.json at {}: {}", path.display(), e);
            return None;
        }
    };

    match PackageManifest::parse(&content) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            tracing::debug!("Ignoring invalid package.json at {}: {}", path.display(), e);
            None
        }
    }
}

/// Version declared by the package installed at `dir`, if readable.
#[must_use]
pub fn installed_version(dir: &Path) -> Option<String> {
    read_manifest(dir).map(|manifest| manifest.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_requires_name_and_version() {
        assert!(PackageManifest::parse(r#"{"name": "a", "version": "1.0.0"}"#).is_ok());
        assert!(PackageManifest::parse(r#"{"version": "1.0.0"}"#).is_err());
        assert!(PackageManifest::parse(r#"{"name": "a"}"#).is_err());
        assert!(PackageManifest::parse("{oops").is_err());
    }

    #[test]
    fn test_parse_rejects_names_and_versions_that_escape_the_store() {
        for json in [
            r#"{"name": "x", "version": "../my-lib"}"#,
            r#"{"name": "x", "version": "1.0.0/../../y"}"#,
            r#"{"name": "x", "version": "latest"}"#,
            r#"{"name": "../my-lib", "version": "1.0.0"}"#,
            r#"{"name": "@scope/a/b", "version": "1.0.0"}"#,
            r#"{"name": "@../evil", "version": "1.0.0"}"#,
            r#"{"name": "a\b", "version": "1.0.0"}"#,
        ] {
            assert!(PackageManifest::parse(json).is_err(), "expected {json} to be rejected");
        }
        assert!(PackageManifest::parse(r#"{"name": "@scope/ui", "version": "2.0.0-beta.1"}"#).is_ok());
    }

    #[test]
    fn test_read_manifest_missing_or_malformed() {
        let temp = tempdir().unwrap();
        assert!(read_manifest(temp.path()).is_none());

        std::fs::write(temp.path().join("package.json"), "not json").unwrap();
        assert!(read_manifest(temp.path()).is_none());

        std::fs::write(temp.path().join("package.json"), r#"{"name":"x","version":"0.1.0"}"#)
            .unwrap();
        assert_eq!(installed_version(temp.path()).as_deref(), Some("0.1.0"));
    }

    #[test]
    fn test_peer_dependencies_override_dependencies() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "lib", "version": "1.0.0",
                "dependencies": {"react": "^16.0.0", "lodash": "^4.0.0"},
                "peerDependencies": {"react": "^17.0.0"},
                "devDependencies": {"jest": "^29.0.0"}
            }"#,
        )
        .unwrap();

        let required = manifest.link_requirements();
        assert_eq!(required["react"], "^17.0.0");
        assert_eq!(required["lodash"], "^4.0.0");
        assert!(!required.contains_key("jest"));

        let declared = manifest.declared_dependencies();
        assert!(declared.contains_key("jest"));
    }

    #[test]
    fn test_entry_points_flatten_every_shape() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "lib", "version": "1.0.0",
                "main": "./dist/index.js",
                "module": "dist/index.mjs",
                "types": "./dist/index.d.ts",
                "browser": {"./dist/node.js": "./dist/browser.js", "fs": false},
                "bin": {"lib": "./bin/cli.js"},
                "man": ["./man/lib.1"],
                "exports": {
                    ".": {"import": "./dist/index.mjs", "require": ["./dist/index.js"]},
                    "./internal": null,
                    "./utils/*": "./dist/utils/*.js"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            manifest.entry_points(),
            vec![
                "dist/index.js",
                "dist/index.mjs",
                "dist/index.d.ts",
                "dist/browser.js",
                "bin/cli.js",
                "man/lib.1",
            ]
        );
    }

    #[test]
    fn test_entry_points_default_main_and_string_shapes() {
        let manifest = PackageManifest::parse(
            r#"{"name": "lib", "version": "1.0.0", "bin": "cli.js", "browser": "web.js", "man": "doc.1", "exports": "./index.js"}"#,
        )
        .unwrap();

        assert_eq!(manifest.entry_points(), vec!["index.js", "web.js", "cli.js", "doc.1"]);
    }
}
