//! `nlm search`: find packages in the store by name.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use regex::{Captures, RegexBuilder};

use super::CliConfig;
use super::common::load_runtime;
use crate::store::{Store, StoreEntry};
use crate::version::sort_versions_desc;

#[derive(Args)]
pub struct SearchCommand {
    /// Case-insensitive part of the package name.
    keyword: String,
}

impl SearchCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, false).await?;
        let store = ctx.store();
        let index = store.load_index()?;
        if index.is_empty() {
            println!("The store is empty. Run 'nlm push' in a package first.");
            return Ok(());
        }

        let matches = matching_packages(&index.keys().cloned().collect::<Vec<_>>(), &self.keyword);
        if matches.is_empty() {
            println!("No packages matching '{}'.", self.keyword);
            return Ok(());
        }

        let highlight = RegexBuilder::new(&regex::escape(&self.keyword))
            .case_insensitive(true)
            .build()
            .context("Failed to build search pattern")?;

        for name in &matches {
            let styled =
                highlight.replace_all(name, |caps: &Captures| caps[0].yellow().bold().to_string());
            println!("{styled}");
            print_details(&store, name, index.get(name));
            println!();
        }
        println!("{} packages found", matches.len());
        Ok(())
    }
}

fn print_details(store: &Store, name: &str, entry: Option<&StoreEntry>) {
    let mut versions = store.list_versions(name);
    sort_versions_desc(&mut versions);
    println!("  {} {}", "versions:".dimmed(), versions.join(", ").green());

    let Some(entry) = entry else {
        return;
    };
    println!("  {} {}", "source:".dimmed(), entry.target);
    if entry.used_by.is_empty() {
        println!("  {} -", "used by:".dimmed());
    } else {
        println!("  {} {} projects", "used by:".dimmed(), entry.used_by.len());
        for project in &entry.used_by {
            println!("    {project}");
        }
    }
}

fn matching_packages(names: &[String], keyword: &str) -> Vec<String> {
    let keyword = keyword.to_lowercase();
    names.iter().filter(|name| name.to_lowercase().contains(&keyword)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let names = vec!["@acme/UI-kit".to_string(), "ui-utils".to_string(), "core".to_string()];
        assert_eq!(matching_packages(&names, "ui"), vec!["@acme/UI-kit", "ui-utils"]);
        assert!(matching_packages(&names, "zzz").is_empty());
    }
}
