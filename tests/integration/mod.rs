//! Integration test suite for nlm
//!
//! Drives the compiled `nlm` binary against temporary packages, projects and
//! stores. Every test gets its own store through `NLM_STORE_DIR`.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **common**: temporary workspace with a store, packages and projects
//! - **push_install**: publishing and linking
//! - **update_uninstall**: refreshing and removing links
//! - **inspect**: `list`, `search`, `status` and `config`
//! - **error_scenarios**: exit codes and messages of failures

mod common;

mod error_scenarios;
mod inspect;
mod push_install;
mod update_uninstall;
