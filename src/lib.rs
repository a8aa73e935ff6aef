//! nlm - link locally developed npm packages into projects
//!
//! A library under development is *pushed* into a machine-wide store and then
//! *installed* into any number of consumer projects without going through a
//! registry. Each project receives a private copy of the package under
//! `.nlm/<name>` and a symlink at `node_modules/<name>`; nested duplicates of
//! the package deeper in the dependency tree are replaced with links to that
//! private copy so the whole project resolves a single instance.
//!
//! # Architecture
//!
//! - [`signature`] - content hash of a package's file set
//! - [`version`] - version selection and npm range handling
//! - [`store`] - on-disk store and its usage index
//! - [`lockfile`] - per-project record of installed packages
//! - [`installer`] - materializes store packages into projects
//! - [`deps`] - dependency conflict detection and resolution
//! - [`nested`] - nested duplicate replacement
//! - [`sync`] - install/update/uninstall/push orchestration
//! - [`manifest`] and [`pack`] - package descriptors and publishable files
//! - [`config`] - runtime context and configuration files
//! - [`cli`] - command-line interface

// Core functionality modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// Storage and bookkeeping
pub mod lockfile;
pub mod signature;
pub mod store;

// Package handling
pub mod manifest;
pub mod pack;
pub mod version;

// Linking
pub mod deps;
pub mod installer;
pub mod nested;
pub mod sync;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
