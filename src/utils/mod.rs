//! Cross-platform helpers used throughout nlm.
//!
//! - [`fs`] - atomic writes, directory helpers, path removal
//! - [`platform`] - store location and symlink creation per platform
//! - [`progress`] - spinners that respect `--no-progress`

pub mod fs;
pub mod platform;
pub mod progress;

pub use fs::{atomic_write, ensure_dir, ensure_parent_dir, normalize_path_for_storage, remove_path};
pub use platform::{default_store_dir, get_home_dir, is_windows};
pub use progress::ProgressBar;
