//! Configuration and runtime context.

mod global;
mod runtime;

pub use global::{ConfigKey, Locale, NlmConfig};
pub use runtime::{Runtime, RuntimeOptions};
