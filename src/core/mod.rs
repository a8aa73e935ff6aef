//! Core types shared by every nlm component.

pub mod error;

pub use error::{ErrorContext, NlmError, user_friendly_error};
