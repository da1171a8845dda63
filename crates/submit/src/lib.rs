//! Submission intake for listing categories.
//!
//! The path a visitor-submitted record takes before it exists: field
//! validation (with per-field messages the form can show back), a per-client
//! throttle so one address can't flood a category, contact obfuscation, and
//! finally insert-plus-regenerate against the page cache.

pub mod error;
mod intake;
mod throttle;
mod validate;

pub use crate::intake::{Intake, Outcome, Submission};
pub use crate::throttle::Throttle;
pub use crate::validate::{FieldError, obfuscate_email, validate};
