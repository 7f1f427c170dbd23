//! ResultBlocker Core Library
//!
//! This crate provides the rule engine for the ResultBlocker content filter.
//! It has no DOM dependency: everything here maps raw URLs and user-authored
//! rule text to match decisions, so it can back any host surface (page
//! engine, CLI, wasm bindings).
//!
//! # Modules
//!
//! - `url`: redirect unwrapping and URL normalization
//! - `validate`: regex-pattern safety validation
//! - `rules`: rule parsing and first-match-wins evaluation
//! - `settings`: shared runtime settings

pub mod rules;
pub mod settings;
pub mod url;
pub mod validate;

// Re-export commonly used items
pub use crate::rules::{parse_rules_from_text, should_block, CONTAINS_PREFIX, REGEX_PREFIX};
pub use crate::settings::{DisplayMode, Settings};
pub use crate::url::{decode_google_url, domain_of, normalize_for_match, normalize_host};
pub use crate::validate::{validate_regex_pattern, PatternIssue};
