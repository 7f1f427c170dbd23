//! ResultBlocker Page Engine
//!
//! DOM-side half of ResultBlocker. Given a document tree and the active
//! rule set, this crate resolves the result container around each candidate
//! anchor, batches anchor evaluation, and applies the blocked-state marking
//! contract to the tree.
//!
//! The decision logic is host-independent: tests and the CLI drive it over
//! a parsed `scraper` document through [`Page`], while a live browser
//! adapter feeds mutation events into the same [`PageObserver`].
//!
//! # Modules
//!
//! - `container`: anchor-to-result-container resolution
//! - `collect`: candidate anchor collection
//! - `mark`: blocked/revealed attribute contract and reveal controls
//! - `style`: display-policy stylesheet generation
//! - `observer`: batched evaluation and external-change handling
//! - `storage`: persisted settings/rules contract
//! - `page`: static-document driver

pub mod collect;
pub mod container;
pub mod mark;
pub mod observer;
pub mod page;
pub mod storage;
pub mod style;

// Re-export commonly used items
pub use container::find_result_container;
pub use observer::{PageObserver, Request, Response};
pub use page::{BlockedResult, Page};
pub use storage::{KeyValueStore, MemoryStore, StoreChange};
