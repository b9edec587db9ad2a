//! # Text Inserter
//!
//! Save the location of an input field on a website once, then insert saved
//! text snippets into it with one action.
//!
//! ## Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **dom**: In-memory page document with selector, XPath and event support
//! - **locator**: XPath/CSS locator generation and interactive-element resolution
//! - **insertion**: Priority-ordered insertion engine and element write policy
//! - **storage**: Key-value persistence of texts and per-host locator buckets
//! - **messaging**: Request/response protocol and the background coordinator
//! - **page**: Page agent with selection mode and notifications
//! - **tabs**: Tab registry hosting page agents
//! - **popup**: Popup controller for texts and saved elements
//! - **config**: YAML configuration
//! - **utils**: Shared utilities and error types

pub mod config;
pub mod dom;
pub mod insertion;
pub mod locator;
pub mod messaging;
pub mod page;
pub mod popup;
pub mod storage;
pub mod tabs;
pub mod utils;

// Re-export main types for convenience
pub use config::{ConfigLoader, InserterConfig};
pub use dom::{Document, NodeId};
pub use insertion::{InsertionEngine, InsertionOutcome};
pub use locator::{ElementLocatorEngine, LocatorPair};
pub use messaging::{Coordinator, Request, Response};
pub use storage::{KeyValueStore, StorageService};
pub use utils::error::{InserterError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Text Inserter";
