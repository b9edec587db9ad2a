//! Error types for the text inserter

use thiserror::Error;

/// Main error type for text inserter operations
#[derive(Debug, Error)]
pub enum InserterError {
    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Locator evaluation errors
    #[error("Locator error: {0}")]
    Locator(#[from] LocatorError),
    /// Message relay errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Persistence-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be read or written
    #[error("backend failure: {0}")]
    Backend(String),
    /// A stored value does not have the expected shape
    #[error("corrupt value under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
    /// A locator candidate carries neither an XPath nor a CSS selector
    #[error("locator candidate has neither xpath nor css")]
    EmptyLocator,
    /// A text snippet has no content
    #[error("text snippet content is empty")]
    EmptyText,
}

/// Locator-specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// XPath expression could not be parsed
    #[error("invalid xpath '{expression}': {reason}")]
    InvalidXPath { expression: String, reason: String },
    /// CSS selector could not be parsed
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    /// Operation requires an element node
    #[error("node is not an element")]
    NotAnElement,
}

/// Message relay errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Request carried a `type` nobody handles
    #[error("Unknown type: {0}")]
    UnknownType(String),
    /// Request payload did not match its type
    #[error("malformed request: {0}")]
    Malformed(String),
    /// No active tab to route the request to
    #[error("No active tab found")]
    NoActiveTab,
    /// Sender tab carries no URL
    #[error("Sender tab URL is missing")]
    MissingSenderUrl,
    /// URL has no usable hostname
    #[error("invalid url '{0}'")]
    InvalidUrl(String),
    /// Tab is unknown or the page agent was never injected
    #[error("could not establish connection with tab {0}")]
    Unreachable(u32),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid YAML for the schema
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Convenience Result type for text inserter operations
pub type Result<T> = std::result::Result<T, InserterError>;
