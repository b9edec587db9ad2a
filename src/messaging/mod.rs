//! Message relay between the popup, the coordinator and page agents
//!
//! Requests are JSON objects tagged by `type`; every handler answers with a
//! [`Response`] carrying `ok`, `duplicate` or `error`.

mod coordinator;

pub use coordinator::Coordinator;

use crate::locator::LocatorPair;
use crate::utils::{ProtocolError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser tab identifier
pub type TabId = u32;

/// Message types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Popup asks for selection mode on the active tab
    StartSelection,
    /// Popup asks for `text` to be inserted on the active tab
    InsertText { text: String },
    /// Page reports the locators of a clicked element
    ElementSelected { selector: LocatorPair },
    /// Coordinator turns selection mode on in a page
    ActivateSelectionMode,
    /// Coordinator asks a page to insert `text`
    ExecuteInsertion { text: String },
}

impl Request {
    const KNOWN_TYPES: [&'static str; 5] = [
        "START_SELECTION",
        "INSERT_TEXT",
        "ELEMENT_SELECTED",
        "ACTIVATE_SELECTION_MODE",
        "EXECUTE_INSERTION",
    ];

    /// Decode a raw message, separating unknown types from bad payloads
    pub fn from_value(value: Value) -> Result<Self> {
        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
            None => "undefined".to_string(),
        };
        if !Self::KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownType(kind).into());
        }
        serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()).into())
    }

    /// Wire name of this request
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::StartSelection => "START_SELECTION",
            Self::InsertText { .. } => "INSERT_TEXT",
            Self::ElementSelected { .. } => "ELEMENT_SELECTED",
            Self::ActivateSelectionMode => "ACTIVATE_SELECTION_MODE",
            Self::ExecuteInsertion { .. } => "EXECUTE_INSERTION",
        }
    }
}

/// Response status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Duplicate,
    Error,
}

/// Answer to a [`Request`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            status: Status::Duplicate,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

/// What the coordinator knows about a tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub url: Option<String>,
}

impl TabInfo {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: Some(url.into()),
        }
    }
}

/// Coordinator to page delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// Make sure the page agent is running in `tab`; repeated calls are no-ops
    async fn ensure_injected(&self, tab: TabId) -> Result<()>;

    /// Deliver a request to the page agent in `tab`
    async fn send(&self, tab: TabId, request: Request) -> Result<Response>;
}

/// Page or popup to coordinator delivery
#[async_trait]
pub trait RuntimeChannel: Send + Sync {
    /// Deliver a request; `sender` is the tab it came from, if any
    async fn send(&self, request: Request, sender: Option<TabInfo>) -> Result<Response>;
}

/// Active tab lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabQuery: Send + Sync {
    async fn active_tab(&self) -> Result<Option<TabInfo>>;
}
