//! Popup controller
//!
//! State and actions behind the toolbar popup: the status line, text snippet
//! management, and the list of elements saved for the current site.

use crate::config::InserterConfig;
use crate::messaging::{Request, Response, RuntimeChannel, TabQuery};
use crate::storage::{StorageService, TextSnippet};
use crate::utils::Result;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const SELECTION_HINT_MS: u64 = 1500;

/// Styling of the status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Neutral,
    Info,
    Success,
    Error,
}

/// Text shown in the popup's status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
    /// When set, the default line comes back after this long
    pub reset_after: Option<Duration>,
}

/// One saved element as listed in the popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEntry {
    pub id: String,
    pub label: String,
    /// XPath, or the CSS selector when there is no XPath
    pub title: String,
}

/// Hostname the popup works with, if the page allows it
pub fn popup_hostname(page_url: &str, config: &InserterConfig) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    if config.is_blocked_scheme(url.scheme()) {
        return None;
    }
    url.host_str().filter(|h| !h.is_empty()).map(str::to_string)
}

pub struct PopupController {
    storage: StorageService,
    runtime: Arc<dyn RuntimeChannel>,
    config: InserterConfig,
    hostname: Option<String>,
    status: StatusLine,
    pending_delete: Option<String>,
}

impl PopupController {
    /// Open the popup for whatever tab is active
    pub async fn open(
        storage: StorageService,
        runtime: Arc<dyn RuntimeChannel>,
        tabs: &dyn TabQuery,
        config: InserterConfig,
    ) -> Result<Self> {
        let hostname = match tabs.active_tab().await {
            Ok(tab) => tab
                .and_then(|t| t.url)
                .and_then(|url| popup_hostname(&url, &config)),
            Err(e) => {
                log::error!("error getting current tab: {e}");
                None
            }
        };

        let mut popup = Self {
            storage,
            runtime,
            config,
            hostname,
            status: StatusLine {
                text: String::new(),
                kind: StatusKind::Neutral,
                reset_after: None,
            },
            pending_delete: None,
        };
        popup.refresh_status().await?;
        Ok(popup)
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Selecting and managing elements needs a usable hostname
    pub fn can_select(&self) -> bool {
        self.hostname.is_some()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Restore the default status line
    pub async fn refresh_status(&mut self) -> Result<()> {
        let text = match &self.hostname {
            None => "The extension does not work on this page".to_string(),
            Some(host) => match self.storage.selectors_for_host(host).await?.len() {
                0 => "No elements selected for this site".to_string(),
                n => format!("{n} elements selected for this site"),
            },
        };
        self.status = StatusLine {
            text,
            kind: StatusKind::Neutral,
            reset_after: None,
        };
        Ok(())
    }

    /// Replace the status line until `duration` elapses
    pub fn show_temporary_status(&mut self, text: impl Into<String>, kind: StatusKind, duration: Duration) {
        self.status = StatusLine {
            text: text.into(),
            kind,
            reset_after: Some(duration),
        };
    }

    /// Ask the coordinator to start selection mode on the active tab
    pub async fn start_selection(&mut self) -> Result<Option<Response>> {
        if !self.can_select() {
            return Ok(None);
        }
        let response = self.runtime.send(Request::StartSelection, None).await?;
        self.show_temporary_status(
            "Select an element on the page...",
            StatusKind::Info,
            Duration::from_millis(SELECTION_HINT_MS),
        );
        Ok(Some(response))
    }

    // ---- texts ----

    pub async fn texts(&self) -> Result<Vec<TextSnippet>> {
        self.storage.get_texts().await
    }

    /// Save a new text or update an existing one
    ///
    /// Returns false, leaving storage untouched, when the trimmed content is
    /// empty.
    pub async fn save_text(&mut self, content: &str, id_to_update: Option<&str>) -> Result<bool> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }
        self.storage.save_text(content, id_to_update).await?;
        self.show_temporary_status("Text saved!", StatusKind::Success, self.config.status_reset_duration());
        Ok(true)
    }

    /// First call arms the confirmation, a second call for the same id deletes
    pub async fn request_delete_text(&mut self, id: &str) -> Result<bool> {
        if self.pending_delete.as_deref() != Some(id) {
            self.pending_delete = Some(id.to_string());
            return Ok(false);
        }
        self.pending_delete = None;
        self.storage.delete_text(id).await?;
        self.show_temporary_status("Text deleted", StatusKind::Success, self.config.status_reset_duration());
        Ok(true)
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn reset_delete_confirmation(&mut self) {
        self.pending_delete = None;
    }

    /// Send a snippet to the active tab
    ///
    /// Refused with an error status when nothing is selected for the site.
    pub async fn insert_text(&mut self, snippet: &TextSnippet) -> Result<Option<Response>> {
        let Some(host) = self.hostname.clone() else {
            return Ok(None);
        };
        if self.storage.selectors_for_host(&host).await?.is_empty() {
            self.show_temporary_status(
                "Select an element first",
                StatusKind::Error,
                self.config.notification_duration(),
            );
            return Ok(None);
        }
        let request = Request::InsertText {
            text: snippet.content.clone(),
        };
        Ok(Some(self.runtime.send(request, None).await?))
    }

    // ---- selectors ----

    /// Elements saved for the current site, highest priority first
    pub async fn selector_entries(&self) -> Result<Vec<SelectorEntry>> {
        let Some(host) = &self.hostname else {
            return Ok(Vec::new());
        };
        let bucket = self.storage.selectors_for_host(host).await?;
        Ok(bucket
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| SelectorEntry {
                id: record.id.clone(),
                label: format!(
                    "Element {} (priority: {})",
                    index + 1,
                    if index == 0 { "highest" } else { "lower" }
                ),
                title: record.xpath.clone().or_else(|| record.css.clone()).unwrap_or_default(),
            })
            .collect())
    }

    pub async fn delete_selector(&mut self, id: &str) -> Result<Vec<SelectorEntry>> {
        if let Some(host) = &self.hostname {
            self.storage.delete_selector(host, id).await?;
        }
        self.selector_entries().await
    }

    /// Remove every element saved for the site; false if there was nothing
    pub async fn clear_all_selectors(&mut self) -> Result<bool> {
        let Some(host) = self.hostname.clone() else {
            return Ok(false);
        };
        if self.storage.selectors_for_host(&host).await?.is_empty() {
            return Ok(false);
        }
        self.storage.clear_all_selectors(&host).await?;
        self.show_temporary_status(
            "All elements for this site removed",
            StatusKind::Success,
            self.config.status_reset_duration(),
        );
        Ok(true)
    }
}
