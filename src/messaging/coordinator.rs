//! Background coordinator
//!
//! Routes popup requests to the active tab and persists locators reported by
//! page agents.

use super::{PageChannel, Request, Response, RuntimeChannel, TabInfo, TabQuery};
use crate::storage::{AddSelectorOutcome, StorageService};
use crate::utils::{InserterError, ProtocolError, Result, hostname_of};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Background message handler
pub struct Coordinator {
    storage: StorageService,
    pages: Arc<dyn PageChannel>,
    tabs: Arc<dyn TabQuery>,
}

impl Coordinator {
    pub fn new(storage: StorageService, pages: Arc<dyn PageChannel>, tabs: Arc<dyn TabQuery>) -> Self {
        Self {
            storage,
            pages,
            tabs,
        }
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    /// Handle a raw JSON message
    pub async fn handle_value(&self, value: Value, sender: Option<TabInfo>) -> Response {
        match Request::from_value(value) {
            Ok(request) => self.handle(request, sender).await,
            Err(InserterError::Protocol(ProtocolError::UnknownType(kind))) => {
                log::warn!("unknown message type received: {kind}");
                Response::error(ProtocolError::UnknownType(kind).to_string())
            }
            Err(e) => {
                log::error!("error in message listener: {e}");
                Response::error(e.to_string())
            }
        }
    }

    /// Handle a decoded request; failures become `error` responses
    pub async fn handle(&self, request: Request, sender: Option<TabInfo>) -> Response {
        let kind = request.type_name();
        match self.dispatch(request, sender).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("error handling {kind}: {e}");
                Response::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, request: Request, sender: Option<TabInfo>) -> Result<Response> {
        let Some(tab) = self.tabs.active_tab().await? else {
            return Ok(Response::error(ProtocolError::NoActiveTab.to_string()));
        };

        match request {
            Request::StartSelection => {
                self.forward(tab.id, Request::ActivateSelectionMode).await?;
                Ok(Response::ok())
            }
            Request::InsertText { text } => {
                self.forward(tab.id, Request::ExecuteInsertion { text }).await?;
                Ok(Response::ok())
            }
            Request::ElementSelected { selector } => {
                let Some(url) = sender.and_then(|s| s.url) else {
                    log::error!("ELEMENT_SELECTED from a sender without a tab URL");
                    return Ok(Response::error(ProtocolError::MissingSenderUrl.to_string()));
                };
                let Some(hostname) = hostname_of(&url)? else {
                    return Err(ProtocolError::InvalidUrl(url).into());
                };
                match self.storage.add_selector_for_host(&hostname, selector).await? {
                    AddSelectorOutcome::Added(_) => Ok(Response::ok()),
                    AddSelectorOutcome::Duplicate => Ok(Response::duplicate()),
                }
            }
            other => Ok(Response::error(
                ProtocolError::UnknownType(other.type_name().to_string()).to_string(),
            )),
        }
    }

    async fn forward(&self, tab: u32, request: Request) -> Result<Response> {
        self.pages.ensure_injected(tab).await?;
        let response = self.pages.send(tab, request).await?;
        log::debug!("tab {tab} answered {:?}", response.status);
        Ok(response)
    }
}

#[async_trait]
impl RuntimeChannel for Coordinator {
    async fn send(&self, request: Request, sender: Option<TabInfo>) -> Result<Response> {
        Ok(self.handle(request, sender).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::LocatorPair;
    use crate::messaging::{MockPageChannel, MockTabQuery, Status};
    use crate::storage::MemoryStore;
    use mockall::Sequence;
    use mockall::predicate::eq;
    use serde_json::json;

    fn tabs_with(tab: Option<TabInfo>) -> MockTabQuery {
        let mut tabs = MockTabQuery::new();
        tabs.expect_active_tab().returning(move || Ok(tab.clone()));
        tabs
    }

    fn coordinator(pages: MockPageChannel, tabs: MockTabQuery) -> Coordinator {
        Coordinator::new(
            StorageService::new(Arc::new(MemoryStore::new())),
            Arc::new(pages),
            Arc::new(tabs),
        )
    }

    #[tokio::test]
    async fn test_no_active_tab() {
        let mut pages = MockPageChannel::new();
        pages.expect_ensure_injected().never();
        let coordinator = coordinator(pages, tabs_with(None));

        let response = coordinator.handle(Request::StartSelection, None).await;
        assert_eq!(response, Response::error("No active tab found"));
    }

    #[tokio::test]
    async fn test_insert_text_injects_then_forwards() {
        let mut pages = MockPageChannel::new();
        let mut seq = Sequence::new();
        pages
            .expect_ensure_injected()
            .with(eq(7))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        pages
            .expect_send()
            .with(eq(7), eq(Request::ExecuteInsertion { text: "hi".into() }))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Response::ok()));
        let coordinator = coordinator(pages, tabs_with(Some(TabInfo::new(7, "https://a.test/"))));

        let response = coordinator
            .handle_value(json!({"type": "INSERT_TEXT", "text": "hi"}), None)
            .await;
        assert!(response.is_ok());
    }

    #[tokio::test]
    async fn test_page_failure_becomes_error_response() {
        let mut pages = MockPageChannel::new();
        pages.expect_ensure_injected().returning(|tab| Err(ProtocolError::Unreachable(tab).into()));
        let coordinator = coordinator(pages, tabs_with(Some(TabInfo::new(3, "https://a.test/"))));

        let response = coordinator.handle(Request::StartSelection, None).await;
        assert_eq!(response.status, Status::Error);
        assert!(response.message.unwrap().contains("tab 3"));
    }

    #[tokio::test]
    async fn test_element_selected_saves_per_sender_host() {
        let coordinator = coordinator(
            MockPageChannel::new(),
            tabs_with(Some(TabInfo::new(1, "https://other.test/"))),
        );
        let sender = Some(TabInfo::new(1, "https://mail.example.com/inbox"));
        let request = Request::ElementSelected {
            selector: LocatorPair::new("/html/body/textarea", "html > body > textarea"),
        };

        assert!(coordinator.handle(request.clone(), sender.clone()).await.is_ok());
        assert_eq!(coordinator.handle(request, sender).await, Response::duplicate());
        let bucket = coordinator
            .storage()
            .selectors_for_host("mail.example.com")
            .await
            .unwrap();
        assert_eq!(bucket.len(), 1);
    }

    #[tokio::test]
    async fn test_element_selected_without_sender_url() {
        let coordinator = coordinator(
            MockPageChannel::new(),
            tabs_with(Some(TabInfo::new(1, "https://a.test/"))),
        );
        let request = Request::ElementSelected {
            selector: LocatorPair::new("/x", "#x"),
        };
        let sender = Some(TabInfo { id: 1, url: None });
        assert_eq!(
            coordinator.handle(request, sender).await,
            Response::error("Sender tab URL is missing")
        );
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let coordinator = coordinator(
            MockPageChannel::new(),
            tabs_with(Some(TabInfo::new(1, "https://a.test/"))),
        );
        let response = coordinator.handle_value(json!({"type": "PING"}), None).await;
        assert_eq!(response, Response::error("Unknown type: PING"));

        // page-bound requests are not handled here
        let response = coordinator.handle(Request::ActivateSelectionMode, None).await;
        assert_eq!(response, Response::error("Unknown type: ACTIVATE_SELECTION_MODE"));
    }
}
