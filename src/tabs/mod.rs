//! Tab registry
//!
//! Holds one [`PageAgent`] per open tab and plays the browser's part for the
//! coordinator: active-tab lookup, agent injection and message delivery.

use crate::config::InserterConfig;
use crate::dom::{Document, NodeId};
use crate::messaging::{PageChannel, Request, Response, RuntimeChannel, TabId, TabInfo, TabQuery};
use crate::page::PageAgent;
use crate::storage::StorageService;
use crate::utils::{ProtocolError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::{Mutex, RwLock};

type AgentHandle = Arc<Mutex<PageAgent>>;

/// Open tabs and their page agents
pub struct TabRegistry {
    storage: StorageService,
    config: InserterConfig,
    agents: RwLock<HashMap<TabId, AgentHandle>>,
    active: RwLock<Option<TabId>>,
    next_id: AtomicU32,
}

impl TabRegistry {
    pub fn new(storage: StorageService, config: InserterConfig) -> Self {
        Self {
            storage,
            config,
            agents: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
            next_id: AtomicU32::new(1),
        }
    }

    /// Open a page in a new tab and make it active
    pub async fn open_tab(&self, url: &str, html: &str) -> Result<TabId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let document = Document::parse_html(html)?;
        let agent = PageAgent::new(id, url, document, self.storage.clone(), self.config.clone())?;
        self.agents.write().await.insert(id, Arc::new(Mutex::new(agent)));
        *self.active.write().await = Some(id);
        log::debug!("opened tab {id} at {url}");
        Ok(id)
    }

    /// Close a tab; the active tab is cleared if it was this one
    pub async fn close_tab(&self, tab: TabId) -> bool {
        let removed = self.agents.write().await.remove(&tab).is_some();
        let mut active = self.active.write().await;
        if *active == Some(tab) {
            *active = None;
        }
        removed
    }

    pub async fn activate(&self, tab: TabId) -> Result<()> {
        if !self.agents.read().await.contains_key(&tab) {
            return Err(ProtocolError::Unreachable(tab).into());
        }
        *self.active.write().await = Some(tab);
        Ok(())
    }

    async fn agent(&self, tab: TabId) -> Result<AgentHandle> {
        self.agents
            .read()
            .await
            .get(&tab)
            .cloned()
            .ok_or_else(|| ProtocolError::Unreachable(tab).into())
    }

    /// Simulate a user click on `target`
    pub async fn click(&self, tab: TabId, target: NodeId, runtime: &dyn RuntimeChannel) -> Result<Option<Response>> {
        let agent = self.agent(tab).await?;
        let mut agent = agent.lock().await;
        Ok(agent.on_click(target, runtime).await)
    }

    /// Simulate the pointer entering `target`
    pub async fn hover(&self, tab: TabId, target: NodeId) -> Result<Option<NodeId>> {
        let agent = self.agent(tab).await?;
        let mut agent = agent.lock().await;
        Ok(agent.on_mouse_over(target))
    }

    /// Simulate the pointer leaving the highlighted element
    pub async fn mouse_out(&self, tab: TabId) -> Result<()> {
        let agent = self.agent(tab).await?;
        agent.lock().await.on_mouse_out();
        Ok(())
    }

    /// Auto-dismiss timer firing for a tab's notification
    pub async fn dismiss_notification(&self, tab: TabId) -> Result<bool> {
        let agent = self.agent(tab).await?;
        let dismissed = agent.lock().await.dismiss_notification();
        Ok(dismissed)
    }

    /// Run `f` against a tab's agent
    pub async fn with_agent<T>(&self, tab: TabId, f: impl FnOnce(&mut PageAgent) -> T) -> Result<T> {
        let agent = self.agent(tab).await?;
        let mut agent = agent.lock().await;
        Ok(f(&mut agent))
    }

    /// Run `f` against a tab's document
    pub async fn with_document<T>(&self, tab: TabId, f: impl FnOnce(&mut Document) -> T) -> Result<T> {
        self.with_agent(tab, |agent| f(agent.document_mut())).await
    }
}

#[async_trait]
impl PageChannel for TabRegistry {
    async fn ensure_injected(&self, tab: TabId) -> Result<()> {
        let agent = self.agent(tab).await?;
        agent.lock().await.inject();
        Ok(())
    }

    async fn send(&self, tab: TabId, request: Request) -> Result<Response> {
        let agent = self.agent(tab).await?;
        let mut agent = agent.lock().await;
        if !agent.is_injected() {
            return Err(ProtocolError::Unreachable(tab).into());
        }
        Ok(agent.handle_message(request).await)
    }
}

#[async_trait]
impl TabQuery for TabRegistry {
    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        let Some(id) = *self.active.read().await else {
            return Ok(None);
        };
        let agent = self.agent(id).await?;
        let url = agent.lock().await.url().to_string();
        Ok(Some(TabInfo { id, url: Some(url) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn registry() -> TabRegistry {
        TabRegistry::new(
            StorageService::new(Arc::new(MemoryStore::new())),
            InserterConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_active_tab_tracks_open_and_close() {
        let tabs = registry();
        assert_eq!(tabs.active_tab().await.unwrap(), None);

        let first = tabs.open_tab("https://a.test/", "<input>").await.unwrap();
        let second = tabs.open_tab("https://b.test/", "<input>").await.unwrap();
        assert_eq!(tabs.active_tab().await.unwrap().unwrap().id, second);

        tabs.activate(first).await.unwrap();
        assert_eq!(
            tabs.active_tab().await.unwrap(),
            Some(TabInfo::new(first, "https://a.test/"))
        );

        assert!(tabs.close_tab(first).await);
        assert_eq!(tabs.active_tab().await.unwrap(), None);
        assert!(tabs.activate(first).await.is_err());
    }

    #[tokio::test]
    async fn test_send_requires_injection() {
        let tabs = registry();
        let tab = tabs.open_tab("https://a.test/", "<input>").await.unwrap();

        assert!(tabs.send(tab, Request::ActivateSelectionMode).await.is_err());
        tabs.ensure_injected(tab).await.unwrap();
        tabs.ensure_injected(tab).await.unwrap();
        assert!(tabs.send(tab, Request::ActivateSelectionMode).await.unwrap().is_ok());
        assert!(tabs.with_agent(tab, |a| a.session().is_active()).await.unwrap());
    }

    #[tokio::test]
    async fn test_dismiss_notification_clears_page() {
        let tabs = registry();
        let tab = tabs.open_tab("https://a.test/", "<body><input></body>").await.unwrap();
        tabs.ensure_injected(tab).await.unwrap();
        tabs.send(tab, Request::ExecuteInsertion { text: "x".into() }).await.unwrap();

        let shown = |doc: &mut Document| doc.get_element_by_id(crate::page::NOTIFICATION_ID).is_some();
        assert!(tabs.with_document(tab, shown).await.unwrap());
        assert!(tabs.dismiss_notification(tab).await.unwrap());
        assert!(!tabs.with_document(tab, shown).await.unwrap());
        assert!(tabs.dismiss_notification(99).await.is_err());
    }
}
