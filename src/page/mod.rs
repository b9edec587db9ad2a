//! Page agent
//!
//! Runs inside one tab: owns the page document, answers coordinator
//! requests, turns clicks during selection mode into `ELEMENT_SELECTED`
//! reports and performs insertions.

mod notification;
mod session;

pub use notification::{
    NOTIFICATION_ID, Notification, NotificationKind, dismiss_notification, show_notification,
};
pub use session::SelectionSession;

use crate::config::InserterConfig;
use crate::dom::{Document, NodeId};
use crate::insertion::{InsertionEngine, InsertionOutcome};
use crate::locator::{find_interactive_element, generate};
use crate::messaging::{Request, Response, RuntimeChannel, Status, TabId, TabInfo};
use crate::storage::StorageService;
use crate::utils::{ProtocolError, Result, hostname_of};

/// User-facing page messages
pub mod messages {
    pub const ELEMENT_SAVED: &str = "Element saved for insertion!";
    pub const ELEMENT_DUPLICATE: &str = "This element was already saved.";
    pub const SAVE_FAILED: &str = "Could not save the element.";
    pub const NO_INPUT_FOUND: &str = "No suitable input field found.";
    pub const SELECT_FIRST: &str = "Select an element on the page first.";
    pub const TEXT_INSERTED: &str = "Text inserted!";
    pub const NOTHING_FOUND: &str = "None of the saved elements were found. Select them again.";
}

/// Agent for one page
pub struct PageAgent {
    tab: TabId,
    url: String,
    hostname: String,
    document: Document,
    storage: StorageService,
    engine: InsertionEngine,
    session: SelectionSession,
    config: InserterConfig,
    injected: bool,
    last_notification: Option<Notification>,
    last_insertion: Option<InsertionOutcome>,
}

impl PageAgent {
    /// Create an agent for a loaded page; it stays dormant until injected
    pub fn new(
        tab: TabId,
        url: impl Into<String>,
        document: Document,
        storage: StorageService,
        config: InserterConfig,
    ) -> Result<Self> {
        let url = url.into();
        let hostname = hostname_of(&url)?.unwrap_or_default();
        Ok(Self {
            tab,
            url,
            hostname,
            document,
            storage,
            engine: InsertionEngine::new(),
            session: SelectionSession::new(config.highlight_outline.clone()),
            config,
            injected: false,
            last_notification: None,
            last_insertion: None,
        })
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.last_notification.as_ref()
    }

    /// Outcome of the most recent insertion that reached the engine
    pub fn last_insertion(&self) -> Option<&InsertionOutcome> {
        self.last_insertion.as_ref()
    }

    /// Remove the shown notification once its duration has elapsed
    ///
    /// `last_notification` keeps the record of what was shown.
    pub fn dismiss_notification(&mut self) -> bool {
        dismiss_notification(&mut self.document)
    }

    pub fn is_injected(&self) -> bool {
        self.injected
    }

    /// Start the agent; later calls do nothing
    pub fn inject(&mut self) -> bool {
        if self.injected {
            return false;
        }
        self.injected = true;
        log::info!("page agent initialized in tab {}", self.tab);
        true
    }

    /// Answer a coordinator request
    pub async fn handle_message(&mut self, request: Request) -> Response {
        match request {
            Request::ActivateSelectionMode => {
                self.session.activate(&mut self.document);
                Response::ok()
            }
            Request::ExecuteInsertion { text } => {
                if let Err(e) = self.execute_insertion(&text).await {
                    log::error!("insertion failed: {e}");
                    self.notify(&format!("Error: {e}"), NotificationKind::Error);
                }
                Response::ok()
            }
            other => Response::error(ProtocolError::UnknownType(other.type_name().to_string()).to_string()),
        }
    }

    /// Insert `text` using the locators saved for this page's host
    pub async fn execute_insertion(&mut self, text: &str) -> Result<InsertionOutcome> {
        let bucket = self.storage.selectors_for_host(&self.hostname).await?;
        if bucket.is_empty() {
            self.notify(messages::SELECT_FIRST, NotificationKind::Error);
            return Ok(InsertionOutcome::NoMatch);
        }

        let outcome = self.engine.insert(&mut self.document, bucket.records(), text);
        if outcome.is_success() {
            self.notify(messages::TEXT_INSERTED, NotificationKind::Success);
        } else {
            self.notify(messages::NOTHING_FOUND, NotificationKind::Error);
        }
        self.last_insertion = Some(outcome.clone());
        Ok(outcome)
    }

    /// Handle a click on `target`
    ///
    /// Ignored unless selection mode is active. Returns the coordinator's
    /// answer when a report was sent.
    pub async fn on_click(&mut self, target: NodeId, runtime: &dyn RuntimeChannel) -> Option<Response> {
        if !self.session.is_active() {
            return None;
        }
        self.session.deactivate(&mut self.document);

        let Some(element) = find_interactive_element(&self.document, target) else {
            self.notify(messages::NO_INPUT_FOUND, NotificationKind::Error);
            return None;
        };
        let selector = generate(&self.document, element);
        let sender = TabInfo::new(self.tab, self.url.clone());

        match runtime.send(Request::ElementSelected { selector }, Some(sender)).await {
            Ok(response) => {
                match response.status {
                    Status::Ok => self.notify(messages::ELEMENT_SAVED, NotificationKind::Success),
                    Status::Duplicate => self.notify(messages::ELEMENT_DUPLICATE, NotificationKind::Info),
                    Status::Error => {
                        let message = format!("Error: {}", response.message.as_deref().unwrap_or_default());
                        self.notify(&message, NotificationKind::Error)
                    }
                }
                Some(response)
            }
            Err(e) => {
                log::error!("could not send ELEMENT_SELECTED: {e}");
                self.notify(messages::SAVE_FAILED, NotificationKind::Error);
                None
            }
        }
    }

    pub fn on_mouse_over(&mut self, target: NodeId) -> Option<NodeId> {
        if !self.session.is_active() {
            return None;
        }
        self.session.highlight(&mut self.document, target)
    }

    pub fn on_mouse_out(&mut self) {
        if self.session.is_active() {
            self.session.clear_highlight(&mut self.document);
        }
    }

    fn notify(&mut self, message: &str, kind: NotificationKind) {
        show_notification(&mut self.document, message, kind);
        self.last_notification = Some(Notification {
            kind,
            message: message.to_string(),
            duration: self.config.notification_duration(),
        });
    }
}
