//! Event records for the page document
//!
//! The document does not run script callbacks. Listeners are registrations
//! that page-side components consult before acting on pointer input, and every
//! dispatched event is appended to the document's event log.

use super::NodeId;

/// Event types the text inserter dispatches or listens for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
    // Mouse events
    Click,
    MouseOver,
    MouseOut,

    // Focus events
    Focus,
    Blur,

    // Form events
    Input,
    Change,

    // Custom event
    Custom(String),
}

impl EventType {
    /// DOM event name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Click => "click",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Input => "input",
            Self::Change => "change",
            Self::Custom(name) => name,
        }
    }
}

/// An event about to be dispatched
#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub bubbles: bool,
    /// Crosses shadow-root boundaries
    pub composed: bool,
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl Event {
    /// Create a non-bubbling event
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            bubbles: false,
            composed: false,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Create an event that bubbles and is composed, like `new Event(t, {bubbles, composed})`
    pub fn bubbling(event_type: EventType) -> Self {
        Self {
            bubbles: true,
            composed: true,
            ..Self::new(event_type)
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop event propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Log entry for an event that reached the document
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    pub event_type: EventType,
    pub target: NodeId,
    /// Nodes the event visited, target first
    pub path: Vec<NodeId>,
    pub bubbles: bool,
    pub composed: bool,
}

/// A listener registration on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener {
    pub node: NodeId,
    pub event_type: EventType,
    pub capture: bool,
}
