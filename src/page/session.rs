//! Selection mode
//!
//! While active the body shows a crosshair cursor, hovering outlines the
//! element a click would pick, and the body listens for clicks in the
//! capture phase.

use crate::dom::{Document, EventType, NodeId};
use crate::locator::find_interactive_element;

const HIGHLIGHT_OFFSET: &str = "2px";

/// Selection latch and hover highlight
#[derive(Debug, Clone)]
pub struct SelectionSession {
    active: bool,
    highlighted: Option<NodeId>,
    outline: String,
}

impl SelectionSession {
    pub fn new(outline: impl Into<String>) -> Self {
        Self {
            active: false,
            highlighted: None,
            outline: outline.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Element currently carrying the highlight
    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    /// Turn selection mode on; returns false if it already was
    pub fn activate(&mut self, document: &mut Document) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        if let Some(body) = document.body() {
            document.set_style_property(body, "cursor", "crosshair");
            document.add_event_listener(body, EventType::MouseOver, false);
            document.add_event_listener(body, EventType::MouseOut, false);
            document.add_event_listener(body, EventType::Click, true);
        }
        log::debug!("selection mode on");
        true
    }

    /// Turn selection mode off and drop any highlight
    pub fn deactivate(&mut self, document: &mut Document) {
        if let Some(body) = document.body() {
            document.set_style_property(body, "cursor", "default");
            document.remove_event_listener(body, &EventType::MouseOver, false);
            document.remove_event_listener(body, &EventType::MouseOut, false);
            document.remove_event_listener(body, &EventType::Click, true);
        }
        if let Some(previous) = self.highlighted.take() {
            document.set_style_property(previous, "outline", "");
        }
        self.active = false;
    }

    /// Move the highlight to the interactive element under `target`
    pub fn highlight(&mut self, document: &mut Document, target: NodeId) -> Option<NodeId> {
        if let Some(previous) = self.highlighted {
            document.set_style_property(previous, "outline", "");
        }
        let element = find_interactive_element(document, target)?;
        self.highlighted = Some(element);
        document.set_style_property(element, "outline", &self.outline);
        document.set_style_property(element, "outline-offset", HIGHLIGHT_OFFSET);
        Some(element)
    }

    /// Clear the outline of the highlighted element
    pub fn clear_highlight(&mut self, document: &mut Document) {
        if let Some(previous) = self.highlighted {
            document.set_style_property(previous, "outline", "");
        }
    }
}
