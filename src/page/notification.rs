//! In-page notifications

use crate::dom::{Document, NodeId};
use std::time::Duration;

/// Element id of the notification; at most one exists at a time
pub const NOTIFICATION_ID: &str = "text-inserter-notification";

/// Notification flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    pub fn background_color(self) -> &'static str {
        match self {
            Self::Success => "#4CAF50",
            Self::Error => "#f44336",
            Self::Info => "#2196F3",
        }
    }
}

/// A notification that was shown, with its auto-dismiss delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub duration: Duration,
}

/// Show `message` in the page, replacing any previous notification
pub fn show_notification(document: &mut Document, message: &str, kind: NotificationKind) -> Option<NodeId> {
    dismiss_notification(document);
    let body = document.body()?;

    let node = document.create_element("div");
    document.set_attribute(node, "id", NOTIFICATION_ID);
    document.set_text_content(node, message);
    for (property, value) in [
        ("position", "fixed"),
        ("top", "20px"),
        ("right", "20px"),
        ("padding", "12px 20px"),
        ("border-radius", "8px"),
        ("background-color", kind.background_color()),
        ("color", "white"),
        ("z-index", "2147483647"),
        ("font-size", "16px"),
    ] {
        document.set_style_property(node, property, value);
    }
    document.append_child(body, node);
    Some(node)
}

/// Remove the current notification, if any
pub fn dismiss_notification(document: &mut Document) -> bool {
    match document.get_element_by_id(NOTIFICATION_ID) {
        Some(existing) => {
            document.remove(existing);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_replaces_previous() {
        let mut doc = Document::parse_html("<body><p>page</p></body>").unwrap();
        show_notification(&mut doc, "first", NotificationKind::Info).unwrap();
        let second = show_notification(&mut doc, "second", NotificationKind::Error).unwrap();

        assert_eq!(doc.get_element_by_id(NOTIFICATION_ID), Some(second));
        assert_eq!(doc.text_content(second), "second");
        assert_eq!(doc.style_property(second, "background-color"), Some("#f44336"));
        let body = doc.body().unwrap();
        assert_eq!(doc.element_children(body).len(), 2);

        assert!(dismiss_notification(&mut doc));
        assert!(!dismiss_notification(&mut doc));
    }
}
