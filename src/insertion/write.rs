//! Element write policy
//!
//! Text is always appended to existing content, joined with a single space.

use crate::dom::{Document, Event, EventType, NodeId};

/// Append `text` to an element and notify listeners
///
/// Returns whether the element was updated. The `innerText` fallback means
/// any element can take text, so this currently always succeeds for elements.
pub fn set_element_value(document: &mut Document, element: NodeId, text: &str) -> bool {
    write_value(document, element, text)
}

fn append(current: &str, text: &str) -> String {
    if current.is_empty() {
        text.to_string()
    } else {
        format!("{current} {text}")
    }
}

fn write_value(document: &mut Document, element: NodeId, text: &str) -> bool {
    let Some(data) = document.element(element) else {
        return false;
    };
    let is_text_control = data.is_text_control();
    let is_textbox = data.get_attribute("contenteditable") == Some("true")
        || data.get_attribute("role") == Some("textbox");
    let mut updated = false;

    if is_text_control {
        let next = append(document.value(element).unwrap_or_default(), text);
        if document.has_native_value_setter(element) {
            document.set_value_native(element, &next);
        } else {
            document.assign_value(element, &next);
        }
        updated = true;
    } else if is_textbox || document.is_content_editable(element) {
        let next = append(&document.text_content(element), text);
        document.set_text_content(element, &next);
        updated = true;
    }

    if let Some(holder) = value_holder(document, element) {
        let next = append(document.attribute(holder, "data-value").unwrap_or_default(), text);
        document.set_attribute(holder, "data-value", &next);
        if !updated {
            // the nested control goes through the whole policy, holder included
            if let Some(inner) = nested_text_control(document, element) {
                write_value(document, inner, text);
                updated = true;
            }
        }
    }

    if !updated {
        let next = append(&document.inner_text(element), text);
        document.set_inner_text(element, &next);
        updated = true;
    }

    document.focus(element);
    document.dispatch_event(element, Event::bubbling(EventType::Input));
    document.dispatch_event(element, Event::bubbling(EventType::Change));
    document.blur(element);
    document.focus(element);
    updated
}

/// Nearest inclusive ancestor carrying `data-value`
fn value_holder(document: &Document, element: NodeId) -> Option<NodeId> {
    let mut cursor = Some(element);
    while let Some(node) = cursor {
        if document.has_attribute(node, "data-value") {
            return Some(node);
        }
        cursor = document.parent_element(node);
    }
    None
}

fn nested_text_control(document: &Document, element: NodeId) -> Option<NodeId> {
    document
        .descendants(element)
        .into_iter()
        .find(|n| document.element(*n).is_some_and(|e| e.is_text_control()))
}
