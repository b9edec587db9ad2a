//! Locator generation
//!
//! Two independent locators are produced per element. The XPath prefers
//! stable attributes (`id`, `name`, `placeholder`) over sibling positions and
//! is anchored at `/html/body`; the CSS path stops at the first ancestor with
//! an id.

use super::LocatorPair;
use crate::dom::{Document, NodeId};

/// Generate both locators for an element
///
/// A node that is not an element yields an empty pair.
pub fn generate(document: &Document, element: NodeId) -> LocatorPair {
    let pair = LocatorPair {
        xpath: generate_xpath(document, element),
        css: generate_css_selector(document, element),
    };
    log::debug!("generated locators {:?} for node {}", pair, element.index());
    pair
}

/// Absolute XPath for an element
pub fn generate_xpath(document: &Document, element: NodeId) -> Option<String> {
    if !document.is_element(element) {
        return None;
    }
    let body = document.body();
    if Some(element) == body {
        return Some("/html/body".to_string());
    }

    let mut segments = Vec::new();
    let mut cursor = Some(element);
    let mut under_body = false;
    while let Some(node) = cursor.filter(|n| document.is_element(*n)) {
        if Some(node) == body {
            under_body = true;
            break;
        }
        segments.push(xpath_segment(document, node));
        cursor = document.parent(node);
    }
    segments.reverse();

    let prefix = if under_body { "/html/body/" } else { "/" };
    Some(format!("{prefix}{}", segments.join("/")))
}

fn xpath_segment(document: &Document, node: NodeId) -> String {
    let Some(element) = document.element(node) else {
        return String::new();
    };
    let tag = &element.tag_name;
    if let Some(id) = element.id() {
        format!(r#"{tag}[@id="{id}"]"#)
    } else if let Some(name) = element.get_attribute("name") {
        format!(r#"{tag}[@name="{name}"]"#)
    } else if let Some(placeholder) = element.get_attribute("placeholder") {
        format!(r#"{tag}[@placeholder="{placeholder}"]"#)
    } else {
        match document.position_among_type(node) {
            1 => tag.clone(),
            position => format!("{tag}[{position}]"),
        }
    }
}

/// CSS selector path for an element, joined with `" > "`
pub fn generate_css_selector(document: &Document, element: NodeId) -> Option<String> {
    if !document.is_element(element) {
        return None;
    }

    let mut path = Vec::new();
    let mut cursor = Some(element);
    while let Some(node) = cursor {
        let Some(data) = document.element(node) else {
            break;
        };
        if let Some(id) = data.id() {
            let mut segment = String::from("#");
            cssparser::serialize_identifier(id, &mut segment).ok()?;
            path.push(segment);
            break;
        }
        let position = document.position_among_type(node);
        if position == 1 {
            path.push(data.tag_name.clone());
        } else {
            path.push(format!("{}:nth-of-type({position})", data.tag_name));
        }
        cursor = document.parent(node);
    }
    path.reverse();
    Some(path.join(" > "))
}
