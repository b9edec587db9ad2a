//! Interactive-element resolution

use crate::dom::{Document, NodeId};

/// Descendant selectors tried in priority order; the first selector with any
/// match wins
pub const INTERACTIVE_ELEMENT_SELECTORS: [&str; 5] = [
    r#"input:not([type="hidden"])"#,
    "textarea",
    r#"[contenteditable="true"]"#,
    "[data-value]",
    r#"[role="textbox"]"#,
];

/// Whether the node can take text as-is, without looking at descendants
pub fn is_directly_interactive(document: &Document, node: NodeId) -> bool {
    let Some(element) = document.element(node) else {
        return false;
    };
    element.is_text_control()
        || document.is_content_editable(node)
        || element.get_attribute("contenteditable") == Some("true")
        || element.has_attribute("data-value")
}

/// Find the element the user meant when pointing at `node`
pub fn find_interactive_element(document: &Document, node: NodeId) -> Option<NodeId> {
    if is_directly_interactive(document, node) {
        return Some(node);
    }
    if !document.is_element(node) && node != document.root() {
        return None;
    }

    for selector in INTERACTIVE_ELEMENT_SELECTORS {
        match document.query_selector_from(node, selector) {
            Ok(Some(found)) => return Some(found),
            Ok(None) => {}
            Err(e) => log::warn!("interactive selector {selector} failed: {e}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textarea_container_returned_unchanged() {
        let mut doc = Document::parse_html("<textarea id=t></textarea>").unwrap();
        let textarea = doc.get_element_by_id("t").unwrap();
        let nested = doc.create_element("input");
        doc.append_child(textarea, nested);

        assert_eq!(find_interactive_element(&doc, textarea), Some(textarea));
    }

    #[test]
    fn test_selector_order_beats_document_order() {
        let doc = Document::parse_html(
            r#"<div id="box">
                <div role="textbox">first in document</div>
                <textarea></textarea>
                <input type="hidden">
            </div>"#,
        )
        .unwrap();
        let container = doc.get_element_by_id("box").unwrap();
        let found = find_interactive_element(&doc, container).unwrap();
        assert_eq!(doc.tag_name(found), Some("textarea"));
    }

    #[test]
    fn test_direct_predicates() {
        let doc = Document::parse_html(
            r#"<div id="ce" contenteditable="true"></div>
               <span id="dv" data-value="x"><input></span>
               <p id="plain">text</p>"#,
        )
        .unwrap();
        let ce = doc.get_element_by_id("ce").unwrap();
        let dv = doc.get_element_by_id("dv").unwrap();
        let plain = doc.get_element_by_id("plain").unwrap();

        assert_eq!(find_interactive_element(&doc, ce), Some(ce));
        assert_eq!(find_interactive_element(&doc, dv), Some(dv));
        assert_eq!(find_interactive_element(&doc, plain), None);
    }

    #[test]
    fn test_content_editable_descendant_via_inheritance() {
        let doc = Document::parse_html(r#"<div contenteditable><b id="inner">x</b></div>"#).unwrap();
        let inner = doc.get_element_by_id("inner").unwrap();
        assert!(is_directly_interactive(&doc, inner));
    }
}
