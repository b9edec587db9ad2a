//! HTML5 parser implementation using html5ever

use super::{Document, NodeId};
use crate::utils::Result;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// HTML5 parser using html5ever
pub struct HtmlParser {
    opts: ParseOpts,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            opts: ParseOpts {
                tree_builder: TreeBuilderOpts {
                    drop_doctype: true,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    /// Parse HTML content into a page document
    ///
    /// html5ever always synthesises `html`, `head` and `body`, so even an
    /// empty input yields a document with a body.
    pub fn parse(&self, content: &str) -> Result<Document> {
        let dom = parse_document(RcDom::default(), self.opts.clone()).one(content);

        let mut document = Document::new();
        let root = document.root();
        for child in dom.document.children.borrow().iter() {
            Self::convert_node(&mut document, root, child);
        }
        Ok(document)
    }

    fn convert_node(document: &mut Document, parent: NodeId, handle: &Handle) {
        match &handle.data {
            NodeData::Element { name, attrs, .. } => {
                let element = document.create_element(&name.local.to_string());
                for attr in attrs.borrow().iter() {
                    document.set_attribute(element, &attr.name.local.to_string(), &attr.value);
                }
                document.append_child(parent, element);
                for child in handle.children.borrow().iter() {
                    Self::convert_node(document, element, child);
                }
                document.initialize_form_value(element);
            }
            NodeData::Text { contents } => {
                let text = contents.borrow();
                if !text.trim().is_empty() {
                    let node = document.create_text_node(&text);
                    document.append_child(parent, node);
                }
            }
            NodeData::Comment { contents } => {
                let node = document.create_comment(contents);
                document.append_child(parent, node);
            }
            NodeData::Document
            | NodeData::Doctype { .. }
            | NodeData::ProcessingInstruction { .. } => {}
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}
