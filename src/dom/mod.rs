//! Page document: the DOM the text inserter inspects and mutates
//!
//! An arena of nodes with parent links so that locator generation can walk
//! upwards and sibling-relative positions can be computed. Elements carry both
//! attributes and the live `value` property of form controls.

pub mod events;
pub mod html;
pub mod selector;
pub mod xpath;

pub use events::{DispatchedEvent, Event, EventType, Listener};
pub use html::HtmlParser;
pub use selector::SelectorList;
pub use xpath::XPathExpression;

use crate::utils::Result;
use std::collections::{BTreeMap, HashMap};

/// Handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node types in the DOM
#[derive(Debug, Clone, PartialEq)]
pub enum NodeType {
    /// Document root
    Document,
    /// Element node (e.g., <div>)
    Element(ElementData),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

/// Data for element nodes
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Lowercase local name (e.g., "div", "input")
    pub tag_name: String,
    /// Element attributes
    pub attributes: HashMap<String, String>,
    /// Live `value` property of `<input>`/`<textarea>`
    pub value: String,
    /// Last value observed by a framework binding, if one is attached
    pub tracked_value: Option<String>,
    /// Inline style properties
    pub style: BTreeMap<String, String>,
}

impl ElementData {
    /// Create a new element
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            value: String::new(),
            tracked_value: None,
            style: BTreeMap::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute value
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Whether the attribute is present, even if empty
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Get the ID attribute; an empty id counts as absent
    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id").filter(|id| !id.is_empty())
    }

    /// Whether this is a text control with a native `value` property
    pub fn is_text_control(&self) -> bool {
        matches!(self.tag_name.as_str(), "input" | "textarea")
    }
}

/// A node in the DOM arena
#[derive(Debug, Clone)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Parent node, `None` for the root and detached nodes
    pub parent: Option<NodeId>,
    /// Child nodes in document order
    pub children: Vec<NodeId>,
}

/// The DOM document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    active_element: Option<NodeId>,
    listeners: Vec<Listener>,
    event_log: Vec<DispatchedEvent>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                node_type: NodeType::Document,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            active_element: None,
            listeners: Vec::new(),
            event_log: Vec::new(),
        }
    }

    /// Parse an HTML string into a document
    pub fn parse_html(content: &str) -> Result<Self> {
        HtmlParser::new().parse(content)
    }

    /// The document node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by handle
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Get element data if the node is an element
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes[id.0].node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[id.0].node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Check if the node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    /// Lowercase tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent of a node if that parent is an element
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// Child nodes
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children in document order
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Nearest preceding sibling that is an element
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|s| self.is_element(*s))
    }

    /// 1-based position among preceding element siblings with the same tag
    pub fn position_among_type(&self, id: NodeId) -> usize {
        let Some(tag) = self.tag_name(id) else {
            return 1;
        };
        let mut position = 1;
        let mut cursor = self.previous_element_sibling(id);
        while let Some(sibling) = cursor {
            if self.tag_name(sibling) == Some(tag) {
                position += 1;
            }
            cursor = self.previous_element_sibling(sibling);
        }
        position
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|c| self.is_element(*c))
    }

    /// The `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|c| self.tag_name(*c) == Some("body"))
    }

    /// First element in document order whose id equals `id`
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|n| self.element(*n).and_then(|e| e.id()) == Some(id))
    }

    /// All descendants of a node in document (pre-)order, excluding the node
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Whether `node` is `ancestor` or lies beneath it
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    // Tree mutation

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push_node(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Create a detached text node
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.push_node(NodeType::Text(text.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push_node(NodeType::Comment(text.to_string()))
    }

    fn push_node(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Detach a node from its parent
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        if self
            .active_element
            .is_some_and(|active| self.is_inclusive_descendant(active, id))
        {
            self.active_element = None;
        }
    }

    fn remove_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    // Attributes

    /// Attribute value of an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attribute(name)
    }

    /// Whether an element carries the attribute
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attribute(name))
    }

    /// Set an attribute on an element; ignored for other nodes
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attribute(name.to_ascii_lowercase(), value);
        }
    }

    /// The live `isContentEditable` property
    ///
    /// `contenteditable` of `""`, `"true"` or `"plaintext-only"` enables
    /// editing, `"false"` disables it, anything else inherits from the parent.
    pub fn is_content_editable(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(element) = self.element(current) else {
                return false;
            };
            match element
                .get_attribute("contenteditable")
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some("" | "true" | "plaintext-only") => return true,
                Some("false") => return false,
                _ => cursor = self.parent(current),
            }
        }
        false
    }

    // Text

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.nodes[id.0].node_type {
            NodeType::Text(text) | NodeType::Comment(text) => text.clone(),
            NodeType::Document => String::new(),
            NodeType::Element(_) => self
                .descendants(id)
                .into_iter()
                .filter_map(|n| match &self.nodes[n.0].node_type {
                    NodeType::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Replace all children of an element with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let NodeType::Text(existing) | NodeType::Comment(existing) =
            &mut self.nodes[id.0].node_type
        {
            *existing = text.to_string();
            return;
        }
        if self.is_element(id) {
            self.remove_children(id);
            if !text.is_empty() {
                let node = self.create_text_node(text);
                self.append_child(id, node);
            }
        }
    }

    /// Rendered text of an element
    ///
    /// Without a layout engine every text node counts as rendered, so this is
    /// the text content with surrounding whitespace trimmed.
    pub fn inner_text(&self, id: NodeId) -> String {
        self.text_content(id).trim().to_string()
    }

    /// Set the rendered text of an element
    pub fn set_inner_text(&mut self, id: NodeId, text: &str) {
        self.set_text_content(id, text);
    }

    // Form control values

    /// Seed the `value` property from markup once an element's children exist
    pub(crate) fn initialize_form_value(&mut self, id: NodeId) {
        let initial = match self.tag_name(id) {
            Some("input") => self.attribute(id, "value").unwrap_or_default().to_string(),
            Some("textarea") => self.text_content(id),
            _ => return,
        };
        if let Some(element) = self.element_mut(id) {
            element.value = initial;
        }
    }

    /// The `value` property of a text control
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.element(id)
            .filter(|e| e.is_text_control())
            .map(|e| e.value.as_str())
    }

    /// Whether the element's prototype exposes a native `value` setter
    pub fn has_native_value_setter(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(ElementData::is_text_control)
    }

    /// Set `value` through the prototype's native setter
    ///
    /// A framework value tracker keeps its last observed value, so the next
    /// `input` event is seen as a change.
    pub fn set_value_native(&mut self, id: NodeId, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.value = value.to_string();
        }
    }

    /// Assign `value` through the instance property
    ///
    /// Frameworks that wrap the instance property record the new value as
    /// already observed.
    pub fn assign_value(&mut self, id: NodeId, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.value = value.to_string();
            if element.tracked_value.is_some() {
                element.tracked_value = Some(value.to_string());
            }
        }
    }

    /// Attach a framework value tracker to a text control
    pub fn attach_value_tracker(&mut self, id: NodeId) {
        if let Some(element) = self.element_mut(id) {
            element.tracked_value = Some(element.value.clone());
        }
    }

    /// Whether a framework bound to the control would see a pending change
    pub fn has_untracked_change(&self, id: NodeId) -> bool {
        self.element(id)
            .and_then(|e| e.tracked_value.as_ref().map(|t| *t != e.value))
            .unwrap_or(false)
    }

    // Style

    /// Set an inline style property; an empty value removes it
    pub fn set_style_property(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            if value.is_empty() {
                element.style.remove(property);
            } else {
                element.style.insert(property.to_string(), value.to_string());
            }
        }
    }

    /// Inline style property of an element
    pub fn style_property(&self, id: NodeId, property: &str) -> Option<&str> {
        self.element(id)?.style.get(property).map(String::as_str)
    }

    // Selectors

    /// First element in the document matching a CSS selector
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        self.query_selector_from(self.root, selector)
    }

    /// First descendant of `scope` matching a CSS selector
    pub fn query_selector_from(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .descendants(scope)
            .into_iter()
            .find(|n| list.matches(self, *n)))
    }

    /// Nearest inclusive ancestor matching a CSS selector
    pub fn closest(&self, id: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let mut cursor = Some(id).filter(|n| self.is_element(*n));
        while let Some(current) = cursor {
            if list.matches(self, current) {
                return Ok(Some(current));
            }
            cursor = self.parent_element(current);
        }
        Ok(None)
    }

    /// First node, in document order, selected by an XPath expression
    pub fn evaluate_xpath(&self, expression: &str) -> Result<Option<NodeId>> {
        Ok(XPathExpression::parse(expression)?.first_node(self))
    }

    // Focus and events

    /// Currently focused element
    pub fn active_element(&self) -> Option<NodeId> {
        self.active_element
    }

    /// Focus an element, dispatching `focus`
    pub fn focus(&mut self, id: NodeId) {
        if !self.is_element(id) || self.active_element == Some(id) {
            return;
        }
        if self.active_element.is_some() {
            self.blur_active();
        }
        self.active_element = Some(id);
        self.dispatch_event(id, Event::new(EventType::Focus));
    }

    /// Remove focus from an element if it has it, dispatching `blur`
    pub fn blur(&mut self, id: NodeId) {
        if self.active_element == Some(id) {
            self.blur_active();
        }
    }

    fn blur_active(&mut self) {
        if let Some(active) = self.active_element.take() {
            self.dispatch_event(active, Event::new(EventType::Blur));
        }
    }

    /// Dispatch an event at a node and record it in the event log
    pub fn dispatch_event(&mut self, target: NodeId, event: Event) -> DispatchedEvent {
        let mut path = vec![target];
        if event.bubbles && !event.propagation_stopped {
            let mut cursor = self.parent(target);
            while let Some(current) = cursor {
                path.push(current);
                cursor = self.parent(current);
            }
        }
        let dispatched = DispatchedEvent {
            event_type: event.event_type,
            target,
            path,
            bubbles: event.bubbles,
            composed: event.composed,
        };
        self.event_log.push(dispatched.clone());
        dispatched
    }

    /// Events dispatched so far
    pub fn event_log(&self) -> &[DispatchedEvent] {
        &self.event_log
    }

    /// Drain the event log
    pub fn take_event_log(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Register a listener on a node
    pub fn add_event_listener(&mut self, node: NodeId, event_type: EventType, capture: bool) {
        let listener = Listener {
            node,
            event_type,
            capture,
        };
        if !self.listeners.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    /// Remove a listener registration
    pub fn remove_event_listener(&mut self, node: NodeId, event_type: &EventType, capture: bool) {
        self.listeners.retain(|l| {
            !(l.node == node && l.event_type == *event_type && l.capture == capture)
        });
    }

    /// Whether a listener for `event_type` is registered on `node`
    pub fn has_event_listener(&self, node: NodeId, event_type: &EventType) -> bool {
        self.listeners
            .iter()
            .any(|l| l.node == node && l.event_type == *event_type)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
