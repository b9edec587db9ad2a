//! Element locators: generation, evaluation and interactive-element resolution

mod generator;
mod resolver;

pub use generator::{generate, generate_css_selector, generate_xpath};
pub use resolver::{INTERACTIVE_ELEMENT_SELECTORS, find_interactive_element, is_directly_interactive};

use crate::dom::{Document, NodeId};
use crate::utils::Result;
use serde::{Deserialize, Serialize};

/// The pair of locators generated for one element
///
/// This is the candidate the page sends with `ELEMENT_SELECTED`; the store
/// turns it into a record by assigning an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
}

impl LocatorPair {
    /// Create a pair from both locator forms
    pub fn new(xpath: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            xpath: Some(xpath.into()),
            css: Some(css.into()),
        }
    }

    /// True when neither locator form is present
    pub fn is_empty(&self) -> bool {
        self.xpath.is_none() && self.css.is_none()
    }
}

/// Narrow interface to the page's locator machinery
///
/// The insertion engine reaches the page only through this trait, so the
/// order in which locators are tried can be observed in tests.
pub trait ElementLocatorEngine {
    /// First node selected by an XPath expression
    fn evaluate_xpath(&self, document: &Document, expression: &str) -> Result<Option<NodeId>>;

    /// First element matching a CSS selector
    fn query_selector(&self, document: &Document, selector: &str) -> Result<Option<NodeId>>;
}

/// Locator engine backed by the document's own XPath and selector support
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLocatorEngine;

impl ElementLocatorEngine for DocumentLocatorEngine {
    fn evaluate_xpath(&self, document: &Document, expression: &str) -> Result<Option<NodeId>> {
        document.evaluate_xpath(expression)
    }

    fn query_selector(&self, document: &Document, selector: &str) -> Result<Option<NodeId>> {
        document.query_selector(selector)
    }
}
