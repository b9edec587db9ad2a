//! Insertion engine
//!
//! Walks a host's locator records in priority order and writes the text into
//! the first one that still resolves to an interactive element.

mod write;

pub use write::set_element_value;

use crate::dom::{Document, NodeId};
use crate::locator::{DocumentLocatorEngine, ElementLocatorEngine, find_interactive_element};
use crate::storage::LocatorRecord;

/// Result of an insertion attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionOutcome {
    /// Text was written
    Inserted {
        /// Id of the record that resolved
        record_id: String,
        /// Element that received the text
        target: NodeId,
    },
    /// No record resolved to a writable element
    NoMatch,
}

impl InsertionOutcome {
    /// Whether the text was written
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

/// Writes text using saved locators
pub struct InsertionEngine<L = DocumentLocatorEngine> {
    locator: L,
}

impl InsertionEngine {
    /// Create an engine that evaluates locators against the document itself
    pub fn new() -> Self {
        Self::with_locator(DocumentLocatorEngine)
    }
}

impl Default for InsertionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ElementLocatorEngine> InsertionEngine<L> {
    /// Create an engine with a custom locator engine
    pub fn with_locator(locator: L) -> Self {
        Self { locator }
    }

    /// The locator engine in use
    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Insert `text` using the first record that resolves
    ///
    /// Records are tried in stored order and iteration stops at the first
    /// successful write.
    pub fn insert(&self, document: &mut Document, records: &[LocatorRecord], text: &str) -> InsertionOutcome {
        for record in records {
            let Some(located) = self.locate(document, record) else {
                log::debug!("record {} did not resolve", record.id);
                continue;
            };
            let Some(target) = find_interactive_element(document, located) else {
                log::debug!("record {} resolved to a non-interactive element", record.id);
                continue;
            };
            if set_element_value(document, target, text) {
                log::info!("inserted text using record {}", record.id);
                return InsertionOutcome::Inserted {
                    record_id: record.id.clone(),
                    target,
                };
            }
        }
        InsertionOutcome::NoMatch
    }

    /// Resolve a record to a live node: XPath first, CSS as fallback
    pub fn locate(&self, document: &Document, record: &LocatorRecord) -> Option<NodeId> {
        if let Some(xpath) = &record.xpath {
            match self.locator.evaluate_xpath(document, xpath) {
                Ok(Some(node)) => return Some(node),
                Ok(None) => {}
                Err(e) => log::warn!("XPath evaluation failed: {xpath}: {e}"),
            }
        }
        if let Some(css) = &record.css {
            match self.locator.query_selector(document, css) {
                Ok(Some(node)) => return Some(node),
                Ok(None) => {}
                Err(e) => log::warn!("selector query failed: {css}: {e}"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Result;
    use std::cell::RefCell;

    /// Records every locator it is asked to evaluate
    #[derive(Default)]
    struct RecordingEngine {
        calls: RefCell<Vec<String>>,
    }

    impl ElementLocatorEngine for RecordingEngine {
        fn evaluate_xpath(&self, document: &Document, expression: &str) -> Result<Option<NodeId>> {
            self.calls.borrow_mut().push(format!("xpath:{expression}"));
            DocumentLocatorEngine.evaluate_xpath(document, expression)
        }

        fn query_selector(&self, document: &Document, selector: &str) -> Result<Option<NodeId>> {
            self.calls.borrow_mut().push(format!("css:{selector}"));
            DocumentLocatorEngine.query_selector(document, selector)
        }
    }

    fn record(id: &str, xpath: Option<&str>, css: Option<&str>) -> LocatorRecord {
        LocatorRecord {
            id: id.to_string(),
            xpath: xpath.map(str::to_string),
            css: css.map(str::to_string),
        }
    }

    fn page() -> Document {
        Document::parse_html(
            r#"<body><p>intro</p><input id="first"><div class="wrap"><textarea></textarea></div></body>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_stored_order_and_early_stop() {
        let mut doc = page();
        let engine = InsertionEngine::with_locator(RecordingEngine::default());
        let records = vec![
            record("gone", Some("/html/body/form"), Some("form > input")),
            record("hit", Some(r#"/html/body/input[@id="first"]"#), Some("#first")),
            record("never", Some("/html/body/div/textarea"), None),
        ];

        let outcome = engine.insert(&mut doc, &records, "hello");
        let input = doc.get_element_by_id("first").unwrap();
        assert_eq!(
            outcome,
            InsertionOutcome::Inserted {
                record_id: "hit".into(),
                target: input
            }
        );
        assert_eq!(
            *engine.locator().calls.borrow(),
            vec![
                "xpath:/html/body/form".to_string(),
                "css:form > input".to_string(),
                r#"xpath:/html/body/input[@id="first"]"#.to_string(),
            ]
        );
        assert_eq!(doc.value(input), Some("hello"));
    }

    #[test]
    fn test_invalid_xpath_falls_back_to_css() {
        let mut doc = page();
        let engine = InsertionEngine::new();
        let records = vec![record("r", Some("/html/body/input[@id=\"fir\"st\"]"), Some(".wrap textarea"))];

        let outcome = engine.insert(&mut doc, &records, "x");
        let textarea = doc.query_selector("textarea").unwrap().unwrap();
        assert!(outcome.is_success());
        assert_eq!(doc.value(textarea), Some("x"));
    }

    #[test]
    fn test_non_interactive_match_is_a_miss() {
        let mut doc = page();
        let engine = InsertionEngine::new();
        let records = vec![
            record("para", Some("/html/body/p"), None),
            record("wrap", None, Some("div.wrap")),
        ];

        let outcome = engine.insert(&mut doc, &records, "y");
        match outcome {
            InsertionOutcome::Inserted { record_id, target } => {
                assert_eq!(record_id, "wrap");
                assert_eq!(doc.tag_name(target), Some("textarea"));
            }
            InsertionOutcome::NoMatch => panic!("expected an insertion"),
        }
        assert_eq!(doc.text_content(doc.query_selector("p").unwrap().unwrap()), "intro");
    }

    #[test]
    fn test_all_records_miss() {
        let mut doc = page();
        let engine = InsertionEngine::new();
        let records = vec![record("a", Some("/html/body/nav"), Some("nav"))];
        assert_eq!(engine.insert(&mut doc, &records, "z"), InsertionOutcome::NoMatch);
        assert_eq!(engine.insert(&mut doc, &[], "z"), InsertionOutcome::NoMatch);
    }
}
