//! XPath evaluation for absolute location paths
//!
//! Supports the paths the locator generator emits plus `//` and `*`:
//! `/html/body/div[2]/input[@name="q"]`. Predicates are positions (`[n]`),
//! attribute presence (`[@a]`) and attribute equality (`[@a="v"]`). Anything
//! else is rejected as an invalid expression.

use super::{Document, NodeId};
use crate::utils::LocatorError;
use std::collections::{HashMap, HashSet};
use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    /// `//`: children of the context node or any of its descendants
    DescendantOrSelfChild,
}

#[derive(Debug, Clone, PartialEq)]
enum NameTest {
    Any,
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    Position(usize),
    HasAttribute(String),
    AttributeEquals { name: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    name: NameTest,
    predicates: Vec<Predicate>,
}

/// A parsed location path
#[derive(Debug, Clone, PartialEq)]
pub struct XPathExpression {
    steps: Vec<Step>,
}

impl XPathExpression {
    /// Parse an absolute location path
    pub fn parse(expression: &str) -> Result<Self, LocatorError> {
        PathParser::new(expression)
            .parse()
            .map_err(|reason| LocatorError::InvalidXPath {
                expression: expression.to_string(),
                reason,
            })
    }

    /// All selected nodes in document order
    pub fn select(&self, document: &Document) -> Vec<NodeId> {
        let mut context = vec![document.root()];
        for step in &self.steps {
            let mut next = Vec::new();
            let mut seen = HashSet::new();
            for node in context {
                let origins = match step.axis {
                    Axis::Child => vec![node],
                    Axis::DescendantOrSelfChild => {
                        let mut all = vec![node];
                        all.extend(
                            document
                                .descendants(node)
                                .into_iter()
                                .filter(|n| document.is_element(*n)),
                        );
                        all
                    }
                };
                for origin in origins {
                    for candidate in step.apply(document, origin) {
                        if seen.insert(candidate) {
                            next.push(candidate);
                        }
                    }
                }
            }
            context = next;
        }

        let order: HashMap<NodeId, usize> = document
            .descendants(document.root())
            .into_iter()
            .enumerate()
            .map(|(position, node)| (node, position))
            .collect();
        context.sort_by_key(|n| order.get(n).copied().unwrap_or(usize::MAX));
        context
    }

    /// First selected node in document order (`FIRST_ORDERED_NODE_TYPE`)
    pub fn first_node(&self, document: &Document) -> Option<NodeId> {
        self.select(document).into_iter().next()
    }
}

impl Step {
    /// Children of `origin` selected by this step's name test and predicates
    fn apply(&self, document: &Document, origin: NodeId) -> Vec<NodeId> {
        let mut candidates: Vec<NodeId> = document
            .element_children(origin)
            .into_iter()
            .filter(|child| match &self.name {
                NameTest::Any => true,
                NameTest::Name(name) => document
                    .tag_name(*child)
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(name)),
            })
            .collect();

        for predicate in &self.predicates {
            candidates = match predicate {
                Predicate::Position(position) => candidates
                    .get(position - 1)
                    .copied()
                    .into_iter()
                    .collect(),
                Predicate::HasAttribute(name) => candidates
                    .into_iter()
                    .filter(|c| document.has_attribute(*c, name))
                    .collect(),
                Predicate::AttributeEquals { name, value } => candidates
                    .into_iter()
                    .filter(|c| document.attribute(*c, name) == Some(value.as_str()))
                    .collect(),
            };
        }
        candidates
    }
}

struct PathParser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> PathParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<XPathExpression, String> {
        if self.source.trim().is_empty() {
            return Err("empty expression".into());
        }
        self.skip_whitespace();
        let mut steps = Vec::new();
        while self.chars.peek().is_some() {
            if !self.eat('/') {
                return Err(format!("expected '/' at offset {}", self.offset()));
            }
            let axis = if self.eat('/') {
                Axis::DescendantOrSelfChild
            } else {
                Axis::Child
            };
            steps.push(self.parse_step(axis)?);
            self.skip_whitespace();
        }
        Ok(XPathExpression { steps })
    }

    fn parse_step(&mut self, axis: Axis) -> Result<Step, String> {
        self.skip_whitespace();
        let name = if self.eat('*') {
            NameTest::Any
        } else {
            NameTest::Name(self.parse_name()?)
        };
        let mut predicates = Vec::new();
        self.skip_whitespace();
        while self.eat('[') {
            predicates.push(self.parse_predicate()?);
            self.skip_whitespace();
        }
        Ok(Step {
            axis,
            name,
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate, String> {
        self.skip_whitespace();
        let predicate = if self.eat('@') {
            let name = self.parse_name()?;
            self.skip_whitespace();
            if self.eat('=') {
                self.skip_whitespace();
                let value = self.parse_literal()?;
                Predicate::AttributeEquals { name, value }
            } else {
                Predicate::HasAttribute(name)
            }
        } else {
            let digits = self.take_while(|c| c.is_ascii_digit());
            match digits.parse::<usize>() {
                Ok(position) if position > 0 => Predicate::Position(position),
                _ => return Err(format!("unsupported predicate at offset {}", self.offset())),
            }
        };
        self.skip_whitespace();
        if !self.eat(']') {
            return Err(format!("expected ']' at offset {}", self.offset()));
        }
        Ok(predicate)
    }

    fn parse_name(&mut self) -> Result<String, String> {
        let start = self.offset();
        let name = self.take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'));
        match name.chars().next() {
            Some(first) if first.is_alphabetic() || first == '_' => Ok(name),
            _ => Err(format!("expected a name at offset {start}")),
        }
    }

    fn parse_literal(&mut self) -> Result<String, String> {
        let quote = match self.chars.next() {
            Some((_, q @ ('"' | '\''))) => q,
            _ => return Err(format!("expected a string literal at offset {}", self.offset())),
        };
        let value = self.take_while(|c| c != quote);
        if !self.eat(quote) {
            return Err("unterminated string literal".into());
        }
        Ok(value)
    }

    fn take_while(&mut self, mut keep: impl FnMut(char) -> bool) -> String {
        let mut out = String::new();
        while let Some((_, c)) = self.chars.peek().copied() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.chars.peek().is_some_and(|(_, c)| *c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse_html(
            r#"<body>
                <div><p>one</p></div>
                <div>
                    <p>two</p>
                    <input name="q" placeholder="Search">
                    <p>three</p>
                </div>
            </body>"#,
        )
        .unwrap()
    }

    fn text_at(doc: &Document, expression: &str) -> Option<String> {
        doc.evaluate_xpath(expression)
            .unwrap()
            .map(|n| doc.text_content(n))
    }

    #[test]
    fn test_positional_steps() {
        let doc = doc();
        assert_eq!(text_at(&doc, "/html/body/div[2]/p[2]").as_deref(), Some("three"));
        assert_eq!(text_at(&doc, "/html/body/div/p").as_deref(), Some("one"));
        assert_eq!(text_at(&doc, "/html/body/div[3]"), None);
    }

    #[test]
    fn test_attribute_predicates() {
        let doc = doc();
        let input = doc
            .evaluate_xpath(r#"/html/body/div[2]/input[@name="q"]"#)
            .unwrap()
            .unwrap();
        assert_eq!(doc.tag_name(input), Some("input"));
        assert_eq!(
            doc.evaluate_xpath("/html/body/div[2]/input[@placeholder='Search']").unwrap(),
            Some(input)
        );
        assert_eq!(doc.evaluate_xpath("//input[@name]").unwrap(), Some(input));
        assert_eq!(doc.evaluate_xpath(r#"//input[@name="x"]"#).unwrap(), None);
    }

    #[test]
    fn test_descendant_axis_uses_document_order() {
        let doc = doc();
        assert_eq!(text_at(&doc, "//p").as_deref(), Some("one"));
        assert_eq!(text_at(&doc, "//div/*[3]").as_deref(), Some("three"));
    }

    #[test]
    fn test_invalid_expressions() {
        for bad in ["", "html/body", "/html/body[", "/html/body[0]", r#"//a[@id="x"y"]"#, "/html/!"] {
            assert!(
                matches!(
                    XPathExpression::parse(bad),
                    Err(LocatorError::InvalidXPath { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
