//! CSS selector parsing and matching using cssparser
//!
//! Covers the selector shapes locators and the interactive-element resolver
//! produce: type, `#id`, `.class`, attribute presence/equality, `:not()`,
//! `:nth-of-type(n)`, the child and descendant combinators, and selector lists.

use super::{Document, NodeId};
use crate::utils::LocatorError;
use cssparser::{ParseError, Parser, ParserInput, Token};

/// Custom parse failures
#[derive(Debug, Clone, PartialEq)]
enum SelectorErrorKind {
    EmptyCompound,
    UnsupportedPseudo(String),
    DanglingCombinator,
}

type ParseResult<'i, T> = Result<T, ParseError<'i, SelectorErrorKind>>;

/// Relation of a compound selector to the one on its left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Attribute test inside `[...]`
#[derive(Debug, Clone, PartialEq)]
struct AttributeSelector {
    name: String,
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum PseudoClass {
    NthOfType(i32),
    Not(Box<Compound>),
}

/// A sequence of simple selectors with no combinator
#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
    pseudo_classes: Vec<PseudoClass>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    /// Left to right; the first combinator is unused
    parts: Vec<(Combinator, Compound)>,
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse a selector list
    pub fn parse(selector: &str) -> Result<Self, LocatorError> {
        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);
        parser
            .parse_comma_separated(|p| parse_complex(p))
            .map(|selectors| Self { selectors })
            .map_err(|e| LocatorError::InvalidSelector {
                selector: selector.to_string(),
                reason: format!("{:?}", e.kind),
            })
    }

    /// Whether an element matches any selector in the list
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        document.is_element(node)
            && self
                .selectors
                .iter()
                .any(|s| matches_complex(document, node, &s.parts))
    }
}

fn parse_complex<'i, 't>(p: &mut Parser<'i, 't>) -> ParseResult<'i, ComplexSelector> {
    p.skip_whitespace();
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    loop {
        let compound = parse_compound(p)?;
        parts.push((combinator, compound));

        let mut saw_whitespace = false;
        loop {
            let state = p.state();
            let token = match p.next_including_whitespace() {
                Ok(token) => token.clone(),
                Err(_) => return Ok(ComplexSelector { parts }),
            };
            match token {
                Token::WhiteSpace(_) => saw_whitespace = true,
                Token::Delim('>') => {
                    combinator = Combinator::Child;
                    p.skip_whitespace();
                    if p.is_exhausted() {
                        return Err(p.new_custom_error(SelectorErrorKind::DanglingCombinator));
                    }
                    break;
                }
                _ if saw_whitespace => {
                    p.reset(&state);
                    combinator = Combinator::Descendant;
                    break;
                }
                other => return Err(p.new_unexpected_token_error(other)),
            }
        }
    }
}

fn parse_compound<'i, 't>(p: &mut Parser<'i, 't>) -> ParseResult<'i, Compound> {
    let mut compound = Compound::default();
    let mut any = false;

    let state = p.state();
    match p.next_including_whitespace().map(|t| t.clone()) {
        Ok(Token::Ident(name)) => {
            compound.tag = Some(name.to_ascii_lowercase());
            any = true;
        }
        Ok(Token::Delim('*')) => any = true,
        _ => p.reset(&state),
    }

    loop {
        let state = p.state();
        let token = match p.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };
        match token {
            Token::IDHash(id) | Token::Hash(id) => {
                let id: &str = &id;
                compound.ids.push(id.to_string());
            }
            Token::Delim('.') => {
                let class: &str = p.expect_ident()?;
                compound.classes.push(class.to_string());
            }
            Token::SquareBracketBlock => {
                let attribute = p.parse_nested_block(|p| parse_attribute(p))?;
                compound.attributes.push(attribute);
            }
            Token::Colon => {
                let pseudo = parse_pseudo_class(p)?;
                compound.pseudo_classes.push(pseudo);
            }
            _ => {
                p.reset(&state);
                break;
            }
        }
        any = true;
    }

    if any {
        Ok(compound)
    } else {
        Err(p.new_custom_error(SelectorErrorKind::EmptyCompound))
    }
}

fn parse_attribute<'i, 't>(p: &mut Parser<'i, 't>) -> ParseResult<'i, AttributeSelector> {
    let name = p.expect_ident()?.to_ascii_lowercase();
    if p.is_exhausted() {
        return Ok(AttributeSelector { name, value: None });
    }
    p.expect_delim('=')?;
    let value: &str = p.expect_ident_or_string()?;
    let value = value.to_string();
    p.expect_exhausted()?;
    Ok(AttributeSelector {
        name,
        value: Some(value),
    })
}

fn parse_pseudo_class<'i, 't>(p: &mut Parser<'i, 't>) -> ParseResult<'i, PseudoClass> {
    let token = p.next_including_whitespace()?.clone();
    match token {
        Token::Function(name) if name.eq_ignore_ascii_case("nth-of-type") => {
            let n = p.parse_nested_block(|p| -> ParseResult<'i, i32> {
                let n = p.expect_integer()?;
                p.expect_exhausted()?;
                Ok(n)
            })?;
            Ok(PseudoClass::NthOfType(n))
        }
        Token::Function(name) if name.eq_ignore_ascii_case("not") => {
            let inner = p.parse_nested_block(|p| {
                p.skip_whitespace();
                let compound = parse_compound(p)?;
                p.expect_exhausted()?;
                Ok(compound)
            })?;
            Ok(PseudoClass::Not(Box::new(inner)))
        }
        Token::Function(name) | Token::Ident(name) => {
            let name: &str = &name;
            Err(p.new_custom_error(SelectorErrorKind::UnsupportedPseudo(name.to_string())))
        }
        other => Err(p.new_unexpected_token_error(other)),
    }
}

fn matches_complex(document: &Document, node: NodeId, parts: &[(Combinator, Compound)]) -> bool {
    let Some(((combinator, compound), rest)) = parts.split_last() else {
        return false;
    };
    if !matches_compound(document, node, compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => document
            .parent_element(node)
            .is_some_and(|parent| matches_complex(document, parent, rest)),
        Combinator::Descendant => {
            let mut cursor = document.parent_element(node);
            while let Some(ancestor) = cursor {
                if matches_complex(document, ancestor, rest) {
                    return true;
                }
                cursor = document.parent_element(ancestor);
            }
            false
        }
    }
}

fn matches_compound(document: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(element) = document.element(node) else {
        return false;
    };
    if let Some(tag) = &compound.tag {
        if !element.tag_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if !compound
        .ids
        .iter()
        .all(|id| element.get_attribute("id") == Some(id.as_str()))
    {
        return false;
    }
    if !compound.classes.is_empty() {
        let classes: Vec<&str> = element
            .get_attribute("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default();
        if !compound.classes.iter().all(|c| classes.contains(&c.as_str())) {
            return false;
        }
    }
    let attributes_match = compound.attributes.iter().all(|attr| {
        match (element.get_attribute(&attr.name), &attr.value) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        }
    });
    if !attributes_match {
        return false;
    }
    compound.pseudo_classes.iter().all(|pseudo| match pseudo {
        PseudoClass::NthOfType(n) => {
            usize::try_from(*n).is_ok_and(|n| n == document.position_among_type(node))
        }
        PseudoClass::Not(inner) => !matches_compound(document, node, inner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::parse_html(
            r#"<body>
                <form class="login wide">
                    <input type="hidden" name="csrf">
                    <input name="user">
                    <input data-x="1" name="pass">
                </form>
                <div><span>a</span><span id="s2">b</span><span>c</span></div>
                <div id="1st">digit id</div>
            </body>"#,
        )
        .unwrap()
    }

    fn first(doc: &Document, selector: &str) -> Option<NodeId> {
        doc.query_selector(selector).unwrap()
    }

    #[test]
    fn test_not_hidden_input() {
        let doc = doc();
        let input = first(&doc, r#"input:not([type="hidden"])"#).unwrap();
        assert_eq!(doc.attribute(input, "name"), Some("user"));
    }

    #[test]
    fn test_child_combinator_with_nth_of_type() {
        let doc = doc();
        let span = first(&doc, "html > body > div > span:nth-of-type(3)").unwrap();
        assert_eq!(doc.text_content(span), "c");
        assert!(first(&doc, "body > span").is_none());
    }

    #[test]
    fn test_descendant_and_class() {
        let doc = doc();
        let input = first(&doc, "form.login input[data-x]").unwrap();
        assert_eq!(doc.attribute(input, "name"), Some("pass"));
    }

    #[test]
    fn test_escaped_id() {
        let doc = doc();
        let div = first(&doc, r"#\31 st").unwrap();
        assert_eq!(doc.text_content(div), "digit id");
    }

    #[test]
    fn test_selector_list_returns_document_order() {
        let doc = doc();
        let node = first(&doc, "span, input").unwrap();
        assert_eq!(doc.tag_name(node), Some("input"));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "div >", "input:hover", "[", "a >> b"] {
            assert!(
                matches!(SelectorList::parse(bad), Err(LocatorError::InvalidSelector { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
