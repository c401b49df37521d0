//! Selector descriptors and resolution.
//!
//! The grammar is deliberately tiny - four shapes, tried in order:
//!
//! 1. `#identifier` - id lookup, always document-scoped
//! 2. `tagname` - descendant elements by tag
//! 3. `.classname` - descendant elements by class
//! 4. `tagname.classname` - class lookup filtered by tag
//!
//! Anything else is [`SelectorError::Unsupported`]. There is no general
//! selector engine to fall back to here, so the infallible entry points
//! treat unsupported shapes as matching nothing.
//!
//! Results are always in document (tree) order and are re-derived from the
//! live tree on every call.

use thiserror::Error;

use crate::debug;
use crate::dom::{Document, NodeId, NodeSeq};

/// Parsed shape of a selector string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `#name` - unique id lookup
    Id(String),
    /// `tag` - by tag name (stored lowercase)
    Tag(String),
    /// `.name` - by class
    Class(String),
    /// `tag.name` - class lookup filtered by tag
    TagClass(String, String),
}

/// Why a selector string failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unsupported selector `{0}`")]
    Unsupported(String),
}

impl Selector {
    /// Parse a selector string against the four-shape grammar.
    ///
    /// Tag names are `[A-Za-z0-9_]`; id and class names additionally allow
    /// `-`. Tag comparison is case-insensitive, so the tag is lowercased
    /// here, once.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }
        if let Some(name) = input.strip_prefix('#') {
            return if is_name(name) {
                Ok(Selector::Id(name.to_string()))
            } else {
                Err(SelectorError::Unsupported(input.to_string()))
            };
        }
        if let Some(class) = input.strip_prefix('.') {
            return if is_name(class) {
                Ok(Selector::Class(class.to_string()))
            } else {
                Err(SelectorError::Unsupported(input.to_string()))
            };
        }
        if let Some((tag, class)) = input.split_once('.') {
            return if is_word(tag) && is_name(class) {
                Ok(Selector::TagClass(tag.to_ascii_lowercase(), class.to_string()))
            } else {
                Err(SelectorError::Unsupported(input.to_string()))
            };
        }
        if is_word(input) {
            Ok(Selector::Tag(input.to_ascii_lowercase()))
        } else {
            Err(SelectorError::Unsupported(input.to_string()))
        }
    }

    /// Test a single element against this selector.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(elem) = doc.element(id) else {
            return false;
        };
        match self {
            Selector::Id(name) => elem.attr("id") == Some(name.as_str()),
            Selector::Tag(tag) => elem.tag.as_ref().eq_ignore_ascii_case(tag),
            Selector::Class(class) => elem.has_class(class),
            Selector::TagClass(tag, class) => {
                elem.tag.as_ref().eq_ignore_ascii_case(tag) && elem.has_class(class)
            }
        }
    }
}

impl std::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Resolve a parsed selector to the matching elements under `context`, in
/// document order.
///
/// Id lookup ignores the context: ids are document-unique and the platform
/// quirk of resolving `#id` document-wide is preserved on purpose.
pub fn resolve(doc: &Document, selector: &Selector, context: NodeId) -> NodeSeq {
    let found = match selector {
        Selector::Id(name) => doc.by_id(name).into_iter().collect(),
        Selector::Tag(tag) => doc.by_tag_name(context, tag),
        Selector::Class(class) => doc.by_class_name(context, class),
        Selector::TagClass(tag, class) => doc
            .by_class_name(context, class)
            .into_iter()
            .filter(|&id| doc.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect(),
    };
    debug!("resolve: {selector:?} matched {} node(s)", found.len());
    found
}

/// Scope a resolution runs under.
#[derive(Debug, Clone, Copy, Default)]
pub enum Context<'a> {
    /// The whole document.
    #[default]
    Document,
    /// A specific node.
    Node(NodeId),
    /// A selector whose first match becomes the context. Zero matches make
    /// the outer resolution trivially empty.
    Selector(&'a str),
}

impl From<NodeId> for Context<'_> {
    fn from(id: NodeId) -> Self {
        Context::Node(id)
    }
}

impl<'a> From<&'a str> for Context<'a> {
    fn from(selector: &'a str) -> Self {
        Context::Selector(selector)
    }
}

/// A membership test: a selector string, a specific node tested by
/// identity, or "any element" (the no-query form of `is`).
#[derive(Debug, Clone, Copy)]
pub enum Matcher<'a> {
    Selector(&'a str),
    Node(NodeId),
    Any,
}

impl<'a> From<&'a str> for Matcher<'a> {
    fn from(selector: &'a str) -> Self {
        Matcher::Selector(selector)
    }
}

impl From<NodeId> for Matcher<'_> {
    fn from(id: NodeId) -> Self {
        Matcher::Node(id)
    }
}

impl From<()> for Matcher<'_> {
    fn from(_: ()) -> Self {
        Matcher::Any
    }
}

impl Matcher<'_> {
    /// Test a single element. Parses the selector on each call; loops
    /// should go through [`Matcher::compile`] instead.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.compile().matches(doc, id)
    }

    /// Parse the selector once, for repeated membership tests.
    pub(crate) fn compile(self) -> Compiled {
        match self {
            Matcher::Selector(selector) => match Selector::parse(selector) {
                Ok(parsed) => Compiled::Selector(parsed),
                Err(err) => {
                    debug!("matcher: {err}");
                    Compiled::Never
                }
            },
            Matcher::Node(id) => Compiled::Node(id),
            Matcher::Any => Compiled::Any,
        }
    }
}

pub(crate) enum Compiled {
    Selector(Selector),
    Node(NodeId),
    Any,
    /// An unsupported selector matches nothing, consistently.
    Never,
}

impl Compiled {
    pub(crate) fn matches(&self, doc: &Document, id: NodeId) -> bool {
        match self {
            Compiled::Selector(selector) => selector.matches(doc, id),
            Compiled::Node(node) => *node == id,
            Compiled::Any => doc.is_element(id),
            Compiled::Never => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(Selector::parse("#list"), Ok(Selector::Id("list".into())));
        assert_eq!(Selector::parse("li"), Ok(Selector::Tag("li".into())));
        assert_eq!(Selector::parse(".ticket"), Ok(Selector::Class("ticket".into())));
        assert_eq!(
            Selector::parse("span.ticket"),
            Ok(Selector::TagClass("span".into(), "ticket".into()))
        );
        // tags compare case-insensitively, normalized at parse time
        assert_eq!(Selector::parse("DIV"), Ok(Selector::Tag("div".into())));
        // names may carry dashes
        assert_eq!(
            Selector::parse("#main-nav"),
            Ok(Selector::Id("main-nav".into()))
        );
    }

    #[test]
    fn test_parse_rejects_out_of_grammar_shapes() {
        assert_eq!(Selector::parse(""), Err(SelectorError::Empty));
        assert_eq!(Selector::parse("   "), Err(SelectorError::Empty));
        for bad in ["ul > li", "a[href]", "p:first-child", ".a.b", "#", ".", "di v"] {
            assert!(
                matches!(Selector::parse(bad), Err(SelectorError::Unsupported(_))),
                "expected {bad:?} to be unsupported"
            );
        }
    }

    #[test]
    fn test_resolve_in_context() {
        let doc = parse(
            r#"<html><body>
                <ul id="list"><li>1</li><li>2</li></ul>
                <ol><li>3</li></ol>
            </body></html>"#,
        );
        let list = doc.by_id("list").unwrap();
        let in_list = resolve(&doc, &Selector::parse("li").unwrap(), list);
        assert_eq!(in_list.len(), 2);

        let body = doc.body().unwrap();
        let all = resolve(&doc, &Selector::parse("li").unwrap(), body);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_id_resolution_ignores_context() {
        let doc = parse(r#"<html><body><div id="a"></div><section></section></body></html>"#);
        let section = doc.select("section").get(0).unwrap();
        let found = resolve(&doc, &Selector::parse("#a").unwrap(), section);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_tag_class_intersection() {
        let doc = parse(
            r#"<html><body>
                <span class="ticket"></span>
                <div class="ticket"></div>
                <span class="other"></span>
            </body></html>"#,
        );
        let body = doc.body().unwrap();
        let found = resolve(&doc, &Selector::parse("span.ticket").unwrap(), body);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.tag(found[0]), Some("span"));
    }

    #[test]
    fn test_matches() {
        let doc = parse(r#"<html><body><span id="s" class="ticket active"></span></body></html>"#);
        let span = doc.by_id("s").unwrap();
        assert!(doc.matches(span, "span"));
        assert!(doc.matches(span, "SPAN"));
        assert!(doc.matches(span, ".active"));
        assert!(doc.matches(span, "#s"));
        assert!(doc.matches(span, "span.ticket"));
        assert!(!doc.matches(span, "div.ticket"));
        assert!(!doc.matches(span, ".pink"));
        // out-of-grammar query matches nothing
        assert!(!doc.matches(span, "span[id]"));
    }

    #[test]
    fn test_matcher_forms() {
        let doc = parse(r#"<html><body><p class="text"></p></body></html>"#);
        let p = doc.select("p").get(0).unwrap();
        assert!(Matcher::from(".text").matches(&doc, p));
        assert!(Matcher::from(p).matches(&doc, p));
        assert!(Matcher::from(()).matches(&doc, p));
        assert!(!Matcher::from(".other").matches(&doc, p));
    }
}
