//! Arena-based DOM: the document tree every query resolves against.
//!
//! All nodes live in an `indextree` arena and are addressed by [`NodeId`].
//! A `NodeId` is a non-owning reference: detaching a node from the tree
//! keeps its arena slot alive, so ids held by a
//! [`Selection`](crate::Selection) stay valid to inspect after the tree
//! changes underneath them.
//!
//! Queries never cache. The DOM is mutable, and a stale cache would return
//! wrong answers silently, so every lookup re-walks the live tree.

use html5ever::tendril::StrTendril;
use indexmap::IndexMap;
use indextree::Arena;

use crate::debug;
use crate::events::EventListeners;
use crate::selection::Selection;
use crate::selector::{Context, Selector, SelectorError, resolve};
use crate::serialize::{SerializeOptions, serialize_document};

pub use indextree::NodeId;
use smallvec::SmallVec;

/// Ordered node sequence with inline capacity for typical match sizes.
pub type NodeSeq = SmallVec<[NodeId; 8]>;

/// Document = arena + root + doctype + listener registry.
#[derive(Debug, Clone)]
pub struct Document {
    /// THE tree - all nodes live here
    pub arena: Arena<NodeData>,

    /// Invisible document node, parent of the root element.
    document: NodeId,

    /// Root element (usually `<html>`), or the document node when the
    /// document is empty.
    root: NodeId,

    /// DOCTYPE if present (usually "html")
    pub doctype: Option<StrTendril>,

    /// Listener registry, keyed by node.
    pub(crate) listeners: EventListeners,
}

impl Document {
    /// Create an empty document (a bare document node, no structure).
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let document = arena.new_node(NodeData {
            kind: NodeKind::Document,
            ns: Namespace::Html,
        });
        Document {
            arena,
            document,
            root: document,
            doctype: None,
            listeners: EventListeners::default(),
        }
    }

    pub(crate) fn from_parts(
        arena: Arena<NodeData>,
        document: NodeId,
        doctype: Option<StrTendril>,
    ) -> Self {
        let root = document
            .children(&arena)
            .find(|&id| arena[id].get().is_element())
            .unwrap_or(document);
        Document {
            arena,
            document,
            root,
            doctype,
            listeners: EventListeners::default(),
        }
    }

    /// The invisible document node (parent of the root element).
    pub fn document_node(&self) -> NodeId {
        self.document
    }

    /// The root element, usually `<html>`.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get immutable reference to node data
    pub fn get(&self, id: NodeId) -> &NodeData {
        self.arena[id].get()
    }

    /// Get mutable reference to node data
    pub fn get_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.arena[id].get_mut()
    }

    /// Element data, if `id` is an element node.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).as_element()
    }

    /// Mutable element data, if `id` is an element node.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).as_element_mut()
    }

    /// Tag name, if `id` is an element node.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|elem| elem.tag.as_ref())
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_element()
    }

    /// Parent node of any kind (element or document).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent()
    }

    /// Parent, only when it is an element node.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    /// Iterate children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena)
    }

    /// Iterate element children of a node, skipping text and comments.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.children(&self.arena).filter(|&c| self.is_element(c))
    }

    pub fn has_child_elements(&self, id: NodeId) -> bool {
        self.child_elements(id).next().is_some()
    }

    /// Iterate this node and its ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.ancestors(&self.arena)
    }

    /// Get the `<body>` element if present
    pub fn body(&self) -> Option<NodeId> {
        self.child_elements(self.root)
            .find(|&id| self.tag(id) == Some("body"))
    }

    /// Get the `<head>` element if present
    pub fn head(&self) -> Option<NodeId> {
        self.child_elements(self.root)
            .find(|&id| self.tag(id) == Some("head"))
    }

    // ------------------------------------------------------------------
    // Query capability surface
    // ------------------------------------------------------------------

    /// Id lookup. Always document-scoped: ids are unique per document, so
    /// `#id` resolves against the whole document even when a narrower
    /// context is in play.
    pub fn by_id(&self, name: &str) -> Option<NodeId> {
        self.document
            .descendants(&self.arena)
            .skip(1)
            .find(|&id| self.element(id).is_some_and(|elem| elem.attr("id") == Some(name)))
    }

    /// All descendant elements of `context` with the given tag name, in
    /// document order. The context itself is never part of the result.
    pub fn by_tag_name(&self, context: NodeId, tag: &str) -> NodeSeq {
        context
            .descendants(&self.arena)
            .skip(1)
            .filter(|&id| self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
            .collect()
    }

    /// All descendant elements of `context` carrying `class`, in document
    /// order. Hand-rolled walk with an explicit work list; children are
    /// pushed in reverse so nodes come off in tree order.
    pub fn by_class_name(&self, context: NodeId, class: &str) -> NodeSeq {
        let mut found = NodeSeq::new();
        let mut work: Vec<NodeId> = context.reverse_children(&self.arena).collect();
        while let Some(id) = work.pop() {
            if self.element(id).is_some_and(|elem| elem.has_class(class)) {
                found.push(id);
            }
            work.extend(id.reverse_children(&self.arena));
        }
        found
    }

    /// Single-element match test against a selector string. An unparseable
    /// selector matches nothing.
    pub fn matches(&self, id: NodeId, selector: &str) -> bool {
        Selector::parse(selector).is_ok_and(|sel| sel.matches(self, id))
    }

    /// Resolve a selector against the whole document.
    ///
    /// Unsupported selector shapes yield an empty selection; use
    /// [`Document::try_select`] for the typed error.
    pub fn select(&self, selector: &str) -> Selection {
        self.select_in(selector, Context::Document)
    }

    /// Resolve a selector within a context: the document, an element, or
    /// another selector string whose first match becomes the context.
    pub fn select_in<'a>(&self, selector: &str, context: impl Into<Context<'a>>) -> Selection {
        match self.try_select_in(selector, context) {
            Ok(selection) => selection,
            Err(err) => {
                debug!("select: {err}");
                Selection::new()
            }
        }
    }

    /// Fallible form of [`Document::select`].
    pub fn try_select(&self, selector: &str) -> Result<Selection, SelectorError> {
        self.try_select_in(selector, Context::Document)
    }

    /// Fallible form of [`Document::select_in`]. A context that resolves to
    /// zero elements is not an error; the result is simply empty.
    pub fn try_select_in<'a>(
        &self,
        selector: &str,
        context: impl Into<Context<'a>>,
    ) -> Result<Selection, SelectorError> {
        let parsed = Selector::parse(selector)?;
        let Some(ctx) = self.resolve_context(context.into()) else {
            return Ok(Selection::new());
        };
        Ok(Selection::from_seq(resolve(self, &parsed, ctx)))
    }

    fn resolve_context(&self, context: Context<'_>) -> Option<NodeId> {
        match context {
            Context::Document => Some(self.document),
            Context::Node(id) => Some(id),
            Context::Selector(selector) => {
                let parsed = Selector::parse(selector).ok()?;
                resolve(self, &parsed, self.document).first().copied()
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutation primitives
    // ------------------------------------------------------------------

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Element(ElementData::new(tag)),
            ns: Namespace::Html,
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(NodeData {
            kind: NodeKind::Text(StrTendril::from(text)),
            ns: Namespace::Html,
        })
    }

    /// Append `child` as the last child of `parent`, detaching it from any
    /// previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        parent.append(child, &mut self.arena);
    }

    /// Insert `child` as the first child of `parent`.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        parent.prepend(child, &mut self.arena);
    }

    /// Insert `new` immediately before `sibling`.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        sibling.insert_before(new, &mut self.arena);
    }

    /// Detach a node (and its subtree) from the tree. The arena slot stays
    /// alive, so existing ids remain valid to inspect.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Detach every child of `id`.
    pub fn remove_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            child.detach(&mut self.arena);
        }
    }

    /// Deep-copy a subtree within this arena. Returns the detached copy.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let copy = self.arena.new_node(self.get(id).clone());
        let children: Vec<NodeId> = id.children(&self.arena).collect();
        for child in children {
            let child_copy = self.clone_subtree(child);
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }

    /// Deep-copy a subtree out of another document into this arena.
    /// Returns the detached copy.
    pub fn adopt_subtree(&mut self, other: &Document, node: NodeId) -> NodeId {
        let copy = self.arena.new_node(other.get(node).clone());
        for child in node.children(&other.arena) {
            let child_copy = self.adopt_subtree(other, child);
            copy.append(child_copy, &mut self.arena);
        }
        copy
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.remove_children(id);
        let t = self.create_text(text);
        self.append_child(id, t);
    }

    /// Concatenated text of this node and all descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in id.descendants(&self.arena) {
            if let NodeKind::Text(text) = &self.get(node).kind {
                out.push_str(text.as_ref());
            }
        }
        out
    }

    /// Serialize to HTML string (whole document, doctype included).
    pub fn to_html(&self) -> String {
        serialize_document(self, &SerializeOptions::default())
    }

    // ------------------------------------------------------------------
    // Attributes, classes, inline style
    // ------------------------------------------------------------------

    /// Attribute value, if `id` is an element carrying the attribute.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    /// Set an attribute; a no-op on non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(elem) = self.element_mut(id) {
            elem.set_attr(name, value);
        }
    }

    /// Remove an attribute. Returns the old value if it existed.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<StrTendril> {
        self.element_mut(id)?.remove_attr(name)
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|elem| elem.has_class(class))
    }

    /// Add a class token unless already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let Some(elem) = self.element_mut(id) else {
            return;
        };
        if elem.has_class(class) {
            return;
        }
        let mut value = elem.attr("class").unwrap_or_default().to_string();
        if !value.is_empty() {
            value.push(' ');
        }
        value.push_str(class);
        elem.set_attr("class", &value);
    }

    /// Remove a class token; the rest of the class string is preserved.
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let Some(elem) = self.element_mut(id) else {
            return;
        };
        let Some(current) = elem.attr("class") else {
            return;
        };
        let value = current
            .split_ascii_whitespace()
            .filter(|token| *token != class)
            .collect::<Vec<_>>()
            .join(" ");
        elem.set_attr("class", &value);
    }

    pub fn toggle_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            self.remove_class(id, class);
        } else {
            self.add_class(id, class);
        }
    }

    /// Inline style declaration value from the `style` attribute.
    /// Computed style does not exist here; there is no layout engine.
    pub fn style(&self, id: NodeId, name: &str) -> Option<String> {
        let style = self.attr(id, "style")?;
        for decl in style.split(';') {
            if let Some((key, value)) = decl.split_once(':')
                && key.trim().eq_ignore_ascii_case(name)
            {
                return Some(value.trim().to_string());
            }
        }
        None
    }

    /// Set an inline style declaration, preserving declaration order.
    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) {
        if !self.is_element(id) {
            return;
        }
        let mut decls: Vec<(String, String)> = Vec::new();
        if let Some(style) = self.attr(id, "style") {
            for decl in style.split(';') {
                if let Some((key, val)) = decl.split_once(':') {
                    decls.push((key.trim().to_string(), val.trim().to_string()));
                }
            }
        }
        match decls.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some((_, val)) => *val = value.to_string(),
            None => decls.push((name.to_string(), value.to_string())),
        }
        let style = decls
            .iter()
            .map(|(key, val)| format!("{key}: {val}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.set_attr(id, "style", &style);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// What goes in each arena slot
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    pub ns: Namespace,
}

impl NodeData {
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text.as_ref()),
            _ => None,
        }
    }
}

/// Node types
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Document root (invisible, parent of `<html>`)
    Document,
    /// Element with tag and attributes
    Element(ElementData),
    /// Text content (StrTendril is refcounted - cheap to clone)
    Text(StrTendril),
    /// HTML comment
    Comment(StrTendril),
}

/// Element data (tag + attributes)
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Tag name (StrTendril shares buffer with source via refcounting)
    pub tag: StrTendril,

    /// Attributes - keys are String, values are StrTendril.
    /// IndexMap preserves insertion order for consistent serialization.
    pub attrs: IndexMap<String, StrTendril>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        ElementData {
            tag: StrTendril::from(tag),
            attrs: IndexMap::new(),
        }
    }

    /// Get an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|value| value.as_ref())
    }

    /// Set an attribute value, replacing any existing one.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attrs.insert(name.to_string(), StrTendril::from(value));
    }

    /// Remove an attribute by name. Returns the old value if it existed.
    pub fn remove_attr(&mut self, name: &str) -> Option<StrTendril> {
        self.attrs.shift_remove(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Class tokens from the `class` attribute, in order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|token| token == class)
    }
}

/// XML namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn from_url(url: &str) -> Self {
        match url {
            "http://www.w3.org/1999/xhtml" => Namespace::Html,
            "http://www.w3.org/2000/svg" => Namespace::Svg,
            "http://www.w3.org/1998/Math/MathML" => Namespace::MathMl,
            _ => Namespace::Html, // default
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_by_id_is_document_scoped() {
        let doc = parse(r#"<html><body><div id="a"><p id="b"></p></div></body></html>"#);
        let b = doc.by_id("b").expect("should find #b");
        assert_eq!(doc.tag(b), Some("p"));
        assert!(doc.by_id("missing").is_none());
    }

    #[test]
    fn test_by_tag_name_document_order() {
        let doc = parse("<html><body><ul><li>1</li><li>2</li></ul><li>3</li></body></html>");
        let body = doc.body().unwrap();
        let items = doc.by_tag_name(body, "li");
        assert_eq!(items.len(), 3);
        let texts: Vec<String> = items.iter().map(|&id| doc.text_content(id)).collect();
        assert_eq!(texts, ["1", "2", "3"]);
    }

    #[test]
    fn test_by_class_name_walks_in_tree_order() {
        let doc = parse(
            r#"<html><body>
                <div class="pick"><span class="pick">inner</span></div>
                <p class="pick">later</p>
            </body></html>"#,
        );
        let body = doc.body().unwrap();
        let picks = doc.by_class_name(body, "pick");
        let tags: Vec<&str> = picks.iter().map(|&id| doc.tag(id).unwrap()).collect();
        assert_eq!(tags, ["div", "span", "p"]);
    }

    #[test]
    fn test_context_is_excluded_from_its_own_results() {
        let doc = parse(r#"<html><body><div class="x"><div class="x"></div></div></body></html>"#);
        let outer = doc.select(".x").get(0).unwrap();
        assert_eq!(doc.by_class_name(outer, "x").len(), 1);
        assert_eq!(doc.by_tag_name(outer, "div").len(), 1);
    }

    #[test]
    fn test_class_mutation() {
        let mut doc = parse(r#"<html><body><p class="one two"></p></body></html>"#);
        let p = doc.select("p").get(0).unwrap();

        doc.add_class(p, "three");
        assert_eq!(doc.attr(p, "class"), Some("one two three"));

        // adding an existing token is a no-op
        doc.add_class(p, "two");
        assert_eq!(doc.attr(p, "class"), Some("one two three"));

        doc.remove_class(p, "two");
        assert_eq!(doc.attr(p, "class"), Some("one three"));

        doc.toggle_class(p, "one");
        doc.toggle_class(p, "four");
        assert_eq!(doc.attr(p, "class"), Some("three four"));
    }

    #[test]
    fn test_inline_style() {
        let mut doc = parse(r#"<html><body><p style="color: red; margin: 0"></p></body></html>"#);
        let p = doc.select("p").get(0).unwrap();

        assert_eq!(doc.style(p, "color").as_deref(), Some("red"));
        assert_eq!(doc.style(p, "display"), None);

        doc.set_style(p, "color", "blue");
        doc.set_style(p, "display", "none");
        assert_eq!(
            doc.attr(p, "style"),
            Some("color: blue; margin: 0; display: none")
        );
    }

    #[test]
    fn test_clone_subtree_is_deep_and_detached() {
        let mut doc = parse(r#"<html><body><div id="d"><span>text</span></div></body></html>"#);
        let div = doc.by_id("d").unwrap();
        let copy = doc.clone_subtree(div);

        assert!(doc.parent(copy).is_none());
        assert_eq!(doc.text_content(copy), "text");
        // the copy is independent of the original
        doc.set_text(copy, "changed");
        assert_eq!(doc.text_content(div), "text");
    }

    #[test]
    fn test_detached_ids_stay_inspectable() {
        let mut doc = parse("<html><body><p>gone</p></body></html>");
        let p = doc.select("p").get(0).unwrap();
        doc.detach(p);

        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.text_content(p), "gone");
        // but it is no longer reachable from the document
        assert_eq!(doc.select("p").size(), 0);
    }

    #[test]
    fn test_programmatic_building() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.append_child(doc.document_node(), div);
        let span = doc.create_element("span");
        doc.append_child(div, span);
        doc.set_text(span, "hi");

        assert_eq!(doc.select("span").size(), 1);
        assert_eq!(doc.text_content(div), "hi");
    }
}
