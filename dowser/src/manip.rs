//! Manipulation helpers over the selection: content, attributes, classes,
//! inline style, and structural edits.
//!
//! These are thin pass-throughs to the [`Document`] primitives, applied to
//! every member (writes) or to the first member (reads). All of them are
//! silent no-ops on an empty set.

use crate::dom::{Document, NodeId};
use crate::parser::parse;
use crate::selection::Selection;
use crate::serialize::serialize_children;

impl Selection {
    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Concatenated descendant text of the first member.
    pub fn text(&self, doc: &Document) -> Option<String> {
        self.get(0).map(|id| doc.text_content(id))
    }

    /// Replace every member's children with a single text node.
    pub fn set_text(&self, doc: &mut Document, value: &str) -> &Self {
        for id in self.iter() {
            doc.set_text(id, value);
        }
        self
    }

    /// Serialized children of the first member.
    pub fn inner_html(&self, doc: &Document) -> Option<String> {
        self.get(0).map(|id| serialize_children(doc, id))
    }

    /// Parse an HTML fragment and replace every member's children with a
    /// copy of it. The fragment goes through the full tree builder, so
    /// context-sensitive content (table parts, etc.) follows body rules.
    pub fn set_html(&self, doc: &mut Document, html: &str) -> &Self {
        if self.is_empty() {
            return self;
        }
        let fragment = parse(html);
        let Some(body) = fragment.body() else {
            return self;
        };
        let pieces: Vec<NodeId> = fragment.children(body).collect();
        for id in self.iter() {
            doc.remove_children(id);
            for &piece in &pieces {
                let copy = doc.adopt_subtree(&fragment, piece);
                doc.append_child(id, copy);
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Attribute value from the first member.
    pub fn attr(&self, doc: &Document, name: &str) -> Option<String> {
        self.get(0)
            .and_then(|id| doc.attr(id, name).map(str::to_string))
    }

    /// Set an attribute on every member.
    pub fn set_attr(&self, doc: &mut Document, name: &str, value: &str) -> &Self {
        for id in self.iter() {
            doc.set_attr(id, name, value);
        }
        self
    }

    /// Remove an attribute from every member.
    pub fn remove_attr(&self, doc: &mut Document, name: &str) -> &Self {
        for id in self.iter() {
            doc.remove_attr(id, name);
        }
        self
    }

    /// Form control value (the `value` attribute) of the first member.
    pub fn val(&self, doc: &Document) -> Option<String> {
        self.attr(doc, "value")
    }

    /// Set the `value` attribute on every member.
    pub fn set_val(&self, doc: &mut Document, value: &str) -> &Self {
        self.set_attr(doc, "value", value)
    }

    /// `data-*` attribute from the first member.
    pub fn data(&self, doc: &Document, key: &str) -> Option<String> {
        self.attr(doc, &format!("data-{key}"))
    }

    /// Set a `data-*` attribute on every member.
    pub fn set_data(&self, doc: &mut Document, key: &str, value: &str) -> &Self {
        self.set_attr(doc, &format!("data-{key}"), value)
    }

    // ------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------

    /// True iff any member carries the class.
    pub fn has_class(&self, doc: &Document, class: &str) -> bool {
        self.iter().any(|id| doc.has_class(id, class))
    }

    /// Add a class token to every member missing it.
    pub fn add_class(&self, doc: &mut Document, class: &str) -> &Self {
        for id in self.iter() {
            doc.add_class(id, class);
        }
        self
    }

    /// Remove a class token from every member.
    pub fn remove_class(&self, doc: &mut Document, class: &str) -> &Self {
        for id in self.iter() {
            doc.remove_class(id, class);
        }
        self
    }

    /// Toggle a class token on every member, independently.
    pub fn toggle_class(&self, doc: &mut Document, class: &str) -> &Self {
        for id in self.iter() {
            doc.toggle_class(id, class);
        }
        self
    }

    // ------------------------------------------------------------------
    // Inline style
    // ------------------------------------------------------------------

    /// Inline style declaration from the first member.
    pub fn css(&self, doc: &Document, name: &str) -> Option<String> {
        self.get(0).and_then(|id| doc.style(id, name))
    }

    /// Set an inline style declaration on every member.
    pub fn set_css(&self, doc: &mut Document, name: &str, value: &str) -> &Self {
        for id in self.iter() {
            doc.set_style(id, name, value);
        }
        self
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Detach every child of every member.
    pub fn empty(&self, doc: &mut Document) -> &Self {
        for id in self.iter() {
            doc.remove_children(id);
        }
        self
    }

    /// Detach every member from the tree. The set keeps referencing the
    /// detached nodes; they stay inspectable.
    pub fn remove(&self, doc: &mut Document) -> &Self {
        for id in self.iter() {
            doc.detach(id);
        }
        self
    }

    /// Append `node` as the last child of every member. A single member
    /// receives the node itself (a move); with several members each gets
    /// its own deep copy and the moved node leaves the tree.
    pub fn append(&self, doc: &mut Document, node: NodeId) -> &Self {
        match self.size() {
            0 => {}
            1 => {
                if let Some(target) = self.get(0) {
                    doc.append_child(target, node);
                }
            }
            _ => {
                for id in self.iter() {
                    let copy = doc.clone_subtree(node);
                    doc.append_child(id, copy);
                }
                doc.detach(node);
            }
        }
        self
    }

    /// Insert `node` as the first child of every member; copy semantics as
    /// in [`Selection::append`].
    pub fn prepend(&self, doc: &mut Document, node: NodeId) -> &Self {
        match self.size() {
            0 => {}
            1 => {
                if let Some(target) = self.get(0) {
                    doc.prepend_child(target, node);
                }
            }
            _ => {
                for id in self.iter() {
                    let copy = doc.clone_subtree(node);
                    doc.prepend_child(id, copy);
                }
                doc.detach(node);
            }
        }
        self
    }

    /// Replace every member with a detached deep copy of itself.
    pub fn clone_nodes(&mut self, doc: &mut Document) -> &mut Self {
        if self.is_empty() {
            return self;
        }
        let copies: Vec<NodeId> = self.iter().collect::<Vec<_>>()
            .into_iter()
            .map(|id| doc.clone_subtree(id))
            .collect();
        let mut fresh = Selection::new();
        for copy in copies {
            fresh.add(doc, copy);
        }
        *self = fresh;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_text_and_set_text() {
        let mut doc = parse("<html><body><p>Hello <b>world</b></p><p>again</p></body></html>");
        let paragraphs = doc.select("p");
        assert_eq!(paragraphs.text(&doc).as_deref(), Some("Hello world"));

        paragraphs.set_text(&mut doc, "done");
        assert_eq!(doc.select("b").size(), 0);
        assert_eq!(paragraphs.text(&doc).as_deref(), Some("done"));
        assert_eq!(doc.select("p").eq(1).text(&doc).as_deref(), Some("done"));
    }

    #[test]
    fn test_inner_html_and_set_html() {
        let mut doc = parse(r#"<html><body><div id="d"><span>old</span></div></body></html>"#);
        let div = doc.select("#d");
        assert_eq!(div.inner_html(&doc).as_deref(), Some("<span>old</span>"));

        div.set_html(&mut doc, "<em>new</em> text");
        assert_eq!(div.inner_html(&doc).as_deref(), Some("<em>new</em> text"));
        assert_eq!(doc.select("em").size(), 1);
    }

    #[test]
    fn test_attr_and_data() {
        let mut doc = parse(r#"<html><body><a href="/x" data-role="nav"></a></body></html>"#);
        let link = doc.select("a");
        assert_eq!(link.attr(&doc, "href").as_deref(), Some("/x"));
        assert_eq!(link.data(&doc, "role").as_deref(), Some("nav"));

        link.set_attr(&mut doc, "href", "/y");
        link.set_data(&mut doc, "state", "on");
        assert_eq!(link.attr(&doc, "href").as_deref(), Some("/y"));
        assert_eq!(link.attr(&doc, "data-state").as_deref(), Some("on"));

        link.remove_attr(&mut doc, "href");
        assert_eq!(link.attr(&doc, "href"), None);
    }

    #[test]
    fn test_val_reads_and_writes_value() {
        let mut doc = parse(r#"<html><body><input value="a"><input></body></html>"#);
        let inputs = doc.select("input");
        assert_eq!(inputs.val(&doc).as_deref(), Some("a"));

        inputs.set_val(&mut doc, "b");
        assert_eq!(doc.select("input").last().val(&doc).as_deref(), Some("b"));
    }

    #[test]
    fn test_class_helpers_touch_every_member() {
        let mut doc = parse(
            r#"<html><body><i class="a"></i><i></i><i class="a b"></i></body></html>"#,
        );
        let items = doc.select("i");
        assert!(items.has_class(&doc, "b"));
        assert!(!items.has_class(&doc, "c"));

        items.add_class(&mut doc, "mark");
        assert!(items.is(&doc, ".mark"));

        items.remove_class(&mut doc, "a");
        assert_eq!(doc.select(".a").size(), 0);

        // toggling flips each member independently
        items.toggle_class(&mut doc, "b");
        assert_eq!(doc.select(".b").size(), 2);
    }

    #[test]
    fn test_css_helpers() {
        let mut doc = parse(r#"<html><body><p style="color: red"></p></body></html>"#);
        let p = doc.select("p");
        assert_eq!(p.css(&doc, "color").as_deref(), Some("red"));

        p.set_css(&mut doc, "color", "blue");
        p.set_css(&mut doc, "margin", "0");
        assert_eq!(p.css(&doc, "color").as_deref(), Some("blue"));
        assert_eq!(p.css(&doc, "margin").as_deref(), Some("0"));
    }

    #[test]
    fn test_empty_and_remove() {
        let mut doc = parse("<html><body><ul><li>1</li><li>2</li></ul><p></p></body></html>");
        doc.select("ul").empty(&mut doc);
        assert_eq!(doc.select("li").size(), 0);

        doc.select("p").remove(&mut doc);
        assert_eq!(doc.select("p").size(), 0);
    }

    #[test]
    fn test_append_moves_single_target() {
        let mut doc = parse(r#"<html><body><div id="d"></div><span id="s"></span></body></html>"#);
        let span = doc.by_id("s").unwrap();
        doc.select("#d").append(&mut doc, span);

        let div = doc.by_id("d").unwrap();
        assert_eq!(doc.parent(span), Some(div));
    }

    #[test]
    fn test_append_clones_for_multiple_targets() {
        let mut doc = parse(
            r#"<html><body><div class="t"></div><div class="t"></div><span id="s">x</span></body></html>"#,
        );
        let span = doc.by_id("s").unwrap();
        doc.select(".t").append(&mut doc, span);

        // both targets got a copy, the original left the tree
        assert_eq!(doc.select("span").size(), 2);
        assert!(doc.parent(span).is_none());
        let mut targets = doc.select(".t");
        assert!(targets.has(&doc, "span"));
        targets.children(&doc);
        assert_eq!(targets.size(), 2);
    }

    #[test]
    fn test_prepend_inserts_first() {
        let mut doc = parse(r#"<html><body><ul><li>old</li></ul></body></html>"#);
        let fresh = doc.create_element("li");
        doc.set_text(fresh, "new");
        doc.select("ul").prepend(&mut doc, fresh);

        let items = doc.select("li");
        assert_eq!(items.size(), 2);
        assert_eq!(doc.text_content(items.get(0).unwrap()), "new");
    }

    #[test]
    fn test_clone_nodes_detaches_copies() {
        let mut doc = parse(r#"<html><body><p class="orig">text</p></body></html>"#);
        let mut copies = doc.select(".orig");
        copies.clone_nodes(&mut doc);
        assert_eq!(copies.size(), 1);

        let copy = copies.get(0).unwrap();
        assert!(doc.parent(copy).is_none());
        assert_eq!(doc.text_content(copy), "text");
        // the original is untouched
        assert_eq!(doc.select(".orig").size(), 1);
    }
}
