//! The matched-set wrapper: an ordered, de-duplicated collection of
//! element ids with chainable traversal.
//!
//! Chainable operations mutate the wrapper in place and return `&mut Self`;
//! pure queries (`is`, `has`, `size`, `get`) return plain values. Every
//! derivation builds a fresh sequence for this wrapper alone - selections
//! never share their backing storage.
//!
//! Operating on an empty set is a silent no-op across the board. That is a
//! contract, not an accident: chains keep composing instead of erroring
//! out halfway.

use crate::debug;
use crate::dom::{Document, NodeId, NodeSeq};
use crate::iter::{Merge, MergePolicy, Target};
use crate::selector::{Matcher, Selector, resolve};

/// An ordered set of matched elements. See the module docs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: NodeSeq,
}

impl Selection {
    /// An empty selection.
    pub fn new() -> Self {
        Selection {
            nodes: NodeSeq::new(),
        }
    }

    /// Build a selection from any accepted input: a selector string, a
    /// node, a node slice, or another selection. Behaves exactly like the
    /// corresponding [`Document::select`] / [`Selection::add`] calls.
    pub fn of<'a>(doc: &Document, target: impl Into<Target<'a>>) -> Self {
        let mut selection = Selection::new();
        selection.add(doc, target);
        selection
    }

    /// Wrap a resolver result. The resolver already guarantees unique
    /// element ids in document order.
    pub(crate) fn from_seq(nodes: NodeSeq) -> Self {
        Selection { nodes }
    }

    /// The members, in order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Iterate the members, in order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Current element count.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Alias for [`Selection::size`].
    pub fn count(&self) -> usize {
        self.size()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Membership by identity.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Member at `index`; negative indices count from the end (`-1` is the
    /// last member). Out of bounds yields `None`, never a panic.
    pub fn get(&self, index: isize) -> Option<NodeId> {
        self.nodes.get(self.resolve_index(index)?).copied()
    }

    fn resolve_index(&self, index: isize) -> Option<usize> {
        let len = self.nodes.len() as isize;
        let n = if index < 0 { len + index } else { index };
        (0..len).contains(&n).then_some(n as usize)
    }

    fn push_unique(nodes: &mut NodeSeq, id: NodeId) {
        if !nodes.contains(&id) {
            nodes.push(id);
        }
    }

    // ------------------------------------------------------------------
    // Identity queries
    // ------------------------------------------------------------------

    /// True iff the set is non-empty and every member matches the query.
    /// Pass `()` for the no-query form ("is there anything here?").
    pub fn is<'m>(&self, doc: &Document, query: impl Into<Matcher<'m>>) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let matcher = query.into().compile();
        self.iter().all(|id| matcher.matches(doc, id))
    }

    /// True iff any direct child of any member matches the query. One
    /// level down the tree, unlike [`Selection::is`].
    pub fn has<'m>(&self, doc: &Document, query: impl Into<Matcher<'m>>) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let matcher = query.into().compile();
        self.iter()
            .any(|id| doc.child_elements(id).any(|child| matcher.matches(doc, child)))
    }

    // ------------------------------------------------------------------
    // Narrowing
    // ------------------------------------------------------------------

    /// Retain members matching the query, preserving order.
    pub fn filter<'m>(&mut self, doc: &Document, query: impl Into<Matcher<'m>>) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let matcher = query.into().compile();
        self.nodes.retain(|id| matcher.matches(doc, *id));
        self
    }

    /// Retain members NOT matching the query, preserving order. For any
    /// query, `filter` and `not` partition the set.
    pub fn not<'m>(&mut self, doc: &Document, query: impl Into<Matcher<'m>>) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let matcher = query.into().compile();
        self.nodes.retain(|id| !matcher.matches(doc, *id));
        self
    }

    /// Narrow to the single member at `index` (negative indices count from
    /// the end). Out of range empties the set.
    pub fn eq(&mut self, index: isize) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        match self.resolve_index(index) {
            Some(n) => {
                let keep = self.nodes[n];
                self.nodes.clear();
                self.nodes.push(keep);
            }
            None => self.nodes.clear(),
        }
        self
    }

    /// Alias for [`Selection::eq`].
    pub fn at(&mut self, index: isize) -> &mut Self {
        self.eq(index)
    }

    /// Narrow to the first member.
    pub fn first(&mut self) -> &mut Self {
        self.eq(0)
    }

    /// Narrow to the last member.
    pub fn last(&mut self) -> &mut Self {
        self.eq(-1)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Replace the set with the members' immediate parents, de-duplicated:
    /// a parent shared by several members appears once. Non-element
    /// parents (the document node) are skipped.
    pub fn parent(&mut self, doc: &Document) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let mut out = NodeSeq::new();
        for &id in &self.nodes {
            if let Some(parent) = doc.parent_element(id) {
                Self::push_unique(&mut out, parent);
            }
        }
        self.nodes = out;
        self
    }

    /// Replace the set with the members' direct element children, in
    /// member-then-child order (not globally re-sorted).
    pub fn children(&mut self, doc: &Document) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let mut out = NodeSeq::new();
        for &id in &self.nodes {
            for child in doc.child_elements(id) {
                Self::push_unique(&mut out, child);
            }
        }
        self.nodes = out;
        self
    }

    /// Replace the set with the members' siblings. Members of the original
    /// set never count as each other's siblings, so with a multi-element
    /// set the results exclude every original member, not just the self.
    pub fn siblings(&mut self, doc: &Document) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let original = self.nodes.clone();
        let mut out = NodeSeq::new();
        for &id in &original {
            let Some(parent) = doc.parent(id) else {
                continue;
            };
            for sibling in doc.child_elements(parent) {
                if !original.contains(&sibling) {
                    Self::push_unique(&mut out, sibling);
                }
            }
        }
        self.nodes = out;
        self
    }

    /// Resolve a selector within each member as context and union the
    /// results, de-duplicated. Members with no element children cannot
    /// contain a match and are skipped without a resolver walk.
    ///
    /// Id selectors stay document-scoped even here (the grammar's
    /// deliberate quirk), so `find("#x")` can surface a node outside the
    /// members.
    pub fn find(&mut self, doc: &Document, selector: &str) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!("find: {err}");
                self.nodes.clear();
                return self;
            }
        };
        let mut out = NodeSeq::new();
        for &id in &self.nodes {
            if !doc.has_child_elements(id) {
                continue;
            }
            for found in resolve(doc, &parsed, id) {
                Self::push_unique(&mut out, found);
            }
        }
        self.nodes = out;
        self
    }

    /// For each member, walk ancestors (excluding the member itself) to
    /// the first match; union the results, de-duplicated.
    pub fn closest<'m>(&mut self, doc: &Document, query: impl Into<Matcher<'m>>) -> &mut Self {
        if self.nodes.is_empty() {
            return self;
        }
        let matcher = query.into().compile();
        let mut out = NodeSeq::new();
        for &id in &self.nodes {
            for ancestor in doc.ancestors(id).skip(1) {
                if matcher.matches(doc, ancestor) {
                    Self::push_unique(&mut out, ancestor);
                    break;
                }
            }
        }
        self.nodes = out;
        self
    }

    // ------------------------------------------------------------------
    // Set combination
    // ------------------------------------------------------------------

    /// Append elements from any accepted input, skipping anything already
    /// present by identity. Adding a present element is a no-op, so the
    /// union is idempotent. Non-element ids are dropped.
    pub fn add<'t>(&mut self, doc: &Document, target: impl Into<Target<'t>>) -> &mut Self {
        let target = target.into();
        debug!("add: {} input", target.kind());
        let incoming: Vec<NodeId> = match target {
            Target::Selector(selector) => doc.select(selector).nodes.to_vec(),
            Target::Node(id) => vec![id],
            Target::Nodes(ids) => ids.to_vec(),
            Target::Set(selection) => selection.nodes.to_vec(),
        };

        // Union through the generic merge, then re-impose the identity
        // invariant (no duplicates, elements only).
        let mut combined: Vec<NodeId> = self.nodes.to_vec();
        combined.merge(&incoming[..], MergePolicy::Keep);
        self.nodes.clear();
        for id in combined {
            if doc.is_element(id) {
                Self::push_unique(&mut self.nodes, id);
            }
        }
        self
    }

    /// Alias for [`Selection::add`].
    pub fn push<'t>(&mut self, doc: &Document, target: impl Into<Target<'t>>) -> &mut Self {
        self.add(doc, target)
    }
}
