//! Generic iteration and merge utilities the selection engine is built on.
//!
//! `each` iterates any supported collection with caller-controlled early
//! exit: the visitor returns [`ControlFlow`], an explicit continue/break
//! signal rather than host-language loop control, so callers invoked
//! through a generic dispatch layer keep control of the loop.
//!
//! `merge` copies entries from one collection into another under an
//! explicit [`MergePolicy`]: this append-vs-overwrite split is how
//! selector results combine without clobbering matches already present.

use std::fmt;
use std::hash::Hash;
use std::ops::ControlFlow;

use indexmap::IndexMap;

use crate::dom::NodeId;
use crate::selection::Selection;

/// Uniform iteration with early exit.
///
/// Implemented for slices and vectors (indexed), ordered key-value maps
/// (keyed, insertion order), and [`Selection`] (delegates to its internal
/// ordered sequence).
pub trait Each {
    type Key: ?Sized;
    type Item;

    /// Visit every entry in order until the visitor breaks. Returns the
    /// collection for chaining.
    fn each<F>(&self, visit: F) -> &Self
    where
        F: FnMut(&Self::Item, &Self::Key) -> ControlFlow<()>;
}

/// Free-function form of [`Each::each`].
pub fn each<C, F>(collection: &C, visit: F) -> &C
where
    C: Each + ?Sized,
    F: FnMut(&C::Item, &C::Key) -> ControlFlow<()>,
{
    collection.each(visit)
}

impl<T> Each for [T] {
    type Key = usize;
    type Item = T;

    fn each<F>(&self, mut visit: F) -> &Self
    where
        F: FnMut(&T, &usize) -> ControlFlow<()>,
    {
        for (index, item) in self.iter().enumerate() {
            if visit(item, &index).is_break() {
                break;
            }
        }
        self
    }
}

impl<T> Each for Vec<T> {
    type Key = usize;
    type Item = T;

    fn each<F>(&self, mut visit: F) -> &Self
    where
        F: FnMut(&T, &usize) -> ControlFlow<()>,
    {
        for (index, item) in self.iter().enumerate() {
            if visit(item, &index).is_break() {
                break;
            }
        }
        self
    }
}

impl<K: Hash + Eq, V> Each for IndexMap<K, V> {
    type Key = K;
    type Item = V;

    fn each<F>(&self, mut visit: F) -> &Self
    where
        F: FnMut(&V, &K) -> ControlFlow<()>,
    {
        for (key, value) in self.iter() {
            if visit(value, key).is_break() {
                break;
            }
        }
        self
    }
}

impl Each for Selection {
    type Key = usize;
    type Item = NodeId;

    fn each<F>(&self, mut visit: F) -> &Self
    where
        F: FnMut(&NodeId, &usize) -> ControlFlow<()>,
    {
        for (index, id) in self.nodes().iter().enumerate() {
            if visit(id, &index).is_break() {
                break;
            }
        }
        self
    }
}

/// What happens when a merged entry collides with an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Keep what the target already holds: list-likes append at fresh
    /// indices, mappings leave existing keys untouched.
    #[default]
    Keep,
    /// Overwrite at the source's own key: list-likes write at the source
    /// index, mappings replace existing values.
    Replace,
}

/// Copy entries from a source collection into `self` under a policy.
pub trait Merge<Source: ?Sized> {
    fn merge(&mut self, source: &Source, policy: MergePolicy) -> &mut Self;
}

/// Free-function form of [`Merge::merge`].
pub fn merge<'t, T, S>(target: &'t mut T, source: &S, policy: MergePolicy) -> &'t mut T
where
    T: Merge<S> + ?Sized,
    S: ?Sized,
{
    target.merge(source, policy)
}

impl<T: Clone> Merge<[T]> for Vec<T> {
    fn merge(&mut self, source: &[T], policy: MergePolicy) -> &mut Self {
        match policy {
            MergePolicy::Keep => self.extend_from_slice(source),
            MergePolicy::Replace => {
                for (index, value) in source.iter().enumerate() {
                    if index < self.len() {
                        self[index] = value.clone();
                    } else {
                        self.push(value.clone());
                    }
                }
            }
        }
        self
    }
}

impl<K, V> Merge<IndexMap<K, V>> for IndexMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn merge(&mut self, source: &IndexMap<K, V>, policy: MergePolicy) -> &mut Self {
        for (key, value) in source {
            match policy {
                MergePolicy::Keep => {
                    self.entry(key.clone()).or_insert_with(|| value.clone());
                }
                MergePolicy::Replace => {
                    self.insert(key.clone(), value.clone());
                }
            }
        }
        self
    }
}

/// Normalized runtime category of an engine input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Selector,
    Node,
    Nodes,
    Set,
}

impl Kind {
    /// Lowercase tag for this category. The mapping is closed: every
    /// accepted input resolves to exactly one of these names.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Selector => "selector",
            Kind::Node => "node",
            Kind::Nodes => "nodes",
            Kind::Set => "set",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything the construction entry points and [`Selection::add`] accept.
///
/// The category is resolved once, here, at the call boundary; downstream
/// code dispatches on the variant instead of re-inspecting its input.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Selector(&'a str),
    Node(NodeId),
    Nodes(&'a [NodeId]),
    Set(&'a Selection),
}

impl Target<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Target::Selector(_) => Kind::Selector,
            Target::Node(_) => Kind::Node,
            Target::Nodes(_) => Kind::Nodes,
            Target::Set(_) => Kind::Set,
        }
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(selector: &'a str) -> Self {
        Target::Selector(selector)
    }
}

impl From<NodeId> for Target<'_> {
    fn from(id: NodeId) -> Self {
        Target::Node(id)
    }
}

impl<'a> From<&'a [NodeId]> for Target<'a> {
    fn from(ids: &'a [NodeId]) -> Self {
        Target::Nodes(ids)
    }
}

impl<'a> From<&'a Vec<NodeId>> for Target<'a> {
    fn from(ids: &'a Vec<NodeId>) -> Self {
        Target::Nodes(ids)
    }
}

impl<'a> From<&'a Selection> for Target<'a> {
    fn from(selection: &'a Selection) -> Self {
        Target::Set(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_visits_in_order() {
        let items = vec!["a", "b", "c"];
        let mut seen = Vec::new();
        items.each(|item, index| {
            seen.push((*index, *item));
            ControlFlow::Continue(())
        });
        assert_eq!(seen, [(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn test_each_early_exit() {
        let items = [1, 2, 3, 4, 5];
        let mut seen = Vec::new();
        items.each(|item, _| {
            seen.push(*item);
            if *item == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, [1, 2, 3]);
    }

    #[test]
    fn test_each_over_map_in_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("z", 1);
        map.insert("a", 2);
        let mut seen = Vec::new();
        each(&map, |value, key| {
            seen.push((*key, *value));
            ControlFlow::Continue(())
        });
        assert_eq!(seen, [("z", 1), ("a", 2)]);
    }

    #[test]
    fn test_each_returns_collection_for_chaining() {
        let items = [1, 2];
        let back = items.each(|_, _| ControlFlow::Continue(()));
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn test_merge_list_keep_appends() {
        let mut target = vec![1, 2];
        target.merge(&[3, 4][..], MergePolicy::Keep);
        assert_eq!(target, [1, 2, 3, 4]);
    }

    #[test]
    fn test_merge_list_replace_writes_at_source_index() {
        let mut target = vec![1, 2, 3];
        target.merge(&[9, 8][..], MergePolicy::Replace);
        assert_eq!(target, [9, 8, 3]);

        let mut short = vec![1];
        short.merge(&[9, 8][..], MergePolicy::Replace);
        assert_eq!(short, [9, 8]);
    }

    #[test]
    fn test_merge_map_policies() {
        let mut target: IndexMap<&str, i32> = IndexMap::new();
        target.insert("a", 1);

        let mut source = IndexMap::new();
        source.insert("a", 9);
        source.insert("b", 2);

        let mut kept = target.clone();
        kept.merge(&source, MergePolicy::Keep);
        assert_eq!(kept.get("a"), Some(&1));
        assert_eq!(kept.get("b"), Some(&2));

        target.merge(&source, MergePolicy::Replace);
        assert_eq!(target.get("a"), Some(&9));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Kind::Selector.name(), "selector");
        assert_eq!(Kind::Node.name(), "node");
        assert_eq!(Kind::Nodes.name(), "nodes");
        assert_eq!(Kind::Set.name(), "set");
        assert_eq!(Target::from(".x").kind().to_string(), "selector");
    }
}
