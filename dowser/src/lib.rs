//! DOM query and manipulation micro-library.
//!
//! dowser pairs an arena-based DOM (parsed with html5ever, browser-grade
//! error recovery) with a small chainable query engine:
//!
//! - **Selector resolution**: `#id`, `tag`, `.class` and `tag.class`
//!   selectors resolved against the document or any context element, always
//!   in document order, never cached.
//! - **Selection**: an ordered, de-duplicated set of matched elements with
//!   chainable traversal (`parent`, `children`, `siblings`, `find`,
//!   `filter`, `closest`, ...), set combination (`add`, `not`) and identity
//!   queries (`is`, `has`).
//! - **Manipulation**: text/HTML content, attributes, classes, inline
//!   style, structural edits and event listeners, all through the same
//!   selection surface.
//!
//! # Example
//!
//! ```rust
//! let mut doc = dowser::parse(
//!     r#"<ul id="list"><li>1</li><li>2</li><li>3</li><li>4</li><li>5</li></ul>"#,
//! );
//!
//! let items = doc.select_in("li", "#list");
//! assert_eq!(items.size(), 5);
//! assert_eq!(items.get(-1), items.get(4));
//!
//! items.add_class(&mut doc, "mark");
//! assert_eq!(doc.select(".mark").size(), 5);
//! ```
//!
//! The generic utilities the engine is built on - [`each`] with explicit
//! continue/break signaling, [`merge`] with an append-vs-overwrite policy,
//! and the [`Kind`] input tagging - are exported for non-DOM use as well.

mod tracing_macros;
pub(crate) use tracing_macros::debug;

pub mod dom;
pub mod events;
pub mod iter;
mod manip;
mod parser;
pub mod selection;
pub mod selector;
pub mod serialize;

pub use dom::{Document, ElementData, Namespace, NodeData, NodeId, NodeKind, NodeSeq};
pub use events::{Event, Handler, ListenerId};
pub use iter::{Each, Kind, Merge, MergePolicy, Target, each, merge};
pub use parser::parse;
pub use selection::Selection;
pub use selector::{Context, Matcher, Selector, SelectorError, resolve};
pub use serialize::{SerializeOptions, serialize_children, serialize_document, serialize_node};

/// Free-function form of [`Document::select`]; the two behave identically.
pub fn select(doc: &Document, selector: &str) -> Selection {
    doc.select(selector)
}
