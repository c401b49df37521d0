//! Event listener registry and synchronous dispatch.
//!
//! Listeners attach to nodes by id and fire when [`Document::dispatch`]
//! (or [`Selection::trigger`]) names their event type. Dispatch targets
//! the node alone - no capture or bubble phases. Handlers receive the
//! document mutably, so they may edit the tree mid-dispatch; the handler
//! list is snapshotted before the first call.
//!
//! Rust has no function identity, so removal goes through the
//! [`ListenerId`] returned at registration, or drops every listener for a
//! node/event-type pair.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::debug;
use crate::dom::{Document, NodeId};
use crate::selection::Selection;

/// A dispatched event, handed to every listener.
#[derive(Debug, Clone)]
pub struct Event {
    /// Event type name, e.g. `"click"`.
    pub event_type: String,
    /// The node the event was dispatched on.
    pub target: NodeId,
}

/// Shared handler: callable any number of times, cheap to clone.
pub type Handler = Rc<dyn Fn(&mut Document, &Event)>;

/// Opaque handle for removing a single listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Listener {
    id: ListenerId,
    event_type: String,
    once: bool,
    handler: Handler,
}

/// Per-document listener registry.
#[derive(Clone, Default)]
pub(crate) struct EventListeners {
    by_node: HashMap<NodeId, Vec<Listener>>,
    next: u64,
}

impl fmt::Debug for EventListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: usize = self.by_node.values().map(Vec::len).sum();
        f.debug_struct("EventListeners")
            .field("nodes", &self.by_node.len())
            .field("listeners", &listeners)
            .finish()
    }
}

impl EventListeners {
    fn add(&mut self, node: NodeId, event_type: &str, once: bool, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.by_node.entry(node).or_default().push(Listener {
            id,
            event_type: event_type.to_string(),
            once,
            handler,
        });
        id
    }

    fn remove(&mut self, id: ListenerId) -> bool {
        for listeners in self.by_node.values_mut() {
            if let Some(pos) = listeners.iter().position(|l| l.id == id) {
                listeners.remove(pos);
                return true;
            }
        }
        false
    }

    fn remove_all(&mut self, node: NodeId, event_type: Option<&str>) {
        match event_type {
            Some(event_type) => {
                if let Some(listeners) = self.by_node.get_mut(&node) {
                    listeners.retain(|l| l.event_type != event_type);
                }
            }
            None => {
                self.by_node.remove(&node);
            }
        }
    }

    /// Snapshot the handlers registered for this node and event type.
    fn matching(&self, node: NodeId, event_type: &str) -> Vec<(ListenerId, Handler, bool)> {
        self.by_node
            .get(&node)
            .into_iter()
            .flatten()
            .filter(|l| l.event_type == event_type)
            .map(|l| (l.id, l.handler.clone(), l.once))
            .collect()
    }
}

impl Document {
    /// Register a listener on a node. Returns its removal handle.
    pub fn add_listener(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: impl Fn(&mut Document, &Event) + 'static,
    ) -> ListenerId {
        self.listeners.add(node, event_type, false, Rc::new(handler))
    }

    /// Register a listener removed after its first invocation.
    pub fn add_listener_once(
        &mut self,
        node: NodeId,
        event_type: &str,
        handler: impl Fn(&mut Document, &Event) + 'static,
    ) -> ListenerId {
        self.listeners.add(node, event_type, true, Rc::new(handler))
    }

    pub(crate) fn add_listener_shared(
        &mut self,
        node: NodeId,
        event_type: &str,
        once: bool,
        handler: Handler,
    ) -> ListenerId {
        self.listeners.add(node, event_type, once, handler)
    }

    /// Remove a single listener by handle. Returns whether it existed.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Remove every listener on a node, or only those for one event type.
    pub fn remove_listeners(&mut self, node: NodeId, event_type: Option<&str>) {
        self.listeners.remove_all(node, event_type);
    }

    /// Dispatch an event to the target's listeners, synchronously and in
    /// registration order. Returns how many handlers ran.
    pub fn dispatch(&mut self, target: NodeId, event_type: &str) -> usize {
        let matched = self.listeners.matching(target, event_type);
        if matched.is_empty() {
            return 0;
        }
        debug!("dispatch: {event_type} -> {} handler(s)", matched.len());
        let event = Event {
            event_type: event_type.to_string(),
            target,
        };
        let count = matched.len();
        for (id, handler, once) in matched {
            handler(self, &event);
            if once {
                self.listeners.remove(id);
            }
        }
        count
    }
}

impl Selection {
    /// Bind a handler to every member. Returns one handle per member.
    pub fn on(
        &self,
        doc: &mut Document,
        event_type: &str,
        handler: impl Fn(&mut Document, &Event) + 'static,
    ) -> Vec<ListenerId> {
        let handler: Handler = Rc::new(handler);
        self.iter()
            .map(|id| doc.add_listener_shared(id, event_type, false, handler.clone()))
            .collect()
    }

    /// Bind a handler that fires once per member, then unbinds itself.
    pub fn once(
        &self,
        doc: &mut Document,
        event_type: &str,
        handler: impl Fn(&mut Document, &Event) + 'static,
    ) -> Vec<ListenerId> {
        let handler: Handler = Rc::new(handler);
        self.iter()
            .map(|id| doc.add_listener_shared(id, event_type, true, handler.clone()))
            .collect()
    }

    /// Unbind every listener for this event type from every member.
    pub fn off(&self, doc: &mut Document, event_type: &str) -> &Self {
        for id in self.iter() {
            doc.remove_listeners(id, Some(event_type));
        }
        self
    }

    /// Dispatch an event on every member. Returns how many handlers ran.
    pub fn trigger(&self, doc: &mut Document, event_type: &str) -> usize {
        self.iter().map(|id| doc.dispatch(id, event_type)).sum()
    }
}
