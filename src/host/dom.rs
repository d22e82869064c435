//! In-memory element tree with web-style event dispatch.
//!
//! Enough of the DOM event model to host the arbiter without a browser:
//! capture phase root → parent, target phase, bubble phase parent → root.
//! `stop_propagation` ends the walk after the current node; the remaining
//! listeners on that node still run.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{EventKind, EventTarget, Listener, ListenerArg, NativeEvent};

// =============================================================================
// TREE
// =============================================================================

struct Registration {
    kind: EventKind,
    listener: Listener,
    capture: bool,
    passive: bool,
}

struct Node {
    parent: Option<usize>,
    listeners: Vec<Registration>,
}

#[derive(Default)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Target first, then ancestors up to the root.
    fn path(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut current = self.nodes[index].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self.nodes[parent].parent;
        }
        path
    }
}

/// Owner of an element tree.
#[derive(Clone, Default)]
pub struct Document {
    tree: Rc<RefCell<Tree>>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element, optionally as a child of `parent`.
    ///
    /// `parent` must belong to this document.
    pub fn create_element(&self, parent: Option<&Element>) -> Element {
        let parent = parent.map(|p| {
            debug_assert!(Rc::ptr_eq(&p.tree, &self.tree), "parent from another document");
            p.index
        });
        let mut tree = self.tree.borrow_mut();
        tree.nodes.push(Node {
            parent,
            listeners: Vec::new(),
        });
        Element {
            tree: Rc::clone(&self.tree),
            index: tree.nodes.len() - 1,
        }
    }

    /// Number of elements created so far.
    pub fn len(&self) -> usize {
        self.tree.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Handle to one node of a [`Document`].
#[derive(Clone)]
pub struct Element {
    tree: Rc<RefCell<Tree>>,
    index: usize,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.index == other.index
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element").field("index", &self.index).finish()
    }
}

impl Element {
    pub fn parent(&self) -> Option<Element> {
        let parent = self.tree.borrow().nodes[self.index].parent;
        parent.map(|index| Element {
            tree: Rc::clone(&self.tree),
            index,
        })
    }

    /// Number of listeners registered for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.tree.borrow().nodes[self.index]
            .listeners
            .iter()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Whether `listener` is registered for `kind` as passive.
    /// `None` when it is not registered at all.
    pub fn is_passive(&self, kind: EventKind, listener: &Listener) -> Option<bool> {
        self.tree.borrow().nodes[self.index]
            .listeners
            .iter()
            .find(|r| r.kind == kind && Rc::ptr_eq(&r.listener, listener))
            .map(|r| r.passive)
    }

    /// Dispatch `event` with this element as target.
    ///
    /// Returns `false` when a listener prevented the default action.
    pub fn dispatch(&self, event: &NativeEvent) -> bool {
        let path = self.tree.borrow().path(self.index);

        // Capture: root down to the parent
        for &node in path.iter().skip(1).rev() {
            self.invoke(node, event, true);
            if event.propagation_stopped() {
                return !event.default_prevented();
            }
        }

        // Target: capture listeners first, then the rest
        self.invoke(path[0], event, true);
        self.invoke(path[0], event, false);
        if event.propagation_stopped() {
            return !event.default_prevented();
        }

        // Bubble
        if event.bubbles() {
            for &node in path.iter().skip(1) {
                self.invoke(node, event, false);
                if event.propagation_stopped() {
                    break;
                }
            }
        }

        !event.default_prevented()
    }

    fn invoke(&self, node: usize, event: &NativeEvent, capture: bool) {
        // Snapshot so listeners can add/remove listeners while running
        let snapshot: Vec<(Listener, bool)> = self.tree.borrow().nodes[node]
            .listeners
            .iter()
            .filter(|r| r.kind == event.kind() && r.capture == capture)
            .map(|r| (Rc::clone(&r.listener), r.passive))
            .collect();

        for (listener, passive) in snapshot {
            event.set_in_passive_listener(passive);
            listener(event);
        }
        event.set_in_passive_listener(false);
    }
}

impl EventTarget for Element {
    fn add_event_listener(&self, kind: EventKind, listener: &Listener, arg: ListenerArg) {
        let mut tree = self.tree.borrow_mut();
        let listeners = &mut tree.nodes[self.index].listeners;
        let capture = arg.capture();
        let exists = listeners
            .iter()
            .any(|r| r.kind == kind && r.capture == capture && Rc::ptr_eq(&r.listener, listener));
        if exists {
            return;
        }
        listeners.push(Registration {
            kind,
            listener: Rc::clone(listener),
            capture,
            passive: arg.passive(),
        });
    }

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener, capture: bool) {
        let mut tree = self.tree.borrow_mut();
        tree.nodes[self.index].listeners.retain(|r| {
            !(r.kind == kind && r.capture == capture && Rc::ptr_eq(&r.listener, listener))
        });
    }
}
