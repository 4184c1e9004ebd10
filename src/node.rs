//! The graph-structured stack node.
//!
//! A [`Node`] is one stack frame of a GSS: a shared, reference-counted cell
//! holding a single payload. Any number of holders (predecessor lists, the
//! parser's set of active heads, another node's payload) may keep a handle;
//! the node and its payload are released exactly when the last handle goes.
//!
//! This is the single-threaded model. See [`crate::sync::SyncNode`] for nodes
//! shared between concurrently running parser branches.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::args::NodeArgs;
use crate::budget::Lease;
use crate::value::Value;
use crate::GssError;

/// Identity of a node: the address of its shared allocation.
///
/// Stable for the lifetime of the node. May be reused after destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:x}", self.0)
    }
}

struct NodeCell<T> {
    payload: RefCell<T>,
    // Dropped after the payload; returns the budget slot.
    _lease: Option<Lease>,
}

/// A shared handle to a GSS node.
///
/// Cloning the handle shares the node; it never copies the payload.
///
/// # Examples
///
/// ```rust
/// use gss::{Node, Value};
/// let head = Node::<Value>::new();
/// assert!(head.get_payload().is_nil());
///
/// let tail = Node::with_payload(Value::from("s0"));
/// head.set_payload(Value::Node(tail.clone()));
/// assert_eq!(tail.ref_count(), 2);
///
/// drop(head);
/// assert_eq!(tail.ref_count(), 1);
/// ```
pub struct Node<T = Value> {
    inner: Rc<NodeCell<T>>,
}

/// A non-owning handle that does not keep a node alive.
pub struct WeakNode<T = Value> {
    inner: Weak<NodeCell<T>>,
}

impl<T> Node<T> {
    pub(crate) fn from_parts(payload: T, lease: Option<Lease>) -> Self {
        Self {
            inner: Rc::new(NodeCell {
                payload: RefCell::new(payload),
                _lease: lease,
            }),
        }
    }

    /// Creates a node holding the empty payload.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::with_payload(T::default())
    }

    pub fn with_payload(payload: T) -> Self {
        Self::from_parts(payload, None)
    }

    /// Creates a node from a dynamically shaped call.
    ///
    /// Accepts no argument, one positional argument, or the keyword `data`.
    ///
    /// # Errors
    ///
    /// Returns [`GssError::Argument`] for any other shape; no node is created.
    pub fn from_args(args: NodeArgs<T>) -> Result<Self, GssError>
    where
        T: Default,
    {
        let payload = args.into_payload()?.unwrap_or_default();
        Ok(Self::with_payload(payload))
    }

    /// Returns a clone of the payload.
    ///
    /// For a [`Value::Node`] payload the clone is another handle to the same
    /// node, not a copy of it.
    pub fn get_payload(&self) -> T
    where
        T: Clone,
    {
        self.inner.payload.borrow().clone()
    }

    /// Runs `f` against the payload without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` replaces the payload of this same node.
    pub fn with_payload_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.payload.borrow())
    }

    /// Replaces the payload, releasing the previous one.
    ///
    /// The new value is installed before the old one is dropped, and the old
    /// one is dropped outside the interior borrow, so releasing it may touch
    /// any other node (including ones that point back at this node).
    ///
    /// # Panics
    ///
    /// Panics if called from inside [`Node::with_payload_ref`] on this node.
    pub fn set_payload(&self, value: T) {
        let previous = self.replace_payload(value);
        drop(previous);
    }

    /// Replaces the payload and hands the previous one back to the caller.
    pub fn replace_payload(&self, value: T) -> T {
        self.inner.payload.replace(value)
    }

    /// Resets the payload to the empty value and returns what was held.
    ///
    /// Clearing the payload is how a higher layer breaks a reference cycle.
    pub fn take_payload(&self) -> T
    where
        T: Default,
    {
        self.inner.payload.take()
    }

    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    /// True if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of strong handles, this one included.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    pub fn weak_count(&self) -> usize {
        Rc::weak_count(&self.inner)
    }

    pub fn downgrade(&self) -> WeakNode<T> {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

impl Node<Value> {
    /// Detaches the next frame of a chain this handle alone keeps alive.
    ///
    /// When this is the last strong handle and the payload links to another
    /// node, the payload is reset to `Nil` and a handle to the linked node is
    /// returned. Otherwise nothing changes.
    pub(crate) fn take_unique_tail(&self) -> Option<Node<Value>> {
        if self.ref_count() != 1 {
            return None;
        }
        let tail = self.with_payload_ref(|payload| payload.as_node().cloned())?;
        // The released payload still shares `tail`, so its own teardown stops
        // immediately.
        self.set_payload(Value::Nil);
        Some(tail)
    }
}

impl<T> WeakNode<T> {
    /// Returns a strong handle if the node is still alive.
    pub fn upgrade(&self) -> Option<Node<T>> {
        self.inner.upgrade().map(|inner| Node { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for Node<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for Node<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Node<T> {}

impl<T> Hash for Node<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Node");
        out.field("id", &self.id());
        match self.inner.payload.try_borrow() {
            Ok(payload) => out.field("payload", &*payload),
            Err(_) => out.field("payload", &format_args!("<borrowed>")),
        };
        out.finish()
    }
}

impl<T> fmt::Debug for WeakNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakNode")
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorType;

    #[test]
    fn test_default_payload_is_nil() {
        let node = Node::<Value>::new();
        assert_eq!(node.get_payload(), Value::Nil);
        assert_eq!(Node::<Value>::default().get_payload(), Value::Nil);
    }

    #[test]
    fn test_identity_not_payload_equality() {
        let a = Node::with_payload(Value::from(1.0));
        let b = Node::with_payload(Value::from(1.0));
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, a.clone());
        assert_eq!(a.id(), a.clone().id());
    }

    #[test]
    fn test_replace_returns_previous() {
        let node = Node::with_payload(Value::from("s1"));
        let old = node.replace_payload(Value::from("s2"));
        assert_eq!(old.as_str(), Some("s1"));
        assert_eq!(node.get_payload().as_str(), Some("s2"));
        assert_eq!(node.take_payload().as_str(), Some("s2"));
        assert!(node.get_payload().is_nil());
    }

    #[test]
    fn test_heterogeneous_payloads_over_lifetime() {
        let node = Node::<Value>::new();
        node.set_payload(Value::from(3.0));
        node.set_payload(Value::from(true));
        node.set_payload(Value::List(vec![Value::from("a")]));
        assert_eq!(node.get_payload().type_name(), "List");
    }

    #[test]
    fn test_from_args_rejects_bogus_keyword() {
        let err = Node::from_args(NodeArgs::new().keyword("bogus_kw", Value::from(1.0))).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Argument);
    }

    #[test]
    fn test_weak_handle_observes_destruction() {
        let node = Node::with_payload(42u32);
        let weak = node.downgrade();
        assert_eq!(node.weak_count(), 1);
        assert!(weak.is_alive());
        assert_eq!(weak.upgrade().map(|n| n.get_payload()), Some(42));
        drop(node);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_debug_during_borrow_does_not_panic() {
        let node = Node::with_payload(5u8);
        let text = node.with_payload_ref(|_| format!("{:?}", node));
        assert!(text.contains("payload: 5"));
    }
}
