//! Nodes shared between concurrently running parser branches.
//!
//! [`SyncNode`] mirrors [`crate::Node`] over `Arc` and `RwLock`. Payload
//! replacement happens under the write lock: the new value is installed and
//! the old one moved out in a single swap, so a reader sees either the old
//! payload or the new one and never neither.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::args::NodeArgs;
use crate::budget::Lease;
use crate::node::NodeId;
use crate::GssError;

struct SyncCell<T> {
    payload: RwLock<T>,
    _lease: Option<Lease>,
}

/// A thread-safe shared handle to a GSS node.
///
/// # Examples
///
/// ```rust
/// use gss::SyncNode;
/// let node = SyncNode::with_payload(String::from("s0"));
/// let reader = node.clone();
/// std::thread::spawn(move || assert_eq!(reader.get_payload(), "s0"))
///     .join()
///     .unwrap();
/// node.set_payload(String::from("s1"));
/// assert_eq!(node.get_payload(), "s1");
/// ```
pub struct SyncNode<T> {
    inner: Arc<SyncCell<T>>,
}

pub struct WeakSyncNode<T> {
    inner: Weak<SyncCell<T>>,
}

impl<T> SyncNode<T> {
    pub(crate) fn from_parts(payload: T, lease: Option<Lease>) -> Self {
        Self {
            inner: Arc::new(SyncCell {
                payload: RwLock::new(payload),
                _lease: lease,
            }),
        }
    }

    pub fn new() -> Self
    where
        T: Default,
    {
        Self::with_payload(T::default())
    }

    pub fn with_payload(payload: T) -> Self {
        Self::from_parts(payload, None)
    }

    /// # Errors
    ///
    /// Returns [`GssError::Argument`] unless `args` is empty, a single
    /// positional argument, or the single keyword `data`.
    pub fn from_args(args: NodeArgs<T>) -> Result<Self, GssError>
    where
        T: Default,
    {
        let payload = args.into_payload()?.unwrap_or_default();
        Ok(Self::with_payload(payload))
    }

    // A panic while holding the lock cannot leave a half-written payload:
    // every write is a whole-value swap. Poisoning is therefore ignored.
    pub fn get_payload(&self) -> T
    where
        T: Clone,
    {
        self.inner
            .payload
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `f` against the payload while holding the read lock.
    ///
    /// # Deadlocks
    ///
    /// Deadlocks if `f` calls [`SyncNode::set_payload`],
    /// [`SyncNode::replace_payload`] or [`SyncNode::take_payload`] on this
    /// same node: the write lock waits for the read lock `f` runs under.
    pub fn with_payload_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self
            .inner
            .payload
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Replaces the payload; the previous one is dropped after the write lock
    /// is released.
    pub fn set_payload(&self, value: T) {
        let previous = self.replace_payload(value);
        drop(previous);
    }

    pub fn replace_payload(&self, value: T) -> T {
        let mut guard = self
            .inner
            .payload
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, value)
    }

    pub fn take_payload(&self) -> T
    where
        T: Default,
    {
        self.replace_payload(T::default())
    }

    pub fn id(&self) -> NodeId {
        NodeId(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn weak_count(&self) -> usize {
        Arc::weak_count(&self.inner)
    }

    pub fn downgrade(&self) -> WeakSyncNode<T> {
        WeakSyncNode {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T> WeakSyncNode<T> {
    pub fn upgrade(&self) -> Option<SyncNode<T>> {
        self.inner.upgrade().map(|inner| SyncNode { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl<T> Clone for SyncNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Clone for WeakSyncNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SyncNode<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PartialEq for SyncNode<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for SyncNode<T> {}

impl<T> Hash for SyncNode<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for SyncNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("SyncNode");
        out.field("id", &self.id());
        match self.inner.payload.try_read() {
            Ok(payload) => out.field("payload", &*payload),
            Err(_) => out.field("payload", &format_args!("<locked>")),
        };
        out.finish()
    }
}

impl<T> fmt::Debug for WeakSyncNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSyncNode")
            .field("alive", &self.is_alive())
            .finish()
    }
}
