//! Live-node accounting and the allocation ceiling.
//!
//! Global allocator failure aborts a Rust process, so a GSS that must refuse
//! to grow (an ambiguity explosion on adversarial input, say) does so through
//! a [`NodeBudget`]. Every node built through a budget holds a lease that is
//! returned when the node is destroyed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{trace, warn};

use crate::args::NodeArgs;
use crate::config::GssConfig;
use crate::node::Node;
use crate::sync::SyncNode;
use crate::{err_msg, ErrorContext, GssError};

#[derive(Debug)]
struct BudgetState {
    label: String,
    limit: Option<usize>,
    live: AtomicUsize,
    peak: AtomicUsize,
}

/// A shared counter of live nodes with an optional ceiling.
///
/// Cloning a budget shares it.
///
/// # Examples
///
/// ```rust
/// use gss::{NodeBudget, Value};
/// let budget = NodeBudget::with_limit(1).unwrap();
/// let first = budget.node(Value::from(1.0)).unwrap();
/// assert!(budget.node(Value::from(2.0)).is_err());
/// drop(first);
/// assert_eq!(budget.live(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct NodeBudget {
    state: Arc<BudgetState>,
}

impl NodeBudget {
    fn build(label: String, limit: Option<usize>) -> Result<Self, GssError> {
        if limit == Some(0) {
            return Err(err_msg!(Config, "max_live_nodes must be at least 1"));
        }
        Ok(Self {
            state: Arc::new(BudgetState {
                label,
                limit,
                live: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        })
    }

    pub fn unlimited() -> Self {
        Self {
            state: Arc::new(BudgetState {
                label: GssConfig::DEFAULT_LABEL.to_string(),
                limit: None,
                live: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// # Errors
    ///
    /// A ceiling of zero is rejected with [`GssError::Config`], matching
    /// [`GssConfig`] validation.
    pub fn with_limit(max_live_nodes: usize) -> Result<Self, GssError> {
        Self::build(GssConfig::DEFAULT_LABEL.to_string(), Some(max_live_nodes))
    }

    /// # Errors
    ///
    /// Rejects a hand-built config whose `max_live_nodes` is zero.
    pub fn from_config(config: &GssConfig) -> Result<Self, GssError> {
        Self::build(config.label.clone(), config.max_live_nodes)
    }

    pub fn label(&self) -> &str {
        &self.state.label
    }

    pub fn limit(&self) -> Option<usize> {
        self.state.limit
    }

    /// Nodes built through this budget that are still alive.
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::Acquire)
    }

    /// The highest `live` value ever observed.
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::Acquire)
    }

    pub(crate) fn acquire(&self) -> Result<Lease, GssError> {
        let state = &self.state;
        let mut current = state.live.load(Ordering::Acquire);
        loop {
            if let Some(limit) = state.limit {
                if current >= limit {
                    warn!(label = %state.label, live = current, limit, "gss node budget exhausted");
                    return Err(GssError::Allocation {
                        message: format!(
                            "cannot allocate node: {} of {} live nodes in use",
                            current, limit
                        ),
                        ctx: ErrorContext::with_help(
                            "release abandoned stack branches or raise `max_live_nodes`",
                        ),
                        source: None,
                    });
                }
            }
            match state.live.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        let live = current + 1;
        state.peak.fetch_max(live, Ordering::AcqRel);
        trace!(label = %state.label, live, limit = ?state.limit, "gss node allocated");
        Ok(Lease {
            state: Arc::clone(state),
        })
    }

    pub fn node<T>(&self, payload: T) -> Result<Node<T>, GssError> {
        Ok(Node::from_parts(payload, Some(self.acquire()?)))
    }

    /// A node holding the empty payload.
    pub fn empty_node<T: Default>(&self) -> Result<Node<T>, GssError> {
        self.node(T::default())
    }

    /// Validates `args` before touching the budget, so a malformed call
    /// consumes nothing.
    pub fn node_from_args<T: Default>(&self, args: NodeArgs<T>) -> Result<Node<T>, GssError> {
        let payload = args.into_payload()?.unwrap_or_default();
        self.node(payload)
    }

    pub fn sync_node<T>(&self, payload: T) -> Result<SyncNode<T>, GssError> {
        Ok(SyncNode::from_parts(payload, Some(self.acquire()?)))
    }

    pub fn sync_node_from_args<T: Default>(
        &self,
        args: NodeArgs<T>,
    ) -> Result<SyncNode<T>, GssError> {
        let payload = args.into_payload()?.unwrap_or_default();
        self.sync_node(payload)
    }
}

impl Default for NodeBudget {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// One slot of a budget, held by a live node.
#[derive(Debug)]
pub(crate) struct Lease {
    state: Arc<BudgetState>,
}

impl Drop for Lease {
    fn drop(&mut self) {
        let live = self.state.live.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
        trace!(label = %self.state.label, live, "gss node released");
    }
}
