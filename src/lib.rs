//! Nodes for a graph-structured stack (GSS), the structure a generalized LR
//! parser uses to keep every live parse stack at once while sharing their
//! common tails.
//!
//! This crate provides the node primitive only: a shared-ownership cell with
//! one payload. Edges are expressed by storing nodes inside payloads; merge,
//! path enumeration and the parser driver belong to higher layers.
//!
//! Reference counting does not reclaim cycles. A node whose payload reaches
//! back to itself stays alive until some holder clears the payload with
//! [`Node::take_payload`] or [`Node::set_payload`].

pub use crate::args::NodeArgs;
pub use crate::budget::NodeBudget;
pub use crate::config::GssConfig;
pub use crate::diagnostics::{ErrorContext, ErrorType, GssError, Span};
pub use crate::node::{Node, NodeId, WeakNode};
pub use crate::sync::{SyncNode, WeakSyncNode};
pub use crate::value::Value;

pub mod args;
pub mod budget;
pub mod config;
pub mod diagnostics;
pub mod node;
pub mod sync;
pub mod value;
