// tests/node_tests.rs

mod common;

use std::rc::Rc;

use common::DropTracker;
use gss::{ErrorType, Node, NodeArgs, NodeBudget, Value};

// ---
// Construction
// ---

#[test]
fn test_default_payload_is_empty() {
    for node in [Node::<Value>::new(), Node::from_args(NodeArgs::new()).unwrap()] {
        assert!(node.get_payload().is_nil());
    }
}

#[test]
fn test_construct_positional_and_keyword() {
    let by_position = Node::from_args(NodeArgs::new().positional(Value::from("s3"))).unwrap();
    let by_keyword = Node::from_args(NodeArgs::new().keyword("data", Value::from("s3"))).unwrap();
    assert_eq!(by_position.get_payload(), by_keyword.get_payload());
    assert_ne!(by_position, by_keyword);
}

#[test]
fn test_argument_validation_creates_no_node() {
    let tracker = DropTracker::new();
    let two = NodeArgs::new()
        .positional(Some(tracker.payload("a")))
        .positional(Some(tracker.payload("b")));
    let err = Node::from_args(two).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Argument);
    // Rejected payloads are released, not captured by a half-built node.
    assert_eq!(tracker.drops(), 2);

    let bogus = NodeArgs::new().keyword("bogus_kw", Value::from(1i64));
    let err = Node::from_args(bogus).unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Argument);

    let crowded = NodeArgs::new()
        .positional(Value::Nil)
        .positional(Value::Nil)
        .keyword("bogus_kw", Value::Nil);
    let err = Node::from_args(crowded).unwrap_err();
    assert_eq!(err.message(), "function takes at most 1 argument (3 given)");
}

// ---
// Payload access
// ---

#[test]
fn test_round_trip_preserves_identity() {
    let shared = Rc::new(String::from("tree fragment"));
    let node = Node::with_payload(Rc::clone(&shared));
    assert!(Rc::ptr_eq(&node.get_payload(), &shared));

    let child = Node::<Value>::new();
    let parent = Node::with_payload(Value::Node(child.clone()));
    let observed = parent.get_payload();
    assert!(observed.as_node().is_some_and(|n| n.ptr_eq(&child)));
}

#[test]
fn test_replacement_releases_previous_exactly_once() {
    let v1 = Rc::new(1u32);
    let v2 = Rc::new(2u32);
    let node = Node::with_payload(Rc::new(0u32));

    node.set_payload(Rc::clone(&v1));
    assert_eq!(Rc::strong_count(&v1), 2);
    node.set_payload(Rc::clone(&v2));
    assert_eq!(Rc::strong_count(&v1), 1);
    assert_eq!(Rc::strong_count(&v2), 2);
    assert_eq!(*node.get_payload(), 2);
}

#[test]
fn test_replacement_with_tracked_payloads() {
    let tracker = DropTracker::new();
    let node = Node::with_payload(tracker.payload("first"));
    node.set_payload(tracker.payload("second"));
    assert_eq!(tracker.drops(), 1);
    assert_eq!(node.with_payload_ref(|p| p.tag), "second");
    drop(node);
    assert_eq!(tracker.drops(), 2);
}

// ---
// Ownership and lifecycle
// ---

#[test]
fn test_shared_holders_keep_node_alive() {
    let node = Node::with_payload(Value::from("s7"));
    let predecessor_list = vec![node.clone()];
    let active_heads = vec![node.clone()];
    drop(node);
    drop(predecessor_list);
    assert_eq!(active_heads[0].ref_count(), 1);
    assert_eq!(active_heads[0].get_payload().as_str(), Some("s7"));
}

#[test]
fn test_destruction_releases_payload_once() {
    let payload = Rc::new(String::from("state"));
    let node = Node::with_payload(Rc::clone(&payload));
    let alias = node.clone();
    drop(node);
    assert_eq!(Rc::strong_count(&payload), 2);
    drop(alias);
    assert_eq!(Rc::strong_count(&payload), 1);
}

#[test]
fn test_nested_node_payload_released_transitively() {
    let leaf = Node::with_payload(Value::from("s0"));
    let weak_leaf = leaf.downgrade();
    let mid = Node::with_payload(Value::Node(leaf));
    let top = Node::with_payload(Value::Node(mid));
    assert!(weak_leaf.is_alive());
    drop(top);
    assert!(!weak_leaf.is_alive());
}

#[test]
fn test_shared_tail_outlives_one_branch() {
    // Two stacks merged on a common tail.
    let tail = Node::with_payload(Value::from("s0"));
    let left = Node::with_payload(Value::Node(tail.clone()));
    let right = Node::with_payload(Value::Node(tail.clone()));
    let weak_tail = tail.downgrade();
    drop(tail);

    drop(left);
    assert!(weak_tail.is_alive());
    assert_eq!(
        right.get_payload().as_node().map(|n| n.get_payload()),
        Some(Value::from("s0"))
    );
    drop(right);
    assert!(!weak_tail.is_alive());
}

// ---
// Long stacks
// ---

fn build_chain(frames: usize) -> (Node, gss::WeakNode) {
    let bottom = Node::with_payload(Value::from("s0"));
    let weak_bottom = bottom.downgrade();
    let mut head = bottom;
    for _ in 0..frames {
        head = Node::with_payload(Value::Node(head));
    }
    (head, weak_bottom)
}

#[test]
fn test_dropping_million_frame_stack_terminates() {
    let (head, weak_bottom) = build_chain(1_000_000);
    drop(head);
    assert!(!weak_bottom.is_alive());
}

#[test]
fn test_long_stack_release_stops_at_shared_frame() {
    let (head, weak_bottom) = build_chain(100_000);
    // Walk down to a frame that a second branch also holds.
    let mut shared = head.clone();
    for _ in 0..50_000 {
        let next = shared.get_payload().as_node().cloned().unwrap();
        shared = next;
    }
    let below = shared.get_payload();
    drop(head);
    assert_eq!(shared.ref_count(), 1);
    assert_eq!(shared.get_payload(), below);
    assert!(weak_bottom.is_alive());
    drop(below);
    drop(shared);
    assert!(!weak_bottom.is_alive());
}

#[test]
fn test_long_stack_inside_list_payload() {
    let (head, weak_bottom) = build_chain(200_000);
    let holder = Node::with_payload(Value::from(vec![Value::Nil, Value::Node(head)]));
    drop(holder);
    assert!(!weak_bottom.is_alive());
}

// ---
// Cycles
// ---

#[test]
fn test_self_referential_payload_does_not_crash() {
    let node = Node::<Value>::new();
    node.set_payload(Value::Node(node.clone()));
    assert_eq!(node.ref_count(), 2);
    let weak = node.downgrade();
    drop(node);
    // Known limitation: the cycle keeps the node alive.
    let survivor = weak.upgrade().unwrap();
    survivor.take_payload();
    drop(survivor);
    assert!(!weak.is_alive());
}

#[test]
fn test_two_node_cycle_broken_externally() {
    let a = Node::<Value>::new();
    let b = Node::with_payload(Value::Node(a.clone()));
    a.set_payload(Value::Node(b.clone()));
    let (weak_a, weak_b) = (a.downgrade(), b.downgrade());
    drop(b);
    // Releasing a's payload drops the last handle to b, which drops b's
    // handle to a while a is being updated.
    a.set_payload(Value::Nil);
    assert!(!weak_b.is_alive());
    assert_eq!(a.ref_count(), 1);
    drop(a);
    assert!(!weak_a.is_alive());
}

// ---
// Budgeted construction
// ---

#[test]
fn test_budget_counts_stack_growth() {
    let budget = NodeBudget::with_limit(3).unwrap();
    let s0 = budget.node(Value::from("s0")).unwrap();
    let s1 = budget.node(Value::Node(s0)).unwrap();
    let s2 = budget.node(Value::Node(s1)).unwrap();
    let err = budget.empty_node::<Value>().unwrap_err();
    assert_eq!(err.error_type(), ErrorType::Allocation);

    drop(s2);
    assert_eq!(budget.live(), 0);
    assert_eq!(budget.peak(), 3);
}
