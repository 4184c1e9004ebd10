//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

/// Counts how many times values made by one tracker are dropped.
#[derive(Debug, Default, Clone)]
pub struct DropTracker {
    drops: Rc<Cell<usize>>,
}

impl DropTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self, tag: &'static str) -> TrackedPayload {
        TrackedPayload {
            tag,
            drops: Rc::clone(&self.drops),
        }
    }

    pub fn drops(&self) -> usize {
        self.drops.get()
    }
}

/// A payload that records its own release.
#[derive(Debug)]
pub struct TrackedPayload {
    pub tag: &'static str,
    drops: Rc<Cell<usize>>,
}

impl Drop for TrackedPayload {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}
