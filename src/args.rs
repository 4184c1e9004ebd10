//! Argument shape accepted by node construction.
//!
//! A node takes a single optional payload, supplied either positionally or
//! as the keyword `data`. Higher layers that forward dynamically shaped calls
//! (an embedding interpreter, a table-driven parser driver) build a
//! [`NodeArgs`] and let the node validate it.

use crate::{err_msg, GssError};

/// The only keyword a node constructor understands.
pub const PAYLOAD_KEYWORD: &str = "data";

/// Positional and keyword arguments for one construction call.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeArgs<T> {
    positional: Vec<T>,
    keywords: Vec<(String, T)>,
}

impl<T> NodeArgs<T> {
    pub fn new() -> Self {
        Self {
            positional: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn positional(mut self, value: T) -> Self {
        self.positional.push(value);
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, value: T) -> Self {
        self.keywords.push((name.into(), value));
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks the shape and yields the payload, if one was supplied.
    ///
    /// Accepts no arguments, one positional argument, or the single keyword
    /// `data`. Anything else is an [`GssError::Argument`]; the argument count
    /// is checked before keyword names.
    pub fn into_payload(self) -> Result<Option<T>, GssError> {
        let given = self.len();
        if given > 1 {
            return Err(err_msg!(
                Argument,
                "function takes at most 1 argument ({} given)",
                given
            ));
        }

        let NodeArgs {
            mut positional,
            mut keywords,
        } = self;
        if let Some((name, value)) = keywords.pop() {
            if name != PAYLOAD_KEYWORD {
                return Err(err_msg!(
                    Argument,
                    "'{}' is an invalid keyword argument for this function",
                    name
                ));
            }
            return Ok(Some(value));
        }
        Ok(positional.pop())
    }
}

impl<T> Default for NodeArgs<T> {
    fn default() -> Self {
        Self::new()
    }
}
