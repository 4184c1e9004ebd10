use std::fmt;

use im::HashMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::node::Node;

/// A dynamically typed node payload.
///
/// `Nil` is the empty payload every node starts with when none is supplied.
/// A `Node` payload is what links one stack frame to another.
///
/// # Examples
///
/// ```rust
/// use gss::Value;
/// let state = Value::Number(12.0);
/// assert_eq!(state.type_name(), "Number");
/// let nil = Value::default();
/// assert!(nil.is_nil());
/// ```
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    Node(Node<Value>),
}

impl Value {
    /// Returns the type name of the value as a string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::{Node, Value};
    /// assert_eq!(Value::Bool(true).type_name(), "Bool");
    /// assert_eq!(Value::Node(Node::new()).type_name(), "Node");
    /// ```
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
        }
    }

    /// Returns true if the value is the empty payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::Value;
    /// assert!(Value::Nil.is_nil());
    /// assert!(!Value::Number(1.0).is_nil());
    /// ```
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Returns the contained number if this is a Number value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::Value;
    /// assert_eq!(Value::Number(7.0).as_number(), Some(7.0));
    /// assert_eq!(Value::from("s7").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the contained bool if this is a Bool value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::Value;
    /// assert_eq!(Value::Bool(false).as_bool(), Some(false));
    /// assert_eq!(Value::Nil.as_bool(), None);
    /// ```
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the contained string slice if this is a String value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::Value;
    /// assert_eq!(Value::from("shift").as_str(), Some("shift"));
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the nested node if this payload links to one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gss::{Node, Value};
    /// let tail = Node::<Value>::new();
    /// let link = Value::Node(tail.clone());
    /// assert!(link.as_node().is_some_and(|n| n.ptr_eq(&tail)));
    /// assert!(Value::Nil.as_node().is_none());
    /// ```
    pub fn as_node(&self) -> Option<&Node<Value>> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Display formatting helpers
    // ------------------------------------------------------------------------

    /// Writes list items space-separated inside parentheses.
    fn fmt_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
        write!(f, "(")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, ")")
    }

    /// Writes map entries as `{key: value, ...}`.
    fn fmt_map(f: &mut fmt::Formatter<'_>, map: &HashMap<String, Value>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for (k, v) in map.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
            first = false;
        }
        write!(f, "}}")
    }
}

// Nested nodes render as their id only, so cyclic payloads format finitely.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => Value::fmt_list(f, items),
            Value::Map(map) => Value::fmt_map(f, map),
            Value::Node(node) => write!(f, "<node {}>", node.id()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Node(node) => f.debug_tuple("Node").field(&node.id()).finish(),
        }
    }
}

// Releasing the last handle of a stack chain would otherwise recurse once per
// frame. Frames owned only by the chain are unlinked one at a time instead.
impl Drop for Value {
    fn drop(&mut self) {
        let Value::Node(node) = self else { return };
        let mut next = node.take_unique_tail();
        while let Some(frame) = next {
            next = frame.take_unique_tail();
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Node(node) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("node", &node.id())?;
                out.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Node<Value>> for Value {
    fn from(node: Node<Value>) -> Self {
        Value::Node(node)
    }
}
