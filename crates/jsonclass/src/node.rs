// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process value tree.
//!
//! A [`Node`] is a JSON-shaped tree that may additionally carry opaque
//! [`Instance`]s. The encoder hands instances to registered dumpers; the
//! decoder puts the values built by loaders back into the tree.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::error::{Error, Result};

/// String-keyed mapping of nodes.
pub type Map = BTreeMap<String, Node>;

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// An owned, type-erased application value.
pub struct Instance {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Instance {
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// Runtime type of the wrapped value.
    pub fn value_type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Take the value back out, or return `self` untouched on type mismatch.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(v) => Ok(*v),
            Err(value) => Err(Instance { type_name, value }),
        }
    }

    pub(crate) fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub(crate) fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut *self.value
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance<{}>", self.type_name)
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// JSON-shaped tree with room for adapted objects.
#[derive(Debug)]
pub enum Node {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Node>),
    Map(Map),
    Object(Instance),
}

impl Node {
    /// Wrap an application value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Node::Object(Instance::new(value))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Map(_) => "mapping",
            Node::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Node::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Node>> {
        match self {
            Node::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Node::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Node::Object(i) => Some(i),
            _ => None,
        }
    }

    /// Borrow the wrapped application value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_instance().and_then(Instance::downcast_ref)
    }

    /// Convert to a plain JSON value.
    ///
    /// Fails with [`Error::NotSerializable`] if any object is left in the
    /// tree; use a [`Codec`](crate::Codec) to dump objects first.
    pub fn into_value(self) -> Result<Value> {
        Ok(match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(b),
            Node::Number(n) => Value::Number(n),
            Node::String(s) => Value::String(s),
            Node::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(Node::into_value)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Node::Map(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k, v.into_value()?);
                }
                Value::Object(out)
            }
            Node::Object(inst) => return Err(Error::NotSerializable(inst.type_name())),
        })
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::Null
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => Node::Map(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect()),
        }
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty)*) => {$(
        impl From<$t> for Node {
            fn from(n: $t) -> Self {
                Node::Number(Number::from(n))
            }
        }
    )*};
}

from_integer!(i8 i16 i32 i64 isize u8 u16 u32 u64 usize);

impl From<f64> for Node {
    /// NaN and infinities have no JSON spelling and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Node::Null, Node::Number)
    }
}

impl From<f32> for Node {
    fn from(f: f32) -> Self {
        Node::from(f64::from(f))
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<Map> for Node {
    fn from(m: Map) -> Self {
        Node::Map(m)
    }
}

impl From<Instance> for Node {
    fn from(i: Instance) -> Self {
        Node::Object(i)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(items: Vec<T>) -> Self {
        Node::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Node::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Node>> FromIterator<(K, V)> for Node {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Node::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Marker(u8);

    #[test]
    fn plain_value_survives_node_conversion() {
        let v = json!({"a": [1, 2.5, "x", null, true], "b": {"c": -3}});
        let node = Node::from(v.clone());
        assert_eq!(node.into_value().unwrap(), v);
    }

    #[test]
    fn into_value_rejects_objects() {
        let node: Node = vec![Node::from(1), Node::object(Marker(7))].into();
        match node.into_value() {
            Err(Error::NotSerializable(name)) => assert!(name.ends_with("Marker")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_finite_float_becomes_null() {
        assert!(Node::from(f64::NAN).is_null());
        assert!(Node::from(f64::INFINITY).is_null());
        assert_eq!(Node::from(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn instance_downcast_round_trip() {
        let inst = Instance::new(Marker(3));
        assert!(inst.is::<Marker>());
        assert_eq!(inst.value_type_id(), TypeId::of::<Marker>());

        let inst = inst.downcast::<String>().unwrap_err();
        assert_eq!(inst.downcast::<Marker>().unwrap(), Marker(3));
    }

    #[test]
    fn collect_pairs_into_map() {
        let node: Node = [("x", 1), ("y", 2)].into_iter().collect();
        let map = node.as_map().unwrap();
        assert_eq!(map["x"].as_i64(), Some(1));
        assert_eq!(map["y"].as_i64(), Some(2));
    }
}
