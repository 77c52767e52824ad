// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dumper and loader capabilities.
//!
//! A dumper reduces a value to a [`Node::Map`]; a loader rebuilds a value
//! from the mapping once the envelope tag has been removed. Dumpers either
//! target one concrete type or a [`Capability`] that many classes provide.

use std::any::Any;

use crate::error::ShapeError;
use crate::node::{Instance, Map, Node};
use crate::registry::ClassRef;

/// Marker for a trait-object view shared by several classes.
///
/// ```
/// use jsonclass::Capability;
///
/// pub trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// pub struct Shapes;
///
/// impl Capability for Shapes {
///     type View = dyn Shape;
/// }
/// ```
pub trait Capability: 'static {
    type View: ?Sized + 'static;
}

/// Reduces a value to primitives.
///
/// The returned node must be a [`Node::Map`]; anything else is reported as
/// a contract violation by the codec. Nested [`Node::Object`]s are allowed
/// and are dumped in turn by the encoder.
pub trait Dump<T: ?Sized>: Send + Sync + 'static {
    fn to_json_repr(&self, value: &T) -> Node;
}

impl<T: ?Sized, F> Dump<T> for F
where
    F: Fn(&T) -> Node + Send + Sync + 'static,
{
    fn to_json_repr(&self, value: &T) -> Node {
        self(value)
    }
}

/// Rebuilds a value of the resolved class from a dumped mapping.
pub trait Load: Send + Sync + 'static {
    fn from_json_repr(&self, class: &ClassRef<'_>, fields: Fields) -> Result<Instance, ShapeError>;
}

impl<F> Load for F
where
    F: Fn(&ClassRef<'_>, Fields) -> Result<Instance, ShapeError> + Send + Sync + 'static,
{
    fn from_json_repr(&self, class: &ClassRef<'_>, fields: Fields) -> Result<Instance, ShapeError> {
        self(class, fields)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Mapping handed to a loader, with typed extraction helpers.
#[derive(Debug, Default)]
pub struct Fields {
    map: Map,
}

impl Fields {
    pub fn new(map: Map) -> Self {
        Fields { map }
    }

    /// Remove a field of any shape.
    pub fn take(&mut self, key: &str) -> Result<Node, ShapeError> {
        self.map
            .remove(key)
            .ok_or_else(|| ShapeError::Missing(key.to_string()))
    }

    /// Remove a field if present.
    pub fn take_opt(&mut self, key: &str) -> Option<Node> {
        self.map.remove(key)
    }

    pub fn take_i64(&mut self, key: &str) -> Result<i64, ShapeError> {
        self.take_with(key, "an integer", |n| n.as_i64())
    }

    pub fn take_u64(&mut self, key: &str) -> Result<u64, ShapeError> {
        self.take_with(key, "an unsigned integer", |n| n.as_u64())
    }

    pub fn take_f64(&mut self, key: &str) -> Result<f64, ShapeError> {
        self.take_with(key, "a number", |n| n.as_f64())
    }

    pub fn take_bool(&mut self, key: &str) -> Result<bool, ShapeError> {
        self.take_with(key, "a boolean", |n| n.as_bool())
    }

    pub fn take_string(&mut self, key: &str) -> Result<String, ShapeError> {
        match self.take(key)? {
            Node::String(s) => Ok(s),
            _ => Err(wrong_type(key, "a string")),
        }
    }

    /// Remove a nested object that was already rebuilt by its own loader.
    pub fn take_instance<T: Any>(&mut self, key: &str) -> Result<T, ShapeError> {
        match self.take(key)? {
            Node::Object(inst) => inst
                .downcast::<T>()
                .map_err(|_| wrong_type(key, std::any::type_name::<T>())),
            _ => Err(wrong_type(key, std::any::type_name::<T>())),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Keys not taken yet.
    pub fn remaining(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_map(self) -> Map {
        self.map
    }

    fn take_with<T>(
        &mut self,
        key: &str,
        expected: &'static str,
        extract: impl FnOnce(&Node) -> Option<T>,
    ) -> Result<T, ShapeError> {
        let node = self.take(key)?;
        extract(&node).ok_or_else(|| wrong_type(key, expected))
    }
}

impl IntoIterator for Fields {
    type Item = (String, Node);
    type IntoIter = std::collections::btree_map::IntoIter<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

fn wrong_type(field: &str, expected: &'static str) -> ShapeError {
    ShapeError::WrongType {
        field: field.to_string(),
        expected,
    }
}
