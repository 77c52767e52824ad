// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dump and load paths.
//!
//! The encoder walks a [`Node`] tree and calls [`Codec::serialize_default`]
//! for every object it meets; the decoder builds the tree bottom-up and
//! calls [`Codec::deserialize_object_hook`] on every mapping, so nested
//! envelopes are already rebuilt when the enclosing one is loaded.

use std::io::{Read, Write};

use serde_json::Value;

use crate::capability::Fields;
use crate::envelope::{EnvelopeTag, JSON_CLASS_KEY};
use crate::error::{Error, Result};
use crate::node::{Instance, Map, Node};
use crate::registry::{self, Registry};

/// Encoder/decoder bound to a registry.
#[derive(Clone, Copy)]
pub struct Codec<'r> {
    registry: &'r Registry,
    pretty: bool,
}

impl<'r> Codec<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Codec {
            registry,
            pretty: false,
        }
    }

    /// Indent text produced by [`Codec::dumps`] and [`Codec::to_writer`].
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    // -----------------------------------------------------------------------
    // Dump path
    // -----------------------------------------------------------------------

    /// Replace an object by its tagged mapping.
    ///
    /// Anything that is not an object, or an object without a dumper, is
    /// returned unchanged.
    pub fn serialize_default(&self, node: Node) -> Result<Node> {
        match node {
            Node::Object(inst) => Ok(match self.dump_instance(&inst)? {
                Some(map) => Node::Map(map),
                None => Node::Object(inst),
            }),
            other => Ok(other),
        }
    }

    fn dump_instance(&self, inst: &Instance) -> Result<Option<Map>> {
        let Some(dumper) = self.registry.lookup_dumper(inst) else {
            return Ok(None);
        };
        match dumper.dump(inst) {
            Some(Node::Map(mut map)) => {
                map.insert(
                    JSON_CLASS_KEY.to_string(),
                    Node::String(dumper.tag().to_string()),
                );
                Ok(Some(map))
            }
            Some(other) => Err(Error::ContractViolation {
                adapter: dumper.adapter().to_string(),
                found: other.kind(),
            }),
            None => Ok(None),
        }
    }

    /// Encode a tree to a plain JSON value.
    pub fn encode(&self, node: &Node) -> Result<Value> {
        Ok(match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.encode(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Node::Map(map) => Value::Object(self.encode_map(map)?),
            Node::Object(inst) => match self.dump_instance(inst)? {
                Some(map) => Value::Object(self.encode_map(&map)?),
                None => return Err(Error::NotSerializable(inst.type_name())),
            },
        })
    }

    fn encode_map(&self, map: &Map) -> Result<serde_json::Map<String, Value>> {
        let mut out = serde_json::Map::new();
        for (key, value) in map {
            out.insert(key.clone(), self.encode(value)?);
        }
        Ok(out)
    }

    pub fn dumps(&self, node: &Node) -> Result<String> {
        let value = self.encode(node)?;
        Ok(if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }

    pub fn to_writer<W: Write>(&self, writer: W, node: &Node) -> Result<()> {
        let value = self.encode(node)?;
        if self.pretty {
            serde_json::to_writer_pretty(writer, &value)?;
        } else {
            serde_json::to_writer(writer, &value)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Load path
    // -----------------------------------------------------------------------

    /// Rebuild the value described by a tagged mapping.
    ///
    /// A mapping without the reserved key is returned unchanged. The tag is
    /// removed before the loader sees the remaining fields.
    pub fn deserialize_object_hook(&self, mut map: Map) -> Result<Node> {
        let Some(raw) = map.remove(JSON_CLASS_KEY) else {
            return Ok(Node::Map(map));
        };
        let tag: EnvelopeTag = match raw {
            Node::String(s) => s.parse()?,
            other => return Err(Error::MalformedTag(format!("<{}>", other.kind()))),
        };

        let loader = self.registry.lookup_loader(tag.adapter.as_str())?;
        let class = self.registry.resolve_class(tag.class.as_str())?;
        log::trace!("[codec] loading {} with {}", class.name(), tag.adapter);

        loader
            .from_json_repr(&class, Fields::new(map))
            .map(Node::Object)
            .map_err(|source| Error::Adapter {
                adapter: tag.adapter.to_string(),
                class: tag.class.to_string(),
                source,
            })
    }

    /// Decode a plain JSON value, innermost mappings first.
    pub fn decode(&self, value: Value) -> Result<Node> {
        match value {
            Value::Array(items) => Ok(Node::Array(
                items
                    .into_iter()
                    .map(|item| self.decode(item))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Value::Object(obj) => {
                let mut map = Map::new();
                for (key, value) in obj {
                    map.insert(key, self.decode(value)?);
                }
                self.deserialize_object_hook(map)
            }
            scalar => Ok(Node::from(scalar)),
        }
    }

    pub fn loads(&self, text: &str) -> Result<Node> {
        self.decode(serde_json::from_str(text)?)
    }

    pub fn from_slice(&self, bytes: &[u8]) -> Result<Node> {
        self.decode(serde_json::from_slice(bytes)?)
    }

    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Node> {
        self.decode(serde_json::from_reader(reader)?)
    }
}

impl Codec<'static> {
    /// Codec over the process-wide registry.
    pub fn global() -> Self {
        Codec::new(registry::global())
    }
}

impl std::fmt::Debug for Codec<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("classes", &self.registry.class_names())
            .field("pretty", &self.pretty)
            .finish()
    }
}

/// [`Codec::dumps`] over the process-wide registry.
pub fn dumps(node: &Node) -> Result<String> {
    Codec::global().dumps(node)
}

/// [`Codec::to_writer`] over the process-wide registry.
pub fn to_writer<W: Write>(writer: W, node: &Node) -> Result<()> {
    Codec::global().to_writer(writer, node)
}

/// [`Codec::loads`] over the process-wide registry.
pub fn loads(text: &str) -> Result<Node> {
    Codec::global().loads(text)
}

/// [`Codec::from_reader`] over the process-wide registry.
pub fn from_reader<R: Read>(reader: R) -> Result<Node> {
    Codec::global().from_reader(reader)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
