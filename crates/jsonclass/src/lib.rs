// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Adapter-based JSON (de)serialization with round-trip class recovery.
//!
//! Values without a native JSON form are reduced to mappings by registered
//! dumpers. Each dumped mapping is tagged with the adapter that produced it
//! and the class of the original value, so the decoder can find the
//! matching loader and rebuild the value.
//!
//! # Architecture
//!
//! ```text
//!   Node tree --> Codec::encode --(per object)--> dumper --> tagged mapping --> JSON text
//!   JSON text --> Codec::decode --(per mapping, innermost first)--> loader --> Node tree
//!                         |
//!                         v
//!                     Registry (classes, capabilities, adapters)
//! ```
//!
//! # Example
//!
//! ```
//! use jsonclass::{Adapter, Class, ClassRef, Codec, Fields, Instance, Node, Registry, ShapeError};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point {
//!     x: i64,
//!     y: i64,
//! }
//!
//! let mut registry = Registry::new();
//! registry.register_class(Class::<Point>::new("geo.Point")).unwrap();
//! registry
//!     .register_adapter(
//!         Adapter::new("geo.PointAdapter")
//!             .dumps_with(|p: &Point| [("x", p.x), ("y", p.y)].into_iter().collect())
//!             .loads_with(|_: &ClassRef<'_>, mut f: Fields| -> Result<Instance, ShapeError> {
//!                 Ok(Instance::new(Point {
//!                     x: f.take_i64("x")?,
//!                     y: f.take_i64("y")?,
//!                 }))
//!             }),
//!     )
//!     .unwrap();
//!
//! let codec = Codec::new(&registry);
//! let text = codec.dumps(&Node::object(Point { x: 1, y: 2 })).unwrap();
//! assert_eq!(text, r#"{"__json_class__":"geo.PointAdapter:geo.Point","x":1,"y":2}"#);
//!
//! let node = codec.loads(&text).unwrap();
//! assert_eq!(node.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
//! ```

pub mod capability;
pub mod codec;
pub mod config;
pub mod envelope;
pub mod error;
pub mod ingress;
pub mod node;
pub mod record;
pub mod registry;

pub use capability::{Capability, Dump, Fields, Load};
pub use codec::{dumps, from_reader, loads, to_writer, Codec};
pub use config::{CodecConfig, ConfigError};
pub use envelope::{EnvelopeTag, QualifiedName, JSON_CLASS_KEY};
pub use error::{Error, RegistryError, Result, ShapeError};
pub use ingress::{read_json_body, render_json, BodyLimits, ContentType, JSON_CONTENT_TYPE};
pub use node::{Instance, Map, Node};
pub use record::{register_record_adapter, Record, RecordAdapter, Records};
pub use registry::{Adapter, Class, ClassRef, DumperRef, Registry};
