// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Column-based records.
//!
//! Persistent models (ORM rows and the like) expose their declared columns
//! through [`Record`]. A single [`RecordAdapter`] then dumps every class
//! providing the [`Records`] capability and loads it back column by column.

use crate::capability::{Capability, Dump, Fields, Load};
use crate::error::{RegistryError, ShapeError};
use crate::node::{Instance, Map, Node};
use crate::registry::{Adapter, ClassRef, Registry};

/// Model with a fixed set of persisted columns.
pub trait Record {
    /// Declared column names.
    fn columns(&self) -> &'static [&'static str];

    /// Current value of `column`, `None` if it is not a column.
    fn get(&self, column: &str) -> Option<Node>;

    /// Assign `column`. Unknown columns and ill-typed values are errors.
    fn set(&mut self, column: &str, value: Node) -> Result<(), ShapeError>;
}

/// Capability provided by [`Record`] classes.
pub struct Records;

impl Capability for Records {
    type View = dyn Record;
}

/// Dumps and loads any class providing [`Records`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAdapter;

impl Dump<dyn Record> for RecordAdapter {
    fn to_json_repr(&self, record: &(dyn Record + 'static)) -> Node {
        let map: Map = record
            .columns()
            .iter()
            .map(|&column| {
                let value = record.get(column).unwrap_or_default();
                (column.to_string(), value)
            })
            .collect();
        Node::Map(map)
    }
}

impl Load for RecordAdapter {
    fn from_json_repr(&self, class: &ClassRef<'_>, fields: Fields) -> Result<Instance, ShapeError> {
        let mut instance = class
            .construct()
            .ok_or_else(|| ShapeError::custom(format!("class {} has no constructor", class.name())))?;
        let record = class
            .view_mut::<Records>(&mut instance)
            .ok_or_else(|| ShapeError::custom(format!("class {} is not a record", class.name())))?;
        for (column, value) in fields {
            record.set(&column, value)?;
        }
        Ok(instance)
    }
}

/// Register [`RecordAdapter`] under `name` as dumper and loader.
pub fn register_record_adapter(registry: &mut Registry, name: &str) -> Result<(), RegistryError> {
    registry.register_adapter(
        Adapter::new(name)
            .dumps_capability::<Records, _>(RecordAdapter)
            .loads(RecordAdapter),
    )
}

/// Projection helpers for [`Class::provides`](crate::Class::provides).
pub fn as_record<T: Record + 'static>(value: &T) -> &(dyn Record + 'static) {
    value
}

pub fn as_record_mut<T: Record + 'static>(value: &mut T) -> &mut (dyn Record + 'static) {
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Class;

    #[derive(Debug, Default, PartialEq)]
    struct Model {
        column_a: i64,
        column_b: String,
        transient: u32,
    }

    impl Record for Model {
        fn columns(&self) -> &'static [&'static str] {
            &["column_a", "column_b"]
        }

        fn get(&self, column: &str) -> Option<Node> {
            match column {
                "column_a" => Some(self.column_a.into()),
                "column_b" => Some(self.column_b.as_str().into()),
                _ => None,
            }
        }

        fn set(&mut self, column: &str, value: Node) -> Result<(), ShapeError> {
            match column {
                "column_a" => {
                    self.column_a = value.as_i64().ok_or_else(|| ShapeError::WrongType {
                        field: column.to_string(),
                        expected: "an integer",
                    })?
                }
                "column_b" => {
                    self.column_b = value
                        .as_str()
                        .ok_or_else(|| ShapeError::WrongType {
                            field: column.to_string(),
                            expected: "a string",
                        })?
                        .to_string()
                }
                _ => return Err(ShapeError::Unknown(column.to_string())),
            }
            Ok(())
        }
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register_class(
            Class::<Model>::new("app.Model")
                .default_constructor()
                .provides::<Records>(as_record, as_record_mut),
        )
        .unwrap();
        register_record_adapter(&mut reg, "jsonclass.RecordAdapter").unwrap();
        reg
    }

    #[test]
    fn dumps_declared_columns_only() {
        let reg = registry();
        let model = Model {
            column_a: 5,
            column_b: "xyz".into(),
            transient: 9,
        };
        let inst = Instance::new(model);
        let node = reg.lookup_dumper(&inst).unwrap().dump(&inst).unwrap();
        let map = node.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["column_a"].as_i64(), Some(5));
        assert_eq!(map["column_b"].as_str(), Some("xyz"));
    }

    #[test]
    fn loads_columns_onto_fresh_instance() {
        let reg = registry();
        let class = reg.resolve_class("app.Model").unwrap();
        let mut map = Map::new();
        map.insert("column_a".into(), 5.into());
        map.insert("column_b".into(), "xyz".into());

        let inst = RecordAdapter.from_json_repr(&class, Fields::new(map)).unwrap();
        let model = inst.downcast::<Model>().unwrap();
        assert_eq!(model.column_a, 5);
        assert_eq!(model.column_b, "xyz");
        assert_eq!(model.transient, 0);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let reg = registry();
        let class = reg.resolve_class("app.Model").unwrap();
        let mut map = Map::new();
        map.insert("nope".into(), Node::Null);
        assert_eq!(
            RecordAdapter.from_json_repr(&class, Fields::new(map)).unwrap_err(),
            ShapeError::Unknown("nope".into())
        );
    }

    #[test]
    fn class_without_constructor_cannot_load() {
        let mut reg = Registry::new();
        reg.register_class(Class::<Model>::new("app.Model").provides::<Records>(as_record, as_record_mut))
            .unwrap();
        let class = reg.resolve_class("app.Model").unwrap();
        assert!(matches!(
            RecordAdapter.from_json_repr(&class, Fields::default()),
            Err(ShapeError::Custom(_))
        ));
    }
}
