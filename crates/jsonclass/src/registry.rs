// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class and adapter registry.
//!
//! Classes map a qualified name to a Rust type, plus the capabilities the
//! type provides. Adapters map a qualified name to a dumper (for one type
//! or one capability) and/or a loader. The registry is populated at start
//! up and read-only afterwards; [`install`] publishes one instance for the
//! whole process while tests build their own.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::OnceLock;

use crate::capability::{Capability, Dump, Fields, Load};
use crate::envelope::{EnvelopeTag, QualifiedName};
use crate::error::{Error, RegistryError, ShapeError};
use crate::node::{Instance, Node};

// ---------------------------------------------------------------------------
// Type erasure
// ---------------------------------------------------------------------------

trait ViewBinding<C: Capability>: Send + Sync {
    fn view<'a>(&self, value: &'a dyn Any) -> Option<&'a C::View>;
    fn view_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut C::View>;
}

struct Projection<T, C: Capability> {
    as_view: fn(&T) -> &C::View,
    as_view_mut: fn(&mut T) -> &mut C::View,
}

impl<T: Any, C: Capability> ViewBinding<C> for Projection<T, C> {
    fn view<'a>(&self, value: &'a dyn Any) -> Option<&'a C::View> {
        value.downcast_ref::<T>().map(self.as_view)
    }

    fn view_mut<'a>(&self, value: &'a mut dyn Any) -> Option<&'a mut C::View> {
        value.downcast_mut::<T>().map(self.as_view_mut)
    }
}

struct CapabilitySlot {
    id: TypeId,
    name: &'static str,
    /// Holds a `Box<dyn ViewBinding<C>>` for the capability `id`.
    binding: Box<dyn Any + Send + Sync>,
}

trait ErasedDump: Send + Sync {
    fn dump(&self, class: &ClassEntry, value: &dyn Any) -> Option<Node>;
}

struct ExactDump<T, D> {
    dumper: D,
    _target: PhantomData<fn(&T)>,
}

impl<T: Any, D: Dump<T>> ErasedDump for ExactDump<T, D> {
    fn dump(&self, _class: &ClassEntry, value: &dyn Any) -> Option<Node> {
        value
            .downcast_ref::<T>()
            .map(|v| self.dumper.to_json_repr(v))
    }
}

struct CapabilityDump<C, D> {
    dumper: D,
    _target: PhantomData<fn() -> C>,
}

impl<C: Capability, D: Dump<C::View>> ErasedDump for CapabilityDump<C, D> {
    fn dump(&self, class: &ClassEntry, value: &dyn Any) -> Option<Node> {
        class
            .view::<C>(value)
            .map(|v| self.dumper.to_json_repr(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpTarget {
    Exact(TypeId, &'static str),
    Capability(TypeId, &'static str),
}

impl DumpTarget {
    fn describe(&self) -> &'static str {
        match self {
            DumpTarget::Exact(_, name) | DumpTarget::Capability(_, name) => name,
        }
    }
}

struct DumperSlot {
    target: DumpTarget,
    dump: Box<dyn ErasedDump>,
}

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

/// Declaration of a class, consumed by [`Registry::register_class`].
pub struct Class<T> {
    name: String,
    constructor: Option<fn() -> T>,
    capabilities: Vec<CapabilitySlot>,
}

impl<T: Any + Send + Sync> Class<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            name: name.into(),
            constructor: None,
            capabilities: Vec::new(),
        }
    }

    /// Constructor used by loaders that fill in a blank instance.
    pub fn constructor(mut self, ctor: fn() -> T) -> Self {
        self.constructor = Some(ctor);
        self
    }

    /// Declare that `T` provides capability `C`.
    ///
    /// Declaration order is lookup order when several capabilities have a
    /// registered dumper.
    pub fn provides<C: Capability>(
        mut self,
        as_view: fn(&T) -> &C::View,
        as_view_mut: fn(&mut T) -> &mut C::View,
    ) -> Self {
        let binding: Box<dyn ViewBinding<C>> = Box::new(Projection::<T, C> {
            as_view,
            as_view_mut,
        });
        self.capabilities.push(CapabilitySlot {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            binding: Box::new(binding),
        });
        self
    }
}

impl<T: Any + Send + Sync + Default> Class<T> {
    /// Use `T::default` as the constructor.
    pub fn default_constructor(self) -> Self {
        self.constructor(T::default)
    }
}

struct ClassEntry {
    name: QualifiedName,
    type_id: TypeId,
    type_name: &'static str,
    constructor: Option<Box<dyn Fn() -> Instance + Send + Sync>>,
    capabilities: Vec<CapabilitySlot>,
}

impl ClassEntry {
    fn binding<C: Capability>(&self) -> Option<&dyn ViewBinding<C>> {
        self.capabilities
            .iter()
            .find(|slot| slot.id == TypeId::of::<C>())
            .and_then(|slot| slot.binding.downcast_ref::<Box<dyn ViewBinding<C>>>())
            .map(|b| &**b)
    }

    fn view<'a, C: Capability>(&self, value: &'a dyn Any) -> Option<&'a C::View> {
        self.binding::<C>()?.view(value)
    }

    fn view_mut<'a, C: Capability>(&self, value: &'a mut dyn Any) -> Option<&'a mut C::View> {
        self.binding::<C>()?.view_mut(value)
    }
}

/// A resolved class, handed to loaders.
#[derive(Clone, Copy)]
pub struct ClassRef<'r> {
    entry: &'r ClassEntry,
}

impl<'r> ClassRef<'r> {
    pub fn name(&self) -> &'r QualifiedName {
        &self.entry.name
    }

    pub fn type_id(&self) -> TypeId {
        self.entry.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.entry.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.entry.type_id == TypeId::of::<T>()
    }

    pub fn provides<C: Capability>(&self) -> bool {
        self.entry.binding::<C>().is_some()
    }

    /// Build a blank instance, if the class declared a constructor.
    pub fn construct(&self) -> Option<Instance> {
        self.entry.constructor.as_ref().map(|ctor| ctor())
    }

    /// Project an instance of this class onto capability `C`.
    pub fn view<'a, C: Capability>(&self, instance: &'a Instance) -> Option<&'a C::View> {
        self.entry.view::<C>(instance.as_any())
    }

    pub fn view_mut<'a, C: Capability>(&self, instance: &'a mut Instance) -> Option<&'a mut C::View> {
        self.entry.view_mut::<C>(instance.as_any_mut())
    }
}

impl std::fmt::Debug for ClassRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRef")
            .field("name", &self.entry.name)
            .field("type", &self.entry.type_name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Declaration of an adapter, consumed by [`Registry::register_adapter`].
///
/// An adapter has at most one dumper target. Its name is written into every
/// envelope it produces and selects its loader on the way back.
pub struct Adapter {
    name: String,
    dumper: Option<DumperSlot>,
    loader: Option<Box<dyn Load>>,
}

impl Adapter {
    pub fn new(name: impl Into<String>) -> Self {
        Adapter {
            name: name.into(),
            dumper: None,
            loader: None,
        }
    }

    /// Dump values of exactly type `T`.
    pub fn dumps<T: Any + Send + Sync, D: Dump<T>>(mut self, dumper: D) -> Self {
        self.dumper = Some(DumperSlot {
            target: DumpTarget::Exact(TypeId::of::<T>(), std::any::type_name::<T>()),
            dump: Box::new(ExactDump::<T, D> {
                dumper,
                _target: PhantomData,
            }),
        });
        self
    }

    /// Closure form of [`Adapter::dumps`].
    pub fn dumps_with<T, F>(self, f: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Node + Send + Sync + 'static,
    {
        self.dumps::<T, F>(f)
    }

    /// Dump any registered class that provides capability `C`.
    pub fn dumps_capability<C: Capability, D: Dump<C::View>>(mut self, dumper: D) -> Self {
        self.dumper = Some(DumperSlot {
            target: DumpTarget::Capability(TypeId::of::<C>(), std::any::type_name::<C>()),
            dump: Box::new(CapabilityDump::<C, D> {
                dumper,
                _target: PhantomData,
            }),
        });
        self
    }

    pub fn loads<L: Load>(mut self, loader: L) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Closure form of [`Adapter::loads`].
    pub fn loads_with<F>(self, f: F) -> Self
    where
        F: Fn(&ClassRef<'_>, Fields) -> Result<Instance, ShapeError> + Send + Sync + 'static,
    {
        self.loads(f)
    }
}

struct AdapterEntry {
    name: QualifiedName,
    dumper: Option<DumperSlot>,
    loader: Option<Box<dyn Load>>,
}

/// Dumper selected for a value, together with the tag it produces.
pub struct DumperRef<'r> {
    adapter: &'r QualifiedName,
    class: &'r ClassEntry,
    dump: &'r dyn ErasedDump,
}

impl<'r> DumperRef<'r> {
    pub fn adapter(&self) -> &'r QualifiedName {
        self.adapter
    }

    pub fn class(&self) -> ClassRef<'r> {
        ClassRef { entry: self.class }
    }

    pub fn tag(&self) -> EnvelopeTag {
        EnvelopeTag::new(self.adapter.clone(), self.class.name.clone())
    }

    /// Run the dumper; `None` if `instance` is not of the looked-up class.
    pub fn dump(&self, instance: &Instance) -> Option<Node> {
        self.dump.dump(self.class, instance.as_any())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Closed set of classes and adapters known to a codec.
#[derive(Default)]
pub struct Registry {
    classes: HashMap<QualifiedName, ClassEntry>,
    class_by_type: HashMap<TypeId, QualifiedName>,
    adapters: HashMap<QualifiedName, AdapterEntry>,
    exact_dumpers: HashMap<TypeId, QualifiedName>,
    capability_dumpers: HashMap<TypeId, QualifiedName>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its qualified name.
    pub fn register_class<T: Any + Send + Sync>(&mut self, class: Class<T>) -> Result<(), RegistryError> {
        let name = QualifiedName::parse(&class.name)?;
        if self.classes.contains_key(&name) {
            return Err(RegistryError::DuplicateClass(name.to_string()));
        }
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();
        if self.class_by_type.contains_key(&type_id) {
            return Err(RegistryError::DuplicateType(type_name));
        }

        log::debug!(
            "[registry] class {} -> {} provides [{}]",
            name,
            type_name,
            class
                .capabilities
                .iter()
                .map(|slot| slot.name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let constructor = class.constructor.map(|ctor| {
            Box::new(move || Instance::new(ctor())) as Box<dyn Fn() -> Instance + Send + Sync>
        });
        self.class_by_type.insert(type_id, name.clone());
        self.classes.insert(
            name.clone(),
            ClassEntry {
                name,
                type_id,
                type_name,
                constructor,
                capabilities: class.capabilities,
            },
        );
        Ok(())
    }

    /// Register an adapter under its qualified name.
    ///
    /// An exact-type dumper must target a type already registered with
    /// [`Registry::register_class`], so classes go in before their adapters.
    pub fn register_adapter(&mut self, adapter: Adapter) -> Result<(), RegistryError> {
        let name = QualifiedName::parse(&adapter.name)?;
        if self.adapters.contains_key(&name) {
            return Err(RegistryError::DuplicateAdapter(name.to_string()));
        }
        if adapter.dumper.is_none() && adapter.loader.is_none() {
            return Err(RegistryError::EmptyAdapter(name.to_string()));
        }

        if let Some(slot) = &adapter.dumper {
            if let DumpTarget::Exact(id, target) = slot.target {
                if !self.class_by_type.contains_key(&id) {
                    return Err(RegistryError::UnregisteredType {
                        adapter: name.to_string(),
                        target,
                    });
                }
            }
            let (index, id) = match slot.target {
                DumpTarget::Exact(id, _) => (&mut self.exact_dumpers, id),
                DumpTarget::Capability(id, _) => (&mut self.capability_dumpers, id),
            };
            if let Some(existing) = index.get(&id) {
                return Err(RegistryError::DuplicateDumper {
                    target: slot.target.describe(),
                    existing: existing.to_string(),
                });
            }
            index.insert(id, name.clone());
        }

        log::debug!(
            "[registry] adapter {} dumps={} loads={}",
            name,
            adapter.dumper.as_ref().map_or("-", |s| s.target.describe()),
            adapter.loader.is_some()
        );

        self.adapters.insert(
            name.clone(),
            AdapterEntry {
                name,
                dumper: adapter.dumper,
                loader: adapter.loader,
            },
        );
        Ok(())
    }

    /// Find the dumper for `instance`.
    ///
    /// An exact-type dumper wins; otherwise the class's capabilities are
    /// tried in declaration order. Values whose type is not a registered
    /// class have no dumper.
    pub fn lookup_dumper(&self, instance: &Instance) -> Option<DumperRef<'_>> {
        let type_id = instance.value_type_id();
        let class = self
            .class_by_type
            .get(&type_id)
            .and_then(|name| self.classes.get(name))?;

        let adapter_name = self.exact_dumpers.get(&type_id).or_else(|| {
            class
                .capabilities
                .iter()
                .find_map(|slot| self.capability_dumpers.get(&slot.id))
        })?;
        let adapter = self.adapters.get(adapter_name)?;
        let slot = adapter.dumper.as_ref()?;

        log::trace!(
            "[registry] {} dumped by {} via {}",
            class.name,
            adapter.name,
            slot.target.describe()
        );

        Some(DumperRef {
            adapter: &adapter.name,
            class,
            dump: slot.dump.as_ref(),
        })
    }

    /// Resolve a class by qualified name.
    pub fn resolve_class(&self, name: &str) -> Result<ClassRef<'_>, Error> {
        let qualified = parse_reference(name)?;
        self.classes
            .get(&qualified)
            .map(|entry| ClassRef { entry })
            .ok_or_else(|| Error::UnresolvableReference {
                name: name.to_string(),
                reason: "no such class",
            })
    }

    /// Resolve the loader of the adapter named `name`.
    pub fn lookup_loader(&self, name: &str) -> Result<&dyn Load, Error> {
        let qualified = parse_reference(name)?;
        let adapter = self
            .adapters
            .get(&qualified)
            .ok_or_else(|| Error::UnresolvableReference {
                name: name.to_string(),
                reason: "no such adapter",
            })?;
        adapter
            .loader
            .as_deref()
            .ok_or_else(|| Error::UnresolvableReference {
                name: name.to_string(),
                reason: "adapter has no loader",
            })
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(QualifiedName::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered adapter names, sorted.
    pub fn adapter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(QualifiedName::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.class_names())
            .field("adapters", &self.adapter_names())
            .finish()
    }
}

fn parse_reference(name: &str) -> Result<QualifiedName, Error> {
    QualifiedName::parse(name).map_err(|_| Error::UnresolvableReference {
        name: name.to_string(),
        reason: "not a qualified name",
    })
}

// ---------------------------------------------------------------------------
// Process-wide registry
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<Registry> = OnceLock::new();
static EMPTY: OnceLock<Registry> = OnceLock::new();

/// Publish `registry` for the whole process.
///
/// Only the first `install` succeeds; later calls hand their registry back.
/// Reading through [`global`] beforehand does not count as an install.
pub fn install(registry: Registry) -> Result<(), Registry> {
    GLOBAL.set(registry)
}

/// The installed registry, or an empty one until [`install`] is called.
pub fn global() -> &'static Registry {
    match GLOBAL.get() {
        Some(registry) => registry,
        None => EMPTY.get_or_init(Registry::new),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    trait Named {
        fn label(&self) -> String;
        fn rename(&mut self, label: &str);
    }

    struct NamedCap;

    impl Capability for NamedCap {
        type View = dyn Named;
    }

    #[derive(Default)]
    struct Tag {
        label: String,
    }

    impl Named for Tag {
        fn label(&self) -> String {
            self.label.clone()
        }

        fn rename(&mut self, label: &str) {
            self.label = label.to_string();
        }
    }

    fn as_named(t: &Tag) -> &(dyn Named + 'static) {
        t
    }

    fn as_named_mut(t: &mut Tag) -> &mut (dyn Named + 'static) {
        t
    }

    fn dump_point(p: &Point) -> Node {
        [("x", p.x), ("y", p.y)].into_iter().collect()
    }

    fn dump_named(n: &(dyn Named + 'static)) -> Node {
        [("label", n.label())].into_iter().collect()
    }

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.register_class(Class::<Point>::new("geo.Point").default_constructor())
            .unwrap();
        reg.register_class(
            Class::<Tag>::new("geo.Tag")
                .default_constructor()
                .provides::<NamedCap>(as_named, as_named_mut),
        )
        .unwrap();
        reg.register_adapter(Adapter::new("geo.PointAdapter").dumps::<Point, _>(dump_point))
            .unwrap();
        reg.register_adapter(Adapter::new("geo.NamedAdapter").dumps_capability::<NamedCap, _>(dump_named))
            .unwrap();
        reg
    }

    #[test]
    fn exact_type_lookup() {
        let reg = registry();
        let inst = Instance::new(Point { x: 1, y: 2 });
        let dumper = reg.lookup_dumper(&inst).unwrap();
        assert_eq!(dumper.adapter().as_str(), "geo.PointAdapter");
        assert_eq!(dumper.tag().to_string(), "geo.PointAdapter:geo.Point");

        let node = dumper.dump(&inst).unwrap();
        assert_eq!(node.as_map().unwrap()["y"].as_i64(), Some(2));
    }

    #[test]
    fn capability_lookup() {
        let reg = registry();
        let inst = Instance::new(Tag {
            label: "north".into(),
        });
        let dumper = reg.lookup_dumper(&inst).unwrap();
        assert_eq!(dumper.tag().to_string(), "geo.NamedAdapter:geo.Tag");
        let node = dumper.dump(&inst).unwrap();
        assert_eq!(node.as_map().unwrap()["label"].as_str(), Some("north"));
    }

    #[test]
    fn exact_dumper_beats_capability() {
        let mut reg = registry();
        reg.register_adapter(
            Adapter::new("geo.TagAdapter").dumps_with(|t: &Tag| [("t", t.label.clone())].into_iter().collect()),
        )
        .unwrap();
        let inst = Instance::new(Tag::default());
        assert_eq!(
            reg.lookup_dumper(&inst).unwrap().adapter().as_str(),
            "geo.TagAdapter"
        );
    }

    #[test]
    fn unregistered_type_has_no_dumper() {
        let reg = registry();
        assert!(reg.lookup_dumper(&Instance::new(5u8)).is_none());
    }

    #[test]
    fn class_ref_views_and_constructs() {
        let reg = registry();
        let class = reg.resolve_class("geo.Tag").unwrap();
        assert!(class.is::<Tag>());
        assert!(class.provides::<NamedCap>());

        let mut inst = class.construct().unwrap();
        class.view_mut::<NamedCap>(&mut inst).unwrap().rename("east");
        assert_eq!(class.view::<NamedCap>(&inst).unwrap().label(), "east");

        let point = reg.resolve_class("geo.Point").unwrap();
        assert!(!point.provides::<NamedCap>());
        assert_eq!(point.construct().unwrap().downcast::<Point>().unwrap(), Point::default());
    }

    #[test]
    fn unresolvable_references() {
        let reg = registry();
        assert!(matches!(
            reg.resolve_class("geo.Missing"),
            Err(Error::UnresolvableReference { reason: "no such class", .. })
        ));
        assert!(matches!(
            reg.lookup_loader("geo.Nope"),
            Err(Error::UnresolvableReference { reason: "no such adapter", .. })
        ));
        assert!(matches!(
            reg.lookup_loader("geo.PointAdapter"),
            Err(Error::UnresolvableReference { reason: "adapter has no loader", .. })
        ));
        assert!(matches!(
            reg.resolve_class("nodots"),
            Err(Error::UnresolvableReference { reason: "not a qualified name", .. })
        ));
    }

    #[test]
    fn duplicates_rejected() {
        let mut reg = registry();
        assert_eq!(
            reg.register_class(Class::<Point>::new("geo.Point")),
            Err(RegistryError::DuplicateClass("geo.Point".into()))
        );
        assert!(matches!(
            reg.register_class(Class::<Point>::new("geo.Point2")),
            Err(RegistryError::DuplicateType(_))
        ));
        assert_eq!(
            reg.register_adapter(Adapter::new("geo.PointAdapter").dumps::<Point, _>(dump_point)),
            Err(RegistryError::DuplicateAdapter("geo.PointAdapter".into()))
        );
        assert!(matches!(
            reg.register_adapter(Adapter::new("geo.Other").dumps::<Point, _>(dump_point)),
            Err(RegistryError::DuplicateDumper { ref existing, .. }) if existing == "geo.PointAdapter"
        ));
        assert_eq!(
            reg.register_adapter(Adapter::new("geo.Empty")),
            Err(RegistryError::EmptyAdapter("geo.Empty".into()))
        );
        assert_eq!(
            reg.register_class(Class::<u8>::new("Byte")),
            Err(RegistryError::InvalidName("Byte".into()))
        );
    }

    #[test]
    fn exact_dumper_requires_registered_class() {
        let mut reg = registry();
        assert_eq!(
            reg.register_adapter(Adapter::new("geo.ByteAdapter").dumps_with(|b: &u8| Node::from(*b))),
            Err(RegistryError::UnregisteredType {
                adapter: "geo.ByteAdapter".into(),
                target: "u8",
            })
        );
        assert!(!reg.adapter_names().contains(&"geo.ByteAdapter"));

        reg.register_class(Class::<u8>::new("geo.Byte")).unwrap();
        reg.register_adapter(Adapter::new("geo.ByteAdapter").dumps_with(|b: &u8| [("b", *b)].into_iter().collect()))
            .unwrap();
        assert!(reg.lookup_dumper(&Instance::new(3u8)).is_some());
    }

    #[test]
    fn names_are_sorted() {
        let reg = registry();
        assert_eq!(reg.class_names(), vec!["geo.Point", "geo.Tag"]);
        assert_eq!(reg.adapter_names(), vec!["geo.NamedAdapter", "geo.PointAdapter"]);
    }
}
