use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};

use vc_value::{Data, DataClass};

use crate::conversion::Conversion;
use crate::error::RegistryError;
use crate::hash::HashMap;
use crate::info::{CollectionInfo, CollectionKind, Constraints, CustomInfo, Discriminator};
use crate::info::{EnumInfo, LiteralInfo};
use crate::info::{MappingInfo, ObjectInfo, Primitive, TupleInfo, TypeHandle, TypeInfo, UnionInfo};
use crate::registry::TypeMeta;

const NULL: TypeHandle = TypeHandle::new(0);
const BOOL: TypeHandle = TypeHandle::new(1);
const INT: TypeHandle = TypeHandle::new(2);
const FLOAT: TypeHandle = TypeHandle::new(3);
const STR: TypeHandle = TypeHandle::new(4);
const ANY: TypeHandle = TypeHandle::new(5);

/// Structural types are identified by their content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Structural {
    Collection(CollectionInfo),
    Mapping(MappingInfo),
    Tuple(TupleInfo),
    Union(UnionInfo),
    Literal(LiteralInfo),
}

fn literal_repr(value: &Data) -> String {
    match value {
        Data::Null => "null".into(),
        Data::Bool(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Float(value) => value.to_string(),
        Data::Str(value) => format!("{value:?}"),
        other => format!("{other:?}"),
    }
}

// -----------------------------------------------------------------------------
// TypeRegistry

/// An arena of type descriptions.
///
/// Types reference each other by [`TypeHandle`], so recursive types are
/// built by declaring an object first and defining its fields afterwards.
/// Structural types (collections, mappings, tuples, unions, literals) are
/// interned: asking twice for `list[int]` yields the same handle.
///
/// The registry also maps every run-time [`DataClass`] to a type, which is
/// what the any-dispatch procedure uses for values of unknown static type.
///
/// # Examples
///
/// ```
/// use vc_method::info::{FieldInfo, ObjectInfo};
/// use vc_method::registry::TypeRegistry;
///
/// let mut registry = TypeRegistry::new();
/// let node = registry.declare_object("Node");
/// let children = registry.list_of(node);
/// registry
///     .define_object(node, ObjectInfo::new([
///         FieldInfo::new("value", registry.int()),
///         FieldInfo::new("children", children),
///     ]).unwrap())
///     .unwrap();
///
/// assert_eq!(registry.name(children), Some("list[Node]"));
/// assert_eq!(registry.list_of(node), children);
/// ```
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<TypeMeta>,
    interned: HashMap<Structural, TypeHandle>,
    classes: HashMap<DataClass, TypeHandle>,
}

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry holding the primitives and `any`, plus the
    /// generic containers used for values of unknown static type:
    ///
    /// - `list[any]`, `tuple[any, ...]`, `set[any]`
    /// - `map[str, any]`
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            interned: HashMap::default(),
            classes: HashMap::default(),
        };
        for primitive in [
            Primitive::Null,
            Primitive::Bool,
            Primitive::Int,
            Primitive::Float,
            Primitive::Str,
        ] {
            let handle = registry.push(TypeMeta::new(primitive.name(), TypeInfo::Primitive(primitive)));
            registry.classes.insert(primitive.classes()[0], handle);
        }
        registry.push(TypeMeta::new("any", TypeInfo::Any));

        let list = registry.list_of(ANY);
        let tuple = registry.collection_of(CollectionKind::Tuple, ANY);
        let set = registry.set_of(ANY);
        let map = registry.mapping_of(STR, ANY);
        registry.classes.insert(DataClass::List, list);
        registry.classes.insert(DataClass::Tuple, tuple);
        registry.classes.insert(DataClass::Set, set);
        registry.classes.insert(DataClass::Map, map);
        registry
    }

    fn push(&mut self, meta: TypeMeta) -> TypeHandle {
        let handle = TypeHandle::new(self.types.len() as u32);
        self.types.push(meta);
        handle
    }

    fn intern(&mut self, key: Structural, name: impl FnOnce(&Self) -> String) -> TypeHandle {
        if let Some(&handle) = self.interned.get(&key) {
            return handle;
        }
        let info = match &key {
            Structural::Collection(info) => TypeInfo::Collection(*info),
            Structural::Mapping(info) => TypeInfo::Mapping(*info),
            Structural::Tuple(info) => TypeInfo::Tuple(info.clone()),
            Structural::Union(info) => TypeInfo::Union(info.clone()),
            Structural::Literal(info) => TypeInfo::Literal(info.clone()),
        };
        let name = name(self);
        let handle = self.push(TypeMeta::new(name, info));
        self.interned.insert(key, handle);
        handle
    }

    fn name_or_unknown(&self, ty: TypeHandle) -> &str {
        self.name(ty).unwrap_or("?")
    }

    fn joined(&self, items: &[TypeHandle], separator: &str) -> String {
        items
            .iter()
            .map(|&item| self.name_or_unknown(item))
            .collect::<Vec<_>>()
            .join(separator)
    }

    // -------------------------------------------------------------------------
    // Builtins

    #[inline]
    pub const fn null(&self) -> TypeHandle {
        NULL
    }

    #[inline]
    pub const fn boolean(&self) -> TypeHandle {
        BOOL
    }

    #[inline]
    pub const fn int(&self) -> TypeHandle {
        INT
    }

    #[inline]
    pub const fn float(&self) -> TypeHandle {
        FLOAT
    }

    #[inline]
    pub const fn str(&self) -> TypeHandle {
        STR
    }

    #[inline]
    pub const fn any(&self) -> TypeHandle {
        ANY
    }

    // -------------------------------------------------------------------------
    // Structural types

    pub fn collection_of(&mut self, kind: CollectionKind, item: TypeHandle) -> TypeHandle {
        self.intern(Structural::Collection(CollectionInfo::new(kind, item)), |this| {
            let item = this.name_or_unknown(item);
            match kind {
                CollectionKind::Tuple => format!("tuple[{item}, ...]"),
                _ => format!("{}[{item}]", kind.prefix()),
            }
        })
    }

    #[inline]
    pub fn list_of(&mut self, item: TypeHandle) -> TypeHandle {
        self.collection_of(CollectionKind::List, item)
    }

    #[inline]
    pub fn set_of(&mut self, item: TypeHandle) -> TypeHandle {
        self.collection_of(CollectionKind::Set, item)
    }

    #[inline]
    pub fn sequence_of(&mut self, item: TypeHandle) -> TypeHandle {
        self.collection_of(CollectionKind::Sequence, item)
    }

    pub fn mapping_of(&mut self, key: TypeHandle, value: TypeHandle) -> TypeHandle {
        self.intern(Structural::Mapping(MappingInfo::new(key, value)), |this| {
            format!("map[{}, {}]", this.name_or_unknown(key), this.name_or_unknown(value))
        })
    }

    pub fn tuple_of(&mut self, items: impl IntoIterator<Item = TypeHandle>) -> TypeHandle {
        let items: Vec<TypeHandle> = items.into_iter().collect();
        let name = format!("tuple[{}]", self.joined(&items, ", "));
        self.intern(Structural::Tuple(TupleInfo::new(items)), |_| name)
    }

    /// A union of `alternatives`, in order.
    ///
    /// Nested unions are flattened and repeated alternatives dropped. A
    /// single remaining alternative is returned as is.
    pub fn union_of(&mut self, alternatives: impl IntoIterator<Item = TypeHandle>) -> TypeHandle {
        let mut flat: Vec<TypeHandle> = Vec::new();
        for alternative in alternatives {
            let nested = match self.info(alternative) {
                Some(TypeInfo::Union(union)) if union.discriminator().is_none() => {
                    union.alternatives().to_vec()
                }
                _ => alloc::vec![alternative],
            };
            for ty in nested {
                if !flat.contains(&ty) {
                    flat.push(ty);
                }
            }
        }
        if let [single] = flat.as_slice() {
            return *single;
        }
        let name = self.joined(&flat, " | ");
        self.intern(Structural::Union(UnionInfo::new(flat)), |_| name)
    }

    /// A union of objects told apart by the `property` of their input.
    ///
    /// Deserialization reads the tag and hands the rest of the map to the
    /// matching alternative; serialization writes the tag first.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_method::info::{FieldInfo, ObjectInfo};
    /// use vc_method::registry::TypeRegistry;
    ///
    /// let mut registry = TypeRegistry::new();
    /// let cat = registry.object("Cat", ObjectInfo::new([FieldInfo::new("lives", registry.int())]).unwrap());
    /// let dog = registry.object("Dog", ObjectInfo::new([FieldInfo::new("name", registry.str())]).unwrap());
    /// let pet = registry.tagged_union("kind", [("cat", cat), ("dog", dog)]).unwrap();
    ///
    /// assert_eq!(registry.name(pet), Some("Cat | Dog by kind"));
    /// ```
    pub fn tagged_union<T: Into<Arc<str>>>(
        &mut self,
        property: impl Into<Arc<str>>,
        alternatives: impl IntoIterator<Item = (T, TypeHandle)>,
    ) -> Result<TypeHandle, RegistryError> {
        let property = property.into();
        let mut tags: Vec<Arc<str>> = Vec::new();
        let mut types: Vec<TypeHandle> = Vec::new();
        for (tag, ty) in alternatives {
            let tag = tag.into();
            let meta = self.get(ty).ok_or(RegistryError::UnknownType(ty))?;
            if !matches!(meta.info(), TypeInfo::Object(_)) {
                return Err(RegistryError::NotAnObject {
                    name: meta.name_arc().clone(),
                });
            }
            if tags.contains(&tag) {
                return Err(RegistryError::DuplicateTag { tag });
            }
            tags.push(tag);
            types.push(ty);
        }
        let name = format!("{} by {property}", self.joined(&types, " | "));
        let info = UnionInfo::tagged(types, Discriminator::new(property, tags));
        Ok(self.intern(Structural::Union(info), |_| name))
    }

    /// `ty | null`.
    #[inline]
    pub fn optional(&mut self, ty: TypeHandle) -> TypeHandle {
        self.union_of([ty, NULL])
    }

    pub fn literal_of(&mut self, values: impl IntoIterator<Item = Data>) -> TypeHandle {
        let values: Vec<Data> = values.into_iter().collect();
        let name = format!(
            "literal[{}]",
            values.iter().map(literal_repr).collect::<Vec<_>>().join(", ")
        );
        self.intern(Structural::Literal(LiteralInfo::new(values)), |_| name)
    }

    /// Registers a type shaped like `base` whose input must satisfy
    /// `constraints`.
    ///
    /// The new type shares the shape of `base`, not its conversions.
    /// Objects carry their constraints in [`ObjectInfo`]; enums, unions and
    /// custom types cannot be constrained.
    pub fn constrained(
        &mut self,
        name: impl Into<Arc<str>>,
        base: TypeHandle,
        constraints: Constraints,
    ) -> Result<TypeHandle, RegistryError> {
        let meta = self.get(base).ok_or(RegistryError::UnknownType(base))?;
        let info = match meta.info() {
            TypeInfo::Object(_) | TypeInfo::Enum(_) | TypeInfo::Union(_) | TypeInfo::Custom(_) => {
                return Err(RegistryError::NotConstrainable {
                    name: meta.name_arc().clone(),
                });
            }
            info => info.clone(),
        };
        Ok(self.push(TypeMeta::new(name, info).with_constraints(constraints)))
    }

    // -------------------------------------------------------------------------
    // Nominal types

    /// Registers an enumeration; each member encloses a value.
    pub fn enumeration<N, V>(
        &mut self,
        name: impl Into<Arc<str>>,
        members: impl IntoIterator<Item = (N, V)>,
    ) -> TypeHandle
    where
        N: Into<Arc<str>>,
        V: Into<Data>,
    {
        let handle = TypeHandle::new(self.types.len() as u32);
        let members = members
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        let info = EnumInfo::new(handle.class_id(), members);
        self.push(TypeMeta::new(name, TypeInfo::Enum(info)));
        self.classes.insert(DataClass::Enum(handle.class_id()), handle);
        handle
    }

    /// Reserves an object type whose fields are defined later.
    ///
    /// Until [`define_object`](Self::define_object) is called the object
    /// has no field.
    pub fn declare_object(&mut self, name: impl Into<Arc<str>>) -> TypeHandle {
        let handle = self.push(TypeMeta::declared(name, TypeInfo::Object(ObjectInfo::default())));
        self.classes.insert(DataClass::Object(handle.class_id()), handle);
        handle
    }

    pub fn define_object(&mut self, ty: TypeHandle, info: ObjectInfo) -> Result<(), RegistryError> {
        let meta = self
            .types
            .get_mut(ty.index())
            .ok_or(RegistryError::UnknownType(ty))?;
        if !matches!(meta.info(), TypeInfo::Object(_)) {
            return Err(RegistryError::NotAnObject {
                name: meta.name_arc().clone(),
            });
        }
        if meta.is_defined() {
            return Err(RegistryError::AlreadyDefined {
                name: meta.name_arc().clone(),
            });
        }
        meta.define(TypeInfo::Object(info));
        Ok(())
    }

    /// Declares and defines an object at once.
    pub fn object(&mut self, name: impl Into<Arc<str>>, info: ObjectInfo) -> TypeHandle {
        let handle = self.push(TypeMeta::new(name, TypeInfo::Object(info)));
        self.classes.insert(DataClass::Object(handle.class_id()), handle);
        handle
    }

    /// Registers the host type `T`, carried as [`Data::Opaque`].
    ///
    /// A custom type only serializes or deserializes through conversions.
    pub fn custom<T: Any>(&mut self, name: impl Into<Arc<str>>) -> TypeHandle {
        let info = CustomInfo::new(TypeId::of::<T>(), type_name::<T>());
        let handle = self.push(TypeMeta::new(name, TypeInfo::Custom(info)));
        self.classes.insert(DataClass::Opaque(TypeId::of::<T>()), handle);
        handle
    }

    // -------------------------------------------------------------------------
    // Conversions

    fn convertible(&mut self, ty: TypeHandle) -> Result<&mut TypeMeta, RegistryError> {
        let meta = self
            .types
            .get_mut(ty.index())
            .ok_or(RegistryError::UnknownType(ty))?;
        if !meta.info().is_convertible() {
            return Err(RegistryError::NotConvertible {
                name: meta.name_arc().clone(),
            });
        }
        Ok(meta)
    }

    /// Registers the static serialization conversion of its source type.
    ///
    /// A type has at most one; registering again replaces it.
    pub fn register_serializer(&mut self, conversion: Conversion) -> Result<(), RegistryError> {
        let target = conversion.target();
        if self.get(target).is_none() {
            return Err(RegistryError::UnknownType(target));
        }
        let meta = self.convertible(conversion.source())?;
        if meta.set_serializer(conversion) {
            log::warn!("serializer of `{}` replaced", meta.name());
        }
        Ok(())
    }

    /// Adds a deserialization alternative to its target type.
    pub fn register_deserializer(&mut self, conversion: Conversion) -> Result<(), RegistryError> {
        let source = conversion.source();
        if self.get(source).is_none() {
            return Err(RegistryError::UnknownType(source));
        }
        self.convertible(conversion.target())?.add_deserializer(conversion);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries

    #[inline]
    pub fn get(&self, ty: TypeHandle) -> Option<&TypeMeta> {
        self.types.get(ty.index())
    }

    #[inline]
    pub fn info(&self, ty: TypeHandle) -> Option<&TypeInfo> {
        self.get(ty).map(TypeMeta::info)
    }

    #[inline]
    pub fn name(&self, ty: TypeHandle) -> Option<&str> {
        self.get(ty).map(TypeMeta::name)
    }

    /// The type used for values of class `class` when the static type is
    /// unknown.
    #[inline]
    pub fn type_of_class(&self, class: DataClass) -> Option<TypeHandle> {
        self.classes.get(&class).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeHandle, &TypeMeta)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, meta)| (TypeHandle::new(index as u32), meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::FieldInfo;

    #[test]
    fn builtins_and_classes() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.name(registry.int()), Some("int"));
        assert_eq!(registry.type_of_class(DataClass::Float), Some(registry.float()));

        let list = registry.type_of_class(DataClass::List).unwrap();
        assert_eq!(registry.name(list), Some("list[any]"));
        let map = registry.type_of_class(DataClass::Map).unwrap();
        assert_eq!(registry.name(map), Some("map[str, any]"));
        assert!(registry.type_of_class(DataClass::Undefined).is_none());
    }

    #[test]
    fn structural_types_are_interned() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        assert_eq!(registry.list_of(int), registry.list_of(int));
        assert_ne!(registry.list_of(int), registry.set_of(int));

        let tuple = registry.tuple_of([int, str]);
        assert_eq!(registry.name(tuple), Some("tuple[int, str]"));
        assert_eq!(registry.tuple_of([int, str]), tuple);
    }

    #[test]
    fn unions_flatten() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let inner = registry.union_of([int, str]);
        let outer = registry.union_of([inner, int, registry.null()]);
        assert_eq!(registry.name(outer), Some("int | str | null"));
        assert_eq!(registry.union_of([int]), int);
        assert_eq!(registry.optional(int), registry.union_of([int, registry.null()]));
    }

    #[test]
    fn objects_are_defined_once() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let foo = registry.declare_object("Foo");
        assert_eq!(registry.type_of_class(DataClass::Object(foo.class_id())), Some(foo));

        let info = ObjectInfo::new([FieldInfo::new("bar", int)]).unwrap();
        registry.define_object(foo, info.clone()).unwrap();
        assert!(matches!(
            registry.define_object(foo, info.clone()),
            Err(RegistryError::AlreadyDefined { .. })
        ));
        assert!(matches!(
            registry.define_object(int, info),
            Err(RegistryError::NotAnObject { .. })
        ));
    }

    #[test]
    fn conversions_need_convertible_types() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let union = registry.union_of([int, str]);

        let error = registry
            .register_serializer(Conversion::new(union, str, Ok))
            .unwrap_err();
        assert!(matches!(error, RegistryError::NotConvertible { .. }));

        registry.register_serializer(Conversion::new(int, str, Ok)).unwrap();
        registry.register_deserializer(Conversion::new(str, int, Ok)).unwrap();
        registry.register_deserializer(Conversion::identity(int)).unwrap();

        let meta = registry.get(int).unwrap();
        assert_eq!(meta.serialization().unwrap().iter().count(), 1);
        assert_eq!(meta.deserialization().unwrap().iter().count(), 2);
    }

    #[test]
    fn enums_and_customs_have_classes() {
        struct Point;

        let mut registry = TypeRegistry::new();
        let color = registry.enumeration("Color", [("RED", "red"), ("BLUE", "blue")]);
        let info = registry.info(color).unwrap().as_enum().unwrap();
        assert_eq!(info.members().len(), 2);
        assert_eq!(registry.type_of_class(DataClass::Enum(color.class_id())), Some(color));

        let point = registry.custom::<Point>("Point");
        assert_eq!(
            registry.type_of_class(DataClass::Opaque(TypeId::of::<Point>())),
            Some(point)
        );
    }

    #[test]
    fn tagged_unions_stay_whole() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let a = registry.object("A", ObjectInfo::new([FieldInfo::new("x", int)]).unwrap());
        let b = registry.object("B", ObjectInfo::default());

        let tagged = registry.tagged_union("type", [("a", a), ("b", b)]).unwrap();
        let info = registry.info(tagged).unwrap().as_union().unwrap();
        let tags: Vec<_> = info.tagged_alternatives().map(|(tag, ty)| (tag.to_string(), ty)).collect();
        assert_eq!(tags, [("a".to_string(), a), ("b".to_string(), b)]);

        let optional = registry.optional(tagged);
        let alternatives = registry.info(optional).unwrap().as_union().unwrap().alternatives();
        assert_eq!(alternatives, [tagged, registry.null()]);

        assert!(matches!(
            registry.tagged_union("type", [("a", a), ("a", b)]),
            Err(RegistryError::DuplicateTag { .. })
        ));
        assert!(matches!(
            registry.tagged_union("type", [("a", a), ("n", int)]),
            Err(RegistryError::NotAnObject { .. })
        ));
    }

    #[test]
    fn constrained_types_copy_their_base() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let positive = registry
            .constrained("PositiveInt", int, Constraints::new().with_exclusive_minimum(0.0))
            .unwrap();
        assert_ne!(positive, int);
        assert!(matches!(
            registry.info(positive),
            Some(TypeInfo::Primitive(Primitive::Int))
        ));
        assert!(registry.get(positive).unwrap().constraints().is_some());
        assert!(registry.get(int).unwrap().constraints().is_none());

        let color = registry.enumeration("Color", [("RED", "red")]);
        assert!(matches!(
            registry.constrained("Red", color, Constraints::new()),
            Err(RegistryError::NotConstrainable { .. })
        ));
    }
}
