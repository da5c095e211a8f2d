//! Read-only shape queries.
//!
//! The compiler uses these to decide which run-time classes a procedure
//! accepts; schema generators use them to classify types the same way.

use alloc::vec::Vec;

use vc_value::DataClass;

use crate::error::CompileError;
use crate::info::{Classes, ShapeKind, TypeHandle, TypeInfo};
use crate::registry::TypeRegistry;

/// Returns the shape kind of `ty`.
pub fn classify(registry: &TypeRegistry, ty: TypeHandle) -> Result<ShapeKind, CompileError> {
    registry
        .info(ty)
        .map(TypeInfo::kind)
        .ok_or(CompileError::UnknownType(ty))
}

/// Returns the classes a value of static type `ty` may have.
///
/// # Examples
///
/// ```
/// use vc_method::shape::expected_classes;
/// use vc_method::registry::TypeRegistry;
/// use vc_value::DataClass;
///
/// let mut registry = TypeRegistry::new();
/// let number = registry.union_of([registry.int(), registry.float()]);
/// let classes = expected_classes(&registry, number).unwrap();
///
/// assert!(classes.contains(DataClass::Int));
/// assert!(classes.contains(DataClass::Float));
/// assert!(!classes.contains(DataClass::Str));
/// ```
pub fn expected_classes(registry: &TypeRegistry, ty: TypeHandle) -> Result<Classes, CompileError> {
    let info = registry.info(ty).ok_or(CompileError::UnknownType(ty))?;
    let classes: Vec<DataClass> = match info {
        TypeInfo::Primitive(primitive) => primitive.classes().to_vec(),
        TypeInfo::Object(_) => alloc::vec![DataClass::Object(ty.class_id())],
        TypeInfo::Enum(info) => alloc::vec![DataClass::Enum(info.class())],
        TypeInfo::Collection(info) => info.kind().classes().to_vec(),
        TypeInfo::Mapping(_) => alloc::vec![DataClass::Map],
        TypeInfo::Tuple(_) => alloc::vec![DataClass::Tuple, DataClass::List],
        TypeInfo::Custom(info) => alloc::vec![DataClass::Opaque(info.type_id())],
        TypeInfo::Any => return Ok(Classes::Any),
        TypeInfo::Literal(info) => {
            let mut classes = Vec::new();
            for value in info.values() {
                push_unique(&mut classes, value.class());
            }
            classes
        }
        TypeInfo::Union(info) => {
            let mut classes = Vec::new();
            for &alternative in info.alternatives() {
                match expected_classes(registry, alternative)? {
                    Classes::Any => return Ok(Classes::Any),
                    Classes::Only(only) => {
                        for &class in only.iter() {
                            push_unique(&mut classes, class);
                        }
                    }
                }
            }
            classes
        }
    };
    Ok(Classes::Only(classes.into()))
}

fn push_unique(classes: &mut Vec<DataClass>, class: DataClass) {
    if !classes.contains(&class) {
        classes.push(class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc_value::Data;

    #[test]
    fn classify_shapes() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let list = registry.list_of(int);
        assert_eq!(classify(&registry, int).unwrap(), ShapeKind::Primitive);
        assert_eq!(classify(&registry, list).unwrap(), ShapeKind::Collection);
        assert_eq!(classify(&registry, registry.any()).unwrap(), ShapeKind::Any);
        assert!(classify(&registry, TypeHandle::new(999)).is_err());
    }

    #[test]
    fn literal_and_tuple_classes() {
        let mut registry = TypeRegistry::new();
        let literal = registry.literal_of([Data::from(1), Data::from(2), Data::from("a")]);
        assert_eq!(
            expected_classes(&registry, literal).unwrap(),
            Classes::Only([DataClass::Int, DataClass::Str].into())
        );

        let tuple = registry.tuple_of([registry.int()]);
        let classes = expected_classes(&registry, tuple).unwrap();
        assert!(classes.contains(DataClass::List));
        assert!(classes.contains(DataClass::Tuple));

        let with_any = registry.union_of([registry.int(), registry.any()]);
        assert_eq!(expected_classes(&registry, with_any).unwrap(), Classes::Any);
    }
}
