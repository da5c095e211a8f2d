use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::conversion::{Conversions, DeserializationResolution, ResolvedConversion};
use crate::conversion::resolve_deserialization;
use crate::de::methods::{AnyMethod, CollectionMethod, ConstrainedMethod, ConversionMethod};
use crate::de::methods::{DiscriminatorMethod, EnumMethod, LiteralMethod, MappingMethod};
use crate::de::methods::{OptionalMethod, PrimitiveMethod, TupleMethod, UnionMethod};
use crate::de::object::{DeField, DeFlattened, DeValidator, FlattenedKeys, ObjectMethod};
use crate::de::{DeMethod, DeserializationMethod};
use crate::error::CompileError;
use crate::hash::HashSet;
use crate::info::{CollectionInfo, FieldKind, MappingInfo, ObjectInfo, ShapeKind, TupleInfo};
use crate::info::{TypeHandle, TypeInfo, UnionInfo};
use crate::options::DeserializationOptions;
use crate::recursion::{RecursionGuard, Visit};
use crate::registry::TypeRegistry;
use crate::shape::classify;

type Key = (TypeHandle, Option<Conversions>, DeserializationOptions);

/// Compiles the deserialization procedure of `ty`.
pub(crate) fn compile(
    registry: &Arc<TypeRegistry>,
    ty: TypeHandle,
    conversions: Option<&Conversions>,
    options: DeserializationOptions,
) -> Result<DeMethod, CompileError> {
    log::trace!(
        "compiling deserialization of `{}`",
        registry.name(ty).unwrap_or_default()
    );
    let mut visitor = DeserializationVisitor {
        registry,
        guard: RecursionGuard::new(),
    };
    visitor.visit_conversion(ty, conversions, options)
}

struct DeserializationVisitor<'a> {
    registry: &'a Arc<TypeRegistry>,
    guard: RecursionGuard<Key, dyn DeserializationMethod>,
}

impl<'a> DeserializationVisitor<'a> {
    fn name(&self, ty: TypeHandle) -> Arc<str> {
        self.registry.name(ty).unwrap_or_default().into()
    }

    fn visit_conversion(
        &mut self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let key = (ty, conversions.cloned(), options);
        let mark = match self.guard.enter(&key) {
            Visit::Fresh(mark) => mark,
            Visit::Done(method) => return Ok(method),
            Visit::Cycle(lazy) => return Ok(lazy as DeMethod),
            Visit::NonTerminating => {
                return Err(CompileError::NonTerminating {
                    name: self.name(ty),
                });
            }
        };
        let result = self.resolve(ty, conversions, options);
        self.guard.exit(key, mark, &result);
        result
    }

    fn resolve(
        &mut self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        match resolve_deserialization(self.registry, ty, conversions)? {
            DeserializationResolution::Structural { next } => self.visit(ty, next.as_ref(), options),
            DeserializationResolution::Convert(alternatives) => {
                self.visit_alternatives(ty, &alternatives, options)
            }
        }
    }

    /// Compiles each way of producing `ty`; the first one that succeeds at
    /// run time wins.
    fn visit_alternatives(
        &mut self,
        ty: TypeHandle,
        alternatives: &[ResolvedConversion],
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let mut methods = Vec::with_capacity(alternatives.len());
        let mut skipped = None;
        for conversion in alternatives {
            let compiled = if conversion.is_identity() {
                self.visit(ty, conversion.sub_conversion(), options)
            } else {
                let sub_options = options.overridden(conversion.overrides());
                self.visit_conversion(conversion.source(), conversion.sub_conversion(), sub_options)
                    .map(|method| -> DeMethod {
                        Arc::new(ConversionMethod {
                            method,
                            converter: conversion.converter().clone(),
                        })
                    })
            };
            match compiled {
                Ok(method) => methods.push(method),
                Err(error) if error.is_skippable() => {
                    log::debug!(
                        "skipping conversion from `{}` to `{}`: {error}",
                        self.name(conversion.source()),
                        self.name(ty)
                    );
                    skipped.get_or_insert(error);
                }
                Err(error) => return Err(error),
            }
        }
        match methods.len() {
            0 => Err(skipped.unwrap_or(CompileError::Unsupported { name: self.name(ty) })),
            1 => Ok(methods.swap_remove(0)),
            _ => Ok(Arc::new(UnionMethod {
                alternatives: methods,
            })),
        }
    }

    fn nested(
        &mut self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        self.guard.descend();
        let result = self.visit_conversion(ty, conversions, options);
        self.guard.ascend();
        result
    }

    fn visit(
        &mut self,
        ty: TypeHandle,
        next: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let registry: &'a Arc<TypeRegistry> = self.registry;
        let meta = registry.get(ty).ok_or(CompileError::UnknownType(ty))?;
        let method: DeMethod = match meta.info() {
            TypeInfo::Primitive(primitive) => Arc::new(PrimitiveMethod {
                primitive: *primitive,
                coerce: options.coerce,
            }),
            TypeInfo::Any => Arc::new(AnyMethod),
            TypeInfo::Collection(info) => self.visit_collection(info, next, options)?,
            TypeInfo::Mapping(info) => self.visit_mapping(info, next, options)?,
            TypeInfo::Tuple(info) => self.visit_tuple(info, next, options)?,
            TypeInfo::Union(info) => self.visit_union(ty, info, next, options)?,
            TypeInfo::Enum(info) => Arc::new(EnumMethod {
                members: info.members().into(),
            }),
            TypeInfo::Literal(info) => Arc::new(LiteralMethod {
                values: info.values().into(),
            }),
            TypeInfo::Object(info) => self.visit_object(ty, info, options)?,
            TypeInfo::Custom(_) => {
                return Err(CompileError::Unsupported { name: self.name(ty) });
            }
        };
        Ok(match meta.constraints() {
            Some(constraints) => Arc::new(ConstrainedMethod {
                method,
                constraints: constraints.clone(),
            }),
            None => method,
        })
    }

    fn visit_collection(
        &mut self,
        info: &CollectionInfo,
        next: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let item = self.nested(info.item(), next, options)?;
        Ok(Arc::new(CollectionMethod {
            item,
            kind: info.kind(),
        }))
    }

    fn visit_mapping(
        &mut self,
        info: &MappingInfo,
        next: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let key = self.nested(info.key(), next, options)?;
        let value = self.nested(info.value(), next, options)?;
        Ok(Arc::new(MappingMethod { key, value }))
    }

    fn visit_tuple(
        &mut self,
        info: &TupleInfo,
        next: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let mut items = Vec::with_capacity(info.arity());
        for &item in info.items() {
            items.push(self.nested(item, next, options)?);
        }
        Ok(Arc::new(TupleMethod {
            items: items.into(),
        }))
    }

    fn visit_union(
        &mut self,
        ty: TypeHandle,
        info: &UnionInfo,
        next: Option<&Conversions>,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        if let Some(discriminator) = info.discriminator() {
            let mut alternatives = Vec::with_capacity(info.alternatives().len());
            for (tag, alternative) in info.tagged_alternatives() {
                let method = self.visit_conversion(alternative, next, options)?;
                alternatives.push((tag.clone(), method));
            }
            return Ok(Arc::new(DiscriminatorMethod {
                property: discriminator.property().clone(),
                alternatives,
            }));
        }

        let mut compiled = Vec::with_capacity(info.alternatives().len());
        let mut skipped = None;
        for &alternative in info.alternatives() {
            match self.visit_conversion(alternative, next, options) {
                Ok(method) => compiled.push((alternative, method)),
                Err(error) if error.is_skippable() => {
                    log::debug!(
                        "skipping alternative `{}` of `{}`: {error}",
                        self.name(alternative),
                        self.name(ty)
                    );
                    skipped.get_or_insert(error);
                }
                Err(error) => return Err(error),
            }
        }

        let null = self.registry.null();
        if let [(first, first_method), (second, second_method)] = compiled.as_slice() {
            let inner = if *second == null {
                Some(first_method)
            } else if *first == null {
                Some(second_method)
            } else {
                None
            };
            if let Some(inner) = inner {
                return Ok(Arc::new(OptionalMethod {
                    inner: inner.clone(),
                }));
            }
        }
        match compiled.len() {
            0 => Err(skipped.unwrap_or(CompileError::Unsupported { name: self.name(ty) })),
            1 => Ok(compiled.swap_remove(0).1),
            _ => Ok(Arc::new(UnionMethod {
                alternatives: compiled.into_iter().map(|(_, method)| method).collect(),
            })),
        }
    }

    fn visit_object(
        &mut self,
        ty: TypeHandle,
        info: &ObjectInfo,
        options: DeserializationOptions,
    ) -> Result<DeMethod, CompileError> {
        let mut fields = Vec::new();
        let mut flattened = Vec::new();
        let mut read_only = Vec::new();
        let mut aliases: HashSet<Arc<str>> = HashSet::default();

        for field in info.fields() {
            if field.kind() == FieldKind::ReadOnly {
                if let Some(default) = field.default() {
                    read_only.push((field.name_arc().clone(), default.clone()));
                }
                continue;
            }
            let method = self.nested(field.ty(), field.deserialization(), options)?;
            let required = field.is_required();
            let default = field.default().cloned();
            let fall_back = !required
                && default.is_some()
                && (field.falls_back_on_default() || options.fall_back_on_default);

            if field.is_flattened() {
                let keys = match classify(self.registry, field.ty())? {
                    ShapeKind::Object => {
                        let mut aliases = HashSet::default();
                        let mut visited = HashSet::default();
                        self.flattened_aliases(field.ty(), options, &mut aliases, &mut visited);
                        FlattenedKeys::Aliases(aliases)
                    }
                    ShapeKind::Mapping | ShapeKind::Union | ShapeKind::Any | ShapeKind::Custom => {
                        FlattenedKeys::Remaining
                    }
                    _ => {
                        return Err(CompileError::InvalidFlatten {
                            object: self.name(ty),
                            field: field.name().into(),
                        });
                    }
                };
                flattened.push(DeFlattened {
                    name: field.name_arc().clone(),
                    keys,
                    method,
                    required,
                    default,
                    fall_back,
                });
            } else {
                let alias = field.alias_for(options.aliaser);
                if !aliases.insert(alias.clone()) {
                    return Err(CompileError::DuplicateAlias {
                        object: self.name(ty),
                        alias,
                    });
                }
                fields.push(DeField {
                    name: field.name_arc().clone(),
                    alias,
                    method,
                    required,
                    default,
                    fall_back,
                });
            }
        }

        let validators = info
            .validators()
            .iter()
            .map(|validator| DeValidator {
                validator: validator.clone(),
                alias: validator
                    .field()
                    .and_then(|name| info.field(name))
                    .map(|field| field.alias_for(options.aliaser)),
                dependencies: validator.dependencies(),
            })
            .collect();

        let method: DeMethod = Arc::new(ObjectMethod {
            class: ty.class_id(),
            fields,
            flattened,
            read_only,
            validators,
            additional_properties: options.additional_properties,
        });
        Ok(match info.constraints() {
            Some(constraints) => Arc::new(ConstrainedMethod {
                method,
                constraints: constraints.clone(),
            }),
            None => method,
        })
    }

    /// Collects the keys read by a flattened object.
    fn flattened_aliases(
        &self,
        ty: TypeHandle,
        options: DeserializationOptions,
        aliases: &mut HashSet<Arc<str>>,
        visited: &mut HashSet<TypeHandle>,
    ) {
        if !visited.insert(ty) {
            return;
        }
        let Some(TypeInfo::Object(info)) = self.registry.info(ty) else {
            return;
        };
        for field in info.fields() {
            if field.kind() == FieldKind::ReadOnly {
                continue;
            }
            if field.is_flattened() {
                self.flattened_aliases(field.ty(), options, aliases, visited);
            } else {
                aliases.insert(field.alias_for(options.aliaser));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::Conversion;
    use crate::info::{Constraints, FieldInfo, Validator};
    use crate::options::AliasStyle;
    use crate::validation::ValidationError;
    use vc_value::{Data, MapData};

    fn input(entries: &[(&str, Data)]) -> Data {
        let mut map = MapData::new();
        for (key, value) in entries {
            map.insert_str(key, value.clone());
        }
        Data::map(map)
    }

    #[test]
    fn recursive_object() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let node = registry.declare_object("Node");
        let next = registry.optional(node);
        registry
            .define_object(
                node,
                ObjectInfo::new([
                    FieldInfo::new("value", int),
                    FieldInfo::new("next", next).with_default(Data::Null),
                ])
                .unwrap(),
            )
            .unwrap();
        let registry = Arc::new(registry);
        let method = compile(&registry, node, None, Default::default()).unwrap();

        let tree = input(&[
            ("value", Data::from(1)),
            ("next", input(&[("value", Data::from(2))])),
        ]);
        let value = method.deserialize(&tree).unwrap();
        let inner = value.as_object().unwrap().get("next").unwrap();
        assert_eq!(inner.as_object().unwrap().get("value"), Some(&Data::from(2)));
        assert_eq!(inner.as_object().unwrap().get("next"), Some(&Data::Null));

        let error = method
            .deserialize(&input(&[("value", Data::from(1)), ("next", input(&[]))]))
            .unwrap_err();
        assert_eq!(error.to_string(), "$.next.value: missing property");
    }

    #[test]
    fn flattened_object_reads_its_aliases() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let inner = registry.object(
            "Inner",
            ObjectInfo::new([FieldInfo::new("b", int).with_alias("bee")]).unwrap(),
        );
        let outer = registry.object(
            "Outer",
            ObjectInfo::new([FieldInfo::new("a", int), FieldInfo::new("inner", inner).flattened()])
                .unwrap(),
        );
        let registry = Arc::new(registry);
        let method = compile(&registry, outer, None, Default::default()).unwrap();

        let value = method
            .deserialize(&input(&[("a", Data::from(1)), ("bee", Data::from(2))]))
            .unwrap();
        let inner = value.as_object().unwrap().get("inner").unwrap();
        assert_eq!(inner.as_object().unwrap().get("b"), Some(&Data::from(2)));

        let error = method.deserialize(&input(&[("a", Data::from(1))])).unwrap_err();
        assert_eq!(error.to_string(), "$.bee: missing property");
    }

    #[test]
    fn conversion_alternatives() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        registry
            .register_deserializer(Conversion::new(str, int, |value: Data| {
                let parsed = value.as_str().and_then(|text| text.parse::<i64>().ok());
                parsed.map(Data::Int).ok_or_else(|| "not a number".into())
            }))
            .unwrap();
        registry.register_deserializer(Conversion::identity(int)).unwrap();
        let registry = Arc::new(registry);
        let method = compile(&registry, int, None, Default::default()).unwrap();

        assert_eq!(method.deserialize(&Data::from("12")).unwrap(), Data::Int(12));
        assert_eq!(method.deserialize(&Data::from(12)).unwrap(), Data::Int(12));
        let error = method.deserialize(&Data::from("x")).unwrap_err();
        assert_eq!(error.messages().len(), 2);
    }

    #[test]
    fn conversion_cycle_does_not_terminate() {
        struct X;
        struct Y;

        let mut registry = TypeRegistry::new();
        let x = registry.custom::<X>("X");
        let y = registry.custom::<Y>("Y");
        registry.register_deserializer(Conversion::new(y, x, Ok)).unwrap();
        registry.register_deserializer(Conversion::new(x, y, Ok)).unwrap();
        let registry = Arc::new(registry);

        let error = compile(&registry, x, None, Default::default()).err().unwrap();
        assert!(matches!(error, CompileError::NonTerminating { .. }));
    }

    #[test]
    fn enum_members_from_values() {
        let mut registry = TypeRegistry::new();
        let color = registry.enumeration("Color", [("red", "r"), ("green", "g")]);
        let registry = Arc::new(registry);
        let method = compile(&registry, color, None, Default::default()).unwrap();

        let green = method.deserialize(&Data::from("g")).unwrap();
        let member = green.as_member().unwrap();
        assert_eq!((member.name(), member.class()), ("green", color.class_id()));
        let error = method.deserialize(&Data::from("blue")).unwrap_err();
        assert_eq!(error.to_string(), r#"$: not one of [Str("r"), Str("g")]"#);
    }

    #[test]
    fn camel_case_and_coercion() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let foo = registry.object(
            "Foo",
            ObjectInfo::new([FieldInfo::new("max_size", int)]).unwrap(),
        );
        let registry = Arc::new(registry);
        let camel = DeserializationOptions {
            aliaser: AliasStyle::CamelCase,
            ..Default::default()
        };
        let coerced = DeserializationOptions {
            coerce: true,
            ..camel
        };
        let tree = input(&[("maxSize", Data::from("3"))]);

        let error = compile(&registry, foo, None, camel).unwrap().deserialize(&tree).unwrap_err();
        assert_eq!(error.to_string(), "$.maxSize: expected type int, found str");

        let value = compile(&registry, foo, None, coerced).unwrap().deserialize(&tree).unwrap();
        assert_eq!(value.as_object().unwrap().get("max_size"), Some(&Data::Int(3)));
    }

    #[test]
    fn styled_aliases_must_stay_distinct() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let clash = registry.object(
            "Clash",
            ObjectInfo::new([FieldInfo::new("max_size", int), FieldInfo::new("maxSize", int)]).unwrap(),
        );
        let registry = Arc::new(registry);
        let camel = DeserializationOptions {
            aliaser: AliasStyle::CamelCase,
            ..Default::default()
        };

        assert!(compile(&registry, clash, None, Default::default()).is_ok());
        let error = compile(&registry, clash, None, camel).err().unwrap();
        assert_eq!(
            error,
            CompileError::DuplicateAlias {
                object: "Clash".into(),
                alias: "maxSize".into(),
            }
        );
    }

    #[test]
    fn constrained_items() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let port = registry
            .constrained("Port", int, Constraints::new().with_minimum(1.0).with_maximum(65535.0))
            .unwrap();
        let ports = registry.list_of(port);
        let registry = Arc::new(registry);
        let method = compile(&registry, ports, None, Default::default()).unwrap();

        let good = Data::list([Data::from(80), Data::from(443)]);
        assert_eq!(method.deserialize(&good).unwrap(), good);
        let error = method
            .deserialize(&Data::list([Data::from(0), Data::from(70000)]))
            .unwrap_err();
        assert_eq!(error.to_string(), "$[0]: less than 1; $[1]: greater than 65535");
    }

    #[test]
    fn object_constraints_and_validators() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let ordered = Validator::new(|range| {
            let start = range.get("start").and_then(Data::as_int);
            let end = range.get("end").and_then(Data::as_int);
            if start > end {
                return Err(ValidationError::new("start is after end"));
            }
            Ok(())
        })
        .depends_on(["start", "end"]);
        let range = registry.object(
            "Range",
            ObjectInfo::new([FieldInfo::new("start", int), FieldInfo::new("end", int).with_default(10)])
                .unwrap()
                .with_constraints(Constraints::new().with_min_properties(1))
                .with_validator(ordered)
                .unwrap(),
        );
        let registry = Arc::new(registry);
        let method = compile(&registry, range, None, Default::default()).unwrap();

        let value = method.deserialize(&input(&[("start", Data::from(1))])).unwrap();
        assert_eq!(value.as_object().unwrap().get("end"), Some(&Data::from(10)));

        let error = method
            .deserialize(&input(&[("start", Data::from(2)), ("end", Data::from(1))]))
            .unwrap_err();
        assert_eq!(error.to_string(), "$: start is after end");

        let error = method.deserialize(&input(&[])).unwrap_err();
        assert_eq!(
            error.to_string(),
            "$: property count lower than 1; $.start: missing property"
        );
    }

    #[test]
    fn tagged_union_dispatches_on_its_tag() {
        let mut registry = TypeRegistry::new();
        let int = registry.int();
        let str = registry.str();
        let cat = registry.object("Cat", ObjectInfo::new([FieldInfo::new("lives", int)]).unwrap());
        let dog = registry.object("Dog", ObjectInfo::new([FieldInfo::new("name", str)]).unwrap());
        let pet = registry.tagged_union("kind", [("cat", cat), ("dog", dog)]).unwrap();
        let registry = Arc::new(registry);
        let method = compile(&registry, pet, None, Default::default()).unwrap();

        let rex = method
            .deserialize(&input(&[("kind", Data::from("dog")), ("name", Data::from("rex"))]))
            .unwrap();
        let rex = rex.as_object().unwrap();
        assert_eq!(rex.class(), dog.class_id());
        assert_eq!(rex.get("name"), Some(&Data::from("rex")));

        let error = method.deserialize(&input(&[("name", Data::from("rex"))])).unwrap_err();
        assert_eq!(error.to_string(), "$.kind: missing property");

        let error = method
            .deserialize(&input(&[("kind", Data::from("cat")), ("name", Data::from("tom"))]))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "$.lives: missing property; $.name: unexpected property"
        );
    }
}
