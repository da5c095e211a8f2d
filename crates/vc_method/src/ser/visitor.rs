use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;

use crate::cache::CacheInner;
use crate::conversion::{Conversions, SerializationResolution, resolve_serialization};
use crate::error::CompileError;
use crate::hash::HashSet;
use crate::info::{Classes, CollectionInfo, EnumInfo, FieldKind, MappingInfo, ObjectInfo};
use crate::info::{Primitive, ShapeKind, TupleInfo, TypeHandle, TypeInfo, UnionInfo};
use crate::options::SerializationOptions;
use crate::recursion::{RecursionGuard, Visit};
use crate::registry::TypeRegistry;
use crate::ser::methods::{CollectionCheckOnlyMethod, CollectionMethod, ConversionMethod};
use crate::ser::methods::{EnumAnyMethod, EnumValueMethod, Fallback, MappingMethod, OptionalMethod};
use crate::ser::methods::{TaggedUnionMethod, TupleMethod, TypeCheckIdentityMethod, TypeCheckMethod};
use crate::ser::methods::UnionMethod;
use crate::ser::object::{ObjectMethod, SerEntry, SerField, SerVirtual};
use crate::ser::{AnyMethod, SerMethod, SerializationMethod, identity};
use crate::shape::{classify, expected_classes};

type Key = (TypeHandle, Option<Conversions>, SerializationOptions);

/// Compiles the serialization procedure of `ty`.
///
/// Nested procedures are shared within this compile only; `cache` is
/// what any-dispatch procedures go back to at run time.
pub(crate) fn compile(
    registry: &Arc<TypeRegistry>,
    cache: Weak<CacheInner>,
    ty: TypeHandle,
    conversions: Option<&Conversions>,
    options: SerializationOptions,
) -> Result<SerMethod, CompileError> {
    log::trace!(
        "compiling serialization of `{}`",
        registry.name(ty).unwrap_or_default()
    );
    let mut visitor = SerializationVisitor {
        registry,
        cache,
        guard: RecursionGuard::new(),
    };
    visitor.visit_conversion(ty, conversions, options)
}

struct SerializationVisitor<'a> {
    registry: &'a Arc<TypeRegistry>,
    cache: Weak<CacheInner>,
    guard: RecursionGuard<Key, dyn SerializationMethod>,
}

impl<'a> SerializationVisitor<'a> {
    fn name(&self, ty: TypeHandle) -> Arc<str> {
        self.registry.name(ty).unwrap_or_default().into()
    }

    fn any_method(&self, options: SerializationOptions) -> AnyMethod {
        AnyMethod::new(self.cache.clone(), self.registry.clone(), options)
    }

    fn fallback(&self, options: SerializationOptions) -> Fallback {
        if options.fall_back_on_any {
            Fallback::Any(Arc::new(self.any_method(options)))
        } else {
            Fallback::Fail
        }
    }

    /// Entry point for every type: resolves its conversion, guards
    /// recursion and applies the run-time type check.
    fn visit_conversion(
        &mut self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let key = (ty, conversions.cloned(), options);
        let mark = match self.guard.enter(&key) {
            Visit::Fresh(mark) => mark,
            Visit::Done(method) => return Ok(method),
            Visit::Cycle(lazy) => return Ok(lazy as SerMethod),
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
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let method: SerMethod = match resolve_serialization(self.registry, ty, conversions)? {
            SerializationResolution::Structural { next } => self.visit(ty, next.as_ref(), options)?,
            SerializationResolution::Convert(conversion) => {
                let sub_options = options.overridden(conversion.overrides());
                let method = self.visit_conversion(
                    conversion.target(),
                    conversion.sub_conversion(),
                    sub_options,
                )?;
                Arc::new(ConversionMethod {
                    converter: conversion.converter().clone(),
                    method,
                })
            }
        };
        self.type_checked(ty, method, options)
    }

    fn type_checked(
        &self,
        ty: TypeHandle,
        method: SerMethod,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        if !options.check_type {
            return Ok(method);
        }
        let Classes::Only(classes) = expected_classes(self.registry, ty)? else {
            return Ok(method);
        };
        let expected = self.name(ty);
        let fallback = self.fallback(options);
        let checked: SerMethod = if method.is_identity() {
            Arc::new(TypeCheckIdentityMethod {
                classes,
                expected,
                fallback,
            })
        } else {
            Arc::new(TypeCheckMethod {
                classes,
                expected,
                method,
                fallback,
            })
        };
        Ok(checked)
    }

    /// Visits a type one productive step deeper.
    fn nested(
        &mut self,
        ty: TypeHandle,
        conversions: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        self.guard.descend();
        let result = self.visit_conversion(ty, conversions, options);
        self.guard.ascend();
        result
    }

    fn visit(
        &mut self,
        ty: TypeHandle,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let registry: &'a Arc<TypeRegistry> = self.registry;
        let info = registry.info(ty).ok_or(CompileError::UnknownType(ty))?;
        match info {
            TypeInfo::Primitive(_) => Ok(identity()),
            TypeInfo::Any => Ok(if options.pass_through.any {
                identity()
            } else {
                Arc::new(self.any_method(options))
            }),
            TypeInfo::Collection(info) => self.visit_collection(ty, info, next, options),
            TypeInfo::Mapping(info) => self.visit_mapping(ty, info, next, options),
            TypeInfo::Tuple(info) => self.visit_tuple(ty, info, next, options),
            TypeInfo::Union(info) => self.visit_union(ty, info, next, options),
            TypeInfo::Enum(info) => Ok(self.visit_enum(ty, info, options)),
            TypeInfo::Literal(info) => Ok(if info.has_scalar_values() {
                identity()
            } else {
                Arc::new(self.any_method(options))
            }),
            TypeInfo::Object(info) => self.visit_object(ty, info, options),
            TypeInfo::Custom(_) if options.fall_back_on_any => {
                Ok(Arc::new(self.any_method(options).excluding(ty)))
            }
            TypeInfo::Custom(_) => Err(CompileError::Unsupported {
                name: self.name(ty),
            }),
        }
    }

    fn visit_collection(
        &mut self,
        ty: TypeHandle,
        info: &CollectionInfo,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let item = self.nested(info.item(), next, options)?;
        let passes = info.kind().is_tree() || options.pass_through.collections;
        let expected = self.name(ty);
        Ok(if passes && item.is_identity() {
            identity()
        } else if passes && item.is_check_only() {
            Arc::new(CollectionCheckOnlyMethod { item, expected })
        } else {
            Arc::new(CollectionMethod { item, expected })
        })
    }

    fn visit_mapping(
        &mut self,
        ty: TypeHandle,
        info: &MappingInfo,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let key = self.nested(info.key(), next, options)?;
        let value = self.nested(info.value(), next, options)?;
        let str_keys = matches!(
            self.registry.info(info.key()),
            Some(TypeInfo::Primitive(Primitive::Str))
        );
        let passes = str_keys || options.pass_through.collections;
        Ok(if passes && key.is_identity() && value.is_identity() {
            identity()
        } else {
            Arc::new(MappingMethod {
                key,
                value,
                expected: self.name(ty),
            })
        })
    }

    fn visit_tuple(
        &mut self,
        ty: TypeHandle,
        info: &TupleInfo,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let mut items = Vec::with_capacity(info.arity());
        for &item in info.items() {
            items.push(self.nested(item, next, options)?);
        }
        if options.pass_through.collections && items.iter().all(|item| item.is_identity()) {
            return Ok(identity());
        }
        Ok(Arc::new(TupleMethod {
            items: items.into(),
            expected: self.name(ty),
            arity_check: options.check_type.then(|| self.fallback(options)),
        }))
    }

    fn visit_union(
        &mut self,
        ty: TypeHandle,
        info: &UnionInfo,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        if info.discriminator().is_some() {
            return self.visit_tagged_union(ty, info, next, options);
        }
        let mut alternatives = Vec::with_capacity(info.alternatives().len());
        let mut skipped = None;
        for &alternative in info.alternatives() {
            match self.visit_conversion(alternative, next, options) {
                Ok(method) => alternatives.push((alternative, method)),
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

        if alternatives.len() <= 1 {
            return match alternatives.pop() {
                Some((_, method)) => Ok(method),
                None => Err(skipped.unwrap_or(CompileError::Unsupported {
                    name: self.name(ty),
                })),
            };
        }
        if alternatives.iter().all(|(_, method)| method.is_identity()) {
            return Ok(identity());
        }
        let null = self.registry.null();
        if let [(first, first_method), (second, second_method)] = alternatives.as_slice() {
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

        let mut eligible = Vec::with_capacity(alternatives.len());
        for (alternative, method) in alternatives {
            eligible.push((expected_classes(self.registry, alternative)?, method));
        }
        let fallback: Option<SerMethod> = if options.fall_back_on_any {
            Some(Arc::new(self.any_method(options)))
        } else {
            None
        };
        Ok(Arc::new(UnionMethod {
            alternatives: eligible,
            fallback,
            expected: self.name(ty),
        }))
    }

    fn visit_tagged_union(
        &mut self,
        ty: TypeHandle,
        info: &UnionInfo,
        next: Option<&Conversions>,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        let mut alternatives = Vec::with_capacity(info.alternatives().len());
        for (tag, alternative) in info.tagged_alternatives() {
            let method = self.visit_conversion(alternative, next, options)?;
            alternatives.push((alternative.class_id(), tag.clone(), method));
        }
        let property = info
            .discriminator()
            .map(|discriminator| discriminator.property().clone())
            .unwrap_or_default();
        Ok(Arc::new(TaggedUnionMethod {
            property,
            alternatives,
            fallback: options
                .fall_back_on_any
                .then(|| -> SerMethod { Arc::new(self.any_method(options)) }),
            expected: self.name(ty),
        }))
    }

    fn visit_enum(&self, ty: TypeHandle, info: &EnumInfo, options: SerializationOptions) -> SerMethod {
        let expected = self.name(ty);
        if options.pass_through.enums {
            identity()
        } else if info.has_scalar_values() {
            Arc::new(EnumValueMethod { expected })
        } else {
            Arc::new(EnumAnyMethod {
                any: Arc::new(self.any_method(options)),
                expected,
            })
        }
    }

    fn visit_object(
        &mut self,
        ty: TypeHandle,
        info: &ObjectInfo,
        options: SerializationOptions,
    ) -> Result<SerMethod, CompileError> {
        // (order key, position, entry)
        let mut ordered: Vec<(i64, usize, SerEntry)> = Vec::new();
        let mut flattened: Vec<(i64, usize, SerField)> = Vec::new();
        let mut aliases: HashSet<Arc<str>> = HashSet::default();

        for (position, field) in info.fields().iter().enumerate() {
            if field.kind() == FieldKind::WriteOnly {
                continue;
            }
            if field.is_flattened() {
                self.check_flatten(ty, field.ty(), field.name())?;
            }
            let alias = field.alias_for(options.aliaser);
            if !field.is_flattened() && !aliases.insert(alias.clone()) {
                return Err(self.duplicate_alias(ty, alias));
            }
            let method = self.nested(field.ty(), field.serialization(), options)?;
            let compiled = SerField {
                name: field.name().into(),
                alias,
                method,
                default: field.default().cloned(),
                skip: field.skippable(options.exclude_defaults, options.exclude_none),
            };
            let order = field.order().unwrap_or(position as i64);
            if field.is_flattened() {
                flattened.push((order, position, compiled));
            } else {
                ordered.push((order, position, SerEntry::Field(compiled)));
            }
        }

        let offset = info.fields().len();
        for (index, field) in info.serialized().iter().enumerate() {
            if !aliases.insert(field.alias().clone()) {
                return Err(self.duplicate_alias(ty, field.alias().clone()));
            }
            let method = self.nested(field.ty(), field.conversion(), options)?;
            let position = offset + index;
            ordered.push((
                field.order().unwrap_or(position as i64),
                position,
                SerEntry::Virtual(SerVirtual {
                    alias: field.alias().clone(),
                    func: field.func().clone(),
                    method,
                    skip_none: field.is_skip_none(),
                }),
            ));
        }

        ordered.sort_by_key(|(order, position, _)| (*order, *position));
        flattened.sort_by_key(|(order, position, _)| (*order, *position));

        Ok(Arc::new(ObjectMethod {
            expected: self.name(ty),
            flattened: flattened.into_iter().map(|(_, _, field)| field).collect(),
            entries: ordered.into_iter().map(|(_, _, entry)| entry).collect(),
            exclude_unset: options.exclude_unset,
        }))
    }

    fn duplicate_alias(&self, object: TypeHandle, alias: Arc<str>) -> CompileError {
        CompileError::DuplicateAlias {
            object: self.name(object),
            alias,
        }
    }

    fn check_flatten(&self, object: TypeHandle, ty: TypeHandle, field: &str) -> Result<(), CompileError> {
        match classify(self.registry, ty)? {
            ShapeKind::Object
            | ShapeKind::Mapping
            | ShapeKind::Union
            | ShapeKind::Any
            | ShapeKind::Custom => Ok(()),
            _ => Err(CompileError::InvalidFlatten {
                object: self.name(object),
                field: field.into(),
            }),
        }
    }
}
