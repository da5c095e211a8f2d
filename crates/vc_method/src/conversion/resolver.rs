use alloc::vec::Vec;

use crate::conversion::{Conversion, ConversionOverrides, Conversions, Converter};
use crate::error::CompileError;
use crate::info::TypeHandle;
use crate::registry::TypeRegistry;

// -----------------------------------------------------------------------------
// ResolvedConversion

/// A conversion selected for one type, with the conversions to apply
/// while walking the other side already chained.
#[derive(Debug, Clone)]
pub struct ResolvedConversion {
    source: TypeHandle,
    target: TypeHandle,
    converter: Converter,
    sub_conversion: Option<Conversions>,
    overrides: ConversionOverrides,
    dynamic: bool,
}

impl ResolvedConversion {
    fn new(conversion: &Conversion, next: Option<&Conversions>, dynamic: bool) -> Self {
        Self {
            source: conversion.source(),
            target: conversion.target(),
            converter: conversion.converter().clone(),
            sub_conversion: Conversions::chain_opt(conversion.sub_conversion(), next),
            overrides: *conversion.overrides(),
            dynamic,
        }
    }

    #[inline]
    pub const fn source(&self) -> TypeHandle {
        self.source
    }

    #[inline]
    pub const fn target(&self) -> TypeHandle {
        self.target
    }

    #[inline]
    pub const fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Conversions used on the converted side.
    #[inline]
    pub const fn sub_conversion(&self) -> Option<&Conversions> {
        self.sub_conversion.as_ref()
    }

    #[inline]
    pub const fn overrides(&self) -> &ConversionOverrides {
        &self.overrides
    }

    /// Returns `true` if the conversion was supplied at the call site.
    #[inline]
    pub const fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Returns `true` for an alternative meaning "the type itself".
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.converter.is_identity() && self.source == self.target
    }
}

// -----------------------------------------------------------------------------
// Resolutions

/// How serialization of one type proceeds.
#[derive(Debug, Clone)]
pub enum SerializationResolution {
    /// Walk the type's own shape, handing `next` to its items.
    Structural { next: Option<Conversions> },
    /// Convert the value, then serialize it as the conversion target.
    Convert(ResolvedConversion),
}

/// How deserialization of one type proceeds.
#[derive(Debug, Clone)]
pub enum DeserializationResolution {
    /// Validate the type's own shape, handing `next` to its items.
    Structural { next: Option<Conversions> },
    /// Try each alternative: deserialize its source, then convert.
    Convert(Vec<ResolvedConversion>),
}

/// The override forwarded to the items of a structural walk.
///
/// Registry conversions let the call-site override reach the items of a
/// container; call-site conversions consume it.
fn forwarded(
    registry: &TypeRegistry,
    ty: TypeHandle,
    dynamic: bool,
    overrides: Option<&Conversions>,
) -> Result<Option<Conversions>, CompileError> {
    let info = registry.info(ty).ok_or(CompileError::UnknownType(ty))?;
    Ok(if !dynamic && info.is_container() {
        overrides.cloned()
    } else {
        None
    })
}

/// Resolves the conversion applied when serializing `ty`.
///
/// The first call-site conversion whose source is `ty` wins, then the
/// registered one. An identity conversion means no conversion.
pub fn resolve_serialization(
    registry: &TypeRegistry,
    ty: TypeHandle,
    overrides: Option<&Conversions>,
) -> Result<SerializationResolution, CompileError> {
    let meta = registry.get(ty).ok_or(CompileError::UnknownType(ty))?;
    if !meta.info().is_convertible() {
        return Ok(SerializationResolution::Structural {
            next: overrides.cloned(),
        });
    }

    let dynamic_match = overrides.and_then(|list| list.iter().find(|conv| conv.source() == ty));
    let (conversion, dynamic) = match dynamic_match {
        Some(conversion) => (Some(conversion), true),
        None => (meta.serialization().and_then(|list| list.iter().next()), false),
    };
    let next = forwarded(registry, ty, dynamic, overrides)?;

    Ok(match conversion {
        Some(conversion) if !conversion.is_identity() => SerializationResolution::Convert(
            ResolvedConversion::new(conversion, next.as_ref(), dynamic),
        ),
        _ => SerializationResolution::Structural { next },
    })
}

/// Resolves the conversions producing `ty` when deserializing.
///
/// Call-site conversions targeting `ty` are used when any match, the
/// registered ones otherwise. A lone identity means no conversion.
pub fn resolve_deserialization(
    registry: &TypeRegistry,
    ty: TypeHandle,
    overrides: Option<&Conversions>,
) -> Result<DeserializationResolution, CompileError> {
    let meta = registry.get(ty).ok_or(CompileError::UnknownType(ty))?;
    if !meta.info().is_convertible() {
        return Ok(DeserializationResolution::Structural {
            next: overrides.cloned(),
        });
    }

    let mut dynamic = true;
    let mut alternatives: Vec<&Conversion> = overrides
        .map(|list| list.iter().filter(|conv| conv.target() == ty).collect())
        .unwrap_or_default();
    if alternatives.is_empty() {
        dynamic = false;
        if let Some(list) = meta.deserialization() {
            alternatives = list.iter().collect();
        }
    }
    let next = forwarded(registry, ty, dynamic, overrides)?;

    if alternatives.is_empty() || (alternatives.len() == 1 && alternatives[0].is_identity()) {
        return Ok(DeserializationResolution::Structural { next });
    }
    Ok(DeserializationResolution::Convert(
        alternatives
            .into_iter()
            .map(|conversion| ResolvedConversion::new(conversion, next.as_ref(), dynamic))
            .collect(),
    ))
}
