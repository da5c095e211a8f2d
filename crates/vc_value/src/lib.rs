//! The dynamic value model shared by the method compiler.
//!
//! [`Data`] represents both sides of a conversion:
//!
//! - in-memory values: [`ObjectData`], [`EnumData`], tuples, sets, and
//!   [`OpaqueData`] host values;
//! - trees: null, booleans, numbers, strings, lists and string-keyed
//!   [`MapData`].
//!
//! Every value reports its run-time [`DataClass`], which is what compiled
//! procedures check against.
#![no_std]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod data;
mod map;
mod object;
mod serde;

pub mod hash;

// -----------------------------------------------------------------------------
// Exports

pub use data::{Data, DataClass};
pub use map::MapData;
pub use object::{ClassId, EnumData, ObjectData, OpaqueData};
