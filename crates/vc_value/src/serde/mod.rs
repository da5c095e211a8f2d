//! `serde` interop for [`Data`](crate::Data).
//!
//! Any serde format can produce or consume a tree:
//!
//! ```
//! use vc_value::Data;
//!
//! let tree: Data = serde_json::from_str(r#"{"a": [1, 2.5, null]}"#).unwrap();
//! assert!(tree.is_tree());
//! assert_eq!(serde_json::to_string(&tree).unwrap(), r#"{"a":[1,2.5,null]}"#);
//! ```
//!
//! In-memory only values serialize best-effort: tuples and sets as sequences,
//! enum members as their value and objects as maps sorted by attribute name.
//! The unset placeholder and opaque values are rejected.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;
