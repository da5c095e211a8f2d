use alloc::sync::Arc;
use alloc::vec::Vec;
use core::{error, fmt};

use crate::error::{ErrorKey, ErrorPath};

// -----------------------------------------------------------------------------
// ValidationError

/// A tree of deserialization failures.
///
/// Each node holds the messages concerning the value at that location and
/// child errors keyed by field alias or item index. Object and sequence
/// procedures accumulate every problem before failing, so a single error
/// describes the whole malformed input.
///
/// # Examples
///
/// ```
/// use vc_method::ValidationError;
///
/// let error = ValidationError::default()
///     .with_child("a", ValidationError::new("missing property"))
///     .with_child("b", ValidationError::new("missing property"));
///
/// let flat = error.flatten();
/// assert_eq!(flat.len(), 2);
/// assert_eq!(flat[0].0.to_string(), "$.a");
/// assert_eq!(&*flat[1].1, "missing property");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError {
    messages: Vec<Arc<str>>,
    children: Vec<(ErrorKey, ValidationError)>,
}

impl ValidationError {
    /// Creates an error with one message at the current location.
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self {
            messages: alloc::vec![message.into()],
            children: Vec::new(),
        }
    }

    /// Builder form of [`ValidationError::add_child`].
    pub fn with_child(mut self, key: impl Into<ErrorKey>, child: ValidationError) -> Self {
        self.add_child(key, child);
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.is_empty()
    }

    #[inline]
    pub fn messages(&self) -> &[Arc<str>] {
        &self.messages
    }

    #[inline]
    pub fn children(&self) -> &[(ErrorKey, ValidationError)] {
        &self.children
    }

    pub fn child(&self, key: &ErrorKey) -> Option<&ValidationError> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, c)| c)
    }

    pub fn add_message(&mut self, message: impl Into<Arc<str>>) {
        self.messages.push(message.into());
    }

    /// Attaches `child` under `key`, merging with an existing child.
    pub fn add_child(&mut self, key: impl Into<ErrorKey>, child: ValidationError) {
        let key = key.into();
        match self.children.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.merge_from(child),
            None => self.children.push((key, child)),
        }
    }

    /// Combines two errors about the same location.
    pub fn merge(mut self, other: ValidationError) -> Self {
        self.merge_from(other);
        self
    }

    pub(crate) fn merge_from(&mut self, other: ValidationError) {
        for message in other.messages {
            if !self.messages.contains(&message) {
                self.messages.push(message);
            }
        }
        for (key, child) in other.children {
            self.add_child(key, child);
        }
    }

    /// Lists every message with its location, depth first.
    pub fn flatten(&self) -> Vec<(ErrorPath, Arc<str>)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        self.flatten_into(&mut path, &mut out);
        out
    }

    fn flatten_into(&self, path: &mut Vec<ErrorKey>, out: &mut Vec<(ErrorPath, Arc<str>)>) {
        for message in &self.messages {
            out.push((ErrorPath::from(path.clone()), message.clone()));
        }
        for (key, child) in &self.children {
            path.push(key.clone());
            child.flatten_into(path, out);
            path.pop();
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flat = self.flatten();
        if flat.is_empty() {
            return f.write_str("validation failed");
        }
        for (index, (path, message)) in flat.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{path}: {message}")?;
        }
        Ok(())
    }
}

impl error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn merge_combines_children() {
        let a = ValidationError::default().with_child("x", ValidationError::new("bad"));
        let b = ValidationError::new("top")
            .with_child("x", ValidationError::new("worse"))
            .with_child(0_usize, ValidationError::new("item"));
        let merged = a.merge(b);

        assert_eq!(merged.messages().len(), 1);
        assert_eq!(merged.children().len(), 2);
        let x = merged.child(&ErrorKey::from("x")).unwrap();
        assert_eq!(x.messages().len(), 2);
    }

    #[test]
    fn display_lists_locations() {
        let error = ValidationError::default()
            .with_child("a", ValidationError::default().with_child(1_usize, ValidationError::new("e")));
        assert_eq!(error.to_string(), "$.a[1]: e");
        assert_eq!(ValidationError::default().to_string(), "validation failed");
    }
}
