//! A string-keyed, heterogeneous map used by middleware to pass derived
//! values downstream to later middleware and the terminal handler.
//!
//! Keyed by caller-chosen `String`s rather than by `TypeId`, since route
//! patterns and middleware in this crate are configured at runtime rather
//! than assembled from statically-typed pipelines.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Storage for arbitrary per-request values, keyed by name.
#[derive(Default)]
pub struct Attributes {
    data: HashMap<String, Box<dyn Any + Send>>,
}

impl Attributes {
    /// An empty attribute map.
    pub fn new() -> Self {
        Attributes::default()
    }

    /// Stores `value` under `key`, overwriting any existing value at that
    /// key regardless of its type.
    pub fn insert<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send,
    {
        self.data.insert(key.into(), Box::new(value));
    }

    /// True if some value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Borrows the value at `key` as `T`, or `None` if absent or stored as a
    /// different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    /// Mutably borrows the value at `key` as `T`.
    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.data.get_mut(key).and_then(|v| v.downcast_mut::<T>())
    }

    /// Removes and returns the value at `key` as `T`, if present and of
    /// that type. If present but of a different type, it is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if self.data.get(key)?.downcast_ref::<T>().is_none() {
            return None;
        }
        self.data
            .remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|b| *b)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attributes")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_round_trip() {
        let mut a = Attributes::new();
        a.insert("user_id", 42u64);
        assert_eq!(a.get::<u64>("user_id"), Some(&42));
        assert_eq!(a.get::<String>("user_id"), None);
    }

    #[test]
    fn remove_returns_owned_value() {
        let mut a = Attributes::new();
        a.insert("name", "alice".to_string());
        assert_eq!(a.remove::<String>("name"), Some("alice".to_string()));
        assert!(!a.contains_key("name"));
    }

    #[test]
    fn overwrite_changes_type_freely() {
        let mut a = Attributes::new();
        a.insert("k", 1i32);
        a.insert("k", "now a string".to_string());
        assert_eq!(a.get::<i32>("k"), None);
        assert_eq!(a.get::<String>("k"), Some(&"now a string".to_string()));
    }
}
