//! Case-insensitive, multi-valued, order-preserving header storage.

use log::trace;

/// A single header entry: the casing used on the *first* `append`/`set` for
/// this name, plus every value recorded for it, in insertion order.
#[derive(Debug, Clone)]
struct Entry {
    /// Original casing, preserved for emission.
    name: String,
    /// Lower-cased, used for comparisons and lookups.
    lower: String,
    values: Vec<Vec<u8>>,
}

/// An ordered collection of `(name, values)` header entries.
///
/// Names are compared case-insensitively. The casing of the first
/// `append`/`set` call for a given name is preserved for emission; insertion
/// order of distinct names is preserved and observable via [`HeaderStore::iter`].
#[derive(Debug, Clone, Default)]
pub struct HeaderStore {
    entries: Vec<Entry>,
}

impl HeaderStore {
    /// Creates an empty header store.
    pub fn new() -> Self {
        HeaderStore::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let lower = name.to_ascii_lowercase();
        self.entries.iter().position(|e| e.lower == lower)
    }

    /// Appends `value` to the entry for `name`, creating the entry (with
    /// `name`'s casing) if it doesn't already exist.
    pub fn append(&mut self, name: &str, value: impl Into<Vec<u8>>) {
        trace!("header append {}", name);
        match self.position(name) {
            Some(i) => self.entries[i].values.push(value.into()),
            None => self.entries.push(Entry {
                name: name.to_string(),
                lower: name.to_ascii_lowercase(),
                values: vec![value.into()],
            }),
        }
    }

    /// Replaces (or creates) the entry for `name` with exactly `values`.
    pub fn set(&mut self, name: &str, values: impl IntoIterator<Item = Vec<u8>>) {
        let values: Vec<Vec<u8>> = values.into_iter().collect();
        match self.position(name) {
            Some(i) => self.entries[i].values = values,
            None => self.entries.push(Entry {
                name: name.to_string(),
                lower: name.to_ascii_lowercase(),
                values,
            }),
        }
    }

    /// Removes the entry for `name`, if present.
    pub fn remove(&mut self, name: &str) {
        if let Some(i) = self.position(name) {
            self.entries.remove(i);
        }
    }

    /// True if an entry for `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All values recorded for `name`, in insertion order. Empty if absent.
    pub fn get(&self, name: &str) -> &[Vec<u8>] {
        match self.position(name) {
            Some(i) => &self.entries[i].values,
            None => &[],
        }
    }

    /// The first value recorded for `name`, decoded as UTF-8 if possible.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name)
            .first()
            .and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Iterates `(name, values)` pairs in insertion order, with the
    /// first-seen casing for each name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.values.as_slice()))
    }

    /// Number of distinct header names stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no header names are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
