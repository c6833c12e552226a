use std::collections::HashMap;

use url::form_urlencoded;

/// Form fields of one report: each key maps to the values sent for it, in
/// the order the keys first appeared.
///
/// Keys are kept exactly as received. Field-name matching is the decoder's
/// job, so `TempF` and `tempf` are two separate entries here.
///
/// Percent-decoding is lossy: a byte sequence that is not UTF-8 comes out
/// as U+FFFD. The decoder rejects text fields containing it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    entries: Vec<(String, Vec<String>)>,
    /// key -> position in `entries`
    index: HashMap<String, usize>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `application/x-www-form-urlencoded` content.
    pub fn parse(input: &[u8]) -> Self {
        let mut values = Self::new();
        values.extend_from_encoded(input);
        values
    }

    /// Appends the pairs of another encoded body or query string. Values for
    /// keys that are already present are added after the existing ones.
    pub fn extend_from_encoded(&mut self, input: &[u8]) {
        for (key, value) in form_urlencoded::parse(input) {
            self.append(key.into_owned(), value.into_owned());
        }
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.values_mut(key.into()).push(value);
    }

    /// Replaces every value of `key`. An empty `values` keeps the key present
    /// with nothing attached to it.
    pub fn insert(&mut self, key: impl Into<String>, values: Vec<String>) {
        *self.values_mut(key.into()) = values;
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].1.as_slice())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn values_mut(&mut self, key: String) -> &mut Vec<String> {
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key.clone(), i);
                self.entries.push((key, Vec::new()));
                i
            }
        };
        &mut self.entries[i].1
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.append(key, value);
        }
        values
    }
}
