use indexmap::IndexMap;
use itertools::Itertools;

/// Ordered card attributes of a GEO record.
///
/// A key may repeat on a card (`contributor`, `characteristics_ch1`); every
/// value is kept in source order and [`InfoAttributes::get`] joins them with
/// `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InfoAttributes {
    entries: IndexMap<String, Vec<String>>,
}

impl InfoAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<K: Into<String>, V: Into<String>>(
        &mut self,
        key: K,
        value: V,
    ) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        self.entries.get(key).map(|values| values.iter().join("\n"))
    }

    /// First value recorded under `key`.
    pub fn first(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn values(
        &self,
        key: &str,
    ) -> &[String] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ordered `(key, joined value)` pairs for tabular export.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.entries
            .iter()
            .map(|(k, values)| (k.as_str(), values.iter().join("\n")))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InfoAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.push(key, value);
        }
        attributes
    }
}
