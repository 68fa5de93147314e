use indexmap::IndexMap;
use log::warn;

use crate::error::CharacteristicsParseWarning;

/// Key under which delimiter-less characteristics fragments are kept.
pub const CHARACTERISTICS_RAW_KEY: &str = "_raw";

/// `key: value` pairs parsed from a sample's `characteristics_ch1` field.
///
/// GEO stores one characteristic per line (`tissue: blood`). Lines without a
/// `:` are not dropped; they are appended to [`CHARACTERISTICS_RAW_KEY`] and
/// reported through [`Characteristics::warnings`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Characteristics {
    entries:  IndexMap<String, String>,
    warnings: Vec<CharacteristicsParseWarning>,
}

impl Characteristics {
    pub fn parse(raw: &str) -> Self {
        let mut out = Self::default();
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => {
                    out.insert(key.trim(), value.trim());
                },
                _ => out.push_raw(line),
            }
        }
        for warning in &out.warnings {
            warn!("{}", warning);
        }
        out
    }

    fn insert(
        &mut self,
        key: &str,
        value: &str,
    ) {
        // Repeated keys keep every value, one per line.
        self.entries
            .entry(key.to_string())
            .and_modify(|v| {
                v.push('\n');
                v.push_str(value)
            })
            .or_insert_with(|| value.to_string());
    }

    fn push_raw(
        &mut self,
        fragment: &str,
    ) {
        self.insert(CHARACTERISTICS_RAW_KEY, fragment);
        self.warnings.push(CharacteristicsParseWarning {
            fragment: fragment.to_string(),
        });
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Delimiter-less fragments, joined with `\n`.
    pub fn raw(&self) -> Option<&str> {
        self.get(CHARACTERISTICS_RAW_KEY)
    }

    pub fn warnings(&self) -> &[CharacteristicsParseWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
