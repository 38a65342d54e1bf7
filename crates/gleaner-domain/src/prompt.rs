//! Prompt arguments

use std::collections::BTreeMap;

/// Key-value arguments substituted into a prompt template
///
/// Values are stored already stringified. The map is cheap to clone and every
/// extraction worker receives its own copy, so one worker adding `input_text`
/// is never visible to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptArgs {
    values: BTreeMap<String, String>,
}

impl PromptArgs {
    /// Create an empty argument map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert of a list, one item per line
    pub fn with_list<I, S>(mut self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|item| item.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        self.insert(key, joined);
        self
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True if the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over arguments in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for PromptArgs
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut args = Self::new();
        for (key, value) in iter {
            args.insert(key, value);
        }
        args
    }
}
