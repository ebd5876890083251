use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// An ordered, deduplicated set of keywords.
///
/// Entries are trimmed and empty entries are dropped. Duplicates collapse to
/// the first occurrence, so iteration follows first-seen input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    ordered: Vec<String>,
    lookup: HashSet<String>,
}

impl KeywordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma-separated list such as `"foo, bar,,baz"`
    pub fn parse(input: &str) -> Self {
        let set: Self = input.split(',').collect();
        debug!("Parsed {} keywords from input", set.len());
        set
    }

    /// Adds a keyword, returning false if it was empty or already present
    pub fn insert(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.lookup.contains(keyword) {
            return false;
        }
        self.lookup.insert(keyword.to_string());
        self.ordered.push(keyword.to_string());
        true
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.lookup.contains(keyword)
    }

    /// Returns the stored keyword equal to `token`, if any
    pub fn get(&self, token: &str) -> Option<&str> {
        self.lookup.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.ordered
    }
}

impl<S: AsRef<str>> FromIterator<S> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for keyword in iter {
            set.insert(keyword.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for KeywordSet {
    fn from(keywords: Vec<String>) -> Self {
        keywords.into_iter().collect()
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(set: KeywordSet) -> Self {
        set.ordered
    }
}
