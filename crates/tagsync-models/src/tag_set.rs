use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A set of tag or group names compared without regard to case.
///
/// The first spelling inserted for a name is the one kept and returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    names: BTreeMap<String, String>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn fold(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Insert a name; returns `false` if an equal name was already present.
    /// Blank names are ignored.
    pub fn insert(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return false;
        }
        let key = Self::fold(name);
        if self.names.contains_key(&key) {
            return false;
        }
        self.names.insert(key, name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(&Self::fold(name))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.names.remove(&Self::fold(name)).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.values().map(String::as_str)
    }

    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.insert(name);
        }
    }

    /// Names in `self` that are not in `other`.
    pub fn difference<'a>(&'a self, other: &'a TagSet) -> impl Iterator<Item = &'a str> + 'a {
        self.names
            .iter()
            .filter(move |(key, _)| !other.names.contains_key(*key))
            .map(|(_, name)| name.as_str())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.values().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.extend(iter);
        set
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names.values())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names.into_iter().collect())
    }
}
