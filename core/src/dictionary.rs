//! Bijective name <-> id mappings for terms and documents.
//!
//! Ids are dense and start at 1. The name vector is indexed by `id - 1`, the
//! ordered map gives the reverse direction and a stable iteration order.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Dictionary {
    by_name: BTreeMap<String, u32>,
    names: Vec<String>,
}

impl Dictionary {
    pub fn new() -> Self { Self::default() }

    /// Build a dictionary whose ids follow ascending lexicographic order of the names.
    /// Duplicates collapse to a single entry.
    pub fn from_names_sorted<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let mut dict = Self::new();
        for name in unique {
            dict.get_or_insert(&name);
        }
        dict
    }

    /// Returns the id of `name`, assigning the next free id on first sight.
    pub fn get_or_insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        self.names.push(name.to_string());
        let id = self.names.len() as u32;
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<u32> { self.by_name.get(name).copied() }

    pub fn name(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.names.get(id as usize - 1).map(String::as_str)
    }

    pub fn contains_id(&self, id: u32) -> bool { id >= 1 && (id as usize) <= self.names.len() }

    pub fn len(&self) -> usize { self.names.len() }

    pub fn is_empty(&self) -> bool { self.names.is_empty() }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.names.iter().enumerate().map(|(i, n)| (i as u32 + 1, n.as_str()))
    }
}

impl TryFrom<Vec<String>> for Dictionary {
    type Error = anyhow::Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        let mut by_name = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            let id = i as u32 + 1;
            if let Some(prev) = by_name.insert(name.clone(), id) {
                bail!("dictionary entry {name:?} is mapped to both id {prev} and id {id}");
            }
        }
        Ok(Self { by_name, names })
    }
}

impl From<Dictionary> for Vec<String> {
    fn from(dict: Dictionary) -> Self { dict.names }
}

/// The term and document dictionaries of one collection build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionaries {
    pub terms: Dictionary,
    pub docs: Dictionary,
}

impl Dictionaries {
    /// Total number of documents in the collection, whether or not they carry indexed terms.
    pub fn total_documents(&self) -> usize { self.docs.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_are_dense() {
        let mut d = Dictionary::new();
        assert_eq!(d.get_or_insert("FT911-1"), 1);
        assert_eq!(d.get_or_insert("FT911-2"), 2);
        assert_eq!(d.get_or_insert("FT911-1"), 1);
        assert_eq!(d.len(), 2);
        assert_eq!(d.name(0), None);
        assert_eq!(d.name(2), Some("FT911-2"));
        assert_eq!(d.name(3), None);
    }

    #[test]
    fn sorted_names_get_alphabetical_ids() {
        let d = Dictionary::from_names_sorted(["dog", "cat", "bird", "cat"]);
        assert_eq!(d.id("bird"), Some(1));
        assert_eq!(d.id("cat"), Some(2));
        assert_eq!(d.id("dog"), Some(3));
        let listed: Vec<_> = d.iter().map(|(id, n)| (id, n.to_string())).collect();
        assert_eq!(listed, vec![(1, "bird".into()), (2, "cat".into()), (3, "dog".into())]);
    }

    #[test]
    fn both_directions_agree() {
        let d = Dictionary::from_names_sorted(["alpha", "beta", "gamma"]);
        for (id, name) in d.iter() {
            assert_eq!(d.id(name), Some(id));
        }
    }

    #[test]
    fn deserialization_rejects_duplicate_names() {
        let bytes = bincode::serialize(&vec!["a".to_string(), "b".to_string(), "a".to_string()]).unwrap();
        let res: std::result::Result<Dictionary, _> = bincode::deserialize(&bytes);
        assert!(res.is_err());

        let good = Dictionary::from_names_sorted(["x", "y"]);
        let bytes = bincode::serialize(&good).unwrap();
        let back: Dictionary = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, good);
    }
}
