//! Predicate vocabulary of a planning domain.

use std::fmt::{Display, Formatter};

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// A predicate symbol with a fixed arity.
///
/// Predicates are owned by a [`VocabularyInfo`] and addressed by their dense
/// 0-based index in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    name: String,
    arity: usize,
    index: usize,
}

impl Predicate {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn arity(&self) -> usize {
        self.arity
    }
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// Append-only set of predicates (and domain constants).
///
/// Build it once, then share it behind an `Arc` with every instance and
/// element factory that refers to it.
#[derive(Debug, Default, Clone)]
pub struct VocabularyInfo {
    predicates: Vec<Predicate>,
    predicate_index: FxHashMap<String, usize>,
    constants: Vec<String>,
}

impl VocabularyInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new predicate and returns it.
    ///
    /// Fails with [`Error::DuplicateName`] if the name is already taken.
    pub fn add_predicate(&mut self, name: &str, arity: usize) -> Result<Predicate> {
        if self.predicate_index.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "predicate",
                name: name.to_string(),
            });
        }
        let predicate = Predicate {
            name: name.to_string(),
            arity,
            index: self.predicates.len(),
        };
        self.predicate_index.insert(name.to_string(), predicate.index);
        self.predicates.push(predicate.clone());
        Ok(predicate)
    }

    /// Registers a domain constant, usable in `c_one_of`.
    pub fn add_constant(&mut self, name: &str) -> Result<()> {
        if self.constants.iter().any(|c| c == name) {
            return Err(Error::DuplicateName {
                kind: "constant",
                name: name.to_string(),
            });
        }
        self.constants.push(name.to_string());
        Ok(())
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn constants(&self) -> &[String] {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicate(&self, index: usize) -> Result<&Predicate> {
        self.predicates
            .get(index)
            .ok_or_else(|| Error::bounds("predicate index", index))
    }

    /// Looks up a predicate by name.
    pub fn predicate_by_name(&self, name: &str) -> Result<&Predicate> {
        self.predicate_index
            .get(name)
            .map(|&i| &self.predicates[i])
            .ok_or_else(|| Error::UnknownPredicate(name.to_string()))
    }

    pub fn contains_predicate(&self, name: &str) -> bool {
        self.predicate_index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_predicate() {
        let mut v = VocabularyInfo::new();
        let on = v.add_predicate("on", 2).unwrap();
        let clear = v.add_predicate("clear", 1).unwrap();
        assert_eq!(on.index(), 0);
        assert_eq!(clear.index(), 1);
        assert_eq!(v.len(), 2);
        assert_eq!(v.predicate_by_name("clear").unwrap(), &clear);
        assert_eq!(v.predicate(0).unwrap().to_string(), "on/2");
    }

    #[test]
    fn test_duplicate_predicate() {
        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        assert!(matches!(
            v.add_predicate("on", 1),
            Err(Error::DuplicateName { kind: "predicate", .. })
        ));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_lookup_errors() {
        let v = VocabularyInfo::new();
        assert_eq!(
            v.predicate_by_name("on"),
            Err(Error::UnknownPredicate("on".to_string()))
        );
        assert!(matches!(v.predicate(3), Err(Error::Bounds { .. })));
    }

    #[test]
    fn test_constants() {
        let mut v = VocabularyInfo::new();
        v.add_constant("depot").unwrap();
        assert!(v.add_constant("depot").is_err());
        assert_eq!(v.constants(), ["depot".to_string()]);
    }
}
