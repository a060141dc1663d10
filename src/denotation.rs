//! Concept (object-set) and role (object-pair-set) denotations.
//!
//! A [`ConceptDenotation`] over `n` objects is an `n`-bit set; a
//! [`RoleDenotation`] is an `n²`-bit set where pair `(i, j)` lives at bit
//! `i * n + j`. All operations are value-level: they never touch a state.

use std::fmt::{Debug, Display, Formatter};

use crate::bitset::BitSet;

/// Set of objects.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ConceptDenotation {
    num_objects: usize,
    data: BitSet,
}

impl ConceptDenotation {
    /// The empty set over `num_objects` objects.
    pub fn new(num_objects: usize) -> Self {
        Self {
            num_objects,
            data: BitSet::new(num_objects),
        }
    }

    /// The set of all objects.
    pub fn full(num_objects: usize) -> Self {
        Self {
            num_objects,
            data: BitSet::full(num_objects),
        }
    }

    pub fn from_objects(num_objects: usize, objects: impl IntoIterator<Item = usize>) -> Self {
        let mut result = Self::new(num_objects);
        result.data.extend(objects);
        result
    }

    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    pub fn contains(&self, object: usize) -> bool {
        self.data.contains(object)
    }

    pub fn insert(&mut self, object: usize) -> bool {
        self.data.insert(object)
    }

    pub fn remove(&mut self, object: usize) -> bool {
        self.data.remove(object)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over member objects in increasing index order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.data.iter()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.data.is_subset(&other.data)
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.union_with(&other.data);
        result
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.intersect_with(&other.data);
        result
    }

    pub fn difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.difference_with(&other.data);
        result
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.symmetric_difference_with(&other.data);
        result
    }

    pub fn complement(&self) -> Self {
        let mut result = self.clone();
        result.data.complement();
        result
    }

    /// `{x | ∃y: role(x, y) ∧ y ∈ concept}`
    pub fn some(role: &RoleDenotation, concept: &ConceptDenotation) -> Self {
        let mut result = Self::new(role.num_objects);
        for (x, y) in role.iter() {
            if concept.contains(y) {
                result.insert(x);
            }
        }
        result
    }

    /// `{x | ∀y: role(x, y) ⟹ y ∈ concept}`
    pub fn all(role: &RoleDenotation, concept: &ConceptDenotation) -> Self {
        let mut result = Self::full(role.num_objects);
        for (x, y) in role.iter() {
            if !concept.contains(y) {
                result.remove(x);
            }
        }
        result
    }

    /// `{x | ∀y: left(x, y) ⟹ right(x, y)}`
    pub fn subset(left: &RoleDenotation, right: &RoleDenotation) -> Self {
        let mut result = Self::full(left.num_objects);
        for (x, y) in left.iter() {
            if !right.contains(x, y) {
                result.remove(x);
            }
        }
        result
    }
}

impl Debug for ConceptDenotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for ConceptDenotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Set of object pairs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RoleDenotation {
    num_objects: usize,
    data: BitSet,
}

impl RoleDenotation {
    /// The empty relation over `num_objects` objects.
    pub fn new(num_objects: usize) -> Self {
        Self {
            num_objects,
            data: BitSet::new(num_objects * num_objects),
        }
    }

    /// The relation containing every pair.
    pub fn full(num_objects: usize) -> Self {
        Self {
            num_objects,
            data: BitSet::full(num_objects * num_objects),
        }
    }

    pub fn from_pairs(num_objects: usize, pairs: impl IntoIterator<Item = (usize, usize)>) -> Self {
        let mut result = Self::new(num_objects);
        for (x, y) in pairs {
            result.insert(x, y);
        }
        result
    }

    /// `{(x, x) | x ∈ concept}`
    pub fn identity(concept: &ConceptDenotation) -> Self {
        let mut result = Self::new(concept.num_objects);
        for x in concept.iter() {
            result.insert(x, x);
        }
        result
    }

    pub fn num_objects(&self) -> usize {
        self.num_objects
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        x * self.num_objects + y
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.num_objects && y < self.num_objects && self.data.contains(self.offset(x, y))
    }

    pub fn insert(&mut self, x: usize, y: usize) -> bool {
        assert!(
            x < self.num_objects && y < self.num_objects,
            "Pair ({}, {}) is out of range for {} objects",
            x,
            y,
            self.num_objects
        );
        let offset = self.offset(x, y);
        self.data.insert(offset)
    }

    pub fn remove(&mut self, x: usize, y: usize) -> bool {
        if x >= self.num_objects || y >= self.num_objects {
            return false;
        }
        let offset = self.offset(x, y);
        self.data.remove(offset)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over pairs in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.num_objects;
        self.data.iter().map(move |i| (i / n, i % n))
    }

    /// `{y | (x, y) ∈ self}`
    pub fn successors(&self, x: usize) -> ConceptDenotation {
        let mut result = ConceptDenotation::new(self.num_objects);
        for y in 0..self.num_objects {
            if self.contains(x, y) {
                result.insert(y);
            }
        }
        result
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.union_with(&other.data);
        result
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.intersect_with(&other.data);
        result
    }

    pub fn difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.difference_with(&other.data);
        result
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.data.symmetric_difference_with(&other.data);
        result
    }

    pub fn complement(&self) -> Self {
        let mut result = self.clone();
        result.data.complement();
        result
    }

    /// `{(y, x) | (x, y) ∈ self}`
    pub fn inverse(&self) -> Self {
        let mut result = Self::new(self.num_objects);
        for (x, y) in self.iter() {
            result.insert(y, x);
        }
        result
    }

    /// Relational join: `(x, z)` iff `∃y: self(x, y) ∧ other(y, z)`.
    pub fn compose(&self, other: &Self) -> Self {
        let n = self.num_objects;
        let mut result = Self::new(n);
        for (x, y) in self.iter() {
            for z in 0..n {
                if other.contains(y, z) {
                    result.insert(x, z);
                }
            }
        }
        result
    }

    /// Keeps the pairs whose second component is in `concept`.
    pub fn restrict(&self, concept: &ConceptDenotation) -> Self {
        let mut result = Self::new(self.num_objects);
        for (x, y) in self.iter() {
            if concept.contains(y) {
                result.insert(x, y);
            }
        }
        result
    }

    /// Transitive closure (Warshall).
    pub fn transitive_closure(&self) -> Self {
        let mut result = self.clone();
        result.close_transitively();
        result
    }

    /// Reflexive-transitive closure: the diagonal is added before closing.
    pub fn transitive_reflexive_closure(&self) -> Self {
        let mut result = self.clone();
        for x in 0..self.num_objects {
            result.insert(x, x);
        }
        result.close_transitively();
        result
    }

    fn close_transitively(&mut self) {
        let n = self.num_objects;
        for k in 0..n {
            for i in 0..n {
                if !self.contains(i, k) {
                    continue;
                }
                for j in 0..n {
                    if self.contains(k, j) {
                        self.insert(i, j);
                    }
                }
            }
        }
    }
}

impl Debug for RoleDenotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl Display for RoleDenotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}
