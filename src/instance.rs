//! Objects and ground atoms of a problem instance.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::vocabulary::VocabularyInfo;

/// An object of an instance, addressed by its dense 0-based index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Object {
    name: String,
    index: usize,
}

impl Object {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A ground atom: a predicate applied to a tuple of objects.
///
/// Static atoms hold in every state of the instance and are never part of a
/// [`State`][crate::state::State]'s atom set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    name: String,
    index: usize,
    predicate: usize,
    objects: Vec<usize>,
    is_static: bool,
}

impl Atom {
    /// Name in the form `pred(o1,o2)`.
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn index(&self) -> usize {
        self.index
    }
    /// Index of the predicate in the vocabulary.
    pub fn predicate(&self) -> usize {
        self.predicate
    }
    /// Object indices, one per predicate argument.
    pub fn objects(&self) -> &[usize] {
        &self.objects
    }
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Objects and atoms of one planning instance over a shared vocabulary.
///
/// Append-only: objects and atoms keep their indices for the lifetime of the
/// instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    vocabulary: Arc<VocabularyInfo>,
    objects: Vec<Object>,
    object_index: FxHashMap<String, usize>,
    atoms: Vec<Atom>,
    atom_index: FxHashMap<String, usize>,
    static_atoms: Vec<usize>,
}

impl InstanceInfo {
    pub fn new(vocabulary: Arc<VocabularyInfo>) -> Self {
        Self {
            vocabulary,
            objects: Vec::new(),
            object_index: FxHashMap::default(),
            atoms: Vec::new(),
            atom_index: FxHashMap::default(),
            static_atoms: Vec::new(),
        }
    }

    pub fn vocabulary(&self) -> &Arc<VocabularyInfo> {
        &self.vocabulary
    }

    /// Registers a new object.
    ///
    /// Fails with [`Error::DuplicateName`] if an object of that name exists.
    pub fn add_object(&mut self, name: &str) -> Result<Object> {
        if self.object_index.contains_key(name) {
            return Err(Error::DuplicateName {
                kind: "object",
                name: name.to_string(),
            });
        }
        let index = self.intern_object(name);
        Ok(self.objects[index].clone())
    }

    fn intern_object(&mut self, name: &str) -> usize {
        if let Some(&index) = self.object_index.get(name) {
            return index;
        }
        let index = self.objects.len();
        self.objects.push(Object {
            name: name.to_string(),
            index,
        });
        self.object_index.insert(name.to_string(), index);
        index
    }

    /// Adds an atom that may differ between states.
    pub fn add_atom(&mut self, predicate: &str, objects: &[&str]) -> Result<Atom> {
        self.add_atom_impl(predicate, objects, false)
    }

    /// Adds an atom that holds in every state.
    pub fn add_static_atom(&mut self, predicate: &str, objects: &[&str]) -> Result<Atom> {
        self.add_atom_impl(predicate, objects, true)
    }

    fn add_atom_impl(&mut self, predicate: &str, objects: &[&str], is_static: bool) -> Result<Atom> {
        let predicate = self.vocabulary.predicate_by_name(predicate)?;
        if predicate.arity() != objects.len() {
            return Err(Error::ArityMismatch {
                predicate: predicate.name().to_string(),
                arity: predicate.arity(),
                requested: objects.len(),
            });
        }
        let name = format!("{}({})", predicate.name(), objects.join(","));
        if let Some(&index) = self.atom_index.get(&name) {
            let atom = &self.atoms[index];
            if atom.is_static != is_static {
                return Err(Error::DuplicateName { kind: "atom", name });
            }
            return Ok(atom.clone());
        }
        let predicate = predicate.index();

        let objects = objects.iter().map(|o| self.intern_object(o)).collect();
        let index = self.atoms.len();
        let atom = Atom {
            name: name.clone(),
            index,
            predicate,
            objects,
            is_static,
        };
        debug!("add_atom({}, static = {}) -> {}", name, is_static, index);
        self.atoms.push(atom.clone());
        self.atom_index.insert(name, index);
        if is_static {
            self.static_atoms.push(index);
        }
        Ok(atom)
    }

    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Result<&Object> {
        self.objects
            .get(index)
            .ok_or_else(|| Error::bounds("object index", index))
    }

    pub fn object_by_name(&self, name: &str) -> Result<&Object> {
        self.object_index
            .get(name)
            .map(|&i| &self.objects[i])
            .ok_or_else(|| Error::bounds("object", name))
    }

    pub(crate) fn object_position(&self, name: &str) -> Option<usize> {
        self.object_index.get(name).copied()
    }

    /// All atoms, dynamic and static, in index order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, index: usize) -> Result<&Atom> {
        self.atoms
            .get(index)
            .ok_or_else(|| Error::bounds("atom index", index))
    }

    pub fn atom_by_name(&self, name: &str) -> Result<&Atom> {
        self.atom_index
            .get(name)
            .map(|&i| &self.atoms[i])
            .ok_or_else(|| Error::bounds("atom", name))
    }

    /// Indices of the static atoms.
    pub fn static_atoms(&self) -> &[usize] {
        &self.static_atoms
    }
}
