//! States: sets of dynamic atoms of an instance.

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::instance::InstanceInfo;

/// A state of a planning instance.
///
/// Holds the indices of the *dynamic* atoms that are true. Static atoms are
/// implicitly true and are looked up in the instance. The `index` is an
/// identity tag for callers and does not take part in equality.
///
/// # Invariants
///
/// - atom indices are sorted and unique
/// - no atom index refers to a static atom
#[derive(Debug, Clone)]
pub struct State {
    instance: Arc<InstanceInfo>,
    atoms: Vec<usize>,
    index: usize,
}

impl State {
    /// Creates a state from atom indices (in any order).
    pub fn new(instance: Arc<InstanceInfo>, atoms: impl IntoIterator<Item = usize>, index: usize) -> Result<Self> {
        let mut atoms: Vec<usize> = atoms.into_iter().collect();
        for &a in &atoms {
            let atom = instance.atom(a)?;
            if atom.is_static() {
                return Err(Error::StaticAtomInState(atom.name().to_string()));
            }
        }
        atoms.sort_unstable();
        atoms.dedup();
        Ok(Self { instance, atoms, index })
    }

    /// Creates a state from atom names such as `at(t1,l1)`.
    pub fn from_atom_names<'a>(
        instance: Arc<InstanceInfo>,
        names: impl IntoIterator<Item = &'a str>,
        index: usize,
    ) -> Result<Self> {
        let atoms = names
            .into_iter()
            .map(|name| instance.atom_by_name(name).map(|a| a.index()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(instance, atoms, index)
    }

    pub fn instance(&self) -> &Arc<InstanceInfo> {
        &self.instance
    }

    /// Sorted indices of the dynamic atoms in this state.
    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atoms.binary_search(&atom).is_ok()
    }

    /// Iterates over the state's atoms followed by the instance's static atoms.
    pub(crate) fn all_atoms(&self) -> impl Iterator<Item = &crate::instance::Atom> + '_ {
        let atoms = self.instance.atoms();
        self.atoms
            .iter()
            .chain(self.instance.static_atoms())
            .map(move |&i| &atoms[i])
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.instance, &other.instance) && self.atoms == other.atoms
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.instance) as usize).hash(state);
        self.atoms.hash(state);
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(state index={}, atoms={{", self.index)?;
        for (i, &a) in self.atoms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.instance.atoms()[a])?;
        }
        write!(f, "}})")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::vocabulary::VocabularyInfo;

    fn instance() -> Arc<InstanceInfo> {
        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        let mut i = InstanceInfo::new(Arc::new(v));
        i.add_atom("on", &["a", "b"]).unwrap();
        i.add_atom("clear", &["a"]).unwrap();
        i.add_static_atom("clear", &["table"]).unwrap();
        Arc::new(i)
    }

    #[test]
    fn test_equality_ignores_order() {
        let i = instance();
        let s1 = State::new(i.clone(), [0, 1], 0).unwrap();
        let s2 = State::new(i.clone(), [1, 0], 5).unwrap();
        assert_eq!(s1, s2);

        let mut set = HashSet::new();
        set.insert(s1);
        assert!(set.contains(&s2));
    }

    #[test]
    fn test_equality_depends_on_instance() {
        let i1 = instance();
        let i2 = Arc::new((*i1).clone());
        let s1 = State::new(i1, [0, 1], 0).unwrap();
        let s2 = State::new(i2, [0, 1], 0).unwrap();
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_static_atom_rejected() {
        let i = instance();
        assert_eq!(
            State::new(i, [0, 2], 0),
            Err(Error::StaticAtomInState("clear(table)".to_string()))
        );
    }

    #[test]
    fn test_out_of_range_atom() {
        let i = instance();
        assert!(matches!(State::new(i, [9], 0), Err(Error::Bounds { .. })));
    }

    #[test]
    fn test_from_atom_names() {
        let i = instance();
        let s = State::from_atom_names(i, ["clear(a)", "on(a,b)"], 3).unwrap();
        assert_eq!(s.atoms(), &[0, 1]);
        assert!(s.contains(1));
        assert_eq!(s.to_string(), "(state index=3, atoms={on(a,b), clear(a)})");
    }
}
