//! Element factory: construction and interning of elements.
//!
//! Every element is built through an [`ElementFactory`]. Construction
//! computes the canonical repr of the candidate node and either returns the
//! already interned element with that repr or appends the node to its
//! family's table under the next free index. Equal reprs therefore always
//! yield the same handle.
//!
//! The factory is `Send + Sync`: all builders take `&self` and can be called
//! concurrently from generator tasks.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use dl_features::factory::ElementFactory;
//! use dl_features::vocabulary::VocabularyInfo;
//!
//! let mut vocabulary = VocabularyInfo::new();
//! vocabulary.add_predicate("clear", 1).unwrap();
//! let factory = ElementFactory::new(Arc::new(vocabulary));
//!
//! let clear = factory.make_concept_primitive("clear", 0).unwrap();
//! let top = factory.make_concept_top();
//! let a = factory.make_concept_and(clear, top);
//! let b = factory.make_concept_and(top, clear);
//! assert_eq!(a, b);
//! assert_eq!(&*factory.repr(a), "c_and(c_primitive(clear,0),c_top)");
//! assert_eq!(factory.complexity(a), 3);
//! ```

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use log::debug;

use crate::element::{BooleanNode, ConceptNode, Element, NumericalNode, RoleNode};
use crate::error::{Error, Result};
use crate::reference::{BooleanRef, ConceptRef, NumericalRef, RoleRef};
use crate::state::State;
use crate::table::{Interned, Table};
use crate::vocabulary::{Predicate, VocabularyInfo};

pub struct ElementFactory {
    vocabulary: Arc<VocabularyInfo>,
    pub(crate) concepts: Table<ConceptNode>,
    pub(crate) roles: Table<RoleNode>,
    pub(crate) numericals: Table<NumericalNode>,
    pub(crate) booleans: Table<BooleanNode>,
}

impl ElementFactory {
    pub fn new(vocabulary: Arc<VocabularyInfo>) -> Self {
        Self {
            vocabulary,
            concepts: Table::new(),
            roles: Table::new(),
            numericals: Table::new(),
            booleans: Table::new(),
        }
    }

    pub fn vocabulary(&self) -> &Arc<VocabularyInfo> {
        &self.vocabulary
    }

    fn interned<E: Element>(&self, element: E) -> Interned<E::Node> {
        E::table(self)
            .get(element.to_raw())
            .unwrap_or_else(|| panic!("{:?} is not interned in this factory", element))
    }

    /// Returns the operator node of an element.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not created by this factory.
    pub fn node<E: Element>(&self, element: E) -> E::Node {
        self.interned(element).node
    }

    /// Number of operators in the element's tree.
    pub fn complexity<E: Element>(&self, element: E) -> usize {
        self.interned(element).complexity
    }

    /// Canonical repr of the element.
    pub fn repr<E: Element>(&self, element: E) -> Arc<str> {
        self.interned(element).repr
    }

    /// Evaluates an element on a single state, without caching.
    pub fn evaluate<E: Element>(&self, element: E, state: &State) -> E::Denotation {
        E::evaluate_node(&self.node(element), self, state)
    }

    /// Looks up an already interned element by its canonical repr.
    pub fn find<E: Element>(&self, repr: &str) -> Option<E> {
        E::table(self).find(repr).map(E::from_raw)
    }

    pub fn find_concept(&self, repr: &str) -> Option<ConceptRef> {
        self.find(repr)
    }

    pub fn find_role(&self, repr: &str) -> Option<RoleRef> {
        self.find(repr)
    }

    pub fn find_numerical(&self, repr: &str) -> Option<NumericalRef> {
        self.find(repr)
    }

    pub fn find_boolean(&self, repr: &str) -> Option<BooleanRef> {
        self.find(repr)
    }

    /// Number of interned elements of the family `E`.
    pub fn len<E: Element>(&self) -> usize {
        E::table(self).len()
    }

    pub fn num_concepts(&self) -> usize {
        self.concepts.len()
    }

    pub fn num_roles(&self) -> usize {
        self.roles.len()
    }

    pub fn num_numericals(&self) -> usize {
        self.numericals.len()
    }

    pub fn num_booleans(&self) -> usize {
        self.booleans.len()
    }

    fn intern<E: Element>(&self, node: E::Node, repr: String, complexity: usize) -> E {
        let (index, fresh) = E::table(self).put(repr, complexity, node);
        let element = E::from_raw(index);
        if fresh {
            debug!("intern {} {} -> {}", E::KIND, self.repr(element), index);
        }
        element
    }

    /// Interns a node whose children are elements of this factory.
    fn compose<E: Element>(&self, node: E::Node, operator: &str, children: &[(Arc<str>, usize)]) -> E {
        let args: Vec<&str> = children.iter().map(|(repr, _)| &**repr).collect();
        let repr = format!("{}({})", operator, args.join(","));
        let complexity = 1 + children.iter().map(|&(_, c)| c).sum::<usize>();
        self.intern(node, repr, complexity)
    }

    fn attrs<E: Element>(&self, element: E) -> (Arc<str>, usize) {
        let interned = self.interned(element);
        (interned.repr, interned.complexity)
    }

    /// Orders the operands of a commutative operator by repr.
    fn ordered<E: Element>(&self, a: E, b: E) -> ((E, (Arc<str>, usize)), (E, (Arc<str>, usize))) {
        let (x, y) = (self.attrs(a), self.attrs(b));
        if x.0 <= y.0 {
            ((a, x), (b, y))
        } else {
            ((b, y), (a, x))
        }
    }

    /// Resolves `predicate`, checking that every position is within its arity.
    pub(crate) fn predicate_position(&self, predicate: &str, positions: &[usize]) -> Result<&Predicate> {
        let p = self.vocabulary.predicate_by_name(predicate)?;
        if let Some(&bad) = positions.iter().find(|&&pos| pos >= p.arity()) {
            return Err(Error::ArityMismatch {
                predicate: p.name().to_string(),
                arity: p.arity(),
                requested: bad,
            });
        }
        Ok(p)
    }

    // ─── Concepts ───

    pub fn make_concept_top(&self) -> ConceptRef {
        self.intern(ConceptNode::Top, "c_top".to_string(), 1)
    }

    pub fn make_concept_bot(&self) -> ConceptRef {
        self.intern(ConceptNode::Bot, "c_bot".to_string(), 1)
    }

    /// Objects at position `pos` of the atoms of `predicate`.
    ///
    /// Fails if the predicate is unknown or `pos` is outside its arity.
    pub fn make_concept_primitive(&self, predicate: &str, pos: usize) -> Result<ConceptRef> {
        let p = self.predicate_position(predicate, &[pos])?;
        Ok(self.concept_primitive(p, pos))
    }

    pub(crate) fn concept_primitive(&self, predicate: &Predicate, pos: usize) -> ConceptRef {
        assert!(pos < predicate.arity(), "Position {} is out of arity of {}", pos, predicate);
        let repr = format!("c_primitive({},{})", predicate.name(), pos);
        let node = ConceptNode::Primitive {
            predicate: predicate.index(),
            pos,
        };
        self.intern(node, repr, 1)
    }

    pub fn make_concept_and(&self, left: ConceptRef, right: ConceptRef) -> ConceptRef {
        let ((a, x), (b, y)) = self.ordered(left, right);
        self.compose(ConceptNode::And(a, b), "c_and", &[x, y])
    }

    pub fn make_concept_or(&self, left: ConceptRef, right: ConceptRef) -> ConceptRef {
        let ((a, x), (b, y)) = self.ordered(left, right);
        self.compose(ConceptNode::Or(a, b), "c_or", &[x, y])
    }

    pub fn make_concept_not(&self, concept: ConceptRef) -> ConceptRef {
        self.compose(ConceptNode::Not(concept), "c_not", &[self.attrs(concept)])
    }

    pub fn make_concept_diff(&self, left: ConceptRef, right: ConceptRef) -> ConceptRef {
        let children = [self.attrs(left), self.attrs(right)];
        self.compose(ConceptNode::Diff(left, right), "c_diff", &children)
    }

    pub fn make_concept_some(&self, role: RoleRef, concept: ConceptRef) -> ConceptRef {
        let children = [self.attrs(role), self.attrs(concept)];
        self.compose(ConceptNode::Some(role, concept), "c_some", &children)
    }

    pub fn make_concept_all(&self, role: RoleRef, concept: ConceptRef) -> ConceptRef {
        let children = [self.attrs(role), self.attrs(concept)];
        self.compose(ConceptNode::All(role, concept), "c_all", &children)
    }

    pub fn make_concept_subset(&self, left: RoleRef, right: RoleRef) -> ConceptRef {
        let children = [self.attrs(left), self.attrs(right)];
        self.compose(ConceptNode::Subset(left, right), "c_subset", &children)
    }

    /// Singleton of the named object. Denotes the empty set in instances
    /// without such an object.
    pub fn make_concept_one_of(&self, object: &str) -> ConceptRef {
        let repr = format!("c_one_of({})", object);
        self.intern(ConceptNode::OneOf(Arc::from(object)), repr, 1)
    }

    // ─── Roles ───

    pub fn make_role_top(&self) -> RoleRef {
        self.intern(RoleNode::Top, "r_top".to_string(), 1)
    }

    /// Pairs of objects at positions `pos1` and `pos2` of the atoms of `predicate`.
    pub fn make_role_primitive(&self, predicate: &str, pos1: usize, pos2: usize) -> Result<RoleRef> {
        let p = self.predicate_position(predicate, &[pos1, pos2])?;
        Ok(self.role_primitive(p, pos1, pos2))
    }

    pub(crate) fn role_primitive(&self, predicate: &Predicate, pos1: usize, pos2: usize) -> RoleRef {
        assert!(
            pos1 < predicate.arity() && pos2 < predicate.arity(),
            "Positions ({}, {}) are out of arity of {}",
            pos1,
            pos2,
            predicate
        );
        let repr = format!("r_primitive({},{},{})", predicate.name(), pos1, pos2);
        let node = RoleNode::Primitive {
            predicate: predicate.index(),
            pos1,
            pos2,
        };
        self.intern(node, repr, 1)
    }

    pub fn make_role_and(&self, left: RoleRef, right: RoleRef) -> RoleRef {
        let ((a, x), (b, y)) = self.ordered(left, right);
        self.compose(RoleNode::And(a, b), "r_and", &[x, y])
    }

    pub fn make_role_or(&self, left: RoleRef, right: RoleRef) -> RoleRef {
        let ((a, x), (b, y)) = self.ordered(left, right);
        self.compose(RoleNode::Or(a, b), "r_or", &[x, y])
    }

    pub fn make_role_not(&self, role: RoleRef) -> RoleRef {
        self.compose(RoleNode::Not(role), "r_not", &[self.attrs(role)])
    }

    pub fn make_role_diff(&self, left: RoleRef, right: RoleRef) -> RoleRef {
        let children = [self.attrs(left), self.attrs(right)];
        self.compose(RoleNode::Diff(left, right), "r_diff", &children)
    }

    pub fn make_role_inverse(&self, role: RoleRef) -> RoleRef {
        self.compose(RoleNode::Inverse(role), "r_inverse", &[self.attrs(role)])
    }

    pub fn make_role_identity(&self, concept: ConceptRef) -> RoleRef {
        self.compose(RoleNode::Identity(concept), "r_identity", &[self.attrs(concept)])
    }

    pub fn make_role_compose(&self, left: RoleRef, right: RoleRef) -> RoleRef {
        let children = [self.attrs(left), self.attrs(right)];
        self.compose(RoleNode::Compose(left, right), "r_compose", &children)
    }

    pub fn make_role_restrict(&self, role: RoleRef, concept: ConceptRef) -> RoleRef {
        let children = [self.attrs(role), self.attrs(concept)];
        self.compose(RoleNode::Restrict(role, concept), "r_restrict", &children)
    }

    pub fn make_role_transitive_closure(&self, role: RoleRef) -> RoleRef {
        self.compose(RoleNode::TransitiveClosure(role), "r_transitive_closure", &[self.attrs(role)])
    }

    pub fn make_role_transitive_reflexive_closure(&self, role: RoleRef) -> RoleRef {
        self.compose(
            RoleNode::TransitiveReflexiveClosure(role),
            "r_transitive_reflexive_closure",
            &[self.attrs(role)],
        )
    }

    // ─── Numericals ───

    pub fn make_numerical_count_concept(&self, concept: ConceptRef) -> NumericalRef {
        self.compose(NumericalNode::CountConcept(concept), "n_count", &[self.attrs(concept)])
    }

    pub fn make_numerical_count_role(&self, role: RoleRef) -> NumericalRef {
        self.compose(NumericalNode::CountRole(role), "n_count", &[self.attrs(role)])
    }

    pub fn make_numerical_concept_distance(&self, from: ConceptRef, role: RoleRef, to: ConceptRef) -> NumericalRef {
        let children = [self.attrs(from), self.attrs(role), self.attrs(to)];
        self.compose(NumericalNode::ConceptDistance(from, role, to), "n_concept_distance", &children)
    }

    pub fn make_numerical_sum_concept_distance(&self, from: ConceptRef, role: RoleRef, to: ConceptRef) -> NumericalRef {
        let children = [self.attrs(from), self.attrs(role), self.attrs(to)];
        self.compose(
            NumericalNode::SumConceptDistance(from, role, to),
            "n_sum_concept_distance",
            &children,
        )
    }

    pub fn make_numerical_role_distance(&self, from: RoleRef, role: RoleRef, to: RoleRef) -> NumericalRef {
        let children = [self.attrs(from), self.attrs(role), self.attrs(to)];
        self.compose(NumericalNode::RoleDistance(from, role, to), "n_role_distance", &children)
    }

    pub fn make_numerical_sum_role_distance(&self, from: RoleRef, role: RoleRef, to: RoleRef) -> NumericalRef {
        let children = [self.attrs(from), self.attrs(role), self.attrs(to)];
        self.compose(NumericalNode::SumRoleDistance(from, role, to), "n_sum_role_distance", &children)
    }

    // ─── Booleans ───

    pub fn make_boolean_empty_concept(&self, concept: ConceptRef) -> BooleanRef {
        self.compose(BooleanNode::EmptyConcept(concept), "b_empty", &[self.attrs(concept)])
    }

    pub fn make_boolean_empty_role(&self, role: RoleRef) -> BooleanRef {
        self.compose(BooleanNode::EmptyRole(role), "b_empty", &[self.attrs(role)])
    }

    /// True iff the 0-ary `predicate` holds. Fails unless the predicate has arity 0.
    pub fn make_boolean_nullary(&self, predicate: &str) -> Result<BooleanRef> {
        let p = self.nullary_predicate(predicate)?;
        Ok(self.boolean_nullary(p))
    }

    /// Resolves `predicate`, checking that it has arity 0.
    pub(crate) fn nullary_predicate(&self, predicate: &str) -> Result<&Predicate> {
        let p = self.vocabulary.predicate_by_name(predicate)?;
        if p.arity() != 0 {
            return Err(Error::ArityMismatch {
                predicate: p.name().to_string(),
                arity: p.arity(),
                requested: 0,
            });
        }
        Ok(p)
    }

    pub(crate) fn boolean_nullary(&self, predicate: &Predicate) -> BooleanRef {
        assert_eq!(predicate.arity(), 0, "Predicate {} is not nullary", predicate);
        let repr = format!("b_nullary({})", predicate.name());
        self.intern(BooleanNode::Nullary { predicate: predicate.index() }, repr, 1)
    }
}

impl Debug for ElementFactory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementFactory")
            .field("predicates", &self.vocabulary.len())
            .field("concepts", &self.concepts.len())
            .field("roles", &self.roles.len())
            .field("numericals", &self.numericals.len())
            .field("booleans", &self.booleans.len())
            .finish()
    }
}
