//! Element operator nodes.
//!
//! Each family is a tagged union of operators whose children are handles
//! into the owning [`ElementFactory`]. Nodes are immutable once interned and
//! form an acyclic, shared DAG.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::cache::{DenotationCache, Memo};
use crate::denotation::{ConceptDenotation, RoleDenotation};
use crate::factory::ElementFactory;
use crate::reference::{BooleanRef, ConceptRef, ElementKind, NumericalRef, RoleRef};
use crate::state::State;
use crate::table::Table;

/// Concept operators (denote sets of objects).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ConceptNode {
    Top,
    Bot,
    Primitive { predicate: usize, pos: usize },
    And(ConceptRef, ConceptRef),
    Or(ConceptRef, ConceptRef),
    Not(ConceptRef),
    Diff(ConceptRef, ConceptRef),
    Some(RoleRef, ConceptRef),
    All(RoleRef, ConceptRef),
    Subset(RoleRef, RoleRef),
    OneOf(Arc<str>),
}

/// Role operators (denote sets of object pairs).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum RoleNode {
    Top,
    Primitive { predicate: usize, pos1: usize, pos2: usize },
    And(RoleRef, RoleRef),
    Or(RoleRef, RoleRef),
    Not(RoleRef),
    Diff(RoleRef, RoleRef),
    Inverse(RoleRef),
    Identity(ConceptRef),
    Compose(RoleRef, RoleRef),
    Restrict(RoleRef, ConceptRef),
    TransitiveClosure(RoleRef),
    TransitiveReflexiveClosure(RoleRef),
}

/// Numerical operators (denote integers).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum NumericalNode {
    CountConcept(ConceptRef),
    CountRole(RoleRef),
    ConceptDistance(ConceptRef, RoleRef, ConceptRef),
    SumConceptDistance(ConceptRef, RoleRef, ConceptRef),
    RoleDistance(RoleRef, RoleRef, RoleRef),
    SumRoleDistance(RoleRef, RoleRef, RoleRef),
}

/// Boolean operators.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BooleanNode {
    EmptyConcept(ConceptRef),
    EmptyRole(RoleRef),
    Nullary { predicate: usize },
}

/// A handle to an element of any family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ElementRef {
    Concept(ConceptRef),
    Role(RoleRef),
    Numerical(NumericalRef),
    Boolean(BooleanRef),
}

impl ElementRef {
    pub fn kind(self) -> ElementKind {
        match self {
            ElementRef::Concept(_) => ElementKind::Concept,
            ElementRef::Role(_) => ElementKind::Role,
            ElementRef::Numerical(_) => ElementKind::Numerical,
            ElementRef::Boolean(_) => ElementKind::Boolean,
        }
    }
}

impl From<ConceptRef> for ElementRef {
    fn from(c: ConceptRef) -> Self {
        ElementRef::Concept(c)
    }
}

impl From<RoleRef> for ElementRef {
    fn from(r: RoleRef) -> Self {
        ElementRef::Role(r)
    }
}

impl From<NumericalRef> for ElementRef {
    fn from(n: NumericalRef) -> Self {
        ElementRef::Numerical(n)
    }
}

impl From<BooleanRef> for ElementRef {
    fn from(b: BooleanRef) -> Self {
        ElementRef::Boolean(b)
    }
}

/// Operator name and child handles of a node.
pub trait Operator {
    fn operator(&self) -> &'static str;
    fn children(&self) -> Vec<ElementRef>;
}

impl Operator for ConceptNode {
    fn operator(&self) -> &'static str {
        match self {
            ConceptNode::Top => "c_top",
            ConceptNode::Bot => "c_bot",
            ConceptNode::Primitive { .. } => "c_primitive",
            ConceptNode::And(..) => "c_and",
            ConceptNode::Or(..) => "c_or",
            ConceptNode::Not(_) => "c_not",
            ConceptNode::Diff(..) => "c_diff",
            ConceptNode::Some(..) => "c_some",
            ConceptNode::All(..) => "c_all",
            ConceptNode::Subset(..) => "c_subset",
            ConceptNode::OneOf(_) => "c_one_of",
        }
    }

    fn children(&self) -> Vec<ElementRef> {
        match *self {
            ConceptNode::Top | ConceptNode::Bot | ConceptNode::Primitive { .. } | ConceptNode::OneOf(_) => vec![],
            ConceptNode::Not(c) => vec![c.into()],
            ConceptNode::And(a, b) | ConceptNode::Or(a, b) | ConceptNode::Diff(a, b) => vec![a.into(), b.into()],
            ConceptNode::Some(r, c) | ConceptNode::All(r, c) => vec![r.into(), c.into()],
            ConceptNode::Subset(r, s) => vec![r.into(), s.into()],
        }
    }
}

impl Operator for RoleNode {
    fn operator(&self) -> &'static str {
        match self {
            RoleNode::Top => "r_top",
            RoleNode::Primitive { .. } => "r_primitive",
            RoleNode::And(..) => "r_and",
            RoleNode::Or(..) => "r_or",
            RoleNode::Not(_) => "r_not",
            RoleNode::Diff(..) => "r_diff",
            RoleNode::Inverse(_) => "r_inverse",
            RoleNode::Identity(_) => "r_identity",
            RoleNode::Compose(..) => "r_compose",
            RoleNode::Restrict(..) => "r_restrict",
            RoleNode::TransitiveClosure(_) => "r_transitive_closure",
            RoleNode::TransitiveReflexiveClosure(_) => "r_transitive_reflexive_closure",
        }
    }

    fn children(&self) -> Vec<ElementRef> {
        match *self {
            RoleNode::Top | RoleNode::Primitive { .. } => vec![],
            RoleNode::Not(r)
            | RoleNode::Inverse(r)
            | RoleNode::TransitiveClosure(r)
            | RoleNode::TransitiveReflexiveClosure(r) => vec![r.into()],
            RoleNode::Identity(c) => vec![c.into()],
            RoleNode::And(a, b) | RoleNode::Or(a, b) | RoleNode::Diff(a, b) | RoleNode::Compose(a, b) => {
                vec![a.into(), b.into()]
            }
            RoleNode::Restrict(r, c) => vec![r.into(), c.into()],
        }
    }
}

impl Operator for NumericalNode {
    fn operator(&self) -> &'static str {
        match self {
            NumericalNode::CountConcept(_) | NumericalNode::CountRole(_) => "n_count",
            NumericalNode::ConceptDistance(..) => "n_concept_distance",
            NumericalNode::SumConceptDistance(..) => "n_sum_concept_distance",
            NumericalNode::RoleDistance(..) => "n_role_distance",
            NumericalNode::SumRoleDistance(..) => "n_sum_role_distance",
        }
    }

    fn children(&self) -> Vec<ElementRef> {
        match *self {
            NumericalNode::CountConcept(c) => vec![c.into()],
            NumericalNode::CountRole(r) => vec![r.into()],
            NumericalNode::ConceptDistance(f, r, t) | NumericalNode::SumConceptDistance(f, r, t) => {
                vec![f.into(), r.into(), t.into()]
            }
            NumericalNode::RoleDistance(f, r, t) | NumericalNode::SumRoleDistance(f, r, t) => {
                vec![f.into(), r.into(), t.into()]
            }
        }
    }
}

impl Operator for BooleanNode {
    fn operator(&self) -> &'static str {
        match self {
            BooleanNode::EmptyConcept(_) | BooleanNode::EmptyRole(_) => "b_empty",
            BooleanNode::Nullary { .. } => "b_nullary",
        }
    }

    fn children(&self) -> Vec<ElementRef> {
        match *self {
            BooleanNode::EmptyConcept(c) => vec![c.into()],
            BooleanNode::EmptyRole(r) => vec![r.into()],
            BooleanNode::Nullary { .. } => vec![],
        }
    }
}

/// Common interface of the four element families.
///
/// Implemented by the handle types. Attribute lookups and evaluation go
/// through the factory that interned the element.
pub trait Element: Copy + Eq + Ord + Hash + Debug + Send + Sync + Into<ElementRef> + 'static {
    type Node: Operator + Clone + Debug + Send + Sync;
    type Denotation: Clone + Eq + Hash + Debug + Send + Sync;

    const KIND: ElementKind;

    fn from_raw(index: u32) -> Self;
    fn to_raw(self) -> u32;

    /// Interning table of this family.
    fn table(factory: &ElementFactory) -> &Table<Self::Node>;

    /// Memo table of this family.
    fn memo(cache: &DenotationCache) -> &Memo<Self::Denotation>;

    /// Evaluates a node of this family on one state.
    fn evaluate_node(node: &Self::Node, factory: &ElementFactory, state: &State) -> Self::Denotation;

    /// Evaluates a node of this family on a batch of states, reading
    /// children through the cache under the batch identity `batch`.
    fn evaluate_node_batch(
        node: &Self::Node,
        factory: &ElementFactory,
        states: &[State],
        batch: u32,
        cache: &DenotationCache,
    ) -> Vec<Self::Denotation>;

    fn complexity(self, factory: &ElementFactory) -> usize {
        factory.complexity(self)
    }

    fn repr(self, factory: &ElementFactory) -> Arc<str> {
        factory.repr(self)
    }

    fn evaluate(self, factory: &ElementFactory, state: &State) -> Self::Denotation {
        factory.evaluate(self, state)
    }

    fn evaluate_batch(self, factory: &ElementFactory, states: &[State], cache: &DenotationCache) -> Arc<[Self::Denotation]> {
        cache.evaluate(factory, self, states)
    }
}

macro_rules! impl_element {
    ($handle:ty, $node:ty, $denotation:ty, $table:ident, $memo:ident, $eval:path, $batch:path) => {
        impl Element for $handle {
            type Node = $node;
            type Denotation = $denotation;

            const KIND: ElementKind = <$handle>::KIND;

            fn from_raw(index: u32) -> Self {
                <$handle>::new(index)
            }

            fn to_raw(self) -> u32 {
                self.raw()
            }

            fn table(factory: &ElementFactory) -> &Table<Self::Node> {
                &factory.$table
            }

            fn memo(cache: &DenotationCache) -> &Memo<Self::Denotation> {
                &cache.$memo
            }

            fn evaluate_node(node: &Self::Node, factory: &ElementFactory, state: &State) -> Self::Denotation {
                $eval(node, factory, state)
            }

            fn evaluate_node_batch(
                node: &Self::Node,
                factory: &ElementFactory,
                states: &[State],
                batch: u32,
                cache: &DenotationCache,
            ) -> Vec<Self::Denotation> {
                $batch(node, factory, states, batch, cache)
            }
        }
    };
}

impl_element!(
    ConceptRef,
    ConceptNode,
    ConceptDenotation,
    concepts,
    concepts,
    crate::eval::concept,
    crate::cache::concept_batch
);
impl_element!(
    RoleRef,
    RoleNode,
    RoleDenotation,
    roles,
    roles,
    crate::eval::role,
    crate::cache::role_batch
);
impl_element!(
    NumericalRef,
    NumericalNode,
    i32,
    numericals,
    numericals,
    crate::eval::numerical,
    crate::cache::numerical_batch
);
impl_element!(
    BooleanRef,
    BooleanNode,
    bool,
    booleans,
    booleans,
    crate::eval::boolean,
    crate::cache::boolean_batch
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names() {
        let c = ConceptRef::new(0);
        let r = RoleRef::new(1);
        assert_eq!(ConceptNode::Some(r, c).operator(), "c_some");
        assert_eq!(RoleNode::TransitiveReflexiveClosure(r).operator(), "r_transitive_reflexive_closure");
        assert_eq!(NumericalNode::CountRole(r).operator(), "n_count");
        assert_eq!(BooleanNode::EmptyConcept(c).operator(), "b_empty");
    }

    #[test]
    fn test_children() {
        let c = ConceptRef::new(0);
        let d = ConceptRef::new(2);
        let r = RoleRef::new(1);
        assert!(ConceptNode::Top.children().is_empty());
        assert_eq!(ConceptNode::All(r, c).children(), vec![ElementRef::Role(r), ElementRef::Concept(c)]);
        assert_eq!(RoleNode::Restrict(r, d).children(), vec![ElementRef::Role(r), ElementRef::Concept(d)]);
        assert_eq!(
            NumericalNode::ConceptDistance(c, r, d).children(),
            vec![ElementRef::Concept(c), ElementRef::Role(r), ElementRef::Concept(d)]
        );
        assert_eq!(ElementRef::from(r).kind(), ElementKind::Role);
    }

    fn summary<E: Element>(
        element: E,
        factory: &ElementFactory,
        states: &[State],
        cache: &DenotationCache,
    ) -> (usize, String, Vec<E::Denotation>, Arc<[E::Denotation]>) {
        let single = states.iter().map(|s| element.evaluate(factory, s)).collect();
        (
            element.complexity(factory),
            element.repr(factory).to_string(),
            single,
            element.evaluate_batch(factory, states, cache),
        )
    }

    #[test]
    fn test_trait_methods() {
        use crate::instance::InstanceInfo;
        use crate::vocabulary::VocabularyInfo;

        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        let v = Arc::new(v);
        let mut i = InstanceInfo::new(v.clone());
        i.add_atom("on", &["a", "b"]).unwrap();
        i.add_atom("clear", &["a"]).unwrap();
        i.add_atom("clear", &["b"]).unwrap();
        let i = Arc::new(i);
        let states = vec![
            State::from_atom_names(i.clone(), ["on(a,b)", "clear(b)"], 0).unwrap(),
            State::from_atom_names(i, ["clear(a)", "clear(b)"], 1).unwrap(),
        ];
        let f = ElementFactory::new(v);
        let cache = DenotationCache::new();

        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let blocked = f.make_concept_some(f.make_role_inverse(on), f.make_concept_top());
        let count = f.make_numerical_count_concept(f.make_concept_and(clear, blocked));
        let empty = f.make_boolean_empty_role(on);

        let (complexity, repr, single, batch) = summary(count, &f, &states, &cache);
        assert_eq!(complexity, 7);
        assert_eq!(repr, "n_count(c_and(c_primitive(clear,0),c_some(r_inverse(r_primitive(on,0,1)),c_top)))");
        assert_eq!(single, vec![1, 0]);
        assert_eq!(&*batch, &single[..]);

        let (complexity, repr, single, batch) = summary(empty, &f, &states, &cache);
        assert_eq!(complexity, 2);
        assert_eq!(repr, "b_empty(r_primitive(on,0,1))");
        assert_eq!(single, vec![false, true]);
        assert_eq!(&*batch, &single[..]);

        let (_, repr, single, batch) = summary(blocked, &f, &states, &cache);
        assert_eq!(repr, "c_some(r_inverse(r_primitive(on,0,1)),c_top)");
        assert_eq!(single.iter().map(|d| d.len()).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(&*batch, &single[..]);
    }
}
