//! Production rules of the generator.
//!
//! A rule builds candidates of one operator from already retained concepts
//! and roles. For a target complexity `i`, the operands of a rule have
//! complexities summing to `i - 1`.

use std::fmt::{Display, Formatter};

use crate::element::ElementRef;
use crate::factory::ElementFactory;
use crate::reference::{ConceptRef, ElementKind, RoleRef};

/// The production-rule catalogue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Rule {
    ConceptAnd,
    ConceptOr,
    ConceptNot,
    ConceptDiff,
    ConceptSome,
    ConceptAll,
    ConceptSubset,
    RoleAnd,
    RoleOr,
    RoleNot,
    RoleDiff,
    RoleInverse,
    RoleIdentity,
    RoleCompose,
    RoleRestrict,
    RoleTransitiveClosure,
    RoleTransitiveReflexiveClosure,
    NumericalCountConcept,
    NumericalCountRole,
    NumericalConceptDistance,
    NumericalSumConceptDistance,
    NumericalRoleDistance,
    NumericalSumRoleDistance,
    BooleanEmptyConcept,
    BooleanEmptyRole,
}

impl Rule {
    pub const ALL: [Rule; 25] = [
        Rule::ConceptAnd,
        Rule::ConceptOr,
        Rule::ConceptNot,
        Rule::ConceptDiff,
        Rule::ConceptSome,
        Rule::ConceptAll,
        Rule::ConceptSubset,
        Rule::RoleAnd,
        Rule::RoleOr,
        Rule::RoleNot,
        Rule::RoleDiff,
        Rule::RoleInverse,
        Rule::RoleIdentity,
        Rule::RoleCompose,
        Rule::RoleRestrict,
        Rule::RoleTransitiveClosure,
        Rule::RoleTransitiveReflexiveClosure,
        Rule::NumericalCountConcept,
        Rule::NumericalCountRole,
        Rule::NumericalConceptDistance,
        Rule::NumericalSumConceptDistance,
        Rule::NumericalRoleDistance,
        Rule::NumericalSumRoleDistance,
        Rule::BooleanEmptyConcept,
        Rule::BooleanEmptyRole,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rule::ConceptAnd => "c_and",
            Rule::ConceptOr => "c_or",
            Rule::ConceptNot => "c_not",
            Rule::ConceptDiff => "c_diff",
            Rule::ConceptSome => "c_some",
            Rule::ConceptAll => "c_all",
            Rule::ConceptSubset => "c_subset",
            Rule::RoleAnd => "r_and",
            Rule::RoleOr => "r_or",
            Rule::RoleNot => "r_not",
            Rule::RoleDiff => "r_diff",
            Rule::RoleInverse => "r_inverse",
            Rule::RoleIdentity => "r_identity",
            Rule::RoleCompose => "r_compose",
            Rule::RoleRestrict => "r_restrict",
            Rule::RoleTransitiveClosure => "r_transitive_closure",
            Rule::RoleTransitiveReflexiveClosure => "r_transitive_reflexive_closure",
            Rule::NumericalCountConcept => "n_count_concept",
            Rule::NumericalCountRole => "n_count_role",
            Rule::NumericalConceptDistance => "n_concept_distance",
            Rule::NumericalSumConceptDistance => "n_sum_concept_distance",
            Rule::NumericalRoleDistance => "n_role_distance",
            Rule::NumericalSumRoleDistance => "n_sum_role_distance",
            Rule::BooleanEmptyConcept => "b_empty_concept",
            Rule::BooleanEmptyRole => "b_empty_role",
        }
    }

    /// Looks up a rule by its [name][Rule::name].
    pub fn from_name(name: &str) -> Option<Rule> {
        Rule::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Family of the elements the rule produces.
    pub fn kind(self) -> ElementKind {
        match self.name().as_bytes()[0] {
            b'c' => ElementKind::Concept,
            b'r' => ElementKind::Role,
            b'n' => ElementKind::Numerical,
            _ => ElementKind::Boolean,
        }
    }

    /// Builds every candidate of complexity `complexity` from `layers`.
    pub(crate) fn apply(self, factory: &ElementFactory, layers: &Layers, complexity: usize) -> Vec<ElementRef> {
        let f = factory;
        let c = &layers.concepts;
        let r = &layers.roles;
        let budget = complexity.saturating_sub(1);
        let mut out = Vec::new();
        let o = &mut out;
        match self {
            Rule::ConceptAnd => commutative(c, budget, o, |a, b| f.make_concept_and(a, b)),
            Rule::ConceptOr => commutative(c, budget, o, |a, b| f.make_concept_or(a, b)),
            Rule::ConceptNot => unary(c, budget, o, |a| f.make_concept_not(a)),
            Rule::ConceptDiff => binary(c, c, budget, o, |a, b| f.make_concept_diff(a, b)),
            Rule::ConceptSome => binary(r, c, budget, o, |a, b| f.make_concept_some(a, b)),
            Rule::ConceptAll => binary(r, c, budget, o, |a, b| f.make_concept_all(a, b)),
            Rule::ConceptSubset => binary(r, r, budget, o, |a, b| f.make_concept_subset(a, b)),
            Rule::RoleAnd => commutative(r, budget, o, |a, b| f.make_role_and(a, b)),
            Rule::RoleOr => commutative(r, budget, o, |a, b| f.make_role_or(a, b)),
            Rule::RoleNot => unary(r, budget, o, |a| f.make_role_not(a)),
            Rule::RoleDiff => binary(r, r, budget, o, |a, b| f.make_role_diff(a, b)),
            Rule::RoleInverse => unary(r, budget, o, |a| f.make_role_inverse(a)),
            Rule::RoleIdentity => unary(c, budget, o, |a| f.make_role_identity(a)),
            Rule::RoleCompose => binary(r, r, budget, o, |a, b| f.make_role_compose(a, b)),
            Rule::RoleRestrict => binary(r, c, budget, o, |a, b| f.make_role_restrict(a, b)),
            Rule::RoleTransitiveClosure => unary(r, budget, o, |a| f.make_role_transitive_closure(a)),
            Rule::RoleTransitiveReflexiveClosure => {
                unary(r, budget, o, |a| f.make_role_transitive_reflexive_closure(a))
            }
            Rule::NumericalCountConcept => unary(c, budget, o, |a| f.make_numerical_count_concept(a)),
            Rule::NumericalCountRole => unary(r, budget, o, |a| f.make_numerical_count_role(a)),
            Rule::NumericalConceptDistance => ternary(c, r, c, budget, o, |a, b, d| {
                f.make_numerical_concept_distance(a, b, d)
            }),
            Rule::NumericalSumConceptDistance => ternary(c, r, c, budget, o, |a, b, d| {
                f.make_numerical_sum_concept_distance(a, b, d)
            }),
            Rule::NumericalRoleDistance => ternary(r, r, r, budget, o, |a, b, d| {
                f.make_numerical_role_distance(a, b, d)
            }),
            Rule::NumericalSumRoleDistance => ternary(r, r, r, budget, o, |a, b, d| {
                f.make_numerical_sum_role_distance(a, b, d)
            }),
            Rule::BooleanEmptyConcept => unary(c, budget, o, |a| f.make_boolean_empty_concept(a)),
            Rule::BooleanEmptyRole => unary(r, budget, o, |a| f.make_boolean_empty_role(a)),
        }
        out
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Retained operands, grouped by complexity (index 0 is unused).
#[derive(Debug, Default, Clone)]
pub(crate) struct Layers {
    pub concepts: Vec<Vec<ConceptRef>>,
    pub roles: Vec<Vec<RoleRef>>,
}

impl Layers {
    pub fn push_concept(&mut self, complexity: usize, c: ConceptRef) {
        push(&mut self.concepts, complexity, c);
    }

    pub fn push_role(&mut self, complexity: usize, r: RoleRef) {
        push(&mut self.roles, complexity, r);
    }
}

fn push<T>(layers: &mut Vec<Vec<T>>, complexity: usize, value: T) {
    if layers.len() <= complexity {
        layers.resize_with(complexity + 1, Vec::new);
    }
    layers[complexity].push(value);
}

fn at<T>(layers: &[Vec<T>], complexity: usize) -> &[T] {
    layers.get(complexity).map(Vec::as_slice).unwrap_or(&[])
}

fn unary<A: Copy, T: Into<ElementRef>>(
    a: &[Vec<A>],
    budget: usize,
    out: &mut Vec<ElementRef>,
    make: impl Fn(A) -> T,
) {
    out.extend(at(a, budget).iter().map(|&x| make(x).into()));
}

fn binary<A: Copy, B: Copy, T: Into<ElementRef>>(
    a: &[Vec<A>],
    b: &[Vec<B>],
    budget: usize,
    out: &mut Vec<ElementRef>,
    make: impl Fn(A, B) -> T,
) {
    for j in 1..budget {
        for &x in at(a, j) {
            for &y in at(b, budget - j) {
                out.push(make(x, y).into());
            }
        }
    }
}

/// Like [`binary`], but builds each unordered pair of distinct operands once.
fn commutative<A: Copy, T: Into<ElementRef>>(
    a: &[Vec<A>],
    budget: usize,
    out: &mut Vec<ElementRef>,
    make: impl Fn(A, A) -> T,
) {
    for j in 1..budget {
        let k = budget - j;
        if j > k {
            break;
        }
        let left = at(a, j);
        let right = at(a, k);
        for (p, &x) in left.iter().enumerate() {
            let skip = if j == k { p + 1 } else { 0 };
            for &y in &right[skip.min(right.len())..] {
                out.push(make(x, y).into());
            }
        }
    }
}

fn ternary<A: Copy, B: Copy, C: Copy, T: Into<ElementRef>>(
    a: &[Vec<A>],
    b: &[Vec<B>],
    c: &[Vec<C>],
    budget: usize,
    out: &mut Vec<ElementRef>,
    make: impl Fn(A, B, C) -> T,
) {
    for i in 1..budget {
        for j in 1..budget - i {
            let k = budget - i - j;
            for &x in at(a, i) {
                for &y in at(b, j) {
                    for &z in at(c, k) {
                        out.push(make(x, y, z).into());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::vocabulary::VocabularyInfo;

    fn setup() -> (ElementFactory, Layers) {
        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        v.add_predicate("table", 1).unwrap();
        let f = ElementFactory::new(Arc::new(v));
        let mut layers = Layers::default();
        layers.push_concept(1, f.make_concept_primitive("clear", 0).unwrap());
        layers.push_concept(1, f.make_concept_primitive("table", 0).unwrap());
        layers.push_role(1, f.make_role_primitive("on", 0, 1).unwrap());
        (f, layers)
    }

    #[test]
    fn test_names_roundtrip() {
        for rule in Rule::ALL {
            assert_eq!(Rule::from_name(rule.name()), Some(rule));
        }
        assert_eq!(Rule::from_name("c_top"), None);
        assert_eq!(Rule::NumericalCountRole.kind(), ElementKind::Numerical);
        assert_eq!(Rule::RoleIdentity.kind(), ElementKind::Role);
        assert_eq!(Rule::BooleanEmptyRole.kind(), ElementKind::Boolean);
    }

    #[test]
    fn test_unary_uses_previous_layer() {
        let (f, layers) = setup();
        assert_eq!(Rule::ConceptNot.apply(&f, &layers, 2).len(), 2);
        assert!(Rule::ConceptNot.apply(&f, &layers, 3).is_empty());
        assert_eq!(Rule::RoleInverse.apply(&f, &layers, 2).len(), 1);
    }

    #[test]
    fn test_commutative_pairs_once() {
        let (f, layers) = setup();
        // complexity 3 = 1 + 1 + 1: one unordered pair of distinct concepts
        let out = Rule::ConceptAnd.apply(&f, &layers, 3);
        assert_eq!(out.len(), 1);
        let ElementRef::Concept(c) = out[0] else {
            panic!("expected a concept")
        };
        assert_eq!(&*f.repr(c), "c_and(c_primitive(clear,0),c_primitive(table,0))");
        // ordered operands: both directions
        assert_eq!(Rule::ConceptDiff.apply(&f, &layers, 3).len(), 4);
    }

    #[test]
    fn test_mixed_and_ternary() {
        let (f, layers) = setup();
        assert_eq!(Rule::ConceptSome.apply(&f, &layers, 3).len(), 2);
        assert_eq!(Rule::RoleRestrict.apply(&f, &layers, 3).len(), 2);
        // 2 * 1 * 2 operand triples of complexity 1 each
        let out = Rule::NumericalConceptDistance.apply(&f, &layers, 4);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|e| f.complexity(match *e {
            ElementRef::Numerical(n) => n,
            _ => unreachable!(),
        }) == 4));
        assert!(Rule::NumericalConceptDistance.apply(&f, &layers, 3).is_empty());
    }
}
