//! Single-state evaluation of element nodes.
//!
//! Evaluation is pure and infallible: children are evaluated recursively
//! through the factory, and nothing is memoized. Batch evaluation with
//! memoization lives in [`cache`][crate::cache].

use crate::denotation::{ConceptDenotation, RoleDenotation};
use crate::distance;
use crate::element::{BooleanNode, ConceptNode, NumericalNode, RoleNode};
use crate::factory::ElementFactory;
use crate::state::State;

pub(crate) fn concept(node: &ConceptNode, factory: &ElementFactory, state: &State) -> ConceptDenotation {
    let n = state.instance().num_objects();
    match *node {
        ConceptNode::Top => ConceptDenotation::full(n),
        ConceptNode::Bot => ConceptDenotation::new(n),
        ConceptNode::Primitive { predicate, pos } => concept_primitive(state, predicate, pos),
        ConceptNode::OneOf(ref name) => one_of(state, name),
        ConceptNode::And(a, b) => factory.evaluate(a, state).intersection(&factory.evaluate(b, state)),
        ConceptNode::Or(a, b) => factory.evaluate(a, state).union(&factory.evaluate(b, state)),
        ConceptNode::Not(c) => factory.evaluate(c, state).complement(),
        ConceptNode::Diff(a, b) => factory.evaluate(a, state).difference(&factory.evaluate(b, state)),
        ConceptNode::Some(r, c) => ConceptDenotation::some(&factory.evaluate(r, state), &factory.evaluate(c, state)),
        ConceptNode::All(r, c) => ConceptDenotation::all(&factory.evaluate(r, state), &factory.evaluate(c, state)),
        ConceptNode::Subset(r, s) => ConceptDenotation::subset(&factory.evaluate(r, state), &factory.evaluate(s, state)),
    }
}

pub(crate) fn role(node: &RoleNode, factory: &ElementFactory, state: &State) -> RoleDenotation {
    let n = state.instance().num_objects();
    match *node {
        RoleNode::Top => RoleDenotation::full(n),
        RoleNode::Primitive { predicate, pos1, pos2 } => role_primitive(state, predicate, pos1, pos2),
        RoleNode::And(a, b) => factory.evaluate(a, state).intersection(&factory.evaluate(b, state)),
        RoleNode::Or(a, b) => factory.evaluate(a, state).union(&factory.evaluate(b, state)),
        RoleNode::Not(r) => factory.evaluate(r, state).complement(),
        RoleNode::Diff(a, b) => factory.evaluate(a, state).difference(&factory.evaluate(b, state)),
        RoleNode::Inverse(r) => factory.evaluate(r, state).inverse(),
        RoleNode::Identity(c) => RoleDenotation::identity(&factory.evaluate(c, state)),
        RoleNode::Compose(a, b) => factory.evaluate(a, state).compose(&factory.evaluate(b, state)),
        RoleNode::Restrict(r, c) => factory.evaluate(r, state).restrict(&factory.evaluate(c, state)),
        RoleNode::TransitiveClosure(r) => factory.evaluate(r, state).transitive_closure(),
        RoleNode::TransitiveReflexiveClosure(r) => factory.evaluate(r, state).transitive_reflexive_closure(),
    }
}

pub(crate) fn numerical(node: &NumericalNode, factory: &ElementFactory, state: &State) -> i32 {
    match *node {
        NumericalNode::CountConcept(c) => count(factory.evaluate(c, state).len()),
        NumericalNode::CountRole(r) => count(factory.evaluate(r, state).len()),
        NumericalNode::ConceptDistance(f, r, t) => distance::concept_distance(
            &factory.evaluate(f, state),
            &factory.evaluate(r, state),
            &factory.evaluate(t, state),
        ),
        NumericalNode::SumConceptDistance(f, r, t) => distance::sum_concept_distance(
            &factory.evaluate(f, state),
            &factory.evaluate(r, state),
            &factory.evaluate(t, state),
        ),
        NumericalNode::RoleDistance(f, r, t) => distance::role_distance(
            &factory.evaluate(f, state),
            &factory.evaluate(r, state),
            &factory.evaluate(t, state),
        ),
        NumericalNode::SumRoleDistance(f, r, t) => distance::sum_role_distance(
            &factory.evaluate(f, state),
            &factory.evaluate(r, state),
            &factory.evaluate(t, state),
        ),
    }
}

pub(crate) fn boolean(node: &BooleanNode, factory: &ElementFactory, state: &State) -> bool {
    match *node {
        BooleanNode::EmptyConcept(c) => factory.evaluate(c, state).is_empty(),
        BooleanNode::EmptyRole(r) => factory.evaluate(r, state).is_empty(),
        BooleanNode::Nullary { predicate } => state.all_atoms().any(|a| a.predicate() == predicate),
    }
}

pub(crate) fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(distance::INFINITY - 1)
}

pub(crate) fn concept_primitive(state: &State, predicate: usize, pos: usize) -> ConceptDenotation {
    let mut result = ConceptDenotation::new(state.instance().num_objects());
    for atom in state.all_atoms().filter(|a| a.predicate() == predicate) {
        result.insert(atom.objects()[pos]);
    }
    result
}

pub(crate) fn role_primitive(state: &State, predicate: usize, pos1: usize, pos2: usize) -> RoleDenotation {
    let mut result = RoleDenotation::new(state.instance().num_objects());
    for atom in state.all_atoms().filter(|a| a.predicate() == predicate) {
        result.insert(atom.objects()[pos1], atom.objects()[pos2]);
    }
    result
}

pub(crate) fn one_of(state: &State, name: &str) -> ConceptDenotation {
    let instance = state.instance();
    ConceptDenotation::from_objects(instance.num_objects(), instance.object_position(name))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::instance::InstanceInfo;
    use crate::vocabulary::VocabularyInfo;

    use test_log::test;

    // Objects a, b, c in a chain a -> b -> c; `raining` holds statically.
    fn setup() -> (ElementFactory, State) {
        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        v.add_predicate("raining", 0).unwrap();
        v.add_predicate("windy", 0).unwrap();
        let v = Arc::new(v);
        let mut i = InstanceInfo::new(v.clone());
        let on_ab = i.add_atom("on", &["a", "b"]).unwrap();
        let on_bc = i.add_atom("on", &["b", "c"]).unwrap();
        let clear_a = i.add_atom("clear", &["a"]).unwrap();
        i.add_atom("windy", &[]).unwrap();
        i.add_static_atom("raining", &[]).unwrap();
        let state = State::new(Arc::new(i), [on_ab.index(), on_bc.index(), clear_a.index()], 0).unwrap();
        (ElementFactory::new(v), state)
    }

    fn objects(c: &ConceptDenotation) -> Vec<usize> {
        c.iter().collect()
    }

    #[test]
    fn test_primitives() {
        let (f, s) = setup();
        let on0 = f.make_concept_primitive("on", 0).unwrap();
        let on1 = f.make_concept_primitive("on", 1).unwrap();
        assert_eq!(objects(&f.evaluate(on0, &s)), vec![0, 1]);
        assert_eq!(objects(&f.evaluate(on1, &s)), vec![1, 2]);
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        assert_eq!(f.evaluate(on, &s).iter().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_concept_operators() {
        let (f, s) = setup();
        let on0 = f.make_concept_primitive("on", 0).unwrap();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        assert_eq!(objects(&f.evaluate(f.make_concept_not(on0), &s)), vec![2]);
        assert_eq!(objects(&f.evaluate(f.make_concept_diff(on0, clear), &s)), vec![1]);
        let bot = f.make_concept_bot();
        assert!(f.evaluate(bot, &s).is_empty());
        // objects on something that is on something
        let some = f.make_concept_some(on, on0);
        assert_eq!(objects(&f.evaluate(some, &s)), vec![0]);
        // c is on nothing, so it qualifies vacuously
        let all = f.make_concept_all(on, clear);
        assert_eq!(objects(&f.evaluate(all, &s)), vec![2]);
        let subset = f.make_concept_subset(on, f.make_role_top());
        assert_eq!(objects(&f.evaluate(subset, &s)), vec![0, 1, 2]);
    }

    #[test]
    fn test_one_of() {
        let (f, s) = setup();
        assert_eq!(objects(&f.evaluate(f.make_concept_one_of("b"), &s)), vec![1]);
        assert!(f.evaluate(f.make_concept_one_of("z"), &s).is_empty());
    }

    #[test]
    fn test_role_operators() {
        let (f, s) = setup();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let tc = f.make_role_transitive_closure(on);
        assert_eq!(f.evaluate(tc, &s).iter().collect::<Vec<_>>(), vec![(0, 1), (0, 2), (1, 2)]);
        let trc = f.make_role_transitive_reflexive_closure(on);
        assert_eq!(f.evaluate(trc, &s).len(), 6);
        let inv = f.make_role_inverse(on);
        assert_eq!(f.evaluate(inv, &s).iter().collect::<Vec<_>>(), vec![(1, 0), (2, 1)]);
        let compose = f.make_role_compose(on, on);
        assert_eq!(f.evaluate(compose, &s).iter().collect::<Vec<_>>(), vec![(0, 2)]);
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let restrict = f.make_role_restrict(inv, clear);
        assert_eq!(f.evaluate(restrict, &s).iter().collect::<Vec<_>>(), vec![(1, 0)]);
        let id = f.make_role_identity(clear);
        assert_eq!(f.evaluate(id, &s).iter().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn test_numericals() {
        let (f, s) = setup();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let on1 = f.make_concept_primitive("on", 1).unwrap();
        assert_eq!(f.evaluate(f.make_numerical_count_role(on), &s), 2);
        assert_eq!(f.evaluate(f.make_numerical_count_concept(on1), &s), 2);
        let c = f.make_concept_one_of("c");
        let dist = f.make_numerical_concept_distance(clear, on, c);
        assert_eq!(f.evaluate(dist, &s), 2);
        let back = f.make_numerical_concept_distance(c, on, clear);
        assert_eq!(f.evaluate(back, &s), distance::INFINITY);
        let sum = f.make_numerical_sum_concept_distance(f.make_concept_primitive("on", 0).unwrap(), on, c);
        assert_eq!(f.evaluate(sum, &s), 2 + 1);
    }

    #[test]
    fn test_booleans() {
        let (f, s) = setup();
        assert!(f.evaluate(f.make_boolean_nullary("raining").unwrap(), &s));
        assert!(!f.evaluate(f.make_boolean_nullary("windy").unwrap(), &s));
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        assert!(!f.evaluate(f.make_boolean_empty_role(on), &s));
        assert!(f.evaluate(f.make_boolean_empty_concept(f.make_concept_bot()), &s));
    }
}
