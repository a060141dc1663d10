//! Denotation cache for batch evaluation.
//!
//! A [`DenotationCache`] memoizes the denotations of elements over batches
//! of states. Entries are keyed by the element's interned index and the
//! batch identity, and each entry is computed at most once, even when
//! several threads request it at the same time: late arrivals block on the
//! slot until the first computation finishes.
//!
//! A cache is tied to the factory whose handles it was filled with and
//! should be dropped together with it.

use std::fmt::{Display, Formatter};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use log::{debug, trace};
use rustc_hash::FxHasher;

use crate::denotation::{ConceptDenotation, RoleDenotation};
use crate::distance;
use crate::element::{BooleanNode, ConceptNode, Element, NumericalNode, RoleNode};
use crate::eval;
use crate::factory::ElementFactory;
use crate::reference::{ConceptRef, RoleRef};
use crate::state::State;

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

type Slot<T> = Arc<OnceLock<Arc<[T]>>>;

/// Memo table of one element family.
pub struct Memo<T> {
    slots: FxDashMap<(u32, u32), Slot<T>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            slots: DashMap::default(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }
}

impl<T> Memo<T> {
    fn slot(&self, key: (u32, u32)) -> Slot<T> {
        if let Some(slot) = self.slots.get(&key) {
            return slot.clone();
        }
        self.slots.entry(key).or_default().clone()
    }

    fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }
}

/// Counters of one memo table.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct MemoStats {
    /// Requests answered from the table.
    pub hits: usize,
    /// Requests that computed the entry.
    pub misses: usize,
    /// Stored entries.
    pub entries: usize,
}

/// Snapshot of the cache counters.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub batches: usize,
    pub concepts: MemoStats,
    pub roles: MemoStats,
    pub numericals: MemoStats,
    pub booleans: MemoStats,
}

impl CacheStats {
    fn families(&self) -> [&MemoStats; 4] {
        [&self.concepts, &self.roles, &self.numericals, &self.booleans]
    }

    pub fn hits(&self) -> usize {
        self.families().iter().map(|m| m.hits).sum()
    }

    pub fn misses(&self) -> usize {
        self.families().iter().map(|m| m.misses).sum()
    }
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "batches: {}, hits: {}, misses: {} (concepts {}/{}, roles {}/{}, numericals {}/{}, booleans {}/{})",
            self.batches,
            self.hits(),
            self.misses(),
            self.concepts.hits,
            self.concepts.misses,
            self.roles.hits,
            self.roles.misses,
            self.numericals.hits,
            self.numericals.misses,
            self.booleans.hits,
            self.booleans.misses,
        )
    }
}

pub struct DenotationCache {
    batches: FxDashMap<Vec<State>, u32>,
    next_batch: AtomicU32,
    pub(crate) concepts: Memo<ConceptDenotation>,
    pub(crate) roles: Memo<RoleDenotation>,
    pub(crate) numericals: Memo<i32>,
    pub(crate) booleans: Memo<bool>,
}

impl Default for DenotationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DenotationCache {
    pub fn new() -> Self {
        Self {
            batches: DashMap::default(),
            next_batch: AtomicU32::new(0),
            concepts: Memo::default(),
            roles: Memo::default(),
            numericals: Memo::default(),
            booleans: Memo::default(),
        }
    }

    /// Identity of a batch of states. Equal batches share one identity.
    fn batch(&self, states: &[State]) -> u32 {
        if let Some(id) = self.batches.get(states) {
            return *id;
        }
        *self
            .batches
            .entry(states.to_vec())
            .or_insert_with(|| self.next_batch.fetch_add(1, Ordering::Relaxed))
    }

    /// Denotations of `element` on every state of `states`, in order.
    ///
    /// Computes (and stores) the entry on first request, evaluating children
    /// through this cache; later requests return the stored sequence.
    pub fn evaluate<E: Element>(&self, factory: &ElementFactory, element: E, states: &[State]) -> Arc<[E::Denotation]> {
        let batch = self.batch(states);
        self.evaluate_in(factory, element, states, batch)
    }

    /// Same as [`evaluate`](Self::evaluate) for a batch whose identity is
    /// already known.
    pub(crate) fn evaluate_in<E: Element>(
        &self,
        factory: &ElementFactory,
        element: E,
        states: &[State],
        batch: u32,
    ) -> Arc<[E::Denotation]> {
        let memo = E::memo(self);
        let slot = memo.slot((element.to_raw(), batch));
        if let Some(result) = slot.get() {
            memo.hits.fetch_add(1, Ordering::Relaxed);
            return result.clone();
        }
        let mut computed = false;
        let result = slot.get_or_init(|| {
            computed = true;
            debug!("evaluate {} {} on batch {}", E::KIND, element.to_raw(), batch);
            let node = factory.node(element);
            Arc::from(E::evaluate_node_batch(&node, factory, states, batch, self))
        });
        if computed {
            memo.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            trace!("evaluate {} {} on batch {}: computed concurrently", E::KIND, element.to_raw(), batch);
            memo.hits.fetch_add(1, Ordering::Relaxed);
        }
        result.clone()
    }

    /// Stored denotations, without computing anything.
    pub fn get<E: Element>(&self, element: E, states: &[State]) -> Option<Arc<[E::Denotation]>> {
        let batch = *self.batches.get(states)?;
        let slot = E::memo(self).slots.get(&(element.to_raw(), batch))?.clone();
        slot.get().cloned()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            batches: self.batches.len(),
            concepts: self.concepts.stats(),
            roles: self.roles.stats(),
            numericals: self.numericals.stats(),
            booleans: self.booleans.stats(),
        }
    }
}

fn map1<A, T>(a: &[A], f: impl Fn(&A) -> T) -> Vec<T> {
    a.iter().map(f).collect()
}

fn map2<A, B, T>(a: &[A], b: &[B], f: impl Fn(&A, &B) -> T) -> Vec<T> {
    a.iter().zip(b).map(|(x, y)| f(x, y)).collect()
}

fn map3<A, B, C, T>(a: &[A], b: &[B], c: &[C], f: impl Fn(&A, &B, &C) -> T) -> Vec<T> {
    a.iter().zip(b).zip(c).map(|((x, y), z)| f(x, y, z)).collect()
}

pub(crate) fn concept_batch(
    node: &ConceptNode,
    factory: &ElementFactory,
    states: &[State],
    batch: u32,
    cache: &DenotationCache,
) -> Vec<ConceptDenotation> {
    let concepts = |e: ConceptRef| cache.evaluate_in(factory, e, states, batch);
    let roles = |e: RoleRef| cache.evaluate_in(factory, e, states, batch);
    match *node {
        ConceptNode::Top | ConceptNode::Bot | ConceptNode::Primitive { .. } | ConceptNode::OneOf(_) => {
            states.iter().map(|s| eval::concept(node, factory, s)).collect()
        }
        ConceptNode::And(a, b) => map2(&concepts(a), &concepts(b), ConceptDenotation::intersection),
        ConceptNode::Or(a, b) => map2(&concepts(a), &concepts(b), ConceptDenotation::union),
        ConceptNode::Not(c) => map1(&concepts(c), ConceptDenotation::complement),
        ConceptNode::Diff(a, b) => map2(&concepts(a), &concepts(b), ConceptDenotation::difference),
        ConceptNode::Some(r, c) => map2(&roles(r), &concepts(c), ConceptDenotation::some),
        ConceptNode::All(r, c) => map2(&roles(r), &concepts(c), ConceptDenotation::all),
        ConceptNode::Subset(r, s) => map2(&roles(r), &roles(s), ConceptDenotation::subset),
    }
}

pub(crate) fn role_batch(
    node: &RoleNode,
    factory: &ElementFactory,
    states: &[State],
    batch: u32,
    cache: &DenotationCache,
) -> Vec<RoleDenotation> {
    let roles = |e: RoleRef| cache.evaluate_in(factory, e, states, batch);
    match *node {
        RoleNode::Top | RoleNode::Primitive { .. } => states.iter().map(|s| eval::role(node, factory, s)).collect(),
        RoleNode::And(a, b) => map2(&roles(a), &roles(b), RoleDenotation::intersection),
        RoleNode::Or(a, b) => map2(&roles(a), &roles(b), RoleDenotation::union),
        RoleNode::Not(r) => map1(&roles(r), RoleDenotation::complement),
        RoleNode::Diff(a, b) => map2(&roles(a), &roles(b), RoleDenotation::difference),
        RoleNode::Inverse(r) => map1(&roles(r), RoleDenotation::inverse),
        RoleNode::Identity(c) => map1(&cache.evaluate_in(factory, c, states, batch), RoleDenotation::identity),
        RoleNode::Compose(a, b) => map2(&roles(a), &roles(b), RoleDenotation::compose),
        RoleNode::Restrict(r, c) => map2(&roles(r), &cache.evaluate_in(factory, c, states, batch), RoleDenotation::restrict),
        RoleNode::TransitiveClosure(r) => map1(&roles(r), RoleDenotation::transitive_closure),
        RoleNode::TransitiveReflexiveClosure(r) => map1(&roles(r), RoleDenotation::transitive_reflexive_closure),
    }
}

pub(crate) fn numerical_batch(
    node: &NumericalNode,
    factory: &ElementFactory,
    states: &[State],
    batch: u32,
    cache: &DenotationCache,
) -> Vec<i32> {
    let concepts = |e: ConceptRef| cache.evaluate_in(factory, e, states, batch);
    let roles = |e: RoleRef| cache.evaluate_in(factory, e, states, batch);
    match *node {
        NumericalNode::CountConcept(c) => map1(&concepts(c), |d| eval::count(d.len())),
        NumericalNode::CountRole(r) => map1(&roles(r), |d| eval::count(d.len())),
        NumericalNode::ConceptDistance(f, r, t) => {
            map3(&concepts(f), &roles(r), &concepts(t), distance::concept_distance)
        }
        NumericalNode::SumConceptDistance(f, r, t) => {
            map3(&concepts(f), &roles(r), &concepts(t), distance::sum_concept_distance)
        }
        NumericalNode::RoleDistance(f, r, t) => map3(&roles(f), &roles(r), &roles(t), distance::role_distance),
        NumericalNode::SumRoleDistance(f, r, t) => map3(&roles(f), &roles(r), &roles(t), distance::sum_role_distance),
    }
}

pub(crate) fn boolean_batch(
    node: &BooleanNode,
    factory: &ElementFactory,
    states: &[State],
    batch: u32,
    cache: &DenotationCache,
) -> Vec<bool> {
    match *node {
        BooleanNode::EmptyConcept(c) => map1(&cache.evaluate_in(factory, c, states, batch), ConceptDenotation::is_empty),
        BooleanNode::EmptyRole(r) => map1(&cache.evaluate_in(factory, r, states, batch), RoleDenotation::is_empty),
        BooleanNode::Nullary { .. } => states.iter().map(|s| eval::boolean(node, factory, s)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceInfo;
    use crate::vocabulary::VocabularyInfo;

    use test_log::test;

    fn setup() -> (ElementFactory, Vec<State>) {
        let mut v = VocabularyInfo::new();
        v.add_predicate("on", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        let v = Arc::new(v);
        let mut i = InstanceInfo::new(v.clone());
        i.add_atom("on", &["a", "b"]).unwrap();
        i.add_atom("on", &["b", "c"]).unwrap();
        i.add_atom("clear", &["a"]).unwrap();
        i.add_atom("clear", &["c"]).unwrap();
        let i = Arc::new(i);
        let states = vec![
            State::from_atom_names(i.clone(), ["on(a,b)", "clear(a)"], 0).unwrap(),
            State::from_atom_names(i.clone(), ["on(a,b)", "on(b,c)", "clear(a)"], 1).unwrap(),
            State::from_atom_names(i, ["clear(a)", "clear(c)"], 2).unwrap(),
        ];
        (ElementFactory::new(v), states)
    }

    #[test]
    fn test_batch_matches_single_state() {
        let (f, states) = setup();
        let cache = DenotationCache::new();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let tc = f.make_role_transitive_closure(on);
        let some = f.make_concept_some(tc, f.make_concept_not(clear));
        let count = f.make_numerical_count_concept(some);
        let empty = f.make_boolean_empty_role(f.make_role_restrict(tc, clear));

        let batch = cache.evaluate(&f, some, &states);
        for (d, s) in batch.iter().zip(&states) {
            assert_eq!(*d, f.evaluate(some, s));
        }
        let counts = cache.evaluate(&f, count, &states);
        assert_eq!(&*counts, &[1, 2, 0]);
        let empties = cache.evaluate(&f, empty, &states);
        assert_eq!(&*empties, &[true, true, true]);
    }

    #[test]
    fn test_compute_once() {
        let (f, states) = setup();
        let cache = DenotationCache::new();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let not = f.make_concept_not(clear);

        let first = cache.evaluate(&f, not, &states);
        let stats = cache.stats();
        assert_eq!(stats.concepts.misses, 2);
        assert_eq!(stats.concepts.hits, 0);

        let second = cache.evaluate(&f, not, &states);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.concepts.misses, 2);
        assert_eq!(stats.concepts.hits, 1);
        assert_eq!(stats.batches, 1);

        // sharing a child: only the parent is new
        cache.evaluate(&f, f.make_concept_and(clear, not), &states);
        assert_eq!(cache.stats().concepts.misses, 3);
    }

    #[test]
    fn test_children_share_the_batch() {
        let (f, states) = setup();
        let cache = DenotationCache::new();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        let tc = f.make_role_transitive_closure(f.make_role_inverse(on));
        let restrict = f.make_role_restrict(tc, f.make_concept_not(clear));
        let distance = f.make_numerical_role_distance(on, restrict, tc);

        let values = cache.evaluate(&f, distance, &states);
        assert_eq!(values.len(), states.len());
        assert_eq!(cache.stats().batches, 1);
        assert_eq!(cache.stats().roles.misses, 4);
        assert_eq!(cache.stats().concepts.misses, 2);
        for role in [on, tc, restrict] {
            assert_eq!(
                &*cache.get(role, &states).unwrap(),
                &*states.iter().map(|s| f.evaluate(role, s)).collect::<Vec<_>>()
            );
        }
        assert_eq!(
            &*cache.get(distance, &states).unwrap(),
            &*states.iter().map(|s| f.evaluate(distance, s)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_batches_are_distinct() {
        let (f, states) = setup();
        let cache = DenotationCache::new();
        let clear = f.make_concept_primitive("clear", 0).unwrap();
        cache.evaluate(&f, clear, &states);
        cache.evaluate(&f, clear, &states[..1]);
        assert_eq!(cache.stats().batches, 2);
        assert_eq!(cache.stats().concepts.misses, 2);
        assert!(cache.get(clear, &states[1..]).is_none());
        assert_eq!(cache.get(clear, &states[..1]).unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_compute_once() {
        let (f, states) = setup();
        let cache = DenotationCache::new();
        let on = f.make_role_primitive("on", 0, 1).unwrap();
        let c: ConceptRef = f.make_concept_some(f.make_role_transitive_reflexive_closure(on), f.make_concept_top());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| cache.evaluate(&f, c, &states));
            }
        });
        let stats = cache.stats();
        // on, closure, top, some
        assert_eq!(stats.roles.misses, 2);
        assert_eq!(stats.concepts.misses, 2);
        assert_eq!(stats.concepts.hits + stats.concepts.misses, 8 + 1);
    }
}
