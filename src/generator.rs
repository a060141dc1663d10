//! Complexity-bounded feature generation.
//!
//! The [`Generator`] enumerates elements in iterations of increasing
//! complexity. Iteration 1 seeds the primitives of the vocabulary. Every
//! later iteration `i` runs the enabled [rules][Rule] as independent tasks on
//! a worker pool; each task reads only elements retained in iterations
//! below `i` and writes to its own bucket. Collecting the buckets is the
//! barrier between iterations.
//!
//! After the barrier, buckets are merged in catalogue order. A candidate is
//! dropped if it was already seen, or if its denotations on the sample
//! states equal those of an element retained earlier (which is never more
//! complex). The merge is sequential, so the result does not depend on
//! the number of threads.
//!
//! Time and element budgets are checked between iterations. Running out of
//! budget ends the search normally with whatever was retained so far.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::DenotationCache;
use crate::element::{Element, ElementRef};
use crate::factory::ElementFactory;
use crate::reference::{BooleanRef, ConceptRef, NumericalRef, RoleRef};
use crate::rules::{Layers, Rule};
use crate::state::State;

/// Generator settings.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Largest complexity to generate.
    pub max_complexity: usize,
    /// Stop before starting an iteration once this much time has passed.
    pub time_limit: Option<Duration>,
    /// Stop before starting an iteration once this many elements are retained.
    pub max_elements: Option<usize>,
    /// Worker threads; 0 means the rayon default.
    pub num_threads: usize,
    /// Enabled production rules.
    pub rules: Vec<Rule>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_complexity: 4,
            time_limit: None,
            max_elements: None,
            num_threads: 0,
            rules: Rule::ALL.to_vec(),
        }
    }
}

/// Why the generator stopped.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Termination {
    /// All iterations up to `max_complexity` ran.
    Completed,
    /// The time limit was reached.
    TimeLimit,
    /// The element limit was reached.
    ElementLimit,
}

/// Counters of one iteration.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct IterationStats {
    pub complexity: usize,
    pub candidates: usize,
    pub retained: usize,
    pub pruned: usize,
    pub elapsed: Duration,
}

/// Elements retained by a generator run, in generation order.
#[derive(Debug, Clone)]
pub struct GeneratedFeatures {
    pub concepts: Vec<ConceptRef>,
    pub roles: Vec<RoleRef>,
    pub numericals: Vec<NumericalRef>,
    pub booleans: Vec<BooleanRef>,
    pub termination: Termination,
    pub iterations: Vec<IterationStats>,
}

impl GeneratedFeatures {
    /// Total number of retained elements.
    pub fn len(&self) -> usize {
        self.concepts.len() + self.roles.len() + self.numericals.len() + self.booleans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of iterations that ran to completion.
    pub fn completed_iterations(&self) -> usize {
        self.iterations.len()
    }

    /// All retained elements, family by family.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef> + '_ {
        let concepts = self.concepts.iter().map(|&c| ElementRef::from(c));
        let roles = self.roles.iter().map(|&r| ElementRef::from(r));
        let numericals = self.numericals.iter().map(|&n| ElementRef::from(n));
        let booleans = self.booleans.iter().map(|&b| ElementRef::from(b));
        concepts.chain(roles).chain(numericals).chain(booleans)
    }

    /// Reprs of the boolean and numerical features.
    pub fn feature_reprs(&self, factory: &ElementFactory) -> Vec<Arc<str>> {
        let booleans = self.booleans.iter().map(|&b| factory.repr(b));
        let numericals = self.numericals.iter().map(|&n| factory.repr(n));
        booleans.chain(numericals).collect()
    }
}

/// Retained elements of one family.
struct Retained<E: Element> {
    elements: Vec<E>,
    seen: FxHashSet<E>,
    denotations: FxHashMap<Arc<[E::Denotation]>, E>,
}

impl<E: Element> Default for Retained<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            seen: FxHashSet::default(),
            denotations: FxHashMap::default(),
        }
    }
}

impl<E: Element> Retained<E> {
    /// Offers a candidate; returns true if it is kept.
    fn offer(&mut self, factory: &ElementFactory, cache: &DenotationCache, element: E, sample: &[State]) -> bool {
        if !self.seen.insert(element) {
            return false;
        }
        if !sample.is_empty() {
            let denotations = cache.evaluate(factory, element, sample);
            if let Some(&existing) = self.denotations.get(&denotations) {
                trace!(
                    "prune {}: same denotations as {}",
                    factory.repr(element),
                    factory.repr(existing)
                );
                return false;
            }
            self.denotations.insert(denotations, element);
        }
        self.elements.push(element);
        true
    }
}

/// Search state shared across iterations.
#[derive(Default)]
struct Search {
    layers: Layers,
    concepts: Retained<ConceptRef>,
    roles: Retained<RoleRef>,
    numericals: Retained<NumericalRef>,
    booleans: Retained<BooleanRef>,
}

impl Search {
    fn len(&self) -> usize {
        self.concepts.elements.len()
            + self.roles.elements.len()
            + self.numericals.elements.len()
            + self.booleans.elements.len()
    }

    fn offer(
        &mut self,
        factory: &ElementFactory,
        cache: &DenotationCache,
        element: ElementRef,
        complexity: usize,
        sample: &[State],
    ) -> bool {
        match element {
            ElementRef::Concept(c) => {
                let kept = self.concepts.offer(factory, cache, c, sample);
                if kept {
                    self.layers.push_concept(complexity, c);
                }
                kept
            }
            ElementRef::Role(r) => {
                let kept = self.roles.offer(factory, cache, r, sample);
                if kept {
                    self.layers.push_role(complexity, r);
                }
                kept
            }
            ElementRef::Numerical(n) => self.numericals.offer(factory, cache, n, sample),
            ElementRef::Boolean(b) => self.booleans.offer(factory, cache, b, sample),
        }
    }
}

/// Candidates produced by one task.
struct Bucket {
    rule: Option<Rule>,
    candidates: Vec<ElementRef>,
}

pub struct Generator<'a> {
    factory: &'a ElementFactory,
    cache: &'a DenotationCache,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(factory: &'a ElementFactory, cache: &'a DenotationCache, config: GeneratorConfig) -> Self {
        Self { factory, cache, config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn build_pool(&self) -> Option<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("dl-generator-{}", i));
        if self.config.num_threads > 0 {
            builder = builder.num_threads(self.config.num_threads);
        }
        match builder.build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!("could not build a thread pool, using the global one: {}", e);
                None
            }
        }
    }

    /// Generates elements up to the configured complexity, pruning those
    /// that are indistinguishable on `sample`.
    ///
    /// An empty sample disables semantic pruning; only repeated elements are
    /// dropped then.
    pub fn generate(&self, sample: &[State]) -> GeneratedFeatures {
        let start = Instant::now();
        let pool = self.build_pool();
        let mut search = Search::default();
        let mut iterations = Vec::new();
        let mut termination = Termination::Completed;

        info!(
            "generate: max complexity {}, {} rules, {} sample states",
            self.config.max_complexity,
            self.config.rules.len(),
            sample.len()
        );

        for complexity in 1..=self.config.max_complexity {
            if complexity > 1 {
                if let Some(t) = self.budget_exhausted(start, search.len()) {
                    termination = t;
                    break;
                }
            }

            let iteration_start = Instant::now();
            let buckets = if complexity == 1 {
                vec![self.seed()]
            } else {
                let run = || self.expand(&search.layers, complexity, sample);
                match &pool {
                    Some(pool) => pool.install(run),
                    None => run(),
                }
            };

            let mut stats = IterationStats {
                complexity,
                ..Default::default()
            };
            for bucket in buckets {
                stats.candidates += bucket.candidates.len();
                let before = stats.retained;
                for element in bucket.candidates {
                    if search.offer(self.factory, self.cache, element, complexity, sample) {
                        stats.retained += 1;
                    } else {
                        stats.pruned += 1;
                    }
                }
                if let Some(rule) = bucket.rule {
                    debug!("rule {} retained {}", rule, stats.retained - before);
                }
            }
            stats.elapsed = iteration_start.elapsed();

            info!(
                "iteration {}: {} candidates, {} retained, {} pruned in {:?}",
                complexity, stats.candidates, stats.retained, stats.pruned, stats.elapsed
            );
            iterations.push(stats);
        }

        info!(
            "generate: {:?} after {} iterations with {} elements in {:?}",
            termination,
            iterations.len(),
            search.len(),
            start.elapsed()
        );

        GeneratedFeatures {
            concepts: search.concepts.elements,
            roles: search.roles.elements,
            numericals: search.numericals.elements,
            booleans: search.booleans.elements,
            termination,
            iterations,
        }
    }

    fn budget_exhausted(&self, start: Instant, retained: usize) -> Option<Termination> {
        if let Some(limit) = self.config.time_limit {
            if start.elapsed() >= limit {
                return Some(Termination::TimeLimit);
            }
        }
        if let Some(limit) = self.config.max_elements {
            if retained >= limit {
                return Some(Termination::ElementLimit);
            }
        }
        None
    }

    /// Complexity-1 elements: primitives of every predicate, the constants
    /// of the vocabulary and the top/bottom elements.
    fn seed(&self) -> Bucket {
        let f = self.factory;
        let vocabulary = f.vocabulary();
        let mut candidates: Vec<ElementRef> = Vec::new();
        for p in vocabulary.predicates() {
            if p.arity() == 0 {
                candidates.push(f.boolean_nullary(p).into());
            }
            for pos in 0..p.arity() {
                candidates.push(f.concept_primitive(p, pos).into());
            }
            for pos1 in 0..p.arity() {
                for pos2 in 0..p.arity() {
                    if pos1 != pos2 {
                        candidates.push(f.role_primitive(p, pos1, pos2).into());
                    }
                }
            }
        }
        for constant in vocabulary.constants() {
            candidates.push(f.make_concept_one_of(constant).into());
        }
        candidates.push(f.make_concept_top().into());
        candidates.push(f.make_concept_bot().into());
        candidates.push(f.make_role_top().into());
        Bucket { rule: None, candidates }
    }

    /// Runs every enabled rule as a parallel task.
    fn expand(&self, layers: &Layers, complexity: usize, sample: &[State]) -> Vec<Bucket> {
        self.config
            .rules
            .par_iter()
            .map(|&rule| {
                let candidates = rule.apply(self.factory, layers, complexity);
                debug!("rule {} produced {} candidates", rule, candidates.len());
                self.warm(&candidates, sample);
                Bucket {
                    rule: Some(rule),
                    candidates,
                }
            })
            .collect()
    }

    /// Evaluates candidates on the sample so the merge only reads the cache.
    fn warm(&self, candidates: &[ElementRef], sample: &[State]) {
        if sample.is_empty() {
            return;
        }
        let (f, cache) = (self.factory, self.cache);
        for &element in candidates {
            match element {
                ElementRef::Concept(c) => {
                    cache.evaluate(f, c, sample);
                }
                ElementRef::Role(r) => {
                    cache.evaluate(f, r, sample);
                }
                ElementRef::Numerical(n) => {
                    cache.evaluate(f, n, sample);
                }
                ElementRef::Boolean(b) => {
                    cache.evaluate(f, b, sample);
                }
            }
        }
    }
}
