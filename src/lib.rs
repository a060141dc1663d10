//! # dl-features: Description-logic features over planning states
//!
//! **`dl-features`** is a manager-centric library for building, evaluating and synthesizing
//! **description-logic features** of planning states. It is designed for learning generalized
//! policies and heuristics, where a fixed set of state features must be computed on many states.
//!
//! ## What is a feature?
//!
//! A planning state is a set of ground atoms over a vocabulary of predicates. Description logic
//! builds, from the predicates, **concepts** (sets of objects) and **roles** (binary relations
//! over objects), combined with operators such as intersection, existential restriction or
//! transitive closure. **Numerical** features count or measure concepts and roles, and
//! **boolean** features test them for emptiness.
//!
//! ## Key Features
//!
//! - **Manager-Centric Architecture**: All elements are built through the
//!   [`ElementFactory`][crate::factory::ElementFactory]. It hash-conses by canonical repr, so
//!   syntactically equal elements share a single handle.
//! - **Lightweight Handles**: [`ConceptRef`][crate::reference::ConceptRef] and friends are
//!   `Copy` indices into the factory's tables.
//! - **Compute Once**: The [`DenotationCache`][crate::cache::DenotationCache] evaluates each
//!   (element, state batch) pair at most once, even under concurrent requests.
//! - **Bounded Synthesis**: The [`Generator`][crate::generator::Generator] enumerates all
//!   elements up to a complexity bound in parallel and prunes those that are indistinguishable
//!   on a sample of states.
//!
//! ## Basic Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dl_features::cache::DenotationCache;
//! use dl_features::factory::ElementFactory;
//! use dl_features::instance::InstanceInfo;
//! use dl_features::state::State;
//! use dl_features::vocabulary::VocabularyInfo;
//!
//! // 1. Describe the domain
//! let mut vocabulary = VocabularyInfo::new();
//! vocabulary.add_predicate("on", 2).unwrap();
//! vocabulary.add_predicate("clear", 1).unwrap();
//! let vocabulary = Arc::new(vocabulary);
//!
//! // 2. Describe one problem and a state of it
//! let mut instance = InstanceInfo::new(vocabulary.clone());
//! instance.add_atom("on", &["a", "b"]).unwrap();
//! instance.add_atom("clear", &["a"]).unwrap();
//! let instance = Arc::new(instance);
//! let state = State::from_atom_names(instance, ["on(a,b)", "clear(a)"], 0).unwrap();
//!
//! // 3. Build a feature: the number of clear blocks that are on some block
//! let factory = ElementFactory::new(vocabulary);
//! let n = factory
//!     .parse_numerical("n_count(c_and(c_primitive(clear,0),c_some(r_primitive(on,0,1),c_top)))")
//!     .unwrap();
//!
//! // 4. Evaluate it, through the cache
//! let cache = DenotationCache::new();
//! let values = cache.evaluate(&factory, n, &[state]);
//! assert_eq!(&*values, &[1]);
//! ```
//!
//! ## Core Components
//!
//! - **[`factory`]**: The [`ElementFactory`][crate::factory::ElementFactory], with builders for all
//!   four families, and the textual grammar in [`parser`].
//! - **[`cache`]**: Batched, memoized evaluation.
//! - **[`generator`]**: Complexity-bounded, parallel feature synthesis.
//! - **[`dot`]**: Utilities for visualizing element DAGs using Graphviz.

pub mod bitset;
pub mod cache;
pub mod denotation;
pub mod distance;
pub mod dot;
pub mod element;
pub mod error;
mod eval;
pub mod factory;
pub mod generator;
pub mod instance;
pub mod parser;
pub mod reference;
pub mod rules;
pub mod state;
pub mod table;
pub mod vocabulary;
