//! Validation errors raised while building the relational model or elements.
//!
//! Every error here is raised synchronously at construction or parse time.
//! Evaluation of a validly constructed element never fails.

use thiserror::Error;

use crate::reference::ElementKind;

/// Errors reported by vocabulary/instance/state construction and by the
/// element factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed textual element description.
    #[error("malformed element description at `{fragment}`: {reason}")]
    Grammar { fragment: String, reason: String },

    /// A predicate name that is not part of the vocabulary.
    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),

    /// Wrong number of arguments for a predicate, or an argument position
    /// outside of its arity.
    #[error("predicate `{predicate}` has arity {arity}, but {requested} was requested")]
    ArityMismatch {
        predicate: String,
        arity: usize,
        requested: usize,
    },

    /// A predicate, constant, object or atom registered twice.
    #[error("{kind} `{name}` is already registered")]
    DuplicateName { kind: &'static str, name: String },

    /// Invalid index or unknown name in an accessor.
    #[error("no {what} `{key}`")]
    Bounds { what: &'static str, key: String },

    /// An operator received an element of the wrong family.
    #[error("expected a {expected} but found a {found} in `{fragment}`")]
    TypeMismatch {
        expected: &'static str,
        found: ElementKind,
        fragment: String,
    },

    /// A state was constructed with a static atom.
    #[error("atom `{0}` is static and cannot be part of a state")]
    StaticAtomInState(String),
}

impl Error {
    pub(crate) fn grammar(fragment: &str, reason: impl Into<String>) -> Self {
        Error::Grammar {
            fragment: fragment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn bounds(what: &'static str, key: impl ToString) -> Self {
        Error::Bounds {
            what,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
