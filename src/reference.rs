//! Lightweight handles to interned elements.
//!
//! A handle is the dense index of an element in its family's interning table
//! inside one [`ElementFactory`][crate::factory::ElementFactory]. Handles from
//! different factories must not be mixed.

use std::fmt::{Display, Formatter};

/// The four element families.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ElementKind {
    Concept,
    Role,
    Numerical,
    Boolean,
}

impl ElementKind {
    /// Determines the family of an operator name from its prefix
    /// (`c_`, `r_`, `n_`, `b_`).
    pub fn of_operator(name: &str) -> Option<Self> {
        match name.split_once('_')?.0 {
            "c" => Some(ElementKind::Concept),
            "r" => Some(ElementKind::Role),
            "n" => Some(ElementKind::Numerical),
            "b" => Some(ElementKind::Boolean),
            _ => None,
        }
    }

    /// Lowercase family name, as used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            ElementKind::Concept => "concept",
            ElementKind::Role => "role",
            ElementKind::Numerical => "numerical",
            ElementKind::Boolean => "boolean",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

macro_rules! element_ref {
    ($(#[$meta:meta])* $name:ident, $kind:expr, $tag:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub const KIND: ElementKind = $kind;

            /// Creates a handle from a raw index.
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw index value.
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Returns the index for array access.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", $tag, self.0)
            }
        }
    };
}

element_ref!(
    /// Handle to an interned concept.
    ConceptRef,
    ElementKind::Concept,
    "c"
);
element_ref!(
    /// Handle to an interned role.
    RoleRef,
    ElementKind::Role,
    "r"
);
element_ref!(
    /// Handle to an interned numerical.
    NumericalRef,
    ElementKind::Numerical,
    "n"
);
element_ref!(
    /// Handle to an interned boolean.
    BooleanRef,
    ElementKind::Boolean,
    "b"
);
