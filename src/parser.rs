//! Parser for the textual element grammar.
//!
//! Elements are written in prefix form, e.g.
//! `n_count(c_and(c_primitive(clear,0),c_not(c_one_of(a))))`. Whitespace
//! between tokens is ignored. The family of every operator is given by its
//! prefix (`c_`, `r_`, `n_`, `b_`), and each argument is checked against
//! the family the operator expects at that position.
//!
//! Parsing runs in two phases. The description is first read into a
//! [`Term`] tree, resolving predicates and checking arities and operand
//! families. Only a fully checked tree is then built through the factory, so
//! a rejected description leaves the interning tables untouched.

use log::debug;

use crate::element::ElementRef;
use crate::error::{Error, Result};
use crate::factory::ElementFactory;
use crate::reference::{BooleanRef, ConceptRef, ElementKind, NumericalRef, RoleRef};
use crate::vocabulary::Predicate;

impl ElementFactory {
    /// Parses and interns a concept.
    ///
    /// Nothing is interned if the description is rejected.
    pub fn parse_concept(&self, description: &str) -> Result<ConceptRef> {
        match Parser::new(self, description).parse(Some(ElementKind::Concept))? {
            ElementRef::Concept(c) => Ok(c),
            _ => unreachable!(),
        }
    }

    /// Parses and interns a role.
    pub fn parse_role(&self, description: &str) -> Result<RoleRef> {
        match Parser::new(self, description).parse(Some(ElementKind::Role))? {
            ElementRef::Role(r) => Ok(r),
            _ => unreachable!(),
        }
    }

    /// Parses and interns a numerical.
    pub fn parse_numerical(&self, description: &str) -> Result<NumericalRef> {
        match Parser::new(self, description).parse(Some(ElementKind::Numerical))? {
            ElementRef::Numerical(n) => Ok(n),
            _ => unreachable!(),
        }
    }

    /// Parses and interns a boolean.
    pub fn parse_boolean(&self, description: &str) -> Result<BooleanRef> {
        match Parser::new(self, description).parse(Some(ElementKind::Boolean))? {
            ElementRef::Boolean(b) => Ok(b),
            _ => unreachable!(),
        }
    }

    /// Parses and interns an element of any family.
    pub fn parse(&self, description: &str) -> Result<ElementRef> {
        Parser::new(self, description).parse(None)
    }

    /// Interns a checked term, children first.
    fn build(&self, term: &Term<'_>) -> ElementRef {
        use ElementRef::{Concept as C, Role as R};

        let (operator, args) = match *term {
            Term::ConceptPrimitive(p, pos) => return self.concept_primitive(p, pos).into(),
            Term::RolePrimitive(p, pos1, pos2) => return self.role_primitive(p, pos1, pos2).into(),
            Term::Nullary(p) => return self.boolean_nullary(p).into(),
            Term::OneOf(object) => return self.make_concept_one_of(object).into(),
            Term::Operator {
                operator, ref args, ..
            } => (operator, args),
        };
        let args: Vec<ElementRef> = args.iter().map(|a| self.build(a)).collect();
        match (operator, args.as_slice()) {
            ("c_top", []) => self.make_concept_top().into(),
            ("c_bot", []) => self.make_concept_bot().into(),
            ("c_and", &[C(a), C(b)]) => self.make_concept_and(a, b).into(),
            ("c_or", &[C(a), C(b)]) => self.make_concept_or(a, b).into(),
            ("c_not", &[C(c)]) => self.make_concept_not(c).into(),
            ("c_diff", &[C(a), C(b)]) => self.make_concept_diff(a, b).into(),
            ("c_some", &[R(r), C(c)]) => self.make_concept_some(r, c).into(),
            ("c_all", &[R(r), C(c)]) => self.make_concept_all(r, c).into(),
            ("c_subset", &[R(r), R(s)]) => self.make_concept_subset(r, s).into(),

            ("r_top", []) => self.make_role_top().into(),
            ("r_and", &[R(a), R(b)]) => self.make_role_and(a, b).into(),
            ("r_or", &[R(a), R(b)]) => self.make_role_or(a, b).into(),
            ("r_not", &[R(r)]) => self.make_role_not(r).into(),
            ("r_diff", &[R(a), R(b)]) => self.make_role_diff(a, b).into(),
            ("r_inverse", &[R(r)]) => self.make_role_inverse(r).into(),
            ("r_identity", &[C(c)]) => self.make_role_identity(c).into(),
            ("r_compose", &[R(a), R(b)]) => self.make_role_compose(a, b).into(),
            ("r_restrict", &[R(r), C(c)]) => self.make_role_restrict(r, c).into(),
            ("r_transitive_closure", &[R(r)]) => self.make_role_transitive_closure(r).into(),
            ("r_transitive_reflexive_closure", &[R(r)]) => self.make_role_transitive_reflexive_closure(r).into(),

            ("n_count", &[C(c)]) => self.make_numerical_count_concept(c).into(),
            ("n_count", &[R(r)]) => self.make_numerical_count_role(r).into(),
            ("n_concept_distance", &[C(f), R(r), C(t)]) => self.make_numerical_concept_distance(f, r, t).into(),
            ("n_sum_concept_distance", &[C(f), R(r), C(t)]) => {
                self.make_numerical_sum_concept_distance(f, r, t).into()
            }
            ("n_role_distance", &[R(f), R(r), R(t)]) => self.make_numerical_role_distance(f, r, t).into(),
            ("n_sum_role_distance", &[R(f), R(r), R(t)]) => self.make_numerical_sum_role_distance(f, r, t).into(),

            ("b_empty", &[C(c)]) => self.make_boolean_empty_concept(c).into(),
            ("b_empty", &[R(r)]) => self.make_boolean_empty_role(r).into(),

            _ => unreachable!("`{}` was checked against its operands", operator),
        }
    }
}

/// A checked element description.
enum Term<'a> {
    ConceptPrimitive(&'a Predicate, usize),
    RolePrimitive(&'a Predicate, usize, usize),
    Nullary(&'a Predicate),
    OneOf(&'a str),
    Operator {
        operator: &'a str,
        kind: ElementKind,
        args: Vec<Term<'a>>,
    },
}

impl Term<'_> {
    fn kind(&self) -> ElementKind {
        match *self {
            Term::ConceptPrimitive(..) | Term::OneOf(_) => ElementKind::Concept,
            Term::RolePrimitive(..) => ElementKind::Role,
            Term::Nullary(_) => ElementKind::Boolean,
            Term::Operator { kind, .. } => kind,
        }
    }
}

/// Family accepted at an operand position.
#[derive(Debug, Copy, Clone)]
enum Operand {
    Concept,
    Role,
    ConceptOrRole,
}

impl Operand {
    fn accepts(self, kind: ElementKind) -> bool {
        match self {
            Operand::Concept => kind == ElementKind::Concept,
            Operand::Role => kind == ElementKind::Role,
            Operand::ConceptOrRole => matches!(kind, ElementKind::Concept | ElementKind::Role),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Operand::Concept => "concept",
            Operand::Role => "role",
            Operand::ConceptOrRole => "concept or role",
        }
    }
}

/// Operands of every operator that takes elements (or nothing) as arguments.
fn operands(operator: &str) -> Option<&'static [Operand]> {
    const C: Operand = Operand::Concept;
    const R: Operand = Operand::Role;
    const CR: Operand = Operand::ConceptOrRole;

    let operands: &'static [Operand] = match operator {
        "c_top" | "c_bot" | "r_top" => &[],
        "c_not" => &[C],
        "c_and" | "c_or" | "c_diff" => &[C, C],
        "c_some" | "c_all" => &[R, C],
        "c_subset" => &[R, R],
        "r_not" | "r_inverse" | "r_transitive_closure" | "r_transitive_reflexive_closure" => &[R],
        "r_identity" => &[C],
        "r_and" | "r_or" | "r_diff" | "r_compose" => &[R, R],
        "r_restrict" => &[R, C],
        "n_count" | "b_empty" => &[CR],
        "n_concept_distance" | "n_sum_concept_distance" => &[C, R, C],
        "n_role_distance" | "n_sum_role_distance" => &[R, R, R],
        _ => return None,
    };
    Some(operands)
}

struct Parser<'a> {
    factory: &'a ElementFactory,
    input: &'a str,
    pos: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl<'a> Parser<'a> {
    fn new(factory: &'a ElementFactory, input: &'a str) -> Self {
        Self { factory, input, pos: 0 }
    }

    fn parse(mut self, expected: Option<ElementKind>) -> Result<ElementRef> {
        debug!("parse {:?}", self.input);
        self.skip_whitespace();
        let start = self.pos;
        let term = self.term()?;
        let end = self.pos;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(Error::grammar(self.rest(), "unexpected trailing input"));
        }
        if let Some(expected) = expected {
            if term.kind() != expected {
                return Err(Error::TypeMismatch {
                    expected: expected.name(),
                    found: term.kind(),
                    fragment: self.input[start..end].to_string(),
                });
            }
        }
        Ok(self.factory.build(&term))
    }

    fn rest(&self) -> &'a str {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            "<end of input>"
        } else {
            rest
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn name(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let rest = &self.input[self.pos..];
        let len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        if len == 0 {
            return Err(Error::grammar(self.rest(), "expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn number(&mut self) -> Result<usize> {
        let start = self.pos;
        let token = self.name()?;
        token
            .parse()
            .map_err(|_| Error::grammar(self.input[start..].trim_start(), "expected an argument position"))
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_whitespace();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(Error::grammar(self.rest(), format!("expected `{}`", c)))
        }
    }

    fn open(&mut self) -> Result<()> {
        self.expect('(')
    }

    fn comma(&mut self) -> Result<()> {
        self.expect(',')
    }

    fn close(&mut self) -> Result<()> {
        self.expect(')')
    }

    /// Reads an operand, checking its family.
    fn operand(&mut self, operand: Operand) -> Result<Term<'a>> {
        self.skip_whitespace();
        let start = self.pos;
        let term = self.term()?;
        if !operand.accepts(term.kind()) {
            return Err(Error::TypeMismatch {
                expected: operand.name(),
                found: term.kind(),
                fragment: self.input[start..self.pos].to_string(),
            });
        }
        Ok(term)
    }

    fn term(&mut self) -> Result<Term<'a>> {
        self.skip_whitespace();
        let start = self.pos;
        let op = self.name()?;
        let f = self.factory;
        let term = match op {
            "c_primitive" => {
                self.open()?;
                let predicate = self.name()?;
                self.comma()?;
                let pos = self.number()?;
                self.close()?;
                Term::ConceptPrimitive(f.predicate_position(predicate, &[pos])?, pos)
            }
            "r_primitive" => {
                self.open()?;
                let predicate = self.name()?;
                self.comma()?;
                let pos1 = self.number()?;
                self.comma()?;
                let pos2 = self.number()?;
                self.close()?;
                Term::RolePrimitive(f.predicate_position(predicate, &[pos1, pos2])?, pos1, pos2)
            }
            "b_nullary" => {
                self.open()?;
                let predicate = self.name()?;
                self.close()?;
                Term::Nullary(f.nullary_predicate(predicate)?)
            }
            "c_one_of" => {
                self.open()?;
                let object = self.name()?;
                self.close()?;
                Term::OneOf(object)
            }
            _ => {
                let (kind, operands) = match (ElementKind::of_operator(op), operands(op)) {
                    (Some(kind), Some(operands)) => (kind, operands),
                    (kind, _) => {
                        let reason = match kind {
                            Some(kind) => format!("unknown {} operator `{}`", kind, op),
                            None => format!("unknown operator `{}`", op),
                        };
                        return Err(Error::grammar(&self.input[start..], reason));
                    }
                };
                let mut args = Vec::with_capacity(operands.len());
                if !operands.is_empty() {
                    self.open()?;
                    for (i, &operand) in operands.iter().enumerate() {
                        if i > 0 {
                            self.comma()?;
                        }
                        args.push(self.operand(operand)?);
                    }
                    self.close()?;
                }
                Term::Operator {
                    operator: op,
                    kind,
                    args,
                }
            }
        };
        Ok(term)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::vocabulary::VocabularyInfo;

    use test_log::test;

    fn factory() -> ElementFactory {
        let mut v = VocabularyInfo::new();
        v.add_predicate("at", 2).unwrap();
        v.add_predicate("clear", 1).unwrap();
        v.add_predicate("hand-empty", 0).unwrap();
        ElementFactory::new(Arc::new(v))
    }

    #[test]
    fn test_parse_concepts() {
        let f = factory();
        let c = f.parse_concept("c_and(c_primitive(clear,0),c_not(c_one_of(a)))").unwrap();
        assert_eq!(&*f.repr(c), "c_and(c_not(c_one_of(a)),c_primitive(clear,0))");
        assert_eq!(f.complexity(c), 4);
        let spaced = f
            .parse_concept(" c_and ( c_primitive( clear , 0 ) , c_not(c_one_of(a)) ) ")
            .unwrap();
        assert_eq!(spaced, c);
        let some = f.parse_concept("c_some(r_primitive(at,0,1),c_top)").unwrap();
        assert_eq!(&*f.repr(some), "c_some(r_primitive(at,0,1),c_top)");
    }

    #[test]
    fn test_parse_is_interned() {
        let f = factory();
        let a = f.parse_role("r_transitive_closure(r_inverse(r_primitive(at,0,1)))").unwrap();
        let b = f.parse_role("r_transitive_closure(r_inverse(r_primitive(at,0,1)))").unwrap();
        assert_eq!(a, b);
        let r = f.make_role_primitive("at", 0, 1).unwrap();
        let c = f.make_role_transitive_closure(f.make_role_inverse(r));
        assert_eq!(a, c);
    }

    #[test]
    fn test_parse_numericals_and_booleans() {
        let f = factory();
        let n = f.parse_numerical("n_count(r_top)").unwrap();
        assert_eq!(&*f.repr(n), "n_count(r_top)");
        let n = f
            .parse_numerical("n_concept_distance(c_primitive(clear,0), r_primitive(at,0,1), c_top)")
            .unwrap();
        assert_eq!(f.complexity(n), 4);
        let b = f.parse_boolean("b_empty(c_primitive(at,1))").unwrap();
        assert_eq!(&*f.repr(b), "b_empty(c_primitive(at,1))");
        let b = f.parse_boolean("b_nullary(hand-empty)").unwrap();
        assert_eq!(&*f.repr(b), "b_nullary(hand-empty)");
        assert!(matches!(f.parse("n_count(c_top)"), Ok(ElementRef::Numerical(_))));
    }

    #[test]
    fn test_grammar_errors() {
        let f = factory();
        match f.parse_concept("c_foo(c_top)") {
            Err(Error::Grammar { fragment, reason }) => {
                assert_eq!(fragment, "c_foo(c_top)");
                assert!(reason.contains("c_foo"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(f.parse_concept("c_and(c_top"), Err(Error::Grammar { .. })));
        assert!(matches!(f.parse_concept("c_top)"), Err(Error::Grammar { .. })));
        assert!(matches!(f.parse_concept(""), Err(Error::Grammar { .. })));
        assert!(matches!(f.parse_concept("c_primitive(clear,x)"), Err(Error::Grammar { .. })));
    }

    #[test]
    fn test_type_errors() {
        let f = factory();
        assert_eq!(
            f.parse_concept("c_and(c_top,r_top)"),
            Err(Error::TypeMismatch {
                expected: "concept",
                found: ElementKind::Role,
                fragment: "r_top".to_string(),
            })
        );
        assert!(matches!(
            f.parse_role("c_top"),
            Err(Error::TypeMismatch {
                expected: "role",
                found: ElementKind::Concept,
                ..
            })
        ));
        assert_eq!(
            f.parse_numerical("n_count(b_nullary(hand-empty))"),
            Err(Error::TypeMismatch {
                expected: "concept or role",
                found: ElementKind::Boolean,
                fragment: "b_nullary(hand-empty)".to_string(),
            })
        );
        assert_eq!(
            f.parse_boolean("c_some( r_top ,c_top) "),
            Err(Error::TypeMismatch {
                expected: "boolean",
                found: ElementKind::Concept,
                fragment: "c_some( r_top ,c_top)".to_string(),
            })
        );
    }

    #[test]
    fn test_rejected_parse_interns_nothing() {
        let f = factory();
        let rejected = [
            "c_and(c_some(r_transitive_closure(r_primitive(at,0,1)),c_top),r_top)",
            "c_and(c_top,c_primitive(on,0))",
            "n_count(c_or(c_one_of(a),c_primitive(clear,1)))",
            "c_not(c_one_of(a)) c_top",
        ];
        for description in rejected {
            assert!(f.parse(description).is_err(), "{}", description);
            assert_eq!(f.num_concepts(), 0, "{}", description);
            assert_eq!(f.num_roles(), 0, "{}", description);
            assert_eq!(f.num_numericals(), 0, "{}", description);
        }
        assert!(f.parse_role("c_one_of(a)").is_err());
        assert_eq!(f.num_concepts(), 0);

        f.parse_concept("c_some(r_transitive_closure(r_primitive(at,0,1)),c_top)").unwrap();
        assert_eq!((f.num_concepts(), f.num_roles()), (2, 2));
    }

    #[test]
    fn test_vocabulary_errors() {
        let f = factory();
        assert_eq!(
            f.parse_concept("c_primitive(on,0)"),
            Err(Error::UnknownPredicate("on".to_string()))
        );
        assert!(matches!(
            f.parse_role("r_primitive(at,0,2)"),
            Err(Error::ArityMismatch { requested: 2, .. })
        ));
        assert!(matches!(
            f.parse_boolean("b_nullary(clear)"),
            Err(Error::ArityMismatch { arity: 1, .. })
        ));
    }
}
