//! Element DAG to DOT (Graphviz) conversion.
//!
//! Elements are hash-consed, so a set of roots shares its subterms. The
//! exported graph draws every reachable element once:
//! - **Leaf elements** (primitives, top/bot, one-of, nullary) are labelled
//!   with their full repr and placed at the sink rank
//! - **Operator elements** are labelled with their operator name and shaped
//!   by family
//! - **Edges** go from an operator to its operands, numbered by argument
//!   position
//! - **Root nodes** are rendered as rectangles at the top (source rank)
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use dl_features::factory::ElementFactory;
//! use dl_features::vocabulary::VocabularyInfo;
//!
//! let mut vocabulary = VocabularyInfo::new();
//! vocabulary.add_predicate("on", 2).unwrap();
//! let factory = ElementFactory::new(Arc::new(vocabulary));
//!
//! let c = factory.parse_concept("c_some(r_primitive(on,0,1),c_top)").unwrap();
//! let dot = factory.to_dot(&[c.into()]).unwrap();
//! // Write to file and render with: dot -Tpng output.dot -o output.png
//! assert!(dot.starts_with("digraph {"));
//! ```

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::element::{ElementRef, Operator};
use crate::factory::ElementFactory;
use crate::reference::ElementKind;

/// Configuration options for DOT output generation.
///
/// # Examples
///
/// ```
/// use dl_features::dot::DotConfig;
///
/// let config = DotConfig {
///     role_shape: "box",
///     ..DotConfig::default()
/// };
/// assert_eq!(config.concept_shape, "ellipse");
/// ```
#[derive(Debug, Clone)]
pub struct DotConfig {
    /// Shape for concept nodes (default: "ellipse")
    pub concept_shape: &'static str,
    /// Shape for role nodes (default: "diamond")
    pub role_shape: &'static str,
    /// Shape for numerical nodes (default: "hexagon")
    pub numerical_shape: &'static str,
    /// Shape for boolean nodes (default: "octagon")
    pub boolean_shape: &'static str,
    /// Shape for root nodes (default: "rect")
    pub root_shape: &'static str,
    /// Style for operand edges (default: "solid")
    pub edge_style: &'static str,
    /// Whether to label edges with the argument position (default: true)
    pub label_edges: bool,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            concept_shape: "ellipse",
            role_shape: "diamond",
            numerical_shape: "hexagon",
            boolean_shape: "octagon",
            root_shape: "rect",
            edge_style: "solid",
            label_edges: true,
        }
    }
}

impl DotConfig {
    fn shape(&self, kind: ElementKind) -> &'static str {
        match kind {
            ElementKind::Concept => self.concept_shape,
            ElementKind::Role => self.role_shape,
            ElementKind::Numerical => self.numerical_shape,
            ElementKind::Boolean => self.boolean_shape,
        }
    }
}

fn node_id(element: ElementRef) -> String {
    match element {
        ElementRef::Concept(c) => format!("c{}", c.raw()),
        ElementRef::Role(r) => format!("r{}", r.raw()),
        ElementRef::Numerical(n) => format!("n{}", n.raw()),
        ElementRef::Boolean(b) => format!("b{}", b.raw()),
    }
}

impl ElementFactory {
    fn operator_of(&self, element: ElementRef) -> (&'static str, Vec<ElementRef>) {
        fn split<N: Operator>(node: N) -> (&'static str, Vec<ElementRef>) {
            (node.operator(), node.children())
        }
        match element {
            ElementRef::Concept(c) => split(self.node(c)),
            ElementRef::Role(r) => split(self.node(r)),
            ElementRef::Numerical(n) => split(self.node(n)),
            ElementRef::Boolean(b) => split(self.node(b)),
        }
    }

    fn repr_of(&self, element: ElementRef) -> String {
        match element {
            ElementRef::Concept(c) => self.repr(c).to_string(),
            ElementRef::Role(r) => self.repr(r).to_string(),
            ElementRef::Numerical(n) => self.repr(n).to_string(),
            ElementRef::Boolean(b) => self.repr(b).to_string(),
        }
    }

    /// Collects every element reachable from `roots`, roots included.
    pub fn descendants(&self, roots: impl IntoIterator<Item = ElementRef>) -> BTreeSet<ElementRef> {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<ElementRef> = roots.into_iter().collect();
        while let Some(element) = stack.pop() {
            if visited.insert(element) {
                let (_, children) = self.operator_of(element);
                stack.extend(children);
            }
        }
        visited
    }

    /// Converts the DAG below `roots` to DOT format with the default configuration.
    pub fn to_dot(&self, roots: &[ElementRef]) -> Result<String, std::fmt::Error> {
        self.to_dot_with_config(roots, &DotConfig::default())
    }

    /// Converts the DAG below `roots` to DOT format.
    ///
    /// Shared subterms are emitted once, so the node count equals
    /// `descendants(roots).len()` plus one node per root.
    ///
    /// # Panics
    ///
    /// Panics if a root was not created by this factory.
    pub fn to_dot_with_config(&self, roots: &[ElementRef], config: &DotConfig) -> Result<String, std::fmt::Error> {
        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;

        let all = self.descendants(roots.iter().copied());
        let mut leaves = Vec::new();
        let mut inner = Vec::new();
        for &element in all.iter() {
            let (operator, children) = self.operator_of(element);
            if children.is_empty() {
                leaves.push(element);
            } else {
                inner.push((element, operator, children));
            }
        }

        writeln!(dot, "{{ rank=sink")?;
        for &element in leaves.iter() {
            writeln!(
                dot,
                "{} [shape={}, label=\"{}\"];",
                node_id(element),
                config.shape(element.kind()),
                self.repr_of(element)
            )?;
        }
        writeln!(dot, "}}")?;

        for (element, operator, _) in inner.iter() {
            writeln!(
                dot,
                "{} [shape={}, label=\"{}\"];",
                node_id(*element),
                config.shape(element.kind()),
                operator
            )?;
        }

        for (element, _, children) in inner.iter() {
            for (i, &child) in children.iter().enumerate() {
                if config.label_edges {
                    writeln!(
                        dot,
                        "{} -> {} [style={}, label=\"{}\"];",
                        node_id(*element),
                        node_id(child),
                        config.edge_style,
                        i
                    )?;
                } else {
                    writeln!(dot, "{} -> {} [style={}];", node_id(*element), node_id(child), config.edge_style)?;
                }
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, &root) in roots.iter().enumerate() {
            writeln!(dot, "root{} [shape={}, label=\"{}\"];", i, config.root_shape, self.repr_of(root))?;
        }
        writeln!(dot, "}}")?;
        for (i, &root) in roots.iter().enumerate() {
            writeln!(dot, "root{} -> {};", i, node_id(root))?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use test_log::test;

    use super::*;
    use crate::vocabulary::VocabularyInfo;

    fn factory() -> ElementFactory {
        let mut vocabulary = VocabularyInfo::new();
        vocabulary.add_predicate("on", 2).unwrap();
        vocabulary.add_predicate("clear", 1).unwrap();
        ElementFactory::new(Arc::new(vocabulary))
    }

    #[test]
    fn test_to_dot_basic() {
        let factory = factory();
        let c = factory.parse_concept("c_and(c_primitive(clear,0),c_top)").unwrap();

        let dot = factory.to_dot(&[c.into()]).unwrap();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.ends_with("}\n"));
        assert!(dot.contains("label=\"c_and\""));
        assert!(dot.contains("label=\"c_primitive(clear,0)\""));
        assert!(dot.contains("label=\"c_top\""));
    }

    #[test]
    fn test_shared_subterms_once() {
        let factory = factory();
        let n = factory.parse_numerical("n_count(c_some(r_primitive(on,0,1),c_primitive(clear,0)))").unwrap();
        let b = factory.parse_boolean("b_empty(c_some(r_primitive(on,0,1),c_primitive(clear,0)))").unwrap();

        let roots = [n.into(), b.into()];
        assert_eq!(factory.descendants(roots).len(), 5);

        let dot = factory.to_dot(&roots).unwrap();
        assert_eq!(dot.matches("label=\"c_some\"").count(), 1);
        assert_eq!(dot.matches("label=\"r_primitive(on,0,1)\"").count(), 1);
        assert!(dot.contains("root0 ->"));
        assert!(dot.contains("root1 ->"));
    }

    #[test]
    fn test_to_dot_with_config() {
        let factory = factory();
        let r = factory.parse_role("r_compose(r_primitive(on,0,1),r_primitive(on,0,1))").unwrap();

        let config = DotConfig {
            label_edges: false,
            role_shape: "box",
            ..DotConfig::default()
        };
        let dot = factory.to_dot_with_config(&[r.into()], &config).unwrap();
        assert!(dot.contains("shape=box"));
        assert!(!dot.contains("label=\"0\""));
        // Both operands are the same element.
        assert_eq!(dot.matches("-> r0 [style=solid]").count(), 2);
    }

    #[test]
    #[ignore]
    fn test_write_dot_file() {
        let factory = factory();
        let n = factory
            .parse_numerical("n_concept_distance(c_primitive(clear,0),r_primitive(on,0,1),c_top)")
            .unwrap();
        let dot = factory.to_dot(&[n.into()]).unwrap();
        std::fs::write("test_output.dot", &dot).unwrap();
        println!("DOT output:\n{}", dot);
    }
}
