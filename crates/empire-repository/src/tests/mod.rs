#![allow(clippy::unwrap_used)]

mod factory;
mod remote;

use oxigraph::model::{GraphName, Literal, NamedNode, Quad};

/// Quad filed under its own subject, the shape bulk loading produces
pub(super) fn subject_quad(subject: &str, value: &str) -> Quad {
    let subject = NamedNode::new(subject).unwrap();
    Quad::new(
        subject.clone(),
        NamedNode::new("http://example.org/p").unwrap(),
        Literal::new_simple_literal(value),
        GraphName::NamedNode(subject),
    )
}
