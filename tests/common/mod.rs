//! Shared helpers for the integration tests.

use syntagma::outnode::OutNode;
use syntagma::{compile, Parser};

/// A freshly compiled parser over the shipped lexicon.
pub fn parser() -> Parser {
    compile::build_parser().expect("shipped lexicon must compile")
}

/// Parse one input and return the forest.
pub fn parse(src: &str) -> Vec<OutNode> {
    parser().parse_text(src, 1)
}

/// The first non-punctuation root of the forest.
pub fn first_clause(nds: &[OutNode]) -> &OutNode {
    nds.iter()
        .find(|n| n.kind != "punct")
        .expect("forest should hold a clause")
}

/// Child of the given relation, or panic with the tree printed.
pub fn child<'a>(nd: &'a OutNode, rel: &str) -> &'a OutNode {
    match nd.subnode(rel) {
        Some(c) => c,
        None => panic!("no {rel} child in:\n{}", nd.summary()),
    }
}
