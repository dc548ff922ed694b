//! syntagma: a rule-driven English parser. Source text goes in; a forest
//! of labelled parse trees comes out, with clause nodes carrying
//! thematic-role children (agent, experiencer, theme, ...) and verb
//! attributes (root form, qualifiers, tense/aspect/mood flags).
//!
//! The pipeline: a lexicon-driven tokenizer feeds a doubly linked parse
//! graph; data-driven transforms perform local reductions and establish
//! scope and role relations; the finished graph is translated into the
//! external tree form.
//!
//! ```no_run
//! let mut parser = syntagma::compile::build_parser().unwrap();
//! let forest = parser.parse_text("The cat sat on the mat.", 1);
//! println!("{}", syntagma::outnode::forest_to_xml(&forest, false));
//! ```

pub mod compile;
pub mod defs;
pub mod graph;
pub mod lexer;
pub mod lexicon;
pub mod outnode;
pub mod parser;
pub mod rematch;
pub mod seqmap;
pub mod serializer;
pub mod vdom;
pub mod xfrm;

pub use defs::{Key, Nid, ParseErr, ScKey, SynRel, VerbProps, WordProps};
pub use lexicon::Lexicon;
pub use outnode::{forest_to_xml, OutNode};
pub use parser::Parser;
pub use serializer::RuleFileError;
