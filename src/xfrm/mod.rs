//! The transform framework. A transform walks the graph from the head,
//! asking `find_rule` at each node; on a hit it delegates to `apply_rule`,
//! whose return value is the resume position. After the walk an optional
//! post hook runs. A `ParseErr` raised inside one transform is contained at
//! the per-transform boundary: the pipeline moves on to the next transform
//! with the graph in whatever state had been reached.
//!
//! Transforms are heterogeneous (different rule data, same surface), so the
//! pipeline is a list of tagged variants.

mod reduct;
mod relate;
mod roles;

pub use reduct::{Action, ReductXfrm};
pub use relate::{InvertQXfrm, ScSeqToSrXfrm, SrXfrm, SvToQXfrm, VconjXfrm};
pub use roles::RoleXfrm;

use crate::defs::ParseErr;
use crate::graph::ParseGraph;
use crate::lexicon::Lexicon;
use crate::serializer::{Decoder, Encoder, RuleFileError};

/// Everything a transform needs: the lexicon (read-only by now) and the
/// graph under transformation. Threaded explicitly through the pipeline.
pub struct ParseCx<'a> {
    pub lx: &'a Lexicon,
    pub g: &'a mut ParseGraph,
    pub trace: bool,
}

pub enum Xfrm {
    Reduct(ReductXfrm),
    ScSeqToSr(ScSeqToSrXfrm),
    Sr(SrXfrm),
    Role(RoleXfrm),
    SvToQ(SvToQXfrm),
    InvertQ(InvertQXfrm),
    Vconj(VconjXfrm),
}

impl Xfrm {
    pub fn name(&self) -> &str {
        match self {
            Xfrm::Reduct(x) => &x.name,
            Xfrm::ScSeqToSr(x) => &x.name,
            Xfrm::Sr(x) => &x.name,
            Xfrm::Role(x) => &x.name,
            Xfrm::SvToQ(x) => &x.name,
            Xfrm::InvertQ(x) => &x.name,
            Xfrm::Vconj(x) => &x.name,
        }
    }

    /// One full walk of the graph plus the post hook.
    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        match self {
            Xfrm::Reduct(x) => x.run(cx),
            Xfrm::ScSeqToSr(x) => x.run(cx),
            Xfrm::Sr(x) => x.run(cx),
            Xfrm::Role(x) => x.run(cx),
            Xfrm::SvToQ(x) => x.run(cx),
            Xfrm::InvertQ(x) => x.run(cx),
            Xfrm::Vconj(x) => x.run(cx),
        }
    }

    /// Serialize: the name, then whatever rule data the transform carries.
    pub fn encode(&self, enc: &mut Encoder) {
        enc.str(self.name());
        match self {
            Xfrm::Reduct(x) => x.encode_values(enc),
            Xfrm::ScSeqToSr(x) => x.encode_values(enc),
            Xfrm::Role(x) => x.encode_values(enc),
            Xfrm::Sr(_) | Xfrm::SvToQ(_) | Xfrm::InvertQ(_) | Xfrm::Vconj(_) => {}
        }
    }

    /// Decode the next transform; the name selects the variant.
    pub fn decode(dec: &mut Decoder) -> Result<Xfrm, RuleFileError> {
        let name = dec.str()?;
        match name.as_str() {
            "initReduct" | "vReduct" | "detReduct" | "conjReduct" | "actReduct" => {
                Ok(Xfrm::Reduct(ReductXfrm::decode_values(name, dec)?))
            }
            "leftVdomXfrm" => Ok(Xfrm::ScSeqToSr(ScSeqToSrXfrm::decode_values(name, dec)?)),
            "srXfrm" => Ok(Xfrm::Sr(SrXfrm { name })),
            "roleXfrm" => Ok(Xfrm::Role(RoleXfrm::decode_values(name, dec)?)),
            "svToQXfrm" => Ok(Xfrm::SvToQ(SvToQXfrm { name })),
            "invertQXfrm" => Ok(Xfrm::InvertQ(InvertQXfrm { name })),
            "vconjXfrm" => Ok(Xfrm::Vconj(VconjXfrm { name })),
            _ => Err(RuleFileError::UnknownXfrm(name)),
        }
    }

    /// Human-readable rule listing.
    pub fn dump(&self, lx: &Lexicon) -> String {
        match self {
            Xfrm::Reduct(x) => x.dump(lx),
            Xfrm::ScSeqToSr(x) => x.dump(lx),
            Xfrm::Role(x) => x.dump(lx),
            _ => format!("Xfrm \"{}\"\n", self.name()),
        }
    }
}
