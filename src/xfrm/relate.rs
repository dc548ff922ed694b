//! Transforms that establish syntax relations: the data-driven scope
//! assignment over sc windows, the verb-complex transform that hands a
//! narrowed graph to the verb-domain resolver, the subject-verb-to-
//! qualifier reclassification, Q-inversion, and verb conjunctions.

use crate::defs::{Nid, ParseErr, SynRel, VerbProps, WordProps};
use crate::seqmap::SeqMap;
use crate::serializer::{Decoder, Encoder, RuleFileError, Width};
use crate::vdom;
use crate::xfrm::ParseCx;
use crate::lexicon::Lexicon;

/// Maps sc sequences to srSeq values: one byte per matched node, high
/// nibble = offset to the scope target within the window, low nibble =
/// relation. Offset 0 leaves the node alone.
pub struct ScSeqToSrXfrm {
    pub name: String,
    pub rules: SeqMap,
    pub sr_seq: Vec<Vec<u8>>,
}

impl ScSeqToSrXfrm {
    pub fn new(name: impl Into<String>) -> ScSeqToSrXfrm {
        ScSeqToSrXfrm {
            name: name.into(),
            rules: SeqMap::new(),
            sr_seq: Vec::new(),
        }
    }

    pub fn push_value(&mut self, seq: Vec<u8>) -> u16 {
        self.sr_seq.push(seq);
        (self.sr_seq.len() - 1) as u16
    }

    fn apply_rule(&self, cx: &mut ParseCx, rule: (Vec<Nid>, u16)) -> Result<Option<Nid>, ParseErr> {
        let (nd_seq, vix) = rule;
        let sr_seq = &self.sr_seq[vix as usize];
        for (i, &e) in nd_seq.iter().enumerate() {
            let b = sr_seq.get(i).copied().unwrap_or(0);
            let offset = ((b >> 4) & 0xf) as usize;
            let rel = b & 0xf;
            if offset != 0 {
                let target = *nd_seq
                    .get(i + offset)
                    .ok_or_else(|| ParseErr::new("scope offset past window"))?;
                let rel = SynRel::from_u8(rel)
                    .ok_or_else(|| ParseErr::new("bad relation in srSeq"))?;
                cx.g.set_scope(e, target, rel);
            }
        }
        let last = *nd_seq.last().ok_or_else(|| ParseErr::new("empty rule match"))?;
        Ok(cx.g[last].nxt)
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            match self.rules.matches_at(cx.g, n, true).pop() {
                Some(rule) => e = self.apply_rule(cx, rule)?,
                None => e = cx.g[n].nxt,
            }
        }
        Ok(())
    }

    fn sr_seq_to_str(seq: &[u8]) -> String {
        let parts: Vec<String> = seq
            .iter()
            .map(|&t| {
                let offset = (t >> 4) & 0xf;
                let sr = t & 0xf;
                format!("{}:{}", SynRel::label_of(sr), offset)
            })
            .collect();
        parts.join(" ")
    }

    pub fn dump(&self, lx: &Lexicon) -> String {
        let mut out = format!("Xfrm \"{}\"\n", self.name);
        out.push_str(&self.rules.dump(&|c| lx.sc_dict.spelling(c as u32).to_string()));
        for (i, seq) in self.sr_seq.iter().enumerate() {
            out.push_str(&format!("{}. srSeq: {}\n", i, Self::sr_seq_to_str(seq)));
        }
        out
    }

    pub fn encode_values(&self, enc: &mut Encoder) {
        self.rules.encode(enc);
        let seqs: Vec<Vec<u32>> = self
            .sr_seq
            .iter()
            .map(|s| s.iter().map(|&b| b as u32).collect())
            .collect();
        enc.lst_lst(&seqs, Width::W8);
    }

    pub fn decode_values(name: String, dec: &mut Decoder) -> Result<ScSeqToSrXfrm, RuleFileError> {
        let rules = SeqMap::decode(dec)?;
        let sr_seq: Vec<Vec<u8>> = dec
            .lst_lst(Width::W8)?
            .into_iter()
            .map(|s| s.into_iter().map(|b| b as u8).collect())
            .collect();
        Ok(ScSeqToSrXfrm { name, rules, sr_seq })
    }
}

/// Finds verb complexes (maximal windows holding at least one verb, not
/// broken by punctuation or non-action conjunctions), narrows the graph to
/// each, gives leftover unscoped terms a theme relation to the nearest
/// preceding verb, and runs the verb-domain resolver.
pub struct SrXfrm {
    pub name: String,
}

impl SrXfrm {
    pub fn new(name: impl Into<String>) -> SrXfrm {
        SrXfrm { name: name.into() }
    }

    fn can_extend_complex(&self, cx: &ParseCx, e: Option<Nid>) -> bool {
        let e = match e {
            Some(e) => e,
            None => return false,
        };
        if cx.g[e].check_sc(cx.lx, WordProps::PUNCT) {
            return false;
        }
        // a conjunction ends the region unless it joins an action
        // ("and see what was there")
        if cx.g[e].check_sc(cx.lx, WordProps::CONJ) {
            if let Some(nxt) = cx.g[e].nxt {
                return cx.g[nxt].is_verb(cx.lx)
                    && cx.g[nxt].rel[SynRel::Agent.index()].is_empty()
                    && cx.g[nxt].rel[SynRel::IsQby.index()].is_empty();
            }
            return false;
        }
        true
    }

    fn find_rule(&self, cx: &ParseCx, e: Nid) -> Option<(Nid, Nid)> {
        if cx.g[e].check_sc(cx.lx, WordProps::PUNCT | WordProps::CONJ) {
            return None;
        }
        let mut saw_verb = false;
        let mut ex = e;
        loop {
            if cx.g[ex].is_verb(cx.lx) {
                saw_verb = true;
            }
            if !self.can_extend_complex(cx, cx.g[ex].nxt) {
                break;
            }
            match cx.g[ex].nxt {
                Some(n) => ex = n,
                None => break,
            }
        }
        if saw_verb {
            Some((e, ex))
        } else {
            None
        }
    }

    fn apply_rule(&self, cx: &mut ParseCx, rule: (Nid, Nid)) -> Result<Option<Nid>, ParseErr> {
        let (s, e) = rule;
        let rinfo = cx.g.reset_span(s, e);
        // Q and subject relations are set. Remaining non-verb unscoped
        // terms become objects of the closest preceding verb.
        let mut scope: Option<Nid> = None;
        let mut ex = s;
        loop {
            if cx.g[ex].is_verb(cx.lx) {
                scope = Some(ex);
            } else if cx.g[ex].scope.is_none() {
                if let Some(v) = scope {
                    cx.g.set_scope(ex, v, SynRel::Theme);
                }
            }
            if ex == e {
                break;
            }
            match cx.g[ex].nxt {
                Some(n) => ex = n,
                None => break,
            }
        }
        // On failure the error unwinds to the transform boundary and the
        // graph keeps whatever state had been reached (still narrowed).
        vdom::resolve(cx)?;
        cx.g.restore_span(rinfo);
        Ok(cx.g[e].nxt)
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            match self.find_rule(cx, n) {
                Some(rule) => e = self.apply_rule(cx, rule)?,
                None => e = cx.g[n].nxt,
            }
        }
        Ok(())
    }
}

/// Context-dependent transform of subject-verb forms into qualified
/// expressions: a gerund in a subject slot, or a query word acting as
/// subject of a verb without qualifier.
pub struct SvToQXfrm {
    pub name: String,
}

impl SvToQXfrm {
    pub fn new(name: impl Into<String>) -> SvToQXfrm {
        SvToQXfrm { name: name.into() }
    }

    fn in_sub_role(&self, cx: &ParseCx, e: Nid) -> bool {
        matches!(cx.g[e].sr, SynRel::Agent | SynRel::Exper | SynRel::Topic)
    }

    /// Returns the verb node to be transformed.
    fn find_rule(&self, cx: &ParseCx, e: Nid) -> Option<Nid> {
        if cx.g[e].check_vprop(VerbProps::GERUND) {
            if self.in_sub_role(cx, e) {
                // "the girl sitting there" in a subject role
                return Some(e);
            }
            if matches!(cx.g[e].sr, SynRel::Theme | SynRel::AuxTheme) {
                if let Some(scope) = cx.g[e].scope {
                    if !cx.g[scope].rel[SynRel::Theme.index()].is_empty()
                        && !cx.g[scope].rel[SynRel::AuxTheme.index()].is_empty()
                    {
                        // object term in an AVGT context: "I gave the guy
                        // sitting there an apple"
                        return Some(e);
                    }
                }
            }
        } else if cx.lx.check_sc_prop(cx.g[e].sc, WordProps::QUERY)
            && self.in_sub_role(cx, e)
        {
            if let Some(scope) = cx.g[e].scope {
                if cx.g[scope].rel[SynRel::IsQby.index()].is_empty() {
                    // "who ate the cake"
                    return Some(scope);
                }
            }
        }
        None
    }

    fn apply_rule(&self, cx: &mut ParseCx, v: Nid) -> Option<Nid> {
        if !cx.g[v].rel[SynRel::Agent.index()].is_empty() {
            cx.g.reset_rel(v, SynRel::Agent, SynRel::IsQby);
        } else if !cx.g[v].rel[SynRel::Exper.index()].is_empty() {
            cx.g.reset_rel(v, SynRel::Exper, SynRel::IsQby);
        } else if !cx.g[v].rel[SynRel::Topic.index()].is_empty() {
            cx.g.reset_rel(v, SynRel::Topic, SynRel::IsQby);
        }
        cx.g[v].nxt
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            match self.find_rule(cx, n) {
                Some(v) => e = self.apply_rule(cx, v),
                None => e = cx.g[n].nxt,
            }
        }
        cx.g.validate_relations();
        Ok(())
    }
}

/// Inverts Q expressions: in "the girl you saw", [the girl] takes the
/// verb's scope and relation, and the verb becomes a modifier of
/// [the girl].
pub struct InvertQXfrm {
    pub name: String,
}

impl InvertQXfrm {
    pub fn new(name: impl Into<String>) -> InvertQXfrm {
        InvertQXfrm { name: name.into() }
    }

    fn apply_rule(&self, cx: &mut ParseCx, q: Nid) -> Option<Nid> {
        let v = match cx.g[q].scope {
            Some(v) => v,
            None => return cx.g[q].nxt,
        };
        cx.g[q].scope = cx.g[v].scope;
        cx.g[q].sr = cx.g[v].sr;
        cx.g[v].sr = SynRel::Modifies;
        cx.g[v].scope = Some(q);
        cx.g[q].nxt
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            if cx.g[n].sr == SynRel::IsQby {
                e = self.apply_rule(cx, n);
            } else {
                e = cx.g[n].nxt;
            }
        }
        cx.g.validate_relations();
        // verb-expression domains are now final; spans follow
        cx.g.validate_spans(cx.lx);
        Ok(())
    }
}

/// Resolves verb conjunctions: a node in the vconj relation inherits its
/// peer's scope, role, and subject lists; the preceding conjunction
/// becomes its head and is removed from the graph.
pub struct VconjXfrm {
    pub name: String,
}

impl VconjXfrm {
    pub fn new(name: impl Into<String>) -> VconjXfrm {
        VconjXfrm { name: name.into() }
    }

    fn apply_rule(&self, cx: &mut ParseCx, e: Nid) -> Option<Nid> {
        let peer = match cx.g[e].scope {
            Some(p) => p,
            None => return cx.g[e].nxt,
        };
        let scope = cx.g[peer].scope;
        let vconj = SynRel::Vconj.index();
        if let Some(ix) = cx.g[peer].rel[vconj].iter().position(|&x| x == e) {
            cx.g[peer].rel[vconj].remove(ix);
        }
        cx.g[e].scope = scope;
        cx.g[e].sr = cx.g[peer].sr;
        let agents = cx.g[peer].rel[SynRel::Agent.index()].clone();
        let expers = cx.g[peer].rel[SynRel::Exper.index()].clone();
        cx.g[e].rel[SynRel::Agent.index()].extend(agents);
        cx.g[e].rel[SynRel::Exper.index()].extend(expers);
        if let Some(scope) = scope {
            if let Some(rel_ix) = cx.g[scope].rel_of(peer) {
                cx.g[scope].rel[rel_ix.index()].push(e);
            }
        }
        // the conjunction preceding e becomes its head
        if let Some(conj) = cx.g[e].prv {
            if cx.g[conj].check_sc(cx.lx, WordProps::CONJ) {
                cx.g.unset_scope(conj);
                let wrds = cx.g[conj].wrds.clone();
                cx.g[e].head.extend(wrds);
                cx.g.remove_node(conj);
            }
        }
        cx.g[e].nxt
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            if cx.g[n].sr == SynRel::Vconj {
                e = self.apply_rule(cx, n);
            } else {
                e = cx.g[n].nxt;
            }
        }
        Ok(())
    }
}
