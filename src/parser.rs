//! The parser context: the lexicon, the transform pipeline, and the walk
//! that turns source text into a forest of output nodes.
//!
//! Parsing a block runs in two phases. Reduction replaces short node
//! windows with single nodes so simple phrases parse as units; relation
//! transforms then establish scope and thematic-role edges. When every
//! transform has run, surviving sibling runs are tidied and the graph is
//! translated into `OutNode` trees.

use crate::defs::{Nid, SynRel, VerbProps, WordProps, NUM_RELS};
use crate::graph::ParseGraph;
use crate::lexer::{self, Block, SourceMap};
use crate::lexicon::Lexicon;
use crate::outnode::{form, kind, Loc, OutNode};
use crate::serializer::{Decoder, Encoder, RuleFileError};
use crate::xfrm::{ParseCx, Xfrm};

/// Version stamp of the parser rules (paired with the lexicon version in
/// the rule-file header).
pub const VERSION: &str = "1.0";

pub struct Parser {
    pub lx: Lexicon,
    pub xfrms: Vec<Xfrm>,
    pub version: String,
    /// Write per-transform graph dumps to the trace sink.
    pub trace: bool,
}

impl Parser {
    pub fn new(lx: Lexicon, xfrms: Vec<Xfrm>) -> Parser {
        Parser {
            lx,
            xfrms,
            version: VERSION.to_string(),
            trace: false,
        }
    }

    // ------------------------------------------------------------------
    // rule-file IO
    // ------------------------------------------------------------------

    /// Serialize the full rule set (lexicon + transforms).
    pub fn to_blob(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.str(&format!("{} {}", self.version, self.lx.version));
        self.lx.encode(&mut enc);
        for x in &self.xfrms {
            x.encode(&mut enc);
        }
        enc.finish()
    }

    /// Load a parser from a serialized rule set.
    pub fn from_blob(bytes: &[u8]) -> Result<Parser, RuleFileError> {
        let mut dec = Decoder::new(bytes);
        let header = dec.str()?;
        let (p_version, lx_version) = header.split_once(' ').ok_or_else(|| {
            RuleFileError::Malformed("missing version header".into())
        })?;
        let mut lx = Lexicon::decode(&mut dec)?;
        lx.version = lx_version.to_string();
        let mut xfrms = Vec::new();
        while !dec.at_end() {
            xfrms.push(Xfrm::decode(&mut dec)?);
        }
        Ok(Parser {
            lx,
            xfrms,
            version: p_version.to_string(),
            trace: false,
        })
    }

    pub fn to_file(&self, path: &std::path::Path) -> Result<(), RuleFileError> {
        std::fs::write(path, self.to_blob())?;
        Ok(())
    }

    pub fn from_file(path: &std::path::Path) -> Result<Parser, RuleFileError> {
        let bytes = std::fs::read(path)?;
        Parser::from_blob(&bytes)
    }

    /// Human-readable listing of every transform's rules.
    pub fn dump_rules(&self) -> String {
        let mut out = String::new();
        for x in &self.xfrms {
            out.push_str(&x.dump(&self.lx));
            out.push('\n');
        }
        out
    }

    // ------------------------------------------------------------------
    // parsing
    // ------------------------------------------------------------------

    /// Parse source text. `lno` is the line number at which the text
    /// starts, for location attributes when the text is an extract from a
    /// larger document. Always returns a (possibly partial) forest.
    pub fn parse_text(&mut self, src: &str, lno: u32) -> Vec<OutNode> {
        let src = src.replace('\r', "");
        let (sm, blks) = lexer::parse_blocks(&src, lno);
        self.parse_blk_lst(&sm, &blks)
    }

    fn parse_blk_lst(&mut self, sm: &SourceMap, blks: &[Block]) -> Vec<OutNode> {
        let mut nds = Vec::new();
        for blk in blks {
            if !blk.sub.is_empty() {
                // quoted or parenthesized text gets a container node
                let k = match blk.opener {
                    Some('"') | Some('\'') => kind::QUOTE,
                    _ => kind::PAREN,
                };
                let mut nd = OutNode::new(k, "", "");
                nd.subnodes = self.parse_blk_lst(sm, &blk.sub);
                nds.push(nd);
            } else {
                let (toks, locs) = lexer::lex(&mut self.lx, sm, blk);
                let mut g = ParseGraph::build(&self.lx, &toks, &locs);
                self.parse_graph(&mut g);
                let roots = g.root_nodes();
                nds.extend(build_out_nodes(&self.lx, &g, sm, &roots, ""));
            }
        }
        nds
    }

    /// Run the transform pipeline over one graph. Errors are contained at
    /// the per-transform boundary.
    fn parse_graph(&mut self, g: &mut ParseGraph) {
        let lx = &self.lx;
        let trace = self.trace;
        if trace {
            tracing::debug!(graph = %g.dump(lx), "initial graph");
        }
        for x in &mut self.xfrms {
            let mut cx = ParseCx { lx, g, trace };
            if let Err(err) = x.run(&mut cx) {
                tracing::debug!(xfrm = x.name(), %err, "transform abandoned");
            }
            if trace {
                tracing::debug!(xfrm = x.name(), graph = %g.dump(lx), "after transform");
            }
        }
        let mut roots = g.root_nodes();
        reduce_sr_clause(lx, g, &mut roots);
    }
}

/// Tidy a run of siblings that share a scope and relation: merge adjacent
/// prepositions, fold a leading preposition into the head of the word that
/// follows, and merge adjacent leaf words into phrases.
fn reduce_sr_clause(lx: &Lexicon, g: &mut ParseGraph, lst: &mut Vec<Nid>) {
    if lst.is_empty() {
        return;
    }
    // children first
    for &e in lst.iter() {
        for r in 0..NUM_RELS {
            let mut sub = std::mem::take(&mut g[e].rel[r]);
            reduce_sr_clause(lx, g, &mut sub);
            g[e].rel[r] = sub;
        }
    }
    let prep_mask = WordProps::PREP | WordProps::QUALPREP | WordProps::CLPREP;
    // merge sequences of prepositions
    let mut l1: Vec<Nid> = vec![lst[0]];
    for &e in &lst[1..] {
        let last = *l1.last().unwrap_or(&e);
        if g[last].check_sc(lx, prep_mask) && g[e].check_sc(lx, prep_mask) && g[e].is_leaf() {
            let wrds = g[e].wrds.clone();
            g[last].wrds.extend(wrds);
            g[last].e = g[e].e;
            g.remove_node(e);
            continue;
        }
        l1.push(e);
    }
    // rewrite to lst, merging word sequences
    lst.clear();
    let mut i = 0;
    while i < l1.len() {
        let e = l1[i];
        i += 1;
        if g[e].check_sc(lx, WordProps::PUNCT) {
            lst.push(e);
            continue;
        }
        // e starts a phrase (possibly just this word)
        let mut s = e;
        if g[s].check_sc(lx, prep_mask) {
            // bind the prep to the word that follows, if any
            if i < l1.len() && !g[l1[i]].check_sc(lx, WordProps::PUNCT) {
                let wrds = g[s].wrds.clone();
                g[l1[i]].head.extend(wrds);
                g.remove_node(s);
                s = l1[i];
                i += 1;
            }
        }
        // merge trailing leaves into a leaf phrase
        if g[s].is_leaf() {
            while i < l1.len() {
                let n = l1[i];
                if g[n].check_sc(lx, WordProps::PUNCT) || !g[n].is_leaf() {
                    break;
                }
                let wrds = g[n].wrds.clone();
                g[s].wrds.extend(wrds);
                g[s].e = g[n].e;
                g.remove_node(n);
                i += 1;
            }
        }
        lst.push(s);
    }
}

/// Subject terms of a verb: agent, topic, and experiencer children.
fn subject_terms(g: &ParseGraph, e: Nid) -> Vec<Nid> {
    let mut sub = Vec::new();
    sub.extend(&g[e].rel[SynRel::Agent.index()]);
    sub.extend(&g[e].rel[SynRel::Topic.index()]);
    sub.extend(&g[e].rel[SynRel::Exper.index()]);
    sub
}

/// The `form` attribute for an output node.
fn out_form(lx: &Lexicon, g: &ParseGraph, e: Nid) -> &'static str {
    if g[e].check_sc(lx, WordProps::PUNCT) {
        return "";
    }
    if g[e].is_verb(lx) {
        if g[e].check_vprop(VerbProps::ADJ) {
            // a verb adjunct that never found a main verb: "I wouldn't"
            return form::PHR;
        }
        let sub = subject_terms(g, e);
        if sub.is_empty() {
            if g[e].check_vprop(VerbProps::GERUND | VerbProps::INF | VerbProps::ROOT) {
                return form::ACTION;
            }
        } else if !g[e].rel[SynRel::VAdj.index()].is_empty() {
            // "did he go" is a query in general, but "where can you go"
            // reads as a verb clause
            if g[e].sr == SynRel::Modifies {
                return form::VERB_CLAUSE;
            }
            return form::QUERY_CLAUSE;
        } else if g[e].own_e < g[sub[0]].s && !g[e].check_vprop(VerbProps::PASSIVE) {
            // "is she here", "have you the time?"
            return form::QUERY_CLAUSE;
        }
        return form::VERB_CLAUSE;
    }
    if g[e].wrds.len() == 1 {
        let w = g[e].wrd(0);
        if lx.check_prop(w, WordProps::QUERY) {
            return form::QUERY;
        }
        if lx.check_prop(w, WordProps::N) {
            return form::N;
        }
        if lx.check_prop(w, WordProps::CONJ) {
            return form::CONJ_WRD;
        }
        if lx.check_prop(w, WordProps::MOD) {
            return form::MOD;
        }
        return form::X;
    }
    // a phrase. Possessive?
    let poss = lx.find("'s");
    if !poss.is_none() && g[e].wrds.contains(&poss) {
        return form::N;
    }
    // compound modifier: "very happy", "sad and miserable"
    if g[e]
        .wrds
        .iter()
        .all(|&w| lx.check_prop(w, WordProps::MOD | WordProps::CONJ))
    {
        return form::MOD;
    }
    let w0 = g[e].wrd(0);
    if lx.check_prop(w0, WordProps::QUERY) {
        return form::QUERY;
    }
    if lx.check_prop(w0, WordProps::DETS | WordProps::DETW) {
        return form::N;
    }
    form::PHR
}

/// The `kind` attribute for a top-level output node.
fn out_kind(lx: &Lexicon, g: &ParseGraph, e: Nid, form_v: &str) -> &'static str {
    if g[e].check_sc(lx, WordProps::PUNCT) {
        return kind::PUNCT;
    }
    if form_v == form::QUERY_CLAUSE || form_v == form::QUERY {
        return kind::QUERY;
    }
    if g[e].is_verb(lx) {
        let sub = subject_terms(g, e);
        if !sub.is_empty() {
            if g[sub[0]].check_sc(lx, WordProps::QUERY) {
                return kind::QUERY;
            }
            let vadj = &g[e].rel[SynRel::VAdj.index()];
            if let Some(&adj) = vadj.first() {
                if g[adj].test_vroot(lx, &["let"]) {
                    return kind::IMPER;
                }
            }
            if !g[e].check_vprop(VerbProps::GERUND | VerbProps::ADJ) {
                return kind::ASSERT;
            }
        } else if g[e].check_vprop(VerbProps::ROOT) {
            return kind::IMPER;
        } else if g[e].check_vprop(VerbProps::PASSIVE)
            && !g[e].rel[SynRel::Theme.index()].is_empty()
        {
            return kind::ASSERT;
        }
    }
    kind::PHR
}

/// Relations emitted as child nodes, with their output labels. The
/// computational relations (vconj, vAdj, undef) stay internal.
const OUT_RELS: [(SynRel, &str); 7] = [
    (SynRel::Agent, "agent"),
    (SynRel::Topic, "topic"),
    (SynRel::Exper, "exper"),
    (SynRel::Theme, "theme"),
    (SynRel::AuxTheme, "auxTheme"),
    (SynRel::Modifies, "modifies"),
    (SynRel::IsQby, "qual"),
];

/// Translate graph nodes into output nodes.
fn build_out_nodes(
    lx: &Lexicon,
    g: &ParseGraph,
    sm: &SourceMap,
    lst: &[Nid],
    rel_to_parent: &str,
) -> Vec<OutNode> {
    let mut nds = Vec::new();
    for &e in lst {
        let form_v = out_form(lx, g, e);
        let kind_v = if rel_to_parent.is_empty() {
            out_kind(lx, g, e, form_v).to_string()
        } else {
            rel_to_parent.to_string()
        };
        let text = if g[e].is_verb(lx) {
            sm.text(g[e].s, g[e].e)
        } else {
            lx.spell_words(&g[e].wrds)
        };
        let mut nd = OutNode::new(kind_v, form_v, text);
        for (rel, label) in OUT_RELS {
            let children = &g[e].rel[rel.index()];
            if !children.is_empty() {
                nd.subnodes
                    .extend(build_out_nodes(lx, g, sm, children, label));
            }
        }
        if !g[e].head.is_empty() {
            nd.head = lx.spell_words(&g[e].head);
        }
        if !g[e].verbs.is_empty() {
            nd.vroots = lx.spell_words(&g[e].verbs);
        }
        if !g[e].vqual.is_empty() {
            nd.vqual = lx.spell_words(&g[e].vqual);
        }
        if !g[e].vprops.is_empty() && form_v != form::ACTION {
            let mask = VerbProps::TENSE_MASK | VerbProps::NEG | VerbProps::PERFECT;
            nd.vprops = (g[e].vprops & mask).dump(" ");
        }
        nd.loc = Some(Loc {
            line_s: sm.line_at(g[e].s),
            col_s: sm.col_at(g[e].s),
            line_e: sm.line_at(g[e].e),
            col_e: sm.col_at(g[e].e),
        });
        nds.push(nd);
    }
    nds
}
