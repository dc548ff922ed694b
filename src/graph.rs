//! The parse graph: a doubly linked list of `Pn` nodes, one per token at
//! first, rewritten in place by the transforms. Scope edges and relation
//! buckets are layered on top of the linear order.
//!
//! Nodes live in an index arena owned by the graph; every edge (`prv`,
//! `nxt`, `scope`, `rel`, `sublst`, the verb-domain chain) is a `Nid` into
//! that arena, which keeps the cyclic shape of the structure trivial to
//! express and lets reductions move nodes without reallocation.

use crate::defs::{Key, Nid, ParseErr, ScKey, SynRel, VerbProps, WordProps, NUM_RELS};
use crate::lexicon::Lexicon;

/// A parse node: a punctuation mark, a word, or a reduced phrase.
pub struct Pn {
    /// Source span (inclusive char indices). Verb spans widen during span
    /// validation to cover their scope descendants.
    pub s: usize,
    pub e: usize,
    /// Span of the node's own words, fixed at creation/reduction.
    pub own_s: usize,
    pub own_e: usize,
    /// Children consumed by the reduction that produced this node.
    pub sublst: Vec<Nid>,
    /// Scope parent.
    pub scope: Option<Nid>,
    /// Qualifier verbs inside a complex verb phrase ("might go").
    pub vqual: Vec<Key>,
    pub vprops: VerbProps,
    /// Syntax class.
    pub sc: ScKey,
    /// Relation to the scope parent.
    pub sr: SynRel,
    /// The word keys this node covers.
    pub wrds: Vec<Key>,
    /// Root-verb keys; non-empty iff this is a verb node.
    pub verbs: Vec<Key>,
    /// Words that precede and attach to the node (a bound preposition).
    pub head: Vec<Key>,
    /// Relation buckets, indexed by `SynRel`.
    pub rel: [Vec<Nid>; NUM_RELS],
    // linear order
    pub prv: Option<Nid>,
    pub nxt: Option<Nid>,
    // secondary chain used by the verb-domain resolver
    pub vprv: Option<Nid>,
    pub vnxt: Option<Nid>,
    /// Nearest preceding verb at resolver entry; invariant afterwards.
    pub vd_left: Option<Nid>,
}

impl Pn {
    fn empty(s: usize, e: usize) -> Pn {
        Pn {
            s,
            e,
            own_s: s,
            own_e: e,
            sublst: Vec::new(),
            scope: None,
            vqual: Vec::new(),
            vprops: VerbProps::NONE,
            sc: ScKey::NONE,
            sr: SynRel::Undef,
            wrds: Vec::new(),
            verbs: Vec::new(),
            head: Vec::new(),
            rel: Default::default(),
            prv: None,
            nxt: None,
            vprv: None,
            vnxt: None,
            vd_left: None,
        }
    }

    pub fn is_verb(&self, lx: &Lexicon) -> bool {
        lx.is_sc_for_verb(self.sc)
    }

    pub fn is_leaf(&self) -> bool {
        self.rel.iter().all(|l| l.is_empty())
    }

    pub fn wrd(&self, i: usize) -> Key {
        self.wrds[i]
    }

    /// Does the node's first word (by its root form) match one of the
    /// given spellings?
    pub fn test_wrd(&self, lx: &Lexicon, sps: &[&str]) -> bool {
        if let Some(&w0) = self.wrds.first() {
            let def = lx.def(w0);
            let sp_def = lx.spelling(def);
            return sps.iter().any(|&sp| sp == sp_def);
        }
        false
    }

    pub fn set_vprop(&mut self, p: VerbProps) {
        self.vprops |= p;
    }

    pub fn check_vprop(&self, m: VerbProps) -> bool {
        self.vprops.intersects(m)
    }

    pub fn check_wrd_prop(&self, lx: &Lexicon, m: WordProps) -> bool {
        self.wrds
            .first()
            .map(|&w| lx.check_prop(w, m))
            .unwrap_or(false)
    }

    pub fn vroot(&self) -> Key {
        self.verbs.first().copied().unwrap_or(Key::NONE)
    }

    /// Test the verb root against one or more spellings.
    pub fn test_vroot(&self, lx: &Lexicon, sps: &[&str]) -> bool {
        if let Some(&root) = self.verbs.first() {
            let sp_root = lx.spelling(root);
            return sps.iter().any(|&sp| sp == sp_root);
        }
        false
    }

    /// Test the thematic form of the verb root (AVGT/AVE/EVT/VPQ bits).
    pub fn test_verb_form(&self, lx: &Lexicon, form: WordProps) -> bool {
        self.verbs
            .first()
            .map(|&v| lx.check_prop(v, form))
            .unwrap_or(false)
    }

    pub fn check_sc(&self, lx: &Lexicon, m: WordProps) -> bool {
        lx.check_sc_prop(self.sc, m)
    }

    /// The relation index under which `e` sits in this node's buckets.
    pub fn rel_of(&self, e: Nid) -> Option<SynRel> {
        for r in SynRel::ALL {
            if self.rel[r.index()].contains(&e) {
                return Some(r);
            }
        }
        None
    }
}

/// Restore record for `reset_span`.
pub struct SpanRestore {
    s: Nid,
    e: Nid,
    s_prv: Option<Nid>,
    e_nxt: Option<Nid>,
    head: Option<Nid>,
    tail: Option<Nid>,
}

/// The graph: an arena of nodes plus the endpoints of the linear list.
pub struct ParseGraph {
    nodes: Vec<Pn>,
    pub head: Option<Nid>,
    pub tail: Option<Nid>,
}

impl std::ops::Index<Nid> for ParseGraph {
    type Output = Pn;
    fn index(&self, n: Nid) -> &Pn {
        &self.nodes[n.index()]
    }
}

impl std::ops::IndexMut<Nid> for ParseGraph {
    fn index_mut(&mut self, n: Nid) -> &mut Pn {
        &mut self.nodes[n.index()]
    }
}

impl ParseGraph {
    pub fn new() -> ParseGraph {
        ParseGraph {
            nodes: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, pn: Pn) -> Nid {
        let id = Nid(self.nodes.len() as u32);
        self.nodes.push(pn);
        id
    }

    /// Syntax class for a token: commas and punctuation get their fixed
    /// classes, words use their lexicon assignment.
    fn token_syn_class(lx: &Lexicon, tok: Key) -> ScKey {
        let sp = lx.spelling(tok);
        let c = sp.chars().next().unwrap_or(' ');
        if c == ',' {
            return lx.sc_key("Comma");
        }
        if !(c.is_alphanumeric() || c == '_' || c == '\'') {
            return lx.sc_key("Punct");
        }
        lx.syn_class_of(tok)
    }

    /// Verb props for a verb token, derived from its word props and root.
    fn token_verb_props(lx: &Lexicon, tok: Key) -> VerbProps {
        let mut p = VerbProps::NONE;
        if lx.check_prop(tok, WordProps::ROOT) {
            p |= VerbProps::ROOT;
        } else if lx.check_prop(tok, WordProps::VNEG_CONTRACTION) {
            p |= VerbProps::NEG;
        }
        if lx.check_prop(tok, WordProps::PAST | WordProps::PARTICIPLE) {
            p |= VerbProps::PAST;
        } else {
            p |= VerbProps::PRESENT;
        }
        if lx.check_prop(tok, WordProps::GERUND) {
            p |= VerbProps::GERUND;
        }
        if lx.check_prop(tok, WordProps::VADJ) {
            p |= VerbProps::ADJ;
        }
        let def = lx.def(tok);
        if lx.check_prop(def, WordProps::VPQ) {
            p |= VerbProps::PRELUDE;
        }
        p
    }

    /// Append a node for one token.
    pub fn push_token(&mut self, lx: &Lexicon, tok: Key, s: usize, e: usize) -> Nid {
        let mut pn = Pn::empty(s, e);
        pn.wrds.push(tok);
        pn.sc = Self::token_syn_class(lx, tok);
        if lx.is_sc_for_verb(pn.sc) {
            pn.verbs.push(lx.def(tok));
            pn.vprops = Self::token_verb_props(lx, tok);
        }
        let id = self.alloc(pn);
        match self.tail {
            None => {
                self.head = Some(id);
                self.tail = Some(id);
            }
            Some(t) => {
                self.connect(Some(t), Some(id));
                self.tail = Some(id);
            }
        }
        id
    }

    /// Build a graph for a token sequence produced by the lexer.
    pub fn build(lx: &Lexicon, toks: &[Key], tok_loc: &[usize]) -> ParseGraph {
        let mut g = ParseGraph::new();
        for (i, &tok) in toks.iter().enumerate() {
            let s = tok_loc[i];
            let len = lx.spelling(tok).chars().count();
            g.push_token(lx, tok, s, s + len.saturating_sub(1));
        }
        g
    }

    pub fn connect(&mut self, lhs: Option<Nid>, rhs: Option<Nid>) {
        if let Some(l) = lhs {
            self[l].nxt = rhs;
        }
        if let Some(r) = rhs {
            self[r].prv = lhs;
        }
    }

    /// Remove a node from the linear list.
    pub fn remove_node(&mut self, e: Nid) {
        if self.head == Some(e) && self.tail == Some(e) {
            self.head = None;
            self.tail = None;
        } else if self.head == Some(e) {
            self.head = self[e].nxt;
        } else if self.tail == Some(e) {
            self.tail = self[e].prv;
        }
        let (p, n) = (self[e].prv, self[e].nxt);
        self.connect(p, n);
    }

    /// Clear any scope relation for `n`, removing it from its old parent's
    /// bucket.
    pub fn unset_scope(&mut self, n: Nid) {
        if let Some(parent) = self[n].scope {
            for r in 0..NUM_RELS {
                let bucket = &mut self[parent].rel[r];
                if let Some(ix) = bucket.iter().position(|&x| x == n) {
                    bucket.remove(ix);
                    break;
                }
            }
        }
        self[n].scope = None;
        self[n].sr = SynRel::Undef;
    }

    /// Set the scope edge `n -> parent` with relation `r`, keeping the
    /// parent's bucket sorted by source start. Any previous scope of `n`
    /// is erased first.
    pub fn set_scope(&mut self, n: Nid, parent: Nid, r: SynRel) {
        assert!(n != parent, "a node cannot be its own scope");
        self.unset_scope(n);
        let n_s = self[n].s;
        let members = self[parent].rel[r.index()].clone();
        let mut insert_at = members.len();
        for (i, &m) in members.iter().enumerate() {
            if n_s <= self[m].s {
                insert_at = i;
                break;
            }
        }
        self[parent].rel[r.index()].insert(insert_at, n);
        self[n].scope = Some(parent);
        self[n].sr = r;
    }

    /// Move one relation bucket to another label, relabeling the members.
    pub fn reset_rel(&mut self, v: Nid, old: SynRel, new: SynRel) {
        let moved = std::mem::take(&mut self[v].rel[old.index()]);
        for &t in &moved {
            self[t].sr = new;
        }
        self[v].rel[new.index()] = moved;
    }

    /// Replace nodes S..E with a single node whose sublist owns them.
    /// Words (and for verb reductions, verbs) concatenate from the window.
    pub fn reduce_terms(
        &mut self,
        lx: &Lexicon,
        s: Nid,
        e: Nid,
        vprops: VerbProps,
        sc: ScKey,
    ) -> Nid {
        let r = self.alloc(Pn::empty(self[s].s, self[e].e));
        self[r].vprops = vprops;
        self[r].sc = sc;
        let mut cur = Some(s);
        while let Some(c) = cur {
            self[r].sublst.push(c);
            let wrds = self[c].wrds.clone();
            let verbs = self[c].verbs.clone();
            self[r].wrds.extend(wrds);
            self[r].verbs.extend(verbs);
            if c == e {
                break;
            }
            cur = self[c].nxt;
        }
        if !lx.is_sc_for_verb(sc) {
            self[r].verbs.clear();
        }
        let left = self[s].prv;
        let right = self[e].nxt;
        self.connect(left, Some(r));
        self.connect(Some(r), right);
        if self[r].prv.is_none() {
            self.head = Some(r);
        }
        if self[r].nxt.is_none() {
            self.tail = Some(r);
        }
        r
    }

    /// Narrow the graph to the sub-range S..E, returning restore info.
    pub fn reset_span(&mut self, s: Nid, e: Nid) -> SpanRestore {
        let rinfo = SpanRestore {
            s,
            e,
            s_prv: self[s].prv,
            e_nxt: self[e].nxt,
            head: self.head,
            tail: self.tail,
        };
        self.head = Some(s);
        self.tail = Some(e);
        self[s].prv = None;
        self[e].nxt = None;
        rinfo
    }

    pub fn restore_span(&mut self, rinfo: SpanRestore) {
        self[rinfo.s].prv = rinfo.s_prv;
        self[rinfo.e].nxt = rinfo.e_nxt;
        self.head = rinfo.head;
        self.tail = rinfo.tail;
    }

    /// All nodes in the linear list with no scope parent.
    pub fn root_nodes(&self) -> Vec<Nid> {
        let mut roots = Vec::new();
        let mut cur = self.head;
        while let Some(c) = cur {
            if self[c].scope.is_none() {
                roots.push(c);
            }
            cur = self[c].nxt;
        }
        roots
    }

    /// Iterate the linear list from the head.
    pub fn iter_list(&self) -> ListIter<'_> {
        ListIter {
            g: self,
            cur: self.head,
        }
    }

    /// Rebuild every relation bucket from the `scope` + `sr` attributes.
    pub fn validate_relations(&mut self) {
        let all: Vec<Nid> = self.iter_list().collect();
        for &e in &all {
            for r in 0..NUM_RELS {
                self[e].rel[r].clear();
            }
        }
        for &e in &all {
            if let Some(parent) = self[e].scope {
                let sr = self[e].sr;
                self[parent].rel[sr.index()].push(e);
            }
        }
    }

    /// Widen each ancestor verb's span to cover each descendant's span.
    pub fn validate_spans(&mut self, lx: &Lexicon) {
        let all: Vec<Nid> = self.iter_list().collect();
        for &e in &all {
            let (e_s, e_e) = (self[e].s, self[e].e);
            let mut anc = self[e].scope;
            while let Some(a) = anc {
                if self[a].is_verb(lx) {
                    if e_s < self[a].s {
                        self[a].s = e_s;
                    }
                    if e_e > self[a].e {
                        self[a].e = e_e;
                    }
                }
                anc = self[a].scope;
            }
        }
    }

    /// No node may be its own scope ancestor.
    pub fn check_acyclic(&self) -> Result<(), ParseErr> {
        for (i, _) in self.nodes.iter().enumerate() {
            let start = Nid(i as u32);
            let mut anc = self[start].scope;
            let mut steps = 0;
            while let Some(a) = anc {
                if a == start || steps > self.nodes.len() {
                    return Err(ParseErr::new("scope cycle"));
                }
                anc = self[a].scope;
                steps += 1;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // trace output
    // ------------------------------------------------------------------

    fn dump_node(&self, lx: &Lexicon, e: Nid) -> String {
        let pn = &self[e];
        let mut tmp = vec![format!("{}. [{}.{}]", e.0, pn.s, pn.e)];
        if !pn.wrds.is_empty() {
            tmp.push(format!("\"{}\"", lx.spell_words(&pn.wrds)));
        }
        if !pn.head.is_empty() {
            tmp.push(format!("head: \"{}\"", lx.spell_words(&pn.head)));
        }
        if !pn.vprops.is_empty() {
            tmp.push(format!("VP:{}", pn.vprops.dump("|")));
        }
        tmp.push(format!("sc:{}", lx.sc_spelling(pn.sc)));
        tmp.push(format!("sr:{}", pn.sr.label()));
        if let Some(scp) = pn.scope {
            tmp.push(format!("Scp:{}", scp.0));
        }
        for r in SynRel::ALL {
            let members = &pn.rel[r.index()];
            if !members.is_empty() {
                let ids: Vec<String> = members.iter().map(|m| m.0.to_string()).collect();
                tmp.push(format!("{}:{}", r.label(), ids.join(",")));
            }
        }
        tmp.join(" ")
    }

    /// One line per node of the linear list, for the trace sink.
    pub fn dump(&self, lx: &Lexicon) -> String {
        let mut lines = Vec::new();
        for e in self.iter_list() {
            lines.push(self.dump_node(lx, e));
        }
        lines.join("\n")
    }
}

impl Default for ParseGraph {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ListIter<'a> {
    g: &'a ParseGraph,
    cur: Option<Nid>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = Nid;
    fn next(&mut self) -> Option<Nid> {
        let c = self.cur?;
        self.cur = self.g[c].nxt;
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_with_classes() -> Lexicon {
        let mut lx = Lexicon::new();
        for sc in ["X", "V", "Comma", "Punct"] {
            lx.sc_dict.lookup(sc, true);
        }
        let v = lx.sc_dict.find("V");
        lx.sc_dict.set_prop(v, WordProps::VERB);
        lx
    }

    fn word(lx: &mut Lexicon, sp: &str) -> Key {
        let k = lx.define(sp, WordProps::NONE, Key::NONE);
        let sc = lx.sc_key("X");
        lx.set_syn_class(k, sc);
        k
    }

    fn verb(lx: &mut Lexicon, sp: &str) -> Key {
        let k = lx.define(
            sp,
            WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
            Key::NONE,
        );
        let sc = lx.sc_key("V");
        lx.set_syn_class(k, sc);
        k
    }

    fn build_graph(lx: &Lexicon, toks: &[Key]) -> ParseGraph {
        let locs: Vec<usize> = (0..toks.len()).map(|i| i * 10).collect();
        ParseGraph::build(lx, toks, &locs)
    }

    #[test]
    fn build_links_nodes_in_order() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let b = word(&mut lx, "b");
        let g = build_graph(&lx, &[a, b]);
        let ids: Vec<Nid> = g.iter_list().collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(g[ids[0]].nxt, Some(ids[1]));
        assert_eq!(g[ids[1]].prv, Some(ids[0]));
        assert_eq!(g.head, Some(ids[0]));
        assert_eq!(g.tail, Some(ids[1]));
    }

    #[test]
    fn verb_tokens_get_roots_and_props() {
        let mut lx = lex_with_classes();
        let go = verb(&mut lx, "go");
        let g = build_graph(&lx, &[go]);
        let n = g.head.unwrap();
        assert_eq!(g[n].verbs, vec![go]);
        assert!(g[n].check_vprop(VerbProps::ROOT));
        assert!(g[n].check_vprop(VerbProps::PRESENT));
    }

    #[test]
    fn punctuation_gets_punct_class() {
        let mut lx = lex_with_classes();
        let dot = lx.define(".", WordProps::NONE, Key::NONE);
        let comma = lx.define(",", WordProps::NONE, Key::NONE);
        let g = build_graph(&lx, &[dot, comma]);
        let ids: Vec<Nid> = g.iter_list().collect();
        assert_eq!(g[ids[0]].sc, lx.sc_key("Punct"));
        assert_eq!(g[ids[1]].sc, lx.sc_key("Comma"));
    }

    #[test]
    fn set_scope_keeps_buckets_sorted_by_start() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let b = word(&mut lx, "b");
        let v = verb(&mut lx, "v");
        let mut g = build_graph(&lx, &[a, b, v]);
        let ids: Vec<Nid> = g.iter_list().collect();
        // insert in reverse source order; bucket must come out sorted
        g.set_scope(ids[1], ids[2], SynRel::Theme);
        g.set_scope(ids[0], ids[2], SynRel::Theme);
        let bucket = &g[ids[2]].rel[SynRel::Theme.index()];
        assert_eq!(bucket, &vec![ids[0], ids[1]]);
        assert_eq!(g[ids[0]].scope, Some(ids[2]));
        assert_eq!(g[ids[0]].sr, SynRel::Theme);
    }

    #[test]
    fn set_scope_erases_previous_relation() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let v1 = verb(&mut lx, "v1");
        let v2 = verb(&mut lx, "v2");
        let mut g = build_graph(&lx, &[a, v1, v2]);
        let ids: Vec<Nid> = g.iter_list().collect();
        g.set_scope(ids[0], ids[1], SynRel::Agent);
        g.set_scope(ids[0], ids[2], SynRel::Theme);
        assert!(g[ids[1]].rel[SynRel::Agent.index()].is_empty());
        assert_eq!(g[ids[2]].rel[SynRel::Theme.index()], vec![ids[0]]);
    }

    #[test]
    fn reduce_terms_concatenates_and_splices() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let b = word(&mut lx, "b");
        let c = word(&mut lx, "c");
        let mut g = build_graph(&lx, &[a, b, c]);
        let ids: Vec<Nid> = g.iter_list().collect();
        let sc_x = lx.sc_key("X");
        let r = g.reduce_terms(&lx, ids[0], ids[1], VerbProps::NONE, sc_x);
        assert_eq!(g[r].wrds, vec![a, b]);
        assert_eq!(g[r].sublst, vec![ids[0], ids[1]]);
        assert_eq!(g.head, Some(r));
        assert_eq!(g[r].nxt, Some(ids[2]));
        assert_eq!(g[ids[2]].prv, Some(r));
        // span covers the window
        assert_eq!(g[r].s, 0);
        assert_eq!(g[r].e, 10);
    }

    #[test]
    fn non_verb_reduction_clears_verbs() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let v = verb(&mut lx, "v");
        let mut g = build_graph(&lx, &[a, v]);
        let ids: Vec<Nid> = g.iter_list().collect();
        let sc_x = lx.sc_key("X");
        let r = g.reduce_terms(&lx, ids[0], ids[1], VerbProps::NONE, sc_x);
        assert!(g[r].verbs.is_empty());
        let sc_v = lx.sc_key("V");
        let mut g2 = build_graph(&lx, &[a, v]);
        let ids2: Vec<Nid> = g2.iter_list().collect();
        let r2 = g2.reduce_terms(&lx, ids2[0], ids2[1], VerbProps::NONE, sc_v);
        assert_eq!(g2[r2].verbs, vec![v]);
    }

    #[test]
    fn reset_and_restore_span() {
        let mut lx = lex_with_classes();
        let toks: Vec<Key> = ["a", "b", "c", "d"]
            .iter()
            .map(|s| word(&mut lx, s))
            .collect();
        let mut g = build_graph(&lx, &toks);
        let ids: Vec<Nid> = g.iter_list().collect();
        let rinfo = g.reset_span(ids[1], ids[2]);
        assert_eq!(g.head, Some(ids[1]));
        assert_eq!(g.tail, Some(ids[2]));
        let visible: Vec<Nid> = g.iter_list().collect();
        assert_eq!(visible, vec![ids[1], ids[2]]);
        g.restore_span(rinfo);
        let visible: Vec<Nid> = g.iter_list().collect();
        assert_eq!(visible, ids);
    }

    #[test]
    fn remove_node_relinks_neighbors() {
        let mut lx = lex_with_classes();
        let toks: Vec<Key> = ["a", "b", "c"].iter().map(|s| word(&mut lx, s)).collect();
        let mut g = build_graph(&lx, &toks);
        let ids: Vec<Nid> = g.iter_list().collect();
        g.remove_node(ids[1]);
        let visible: Vec<Nid> = g.iter_list().collect();
        assert_eq!(visible, vec![ids[0], ids[2]]);
        g.remove_node(ids[0]);
        assert_eq!(g.head, Some(ids[2]));
        g.remove_node(ids[2]);
        assert_eq!(g.head, None);
        assert_eq!(g.tail, None);
    }

    #[test]
    fn validate_relations_rebuilds_from_scope() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let v = verb(&mut lx, "v");
        let mut g = build_graph(&lx, &[a, v]);
        let ids: Vec<Nid> = g.iter_list().collect();
        g.set_scope(ids[0], ids[1], SynRel::Agent);
        // corrupt the bucket, then rebuild
        g[ids[1]].rel[SynRel::Agent.index()].clear();
        g.validate_relations();
        assert_eq!(g[ids[1]].rel[SynRel::Agent.index()], vec![ids[0]]);
        // idempotent
        g.validate_relations();
        assert_eq!(g[ids[1]].rel[SynRel::Agent.index()], vec![ids[0]]);
    }

    #[test]
    fn validate_spans_widens_ancestor_verbs() {
        let mut lx = lex_with_classes();
        let a = word(&mut lx, "a");
        let v = verb(&mut lx, "v");
        let b = word(&mut lx, "b");
        let mut g = build_graph(&lx, &[a, v, b]);
        let ids: Vec<Nid> = g.iter_list().collect();
        g.set_scope(ids[0], ids[1], SynRel::Agent);
        g.set_scope(ids[2], ids[1], SynRel::Theme);
        g.validate_spans(&lx);
        assert_eq!(g[ids[1]].s, 0);
        assert_eq!(g[ids[1]].e, g[ids[2]].e);
        // own span is untouched
        assert_eq!(g[ids[1]].own_s, 10);
        // idempotent
        let (s, e) = (g[ids[1]].s, g[ids[1]].e);
        g.validate_spans(&lx);
        assert_eq!((g[ids[1]].s, g[ids[1]].e), (s, e));
    }

    #[test]
    fn cycles_are_detected() {
        let mut lx = lex_with_classes();
        let a = verb(&mut lx, "a");
        let b = verb(&mut lx, "b");
        let mut g = build_graph(&lx, &[a, b]);
        let ids: Vec<Nid> = g.iter_list().collect();
        g.set_scope(ids[0], ids[1], SynRel::Theme);
        assert!(g.check_acyclic().is_ok());
        // force a cycle directly
        g[ids[1]].scope = Some(ids[0]);
        assert!(g.check_acyclic().is_err());
    }
}
