//! Reduction transforms. Several passes over the graph replace short node
//! windows with single parent nodes, so "the girl" and "didn't go" become
//! parse units. A rule maps a syntax-class sequence to a value
//! (offS, offE, vprops, sc, action); `offS`/`offE` trim the matched window
//! before the action applies.

use crate::defs::{Nid, ParseErr, ScKey, VerbProps};
use crate::graph::ParseGraph;
use crate::lexicon::Lexicon;
use crate::seqmap::SeqMap;
use crate::serializer::{Decoder, Encoder, RuleFileError, Width};
use crate::xfrm::ParseCx;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    None,
    /// Remove the window from the graph and replace it with a new node.
    Reduce,
    /// OR verb props onto each node of the window.
    SetProps,
}

impl Action {
    fn from_u8(v: u8) -> Action {
        match v {
            1 => Action::Reduce,
            2 => Action::SetProps,
            _ => Action::None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Action::None => 0,
            Action::Reduce => 1,
            Action::SetProps => 2,
        }
    }
}

/// Can this verb contribute a qualifier to a complex verb phrase?
/// Auxiliaries do not.
fn is_vqual(g: &ParseGraph, lx: &Lexicon, e: Option<Nid>) -> bool {
    match e {
        Some(e) => g[e].is_verb(lx) && !g[e].test_vroot(lx, &["be", "have", "do", "will", "shall"]),
        None => false,
    }
}

/// Reduce the window S..E. Non-verb reductions go straight to the graph;
/// verb reductions compute the composite verb node: negation detection,
/// tense from the first verb, semantic bits from the last, qualifier
/// collection, and the derived syntax class.
pub fn reduce_terms(
    cx: &mut ParseCx,
    s: Nid,
    e: Nid,
    mut vprops: VerbProps,
    sc: ScKey,
) -> Nid {
    if !cx.lx.is_sc_for_verb(sc) {
        return cx.g.reduce_terms(cx.lx, s, e, vprops, sc);
    }
    // collect the verb terms of the window; catch negations on the way
    let mut terms: Vec<Nid> = Vec::new();
    let mut cur = Some(s);
    while let Some(c) = cur {
        if let Some(&w0) = cx.g[c].wrds.first() {
            let sp = cx.lx.spelling(w0).to_lowercase();
            if sp == "not" || sp == "never" {
                vprops |= VerbProps::NEG;
            }
        }
        if cx.g[c].is_verb(cx.lx) {
            terms.push(c);
        }
        if c == e {
            break;
        }
        cur = cx.g[c].nxt;
    }
    let (v_s, v_e) = match (terms.first(), terms.last()) {
        (Some(&a), Some(&b)) => (a, b),
        _ => return cx.g.reduce_terms(cx.lx, s, e, vprops, sc),
    };
    // tense from the first term, semantic props from the last
    vprops |= cx.g[v_s].vprops & VerbProps::TENSE_MASK;
    vprops |= cx.g[v_e].vprops & VerbProps::SEMANTIC_MASK;
    if vprops.intersects(VerbProps::ATOMIC) {
        let mask = VerbProps::GERUND | VerbProps::ROOT | VerbProps::SEMANTIC_MASK;
        vprops |= cx.g[v_s].vprops & mask;
    }
    // a leading subject pronoun pins the subject
    if let Some(left) = cx.g[s].prv {
        if let Some(&w0) = cx.g[left].wrds.first() {
            let sp = cx.lx.spelling(w0).to_lowercase();
            if matches!(sp.as_str(), "i" | "we" | "he" | "she" | "they") {
                vprops |= VerbProps::IMMUTABLE_SUB;
            }
        }
    }
    // derive the syntax class from props and the main verb
    let sc_sp = if vprops.intersects(VerbProps::INF) {
        "Inf"
    } else if vprops.intersects(VerbProps::GERUND) {
        "Ger"
    } else if vprops.intersects(VerbProps::PASSIVE) {
        "Pas"
    } else if cx.g[v_e].test_vroot(cx.lx, &["be"]) {
        "be"
    } else {
        "V"
    };
    let sc = cx.lx.sc_key(sc_sp);
    let r = cx.g.reduce_terms(cx.lx, s, e, vprops, sc);
    // the last term carries the root verb(s)
    let roots = cx.g[v_e].verbs.clone();
    cx.g[r].verbs = roots;
    // "have gone" is purely syntactic; "might go" is a qualified verb form
    // and the qualifier is kept
    for &t in &terms {
        let vq = cx.g[t].vqual.clone();
        cx.g[r].vqual.extend(vq);
        if t != v_e && is_vqual(cx.g, cx.lx, Some(t)) {
            if let Some(&head_verb) = cx.g[t].verbs.first() {
                cx.g[r].vqual.push(head_verb);
            }
        }
    }
    // "[was beginning][to understand]": fold a verb-phrase prelude on the
    // left into the reduction
    if let Some(left) = cx.g[r].prv {
        if cx.g[left].is_verb(cx.lx)
            && cx.g[left].test_verb_form(cx.lx, crate::defs::WordProps::VPQ)
        {
            let sem = cx.g[r].vprops & VerbProps::SEMANTIC_MASK;
            let v_sc = cx.lx.sc_key("V");
            return reduce_terms(cx, left, r, sem, v_sc);
        }
    }
    r
}

pub struct ReductXfrm {
    pub name: String,
    pub rules: SeqMap,
    pub off_s: Vec<u8>,
    pub off_e: Vec<u8>,
    pub props: Vec<VerbProps>,
    pub sc: Vec<ScKey>,
    pub act: Vec<Action>,
}

impl ReductXfrm {
    pub fn new(name: impl Into<String>) -> ReductXfrm {
        ReductXfrm {
            name: name.into(),
            rules: SeqMap::new(),
            off_s: Vec::new(),
            off_e: Vec::new(),
            props: Vec::new(),
            sc: Vec::new(),
            act: Vec::new(),
        }
    }

    /// Register a rule value; returns its value index for `rules`.
    pub fn push_value(
        &mut self,
        off_s: u8,
        off_e: u8,
        props: VerbProps,
        sc: ScKey,
        act: Action,
    ) -> u16 {
        self.off_s.push(off_s);
        self.off_e.push(off_e);
        self.props.push(props);
        self.sc.push(sc);
        self.act.push(act);
        (self.off_s.len() - 1) as u16
    }

    fn find_rule(&self, cx: &ParseCx, e: Nid) -> Option<(Vec<Nid>, u16)> {
        self.rules.matches_at(cx.g, e, true).pop()
    }

    fn apply_rule(
        &self,
        cx: &mut ParseCx,
        rule: (Vec<Nid>, u16),
    ) -> Result<Option<Nid>, ParseErr> {
        let (seq, vix) = rule;
        let vix = vix as usize;
        let last = *seq.last().ok_or_else(|| ParseErr::new("empty rule match"))?;
        let mut s = seq[0];
        let mut e = last;
        for _ in 0..self.off_s[vix] {
            s = cx.g[s]
                .nxt
                .ok_or_else(|| ParseErr::new("reduction offset past window"))?;
        }
        for _ in 0..self.off_e[vix] {
            e = cx.g[e]
                .prv
                .ok_or_else(|| ParseErr::new("reduction offset past window"))?;
        }
        match self.act[vix] {
            Action::Reduce => {
                let r = reduce_terms(cx, s, e, self.props[vix], self.sc[vix]);
                Ok(cx.g[r].nxt)
            }
            Action::SetProps => {
                let mut cur = Some(s);
                while let Some(c) = cur {
                    cx.g[c].set_vprop(self.props[vix]);
                    if c == e {
                        break;
                    }
                    cur = cx.g[c].nxt;
                }
                Ok(cx.g[last].nxt)
            }
            Action::None => Err(ParseErr::new("reduction rule with no action")),
        }
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            match self.find_rule(cx, n) {
                Some(rule) => {
                    if cx.trace {
                        tracing::trace!(
                            xfrm = %self.name,
                            window = %cx.lx.sc_seq_to_str(
                                &rule.0.iter().map(|&x| cx.g[x].sc.index() as u16).collect::<Vec<_>>()
                            ),
                            "reduce"
                        );
                    }
                    e = self.apply_rule(cx, rule)?;
                }
                None => e = cx.g[n].nxt,
            }
        }
        Ok(())
    }

    fn value_to_str(&self, lx: &Lexicon, i: usize) -> String {
        let mut l = Vec::new();
        if self.off_s[i] != 0 {
            l.push(format!("offS: {}", self.off_s[i]));
        }
        if self.off_e[i] != 0 {
            l.push(format!("offE: {}", self.off_e[i]));
        }
        if !self.props[i].is_empty() {
            l.push(format!("props: {}", self.props[i].dump("|")));
        }
        if self.sc[i] != ScKey::NONE {
            l.push(format!("sc: {}", lx.sc_spelling(self.sc[i])));
        }
        l.push(format!("act: {}", self.act[i].as_u8()));
        l.join(" ")
    }

    pub fn dump(&self, lx: &Lexicon) -> String {
        let mut out = format!("Xfrm \"{}\"\n", self.name);
        out.push_str(&self.rules.dump(&|c| lx.sc_dict.spelling(c as u32).to_string()));
        for i in 0..self.off_s.len() {
            out.push_str(&format!("{}. {}\n", i, self.value_to_str(lx, i)));
        }
        out
    }

    pub fn encode_values(&self, enc: &mut Encoder) {
        self.rules.encode(enc);
        let as32 = |v: &[u8]| v.iter().map(|&x| x as u32).collect::<Vec<_>>();
        enc.int_lst(&as32(&self.off_s), Width::W8);
        enc.int_lst(&as32(&self.off_e), Width::W8);
        let props: Vec<u32> = self.props.iter().map(|p| p.0).collect();
        enc.int_lst(&props, Width::W32);
        let scs: Vec<u32> = self.sc.iter().map(|s| s.0).collect();
        enc.int_lst(&scs, Width::W8);
        let acts: Vec<u32> = self.act.iter().map(|a| a.as_u8() as u32).collect();
        enc.int_lst(&acts, Width::W8);
    }

    pub fn decode_values(name: String, dec: &mut Decoder) -> Result<ReductXfrm, RuleFileError> {
        let rules = SeqMap::decode(dec)?;
        let off_s: Vec<u8> = dec.int_lst(Width::W8)?.iter().map(|&x| x as u8).collect();
        let off_e: Vec<u8> = dec.int_lst(Width::W8)?.iter().map(|&x| x as u8).collect();
        let props: Vec<VerbProps> = dec.int_lst(Width::W32)?.into_iter().map(VerbProps).collect();
        let sc: Vec<ScKey> = dec.int_lst(Width::W8)?.into_iter().map(ScKey).collect();
        let act: Vec<Action> = dec
            .int_lst(Width::W8)?
            .iter()
            .map(|&x| Action::from_u8(x as u8))
            .collect();
        if off_s.len() != off_e.len()
            || off_s.len() != props.len()
            || off_s.len() != sc.len()
            || off_s.len() != act.len()
        {
            return Err(RuleFileError::Malformed(
                "reduction value tables out of step".into(),
            ));
        }
        Ok(ReductXfrm {
            name,
            rules,
            off_s,
            off_e,
            props,
            sc,
            act,
        })
    }
}
