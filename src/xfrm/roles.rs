//! Thematic-role assignment. A rule is the triplet (vSpec, objSpec,
//! srInfo): `vSpec` is a verb-property mask of preconditions, `objSpec` a
//! pattern over the verb's current object list, and `srInfo` the relations
//! the rule establishes. srInfo[0] describes the verb itself, srInfo[1]
//! relabels the subject terms, and the rest pair off with the pattern's
//! top-level atoms. The meta-roles `sub` and `obj` resolve per verb form.

use crate::defs::{Nid, ParseErr, SynRel, VerbProps, WordProps, SR_NONE, SR_OBJ, SR_SUB};
use crate::graph::ParseGraph;
use crate::lexicon::Lexicon;
use crate::rematch::{ReSet, TermMatcher};
use crate::serializer::{Decoder, Encoder, RuleFileError, Width};
use crate::xfrm::ParseCx;

/// Pattern atoms over a verb's object list. Atoms like `objPrep` are
/// closures over the current verb.
struct ObjSrc<'a> {
    g: &'a ParseGraph,
    lx: &'a Lexicon,
    verb: Nid,
    src: &'a [Nid],
}

impl<'a> TermMatcher<Nid> for ObjSrc<'a> {
    fn match_term(&self, state: usize, re_term: &str) -> Option<Vec<Nid>> {
        let &term = self.src.get(state)?;
        let hit = |ok: bool| if ok { Some(vec![term]) } else { None };
        if re_term == "." {
            return Some(vec![term]);
        }
        if let Some(lit) = re_term.strip_prefix('_') {
            let w0 = self.g[term].wrds.first()?;
            return hit(self.lx.spelling(*w0) == lit);
        }
        match re_term {
            // anything except a prep
            "objTerm" => hit(!self.lx.check_sc_prop(self.g[term].sc, WordProps::PREP)),
            "objPronoun" => hit(self.g[term].test_wrd(
                self.lx,
                &["me", "you", "us", "him", "her", "them", "it"],
            )),
            "Prep" => hit(self.lx.check_sc_prop(self.g[term].sc, WordProps::PREP)),
            "qualPrep" => hit(self.lx.check_sc_prop(self.g[term].sc, WordProps::QUALPREP)),
            "Mod" => hit(self.lx.check_sc_prop(self.g[term].sc, WordProps::MOD)),
            // the object prep canonically associated with the verb
            "objPrep" => {
                let w0 = self.g[term].wrds.first()?;
                hit(self.lx.prep_verb_fitness(*w0, self.g[self.verb].vroot()) != -1)
            }
            // a noun or modifier
            "X" => hit(self.lx.sc_spelling(self.g[term].sc) == "X"),
            "V" => hit(self.g[term].is_verb(self.lx)),
            // a verb with a defined subject
            "SubVerb" => hit(!self.g[term].rel[SynRel::Agent.index()].is_empty()),
            // a verb phrase acting as topic in a "be" predicate:
            // "was the guy you saw angry"
            "vexprTopic" => {
                if !self.g[term].rel[SynRel::IsQby.index()].is_empty() {
                    return Some(vec![term]);
                }
                hit(self.g[term].check_vprop(VerbProps::INF | VerbProps::GERUND)
                    && self.g[term].rel[SynRel::Agent.index()].is_empty())
            }
            _ => None,
        }
    }
}

fn check_v_spec(vspec: VerbProps, m: VerbProps) -> bool {
    vspec.intersects(m)
}

pub struct RoleXfrm {
    pub name: String,
    pub v_spec: Vec<VerbProps>,
    pub obj_spec: Vec<String>,
    pub sr_info: Vec<Vec<u8>>,
    res: ReSet,
}

impl RoleXfrm {
    pub fn new(name: impl Into<String>) -> RoleXfrm {
        let mut res = ReSet::new();
        // base patterns available to all object specs
        let _ = res.decl("%qualObjTerm", "X Prep X");
        let _ = res.decl("%immedObjTerm", "[%qualObjTerm|X]");
        RoleXfrm {
            name: name.into(),
            v_spec: Vec::new(),
            obj_spec: Vec::new(),
            sr_info: Vec::new(),
            res,
        }
    }

    /// Add a rule; patterns compile eagerly so matching stays read-only.
    pub fn push_rule(
        &mut self,
        v_spec: VerbProps,
        obj_spec: &str,
        sr_info: Vec<u8>,
    ) -> Result<(), RuleFileError> {
        self.res.prepare(obj_spec)?;
        self.v_spec.push(v_spec);
        self.obj_spec.push(obj_spec.to_string());
        self.sr_info.push(sr_info);
        Ok(())
    }

    /// Remap the meta-roles to the relation appropriate for the verb.
    fn resolve_role(&self, cx: &ParseCx, e: Nid, role: u8) -> Option<SynRel> {
        if role == SR_SUB {
            if cx.g[e].test_verb_form(cx.lx, WordProps::EVT) {
                Some(SynRel::Exper)
            } else if cx.g[e].test_vroot(cx.lx, &["be"]) {
                Some(SynRel::Topic)
            } else {
                Some(SynRel::Agent)
            }
        } else if role == SR_OBJ {
            if cx.g[e].test_verb_form(cx.lx, WordProps::AVE) {
                Some(SynRel::Exper)
            } else {
                Some(SynRel::Theme)
            }
        } else if role == SR_NONE {
            None
        } else {
            SynRel::from_u8(role)
        }
    }

    /// Does the verb satisfy a rule's preconditions?
    fn match_verb(&self, cx: &ParseCx, v: Nid, vspec: VerbProps, sub_lst: &[Nid]) -> bool {
        if check_v_spec(vspec, VerbProps::IS_Q)
            && cx.g[v].rel[SynRel::IsQby.index()].is_empty()
        {
            return false;
        }
        if check_v_spec(vspec, VerbProps::NOT_MODIFIED)
            && !cx.g[v].rel[SynRel::Modifies.index()].is_empty()
        {
            return false;
        }
        if check_v_spec(vspec, VerbProps::NO_SUBJECT) && !sub_lst.is_empty() {
            return false;
        }
        if check_v_spec(vspec, VerbProps::PASSIVE) && !cx.g[v].check_vprop(VerbProps::PASSIVE) {
            return false;
        }
        if check_v_spec(vspec, VerbProps::AVGT) && !cx.g[v].test_verb_form(cx.lx, WordProps::AVGT)
        {
            return false;
        }
        if check_v_spec(vspec, VerbProps::AVE) && !cx.g[v].test_verb_form(cx.lx, WordProps::AVE) {
            return false;
        }
        if check_v_spec(vspec, VerbProps::EVT) && !cx.g[v].test_verb_form(cx.lx, WordProps::EVT) {
            return false;
        }
        if check_v_spec(vspec, VerbProps::BE_QUERY) {
            if cx.g[v].test_vroot(cx.lx, &["be"]) {
                return match sub_lst {
                    [] => true,
                    [only] => cx.g[*only].check_wrd_prop(cx.lx, WordProps::QUERY),
                    _ => false,
                };
            }
            return false;
        }
        if check_v_spec(vspec, VerbProps::VADJ_QUERY) {
            if cx.g[v].check_vprop(VerbProps::ADJ)
                || cx.g[v].test_vroot(cx.lx, &["be", "have", "do"])
            {
                return match sub_lst {
                    [] => true,
                    [only] => cx.g[*only].check_wrd_prop(cx.lx, WordProps::QUERY),
                    _ => false,
                };
            }
            return false;
        }
        true
    }

    fn find_rule(&self, cx: &ParseCx, e: Nid) -> Option<(usize, Vec<Vec<Nid>>)> {
        if !cx.g[e].is_verb(cx.lx) {
            return None;
        }
        let sub_lst = cx.g[e].rel[SynRel::Agent.index()].clone();
        let obj_lst = cx.g[e].rel[SynRel::Theme.index()].clone();
        for i in 0..self.v_spec.len() {
            if !self.match_verb(cx, e, self.v_spec[i], &sub_lst) {
                continue;
            }
            let matcher = ObjSrc {
                g: cx.g,
                lx: cx.lx,
                verb: e,
                src: &obj_lst,
            };
            if let Some(result) = self.res.match_src(&matcher, &self.obj_spec[i]) {
                return Some((i, result));
            }
        }
        None
    }

    /// Install terms under a role, relabeling them. Terms keep their scope
    /// (they were already children of the verb).
    fn set_role(g: &mut ParseGraph, e: Nid, role: SynRel, terms: &[Nid]) {
        for &t in terms {
            g[t].sr = role;
            g[t].scope = Some(e);
        }
        g[e].rel[role.index()].extend_from_slice(terms);
    }

    fn apply_rule(
        &self,
        cx: &mut ParseCx,
        e: Nid,
        rule: (usize, Vec<Vec<Nid>>),
    ) -> Result<Option<Nid>, ParseErr> {
        let (rix, match_result) = rule;
        let sr_info = &self.sr_info[rix];
        let vspec = self.v_spec[rix];
        let sr_v = *sr_info.first().ok_or_else(|| ParseErr::new("empty srInfo"))?;
        let sr_sub = *sr_info.get(1).ok_or_else(|| ParseErr::new("short srInfo"))?;
        // the grammatical buckets were filled by earlier passes; clear
        // them, then rebuild thematically
        let sub_lst = std::mem::take(&mut cx.g[e].rel[SynRel::Agent.index()]);
        let obj_lst = std::mem::take(&mut cx.g[e].rel[SynRel::Theme.index()]);
        for &t in sub_lst.iter().chain(obj_lst.iter()) {
            cx.g[t].sr = SynRel::Undef;
        }
        if sr_v == SynRel::VAdj as u8 {
            // "did she leave": e is a verb-adjunct of the subject-verb
            // that follows it
            let v_main = *obj_lst
                .first()
                .ok_or_else(|| ParseErr::new("verb-adjunct rule without main verb"))?;
            cx.g.unset_scope(v_main);
            cx.g.set_scope(e, v_main, SynRel::VAdj);
            // the adjunct's tense moves to the main verb
            cx.g[v_main].vprops = cx.g[e].vprops & VerbProps::TENSE_MASK;
            if !cx.g[e].test_vroot(cx.lx, &["be", "have", "do", "will", "shall"]) {
                if let Some(&w0) = cx.g[e].wrds.first() {
                    cx.g[v_main].vqual.push(w0);
                }
            }
        } else {
            for (i, consumed) in match_result.iter().enumerate() {
                let role_raw = match sr_info.get(i + 2) {
                    Some(&r) => r,
                    None => break,
                };
                if let Some(role) = self.resolve_role(cx, e, role_raw) {
                    if !consumed.is_empty() {
                        Self::set_role(cx.g, e, role, consumed);
                    }
                }
            }
            if let Some(role) = self.resolve_role(cx, e, sr_sub) {
                Self::set_role(cx.g, e, role, &sub_lst);
            }
        }
        if check_v_spec(vspec, VerbProps::BE_QUERY) || sr_v == SynRel::VAdj as u8 {
            // "why is she angry", "why did he leave": the main verb
            // becomes a qualifier of the query word
            if sub_lst.len() == 1 && cx.g[sub_lst[0]].check_wrd_prop(cx.lx, WordProps::QUERY) {
                let v_main = if sr_v == SynRel::VAdj as u8 {
                    *obj_lst
                        .first()
                        .ok_or_else(|| ParseErr::new("verb-adjunct rule without main verb"))?
                } else {
                    e
                };
                cx.g.unset_scope(v_main);
                cx.g.set_scope(sub_lst[0], v_main, SynRel::IsQby);
            }
        }
        Ok(cx.g[e].nxt)
    }

    pub fn run(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let mut e = cx.g.head;
        while let Some(n) = e {
            match self.find_rule(cx, n) {
                Some(rule) => {
                    if cx.trace {
                        tracing::trace!(xfrm = %self.name, rule = rule.0, node = n.0, "role rule");
                    }
                    e = self.apply_rule(cx, n, rule)?;
                }
                None => e = cx.g[n].nxt,
            }
        }
        Ok(())
    }

    pub fn dump(&self, _lx: &Lexicon) -> String {
        let mut out = format!("Xfrm \"{}\"\n", self.name);
        for i in 0..self.v_spec.len() {
            let info: Vec<&str> = self.sr_info[i]
                .iter()
                .map(|&r| SynRel::label_of(r))
                .collect();
            out.push_str(&format!(
                "vSpec: {} objSpec: {} srInfo: {}\n",
                self.v_spec[i].dump(":"),
                self.obj_spec[i],
                info.join(" ")
            ));
        }
        out
    }

    pub fn encode_values(&self, enc: &mut Encoder) {
        let specs: Vec<u32> = self.v_spec.iter().map(|p| p.0).collect();
        enc.int_lst(&specs, Width::W32);
        enc.str_lst(&self.obj_spec);
        let infos: Vec<Vec<u32>> = self
            .sr_info
            .iter()
            .map(|s| s.iter().map(|&b| b as u32).collect())
            .collect();
        enc.lst_lst(&infos, Width::W8);
    }

    pub fn decode_values(name: String, dec: &mut Decoder) -> Result<RoleXfrm, RuleFileError> {
        let v_spec: Vec<VerbProps> = dec.int_lst(Width::W32)?.into_iter().map(VerbProps).collect();
        let obj_spec = dec.str_lst()?;
        let sr_info: Vec<Vec<u8>> = dec
            .lst_lst(Width::W8)?
            .into_iter()
            .map(|s| s.into_iter().map(|b| b as u8).collect())
            .collect();
        if v_spec.len() != obj_spec.len() || v_spec.len() != sr_info.len() {
            return Err(RuleFileError::Malformed("role rule tables out of step".into()));
        }
        let mut x = RoleXfrm::new(name);
        for spec in &obj_spec {
            x.res.prepare(spec)?;
        }
        x.v_spec = v_spec;
        x.obj_spec = obj_spec;
        x.sr_info = sr_info;
        Ok(x)
    }
}
