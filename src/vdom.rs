//! The verb-domain resolver. A verb domain is a contiguous region centered
//! on a verb: Q and subject terms to the left, object terms to the right.
//! Binding priority is subject, then qualification, then is-object-of. On
//! entry the graph is narrowed to one verb complex and the initial Q,
//! subject, and object relations are in place (as IsQby, Agent, Theme).
//!
//! The *vdl* (verb-domain list) is a secondary chain over the nodes with no
//! scope parent, linked by `vprv`/`vnxt`. Each vdl node remembers
//! `vd_left`, the nearest preceding verb at entry; reductions rearrange the
//! chain but `vd_left` stays fixed.

use crate::defs::{Nid, ParseErr, SynRel, VerbProps, WordProps};
use crate::graph::ParseGraph;
use crate::lexicon::Lexicon;
use crate::xfrm::ParseCx;

/// A verb expression that can fill a noun role: "the girl sitting there",
/// "the boy you saw".
fn is_nv_expr(g: &ParseGraph, e: Option<Nid>) -> bool {
    e.map(|e| g[e].check_vprop(VerbProps::NV_EXPR)).unwrap_or(false)
}

/// Agent-action. A Q expression ("the girl you saw") counts, since
/// "you saw" is agent-action.
fn is_agent_action(g: &ParseGraph, e: Option<Nid>) -> bool {
    e.map(|e| g[e].check_vprop(VerbProps::AGENT_ACTION))
        .unwrap_or(false)
}

/// A verb whose subject can be reset.
fn has_mutable_sub(g: &ParseGraph, lx: &Lexicon, e: Option<Nid>) -> bool {
    match e {
        Some(e) => g[e].is_verb(lx) && !g[e].check_vprop(VerbProps::IMMUTABLE_SUB),
        None => false,
    }
}

fn is_subord_cl(g: &ParseGraph, e: Option<Nid>) -> bool {
    e.map(|e| g[e].check_vprop(VerbProps::SUBORD_CL)).unwrap_or(false)
}

/// First index in `lst` whose node's syntax class carries `mask`.
fn find_sc(g: &ParseGraph, lx: &Lexicon, lst: &[Nid], mask: WordProps) -> Option<usize> {
    lst.iter().position(|&e| g[e].check_sc(lx, mask))
}

/// Match the head of `lst` against a pattern of sc masks.
fn match_sc(g: &ParseGraph, lx: &Lexicon, lst: &[Nid], pat: &[WordProps]) -> bool {
    pat.iter()
        .enumerate()
        .all(|(i, &m)| i < lst.len() && g[lst[i]].check_sc(lx, m))
}

struct Vdl {
    head: Option<Nid>,
}

impl Vdl {
    fn join(g: &mut ParseGraph, left: Option<Nid>, right: Option<Nid>) {
        if let Some(l) = left {
            g[l].vnxt = right;
        }
        if let Some(r) = right {
            g[r].vprv = left;
        }
    }

    /// Remove `v` from the chain. A no-op if v is not in it.
    fn remove(&mut self, g: &mut ParseGraph, v: Nid) {
        if self.head == Some(v) {
            self.head = g[v].vnxt;
            if let Some(h) = self.head {
                g[h].vprv = None;
            }
        } else {
            let (l, r) = (g[v].vprv, g[v].vnxt);
            Self::join(g, l, r);
        }
    }

    /// Insert `e` immediately before `v`.
    fn insert_before(&mut self, g: &mut ParseGraph, v: Nid, e: Nid) {
        if self.head == Some(v) {
            Self::join(g, Some(e), Some(v));
            g[e].vprv = None;
            self.head = Some(e);
        } else {
            let left = g[v].vprv;
            Self::join(g, left, Some(e));
            Self::join(g, Some(e), Some(v));
        }
    }

    fn first_verb(&self, g: &ParseGraph, lx: &Lexicon) -> Option<Nid> {
        let mut e = self.head;
        while let Some(n) = e {
            if g[n].is_verb(lx) {
                return Some(n);
            }
            e = g[n].vnxt;
        }
        None
    }

    fn prv(g: &ParseGraph, e: Nid) -> Option<Nid> {
        g[e].vprv
    }

    fn nxt(g: &ParseGraph, e: Nid) -> Option<Nid> {
        g[e].vnxt
    }
}

/// Resolver state for one verb complex.
struct Resolver {
    vdl: Vdl,
}

impl Resolver {
    /// Build the vdl: every scope-free node of the narrowed graph, in
    /// order, with `vd_left` pinned to the nearest preceding verb.
    fn build(cx: &mut ParseCx) -> Resolver {
        let mut vdl = Vdl { head: None };
        let mut tail: Option<Nid> = None;
        let order: Vec<Nid> = cx.g.iter_list().collect();
        for e in order {
            if cx.g[e].scope.is_none() {
                cx.g[e].vprv = None;
                cx.g[e].vnxt = None;
                cx.g[e].vd_left = None;
                match tail {
                    None => {
                        vdl.head = Some(e);
                        tail = Some(e);
                    }
                    Some(t) => {
                        Vdl::join(cx.g, Some(t), Some(e));
                        tail = Some(e);
                    }
                }
                if let Some(left) = Vdl::prv(cx.g, e) {
                    if cx.g[left].is_verb(cx.lx) {
                        cx.g[e].vd_left = Some(left);
                    }
                }
            }
        }
        Resolver { vdl }
    }

    fn add_modifies(&mut self, cx: &mut ParseCx, v: Nid, es: &[Nid]) {
        for &e in es {
            self.vdl.remove(cx.g, e);
            cx.g.set_scope(e, v, SynRel::Modifies);
        }
    }

    fn add_obj(&mut self, cx: &mut ParseCx, v: Nid, es: &[Nid]) {
        for &e in es {
            self.vdl.remove(cx.g, e);
            cx.g.set_scope(e, v, SynRel::Theme);
        }
    }

    /// Undo a previous reduction of `rel` on `v`: the unbound nodes go to
    /// the object list of the preceding verb domain, or back into the vdl
    /// in front of `v` when there is none.
    fn unreduce(&mut self, cx: &mut ParseCx, v: Nid, rel: SynRel) {
        debug_assert!(matches!(rel, SynRel::Agent | SynRel::IsQby | SynRel::Vconj));
        let lst = std::mem::take(&mut cx.g[v].rel[rel.index()]);
        if lst.is_empty() {
            return;
        }
        if let Some(left) = cx.g[v].vd_left {
            self.add_obj(cx, left, &lst);
        } else {
            for &e in &lst {
                cx.g.unset_scope(e);
                self.vdl.insert_before(cx.g, v, e);
            }
        }
    }

    /// Bind `e` to `v` under `rel`, undoing weaker bindings first.
    /// Reducing by subject implicitly undoes a previous Q reduction.
    fn reduce(&mut self, cx: &mut ParseCx, v: Nid, rel: SynRel, e: Nid) {
        debug_assert!(matches!(rel, SynRel::Agent | SynRel::IsQby | SynRel::Vconj));
        if rel == SynRel::Agent {
            self.unreduce(cx, v, SynRel::IsQby);
        }
        self.unreduce(cx, v, rel);
        cx.g.set_scope(e, v, rel);
        self.vdl.remove(cx.g, e);
    }

    fn reduce_s(&mut self, cx: &mut ParseCx, v: Nid, e: Nid) {
        self.reduce(cx, v, SynRel::Agent, e);
    }

    fn reduce_q_undo(&mut self, cx: &mut ParseCx, v: Nid) {
        self.unreduce(cx, v, SynRel::IsQby);
    }

    fn reduce_conj_action(&mut self, cx: &mut ParseCx, v: Nid, e: Nid) {
        self.reduce(cx, v, SynRel::Vconj, e);
    }

    /// Phase 1: conjoined actions. A verb whose object list ends in a
    /// conjunction absorbs the next verb as a conjoined action.
    fn conj_actions(&mut self, cx: &mut ParseCx) {
        let mut e = self.vdl.first_verb(cx.g, cx.lx);
        while let Some(v) = e {
            let nxt = match Vdl::nxt(cx.g, v) {
                Some(n) => n,
                None => break,
            };
            let objlst = &cx.g[v].rel[SynRel::Theme.index()];
            let ends_in_conj = objlst
                .last()
                .map(|&t| cx.g[t].check_sc(cx.lx, WordProps::CONJ))
                .unwrap_or(false);
            if ends_in_conj {
                self.reduce_conj_action(cx, v, nxt);
                // the chain changed under v; look again from the same spot
                continue;
            }
            e = Some(nxt);
        }
    }

    /// Phase 2: subordinate clauses. Each verb absorbs the trailing run of
    /// subordinate-clause verbs as objects.
    fn subord_clauses(&mut self, cx: &mut ParseCx) {
        let mut e = self.vdl.first_verb(cx.g, cx.lx);
        while let Some(v) = e {
            if Vdl::nxt(cx.g, v).is_none() {
                break;
            }
            let mut ex = Vdl::nxt(cx.g, v);
            while is_subord_cl(cx.g, ex) {
                if let Some(x) = ex {
                    self.add_obj(cx, v, &[x]);
                }
                ex = Vdl::nxt(cx.g, v);
            }
            e = Vdl::nxt(cx.g, v);
        }
    }

    /// Phase 3: left adjuncts of the first verb.
    fn left_adjuncts(&mut self, cx: &mut ParseCx) {
        let v0 = match self.vdl.first_verb(cx.g, cx.lx) {
            Some(v) => v,
            None => return,
        };
        // prep immediately preceding the verb in the vdl
        let prep = Vdl::prv(cx.g, v0)
            .filter(|&p| cx.g[p].check_sc(cx.lx, WordProps::PREP | WordProps::CLPREP));
        if let Some(prep) = prep {
            if cx.g[prep].test_wrd(cx.lx, &["for", "then"]) {
                return;
            }
            if is_nv_expr(cx.g, Some(v0)) {
                if let Some(v1) = Vdl::nxt(cx.g, v0).filter(|&v| is_agent_action(cx.g, Some(v))) {
                    // "On the day you left we saw mermaids"
                    self.reduce_q_undo(cx, v1);
                    self.add_modifies(cx, v1, &[prep, v0]);
                    return;
                }
                // prep clause adjuncts without verbs:
                // "on monday we saw mermaids"
                if !cx.g[v0].rel[SynRel::IsQby.index()].is_empty() {
                    self.reduce_q_undo(cx, v0);
                    let after_prep = Vdl::nxt(cx.g, prep);
                    let mut terms = vec![prep];
                    terms.extend(after_prep);
                    self.add_modifies(cx, v0, &terms);
                    return;
                }
            }
            if is_agent_action(cx.g, Some(v0)) {
                if let Some(v1) = Vdl::nxt(cx.g, v0).filter(|&v| is_agent_action(cx.g, Some(v))) {
                    // "After you left the ship we saw mermaids"
                    self.reduce_q_undo(cx, v1);
                    self.add_modifies(cx, v1, &[prep, v0]);
                    return;
                }
            }
            // no other prep cases are recognized
            return;
        }
        // no explicit prep: "The day you left the ship we saw mermaids"
        let v1 = Vdl::nxt(cx.g, v0);
        if is_nv_expr(cx.g, Some(v0)) {
            if let Some(v1) = v1.filter(|&v| is_nv_expr(cx.g, Some(v))) {
                self.reduce_q_undo(cx, v1);
                self.add_modifies(cx, v1, &[v0]);
                return;
            }
            if let Some(v1) = v1 {
                if !has_mutable_sub(cx.g, cx.lx, Some(v1)) {
                    // "The day you left we saw mermaids"; the mutable-sub
                    // test keeps "The day you left Paris was cold" intact
                    self.add_modifies(cx, v1, &[v0]);
                }
            }
        }
    }

    /// Phase 4: subject/object reduction across the verb domains.
    fn sub_obj(&mut self, cx: &mut ParseCx) -> Result<(), ParseErr> {
        let v0 = match self.vdl.first_verb(cx.g, cx.lx) {
            Some(v) => v,
            None => return Ok(()),
        };
        if Vdl::nxt(cx.g, v0).is_none() {
            // a single verb: nothing to resolve
            return Ok(());
        }
        // initial scope: either v0 itself, or NVexpr + successor as S V
        let peek = Vdl::nxt(cx.g, v0);
        let scope = if is_nv_expr(cx.g, Some(v0)) {
            match peek.filter(|&p| has_mutable_sub(cx.g, cx.lx, Some(p))) {
                Some(p) => {
                    self.reduce_s(cx, p, v0);
                    p
                }
                None => return Err(ParseErr::new("failed to set initial scope")),
            }
        } else {
            v0
        };
        // walk rightward in the object context of `scope`
        let mut scope = scope;
        let mut v = Vdl::nxt(cx.g, scope);
        while let Some(cur) = v {
            let peek = Vdl::nxt(cx.g, cur);
            if is_nv_expr(cx.g, Some(cur)) {
                if let Some(p) = peek.filter(|&p| is_nv_expr(cx.g, Some(p))) {
                    // two names in an object context: both become objects
                    // of `scope`, which then shifts
                    self.add_obj(cx, scope, &[cur]);
                    self.add_obj(cx, scope, &[p]);
                    scope = p;
                    v = Vdl::nxt(cx.g, scope);
                    continue;
                }
                if let Some(p) = peek.filter(|&p| has_mutable_sub(cx.g, cx.lx, Some(p))) {
                    // cur + peek -> S V, added to scope's objects
                    self.reduce_s(cx, p, cur);
                    self.add_obj(cx, scope, &[p]);
                    scope = p;
                    v = Vdl::nxt(cx.g, scope);
                    continue;
                }
                if peek.is_some() {
                    return Err(ParseErr::new("could not handle 'peek'"));
                }
                // fall through
            }
            self.add_obj(cx, scope, &[cur]);
            scope = cur;
            v = peek;
        }
        Ok(())
    }

    /// Phase 5: predicate queries ("is she pretty", "is that man the one
    /// you met"): verb-subject-object order. Fix object assignments that
    /// the default rules got wrong for NVexpr terms.
    fn predicate_queries(&mut self, cx: &mut ParseCx) {
        let v0 = match self.vdl.first_verb(cx.g, cx.lx) {
            Some(v) => v,
            None => return,
        };
        if !cx.g[v0].test_vroot(cx.lx, &["be"]) {
            return;
        }
        // a non-query subject rejects the predicate-query reading;
        // "why is she angry" stays one
        let sublst = cx.g[v0].rel[SynRel::Agent.index()].clone();
        if let Some(&s0) = sublst.first() {
            if !cx.g[s0].check_wrd_prop(cx.lx, WordProps::QUERY) {
                return;
            }
        }
        let objlst = cx.g[v0].rel[SynRel::Theme.index()].clone();
        let e2 = objlst.get(1).copied();
        let e1 = match objlst.first().copied().filter(|&e| is_nv_expr(cx.g, Some(e))) {
            Some(e) => e,
            None => return,
        };
        if let Some(e2) = e2 {
            if cx.g[e2].check_vprop(VerbProps::GERUND) {
                // "was the guy you saw today leaving?"
                self.reduce_s(cx, e2, e1);
                return;
            }
            if is_nv_expr(cx.g, Some(e2)) {
                // "is the ring I bought the one you liked?": accept as is
                return;
            }
        }
        // "was the guy you saw angry": modifier terms inside the NVexpr's
        // own object list belong to the outer verb
        let inner = cx.g[e1].rel[SynRel::Theme.index()].clone();
        if let Some(i) = find_sc(cx.g, cx.lx, &inner, WordProps::MOD) {
            for &ex in &inner[i..] {
                cx.g.set_scope(ex, v0, SynRel::Theme);
            }
        }
    }
}

/// Phase 6: object reassignment. Verbs with weak scope (NVexpr children)
/// compete with their parent for object terms; the canonical-preposition
/// fitness decides, and losers keep only a minimal object clause.
fn resolve_obj_relations(cx: &mut ParseCx, v: Nid) -> Option<Nid> {
    let nxt = cx.g[v].nxt;
    let owner = match cx.g[v].scope {
        Some(o) if is_nv_expr(cx.g, Some(v)) => o,
        _ => return nxt,
    };
    let objlst = cx.g[v].rel[SynRel::Theme.index()].clone();
    let prep_mask = WordProps::PREP | WordProps::CLPREP | WordProps::QUALPREP;
    // an explicit prep whose fitness prefers the owner promotes the prep
    // and everything after it
    for (i, &e) in objlst.iter().enumerate() {
        if cx.g[e].check_sc(cx.lx, prep_mask) {
            let prep = match cx.g[e].wrds.first() {
                Some(&w) => w,
                None => continue,
            };
            let v_fit = cx.lx.prep_verb_fitness(prep, cx.g[v].vroot());
            let owner_fit = cx.lx.prep_verb_fitness(prep, cx.g[owner].vroot());
            if owner_fit != -1 && owner_fit > v_fit {
                for &ex in &objlst[i..] {
                    cx.g.set_scope(ex, owner, SynRel::Theme);
                }
                return nxt;
            }
        }
    }
    // otherwise leave v a minimal object clause: "prep X" or one word
    let ix = if match_sc(cx.g, cx.lx, &objlst, &[prep_mask, WordProps::X]) {
        Some(2)
    } else if match_sc(cx.g, cx.lx, &objlst, &[WordProps::X]) {
        Some(1)
    } else {
        None
    };
    if let Some(ix) = ix {
        for &ex in &objlst[ix..] {
            cx.g.set_scope(ex, owner, SynRel::Theme);
        }
    }
    nxt
}

/// Resolve the verb domains of the narrowed graph. On failure the error
/// unwinds to the transform boundary.
pub fn resolve(cx: &mut ParseCx) -> Result<(), ParseErr> {
    let mut r = Resolver::build(cx);
    r.conj_actions(cx);
    r.subord_clauses(cx);
    r.left_adjuncts(cx);
    r.sub_obj(cx)?;
    r.predicate_queries(cx);
    // reassign object terms between competing verb domains
    let mut e = cx.g.head;
    while let Some(v) = e {
        e = resolve_obj_relations(cx, v);
    }
    if cx.trace {
        tracing::trace!(graph = %cx.g.dump(cx.lx), "verb domains resolved");
    }
    Ok(())
}
