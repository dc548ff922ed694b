//! The lexicon compiler. Builds the full rule set (vocabulary, syntax
//! classes, rewrite rules, prep->verb associations, and the transform
//! tables) from the human-authored `data/lexicon.txt` plus the grammar
//! tables declared in this module. Sequence-map collisions surface here,
//! at the compile boundary, never inside the runtime parser.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defs::{Key, ScKey, VerbProps, WordProps, SR_NONE, SR_OBJ, SR_SUB};
use crate::lexicon::{Lexicon, RewriteRule, WordVariant};
use crate::parser::Parser;
use crate::serializer::RuleFileError;
use crate::xfrm::{
    Action, InvertQXfrm, ReductXfrm, RoleXfrm, ScSeqToSrXfrm, SrXfrm, SvToQXfrm, VconjXfrm, Xfrm,
};

/// The shipped lexicon source.
pub const LEXICON_SRC: &str = include_str!("../data/lexicon.txt");

/// Compile the shipped lexicon and grammar into a ready parser.
pub fn build_parser() -> Result<Parser, RuleFileError> {
    build_parser_from(LEXICON_SRC)
}

/// Compile a parser from lexicon source text.
pub fn build_parser_from(lexicon_src: &str) -> Result<Parser, RuleFileError> {
    let mut lx = Lexicon::new();
    seed_syntax_classes(&mut lx);
    builtin_entries(&mut lx);
    read_lexicon(&mut lx, lexicon_src)?;
    lx.sort_rewrites();
    assign_syn_classes(&mut lx);
    let xfrms = build_xfrms(&lx)?;
    Ok(Parser::new(lx, xfrms))
}

// ----------------------------------------------------------------------
// syntax classes
// ----------------------------------------------------------------------

/// Base classes with their canonical property masks, in fixed order so the
/// compiled tables are deterministic.
const BASE_CLASSES: &[(&str, WordProps)] = &[
    ("X", WordProps::X),
    ("V", WordProps::VERB),
    ("be", WordProps::VERB),
    ("Ger", WordProps(WordProps::VERB.0 | WordProps::GERUND.0)),
    ("Inf", WordProps::VERB),
    ("Pas", WordProps(WordProps::VERB.0 | WordProps::PAST.0)),
    ("Prep", WordProps::PREP),
    ("ClPrep", WordProps::CLPREP),
    ("QualPrep", WordProps::QUALPREP),
    ("Mod", WordProps::MOD),
    ("Noun", WordProps::NOUN),
    ("N", WordProps::N),
    ("DetW", WordProps::DETW),
    ("DetS", WordProps::DETS),
    ("Conj", WordProps::CONJ),
    ("AndOr", WordProps::CONJ),
    ("Query", WordProps::QUERY),
    ("VAdj", WordProps(WordProps::VERB.0 | WordProps::VADJ.0)),
    ("Comma", WordProps::PUNCT),
    ("Punct", WordProps::PUNCT),
    // composites reachable through online word-variant inference
    ("Noun|V", WordProps(WordProps::NOUN.0 | WordProps::VERB.0)),
    ("Noun|Mod", WordProps(WordProps::NOUN.0 | WordProps::MOD.0)),
];

/// Words that map to a syntax class of their own.
const SC_SINGLETONS: &[&str] = &[
    "not", "to", "'s", "'d", "have", "has", "had", "do", "does", "did",
];

fn seed_syntax_classes(lx: &mut Lexicon) {
    for &(name, props) in BASE_CLASSES {
        let sc = lx.sc_dict.lookup(name, true);
        lx.sc_dict.set_prop(sc, props);
    }
    for &sp in SC_SINGLETONS {
        lx.sc_dict.lookup(sp, true);
        lx.sc_singletons.push(sp.to_string());
    }
}

fn mask_for_class_part(part: &str) -> WordProps {
    BASE_CLASSES
        .iter()
        .find(|(name, _)| *name == part)
        .map(|&(_, m)| m)
        .unwrap_or(WordProps::NONE)
}

/// Assign a syntax class to every word. A word whose spelling names a
/// class gets that class; otherwise the class comes from the word's
/// property description, created on first use.
fn assign_syn_classes(lx: &mut Lexicon) {
    for ix in 1..lx.len() {
        let key = Key(ix as u32);
        let sp = lx.spelling(key).to_string();
        let mut sc = lx.sc_dict.find(&sp);
        if sc == 0 {
            let desc = lx.sc_desc(key);
            sc = lx.sc_dict.find(&desc);
            if sc == 0 {
                sc = lx.sc_dict.lookup(&desc, true);
                let mut props = WordProps::NONE;
                for part in desc.split('|') {
                    props |= mask_for_class_part(part);
                }
                lx.sc_dict.set_prop(sc, props);
            }
        } else {
            // a singleton class inherits the word's own props
            let props = lx.props(key);
            lx.sc_dict.set_prop(sc, props);
        }
        lx.set_syn_class(key, ScKey(sc));
    }
    // finite forms of "be" share the dedicated class
    let be_sc = lx.sc_key("be");
    for sp in ["be", "am", "are", "is", "was", "were", "been"] {
        let key = lx.find(sp);
        if !key.is_none() {
            lx.set_syn_class(key, be_sc);
        }
    }
}

// ----------------------------------------------------------------------
// built-in entries
// ----------------------------------------------------------------------

fn define_words(lx: &mut Lexicon, props: WordProps, def: Key, words: &str) {
    for sp in words.split_whitespace() {
        lx.define(sp, props, def);
    }
}

fn builtin_entries(lx: &mut Lexicon) {
    // forms of "be"
    let be = lx.define(
        "be",
        WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
        Key::NONE,
    );
    lx.define("being", WordProps::VERB | WordProps::GERUND, be);
    // "'s" doubles as the contraction of "is"
    define_words(lx, WordProps::VERB | WordProps::PRESENT, be, "am are is 's");
    define_words(lx, WordProps::VERB | WordProps::PAST, be, "was were been");
    // "'d" is a verb adjunct ("he'd go")
    lx.define("'d", WordProps::VADJ, Key::NONE);
    define_words(lx, WordProps::CONJ, Key::NONE, "and or");
    // verb-phrase adjuncts
    define_words(
        lx,
        WordProps::VADJ,
        Key::NONE,
        "will shall would should may might ought",
    );
    lx.define("can", WordProps::VADJ | WordProps::PRESENT, Key::NONE);
    lx.define("could", WordProps::VADJ | WordProps::PAST, Key::NONE);
    // words carrying their own syntax class
    for sp in SC_SINGLETONS {
        lx.define(sp, WordProps::NONE, Key::NONE);
    }
}

// ----------------------------------------------------------------------
// lexicon source file
// ----------------------------------------------------------------------

/// Create an entry and set props; existing entries just gain the props,
/// fresh ones go through word-variant inference.
fn define_entry(lx: &mut Lexicon, sp: &str, props: WordProps) {
    let key = lx.lookup(sp, false);
    if !key.is_none() {
        lx.set_prop(key, props);
        return;
    }
    let key = lx.define(sp, props, Key::NONE);
    if lx.def(key) == key {
        let mut wv = WordVariant::default();
        if lx.is_word_variant(&sp.to_lowercase(), &mut wv) {
            lx.set_def(key, wv.root);
            lx.set_prop(key, wv.props);
        }
    }
}

/// Install a rewrite rule given `lhs... : rhs...` terms.
fn add_rule(lx: &mut Lexicon, terms: &[&str]) -> Result<(), RuleFileError> {
    let split = terms
        .iter()
        .position(|&t| t == ":")
        .ok_or_else(|| RuleFileError::Malformed("rewrite rule without ':'".into()))?;
    let lhs: Vec<Key> = terms[..split]
        .iter()
        .map(|t| lx.define(t, WordProps::NONE, Key::NONE))
        .collect();
    let rhs: Vec<Key> = terms[split + 1..]
        .iter()
        .map(|t| lx.define(t, WordProps::NONE, Key::NONE))
        .collect();
    if lhs.is_empty() || rhs.is_empty() {
        return Err(RuleFileError::Malformed("one-sided rewrite rule".into()));
    }
    lx.add_rewrite(RewriteRule { lhs, rhs });
    Ok(())
}

/// Add a verb. The first word is the root; irregular verbs list
/// third-person, past, perfect, and gerund forms, and an optional
/// thematic-form marker follows a ':'.
fn add_verb(lx: &mut Lexicon, terms: &[&str]) -> Result<(), RuleFileError> {
    let root = lx.define(
        terms[0],
        WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
        Key::NONE,
    );
    let mut i = 1;
    if i < terms.len() && terms[i] != ":" {
        if terms.len() < i + 4 {
            return Err(RuleFileError::Malformed(format!(
                "irregular verb \"{}\" needs four forms",
                terms[0]
            )));
        }
        lx.define(terms[i], WordProps::VERB | WordProps::PRESENT, root);
        lx.define(terms[i + 1], WordProps::VERB | WordProps::PAST, root);
        lx.define(terms[i + 2], WordProps::VERB | WordProps::PAST, root);
        lx.define(terms[i + 3], WordProps::VERB | WordProps::GERUND, root);
        i += 4;
    }
    if i < terms.len() {
        // skip the ':'
        i += 1;
        let marker = terms.get(i).copied().unwrap_or("");
        let prop = match marker {
            "AVE" => WordProps::AVE,
            "EVT" => WordProps::EVT,
            "AVGT" => WordProps::AVGT,
            "VPQ" => WordProps::VPQ,
            _ => {
                return Err(RuleFileError::Malformed(format!(
                    "unknown verb marker \"{marker}\""
                )))
            }
        };
        lx.set_prop(root, prop);
    }
    Ok(())
}

/// Add a prep -> {verbs} association. Verbs must already be roots.
fn add_prep_verbs(lx: &mut Lexicon, terms: &[&str]) -> Result<(), RuleFileError> {
    let prep = lx.define(terms[0], WordProps::PREP, Key::NONE);
    let mut verbs = Vec::new();
    for &t in terms.iter().skip(2) {
        let key = lx.lookup(t, false);
        if !key.is_none() && lx.check_prop(key, WordProps::ROOT) {
            verbs.push(lx.define(t, WordProps::ROOT, Key::NONE));
        }
    }
    lx.set_prep_verbs(prep, verbs);
    Ok(())
}

/// Read the sectioned lexicon file.
fn read_lexicon(lx: &mut Lexicon, src: &str) -> Result<(), RuleFileError> {
    static CONTINUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\+[ ]*\n").unwrap());
    let src = src.replace('\r', " ");
    let src = CONTINUATION.replace_all(&src, " ");

    let mut state = "";
    let mut props = WordProps::NONE;
    for line in src.lines() {
        let line = line.trim();
        if line.starts_with('/') {
            continue;
        }
        if let Some(v) = line.strip_prefix(">>Version") {
            lx.version = v.trim().to_string();
            continue;
        }
        let terms: Vec<&str> = line.split_whitespace().collect();
        if terms.is_empty() {
            continue;
        }
        let w0 = terms[0];
        if let Some(section) = w0.strip_prefix(">>") {
            match section {
                "Rewrite" | "Verbs" | "Contractions" | "PrepVerbs" => state = section,
                _ => {
                    state = "props";
                    props = match section {
                        "Nouns" => WordProps::NOUN,
                        "Conjunctions" => WordProps::CONJ,
                        "DetStrong" => WordProps::DETS,
                        "DetWeak" => WordProps::DETW,
                        "Names" => WordProps::N,
                        "Pronouns" => WordProps::N | WordProps::PRONOUN,
                        "Abbrev" => WordProps::ABBREV,
                        "Modifiers" => WordProps::MOD,
                        "Prepositions" => WordProps::PREP,
                        "ClausePreps" => WordProps::CLPREP,
                        "QualPreps" => WordProps::QUALPREP,
                        "Query" => WordProps::QUERY,
                        _ => {
                            return Err(RuleFileError::Malformed(format!(
                                "unknown lexicon section \"{section}\""
                            )))
                        }
                    };
                }
            }
            continue;
        }
        match state {
            "props" => {
                if terms.len() > 1 && props != WordProps::ABBREV {
                    // a multi-word entry compiles to a rewrite rule that
                    // collapses the words into one token
                    let joined = terms.join(" ");
                    let mut rule_terms = terms.clone();
                    rule_terms.push(":");
                    rule_terms.push(&joined);
                    add_rule(lx, &rule_terms)?;
                    define_entry(lx, &joined, props);
                } else {
                    define_entry(lx, w0, props);
                }
            }
            "Verbs" => add_verb(lx, &terms)?,
            "Contractions" => {
                lx.define(w0, WordProps::CONTRACTION, Key::NONE);
                add_rule(lx, &terms)?;
            }
            "Rewrite" => add_rule(lx, &terms)?,
            "PrepVerbs" => add_prep_verbs(lx, &terms)?,
            _ => {
                return Err(RuleFileError::Malformed(format!(
                    "entry \"{w0}\" outside any lexicon section"
                )))
            }
        }
    }
    Ok(())
}

// ----------------------------------------------------------------------
// grammar tables
// ----------------------------------------------------------------------

fn sc_seq(lx: &Lexicon, names: &[&str]) -> Result<Vec<u16>, RuleFileError> {
    names
        .iter()
        .map(|&n| {
            let sc = lx.sc_key(n);
            if sc == ScKey::NONE {
                Err(RuleFileError::Malformed(format!(
                    "grammar rule names unknown class \"{n}\""
                )))
            } else {
                Ok(sc.0 as u16)
            }
        })
        .collect()
}

/// One reduction rule: matched class window, left/right trim, verb props,
/// result class, action.
struct RRule(
    &'static [&'static str],
    u8,
    u8,
    VerbProps,
    &'static str,
    Action,
);

fn build_reduct(lx: &Lexicon, name: &str, rules: &[RRule]) -> Result<ReductXfrm, RuleFileError> {
    let mut x = ReductXfrm::new(name);
    let max_len = rules.iter().map(|r| r.0.len()).max().unwrap_or(0);
    x.rules.set_dimensions(max_len, (lx.sc_len() - 1) as u16);
    for RRule(seq, off_s, off_e, props, sc_name, act) in rules {
        let ids = sc_seq(lx, seq)?;
        let sc = if sc_name.is_empty() {
            ScKey::NONE
        } else {
            lx.sc_key(sc_name)
        };
        let vix = x.push_value(*off_s, *off_e, *props, sc, *act);
        x.rules.define_entry(&ids, vix)?;
    }
    Ok(x)
}

/// One scope-assignment rule: matched class window and per-node bytes
/// (high nibble offset to the scope target, low nibble relation).
struct SRule(&'static [&'static str], &'static [u8]);

fn build_sc_to_sr(
    lx: &Lexicon,
    name: &str,
    rules: &[SRule],
) -> Result<ScSeqToSrXfrm, RuleFileError> {
    let mut x = ScSeqToSrXfrm::new(name);
    let max_len = rules.iter().map(|r| r.0.len()).max().unwrap_or(0);
    x.rules.set_dimensions(max_len, (lx.sc_len() - 1) as u16);
    for SRule(seq, sr_seq) in rules {
        let ids = sc_seq(lx, seq)?;
        let vix = x.push_value(sr_seq.to_vec());
        x.rules.define_entry(&ids, vix)?;
    }
    Ok(x)
}

// relation bytes used in the tables below
const AGENT: u8 = 0;
const THEME: u8 = 3;
const AUX_THEME: u8 = 4;
const IS_QBY: u8 = 6;
const V_ADJ: u8 = 8;

const fn at(offset: u8, rel: u8) -> u8 {
    (offset << 4) | rel
}

fn build_xfrms(lx: &Lexicon) -> Result<Vec<Xfrm>, RuleFileError> {
    use Action::{Reduce, SetProps};
    const P0: VerbProps = VerbProps::NONE;
    const PERF: VerbProps = VerbProps::PERFECT;
    const PERF_PAS: VerbProps = VerbProps(VerbProps::PERFECT.0 | VerbProps::PASSIVE.0);

    // possessives: "John 's cat" becomes one noun-like unit
    let init_rules = [
        RRule(&["X", "'s", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["X", "'s", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["Noun", "'s", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["Noun", "'s", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["N", "'s", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["N", "'s", "X"], 0, 0, P0, "X", Reduce),
    ];

    // verb groups. Single verbs also reduce, so every verb node downstream
    // is a composite with derived tense and class.
    let v_rules = [
        RRule(&["V"], 0, 0, P0, "V", Reduce),
        RRule(&["be"], 0, 0, P0, "V", Reduce),
        RRule(&["Ger"], 0, 0, VerbProps::GERUND, "V", Reduce),
        RRule(&["VAdj"], 0, 0, VerbProps::ADJ, "V", Reduce),
        RRule(&["VAdj", "not"], 0, 0, VerbProps::ADJ, "V", Reduce),
        RRule(&["VAdj", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "not", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "be"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "not", "be"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "be", "Ger"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "not", "be", "Ger"], 0, 0, P0, "V", Reduce),
        RRule(&["VAdj", "be", "V"], 0, 0, VerbProps::PASSIVE, "V", Reduce),
        RRule(&["be", "Ger"], 0, 0, P0, "V", Reduce),
        RRule(&["be", "not", "Ger"], 0, 0, P0, "V", Reduce),
        RRule(&["be", "not"], 0, 0, P0, "V", Reduce),
        RRule(&["be", "V"], 0, 0, VerbProps::PASSIVE, "V", Reduce),
        RRule(&["be", "not", "V"], 0, 0, VerbProps::PASSIVE, "V", Reduce),
        RRule(&["to", "V"], 0, 0, VerbProps::INF, "V", Reduce),
        RRule(&["to", "not", "V"], 0, 0, VerbProps::INF, "V", Reduce),
        RRule(&["to", "be"], 0, 0, VerbProps::INF, "V", Reduce),
        RRule(&["'d", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["'d", "be"], 0, 0, P0, "V", Reduce),
        RRule(&["have"], 0, 0, P0, "V", Reduce),
        RRule(&["has"], 0, 0, P0, "V", Reduce),
        RRule(&["had"], 0, 0, P0, "V", Reduce),
        RRule(&["do"], 0, 0, P0, "V", Reduce),
        RRule(&["does"], 0, 0, P0, "V", Reduce),
        RRule(&["did"], 0, 0, P0, "V", Reduce),
        RRule(&["have", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["has", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["had", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["have", "not", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["has", "not", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["had", "not", "V"], 0, 0, PERF, "V", Reduce),
        RRule(&["have", "be"], 0, 0, PERF, "V", Reduce),
        RRule(&["has", "be"], 0, 0, PERF, "V", Reduce),
        RRule(&["had", "be"], 0, 0, PERF, "V", Reduce),
        RRule(&["have", "be", "Ger"], 0, 0, PERF, "V", Reduce),
        RRule(&["has", "be", "Ger"], 0, 0, PERF, "V", Reduce),
        RRule(&["had", "be", "Ger"], 0, 0, PERF, "V", Reduce),
        RRule(&["have", "be", "V"], 0, 0, PERF_PAS, "V", Reduce),
        RRule(&["has", "be", "V"], 0, 0, PERF_PAS, "V", Reduce),
        RRule(&["do", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["does", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["did", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["do", "not", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["does", "not", "V"], 0, 0, P0, "V", Reduce),
        RRule(&["did", "not", "V"], 0, 0, P0, "V", Reduce),
    ];

    // determinant phrases
    let det_rules = [
        RRule(&["DetS", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["DetS", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["DetS", "Mod", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["DetS", "Mod", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["DetW", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["DetW", "Mod", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["Mod", "Noun"], 0, 0, P0, "X", Reduce),
        RRule(&["Noun"], 0, 0, P0, "X", Reduce),
    ];

    // conjoined nouns and modifiers
    let conj_rules = [
        RRule(&["X", "AndOr", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["N", "AndOr", "N"], 0, 0, P0, "X", Reduce),
        RRule(&["N", "AndOr", "X"], 0, 0, P0, "X", Reduce),
        RRule(&["X", "AndOr", "N"], 0, 0, P0, "X", Reduce),
        RRule(&["Mod", "AndOr", "Mod"], 0, 0, P0, "Mod", Reduce),
        RRule(&["Mod", "Mod"], 0, 0, P0, "Mod", Reduce),
    ];

    // mark verb-domain forms ahead of the resolver
    const AA: VerbProps = VerbProps::AGENT_ACTION;
    const NV_AA: VerbProps = VerbProps(VerbProps::NV_EXPR.0 | VerbProps::AGENT_ACTION.0);
    const SUB_AA: VerbProps = VerbProps(VerbProps::SUBORD_CL.0 | VerbProps::AGENT_ACTION.0);
    let act_rules = [
        RRule(&["X", "V"], 1, 0, AA, "", SetProps),
        RRule(&["N", "V"], 1, 0, AA, "", SetProps),
        RRule(&["Noun", "V"], 1, 0, AA, "", SetProps),
        RRule(&["Query", "V"], 1, 0, AA, "", SetProps),
        RRule(&["X", "be"], 1, 0, AA, "", SetProps),
        RRule(&["N", "be"], 1, 0, AA, "", SetProps),
        RRule(&["Noun", "be"], 1, 0, AA, "", SetProps),
        RRule(&["Query", "be"], 1, 0, AA, "", SetProps),
        RRule(&["X", "Pas"], 1, 0, AA, "", SetProps),
        RRule(&["N", "Pas"], 1, 0, AA, "", SetProps),
        RRule(&["X", "N", "V"], 2, 0, NV_AA, "", SetProps),
        RRule(&["Noun", "N", "V"], 2, 0, NV_AA, "", SetProps),
        RRule(&["X", "Ger"], 1, 0, VerbProps::NV_EXPR, "", SetProps),
        RRule(&["Noun", "Ger"], 1, 0, VerbProps::NV_EXPR, "", SetProps),
        RRule(&["Ger"], 0, 0, VerbProps::NV_EXPR, "", SetProps),
        RRule(&["Inf"], 0, 0, VerbProps::NV_EXPR, "", SetProps),
        RRule(&["DetW", "N", "V"], 2, 0, SUB_AA, "", SetProps),
        RRule(&["DetW", "X", "V"], 2, 0, SUB_AA, "", SetProps),
    ];

    // scope assignment over the same windows
    const LEFT_VDOM_RULES: &[SRule] = &[
        SRule(&["X", "V"], &[at(1, AGENT), 0]),
        SRule(&["N", "V"], &[at(1, AGENT), 0]),
        SRule(&["Noun", "V"], &[at(1, AGENT), 0]),
        SRule(&["Query", "V"], &[at(1, AGENT), 0]),
        SRule(&["X", "be"], &[at(1, AGENT), 0]),
        SRule(&["N", "be"], &[at(1, AGENT), 0]),
        SRule(&["Noun", "be"], &[at(1, AGENT), 0]),
        SRule(&["Query", "be"], &[at(1, AGENT), 0]),
        SRule(&["X", "Pas"], &[at(1, AGENT), 0]),
        SRule(&["N", "Pas"], &[at(1, AGENT), 0]),
        SRule(&["X", "N", "V"], &[at(2, IS_QBY), at(1, AGENT), 0]),
        SRule(&["Noun", "N", "V"], &[at(2, IS_QBY), at(1, AGENT), 0]),
        SRule(&["X", "Ger"], &[at(1, IS_QBY), 0]),
        SRule(&["Noun", "Ger"], &[at(1, IS_QBY), 0]),
        SRule(&["N", "Ger"], &[at(1, AGENT), 0]),
        SRule(&["DetW", "N", "V"], &[0, at(1, AGENT), 0]),
        SRule(&["DetW", "X", "V"], &[0, at(1, AGENT), 0]),
    ];
    let left_vdom_rules = LEFT_VDOM_RULES;

    // thematic-role rules, most specific first
    let mut role = RoleXfrm::new("roleXfrm");
    // "did she leave": the verb is an adjunct of the subject-verb
    role.push_rule(
        VerbProps::VADJ_QUERY,
        "SubVerb .*",
        vec![V_ADJ, SR_NONE, SR_NONE, SR_NONE],
    )?;
    // "is she angry": verb-subject-object order
    role.push_rule(
        VerbProps::BE_QUERY,
        "objTerm Mod .*",
        vec![SR_NONE, SR_NONE, AGENT, THEME, THEME],
    )?;
    role.push_rule(
        VerbProps::BE_QUERY,
        "objTerm objTerm .*",
        vec![SR_NONE, SR_NONE, AGENT, THEME, THEME],
    )?;
    // "gave the girl an apple"
    role.push_rule(
        VerbProps::AVGT,
        "objTerm objTerm",
        vec![SR_NONE, SR_SUB, AUX_THEME, THEME],
    )?;
    // predicate modifiers: "is pretty", "ran quickly"
    role.push_rule(VerbProps::NONE, "Mod+", vec![SR_NONE, SR_SUB, THEME])?;
    // prepositional object clauses: "sat on the mat"
    role.push_rule(
        VerbProps::NONE,
        "Prep objTerm+",
        vec![SR_NONE, SR_SUB, THEME, THEME],
    )?;
    // "put the book on the table"
    role.push_rule(
        VerbProps::NONE,
        "objTerm+ Prep objTerm+",
        vec![SR_NONE, SR_SUB, THEME, THEME, THEME],
    )?;
    // plain transitives; the object meta-role resolves per verb form
    role.push_rule(VerbProps::NONE, "objTerm+", vec![SR_NONE, SR_SUB, SR_OBJ])?;
    // catch-all: keep whatever object terms are present as theme
    role.push_rule(VerbProps::NONE, ".*", vec![SR_NONE, SR_SUB, THEME])?;

    Ok(vec![
        Xfrm::Reduct(build_reduct(lx, "initReduct", &init_rules)?),
        Xfrm::Reduct(build_reduct(lx, "vReduct", &v_rules)?),
        Xfrm::Reduct(build_reduct(lx, "detReduct", &det_rules)?),
        Xfrm::Reduct(build_reduct(lx, "conjReduct", &conj_rules)?),
        Xfrm::Reduct(build_reduct(lx, "actReduct", &act_rules)?),
        Xfrm::ScSeqToSr(build_sc_to_sr(lx, "leftVdomXfrm", left_vdom_rules)?),
        Xfrm::Sr(SrXfrm::new("srXfrm")),
        Xfrm::Role(role),
        Xfrm::SvToQ(SvToQXfrm::new("svToQXfrm")),
        Xfrm::InvertQ(InvertQXfrm::new("invertQXfrm")),
        Xfrm::Vconj(VconjXfrm::new("vconjXfrm")),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipped_lexicon_compiles() {
        let parser = build_parser().unwrap();
        assert!(parser.lx.len() > 100);
        assert_eq!(parser.xfrms.len(), 11);
        assert_eq!(parser.lx.version, "1.0");
    }

    #[test]
    fn verbs_have_roots_and_forms() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let go = lx.find("go");
        assert!(lx.check_prop(go, WordProps::ROOT));
        let went = lx.find("went");
        assert_eq!(lx.def(went), go);
        assert!(lx.check_prop(went, WordProps::PAST));
    }

    #[test]
    fn be_forms_share_the_be_class() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let be_sc = lx.sc_key("be");
        assert_eq!(lx.syn_class_of(lx.find("is")), be_sc);
        assert_eq!(lx.syn_class_of(lx.find("was")), be_sc);
        assert!(lx.is_sc_for_verb(be_sc));
    }

    #[test]
    fn singleton_classes_take_word_props() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let to_sc = lx.syn_class_of(lx.find("to"));
        assert_eq!(lx.sc_spelling(to_sc), "to");
        assert!(lx.check_sc_prop(to_sc, WordProps::PREP));
    }

    #[test]
    fn contraction_rules_installed() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let wont = lx.find("won't");
        assert!(lx.check_prop(wont, WordProps::CONTRACTION));
        assert!(!lx.rewrites_for(wont).is_empty());
    }

    #[test]
    fn prep_verb_lists_populated() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let on = lx.find("on");
        let sit = lx.find("sit");
        assert!(lx.prep_verb_fitness(on, sit) >= 0);
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = build_parser().unwrap().to_blob();
        let b = build_parser().unwrap().to_blob();
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_grammar_sequence_collides() {
        let parser = build_parser().unwrap();
        let lx = &parser.lx;
        let mut x = ReductXfrm::new("t");
        x.rules.set_dimensions(2, (lx.sc_len() - 1) as u16);
        let ids = sc_seq(lx, &["DetS", "Noun"]).unwrap();
        let vix = x.push_value(0, 0, VerbProps::NONE, lx.sc_key("X"), Action::Reduce);
        x.rules.define_entry(&ids, vix).unwrap();
        assert!(x.rules.define_entry(&ids, vix).is_err());
    }
}
