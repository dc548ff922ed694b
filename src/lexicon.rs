//! The vocabulary. A `Dict` maps spellings to integer keys and keys to
//! spellings and property masks. The `Lexicon` wraps two of them (words and
//! syntax classes) and the side tables that hang off word entries:
//! definitions, rewrite rules, prep->verb associations, and the assigned
//! syntax class per word.
//!
//! Entries are created two ways: by the lexicon compiler at build time, and
//! online when the tokenizer meets a word it has never seen. Online creation
//! infers a definition from the word's shape ("looked" -> "look") and is the
//! only mutation after load.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashMap;

use crate::defs::{Key, ScKey, WordProps};
use crate::serializer::{Decoder, Encoder, RuleFileError, Width};

/// A rewrite rule: when the token window matches `lhs`, replace it with
/// `rhs`. Keyed on `lhs[0]` in the lexicon's rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteRule {
    pub lhs: Vec<Key>,
    pub rhs: Vec<Key>,
}

/// Root and props discovered for an unknown word that turned out to be a
/// variant of a known one.
#[derive(Default, Clone, Copy)]
pub struct WordVariant {
    pub root: Key,
    pub props: WordProps,
}

/// Spelling <-> key <-> props. Key 0 is reserved for "absent".
pub struct Dict {
    by_spelling: FxHashMap<String, u32>,
    spelling: Vec<String>,
    props: Vec<WordProps>,
}

impl Dict {
    pub fn new() -> Dict {
        Dict {
            by_spelling: FxHashMap::default(),
            spelling: Vec::new(),
            props: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.spelling.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spelling.is_empty()
    }

    pub fn lookup(&mut self, sp: &str, create_if_missing: bool) -> u32 {
        if let Some(&ix) = self.by_spelling.get(sp) {
            return ix;
        }
        if !create_if_missing {
            return 0;
        }
        let ix = self.spelling.len() as u32;
        self.by_spelling.insert(sp.to_string(), ix);
        self.spelling.push(sp.to_string());
        self.props.push(WordProps::NONE);
        ix
    }

    pub fn find(&self, sp: &str) -> u32 {
        self.by_spelling.get(sp).copied().unwrap_or(0)
    }

    pub fn spelling(&self, ix: u32) -> &str {
        &self.spelling[ix as usize]
    }

    pub fn props(&self, ix: u32) -> WordProps {
        self.props[ix as usize]
    }

    pub fn set_prop(&mut self, ix: u32, p: WordProps) {
        self.props[ix as usize] |= p;
    }

    /// Entry 0 never satisfies a property check.
    pub fn check_prop(&self, ix: u32, m: WordProps) -> bool {
        ix != 0 && self.props[ix as usize].intersects(m)
    }

    pub fn encode(&self, enc: &mut Encoder) {
        enc.str_lst(&self.spelling);
        let props: Vec<u32> = self.props.iter().map(|p| p.0).collect();
        enc.int_lst(&props, Width::W32);
    }

    pub fn decode(dec: &mut Decoder) -> Result<Dict, RuleFileError> {
        let spelling = dec.str_lst()?;
        let props = dec.int_lst(Width::W32)?;
        if spelling.len() != props.len() {
            return Err(RuleFileError::Malformed(
                "dictionary spelling/props length mismatch".into(),
            ));
        }
        let mut by_spelling = FxHashMap::default();
        for (i, sp) in spelling.iter().enumerate() {
            by_spelling.insert(sp.clone(), i as u32);
        }
        Ok(Dict {
            by_spelling,
            spelling,
            props: props.into_iter().map(WordProps).collect(),
        })
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Lexicon {
    pub dict: Dict,
    /// Per-entry definition: the key of the entry's root form. A root points
    /// to itself.
    defs: Vec<Key>,
    /// Per-entry assigned syntax class.
    syn_class: Vec<ScKey>,
    /// Per-entry rewrite rules, keyed on `lhs[0]`, longest lhs first.
    rw_rules: Vec<Vec<RewriteRule>>,
    /// prep key -> verb-root keys for which it is the canonical object prep.
    prep_to_verbs: Vec<Vec<Key>>,
    /// The syntax-class dictionary. Shares the word-props bit space.
    pub sc_dict: Dict,
    /// Words that map to a syntax class of their own ("not", "to", ...).
    pub sc_singletons: Vec<String>,
    /// Version stamp carried from the lexicon source file.
    pub version: String,
}

impl Lexicon {
    /// An empty lexicon with the reserved null entry in both dictionaries.
    pub fn new() -> Lexicon {
        let mut lx = Lexicon {
            dict: Dict::new(),
            defs: Vec::new(),
            syn_class: Vec::new(),
            rw_rules: Vec::new(),
            prep_to_verbs: Vec::new(),
            sc_dict: Dict::new(),
            sc_singletons: Vec::new(),
            version: "?".to_string(),
        };
        lx.lookup("_NULL_", true);
        lx.sc_dict.lookup("_NULL_", true);
        lx
    }

    pub fn len(&self) -> usize {
        self.dict.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict.len() <= 1
    }

    /// Look up `sp`, keeping the side tables parallel on creation.
    pub fn lookup(&mut self, sp: &str, create_if_missing: bool) -> Key {
        let ix = self.dict.find(sp);
        if ix != 0 {
            return Key(ix);
        }
        if !create_if_missing {
            return Key::NONE;
        }
        let ix = self.dict.lookup(sp, true);
        self.defs.push(Key::NONE);
        self.syn_class.push(ScKey::NONE);
        self.rw_rules.push(Vec::new());
        self.prep_to_verbs.push(Vec::new());
        Key(ix)
    }

    pub fn find(&self, sp: &str) -> Key {
        Key(self.dict.find(sp))
    }

    /// Define an entry: create if needed, add props, set the definition.
    /// A zero `def` leaves an existing definition alone and self-defines a
    /// fresh entry.
    pub fn define(&mut self, sp: &str, props: WordProps, def: Key) -> Key {
        let key = self.lookup(sp, true);
        self.set_prop(key, props);
        if !def.is_none() {
            self.set_def(key, def);
        } else if self.def(key).is_none() {
            self.set_def(key, key);
        }
        key
    }

    pub fn spelling(&self, key: Key) -> &str {
        self.dict.spelling(key.0)
    }

    pub fn props(&self, key: Key) -> WordProps {
        self.dict.props(key.0)
    }

    pub fn set_prop(&mut self, key: Key, p: WordProps) {
        self.dict.set_prop(key.0, p);
    }

    pub fn check_prop(&self, key: Key, m: WordProps) -> bool {
        self.dict.check_prop(key.0, m)
    }

    pub fn def(&self, key: Key) -> Key {
        self.defs[key.index()]
    }

    pub fn set_def(&mut self, key: Key, def: Key) {
        self.defs[key.index()] = def;
    }

    pub fn syn_class_of(&self, key: Key) -> ScKey {
        self.syn_class[key.index()]
    }

    pub fn set_syn_class(&mut self, key: Key, sc: ScKey) {
        self.syn_class[key.index()] = sc;
    }

    // ------------------------------------------------------------------
    // rewrite rules
    // ------------------------------------------------------------------

    /// Install a rule under its `lhs[0]` key. The compiler sorts rule sets
    /// longest-lhs-first once all rules are in.
    pub fn add_rewrite(&mut self, rule: RewriteRule) {
        let k = rule.lhs[0].index();
        self.rw_rules[k].push(rule);
    }

    pub fn sort_rewrites(&mut self) {
        for set in &mut self.rw_rules {
            set.sort_by(|a, b| b.lhs.len().cmp(&a.lhs.len()));
        }
    }

    pub fn rewrites_for(&self, key: Key) -> &[RewriteRule] {
        &self.rw_rules[key.index()]
    }

    /// Find the first rule whose lhs matches `toks` starting at `i`.
    /// Candidates are tried longest-lhs first.
    pub fn find_rewrite(&self, toks: &[Key], i: usize) -> Option<&RewriteRule> {
        let rules = &self.rw_rules[toks[i].index()];
        rules
            .iter()
            .find(|r| i + r.lhs.len() <= toks.len() && toks[i..i + r.lhs.len()] == r.lhs[..])
    }

    /// The rhs tokens for a rule. With `want_upper`, the first rhs term is
    /// re-spelled with an upper-case initial (which may create an entry).
    pub fn rewrite_rhs(&mut self, rule: &RewriteRule, want_upper: bool) -> Vec<Key> {
        let mut rhs = rule.rhs.clone();
        if want_upper {
            let sp = self.spelling(rhs[0]);
            let mut chars = sp.chars();
            if let Some(c0) = chars.next() {
                let respelled: String = c0.to_uppercase().chain(chars).collect();
                rhs[0] = self.get_vocab(&respelled);
            }
        }
        rhs
    }

    // ------------------------------------------------------------------
    // prep -> verbs
    // ------------------------------------------------------------------

    pub fn set_prep_verbs(&mut self, prep: Key, verbs: Vec<Key>) {
        self.prep_to_verbs[prep.index()] = verbs;
    }

    pub fn prep_verbs(&self, prep: Key) -> &[Key] {
        &self.prep_to_verbs[prep.index()]
    }

    /// Fitness of `prep` as the object preposition of `verb`: its index in
    /// the verb list, or -1 when absent. Lower index = better fit.
    pub fn prep_verb_fitness(&self, prep: Key, verb: Key) -> i32 {
        self.prep_to_verbs[prep.index()]
            .iter()
            .position(|&v| v == verb)
            .map(|i| i as i32)
            .unwrap_or(-1)
    }

    // ------------------------------------------------------------------
    // unknown-word resolution
    // ------------------------------------------------------------------

    /// Is `wrd` (already lower-cased) a variant of a known verb? On success
    /// fills `v` with the root key and inferred props.
    fn is_verb_variant(&mut self, wrd: &str, v: &mut WordVariant) -> bool {
        let l = wrd.len();
        // negative contraction: "isn't", "didn't"
        if l >= 5 && wrd.ends_with("n't") {
            let vkey = self.lookup(&wrd[..l - 3], false);
            if !vkey.is_none() {
                v.props = WordProps::VNEG_CONTRACTION | self.props(vkey);
                v.props = v.props & !WordProps::ROOT;
                v.root = self.def(vkey);
                return true;
            }
        }
        // "...ing"
        if l >= 5 && wrd.ends_with("ing") {
            let root = wrd[..l - 3].to_string();
            // "wanting"
            let key = self.lookup(&root, false);
            if self.check_prop(key, WordProps::ROOT) {
                v.root = key;
                v.props |= WordProps::VERB | WordProps::GERUND;
                return true;
            }
            // "hating"
            let key = self.lookup(&format!("{root}e"), false);
            if self.check_prop(key, WordProps::ROOT) {
                v.root = key;
                v.props |= WordProps::VERB | WordProps::GERUND;
                return true;
            }
            // "shipping"
            let rb = root.as_bytes();
            if rb.len() >= 2
                && rb[rb.len() - 1] == rb[rb.len() - 2]
                && root.is_char_boundary(root.len() - 1)
            {
                let key = self.lookup(&root[..root.len() - 1], false);
                if self.check_prop(key, WordProps::ROOT) {
                    v.root = key;
                    v.props |= WordProps::VERB | WordProps::GERUND;
                    return true;
                }
            }
        }
        // "...ed"
        if l >= 4 && wrd.ends_with("ed") {
            let root = wrd[..l - 2].to_string();
            let past = WordProps::VERB | WordProps::PARTICIPLE | WordProps::PAST;
            // "wanted"
            let key = self.lookup(&root, false);
            if self.check_prop(key, WordProps::ROOT) {
                v.root = key;
                v.props |= past;
                return true;
            }
            // "hated"
            let key = self.lookup(&format!("{root}e"), false);
            if self.check_prop(key, WordProps::ROOT) {
                v.root = key;
                v.props |= past;
                return true;
            }
            // "shipped"
            let rb = root.as_bytes();
            if rb.len() >= 2
                && rb[rb.len() - 1] == rb[rb.len() - 2]
                && root.is_char_boundary(root.len() - 1)
            {
                let key = self.lookup(&root[..root.len() - 1], false);
                if self.check_prop(key, WordProps::ROOT) {
                    v.root = key;
                    v.props |= past;
                    return true;
                }
            }
        }
        // "...es": "watches" (but not "bees")
        if l >= 4 && wrd.ends_with("es") {
            let test = &wrd[..l - 2];
            if test != "be" {
                let key = self.lookup(test, false);
                if self.check_prop(key, WordProps::ROOT) {
                    v.root = key;
                    v.props |= WordProps::VERB | WordProps::PRESENT;
                    return true;
                }
            }
        }
        // "eats"
        if l >= 3 && wrd.ends_with('s') {
            let key = self.lookup(&wrd[..l - 1], false);
            if self.check_prop(key, WordProps::ROOT) {
                v.root = key;
                v.props |= WordProps::VERB | WordProps::PRESENT;
                return true;
            }
        }
        false
    }

    /// Is `wrd` (lower-cased) a variant of any known word? Verb variants
    /// first, then adverbs in "-ly", then simple noun plurals.
    pub fn is_word_variant(&mut self, wrd: &str, v: &mut WordVariant) -> bool {
        let is_verb_var = self.is_verb_variant(wrd, v);
        let l = wrd.len();
        // adverb form of a known modifier: "softly"
        if l >= 5 && wrd.ends_with("ly") {
            let root = self.lookup(&wrd[..l - 2], false);
            if self.check_prop(root, WordProps::MOD) {
                v.props |= WordProps::MOD;
                if v.root.is_none() {
                    v.root = root;
                }
                return true;
            }
        }
        // simple plural of a noun: "cats"
        if l >= 4 && wrd.ends_with('s') {
            let root = self.lookup(&wrd[..l - 1], false);
            if self.check_prop(root, WordProps::NOUN) {
                v.props |= WordProps::NOUN;
                if v.root.is_none() {
                    v.root = root;
                }
                return true;
            }
        }
        is_verb_var
    }

    /// The syntax-class description for an entry, composed from its props
    /// (and for a few conjunctions, its spelling). Multi-class words compose
    /// with '|': "Prep|Mod".
    pub fn sc_desc(&self, key: Key) -> String {
        let sp = self.spelling(key);
        if self.check_prop(key, WordProps::DETS) {
            return "DetS".to_string();
        }
        if sp == "and" || sp == "or" {
            return "AndOr".to_string();
        }
        if self.check_prop(key, WordProps::CONJ) {
            return "Conj".to_string();
        }
        if self.check_prop(key, WordProps::QUERY) {
            return "Query".to_string();
        }
        if self.check_prop(key, WordProps::GERUND) {
            return "Ger".to_string();
        }
        let mut l: Vec<&str> = Vec::new();
        if self.check_prop(key, WordProps::DETW) {
            l.push("DetW");
        }
        if self.check_prop(key, WordProps::CLPREP) {
            l.push("ClPrep");
        } else if self.check_prop(key, WordProps::QUALPREP) {
            l.push("QualPrep");
        } else if self.check_prop(key, WordProps::PREP) {
            l.push("Prep");
        }
        if self.check_prop(key, WordProps::NOUN) {
            l.push("Noun");
        }
        if self.check_prop(key, WordProps::N | WordProps::PRONOUN) {
            l.push("N");
        }
        if self.check_prop(key, WordProps::MOD) {
            l.push("Mod");
        }
        if self.check_prop(key, WordProps::VERB_FORMS) {
            if self.check_prop(key, WordProps::VADJ) {
                l.push("VAdj");
            } else {
                l.push("V");
            }
        }
        if l.is_empty() {
            l.push("X");
        }
        l.join("|")
    }

    /// Get the entry for `sp`, creating and resolving it if unknown:
    /// inherit from the lower-case form, else try variant heuristics, else
    /// self-define with class "X".
    pub fn get_vocab(&mut self, sp: &str) -> Key {
        let key = self.lookup(sp, false);
        if !key.is_none() {
            return key;
        }
        let key = self.lookup(sp, true);
        let lc = sp.to_lowercase();
        if lc != sp {
            let lc_key = self.lookup(&lc, false);
            if !lc_key.is_none() {
                self.set_def(key, self.def(lc_key));
                self.set_prop(key, self.props(lc_key));
                self.set_syn_class(key, self.syn_class_of(lc_key));
                return key;
            }
        }
        let mut wv = WordVariant::default();
        if self.is_word_variant(&lc, &mut wv) {
            self.set_def(key, wv.root);
            self.set_prop(key, wv.props);
            let desc = self.sc_desc(key);
            let sc = ScKey(self.sc_dict.lookup(&desc, false));
            self.set_syn_class(key, sc);
            return key;
        }
        // define to self
        self.set_def(key, key);
        let sc = ScKey(self.sc_dict.lookup("X", false));
        self.set_syn_class(key, sc);
        key
    }

    // ------------------------------------------------------------------
    // syntax classes
    // ------------------------------------------------------------------

    pub fn sc_len(&self) -> usize {
        self.sc_dict.len()
    }

    pub fn sc_spelling(&self, sc: ScKey) -> &str {
        self.sc_dict.spelling(sc.0)
    }

    pub fn sc_key(&self, sp: &str) -> ScKey {
        ScKey(self.sc_dict.find(sp))
    }

    pub fn check_sc_prop(&self, sc: ScKey, m: WordProps) -> bool {
        self.sc_dict.check_prop(sc.0, m)
    }

    /// Is `sc` a syntax class for a verb?
    pub fn is_sc_for_verb(&self, sc: ScKey) -> bool {
        self.sc_dict.check_prop(sc.0, WordProps::VERB)
    }

    pub fn sc_seq_to_str(&self, seq: &[u16]) -> String {
        let parts: Vec<&str> = seq
            .iter()
            .map(|&c| self.sc_dict.spelling(c as u32))
            .collect();
        parts.join(" ")
    }

    // ------------------------------------------------------------------
    // spelling helpers
    // ------------------------------------------------------------------

    /// Spell out a word-key sequence, inserting spaces between alphanumeric
    /// neighbors and after clause punctuation.
    pub fn spell_words(&self, wrds: &[Key]) -> String {
        static WANT_SP_AFTER_PUNCT: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"([.?!;:\-)]+)(\w+)").unwrap());
        static WANT_SP_BEFORE_DOLLAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)(\$)").unwrap());
        if wrds.is_empty() {
            return String::new();
        }
        let mut buf = self.spelling(wrds[0]).to_string();
        for &w in &wrds[1..] {
            let sp = self.spelling(w);
            let last_an = buf.chars().last().map(|c| c.is_alphanumeric()).unwrap_or(false);
            let first_an = sp.chars().next().map(|c| c.is_alphanumeric()).unwrap_or(false);
            if last_an && first_an {
                buf.push(' ');
            }
            buf.push_str(sp);
        }
        let buf = WANT_SP_AFTER_PUNCT.replace_all(&buf, "$1 $2");
        WANT_SP_BEFORE_DOLLAR.replace_all(&buf, "$1 $2").into_owned()
    }

    // ------------------------------------------------------------------
    // serialization
    // ------------------------------------------------------------------

    fn rule_to_ints(rule: &RewriteRule) -> Vec<u32> {
        let mut v = Vec::with_capacity(2 + rule.lhs.len() + rule.rhs.len());
        v.push(rule.lhs.len() as u32);
        v.push(rule.rhs.len() as u32);
        v.extend(rule.lhs.iter().map(|k| k.0));
        v.extend(rule.rhs.iter().map(|k| k.0));
        v
    }

    fn rule_from_ints(v: &[u32]) -> Result<RewriteRule, RuleFileError> {
        if v.len() < 2 {
            return Err(RuleFileError::Malformed("short rewrite rule".into()));
        }
        let n_lhs = v[0] as usize;
        let n_rhs = v[1] as usize;
        if v.len() != 2 + n_lhs + n_rhs || n_lhs == 0 {
            return Err(RuleFileError::Malformed("malformed rewrite rule".into()));
        }
        Ok(RewriteRule {
            lhs: v[2..2 + n_lhs].iter().map(|&k| Key(k)).collect(),
            rhs: v[2 + n_lhs..].iter().map(|&k| Key(k)).collect(),
        })
    }

    pub fn encode(&self, enc: &mut Encoder) {
        self.dict.encode(enc);
        let defs: Vec<u32> = self.defs.iter().map(|k| k.0).collect();
        enc.int_lst(&defs, Width::W32);
        for set in &self.rw_rules {
            let flat: Vec<Vec<u32>> = set.iter().map(Self::rule_to_ints).collect();
            enc.lst_lst(&flat, Width::W32);
        }
        let ptv: Vec<Vec<u32>> = self
            .prep_to_verbs
            .iter()
            .map(|vs| vs.iter().map(|k| k.0).collect())
            .collect();
        enc.lst_lst(&ptv, Width::W32);
        let scs: Vec<u32> = self.syn_class.iter().map(|s| s.0).collect();
        enc.int_lst(&scs, Width::W32);
        enc.str_lst(&self.sc_singletons);
        self.sc_dict.encode(enc);
    }

    pub fn decode(dec: &mut Decoder) -> Result<Lexicon, RuleFileError> {
        let dict = Dict::decode(dec)?;
        let defs: Vec<Key> = dec.int_lst(Width::W32)?.into_iter().map(Key).collect();
        let mut rw_rules = Vec::with_capacity(dict.len());
        for _ in 0..dict.len() {
            let flat = dec.lst_lst(Width::W32)?;
            let mut set = Vec::with_capacity(flat.len());
            for ints in &flat {
                set.push(Self::rule_from_ints(ints)?);
            }
            rw_rules.push(set);
        }
        let mut prep_to_verbs: Vec<Vec<Key>> = dec
            .lst_lst(Width::W32)?
            .into_iter()
            .map(|vs| vs.into_iter().map(Key).collect())
            .collect();
        let syn_class: Vec<ScKey> = dec.int_lst(Width::W32)?.into_iter().map(ScKey).collect();
        let sc_singletons = dec.str_lst()?;
        let sc_dict = Dict::decode(dec)?;
        if defs.len() != dict.len() || syn_class.len() != dict.len() {
            return Err(RuleFileError::Malformed(
                "lexicon side tables out of step with dictionary".into(),
            ));
        }
        prep_to_verbs.resize(dict.len(), Vec::new());
        Ok(Lexicon {
            dict,
            defs,
            syn_class,
            rw_rules,
            prep_to_verbs,
            sc_dict,
            sc_singletons,
            version: "?".to_string(),
        })
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Lexicon {
        let mut lx = Lexicon::new();
        lx.sc_dict.lookup("X", true);
        lx.sc_dict.lookup("V", true);
        lx.sc_dict.lookup("Ger", true);
        lx.sc_dict.lookup("Mod", true);
        lx.sc_dict.lookup("Noun", true);
        lx.define(
            "look",
            WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
            Key::NONE,
        );
        lx.define(
            "hate",
            WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
            Key::NONE,
        );
        lx.define(
            "ship",
            WordProps::VERB | WordProps::ROOT | WordProps::PRESENT,
            Key::NONE,
        );
        lx.define("soft", WordProps::MOD, Key::NONE);
        lx.define("cat", WordProps::NOUN, Key::NONE);
        lx
    }

    #[test]
    fn keys_start_at_one() {
        let mut lx = Lexicon::new();
        let k = lx.lookup("first", true);
        assert_eq!(k, Key(1));
        assert_eq!(lx.lookup("missing", false), Key::NONE);
    }

    #[test]
    fn define_self_defines_fresh_entries() {
        let mut lx = Lexicon::new();
        let k = lx.define("word", WordProps::NOUN, Key::NONE);
        assert_eq!(lx.def(k), k);
    }

    #[test]
    fn gerund_of_known_root() {
        let mut lx = seeded();
        let k = lx.get_vocab("looking");
        assert_eq!(lx.def(k), lx.find("look"));
        assert!(lx.check_prop(k, WordProps::GERUND));
        assert!(lx.check_prop(k, WordProps::VERB));
    }

    #[test]
    fn gerund_strips_trailing_e_and_doubled_consonant() {
        let mut lx = seeded();
        let hating = lx.get_vocab("hating");
        assert_eq!(lx.def(hating), lx.find("hate"));
        let shipping = lx.get_vocab("shipping");
        assert_eq!(lx.def(shipping), lx.find("ship"));
    }

    #[test]
    fn past_forms_resolve() {
        let mut lx = seeded();
        let looked = lx.get_vocab("looked");
        assert_eq!(lx.def(looked), lx.find("look"));
        assert!(lx.check_prop(looked, WordProps::PAST));
        let hated = lx.get_vocab("hated");
        assert_eq!(lx.def(hated), lx.find("hate"));
        let shipped = lx.get_vocab("shipped");
        assert_eq!(lx.def(shipped), lx.find("ship"));
    }

    #[test]
    fn present_s_forms_resolve() {
        let mut lx = seeded();
        let looks = lx.get_vocab("looks");
        assert_eq!(lx.def(looks), lx.find("look"));
        assert!(lx.check_prop(looks, WordProps::PRESENT));
    }

    #[test]
    fn negative_contraction_resolves() {
        let mut lx = seeded();
        lx.define("did", WordProps::VERB | WordProps::PAST, Key::NONE);
        let k = lx.get_vocab("didn't");
        assert!(lx.check_prop(k, WordProps::VNEG_CONTRACTION));
        assert_eq!(lx.def(k), lx.def(lx.find("did")));
    }

    #[test]
    fn adverb_and_plural_variants() {
        let mut lx = seeded();
        let softly = lx.get_vocab("softly");
        assert!(lx.check_prop(softly, WordProps::MOD));
        assert_eq!(lx.def(softly), lx.find("soft"));
        let cats = lx.get_vocab("cats");
        assert!(lx.check_prop(cats, WordProps::NOUN));
        assert_eq!(lx.def(cats), lx.find("cat"));
    }

    #[test]
    fn unknown_word_self_defines_as_x() {
        let mut lx = seeded();
        let k = lx.get_vocab("zyzzyva");
        assert_eq!(lx.def(k), k);
        assert_eq!(lx.syn_class_of(k), lx.sc_key("X"));
    }

    #[test]
    fn capitalized_word_inherits_from_lower_case() {
        let mut lx = seeded();
        let lower = lx.find("cat");
        let upper = lx.get_vocab("Cat");
        assert_eq!(lx.def(upper), lower);
        assert!(lx.check_prop(upper, WordProps::NOUN));
    }

    #[test]
    fn rewrite_rules_match_longest_first() {
        let mut lx = Lexicon::new();
        let a = lx.define("a", WordProps::NONE, Key::NONE);
        let b = lx.define("b", WordProps::NONE, Key::NONE);
        let c = lx.define("c", WordProps::NONE, Key::NONE);
        lx.add_rewrite(RewriteRule {
            lhs: vec![a],
            rhs: vec![c],
        });
        lx.add_rewrite(RewriteRule {
            lhs: vec![a, b],
            rhs: vec![c, c],
        });
        lx.sort_rewrites();
        let toks = vec![a, b];
        let rule = lx.find_rewrite(&toks, 0).unwrap();
        assert_eq!(rule.lhs.len(), 2);
        let toks = vec![a, c];
        let rule = lx.find_rewrite(&toks, 0).unwrap();
        assert_eq!(rule.lhs.len(), 1);
    }

    #[test]
    fn prep_verb_fitness_is_list_index() {
        let mut lx = Lexicon::new();
        let on = lx.define("on", WordProps::PREP, Key::NONE);
        let sit = lx.define("sit", WordProps::VERB | WordProps::ROOT, Key::NONE);
        let lie = lx.define("lie", WordProps::VERB | WordProps::ROOT, Key::NONE);
        let eat = lx.define("eat", WordProps::VERB | WordProps::ROOT, Key::NONE);
        lx.set_prep_verbs(on, vec![sit, lie]);
        assert_eq!(lx.prep_verb_fitness(on, sit), 0);
        assert_eq!(lx.prep_verb_fitness(on, lie), 1);
        assert_eq!(lx.prep_verb_fitness(on, eat), -1);
    }

    #[test]
    fn sc_desc_composes_classes() {
        let mut lx = Lexicon::new();
        lx.define("near", WordProps::PREP | WordProps::MOD, Key::NONE);
        let k = lx.find("near");
        assert_eq!(lx.sc_desc(k), "Prep|Mod");
        lx.define("the", WordProps::DETS, Key::NONE);
        assert_eq!(lx.sc_desc(lx.find("the")), "DetS");
        lx.define("and", WordProps::CONJ, Key::NONE);
        assert_eq!(lx.sc_desc(lx.find("and")), "AndOr");
    }

    #[test]
    fn spell_words_spaces_between_words() {
        let mut lx = Lexicon::new();
        let the = lx.define("the", WordProps::NONE, Key::NONE);
        let cat = lx.define("cat", WordProps::NONE, Key::NONE);
        assert_eq!(lx.spell_words(&[the, cat]), "the cat");
        let period = lx.define(".", WordProps::NONE, Key::NONE);
        assert_eq!(lx.spell_words(&[the, period]), "the.");
    }

    #[test]
    fn lexicon_round_trips_through_bytes() {
        let mut lx = seeded();
        let on = lx.define("on", WordProps::PREP, Key::NONE);
        let look = lx.find("look");
        lx.set_prep_verbs(on, vec![look]);
        let a = lx.find("cat");
        lx.add_rewrite(RewriteRule {
            lhs: vec![a],
            rhs: vec![on],
        });
        lx.sort_rewrites();

        let mut enc = Encoder::new();
        lx.encode(&mut enc);
        let bytes = enc.finish();

        let mut dec = Decoder::new(&bytes);
        let lx2 = Lexicon::decode(&mut dec).unwrap();
        assert!(dec.at_end());

        let mut enc2 = Encoder::new();
        lx2.encode(&mut enc2);
        assert_eq!(bytes, enc2.finish());
        assert_eq!(lx2.find("cat"), a);
        assert_eq!(lx2.prep_verb_fitness(on, look), 0);
    }
}
