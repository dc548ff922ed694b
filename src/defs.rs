use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Per-lexicon-entry property bitmask.
///
/// A word can belong to several classes at once ("that" is both a weak
/// determinant and a clausal preposition), so these are independent bits
/// rather than an enum.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct WordProps(pub u32);

impl WordProps {
    pub const NONE: WordProps = WordProps(0);
    // parts of speech
    pub const CONJ: WordProps = WordProps(0x1);
    pub const CLPREP: WordProps = WordProps(0x2);
    pub const QUALPREP: WordProps = WordProps(0x4);
    pub const PREP: WordProps = WordProps(0x8);
    pub const N: WordProps = WordProps(0x10);
    pub const NOUN: WordProps = WordProps(0x20);
    pub const MOD: WordProps = WordProps(0x40);
    pub const PRONOUN: WordProps = WordProps(0x80);
    pub const X: WordProps = WordProps(0x100);
    // verb forms
    pub const VERB: WordProps = WordProps(0x200);
    pub const ROOT: WordProps = WordProps(0x400);
    pub const GERUND: WordProps = WordProps(0x800);
    pub const PARTICIPLE: WordProps = WordProps(0x1000);
    pub const PRESENT: WordProps = WordProps(0x2000);
    pub const PAST: WordProps = WordProps(0x4000);
    pub const VADJ: WordProps = WordProps(0x8000);
    /// "mr", "mrs": a trailing period binds to the word.
    pub const ABBREV: WordProps = WordProps(0x10000);
    pub const CONTRACTION: WordProps = WordProps(0x20000);
    /// negative contraction of a verb: "can't"
    pub const VNEG_CONTRACTION: WordProps = WordProps(0x40000);
    /// who/what/why/when/where/how
    pub const QUERY: WordProps = WordProps(0x80000);
    // strong ("a") and weak ("that") determinants
    pub const DETS: WordProps = WordProps(0x100000);
    pub const DETW: WordProps = WordProps(0x200000);
    // thematic forms for verb roots
    pub const AVGT: WordProps = WordProps(0x400000);
    pub const AVE: WordProps = WordProps(0x800000);
    pub const EVT: WordProps = WordProps(0x1000000);
    /// verb-phrase qualifier: "I BEGAN to eat"
    pub const VPQ: WordProps = WordProps(0x2000000);
    pub const PUNCT: WordProps = WordProps(0x4000000);

    /// All the verb-form bits: a word carrying any of these lexes as a verb.
    pub const VERB_FORMS: WordProps = WordProps(
        Self::ROOT.0
            | Self::GERUND.0
            | Self::PARTICIPLE.0
            | Self::PRESENT.0
            | Self::PAST.0
            | Self::VADJ.0,
    );

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, m: WordProps) -> bool {
        self.0 & m.0 != 0
    }
}

impl BitOr for WordProps {
    type Output = WordProps;
    fn bitor(self, rhs: WordProps) -> WordProps {
        WordProps(self.0 | rhs.0)
    }
}

impl BitOrAssign for WordProps {
    fn bitor_assign(&mut self, rhs: WordProps) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for WordProps {
    type Output = WordProps;
    fn bitand(self, rhs: WordProps) -> WordProps {
        WordProps(self.0 & rhs.0)
    }
}

impl Not for WordProps {
    type Output = WordProps;
    fn not(self) -> WordProps {
        WordProps(!self.0)
    }
}

impl fmt::Debug for WordProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WordProps({})", self.dump())
    }
}

const WP_NAMES: &[(WordProps, &str)] = &[
    (WordProps::CONJ, "CONJ"),
    (WordProps::CLPREP, "CLPREP"),
    (WordProps::QUALPREP, "QUALPREP"),
    (WordProps::PREP, "PREP"),
    (WordProps::N, "N"),
    (WordProps::NOUN, "NOUN"),
    (WordProps::MOD, "MOD"),
    (WordProps::PRONOUN, "PRONOUN"),
    (WordProps::X, "X"),
    (WordProps::VERB, "VERB"),
    (WordProps::ROOT, "ROOT"),
    (WordProps::GERUND, "GERUND"),
    (WordProps::PARTICIPLE, "PARTICIPLE"),
    (WordProps::PRESENT, "PRESENT"),
    (WordProps::PAST, "PAST"),
    (WordProps::VADJ, "VADJ"),
    (WordProps::ABBREV, "ABBREV"),
    (WordProps::CONTRACTION, "CONTRACTION"),
    (WordProps::VNEG_CONTRACTION, "VNEG_CONTRACTION"),
    (WordProps::QUERY, "QUERY"),
    (WordProps::DETS, "DETS"),
    (WordProps::DETW, "DETW"),
    (WordProps::AVGT, "AVGT"),
    (WordProps::AVE, "AVE"),
    (WordProps::EVT, "EVT"),
    (WordProps::VPQ, "VPQ"),
    (WordProps::PUNCT, "PUNCT"),
];

impl WordProps {
    /// Space-joined names of the set bits, for traces and rule dumps.
    pub fn dump(self) -> String {
        let parts: Vec<&str> = WP_NAMES
            .iter()
            .filter(|(m, _)| self.intersects(*m))
            .map(|(_, n)| *n)
            .collect();
        parts.join(" ")
    }
}

/// Per-parse-node verb property bitmask: tense, aspect, mood, plus the
/// structural flags the transforms trade in.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct VerbProps(pub u32);

impl VerbProps {
    pub const NONE: VerbProps = VerbProps(0);
    pub const NEG: VerbProps = VerbProps(0x1);
    /// verb-adjunct ("would", "should")
    pub const ADJ: VerbProps = VerbProps(0x2);
    pub const PAST: VerbProps = VerbProps(0x4);
    pub const PRESENT: VerbProps = VerbProps(0x8);
    pub const FUTURE: VerbProps = VerbProps(0x10);
    pub const PERFECT: VerbProps = VerbProps(0x20);
    pub const SUBJUNCTIVE: VerbProps = VerbProps(0x40);
    pub const INF: VerbProps = VerbProps(0x80);
    pub const ROOT: VerbProps = VerbProps(0x100);
    pub const GERUND: VerbProps = VerbProps(0x200);
    pub const PASSIVE: VerbProps = VerbProps(0x400);
    pub const ATOMIC: VerbProps = VerbProps(0x800);
    pub const PRELUDE: VerbProps = VerbProps(0x1000);
    pub const ACT_NAME: VerbProps = VerbProps(0x2000);
    pub const AVGT: VerbProps = VerbProps(0x4000);
    pub const AVE: VerbProps = VerbProps(0x8000);
    pub const EVT: VerbProps = VerbProps(0x10000);
    pub const IS_Q: VerbProps = VerbProps(0x20000);
    pub const NOT_MODIFIED: VerbProps = VerbProps(0x40000);
    pub const NO_SUBJECT: VerbProps = VerbProps(0x80000);
    pub const BE_QUERY: VerbProps = VerbProps(0x100000);
    pub const VADJ_QUERY: VerbProps = VerbProps(0x200000);
    pub const SUBORD_CL: VerbProps = VerbProps(0x400000);
    pub const NV_EXPR: VerbProps = VerbProps(0x800000);
    pub const AGENT_ACTION: VerbProps = VerbProps(0x1000000);
    pub const IMMUTABLE_SUB: VerbProps = VerbProps(0x2000000);

    pub const TENSE_MASK: VerbProps =
        VerbProps(Self::PAST.0 | Self::PRESENT.0 | Self::FUTURE.0 | Self::SUBJUNCTIVE.0);
    pub const SEMANTIC_MASK: VerbProps = VerbProps(Self::NEG.0 | Self::PRELUDE.0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, m: VerbProps) -> bool {
        self.0 & m.0 != 0
    }
}

impl BitOr for VerbProps {
    type Output = VerbProps;
    fn bitor(self, rhs: VerbProps) -> VerbProps {
        VerbProps(self.0 | rhs.0)
    }
}

impl BitOrAssign for VerbProps {
    fn bitor_assign(&mut self, rhs: VerbProps) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for VerbProps {
    type Output = VerbProps;
    fn bitand(self, rhs: VerbProps) -> VerbProps {
        VerbProps(self.0 & rhs.0)
    }
}

impl Not for VerbProps {
    type Output = VerbProps;
    fn not(self) -> VerbProps {
        VerbProps(!self.0)
    }
}

impl fmt::Debug for VerbProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerbProps({})", self.dump(" "))
    }
}

const VP_NAMES: &[(VerbProps, &str)] = &[
    (VerbProps::NEG, "not"),
    (VerbProps::ADJ, "adj"),
    (VerbProps::PAST, "past"),
    (VerbProps::PRESENT, "present"),
    (VerbProps::FUTURE, "future"),
    (VerbProps::PERFECT, "perfect"),
    (VerbProps::SUBJUNCTIVE, "subj"),
    (VerbProps::INF, "inf"),
    (VerbProps::ROOT, "root"),
    (VerbProps::GERUND, "ger"),
    (VerbProps::PASSIVE, "passive"),
    (VerbProps::ATOMIC, "atomic"),
    (VerbProps::PRELUDE, "prelude"),
    (VerbProps::ACT_NAME, "actname"),
    (VerbProps::AVGT, "avgt"),
    (VerbProps::AVE, "ave"),
    (VerbProps::EVT, "evt"),
    (VerbProps::IS_Q, "isQ"),
    (VerbProps::NOT_MODIFIED, "notModified"),
    (VerbProps::NO_SUBJECT, "noSubject"),
    (VerbProps::BE_QUERY, "beQuery"),
    (VerbProps::VADJ_QUERY, "vadjQuery"),
    (VerbProps::SUBORD_CL, "subordCl"),
    (VerbProps::NV_EXPR, "nvExpr"),
    (VerbProps::AGENT_ACTION, "agentAct"),
    (VerbProps::IMMUTABLE_SUB, "immutableSub"),
];

impl VerbProps {
    pub fn dump(self, delim: &str) -> String {
        let parts: Vec<&str> = VP_NAMES
            .iter()
            .filter(|(m, _)| self.intersects(*m))
            .map(|(_, n)| *n)
            .collect();
        parts.join(delim)
    }
}

/// Syntax relation: the label on the edge from a node to its scope parent.
///
/// `Agent..AuxTheme` are thematic; the rest are structural. `Undef` marks a
/// node inside a verb's scope whose relation has not been decided.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Hash, PartialOrd, Ord)]
pub enum SynRel {
    Agent = 0,
    Topic = 1,
    Exper = 2,
    Theme = 3,
    AuxTheme = 4,
    Modifies = 5,
    IsQby = 6,
    Vconj = 7,
    VAdj = 8,
    #[default]
    Undef = 9,
}

/// Number of word->verb relations (the size of a node's `rel` table).
pub const NUM_RELS: usize = 10;

/// Meta-roles used only in role-rule data; resolved per verb form before
/// assignment. Never stored on a node.
pub const SR_SUB: u8 = 10;
pub const SR_OBJ: u8 = 11;
/// "no relation" marker in role-rule data.
pub const SR_NONE: u8 = 0xff;

const SR_IDS: [&str; 12] = [
    "agent", "topic", "exper", "theme", "auxTheme", "modifies", "qual", "vconj", "vAdj", "undef",
    "sub", "obj",
];

impl SynRel {
    pub fn from_u8(v: u8) -> Option<SynRel> {
        match v {
            0 => Some(SynRel::Agent),
            1 => Some(SynRel::Topic),
            2 => Some(SynRel::Exper),
            3 => Some(SynRel::Theme),
            4 => Some(SynRel::AuxTheme),
            5 => Some(SynRel::Modifies),
            6 => Some(SynRel::IsQby),
            7 => Some(SynRel::Vconj),
            8 => Some(SynRel::VAdj),
            9 => Some(SynRel::Undef),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Output label for the relation. Also covers the meta-roles in rule
    /// dumps, hence the `u8` argument.
    pub fn label_of(v: u8) -> &'static str {
        SR_IDS.get(v as usize).copied().unwrap_or("?")
    }

    pub fn label(self) -> &'static str {
        SR_IDS[self as usize]
    }

    pub const ALL: [SynRel; NUM_RELS] = [
        SynRel::Agent,
        SynRel::Topic,
        SynRel::Exper,
        SynRel::Theme,
        SynRel::AuxTheme,
        SynRel::Modifies,
        SynRel::IsQby,
        SynRel::Vconj,
        SynRel::VAdj,
        SynRel::Undef,
    ];
}

/// Handle of a parse-graph node: an index into the graph's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Nid(pub u32);

impl Nid {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Key of a lexicon entry. Key 0 is reserved: it means "no entry".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Key(pub u32);

impl Key {
    pub const NONE: Key = Key(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Key of a syntax class in the syntax-class dictionary. Same reservation:
/// 0 means "no class".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct ScKey(pub u32);

impl ScKey {
    pub const NONE: ScKey = ScKey(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Raised inside a transform when a precondition is violated. The transform
/// framework catches it at the per-transform boundary and moves on with the
/// graph as-is; it never escapes to callers of `parse_text`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("parse error: {0}")]
pub struct ParseErr(pub String);

impl ParseErr {
    pub fn new(msg: impl Into<String>) -> ParseErr {
        ParseErr(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_props_compose() {
        let p = WordProps::VERB | WordProps::PAST;
        assert!(p.intersects(WordProps::VERB));
        assert!(p.intersects(WordProps::PAST));
        assert!(!p.intersects(WordProps::NOUN));
    }

    #[test]
    fn verb_forms_cover_all_verb_bits() {
        for m in [
            WordProps::ROOT,
            WordProps::GERUND,
            WordProps::PARTICIPLE,
            WordProps::PRESENT,
            WordProps::PAST,
            WordProps::VADJ,
        ] {
            assert!(WordProps::VERB_FORMS.intersects(m));
        }
        assert!(!WordProps::VERB_FORMS.intersects(WordProps::VERB));
    }

    #[test]
    fn tense_mask_is_exactly_the_four_tenses() {
        let m = VerbProps::TENSE_MASK;
        assert!(m.intersects(VerbProps::PAST));
        assert!(m.intersects(VerbProps::PRESENT));
        assert!(m.intersects(VerbProps::FUTURE));
        assert!(m.intersects(VerbProps::SUBJUNCTIVE));
        assert!(!m.intersects(VerbProps::PERFECT));
        assert!(!m.intersects(VerbProps::NEG));
    }

    #[test]
    fn props_dump_names_set_bits() {
        let p = WordProps::VERB | WordProps::ROOT;
        assert_eq!(p.dump(), "VERB ROOT");
        let v = VerbProps::NEG | VerbProps::PRESENT;
        assert_eq!(v.dump(" "), "not present");
    }

    #[test]
    fn syn_rel_round_trips_through_u8() {
        for r in SynRel::ALL {
            assert_eq!(SynRel::from_u8(r as u8), Some(r));
        }
        assert_eq!(SynRel::from_u8(12), None);
    }

    #[test]
    fn syn_rel_labels() {
        assert_eq!(SynRel::Agent.label(), "agent");
        assert_eq!(SynRel::Modifies.label(), "modifies");
        assert_eq!(SynRel::label_of(SR_SUB), "sub");
        assert_eq!(SynRel::label_of(SR_OBJ), "obj");
    }
}
