//! The tokenizer. Source text is first split into *parse blocks* (nested
//! quote and bracket regions), then each leaf block is turned into a
//! sequence of lexicon keys. Contractions are expanded, rewrite rules
//! applied, and runs of capitalized words merged into proper-name tokens.
//!
//! Indexing is per `char`; the `SourceMap` carries the char vector plus
//! line/column maps so every token can be traced back to its origin.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::defs::{Key, WordProps};
use crate::lexicon::Lexicon;

/// The source text plus its line/column maps.
pub struct SourceMap {
    pub chars: Vec<char>,
    line: Vec<u32>,
    col: Vec<u32>,
}

impl SourceMap {
    pub fn new(src: &str, lno: u32) -> SourceMap {
        let chars: Vec<char> = src.chars().collect();
        let mut line = Vec::with_capacity(chars.len());
        let mut col = Vec::with_capacity(chars.len());
        let mut ln = lno;
        let mut c = 1u32;
        for &ch in &chars {
            line.push(ln);
            col.push(c);
            c += 1;
            if ch == '\n' {
                ln += 1;
                c = 1;
            }
        }
        SourceMap { chars, line, col }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn line_at(&self, i: usize) -> u32 {
        self.line.get(i).copied().unwrap_or(0)
    }

    pub fn col_at(&self, i: usize) -> u32 {
        self.col.get(i).copied().unwrap_or(0)
    }

    /// The source text for an inclusive span.
    pub fn text(&self, s: usize, e: usize) -> String {
        if s > e || s >= self.chars.len() {
            return String::new();
        }
        let e = e.min(self.chars.len() - 1);
        self.chars[s..=e].iter().collect()
    }
}

/// A region of source to parse. Nested blocks come from quote/bracket
/// pairs; `opener` records which character opened the region.
pub struct Block {
    pub s: usize,
    pub e: usize,
    pub sub: Vec<Block>,
    pub opener: Option<char>,
}

impl Block {
    fn leaf(s: usize, e: usize) -> Block {
        Block {
            s,
            e,
            sub: Vec::new(),
            opener: None,
        }
    }
}

fn is_wrd_char(i: usize, e: usize, src: &[char]) -> bool {
    if i > e || i >= src.len() {
        return false;
    }
    let c = src[i];
    if c.is_alphanumeric() || c == '_' || c == '\'' {
        return true;
    }
    if c == '-' {
        // an embedded hyphen, not a dash
        return i > 0
            && src[i - 1].is_alphanumeric()
            && i + 1 <= e
            && src.get(i + 1).map(|c| c.is_alphanumeric()).unwrap_or(false);
    }
    false
}

/// Is src[i] a period followed by a single letter/digit? ("B.C.")
fn is_dot_letter_seq(i: usize, e: usize, src: &[char]) -> bool {
    if i + 2 <= e
        && src.get(i).copied() == Some('.')
        && src.get(i + 1).map(|c| c.is_alphanumeric()).unwrap_or(false)
    {
        return i + 2 >= e || !src.get(i + 2).map(|c| c.is_alphanumeric()).unwrap_or(false);
    }
    false
}

/// Lex a word starting at src[i]; returns the index of its last char.
fn lex_wrd(lx: &Lexicon, i0: usize, e: usize, src: &[char]) -> usize {
    let s = i0;
    let mut i = i0;
    // numbers: "1,200.00" accepts periods and commas between digits
    if src[i].is_ascii_digit() {
        while i + 1 < e {
            if src[i + 1].is_ascii_digit() {
                i += 1;
                continue;
            }
            if (src[i + 1] == '.' || src[i + 1] == ',')
                && src[i].is_ascii_digit()
                && i + 2 <= e
                && src.get(i + 2).map(|c| c.is_ascii_digit()).unwrap_or(false)
            {
                i += 2;
                continue;
            }
            break;
        }
        while is_wrd_char(i + 1, e, src) {
            i += 1;
        }
        return i;
    }
    // abbreviations: "B.C.", "U.S.A"
    if is_dot_letter_seq(i + 1, e, src) {
        while is_dot_letter_seq(i + 1, e, src) {
            i += 2;
        }
        if i + 1 <= e && src.get(i + 1).copied() == Some('.') {
            i += 1;
        }
        return i;
    }
    // default: consume word chars
    while is_wrd_char(i + 1, e, src) {
        i += 1;
    }
    // "Mr.": bind the trailing period of a known abbreviation
    if i + 1 <= e && src.get(i + 1).copied() == Some('.') {
        let sp: String = src[s..=i].iter().collect();
        let tok = lx.find(&sp.to_lowercase());
        if lx.check_prop(tok, WordProps::ABBREV) {
            i += 1;
        }
    }
    i
}

/// Append token(s) for a word containing an apostrophe, expanding the
/// contraction. A dedicated rewrite rule wins; otherwise the canonical
/// splits apply; "'s" and "'d" stay ambiguous for the parse to resolve.
fn append_contract(
    lx: &mut Lexicon,
    s: usize,
    sp: &str,
    toks: &mut Vec<Key>,
    tok_loc: &mut Vec<usize>,
) {
    let key = lx.lookup(&sp.to_lowercase(), false);
    if !key.is_none() {
        if let Some(rule) = lx.find_rewrite(&[key], 0).cloned() {
            let want_upper = sp.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
            for t in lx.rewrite_rhs(&rule, want_upper) {
                toks.push(t);
                tok_loc.push(s);
            }
            return;
        }
    }
    let terms: Vec<&str> = sp.split('\'').collect();
    if terms.len() == 2 {
        let (t0, t1) = (terms[0], terms[1]);
        let t0lc = t0.to_lowercase();
        let t1lc = t1.to_lowercase();
        let l0 = t0.chars().count();
        if l0 > 2 && t0lc.ends_with('n') && t1lc == "t" {
            // "wouldn't"
            let stem: String = t0.chars().take(l0 - 1).collect();
            toks.push(lx.get_vocab(&stem));
            toks.push(lx.get_vocab("not"));
            tok_loc.extend([s, s]);
            return;
        }
        if l0 >= 1 && t1lc == "re" {
            toks.push(lx.get_vocab(t0));
            toks.push(lx.get_vocab("are"));
            tok_loc.extend([s, s]);
            return;
        }
        if l0 >= 1 && t1lc == "ll" {
            toks.push(lx.get_vocab(t0));
            toks.push(lx.get_vocab("will"));
            tok_loc.extend([s, s]);
            return;
        }
        if l0 >= 1 && t1lc == "ve" {
            toks.push(lx.get_vocab(t0));
            toks.push(lx.get_vocab("have"));
            tok_loc.extend([s, s]);
            return;
        }
        if t1lc == "s" || t1lc == "d" {
            toks.push(lx.get_vocab(t0));
            toks.push(lx.get_vocab(&format!("'{t1}")));
            tok_loc.extend([s, s]);
            return;
        }
    }
    // accept as a single word
    toks.push(lx.get_vocab(sp));
    tok_loc.push(s);
}

/// One linear pass applying rewrite rules. The first rule whose lhs matches
/// at the current token wins (candidates are longest-lhs first). Rhs terms
/// take the location of the first lhs term, except the last rhs term, which
/// takes the last lhs term's location.
fn apply_rewrite_rules(
    lx: &mut Lexicon,
    toks: Vec<Key>,
    tok_loc: Vec<usize>,
) -> (Vec<Key>, Vec<usize>) {
    let mut out_toks = Vec::with_capacity(toks.len());
    let mut out_loc = Vec::with_capacity(tok_loc.len());
    let mut i = 0;
    while i < toks.len() {
        if let Some(rule) = lx.find_rewrite(&toks, i).cloned() {
            let n_lhs = rule.lhs.len();
            let s_first = tok_loc[i];
            let s_last = tok_loc[i + n_lhs - 1];
            let sp = lx.spelling(toks[i]);
            let want_upper =
                sp.chars().any(|c| c.is_alphabetic()) && !sp.chars().any(|c| c.is_lowercase());
            let terms = lx.rewrite_rhs(&rule, want_upper);
            let n = terms.len();
            for (j, t) in terms.into_iter().enumerate() {
                out_toks.push(t);
                out_loc.push(if j == n - 1 { s_last } else { s_first });
            }
            i += n_lhs;
        } else {
            out_toks.push(toks[i]);
            out_loc.push(tok_loc[i]);
            i += 1;
        }
    }
    (out_toks, out_loc)
}

fn can_be_proper_name(lx: &Lexicon, i: usize, toks: &[Key]) -> bool {
    if i >= toks.len() {
        return false;
    }
    let sp = lx.spelling(toks[i]);
    let mut chars = sp.chars();
    match (chars.next(), chars.next()) {
        (Some(c0), Some(c1)) if c0.is_uppercase() && c1.is_lowercase() => {
            // Camel case. Known words are rejected unless marked as names.
            let props = lx.props(toks[i]);
            props.intersects(WordProps::N) || props.is_empty()
        }
        _ => false,
    }
}

/// A middle initial: single capital followed by a period token.
fn can_be_mi(lx: &Lexicon, i: usize, toks: &[Key]) -> bool {
    if i + 1 >= toks.len() {
        return false;
    }
    let sp = lx.spelling(toks[i]);
    let sp_nxt = lx.spelling(toks[i + 1]);
    sp.chars().count() == 1
        && sp.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
        && sp_nxt == "."
}

/// Merge "John F. Kennedy" into a single token.
fn rewrite_proper_names(
    lx: &mut Lexicon,
    toks: Vec<Key>,
    tok_loc: Vec<usize>,
) -> (Vec<Key>, Vec<usize>) {
    let mut out_toks = Vec::with_capacity(toks.len());
    let mut out_loc = Vec::with_capacity(tok_loc.len());
    let mut i = 0;
    while i < toks.len() {
        if can_be_proper_name(lx, i, &toks) {
            let mut e = i;
            let mut sp_seq = vec![lx.spelling(toks[i]).to_string()];
            loop {
                if can_be_proper_name(lx, e + 1, &toks) {
                    sp_seq.push(lx.spelling(toks[e + 1]).to_string());
                    e += 1;
                    continue;
                }
                if can_be_mi(lx, e + 1, &toks) {
                    sp_seq.push(format!("{}.", lx.spelling(toks[e + 1])));
                    e += 2;
                    continue;
                }
                break;
            }
            if e > i {
                let sp_all = sp_seq.join(" ");
                out_toks.push(lx.get_vocab(&sp_all));
                out_loc.push(tok_loc[i]);
                i = e + 1;
                continue;
            }
        }
        out_toks.push(toks[i]);
        out_loc.push(tok_loc[i]);
        i += 1;
    }
    (out_toks, out_loc)
}

/// Tokenize the region spanned by `blk`. Returns the token keys and, for
/// each token, the char index of its first character.
pub fn lex(lx: &mut Lexicon, sm: &SourceMap, blk: &Block) -> (Vec<Key>, Vec<usize>) {
    let src = &sm.chars;
    let (s, e) = (blk.s, blk.e);
    if src.is_empty() || e < s || e >= src.len() {
        return (Vec::new(), Vec::new());
    }
    let mut toks = Vec::new();
    let mut tok_loc = Vec::new();
    let mut i = s;
    while i <= e {
        let c = src[i];
        if c == ' ' || c == '\t' || c == '\r' || c == '\n' {
            i += 1;
            continue;
        }
        let tok_s = i;
        if src[i] == '-' {
            // a run of dashes lexes as a single token
            while i <= e && src[i] == '-' {
                i += 1;
            }
            let sp: String = src[tok_s..i].iter().collect();
            toks.push(lx.get_vocab(&sp));
            tok_loc.push(tok_s);
            continue;
        }
        if src[i] == '$' && is_wrd_char(i + 1, e, src) {
            // $ binds to the word that follows
            i += 1;
        }
        if is_wrd_char(i, e, src) {
            let ix_e = lex_wrd(lx, i, e, src);
            let sp: String = src[tok_s..=ix_e].iter().collect();
            if sp.contains('\'') {
                append_contract(lx, tok_s, &sp, &mut toks, &mut tok_loc);
            } else {
                toks.push(lx.get_vocab(&sp));
                tok_loc.push(tok_s);
            }
            i = ix_e + 1;
            continue;
        }
        // everything else is a single-char token
        toks.push(lx.get_vocab(&src[i].to_string()));
        tok_loc.push(tok_s);
        i += 1;
    }
    let (toks, tok_loc) = apply_rewrite_rules(lx, toks, tok_loc);
    rewrite_proper_names(lx, toks, tok_loc)
}

fn is_opener(c: char) -> bool {
    matches!(c, '(' | '{' | '[' | '\'' | '"')
}

/// Find the closer for the nested scope opened at src[i]; -1 -> None.
pub fn find_closer(src: &[char], i: usize, imax: usize) -> Option<usize> {
    let opener = src[i];
    let closer = match opener {
        '{' => '}',
        '[' => ']',
        '(' => ')',
        c => c,
    };
    let mut i = i + 1;
    if i > imax {
        return None;
    }
    while i <= imax {
        if src[i] == closer {
            return Some(i);
        }
        if is_opener(src[i]) {
            match find_closer(src, i, imax) {
                None => i += 1,
                Some(e) => i = e + 1,
            }
            continue;
        }
        i += 1;
    }
    None
}

fn get_parse_blks(src: &[char], mut i: usize, imax: usize) -> Vec<Block> {
    let mut lst = Vec::new();
    while i <= imax {
        let e;
        if is_opener(src[i]) {
            match find_closer(src, i, imax) {
                None => {
                    // malformed: skip the stray opener
                    i += 1;
                    continue;
                }
                Some(close) => {
                    // quote or parenthesized text; the span excludes the
                    // delimiters themselves
                    if close > i + 1 {
                        let content = get_parse_blks(src, i + 1, close - 1);
                        if !content.is_empty() {
                            lst.push(Block {
                                s: i + 1,
                                e: close - 1,
                                sub: content,
                                opener: Some(src[i]),
                            });
                        }
                    }
                    e = close;
                }
            }
        } else {
            let mut scan = i;
            while scan + 1 <= imax && !is_opener(src[scan + 1]) {
                scan += 1;
            }
            lst.push(Block::leaf(i, scan));
            e = scan;
        }
        i = e + 1;
    }
    lst
}

/// Break source text into parse blocks and build the line/column maps.
/// `lno` is the line number at which this chunk starts.
pub fn parse_blocks(src: &str, lno: u32) -> (SourceMap, Vec<Block>) {
    static CONTRACT_TICK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)'(\w+)").unwrap());
    static LEAD_TICK: Lazy<Regex> = Lazy::new(|| Regex::new(r"''(\w+)").unwrap());
    static TRAIL_TICK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)''").unwrap());

    let sm = SourceMap::new(src, lno);
    if sm.is_empty() {
        return (sm, Vec::new());
    }
    // Hide contraction ticks behind '~' so they are not confused with
    // single-quote marks during block splitting. All rewrites preserve
    // length, so block spans index the original text.
    let hidden = CONTRACT_TICK.replace_all(src, "$1~$2");
    let hidden = LEAD_TICK.replace_all(&hidden, "'~$1");
    let hidden = TRAIL_TICK.replace_all(&hidden, "$1~'");
    let hidden = hidden
        .replace("'em", "~em")
        .replace("'tis", "~tis")
        .replace("'twas", "~twas");
    let hidden_chars: Vec<char> = hidden.chars().collect();
    debug_assert_eq!(hidden_chars.len(), sm.len());
    let blks = get_parse_blks(&hidden_chars, 0, hidden_chars.len() - 1);
    (sm, blks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::Key;
    use crate::lexicon::RewriteRule;

    fn test_lexicon() -> Lexicon {
        let mut lx = Lexicon::new();
        lx.sc_dict.lookup("X", true);
        lx.define(
            "would",
            WordProps::VADJ,
            Key::NONE,
        );
        lx.define("not", WordProps::NONE, Key::NONE);
        lx.define("are", WordProps::VERB | WordProps::PRESENT, Key::NONE);
        lx.define("will", WordProps::VADJ, Key::NONE);
        lx.define("have", WordProps::VERB | WordProps::ROOT, Key::NONE);
        lx.define("mr", WordProps::ABBREV, Key::NONE);
        lx
    }

    fn spell(lx: &Lexicon, toks: &[Key]) -> Vec<String> {
        toks.iter().map(|&t| lx.spelling(t).to_string()).collect()
    }

    fn lex_all(lx: &mut Lexicon, src: &str) -> (Vec<Key>, Vec<usize>, SourceMap) {
        let (sm, blks) = parse_blocks(src, 1);
        let mut toks = Vec::new();
        let mut locs = Vec::new();
        fn walk(lx: &mut Lexicon, sm: &SourceMap, blks: &[Block], toks: &mut Vec<Key>, locs: &mut Vec<usize>) {
            for b in blks {
                if b.sub.is_empty() {
                    let (t, l) = lex(lx, sm, b);
                    toks.extend(t);
                    locs.extend(l);
                } else {
                    walk(lx, sm, &b.sub, toks, locs);
                }
            }
        }
        walk(lx, &sm, &blks, &mut toks, &mut locs);
        (toks, locs, sm)
    }

    #[test]
    fn simple_words_and_period() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "cats sleep.");
        assert_eq!(spell(&lx, &toks), vec!["cats", "sleep", "."]);
    }

    #[test]
    fn nt_contraction_expands_to_not() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "I wouldn't");
        assert_eq!(spell(&lx, &toks), vec!["I", "would", "not"]);
    }

    #[test]
    fn re_ll_ve_contractions_expand() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "we're we'll we've");
        assert_eq!(
            spell(&lx, &toks),
            vec!["we", "are", "we", "will", "we", "have"]
        );
    }

    #[test]
    fn s_and_d_stay_ambiguous() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "John's he'd");
        assert_eq!(spell(&lx, &toks), vec!["John", "'s", "he", "'d"]);
    }

    #[test]
    fn rewrite_rule_wins_over_heuristics() {
        let mut lx = test_lexicon();
        let wont = lx.define("won't", WordProps::CONTRACTION, Key::NONE);
        let will = lx.find("will");
        let not = lx.find("not");
        lx.add_rewrite(RewriteRule {
            lhs: vec![wont],
            rhs: vec![will, not],
        });
        lx.sort_rewrites();
        let (toks, _, _) = lex_all(&mut lx, "won't");
        assert_eq!(spell(&lx, &toks), vec!["will", "not"]);
    }

    #[test]
    fn numbers_consume_embedded_separators() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "1,200.00 paid");
        assert_eq!(spell(&lx, &toks), vec!["1,200.00", "paid"]);
    }

    #[test]
    fn trailing_period_stays_out_of_plain_number() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "in 1963.");
        assert_eq!(spell(&lx, &toks), vec!["in", "1963", "."]);
    }

    #[test]
    fn dollar_binds_to_word() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "$12 each");
        assert_eq!(spell(&lx, &toks), vec!["$12", "each"]);
    }

    #[test]
    fn dash_runs_collapse() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "yes -- no");
        assert_eq!(spell(&lx, &toks), vec!["yes", "--", "no"]);
    }

    #[test]
    fn dotted_abbreviation_is_one_token() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "U.S.A. won");
        assert_eq!(spell(&lx, &toks), vec!["U.S.A.", "won"]);
    }

    #[test]
    fn known_abbreviation_binds_period() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "Mr. Smith");
        // "Mr." keeps its period; "Mr. Smith" then merges as a proper name
        assert_eq!(spell(&lx, &toks), vec!["Mr. Smith"]);
    }

    #[test]
    fn proper_names_merge_with_middle_initial() {
        let mut lx = test_lexicon();
        let (toks, _, _) = lex_all(&mut lx, "John F. Kennedy died");
        assert_eq!(spell(&lx, &toks), vec!["John F. Kennedy", "died"]);
    }

    #[test]
    fn known_lowercase_words_do_not_merge() {
        let mut lx = test_lexicon();
        lx.define("the", WordProps::DETS, Key::NONE);
        let (toks, _, _) = lex_all(&mut lx, "The cat");
        assert_eq!(spell(&lx, &toks), vec!["The", "cat"]);
    }

    #[test]
    fn quotes_open_nested_blocks() {
        let (sm, blks) = parse_blocks("he said \"go home\" now", 1);
        assert_eq!(blks.len(), 3);
        assert!(blks[0].sub.is_empty());
        assert_eq!(blks[1].opener, Some('"'));
        assert_eq!(sm.text(blks[1].s, blks[1].e), "go home");
    }

    #[test]
    fn mismatched_opener_is_skipped() {
        let (_, blks) = parse_blocks("a ( b", 1);
        // the stray "(" is dropped; both sides still lex
        assert_eq!(blks.len(), 2);
    }

    #[test]
    fn contraction_tick_not_taken_for_quote() {
        let (sm, blks) = parse_blocks("'tis John's day", 1);
        assert_eq!(blks.len(), 1);
        assert!(blks[0].sub.is_empty());
        assert_eq!(sm.text(blks[0].s, blks[0].e), "'tis John's day");
    }

    #[test]
    fn single_quoted_region_nests() {
        let (sm, blks) = parse_blocks("she said 'go now' softly", 1);
        assert_eq!(blks.len(), 3);
        assert_eq!(sm.text(blks[1].s, blks[1].e), "go now");
    }

    #[test]
    fn token_spans_lie_inside_input() {
        let mut lx = test_lexicon();
        let src = "Mr. Smith paid $1,200.00 -- I wouldn't.";
        let (toks, locs, sm) = lex_all(&mut lx, src);
        for (t, &loc) in toks.iter().zip(locs.iter()) {
            let sp = lx.spelling(*t);
            assert!(loc < sm.len(), "token {sp} out of range");
            // rewritten tokens share locations, so only the start is bound
            assert!(sm.line_at(loc) >= 1);
        }
    }

    #[test]
    fn line_and_column_maps_track_newlines() {
        let sm = SourceMap::new("ab\ncd", 3);
        assert_eq!(sm.line_at(0), 3);
        assert_eq!(sm.col_at(1), 2);
        assert_eq!(sm.line_at(3), 4);
        assert_eq!(sm.col_at(3), 1);
    }

    #[test]
    fn tokens_match_when_embedded_in_quotes() {
        let mut lx = test_lexicon();
        let (plain, _, _) = lex_all(&mut lx, "the cat sat");
        let (quoted, _, _) = lex_all(&mut lx, "\"the cat sat\"");
        assert_eq!(spell(&lx, &plain), spell(&lx, &quoted));
    }
}
