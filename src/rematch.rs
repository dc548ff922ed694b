//! Regular-expression matching over sequences of terms. Pattern atoms are
//! identifiers matched by a caller-supplied `TermMatcher`; `[ ... ]` nests a
//! sub-pattern, `%name` references a declared pattern, `|` separates
//! variants, and `?`, `*`, `+` quantify. Quantifiers are semi-greedy: a term
//! consumes as many source terms as it can while still allowing the whole
//! match to complete. The first variant that completes the match wins.
//!
//! A successful match yields one element per top-level pattern atom, each
//! the list of leaf source terms that atom consumed.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::serializer::RuleFileError;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Quant {
    One,
    /// `?`: zero or one
    Opt,
    /// `*`
    Star,
    /// `+`
    Plus,
}

#[derive(Clone, Debug)]
pub struct ReTerm {
    pub quant: Quant,
    /// Alternatives, tried left to right. A variant starting with '%' names
    /// a nested pattern.
    pub variants: Vec<String>,
}

/// Matches a single pattern atom against the source at `state`, returning
/// the consumed terms (None = no match). `state` is an index into the
/// caller's source sequence.
pub trait TermMatcher<T> {
    fn match_term(&self, state: usize, term: &str) -> Option<Vec<T>>;
}

/// A set of compiled patterns, keyed by declared name ("%obj") and by raw
/// source text for ad-hoc patterns.
pub struct ReSet {
    dict: FxHashMap<String, Rc<Vec<ReTerm>>>,
}

impl ReSet {
    pub fn new() -> ReSet {
        ReSet {
            dict: FxHashMap::default(),
        }
    }

    /// Declare a named pattern; the name must start with '%'.
    pub fn decl(&mut self, name: &str, src: &str) -> Result<(), RuleFileError> {
        debug_assert!(name.starts_with('%'));
        let compiled = self.compile(src)?;
        self.dict.insert(name.to_string(), Rc::new(compiled));
        Ok(())
    }

    /// Compile and cache a raw pattern so later matches need no mutation.
    pub fn prepare(&mut self, src: &str) -> Result<(), RuleFileError> {
        if !self.dict.contains_key(src) {
            let compiled = self.compile(src)?;
            self.dict.insert(src.to_string(), Rc::new(compiled));
        }
        Ok(())
    }

    fn compile(&mut self, src: &str) -> Result<Vec<ReTerm>, RuleFileError> {
        // canonicalize space around bars
        let mut canon = String::with_capacity(src.len());
        let mut chars = src.trim().chars().peekable();
        while let Some(c) = chars.next() {
            if c == ' ' {
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
                if chars.peek() == Some(&'|') {
                    continue;
                }
                canon.push(' ');
            } else if c == '|' {
                canon.push('|');
                while chars.peek() == Some(&' ') {
                    chars.next();
                }
            } else {
                canon.push(c);
            }
        }
        let src: Vec<char> = canon.chars().collect();
        let mut re_lst = Vec::new();
        let mut i = 0;
        while i < src.len() {
            if src[i] == ' ' {
                i += 1;
                continue;
            }
            let mut term = ReTerm {
                quant: Quant::One,
                variants: Vec::new(),
            };
            // collect alternatives for this term
            loop {
                i = self.compile_term(&mut term.variants, &src, i)?;
                if i >= src.len() {
                    break;
                }
                let c = src[i];
                i += 1;
                if c == '|' {
                    continue;
                }
                match c {
                    '*' => term.quant = Quant::Star,
                    '+' => term.quant = Quant::Plus,
                    '?' => term.quant = Quant::Opt,
                    _ => {}
                }
                break;
            }
            re_lst.push(term);
        }
        Ok(re_lst)
    }

    /// Compile one alternative starting at src[i]; returns the index just
    /// past it.
    fn compile_term(
        &mut self,
        variants: &mut Vec<String>,
        src: &[char],
        i: usize,
    ) -> Result<usize, RuleFileError> {
        let c0 = src[i];
        if c0 == '[' {
            // nested pattern: declare it under its own source text
            let e = find_bracket_close(src, i).ok_or_else(|| {
                RuleFileError::Malformed("unclosed '[' in pattern".to_string())
            })?;
            let outer: String = src[i..=e].iter().collect();
            let name = format!("%{outer}");
            let inner: String = src[i + 1..e].iter().collect();
            let compiled = self.compile(&inner)?;
            self.dict.insert(name.clone(), Rc::new(compiled));
            variants.push(name);
            return Ok(e + 1);
        }
        if c0 == '%' || c0 == '_' || c0 == '!' || c0 == ':' || c0.is_alphanumeric() {
            let mut e = i;
            while e + 1 < src.len()
                && (src[e + 1].is_alphanumeric()
                    || src[e + 1] == '_'
                    || src[e + 1] == ':'
                    || src[e + 1] == '!')
            {
                e += 1;
            }
            variants.push(src[i..=e].iter().collect());
            return Ok(e + 1);
        }
        if c0 == '.' {
            variants.push(".".to_string());
            return Ok(i + 1);
        }
        Err(RuleFileError::Malformed(format!(
            "malformed pattern at '{c0}'"
        )))
    }

    /// Match the source (seen through `matcher`) against a pattern. The
    /// pattern must have been `prepare`d or `decl`ed. Returns one leaf list
    /// per top-level atom, or None.
    pub fn match_src<T: Clone>(
        &self,
        matcher: &dyn TermMatcher<T>,
        re: &str,
    ) -> Option<Vec<Vec<T>>> {
        let re_lst = self.dict.get(re)?.clone();
        let mut result: Vec<Vec<T>> = Vec::new();
        if match_lst(&self.dict, matcher, 0, &re_lst, &mut result) {
            Some(result)
        } else {
            None
        }
    }
}

impl Default for ReSet {
    fn default() -> Self {
        Self::new()
    }
}

fn find_bracket_close(src: &[char], i: usize) -> Option<usize> {
    let mut depth = 0;
    for (j, &c) in src.iter().enumerate().skip(i) {
        if c == '[' {
            depth += 1;
        } else if c == ']' {
            depth -= 1;
            if depth == 0 {
                return Some(j);
            }
        }
    }
    None
}

/// Match source terms against `re_lst` starting at `state`, appending one
/// leaf list per pattern term to `mat_lst`. Backtracks through quantifier
/// modes, longest first.
fn match_lst<T: Clone>(
    dict: &FxHashMap<String, Rc<Vec<ReTerm>>>,
    matcher: &dyn TermMatcher<T>,
    mut state: usize,
    re_lst: &[ReTerm],
    mat_lst: &mut Vec<Vec<T>>,
) -> bool {
    let mut ix_re = mat_lst.len();
    if ix_re == re_lst.len() {
        return true;
    }
    // run through unqualified terms
    let term = loop {
        let term = &re_lst[ix_re];
        if term.quant != Quant::One {
            break term;
        }
        match match_variants(dict, matcher, state, &term.variants) {
            None => return false,
            Some(terms) => {
                state += terms.len();
                mat_lst.push(terms);
                ix_re += 1;
                if ix_re == re_lst.len() {
                    return true;
                }
            }
        }
    };
    // The term is qualified: enumerate the ways source terms can be
    // consumed by it ("modes"), then find the longest mode that lets the
    // rest of the match complete.
    let mut modes: Vec<Vec<T>> = Vec::new();
    if matches!(term.quant, Quant::Star | Quant::Opt) {
        modes.push(Vec::new());
    }
    let mut consumed: Vec<T> = Vec::new();
    let mut statex = state;
    while let Some(terms) = match_variants(dict, matcher, statex, &term.variants) {
        statex += terms.len();
        consumed.extend(terms);
        modes.push(consumed.clone());
        if term.quant == Quant::Opt {
            break;
        }
    }
    if modes.is_empty() {
        return false;
    }
    let n_mat = mat_lst.len();
    for mode in modes.iter().rev() {
        mat_lst.truncate(n_mat);
        mat_lst.push(mode.clone());
        let new_state = state + mode.len();
        if match_lst(dict, matcher, new_state, re_lst, mat_lst) {
            return true;
        }
    }
    mat_lst.truncate(n_mat);
    false
}

/// Try the variants left to right; first success wins. Nested patterns
/// contribute their flattened leaves.
fn match_variants<T: Clone>(
    dict: &FxHashMap<String, Rc<Vec<ReTerm>>>,
    matcher: &dyn TermMatcher<T>,
    state: usize,
    variants: &[String],
) -> Option<Vec<T>> {
    for v in variants {
        if v.starts_with('%') {
            let nested = match dict.get(v) {
                Some(n) => n.clone(),
                None => continue,
            };
            let mut terms: Vec<Vec<T>> = Vec::new();
            if match_lst(dict, matcher, state, &nested, &mut terms) {
                return Some(terms.into_iter().flatten().collect());
            }
        } else if let Some(terms) = matcher.match_term(state, v) {
            return Some(terms);
        }
    }
    None
}
