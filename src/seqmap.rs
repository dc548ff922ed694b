//! A `SeqMap` is a set of (sequence -> value-index) mappings over a bounded
//! alphabet of syntax-class ids. It is a matrix of cells, `n_rows` by
//! `n_cols`: row = position in the sequence, column = class id. Each cell
//! holds the set of columns reachable in the next row, plus a checksum /
//! value-index table for every sequence that terminates there.
//!
//! The checksum disambiguates distinct sequences that reach the same cell;
//! a duplicate (cell, checksum) pair at build time is a collision and is
//! rejected, surfacing at the lexicon-compilation boundary.

use crate::defs::Nid;
use crate::graph::ParseGraph;
use crate::serializer::{Decoder, Encoder, RuleFileError, Width};

/// Fletcher-style checksum over the sequence's 16-bit pairs, packed as
/// (sum2 << 16) | sum1.
pub fn compute_cks(seq: &[u16]) -> u32 {
    let mut sum1: u32 = 0;
    let mut sum2: u32 = 0;
    let mut i = 0;
    while i < seq.len() {
        let mut x = (seq[i] as u32) << 8;
        if i + 1 < seq.len() {
            x |= seq[i + 1] as u32;
        }
        sum1 = (sum1 + x) % 0xffff;
        sum2 = (sum2 + sum1) % 0xffff;
        i += 2;
    }
    (sum2 << 16) | sum1
}

pub struct SeqMap {
    n_rows: usize,
    n_cols: usize,
    /// Per cell: columns with a transition into the next row.
    trs: Vec<Vec<u16>>,
    /// Per cell: checksums of sequences terminating here.
    cks: Vec<Vec<u32>>,
    /// Per cell: value indices, parallel to `cks`.
    vix: Vec<Vec<u16>>,
}

impl SeqMap {
    pub fn new() -> SeqMap {
        SeqMap {
            n_rows: 0,
            n_cols: 0,
            trs: Vec::new(),
            cks: Vec::new(),
            vix: Vec::new(),
        }
    }

    /// Allocate the matrix: `max_seq_len` rows, `max_term + 1` columns.
    pub fn set_dimensions(&mut self, max_seq_len: usize, max_term: u16) {
        self.n_cols = max_term as usize + 1;
        self.n_rows = max_seq_len;
        let order = self.n_cols * self.n_rows;
        self.trs = vec![Vec::new(); order];
        self.cks = vec![Vec::new(); order];
        self.vix = vec![Vec::new(); order];
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Walk the path described by `seq`, creating transitions if asked.
    /// Returns the index of the last cell reached, or None when the walk
    /// needs an undefined transition.
    fn validate_path(&mut self, seq: &[u16], create_transitions: bool) -> Option<usize> {
        let mut row = 0usize;
        let mut col = seq[0] as usize;
        if seq.len() == 1 {
            return Some(col);
        }
        loop {
            let cell = row * self.n_cols + col;
            let dst = seq[row + 1];
            if !self.trs[cell].contains(&dst) {
                if !create_transitions {
                    return None;
                }
                self.trs[cell].push(dst);
            }
            row += 1;
            col = dst as usize;
            if row == seq.len() - 1 {
                return Some(row * self.n_cols + col);
            }
        }
    }

    fn value_at_cell(&self, seq: &[u16], cell: usize) -> Option<u16> {
        let cks = compute_cks(seq);
        self.cks[cell]
            .iter()
            .position(|&c| c == cks)
            .map(|i| self.vix[cell][i])
    }

    /// The value associated with a full sequence, if any.
    pub fn get(&self, seq: &[u16]) -> Option<u16> {
        if seq.is_empty() || self.n_rows == 0 || seq.len() > self.n_rows {
            return None;
        }
        if seq.iter().any(|&t| t as usize >= self.n_cols) {
            return None;
        }
        // the walk is read-only; clone-free via a scan that mirrors
        // validate_path without creation
        let mut row = 0usize;
        let mut col = seq[0] as usize;
        if seq.len() > 1 {
            loop {
                let cell = row * self.n_cols + col;
                let dst = seq[row + 1];
                if !self.trs[cell].contains(&dst) {
                    return None;
                }
                row += 1;
                col = dst as usize;
                if row == seq.len() - 1 {
                    break;
                }
            }
        }
        self.value_at_cell(seq, row * self.n_cols + col)
    }

    /// Associate a value index with a sequence. A duplicate
    /// (cell, checksum) pair is a collision and is rejected.
    pub fn define_entry(&mut self, seq: &[u16], value_ix: u16) -> Result<(), RuleFileError> {
        if seq.is_empty() {
            return Err(RuleFileError::Malformed("empty sequence".into()));
        }
        let cell = self
            .validate_path(seq, true)
            .expect("creating transitions cannot fail");
        let cks = compute_cks(seq);
        if self.cks[cell].contains(&cks) {
            return Err(RuleFileError::SeqMapCollision(seq.to_vec()));
        }
        self.cks[cell].push(cks);
        self.vix[cell].push(value_ix);
        Ok(())
    }

    /// Find all known sequences of node syntax classes starting at `e`,
    /// walking `nxt` links when `left_to_right`, `prv` links otherwise.
    /// Returns (node-sequence, value) pairs, shortest first.
    pub fn matches_at(
        &self,
        g: &ParseGraph,
        e: Nid,
        left_to_right: bool,
    ) -> Vec<(Vec<Nid>, u16)> {
        let mut matches = Vec::new();
        if self.n_rows == 0 {
            return matches;
        }
        let mut seq: Vec<u16> = Vec::new();
        let mut nd_seq: Vec<Nid> = Vec::new();
        let mut cur = e;
        let mut col = g[cur].sc.index();
        if col >= self.n_cols {
            return matches;
        }
        let mut row = 0usize;
        loop {
            seq.push(g[cur].sc.index() as u16);
            nd_seq.push(cur);
            let cell = row * self.n_cols + col;
            if let Some(v) = self.value_at_cell(&seq, cell) {
                matches.push((nd_seq.clone(), v));
            }
            let next = if left_to_right { g[cur].nxt } else { g[cur].prv };
            if let Some(nx) = next {
                let nx_sc = g[nx].sc.index();
                if nx_sc < self.n_cols
                    && row + 1 < self.n_rows
                    && self.trs[cell].contains(&(nx_sc as u16))
                {
                    row += 1;
                    col = nx_sc;
                    cur = nx;
                    continue;
                }
            }
            break;
        }
        matches
    }

    // ------------------------------------------------------------------
    // serialization
    // ------------------------------------------------------------------

    pub fn encode(&self, enc: &mut Encoder) {
        enc.int(self.n_rows as u32, Width::W32);
        if self.n_rows == 0 {
            return;
        }
        enc.int(self.n_cols as u32, Width::W32);
        let trs: Vec<Vec<u32>> = self
            .trs
            .iter()
            .map(|v| v.iter().map(|&x| x as u32).collect())
            .collect();
        enc.lst_lst(&trs, Width::W8);
        enc.lst_lst(&self.cks, Width::W32);
        let vix: Vec<Vec<u32>> = self
            .vix
            .iter()
            .map(|v| v.iter().map(|&x| x as u32).collect())
            .collect();
        enc.lst_lst(&vix, Width::W16);
    }

    pub fn decode(dec: &mut Decoder) -> Result<SeqMap, RuleFileError> {
        let n_rows = dec.int(Width::W32)? as usize;
        if n_rows == 0 {
            return Ok(SeqMap::new());
        }
        let n_cols = dec.int(Width::W32)? as usize;
        let order = n_rows * n_cols;
        let trs: Vec<Vec<u16>> = dec
            .lst_lst(Width::W8)?
            .into_iter()
            .map(|v| v.into_iter().map(|x| x as u16).collect())
            .collect();
        let cks = dec.lst_lst(Width::W32)?;
        let vix: Vec<Vec<u16>> = dec
            .lst_lst(Width::W16)?
            .into_iter()
            .map(|v| v.into_iter().map(|x| x as u16).collect())
            .collect();
        if trs.len() != order || cks.len() != order || vix.len() != order {
            return Err(RuleFileError::Malformed(
                "sequence-map table size mismatch".into(),
            ));
        }
        Ok(SeqMap {
            n_rows,
            n_cols,
            trs,
            cks,
            vix,
        })
    }

    /// Dump defined cells for rule listings; `term_to_str` renders a
    /// column id.
    pub fn dump(&self, term_to_str: &dyn Fn(u16) -> String) -> String {
        let mut out = format!("seqMap. nRows: {} nCols: {}\n", self.n_rows, self.n_cols);
        for row in 0..self.n_rows {
            for col in 0..self.n_cols {
                let cell = row * self.n_cols + col;
                if self.trs[cell].is_empty() && self.cks[cell].is_empty() {
                    continue;
                }
                out.push_str(&format!(
                    "[{},{}] sc:{} trs:{:?}\n",
                    row,
                    col,
                    term_to_str(col as u16),
                    self.trs[cell]
                ));
                for (i, cks) in self.cks[cell].iter().enumerate() {
                    out.push_str(&format!("  cks: {}. {}\n", cks, self.vix[cell][i]));
                }
            }
        }
        out
    }
}

impl Default for SeqMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{Key, ScKey, WordProps};
    use crate::lexicon::Lexicon;

    #[test]
    fn checksum_distinguishes_order() {
        assert_ne!(compute_cks(&[1, 2]), compute_cks(&[2, 1]));
        assert_ne!(compute_cks(&[1]), compute_cks(&[1, 0, 1]));
        assert_eq!(compute_cks(&[7, 8]), compute_cks(&[7, 8]));
    }

    #[test]
    fn define_and_get() {
        let mut m = SeqMap::new();
        m.set_dimensions(4, 40);
        m.define_entry(&[1, 22], 7).unwrap();
        m.define_entry(&[1, 33], 8).unwrap();
        m.define_entry(&[5], 9).unwrap();
        assert_eq!(m.get(&[1, 22]), Some(7));
        assert_eq!(m.get(&[1, 33]), Some(8));
        assert_eq!(m.get(&[5]), Some(9));
        assert_eq!(m.get(&[1]), None);
        assert_eq!(m.get(&[2, 22]), None);
        assert_eq!(m.get(&[1, 22, 22]), None);
    }

    #[test]
    fn duplicate_sequence_is_a_collision() {
        let mut m = SeqMap::new();
        m.set_dimensions(3, 10);
        m.define_entry(&[1, 2], 0).unwrap();
        let err = m.define_entry(&[1, 2], 1).unwrap_err();
        assert!(matches!(err, RuleFileError::SeqMapCollision(_)));
    }

    fn graph_for(seq_sc: &[u16]) -> (Lexicon, ParseGraph) {
        let mut lx = Lexicon::new();
        // allocate enough classes that sc ids equal small ints
        for i in 1..50 {
            lx.sc_dict.lookup(&format!("c{i}"), true);
        }
        let mut g = ParseGraph::new();
        for (i, &sc) in seq_sc.iter().enumerate() {
            let k = lx.define(&format!("w{i}"), WordProps::NONE, Key::NONE);
            let n = g.push_token(&lx, k, i, i);
            g[n].sc = ScKey(sc as u32);
        }
        (lx, g)
    }

    #[test]
    fn matches_walk_left_to_right() {
        let mut m = SeqMap::new();
        m.set_dimensions(4, 40);
        m.define_entry(&[3], 0).unwrap();
        m.define_entry(&[3, 4], 1).unwrap();
        m.define_entry(&[3, 4, 5], 2).unwrap();
        let (_lx, g) = graph_for(&[3, 4, 5]);
        let head = g.head.unwrap();
        let matches = m.matches_at(&g, head, true);
        assert_eq!(matches.len(), 3);
        // longest match last
        let (nodes, v) = matches.last().unwrap();
        assert_eq!(*v, 2);
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn matches_walk_right_to_left() {
        let mut m = SeqMap::new();
        m.set_dimensions(4, 40);
        m.define_entry(&[5, 4], 3).unwrap();
        let (_lx, g) = graph_for(&[3, 4, 5]);
        let tail = g.tail.unwrap();
        let matches = m.matches_at(&g, tail, false);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, 3);
    }

    #[test]
    fn no_transition_stops_the_walk() {
        let mut m = SeqMap::new();
        m.set_dimensions(4, 40);
        m.define_entry(&[3, 4], 1).unwrap();
        let (_lx, g) = graph_for(&[3, 9, 4]);
        let head = g.head.unwrap();
        let matches = m.matches_at(&g, head, true);
        assert!(matches.is_empty());
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut m = SeqMap::new();
        m.set_dimensions(3, 12);
        m.define_entry(&[1, 2, 3], 0).unwrap();
        m.define_entry(&[1, 2], 1).unwrap();
        m.define_entry(&[9], 2).unwrap();
        let mut enc = Encoder::new();
        m.encode(&mut enc);
        let bytes = enc.finish();
        let mut dec = Decoder::new(&bytes);
        let m2 = SeqMap::decode(&mut dec).unwrap();
        assert!(dec.at_end());
        assert_eq!(m2.get(&[1, 2, 3]), Some(0));
        assert_eq!(m2.get(&[1, 2]), Some(1));
        assert_eq!(m2.get(&[9]), Some(2));
        let mut enc2 = Encoder::new();
        m2.encode(&mut enc2);
        assert_eq!(bytes, enc2.finish());
    }

    #[test]
    fn empty_map_round_trips() {
        let m = SeqMap::new();
        let mut enc = Encoder::new();
        m.encode(&mut enc);
        let bytes = enc.finish();
        let mut dec = Decoder::new(&bytes);
        let m2 = SeqMap::decode(&mut dec).unwrap();
        assert!(m2.is_empty());
    }
}
