//! Binary encoding for the rule file.
//!
//! The format is deliberately language-neutral: big-endian unsigned ints of
//! 8/16/32 bits, length-prefixed ASCII strings, and two list shapes. A store
//! followed by a load followed by a store must be byte-identical.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleFileError {
    #[error("rule file truncated at offset {0}")]
    Truncated(usize),
    #[error("rule file is malformed: {0}")]
    Malformed(String),
    #[error("unknown transform \"{0}\" in rule file")]
    UnknownXfrm(String),
    #[error("sequence-map collision for sequence {0:?}")]
    SeqMapCollision(Vec<u16>),
    #[error("could not read rule file: {0}")]
    Io(#[from] std::io::Error),
}

/// Integer widths used on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Width {
    W8,
    W16,
    W32,
}

pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder { buf: Vec::new() }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn int(&mut self, v: u32, w: Width) {
        match w {
            Width::W8 => self.buf.push(v as u8),
            Width::W16 => {
                self.buf.push((v >> 8) as u8);
                self.buf.push(v as u8);
            }
            Width::W32 => {
                self.buf.push((v >> 24) as u8);
                self.buf.push((v >> 16) as u8);
                self.buf.push((v >> 8) as u8);
                self.buf.push(v as u8);
            }
        }
    }

    /// One-byte length, then the bytes. Strings longer than 255 bytes do not
    /// occur in rule data.
    pub fn str(&mut self, s: &str) {
        debug_assert!(s.len() <= 0xff);
        self.buf.push(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// 32-bit count, then per-string one-byte length + bytes.
    pub fn str_lst(&mut self, lst: &[String]) {
        self.int(lst.len() as u32, Width::W32);
        for s in lst {
            self.str(s);
        }
    }

    /// 16-bit count, then the ints at the given width.
    pub fn int_lst(&mut self, lst: &[u32], w: Width) {
        self.int(lst.len() as u32, Width::W16);
        for &v in lst {
            self.int(v, w);
        }
    }

    /// 16-bit outer count, then per-inner 16-bit length + ints. An empty
    /// inner list is written as length 0 ("null"); an empty outer list is
    /// the single count 0.
    pub fn lst_lst(&mut self, lst: &[Vec<u32>], w: Width) {
        self.int(lst.len() as u32, Width::W16);
        for inner in lst {
            self.int(inner.len() as u32, Width::W16);
            for &v in inner {
                self.int(v, w);
            }
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Decoder<'a> {
        Decoder { buf, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RuleFileError> {
        if self.pos + n > self.buf.len() {
            return Err(RuleFileError::Truncated(self.pos));
        }
        let s = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn int(&mut self, w: Width) -> Result<u32, RuleFileError> {
        let v = match w {
            Width::W8 => self.take(1)?[0] as u32,
            Width::W16 => {
                let b = self.take(2)?;
                ((b[0] as u32) << 8) | b[1] as u32
            }
            Width::W32 => {
                let b = self.take(4)?;
                ((b[0] as u32) << 24) | ((b[1] as u32) << 16) | ((b[2] as u32) << 8) | b[3] as u32
            }
        };
        Ok(v)
    }

    pub fn str(&mut self) -> Result<String, RuleFileError> {
        let n = self.take(1)?[0] as usize;
        let b = self.take(n)?;
        String::from_utf8(b.to_vec())
            .map_err(|_| RuleFileError::Malformed("non-ASCII string".into()))
    }

    pub fn str_lst(&mut self) -> Result<Vec<String>, RuleFileError> {
        let n = self.int(Width::W32)? as usize;
        let mut lst = Vec::with_capacity(n);
        for _ in 0..n {
            lst.push(self.str()?);
        }
        Ok(lst)
    }

    pub fn int_lst(&mut self, w: Width) -> Result<Vec<u32>, RuleFileError> {
        let n = self.int(Width::W16)? as usize;
        let mut lst = Vec::with_capacity(n);
        for _ in 0..n {
            lst.push(self.int(w)?);
        }
        Ok(lst)
    }

    pub fn lst_lst(&mut self, w: Width) -> Result<Vec<Vec<u32>>, RuleFileError> {
        let n = self.int(Width::W16)? as usize;
        let mut lst = Vec::with_capacity(n);
        for _ in 0..n {
            let m = self.int(Width::W16)? as usize;
            let mut inner = Vec::with_capacity(m);
            for _ in 0..m {
                inner.push(self.int(w)?);
            }
            lst.push(inner);
        }
        Ok(lst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_round_trip_at_all_widths() {
        let mut enc = Encoder::new();
        enc.int(0xab, Width::W8);
        enc.int(0xabcd, Width::W16);
        enc.int(0xdeadbeef, Width::W32);
        let bytes = enc.finish();
        assert_eq!(bytes.len(), 7);
        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.int(Width::W8).unwrap(), 0xab);
        assert_eq!(dec.int(Width::W16).unwrap(), 0xabcd);
        assert_eq!(dec.int(Width::W32).unwrap(), 0xdeadbeef);
        assert!(dec.at_end());
    }

    #[test]
    fn ints_are_big_endian() {
        let mut enc = Encoder::new();
        enc.int(0x0102, Width::W16);
        assert_eq!(enc.finish(), vec![0x01, 0x02]);
    }

    #[test]
    fn strings_and_lists_round_trip() {
        let strs = vec!["a".to_string(), "ab".to_string(), String::new()];
        let ints = vec![1, 2, 70000];
        let nested = vec![vec![1, 2], vec![], vec![3]];
        let mut enc = Encoder::new();
        enc.str("hdr");
        enc.str_lst(&strs);
        enc.int_lst(&ints, Width::W32);
        enc.lst_lst(&nested, Width::W16);
        let bytes = enc.finish();

        let mut dec = Decoder::new(&bytes);
        assert_eq!(dec.str().unwrap(), "hdr");
        assert_eq!(dec.str_lst().unwrap(), strs);
        assert_eq!(dec.int_lst(Width::W32).unwrap(), ints);
        assert_eq!(dec.lst_lst(Width::W16).unwrap(), nested);
        assert!(dec.at_end());
    }

    #[test]
    fn empty_inner_list_encodes_as_zero_length() {
        let mut enc = Encoder::new();
        enc.lst_lst(&[vec![]], Width::W8);
        // outer count 1, inner length 0
        assert_eq!(enc.finish(), vec![0, 1, 0, 0]);
    }

    #[test]
    fn truncated_input_errors_instead_of_panicking() {
        let mut dec = Decoder::new(&[0x00]);
        assert!(matches!(
            dec.int(Width::W32),
            Err(RuleFileError::Truncated(_))
        ));
    }

    #[test]
    fn re_encoding_is_byte_identical() {
        let nested = vec![vec![9, 8, 7], vec![], vec![6]];
        let mut enc = Encoder::new();
        enc.lst_lst(&nested, Width::W32);
        let first = enc.finish();

        let mut dec = Decoder::new(&first);
        let decoded = dec.lst_lst(Width::W32).unwrap();
        let mut enc2 = Encoder::new();
        enc2.lst_lst(&decoded, Width::W32);
        assert_eq!(first, enc2.finish());
    }
}
