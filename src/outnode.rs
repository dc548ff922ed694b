//! The external parse-tree node. The parse graph is rich but awkward as an
//! API surface, so the final step of a parse walks it top down and builds
//! these simplified nodes. `kind` is the relation to the parent (or, for
//! top-level nodes, meta-syntactic info: quote, punctuation, assertion,
//! query); `form` is the syntactic shape.

use serde::Serialize;

/// Kinds of top-level nodes.
pub mod kind {
    pub const PUNCT: &str = "punct";
    pub const QUOTE: &str = "quote";
    pub const PAREN: &str = "paren";
    pub const ASSERT: &str = "assert";
    pub const QUERY: &str = "query";
    pub const IMPER: &str = "imperative";
    pub const PHR: &str = "phr";
}

/// Syntactic forms.
pub mod form {
    pub const X: &str = "X";
    pub const MOD: &str = "mod";
    pub const N: &str = "N";
    pub const CONJ_WRD: &str = "conj";
    pub const VERB_CLAUSE: &str = "verbclause";
    pub const QUERY_CLAUSE: &str = "queryclause";
    pub const ACTION: &str = "action";
    pub const PHR: &str = "phr";
    pub const QUERY: &str = "query";
}

#[derive(Debug, Clone, Serialize)]
pub struct OutNode {
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub form: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Prepositions etc. that immediately precede the phrase.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub head: String,
    /// Root form of the verb(s); set only for verb expressions.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vroots: String,
    /// Qualifiers in a complex verb phrase ("couldn't go").
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vqual: String,
    /// Tense, negation, etc.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vprops: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subnodes: Vec<OutNode>,
    // Source location; present when the caller asked for it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<Loc>,
    /// Blank lines preceding the section this node opens (file mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Loc {
    pub line_s: u32,
    pub col_s: u32,
    pub line_e: u32,
    pub col_e: u32,
}

impl OutNode {
    pub fn new(kind: impl Into<String>, form: impl Into<String>, text: impl Into<String>) -> OutNode {
        OutNode {
            kind: kind.into(),
            form: form.into(),
            text: text.into(),
            head: String::new(),
            vroots: String::new(),
            vqual: String::new(),
            vprops: String::new(),
            subnodes: Vec::new(),
            loc: None,
            blank: None,
        }
    }

    /// First child of the given kind.
    pub fn subnode(&self, kind: &str) -> Option<&OutNode> {
        self.subnodes.iter().find(|n| n.kind == kind)
    }

    /// XML for the tree rooted here. `loc` includes source-location
    /// attributes; skip them to reduce visual clutter.
    pub fn to_xml(&self, loc: bool) -> String {
        let mut out = String::new();
        self.xml_into(&mut out, loc, 0);
        out
    }

    fn xml_into(&self, out: &mut String, loc: bool, depth: usize) {
        let indent = "  ".repeat(depth + 1);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.kind);
        for (attr, val) in [
            ("form", &self.form),
            ("vroots", &self.vroots),
            ("vqual", &self.vqual),
            ("vprops", &self.vprops),
            ("head", &self.head),
        ] {
            if !val.is_empty() {
                out.push_str(&format!(" {}=\"{}\"", attr, xml_escape(val)));
            }
        }
        if loc {
            if let Some(l) = self.loc {
                out.push_str(&format!(
                    " loc=\"{} {} {} {}\"",
                    l.line_s, l.col_s, l.line_e, l.col_e
                ));
            }
            if let Some(b) = self.blank {
                out.push_str(&format!(" blank=\"{b}\""));
            }
        }
        out.push('>');
        let closer = format!("</{}>\n", self.kind);
        if self.subnodes.is_empty() {
            if !self.text.is_empty() {
                out.push_str(&format!(" {} ", xml_escape(&self.text)));
                out.push_str(&closer);
            } else {
                out.push('\n');
            }
            return;
        }
        out.push('\n');
        if !self.text.is_empty() {
            out.push_str(&format!("{}  {}\n", indent, xml_escape(&self.text)));
        }
        for sub in &self.subnodes {
            sub.xml_into(out, loc, depth + 1);
        }
        out.push_str(&indent);
        out.push_str(&closer);
    }

    /// A compact summary of the parse, for development and traces.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        self.summary_into(&mut out, 0);
        out
    }

    fn summary_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push_str(&self.kind);
        out.push_str(". ");
        if !self.vroots.is_empty() {
            if !self.vprops.is_empty() {
                out.push_str(&format!("[{}] ", self.vprops));
            }
            if !self.vqual.is_empty() {
                out.push_str(&format!("[{}] ", self.vqual));
            }
            if !self.head.is_empty() {
                out.push_str(&format!("({}) ", self.head));
            }
            out.push_str(&format!(" {}\n", self.vroots));
        } else {
            if !self.head.is_empty() {
                out.push_str(&format!("({}) ", self.head));
            }
            out.push_str(&format!(" {}\n", self.text));
        }
        for sub in &self.subnodes {
            sub.summary_into(out, depth + 1);
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wrap a forest as a complete XML document.
pub fn forest_to_xml(nds: &[OutNode], loc: bool) -> String {
    let mut out = String::from("<?xml version=\"1.0\" standalone=\"yes\"?>\n<parse>\n");
    for nd in nds {
        out.push_str(&nd.to_xml(loc));
        out.push('\n');
    }
    out.push_str("</parse>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutNode {
        let mut root = OutNode::new(kind::ASSERT, form::VERB_CLAUSE, "the cat sat");
        root.vroots = "sit".to_string();
        root.vprops = "past".to_string();
        let agent = OutNode::new("agent", form::N, "the cat");
        let mut theme = OutNode::new("theme", form::N, "the mat");
        theme.head = "on".to_string();
        root.subnodes.push(agent);
        root.subnodes.push(theme);
        root
    }

    #[test]
    fn xml_includes_attributes_and_children() {
        let xml = sample().to_xml(false);
        assert!(xml.contains("<assert form=\"verbclause\" vroots=\"sit\" vprops=\"past\">"));
        assert!(xml.contains("<agent form=\"N\"> the cat </agent>"));
        assert!(xml.contains("head=\"on\""));
        assert!(xml.contains("</assert>"));
    }

    #[test]
    fn xml_escapes_special_characters() {
        let nd = OutNode::new(kind::PHR, form::X, "a < b & c");
        let xml = nd.to_xml(false);
        assert!(xml.contains("a &lt; b &amp; c"));
    }

    #[test]
    fn loc_attribute_only_on_request() {
        let mut nd = sample();
        nd.loc = Some(Loc {
            line_s: 1,
            col_s: 1,
            line_e: 1,
            col_e: 11,
        });
        assert!(!nd.to_xml(false).contains("loc="));
        assert!(nd.to_xml(true).contains("loc=\"1 1 1 11\""));
    }

    #[test]
    fn subnode_finds_by_kind() {
        let nd = sample();
        assert!(nd.subnode("agent").is_some());
        assert!(nd.subnode("exper").is_none());
    }

    #[test]
    fn summary_shows_roots_for_verbs() {
        let s = sample().summary();
        assert!(s.contains("assert. [past]  sit"));
        assert!(s.contains("  agent.  the cat"));
    }

    #[test]
    fn serializes_to_json_without_empty_fields() {
        let js = serde_json::to_value(sample()).unwrap();
        assert_eq!(js["kind"], "assert");
        assert!(js.get("head").is_none());
        assert_eq!(js["subnodes"][1]["head"], "on");
    }

    #[test]
    fn forest_wraps_document() {
        let xml = forest_to_xml(&[sample()], false);
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<parse>"));
        assert!(xml.trim_end().ends_with("</parse>"));
    }
}
