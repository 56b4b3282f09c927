//! Shared data structures returned by the lexicon accessors.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Separator used when a signature is displayed as one string.
pub const SEP_SIG: &str = "=";
/// Separator used when an n-gram is displayed as one string.
pub const SEP_NGRAM: &str = " ";
/// Display form of the empty affix.
pub const NULL_AFFIX: &str = "NULL";

/// A sorted, deduplicated affix set. Its identity is the affix tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Signature(Vec<String>);

impl Signature {
    pub fn new<I, S>(affixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut affixes: Vec<String> = affixes.into_iter().map(Into::into).collect();
        affixes.sort();
        affixes.dedup();
        Self(affixes)
    }

    pub fn affixes(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, affix: &str) -> bool {
        self.0.binary_search_by(|a| a.as_str().cmp(affix)).is_ok()
    }

    /// Parse the display form (`NULL=ed=s`).
    pub fn parse(display: &str) -> Self {
        Self::new(display.split(SEP_SIG).map(|a| {
            if a == NULL_AFFIX {
                String::new()
            } else {
                a.to_string()
            }
        }))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, affix) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(SEP_SIG)?;
            }
            f.write_str(if affix.is_empty() { NULL_AFFIX } else { affix })?;
        }
        Ok(())
    }
}

/// Display form of an n-gram: its items joined by [`SEP_NGRAM`].
pub fn ngram_display<S: AsRef<str>>(gram: &[S]) -> String {
    gram.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(SEP_NGRAM)
}

/// Weighted edge between two words of the neighbor graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NeighborEdge {
    pub source: String,
    pub target: String,
    pub weight: OrderedFloat<f64>,
}

impl NeighborEdge {
    pub fn new(source: String, target: String, weight: f64) -> Self {
        Self {
            source,
            target,
            weight: OrderedFloat(weight),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLinkNode {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

/// Generic node-link interchange form of an undirected graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: serde_json::Map<String, serde_json::Value>,
    pub nodes: Vec<NodeLinkNode>,
    pub links: Vec<NodeLinkEdge>,
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub num_components: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_sorted_and_deduplicated() {
        let sig = Signature::new(["s", "ed", "", "s"]);
        assert_eq!(sig.affixes(), ["", "ed", "s"]);
        assert!(sig.contains("ed"));
        assert!(!sig.contains("ing"));
        assert_eq!(sig.to_string(), "NULL=ed=s");
    }

    #[test]
    fn test_signature_parse_display() {
        let sig = Signature::new(["ing", "ed", ""]);
        assert_eq!(Signature::parse(&sig.to_string()), sig);
    }

    #[test]
    fn test_ngram_display() {
        assert_eq!(ngram_display(&["the", "cat", "sat"]), "the cat sat");
        assert_eq!(ngram_display::<&str>(&[]), "");
    }
}
