//! Linguistica Core: unsupervised morphology and word-similarity induction.
//!
//! From a raw text corpus or a wordlist it computes:
//! - Word and phone n-gram counts
//! - Forward and backward tries with successor/predecessor sets
//! - Stem/affix signatures
//! - A word manifold: nearest neighbors by shared syntactic context
//!
//! [`Lexicon`] ties the stages together and memoizes every result per
//! parameter setting. Python bindings are available behind the `python`
//! feature.

pub mod corpus;
pub mod error;
pub mod graph;
pub mod lexicon;
pub mod manifold;
pub mod ngram;
pub mod parameters;
pub mod phonology;
pub mod signature;
pub mod sparse;
pub mod trie;
pub mod types;
pub mod worker;

#[cfg(feature = "python")]
mod python;

use tracing_subscriber::EnvFilter;

pub use corpus::{Corpus, WordlistEntry};
pub use error::{LexiconError, Result};
pub use graph::NeighborGraph;
pub use lexicon::Lexicon;
pub use manifold::{Context, Manifold};
pub use ngram::{NgramCounts, NgramTable};
pub use parameters::{ParameterValue, Parameters, PARAMETER_SPECS};
pub use signature::Signatures;
pub use trie::{Trie, TrieIndex};
pub use types::{ngram_display, GraphStats, NodeLinkGraph, Signature};
pub use worker::LexiconWorker;

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`). Does
/// nothing if a global subscriber is already set.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
