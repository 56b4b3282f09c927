//! Stem/affix signature induction from trie successor structure.
//!
//! A candidate stem is a branching trie node (two or more continuations) at
//! least `min_stem_length` deep. Its affixes are the completions below the node
//! no longer than `max_affix_length`. Stems with identical affix sets share a
//! signature. A signature survives when it has at least `min_affix_count`
//! affixes, at least `min_sig_count` stems, and is not just the empty affix.
//!
//! Affix sets must match exactly: a stem missing one affix of a signature is
//! never folded into it, so every stem+affix of a signature is an attested word.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, instrument};

use crate::parameters::Parameters;
use crate::trie::TrieIndex;
use crate::types::Signature;

/// Cutoffs applied by [`Signatures::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureConfig {
    pub min_stem_length: usize,
    pub max_affix_length: usize,
    pub min_sig_count: usize,
    pub min_affix_count: usize,
    pub suffixing: bool,
}

impl From<&Parameters> for SignatureConfig {
    fn from(params: &Parameters) -> Self {
        Self {
            min_stem_length: params.min_stem_length(),
            max_affix_length: params.max_affix_length(),
            min_sig_count: params.min_sig_count(),
            min_affix_count: params.min_affix_count(),
            suffixing: params.suffixing(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signatures {
    suffixing: bool,
    signatures_to_stems: BTreeMap<Signature, BTreeSet<String>>,
    stems_to_signatures: BTreeMap<String, BTreeSet<Signature>>,
    signatures_to_words: BTreeMap<Signature, BTreeSet<String>>,
    words_to_signatures: BTreeMap<String, BTreeSet<Signature>>,
}

impl Signatures {
    #[instrument(skip_all)]
    pub fn build(tries: &TrieIndex, config: SignatureConfig) -> Self {
        let trie = if config.suffixing {
            &tries.forward
        } else {
            &tries.backward
        };

        // Strings come back in trie order; prefix mode reverses them again.
        let natural = |s: &str| -> String {
            if config.suffixing {
                s.to_string()
            } else {
                s.chars().rev().collect()
            }
        };

        let mut candidates: BTreeMap<Signature, BTreeSet<String>> = BTreeMap::new();
        let stems = trie.stems_with_completions(config.min_stem_length, config.max_affix_length);
        debug!("{} candidate stems", stems.len());
        for (stem, completions) in stems {
            if completions.len() < config.min_affix_count {
                continue;
            }
            let signature = Signature::new(completions.iter().map(|c| natural(c)));
            if signature.affixes().iter().all(String::is_empty) {
                continue;
            }
            candidates
                .entry(signature)
                .or_default()
                .insert(natural(&stem));
        }

        let signatures_to_stems: BTreeMap<Signature, BTreeSet<String>> = candidates
            .into_iter()
            .filter(|(_, stems)| stems.len() >= config.min_sig_count)
            .collect();

        let mut result = Self {
            suffixing: config.suffixing,
            ..Self::default()
        };
        for (signature, stems) in &signatures_to_stems {
            for stem in stems {
                result
                    .stems_to_signatures
                    .entry(stem.clone())
                    .or_default()
                    .insert(signature.clone());
                for affix in signature.affixes() {
                    let word = result.join(stem, affix);
                    result
                        .words_to_signatures
                        .entry(word.clone())
                        .or_default()
                        .insert(signature.clone());
                    result
                        .signatures_to_words
                        .entry(signature.clone())
                        .or_default()
                        .insert(word);
                }
            }
        }
        result.signatures_to_stems = signatures_to_stems;

        info!(
            "{} signatures, {} stems, {} analyzed words",
            result.signatures_to_stems.len(),
            result.stems_to_signatures.len(),
            result.words_to_signatures.len()
        );
        result
    }

    /// Rebuild the word a stem and affix stand for.
    pub fn join(&self, stem: &str, affix: &str) -> String {
        if self.suffixing {
            format!("{stem}{affix}")
        } else {
            format!("{affix}{stem}")
        }
    }

    pub fn is_suffixing(&self) -> bool {
        self.suffixing
    }

    pub fn len(&self) -> usize {
        self.signatures_to_stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures_to_stems.is_empty()
    }

    pub fn signatures_to_stems(&self) -> &BTreeMap<Signature, BTreeSet<String>> {
        &self.signatures_to_stems
    }

    pub fn stems_to_signatures(&self) -> &BTreeMap<String, BTreeSet<Signature>> {
        &self.stems_to_signatures
    }

    pub fn signatures_to_words(&self) -> &BTreeMap<Signature, BTreeSet<String>> {
        &self.signatures_to_words
    }

    pub fn words_to_signatures(&self) -> &BTreeMap<String, BTreeSet<Signature>> {
        &self.words_to_signatures
    }

    /// Signatures by descending stem count, then ascending affix tuple.
    pub fn sorted(&self) -> Vec<(&Signature, &BTreeSet<String>)> {
        let mut entries: Vec<_> = self.signatures_to_stems.iter().collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        entries
    }
}
