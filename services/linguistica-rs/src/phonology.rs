//! Phone segmentation and phone n-gram statistics.

use tracing::{debug, instrument};
use unicode_segmentation::UnicodeSegmentation;

use crate::ngram::NgramCounts;

/// Split a transcription into phones.
///
/// Space-separated symbols (ARPABET style, `T AO K S`) are taken as given; an
/// unspaced IPA string is split into extended grapheme clusters so that
/// combining diacritics stay attached to their base symbol.
pub fn segment_phones(transcription: &str) -> Vec<String> {
    let trimmed = transcription.trim();
    if trimmed.contains(char::is_whitespace) {
        trimmed.split_whitespace().map(str::to_string).collect()
    } else {
        trimmed.graphemes(true).map(str::to_string).collect()
    }
}

/// Phones from the trailing columns of a wordlist line.
pub fn phones_from_columns(columns: &[&str]) -> Vec<String> {
    match columns {
        [single] => segment_phones(single),
        many => many.iter().map(|c| c.to_string()).collect(),
    }
}

/// Phone unigram/bigram/trigram counts. N-grams stay inside one word and each
/// occurrence is weighted by the frequency of the word it belongs to.
#[instrument(skip_all, fields(words = transcriptions.len()))]
pub fn count_phone_ngrams(transcriptions: &[(&[String], u64)]) -> NgramCounts<String> {
    let mut counts = NgramCounts::new();
    for (phones, weight) in transcriptions {
        counts.count_sequence(phones, *weight);
    }
    debug!(
        "phone tables: {} phones, {} biphones, {} triphones",
        counts.unigrams.len(),
        counts.bigrams.len(),
        counts.trigrams.len()
    );
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_spaced_symbols() {
        assert_eq!(segment_phones(" T AO  K S "), vec!["T", "AO", "K", "S"]);
    }

    #[test]
    fn test_segment_ipa_keeps_diacritics() {
        let phones = segment_phones("ta\u{303}k");
        assert_eq!(phones, vec!["t", "a\u{303}", "k"]);
    }

    #[test]
    fn test_phone_ngrams_weighted_within_word() {
        let talks: Vec<String> = segment_phones("T AO K S");
        let walk: Vec<String> = segment_phones("W AO K");
        let counts = count_phone_ngrams(&[(talks.as_slice(), 5), (walk.as_slice(), 2)]);

        assert_eq!(counts.unigrams.get(&"AO".to_string()), 7);
        assert_eq!(counts.bigrams.get(&["AO".into(), "K".into()]), 7);
        assert_eq!(counts.trigrams.get(&["AO".into(), "K".into(), "S".into()]), 5);
        // no biphone across the word boundary
        assert!(!counts.bigrams.contains(&["S".into(), "W".into()]));
    }

    #[test]
    fn test_no_transcriptions() {
        assert!(count_phone_ngrams(&[]).is_empty());
    }
}
