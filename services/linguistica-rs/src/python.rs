//! Python bindings via PyO3.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::LexiconError;
use crate::lexicon::Lexicon;
use crate::parameters::{ParameterValue, Parameters};
use crate::types::{GraphStats, Signature};

impl From<LexiconError> for PyErr {
    fn from(err: LexiconError) -> Self {
        let message = err.to_string();
        match err {
            LexiconError::Io(_) => PyIOError::new_err(message),
            LexiconError::UnknownParameter { .. } => PyKeyError::new_err(message),
            LexiconError::InvalidInput { .. }
            | LexiconError::EmptyCorpus
            | LexiconError::InvalidParameterValue { .. } => PyValueError::new_err(message),
            LexiconError::PipelineNotRun { .. } | LexiconError::WorkerPanicked(_) => {
                PyRuntimeError::new_err(message)
            }
        }
    }
}

/// Python values as parameter values: ints pass through, anything else is
/// validated from its string form.
fn parameter_values(
    overrides: HashMap<String, &PyAny>,
) -> PyResult<Vec<(String, ParameterValue)>> {
    overrides
        .into_iter()
        .map(|(name, value)| {
            let value = match value.extract::<i64>() {
                Ok(int) => ParameterValue::Int(int),
                Err(_) => ParameterValue::Text(value.str()?.to_string()),
            };
            Ok((name, value))
        })
        .collect()
}

fn parameters_from(overrides: Option<HashMap<String, &PyAny>>) -> PyResult<Parameters> {
    let params = Parameters::default();
    Ok(match overrides {
        Some(map) => params.with_overrides(parameter_values(map)?)?,
        None => params,
    })
}

fn signature_pairs<V: Clone>(
    map: &BTreeMap<Signature, BTreeSet<V>>,
) -> Vec<(Vec<String>, Vec<V>)> {
    map.iter()
        .map(|(sig, items)| (sig.affixes().to_vec(), items.iter().cloned().collect()))
        .collect()
}

// ============================================================================
// PYTHON WRAPPER TYPES
// ============================================================================

#[pyclass(name = "Lexicon")]
struct PyLexicon {
    inner: Lexicon,
}

#[pymethods]
impl PyLexicon {
    #[staticmethod]
    #[pyo3(signature = (path, parameters=None))]
    fn read_corpus(path: &str, parameters: Option<HashMap<String, &PyAny>>) -> PyResult<Self> {
        Ok(Self {
            inner: Lexicon::from_corpus_file(path, parameters_from(parameters)?)?,
        })
    }

    #[staticmethod]
    #[pyo3(signature = (path, parameters=None))]
    fn read_wordlist(path: &str, parameters: Option<HashMap<String, &PyAny>>) -> PyResult<Self> {
        Ok(Self {
            inner: Lexicon::from_wordlist_file(path, parameters_from(parameters)?)?,
        })
    }

    #[staticmethod]
    #[pyo3(signature = (text, parameters=None))]
    fn from_text(text: &str, parameters: Option<HashMap<String, &PyAny>>) -> PyResult<Self> {
        Ok(Self {
            inner: Lexicon::from_corpus_text(text, parameters_from(parameters)?)?,
        })
    }

    #[staticmethod]
    #[pyo3(signature = (counts, parameters=None))]
    fn from_word_counts(
        counts: Vec<(String, u64)>,
        parameters: Option<HashMap<String, &PyAny>>,
    ) -> PyResult<Self> {
        Ok(Self {
            inner: Lexicon::from_word_counts(counts, parameters_from(parameters)?),
        })
    }

    fn parameters(&self) -> BTreeMap<String, i64> {
        self.inner.parameters()
    }

    fn change_parameters(&mut self, overrides: HashMap<String, &PyAny>) -> PyResult<()> {
        Ok(self.inner.change_parameters(parameter_values(overrides)?)?)
    }

    /// Runs the pipeline with the GIL released.
    fn run_all_modules(&self, py: Python<'_>) -> PyResult<()> {
        let inner = &self.inner;
        Ok(py.allow_threads(|| inner.run_all_modules())?)
    }

    fn wordlist(&self) -> PyResult<Vec<(String, u64)>> {
        Ok(self
            .inner
            .wordlist()?
            .into_iter()
            .map(|(w, c)| (w.to_string(), c))
            .collect())
    }

    fn word_unigram_counter(&self) -> PyResult<HashMap<String, u64>> {
        Ok(self
            .inner
            .word_unigram_counter()?
            .iter()
            .map(|(w, c)| (w.clone(), c))
            .collect())
    }

    fn word_bigram_counter(&self) -> PyResult<HashMap<(String, String), u64>> {
        Ok(self
            .inner
            .word_bigram_counter()?
            .iter()
            .map(|([a, b], c)| ((a.clone(), b.clone()), c))
            .collect())
    }

    fn word_trigram_counter(&self) -> PyResult<HashMap<(String, String, String), u64>> {
        Ok(self
            .inner
            .word_trigram_counter()?
            .iter()
            .map(|([a, b, c], n)| ((a.clone(), b.clone(), c.clone()), n))
            .collect())
    }

    fn phone_unigram_counter(&self) -> PyResult<HashMap<String, u64>> {
        Ok(self
            .inner
            .phone_unigram_counter()?
            .iter()
            .map(|(p, c)| (p.clone(), c))
            .collect())
    }

    fn phone_bigram_counter(&self) -> PyResult<HashMap<(String, String), u64>> {
        Ok(self
            .inner
            .phone_bigram_counter()?
            .iter()
            .map(|([a, b], c)| ((a.clone(), b.clone()), c))
            .collect())
    }

    fn phone_trigram_counter(&self) -> PyResult<HashMap<(String, String, String), u64>> {
        Ok(self
            .inner
            .phone_trigram_counter()?
            .iter()
            .map(|([a, b, c], n)| ((a.clone(), b.clone(), c.clone()), n))
            .collect())
    }

    fn signatures_to_stems(&self) -> PyResult<Vec<(Vec<String>, Vec<String>)>> {
        Ok(signature_pairs(self.inner.signatures_to_stems()?))
    }

    fn signatures_to_words(&self) -> PyResult<Vec<(Vec<String>, Vec<String>)>> {
        Ok(signature_pairs(self.inner.signatures_to_words()?))
    }

    fn stems_to_signatures(&self) -> PyResult<BTreeMap<String, Vec<Vec<String>>>> {
        Ok(self
            .inner
            .stems_to_signatures()?
            .iter()
            .map(|(stem, sigs)| {
                (
                    stem.clone(),
                    sigs.iter().map(|s| s.affixes().to_vec()).collect(),
                )
            })
            .collect())
    }

    fn words_to_signatures(&self) -> PyResult<BTreeMap<String, Vec<Vec<String>>>> {
        Ok(self
            .inner
            .words_to_signatures()?
            .iter()
            .map(|(word, sigs)| {
                (
                    word.clone(),
                    sigs.iter().map(|s| s.affixes().to_vec()).collect(),
                )
            })
            .collect())
    }

    fn successors(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self
            .inner
            .successors()?
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect())
    }

    fn predecessors(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self
            .inner
            .predecessors()?
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect())
    }

    fn broken_words_left_to_right(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self.inner.broken_words_left_to_right()?.clone())
    }

    fn broken_words_right_to_left(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self.inner.broken_words_right_to_left()?.clone())
    }

    /// Pieces of one word; avoids copying the whole map per lookup.
    #[pyo3(signature = (word, left_to_right=true))]
    fn broken_word(&self, word: &str, left_to_right: bool) -> PyResult<Option<Vec<String>>> {
        let map = if left_to_right {
            self.inner.broken_words_left_to_right()?
        } else {
            self.inner.broken_words_right_to_left()?
        };
        Ok(map.get(word).cloned())
    }

    fn words_to_neighbors(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self.inner.words_to_neighbors()?.clone())
    }

    /// Node-link JSON of the neighbor graph.
    fn neighbor_graph_json(&self) -> PyResult<String> {
        Ok(self.inner.neighbor_graph_json()?.to_string())
    }

    fn neighbor_graph_stats(&self) -> PyResult<PyGraphStats> {
        Ok(self.inner.neighbor_graph_stats()?.clone().into())
    }
}

#[pyclass(name = "GraphStats")]
struct PyGraphStats {
    #[pyo3(get)]
    num_nodes: usize,
    #[pyo3(get)]
    num_edges: usize,
    #[pyo3(get)]
    avg_degree: f64,
    #[pyo3(get)]
    density: f64,
    #[pyo3(get)]
    num_components: usize,
}

impl From<GraphStats> for PyGraphStats {
    fn from(stats: GraphStats) -> Self {
        Self {
            num_nodes: stats.num_nodes,
            num_edges: stats.num_edges,
            avg_degree: stats.avg_degree,
            density: stats.density,
            num_components: stats.num_components,
        }
    }
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn linguistica_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyLexicon>()?;
    m.add_class::<PyGraphStats>()?;
    Ok(())
}
