//! Named integer parameters controlling every pipeline stage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LexiconError, Result};

/// Declared name, default and legal range of one parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default: i64,
    pub min: i64,
    pub max: i64,
    pub description: &'static str,
}

pub const PARAMETER_SPECS: &[ParameterSpec] = &[
    ParameterSpec {
        name: "max_word_tokens",
        default: 0,
        min: 0,
        max: 1_000_000_000,
        description: "truncate the corpus to its first N tokens (0 = no limit)",
    },
    ParameterSpec {
        name: "min_stem_length",
        default: 4,
        min: 1,
        max: 100,
        description: "minimum length of a candidate stem",
    },
    ParameterSpec {
        name: "max_affix_length",
        default: 4,
        min: 0,
        max: 100,
        description: "maximum length of an affix kept in a signature",
    },
    ParameterSpec {
        name: "min_sig_count",
        default: 3,
        min: 1,
        max: 1_000_000,
        description: "minimum number of stems in a signature",
    },
    ParameterSpec {
        name: "min_affix_count",
        default: 2,
        min: 1,
        max: 1_000,
        description: "minimum number of affixes in a signature",
    },
    ParameterSpec {
        name: "min_context_count",
        default: 3,
        min: 1,
        max: 1_000_000,
        description: "minimum corpus frequency of a context used in the manifold",
    },
    ParameterSpec {
        name: "max_word_types",
        default: 1000,
        min: 1,
        max: 1_000_000,
        description: "number of most frequent word types placed in the manifold",
    },
    ParameterSpec {
        name: "n_neighbors",
        default: 9,
        min: 1,
        max: 1_000,
        description: "number of nearest neighbors per word",
    },
    ParameterSpec {
        name: "keep_case",
        default: 0,
        min: 0,
        max: 1,
        description: "1 keeps letter case, 0 lowercases every token",
    },
    ParameterSpec {
        name: "suffixing",
        default: 1,
        min: 0,
        max: 1,
        description: "1 induces suffix signatures, 0 prefix signatures",
    },
];

pub fn parameter_spec(name: &str) -> Option<&'static ParameterSpec> {
    PARAMETER_SPECS.iter().find(|spec| spec.name == name)
}

/// Value supplied by a caller for one override; text must parse as an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterValue {
    Int(i64),
    Text(String),
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A validated parameter set. Values only enter through
/// [`Parameters::with_overrides`], so every field is within its declared range.
/// The serialized form is a name-to-value map; deserializing applies the map
/// as overrides on the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct Parameters {
    max_word_tokens: i64,
    min_stem_length: i64,
    max_affix_length: i64,
    min_sig_count: i64,
    min_affix_count: i64,
    min_context_count: i64,
    max_word_types: i64,
    n_neighbors: i64,
    keep_case: i64,
    suffixing: i64,
}

impl TryFrom<BTreeMap<String, i64>> for Parameters {
    type Error = LexiconError;

    fn try_from(map: BTreeMap<String, i64>) -> Result<Self> {
        Parameters::default().with_overrides(map)
    }
}

impl From<Parameters> for BTreeMap<String, i64> {
    fn from(params: Parameters) -> Self {
        params.to_map()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        let mut params = Self {
            max_word_tokens: 0,
            min_stem_length: 0,
            max_affix_length: 0,
            min_sig_count: 0,
            min_affix_count: 0,
            min_context_count: 0,
            max_word_types: 0,
            n_neighbors: 0,
            keep_case: 0,
            suffixing: 0,
        };
        for spec in PARAMETER_SPECS {
            if let Some(slot) = params.slot_mut(spec.name) {
                *slot = spec.default;
            }
        }
        params
    }
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<i64> {
        let value = match name {
            "max_word_tokens" => self.max_word_tokens,
            "min_stem_length" => self.min_stem_length,
            "max_affix_length" => self.max_affix_length,
            "min_sig_count" => self.min_sig_count,
            "min_affix_count" => self.min_affix_count,
            "min_context_count" => self.min_context_count,
            "max_word_types" => self.max_word_types,
            "n_neighbors" => self.n_neighbors,
            "keep_case" => self.keep_case,
            "suffixing" => self.suffixing,
            _ => return None,
        };
        Some(value)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut i64> {
        let slot = match name {
            "max_word_tokens" => &mut self.max_word_tokens,
            "min_stem_length" => &mut self.min_stem_length,
            "max_affix_length" => &mut self.max_affix_length,
            "min_sig_count" => &mut self.min_sig_count,
            "min_affix_count" => &mut self.min_affix_count,
            "min_context_count" => &mut self.min_context_count,
            "max_word_types" => &mut self.max_word_types,
            "n_neighbors" => &mut self.n_neighbors,
            "keep_case" => &mut self.keep_case,
            "suffixing" => &mut self.suffixing,
            _ => return None,
        };
        Some(slot)
    }

    /// Snapshot keyed by parameter name.
    pub fn to_map(&self) -> BTreeMap<String, i64> {
        PARAMETER_SPECS
            .iter()
            .filter_map(|spec| self.get(spec.name).map(|v| (spec.name.to_string(), v)))
            .collect()
    }

    /// Validate a whole batch of overrides and return the resulting parameter
    /// set. `self` is never modified; the first invalid entry fails the batch.
    pub fn with_overrides<I, K, V>(&self, overrides: I) -> Result<Parameters>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParameterValue>,
    {
        let mut validated = Vec::new();
        for (name, value) in overrides {
            let name = name.as_ref();
            let spec = parameter_spec(name).ok_or_else(|| LexiconError::UnknownParameter {
                name: name.to_string(),
            })?;
            validated.push((spec, validate_value(spec, value.into())?));
        }

        let mut next = *self;
        for (spec, value) in validated {
            if let Some(slot) = next.slot_mut(spec.name) {
                *slot = value;
            }
        }
        Ok(next)
    }

    pub fn min_stem_length(&self) -> usize {
        as_usize(self.min_stem_length)
    }

    pub fn max_affix_length(&self) -> usize {
        as_usize(self.max_affix_length)
    }

    pub fn min_sig_count(&self) -> usize {
        as_usize(self.min_sig_count)
    }

    pub fn min_affix_count(&self) -> usize {
        as_usize(self.min_affix_count)
    }

    pub fn min_context_count(&self) -> u64 {
        self.min_context_count.max(0) as u64
    }

    pub fn max_word_types(&self) -> usize {
        as_usize(self.max_word_types)
    }

    pub fn n_neighbors(&self) -> usize {
        as_usize(self.n_neighbors)
    }

    /// `None` when the corpus is not truncated.
    pub fn max_word_tokens(&self) -> Option<usize> {
        (self.max_word_tokens > 0).then(|| as_usize(self.max_word_tokens))
    }

    pub fn keep_case(&self) -> bool {
        self.keep_case != 0
    }

    pub fn suffixing(&self) -> bool {
        self.suffixing != 0
    }
}

fn as_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

fn validate_value(spec: &ParameterSpec, value: ParameterValue) -> Result<i64> {
    let invalid = |value: &ParameterValue, reason: String| LexiconError::InvalidParameterValue {
        name: spec.name.to_string(),
        value: value.to_string(),
        reason,
    };

    let parsed = match &value {
        ParameterValue::Int(v) => *v,
        ParameterValue::Text(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(&value, "not an integer".to_string()))?,
    };

    if parsed < spec.min || parsed > spec.max {
        return Err(invalid(
            &value,
            format!("must be within {}..={}", spec.min, spec.max),
        ));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_specs() {
        let params = Parameters::default();
        for spec in PARAMETER_SPECS {
            assert_eq!(params.get(spec.name), Some(spec.default), "{}", spec.name);
        }
        assert_eq!(params.min_stem_length(), 4);
        assert_eq!(params.max_word_tokens(), None);
        assert!(params.suffixing());
        assert!(!params.keep_case());
    }

    #[test]
    fn test_override_parses_text() {
        let params = Parameters::default()
            .with_overrides([("min_stem_length", "3"), ("n_neighbors", " 5 ")])
            .unwrap();
        assert_eq!(params.min_stem_length, 3);
        assert_eq!(params.n_neighbors, 5);
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = Parameters::default()
            .with_overrides([("not_a_param", 3i64)])
            .unwrap_err();
        assert!(matches!(err, LexiconError::UnknownParameter { name } if name == "not_a_param"));
    }

    #[test]
    fn test_non_integer_rejected() {
        let err = Parameters::default()
            .with_overrides([("min_stem_length", "abc")])
            .unwrap_err();
        assert!(matches!(err, LexiconError::InvalidParameterValue { .. }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Parameters::default()
            .with_overrides([("keep_case", 2i64)])
            .unwrap_err();
        assert!(matches!(err, LexiconError::InvalidParameterValue { name, .. } if name == "keep_case"));
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let params = Parameters::default();
        let result = params.with_overrides(vec![
            ("min_stem_length", ParameterValue::from(2i64)),
            ("max_affix_length", ParameterValue::from("x")),
        ]);
        assert!(result.is_err());
        assert_eq!(params, Parameters::default());
    }

    #[test]
    fn test_deserialize_validates() {
        let params: Parameters =
            serde_json::from_str(r#"{"min_stem_length": 3, "n_neighbors": 5}"#).unwrap();
        assert_eq!(params.min_stem_length(), 3);
        assert_eq!(params.n_neighbors(), 5);
        assert_eq!(params.min_sig_count(), 3);

        assert!(serde_json::from_str::<Parameters>(r#"{"n_neighbors": -5}"#).is_err());
        assert!(serde_json::from_str::<Parameters>(r#"{"suffixing": 7}"#).is_err());
        assert!(serde_json::from_str::<Parameters>(r#"{"bogus": 1}"#).is_err());
    }

    #[test]
    fn test_serialize_as_name_map() {
        let params = Parameters::default()
            .with_overrides([("keep_case", 1i64)])
            .unwrap();
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["keep_case"], 1);
        assert_eq!(json["min_stem_length"], 4);
        let back: Parameters = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_map_is_sorted_by_name() {
        let map = Parameters::default().to_map();
        assert_eq!(map.len(), PARAMETER_SPECS.len());
        let names: Vec<_> = map.keys().cloned().collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
