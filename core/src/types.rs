//! Request parameter types for the Graph API.
//!
//! # Design
//! The service accepts flat string parameters only, and rejects list-like
//! encodings such as `ids=['a','b']`. `ParamValue::List` exists so callers
//! can pass several ids or fields naturally; it is always flattened to a
//! comma-joined string before it reaches the wire.
//!
//! `Params` is ordered by key so encoded query strings and form bodies are
//! deterministic.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(Number),
    List(Vec<String>),
}

impl ParamValue {
    /// The string sent on the wire.
    pub fn to_param_string(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Number(number) => number.to_string(),
            ParamValue::List(items) => items.join(","),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Text(value.clone())
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        // NaN and infinities have no JSON number form.
        match Number::from_f64(value) {
            Some(number) => ParamValue::Number(number),
            None => ParamValue::Text(value.to_string()),
        }
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(value: Vec<&str>) -> Self {
        ParamValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        ParamValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ParamValue {
    fn from(value: [&str; N]) -> Self {
        ParamValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Request parameters: query parameters for GET and DELETE, form fields
/// for POST.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Option<ParamValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `other` into `self`; values from `other` win on collision.
    pub fn merge(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ParamValue> {
        self.0.iter()
    }

    /// Flattened `(key, value)` pairs ready for url-encoding.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), value.to_param_string()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = btree_map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_values_are_comma_joined_in_order() {
        let value = ParamValue::from(vec!["johannes.gorset", "atle.mo", "a"]);
        assert_eq!(value.to_param_string(), "johannes.gorset,atle.mo,a");
    }

    #[test]
    fn empty_list_flattens_to_empty_string() {
        let value = ParamValue::List(Vec::new());
        assert_eq!(value.to_param_string(), "");
    }

    #[test]
    fn numbers_use_plain_decimal_form() {
        assert_eq!(ParamValue::from(25).to_param_string(), "25");
        assert_eq!(ParamValue::from(-3i64).to_param_string(), "-3");
        assert_eq!(ParamValue::from(1.5).to_param_string(), "1.5");
    }

    #[test]
    fn non_finite_float_falls_back_to_text() {
        assert_eq!(ParamValue::from(f64::NAN), ParamValue::Text("NaN".to_string()));
    }

    #[test]
    fn merge_prefers_incoming_values() {
        let mut params = Params::new().with("limit", 10).with("fields", "id");
        params.merge(Params::new().with("limit", 25).with("offset", 5));
        assert_eq!(params.get("limit"), Some(&ParamValue::from(25)));
        assert_eq!(params.get("fields"), Some(&ParamValue::from("id")));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn pairs_are_sorted_by_key() {
        let params: Params = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(
            params.to_pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn deserializes_from_json_object() {
        let params: Params =
            serde_json::from_str(r#"{"ids":["a","b"],"limit":5,"q":"coffee"}"#).unwrap();
        assert_eq!(params.get("ids"), Some(&ParamValue::from(vec!["a", "b"])));
        assert_eq!(params.get("limit"), Some(&ParamValue::from(5)));
        assert_eq!(params.get("q"), Some(&ParamValue::from("coffee")));
    }
}
