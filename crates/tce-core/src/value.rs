//! # Snapshot Value Model
//!
//! [`Value`] is the closed sum type the condition evaluator inspects. A
//! dossier snapshot is a `Value::Map` tree; rule operands are `Value`s too.
//! Nothing outside this model is reachable from a rule.
//!
//! ## Path Resolution
//!
//! [`Value::resolve_path`] walks a dotted path (`session.programme.title`)
//! and is total:
//!
//! - A null or absent value short-circuits the remaining segments to null.
//! - A list is replaced by its first element before the next segment is
//!   applied. The rule language has no indexing syntax, so "the first one"
//!   is the only list access it offers.
//! - A scalar that is asked for a key resolves to null.
//!
//! Resolution never panics and never allocates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

static NULL: Value = Value::Null;

/// Loosely-typed value in an evaluation context or rule operand.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent or explicitly null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Any number. Integers and decimals compare by numeric value.
    Number(f64),
    /// UTF-8 text.
    String(String),
    /// Ordered list.
    List(Vec<Value>),
    /// String-keyed map with deterministic key order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short type name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The numeric payload, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The text payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Look up a key on a map. Any other value yields null.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Self::Map(entries) => entries.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// Resolve a dotted field path. See the module docs for the rules.
    pub fn resolve_path(&self, path: &str) -> &Value {
        self.resolve_segments(path.split('.'))
    }

    /// Resolve an already-split path.
    pub fn resolve_segments<'p, I>(&self, segments: I) -> &Value
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut current = self;
        for segment in segments {
            let container = match current {
                Self::List(items) => match items.first() {
                    Some(first) => first,
                    None => return &NULL,
                },
                other => other,
            };
            current = match container {
                Self::Map(entries) => entries.get(segment).unwrap_or(&NULL),
                _ => return &NULL,
            };
        }
        current
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

/// Whole numbers within the exactly-representable range are rendered as
/// JSON integers so alert payloads read `80`, not `80.0`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn is_exact_integer(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER
}

/// Same rendering as the `serde_json::Value` conversion, without building
/// the intermediate tree.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if is_exact_integer(*n) => serializer.serialize_i64(*n as i64),
            Self::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Self::Number(_) => serializer.serialize_unit(),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(entries) => serializer.collect_map(entries),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if is_exact_integer(*n) {
                    Self::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n).map_or(Self::Null, Self::Number)
                }
            }
            Value::String(s) => Self::String(s.clone()),
            Value::List(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Map(entries) => Self::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn resolves_through_list_first_element() {
        let ctx = Value::from(json!({"a": {"b": [{"c": 5}, {"c": 9}]}}));
        assert_eq!(ctx.resolve_path("a.b.c"), &Value::Number(5.0));
    }

    #[test]
    fn missing_segment_resolves_to_null() {
        let ctx = Value::from(json!({"a": {"b": 1}}));
        assert!(ctx.resolve_path("a.x.y").is_null());
        assert!(ctx.resolve_path("z").is_null());
    }

    #[test]
    fn null_short_circuits_remaining_segments() {
        let ctx = Value::from(json!({"financer": null}));
        assert!(ctx.resolve_path("financer.channel.code").is_null());
    }

    #[test]
    fn empty_list_resolves_to_null() {
        let ctx = Value::from(json!({"contracts": []}));
        assert!(ctx.resolve_path("contracts.status").is_null());
    }

    #[test]
    fn scalar_asked_for_key_resolves_to_null() {
        let ctx = Value::from(json!({"status": "DRAFT"}));
        assert!(ctx.resolve_path("status.length").is_null());
    }

    #[test]
    fn terminal_list_is_returned_whole() {
        let ctx = Value::from(json!({"proofs": [1, 2]}));
        assert_eq!(
            ctx.resolve_path("proofs"),
            &Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn integers_and_decimals_compare_numerically() {
        assert_eq!(Value::from(json!(80)), Value::from(json!(80.0)));
    }

    #[test]
    fn deserializes_untagged_json() {
        let v: Value = serde_json::from_str(r#"{"n": 3, "s": "x", "b": true, "z": null, "l": [1]}"#)
            .unwrap();
        assert_eq!(v.get("n"), &Value::Number(3.0));
        assert_eq!(v.get("s").as_str(), Some("x"));
        assert_eq!(v.get("b").as_bool(), Some(true));
        assert!(v.get("z").is_null());
        assert_eq!(v.get("l").kind(), "list");
    }

    #[test]
    fn whole_numbers_render_as_json_integers() {
        let rendered = serde_json::Value::from(&Value::Number(80.0));
        assert_eq!(rendered, json!(80));
        let rendered = serde_json::Value::from(&Value::Number(72.5));
        assert_eq!(rendered, json!(72.5));
    }

    #[test]
    fn serialize_matches_json_conversion() {
        for value in [
            Value::Number(80.0),
            Value::Number(79.5),
            Value::Number(-3.0),
            Value::Number(f64::NAN),
            Value::from(json!({"min": 80, "rate": [72.5, 100], "ok": true, "x": null})),
        ] {
            assert_eq!(
                serde_json::to_value(&value).unwrap(),
                serde_json::Value::from(&value)
            );
        }
        assert_eq!(serde_json::to_string(&Value::Number(80.0)).unwrap(), "80");
        assert_eq!(serde_json::to_string(&Value::Number(79.5)).unwrap(), "79.5");
    }

    #[test]
    fn option_conversion() {
        assert!(Value::from(None::<String>).is_null());
        assert_eq!(Value::from(Some("x")), Value::String("x".into()));
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1000i64..1000).prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::String),
        ]
    }

    fn tree() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
                prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(Value::Map),
            ]
        })
    }

    proptest! {
        /// Resolution is total: any path over any tree returns without panicking.
        #[test]
        fn resolution_never_panics(value in tree(), path in "[a-c.]{0,8}") {
            let _ = value.resolve_path(&path);
        }

        /// Wrapping a map in a list does not change what a path resolves to.
        #[test]
        fn list_wrapping_is_transparent(value in tree(), key in "[a-c]", rest in "(\\.[a-c]){0,3}") {
            let map = Value::map([(key.clone(), value)]);
            let wrapped = Value::map([("root", Value::List(vec![map.clone()]))]);
            let direct = Value::map([("root", map)]);
            let path = format!("root.{key}{rest}");
            prop_assert_eq!(wrapped.resolve_path(&path), direct.resolve_path(&path));
        }
    }
}
