//! # Condition Evaluator
//!
//! Interprets a [`Logic`] chain against a snapshot. Returns `true` when the
//! violation condition is met.
//!
//! The evaluator reads field paths, applies one of the closed set of
//! [`Operator`]s to a literal operand, and ANDs the nested
//! `additionalCheck`. That is the whole language. Every condition in the
//! chain sees the same snapshot.
//!
//! Type mismatches are not errors. An ordering operator over a non-number
//! and a substring operator over a non-string are "not a violation". The
//! loader warns about rules written that way.

use tce_core::Value;

use crate::error::RuleEvaluationError;
use crate::schema::{Logic, Operator};

/// A validated dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> FieldPath<'a> {
    fn parse(path: &'a str) -> Result<Self, RuleEvaluationError> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(RuleEvaluationError::MalformedPath {
                path: path.to_string(),
            });
        }
        Ok(Self { segments })
    }

    fn resolve<'v>(&self, context: &'v Value) -> &'v Value {
        context.resolve_segments(self.segments.iter().copied())
    }
}

/// Evaluate `logic` against `context`.
///
/// # Errors
///
/// Returns [`RuleEvaluationError::MalformedPath`] if any field path in the
/// chain is empty or has an empty segment. Paths are checked before any
/// condition is applied, so an error never depends on snapshot contents.
pub fn evaluate(context: &Value, logic: &Logic) -> Result<bool, RuleEvaluationError> {
    let paths = logic
        .chain()
        .map(|l| FieldPath::parse(&l.field))
        .collect::<Result<Vec<_>, _>>()?;

    for (condition, path) in logic.chain().zip(&paths) {
        let actual = path.resolve(context);
        if !apply(condition.operator, actual, condition.value.as_ref()) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Per-condition breakdown of an evaluation, for alert details and
/// dry-run output.
///
/// ```json
/// [{"field": "attendance_rate", "operator": "LT", "expected": 80, "actual": 42.5, "matched": true}]
/// ```
///
/// Unlike [`evaluate`] this does not short-circuit: every condition in the
/// chain is reported. Malformed paths report `actual: null, matched: false`.
pub fn explain(context: &Value, logic: &Logic) -> serde_json::Value {
    let steps = logic
        .chain()
        .map(|condition| {
            let (actual, matched) = match FieldPath::parse(&condition.field) {
                Ok(path) => {
                    let actual = path.resolve(context);
                    (
                        serde_json::Value::from(actual),
                        apply(condition.operator, actual, condition.value.as_ref()),
                    )
                }
                Err(_) => (serde_json::Value::Null, false),
            };
            serde_json::json!({
                "field": condition.field,
                "operator": condition.operator.as_str(),
                "expected": condition.value.as_ref().map(serde_json::Value::from),
                "actual": actual,
                "matched": matched,
            })
        })
        .collect();
    serde_json::Value::Array(steps)
}

fn apply(operator: Operator, actual: &Value, expected: Option<&Value>) -> bool {
    let expected = expected.unwrap_or(&Value::Null);
    match operator {
        Operator::Equals => actual == expected,
        Operator::NotEquals => actual != expected,
        Operator::Lt => compare(actual, expected, |a, b| a < b),
        Operator::Gt => compare(actual, expected, |a, b| a > b),
        Operator::Gte => compare(actual, expected, |a, b| a >= b),
        Operator::Lte => compare(actual, expected, |a, b| a <= b),
        Operator::IsTrue => actual.as_bool() == Some(true),
        Operator::IsFalse => actual.as_bool() == Some(false),
        Operator::Contains => substring(actual, expected).unwrap_or(false),
        Operator::NotContains => substring(actual, expected).map_or(false, |found| !found),
    }
}

fn compare(actual: &Value, expected: &Value, op: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => op(a, b),
        _ => false,
    }
}

/// `None` when either side is not a string.
fn substring(actual: &Value, expected: &Value) -> Option<bool> {
    Some(actual.as_str()?.contains(expected.as_str()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn ctx(v: serde_json::Value) -> Value {
        Value::from(v)
    }

    fn logic(field: &str, operator: Operator, value: serde_json::Value) -> Logic {
        let value = if value.is_null() {
            None
        } else {
            Some(Value::from(value))
        };
        Logic::new(field, operator, value)
    }

    // ---- Path resolution ----

    #[test]
    fn resolves_first_element_of_list() {
        let c = ctx(json!({"a": {"b": [{"c": 5}]}}));
        assert!(evaluate(&c, &logic("a.b.c", Operator::Equals, json!(5))).unwrap());
    }

    #[test]
    fn missing_segment_is_null_and_never_errors() {
        let c = ctx(json!({"a": {}}));
        for op in [
            Operator::Lt,
            Operator::Gt,
            Operator::Gte,
            Operator::Lte,
            Operator::IsTrue,
            Operator::IsFalse,
            Operator::Contains,
            Operator::NotContains,
        ] {
            assert!(!evaluate(&c, &logic("a.b.c", op, json!(1))).unwrap());
        }
        assert!(evaluate(&c, &Logic::new("a.b.c", Operator::Equals, None)).unwrap());
    }

    #[test]
    fn malformed_paths_are_errors() {
        let c = ctx(json!({}));
        for path in ["", "a..b", ".a", "a."] {
            let err = evaluate(&c, &logic(path, Operator::IsTrue, json!(null))).unwrap_err();
            assert_eq!(err, RuleEvaluationError::MalformedPath { path: path.into() });
        }
    }

    #[test]
    fn malformed_nested_path_errors_even_when_primary_is_false() {
        let c = ctx(json!({"x": false}));
        let l = logic("x", Operator::IsTrue, json!(null))
            .and(logic("a..b", Operator::IsTrue, json!(null)));
        assert!(evaluate(&c, &l).is_err());
    }

    // ---- Operators ----

    #[test]
    fn equality_is_strict_across_types() {
        let c = ctx(json!({"n": 5, "s": "5", "b": true}));
        assert!(!evaluate(&c, &logic("s", Operator::Equals, json!(5))).unwrap());
        assert!(evaluate(&c, &logic("s", Operator::NotEquals, json!(5))).unwrap());
        assert!(!evaluate(&c, &logic("b", Operator::Equals, json!(1))).unwrap());
        assert!(evaluate(&c, &logic("n", Operator::Equals, json!(5.0))).unwrap());
    }

    #[test]
    fn numeric_comparisons() {
        let c = ctx(json!({"rate": 72.5}));
        assert!(evaluate(&c, &logic("rate", Operator::Lt, json!(80))).unwrap());
        assert!(!evaluate(&c, &logic("rate", Operator::Gt, json!(80))).unwrap());
        assert!(evaluate(&c, &logic("rate", Operator::Gte, json!(72.5))).unwrap());
        assert!(evaluate(&c, &logic("rate", Operator::Lte, json!(72.5))).unwrap());
    }

    #[test]
    fn numeric_comparison_on_non_number_is_false() {
        let c = ctx(json!({"rate": "72"}));
        assert!(!evaluate(&c, &logic("rate", Operator::Lt, json!(80))).unwrap());
        let c = ctx(json!({"rate": 72}));
        assert!(!evaluate(&c, &logic("rate", Operator::Lt, json!("80"))).unwrap());
    }

    #[test]
    fn boolean_checks_are_strict() {
        let c = ctx(json!({"t": true, "f": false, "one": 1, "zero": 0, "none": null}));
        assert!(evaluate(&c, &logic("t", Operator::IsTrue, json!(null))).unwrap());
        assert!(evaluate(&c, &logic("f", Operator::IsFalse, json!(null))).unwrap());
        assert!(!evaluate(&c, &logic("one", Operator::IsTrue, json!(null))).unwrap());
        assert!(!evaluate(&c, &logic("zero", Operator::IsFalse, json!(null))).unwrap());
        assert!(!evaluate(&c, &logic("none", Operator::IsFalse, json!(null))).unwrap());
    }

    #[test]
    fn substring_checks_require_strings() {
        let c = ctx(json!({"email": "ana@example.org", "n": 42}));
        assert!(evaluate(&c, &logic("email", Operator::Contains, json!("@"))).unwrap());
        assert!(!evaluate(&c, &logic("email", Operator::NotContains, json!("@"))).unwrap());
        assert!(evaluate(&c, &logic("email", Operator::NotContains, json!("#"))).unwrap());
        assert!(!evaluate(&c, &logic("n", Operator::Contains, json!("4"))).unwrap());
        assert!(!evaluate(&c, &logic("n", Operator::NotContains, json!("4"))).unwrap());
    }

    // ---- AND-chaining ----

    #[test]
    fn additional_check_is_and() {
        let both = ctx(json!({"rate": 50, "status": "IN_TRAINING"}));
        let l = logic("rate", Operator::Lt, json!(80)).and(logic(
            "status",
            Operator::NotEquals,
            json!("CANCELLED"),
        ));
        assert!(evaluate(&both, &l).unwrap());

        let primary_false = ctx(json!({"rate": 90, "status": "IN_TRAINING"}));
        assert!(!evaluate(&primary_false, &l).unwrap());

        let nested_false = ctx(json!({"rate": 50, "status": "CANCELLED"}));
        assert!(!evaluate(&nested_false, &l).unwrap());
    }

    #[test]
    fn deep_chain_needs_every_condition() {
        let c = ctx(json!({"a": true, "b": true, "c": true}));
        let l = logic("a", Operator::IsTrue, json!(null))
            .and(logic("b", Operator::IsTrue, json!(null)))
            .and(logic("c", Operator::IsTrue, json!(null)));
        assert!(evaluate(&c, &l).unwrap());
        let c = ctx(json!({"a": true, "b": true, "c": false}));
        assert!(!evaluate(&c, &l).unwrap());
    }

    // ---- explain ----

    #[test]
    fn explain_reports_every_condition() {
        let c = ctx(json!({"rate": 42.5, "status": "CANCELLED"}));
        let l = logic("rate", Operator::Lt, json!(80)).and(logic(
            "status",
            Operator::NotEquals,
            json!("CANCELLED"),
        ));
        let report = explain(&c, &l);
        assert_eq!(
            report,
            json!([
                {"field": "rate", "operator": "LT", "expected": 80, "actual": 42.5, "matched": true},
                {"field": "status", "operator": "NOT_EQUALS", "expected": "CANCELLED", "actual": "CANCELLED", "matched": false}
            ])
        );
    }

    proptest! {
        /// LT and GTE partition the finite numbers.
        #[test]
        fn lt_and_gte_are_complementary(a in -1e9f64..1e9, b in -1e9f64..1e9) {
            let c = Value::map([("n", Value::Number(a))]);
            let lt = evaluate(&c, &Logic::new("n", Operator::Lt, Some(Value::Number(b)))).unwrap();
            let gte = evaluate(&c, &Logic::new("n", Operator::Gte, Some(Value::Number(b)))).unwrap();
            prop_assert_ne!(lt, gte);
        }

        /// Well-formed paths never error, whatever the snapshot holds.
        #[test]
        fn well_formed_paths_never_error(path in "[a-c]{1,3}(\\.[a-c]{1,3}){0,3}", n in any::<i32>()) {
            let c = ctx(json!({"a": {"b": [n]}, "c": "text"}));
            prop_assert!(evaluate(&c, &Logic::new(path, Operator::Equals, None)).is_ok());
        }
    }
}
