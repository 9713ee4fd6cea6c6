//! # Rule Schema
//!
//! Typed model of a declarative rule document.
//!
//! ```json
//! {
//!   "version": "2026.1",
//!   "rules": [{
//!     "id": "CLOSURE_ATTENDANCE_MINIMUM",
//!     "description": "Closing requires 80% attendance",
//!     "trigger": "TO_CLOSED",
//!     "severity": "BLOCKING",
//!     "message": "Attendance rate is below the 80% required to close the dossier.",
//!     "logic": {
//!       "field": "attendance_rate", "operator": "LT", "value": 80,
//!       "additionalCheck": { "field": "status", "operator": "NOT_EQUALS", "value": "CANCELLED" }
//!     }
//!   }]
//! }
//! ```
//!
//! The shape is strict: unknown keys are rejected (`deny_unknown_fields`)
//! so a misspelt `additonalCheck` fails the load instead of silently
//! dropping half of a condition. [`Operator`] and [`Severity`] are closed
//! enums and a [`Trigger`] must name a real dossier status.
//!
//! There is no OR and no NOT. `additionalCheck` is the only combinator and
//! it means AND.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tce_core::{DossierStatus, ValidationError, Value};

/// Whether a violated rule blocks the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Violation sets `success = false`.
    Blocking,
    /// Violation is reported but never blocks.
    Warning,
}

impl Severity {
    /// Return the wire name of this severity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "BLOCKING",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied between the resolved field and the rule operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Strict equality, any type.
    Equals,
    /// Strict inequality, any type.
    NotEquals,
    /// Numeric `<`.
    Lt,
    /// Numeric `>`.
    Gt,
    /// Numeric `>=`.
    Gte,
    /// Numeric `<=`.
    Lte,
    /// Field is exactly `true`.
    IsTrue,
    /// Field is exactly `false`.
    IsFalse,
    /// Field is a string containing the operand.
    Contains,
    /// Field is a string not containing the operand.
    NotContains,
}

impl Operator {
    /// Return the wire name of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::NotEquals => "NOT_EQUALS",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Gte => "GTE",
            Self::Lte => "LTE",
            Self::IsTrue => "IS_TRUE",
            Self::IsFalse => "IS_FALSE",
            Self::Contains => "CONTAINS",
            Self::NotContains => "NOT_CONTAINS",
        }
    }

    /// Operators that only ever match numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Lt | Self::Gt | Self::Gte | Self::Lte)
    }

    /// Operators that only ever match strings.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Contains | Self::NotContains)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding of a rule to a transition, written `TO_<STATUS>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Trigger(DossierStatus);

impl Trigger {
    /// Trigger for a transition into `status`.
    pub fn to(status: DossierStatus) -> Self {
        Self(status)
    }

    /// The target status this trigger fires on.
    pub fn target(&self) -> DossierStatus {
        self.0
    }

    /// Whether this trigger fires for a transition into `status`.
    pub fn matches(&self, status: DossierStatus) -> bool {
        self.0 == status
    }
}

impl FromStr for Trigger {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DossierStatus::from_trigger(s).map(Self)
    }
}

impl TryFrom<String> for Trigger {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Trigger> for String {
    fn from(trigger: Trigger) -> Self {
        trigger.0.trigger_name()
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.trigger_name())
    }
}

/// One comparison, optionally ANDed with a nested comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Logic {
    /// Dotted path into the dossier snapshot.
    pub field: String,
    /// Comparison to apply.
    pub operator: Operator,
    /// Literal operand. Absent means null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Condition that must also hold for the rule to be violated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_check: Option<Box<Logic>>,
}

impl Logic {
    /// A single comparison with no nested check.
    pub fn new(field: impl Into<String>, operator: Operator, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            additional_check: None,
        }
    }

    /// Append `next` at the end of this AND-chain.
    pub fn and(mut self, next: Logic) -> Self {
        let mut slot = &mut self.additional_check;
        while let Some(inner) = slot {
            slot = &mut inner.additional_check;
        }
        *slot = Some(Box::new(next));
        self
    }

    /// Iterate over this condition and every nested check, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &Logic> {
        std::iter::successors(Some(self), |logic| logic.additional_check.as_deref())
    }

    /// Whether the operand's type can never satisfy the operator, so this
    /// condition never matches.
    pub fn is_inert(&self) -> bool {
        let operand = self.value.as_ref().unwrap_or(&Value::Null);
        (self.operator.is_numeric() && operand.as_f64().is_none())
            || (self.operator.is_textual() && operand.as_str().is_none())
    }
}

/// A declarative compliance rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Unique identifier within the document.
    pub id: String,
    /// What the rule protects, for operators.
    pub description: String,
    /// Transition the rule is bound to.
    pub trigger: Trigger,
    /// Whether a violation blocks.
    pub severity: Severity,
    /// Text shown to the user when the rule is violated.
    pub message: String,
    /// Violation condition.
    pub logic: Logic,
}

/// A loaded, validated rule document.
///
/// Only the [`loader`](crate::loader) constructs this type, so holding a
/// `RuleDocument` means holding a document that passed every schema check.
/// It is immutable: share it behind an `Arc` for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) version: Option<String>,
    pub(crate) rules: Vec<Rule>,
}

impl RuleDocument {
    /// Optional version label carried by the document.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// All rules in document order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the document holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules bound to a transition into `status`, in document order.
    pub fn rules_for(&self, status: DossierStatus) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(move |r| r.trigger.matches(status))
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Conditions that can never match, with their rule.
    pub fn inert_conditions(&self) -> impl Iterator<Item = (&Rule, &Logic)> {
        self.rules.iter().flat_map(|rule| {
            rule.logic
                .chain()
                .filter(|logic| logic.is_inert())
                .map(move |logic| (rule, logic))
        })
    }
}

/// Wire shape of a document before semantic checks.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawDocument {
    #[serde(default)]
    pub(crate) version: Option<String>,
    pub(crate) rules: Vec<Rule>,
}
