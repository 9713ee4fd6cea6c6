//! # tce-rules: Declarative Compliance Rules
//!
//! The data-editable half of the compliance engine. Rule documents are
//! written by compliance officers, not engineers, so this crate is built
//! around one guarantee: a rule can read fields and compare them with
//! literals, and nothing else.
//!
//! ## Capabilities
//!
//! - **Strict schema** ([`schema`]): a rule is an id, a `TO_<STATUS>`
//!   trigger, a severity, a message and a recursive AND-chain of
//!   single-field comparisons. Unknown fields, unknown operators and
//!   unknown statuses are rejected.
//!
//! - **Fail-closed loader** ([`loader`]): a document either loads
//!   completely or not at all. There is no half-loaded state.
//!
//! - **Condition evaluator** ([`evaluator`]): resolves dotted paths over a
//!   [`tce_core::Value`] snapshot and applies one of ten operators. It
//!   never executes caller-supplied code.
//!
//! ```text
//! rules.json ──load_rules()──> RuleDocument ──rules_for(status)──> evaluate(snapshot, logic)
//! ```

pub mod error;
pub mod evaluator;
pub mod loader;
pub mod schema;

// Re-export primary types.
pub use error::{RuleEvaluationError, SchemaError};
pub use evaluator::{evaluate, explain};
pub use loader::load_rules;
pub use schema::{Logic, Operator, Rule, RuleDocument, Severity, Trigger};
