#![deny(missing_docs)]

//! # tce-core: Foundational Types for the Training Compliance Engine
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It has no internal crate dependencies: only `serde`, `serde_json`
//! and `thiserror` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **One status enum.** [`DossierStatus`] is the single definition of the
//!    dossier lifecycle. Status classes (active, invoicing, closure) and the
//!    audit [`Phase`] are derived from it with exhaustive `match`, so adding
//!    a status is a compile error until every classification addresses it.
//!
//! 2. **Newtype wrappers for regulatory identifiers.** [`NdaNumber`],
//!    [`UaiCode`] and [`Siret`] validate their format at construction time.
//!
//! 3. **A closed value model for rule evaluation.** [`Value`] is the only
//!    shape the condition evaluator ever inspects. Field access goes through
//!    the total [`Value::resolve_path`], never through reflection.
//!
//! 4. **Structured errors with `thiserror`.** No `Box<dyn Error>`, no
//!    `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod identity;
pub mod value;

// Re-export primary types at crate root for ergonomic imports.
pub use domain::{DossierStatus, FundingChannel, OrganizationKind, Phase};
pub use error::ValidationError;
pub use identity::{NdaNumber, Siret, UaiCode};
pub use value::Value;
