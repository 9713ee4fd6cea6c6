//! # tce-compliance: Training Dossier Compliance Engine
//!
//! Decides whether a training dossier may move to a requested status and
//! keeps the compliance record of every decision.
//!
//! ## Two Rule Layers
//!
//! - **Regulatory checks** ([`tenant`]): hard-coded, always blocking, run
//!   first on every transition. Alerts carry context `TENANT_COMPLIANCE`.
//! - **Declarative rules** ([`tce_rules`]): loaded once from a rule
//!   document, selected by `TO_<STATUS>` trigger. Alerts carry context
//!   `STATE_CHANGE`.
//!
//! ## Architecture
//!
//! ```text
//! caller ──> ComplianceEngine
//!              ├─ assess()  tenant checks ─> snapshot ─> evaluate × N rules
//!              └─ apply()   AlertStore::record_alert, AuditStore::record_audit
//!                   │
//!                   └─ ports ─> InMemoryComplianceStore | Postgres store
//! ```
//!
//! The engine owns no mutable state. The rule document is immutable and
//! shared behind an `Arc`; per-call state lives on the call's stack.

pub mod alert;
pub mod audit;
pub mod error;
pub mod model;
pub mod onboarding;
pub mod ports;
pub mod snapshot;
pub mod store;
pub mod tenant;
pub mod validator;

pub use alert::{AlertContext, ComplianceAlert, Violation};
pub use audit::{
    verify_chain, Actor, AuditAction, AuditLogEntry, ChainIntegrity, NewAuditEntry, GENESIS_HASH,
};
pub use error::{ComplianceError, NotFoundError, PersistenceError};
pub use model::{
    AttendanceRecord, Certification, Contract, ContractStatus, Dossier, Financer, Learner,
    Organization, Programme, Proof, ProofKind, Session,
};
pub use onboarding::{OrganizationDraft, SiteDraft, SiteKind, RULE_UAI_REQUIRED};
pub use ports::{AlertStore, AuditStore, DossierRepository};
pub use snapshot::build_snapshot;
pub use store::InMemoryComplianceStore;
pub use tenant::{TenantCheck, RULE_CFA_TUTOR_REQUIRED, RULE_NDA_REQUIRED, RULE_QUALIOPI_REQUIRED};
pub use validator::{
    Assessment, ComplianceEngine, Finding, PersistedRecord, PersistenceFailure, TransitionReport,
    ValidationResult, ValidatorOptions,
};
