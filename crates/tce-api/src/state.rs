//! # Application State
//!
//! Shared state handed to every handler. The engine is immutable after
//! startup, so the state is a pair of cheap clones: the engine behind an
//! `Arc` and the optional connection pool.

use std::sync::Arc;

use sqlx::PgPool;
use tce_compliance::{ComplianceEngine, InMemoryComplianceStore, ValidatorOptions};
use tce_rules::RuleDocument;

use crate::db::PgComplianceStore;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<ComplianceEngine>,
    /// `None` in in-memory mode.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// State around an already-built engine, with no database.
    pub fn new(engine: ComplianceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            db_pool: None,
        }
    }

    /// Engine backed by an in-memory store.
    pub fn in_memory(
        rules: Arc<RuleDocument>,
        store: Arc<InMemoryComplianceStore>,
        options: ValidatorOptions,
    ) -> Self {
        Self::new(ComplianceEngine::with_store(rules, store).with_options(options))
    }

    /// Engine backed by Postgres.
    pub fn with_pool(rules: Arc<RuleDocument>, pool: PgPool, options: ValidatorOptions) -> Self {
        let store = Arc::new(PgComplianceStore::new(pool.clone()));
        Self {
            engine: Arc::new(ComplianceEngine::with_store(rules, store).with_options(options)),
            db_pool: Some(pool),
        }
    }

    pub fn rules(&self) -> &RuleDocument {
        self.engine.rules()
    }
}
