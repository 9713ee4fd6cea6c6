//! Audit log persistence: immutable hash chain.
//!
//! Each entry's hash chains to the entry with the next-lower `seq`. Appends
//! take a transaction-scoped advisory lock so that two concurrent appends
//! cannot chain to the same predecessor.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tce_compliance::{verify_chain, AuditLogEntry, ChainIntegrity, NewAuditEntry, GENESIS_HASH};
use uuid::Uuid;

use super::decode_name;

/// Advisory lock key serialising appends to `compliance_audit_log`.
const AUDIT_CHAIN_LOCK: i64 = 0x7463_655f_6175_6474;

const COLUMNS: &str = "id, tenant_id, actor_id, actor_role, action, entity_type, entity_id, phase,
     is_forced, previous_state, new_state, details, timestamp, previous_hash, entry_hash";

/// Chain `entry` after the latest stored entry and append it.
pub async fn append(pool: &PgPool, entry: NewAuditEntry) -> Result<AuditLogEntry, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(AUDIT_CHAIN_LOCK)
        .execute(&mut *tx)
        .await?;

    let previous: Option<String> = sqlx::query_scalar(
        "SELECT entry_hash FROM compliance_audit_log ORDER BY seq DESC LIMIT 1",
    )
    .fetch_optional(&mut *tx)
    .await?;

    let stored = entry.chain(previous.as_deref().unwrap_or(GENESIS_HASH));

    sqlx::query(
        "INSERT INTO compliance_audit_log (id, tenant_id, actor_id, actor_role, action,
         entity_type, entity_id, phase, is_forced, previous_state, new_state, details,
         timestamp, previous_hash, entry_hash)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(stored.id)
    .bind(&stored.tenant_id)
    .bind(&stored.actor_id)
    .bind(&stored.actor_role)
    .bind(stored.action.as_str())
    .bind(&stored.entity_type)
    .bind(&stored.entity_id)
    .bind(stored.phase.as_str())
    .bind(stored.is_forced)
    .bind(stored.previous_state.as_str())
    .bind(stored.new_state.as_str())
    .bind(&stored.details)
    .bind(stored.timestamp)
    .bind(&stored.previous_hash)
    .bind(&stored.entry_hash)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(stored)
}

/// Audit entries for one entity, oldest first.
pub async fn entries_for_entity(
    pool: &PgPool,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<AuditLogEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {COLUMNS} FROM compliance_audit_log
         WHERE entity_type = $1 AND entity_id = $2
         ORDER BY seq ASC"
    ))
    .bind(entity_type)
    .bind(entity_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(AuditRow::into_entry).collect()
}

/// Verify link continuity and content hashes of the first `limit` entries.
pub async fn verify_chain_integrity(pool: &PgPool, limit: i64) -> Result<ChainIntegrity, sqlx::Error> {
    let rows = sqlx::query_as::<_, AuditRow>(&format!(
        "SELECT {COLUMNS} FROM compliance_audit_log ORDER BY seq ASC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    let entries = rows
        .into_iter()
        .map(AuditRow::into_entry)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(verify_chain(&entries))
}

/// Database row for audit entries.
#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    tenant_id: String,
    actor_id: String,
    actor_role: Option<String>,
    action: String,
    entity_type: String,
    entity_id: String,
    phase: String,
    is_forced: bool,
    previous_state: String,
    new_state: String,
    details: serde_json::Value,
    timestamp: DateTime<Utc>,
    previous_hash: String,
    entry_hash: String,
}

impl AuditRow {
    fn into_entry(self) -> Result<AuditLogEntry, sqlx::Error> {
        Ok(AuditLogEntry {
            id: self.id,
            tenant_id: self.tenant_id,
            actor_id: self.actor_id,
            actor_role: self.actor_role,
            action: decode_name("action", &self.action)?,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            phase: decode_name("phase", &self.phase)?,
            is_forced: self.is_forced,
            previous_state: decode_name("previous_state", &self.previous_state)?,
            new_state: decode_name("new_state", &self.new_state)?,
            details: self.details,
            timestamp: self.timestamp,
            previous_hash: self.previous_hash,
            entry_hash: self.entry_hash,
        })
    }
}
