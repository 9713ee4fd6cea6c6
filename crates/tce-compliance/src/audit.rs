//! # Audit Trail
//!
//! An [`AuditLogEntry`] records an actor's attempted transition when that
//! attempt raised at least one error or warning. Entries are immutable.
//!
//! Each entry is chained to its predecessor by SHA-256:
//!
//! ```text
//! entry_hash = SHA-256(previous_hash || id || tenant_id || actor_id
//!                      || actor_role || action || entity_type || entity_id
//!                      || phase || is_forced || previous_state || new_state
//!                      || canonical(details) || timestamp)
//! ```
//!
//! The first entry chains to [`GENESIS_HASH`]. Stores compute the hash at
//! append time from the last stored entry, so rewriting any entry breaks
//! every link after it.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tce_core::{DossierStatus, Phase};
use uuid::Uuid;

/// Previous hash of the first entry in a chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Entity type recorded on transition audit entries.
pub const DOSSIER_ENTITY: &str = "DOSSIER";

/// Who asked for a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }
}

/// What the audit entry records about the attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// At least one blocking error.
    TransitionBlocked,
    /// Allowed, with warnings.
    TransitionAllowedWithWarnings,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransitionBlocked => "TRANSITION_BLOCKED",
            Self::TransitionAllowedWithWarnings => "TRANSITION_ALLOWED_WITH_WARNINGS",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRANSITION_BLOCKED" => Ok(Self::TransitionBlocked),
            "TRANSITION_ALLOWED_WITH_WARNINGS" => Ok(Self::TransitionAllowedWithWarnings),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// Audit entry as built by the engine, before it is chained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEntry {
    pub tenant_id: String,
    pub actor: Actor,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub phase: Phase,
    /// The engine only advises, so entries it writes are never forced.
    pub is_forced: bool,
    pub previous_state: DossierStatus,
    pub new_state: DossierStatus,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Stored, chained audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub tenant_id: String,
    pub actor_id: String,
    pub actor_role: Option<String>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub phase: Phase,
    pub is_forced: bool,
    pub previous_state: DossierStatus,
    pub new_state: DossierStatus,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub previous_hash: String,
    pub entry_hash: String,
}

impl NewAuditEntry {
    /// Chain this entry after `previous_hash` and give it an id.
    pub fn chain(self, previous_hash: &str) -> AuditLogEntry {
        let mut entry = AuditLogEntry {
            id: Uuid::new_v4(),
            tenant_id: self.tenant_id,
            actor_id: self.actor.id,
            actor_role: self.actor.role,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            phase: self.phase,
            is_forced: self.is_forced,
            previous_state: self.previous_state,
            new_state: self.new_state,
            details: self.details,
            timestamp: self.timestamp,
            previous_hash: previous_hash.to_string(),
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.recompute_hash();
        entry
    }
}

impl AuditLogEntry {
    /// Recompute this entry's hash from every stored field but the hash
    /// itself.
    pub fn recompute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        let id = self.id.to_string();
        let has_role = if self.actor_role.is_some() { "1" } else { "0" };
        let is_forced = if self.is_forced { "1" } else { "0" };
        for part in [
            self.previous_hash.as_str(),
            id.as_str(),
            self.tenant_id.as_str(),
            self.actor_id.as_str(),
            has_role,
            self.actor_role.as_deref().unwrap_or(""),
            self.action.as_str(),
            self.entity_type.as_str(),
            self.entity_id.as_str(),
            self.phase.as_str(),
            is_forced,
            self.previous_state.as_str(),
            self.new_state.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0x1f]);
        }
        let mut details = Vec::new();
        write_canonical(&self.details, &mut details);
        hasher.update(&details);
        hasher.update([0x1f]);
        // Micros: the precision Postgres keeps, so hashes survive a round trip.
        hasher.update(
            self.timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true)
                .as_bytes(),
        );
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Compact JSON with object keys sorted at every level, so the rendering
/// does not depend on map order after a JSONB round trip.
fn write_canonical(value: &serde_json::Value, out: &mut Vec<u8>) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(&serde_json::Value::String(key.clone()), out);
                out.push(b':');
                if let Some(v) = map.get(key) {
                    write_canonical(v, out);
                }
            }
            out.push(b'}');
        }
        serde_json::Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

/// Outcome of walking a chain in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainIntegrity {
    pub total_entries: usize,
    pub broken_links: usize,
}

impl ChainIntegrity {
    pub fn is_valid(&self) -> bool {
        self.broken_links == 0
    }
}

/// Check that every entry links to its predecessor and that its stored hash
/// matches its content.
pub fn verify_chain<'a, I>(entries: I) -> ChainIntegrity
where
    I: IntoIterator<Item = &'a AuditLogEntry>,
{
    let mut expected_previous = GENESIS_HASH.to_string();
    let mut total_entries = 0;
    let mut broken_links = 0;
    for entry in entries {
        total_entries += 1;
        if entry.previous_hash != expected_previous || entry.recompute_hash() != entry.entry_hash
        {
            broken_links += 1;
        }
        expected_previous = entry.entry_hash.clone();
    }
    ChainIntegrity {
        total_entries,
        broken_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(entity_id: &str) -> NewAuditEntry {
        NewAuditEntry {
            tenant_id: "org-1".into(),
            actor: Actor::new("user-7").with_role("ADMIN"),
            action: AuditAction::TransitionBlocked,
            entity_type: DOSSIER_ENTITY.into(),
            entity_id: entity_id.into(),
            phase: Phase::Billing,
            is_forced: false,
            previous_state: DossierStatus::Completed,
            new_state: DossierStatus::Invoiced,
            details: serde_json::json!({"errors": ["no NDA"], "blocked": true}),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn hash_is_hex_sha256() {
        let entry = draft("dos-1").chain(GENESIS_HASH);
        assert_eq!(entry.entry_hash.len(), 64);
        assert!(entry.entry_hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(entry.recompute_hash(), entry.entry_hash);
    }

    #[test]
    fn chain_verifies_and_detects_tampering() {
        let first = draft("dos-1").chain(GENESIS_HASH);
        let second = draft("dos-2").chain(&first.entry_hash);
        let mut entries = vec![first, second];
        assert!(verify_chain(&entries).is_valid());

        entries[0].entity_id = "dos-9".into();
        let integrity = verify_chain(&entries);
        assert_eq!(integrity.total_entries, 2);
        assert_eq!(integrity.broken_links, 1);
    }

    #[test]
    fn every_stored_field_is_covered() {
        let original = draft("dos-1").chain(GENESIS_HASH);
        let tampers: [(&str, fn(&mut AuditLogEntry)); 9] = [
            ("id", |e: &mut AuditLogEntry| e.id = Uuid::new_v4()),
            ("is_forced", |e: &mut AuditLogEntry| e.is_forced = true),
            ("details", |e: &mut AuditLogEntry| e.details = serde_json::json!({"blocked": false})),
            ("phase", |e: &mut AuditLogEntry| e.phase = Phase::Admission),
            ("actor_role", |e: &mut AuditLogEntry| e.actor_role = Some("AUDITOR".into())),
            ("actor_role removed", |e: &mut AuditLogEntry| e.actor_role = None),
            ("action", |e: &mut AuditLogEntry| e.action = AuditAction::TransitionAllowedWithWarnings),
            ("new_state", |e: &mut AuditLogEntry| e.new_state = DossierStatus::Closed),
            ("timestamp", |e: &mut AuditLogEntry| e.timestamp += chrono::Duration::seconds(1)),
        ];
        for (field, tamper) in tampers {
            let mut entry = original.clone();
            tamper(&mut entry);
            assert!(!verify_chain([&entry]).is_valid(), "{field} change went unnoticed");
        }
    }

    #[test]
    fn details_hash_ignores_key_order() {
        let mut entry = draft("dos-1").chain(GENESIS_HASH);
        entry.details = serde_json::json!({"b": 1, "a": {"y": [1, 2], "x": null}});
        let before = entry.recompute_hash();
        entry.details = serde_json::from_str(r#"{"a": {"x": null, "y": [1, 2]}, "b": 1}"#).unwrap();
        assert_eq!(entry.recompute_hash(), before);
    }

    #[test]
    fn reordering_breaks_the_chain() {
        let first = draft("dos-1").chain(GENESIS_HASH);
        let second = draft("dos-2").chain(&first.entry_hash);
        assert!(!verify_chain(&[second, first]).is_valid());
    }

    #[test]
    fn action_wire_names() {
        assert_eq!(
            serde_json::to_value(AuditAction::TransitionAllowedWithWarnings).unwrap(),
            serde_json::json!("TRANSITION_ALLOWED_WITH_WARNINGS")
        );
        assert_eq!(
            "TRANSITION_BLOCKED".parse::<AuditAction>().unwrap(),
            AuditAction::TransitionBlocked
        );
    }
}
