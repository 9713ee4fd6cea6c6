//! # Evaluation Snapshot
//!
//! Projects a [`Dossier`] into the [`Value`] tree declarative rules read.
//!
//! The snapshot is built once per validation call and never mutated. Next
//! to the nested relations it carries flattened convenience fields, so a
//! rule can say `has_signed_contract IS_FALSE` instead of walking the
//! contract list (which the path syntax cannot do beyond the first element).
//!
//! Dates are rendered as ISO-8601 strings and timestamps as RFC 3339.

use chrono::{DateTime, NaiveDate, Utc};
use tce_core::Value;

use crate::model::{
    AttendanceRecord, Contract, Dossier, Financer, Learner, Organization, Proof, Session,
};

/// Build the evaluation context for `dossier`.
pub fn build_snapshot(dossier: &Dossier) -> Value {
    let financer = dossier.financer();
    Value::map([
        ("id", Value::from(dossier.id.as_str())),
        ("status", Value::from(dossier.status.as_str())),
        ("tenant_id", Value::from(dossier.tenant_id.as_str())),
        ("learner", learner(&dossier.learner)),
        ("organization", organization(&dossier.organization)),
        (
            "contracts",
            Value::List(dossier.contracts.iter().map(contract).collect()),
        ),
        (
            "contract",
            dossier.contracts.first().map_or(Value::Null, contract),
        ),
        ("financer", financer.map_or(Value::Null, self::financer)),
        (
            "funding_channel",
            Value::from(financer.map(|f| f.channel.as_str())),
        ),
        (
            "has_signed_contract",
            Value::from(dossier.has_signed_contract()),
        ),
        ("session", dossier.session.as_ref().map_or(Value::Null, session)),
        (
            "proofs",
            Value::List(dossier.proofs.iter().map(proof).collect()),
        ),
        (
            "has_justified_absence_proof",
            Value::from(dossier.has_justified_absence_proof()),
        ),
        (
            "attendance",
            Value::List(dossier.attendance.iter().map(attendance).collect()),
        ),
        ("hours_scheduled", Value::from(dossier.hours_scheduled())),
        ("hours_attended", Value::from(dossier.hours_attended())),
        ("attendance_rate", Value::from(dossier.attendance_rate())),
        (
            "certificate_generated",
            Value::from(dossier.certificate_generated),
        ),
        (
            "employer_reference",
            Value::from(dossier.employer_reference.clone()),
        ),
        ("supervisor_name", Value::from(dossier.supervisor_name.clone())),
    ])
}

fn date(d: NaiveDate) -> Value {
    Value::String(d.format("%Y-%m-%d").to_string())
}

fn timestamp(t: DateTime<Utc>) -> Value {
    Value::String(t.to_rfc3339())
}

fn learner(l: &Learner) -> Value {
    Value::map([
        ("first_name", Value::from(l.first_name.as_str())),
        ("last_name", Value::from(l.last_name.as_str())),
        ("email", Value::from(l.email.clone())),
    ])
}

fn organization(o: &Organization) -> Value {
    Value::map([
        ("id", Value::from(o.id.as_str())),
        ("name", Value::from(o.name.as_str())),
        ("nda_number", Value::from(o.nda_number.clone())),
        ("qualiopi_certified", Value::from(o.qualiopi_certified)),
        (
            "qualiopi_valid_until",
            o.qualiopi_valid_until.map_or(Value::Null, date),
        ),
        ("kind", Value::from(o.kind.as_str())),
        ("siret", Value::from(o.siret.clone())),
    ])
}

fn financer(f: &Financer) -> Value {
    Value::map([
        ("id", Value::from(f.id.as_str())),
        ("name", Value::from(f.name.as_str())),
        ("channel", Value::from(f.channel.as_str())),
    ])
}

fn contract(c: &Contract) -> Value {
    Value::map([
        ("id", Value::from(c.id.as_str())),
        ("status", Value::from(c.status.as_str())),
        ("signed_at", c.signed_at.map_or(Value::Null, timestamp)),
        ("amount_cents", Value::from(c.amount_cents)),
        ("financer", c.financer.as_ref().map_or(Value::Null, financer)),
    ])
}

fn session(s: &Session) -> Value {
    let certification = s.programme.certification.as_ref().map_or(Value::Null, |c| {
        Value::map([
            ("code", Value::from(c.code.as_str())),
            ("title", Value::from(c.title.as_str())),
        ])
    });
    Value::map([
        ("id", Value::from(s.id.as_str())),
        ("start_date", date(s.start_date)),
        ("end_date", date(s.end_date)),
        (
            "programme",
            Value::map([
                ("id", Value::from(s.programme.id.as_str())),
                ("title", Value::from(s.programme.title.as_str())),
                ("duration_hours", Value::from(s.programme.duration_hours)),
                ("certification", certification),
            ]),
        ),
    ])
}

fn proof(p: &Proof) -> Value {
    Value::map([
        ("id", Value::from(p.id.as_str())),
        ("kind", Value::from(p.kind.as_str())),
        ("uploaded_at", timestamp(p.uploaded_at)),
    ])
}

fn attendance(a: &AttendanceRecord) -> Value {
    Value::map([
        ("date", date(a.date)),
        ("hours_scheduled", Value::from(a.hours_scheduled)),
        ("hours_attended", Value::from(a.hours_attended)),
        ("absence_justified", Value::from(a.absence_justified)),
    ])
}
