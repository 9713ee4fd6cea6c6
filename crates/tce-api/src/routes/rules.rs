//! # Rules API
//!
//! Read-only view of the rule document loaded at startup.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tce_rules::{Rule, Trigger};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

/// Optional filter.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RulesQuery {
    /// Only rules bound to this trigger, e.g. `TO_CLOSED`.
    pub trigger: Option<String>,
}

/// One declarative rule.
#[derive(Debug, Serialize, ToSchema)]
pub struct RuleSummary {
    pub id: String,
    pub description: String,
    pub trigger: String,
    pub severity: String,
    pub message: String,
    /// The violation condition as written in the rule document.
    #[schema(value_type = Object)]
    pub logic: serde_json::Value,
}

impl From<&Rule> for RuleSummary {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            description: rule.description.clone(),
            trigger: rule.trigger.to_string(),
            severity: rule.severity.to_string(),
            message: rule.message.clone(),
            logic: serde_json::to_value(&rule.logic).unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RuleListResponse {
    pub version: Option<String>,
    pub count: usize,
    pub rules: Vec<RuleSummary>,
}

/// Build the rules router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/rules", get(list_rules))
}

/// GET /v1/rules: Loaded declarative rules, in document order.
#[utoipa::path(
    get,
    path = "/v1/rules",
    params(RulesQuery),
    responses(
        (status = 200, description = "Loaded rules", body = RuleListResponse),
        (status = 422, description = "Malformed trigger filter", body = crate::error::ErrorBody),
    ),
    tag = "rules"
)]
pub(crate) async fn list_rules(
    State(state): State<AppState>,
    query: Result<Query<RulesQuery>, QueryRejection>,
) -> Result<Json<RuleListResponse>, AppError> {
    let query = extract_query(query)?;
    let document = state.rules();
    let rules: Vec<RuleSummary> = match query.trigger.as_deref() {
        Some(raw) => {
            let trigger: Trigger = raw.trim().parse()?;
            document
                .rules_for(trigger.target())
                .map(RuleSummary::from)
                .collect()
        }
        None => document.rules().iter().map(RuleSummary::from).collect(),
    };
    Ok(Json(RuleListResponse {
        version: document.version().map(str::to_string),
        count: rules.len(),
        rules,
    }))
}
