//! Field-level validation and normalization of inbound payloads.
//!
//! Payloads arrive as untyped JSON. Checks run in a fixed order so the first
//! failure is always the most specific one:
//! 1. the payload must be a non-empty object;
//! 2. the identifier field must be absent;
//! 3. no field outside the entity's rule set may appear;
//! 4. each rule runs in declaration order (all rules for full payloads, only
//!    present fields for sparse ones).

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde_json::{Map, Value};

use crate::core::error::RecordError;
use crate::core::identifier::{IdentifierPolicy, RecordId};
use crate::core::types::{AgentDraft, CaseDraft, CaseStatus};

/// Name of the identifier field. Never accepted from callers.
pub const ID_FIELD: &str = "id";

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date pattern"));

/// Whether every rule must be satisfied or only those whose field is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    /// Create and full replace.
    Full,
    /// Partial update.
    Sparse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty text.
    Text,
    /// Strict `YYYY-MM-DD`, not after today.
    Date,
    /// One of the listed lowercase values, matched case-insensitively.
    Enum(&'static [&'static str]),
    /// Identifier of another record, format-checked by the policy.
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub rule: Rule,
}

pub const AGENT_RULES: &[FieldRule] = &[
    FieldRule {
        name: "nome",
        rule: Rule::Text,
    },
    FieldRule {
        name: "dataDeIncorporacao",
        rule: Rule::Date,
    },
    FieldRule {
        name: "cargo",
        rule: Rule::Text,
    },
];

pub const CASE_RULES: &[FieldRule] = &[
    FieldRule {
        name: "titulo",
        rule: Rule::Text,
    },
    FieldRule {
        name: "descricao",
        rule: Rule::Text,
    },
    FieldRule {
        name: "status",
        rule: Rule::Enum(&CaseStatus::ALLOWED),
    },
    FieldRule {
        name: "agente_id",
        rule: Rule::Reference,
    },
];

/// Inputs that vary per request rather than per payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationContext {
    /// Latest acceptable calendar date (wall clock at validation time).
    pub today: NaiveDate,
    pub policy: IdentifierPolicy,
}

impl ValidationContext {
    /// Context pinned to the local calendar date right now.
    pub fn now(policy: IdentifierPolicy) -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            policy,
        }
    }
}

/// Strict calendar date parse: exactly `YYYY-MM-DD`, no time component.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if !DATE_SHAPE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Decode a raw request body. Empty or non-JSON bodies are malformed.
pub fn parse_payload(body: &[u8]) -> Result<Value, RecordError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RecordError::malformed("payload is empty"));
    }
    serde_json::from_slice(body)
        .map_err(|err| RecordError::malformed(format!("payload is not valid JSON: {err}")))
}

/// Reject anything that is not a non-empty JSON object.
pub fn require_object(payload: &Value) -> Result<&Map<String, Value>, RecordError> {
    match payload {
        Value::Object(map) if map.is_empty() => Err(RecordError::malformed("payload is empty")),
        Value::Object(map) => Ok(map),
        Value::Null => Err(RecordError::malformed("payload is absent")),
        Value::Array(_) => Err(RecordError::malformed("payload must be an object, not an array")),
        _ => Err(RecordError::malformed("payload must be an object")),
    }
}

/// Validate `payload` against `rules` and return the normalized fields.
///
/// Only fields named by a rule appear in the result. Enum values come back
/// lowercased and references in their canonical wire form.
pub fn validate_fields(
    payload: &Value,
    rules: &[FieldRule],
    completeness: Completeness,
    ctx: &ValidationContext,
) -> Result<Map<String, Value>, RecordError> {
    let map = require_object(payload)?;

    if map.contains_key(ID_FIELD) {
        return Err(RecordError::ForbiddenFieldInPayload {
            field: ID_FIELD.to_string(),
        });
    }

    if let Some(unknown) = map
        .keys()
        .find(|key| !rules.iter().any(|rule| rule.name == key.as_str()))
    {
        return Err(RecordError::invalid_field(unknown, "unknown field"));
    }

    let mut normalized = Map::new();
    for rule in rules {
        match map.get(rule.name) {
            Some(value) => {
                let checked = check_value(rule, value, ctx)?;
                normalized.insert(rule.name.to_string(), checked);
            }
            None if completeness == Completeness::Full => {
                return Err(RecordError::MissingRequiredField {
                    field: rule.name.to_string(),
                });
            }
            None => {}
        }
    }

    Ok(normalized)
}

/// Validate a full agent payload (create or replace).
pub fn agent_draft(payload: &Value, ctx: &ValidationContext) -> Result<AgentDraft, RecordError> {
    let fields = validate_fields(payload, AGENT_RULES, Completeness::Full, ctx)?;
    Ok(AgentDraft {
        nome: take_text(&fields, "nome")?,
        data_de_incorporacao: take_text(&fields, "dataDeIncorporacao")?,
        cargo: take_text(&fields, "cargo")?,
    })
}

/// Validate a full case payload (create or replace).
///
/// Only the reference's format is checked here; existence is the integrity
/// checker's job.
pub fn case_draft(payload: &Value, ctx: &ValidationContext) -> Result<CaseDraft, RecordError> {
    let fields = validate_fields(payload, CASE_RULES, Completeness::Full, ctx)?;
    let status_text = take_text(&fields, "status")?;
    let status = CaseStatus::parse(&status_text).ok_or_else(|| RecordError::InvalidEnumValue {
        field: "status".to_string(),
        value: status_text.clone(),
        allowed: allowed_values(&CaseStatus::ALLOWED),
    })?;
    let agente_id = fields
        .get("agente_id")
        .and_then(RecordId::from_json)
        .ok_or_else(|| RecordError::MissingRequiredField {
            field: "agente_id".to_string(),
        })?;
    Ok(CaseDraft {
        titulo: take_text(&fields, "titulo")?,
        descricao: take_text(&fields, "descricao")?,
        status,
        agente_id,
    })
}

fn check_value(
    rule: &FieldRule,
    value: &Value,
    ctx: &ValidationContext,
) -> Result<Value, RecordError> {
    let field = rule.name;
    match rule.rule {
        Rule::Text => match value {
            Value::String(text) if !text.trim().is_empty() => Ok(value.clone()),
            Value::String(_) | Value::Null => {
                Err(RecordError::invalid_field(field, "must not be empty"))
            }
            _ => Err(RecordError::invalid_field(field, "must be text")),
        },
        Rule::Date => {
            let Value::String(text) = value else {
                return Err(RecordError::InvalidDate {
                    field: field.to_string(),
                    value: value.to_string(),
                    reason: "expected YYYY-MM-DD text".to_string(),
                });
            };
            let date = parse_date(text).ok_or_else(|| RecordError::InvalidDate {
                field: field.to_string(),
                value: text.clone(),
                reason: "expected a calendar date as YYYY-MM-DD".to_string(),
            })?;
            if date > ctx.today {
                return Err(RecordError::InvalidDate {
                    field: field.to_string(),
                    value: text.clone(),
                    reason: "date is in the future".to_string(),
                });
            }
            Ok(value.clone())
        }
        Rule::Enum(allowed) => {
            let candidate = match value {
                Value::String(text) => text.trim().to_lowercase(),
                other => other.to_string(),
            };
            if allowed.contains(&candidate.as_str()) {
                Ok(Value::String(candidate))
            } else {
                Err(RecordError::InvalidEnumValue {
                    field: field.to_string(),
                    value: match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    },
                    allowed: allowed_values(allowed),
                })
            }
        }
        Rule::Reference => {
            if value.is_null() || value.as_str().is_some_and(|text| text.trim().is_empty()) {
                return Err(RecordError::invalid_field(field, "must not be empty"));
            }
            let id = RecordId::from_json(value)
                .ok_or_else(|| RecordError::InvalidIdentifierFormat {
                    token: value.to_string(),
                })?;
            let id = ctx.policy.parse(id.as_str())?;
            serde_json::to_value(&id)
                .map_err(|err| RecordError::invalid_field(field, err.to_string()))
        }
    }
}

fn take_text(fields: &Map<String, Value>, name: &str) -> Result<String, RecordError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RecordError::MissingRequiredField {
            field: name.to_string(),
        })
}

fn allowed_values(allowed: &[&str]) -> Vec<String> {
    allowed.iter().map(|value| (*value).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ctx_on;
    use serde_json::json;

    fn sparse(payload: &Value, rules: &[FieldRule]) -> Result<Map<String, Value>, RecordError> {
        validate_fields(payload, rules, Completeness::Sparse, &ctx())
    }

    fn ctx() -> ValidationContext {
        ctx_on("2024-06-01")
    }

    #[test]
    fn rejects_non_object_payloads_before_field_checks() {
        for payload in [json!(null), json!([]), json!("text"), json!(3), json!({})] {
            let err = sparse(&payload, AGENT_RULES).unwrap_err();
            assert!(
                matches!(err, RecordError::MalformedPayload { .. }),
                "{payload}"
            );
        }
    }

    #[test]
    fn raw_bodies_must_be_json() {
        for raw in ["", "   ", "{nome:", "[1,"] {
            let err = parse_payload(raw.as_bytes()).unwrap_err();
            assert!(
                matches!(err, RecordError::MalformedPayload { .. }),
                "{raw:?}"
            );
        }
        assert_eq!(parse_payload(b"[]").unwrap(), json!([]));
    }

    #[test]
    fn identifier_in_payload_is_forbidden_even_when_other_fields_are_valid() {
        let payload = json!({"cargo": "delegado", "id": "x"});
        let err = sparse(&payload, AGENT_RULES).unwrap_err();
        assert_eq!(
            err,
            RecordError::ForbiddenFieldInPayload {
                field: "id".to_string()
            }
        );
    }

    #[test]
    fn full_payload_requires_every_field() {
        let payload = json!({"nome": "Ana", "cargo": "agente"});
        let err = agent_draft(&payload, &ctx()).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingRequiredField {
                field: "dataDeIncorporacao".to_string()
            }
        );
    }

    #[test]
    fn sparse_payload_checks_only_present_fields() {
        let payload = json!({"cargo": "delegado"});
        let fields = sparse(&payload, AGENT_RULES).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["cargo"], json!("delegado"));
    }

    #[test]
    fn empty_text_is_invalid_not_missing() {
        let payload = json!({"nome": "  "});
        let err = sparse(&payload, AGENT_RULES).unwrap_err();
        assert!(matches!(err, RecordError::InvalidFieldValue { ref field, .. } if field == "nome"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let payload = json!({"nome": "Ana", "apelido": "A"});
        let err = sparse(&payload, AGENT_RULES).unwrap_err();
        assert!(
            matches!(err, RecordError::InvalidFieldValue { ref field, .. } if field == "apelido")
        );
    }

    #[test]
    fn dates_must_be_strict_and_not_in_the_future() {
        for bad in ["2020-1-05", "05/01/2020", "2020-02-30", "2020-01-05T10:00:00", "20200105"] {
            let payload = json!({"dataDeIncorporacao": bad});
            let err = sparse(&payload, AGENT_RULES).unwrap_err();
            assert!(matches!(err, RecordError::InvalidDate { .. }), "{bad}");
        }

        let today = json!({"dataDeIncorporacao": "2024-06-01"});
        assert!(sparse(&today, AGENT_RULES).is_ok());

        let tomorrow = json!({"dataDeIncorporacao": "2024-06-02"});
        let err = sparse(&tomorrow, AGENT_RULES).unwrap_err();
        assert!(
            matches!(err, RecordError::InvalidDate { ref reason, .. } if reason.contains("future"))
        );
    }

    #[test]
    fn status_is_normalized_to_lowercase() {
        let payload =
            json!({"titulo": "furto", "descricao": "x", "status": "ABERTO", "agente_id": 1});
        let draft = case_draft(&payload, &ctx()).unwrap();
        assert_eq!(draft.status, CaseStatus::Aberto);
        assert_eq!(draft.agente_id, RecordId::new("1"));
    }

    #[test]
    fn unknown_status_is_an_enum_error() {
        let payload = json!({"status": "invalido"});
        let err = sparse(&payload, CASE_RULES).unwrap_err();
        assert!(
            matches!(err, RecordError::InvalidEnumValue { ref value, .. } if value == "invalido")
        );
    }

    #[test]
    fn reference_format_follows_policy() {
        let payload = json!({"agente_id": "abc"});
        let err = sparse(&payload, CASE_RULES).unwrap_err();
        assert_eq!(
            err,
            RecordError::InvalidIdentifierFormat {
                token: "abc".to_string()
            }
        );

        let numeric_text = json!({"agente_id": "2"});
        let fields = sparse(&numeric_text, CASE_RULES).unwrap();
        assert_eq!(fields["agente_id"], json!(2));
    }
}
