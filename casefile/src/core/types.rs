//! Record types for agents and cases.
//!
//! Wire field names follow the public contract (`dataDeIncorporacao`,
//! `agente_id`, ...). Records are plain data; every rule about what a valid
//! record looks like lives in [`crate::core::validator`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::error::Entity;
use crate::core::identifier::RecordId;

/// Declared type of a record field, used to pick filter and sort regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Calendar date stored as `YYYY-MM-DD` text.
    Date,
    /// Identifier; numeric under sequential ids, text under random tokens.
    Identifier,
}

/// Borrowed view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl<'a> FieldValue<'a> {
    fn of_id(id: &'a RecordId) -> Self {
        match id.as_number().and_then(|n| i64::try_from(n).ok()) {
            Some(number) => FieldValue::Number(number),
            None => FieldValue::Text(id.as_str()),
        }
    }

    pub fn as_text(self) -> Option<&'a str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Number(_) => None,
        }
    }

    /// Empty text and zero count as missing, for both filtering and sorting.
    pub fn is_blank(self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Number(number) => number == 0,
        }
    }
}

/// Common read access used by the filter, sort and merge engines.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// Validated payload without an identifier.
    type Draft;

    const ENTITY: Entity;

    fn id(&self) -> &RecordId;

    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;

    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    fn field_kind(name: &str) -> Option<FieldKind>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: RecordId,
    pub nome: String,
    /// Strict `YYYY-MM-DD`; kept as text so stored values are never rewritten.
    pub data_de_incorporacao: String,
    pub cargo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentDraft {
    pub nome: String,
    pub data_de_incorporacao: String,
    pub cargo: String,
}

impl Record for Agent {
    type Draft = AgentDraft;

    const ENTITY: Entity = Entity::Agent;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: AgentDraft) -> Self {
        Self {
            id,
            nome: draft.nome,
            data_de_incorporacao: draft.data_de_incorporacao,
            cargo: draft.cargo,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::of_id(&self.id)),
            "nome" => Some(FieldValue::Text(&self.nome)),
            "dataDeIncorporacao" => Some(FieldValue::Text(&self.data_de_incorporacao)),
            "cargo" => Some(FieldValue::Text(&self.cargo)),
            _ => None,
        }
    }

    fn field_kind(name: &str) -> Option<FieldKind> {
        match name {
            "id" => Some(FieldKind::Identifier),
            "nome" | "cargo" => Some(FieldKind::Text),
            "dataDeIncorporacao" => Some(FieldKind::Date),
            _ => None,
        }
    }
}

/// Lifecycle state of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Aberto,
    Solucionado,
}

impl CaseStatus {
    pub const ALLOWED: [&'static str; 2] = ["aberto", "solucionado"];

    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Aberto => "aberto",
            CaseStatus::Solucionado => "solucionado",
        }
    }

    /// Case-insensitive parse; surrounding whitespace is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "aberto" => Some(CaseStatus::Aberto),
            "solucionado" => Some(CaseStatus::Solucionado),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: RecordId,
    pub titulo: String,
    pub descricao: String,
    pub status: CaseStatus,
    pub agente_id: RecordId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDraft {
    pub titulo: String,
    pub descricao: String,
    pub status: CaseStatus,
    pub agente_id: RecordId,
}

impl Record for Case {
    type Draft = CaseDraft;

    const ENTITY: Entity = Entity::Case;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn from_draft(id: RecordId, draft: CaseDraft) -> Self {
        Self {
            id,
            titulo: draft.titulo,
            descricao: draft.descricao,
            status: draft.status,
            agente_id: draft.agente_id,
        }
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => Some(FieldValue::of_id(&self.id)),
            "titulo" => Some(FieldValue::Text(&self.titulo)),
            "descricao" => Some(FieldValue::Text(&self.descricao)),
            "status" => Some(FieldValue::Text(self.status.as_str())),
            "agente_id" => Some(FieldValue::of_id(&self.agente_id)),
            _ => None,
        }
    }

    fn field_kind(name: &str) -> Option<FieldKind> {
        match name {
            "id" | "agente_id" => Some(FieldKind::Identifier),
            "titulo" | "descricao" | "status" => Some(FieldKind::Text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{agent, case};
    use serde_json::json;

    #[test]
    fn agent_uses_contract_field_names() {
        let value = serde_json::to_value(agent(1, "Ana", "agente", "2020-01-05")).unwrap();
        assert_eq!(
            value,
            json!({"id": 1, "nome": "Ana", "dataDeIncorporacao": "2020-01-05", "cargo": "agente"})
        );
    }

    #[test]
    fn case_status_serializes_lowercase() {
        let value = serde_json::to_value(case(4, "furto", CaseStatus::Aberto, 1)).unwrap();
        assert_eq!(value["status"], json!("aberto"));
        assert_eq!(value["agente_id"], json!(1));
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(CaseStatus::parse("ABERTO"), Some(CaseStatus::Aberto));
        assert_eq!(
            CaseStatus::parse("Solucionado"),
            Some(CaseStatus::Solucionado)
        );
        assert_eq!(CaseStatus::parse("fechado"), None);
    }

    #[test]
    fn identifier_fields_expose_numbers_for_sequences() {
        let record = case(12, "roubo", CaseStatus::Aberto, 3);
        assert_eq!(record.field("id"), Some(FieldValue::Number(12)));
        assert_eq!(record.field("agente_id"), Some(FieldValue::Number(3)));
        assert_eq!(record.field("unknown"), None);
    }
}
