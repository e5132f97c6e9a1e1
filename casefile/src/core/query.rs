//! Boundary query parameters and their compilation into filter and sort steps.
//!
//! Parameters arrive as optional strings under their wire names. Blank
//! values are treated as absent, so `?cargo=` imposes no constraint.

use serde::Deserialize;

use crate::core::error::RecordError;
use crate::core::filter::{Filter, Predicate};
use crate::core::identifier::IdentifierPolicy;
use crate::core::sort::{SortOrder, SortSpec, sort_records};
use crate::core::types::Record;
use crate::core::validator::parse_date;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentQuery {
    pub nome: Option<String>,
    pub cargo: Option<String>,
    #[serde(rename = "dataDeIncorporacao")]
    pub data_de_incorporacao: Option<String>,
    #[serde(rename = "dataInicial")]
    pub data_inicial: Option<String>,
    #[serde(rename = "dataFinal")]
    pub data_final: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CaseQuery {
    pub status: Option<String>,
    pub agente_id: Option<String>,
    pub titulo: Option<String>,
    pub keyword: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// A checked query, ready to run over any snapshot of the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery {
    pub filter: Filter,
    pub sort: Option<SortSpec>,
}

impl CompiledQuery {
    /// Filter, then sort. `records` is left untouched.
    pub fn run<R: Record>(&self, records: &[R]) -> Vec<R> {
        let mut selected = self.filter.apply(records);
        if let Some(spec) = &self.sort {
            sort_records(&mut selected, spec);
        }
        selected
    }
}

impl AgentQuery {
    pub fn compile(&self) -> Result<CompiledQuery, RecordError> {
        let date_field = "dataDeIncorporacao";
        let filter = Filter::new()
            .with_optional(present(&self.nome).map(|needle| Predicate::Contains {
                fields: vec!["nome"],
                needle: needle.to_string(),
            }))
            .with_optional(present(&self.cargo).map(|value| Predicate::Equals {
                field: "cargo",
                value: value.to_string(),
            }))
            .with_optional(Predicate::date_window(
                date_field,
                query_date(date_field, &self.data_de_incorporacao)?,
                query_date("dataInicial", &self.data_inicial)?,
                query_date("dataFinal", &self.data_final)?,
            ));
        Ok(CompiledQuery {
            filter,
            sort: sort_spec(&self.sort_by, &self.order),
        })
    }
}

impl CaseQuery {
    pub fn compile(&self, policy: IdentifierPolicy) -> Result<CompiledQuery, RecordError> {
        let agente_id = present(&self.agente_id)
            .map(|token| policy.parse(token))
            .transpose()?;
        let filter = Filter::new()
            .with_optional(present(&self.status).map(|value| Predicate::Equals {
                field: "status",
                value: value.to_string(),
            }))
            .with_optional(agente_id.map(|id| Predicate::SameId {
                field: "agente_id",
                id,
                policy,
            }))
            .with_optional(present(&self.titulo).map(|needle| Predicate::Contains {
                fields: vec!["titulo"],
                needle: needle.to_string(),
            }))
            .with_optional(present(&self.keyword).map(|needle| Predicate::Contains {
                fields: vec!["titulo", "descricao"],
                needle: needle.to_string(),
            }));
        Ok(CompiledQuery {
            filter,
            sort: sort_spec(&self.sort_by, &self.order),
        })
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

fn query_date(
    field: &str,
    value: &Option<String>,
) -> Result<Option<chrono::NaiveDate>, RecordError> {
    let Some(text) = present(value) else {
        return Ok(None);
    };
    parse_date(text).map(Some).ok_or_else(|| RecordError::InvalidDate {
        field: field.to_string(),
        value: text.to_string(),
        reason: "expected a calendar date as YYYY-MM-DD".to_string(),
    })
}

fn sort_spec(sort_by: &Option<String>, order: &Option<String>) -> Option<SortSpec> {
    present(sort_by).map(|key| SortSpec {
        key: key.to_string(),
        order: present(order).map(SortOrder::parse).unwrap_or_default(),
    })
}
