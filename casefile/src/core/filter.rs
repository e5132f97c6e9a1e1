//! Composable predicates over an in-memory collection.
//!
//! A [`Filter`] is a conjunction of [`Predicate`]s; an empty filter keeps
//! everything. Filtering is pure: inputs are borrowed, matches are cloned
//! into a new vector in their original order.

use chrono::NaiveDate;

use crate::core::identifier::{IdentifierPolicy, RecordId};
use crate::core::types::{FieldValue, Record};
use crate::core::validator::parse_date;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match on any of `fields`.
    Contains {
        fields: Vec<&'static str>,
        needle: String,
    },
    /// Case-insensitive full-string equality.
    Equals { field: &'static str, value: String },
    /// Identifier equality under the deployment's policy.
    SameId {
        field: &'static str,
        id: RecordId,
        policy: IdentifierPolicy,
    },
    /// Calendar-day equality.
    OnDate { field: &'static str, date: NaiveDate },
    /// Inclusive range; an open side imposes no bound.
    DateRange {
        field: &'static str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

impl Predicate {
    /// Date predicate for one field: any range bound wins over an exact date.
    pub fn date_window(
        field: &'static str,
        exact: Option<NaiveDate>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Option<Self> {
        if start.is_some() || end.is_some() {
            return Some(Predicate::DateRange { field, start, end });
        }
        exact.map(|date| Predicate::OnDate { field, date })
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Predicate::Contains { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| {
                    record
                        .field(field)
                        .and_then(FieldValue::as_text)
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                })
            }
            Predicate::Equals { field, value } => match record.field(field) {
                Some(FieldValue::Text(text)) => text.to_lowercase() == value.to_lowercase(),
                Some(FieldValue::Number(number)) => number.to_string() == value.trim(),
                None => false,
            },
            Predicate::SameId { field, id, policy } => match record.field(field) {
                Some(FieldValue::Text(text)) => policy.same(&RecordId::new(text), id),
                Some(FieldValue::Number(number)) => {
                    policy.same(&RecordId::new(number.to_string()), id)
                }
                None => false,
            },
            Predicate::OnDate { field, date } => record_date(record, field) == Some(*date),
            Predicate::DateRange { field, start, end } => match record_date(record, field) {
                Some(value) => {
                    start.is_none_or(|start| value >= start) && end.is_none_or(|end| value <= end)
                }
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_optional(self, predicate: Option<Predicate>) -> Self {
        match predicate {
            Some(predicate) => self.with(predicate),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(record))
    }

    pub fn apply<R: Record>(&self, records: &[R]) -> Vec<R> {
        records
            .iter()
            .filter(|record| self.matches(*record))
            .cloned()
            .collect()
    }
}

fn record_date<R: Record>(record: &R, field: &str) -> Option<NaiveDate> {
    record
        .field(field)
        .and_then(FieldValue::as_text)
        .and_then(parse_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Agent, CaseStatus};
    use crate::test_support::{agent, case, date, sample_agents};

    fn ids<R: Record>(records: &[R]) -> Vec<String> {
        records.iter().map(|record| record.id().to_string()).collect()
    }

    #[test]
    fn empty_filter_keeps_everything_in_order() {
        let agents = sample_agents();
        assert_eq!(Filter::new().apply(&agents), agents);
    }

    #[test]
    fn substring_match_ignores_case() {
        let agents = sample_agents();
        let filter = Filter::new().with(Predicate::Contains {
            fields: vec!["nome"],
            needle: "AN".to_string(),
        });
        let expected: Vec<Agent> = agents
            .iter()
            .filter(|a| a.nome.to_lowercase().contains("an"))
            .cloned()
            .collect();
        assert_eq!(filter.apply(&agents), expected);
    }

    #[test]
    fn categorical_match_is_full_string() {
        let agents = vec![
            agent(1, "Ana", "agente", "2020-01-05"),
            agent(2, "Bruno", "Delegado", "1999-05-01"),
            agent(3, "Carla", "subdelegado", "2001-02-03"),
        ];
        let filter = Filter::new().with(Predicate::Equals {
            field: "cargo",
            value: "delegado".to_string(),
        });
        assert_eq!(ids(&filter.apply(&agents)), vec!["2"]);
    }

    #[test]
    fn keyword_searches_title_or_description() {
        let mut first = case(1, "furto", CaseStatus::Aberto, 1);
        first.descricao = "veiculo levado".to_string();
        let mut second = case(2, "roubo", CaseStatus::Aberto, 1);
        second.descricao = "furto seguido de fuga".to_string();
        let third = case(3, "vandalismo", CaseStatus::Aberto, 1);

        let filter = Filter::new().with(Predicate::Contains {
            fields: vec!["titulo", "descricao"],
            needle: "Furto".to_string(),
        });
        assert_eq!(ids(&filter.apply(&[first, second, third])), vec!["1", "2"]);
    }

    #[test]
    fn predicates_combine_with_and() {
        let cases = vec![
            case(1, "furto", CaseStatus::Aberto, 1),
            case(2, "furto", CaseStatus::Solucionado, 1),
            case(3, "furto", CaseStatus::Aberto, 2),
        ];
        let filter = Filter::new()
            .with(Predicate::Equals {
                field: "status",
                value: "ABERTO".to_string(),
            })
            .with(Predicate::SameId {
                field: "agente_id",
                id: RecordId::new("01"),
                policy: IdentifierPolicy::Sequential,
            });
        assert_eq!(ids(&filter.apply(&cases)), vec!["1"]);
    }

    #[test]
    fn exact_date_compares_calendar_values() {
        let agents = sample_agents();
        let filter = Filter::new().with_optional(Predicate::date_window(
            "dataDeIncorporacao",
            Some(date("2020-01-05")),
            None,
            None,
        ));
        assert_eq!(ids(&filter.apply(&agents)), vec!["1"]);
    }

    #[test]
    fn range_takes_precedence_over_exact_date() {
        let predicate = Predicate::date_window(
            "dataDeIncorporacao",
            Some(date("2020-01-05")),
            Some(date("1990-01-01")),
            None,
        );
        assert_eq!(
            predicate,
            Some(Predicate::DateRange {
                field: "dataDeIncorporacao",
                start: Some(date("1990-01-01")),
                end: None,
            })
        );
        let filter = Filter::new().with_optional(predicate);
        assert_eq!(filter.apply(&sample_agents()).len(), sample_agents().len());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let agents = vec![
            agent(1, "Ana", "agente", "2020-01-05"),
            agent(2, "Bruno", "delegado", "1999-05-01"),
            agent(3, "Carla", "perita", "2010-03-20"),
        ];
        let filter = Filter::new().with_optional(Predicate::date_window(
            "dataDeIncorporacao",
            None,
            Some(date("1999-05-01")),
            Some(date("2010-03-20")),
        ));
        assert_eq!(ids(&filter.apply(&agents)), vec!["2", "3"]);

        let start_only = Filter::new().with_optional(Predicate::date_window(
            "dataDeIncorporacao",
            None,
            Some(date("2010-03-20")),
            None,
        ));
        for kept in start_only.apply(&agents) {
            assert!(date(&kept.data_de_incorporacao) >= date("2010-03-20"));
        }
    }

    #[test]
    fn unparseable_record_dates_never_match_date_predicates() {
        let agents = vec![agent(1, "Ana", "agente", "05/01/2020")];
        let filter = Filter::new().with_optional(Predicate::date_window(
            "dataDeIncorporacao",
            None,
            Some(date("1900-01-01")),
            None,
        ));
        assert!(filter.apply(&agents).is_empty());
    }
}
