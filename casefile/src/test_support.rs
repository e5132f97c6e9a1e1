//! Test-only builders for records, validation contexts and seeded stores.

use std::path::PathBuf;

use chrono::NaiveDate;
use tempfile::TempDir;

use crate::core::identifier::{IdentifierPolicy, RecordId};
use crate::core::types::{Agent, AgentDraft, Case, CaseDraft, CaseStatus};
use crate::core::validator::{ValidationContext, parse_date};
use crate::io::config::{CasefileConfig, write_config};
use crate::io::seed::seed;
use crate::io::store::{FileStore, MemoryStore};
use crate::service::Registry;

/// Agent with a sequential id.
pub fn agent(id: u64, nome: &str, cargo: &str, data_de_incorporacao: &str) -> Agent {
    Agent {
        id: RecordId::from(id),
        nome: nome.to_string(),
        data_de_incorporacao: data_de_incorporacao.to_string(),
        cargo: cargo.to_string(),
    }
}

/// Case with sequential ids and a description derived from the title.
pub fn case(id: u64, titulo: &str, status: CaseStatus, agente_id: u64) -> Case {
    Case {
        id: RecordId::from(id),
        titulo: titulo.to_string(),
        descricao: format!("relato: {titulo}"),
        status,
        agente_id: RecordId::from(agente_id),
    }
}

pub fn agent_draft(nome: &str) -> AgentDraft {
    AgentDraft {
        nome: nome.to_string(),
        data_de_incorporacao: "2020-01-05".to_string(),
        cargo: "agente".to_string(),
    }
}

pub fn case_draft(titulo: &str, agente_id: RecordId) -> CaseDraft {
    CaseDraft {
        titulo: titulo.to_string(),
        descricao: format!("relato: {titulo}"),
        status: CaseStatus::Aberto,
        agente_id,
    }
}

/// Five agents with distinct, valid incorporation dates.
pub fn sample_agents() -> Vec<Agent> {
    vec![
        agent(1, "Ana", "agente", "2020-01-05"),
        agent(2, "Bruno", "delegado", "1999-05-01"),
        agent(3, "Carla", "perita", "2010-03-20"),
        agent(4, "Davi", "agente", "2001-02-03"),
        agent(5, "Fernanda", "delegado", "1995-08-12"),
    ]
}

/// Strict `YYYY-MM-DD` date; panics on anything else.
pub fn date(value: &str) -> NaiveDate {
    parse_date(value).unwrap_or_else(|| panic!("bad test date {value:?}"))
}

/// Validation context pinned to `today`, sequential ids.
pub fn ctx_on(today: &str) -> ValidationContext {
    ValidationContext {
        today: date(today),
        policy: IdentifierPolicy::Sequential,
    }
}

/// In-memory registry holding the demo data set (agents and cases 1..=9).
pub fn seeded_registry() -> Registry<MemoryStore> {
    let mut store = MemoryStore::new(IdentifierPolicy::Sequential);
    seed(&mut store).expect("seed memory store");
    Registry::new(store)
}

/// Temporary directory with `casefile.toml` and a seeded `casefile.json`.
///
/// Returns the directory guard and the config path.
pub fn seeded_workspace(policy: IdentifierPolicy) -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let config_path = temp.path().join("casefile.toml");
    let config = CasefileConfig {
        id_strategy: policy,
        ..CasefileConfig::default()
    };
    write_config(&config_path, &config).expect("write config");

    let data_path = config.resolve_data_path(&config_path);
    let mut store = FileStore::create(&data_path, policy).expect("create store");
    seed(&mut store).expect("seed file store");
    (temp, config_path)
}
