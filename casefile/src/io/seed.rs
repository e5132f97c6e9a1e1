//! Demo data: nine agents and one case assigned to each.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::core::types::{Agent, AgentDraft, Case, CaseDraft, CaseStatus};
use crate::io::store::{Repository, Store};

/// `(nome, dataDeIncorporacao, cargo)`
const AGENTES: [(&str, &str, &str); 9] = [
    ("Rommel Carneiro", "1992-10-04", "delegado"),
    ("Aloana Silva", "2024-05-15", "investigadora"),
    ("Carlos Souza", "2010-03-20", "agente"),
    ("Fernanda Lima", "2012-07-30", "perita"),
    ("João Pereira", "2018-11-10", "escrivão"),
    ("Mariana Costa", "2020-01-05", "agente"),
    ("Roberto Alves", "2021-06-15", "investigador"),
    ("Patrícia Rocha", "2019-09-25", "agente"),
    ("Lucas Martins", "2022-02-18", "delegado"),
];

/// `(titulo, descricao, status)`; the n-th case belongs to the n-th agent.
const CASOS: [(&str, &str, CaseStatus); 9] = [
    (
        "homicidio",
        "Disparos foram reportados às 22:33 do dia 10/07/2007 na região do bairro União, resultando na morte da vítima, um homem de 45 anos.",
        CaseStatus::Aberto,
    ),
    (
        "furto",
        "Relato de furto de veículo na região central, ocorrido na madrugada do dia 12/07/2007.",
        CaseStatus::Solucionado,
    ),
    (
        "roubo",
        "Roubo a mão armada registrado no bairro Jardim, às 15:45 do dia 13/07/2007.",
        CaseStatus::Aberto,
    ),
    (
        "sequestro",
        "Caso de sequestro relatado no bairro Primavera, com a vítima sendo resgatada às 10:00 do dia 14/07/2007.",
        CaseStatus::Solucionado,
    ),
    (
        "vandalismo",
        "Ato de vandalismo em escola pública registrado no dia 15/07/2007, com danos significativos ao patrimônio.",
        CaseStatus::Aberto,
    ),
    (
        "tráfico de drogas",
        "Operação policial contra tráfico de drogas realizada no dia 16/07/2007, resultando na apreensão de substâncias ilícitas.",
        CaseStatus::Solucionado,
    ),
    (
        "assalto a banco",
        "Assalto a banco ocorrido no dia 17/07/2007, com reféns sendo mantidos por várias horas.",
        CaseStatus::Solucionado,
    ),
    (
        "extorsão",
        "Caso de extorsão relatado no dia 18/07/2007, envolvendo ameaças a uma empresa local.",
        CaseStatus::Aberto,
    ),
    (
        "homicídio culposo",
        "Acidente de trânsito resultando em morte, registrado no dia 19/07/2007.",
        CaseStatus::Solucionado,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub agentes: usize,
    pub casos: usize,
}

/// Replace the store's contents with the demo data set.
pub fn seed<S: Store>(store: &mut S) -> Result<SeedSummary> {
    store.clear()?;

    let mut agentes: Vec<Agent> = Vec::with_capacity(AGENTES.len());
    for (nome, data, cargo) in AGENTES {
        let draft = AgentDraft {
            nome: nome.to_string(),
            data_de_incorporacao: data.to_string(),
            cargo: cargo.to_string(),
        };
        agentes.push(Repository::<Agent>::add(store, draft)?);
    }

    let mut casos = 0;
    for ((titulo, descricao, status), agente) in CASOS.into_iter().zip(&agentes) {
        let draft = CaseDraft {
            titulo: titulo.to_string(),
            descricao: descricao.to_string(),
            status,
            agente_id: agente.id.clone(),
        };
        Repository::<Case>::add(store, draft)?;
        casos += 1;
    }

    info!(agentes = agentes.len(), casos, "seeded store");
    Ok(SeedSummary {
        agentes: agentes.len(),
        casos,
    })
}
