//! Query and mutation pipelines over a store handle.
//!
//! Every mutation runs validation, reference checks and merging in memory and
//! then issues exactly one write to the store. Reads take a snapshot from the
//! store and run the pure filter and sort engines over it.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::error::{Entity, RecordError};
use crate::core::identifier::{IdentifierPolicy, RecordId};
use crate::core::integrity::{ensure_exists, resolve_reference};
use crate::core::merge::merge_partial;
use crate::core::query::{AgentQuery, CaseQuery};
use crate::core::types::{Agent, Case, Record};
use crate::core::validator::{
    AGENT_RULES, CASE_RULES, Completeness, ValidationContext, agent_draft, case_draft,
    validate_fields,
};
use crate::io::store::{Repository, Store};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Deleting the agent would leave cases pointing at nothing.
    #[error("agente '{id}' is still responsible for {cases} caso(s)")]
    AgentInUse { id: String, cases: usize },

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Storage(err)
    }
}

impl ServiceError {
    /// Stable machine-readable kind for error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Record(err) => err.kind(),
            ServiceError::AgentInUse { .. } => "agent_in_use",
            ServiceError::Storage(_) => "storage_failure",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Agents and cases behind one store handle.
#[derive(Debug)]
pub struct Registry<S> {
    store: S,
}

impl<S: Store> Registry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn policy(&self) -> IdentifierPolicy {
        self.store.policy()
    }

    fn context(&self) -> ValidationContext {
        ValidationContext::now(self.policy())
    }

    pub fn list_agentes(&self, query: &AgentQuery) -> ServiceResult<Vec<Agent>> {
        let compiled = query.compile()?;
        let all: Vec<Agent> = Repository::<Agent>::find_all(&self.store)?;
        let selected = compiled.run(&all);
        debug!(total = all.len(), selected = selected.len(), "listed agentes");
        Ok(selected)
    }

    pub fn get_agente(&self, token: &str) -> ServiceResult<Agent> {
        let id = self.policy().parse(token)?;
        self.require::<Agent>(&id)
    }

    pub fn create_agente(&mut self, payload: &Value) -> ServiceResult<Agent> {
        logged("create", Entity::Agent, self.create_agente_inner(payload))
    }

    pub fn replace_agente(&mut self, token: &str, payload: &Value) -> ServiceResult<Agent> {
        logged(
            "replace",
            Entity::Agent,
            self.replace_agente_inner(token, payload),
        )
    }

    pub fn patch_agente(&mut self, token: &str, payload: &Value) -> ServiceResult<Agent> {
        logged(
            "patch",
            Entity::Agent,
            self.patch_agente_inner(token, payload),
        )
    }

    pub fn delete_agente(&mut self, token: &str) -> ServiceResult<()> {
        logged("delete", Entity::Agent, self.delete_agente_inner(token))
    }

    pub fn list_casos(&self, query: &CaseQuery) -> ServiceResult<Vec<Case>> {
        let compiled = query.compile(self.policy())?;
        let all: Vec<Case> = Repository::<Case>::find_all(&self.store)?;
        let selected = compiled.run(&all);
        debug!(total = all.len(), selected = selected.len(), "listed casos");
        Ok(selected)
    }

    pub fn get_caso(&self, token: &str) -> ServiceResult<Case> {
        let id = self.policy().parse(token)?;
        self.require::<Case>(&id)
    }

    pub fn create_caso(&mut self, payload: &Value) -> ServiceResult<Case> {
        logged("create", Entity::Case, self.create_caso_inner(payload))
    }

    pub fn replace_caso(&mut self, token: &str, payload: &Value) -> ServiceResult<Case> {
        logged(
            "replace",
            Entity::Case,
            self.replace_caso_inner(token, payload),
        )
    }

    pub fn patch_caso(&mut self, token: &str, payload: &Value) -> ServiceResult<Case> {
        logged("patch", Entity::Case, self.patch_caso_inner(token, payload))
    }

    pub fn delete_caso(&mut self, token: &str) -> ServiceResult<()> {
        logged("delete", Entity::Case, self.delete_caso_inner(token))
    }

    fn create_agente_inner(&mut self, payload: &Value) -> ServiceResult<Agent> {
        let draft = agent_draft(payload, &self.context())?;
        let record = Repository::<Agent>::add(&mut self.store, draft)?;
        info!(id = %record.id, "created agente");
        Ok(record)
    }

    fn replace_agente_inner(&mut self, token: &str, payload: &Value) -> ServiceResult<Agent> {
        let id = self.policy().parse(token)?;
        let draft = agent_draft(payload, &self.context())?;
        let existing = self.require::<Agent>(&id)?;
        let record = Agent::from_draft(existing.id.clone(), draft);
        let record = Repository::<Agent>::update(&mut self.store, &existing.id, record)?;
        info!(id = %record.id, "replaced agente");
        Ok(record)
    }

    fn patch_agente_inner(&mut self, token: &str, payload: &Value) -> ServiceResult<Agent> {
        let id = self.policy().parse(token)?;
        let updates = validate_fields(payload, AGENT_RULES, Completeness::Sparse, &self.context())?;
        let existing = self.require::<Agent>(&id)?;
        let merged = merge_partial(&existing, &updates, &existing.id)?;
        let record = Repository::<Agent>::update(&mut self.store, &existing.id, merged)?;
        info!(id = %record.id, fields = updates.len(), "patched agente");
        Ok(record)
    }

    fn delete_agente_inner(&mut self, token: &str) -> ServiceResult<()> {
        let id = self.policy().parse(token)?;
        let existing = self.require::<Agent>(&id)?;
        let policy = self.policy();
        let cases = Repository::<Case>::find_all(&self.store)?
            .iter()
            .filter(|case| policy.same(&case.agente_id, &existing.id))
            .count();
        if cases > 0 {
            return Err(ServiceError::AgentInUse {
                id: existing.id.to_string(),
                cases,
            });
        }
        Repository::<Agent>::remove(&mut self.store, &existing.id)?;
        info!(id = %existing.id, "deleted agente");
        Ok(())
    }

    fn create_caso_inner(&mut self, payload: &Value) -> ServiceResult<Case> {
        let draft = case_draft(payload, &self.context())?;
        ensure_exists(Entity::Agent, &draft.agente_id, |agent| {
            self.agent_exists(agent)
        })?;
        let record = Repository::<Case>::add(&mut self.store, draft)?;
        info!(id = %record.id, agente_id = %record.agente_id, "created caso");
        Ok(record)
    }

    fn replace_caso_inner(&mut self, token: &str, payload: &Value) -> ServiceResult<Case> {
        let id = self.policy().parse(token)?;
        let draft = case_draft(payload, &self.context())?;
        ensure_exists(Entity::Agent, &draft.agente_id, |agent| {
            self.agent_exists(agent)
        })?;
        let existing = self.require::<Case>(&id)?;
        let record = Case::from_draft(existing.id.clone(), draft);
        let record = Repository::<Case>::update(&mut self.store, &existing.id, record)?;
        info!(id = %record.id, "replaced caso");
        Ok(record)
    }

    fn patch_caso_inner(&mut self, token: &str, payload: &Value) -> ServiceResult<Case> {
        let id = self.policy().parse(token)?;
        let updates = validate_fields(payload, CASE_RULES, Completeness::Sparse, &self.context())?;
        if let Some(raw) = updates.get("agente_id") {
            resolve_reference(Entity::Agent, raw, self.policy(), |agent| {
                self.agent_exists(agent)
            })?;
        }
        let existing = self.require::<Case>(&id)?;
        let merged = merge_partial(&existing, &updates, &existing.id)?;
        let record = Repository::<Case>::update(&mut self.store, &existing.id, merged)?;
        info!(id = %record.id, fields = updates.len(), "patched caso");
        Ok(record)
    }

    fn delete_caso_inner(&mut self, token: &str) -> ServiceResult<()> {
        let id = self.policy().parse(token)?;
        let existing = self.require::<Case>(&id)?;
        Repository::<Case>::remove(&mut self.store, &existing.id)?;
        info!(id = %existing.id, "deleted caso");
        Ok(())
    }

    fn agent_exists(&self, id: &RecordId) -> ServiceResult<bool> {
        Ok(Repository::<Agent>::find_by_id(&self.store, id)?.is_some())
    }

    /// Stored record under `id`, or `RecordNotFound`.
    fn require<R: Record>(&self, id: &RecordId) -> ServiceResult<R>
    where
        S: Repository<R>,
    {
        Repository::<R>::find_by_id(&self.store, id)?.ok_or_else(|| {
            ServiceError::Record(RecordError::RecordNotFound {
                entity: R::ENTITY,
                id: id.to_string(),
            })
        })
    }
}

fn logged<T>(operation: &str, entity: Entity, result: ServiceResult<T>) -> ServiceResult<T> {
    if let Err(err) = &result {
        warn!(
            operation,
            entity = entity.label(),
            kind = err.kind(),
            error = %err,
            "mutation rejected"
        );
    }
    result
}
