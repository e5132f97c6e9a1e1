//! Persistence collaborator: agent and case repositories.
//!
//! [`MemoryStore`] keeps both collections in memory. [`FileStore`] wraps it
//! and persists the whole document as JSON after every mutation. Loads are
//! checked against the bundled JSON Schema and then against the semantic
//! invariants a schema cannot express (unique ids, live references).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::core::identifier::{IdentifierPolicy, RecordId};
use crate::core::types::{Agent, Case, Record};
use crate::io::config::write_atomic;

const STORE_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../schemas/store/v1.schema.json"
));
const STORE_VERSION: u32 = 1;

/// Storage contract consumed by the service pipelines.
pub trait Repository<R: Record> {
    fn find_all(&self) -> Result<Vec<R>>;

    fn find_by_id(&self, id: &RecordId) -> Result<Option<R>>;

    /// Assign an identifier to `draft` and store it.
    fn add(&mut self, draft: R::Draft) -> Result<R>;

    /// Overwrite the stored record named by `id`.
    fn update(&mut self, id: &RecordId, record: R) -> Result<R>;

    /// Returns `false` when nothing was stored under `id`.
    fn remove(&mut self, id: &RecordId) -> Result<bool>;
}

/// A store holding both collections under one identifier policy.
pub trait Store: Repository<Agent> + Repository<Case> {
    fn policy(&self) -> IdentifierPolicy;

    /// Drop every record. Sequence counters are kept.
    fn clear(&mut self) -> Result<()>;
}

/// One collection plus its sequence counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table<R> {
    /// Next sequential id to hand out. Never decreases.
    next_id: u64,
    rows: Vec<R>,
}

impl<R> Default for Table<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

impl<R: Record> Table<R> {
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn position(&self, id: &RecordId, policy: IdentifierPolicy) -> Option<usize> {
        self.rows.iter().position(|row| policy.same(row.id(), id))
    }

    fn assign_id(&mut self, policy: IdentifierPolicy) -> Result<RecordId> {
        match policy {
            IdentifierPolicy::Sequential => {
                let id = RecordId::from(self.next_id);
                self.next_id = advance(self.next_id, R::ENTITY.label())?;
                Ok(id)
            }
            IdentifierPolicy::Random => Ok(RecordId::from(Uuid::new_v4())),
        }
    }

    /// Raise the counter above every stored sequential id.
    fn reserve_existing(&mut self, policy: IdentifierPolicy) -> Result<()> {
        let highest = self
            .rows
            .iter()
            .filter_map(|row| policy.sequence_number(row.id()))
            .max();
        if let Some(highest) = highest {
            self.next_id = self.next_id.max(advance(highest, R::ENTITY.label())?);
        }
        Ok(())
    }
}

fn advance(value: u64, label: &str) -> Result<u64> {
    value
        .checked_add(1)
        .ok_or_else(|| anyhow!("{label} sequence exhausted"))
}

/// Access to the table holding records of type `R`.
pub trait Collection<R: Record> {
    fn table(&self) -> &Table<R>;
    fn table_mut(&mut self) -> &mut Table<R>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    policy: IdentifierPolicy,
    agentes: Table<Agent>,
    casos: Table<Case>,
}

impl MemoryStore {
    pub fn new(policy: IdentifierPolicy) -> Self {
        Self {
            policy,
            agentes: Table::default(),
            casos: Table::default(),
        }
    }
}

impl Collection<Agent> for MemoryStore {
    fn table(&self) -> &Table<Agent> {
        &self.agentes
    }

    fn table_mut(&mut self) -> &mut Table<Agent> {
        &mut self.agentes
    }
}

impl Collection<Case> for MemoryStore {
    fn table(&self) -> &Table<Case> {
        &self.casos
    }

    fn table_mut(&mut self) -> &mut Table<Case> {
        &mut self.casos
    }
}

impl<R: Record> Repository<R> for MemoryStore
where
    MemoryStore: Collection<R>,
{
    fn find_all(&self) -> Result<Vec<R>> {
        let table: &Table<R> = self.table();
        Ok(table.rows.clone())
    }

    fn find_by_id(&self, id: &RecordId) -> Result<Option<R>> {
        let table: &Table<R> = self.table();
        Ok(table.position(id, self.policy).map(|index| table.rows[index].clone()))
    }

    fn add(&mut self, draft: R::Draft) -> Result<R> {
        let policy = self.policy;
        let table: &mut Table<R> = self.table_mut();
        let record = R::from_draft(table.assign_id(policy)?, draft);
        table.rows.push(record.clone());
        Ok(record)
    }

    fn update(&mut self, id: &RecordId, record: R) -> Result<R> {
        let policy = self.policy;
        let table: &mut Table<R> = self.table_mut();
        let index = table
            .position(id, policy)
            .ok_or_else(|| anyhow!("{} '{id}' is not stored", R::ENTITY.label()))?;
        table.rows[index] = record.clone();
        Ok(record)
    }

    fn remove(&mut self, id: &RecordId) -> Result<bool> {
        let policy = self.policy;
        let table: &mut Table<R> = self.table_mut();
        match table.position(id, policy) {
            Some(index) => {
                table.rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Store for MemoryStore {
    fn policy(&self) -> IdentifierPolicy {
        self.policy
    }

    fn clear(&mut self) -> Result<()> {
        self.agentes.rows.clear();
        self.casos.rows.clear();
        Ok(())
    }
}

/// On-disk layout of the store file.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    agentes: Table<Agent>,
    casos: Table<Case>,
}

#[derive(Serialize)]
struct DocumentRef<'a> {
    version: u32,
    agentes: &'a Table<Agent>,
    casos: &'a Table<Case>,
}

/// JSON-file backed store. Every mutation rewrites the file atomically.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path, policy: IdentifierPolicy) -> Result<Self> {
        let inner = if path.exists() {
            load_store(path, policy)?
        } else {
            debug!(path = %path.display(), "store file missing, starting empty");
            MemoryStore::new(policy)
        };
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// Write an empty store file at `path`, replacing any existing one.
    pub fn create(path: &Path, policy: IdentifierPolicy) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
            inner: MemoryStore::new(policy),
        };
        write_store(&store.path, &store.inner)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy, persist it, then swap it in.
    fn commit<T>(&mut self, change: impl FnOnce(&mut MemoryStore) -> Result<T>) -> Result<T> {
        let mut next = self.inner.clone();
        let out = change(&mut next)?;
        write_store(&self.path, &next)?;
        self.inner = next;
        Ok(out)
    }
}

impl<R: Record> Repository<R> for FileStore
where
    MemoryStore: Collection<R>,
{
    fn find_all(&self) -> Result<Vec<R>> {
        self.inner.find_all()
    }

    fn find_by_id(&self, id: &RecordId) -> Result<Option<R>> {
        self.inner.find_by_id(id)
    }

    fn add(&mut self, draft: R::Draft) -> Result<R> {
        self.commit(|store| store.add(draft))
    }

    fn update(&mut self, id: &RecordId, record: R) -> Result<R> {
        self.commit(|store| store.update(id, record))
    }

    fn remove(&mut self, id: &RecordId) -> Result<bool> {
        if Repository::<R>::find_by_id(&self.inner, id)?.is_none() {
            return Ok(false);
        }
        self.commit(|store| Repository::<R>::remove(store, id))
    }
}

impl Store for FileStore {
    fn policy(&self) -> IdentifierPolicy {
        self.inner.policy
    }

    fn clear(&mut self) -> Result<()> {
        self.commit(MemoryStore::clear)
    }
}

fn load_store(path: &Path, policy: IdentifierPolicy) -> Result<MemoryStore> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read store {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse store {}", path.display()))?;
    validate_schema(&value)?;
    let document: Document = serde_json::from_value(value)
        .with_context(|| format!("deserialize store {}", path.display()))?;

    let errors = store_invariants(&document, policy);
    if !errors.is_empty() {
        return Err(anyhow!("store invariants failed: {}", errors.join("; ")));
    }

    let mut store = MemoryStore {
        policy,
        agentes: document.agentes,
        casos: document.casos,
    };
    store.agentes.reserve_existing(policy)?;
    store.casos.reserve_existing(policy)?;
    debug!(
        path = %path.display(),
        agentes = store.agentes.rows.len(),
        casos = store.casos.rows.len(),
        "loaded store"
    );
    Ok(store)
}

fn write_store(path: &Path, store: &MemoryStore) -> Result<()> {
    let document = DocumentRef {
        version: STORE_VERSION,
        agentes: &store.agentes,
        casos: &store.casos,
    };
    let mut buf = serde_json::to_string_pretty(&document).context("serialize store")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn validate_schema(document: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(STORE_SCHEMA).context("parse bundled store schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(document) {
        let messages = compiled
            .iter_errors(document)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!("store schema validation failed: {}", messages.join("; ")));
    }
    Ok(())
}

/// Semantic checks on a schema-valid document. Returns one message per violation.
fn store_invariants(document: &Document, policy: IdentifierPolicy) -> Vec<String> {
    let mut errors = Vec::new();
    check_ids(&document.agentes.rows, policy, &mut errors);
    check_ids(&document.casos.rows, policy, &mut errors);

    for case in &document.casos.rows {
        let referenced = document
            .agentes
            .rows
            .iter()
            .any(|agent| policy.same(&agent.id, &case.agente_id));
        if !referenced {
            errors.push(format!(
                "caso '{}' references missing agente '{}'",
                case.id, case.agente_id
            ));
        }
    }
    errors
}

fn check_ids<R: Record>(rows: &[R], policy: IdentifierPolicy, errors: &mut Vec<String>) {
    let label = R::ENTITY.label();
    for (index, row) in rows.iter().enumerate() {
        if !policy.is_valid_format(row.id().as_str()) {
            errors.push(format!(
                "{label} id '{}' is not a valid {policy:?} identifier",
                row.id()
            ));
            continue;
        }
        if rows[..index].iter().any(|earlier| policy.same(earlier.id(), row.id())) {
            errors.push(format!("duplicate {label} id '{}'", row.id()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AgentDraft, CaseDraft, CaseStatus};
    use crate::test_support::{agent_draft, case_draft};

    fn write_store_file(agentes: &str) -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("casefile.json");
        let document = format!(
            r#"{{"version": 1, "agentes": {agentes}, "casos": {{"next_id": 1, "rows": []}}}}"#
        );
        fs::write(&path, document).expect("write");
        (temp, path)
    }

    #[test]
    fn sequential_ids_are_never_reused() {
        let mut store = MemoryStore::new(IdentifierPolicy::Sequential);
        let first: Agent = store.add(agent_draft("Ana")).expect("add");
        let second: Agent = store.add(agent_draft("Bruno")).expect("add");
        assert_eq!(first.id, RecordId::from(1));
        assert_eq!(second.id, RecordId::from(2));

        assert!(Repository::<Agent>::remove(&mut store, &second.id).expect("remove"));
        let third: Agent = store.add(agent_draft("Carla")).expect("add");
        assert_eq!(third.id, RecordId::from(3));
    }

    #[test]
    fn random_policy_assigns_uuid_tokens() {
        let mut store = MemoryStore::new(IdentifierPolicy::Random);
        let record: Agent = store.add(agent_draft("Ana")).expect("add");
        assert!(IdentifierPolicy::Random.is_valid_format(record.id.as_str()));
        let found: Option<Agent> = store
            .find_by_id(&RecordId::new(record.id.as_str().to_uppercase()))
            .expect("find");
        assert_eq!(found, Some(record));
    }

    #[test]
    fn remove_reports_missing_records() {
        let mut store = MemoryStore::new(IdentifierPolicy::Sequential);
        assert!(!Repository::<Case>::remove(&mut store, &RecordId::from(7)).expect("remove"));
    }

    #[test]
    fn update_of_missing_record_fails() {
        let mut store = MemoryStore::new(IdentifierPolicy::Sequential);
        let orphan = Agent::from_draft(RecordId::from(5), agent_draft("Ana"));
        assert!(store.update(&RecordId::from(5), orphan).is_err());
    }

    /// Verifies a file store survives a reopen with ids and counters intact.
    #[test]
    fn file_store_round_trip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("casefile.json");

        let mut store = FileStore::open(&path, IdentifierPolicy::Sequential).expect("open");
        let ana: Agent = store.add(agent_draft("Ana")).expect("add agent");
        let caso: Case = store.add(case_draft("furto", ana.id.clone())).expect("add case");
        assert!(Repository::<Case>::remove(&mut store, &caso.id).expect("remove"));

        let reopened = FileStore::open(&path, IdentifierPolicy::Sequential).expect("reopen");
        let agents: Vec<Agent> = reopened.find_all().expect("agents");
        let cases: Vec<Case> = reopened.find_all().expect("cases");
        assert_eq!(agents, vec![ana]);
        assert!(cases.is_empty());

        let mut reopened = reopened;
        let next: Case = reopened
            .add(CaseDraft {
                titulo: "roubo".to_string(),
                descricao: "x".to_string(),
                status: CaseStatus::Solucionado,
                agente_id: RecordId::from(1),
            })
            .expect("add after reopen");
        assert_eq!(next.id, RecordId::from(2));
    }

    #[test]
    fn schema_violations_are_rejected() {
        let (_temp, path) =
            write_store_file(r#"{"next_id": 1, "rows": [{"id": 1, "nome": "Ana"}]}"#);
        let err = FileStore::open(&path, IdentifierPolicy::Sequential).unwrap_err();
        assert!(
            err.to_string().contains("schema validation failed"),
            "{err:#}"
        );
    }

    #[test]
    fn dangling_references_are_rejected_on_load() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("casefile.json");
        let document = r#"{
            "version": 1,
            "agentes": {"next_id": 2, "rows": [
                {"id": 1, "nome": "Ana", "dataDeIncorporacao": "2020-01-05", "cargo": "agente"}
            ]},
            "casos": {"next_id": 2, "rows": [
                {"id": 1, "titulo": "t", "descricao": "d", "status": "aberto", "agente_id": 9}
            ]}
        }"#;
        fs::write(&path, document).expect("write");
        let err = FileStore::open(&path, IdentifierPolicy::Sequential).unwrap_err();
        assert!(err.to_string().contains("missing agente '9'"), "{err:#}");
    }

    #[test]
    fn ids_must_match_the_policy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("casefile.json");
        let mut store = FileStore::open(&path, IdentifierPolicy::Sequential).expect("open");
        let _: Agent = store.add(agent_draft("Ana")).expect("add");

        let err = FileStore::open(&path, IdentifierPolicy::Random).unwrap_err();
        assert!(
            err.to_string().contains("not a valid Random identifier"),
            "{err:#}"
        );
    }

    #[test]
    fn stored_id_at_the_end_of_the_sequence_fails_to_open() {
        let (_temp, path) = write_store_file(
            r#"{"next_id": 1, "rows": [{"id": 18446744073709551615, "nome": "Ana",
                "dataDeIncorporacao": "2020-01-05", "cargo": "agente"}]}"#,
        );
        let err = FileStore::open(&path, IdentifierPolicy::Sequential).unwrap_err();
        assert!(
            err.to_string().contains("agente sequence exhausted"),
            "{err:#}"
        );
    }

    #[test]
    fn exhausted_counter_rejects_the_add_and_keeps_the_file() {
        let (_temp, path) = write_store_file(r#"{"next_id": 18446744073709551615, "rows": []}"#);
        let before = fs::read_to_string(&path).expect("read");

        let mut store = FileStore::open(&path, IdentifierPolicy::Sequential).expect("open");
        let err = Repository::<Agent>::add(&mut store, agent_draft("Ana")).unwrap_err();
        assert!(err.to_string().contains("sequence exhausted"), "{err:#}");

        let agents: Vec<Agent> = store.find_all().expect("agents");
        assert!(agents.is_empty());
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn zero_padded_ids_still_raise_the_counter() {
        let (_temp, path) = write_store_file(
            r#"{"next_id": 1, "rows": [{"id": "01", "nome": "Old",
                "dataDeIncorporacao": "2020-01-05", "cargo": "agente"}]}"#,
        );
        let mut store = FileStore::open(&path, IdentifierPolicy::Sequential).expect("open");
        let added: Agent = store.add(agent_draft("New")).expect("add");
        assert_eq!(added.id, RecordId::from(2));

        let found: Option<Agent> = store.find_by_id(&added.id).expect("find");
        assert_eq!(found.map(|agent| agent.nome), Some("New".to_string()));

        let reopened = FileStore::open(&path, IdentifierPolicy::Sequential).expect("reopen");
        let agents: Vec<Agent> = reopened.find_all().expect("agents");
        assert_eq!(agents.len(), 2);
    }

    #[test]
    fn clear_keeps_counters() {
        let mut store = MemoryStore::new(IdentifierPolicy::Sequential);
        let _: Agent = store.add(agent_draft("Ana")).expect("add");
        store.clear().expect("clear");
        let agents: Vec<Agent> = store.find_all().expect("agents");
        assert!(agents.is_empty());
        let next: Agent = store
            .add(AgentDraft {
                nome: "Bruno".to_string(),
                data_de_incorporacao: "1999-05-01".to_string(),
                cargo: "delegado".to_string(),
            })
            .expect("add");
        assert_eq!(next.id, RecordId::from(2));
    }
}
