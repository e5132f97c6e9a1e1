//! Command-line front end for the casefile registry.
//!
//! Reads `casefile.toml` (or `--config`), opens the JSON store it points at
//! and runs one query or mutation. Results print as JSON on stdout; failures
//! print on stderr and map to the codes in [`casefile::exit_codes`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use casefile::core::query::{AgentQuery, CaseQuery};
use casefile::core::validator::parse_payload;
use casefile::exit_codes;
use casefile::io::config::{CasefileConfig, DEFAULT_CONFIG_FILE, load_config, write_config};
use casefile::io::seed::seed;
use casefile::io::store::FileStore;
use casefile::logging;
use casefile::service::{Registry, ServiceError};

#[derive(Parser)]
#[command(
    name = "casefile",
    version,
    about = "Registry of police agents and their cases"
)]
struct Cli {
    /// Config file; the store path inside it resolves relative to this file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config and an empty store if missing.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Replace the store contents with the demo data set.
    Seed,
    /// Query and modify agents.
    Agentes {
        #[command(subcommand)]
        action: AgentesAction,
    },
    /// Query and modify cases.
    Casos {
        #[command(subcommand)]
        action: CasosAction,
    },
}

#[derive(Subcommand)]
enum AgentesAction {
    /// List agents, optionally filtered and sorted.
    List(AgentListArgs),
    Get { id: String },
    /// Create from a JSON payload (`-` reads stdin).
    Create { payload: String },
    /// Replace every field of an agent.
    Replace { id: String, payload: String },
    /// Update only the fields present in the payload.
    Patch { id: String, payload: String },
    Delete { id: String },
}

#[derive(Subcommand)]
enum CasosAction {
    /// List cases, optionally filtered and sorted.
    List(CaseListArgs),
    Get { id: String },
    /// Create from a JSON payload (`-` reads stdin).
    Create { payload: String },
    /// Replace every field of a case.
    Replace { id: String, payload: String },
    /// Update only the fields present in the payload.
    Patch { id: String, payload: String },
    Delete { id: String },
}

#[derive(Args, Debug, Default)]
struct AgentListArgs {
    /// Case-insensitive substring of the name.
    #[arg(long)]
    nome: Option<String>,
    /// Exact role, case-insensitive.
    #[arg(long)]
    cargo: Option<String>,
    /// Exact incorporation date (ignored when a range bound is given).
    #[arg(long)]
    data_de_incorporacao: Option<String>,
    #[arg(long)]
    data_inicial: Option<String>,
    #[arg(long)]
    data_final: Option<String>,
    #[arg(long)]
    sort_by: Option<String>,
    /// `asc` (default) or `desc`.
    #[arg(long)]
    order: Option<String>,
}

#[derive(Args, Debug, Default)]
struct CaseListArgs {
    /// `aberto` or `solucionado`, case-insensitive.
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    agente_id: Option<String>,
    #[arg(long)]
    titulo: Option<String>,
    /// Substring of the title or the description.
    #[arg(long)]
    keyword: Option<String>,
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long)]
    order: Option<String>,
}

impl From<AgentListArgs> for AgentQuery {
    fn from(args: AgentListArgs) -> Self {
        AgentQuery {
            nome: args.nome,
            cargo: args.cargo,
            data_de_incorporacao: args.data_de_incorporacao,
            data_inicial: args.data_inicial,
            data_final: args.data_final,
            sort_by: args.sort_by,
            order: args.order,
        }
    }
}

impl From<CaseListArgs> for CaseQuery {
    fn from(args: CaseListArgs) -> Self {
        CaseQuery {
            status: args.status,
            agente_id: args.agente_id,
            titulo: args.titulo,
            keyword: args.keyword,
            sort_by: args.sort_by,
            order: args.order,
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        let code = match err.downcast_ref::<ServiceError>() {
            Some(service) => {
                eprintln!("error[{}]: {}", service.kind(), service);
                exit_codes::for_error(service)
            }
            None => {
                eprintln!("{:#}", err);
                exit_codes::INVALID
            }
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Seed => {
            let mut registry = open_registry(&cli.config)?;
            let summary = seed(registry.store_mut()).context("seed store")?;
            print_json(&summary)
        }
        Command::Agentes { action } => cmd_agentes(&cli.config, action),
        Command::Casos { action } => cmd_casos(&cli.config, action),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    let config = if force || !config_path.exists() {
        let config = CasefileConfig::default();
        write_config(config_path, &config)
            .with_context(|| format!("write {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        config
    } else {
        load_config(config_path)?
    };

    let data_path = config.resolve_data_path(config_path);
    if force || !data_path.exists() {
        FileStore::create(&data_path, config.id_strategy)?;
        println!("wrote {}", data_path.display());
    }
    Ok(())
}

fn cmd_agentes(config_path: &Path, action: AgentesAction) -> Result<()> {
    let mut registry = open_registry(config_path)?;
    match action {
        AgentesAction::List(args) => print_json(&registry.list_agentes(&args.into())?),
        AgentesAction::Get { id } => print_json(&registry.get_agente(&id)?),
        AgentesAction::Create { payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.create_agente(&payload)?)
        }
        AgentesAction::Replace { id, payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.replace_agente(&id, &payload)?)
        }
        AgentesAction::Patch { id, payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.patch_agente(&id, &payload)?)
        }
        AgentesAction::Delete { id } => Ok(registry.delete_agente(&id)?),
    }
}

fn cmd_casos(config_path: &Path, action: CasosAction) -> Result<()> {
    let mut registry = open_registry(config_path)?;
    match action {
        CasosAction::List(args) => print_json(&registry.list_casos(&args.into())?),
        CasosAction::Get { id } => print_json(&registry.get_caso(&id)?),
        CasosAction::Create { payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.create_caso(&payload)?)
        }
        CasosAction::Replace { id, payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.replace_caso(&id, &payload)?)
        }
        CasosAction::Patch { id, payload } => {
            let payload = read_payload(&payload)?;
            print_json(&registry.patch_caso(&id, &payload)?)
        }
        CasosAction::Delete { id } => Ok(registry.delete_caso(&id)?),
    }
}

fn open_registry(config_path: &Path) -> Result<Registry<FileStore>> {
    let config = load_config(config_path)?;
    let data_path = config.resolve_data_path(config_path);
    let store = FileStore::open(&data_path, config.id_strategy)
        .with_context(|| format!("open store {}", data_path.display()))?;
    Ok(Registry::new(store))
}

/// Parse a JSON payload argument; `-` reads it from stdin.
///
/// Unparseable text is a malformed payload, not a usage error.
fn read_payload(raw: &str) -> Result<Value> {
    let text = if raw == "-" {
        std::io::read_to_string(std::io::stdin()).context("read payload from stdin")?
    } else {
        raw.to_string()
    };
    Ok(parse_payload(text.as_bytes()).map_err(ServiceError::from)?)
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{rendered}");
    Ok(())
}
