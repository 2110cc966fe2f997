//! CLI command implementations
//!
//! Every command follows the same sequence:
//! 1. Load and validate the configuration
//! 2. Load the dataset into the in-memory store
//! 3. Read one JSON request from stdin
//! 4. Run the operation for the requested entity kind
//! 5. Write one JSON response to stdout

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compiler::AdministrativeScope;
use crate::condition::SearchCondition;
use crate::entity::{EntityId, Groups, KindTag, Principals};
use crate::executor::SearchExecutor;
use crate::observability::SearchEvent;
use crate::planner::OrderByClause;
use crate::schema::MemoryCatalog;
use crate::storage::{Dataset, LoadedDataset, MemoryKind, MemoryStore, SearchStore};

use super::args::Command;
use super::config::SearchConfig;
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Search request read from stdin
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub condition: SearchCondition,
    /// Defaults to a restricted, empty scope
    #[serde(default)]
    pub scope: AdministrativeScope,
    #[serde(default = "first_page")]
    pub page: i64,
    /// Falls back to the configured default
    #[serde(default)]
    pub page_size: Option<i64>,
    #[serde(default)]
    pub order_by: Vec<OrderByClause>,
    /// Entity tested by `matches`
    #[serde(default)]
    pub entity_id: Option<EntityId>,
}

fn first_page() -> i64 {
    1
}

/// Operation selected by the subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Count,
    Matches,
    Explain,
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run one command, reporting failures as a JSON error response
pub fn run_command(cmd: Command) -> CliResult<()> {
    let outcome = execute(&cmd).and_then(write_response);
    if let Err(e) = &outcome {
        write_error(e.code_str(), e.message())?;
    }
    outcome
}

fn execute(cmd: &Command) -> CliResult<Value> {
    let operation = match cmd {
        Command::Search(_) => Operation::Search,
        Command::Count(_) => Operation::Count,
        Command::Matches(_) => Operation::Matches,
        Command::Explain(_) => Operation::Explain,
    };
    let target = cmd.target();

    let config = SearchConfig::load(&target.config)?;
    let loaded = load_dataset(&config)?;

    let request: Request = serde_json::from_value(read_request()?)
        .map_err(|e| CliError::invalid_request(e.to_string()))?;

    handle(operation, target.kind.into(), &config, &loaded, &request)
}

/// Load the configured dataset
pub fn load_dataset(config: &SearchConfig) -> CliResult<LoadedDataset> {
    let path = config.dataset_path();
    let loaded = Dataset::from_path(&path)?.load()?;

    let principals = loaded.store.principals().len().to_string();
    let groups = loaded.store.groups().len().to_string();
    SearchEvent::DatasetLoaded.log(&[
        ("groups", groups.as_str()),
        ("principals", principals.as_str()),
    ]);
    Ok(loaded)
}

/// Run `operation` for `kind` and build the response payload
pub fn handle(
    operation: Operation,
    kind: KindTag,
    config: &SearchConfig,
    loaded: &LoadedDataset,
    request: &Request,
) -> CliResult<Value> {
    match kind {
        KindTag::Principal => {
            dispatch::<Principals>(operation, config, &loaded.store, &loaded.principal_catalog, request)
        }
        KindTag::Group => {
            dispatch::<Groups>(operation, config, &loaded.store, &loaded.group_catalog, request)
        }
    }
}

fn dispatch<K>(
    operation: Operation,
    config: &SearchConfig,
    store: &MemoryStore,
    catalog: &MemoryCatalog,
    request: &Request,
) -> CliResult<Value>
where
    K: MemoryKind,
    K::Entity: Serialize,
{
    let executor = SearchExecutor::<K, _, _>::new(store, catalog)
        .with_query_logging(config.explain_queries);
    let page_size = config.page_size(request.page_size);

    match operation {
        Operation::Search => {
            let entities = executor.search(
                &request.scope,
                &request.condition,
                request.page,
                page_size,
                &request.order_by,
            )?;
            Ok(json!({ "count": entities.len(), "results": entities }))
        }
        Operation::Count => {
            let count = executor.count(&request.scope, &request.condition)?;
            Ok(json!({ "count": count }))
        }
        Operation::Matches => {
            let id = request
                .entity_id
                .ok_or_else(|| CliError::invalid_request("matches requires entity_id"))?;
            let entity = SearchStore::<K>::load(store, id)?.ok_or_else(|| {
                CliError::invalid_request(format!("{} {} does not exist", K::TAG, id))
            })?;
            let matches = executor.matches(&entity, &request.condition, &request.scope)?;
            Ok(json!({ "entity_id": id, "matches": matches }))
        }
        Operation::Explain => {
            let plan = executor.explain(
                &request.scope,
                &request.condition,
                request.page,
                page_size,
                &request.order_by,
            )?;
            Ok(json!({ "plan": plan, "text": plan.to_string() }))
        }
    }
}
