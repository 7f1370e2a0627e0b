//! lbpool CLI entrypoint.
//!
//! This is the main entrypoint for the lbpool command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use lbpool::arm::{ArmClient, Credentials};
use lbpool::cli::{confirmed, Cli, Commands, OutputFormatter};
use lbpool::config::{find_config_file, ConfigParser, ConfigValidator, ProviderConfig};
use lbpool::error::{ProviderError, Result};
use lbpool::poller::{cancellation, CancelHandle};
use lbpool::resource::{Provider, ProviderContext, RESOURCE_TYPE};
use lbpool::schema::ResourceData;
use lbpool::state::{
    LifecycleOperation, LocalStateStore, OperationHistoryEntry, ProviderState, StateStore,
};

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose, cli.log_json);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);
    let config = cli.config.as_ref();

    match cli.command {
        Commands::Validate { warnings } => cmd_validate(config, warnings, &formatter),
        Commands::Schema => cmd_schema(&formatter),
        Commands::Create { name } => cmd_create(config, name.as_deref(), &formatter).await,
        Commands::Read { name } => cmd_read(config, name.as_deref(), &formatter).await,
        Commands::Delete { name, yes } => {
            cmd_delete(config, name.as_deref(), yes, &formatter).await
        }
        Commands::Show => cmd_show(config, &formatter).await,
    }
}

/// Validate configuration.
fn cmd_validate(
    config_path: Option<&PathBuf>,
    show_warnings: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let parser = ConfigParser::new().with_base_path(config_dir(&config_file));
    parser.load_dotenv()?;
    let config = parser.load_with_env(&config_file)?;

    let result = ConfigValidator::new().validate(&config)?;
    println!("{}", formatter.format_validation(&result, show_warnings));

    eprintln!("\nConfiguration summary:");
    eprintln!("  Subscription: {}", config.provider.subscription_id);
    eprintln!("  Endpoint: {}", config.provider.endpoint);
    eprintln!("  Backend address pools: {}", config.backend_address_pools.len());

    Ok(())
}

/// Print the resource schema.
fn cmd_schema(formatter: &OutputFormatter) -> Result<()> {
    let provider = Provider::new();
    for resource_type in provider.resource_types() {
        let definition = provider.resource(resource_type)?;
        println!("{}", formatter.format_schema(resource_type, &definition.schema));
    }
    Ok(())
}

/// Create configured pools.
async fn cmd_create(
    config_path: Option<&PathBuf>,
    only: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut session = Session::open(config_path).await?;
    session.cancel_on_interrupt();
    let definition = session.provider.resource(RESOURCE_TYPE)?;
    let mut state = session.load_state().await?;

    let pools: Vec<_> = session
        .config
        .backend_address_pools
        .iter()
        .filter(|p| only.is_none_or(|n| n == p.name))
        .collect();
    if pools.is_empty() {
        eprintln!("{}", formatter.warning("No matching backend address pools configured."));
        return Ok(());
    }

    for pool in pools {
        let mut data = pool.to_resource_data();
        definition.schema.validate(&data)?;
        definition.schema.normalize(&mut data);

        if let Some(existing) = state.get(&pool.name) {
            let changed = definition
                .schema
                .fields_requiring_replacement(&existing.to_data(), &data);
            if changed.is_empty() {
                info!("Backend address pool {} already exists, refreshing", pool.name);
                let mut current = existing.to_data();
                let outcome = definition.handler.read(&mut current, &session.context).await;
                session
                    .finish(&mut state, LifecycleOperation::Read, &pool.name, &current, outcome)
                    .await?;
                println!("{}", formatter.format_resource(&pool.name, &current));
                continue;
            }
            return Err(ProviderError::internal(format!(
                "Backend address pool {} must be replaced because {} changed; delete it first",
                pool.name,
                changed.join(", ")
            )));
        }

        let outcome = definition.handler.create(&mut data, &session.context).await;
        session
            .finish(&mut state, LifecycleOperation::Create, &pool.name, &data, outcome)
            .await?;
        println!("{}", formatter.format_resource(&pool.name, &data));
    }

    Ok(())
}

/// Refresh tracked pools.
async fn cmd_read(
    config_path: Option<&PathBuf>,
    only: Option<&str>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut session = Session::open(config_path).await?;
    session.cancel_on_interrupt();
    let mut state = session.load_state().await?;

    for name in tracked_names(&state, only) {
        let Some(tracked) = state.get(&name) else {
            continue;
        };
        let definition = session.provider.resource(&tracked.resource_type)?;
        let mut data = tracked.to_data();

        let outcome = definition.handler.read(&mut data, &session.context).await;
        session
            .finish(&mut state, LifecycleOperation::Read, &name, &data, outcome)
            .await?;
        println!("{}", formatter.format_resource(&name, &data));
    }

    Ok(())
}

/// Delete tracked pools.
async fn cmd_delete(
    config_path: Option<&PathBuf>,
    only: Option<&str>,
    auto_approve: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut session = Session::open(config_path).await?;
    let mut state = session.load_state().await?;
    let names = tracked_names(&state, only);

    if names.is_empty() {
        eprintln!("{}", formatter.warning("No tracked backend address pools to delete."));
        return Ok(());
    }

    eprintln!("The following backend address pools will be deleted:");
    for name in &names {
        if let Some(tracked) = state.get(name) {
            eprintln!("  - {name} ({})", tracked.id);
        }
    }

    if !auto_approve {
        eprint!("\nType 'delete' to confirm: ");
        std::io::stderr().flush()?;

        if !confirmed(&mut std::io::stdin().lock(), "delete")? {
            eprintln!("Deletion cancelled.");
            return Ok(());
        }
    }

    // Ctrl-C at the prompt above still terminates the process.
    session.cancel_on_interrupt();

    for name in names {
        let Some(tracked) = state.get(&name) else {
            continue;
        };
        let definition = session.provider.resource(&tracked.resource_type)?;
        let mut data = tracked.to_data();

        eprintln!("Deleting {name}...");
        let outcome = definition.handler.delete(&mut data, &session.context).await;
        session
            .finish(&mut state, LifecycleOperation::Delete, &name, &data, outcome)
            .await?;
        eprintln!("{}", formatter.success(&format!("{name} deleted")));
    }

    Ok(())
}

/// Show the local state.
async fn cmd_show(config_path: Option<&PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let (config, config_file) = load_config(config_path)?;
    let store = state_store(&config, &config_file);

    match store.load().await? {
        Some(state) => println!("{}", formatter.format_state(&state)),
        None => eprintln!("No state found."),
    }
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Everything a lifecycle command needs.
struct Session {
    config: ProviderConfig,
    provider: Provider,
    context: ProviderContext,
    store: LocalStateStore,
    interrupt: Option<CancelHandle>,
}

impl Session {
    /// Loads configuration and credentials and builds the provider context.
    async fn open(config_path: Option<&PathBuf>) -> Result<Self> {
        let (config, config_file) = load_config(config_path)?;
        let store = state_store(&config, &config_file);

        let credentials = Credentials::from_env()?;
        let client = ArmClient::with_timeout(
            &config.provider.subscription_id,
            credentials,
            config.timeouts.request_secs,
        )?
        .with_endpoint(&config.provider.endpoint)
        .with_authority(&config.provider.authority)
        .with_api_version(&config.provider.api_version);
        debug!("ARM client ready for subscription {}", client.subscription_id());

        let (cancel, signal) = cancellation();

        let context = ProviderContext::new(Arc::new(client))
            .with_timeouts(config.timeouts.to_timeouts())
            .with_cancel(signal);

        Ok(Self {
            config,
            provider: Provider::new(),
            context,
            store,
            interrupt: Some(cancel),
        })
    }

    /// Turns Ctrl-C into cancellation of the running wait from now on.
    fn cancel_on_interrupt(&mut self) {
        let Some(cancel) = self.interrupt.take() else {
            return;
        };
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    async fn load_state(&self) -> Result<ProviderState> {
        Ok(self.store.load().await?.unwrap_or_default())
    }

    /// Records the outcome of a callback and persists state.
    async fn finish(
        &self,
        state: &mut ProviderState,
        operation: LifecycleOperation,
        name: &str,
        data: &ResourceData,
        outcome: Result<()>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => {
                if !state.record(RESOURCE_TYPE, name, data) {
                    info!("{name} is no longer tracked");
                }
                state.add_history(OperationHistoryEntry::new(operation, name));
                self.store.save(state).await
            }
            Err(e) => {
                error!("{operation} of {name} failed: {e}");
                // Keep an ID assigned before the failure so the pool can be
                // refreshed or deleted later.
                if data.id().is_some() {
                    state.record(RESOURCE_TYPE, name, data);
                }
                state.add_history(OperationHistoryEntry::failed(operation, name, &e.to_string()));
                self.store.save(state).await?;
                Err(e)
            }
        }
    }
}

/// Lists tracked names, optionally narrowed to one.
fn tracked_names(state: &ProviderState, only: Option<&str>) -> Vec<String> {
    state
        .resource_names()
        .into_iter()
        .filter(|n| only.is_none_or(|o| o == *n))
        .map(str::to_string)
        .collect()
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&PathBuf>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.clone()))
}

fn config_dir(config_file: &Path) -> &Path {
    config_file.parent().unwrap_or_else(|| Path::new("."))
}

/// Loads and validates configuration.
fn load_config(config_path: Option<&PathBuf>) -> Result<(ProviderConfig, PathBuf)> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let parser = ConfigParser::new().with_base_path(config_dir(&config_file));
    parser.load_dotenv()?;

    let config = parser.load_with_env(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok((config, config_file))
}

/// Creates the state store, resolving relative paths against the config file.
fn state_store(config: &ProviderConfig, config_file: &Path) -> LocalStateStore {
    let path = Path::new(&config.state.path);
    let base_dir = if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir(config_file).join(path)
    };
    LocalStateStore::with_base_dir(base_dir)
}

