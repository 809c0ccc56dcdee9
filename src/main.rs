use std::sync::Arc;
use std::time::Duration;

/// Reset SIGPIPE to default behavior so piping (e.g. `lakedeck leaderboard show | head`)
/// exits cleanly instead of panicking on broken pipe.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod config;
mod directory;
mod leaderboard;
mod output;
mod provider;
mod provisioner;
mod sql;
mod state;

use config::loader::{self, Overrides, Settings};
use directory::scim::ScimDirectory;
use directory::UserDirectory;
use leaderboard::{
    DestinationTable, LeaderboardError, Materializer, ReadinessPolicy, WarehouseSelection,
    DEFAULT_QUERY_LIMIT,
};
use output::formatter;
use provider::catalog::UnityCatalogClient;
use provider::client::WorkspaceEndpoint;
use provider::local::LocalWorkspace;
use provider::models::{ClusterSize, WarehouseSpec};
use provisioner::{teardown, Provisioner, ResourceTracker, SessionId};
use sql::local::LocalExecutor;
use sql::statement_api::StatementApi;
use state::sqlite::SqliteTracker;

/// lakedeck - workshop control panel for Databricks SQL warehouses and leaderboards
#[derive(Parser)]
#[command(name = "lakedeck", version, about, long_about = None)]
struct Cli {
    /// Path to a lakedeck.yaml config file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Working directory for the session database
    #[arg(short, long, default_value = ".lakedeck")]
    working_dir: String,

    /// Session whose warehouses are tracked for teardown
    #[arg(short, long, default_value = "default")]
    session: String,

    /// Workspace hostname (overrides DATABRICKS_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Personal access token (overrides DATABRICKS_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Leaderboard catalog
    #[arg(long)]
    catalog: Option<String>,

    /// Leaderboard schema
    #[arg(long)]
    schema: Option<String>,

    /// Leaderboard table
    #[arg(long)]
    table: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision and manage SQL warehouses
    Warehouse {
        #[command(subcommand)]
        command: WarehouseCommands,
    },

    /// List workspace users from the SCIM directory
    Users {
        /// Include inactive users
        #[arg(long)]
        all: bool,
    },

    /// Seed and read the participant leaderboard
    Leaderboard {
        #[command(subcommand)]
        command: LeaderboardCommands,
    },
}

#[derive(Subcommand)]
enum WarehouseCommands {
    /// Create one or more warehouses and track them in the session
    Create {
        /// Warehouse name; suffixed with -1, -2, ... when count > 1
        #[arg(short, long)]
        name: String,

        /// Size class, e.g. 2X-Small, Small, Medium, Large
        #[arg(long, default_value = "Small")]
        size: String,

        /// Minutes of inactivity before the warehouse stops (120, 240, 480 are typical)
        #[arg(long, default_value = "120")]
        auto_stop: u32,

        /// Number of warehouses to create (1-5)
        #[arg(long, default_value = "1")]
        count: u32,
    },

    /// List warehouses in the workspace
    List,

    /// Stop a warehouse
    Stop { id: String },

    /// Delete a warehouse
    Delete { id: String },

    /// Show warehouses tracked in the session
    Tracked,

    /// Stop and delete every tracked warehouse
    Teardown {
        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
}

#[derive(Args, Clone)]
struct TargetArgs {
    /// Run statements on this warehouse
    #[arg(long, conflicts_with = "dedicated")]
    warehouse_id: Option<String>,

    /// Create a dedicated warehouse with this name and wait for it
    #[arg(long)]
    dedicated: Option<String>,

    /// Use a local SQLite file instead of a workspace
    #[arg(long)]
    local_db: Option<String>,
}

#[derive(Subcommand)]
enum LeaderboardCommands {
    /// Create the table and load participants from the user directory
    Init {
        #[command(flatten)]
        target: TargetArgs,

        /// Replace rows that are already in the table, scores included
        #[arg(long)]
        reset: bool,

        /// Use demo participants instead of the directory
        #[arg(long)]
        demo: bool,
    },

    /// Delete every row from the leaderboard table
    Reset {
        #[command(flatten)]
        target: TargetArgs,

        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },

    /// Print the ranked leaderboard
    Show {
        #[command(flatten)]
        target: TargetArgs,

        /// Maximum rows to show
        #[arg(short, long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    #[cfg(unix)]
    reset_sigpipe();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Warehouse { ref command } => cmd_warehouse(&cli, command).await,
        Commands::Users { all } => cmd_users(&cli, all).await,
        Commands::Leaderboard { ref command } => cmd_leaderboard(&cli, command).await,
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn settings(cli: &Cli) -> Result<Settings> {
    let config = config::parser::load_config(cli.config.as_deref())?;
    let overrides = Overrides {
        host: cli.host.clone(),
        token: cli.token.clone(),
        catalog: cli.catalog.clone(),
        schema: cli.schema.clone(),
        table: cli.table.clone(),
    };
    Ok(loader::resolve_from_env(config, &overrides))
}

/// Settings with credentials that are at least well-formed.
fn remote_settings(cli: &Cli) -> Result<Settings> {
    let settings = settings(cli)?;
    config::validator::validate_credentials(&settings.credentials)?;
    Ok(settings)
}

fn open_tracker(working_dir: &str) -> Result<SqliteTracker> {
    let db_path = format!("{}/lakedeck.db", working_dir);
    let tracker = SqliteTracker::open(&db_path)?;
    tracker.initialize()?;
    Ok(tracker)
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn confirm(question: &str) -> Result<bool> {
    use std::io::Write;
    println!("\n{} Only '{}' will be accepted.", question, "yes".bold());
    print!("  Enter a value: ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim() == "yes")
}

async fn connect(settings: &Settings) -> Result<Provisioner> {
    Provisioner::connect(settings)
        .await
        .context("Failed to set up workspace client")
}

fn destination(settings: &Settings) -> Result<DestinationTable> {
    let lb = &settings.leaderboard;
    DestinationTable::new(&lb.catalog, &lb.schema, &lb.table)
        .context("Invalid leaderboard table name")
}

fn selection(target: &TargetArgs) -> WarehouseSelection {
    match (&target.warehouse_id, &target.dedicated) {
        (Some(id), _) => WarehouseSelection::Explicit(id.clone()),
        (None, Some(name)) => WarehouseSelection::Dedicated { name: name.clone() },
        (None, None) => WarehouseSelection::AnyRunning,
    }
}

/// Build a materializer against the workspace, or against a SQLite file in
/// local mode. Local mode never touches the network.
async fn materializer(settings: &Settings, target: &TargetArgs) -> Result<Materializer> {
    let policy = ReadinessPolicy::from(&settings.readiness);

    if let Some(ref path) = target.local_db {
        let workspace = Arc::new(LocalWorkspace::new());
        let executor = LocalExecutor::open(path)
            .with_context(|| format!("Failed to open local database at {}", path))?;
        return Ok(Materializer::new(
            Provisioner::new(workspace.clone()).with_pacing(settings.pacing),
            workspace,
            Arc::new(executor),
            policy,
        ));
    }

    config::validator::validate_credentials(&settings.credentials)?;
    let endpoint = WorkspaceEndpoint::new(&settings.credentials, settings.request_timeout)?;
    Ok(Materializer::new(
        connect(settings).await?,
        Arc::new(UnityCatalogClient::new(endpoint.clone())),
        Arc::new(StatementApi::new(endpoint)),
        policy,
    ))
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn cmd_warehouse(cli: &Cli, command: &WarehouseCommands) -> Result<()> {
    let session = SessionId::new(&cli.session);

    match command {
        WarehouseCommands::Create {
            name,
            size,
            auto_stop,
            count,
        } => {
            let size: ClusterSize = size.parse()?;
            let spec = WarehouseSpec::new(name, size, *auto_stop, *count)?;
            let settings = remote_settings(cli)?;
            let tracker = open_tracker(&cli.working_dir)?;
            let provisioner = connect(&settings).await?;

            let pb = spinner(&format!("Creating {} warehouse(s)...", spec.replica_count()));
            let handles = provisioner
                .create_multiple(&spec, spec.replica_count())
                .await;
            pb.finish_and_clear();

            let tracked = tracker.record_all(&session, &handles).await?;
            formatter::print_creation_results(&handles);

            let report = output::report::generate_report(&handles);
            println!();
            println!(
                "{} Tracking {} warehouse(s) in session '{}'.",
                report,
                tracked,
                session
            );
            if report.succeeded == 0 {
                bail!("No warehouses were created.");
            }
        }

        WarehouseCommands::List => {
            let settings = remote_settings(cli)?;
            let provisioner = connect(&settings).await?;
            let warehouses = provisioner.list_warehouses().await;
            formatter::print_warehouse_list(&warehouses);
        }

        WarehouseCommands::Stop { id } => {
            let settings = remote_settings(cli)?;
            let provisioner = connect(&settings).await?;
            if !provisioner.stop_warehouse(id).await {
                bail!("Failed to stop warehouse {}", id);
            }
            formatter::print_success(&format!("Stop requested for warehouse {}.", id));
        }

        WarehouseCommands::Delete { id } => {
            let settings = remote_settings(cli)?;
            let provisioner = connect(&settings).await?;
            if !provisioner.delete_warehouse(id).await {
                bail!("Failed to delete warehouse {}", id);
            }
            let tracker = open_tracker(&cli.working_dir)?;
            tracker.forget(&session, std::slice::from_ref(id)).await?;
            formatter::print_success(&format!("Deleted warehouse {}.", id));
        }

        WarehouseCommands::Tracked => {
            let tracker = open_tracker(&cli.working_dir)?;
            let handles = tracker.tracked(&session).await?;
            formatter::print_tracked(session.as_str(), &handles);

            let others: Vec<(String, usize)> = tracker
                .sessions()?
                .into_iter()
                .filter(|(s, _)| s != session.as_str())
                .collect();
            for (other, n) in others {
                println!("  {}", format!("session '{}': {} tracked", other, n).dimmed());
            }
        }

        WarehouseCommands::Teardown { auto_approve } => {
            let tracker = open_tracker(&cli.working_dir)?;
            let tracked = tracker.tracked(&session).await?;
            if tracked.is_empty() {
                println!("{}", "No tracked warehouses.".dimmed());
                return Ok(());
            }

            if !auto_approve {
                formatter::print_tracked(session.as_str(), &tracked);
                let question = format!(
                    "Stop and delete {} warehouse(s)? They will no longer be tracked afterwards.",
                    tracked.len()
                );
                if !confirm(&question)? {
                    println!("\n{}", "Teardown cancelled.".yellow());
                    return Ok(());
                }
            }

            let settings = remote_settings(cli)?;
            let provisioner = connect(&settings).await?;
            let pb = spinner("Stopping and deleting warehouses...");
            let report = teardown(&provisioner, &tracker, &session).await?;
            pb.finish_and_clear();
            formatter::print_teardown(&report);
        }
    }

    Ok(())
}

async fn cmd_users(cli: &Cli, all: bool) -> Result<()> {
    let settings = remote_settings(cli)?;
    let endpoint = WorkspaceEndpoint::new(&settings.credentials, settings.request_timeout)?;
    let directory = ScimDirectory::new(endpoint);

    let pb = spinner("Reading workspace directory...");
    let users = directory.list_users().await;
    pb.finish_and_clear();

    let mut users = users.context("Failed to list workspace users")?;
    if !all {
        users.retain(|u| u.active);
    }
    formatter::print_users(&users);
    Ok(())
}

async fn cmd_leaderboard(cli: &Cli, command: &LeaderboardCommands) -> Result<()> {
    let settings = settings(cli)?;
    let dest = destination(&settings)?;

    match command {
        LeaderboardCommands::Init {
            target,
            reset,
            demo,
        } => {
            let materializer = materializer(&settings, target).await?;

            let participants = if *demo || target.local_db.is_some() {
                directory::demo::demo_participants()
            } else {
                let endpoint =
                    WorkspaceEndpoint::new(&settings.credentials, settings.request_timeout)?;
                let pb = spinner("Reading workspace directory...");
                let (participants, used_demo) =
                    directory::fetch_participants(&ScimDirectory::new(endpoint)).await;
                pb.finish_and_clear();
                if used_demo {
                    formatter::print_warning("Directory unavailable, using demo participants.");
                }
                participants
            };

            let pb = spinner("Locating warehouse...");
            let ready = materializer.ensure_warehouse(&selection(target)).await;
            pb.finish_and_clear();
            let ready = ready?;
            if let Some(ref created) = ready.provisioned {
                let session = SessionId::new(&cli.session);
                let tracked = match open_tracker(&cli.working_dir) {
                    Ok(tracker) => tracker.record(&session, created).await,
                    Err(e) => Err(e),
                };
                match tracked {
                    Ok(()) => formatter::print_success(&format!(
                        "Created warehouse {} ({}), tracked in session '{}'.",
                        created.name, created.id, session
                    )),
                    Err(e) => formatter::print_warning(&format!(
                        "Warehouse {} ({}) could not be tracked: {:#}. Delete it by hand when done.",
                        created.name, created.id, e
                    )),
                }
            }
            if !ready.readiness.is_confirmed() {
                formatter::print_warning(&format!(
                    "Warehouse {} is {}; statements may queue until it is running.",
                    ready.name, ready.readiness
                ));
            }
            let pinned = WarehouseSelection::Explicit(ready.id.clone());

            if !reset {
                match materializer.count_rows(&dest, &pinned).await {
                    Ok(0) | Err(LeaderboardError::TableNotFound(_)) => {}
                    Ok(n) => bail!(
                        "{} already holds {} row(s). Pass --reset to replace them, scores included.",
                        dest,
                        n
                    ),
                    Err(e) => return Err(e.into()),
                }
            }

            let pb = spinner(&format!("Writing {} participant(s)...", participants.len()));
            let summary = materializer
                .store_leaderboard(&participants, &dest, &pinned)
                .await;
            pb.finish_and_clear();
            formatter::print_store_summary(&summary?);
        }

        LeaderboardCommands::Reset {
            target,
            auto_approve,
        } => {
            if !auto_approve && !confirm(&format!("Delete every row from {}?", dest))? {
                println!("\n{}", "Reset cancelled.".yellow());
                return Ok(());
            }
            let materializer = materializer(&settings, target).await?;
            let deleted = materializer
                .reset_leaderboard(&dest, &selection(target))
                .await?;
            match deleted {
                Some(n) => formatter::print_success(&format!("Deleted {} row(s) from {}.", n, dest)),
                None => formatter::print_success(&format!("Cleared {}.", dest)),
            }
        }

        LeaderboardCommands::Show { target, limit } => {
            let materializer = materializer(&settings, target).await?;
            let rows = materializer
                .query_leaderboard(&dest, *limit, &selection(target))
                .await?;
            if rows.is_empty() {
                println!("{}", "The leaderboard is empty.".dimmed());
            } else {
                println!("{}", formatter::format_leaderboard(&rows));
            }
        }
    }

    Ok(())
}
