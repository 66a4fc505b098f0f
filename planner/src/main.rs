//! `seatplan` command line.
//!
//! Runs one seating operation against the configured record store and prints
//! the resulting partition. With the default `memory` backend every process
//! starts empty, so only `demo` is useful there; point `SEATPLAN_BACKEND` at
//! `postgres` to work on real data.

use anyhow::Context;
use clap::{Parser, Subcommand};
use seatplan_core::environment::SystemClock;
use seatplan_core::record_store::RecordStore;
use seatplan_core::types::{EventId, GuestId, TableId};
use seatplan_postgres::PostgresRecordStore;
use seatplan_runtime::metrics::MetricsRecorder;
use seatplan_testing::InMemoryRecordStore;
use seating_planner::config::Backend;
use seating_planner::{Config, Partition, SeatingAllocator, SeatingEnvironment, demo};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "seatplan")]
#[command(version)]
#[command(about = "Seat wedding guests at capacity-bounded tables.", long_about = None)]
struct Cli {
    /// Print Prometheus metrics before exiting.
    #[arg(long, global = true)]
    metrics: bool,

    /// Print partitions as JSON instead of a table listing.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Seed a sample wedding in memory, auto-generate seating and print it.
    Demo,

    /// Print an event's tables and unassigned guests.
    Show {
        #[arg(short, long)]
        event: EventId,
    },

    /// Seat a guest at a table, or unassign them when no table is given.
    Assign {
        #[arg(short, long)]
        event: EventId,

        #[arg(short, long)]
        guest: GuestId,

        #[arg(short, long)]
        table: Option<TableId>,
    },

    /// Create a manual table.
    CreateTable {
        #[arg(short, long)]
        event: EventId,

        #[arg(short, long)]
        name: String,

        /// Seats at the table; defaults to `SEATPLAN_DEFAULT_CAPACITY`.
        #[arg(short, long)]
        capacity: Option<u32>,
    },

    /// Delete a table and return its guests to the unassigned pool.
    DeleteTable {
        #[arg(short, long)]
        event: EventId,

        #[arg(short, long)]
        table: TableId,

        /// Required when the table still has guests.
        #[arg(long)]
        confirm: bool,
    },

    /// Group guests by shared ceremonies and food preference into new tables.
    AutoGenerate {
        #[arg(short, long)]
        event: EventId,
    },

    /// Create the `PostgreSQL` schema.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let mut recorder = MetricsRecorder::new();
    if cli.metrics {
        recorder.install().context("installing metrics recorder")?;
    }

    run(&cli, &config).await?;

    if let Some(rendered) = recorder.render() {
        println!("{rendered}");
    }
    Ok(())
}

async fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let event_id = match &cli.command {
        Command::Demo => return run_demo(cli, config).await,
        Command::Migrate => {
            require_schema(config.backend)?;
            open_store(config).await?;
            println!("schema is up to date");
            return Ok(());
        },
        Command::Show { event }
        | Command::Assign { event, .. }
        | Command::CreateTable { event, .. }
        | Command::DeleteTable { event, .. }
        | Command::AutoGenerate { event } => *event,
    };

    let allocator = allocator_for(config, open_store(config).await?);
    allocator.load(event_id).await?;

    match &cli.command {
        Command::Assign { guest, table, .. } => {
            allocator.assign_guest(*guest, *table).await?;
        },
        Command::CreateTable { name, capacity, .. } => {
            let table_id = match capacity {
                Some(capacity) => allocator.create_table_with_capacity(name, *capacity).await?,
                None => allocator.create_table(name).await?,
            };
            println!("created table {table_id}");
        },
        Command::DeleteTable { table, confirm, .. } => {
            let released = allocator.delete_table(*table, *confirm).await?;
            println!("deleted table {table}, released {} guests", released.len());
        },
        Command::AutoGenerate { .. } => {
            let report = allocator.auto_generate().await?;
            println!(
                "generated {} tables from {} groups, seated {} guests",
                report.tables_created, report.groups, report.guests_seated
            );
        },
        Command::Show { .. } | Command::Demo | Command::Migrate => {},
    }

    print_partition(cli, &allocator).await
}

async fn run_demo(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let store = InMemoryRecordStore::new();
    let event = demo::seed_wedding(&store)?;
    let allocator = allocator_for(config, Arc::new(store));

    allocator.load(event.id).await?;
    let report = allocator.auto_generate().await?;
    tracing::info!(
        groups = report.groups,
        tables = report.tables_created,
        seated = report.guests_seated,
        "Demo seating generated"
    );

    print_partition(cli, &allocator).await
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    match config.backend {
        Backend::Memory => {
            tracing::warn!("Using the in-memory backend; nothing is kept after exit");
            Ok(Arc::new(InMemoryRecordStore::new()))
        },
        Backend::Postgres => {
            let store = PostgresRecordStore::connect(
                &config.postgres.url,
                config.postgres.max_connections,
                Duration::from_secs(config.postgres.connect_timeout),
            )
            .await
            .context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            Ok(Arc::new(store))
        },
    }
}

/// Fails for backends without a schema to migrate.
fn require_schema(backend: Backend) -> anyhow::Result<()> {
    match backend {
        Backend::Memory => {
            anyhow::bail!("migrate needs SEATPLAN_BACKEND=postgres; the memory backend has no schema")
        },
        Backend::Postgres => Ok(()),
    }
}

fn allocator_for(config: &Config, store: Arc<dyn RecordStore>) -> SeatingAllocator {
    let environment = config.configure(SeatingEnvironment::new(store, Arc::new(SystemClock)));
    SeatingAllocator::new(environment)
}

async fn print_partition(cli: &Cli, allocator: &SeatingAllocator) -> anyhow::Result<()> {
    let partition = allocator.partition().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&partition)?);
        return Ok(());
    }

    let names: HashMap<GuestId, String> = allocator
        .guests()
        .await
        .into_iter()
        .map(|guest| (guest.id, format!("{} ({}, {})", guest.name, guest.food, events_of(&guest))))
        .collect();

    print!("{}", render(&partition, &names));
    Ok(())
}

fn events_of(guest: &seatplan_core::types::Guest) -> String {
    guest
        .events
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("+")
}

fn render(partition: &Partition, names: &HashMap<GuestId, String>) -> String {
    use std::fmt::Write as _;

    let name_of = |id: &GuestId| names.get(id).cloned().unwrap_or_else(|| id.to_string());
    let mut out = String::new();

    if let Some(event) = &partition.event {
        let _ = writeln!(out, "{} [{}] {}", event.title, event.name, event.id);
    }
    for table in &partition.tables {
        let _ = writeln!(
            out,
            "\n{} ({}/{}, {}) {}",
            table.name,
            table.members.len() + table.held,
            table.capacity,
            table.origin.as_str(),
            table.id
        );
        for member in &table.members {
            let _ = writeln!(out, "  - {}", name_of(member));
        }
        if table.held > 0 {
            let _ = writeln!(out, "  ({} seats held by guests not on this guest list)", table.held);
        }
    }
    let _ = writeln!(out, "\nUnassigned ({})", partition.unassigned.len());
    for guest in &partition.unassigned {
        let _ = writeln!(out, "  - {}", name_of(guest));
    }
    out
}
