//! UDBuildings CLI - list and edit the building location store

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use udbuildings::config::{self, StoreConfig};
use udbuildings::storage::SchemaAction;
use udbuildings::ui::{self, Icons};
use udbuildings::{OpenReport, Record};

#[derive(Parser)]
#[command(name = "udbuildings")]
#[command(version)]
#[command(about = "Building location store - codes, names and coordinates")]
#[command(long_about = r#"
UDBuildings keeps a small table of building locations in SQLite.
The first time the database is opened empty it is seeded from a flat file
with one `code:name:latitude:longitude` record per line.

Example usage:
  udbuildings init
  udbuildings list
  udbuildings add --code A3 --name Annex --latitude 12.0 --longitude 22.0
  udbuildings update 3 --code A3 --name "East Annex" --latitude 12.0 --longitude 22.5
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the seed file (overrides config)
    #[arg(short, long, global = true)]
    seed: Option<PathBuf>,

    /// Expected schema version (overrides config)
    #[arg(long, global = true)]
    schema_version: Option<u32>,

    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List all records
    List,

    /// Show one record
    Show {
        /// Record identifier
        id: i64,
    },

    /// Add a record
    Add {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        latitude: String,
        #[arg(long)]
        longitude: String,
    },

    /// Replace all fields of a record
    Update {
        /// Record identifier
        id: i64,
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        latitude: String,
        #[arg(long)]
        longitude: String,
    },

    /// Delete a record
    Delete {
        /// Record identifier
        id: i64,
    },

    /// Show database location, schema version and record count
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Init { force } = cli.command {
        let path = cli.config.clone().unwrap_or_else(config::default_config_path);
        let defaults = StoreConfig {
            database: Some(config::default_database_path_in(Path::new(".")).to_string_lossy().into_owned()),
            seed_file: Some(config::DEFAULT_SEED_FILE.to_string()),
            schema_version: Some(udbuildings::storage::DEFAULT_SCHEMA_VERSION),
        };
        config::write_config(&path, &defaults, force)?;
        if cli.json {
            println!("{}", serde_json::json!({ "config": path.display().to_string() }));
        } else {
            ui::success(&format!("Wrote config to {}", path.display()));
        }
        return Ok(());
    }

    let settings = resolve_config(&cli)?;
    let db_path = settings.database_path();
    config::ensure_db_dir(&db_path)?;

    let store = settings
        .open_store()
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    report_open(store.last_open());

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::List => {
            let records = store.fetch_all_notes()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                ui::warn("No records");
            } else {
                ui::header(&format!("{} record(s)", records.len()));
                println!("{}", ui::records_table(&records));
            }
        }

        Commands::Show { id } => {
            let record = store.fetch_note(id)?;
            print_record(&record, cli.json)?;
        }

        Commands::Add { code, name, latitude, longitude } => {
            let id = store
                .create_note(&code, &name, &latitude, &longitude)
                .context("could not add record")?;
            if !cli.json {
                ui::success(&format!("{} Added record {}", Icons::NEW, id));
            }
            print_record(&store.fetch_note(id)?, cli.json)?;
        }

        Commands::Update { id, code, name, latitude, longitude } => {
            let updated = store
                .update_note(id, &code, &name, &latitude, &longitude)
                .context("could not update record")?;
            if !updated {
                anyhow::bail!("no record with id {}", id);
            }
            if !cli.json {
                ui::success(&format!("Updated record {}", id));
            }
            print_record(&store.fetch_note(id)?, cli.json)?;
        }

        Commands::Delete { id } => {
            let deleted = store.delete_note(id)?;
            if cli.json {
                println!("{}", delete_json(id, deleted));
            } else if deleted {
                ui::success(&format!("{} Deleted record {}", Icons::DEL, id));
            } else {
                ui::warn(&format!("No record with id {}", id));
            }
        }

        Commands::Status => {
            let seed_path = settings.seed_path();
            let version = store.schema_version()?;
            let count = store.count_notes()?;
            if cli.json {
                let status = status_json(&db_path, &seed_path, version, count, store.last_open());
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                ui::section("Store");
                ui::info(&format!("{} Database", Icons::DATABASE), &db_path.display().to_string());
                ui::info("Seed file", &seed_path.display().to_string());
                ui::info("Schema version", &version.to_string());
                ui::info("Records", &count.to_string());
                print!("{}", store.last_open());
            }
        }
    }

    store.close()?;
    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut settings = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(database) = &cli.database {
        settings.database = Some(database.to_string_lossy().into_owned());
    }
    if let Some(seed) = &cli.seed {
        settings.seed_file = Some(seed.to_string_lossy().into_owned());
    }
    if let Some(version) = cli.schema_version {
        settings.schema_version = Some(version);
    }
    Ok(settings)
}

/// Tell the user about destructive upgrades and seeding, on stderr
fn report_open(report: &OpenReport) {
    if let SchemaAction::Recreated { from, to } = report.schema {
        ui::warn(&format!(
            "Schema upgraded from version {} to {}: all previous records were destroyed",
            from, to
        ));
    }
    if report.seeded > 0 {
        ui::note("Seeded records", &report.seeded.to_string());
    }
}

fn print_record(record: &Record, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    ui::section(&format!("{} Record {}", Icons::PIN, record.id));
    for (label, value) in ui::record_fields(record) {
        ui::summary_row(&format!("{}:", label), value);
    }
    Ok(())
}

fn delete_json(id: i64, deleted: bool) -> serde_json::Value {
    serde_json::json!({ "id": id, "deleted": deleted })
}

fn status_json(
    db_path: &Path,
    seed_path: &Path,
    schema_version: u32,
    records: usize,
    report: &OpenReport,
) -> serde_json::Value {
    serde_json::json!({
        "database": db_path.display().to_string(),
        "seed_file": seed_path.display().to_string(),
        "schema_version": schema_version,
        "records": records,
        "open": report,
    })
}
