//! Babbage CLI - query cubes from the command line
//!
//! Usage:
//!   babbage cubes
//!   babbage model <cube>
//!   babbage aggregate <cube> [--aggregates A] [--drilldown D] [--cut C] [--order O]
//!   babbage facts <cube> [--fields F] [--cut C] [--order O] [--page N] [--pagesize N]
//!   babbage members <cube> <ref> [--cut C] [--order O]
//!   babbage cardinalities <cube>
//!
//! Examples:
//!   babbage --db spending.db --models ./models aggregate cra --drilldown cofog1
//!   babbage --db spending.db facts cra --cut 'cofog1:"4"' --pagesize 5

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use babbage::config::{Settings, SettingsError};
use babbage::{
    BabbageError, BabbageResult, CachingJsonCubeCatalog, Cube, CubeCatalog, Dialect,
    JsonCubeCatalog, QueryParams, SqliteBackend,
};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "babbage")]
#[command(about = "Babbage - query analytical cubes over a star schema")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to BABBAGE_CONFIG, ./babbage.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<String>,

    /// SQL script run against the database before querying
    #[arg(long, global = true)]
    init: Option<PathBuf>,

    /// Directory of <cube>.json models
    #[arg(long, global = true)]
    models: Option<PathBuf>,

    /// Log generated SQL to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Paging {
    /// 1-based page number
    #[arg(long)]
    page: Option<u64>,

    /// Rows per page
    #[arg(long = "pagesize")]
    page_size: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cubes
    Cubes,

    /// Print a cube's model description
    Model { cube: String },

    /// Aggregate cells, optionally drilled down
    Aggregate {
        cube: String,

        #[arg(long)]
        aggregates: Option<String>,

        #[arg(long)]
        drilldown: Option<String>,

        #[arg(long)]
        cut: Option<String>,

        #[arg(long)]
        order: Option<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// List individual facts
    Facts {
        cube: String,

        #[arg(long)]
        fields: Option<String>,

        #[arg(long)]
        cut: Option<String>,

        #[arg(long)]
        order: Option<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// List the distinct members of a dimension or attribute
    Members {
        cube: String,

        /// Dimension or attribute ref
        reference: String,

        #[arg(long)]
        cut: Option<String>,

        #[arg(long)]
        order: Option<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// Count the members of every dimension
    Cardinalities { cube: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            if err.is_query() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "babbage=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(cli: &Cli) -> BabbageResult<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    if let Some(db) = &cli.db {
        settings.database.path = db.clone();
    }
    if let Some(init) = &cli.init {
        settings.database.init_script = Some(init.display().to_string());
    }
    if let Some(models) = &cli.models {
        settings.catalog.directory = models.display().to_string();
    }
    Ok(settings)
}

fn open_catalog(settings: &Settings) -> BabbageResult<Box<dyn CubeCatalog>> {
    let dialect = settings.database.dialect_type()?;
    if dialect != Dialect::Sqlite {
        return Err(SettingsError::UnsupportedDialect(format!(
            "{dialect} (the bundled backend runs sqlite only)"
        ))
        .into());
    }

    let path = settings.database.resolved_path()?;
    let backend = if path == ":memory:" {
        SqliteBackend::open_in_memory()?
    } else {
        SqliteBackend::open(&path)?
    };
    if let Some(script) = settings.database.resolved_init_script()? {
        backend.execute_batch(&std::fs::read_to_string(script)?)?;
    }

    let catalog = JsonCubeCatalog::new(settings.catalog.resolved_directory()?, Arc::new(backend))
        .with_page_max(settings.query.page_max);
    Ok(if settings.catalog.cache {
        Box::new(CachingJsonCubeCatalog::new(catalog))
    } else {
        Box::new(catalog)
    })
}

fn print_json(value: &impl Serialize) -> BabbageResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| BabbageError::Backend(e.into()))?;
    println!("{text}");
    Ok(())
}

fn run(cli: Cli) -> BabbageResult<()> {
    let settings = load_settings(&cli)?;
    let catalog = open_catalog(&settings)?;

    match cli.command {
        Commands::Cubes => print_json(&catalog.list_cubes()?),
        Commands::Model { cube } => print_json(&catalog.get_cube_model(&cube)?.to_json()),
        Commands::Aggregate {
            cube,
            aggregates,
            drilldown,
            cut,
            order,
            paging,
        } => {
            let params = QueryParams {
                aggregates,
                drilldowns: drilldown,
                cuts: cut,
                order,
                page: paging.page,
                page_size: paging.page_size,
                ..QueryParams::default()
            };
            print_json(&catalog.get_cube(&cube)?.aggregate(&params)?)
        }
        Commands::Facts {
            cube,
            fields,
            cut,
            order,
            paging,
        } => {
            let params = QueryParams {
                fields,
                cuts: cut,
                order,
                page: paging.page,
                page_size: paging.page_size,
                ..QueryParams::default()
            };
            print_json(&catalog.get_cube(&cube)?.facts(&params)?)
        }
        Commands::Members {
            cube,
            reference,
            cut,
            order,
            paging,
        } => {
            let params = QueryParams {
                cuts: cut,
                order,
                page: paging.page,
                page_size: paging.page_size,
                ..QueryParams::default()
            };
            print_json(&catalog.get_cube(&cube)?.members(&reference, &params)?)
        }
        Commands::Cardinalities { cube } => cmd_cardinalities(catalog.as_ref(), &cube),
    }
}

#[derive(Serialize)]
struct CardinalityRow {
    dimension: String,
    cardinality: Option<u64>,
    class: Option<String>,
}

fn cmd_cardinalities(catalog: &dyn CubeCatalog, name: &str) -> BabbageResult<()> {
    let shared = catalog.get_cube(name)?;
    let mut cube = Cube::new(
        shared.name(),
        shared.model().clone(),
        shared.backend(),
    );
    cube.compute_cardinalities()?;

    let rows: Vec<CardinalityRow> = cube
        .model()
        .dimensions()
        .iter()
        .map(|d| CardinalityRow {
            dimension: d.name.clone(),
            cardinality: d.cardinality,
            class: d.cardinality_class().map(|c| c.to_string()),
        })
        .collect();
    print_json(&rows)
}
