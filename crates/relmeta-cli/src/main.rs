//! relmeta command-line schema compiler.
//!
//! Reads a JSON schema description and prints DDL, a relation summary, or
//! a query plan.

mod commands;
mod dialect;

use clap::{Parser, Subcommand};
use commands::{CliResult, PlanRequest};
use dialect::Dialect;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// relmeta schema compiler
#[derive(Parser, Debug)]
#[command(name = "relmeta")]
#[command(version, about = "Compile relation schema descriptions into DDL and query plans")]
pub struct Args {
    /// Schema description file (JSON)
    #[arg(short, long, default_value = "schema.json")]
    schema: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print CREATE TABLE and ALTER TABLE statements
    Ddl {
        /// Identifier quoting dialect
        #[arg(short, long, value_enum, default_value_t = Dialect::Mysql)]
        dialect: Dialect,

        /// Only these entity types and the relations they reference
        #[arg(short, long)]
        entity: Vec<String>,
    },

    /// Summarize relations, keys and foreign keys
    Describe,

    /// Print the query plan for an entity type as JSON
    Plan {
        /// Entity type to query
        entity: String,

        /// Join a referenced or referencing entity type
        #[arg(short, long)]
        reference: Vec<String>,

        /// Join a child relation by path, e.g. `lines.notes`
        #[arg(short, long)]
        child: Vec<String>,

        /// Equality filter on the source relation, `attribute=value`
        #[arg(short = 'w', long = "where")]
        filter: Vec<String>,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("relmeta=info,relmeta_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> CliResult<()> {
    let description = commands::load(&args.schema)?;
    match args.command {
        Command::Ddl { dialect, entity } => {
            for statement in commands::ddl(&description, dialect, &entity)? {
                println!("{};", statement);
            }
        }
        Command::Describe => print!("{}", commands::describe(&description)?),
        Command::Plan {
            entity,
            reference,
            child,
            filter,
        } => {
            let request = PlanRequest {
                entity,
                references: reference,
                children: child,
                filters: filter,
            };
            println!("{}", commands::plan(&description, &request)?);
        }
    }
    Ok(())
}
