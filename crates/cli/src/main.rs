//! Karya CLI - database migrations and reference data.
//!
//! # Usage
//!
//! ```bash
//! # Create the store schema and the session table
//! karya-cli migrate
//!
//! # Load provinces and cities
//! karya-cli seed regions data/regions.yaml
//!
//! # ...or fetch them from RajaOngkir
//! karya-cli seed rajaongkir
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "karya-cli")]
#[command(author, version, about = "Karya storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load reference data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert provinces and cities from a YAML file
    Regions {
        /// Path to the YAML file
        file: String,
    },
    /// Upsert provinces and cities fetched from the RajaOngkir API
    Rajaongkir,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Regions { file } => commands::seed::regions(&file).await?,
            SeedTarget::Rajaongkir => commands::seed::rajaongkir().await?,
        },
    }
    Ok(())
}
