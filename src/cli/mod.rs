use clap::{Parser, Subcommand};

use crate::database::manager;
use crate::database::models::Location;
use crate::services::users::UserService;

#[derive(Parser)]
#[command(name = "civiclink")]
#[command(about = "CivicLink - citizen complaint and engagement backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server (default)")]
    Serve,

    #[command(about = "Seed the initial super admin on an empty system")]
    Bootstrap {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        province: String,

        #[arg(long, default_value = "")]
        district: String,

        #[arg(long, default_value = "")]
        sector: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => crate::server::serve().await,
        Commands::Bootstrap {
            name,
            email,
            password,
            province,
            district,
            sector,
        } => bootstrap(name, email, password, Location::new(province, district, sector)).await,
    }
}

/// Elevated accounts are never created through the public registration
/// endpoint; the first super admin is seeded here, and further admins are
/// promoted by higher-ranked ones over the API.
async fn bootstrap(
    name: String,
    email: String,
    password: String,
    location: Location,
) -> anyhow::Result<()> {
    let pool = manager::connect().await?;
    manager::migrate(&pool).await?;

    let service = UserService::new(pool);
    let user = service
        .bootstrap_super_admin(&name, &email, &password, location)
        .await?;

    println!("Created super admin {} <{}> ({})", user.name, user.email, user.id);
    Ok(())
}
