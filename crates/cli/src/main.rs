//! Watchpost CLI - Database migrations and operator management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! watchpost migrate
//!
//! # Seed the bootstrap admin into an empty store
//! watchpost bootstrap
//!
//! # Manage operators
//! watchpost user create -e guard@example.com
//! watchpost user create -e chief@example.com --admin
//! watchpost user list
//! watchpost user delete 4
//!
//! # Raise an alert as the detection producer would
//! watchpost alert raise --camera 3 --person 12
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use watchpost_core::{CameraId, PersonId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "watchpost")]
#[command(author, version, about = "Watchpost CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create the bootstrap admin if no users exist
    Bootstrap,
    /// Manage operator accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Producer-side alert tools
    Alert {
        #[command(subcommand)]
        action: AlertAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new operator
    Create {
        /// Operator email address
        #[arg(short, long)]
        email: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List operators, newest first
    List,
    /// Delete an operator by ID
    Delete {
        /// Operator ID
        id: UserId,
    },
}

#[derive(Subcommand)]
enum AlertAction {
    /// Raise a new alert
    Raise {
        /// Camera that saw the event
        #[arg(short, long)]
        camera: CameraId,

        /// Person recognized, if any
        #[arg(short, long)]
        person: Option<PersonId>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Bootstrap => commands::bootstrap::run().await?,
        Commands::User { action } => match action {
            UserAction::Create { email, admin } => {
                commands::user::create(&email, admin).await?;
            }
            UserAction::List => commands::user::list().await?,
            UserAction::Delete { id } => commands::user::delete(id).await?,
        },
        Commands::Alert { action } => match action {
            AlertAction::Raise { camera, person } => {
                commands::alert::raise(camera, person).await?;
            }
        },
    }
    Ok(())
}
