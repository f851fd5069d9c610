use clap::{Parser, Subcommand};
use tracing::warn;

use yatube_server::data::memory::InMemoryStore;
use yatube_server::admin::GroupAdmin;
use yatube_server::domain::group::NewGroup;
use yatube_server::infrastructure::config::AppConfig;
use yatube_server::infrastructure::database::{create_pool, run_migrations};
use yatube_server::infrastructure::logging::init_logging;
use yatube_server::infrastructure::security::JwtKeys;
use yatube_server::utils::start_server;
use yatube_server::{Repositories, Services};

#[derive(Parser, Debug)]
#[command(name = "yatube-server", version, about = "Yatube blog server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create a community group.
    CreateGroup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a group; its posts stay, without a group.
    DeleteGroup {
        #[arg(long)]
        slug: String,
    },
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let persistent = config.database_url.is_some();
    let repos = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url).await?;
            run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL is not set, data lives in memory only");
            Repositories::in_memory(InMemoryStore::new())
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let keys = JwtKeys::new(config.jwt_secret.clone(), config.session_ttl_hours);
            let services = Services::new(repos, keys, config.feed_cache_ttl());
            start_server(config, services).await
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            GroupAdmin::new(repos, persistent)?
                .create_group(NewGroup {
                    title,
                    slug,
                    description,
                })
                .await?;
            Ok(())
        }
        Command::DeleteGroup { slug } => {
            GroupAdmin::new(repos, persistent)?
                .delete_group(&slug)
                .await
        }
    }
}
