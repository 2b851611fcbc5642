mod cli;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jean_memory::config::JeanConfig;
use jean_memory::store::ContextStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jean", version, about = "Personal context memory for AI assistants")]
struct Cli {
    /// Config file (defaults to ~/.jean/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Credential issued by `jean user`
    #[arg(long, global = true, env = "JEAN_API_KEY", hide_env_values = true)]
    credential: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and apply migrations
    Init,
    /// Create (or look up) a user and print their credential
    User {
        /// Stable external identity, e.g. an OAuth subject
        #[arg(long)]
        external_id: String,
        #[arg(long)]
        email: Option<String>,
        /// Tenant to create the user in (defaults to storage.default_tenant)
        #[arg(long)]
        tenant: Option<String>,
    },
    /// Show the user the credential resolves to
    Whoami,
    /// Store or replace a context entry
    Store {
        #[arg(long)]
        category: String,
        /// JSON content; anything that is not JSON is stored as {"text": ...}
        content: String,
        /// Source key within the category (generated when omitted)
        #[arg(long)]
        source: Option<String>,
        /// JSON metadata
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List entries in a category, most recent first
    Get {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        source: Option<String>,
        /// Fetch a single entry by id
        #[arg(long)]
        id: Option<i64>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Case-insensitive substring search within a category
    Search {
        #[arg(long)]
        category: String,
        text: String,
        #[arg(long, default_value_t = jean_memory::memory::search::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Route a question through classification and retrieval
    Query {
        query: String,
        /// Skip classification and ask this category directly. Repeat to merge several
        #[arg(long)]
        category: Vec<String>,
        /// Print the routed result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete context entries
    Forget {
        #[command(flatten)]
        target: ForgetTarget,
    },
    /// Show entry counts per category
    Stats,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ForgetTarget {
    /// Delete one entry
    #[arg(long)]
    id: Option<i64>,
    /// Delete every entry in a category
    #[arg(long)]
    category: Option<String>,
    /// Delete all of the user's entries
    #[arg(long)]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JeanConfig::load_from(path)?,
        None => JeanConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let db_path = config.resolved_db_path();
    let store = Arc::new(
        ContextStore::open(&config.storage)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );

    let outcome = run(cli.command, cli.credential.as_deref(), &config, store.clone()).await;
    store.close();
    outcome
}

async fn run(
    command: Command,
    credential: Option<&str>,
    config: &JeanConfig,
    store: Arc<ContextStore>,
) -> Result<()> {
    match command {
        Command::Init => cli::init(config, &store).await,
        Command::User {
            external_id,
            email,
            tenant,
        } => {
            let tenant = tenant.unwrap_or_else(|| config.storage.default_tenant.clone());
            cli::user::issue(&store, &tenant, &external_id, email.as_deref()).await
        }
        Command::Whoami => {
            let principal = cli::authenticate(&store, credential).await?;
            cli::user::whoami(&store, &principal).await
        }
        Command::Store {
            category,
            content,
            source,
            metadata,
        } => {
            let principal = cli::authenticate(&store, credential).await?;
            cli::entries::store(
                &store,
                &principal,
                &category,
                &content,
                source.as_deref(),
                metadata.as_deref(),
            )
            .await
        }
        Command::Get {
            category,
            source,
            id,
            limit,
        } => {
            let principal = cli::authenticate(&store, credential).await?;
            match (id, category) {
                (Some(id), _) => cli::entries::get_by_id(&store, &principal, id).await,
                (None, Some(category)) => {
                    cli::entries::get(&store, &principal, &category, source.as_deref(), limit).await
                }
                (None, None) => anyhow::bail!("pass --category or --id"),
            }
        }
        Command::Search {
            category,
            text,
            limit,
        } => {
            let principal = cli::authenticate(&store, credential).await?;
            cli::entries::search(&store, &principal, &category, &text, limit).await
        }
        Command::Query {
            query,
            category,
            json,
        } => {
            let principal = cli::authenticate(&store, credential).await?;
            let banks: Vec<&str> = category.iter().map(String::as_str).collect();
            cli::query::query(config, store.clone(), &principal, &query, &banks, json).await
        }
        Command::Forget { target } => {
            let principal = cli::authenticate(&store, credential).await?;
            if let Some(id) = target.id {
                cli::entries::forget_id(&store, &principal, id).await
            } else if let Some(category) = target.category {
                cli::entries::forget_category(&store, &principal, &category).await
            } else {
                cli::entries::forget_all(&store, &principal).await
            }
        }
        Command::Stats => {
            let principal = cli::authenticate(&store, credential).await?;
            cli::stats::stats(&store, &principal).await
        }
    }
}
