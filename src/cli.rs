//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::credentials::{CredentialStore, PasswordService};
use crate::domain::error::TodosError;
use crate::domain::settings::{SECRET_KEY_LEN, ServerSettings};
use crate::ports::todo_port::TodoPort;

#[derive(Parser, Debug)]
#[command(name = "todos", about = "Multi-user to-do list server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server
    Serve {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the database tables
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create a user; the password is read from stdin
    CreateUser {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        username: String,
    },
    /// Print a random value for `[auth] secret_key`
    GenerateSecret,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Serve { config } => run_serve(&config),
        Command::InitDb { config } => run_init_db(&config),
        Command::CreateUser { config, username } => run_create_user(&config, &username),
        Command::GenerateSecret => {
            println!("{}", generate_secret());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TodosError> {
    FileConfigAdapter::from_file(path)
}

/// `RUST_LOG` wins; otherwise `debug` in debug mode and `info` elsewhere.
pub fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn generate_secret() -> String {
    use rand::RngCore;

    let mut bytes = [0u8; SECRET_KEY_LEN];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, serde::Deserialize)]
struct SeedTodo {
    name: String,
}

/// Loads todo names from a JSON array of `{"name": ...}` objects.
pub fn read_seed_file(path: &Path) -> Result<Vec<String>, TodosError> {
    let content = fs::read_to_string(path)?;
    let todos: Vec<SeedTodo> =
        serde_json::from_str(&content).map_err(|e| TodosError::ConfigInvalid {
            section: "data".into(),
            key: "seed_file".into(),
            reason: format!("{}: {e}", path.display()),
        })?;
    Ok(todos.into_iter().map(|t| t.name).collect())
}

/// Seeds only an empty todos table.
pub fn seed_if_empty(store: &SqliteAdapter, seed_file: &Path) -> Result<usize, TodosError> {
    if store.count_todos()? > 0 {
        return Ok(0);
    }
    let names = read_seed_file(seed_file)?;
    store.seed_todos(&names)
}

fn open_store(config: &FileConfigAdapter) -> Result<Arc<SqliteAdapter>, TodosError> {
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Arc::new(store))
}

fn run_serve(config_path: &Path) -> Result<(), TodosError> {
    use crate::adapters::web::{AppState, build_router};

    let config = load_config(config_path)?;
    let settings = ServerSettings::from_config(&config)?;
    init_tracing(settings.debug);
    tracing::info!(config = %config_path.display(), "configuration loaded");

    let store = open_store(&config)?;
    if let Some(seed_file) = &settings.seed_file {
        let seeded = seed_if_empty(&store, Path::new(seed_file))?;
        if seeded > 0 {
            tracing::info!(count = seeded, file = %seed_file, "seeded todos");
        }
    }

    let state = AppState::new(store, &config)?;
    let addr = settings.listen_addr();

    tokio::runtime::Runtime::new()?.block_on(async {
        let router = build_router(state).await?;
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(%addr, debug = settings.debug, "listening");
        axum::serve(listener, router).await?;
        Ok::<(), TodosError>(())
    })
}

fn run_init_db(config_path: &Path) -> Result<(), TodosError> {
    let config = load_config(config_path)?;
    init_tracing(false);
    open_store(&config)?;
    tracing::info!("database schema ready");
    Ok(())
}

fn run_create_user(config_path: &Path, username: &str) -> Result<(), TodosError> {
    let config = load_config(config_path)?;
    init_tracing(false);
    let store = open_store(&config)?;
    let credentials = CredentialStore::new(store, PasswordService::from_config(&config)?)?;

    eprintln!("Enter password for {username}:");
    let password = io::stdin().lock().lines().next().transpose()?.unwrap_or_default();
    if password.is_empty() {
        return Err(TodosError::PasswordHash {
            reason: "empty password".into(),
        });
    }

    let user = credentials.create_user(username, &password)?;
    println!("created user {} (id {})", user.username, user.id);
    Ok(())
}
