//! Gatehouse CLI - run the server and manage its accounts
//!
//! The `create-user` command is the only way to provision the first admin,
//! since the dashboard routes require one.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gatehouse_core::{
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    GatehouseConfig, GatehouseResult, Role,
};
use gatehouse_web::{database, AppState, GatehouseServer};
use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const PASSWORD_ENV: &str = "GATEHOUSE_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "gatehouse")]
#[command(about = "Session-based login gate with admin-only account provisioning")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the web server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// sqlx database URL, e.g. sqlite://gatehouse.db
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Create the database tables
    InitDb {
        /// sqlx database URL
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Create an account without going through the dashboard
    CreateUser {
        /// Username for the new account
        username: String,

        /// Password for the new account; visible to other local users, so
        /// prefer GATEHOUSE_PASSWORD or stdin
        #[arg(short, long)]
        password: Option<String>,

        /// Give the account the admin role
        #[arg(long)]
        admin: bool,

        /// sqlx database URL
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Where to write it; defaults to the user config directory
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, source) = load_config(cli.config.as_deref())?;

    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config = logging_config.verbose();
    }
    init_logging(&logging_config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting Gatehouse CLI v{}", env!("CARGO_PKG_VERSION"));
    match &source {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No configuration file found, using defaults"),
    }

    match cli.command {
        Commands::Serve {
            host,
            port,
            database_url,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            apply_database_url(&mut config, database_url);
            handle_serve(config).await?;
        }
        Commands::InitDb { database_url } => {
            apply_database_url(&mut config, database_url);
            handle_init_db(&config).await?;
        }
        Commands::CreateUser {
            username,
            password,
            admin,
            database_url,
        } => {
            apply_database_url(&mut config, database_url);
            let role = if admin { Role::Admin } else { Role::User };
            let password = resolve_password(
                password,
                |key| std::env::var(key).ok(),
                std::io::stdin().lock(),
            )?;
            handle_create_user(config, role, &username, &password).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => handle_config_init(path, force)?,
            ConfigAction::Show => handle_config_show(&config)?,
        },
    }

    Ok(())
}

/// Load from `--config`, else the first default location that exists, then
/// apply environment overrides
fn load_config(config_path: Option<&Path>) -> GatehouseResult<(GatehouseConfig, Option<PathBuf>)> {
    let source = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_paths().into_iter().find(|p| p.exists()),
    };

    let config = match &source {
        Some(path) => GatehouseConfig::from_file(path)?,
        None => GatehouseConfig::default(),
    };

    Ok((config.with_env_overrides()?, source))
}

fn default_config_paths() -> Vec<PathBuf> {
    [
        dirs::config_dir().map(|d| d.join("gatehouse").join("config.toml")),
        dirs::home_dir().map(|d| d.join(".gatehouse").join("config.toml")),
        Some(PathBuf::from("gatehouse.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Get the default configuration file path
fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|d| d.join(".config")))
        .map(|d| d.join("gatehouse").join("config.toml"))
}

fn apply_database_url(config: &mut GatehouseConfig, database_url: Option<String>) {
    if let Some(url) = database_url {
        config.database.url = url;
    }
}

async fn handle_serve(config: GatehouseConfig) -> anyhow::Result<()> {
    config.validate()?;

    let server = GatehouseServer::new(config)
        .await
        .context("Failed to initialize server")?;
    server.start().await?;
    Ok(())
}

async fn handle_init_db(config: &GatehouseConfig) -> anyhow::Result<()> {
    log_operation_start!("init_db", url = %config.database.url);

    let result = async {
        let pool = database::connect(&config.database).await?;
        database::init_schema(&pool).await?;
        pool.close().await;
        GatehouseResult::Ok(())
    }
    .await;

    if let Err(e) = result {
        log_operation_error!("init_db", e);
        return Err(e.into());
    }

    log_operation_success!("init_db");
    println!("✅ Database ready at {}", config.database.url);
    Ok(())
}

/// Password from the flag, then `GATEHOUSE_PASSWORD`, then one line of stdin
fn resolve_password<R: BufRead>(
    flag: Option<String>,
    env: impl Fn(&str) -> Option<String>,
    mut input: R,
) -> anyhow::Result<String> {
    if let Some(password) = flag.or_else(|| env(PASSWORD_ENV)) {
        return Ok(password);
    }

    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
        std::io::stderr().flush().ok();
    }

    let mut line = String::new();
    if input
        .read_line(&mut line)
        .context("Failed to read the password from stdin")?
        == 0
    {
        bail!("No password given; pass --password, set {PASSWORD_ENV} or pipe it on stdin");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn handle_create_user(
    config: GatehouseConfig,
    role: Role,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    log_operation_start!("create_user", role = %role);

    let state = AppState::new(config)
        .await
        .context("Failed to open the credential store")?;

    match state.accounts.provision(role, username, password).await {
        Ok(user) => {
            log_operation_success!("create_user", user_id = %user.id);
            println!("✅ Created {} '{}' (id {})", role, user.username, user.id);
            Ok(())
        }
        Err(e) => {
            log_operation_error!("create_user", e);
            match e.user_message() {
                Some(message) => bail!(message),
                None => Err(e.into()),
            }
        }
    }
}

fn handle_config_init(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path.or_else(get_config_path) {
        Some(path) => path,
        None => bail!("Could not determine a configuration directory; pass a path"),
    };

    if path.exists() && !force {
        bail!(
            "Configuration already exists at {:?}; use --force to overwrite",
            path
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    GatehouseConfig::default().save_to_file(&path)?;
    println!("✅ Configuration initialized at: {:?}", path);
    Ok(())
}

fn handle_config_show(config: &GatehouseConfig) -> anyhow::Result<()> {
    println!("📋 Current configuration:");
    println!("{}", config.to_toml()?);
    Ok(())
}
