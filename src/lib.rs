pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod matching;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
pub use config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: env filter, plain or JSON fmt output and
/// optionally a Loki shipper.
///
/// `RUST_LOG` wins over `general.log_level`. Must run inside a tokio runtime
/// when Loki is enabled since the shipping task is spawned here.
pub fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let json = config.general.log_json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let fmt_layer = (!json).then(tracing_subscriber::fmt::layer);

    let loki_layer = if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);
        Some(layer)
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(fmt_layer)
        .with(loki_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if config.observability.loki_enabled {
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    }

    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;
    init_tracing(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Add {
            name,
            no_books,
            refresh,
        } => cli::cmd_add_author(&config, &name.join(" "), !no_books, refresh).await,
        Commands::AddId { id, no_books } => cli::cmd_add_author_id(&config, &id, !no_books).await,
        Commands::Refresh { id } => cli::cmd_refresh_author(&config, &id).await,
        Commands::ImportBook { id } => cli::cmd_import_book(&config, &id).await,
        Commands::Search { term } => cli::cmd_search_books(&config, &term.join(" ")).await,
        Commands::Totals { id } => cli::cmd_totals(&config, &id).await,
        Commands::List => cli::cmd_list_authors(&config).await,
        Commands::Init => Ok(()),
    }
}
