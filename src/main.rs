mod commands;
mod gateway;

use clap::{Parser, Subcommand};
use commands::{Command, CommandContext, Reply};
use questlog_channels::telegram::TelegramChannel;
use questlog_core::{
    config::{self, shellexpand, Config},
    pager::Paginator,
    traits::Channel,
};
use questlog_store::Store;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "questlog",
    version,
    about = "Questlog: challenge tracking for group chats"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on every enabled channel.
    Start,
    /// Show configuration and database health.
    Status,
    /// Run a single bot command locally and print the reply.
    Run {
        /// User id the command runs as.
        #[arg(short, long, default_value = "local")]
        user: String,
        /// Display name for that user.
        #[arg(short, long)]
        name: Option<String>,
        /// The command text, e.g. `/complete Plank`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    // Logging needs the config, so the load is reported once it is up.
    let _guard = init_tracing(&cfg, matches!(cli.command, Commands::Start));
    match cfg.loaded_from {
        Some(ref path) => info!("loaded config from {}", path.display()),
        None => info!("Config file not found at {}, using defaults", cli.config),
    }

    match cli.command {
        Commands::Start => start(cfg).await?,
        Commands::Status => status(&cli.config, &cfg).await?,
        Commands::Run { user, name, text } => {
            if text.is_empty() {
                anyhow::bail!("no command provided. Usage: questlog run /all_challenges");
            }
            run_once(&cfg, &user, name.as_deref(), &text.join(" ")).await?;
        }
    }

    Ok(())
}

/// Console logging, plus a daily log file under `data_dir/logs` when `to_file`.
///
/// `RUST_LOG` wins over `questlog.log_level`.
fn init_tracing(cfg: &Config, to_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.questlog.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if !to_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .init();
        return None;
    }

    let log_dir = PathBuf::from(shellexpand(&cfg.questlog.data_dir)).join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let (file, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "questlog.log"));
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();

    if let Some(ref tg) = cfg.channel.telegram {
        if tg.enabled {
            if tg.bot_token.is_empty() {
                anyhow::bail!(
                    "Telegram is enabled but bot_token is empty. \
                     Set it in config.toml or the {} env var.",
                    config::TELEGRAM_TOKEN_ENV
                );
            }
            let channel = TelegramChannel::new(tg.clone());
            channels.insert("telegram".to_string(), Arc::new(channel));
        }
    }

    if channels.is_empty() {
        anyhow::bail!("No channels enabled. Enable at least one channel in config.toml.");
    }

    let store = Store::new(&cfg.store).await?;

    println!("{}: starting bot...", cfg.questlog.name);
    let gw = gateway::Gateway::new(channels, store, cfg.pager.clone(), cfg.search.clone());
    Arc::new(gw).run().await
}

async fn status(path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("{}: status\n", cfg.questlog.name);
    println!("Config: {path}");
    println!("Database: {}", shellexpand(&cfg.store.db_path));
    println!(
        "Pager: {} rows/page, {}s idle timeout, {:?}",
        cfg.pager.page_size, cfg.pager.idle_timeout_secs, cfg.pager.policy
    );
    println!();

    match cfg.channel.telegram {
        Some(ref tg) => println!(
            "  telegram: {}",
            if tg.enabled && !tg.bot_token.is_empty() {
                "configured"
            } else if tg.enabled {
                "enabled but missing bot_token"
            } else {
                "disabled"
            }
        ),
        None => println!("  telegram: not configured"),
    }

    let store = Store::new(&cfg.store).await?;
    println!("  database size: {} bytes", store.db_size().await?);
    println!("  challenges: {}", store.challenge_count().await?);
    Ok(())
}

/// Execute one command against the store and print every page of the reply.
async fn run_once(cfg: &Config, user: &str, name: Option<&str>, text: &str) -> anyhow::Result<()> {
    let Some(cmd) = Command::parse(text) else {
        anyhow::bail!("not a known command: {text}");
    };

    let store = Store::new(&cfg.store).await?;
    let sender_name = name.unwrap_or(user);
    store.remember_member(user, sender_name, None).await?;

    let ctx = CommandContext {
        store: &store,
        sender_id: user,
        sender_name,
        is_admin: true,
        text,
        search: &cfg.search,
    };

    let mut paged = match commands::handle(cmd, &ctx).await {
        Reply::Text(text) => {
            println!("{text}");
            return Ok(());
        }
        Reply::Pages(paged) => paged,
    };

    let page_size = NonZeroUsize::new(cfg.pager.page_size).unwrap_or(NonZeroUsize::MIN);
    let rows = std::mem::take(&mut paged.rows);
    let Some(mut paginator) = Paginator::new(rows, page_size, cfg.pager.policy) else {
        println!("{}", paged.empty);
        return Ok(());
    };

    for i in 0..paginator.total_pages() {
        if i > 0 {
            println!("\n---\n");
        }
        println!("{}", paged.render(&paginator.current_page()));
        paginator.next();
    }
    Ok(())
}
