mod account_commands;
mod app;
mod friend_commands;
mod member_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {app::App, ztool_config::ZtoolConfig};

#[derive(Parser)]
#[command(name = "ztool", about = "ZTOOL — Zalo account automation console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the config
    /// file's `log.level`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Explicit config file (overrides discovery).
    #[arg(long, global = true, env = "ZTOOL_CONFIG")]
    config: Option<PathBuf>,

    /// Custom data directory (overrides config value).
    #[arg(long, global = true, env = "ZTOOL_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the ZTOOL backend and import linked Zalo accounts.
    Login {
        /// Account phone number.
        #[arg(long)]
        phone: String,
        /// Account password.
        #[arg(long)]
        pass: String,
    },
    /// Clear local credentials and linked accounts.
    Logout,
    /// Link a new Zalo account by scanning a QR code.
    Link {
        /// Where to write the QR image (default: <data dir>/qr.png).
        #[arg(long)]
        qr_path: Option<PathBuf>,
    },
    /// Linked Zalo account management.
    Accounts {
        #[command(subcommand)]
        action: account_commands::AccountAction,
    },
    /// Show the operator's profile and point balance.
    Member,
    /// Show the per-action point price list.
    Points,
    /// Bulk friend-adding.
    Friends {
        #[command(subcommand)]
        action: FriendAction,
    },
}

#[derive(Subcommand)]
enum FriendAction {
    /// Send friend requests to every number in a file (one per line).
    Add {
        /// Invite message; Vietnamese tones are stripped before sending.
        #[arg(short, long)]
        message: String,
        /// File with one phone number per line.
        #[arg(long)]
        phones_file: PathBuf,
    },
}

/// Level precedence: `RUST_LOG` env, then `--log-level`, then the config
/// file's `log.level`.
fn effective_log_level<'a>(cli: &'a Cli, config: &'a ZtoolConfig) -> &'a str {
    cli.log_level.as_deref().unwrap_or(&config.log.level)
}

fn init_telemetry(cli: &Cli, config: &ZtoolConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(effective_log_level(cli, config)));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ZtoolConfig> {
    let mut config = match &cli.config {
        Some(path) => ztool_config::load_config(path)?,
        None => ztool_config::discover_and_load(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    // Config is loaded before telemetry so the file's log level can apply.
    let config = load_config(&cli)?;
    init_telemetry(&cli, &config);

    info!(version = env!("CARGO_PKG_VERSION"), "ztool starting");

    let app = App::bootstrap(config)?;

    match cli.command {
        Commands::Login { phone, pass } => member_commands::login(&app, &phone, &pass).await,
        Commands::Logout => member_commands::logout(&app),
        Commands::Link { qr_path } => account_commands::link(&app, qr_path).await,
        Commands::Accounts { action } => account_commands::handle_accounts(&app, action).await,
        Commands::Member => member_commands::info(&app).await,
        Commands::Points => member_commands::points(&app).await,
        Commands::Friends {
            action: FriendAction::Add {
                message,
                phones_file,
            },
        } => friend_commands::add_friends(&app, &message, phones_file).await,
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_flag_overrides_config() {
        let cli = Cli::parse_from(["ztool", "--log-level", "trace", "member"]);
        let mut config = ZtoolConfig::default();
        config.log.level = "debug".into();
        assert_eq!(effective_log_level(&cli, &config), "trace");
    }

    #[test]
    fn config_log_level_applies_without_the_flag() {
        let cli = Cli::parse_from(["ztool", "member"]);
        let mut config = ZtoolConfig::default();
        config.log.level = "debug".into();
        assert_eq!(effective_log_level(&cli, &config), "debug");
    }
}
