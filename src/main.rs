use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use unzip_bot::api::webhooks::telegram::webhook_url;
use unzip_bot::{ApiServer, ApiState, Config, TelegramChannel, UpdateHandler};

/// Unzip Bot - returns the document found inside ZIP archives sent on Telegram
#[derive(Parser)]
#[command(name = "unzip-bot", version, about)]
struct Cli {
    /// Port to listen on (overrides config file and `PORT`)
    #[arg(long, env = "UNZIP_BOT_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long, env = "UNZIP_BOT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook server (default)
    Serve,
    /// Register the webhook with Telegram
    SetWebhook {
        /// Public base URL the bot is reachable at, e.g. `https://bot.example.com`
        #[arg(long, env = "UNZIP_BOT_PUBLIC_URL")]
        url: String,
    },
    /// Remove the registered webhook
    DeleteWebhook,
    /// Validate configuration and the bot token
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,unzip_bot=info",
        1 => "info,unzip_bot=debug",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG wins over -v
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref(), cli.port)?;
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::SetWebhook { url } => set_webhook(&config, &url).await,
        Command::DeleteWebhook => {
            TelegramChannel::new(&config.telegram)?.delete_webhook().await?;
            println!("Webhook deleted");
            Ok(())
        }
        Command::Check => check(&config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        port = config.server.port,
        extension = %config.extract.target_extension,
        max_file_size = config.extract.max_file_size,
        selection = %config.extract.selection,
        "starting unzip bot"
    );

    let channel = TelegramChannel::new(&config.telegram)?;
    let handler = UpdateHandler::new(Arc::new(channel), config.extract);

    let state = Arc::new(ApiState {
        handler: Arc::new(handler),
        path_secret: config.telegram.path_secret,
        webhook_secret: config.telegram.webhook_secret,
    });

    ApiServer::new(state, config.server.port).run().await?;
    Ok(())
}

async fn set_webhook(config: &Config, base: &str) -> anyhow::Result<()> {
    let url = webhook_url(base, config.telegram.path_secret.expose_secret())?;
    let channel = TelegramChannel::new(&config.telegram)?;

    channel
        .set_webhook(
            url.as_str(),
            config
                .telegram
                .webhook_secret
                .as_ref()
                .map(|s| s.expose_secret()),
        )
        .await?;

    // Path secret stays out of the output
    println!("Webhook registered at {base}/webhook/<secret>");
    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let channel = TelegramChannel::new(&config.telegram)?;
    let username = channel.get_me().await?;

    println!("Configuration OK");
    match username {
        Some(name) => println!("  bot:        @{name}"),
        None => println!("  bot:        (no username)"),
    }
    println!("  api base:   {}", config.telegram.api_base);
    println!("  port:       {}", config.server.port);
    println!("  extension:  .{}", config.extract.target_extension);
    println!("  max size:   {} bytes", config.extract.max_file_size);
    println!("  selection:  {}", config.extract.selection);
    println!(
        "  captions:   {}",
        if config.extract.metadata_caption {
            "from FB2 metadata"
        } else {
            "fixed"
        }
    );
    println!(
        "  header secret: {}",
        if config.telegram.webhook_secret.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
    Ok(())
}
