use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use pairchat_client::config::is_missing_key;
use pairchat_client::{
    ChatClient, ClientConfig, ClientError, HttpMessageStore, MessageStore, WsNotificationSource,
};
use pairchat_crypto::Key;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

mod transcript;

use transcript::Transcript;

#[derive(Parser, Debug)]
#[command(
    name = "pairchat",
    version,
    about = "End-to-end encrypted two-party chat",
    long_about = None
)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and chat interactively
    Chat {
        /// Login password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Print a new random shared key for out-of-band provisioning
    Keygen,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pairchat=info,pairchat_client=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { password } => {
            let config = ClientConfig::load(cli.config.as_deref()).context("loading config")?;
            chat_command(config, password).await
        }
        Commands::Keygen => {
            println!("{}", Key::generate().export());
            Ok(())
        }
    }
}

async fn chat_command(config: ClientConfig, password: Option<String>) -> Result<()> {
    let key = match config.provision_key() {
        Ok(key) => key,
        Err(err) if is_missing_key(&err) => bail!(
            "no shared key configured; set PAIRCHAT_SHARED_KEY (see `pairchat keygen`) \
             or PAIRCHAT_SHARED_SECRET"
        ),
        Err(err) => return Err(err.into()),
    };
    let password = match password {
        Some(pw) => pw,
        None => prompt_password("Password: ")?,
    };

    let store = HttpMessageStore::new(&config.api_base_url)?;
    let login = store.login(&password).await.context("login request")?;
    let user = match (login.success, login.user) {
        (true, Some(user)) => user,
        _ => return Err(ClientError::LoginRejected(login.message).into()),
    };
    info!(%user, api = %config.api_base_url, "logged in");

    let store = Arc::new(store.with_token(login.token));
    let notifications = Arc::new(WsNotificationSource::new(&config.ws_base_url()));
    let client = ChatClient::new(user, key, store, notifications, config.sync_config());

    println!("Logged in as {user}. Messages go to {}.", user.peer());
    println!("Type and press enter to send; /clear wipes history; /quit exits.");
    client.start().await;

    let mut view = client.view();
    let mut connection = client.connection_state();
    let mut transcript = Transcript::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = view.borrow_and_update().clone();
                for line in transcript.update(&snapshot, user) {
                    println!("{line}");
                }
            }
            changed = connection.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *connection.borrow_and_update();
                println!("[{state}]");
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    "/quit" => break,
                    "/clear" => {
                        if let Err(err) = client.clear_history().await {
                            eprintln!("clear failed: {err}");
                        }
                    }
                    _ => {
                        if let Err(err) = client.send(&line).await {
                            eprintln!("send failed: {err}");
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    client.logout().await?;
    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String> {
    if let Ok(pw) = std::env::var("PAIRCHAT_PASSWORD") {
        if !pw.is_empty() {
            return Ok(pw);
        }
    }
    rpassword::prompt_password(prompt).map_err(|e| anyhow!("password prompt: {e}"))
}
