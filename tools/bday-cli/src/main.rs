//! bday-cli: terminal client for birthday invite events.
//!
//! Talks to the invite program through a JSON-RPC node with the same access
//! as any wallet front end.
//!
//! ## Usage
//!
//! ```bash
//! # List events
//! bday-cli events
//!
//! # Create an event with a specific keypair on localnet
//! bday-cli --rpc-url http://127.0.0.1:8899 --keypair ./id.json create --name "Alice's 30th" --date 2099-01-01
//!
//! # RSVP to someone else's event
//! bday-cli rsvp --name "Bob's bash" --creator <BASE58> --coming
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, Subcommand};

use bday_invite::algorithms::{
    explorer_link, format_date, format_time, parse_identity, truncate_address,
};
use bday_invite::{
    BirthdayEvent, FeatureService, InviteConfig, InviteFeatureApi, KeypairSigner, LocalWallet,
    OperationResult, Pubkey, RpcLedgerGateway, TransactionSigner,
};
use bday_telemetry::{init_telemetry, log_event, TelemetryConfig};

/// Birthday invite terminal client
#[derive(Parser, Debug)]
#[command(name = "bday-cli")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-RPC endpoint URL (default: BDAY_RPC_URL or devnet)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Invite program id (default: BDAY_PROGRAM_ID)
    #[arg(long)]
    program_id: Option<String>,

    /// Keypair file, a JSON array of 64 bytes (default: ~/.config/solana/id.json)
    #[arg(long)]
    keypair: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all events
    Events,

    /// Show the comments of an event
    Comments {
        /// Event name
        #[arg(long)]
        name: String,
        /// Event creator (default: your own key)
        #[arg(long)]
        creator: Option<String>,
    },

    /// Create an event owned by your key
    Create {
        /// Event name, 1-32 characters
        #[arg(long)]
        name: String,
        /// Event date, YYYY-MM-DD
        #[arg(long)]
        date: String,
    },

    /// Answer an invitation
    #[command(group(ArgGroup::new("answer").required(true).args(["coming", "busy"])))]
    Rsvp {
        /// Event name
        #[arg(long)]
        name: String,
        /// Event creator (default: your own key)
        #[arg(long)]
        creator: Option<String>,
        /// Confirm attendance
        #[arg(long)]
        coming: bool,
        /// Decline attendance
        #[arg(long)]
        busy: bool,
    },

    /// Comment on an event
    Comment {
        /// Event name
        #[arg(long)]
        name: String,
        /// Event creator (default: your own key)
        #[arg(long)]
        creator: Option<String>,
        /// Comment text, 1-500 characters
        #[arg(long)]
        text: String,
    },

    /// Keep the event list up to date until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _telemetry = init_telemetry(TelemetryConfig::for_component("cli"))
        .context("initializing telemetry")?;

    let mut config = InviteConfig::from_env();
    if let Some(url) = args.rpc_url {
        config.rpc_url = url;
    }
    if let Some(program_id) = args.program_id {
        config.program_id = program_id;
    }

    let keypair_path = match args.keypair {
        Some(path) => path,
        None => default_keypair_path()?,
    };
    let signer = Arc::new(
        KeypairSigner::from_json_file(&keypair_path)
            .with_context(|| format!("loading keypair {}", keypair_path.display()))?,
    );
    let identity = signer.pubkey();
    log_event!(info, "cli", "Using identity", identity = %identity, rpc_url = %config.rpc_url);

    let gateway = Arc::new(RpcLedgerGateway::new(&config)?);
    let wallet = Arc::new(LocalWallet::connected(signer));
    let feature = Arc::new(FeatureService::new(gateway, wallet, &config));

    match args.command {
        Command::Events => {
            feature.on_connection_ready().await;
            fail_on_error(&*feature)?;
            print_events(&feature.events());
        }
        Command::Comments { name, creator } => {
            let event = find_event(&*feature, &name, creator.as_deref(), &identity).await?;
            feature.select_event(Some(event)).await;
            fail_on_error(&*feature)?;
            let comments = feature.event_comments();
            if comments.is_empty() {
                println!("No comments yet.");
            }
            for comment in comments {
                println!(
                    "#{:<3} {}  {}  {}",
                    comment.id,
                    format_time(&comment.observed_at),
                    truncate_address(&comment.author.to_string()),
                    comment.text
                );
            }
        }
        Command::Create { name, date } => {
            let result = feature.handle_create_event(&name, &date).await;
            report(result, &config.cluster)?;
        }
        Command::Rsvp {
            name,
            creator,
            coming,
            busy: _,
        } => {
            let event = find_event(&*feature, &name, creator.as_deref(), &identity).await?;
            let result = if coming {
                feature.handle_confirm_attendance(&event).await
            } else {
                feature.handle_decline_attendance(&event).await
            };
            report(result, &config.cluster)?;
        }
        Command::Comment {
            name,
            creator,
            text,
        } => {
            let event = find_event(&*feature, &name, creator.as_deref(), &identity).await?;
            let result = feature.handle_add_comment(&event, &text).await;
            report(result, &config.cluster)?;
        }
        Command::Watch => watch(feature).await?,
    }

    Ok(())
}

fn default_keypair_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set; pass --keypair")?;
    Ok(PathBuf::from(home).join(".config/solana/id.json"))
}

fn fail_on_error(feature: &dyn InviteFeatureApi) -> Result<()> {
    match feature.error() {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

async fn find_event(
    feature: &dyn InviteFeatureApi,
    name: &str,
    creator: Option<&str>,
    identity: &Pubkey,
) -> Result<BirthdayEvent> {
    let creator = match creator {
        Some(text) => parse_identity("creator", text)?,
        None => *identity,
    };
    feature.refresh_data().await;
    fail_on_error(feature)?;
    feature
        .events()
        .into_iter()
        .find(|e| e.name == name && e.creator == creator)
        .with_context(|| {
            format!(
                "no event {:?} by {}",
                name,
                truncate_address(&creator.to_string())
            )
        })
}

fn report(result: OperationResult, cluster: &str) -> Result<()> {
    match (result.success, result.tx_hash) {
        (true, Some(tx)) => {
            println!("Done: {}", explorer_link(&tx, cluster));
            Ok(())
        }
        (true, None) => Ok(()),
        (false, tx) => {
            if let Some(tx) = tx {
                eprintln!("Submitted but not confirmed: {}", explorer_link(&tx, cluster));
            }
            bail!(result.error.unwrap_or_else(|| "operation failed".to_string()))
        }
    }
}

fn print_events(events: &[BirthdayEvent]) {
    if events.is_empty() {
        println!("No events.");
        return;
    }
    for event in events {
        let date = event
            .date()
            .map(|d| format_date(&d))
            .unwrap_or_else(|| event.date_seconds.to_string());
        println!(
            "{:<32}  {:<18}  coming {:<4} busy {:<4} comments {:<4} by {}",
            event.name,
            date,
            event.coming,
            event.busy,
            event.total_comments,
            truncate_address(&event.creator.to_string()),
        );
    }
}

async fn watch(feature: Arc<FeatureService<RpcLedgerGateway>>) -> Result<()> {
    feature.on_connection_ready().await;
    let mut shown = feature.events();
    print_events(&shown);

    let poller = Arc::clone(&feature).spawn_polling();
    let mut check = tokio::time::interval(Duration::from_secs(1));
    check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = check.tick() => {
                let current = feature.events();
                if current != shown {
                    println!();
                    print_events(&current);
                    shown = current;
                }
                if let Some(message) = feature.error() {
                    log_event!(warn, "cli", "Refresh failed", error = %message);
                    feature.clear_error();
                }
            }
        }
    }

    poller.abort();
    Ok(())
}
