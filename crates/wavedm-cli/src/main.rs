//! wavedm CLI
//!
//! Thin wrapper around wavedm-core for sending and reading private track
//! suggestions.
//!
//! ## Usage
//!
//! ```bash
//! # Create a signing identity
//! wavedm identity generate
//!
//! # Or browse with a public key only (cannot send or read messages)
//! wavedm identity import-pubkey <hex>
//!
//! # Show the current identity
//! wavedm identity show
//!
//! # Suggest a track
//! wavedm suggest <recipient-hex> --track-id abc123 --title Song --artist Artist -m "Great track!"
//!
//! # Read received (and sent) suggestions
//! wavedm inbox
//! ```
//!
//! Events are exchanged through a JSON-lines relay file, by default
//! `<data-dir>/relay.jsonl`. Point several data dirs at the same
//! `--relay-file` to simulate users sharing a relay.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use wavedm_core::{
    messenger_for, Capability, DmConfig, JsonlRelay, Keys, PublicKey, TrackSuggestion,
};

const IDENTITY_FILE: &str = "identity.json";
const CONFIG_FILE: &str = "config.json";
const RELAY_FILE: &str = "relay.jsonl";

/// wavedm - private track suggestions over Nostr
#[derive(Parser)]
#[command(name = "wavedm")]
#[command(version = "0.1.0")]
#[command(about = "wavedm - private track suggestions over Nostr")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.wavedm)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Relay file shared with other users (default: <data-dir>/relay.jsonl)
    #[arg(long, global = true)]
    relay_file: Option<PathBuf>,

    /// Config file (default: <data-dir>/config.json if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identity management
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },

    /// Privately suggest a track to another user
    Suggest {
        /// Recipient public key (64 hex chars)
        recipient: String,

        #[arg(long)]
        track_id: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        artist: String,

        /// Optional note
        #[arg(short, long, default_value = "")]
        message: String,
    },

    /// List received and sent suggestions
    Inbox,
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Generate a new signing identity
    Generate {
        /// Replace an existing identity
        #[arg(long)]
        force: bool,
    },

    /// Use a public key without its secret (read-only)
    ImportPubkey {
        pubkey: String,

        /// Replace an existing identity
        #[arg(long)]
        force: bool,
    },

    /// Show the current identity
    Show,
}

/// On-disk identity.
#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StoredIdentity {
    Secret { secret_key: String },
    ReadOnly { public_key: PublicKey },
}

impl StoredIdentity {
    fn capability(&self) -> Result<Capability> {
        Ok(match self {
            StoredIdentity::Secret { secret_key } => {
                Capability::Keys(Keys::from_secret_hex(secret_key)?)
            }
            StoredIdentity::ReadOnly { public_key } => Capability::ReadOnly(*public_key),
        })
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}

/// Get the default data directory (~/.wavedm)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wavedm")
}

fn load_config(explicit: Option<&Path>, data_dir: &Path) -> Result<DmConfig> {
    match explicit {
        Some(path) => DmConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => {
            let path = data_dir.join(CONFIG_FILE);
            if path.exists() {
                DmConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))
            } else {
                Ok(DmConfig::default())
            }
        }
    }
}

fn load_identity(data_dir: &Path) -> Result<Capability> {
    let path = data_dir.join(IDENTITY_FILE);
    let text = std::fs::read_to_string(&path).with_context(|| {
        format!(
            "No identity at {} (run `wavedm identity generate`)",
            path.display()
        )
    })?;
    let stored: StoredIdentity = serde_json::from_str(&text)
        .with_context(|| format!("Corrupt identity file {}", path.display()))?;
    stored.capability()
}

fn save_identity(data_dir: &Path, identity: &StoredIdentity, force: bool) -> Result<()> {
    let path = data_dir.join(IDENTITY_FILE);
    if path.exists() && !force {
        bail!(
            "Identity already exists at {} (use --force to replace it)",
            path.display()
        );
    }
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, serde_json::to_string_pretty(identity)?)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn print_identity(capability: &Capability) {
    println!("Public key: {}", capability.public_key());
    match capability {
        Capability::Keys(_) => println!("Mode: full (can send and read messages)"),
        Capability::ReadOnly(_) => println!("Mode: read-only (messaging disabled)"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let relay_path = cli
        .relay_file
        .unwrap_or_else(|| data_dir.join(RELAY_FILE));
    tracing::debug!(
        data_dir = %data_dir.display(),
        relay = %relay_path.display(),
        "Starting wavedm"
    );

    match cli.command {
        Commands::Identity { action } => match action {
            IdentityAction::Generate { force } => {
                let keys = Keys::generate()?;
                let stored = StoredIdentity::Secret {
                    secret_key: keys.secret_hex(),
                };
                save_identity(&data_dir, &stored, force)?;
                println!("Generated new identity");
                print_identity(&Capability::Keys(keys));
            }

            IdentityAction::ImportPubkey { pubkey, force } => {
                let public_key: PublicKey = pubkey
                    .parse()
                    .with_context(|| format!("Invalid public key '{}'", pubkey))?;
                save_identity(&data_dir, &StoredIdentity::ReadOnly { public_key }, force)?;
                println!("Imported read-only identity");
                print_identity(&Capability::ReadOnly(public_key));
            }

            IdentityAction::Show => {
                print_identity(&load_identity(&data_dir)?);
            }
        },

        Commands::Suggest {
            recipient,
            track_id,
            title,
            artist,
            message,
        } => {
            let recipient: PublicKey = recipient
                .parse()
                .with_context(|| format!("Invalid recipient '{}'", recipient))?;
            let config = load_config(cli.config.as_deref(), &data_dir)?;
            let messenger = messenger_for(
                load_identity(&data_dir)?,
                JsonlRelay::new(&relay_path),
                config,
            )?;

            let suggestion = TrackSuggestion::new(track_id, title, artist, message);
            let report = messenger.send(&recipient, &suggestion).await?;

            println!("Sent suggestion {}", report.rumor_id);
            match &report.recipient {
                Ok(_) => println!("  Recipient copy: published"),
                Err(e) => println!("  Recipient copy: FAILED ({})", e),
            }
            match &report.sender_copy {
                Ok(_) => println!("  Sender copy: published"),
                Err(e) => println!("  Sender copy: FAILED ({})", e),
            }
            if !report.delivered() {
                bail!("Recipient copy was not published");
            }
        }

        Commands::Inbox => {
            let config = load_config(cli.config.as_deref(), &data_dir)?;
            let messenger = messenger_for(
                load_identity(&data_dir)?,
                JsonlRelay::new(&relay_path),
                config,
            )?;
            let me = messenger.signer().public_key();

            let messages = messenger.inbox::<TrackSuggestion>().await?;
            if messages.is_empty() {
                println!("No suggestions yet.");
            }
            for received in messages {
                let when = chrono::DateTime::from_timestamp(received.created_at.as_secs() as i64, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| received.created_at.to_string());
                let direction = if received.sender == me { "Sent" } else { "From" };

                println!("{} {} at {}", direction, received.sender, when);
                println!(
                    "  Track: {} by {} ({})",
                    received.payload.track_title,
                    received.payload.track_artist,
                    received.payload.track_id
                );
                if !received.payload.message.is_empty() {
                    println!("  Message: {}", received.payload.message);
                }
            }
        }
    }

    Ok(())
}
