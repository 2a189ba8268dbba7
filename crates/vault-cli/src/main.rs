//! passvault - encrypted password vault for the terminal
//!
//! Every secret field is encrypted client-side with a key derived from the
//! master key. Records live in a JSON file in the data directory; the master
//! key itself is never written anywhere.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

mod commands;

/// passvault - client-side encrypted password manager
#[derive(Parser, Debug)]
#[command(name = "passvault")]
#[command(version)]
#[command(about = "Client-side encrypted password manager")]
#[command(
    after_help = "Master keys and entry passwords are prompted for, or read from \
                  PASSVAULT_MASTER_KEY and PASSVAULT_ENTRY_PASSWORD. They are never \
                  accepted as arguments."
)]
struct Args {
    /// Data directory (records.json, settings.json)
    #[arg(long, global = true, env = "PASSVAULT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Account name for commands that open the vault
    #[arg(long, short = 'u', global = true, env = "PASSVAULT_USER")]
    user: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Register,

    /// Add a password entry
    Add {
        /// Entry title (stored in clear for listing)
        #[arg(long)]
        title: String,
        /// Login name for the site
        #[arg(long, default_value = "")]
        login: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Category name
        #[arg(long)]
        category: Option<String>,
    },

    /// List entries
    List {
        /// Only entries in this category
        #[arg(long)]
        category: Option<String>,
        /// Decrypt everything and report unreadable entries
        #[arg(long)]
        all: bool,
    },

    /// Show one entry decrypted
    Show {
        id: Uuid,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an entry
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        login: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        new_password: bool,
        #[arg(long, conflicts_with = "clear_url")]
        url: Option<String>,
        #[arg(long)]
        clear_url: bool,
        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,
        #[arg(long)]
        clear_notes: bool,
        /// Move to this category
        #[arg(long, conflicts_with = "uncategorize")]
        category: Option<String>,
        #[arg(long)]
        uncategorize: bool,
    },

    /// Delete an entry
    Remove { id: Uuid },

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Encrypt text into an envelope with the master key
    Encrypt { plaintext: String },

    /// Decrypt an envelope with the master key
    Decrypt { envelope: String },

    /// Print the SHA-256 hash of the master key
    Hash,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add { name: String },
    List,
    Rename { name: String, new_name: String },
    /// Delete a category; its entries become uncategorized
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    /// Seconds of inactivity before the session ends
    SetTimeout { secs: u64 },
    /// Use an identity provider ahead of the local hash check
    SetIdentity {
        #[arg(long)]
        endpoint: String,
        #[arg(long, env = "PASSVAULT_IDENTITY_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long)]
        email_domain: String,
    },
    ClearIdentity,
    /// Restore defaults
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for output
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    commands::run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_not_accepted_as_arguments() {
        assert!(Args::try_parse_from(["passvault", "--master-key", "hunter2", "hash"]).is_err());
        assert!(Args::try_parse_from([
            "passvault",
            "add",
            "--title",
            "Mail",
            "--password",
            "hunter2"
        ])
        .is_err());

        let args = Args::try_parse_from(["passvault", "-u", "alice", "add", "--title", "Mail"])
            .unwrap();
        assert_eq!(args.user.as_deref(), Some("alice"));
        assert!(matches!(args.command, Command::Add { .. }));
    }
}
