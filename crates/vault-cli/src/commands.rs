//! Subcommand handlers

use serde_json::json;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use vault_core::{
    decrypt, encrypt, hash_master_key, AuthOutcome, EntryUpdate, FileStore, IdentitySettings,
    MasterKey, NewEntry, SettingsManager, Vault, VaultError,
};

use super::{Args, CategoryCommand, Command, ConfigCommand};

type CliResult<T> = Result<T, Box<dyn Error>>;

const MASTER_KEY_ENV: &str = "PASSVAULT_MASTER_KEY";
const ENTRY_PASSWORD_ENV: &str = "PASSVAULT_ENTRY_PASSWORD";

/// Secret from the environment; empty counts as unset
fn env_secret(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

pub async fn run(args: Args) -> CliResult<()> {
    let data_dir = match args.data_dir {
        Some(dir) => dir,
        None => FileStore::default_dir()?,
    };
    debug!("Data directory: {:?}", data_dir);

    match args.command {
        Command::Register => {
            let username = require_user(args.user)?;
            let master_key = read_new_master_key(env_secret(MASTER_KEY_ENV))?;
            let vault = open_vault(&data_dir).await?;

            let account = vault.register(&username, &master_key).await?;
            println!("Registered {} ({})", account.username, account.user_id);
            Ok(())
        }
        Command::Hash => {
            let master_key = read_master_key(env_secret(MASTER_KEY_ENV))?;
            println!("{}", hash_master_key(&master_key));
            Ok(())
        }
        Command::Encrypt { plaintext } => {
            let master_key = read_master_key(env_secret(MASTER_KEY_ENV))?;
            println!("{}", encrypt(&plaintext, &master_key)?);
            Ok(())
        }
        Command::Decrypt { envelope } => {
            let master_key = read_master_key(env_secret(MASTER_KEY_ENV))?;
            println!("{}", decrypt(envelope.trim(), &master_key)?);
            Ok(())
        }
        Command::Config(command) => config(&data_dir, command).await,
        command => {
            let username = require_user(args.user)?;
            let master_key = read_master_key(env_secret(MASTER_KEY_ENV))?;
            let vault = open_vault(&data_dir).await?;

            match vault.login(&username, master_key).await? {
                AuthOutcome::Authenticated { method, .. } => {
                    debug!("Authenticated via {:?}", method);
                }
                AuthOutcome::Rejected => return Err("Invalid username or master key".into()),
            }

            let result = in_session(&vault, command).await;
            vault.logout().await;
            result
        }
    }
}

/// Open the vault over the file store in `data_dir`
async fn open_vault(data_dir: &Path) -> CliResult<Vault> {
    let settings = SettingsManager::new(data_dir);
    let store = FileStore::with_dir(data_dir.to_path_buf())?;
    store.load().await?;

    let vault = Vault::new(Arc::new(store), settings.get())?;
    debug!("Opened {} in {:?}", vault.backend_name(), data_dir);
    Ok(vault)
}

fn require_user(user: Option<String>) -> CliResult<String> {
    user.filter(|u| !u.trim().is_empty())
        .ok_or_else(|| "No account given; use --user or PASSVAULT_USER".into())
}

fn read_master_key(provided: Option<String>) -> CliResult<MasterKey> {
    match provided {
        Some(key) => Ok(MasterKey::from(key)),
        None => Ok(MasterKey::from(rpassword::prompt_password("Master key: ")?)),
    }
}

/// Prompt twice when choosing a master key
fn read_new_master_key(provided: Option<String>) -> CliResult<MasterKey> {
    if let Some(key) = provided {
        return Ok(MasterKey::from(key));
    }

    let first = MasterKey::from(rpassword::prompt_password("New master key: ")?);
    let second = MasterKey::from(rpassword::prompt_password("Repeat master key: ")?);
    if first.expose() != second.expose() {
        return Err("Master keys do not match".into());
    }
    Ok(first)
}

async fn resolve_category(vault: &Vault, name: &str) -> CliResult<Uuid> {
    vault
        .categories
        .list()
        .await?
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        .map(|c| c.id)
        .ok_or_else(|| VaultError::CategoryNotFound(name.to_string()).into())
}

async fn in_session(vault: &Vault, command: Command) -> CliResult<()> {
    match command {
        Command::Add {
            title,
            login,
            url,
            notes,
            category,
        } => {
            let category_id = match category {
                Some(name) => Some(resolve_category(vault, &name).await?),
                None => None,
            };
            let password = match env_secret(ENTRY_PASSWORD_ENV) {
                Some(password) => password,
                None => rpassword::prompt_password("Entry password: ")?,
            };

            let summary = vault
                .entries
                .add(NewEntry {
                    title,
                    username: login,
                    password,
                    url,
                    notes,
                    category_id,
                })
                .await?;
            println!("Added {} ({})", summary.title, summary.id);
        }

        Command::List { category, all } => {
            let categories = vault.categories.list().await?;
            let category_name = |id: Option<Uuid>| {
                id.and_then(|id| categories.iter().find(|c| c.id == id))
                    .map(|c| c.name.as_str())
                    .unwrap_or("-")
            };

            if all {
                let contents = vault.entries.load_vault().await?;
                for entry in &contents.entries {
                    println!(
                        "{}  {:<24}  {:<12}  {}",
                        entry.id,
                        entry.title,
                        category_name(entry.category_id),
                        entry.username
                    );
                }
                for failure in &contents.failures {
                    eprintln!("{}  {:<24}  unreadable: {}", failure.id, failure.title, failure.error);
                }
            } else {
                let filter = match category {
                    Some(name) => Some(resolve_category(vault, &name).await?),
                    None => None,
                };
                for summary in vault.entries.list(filter).await? {
                    println!(
                        "{}  {:<24}  {:<12}  {}",
                        summary.id,
                        summary.title,
                        category_name(summary.category_id),
                        summary.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }

        Command::Show { id, json } => {
            let entry = vault.entries.get_decrypted(id).await?;
            if json {
                let value = json!({
                    "id": entry.id,
                    "categoryId": entry.category_id,
                    "title": entry.title,
                    "username": entry.username,
                    "password": entry.password,
                    "url": entry.url,
                    "notes": entry.notes,
                    "updatedAt": entry.updated_at,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Title:    {}", entry.title);
                println!("Username: {}", entry.username);
                println!("Password: {}", entry.password);
                if let Some(url) = &entry.url {
                    println!("URL:      {}", url);
                }
                if let Some(notes) = &entry.notes {
                    println!("Notes:    {}", notes);
                }
            }
        }

        Command::Update {
            id,
            title,
            login,
            new_password,
            url,
            clear_url,
            notes,
            clear_notes,
            category,
            uncategorize,
        } => {
            let password = if new_password {
                Some(rpassword::prompt_password("New entry password: ")?)
            } else {
                None
            };
            let category_id = match category {
                Some(name) => Some(Some(resolve_category(vault, &name).await?)),
                None if uncategorize => Some(None),
                None => None,
            };

            let update = EntryUpdate {
                title,
                username: login,
                password,
                url: if clear_url { Some(None) } else { url.map(Some) },
                notes: if clear_notes { Some(None) } else { notes.map(Some) },
                category_id,
            };
            if update.is_empty() {
                println!("Nothing to change");
                return Ok(());
            }

            let summary = vault.entries.update(id, update).await?;
            println!("Updated {} ({})", summary.title, summary.id);
        }

        Command::Remove { id } => {
            vault.entries.delete(id).await?;
            println!("Removed {}", id);
        }

        Command::Category(command) => match command {
            CategoryCommand::Add { name } => {
                let category = vault.categories.create(&name).await?;
                println!("Added category {} ({})", category.name, category.id);
            }
            CategoryCommand::List => {
                for category in vault.categories.list().await? {
                    println!("{}  {}", category.id, category.name);
                }
            }
            CategoryCommand::Rename { name, new_name } => {
                let id = resolve_category(vault, &name).await?;
                let category = vault.categories.rename(id, &new_name).await?;
                println!("Renamed to {}", category.name);
            }
            CategoryCommand::Remove { name } => {
                let id = resolve_category(vault, &name).await?;
                let moved = vault.categories.delete(id).await?;
                println!("Removed category {} ({} entries uncategorized)", name, moved);
            }
        },

        other => return Err(format!("{:?} does not open a session", other).into()),
    }

    Ok(())
}

async fn config(data_dir: &Path, command: ConfigCommand) -> CliResult<()> {
    let mut settings = SettingsManager::new(data_dir);

    match command {
        ConfigCommand::Show => {
            let mut shown = settings.get().clone();
            if let Some(identity) = shown.identity.as_mut() {
                if identity.api_key.is_some() {
                    identity.api_key = Some("********".to_string());
                }
            }
            println!("{}", serde_json::to_string_pretty(&shown)?);
        }
        ConfigCommand::SetTimeout { secs } => {
            if secs == 0 {
                return Err("Timeout must be at least one second".into());
            }
            settings.set_inactivity_timeout(secs).await?;
            info!("Inactivity timeout set to {}s", secs);
        }
        ConfigCommand::SetIdentity {
            endpoint,
            api_key,
            email_domain,
        } => {
            let identity = IdentitySettings {
                endpoint,
                api_key,
                email_domain,
            };
            // Reject bad endpoints before saving
            vault_core::HttpIdentityProvider::new(&identity)?;
            settings.set_identity(Some(identity)).await?;
            info!("Identity provider configured");
        }
        ConfigCommand::ClearIdentity => {
            settings.set_identity(None).await?;
            info!("Identity provider removed");
        }
        ConfigCommand::Reset => {
            settings.reset().await?;
            info!("Settings reset to defaults");
        }
    }

    Ok(())
}
