//! API key management for the text generation provider.

use adept_models::auth::{CredentialSource, CredentialStore, env_var_for_provider};
use anyhow::{Result, bail};
use clap::Args;
use dialoguer::{Password, theme::ColorfulTheme};

use crate::config::types::DEFAULT_PROVIDER;

/// Keyring service name shared by every adept command.
pub const KEYRING_SERVICE: &str = "adept";

#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Provider to configure
    #[arg(default_value = DEFAULT_PROVIDER)]
    pub provider: String,

    /// Delete the stored key
    #[arg(long, conflicts_with = "status")]
    pub delete: bool,

    /// Show where the key is resolved from
    #[arg(long)]
    pub status: bool,
}

pub fn run(args: AuthArgs) -> Result<()> {
    let store = CredentialStore::new(KEYRING_SERVICE).with_env_fallback();
    let provider = args.provider;

    if args.status {
        match store.credential_source(&provider) {
            Some(CredentialSource::Keyring) => println!("{}: configured (keyring)", provider),
            Some(CredentialSource::Environment) => {
                println!("{}: configured (environment)", provider)
            }
            None => {
                println!("{}: not configured", provider);
                println!();
                println!("Interviews will run with fallback scoring and feedback.");
                println!("Configure a key with: adept auth {}", provider);
            }
        }
        return Ok(());
    }

    if args.delete {
        match store.delete(&provider) {
            Ok(()) => println!("Credentials for '{}' deleted.", provider),
            Err(adept_models::Error::CredentialsNotFound(_)) => {
                println!("No credentials found for '{}'.", provider)
            }
            Err(e) => bail!("Failed to delete credentials: {}", e),
        }
        return Ok(());
    }

    let env_hint = env_var_for_provider(&provider)
        .map(|v| format!(" (or set {})", v))
        .unwrap_or_default();
    println!("Enter API key for {}{}", provider, env_hint);

    let key = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("API key")
        .interact()?;

    if key.trim().is_empty() {
        bail!("API key cannot be empty");
    }

    store.set(&provider, &key)?;
    println!("Credentials for '{}' saved to keyring.", provider);
    Ok(())
}
