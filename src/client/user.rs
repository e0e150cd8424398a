use clap::Args;
use clap::Subcommand;
use tokio::io::AsyncBufReadExt as _;
use tokio::io::BufReader;

use crate::models::CredentialStore;
use crate::models::credentials::DEFAULT_ITERATIONS;
use crate::models::credentials::PasswordHash;
use crate::views::StorageConfig;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List the users of the credentials file
    List,
    /// Print a credentials file entry for a user
    HashPassword(HashPasswordArgs),
    /// Check a password against the credentials file
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Username of the entry
    username: String,
    /// Password to hash, read from stdin when omitted
    password: Option<String>,
    /// PBKDF2 iterations
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: u32,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    username: String,
    password: String,
}

/// List users
pub async fn list_users(storage: StorageConfig) -> anyhow::Result<()> {
    let credentials = CredentialStore::new(storage.users_path);
    let users = credentials.load().await?;
    for username in users.keys() {
        println!("{username}");
    }
    if users.is_empty() {
        tracing::info!(path = %credentials.path().display(), "No user found");
    }
    Ok(())
}

/// Print a `username: hash` line ready to be added to the credentials file
pub async fn hash_password(
    HashPasswordArgs {
        username,
        password,
        iterations,
    }: HashPasswordArgs,
) -> anyhow::Result<()> {
    if iterations == 0 {
        anyhow::bail!("at least one iteration is required");
    }
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            BufReader::new(tokio::io::stdin())
                .read_line(&mut line)
                .await?;
            line.trim_end_matches(['\r', '\n']).to_owned()
        }
    };
    if password.is_empty() {
        anyhow::bail!("the password must not be empty");
    }
    let hash =
        tokio::task::spawn_blocking(move || PasswordHash::generate(&password, iterations)).await?;
    println!("{username}: {hash}");
    Ok(())
}

/// Verify a password, failing when it does not match
pub async fn check_user(
    CheckArgs { username, password }: CheckArgs,
    storage: StorageConfig,
) -> anyhow::Result<()> {
    let credentials = CredentialStore::new(storage.users_path);
    if credentials.verify(&username, &password).await? {
        println!("✅ Valid credentials for '{username}'");
        Ok(())
    } else {
        anyhow::bail!("invalid credentials for '{username}'");
    }
}
