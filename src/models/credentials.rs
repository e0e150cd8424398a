use std::collections::BTreeMap;
use std::fmt::Display;
use std::fmt::Formatter;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::StatusCode;
use sha2::Sha256;
use thiserror::Error;

use crate::error::CmsError;

/// Iterations used for newly generated hashes
pub const DEFAULT_ITERATIONS: u32 = 100_000;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;
const MAX_HASH_BYTES: usize = 64;

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("could not read credentials file '{}'", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid credentials file '{}'", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("password verification was interrupted")]
    Hashing(#[from] tokio::task::JoinError),
}

impl CmsError for CredentialsError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        match self {
            Self::Read { .. } => "flatcms:credentials:Read",
            Self::Parse { .. } => "flatcms:credentials:Parse",
            Self::Hashing(_) => "flatcms:credentials:Hashing",
        }
    }
}

/// A salted PBKDF2-HMAC-SHA256 password hash
///
/// Serialized as `pbkdf2-sha256$<iterations>$<salt-hex>$<hash-hex>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed password hash")]
pub struct MalformedHash;

impl PasswordHash {
    /// Hashes `password` with a fresh random salt
    pub fn generate(password: &str, iterations: u32) -> Self {
        let salt: [u8; SALT_BYTES] = rand::random();
        let mut hash = vec![0u8; HASH_BYTES];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
        Self {
            iterations,
            salt: salt.to_vec(),
            hash,
        }
    }

    pub fn matches(&self, password: &str) -> bool {
        let mut attempt = vec![0u8; self.hash.len()];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            password.as_bytes(),
            &self.salt,
            self.iterations,
            &mut attempt,
        );
        constant_time_eq(&attempt, &self.hash)
    }
}

impl FromStr for PasswordHash {
    type Err = MalformedHash;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(MalformedHash);
        };
        let iterations = iterations.parse::<u32>().map_err(|_| MalformedHash)?;
        let salt = hex::decode(salt).map_err(|_| MalformedHash)?;
        let hash = hex::decode(hash).map_err(|_| MalformedHash)?;
        if iterations == 0 || salt.is_empty() || hash.is_empty() || hash.len() > MAX_HASH_BYTES {
            return Err(MalformedHash);
        }
        Ok(Self {
            iterations,
            salt,
            hash,
        })
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(&self.salt),
            hex::encode(&self.hash)
        )
    }
}

/// Compares two byte slices in time independent of where they differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Checks `password` against a stored hash string. Malformed hashes never match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match stored_hash.parse::<PasswordHash>() {
        Ok(hash) => hash.matches(password),
        Err(MalformedHash) => {
            tracing::warn!("stored password hash is malformed");
            false
        }
    }
}

/// Read-only YAML file mapping usernames to password hashes
///
/// The file is read again on every call so that edits are picked up
/// without restarting the server.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<BTreeMap<String, String>, CredentialsError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CredentialsError::Read {
                path: self.path.clone(),
                source,
            })?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_yaml::from_str(&raw).map_err(|source| CredentialsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Unknown usernames and wrong passwords both yield `false`.
    #[tracing::instrument(skip(self, password), level = "debug")]
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, CredentialsError> {
        let stored_hash = self.load().await?.remove(username);
        let password = password.to_owned();
        let valid = tokio::task::spawn_blocking(move || match stored_hash {
            Some(stored_hash) => verify_password(&password, &stored_hash),
            None => {
                // Spend the same time as a real check
                let _ = PasswordHash::generate(&password, DEFAULT_ITERATIONS);
                false
            }
        })
        .await?;
        Ok(valid)
    }
}
