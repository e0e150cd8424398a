use std::path::PathBuf;

use clap::Args;
use clap::ValueEnum;

use crate::views::StorageConfig;

/// Deployment environment, decides where the data lives by default
#[derive(ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Test,
}

#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    #[arg(long = "env", env = "FLATCMS_ENV", value_enum, default_value_t = Environment::Development)]
    pub environment: Environment,
    /// Directory holding the documents [default: `data`, `test/data` in test]
    #[arg(long, env = "FLATCMS_DATA_PATH")]
    pub data_path: Option<PathBuf>,
    /// YAML file mapping usernames to password hashes
    /// [default: `users_db.yml`, `test/users_db.yml` in test]
    #[arg(long, env = "FLATCMS_USERS_PATH")]
    pub users_path: Option<PathBuf>,
}

impl StorageArgs {
    pub fn into_storage_config(self) -> StorageConfig {
        let prefix = match self.environment {
            Environment::Development => PathBuf::new(),
            Environment::Test => PathBuf::from("test"),
        };
        StorageConfig {
            data_path: self.data_path.unwrap_or_else(|| prefix.join("data")),
            users_path: self
                .users_path
                .unwrap_or_else(|| prefix.join("users_db.yml")),
        }
    }
}
