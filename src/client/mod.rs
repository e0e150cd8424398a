pub mod documents_commands;
pub mod runserver;
pub mod storage_config;
pub mod user;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use documents_commands::DocumentsCommands;
use runserver::RunserverArgs;
pub use storage_config::StorageArgs;
use user::UserCommand;

#[derive(Parser, Debug)]
#[command(author, version, about = "Flat-file markdown and text CMS")]
pub struct Client {
    #[command(flatten)]
    pub storage: StorageArgs,
    #[arg(long, env, value_enum, default_value_t = Color::Auto)]
    pub color: Color,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Debug, Default, Clone)]
pub enum Color {
    Never,
    Always,
    #[default]
    Auto,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Runserver(RunserverArgs),
    #[command(subcommand, about, long_about = "Commands related to the stored documents")]
    Documents(DocumentsCommands),
    #[command(subcommand, about, long_about = "Commands related to the credentials file")]
    User(UserCommand),
}
