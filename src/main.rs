mod client;
mod error;
mod models;
mod render;
mod views;

use std::io::IsTerminal as _;
use std::process::exit;

use clap::Parser;
use client::Client;
use client::Color;
use client::Commands;
use client::documents_commands::DocumentsCommands;
use client::documents_commands::list_documents;
use client::runserver::runserver;
use client::user::UserCommand;
use client::user::check_user;
use client::user::hash_password;
use client::user::list_users;
use colored::Colorize;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use tracing_subscriber::util::SubscriberInitExt as _;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "error:".red().bold());
        exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let client = Client::parse();

    let plain = match client.color {
        Color::Never => {
            colored::control::set_override(false);
            true
        }
        Color::Always => {
            colored::control::set_override(true);
            false
        }
        Color::Auto => !std::io::stderr().is_terminal(),
    };
    let tracing_config = TracingConfig {
        stream: Stream::Stderr,
        plain,
    };
    create_tracing_subscriber(
        tracing_config,
        tracing_subscriber::filter::LevelFilter::INFO,
    )
    .init();

    let storage = client.storage;
    match client.command {
        Commands::Runserver(args) => runserver(args, storage).await,
        Commands::Documents(subcommand) => match subcommand {
            DocumentsCommands::List => list_documents(storage.into_storage_config()).await,
        },
        Commands::User(subcommand) => match subcommand {
            UserCommand::List => list_users(storage.into_storage_config()).await,
            UserCommand::HashPassword(args) => hash_password(args).await,
            UserCommand::Check(args) => check_user(args, storage.into_storage_config()).await,
        },
    }
}
