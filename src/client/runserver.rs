use clap::Args;

use crate::views;

use super::StorageArgs;

#[derive(Args, Debug)]
#[command(about, long_about = "Launch the server")]
pub struct RunserverArgs {
    #[arg(long, env = "FLATCMS_PORT", default_value_t = 4567)]
    pub(super) port: u16,
    #[arg(long, env = "FLATCMS_ADDRESS", default_value_t = String::from("127.0.0.1"))]
    pub(super) address: String,
    /// Only send the session cookie over HTTPS. Set it whenever the server is behind TLS.
    #[arg(long, env = "FLATCMS_SECURE_COOKIES", default_value_t = false)]
    pub(super) secure_cookies: bool,
}

/// Create and run the server
pub async fn runserver(
    RunserverArgs {
        port,
        address,
        secure_cookies,
    }: RunserverArgs,
    storage: StorageArgs,
) -> anyhow::Result<()> {
    let config = views::ServerConfig {
        port,
        address,
        storage: storage.into_storage_config(),
        secure_cookies,
    };

    let server = views::Server::new(config);
    Ok(server.start().await?)
}
