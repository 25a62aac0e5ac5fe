use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, Credential, ServerAddress},
    Client,
};
use tracing::{debug, error};

use crate::{
    config::AuthDbConfig,
    error::{AuthError, Result},
};

fn client_options(config: &AuthDbConfig) -> Result<ClientOptions> {
    let hosts = config
        .hosts
        .iter()
        .map(ServerAddress::parse)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AuthError::Connection(e.into()))?;

    let timeout = Duration::from_millis(u64::from(config.timeout_milliseconds));
    let mut options = ClientOptions::default();
    options.hosts = hosts;
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);
    if !config.username.is_empty() {
        let mut credential = Credential::default();
        credential.username = Some(config.username.clone());
        credential.password = Some(config.password.clone());
        options.credential = Some(credential);
    }
    Ok(options)
}

/// Builds a client for `config` and pings the server so that bad hosts or
/// credentials fail here rather than on the first query.
pub async fn connect(config: &AuthDbConfig) -> Result<Client> {
    let client = Client::with_options(client_options(config)?)
        .map_err(|e| AuthError::Connection(e.into()))?;

    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| {
            error!(error = %e, hosts = ?config.hosts, "database ping failed");
            AuthError::Connection(e.into())
        })?;
    debug!(hosts = ?config.hosts, "database client connected");
    Ok(client)
}
