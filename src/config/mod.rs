mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, ClientSettings, LogSettings, ServerSettings, Settings};

/// Prefix of environment overrides, e.g. `CMDRELAY__CLIENT__BROKER_URL`.
pub const ENV_PREFIX: &str = "CMDRELAY";

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(merge(partial, Settings::default()))
}

fn merge(partial: PartialSettings, default: Settings) -> Settings {
    let server = partial.server.as_ref();
    let broker = partial.broker.as_ref();
    let client = partial.client.as_ref();
    let log = partial.log.as_ref();

    Settings {
        server: ServerSettings {
            host: server
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: server.and_then(|s| s.port).unwrap_or(default.server.port),
        },
        broker: BrokerSettings {
            max_connections: broker
                .and_then(|b| b.max_connections)
                .unwrap_or(default.broker.max_connections),
        },
        client: ClientSettings {
            broker_url: client
                .and_then(|c| c.broker_url.clone())
                .unwrap_or(default.client.broker_url),
            client_id: client
                .and_then(|c| c.client_id.clone())
                .unwrap_or(default.client.client_id),
            keep_alive_secs: client
                .and_then(|c| c.keep_alive_secs)
                .unwrap_or(default.client.keep_alive_secs),
            connect_timeout_secs: client
                .and_then(|c| c.connect_timeout_secs)
                .unwrap_or(default.client.connect_timeout_secs),
            request_timeout_ms: client
                .and_then(|c| c.request_timeout_ms)
                .unwrap_or(default.client.request_timeout_ms),
            private_key: client
                .and_then(|c| c.private_key.clone())
                .or(default.client.private_key),
        },
        log: LogSettings {
            level: log
                .and_then(|l| l.level.clone())
                .unwrap_or(default.log.level),
        },
    }
}

#[cfg(test)]
mod tests;
