use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the bundled broker, the command client and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
    pub client: ClientSettings,
    pub log: LogSettings,
}

/// Address the bundled WebSocket broker binds to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub max_connections: usize,
}

/// Settings of the command client side: how to reach the broker and how
/// to sign outgoing commands.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientSettings {
    pub broker_url: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_ms: u64,
    /// Base64 Ed25519 seed of the server signing key.
    pub private_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
    pub client: Option<PartialClientSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_connections: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub broker_url: Option<String>,
    pub client_id: Option<String>,
    pub keep_alive_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub private_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            broker: BrokerSettings {
                max_connections: 1000,
            },
            client: ClientSettings::default(),
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            broker_url: "ws://127.0.0.1:8080".to_string(),
            client_id: format!("cmdrelay-{}", uuid::Uuid::new_v4().simple()),
            keep_alive_secs: 30,
            connect_timeout_secs: 5,
            request_timeout_ms: 5000,
            private_key: None,
        }
    }
}
