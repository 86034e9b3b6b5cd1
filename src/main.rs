//! CLI for cmdrelay
//!
//! Subcommands:
//! - `broker`: run the bundled WebSocket broker
//! - `keygen`: print a fresh Ed25519 key pair
//! - `device`: run a simulated device answering every command
//! - `send`: sign and send one command, print the device's reply

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use cmdrelay::broker::Broker;
use cmdrelay::codec::{DeviceRequest, DeviceResponse};
use cmdrelay::config::{Settings, load_config};
use cmdrelay::crypto::{PrivateKey, PublicKey};
use cmdrelay::device::{Device, DeviceId, DeviceResponder};
use cmdrelay::exchange::CommandClient;
use cmdrelay::transport::{WebSocketTransport, start_websocket_server};
use cmdrelay::utils::logging;
use serde_json::{Map, Value};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cmdrelay")]
enum Command {
    /// Start the WebSocket broker
    Broker,
    /// Generate a key pair (base64 private seed and public key)
    Keygen,
    /// Run a simulated device that echoes command params as its state
    Device {
        /// Device id, 24 hex chars
        #[arg(long)]
        id: DeviceId,
        /// Device private key (base64)
        #[arg(long, env = "CMDRELAY_DEVICE_KEY")]
        private_key: String,
        /// Server public key commands are verified against (base64)
        #[arg(long)]
        server_key: String,
    },
    /// Send one command and wait for the reply
    Send {
        /// Target device id, 24 hex chars
        #[arg(long)]
        device: DeviceId,
        /// Device public key (base64)
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        command: String,
        /// Command params as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
        /// Overrides `client.request_timeout_ms`
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let settings = load_config()?;
    logging::init(&settings.log.level);

    let cmd = Command::parse();

    let result = match cmd {
        Command::Broker => run_broker(&settings).await,
        Command::Keygen => {
            keygen();
            Ok(())
        }
        Command::Device {
            id,
            private_key,
            server_key,
        } => run_device(&settings, id, &private_key, &server_key).await,
        Command::Send {
            device,
            public_key,
            command,
            params,
            timeout_ms,
        } => {
            let timeout = timeout_ms.unwrap_or(settings.client.request_timeout_ms);
            let device = Device::new(device, public_key);
            run_send(&settings, device, &command, &params, timeout).await
        }
    };

    if let Err(e) = &result {
        error!("cmdrelay failed: {}", e);
    }
    result
}

async fn run_broker(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let broker = Arc::new(Mutex::new(Broker::new()));

    tokio::select! {
        res = start_websocket_server(&addr, broker, settings.broker.clone()) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

fn keygen() {
    let key = PrivateKey::generate();
    println!("private_key: {}", key.to_base64());
    println!("public_key:  {}", key.public_key().to_base64());
}

async fn run_device(
    settings: &Settings,
    id: DeviceId,
    private_key: &str,
    server_key: &str,
) -> Result<(), Box<dyn Error>> {
    let key = PrivateKey::from_base64(private_key)?;
    let server_key = PublicKey::from_base64(server_key)?;
    let transport = Arc::new(WebSocketTransport::connect(&settings.client).await?);
    let responder = DeviceResponder::new(transport, id, key, server_key);

    let echo = |request: &DeviceRequest| DeviceResponse::success(request, request.params.clone());

    tokio::select! {
        res = responder.run(echo) => {
            res?;
            error!("connection to broker closed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}

async fn run_send(
    settings: &Settings,
    device: Device,
    command: &str,
    params: &str,
    timeout_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let key = settings
        .client
        .private_key
        .as_deref()
        .ok_or("client.private_key is not configured")?;
    let key = PrivateKey::from_base64(key)?;
    let params: Map<String, Value> = serde_json::from_str(params)?;

    let transport = Arc::new(WebSocketTransport::connect(&settings.client).await?);
    let client = CommandClient::new(transport, key);

    let request = DeviceRequest::new(command, params);
    let response = client
        .send_and_await(&device, &request, Duration::from_millis(timeout_ms))
        .await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
