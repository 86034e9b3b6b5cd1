use super::load_config;
use super::settings::Settings;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.broker.max_connections, 1000);
    assert_eq!(settings.client.broker_url, "ws://127.0.0.1:8080");
    assert_eq!(settings.client.keep_alive_secs, 30);
    assert_eq!(settings.client.request_timeout_ms, 5000);
    assert!(settings.client.client_id.starts_with("cmdrelay-"));
    assert!(settings.client.private_key.is_none());
    assert_eq!(settings.log.level, "info");
}

#[test]
fn test_default_client_ids_are_unique() {
    let a = Settings::default();
    let b = Settings::default();
    assert_ne!(a.client.client_id, b.client.client_id);
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // load_config reads config/default.toml relative to the current dir.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [broker]
        max_connections = 10

        [client]
        broker_url = "ws://broker:9000"
        request_timeout_ms = 250
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();

    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.broker.max_connections, 10);
    assert_eq!(cfg.client.broker_url, "ws://broker:9000");
    assert_eq!(cfg.client.request_timeout_ms, 250);
    // untouched values fall back to defaults
    assert_eq!(cfg.client.keep_alive_secs, 30);
    assert_eq!(cfg.log.level, "info");
}

#[test]
#[serial]
fn load_config_from_env_overrides_defaults() {
    temp_env::with_vars(
        [
            ("CMDRELAY__SERVER__PORT", Some("9100")),
            ("CMDRELAY__CLIENT__CLIENT_ID", Some("backend-1")),
            ("CMDRELAY__CLIENT__PRIVATE_KEY", Some("c2VjcmV0")),
            ("CMDRELAY__LOG__LEVEL", Some("debug")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.server.port, 9100);
            assert_eq!(cfg.client.client_id, "backend-1");
            assert_eq!(cfg.client.private_key.as_deref(), Some("c2VjcmV0"));
            assert_eq!(cfg.log.level, "debug");
            assert_eq!(cfg.server.host, "127.0.0.1");
        },
    );
}
