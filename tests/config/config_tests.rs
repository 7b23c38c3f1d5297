use analytic_probe::config::{Config, ConfigError, ServerRecord};
use analytic_probe::core::probe::{ProbeOptions, ServerEndpoint, DEFAULT_OPERATION};
use serial_test::serial;
use std::fs;

use crate::common::{create_temp_dir, IsolatedEnv};

fn server(name: &str, ip: &str, port: u16) -> ServerRecord {
    ServerRecord {
        name: name.to_string(),
        ip: ip.to_string(),
        port,
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.default_operation, DEFAULT_OPERATION);
    assert_eq!(config.probe, ProbeOptions::default());
    assert_eq!(config.probe.send_timeout_ms, 10_000);
    assert_eq!(config.probe.receive_timeout_ms, 10_000);
    assert_eq!(config.probe.linger_ms, 0);
    assert!(config.diagnostics.stderr);
    assert!(!config.diagnostics.debug_log);
    assert!(config.servers.is_empty());
    assert!(config.check().is_ok());
}

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = create_temp_dir();
    let config = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[probe]
receive_timeout_ms = 2500

[[servers]]
name = "primary"
ip = "10.1.2.3"
port = 4000
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.default_operation, DEFAULT_OPERATION);
    assert_eq!(config.probe.send_timeout_ms, 10_000);
    assert_eq!(config.probe.receive_timeout_ms, 2_500);
    assert_eq!(config.servers, vec![server("primary", "10.1.2.3", 4000)]);
}

#[test]
fn test_parse_error_names_the_file() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "probe = [not toml").unwrap();

    let error = Config::load_from(&path).unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
    assert!(error.to_string().contains("config.toml"));
}

#[test]
fn test_save_and_reload() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("nested").join("config.toml");
    let mut config = Config::default();
    config.default_operation = "CustomStatus".to_string();
    config.servers.push(server("lab", "::1", 4100));

    config.save_to(&path).unwrap();

    assert_eq!(Config::load_from(&path).unwrap(), config);
}

#[test]
fn test_init_does_not_overwrite() {
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("config.toml");

    assert!(Config::init_at(&path).unwrap());
    fs::write(&path, "default_operation = \"Edited\"\n").unwrap();
    assert!(!Config::init_at(&path).unwrap());

    assert_eq!(Config::load_from(&path).unwrap().default_operation, "Edited");
}

#[test]
#[serial]
fn test_env_var_overrides_location() {
    let env = IsolatedEnv::new();
    let temp_dir = create_temp_dir();
    let path = temp_dir.path().join("custom.toml");
    env.set_config_path(&path);

    assert_eq!(Config::default_path().unwrap(), path);
    assert_eq!(Config::init().unwrap(), path);
    assert!(path.exists());
    assert_eq!(Config::load().unwrap(), Config::default());
}

#[test]
fn test_to_toml_lists_sections() {
    let toml = Config::default().to_toml().unwrap();
    assert!(toml.contains("default_operation = \"AnalyticServerStatus\""));
    assert!(toml.contains("[probe]"));
    assert!(toml.contains("send_timeout_ms = 10000"));
    assert!(toml.contains("[diagnostics]"));
}

#[test]
fn test_find_server() {
    let mut config = Config::default();
    config.servers.push(server("primary", "10.1.2.3", 4000));

    assert_eq!(
        config.find_server("primary").unwrap(),
        ServerEndpoint::new("10.1.2.3", 4000)
    );
    assert!(matches!(
        config.find_server("missing"),
        Err(ConfigError::UnknownServer(name)) if name == "missing"
    ));
}

#[test]
fn test_check_rejects_zero_timeouts() {
    let mut config = Config::default();
    config.probe.send_timeout_ms = 0;
    config.probe.receive_timeout_ms = 0;

    let message = config.check().unwrap_err().to_string();
    assert!(message.contains("send_timeout_ms"));
    assert!(message.contains("receive_timeout_ms"));
}

#[test]
fn test_check_rejects_incomplete_server_records() {
    let mut config = Config::default();
    config.servers.push(server("", "", 0));

    let message = config.check().unwrap_err().to_string();
    assert!(message.contains("servers[0]: name must not be empty"));
    assert!(message.contains("servers[0]: ip must not be empty"));
    assert!(message.contains("servers[0]: port must not be 0"));
}

#[test]
fn test_check_rejects_duplicate_names() {
    let mut config = Config::default();
    config.servers.push(server("primary", "10.1.2.3", 4000));
    config.servers.push(server("primary", "10.1.2.4", 4000));

    let message = config.check().unwrap_err().to_string();
    assert!(message.contains("server name 'primary' is used more than once"));
}

#[test]
fn test_check_rejects_shared_address() {
    let mut config = Config::default();
    config.servers.push(server("primary", "10.1.2.3", 4000));
    config.servers.push(server("secondary", "10.1.2.3", 4000));

    let message = config.check().unwrap_err().to_string();
    assert!(message.contains("port 4000 is already taken for ip '10.1.2.3'"));
}

#[test]
fn test_same_port_on_different_ips_is_fine() {
    let mut config = Config::default();
    config.servers.push(server("primary", "10.1.2.3", 4000));
    config.servers.push(server("secondary", "10.1.2.4", 4000));

    assert!(config.check().is_ok());
}
