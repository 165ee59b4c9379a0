//! Configuration loading tests

use analytics_gateway::GatewayConfig;
use pretty_assertions::assert_eq;
use serial_test::serial;

use super::helpers::create_test_config;

#[test]
fn test_config_passes_validation() {
    assert!(create_test_config().validate().is_ok());
}

#[test]
#[serial]
fn missing_file_falls_back_to_defaults() {
    let config = GatewayConfig::from_file("does-not-exist").unwrap();
    assert_eq!(config.server.port, 5111);
    assert!(config.engine.bearer_token.is_empty());
    assert!(config.cors.enabled);
}

#[test]
#[serial]
fn environment_supplies_the_secret() {
    unsafe {
        std::env::set_var("ANALYTICS__ENGINE__BEARER_TOKEN", "env-token");
        std::env::set_var("ANALYTICS__SERVER__PORT", "6222");
    }

    let result = GatewayConfig::from_file("does-not-exist");

    unsafe {
        std::env::remove_var("ANALYTICS__ENGINE__BEARER_TOKEN");
        std::env::remove_var("ANALYTICS__SERVER__PORT");
    }

    let config = result.unwrap();
    assert_eq!(config.engine.bearer_token, "env-token");
    assert_eq!(config.server.port, 6222);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn invalid_environment_values_are_rejected() {
    unsafe {
        std::env::set_var("ANALYTICS__SERVER__PORT", "not-a-port");
    }

    let result = GatewayConfig::from_file("does-not-exist");

    unsafe {
        std::env::remove_var("ANALYTICS__SERVER__PORT");
    }

    assert!(result.is_err());
}

#[test]
#[serial]
fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("gateway.toml"),
        r#"
[server]
port = 8200

[engine]
bearer_token = "file-token"
"#,
    )
    .unwrap();

    let name = dir.path().join("gateway");
    let config = GatewayConfig::from_file(name.to_str().unwrap()).unwrap();

    assert_eq!(config.server.port, 8200);
    assert_eq!(config.engine.bearer_token, "file-token");
    // Sections the file omits keep their defaults
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.cors.allowed_origins, vec!["*".to_string()]);
}
