//! Integration tests for configuration loading

use quote_radar::config::{Config, ConfigError, SourceKind};
use quote_radar::source::Market;
use quote_radar::telemetry::LogFormat;
use std::io::Write;

#[test]
fn test_partial_file_fills_defaults() {
    let toml = r#"
        [radar]
        market = "kospi"
        top_k = 3

        [source]
        kind = "synthetic"
        seed = 42

        [telemetry]
        log_format = "json"
    "#;

    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.radar.market, Market::Kospi);
    assert_eq!(config.radar.top_k, 3);
    assert_eq!(config.radar.poll_interval_ms, 1_500);
    assert_eq!(config.source.kind, SourceKind::Synthetic);
    assert_eq!(config.source.seed, Some(42));
    assert_eq!(config.telemetry.log_format, LogFormat::Json);
    assert_eq!(config.lifecycle.confirm_delay_ms, 3_500);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_validated_reports_field() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[lifecycle]\nconfirm_delay_ms = 500").unwrap();

    match Config::load_validated(file.path()) {
        Err(ConfigError::Invalid { field, .. }) => {
            assert_eq!(field, "lifecycle.confirm_delay_ms");
        }
        other => panic!("expected invalid field, got {:?}", other),
    }
}

#[test]
fn test_effective_config_survives_serialization() {
    let mut config = Config::default();
    config.radar.top_k = 4;
    config.telemetry.metrics_port = Some(9100);

    let text = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_missing_file_is_io_error() {
    assert!(matches!(
        Config::load("/nonexistent/quote-radar.toml"),
        Err(ConfigError::Io(_))
    ));
}
