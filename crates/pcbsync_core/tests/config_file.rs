use pcbsync_core::{ApplierConfig, ConfigError};
use std::io::Write;

#[test]
fn load_reads_overrides_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "edge_layer = 25").unwrap();
    writeln!(file, "back_layer = 2").unwrap();

    let config = ApplierConfig::load(file.path()).unwrap();

    assert_eq!(config.edge_layer, 25);
    assert_eq!(config.back_layer, 2);
    assert_eq!(config.front_layer, 0);
    assert_eq!(config.stroke_width, 100_000);
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ApplierConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn unknown_keys_are_rejected() {
    let err = ApplierConfig::from_toml_str("edge_layers = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn non_positive_stroke_width_is_rejected() {
    let err = ApplierConfig::from_toml_str("stroke_width = 0\n").unwrap_err();
    assert!(err.to_string().contains("stroke_width"));
}
