#![cfg(feature = "web")]

use std::collections::HashMap;
use std::path::PathBuf;

use sunburst::config::Config;

fn config_from(vars: &[(&str, &str)]) -> Config {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn test_defaults_when_unset() {
    let config = config_from(&[]);

    assert_eq!(config, Config::default());
    assert_eq!(config.addr(), "127.0.0.1:8050");
    assert!(!config.debug);
    assert!(config.persist_uploads);
    assert_eq!(config.upload_path, PathBuf::from("uploads/last_upload.bin"));
    assert_eq!(config.log_level(), "info");
    println!("✓ Fixed defaults used when nothing is set");
}

#[test]
fn test_environment_overrides() {
    let config = config_from(&[
        ("HOST", "0.0.0.0"),
        ("PORT", "9000"),
        ("DEBUG", "True"),
        ("UPLOAD_PATH", "/tmp/sunburst/upload.bin"),
        ("PERSIST_UPLOADS", "off"),
    ]);

    assert_eq!(config.addr(), "0.0.0.0:9000");
    assert!(config.debug);
    assert_eq!(config.log_level(), "debug");
    assert_eq!(config.upload_path, PathBuf::from("/tmp/sunburst/upload.bin"));
    assert!(!config.persist_uploads);
    println!("✓ Every setting overridable from the environment");
}

#[test]
fn test_invalid_values_fall_back() {
    let config = config_from(&[("PORT", "eighty"), ("DEBUG", "maybe"), ("HOST", "  ")]);

    assert_eq!(config.port, 8050);
    assert!(!config.debug);
    assert_eq!(config.host, "127.0.0.1");
    println!("✓ Unparseable values replaced by defaults");
}

#[test]
fn test_bootstrap_creates_upload_dir() -> std::io::Result<()> {
    let dir = tempfile::tempdir()?;
    let upload_path = dir.path().join("uploads").join("last_upload.bin");
    let config = Config {
        upload_path: upload_path.clone(),
        ..Config::default()
    };

    config.bootstrap()?;
    assert!(upload_path.parent().map(|p| p.is_dir()).unwrap_or(false));
    println!("✓ Upload directory bootstrapped");
    Ok(())
}
