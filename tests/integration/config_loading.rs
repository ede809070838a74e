//! Integration tests for layered configuration loading

use jobgate::{Category, ConfigLoader, QueueError};
use std::fs;
use tempfile::TempDir;

fn write_workspace_config(root: &std::path::Path, name: &str, contents: &str) {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join(name), contents).unwrap();
}

#[test]
fn environment_file_overrides_base_file() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "config.toml",
        r#"
[workers]
count = 3

[capacities]
Texto3D = 5
Imagen3D = 2
"#,
    );
    write_workspace_config(
        temp_dir.path(),
        "staging-it.toml",
        r#"
[capacities]
Imagen3D = 6
"#,
    );

    std::env::set_var("JOBGATE_ENV", "staging-it");
    let loaded = ConfigLoader::load(temp_dir.path());
    std::env::remove_var("JOBGATE_ENV");
    let config = loaded.unwrap();

    assert_eq!(config.workers.count, 3);
    let table = config.capacity_table().unwrap();
    assert_eq!(table[&Category::TextTo3d], 5);
    assert_eq!(table[&Category::ImageTo3d], 6);
    assert_eq!(table[&Category::Retexture3d], 10);
}

#[test]
fn environment_variables_override_files() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("jobgate.toml");
    fs::write(&config_file, "[eviction]\nsweep_interval_secs = 30\n").unwrap();

    std::env::set_var("JOBGATE__EVICTION__SWEEP_INTERVAL_SECS", "7");
    let loaded = ConfigLoader::load_from_file(&config_file);
    std::env::remove_var("JOBGATE__EVICTION__SWEEP_INTERVAL_SECS");

    assert_eq!(loaded.unwrap().eviction.sweep_interval_secs, 7);
}

#[test]
fn unknown_category_in_file_is_a_validation_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("jobgate.toml");
    fs::write(&config_file, "[capacities]\nHolograma3D = 4\n").unwrap();

    let err = ConfigLoader::load_from_file(&config_file).unwrap_err();
    assert!(matches!(err, QueueError::ConfigError(ref msg) if msg.to_lowercase().contains("holograma3d")));
}

#[test]
fn malformed_file_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("jobgate.toml");
    fs::write(&config_file, "[workers\ncount = 2\n").unwrap();

    assert!(matches!(
        ConfigLoader::load_from_file(&config_file),
        Err(QueueError::ConfigError(_))
    ));
}
