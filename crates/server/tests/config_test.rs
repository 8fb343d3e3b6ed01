//! # Configuration Tests
//!
//! Environment variables are process-global, so every test takes `ENV_LOCK`
//! before touching them.

use covershelf_server::config::{get_config, ConfigError};
use std::env;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env_vars() {
    env::remove_var("PORT");
    env::remove_var("DB_URL");
    env::remove_var("COVERSHELF_PORT");
    env::remove_var("COVERSHELF_DB_URL");
    env::remove_var("TEST_COVERSHELF_DB");
}

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yml")
        .tempfile()
        .expect("temp config file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_get_config_defaults() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    let file = yaml_file("{}\n");

    let config = get_config(file.path().to_str()).expect("Configuration should load");

    assert_eq!(config.port, 9090);
    assert_eq!(config.db_url, "db/covershelf.db");
}

#[test]
fn test_plain_env_overrides_top_level_keys() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("PORT", "9999");
    env::set_var("DB_URL", "/tmp/env.db");
    let file = yaml_file("port: 1234\ndb_url: file.db\n");

    let config = get_config(file.path().to_str()).expect("Configuration should load");

    assert_eq!(config.port, 9999);
    assert_eq!(config.db_url, "/tmp/env.db");
    clear_env_vars();
}

#[test]
fn test_prefixed_env_overrides_everything() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("PORT", "9999");
    env::set_var("COVERSHELF_PORT", "7070");

    let file = yaml_file("{}\n");
    let config = get_config(file.path().to_str()).expect("Configuration should load");

    assert_eq!(config.port, 7070);
    clear_env_vars();
}

#[test]
fn test_yaml_values_and_substitution() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();
    env::set_var("TEST_COVERSHELF_DB", "/data/covers.db");
    let file = yaml_file("port: 8088\ndb_url: \"${TEST_COVERSHELF_DB}\"\n");

    let config = get_config(file.path().to_str()).expect("Configuration should load");

    assert_eq!(config.port, 8088);
    assert_eq!(config.db_url, "/data/covers.db");
    clear_env_vars();
}

#[test]
fn test_missing_override_file_is_an_error() {
    let _lock = ENV_LOCK.lock().unwrap();
    clear_env_vars();

    let result = get_config(Some("/definitely/not/here/config.yml"));

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
