//! Config module tests

use crate::config::{Config, DistributionConfig, MAX_EXPAND_LEVEL, TreeConfig};
use crate::domain::progress::DistributionStrategy;

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.tree.default_expand_level, 1);
    assert_eq!(config.tree.smart_expand_max_nodes, 200);
    assert!(!config.tree.case_sensitive_search);
    assert_eq!(config.tree.window_size, 50);
    assert_eq!(config.distribution.default_strategy, DistributionStrategy::Equal);
    assert!(config.validate().is_ok());
}

#[test]
fn test_get_and_set_round_trip_values() {
    let mut config = Config::default();

    config.set("tree.default_expand_level", "3").unwrap();
    config.set("tree.smart_expand_max_nodes", "25").unwrap();
    config.set("tree.case_sensitive_search", "true").unwrap();
    config.set("tree.window_size", "10").unwrap();
    config.set("distribution.default_strategy", "Proportional").unwrap();

    assert_eq!(config.get("tree.default_expand_level").unwrap(), "3");
    assert_eq!(config.get("tree.smart_expand_max_nodes").unwrap(), "25");
    assert_eq!(config.get("tree.case_sensitive_search").unwrap(), "true");
    assert_eq!(config.get("tree.window_size").unwrap(), "10");
    assert_eq!(config.get("distribution.default_strategy").unwrap(), "proportional");
}

#[test]
fn test_set_rejects_out_of_range_values() {
    let mut config = Config::default();

    assert!(config.set("tree.default_expand_level", "4").is_err());
    assert!(config.set("tree.default_expand_level", "-1").is_err());
    assert!(config.set("tree.window_size", "0").is_err());
    assert!(config.set("tree.case_sensitive_search", "maybe").is_err());
    assert!(config.set("distribution.default_strategy", "manual").is_err());
    assert!(config.set("distribution.default_strategy", "random").is_err());

    assert_eq!(config, Config::default());
}

#[test]
fn test_unknown_key() {
    let mut config = Config::default();
    let err = config.get("tree.colour").unwrap_err();
    assert!(err.to_string().contains("Unknown configuration key"));
    assert!(config.set("llm.model", "x").is_err());
}

#[test]
fn test_list_covers_every_key() {
    let list = Config::default().list().unwrap();
    let keys: Vec<&str> = list.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "tree.default_expand_level",
            "tree.smart_expand_max_nodes",
            "tree.case_sensitive_search",
            "tree.window_size",
            "distribution.default_strategy",
        ]
    );
}

#[test]
fn test_validate_rejects_bad_files() {
    let config = Config {
        tree: TreeConfig {
            default_expand_level: MAX_EXPAND_LEVEL + 1,
            ..TreeConfig::default()
        },
        distribution: DistributionConfig::default(),
    };
    assert!(config.validate().is_err());

    let config = Config {
        distribution: DistributionConfig {
            default_strategy: DistributionStrategy::Manual,
        },
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    let err = err.downcast_ref::<crate::Error>().unwrap();
    assert_eq!(err.code(), "E600");
}

#[test]
fn test_save_and_load_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    assert_eq!(Config::load_from(&path).unwrap(), Config::default());

    let mut config = Config::default();
    config.set("tree.window_size", "20").unwrap();
    config.set("distribution.default_strategy", "proportional").unwrap();
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[tree]\nwindow_size = 5\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.tree.window_size, 5);
    assert_eq!(config.tree.smart_expand_max_nodes, 200);
    assert_eq!(config.distribution.default_strategy, DistributionStrategy::Equal);
}

#[test]
fn test_invalid_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[tree]\nwindow_size = 0\n").unwrap();
    assert!(Config::load_from(&path).is_err());

    std::fs::write(&path, "not toml = = =").unwrap();
    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
