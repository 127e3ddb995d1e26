use super::*;

use std::{
    collections::HashMap,
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config(contents: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("insights_config_test_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("insights.toml");
    fs::write(&path, contents).expect("write config");
    path
}

fn env_map(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_point_at_local_service_with_thirty_second_timeout() {
    let defaults = Settings::default();

    assert_eq!(defaults.api_base_url, "http://localhost:5000");
    assert_eq!(defaults.request_timeout_secs, 30);
    assert_eq!(defaults.default_group, "People with disabilities");
    assert_eq!(defaults.default_category, "Accessibility");
    let config = defaults.client_config().expect("client config");
    assert_eq!(config.base_url().as_str(), "http://localhost:5000/");
    assert_eq!(config.request_timeout(), Duration::from_secs(30));
}

#[test]
fn file_values_override_defaults_and_env_overrides_file() {
    let path = temp_config(
        r#"
api_base_url = "https://insights.example.org/api"
request_timeout_secs = 45
default_group = "Elderly"
"#,
    );

    let from_file = load_settings_with(Some(&path), env_map(&[])).expect("settings");
    assert_eq!(from_file.api_base_url, "https://insights.example.org/api");
    assert_eq!(from_file.request_timeout_secs, 45);
    assert_eq!(from_file.default_group, "Elderly");
    assert_eq!(from_file.default_category, "Accessibility");

    let with_env = load_settings_with(
        Some(&path),
        env_map(&[
            ("INSIGHTS_API_BASE_URL", "http://first.example"),
            ("APP__API_BASE_URL", "http://second.example"),
            ("APP__REQUEST_TIMEOUT_SECS", "10"),
            ("APP__DEFAULT_CATEGORY", "Mobility"),
        ]),
    )
    .expect("settings");
    assert_eq!(with_env.api_base_url, "http://second.example");
    assert_eq!(with_env.request_timeout_secs, 10);
    assert_eq!(with_env.default_category, "Mobility");

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn unparseable_timeout_env_is_ignored() {
    let path = temp_config("request_timeout_secs = 12\n");

    let settings = load_settings_with(
        Some(&path),
        env_map(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]),
    )
    .expect("settings");
    assert_eq!(settings.request_timeout_secs, 12);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let missing = env::temp_dir().join("insights_config_test_does_not_exist.toml");
    let err = load_settings_with(Some(&missing), env_map(&[])).expect_err("should fail");
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let path = temp_config("api_url = \"http://typo.example\"\n");

    let err = load_settings_with(Some(&path), env_map(&[])).expect_err("should fail");
    assert!(err.to_string().contains("invalid config file"));

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn zero_timeout_is_rejected_when_building_client_config() {
    let settings = Settings {
        request_timeout_secs: 0,
        ..Settings::default()
    };
    assert!(settings.client_config().is_err());
}
