use super::*;

use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn strips_trailing_slash_from_base_url() {
    assert_eq!(
        normalize_base_url("https://reward.example.com/api/").expect("url"),
        "https://reward.example.com/api"
    );
    assert_eq!(
        normalize_base_url("http://localhost:8000").expect("url"),
        "http://localhost:8000"
    );
}

#[test]
fn empty_base_url_falls_back_to_default() {
    assert_eq!(
        normalize_base_url("   ").expect("url"),
        Settings::default().api_base_url
    );
}

#[test]
fn rejects_non_http_and_unparseable_urls() {
    assert!(normalize_base_url("ftp://files.example.com").is_err());
    assert!(normalize_base_url("not a url").is_err());
    assert!(normalize_base_url("http://host:8000/?x=1").is_err());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("KAM_API_BASE_URL", "http://plain:8000"),
            ("APP__API_BASE_URL", "http://prefixed:8000"),
            ("KAM_EXPORT_DIR", "/tmp/exports"),
        ]),
    );
    assert_eq!(settings.api_base_url, "http://prefixed:8000");
    assert_eq!(settings.export_dir, PathBuf::from("/tmp/exports"));
}

#[test]
fn file_settings_override_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dashboard.toml");
    fs::write(
        &path,
        "api_base_url = \"http://scores.internal:9000/\"\nexport_dir = \"out\"\n",
    )
    .expect("write config");

    let mut settings = Settings::default();
    let raw = fs::read_to_string(&path).expect("read");
    apply_file(&mut settings, toml::from_str(&raw).expect("parse"));
    assert_eq!(settings.api_base_url, "http://scores.internal:9000/");
    assert_eq!(settings.export_dir, PathBuf::from("out"));
}

#[test]
fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(&dir.path().join("absent.toml")).expect("settings");
    // Environment may override in CI; only the shape is checked here.
    assert!(settings.api_base_url.starts_with("http"));
    assert!(!settings.api_base_url.ends_with('/'));
}
