use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_when_nothing_set() {
    let cfg = FleetConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.api.base_url, DEFAULT_API_BASE_URL);
    assert_eq!(cfg.api.timeouts, ApiTimeouts::default());
    assert_eq!(cfg.token_path, None);
}

#[test]
fn parses_overrides_and_trims_trailing_slash() {
    let cfg = FleetConfig::from_lookup(lookup_from(&[
        ("FLEET_API_BASE_URL", "https://fleet.example.test/api/"),
        ("FLEET_TOKEN_PATH", "/tmp/fleet/token"),
        ("FLEET_REQUEST_TIMEOUT_SECS", "42"),
        ("FLEET_CONNECT_TIMEOUT_SECS", "7"),
    ]))
    .unwrap();
    assert_eq!(cfg.api.base_url, "https://fleet.example.test/api");
    assert_eq!(cfg.token_path, Some(PathBuf::from("/tmp/fleet/token")));
    assert_eq!(cfg.api.timeouts, ApiTimeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.api.timeouts.request(), Duration::from_secs(42));
}

#[test]
fn bad_timeouts_fall_back_to_defaults() {
    let cfg = FleetConfig::from_lookup(lookup_from(&[
        ("FLEET_REQUEST_TIMEOUT_SECS", "soon"),
        ("FLEET_CONNECT_TIMEOUT_SECS", "-1"),
    ]))
    .unwrap();
    assert_eq!(cfg.api.timeouts, ApiTimeouts::default());
}

#[test]
fn blank_token_path_means_memory() {
    let cfg = FleetConfig::from_lookup(lookup_from(&[("FLEET_TOKEN_PATH", "  ")])).unwrap();
    assert_eq!(cfg.token_path, None);
}

#[test]
fn non_http_base_url_errors() {
    let err = FleetConfig::from_lookup(lookup_from(&[("FLEET_API_BASE_URL", "ftp://fleet")]))
        .unwrap_err()
        .to_string();
    assert!(err.contains("must start with http"));
}

#[test]
fn base_url_without_host_errors() {
    assert!(ApiConfig::new("https://").is_err());
    assert!(ApiConfig::new("http:///").is_err());
}

#[test]
fn api_config_new_uses_default_timeouts() {
    let api = ApiConfig::new("http://localhost:8080/").unwrap();
    assert_eq!(api.base_url, "http://localhost:8080");
    assert_eq!(api.timeouts, ApiTimeouts::default());
}
