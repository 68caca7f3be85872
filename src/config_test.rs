use std::collections::HashMap;

use super::*;

fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn chat_config_defaults() {
    let cfg = ChatConfig::from_source(source(&[])).unwrap();
    assert_eq!(cfg, ChatConfig::default());
    assert_eq!(cfg.endpoint, DEFAULT_CHAT_ENDPOINT);
    assert_eq!(
        cfg.timeouts,
        ChatTimeouts { request_secs: DEFAULT_CHAT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CHAT_CONNECT_TIMEOUT_SECS }
    );
}

#[test]
fn chat_config_reads_overrides() {
    let cfg = ChatConfig::from_source(source(&[
        ("CHAT_ENDPOINT", " https://chat.example.com/api/chat "),
        ("CHAT_REQUEST_TIMEOUT_SECS", "45"),
        ("CHAT_CONNECT_TIMEOUT_SECS", "3"),
    ]))
    .unwrap();
    assert_eq!(cfg.endpoint, "https://chat.example.com/api/chat");
    assert_eq!(cfg.timeouts, ChatTimeouts { request_secs: 45, connect_secs: 3 });
}

#[test]
fn chat_config_rejects_non_http_endpoint() {
    let err = ChatConfig::from_source(source(&[("CHAT_ENDPOINT", "ftp://nope")])).unwrap_err();
    assert_eq!(err, ConfigError::InvalidEndpoint("ftp://nope".into()));
}

#[test]
fn unparseable_timeout_falls_back_to_default() {
    let cfg = ChatConfig::from_source(source(&[("CHAT_REQUEST_TIMEOUT_SECS", "soon")])).unwrap();
    assert_eq!(cfg.timeouts.request_secs, DEFAULT_CHAT_REQUEST_TIMEOUT_SECS);
}

#[test]
fn with_endpoint_validates() {
    let cfg = ChatConfig::default().with_endpoint("http://localhost:9000/chat").unwrap();
    assert_eq!(cfg.endpoint, "http://localhost:9000/chat");
    assert!(ChatConfig::default().with_endpoint("localhost").is_err());
}

#[test]
fn view_config_defaults() {
    let cfg = ViewConfig::from_source(source(&[])).unwrap();
    assert_eq!(cfg, ViewConfig::default());
    assert_eq!(cfg.scroll_throttle, Duration::from_millis(100));
    assert_eq!(cfg.window.threshold, 50);
    assert!((cfg.window.item_height - 120.0).abs() < f64::EPSILON);
    assert_eq!(cfg.window.overscan, 5);
}

#[test]
fn view_config_reads_overrides() {
    let cfg = ViewConfig::from_source(source(&[
        ("CHAT_SCROLL_THROTTLE_MS", "250"),
        ("CHAT_VIRTUALIZE_THRESHOLD", "10"),
        ("CHAT_ITEM_HEIGHT_PX", "80.5"),
        ("CHAT_OVERSCAN", "2"),
    ]))
    .unwrap();
    assert_eq!(cfg.scroll_throttle, Duration::from_millis(250));
    assert_eq!(cfg.window.threshold, 10);
    assert!((cfg.window.item_height - 80.5).abs() < f64::EPSILON);
    assert_eq!(cfg.window.overscan, 2);
}

#[test]
fn view_config_rejects_non_positive_item_height() {
    for bad in ["0", "-4", "NaN", "inf"] {
        let err = ViewConfig::from_source(source(&[("CHAT_ITEM_HEIGHT_PX", bad)])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "CHAT_ITEM_HEIGHT_PX", .. }), "{bad}");
    }
}
