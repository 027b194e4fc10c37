#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::io::Write;

use hrpc_server::config::{self, Mode};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |k| map.get(k).cloned()
}

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:8080"
  max_body_byte: 4096 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind(), "BAD_REQUEST");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
services: ["greeter"]
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.services, vec!["greeter"]);
    assert_eq!(cfg.server.mode, Mode::Http);
    assert_eq!(cfg.server.listen, "0.0.0.0:8080");
    assert_eq!(cfg.server.max_body_bytes, 4 * 1024 * 1024);
}

#[test]
fn wrong_version_is_rejected() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.kind(), "UNSUPPORTED_VERSION");
}

#[test]
fn services_must_be_known_and_non_empty() {
    let err = config::load_from_str("version: 1\nservices: []\n").expect_err("must fail");
    assert_eq!(err.kind(), "BAD_REQUEST");

    let err = config::load_from_str("version: 1\nservices: [\"billing\"]\n").expect_err("must fail");
    assert!(err.to_string().contains("billing"));
}

#[test]
fn body_limit_is_bounded() {
    for n in [512, 128 * 1024 * 1024] {
        let yaml = format!("version: 1\nserver:\n  max_body_bytes: {n}\n");
        let err = config::load_from_str(&yaml).expect_err("must fail");
        assert_eq!(err.kind(), "BAD_REQUEST", "n={n}");
    }
}

#[test]
fn env_overrides_apply_over_defaults() {
    let cfg = config::load_with(env(&[("PORT", "9090"), ("RUN_LAMBDA", "1"), ("BASE_URL", "/api")])).unwrap();
    assert_eq!(cfg.server.listen, "0.0.0.0:9090");
    assert_eq!(cfg.server.mode, Mode::Serverless);
    assert_eq!(cfg.server.base_path, "/api");
    assert_eq!(cfg.server.route_prefix(), Some("/api"));
    assert_eq!(cfg.services.len(), 3);
}

#[test]
fn run_lambda_other_than_one_keeps_http() {
    let cfg = config::load_with(env(&[("RUN_LAMBDA", "true")])).unwrap();
    assert_eq!(cfg.server.mode, Mode::Http);
    assert_eq!(cfg.server.route_prefix(), None);
}

#[test]
fn bad_env_values_are_config_errors() {
    let err = config::load_with(env(&[("PORT", "http")])).unwrap_err();
    assert_eq!(err.kind(), "CONFIG");

    let err = config::load_with(env(&[("BASE_URL", "api")])).unwrap_err();
    assert_eq!(err.kind(), "CONFIG");
}

#[test]
fn config_file_then_env() {
    let dir = std::env::temp_dir().join(format!("hrpc-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("hrpc.yaml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "version: 1\nserver:\n  listen: \"127.0.0.1:7000\"\n  base_path: /rpc\nservices: [cart]").unwrap();

    let path_str = path.to_string_lossy().to_string();
    let cfg = config::load_with(env(&[(config::CONFIG_PATH_ENV, path_str.as_str())])).unwrap();
    assert_eq!(cfg.server.listen, "127.0.0.1:7000");
    assert_eq!(cfg.server.base_path, "/rpc");
    assert_eq!(cfg.services, vec!["cart"]);

    let cfg = config::load_with(env(&[(config::CONFIG_PATH_ENV, path_str.as_str()), ("PORT", "8181")])).unwrap();
    assert_eq!(cfg.server.listen, "0.0.0.0:8181");

    let err = config::load_with(env(&[(config::CONFIG_PATH_ENV, "/nonexistent/hrpc.yaml")])).unwrap_err();
    assert_eq!(err.kind(), "CONFIG");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn ops_path_service_names_are_reserved_at_root() {
    let err = config::load_from_str("version: 1\nservices: [\"metrics\"]\n").expect_err("must fail");
    assert_eq!(err.kind(), "BAD_REQUEST");
    assert!(err.to_string().contains("reserved"), "{err}");
}
