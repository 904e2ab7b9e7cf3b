use nextkey_crypto::CipherRegistry;
use nextkey_server::ServerConfig;
use pretty_assertions::assert_eq;
use std::io::Write;

fn write_config(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn toml_file_overrides_defaults() {
    let (_dir, path) = write_config(
        "nextkey.toml",
        r#"
[server]
bind_addr = "127.0.0.1:9000"

[database]
path = "/var/lib/nextkey/licenses.db"

[security]
jwt_secret = "from-file"
replay_window_secs = 120
nonce_retention_secs = 1200

[rate_limit]
login_max = 10
"#,
    );

    let config = ServerConfig::load(Some(&path)).unwrap();
    assert_eq!(config.server.bind_addr, "127.0.0.1:9000");
    assert_eq!(config.database.path, "/var/lib/nextkey/licenses.db");
    assert_eq!(config.security.jwt_secret, "from-file");
    assert_eq!(config.security.replay_window_secs, 120);
    assert_eq!(config.rate_limit.login_max, 10);

    // Untouched fields keep their defaults.
    assert_eq!(config.server.request_timeout_secs, 30);
    assert_eq!(config.security.access_token_ttl_secs, 900);
    assert_eq!(config.rate_limit.login_window_secs, 60);
    config.validate(&CipherRegistry::with_defaults()).unwrap();
}

#[test]
fn file_with_inconsistent_retention_fails_validation() {
    let (_dir, path) = write_config(
        "nextkey.toml",
        r#"
[security]
replay_window_secs = 600
nonce_retention_secs = 300
"#,
    );

    let config = ServerConfig::load(Some(&path)).unwrap();
    let err = config.validate(&CipherRegistry::with_defaults()).unwrap_err();
    assert!(err.to_string().contains("nonce_retention_secs"), "{err}");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(ServerConfig::load(Some(&path)).is_err());
}
