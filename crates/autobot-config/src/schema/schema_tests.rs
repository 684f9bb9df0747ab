use super::*;

#[test]
fn test_config_default() {
    let config = BotConfig::default();
    assert!(!config.hosted());
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 10000);
    assert!(config.headless());
    assert_eq!(config.poller.check_interval_secs, 180);
}

#[test]
fn test_local_paths() {
    let config = BotConfig::default();
    assert_eq!(config.browser_cache_dir(), PathBuf::from("playwright_browsers"));
    assert_eq!(config.profile_dir(), PathBuf::from("wati_profile"));
    assert_eq!(
        config.storage_state_path(),
        PathBuf::from("wati_profile").join("storage.json")
    );
}

#[test]
fn test_hosted_paths() {
    let mut config = BotConfig::default();
    config.environment.hosted = true;
    assert_eq!(
        config.browser_cache_dir(),
        PathBuf::from("/tmp/playwright-browsers")
    );
    assert_eq!(
        config.profile_dir(),
        PathBuf::from("/opt/render/project/src/wati_profile")
    );
}

#[test]
fn test_explicit_paths_win() {
    let mut config = BotConfig::default();
    config.environment.hosted = true;
    config.browser.cache_dir = Some(PathBuf::from("/srv/browsers"));
    config.profile.dir = Some(PathBuf::from("/srv/profile"));
    assert_eq!(config.browser_cache_dir(), PathBuf::from("/srv/browsers"));
    assert_eq!(config.profile_dir(), PathBuf::from("/srv/profile"));
}

#[test]
fn test_sandbox_follows_environment() {
    let mut config = BotConfig::default();
    assert!(config.sandbox_enabled());

    config.environment.hosted = true;
    assert!(!config.sandbox_enabled());

    config.browser.sandbox = Some(true);
    assert!(config.sandbox_enabled());
}

#[test]
fn test_interactive_fallback_resolution() {
    let mut config = BotConfig::default();
    assert!(config.interactive_fallback(true));
    assert!(!config.interactive_fallback(false));

    config.environment.hosted = true;
    assert!(!config.interactive_fallback(true));

    config.login.interactive_fallback = Some(true);
    assert!(config.interactive_fallback(false));
}

#[test]
fn test_credentials_missing_fields() {
    let creds = Credentials::default();
    assert_eq!(creds.missing_fields(), vec!["email", "password", "tenant_id"]);

    let creds = Credentials {
        email: Some("ops@example.com".to_string()),
        password: Some("   ".to_string()),
        tenant_id: Some("1037246".to_string()),
    };
    assert_eq!(creds.missing_fields(), vec!["password"]);

    let creds = Credentials::new("ops@example.com", "hunter2", "1037246");
    assert!(creds.missing_fields().is_empty());
}

#[test]
fn test_credentials_debug_redacts_password() {
    let creds = Credentials::new("ops@example.com", "hunter2", "1037246");
    let debug = format!("{:?}", creds);
    assert!(debug.contains("ops@example.com"));
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains("hunter2"));
}

#[test]
fn test_credentials_never_serialize_password() {
    let creds = Credentials::new("ops@example.com", "hunter2", "1037246");
    let json = serde_json::to_string(&creds).unwrap();
    assert!(!json.contains("hunter2"));
    assert!(json.contains("1037246"));
}

#[test]
fn test_default_selectors() {
    let selectors = InboxSelectors::default();
    assert_eq!(selectors.landmark_text, "Team Inbox");
    assert_eq!(selectors.unread_indicator, "div.conversation-item__unread-count");
    assert_eq!(selectors.routing_flow, "#flow-nav-68ff67df4f393f0757f108d8");
}

#[test]
fn test_poller_durations() {
    let poller = PollerConfig::default();
    assert_eq!(poller.check_interval(), std::time::Duration::from_secs(180));
    assert_eq!(poller.open_settle(), std::time::Duration::from_millis(2500));
    assert_eq!(poller.menu_settle(), std::time::Duration::from_millis(1500));
}
