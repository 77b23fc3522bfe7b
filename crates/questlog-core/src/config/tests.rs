use super::*;

#[test]
fn test_defaults_when_sections_missing() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.questlog.name, "questlog");
    assert_eq!(cfg.store.db_path, "~/.questlog/challenges.db");
    assert_eq!(cfg.pager.page_size, 10);
    assert_eq!(cfg.pager.idle_timeout_secs, 60);
    assert_eq!(cfg.pager.policy, PagePolicy::Wrap);
    assert_eq!(cfg.search.min_score, 50);
    assert_eq!(cfg.search.limit, 20);
    assert!(cfg.channel.telegram.is_none());
}

#[test]
fn test_full_config_from_toml() {
    let toml_str = r#"
        [questlog]
        data_dir = "/srv/questlog"

        [store]
        db_path = "/srv/questlog/challenges.db"

        [pager]
        page_size = 5
        idle_timeout_secs = 30
        policy = "clamp"

        [search]
        min_score = 70
        limit = 5

        [channel.telegram]
        enabled = true
        bot_token = "123:abc"
        allowed_users = [1, 2]
        admin_users = [1]
    "#;
    let cfg = parse(toml_str).unwrap();
    assert_eq!(cfg.questlog.data_dir, "/srv/questlog");
    assert_eq!(cfg.questlog.log_level, "info");
    assert_eq!(cfg.store.db_path, "/srv/questlog/challenges.db");
    assert_eq!(cfg.pager.page_size, 5);
    assert_eq!(cfg.pager.policy, PagePolicy::Clamp);
    assert_eq!(cfg.search.min_score, 70);

    let tg = cfg.channel.telegram.unwrap();
    assert!(tg.enabled);
    assert_eq!(tg.bot_token, "123:abc");
    assert!(tg.is_allowed(2));
    assert!(!tg.is_allowed(3));
    assert!(tg.is_admin(1));
    assert!(!tg.is_admin(2));
}

#[test]
fn test_empty_lists_allow_everyone() {
    let tg = TelegramConfig::default();
    assert!(tg.is_allowed(42));
    assert!(tg.is_admin(42));
}

#[test]
fn test_validate_rejects_zero_page_size() {
    let cfg = parse("[pager]\npage_size = 0").unwrap();
    assert!(matches!(cfg.validate(), Err(QuestError::Config(_))));
}

#[test]
fn test_validate_rejects_score_above_100() {
    let cfg = parse("[search]\nmin_score = 101").unwrap();
    assert!(cfg.validate().is_err());
}

#[test]
fn test_parse_error_is_config_error() {
    let err = parse("[pager\npage_size = 3").unwrap_err();
    assert!(matches!(err, QuestError::Config(_)));
}

#[test]
fn test_token_override_fills_empty_token() {
    let mut cfg = Config::default();
    apply_token_override(&mut cfg, "999:env");
    assert_eq!(cfg.channel.telegram.as_ref().unwrap().bot_token, "999:env");

    // An explicit token in the file wins.
    let mut cfg = parse("[channel.telegram]\nbot_token = \"111:file\"").unwrap();
    apply_token_override(&mut cfg, "999:env");
    assert_eq!(cfg.channel.telegram.unwrap().bot_token, "111:file");
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let cfg = load("/nonexistent/__questlog_config__.toml").unwrap();
    assert_eq!(cfg.pager.page_size, 10);
    assert!(cfg.loaded_from.is_none());
}

#[test]
fn test_load_records_source_file() {
    let path = std::env::temp_dir().join(format!("__questlog_config_{}.toml", std::process::id()));
    std::fs::write(&path, "[pager]\npage_size = 4\n").unwrap();

    let cfg = load(path.to_str().unwrap()).unwrap();
    assert_eq!(cfg.pager.page_size, 4);
    assert_eq!(cfg.loaded_from.as_deref(), Some(path.as_path()));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_shellexpand_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let expanded = shellexpand("~/.questlog/challenges.db");
        assert_eq!(
            expanded,
            format!("{}/.questlog/challenges.db", home.to_string_lossy())
        );
    }
    assert_eq!(shellexpand("/abs/path.db"), "/abs/path.db");
}
