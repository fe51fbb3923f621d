use std::path::PathBuf;

use collabsync::config::{ConfigFlags, load_config_flags, parse_flag_tokens};

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".collabsyncrc");
    let content = r#"
# comment
--follow

--user-id alice

--log-file=sync.log
"#;
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert!(flags.follow);
    assert_eq!(flags.user_id.as_deref(), Some("alice"));
    assert_eq!(flags.log_file, Some(PathBuf::from("sync.log")));
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".collabsyncrc");
    let content = "--follow\n--user-id alice\n--log-file file.log\n";
    std::fs::write(&path, content).unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_args = vec![
        "collabsync".to_string(),
        "--user-id".to_string(),
        "bob".to_string(),
        "--publish-cursor".to_string(),
    ];
    let cli_flags = parse_flag_tokens(&cli_args);

    let effective = file_flags.union(&cli_flags);
    assert!(effective.follow, "file flags should remain enabled");
    assert!(effective.publish_cursor, "cli flags should be applied");
    assert_eq!(effective.user_id.as_deref(), Some("bob"), "cli should override user id");
    assert_eq!(
        effective.log_file,
        Some(PathBuf::from("file.log")),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_parse_flag_tokens_handles_equals_syntax() {
    let args = vec![
        "collabsync".to_string(),
        "--poll-ms=10".to_string(),
        "--log-file=sync.log".to_string(),
    ];
    let flags = parse_flag_tokens(&args);
    assert_eq!(flags.poll_ms, Some(10));
    assert_eq!(flags.log_file, Some(PathBuf::from("sync.log")));
}

#[test]
fn test_config_union_merges_booleans() {
    let file = ConfigFlags {
        follow: true,
        dump: true,
        ..ConfigFlags::default()
    };
    let cli = ConfigFlags {
        publish_cursor: true,
        ..ConfigFlags::default()
    };
    let merged = file.union(&cli);
    assert!(merged.follow);
    assert!(merged.dump);
    assert!(merged.publish_cursor);
}

#[test]
fn test_unparsable_poll_interval_in_file_falls_back_to_cli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".collabsyncrc");
    std::fs::write(&path, "--poll-ms later\n--dump\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    assert_eq!(file_flags.poll_ms, None, "a non-numeric interval is ignored");
    assert!(file_flags.dump, "flags after the bad value still apply");

    let cli_flags = parse_flag_tokens(&["collabsync".to_string(), "--poll-ms=15".to_string()]);
    assert_eq!(file_flags.union(&cli_flags).poll_ms, Some(15));
    assert_eq!(file_flags.union(&ConfigFlags::default()).poll_ms, None);
}

#[test]
fn test_user_id_value_is_not_read_as_a_flag() {
    let flags = parse_flag_tokens(&[
        "--user-id".to_string(),
        "--dump".to_string(),
        "--follow".to_string(),
    ]);
    assert_eq!(flags.user_id.as_deref(), Some("--dump"));
    assert!(!flags.dump);
    assert!(flags.follow);
}
