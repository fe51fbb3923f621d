use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const APP_DIR: &str = "collabsync";
const LOCAL_FILE: &str = ".collabsyncrc";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub follow: bool,
    pub dump: bool,
    pub publish_cursor: bool,
    pub user_id: Option<String>,
    pub poll_ms: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            follow: self.follow || other.follow,
            dump: self.dump || other.dump,
            publish_cursor: self.publish_cursor || other.publish_cursor,
            user_id: other.user_id.clone().or_else(|| self.user_id.clone()),
            poll_ms: other.poll_ms.or(self.poll_ms),
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_FILE)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_FILE)
}

/// Read a flag file. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

/// # Errors
///
/// Returns an error if the file or its directory cannot be written.
pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# collabsync defaults (saved with --save)".to_string()];
    if flags.follow {
        lines.push("--follow".to_string());
    }
    if flags.dump {
        lines.push("--dump".to_string());
    }
    if flags.publish_cursor {
        lines.push("--publish-cursor".to_string());
    }
    if let Some(user) = &flags.user_id {
        lines.push(format!("--user-id {user}"));
    }
    if let Some(ms) = flags.poll_ms {
        lines.push(format!("--poll-ms {ms}"));
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick the known flags out of a token list; anything else is ignored.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--follow" => flags.follow = true,
            "--dump" => flags.dump = true,
            "--publish-cursor" => flags.publish_cursor = true,
            "--user-id" | "--poll-ms" | "--log-file" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        i += 1;
                        tokens.get(i).map(String::as_str)
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--user-id" => flags.user_id = Some(value.to_string()),
        "--poll-ms" => flags.poll_ms = value.parse().ok(),
        "--log-file" => flags.log_file = Some(PathBuf::from(value)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let flags = parse_flag_tokens(&tokens(&[
            "collabsync",
            "--follow",
            "--publish-cursor",
            "--user-id",
            "alice",
            "--poll-ms=25",
            "--log-file",
            "sync.log",
            "inbound.jsonl",
        ]));
        assert!(flags.follow);
        assert!(!flags.dump);
        assert!(flags.publish_cursor);
        assert_eq!(flags.user_id.as_deref(), Some("alice"));
        assert_eq!(flags.poll_ms, Some(25));
        assert_eq!(flags.log_file, Some(PathBuf::from("sync.log")));
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_poll_interval() {
        let flags = parse_flag_tokens(&tokens(&["--poll-ms", "soon", "--dump"]));
        assert_eq!(flags.poll_ms, None);
        assert!(flags.dump);
    }

    #[test]
    fn test_trailing_value_flag_without_value() {
        let flags = parse_flag_tokens(&tokens(&["--user-id"]));
        assert_eq!(flags.user_id, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            follow: true,
            user_id: Some("file_user".to_string()),
            poll_ms: Some(100),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            dump: true,
            user_id: Some("cli_user".to_string()),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.follow);
        assert!(merged.dump);
        assert_eq!(merged.user_id.as_deref(), Some("cli_user"));
        assert_eq!(merged.poll_ms, Some(100));
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            follow: true,
            dump: true,
            publish_cursor: true,
            user_id: Some("bob".to_string()),
            poll_ms: Some(40),
            log_file: Some(PathBuf::from("sync.log")),
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
        assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
    }

    #[test]
    fn test_comments_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCAL_FILE);
        fs::write(&path, "# --dump\n--follow\n").unwrap();
        let flags = load_config_flags(&path).unwrap();
        assert!(flags.follow);
        assert!(!flags.dump);
    }
}
