//! Command Line Interface
//!
//! Flags override the config file and `PARTCHAT_*` environment variables.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use partchat_core::{
    default_config_path, load_config_from_path, ChatConfig, ConfigOverrides, OverlapPolicy,
};

/// partchat - terminal chat client for the parts assistant
#[derive(Parser, Debug, Default)]
#[command(name = "partchat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, env = "PARTCHAT_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Chat endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Static user id sent with every request
    #[arg(short = 'u', long, value_name = "ID")]
    pub user_id: Option<String>,

    /// Request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Start with an empty conversation instead of the greeting
    #[arg(long)]
    pub no_greeting: bool,

    /// What to do when Enter is pressed while a reply is pending (reject, latest-wins)
    #[arg(long, value_name = "POLICY")]
    pub overlap_policy: Option<OverlapPolicy>,

    /// Log file (default: $XDG_CACHE_HOME/partchat/partchat.log)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Overrides carried by the flags
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            user_id: self.user_id.clone(),
            timeout_secs: self.timeout_secs,
            no_greeting: self.no_greeting,
            overlap_policy: self.overlap_policy,
        }
    }

    /// Load file and environment config, then apply the flags
    ///
    /// Validation runs once all three layers are merged. A missing default
    /// config file is fine; a missing `--config` file is not.
    pub fn load_config(&self) -> Result<ChatConfig> {
        let path = match &self.config {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                Some(path.clone())
            }
            None => default_config_path(),
        };

        load_config_from_path(path, &self.overrides()).context("Failed to load configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "partchat",
            "--endpoint",
            "http://example.test/api/v1/chat",
            "--user-id",
            "user123",
            "--timeout-secs",
            "30",
            "--no-greeting",
            "--overlap-policy",
            "latest-wins",
            "--log-file",
            "/tmp/partchat.log",
        ])
        .unwrap();

        assert_eq!(cli.endpoint.as_deref(), Some("http://example.test/api/v1/chat"));
        assert_eq!(cli.user_id.as_deref(), Some("user123"));
        assert_eq!(cli.timeout_secs, Some(30));
        assert!(cli.no_greeting);
        assert_eq!(cli.overlap_policy, Some(OverlapPolicy::LatestWins));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/partchat.log")));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let result = Cli::try_parse_from(["partchat", "--overlap-policy", "queue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_means_no_overrides() {
        let cli = Cli::try_parse_from(["partchat"]).unwrap();
        assert!(cli.overrides().is_empty());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[client]
endpoint = "http://file.test/api/v1/chat"
timeout_secs = 10
"#
        )
        .unwrap();

        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            endpoint: Some("http://cli.test/api/v1/chat".to_string()),
            no_greeting: true,
            ..Cli::default()
        };
        let config = cli.load_config().unwrap();

        assert_eq!(config.endpoint, "http://cli.test/api/v1/chat");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
        assert!(config.controller_options().greeting.is_none());
    }

    #[test]
    fn test_flag_replaces_invalid_file_value() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[client]
endpoint = "not a url"

[conversation]
greeting = ""
"#
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "partchat",
            "--config",
            file.path().to_str().unwrap(),
            "--endpoint",
            "http://cli.test/api/v1/chat",
            "--no-greeting",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.endpoint, "http://cli.test/api/v1/chat");
        assert!(config.controller_options().greeting.is_none());
    }

    #[test]
    fn test_invalid_flag_is_an_error() {
        let cli = Cli {
            endpoint: Some("localhost:8000".to_string()),
            ..Cli::default()
        };
        let err = cli.load_config().unwrap_err();
        assert!(format!("{err:#}").contains("Invalid configuration"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let cli = Cli {
            config: Some(PathBuf::from("/definitely/not/here/partchat.toml")),
            ..Cli::default()
        };
        let err = cli.load_config().unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
