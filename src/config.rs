// Process configuration read from the environment at startup.

use std::path::PathBuf;

/// Server offered at the login prompt when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Fallback terminal width when the real one cannot be detected.
pub const DEFAULT_TERMINAL_WIDTH: usize = 120;

/// Settings that come from the environment rather than the command line.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the credential JSON file lives.
    pub credentials_path: PathBuf,
    /// Default answer for the server URL prompt during login.
    pub default_url: String,
    /// Explicit tracing filter, overriding the verbosity flag.
    pub log_filter: Option<String>,
}

impl Config {
    /// Build the configuration from `CBRAIN_CREDENTIALS`, `CBRAIN_URL` and
    /// `CBRAIN_LOG`, falling back to built-in defaults.
    pub fn from_env() -> Self {
        let credentials_path = std::env::var_os("CBRAIN_CREDENTIALS")
            .map(PathBuf::from)
            .unwrap_or_else(default_credentials_path);
        let default_url =
            std::env::var("CBRAIN_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let log_filter = std::env::var("CBRAIN_LOG").ok().filter(|s| !s.is_empty());
        Config {
            credentials_path,
            default_url,
            log_filter,
        }
    }
}

/// `<config dir>/cbrain/credentials.json`, or the home directory when the
/// platform has no config dir.
pub fn default_credentials_path() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("cbrain").join("credentials.json")
}
