// Credential store: the single JSON file that carries the logged-in session
// between invocations. Read once at startup, rewritten at most once per
// command (login, project switch) and deleted on logout or expiry.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sessions older than this are discarded.
pub const SESSION_LIFETIME_HOURS: i64 = 24;

/// On-disk shape of the credential file. Every field is optional so that a
/// half-written or hand-edited file still loads and can be cleaned up.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StoredCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cbrain_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    /// ISO-8601 issue time of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_group_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_group_name: Option<String>,
}

/// A complete credential set: everything an authenticated request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub cbrain_url: String,
    pub api_token: String,
    pub user_id: u64,
    pub issued_at: Option<DateTime<Local>>,
    pub current_group_id: Option<u64>,
    pub current_group_name: Option<String>,
}

impl StoredCredentials {
    /// Fresh credentials for a login that just succeeded.
    pub fn issued_now(cbrain_url: &str, api_token: &str, user_id: Option<u64>) -> Self {
        StoredCredentials {
            cbrain_url: Some(cbrain_url.to_string()),
            api_token: Some(api_token.to_string()),
            user_id,
            timestamp: Some(Local::now().to_rfc3339()),
            current_group_id: None,
            current_group_name: None,
        }
    }

    /// Parse the issue timestamp. Accepts RFC 3339 and the offset-less
    /// ISO-8601 form (read as local time).
    pub fn issued_at(&self) -> Option<DateTime<Local>> {
        let raw = self.timestamp.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Local));
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local.from_local_datetime(&naive).earliest()
    }

    /// True when the token was issued more than a day before `now`.
    pub fn is_expired_at(&self, now: DateTime<Local>) -> bool {
        match self.issued_at() {
            Some(issued) => now.signed_duration_since(issued).num_seconds() > SESSION_LIFETIME_HOURS * 3600,
            None => false,
        }
    }

    /// Promote to a complete credential set, or `None` if url, token or
    /// user id is missing.
    pub fn complete(&self) -> Option<Credentials> {
        let cbrain_url = self.cbrain_url.clone().filter(|s| !s.is_empty())?;
        let api_token = self.api_token.clone().filter(|s| !s.is_empty())?;
        let user_id = self.user_id?;
        Some(Credentials {
            cbrain_url,
            api_token,
            user_id,
            issued_at: self.issued_at(),
            current_group_id: self.current_group_id,
            current_group_name: self.current_group_name.clone(),
        })
    }
}

/// Handle on the credential file location.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the file. `Ok(None)` when it does not exist; a file that is not
    /// valid JSON is reported as a configuration error.
    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let creds = serde_json::from_str(&data).map_err(|e| {
            Error::Config(format!("invalid credential file {}: {}", self.path.display(), e))
        })?;
        Ok(Some(creds))
    }

    /// Write the file as indented JSON, creating parent directories.
    pub fn save(&self, creds: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(creds)
            .map_err(|e| Error::Config(format!("cannot serialize credentials: {}", e)))?;
        fs::write(&self.path, data)?;
        Ok(())
    }

    /// Remove the file. Removing a file that is already gone is not an error.
    pub fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn accepts_naive_iso_timestamps() {
        let creds = StoredCredentials {
            timestamp: Some("2025-08-01T10:15:30.123456".into()),
            ..Default::default()
        };
        let issued = creds.issued_at().unwrap();
        assert_eq!(issued.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-08-01 10:15:30");
    }

    #[test]
    fn expiry_is_strictly_after_one_day() {
        let now = Local::now();
        let mut creds = StoredCredentials::issued_now("http://x", "tok", Some(1));
        assert!(!creds.is_expired_at(now));

        creds.timestamp = Some((now - Duration::hours(25)).to_rfc3339());
        assert!(creds.is_expired_at(now));

        creds.timestamp = Some((now - Duration::hours(23)).to_rfc3339());
        assert!(!creds.is_expired_at(now));
    }

    #[test]
    fn incomplete_credentials_do_not_promote() {
        let mut creds = StoredCredentials::issued_now("http://x", "tok", None);
        assert!(creds.complete().is_none());
        creds.user_id = Some(3);
        assert_eq!(creds.complete().unwrap().user_id, 3);
        creds.api_token = Some(String::new());
        assert!(creds.complete().is_none());
    }

    #[test]
    fn save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("credentials.json"));
        assert!(store.load().unwrap().is_none());

        let mut creds = StoredCredentials::issued_now("http://cbrain", "abc", Some(9));
        creds.current_group_id = Some(4);
        store.save(&creds).unwrap();
        assert_eq!(store.load().unwrap(), Some(creds));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"cbrain_url\""));
        assert!(raw.contains("\"api_token\""));

        store.delete().unwrap();
        assert!(!store.exists());
        store.delete().unwrap();
    }
}
