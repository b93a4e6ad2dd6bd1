// Session lifecycle: which state the local installation is in (anonymous,
// authenticated, expired) and the transitions between them. A `Session` is
// built once at process start and handed to every command.

use crate::api::ApiClient;
use crate::credentials::{CredentialStore, Credentials, StoredCredentials};
use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::path::Path;
use tracing::{info, warn};

/// Where the local session stands for this invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No credential file.
    Anonymous,
    /// The credential file was older than a day and has been deleted.
    Expired,
    /// A credential file exists but lacks url, token or user id (or is not
    /// valid JSON).
    Incomplete(StoredCredentials),
    Authenticated(Credentials),
}

/// How a logout ended. The local file is gone in every case.
#[derive(Debug, Clone, PartialEq)]
pub enum LogoutOutcome {
    /// The server accepted the DELETE.
    Confirmed,
    /// The server call failed; the reason is kept for reporting.
    RemoteFailed(String),
    /// Credentials were incomplete, so no server call was made.
    LocalOnly,
    /// The session had already expired and its file was removed at startup.
    AlreadyExpired,
}

pub struct Session {
    store: CredentialStore,
    state: SessionState,
}

impl Session {
    /// Load the credential file and apply the expiry check against the
    /// current time.
    pub fn load(store: CredentialStore) -> Result<Self> {
        Self::load_at(store, Local::now())
    }

    /// Same as [`Session::load`] with an explicit clock.
    pub fn load_at(store: CredentialStore, now: DateTime<Local>) -> Result<Self> {
        let stored = match store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                return Ok(Session {
                    store,
                    state: SessionState::Anonymous,
                })
            }
            Err(Error::Config(msg)) => {
                warn!("{}", msg);
                return Ok(Session {
                    store,
                    state: SessionState::Incomplete(StoredCredentials::default()),
                });
            }
            Err(e) => return Err(e),
        };

        if stored.is_expired_at(now) {
            info!(path = %store.path().display(), "session expired, removing credentials");
            store.delete()?;
            return Ok(Session {
                store,
                state: SessionState::Expired,
            });
        }

        let state = match stored.complete() {
            Some(creds) => SessionState::Authenticated(creds),
            None => SessionState::Incomplete(stored),
        };
        Ok(Session { store, state })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn credentials_path(&self) -> &Path {
        self.store.path()
    }

    /// Precondition for every authenticated command; checked before any
    /// network call.
    pub fn require_auth(&self) -> Result<&Credentials> {
        match &self.state {
            SessionState::Authenticated(creds) => Ok(creds),
            SessionState::Expired => Err(Error::SessionExpired),
            SessionState::Anonymous | SessionState::Incomplete(_) => Err(Error::NotLoggedIn),
        }
    }

    /// API client carrying the session token.
    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::authenticated(self.require_auth()?)
    }

    /// Login refuses to overwrite an existing credential file.
    pub fn ensure_can_login(&self) -> Result<()> {
        if self.store.exists() {
            return Err(Error::AlreadyLoggedIn);
        }
        Ok(())
    }

    /// POST the credentials to `server_url` and persist the returned token.
    pub fn login(&mut self, server_url: &str, username: &str, password: &str) -> Result<()> {
        self.ensure_can_login()?;
        if username.is_empty() {
            return Err(Error::Validation("Username is required".into()));
        }
        if password.is_empty() {
            return Err(Error::Validation("Password is required".into()));
        }

        let api = ApiClient::new(server_url)?;
        let reply = api.create_session(username, password)?;
        let token = reply
            .cbrain_api_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Auth("No API token received".into()))?;

        let stored = StoredCredentials::issued_now(api.base_url(), &token, reply.user_id);
        self.store.save(&stored)?;
        info!(user_id = ?reply.user_id, server = api.base_url(), "logged in");
        self.state = match stored.complete() {
            Some(creds) => SessionState::Authenticated(creds),
            None => SessionState::Incomplete(stored),
        };
        Ok(())
    }

    /// Try to end the session on the server, then always delete the local
    /// credential file.
    pub fn logout(&mut self) -> Result<LogoutOutcome> {
        let outcome = match &self.state {
            SessionState::Anonymous => return Err(Error::NotLoggedIn),
            SessionState::Expired => LogoutOutcome::AlreadyExpired,
            SessionState::Incomplete(_) => LogoutOutcome::LocalOnly,
            SessionState::Authenticated(creds) => {
                match ApiClient::authenticated(creds).and_then(|api| api.destroy_session()) {
                    Ok(_) => LogoutOutcome::Confirmed,
                    Err(e) => {
                        warn!(error = %e, "server-side logout failed");
                        LogoutOutcome::RemoteFailed(e.to_string())
                    }
                }
            }
        };
        self.store.delete()?;
        self.state = SessionState::Anonymous;
        info!("logged out");
        Ok(outcome)
    }

    /// Remember the current project in the credential file.
    pub fn set_current_project(&mut self, group_id: u64, name: &str) -> Result<()> {
        self.update_project(Some(group_id), Some(name.to_string()))
    }

    pub fn clear_current_project(&mut self) -> Result<()> {
        self.update_project(None, None)
    }

    fn update_project(&mut self, group_id: Option<u64>, name: Option<String>) -> Result<()> {
        let mut stored = self.store.load()?.ok_or(Error::NotLoggedIn)?;
        stored.current_group_id = group_id;
        stored.current_group_name = name;
        self.store.save(&stored)?;
        if let SessionState::Authenticated(creds) = &mut self.state {
            creds.current_group_id = stored.current_group_id;
            creds.current_group_name = stored.current_group_name;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::TestServer;
    use chrono::Duration;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn store_in(dir: &tempfile::TempDir) -> CredentialStore {
        CredentialStore::new(dir.path().join("credentials.json"))
    }

    #[test]
    fn missing_file_is_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::load(store_in(&dir)).unwrap();
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(matches!(session.require_auth(), Err(Error::NotLoggedIn)));
    }

    #[test]
    fn stale_credentials_are_deleted_and_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut stored = StoredCredentials::issued_now("http://cbrain", "well-formed-token", Some(1));
        stored.timestamp = Some((Local::now() - Duration::hours(30)).to_rfc3339());
        store.save(&stored).unwrap();

        let session = Session::load(store.clone()).unwrap();
        assert_eq!(session.state(), &SessionState::Expired);
        assert!(!store.exists());
        assert!(matches!(session.require_auth(), Err(Error::SessionExpired)));
        // expired sessions may log in again
        assert!(session.ensure_can_login().is_ok());
    }

    #[test]
    fn incomplete_credentials_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&StoredCredentials::issued_now("http://cbrain", "tok", None))
            .unwrap();
        let session = Session::load(store).unwrap();
        assert!(matches!(session.state(), SessionState::Incomplete(_)));
        assert!(matches!(session.require_auth(), Err(Error::NotLoggedIn)));
        assert!(matches!(session.ensure_can_login(), Err(Error::AlreadyLoggedIn)));
    }

    #[test]
    fn garbage_file_loads_as_incomplete_and_logs_out_locally() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "not json").unwrap();
        let mut session = Session::load(store.clone()).unwrap();
        assert_eq!(session.logout().unwrap(), LogoutOutcome::LocalOnly);
        assert!(!store.exists());
    }

    #[test]
    fn login_persists_token() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/session"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"cbrain_api_token": "abc123", "user_id": 7})),
                ),
        );
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut session = Session::load(store.clone()).unwrap();
        session.login(&server.uri(), "bob", "pw").unwrap();

        let creds = session.require_auth().unwrap();
        assert_eq!(creds.api_token, "abc123");
        assert_eq!(creds.user_id, 7);
        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.api_token.as_deref(), Some("abc123"));
        assert!(saved.issued_at().is_some());
    }

    #[test]
    fn login_without_token_fails_and_writes_nothing() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("POST"))
                .and(path("/session"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user_id": 7}))),
        );
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut session = Session::load(store.clone()).unwrap();
        let err = session.login(&server.uri(), "bob", "pw").unwrap_err();
        assert_eq!(err.to_string(), "Login failed: No API token received");
        assert!(!store.exists());
    }

    #[test]
    fn login_refuses_existing_file_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&StoredCredentials::issued_now("http://127.0.0.1:1", "t", Some(1)))
            .unwrap();
        let mut session = Session::load(store).unwrap();
        let err = session.login("http://127.0.0.1:1", "bob", "pw").unwrap_err();
        assert!(matches!(err, Error::AlreadyLoggedIn));
    }

    #[test]
    fn logout_deletes_file_even_when_server_fails() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("DELETE"))
                .and(path("/session"))
                .and(header("authorization", "Bearer tok"))
                .respond_with(ResponseTemplate::new(401)),
        );
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&StoredCredentials::issued_now(&server.uri(), "tok", Some(1)))
            .unwrap();
        let mut session = Session::load(store.clone()).unwrap();
        let outcome = session.logout().unwrap();
        assert!(matches!(outcome, LogoutOutcome::RemoteFailed(_)));
        assert!(!store.exists());
        assert_eq!(session.state(), &SessionState::Anonymous);
    }

    #[test]
    fn logout_survives_unreachable_server() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&StoredCredentials::issued_now("http://127.0.0.1:1", "tok", Some(1)))
            .unwrap();
        let mut session = Session::load(store.clone()).unwrap();
        assert!(matches!(session.logout().unwrap(), LogoutOutcome::RemoteFailed(_)));
        assert!(!store.exists());
    }

    #[test]
    fn project_switch_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&StoredCredentials::issued_now("http://cbrain", "tok", Some(1)))
            .unwrap();
        let mut session = Session::load(store.clone()).unwrap();
        session.set_current_project(12, "NeuroLab").unwrap();
        assert_eq!(session.require_auth().unwrap().current_group_id, Some(12));

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.current_group_name.as_deref(), Some("NeuroLab"));
        assert_eq!(saved.api_token.as_deref(), Some("tok"));

        session.clear_current_project().unwrap();
        assert_eq!(store.load().unwrap().unwrap().current_group_id, None);
    }
}
