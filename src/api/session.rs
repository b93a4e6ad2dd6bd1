// Session and user endpoints.

use super::{ApiClient, Body, ResourceKind};
use crate::error::{Error, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;

/// Expected reply of `POST /session`. Both fields are optional on the wire;
/// a missing token is reported by the caller as a login failure.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct LoginResponse {
    #[serde(default)]
    pub cbrain_api_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<u64>,
}

impl ApiClient {
    /// Log in with a form-encoded username and password.
    pub fn create_session(&self, login: &str, password: &str) -> Result<LoginResponse> {
        let form = [("login", login), ("password", password)];
        let value = self
            .request(Method::POST, "session", &[] as &[(&str, &str)], Body::Form(&form))
            .map_err(|e| match e {
                Error::Api { status: 401, message } => Error::Auth(message),
                other => other,
            })?;
        serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Invalidate the current token on the server.
    pub fn destroy_session(&self) -> Result<Value> {
        self.delete("session")
    }

    /// Session as the server sees it (used to verify a stored token).
    pub fn current_session(&self) -> Result<Value> {
        self.get("session", &[] as &[(&str, &str)])
    }

    pub fn user(&self, user_id: u64) -> Result<Value> {
        self.resource(ResourceKind::User).show(user_id)
    }
}
