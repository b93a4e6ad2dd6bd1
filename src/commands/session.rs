// login, logout, whoami, version.

use super::Context;
use crate::api::ApiClient;
use crate::error::Result;
use crate::session::LogoutOutcome;
use crate::table::cell_text;
use crate::ui;
use serde_json::{json, Value};

pub fn login(ctx: &mut Context) -> Result<()> {
    // Refuse before prompting.
    ctx.session.ensure_can_login()?;
    let answers = ui::prompt_login(&ctx.config.default_url)?;
    ctx.session
        .login(&answers.server_url, &answers.username, &answers.password)?;
    let path = ctx.session.credentials_path().display().to_string();
    ctx.printer()
        .line(format!("Connection successful, API token saved in {}", path))
}

pub fn logout(ctx: &mut Context) -> Result<()> {
    let outcome = ctx.session.logout()?;
    let path = ctx.session.credentials_path().display().to_string();
    let mut out = ctx.printer();
    match outcome {
        LogoutOutcome::Confirmed => out.line("Successfully logged out from CBRAIN server.")?,
        LogoutOutcome::RemoteFailed(reason) => out.line(format!("Logout failed: {}", reason))?,
        LogoutOutcome::LocalOnly => out.line("Invalid credentials file. Removing local session.")?,
        LogoutOutcome::AlreadyExpired => out.line("Session had already expired.")?,
    }
    out.line(format!("Local session removed from {}", path))
}

pub fn whoami(ctx: &mut Context, verify: bool) -> Result<()> {
    let creds = ctx.session.require_auth()?.clone();
    let api = ApiClient::authenticated(&creds)?;
    let user = api.user(creds.user_id)?;
    let login = text(&user, "login");
    let full_name = text(&user, "full_name");

    let mut out = ctx.printer();
    if out.structured(&json!({
        "login": login,
        "full_name": full_name,
        "server": creds.cbrain_url,
    }))? {
        return Ok(());
    }

    if verify {
        let path = ctx.session.credentials_path().display().to_string();
        let mut out = ctx.printer();
        out.line(format!("Found credentials {}", path))?;
        out.line(format!("User in credentials: {} on server {}", login, creds.cbrain_url))?;
        out.line(format!("Token found: {}", mask_token(&creds.api_token)))?;
        out.line("Verifying token with GET /session")?;

        let remote = api.current_session()?;
        let remote_user = remote.get("user_id").map(|v| cell_text(Some(v)));
        if remote_user.as_deref() != Some(creds.user_id.to_string().as_str()) {
            out.line(format!(
                "WARNING: User ID mismatch - Local: {}, Remote: {}",
                creds.user_id,
                remote_user.unwrap_or_else(|| "none".into())
            ))?;
        }
        if remote.get("cbrain_api_token").and_then(Value::as_str) != Some(creds.api_token.as_str()) {
            out.line("WARNING: Token mismatch - tokens don't match")?;
        }
    }

    ctx.printer().line(format!(
        "Current user: {} ({}) on server {}",
        login, full_name, creds.cbrain_url
    ))
}

pub fn version(ctx: &mut Context) -> Result<()> {
    ctx.printer().line(format!(
        "cbrain cli client version {}",
        env!("CARGO_PKG_VERSION")
    ))
}

fn text(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// First and last two characters, the rest starred.
pub(crate) fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "****".into();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::super::testing::Harness;
    use super::*;
    use crate::api::testing::TestServer;
    use crate::cli::Command;
    use crate::error::Error;
    use crate::output::OutputFormat;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn token_masking() {
        assert_eq!(mask_token("abcdefgh"), "ab****gh");
        assert_eq!(mask_token("abcd"), "****");
    }

    #[test]
    fn whoami_reports_user() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/users/5"))
                .and(header("authorization", "Bearer tok"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"login": "alice", "full_name": "Alice Liddell"})),
                ),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(OutputFormat::Table, Command::Whoami { version: false }).unwrap();
        assert_eq!(
            h.stdout(),
            format!("Current user: alice (Alice Liddell) on server {}\n", server.uri())
        );
    }

    #[test]
    fn whoami_verify_warns_on_token_mismatch() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/users/5"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "alice"}))),
        );
        server.mount(
            Mock::given(method("GET"))
                .and(path("/session"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(json!({"user_id": 5, "cbrain_api_token": "other"})),
                ),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(OutputFormat::Table, Command::Whoami { version: true }).unwrap();
        let out = h.stdout();
        assert!(out.contains("Token found: ****"));
        assert!(out.contains("WARNING: Token mismatch"));
        assert!(!out.contains("User ID mismatch"));
    }

    #[test]
    fn logout_removes_file_even_when_server_fails() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("DELETE"))
                .and(path("/session"))
                .respond_with(ResponseTemplate::new(500)),
        );
        let mut h = Harness::logged_in(&server.uri());
        h.run(OutputFormat::Table, Command::Logout).unwrap();
        assert!(!h.store().exists());
        assert!(h.stdout().starts_with("Logout failed: "));
        assert!(h.stdout().contains("Local session removed from"));
    }

    #[test]
    fn login_with_existing_file_fails_without_prompting() {
        let mut h = Harness::logged_in("http://127.0.0.1:9");
        let err = h.run(OutputFormat::Table, Command::Login).unwrap_err();
        assert!(matches!(err, Error::AlreadyLoggedIn));
    }
}
