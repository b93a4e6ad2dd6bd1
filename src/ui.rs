// UI layer: terminal prompts and progress spinners built on `dialoguer`
// and `indicatif`. Prompt failures surface as io errors; an interrupted
// prompt becomes `Error::Cancelled` through `Error::kind`.

use crate::cli::TagFields;
use crate::error::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// What the login prompt collects.
pub struct LoginAnswers {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

/// Ask for server, username and password. The password is not echoed.
pub fn prompt_login(default_url: &str) -> Result<LoginAnswers> {
    let server_url: String = Input::new()
        .with_prompt("Enter CBRAIN server URL")
        .default(default_url.to_string())
        .interact_text()?;
    let username: String = Input::new()
        .with_prompt("Enter CBRAIN username")
        .allow_empty(true)
        .interact_text()?;
    let password: String = Password::new()
        .with_prompt("Enter CBRAIN password")
        .allow_empty_password(true)
        .interact()?;
    Ok(LoginAnswers {
        server_url: server_url.trim().to_string(),
        username: username.trim().to_string(),
        password,
    })
}

/// Fill the tag fields that were not given on the command line.
pub fn prompt_tag_fields(mut fields: TagFields) -> Result<TagFields> {
    if fields.name.is_none() {
        let name: String = Input::new().with_prompt("Tag name").interact_text()?;
        fields.name = Some(name.trim().to_string());
    }
    if fields.user_id.is_none() {
        fields.user_id = Some(Input::new().with_prompt("User ID").interact_text()?);
    }
    if fields.group_id.is_none() {
        fields.group_id = Some(Input::new().with_prompt("Group ID").interact_text()?);
    }
    Ok(fields)
}

pub fn prompt_id(what: &str) -> Result<u64> {
    Ok(Input::new()
        .with_prompt(format!("{} ID", what))
        .interact_text()?)
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.into());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Run `work` behind a spinner, clearing it whatever the outcome.
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> Result<T>) -> Result<T> {
    let bar = spinner(message.to_string());
    let result = work();
    bar.finish_and_clear();
    result
}
