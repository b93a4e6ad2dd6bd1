// Library root
// -----------
// The CBRAIN command-line client as a library. The binary (`main.rs`) only
// parses arguments, sets up logging and hands over to `commands::execute`.
//
// Module responsibilities:
// - `config`: environment-driven settings (credential path, default URL).
// - `credentials` / `session`: the credential file and the login state
//   machine built on top of it.
// - `api`: blocking HTTP client for the REST API, one generic resource
//   shape plus the few special endpoints (upload, change provider).
// - `table`, `output`, `views`: the dynamic table renderer, format
//   selection (table / JSON / JSONL) and per-resource projections.
// - `cli`, `commands`, `ui`: the clap command tree, handlers and prompts.
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod output;
pub mod session;
pub mod table;
pub mod ui;
pub mod views;

pub use error::{Error, ErrorKind, Result};
