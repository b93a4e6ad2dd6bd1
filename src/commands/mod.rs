// Command dispatch. Every handler receives the same `Context` (session,
// configuration, output format) and returns `Result<()>`; `execute` is the
// single place where outcomes become exit codes.

mod files;
mod projects;
mod resources;
mod session;
mod tags;
mod tasks;

use crate::api::ApiClient;
use crate::cli::Command;
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::output::{OutputFormat, Printer};
use crate::session::Session;
use std::io::Write;
use std::process::ExitCode;
use tracing::debug;

/// Everything a command handler needs for one invocation.
pub struct Context<'a> {
    pub config: Config,
    pub session: Session,
    pub format: OutputFormat,
    pub interactive: bool,
    out: &'a mut dyn Write,
    width: Option<usize>,
}

impl<'a> Context<'a> {
    pub fn new(
        config: Config,
        session: Session,
        format: OutputFormat,
        interactive: bool,
        out: &'a mut dyn Write,
    ) -> Self {
        Context {
            config,
            session,
            format,
            interactive,
            out,
            width: None,
        }
    }

    /// Render tables at a fixed width instead of the terminal's.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn printer(&mut self) -> Printer<'_> {
        let printer = Printer::new(self.format, &mut *self.out);
        match self.width {
            Some(w) => printer.with_width(w),
            None => printer,
        }
    }

    /// Authenticated client. Fails before any network traffic when the
    /// session is not usable.
    pub fn api(&self) -> Result<ApiClient> {
        self.session.client()
    }
}

/// Route one parsed command to its handler.
pub fn run(command: Command, ctx: &mut Context) -> Result<()> {
    debug!(?command, "dispatching");
    match command {
        Command::Login => session::login(ctx),
        Command::Logout => session::logout(ctx),
        Command::Whoami { version } => session::whoami(ctx, version),
        Command::Version => session::version(ctx),
        Command::File(args) => files::run(args.command, ctx),
        Command::Dataprovider(args) => resources::data_providers(args.command, ctx),
        Command::Project(args) => projects::run(args.command, ctx),
        Command::Tool(args) => resources::tools(args.command, ctx),
        Command::ToolConfig(args) => resources::tool_configs(args.command, ctx),
        Command::Tag(args) => tags::run(args.command, ctx),
        Command::Background(args) => resources::background_activities(args.command, ctx),
        Command::Task(args) => tasks::run(args.command, ctx),
        Command::RemoteResource(args) => resources::remote_resources(args.command, ctx),
    }
}

/// Run a command and turn its outcome into an exit status, writing any
/// error to `err`.
pub fn execute(command: Command, ctx: &mut Context, err: &mut dyn Write) -> ExitCode {
    match run(command, ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e, err);
            ExitCode::FAILURE
        }
    }
}

/// Print an error (and a hint when there is one).
pub fn report(error: &Error, err: &mut dyn Write) {
    debug!(kind = ?error.kind(), "command failed");
    let message = match error.kind() {
        ErrorKind::Cancelled => Error::Cancelled.to_string(),
        _ => error.to_string(),
    };
    let _ = writeln!(err, "{}", message);
    if let Some(hint) = error.hint() {
        let _ = writeln!(err, "{}", hint);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::credentials::{CredentialStore, StoredCredentials};

    /// Logged-in context against `server`, with captured stdout.
    pub struct Harness {
        pub dir: tempfile::TempDir,
        pub out: Vec<u8>,
    }

    impl Harness {
        pub fn logged_in(server_url: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store = CredentialStore::new(dir.path().join("credentials.json"));
            store
                .save(&StoredCredentials::issued_now(server_url, "tok", Some(5)))
                .unwrap();
            Harness {
                dir,
                out: Vec::new(),
            }
        }

        pub fn anonymous() -> Self {
            Harness {
                dir: tempfile::tempdir().unwrap(),
                out: Vec::new(),
            }
        }

        pub fn store(&self) -> CredentialStore {
            CredentialStore::new(self.dir.path().join("credentials.json"))
        }

        pub fn run(&mut self, format: OutputFormat, command: Command) -> Result<()> {
            let config = Config {
                credentials_path: self.store().path().to_path_buf(),
                default_url: crate::config::DEFAULT_BASE_URL.to_string(),
                log_filter: None,
            };
            let session = Session::load(self.store())?;
            let mut ctx = Context::new(config, session, format, false, &mut self.out).with_width(100);
            run(command, &mut ctx)
        }

        pub fn stdout(&self) -> String {
            String::from_utf8_lossy(&self.out).into_owned()
        }
    }
}
