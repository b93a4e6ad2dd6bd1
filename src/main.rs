// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, configure logging, load the session
//   and hand everything to `commands::execute`.
// - Usage errors exit 1; `--help` and `--version` exit 0.
// - Ctrl-C at any point reports "Operation cancelled" and exits 1.

use cbrain_cli::cli::Cli;
use cbrain_cli::commands::{self, Context};
use cbrain_cli::config::Config;
use cbrain_cli::credentials::CredentialStore;
use cbrain_cli::session::Session;
use cbrain_cli::Error;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let config = Config::from_env();
    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = install_interrupt_handler() {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let format = cli.output_format();
    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    let mut stderr = io::stderr();
    let session = match Session::load(CredentialStore::new(config.credentials_path.clone())) {
        Ok(session) => session,
        Err(e) => {
            commands::report(&e, &mut stderr);
            return ExitCode::FAILURE;
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut ctx = Context::new(config, session, format, cli.interactive, &mut out);
    let code = commands::execute(command, &mut ctx, &mut stderr);
    let _ = out.flush();
    code
}

/// Logs go to stderr so stdout stays clean for JSON consumers.
fn init_logging(config: &Config, verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "cbrain_cli=debug"
    } else {
        "cbrain_cli=warn"
    };
    let filter = EnvFilter::try_new(config.log_filter.as_deref().unwrap_or(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))?;
    Ok(())
}

/// Requests block the main thread, so the interrupt is handled on the
/// signal thread and ends the process there.
fn install_interrupt_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        commands::report(&Error::Cancelled, &mut io::stderr());
        std::process::exit(1);
    })?;
    Ok(())
}
