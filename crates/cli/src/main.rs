#![forbid(unsafe_code)]

mod args;
mod commands;
mod logging;

use anyhow::Context as _;
use args::{Cli, Command};
use clap::Parser;
use commands::{Reply, run_batch, run_checkpoint, run_single};
use rowsync_core::OperationKind;
use rowsync_storage::connect;
use std::io::Read as _;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init_logging(&cli.log_level) {
        eprintln!("rowsync: {err:#}");
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "rowsync failed");
            eprintln!("rowsync: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.store_config();
    let persister = connect(&config).context("open database")?;

    let reply: Reply = match cli.command {
        Command::Batch { file } => run_batch(persister.as_ref(), &read_body(file.as_deref())?),
        Command::Put { file } => run_single(
            persister.as_ref(),
            OperationKind::Put,
            &read_body(file.as_deref())?,
        ),
        Command::Patch { file } => run_single(
            persister.as_ref(),
            OperationKind::Patch,
            &read_body(file.as_deref())?,
        ),
        Command::Delete { file } => run_single(
            persister.as_ref(),
            OperationKind::Delete,
            &read_body(file.as_deref())?,
        ),
        Command::Checkpoint {
            user_id,
            client_id,
            file,
        } => {
            // No body is fine here; stdin is only read when a file is named.
            let body = file
                .as_deref()
                .map(|path| read_body(Some(path)))
                .transpose()?;
            run_checkpoint(persister.as_ref(), user_id, client_id, body.as_deref())
        }
    };

    println!("{}", reply.body);
    Ok(ExitCode::from(reply.exit_code()))
}

/// Reads a request body from `path`, or from stdin when absent or `-`.
fn read_body(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("read request body from {}", path.display())),
        _ => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("read request body from stdin")?;
            Ok(body)
        }
    }
}
