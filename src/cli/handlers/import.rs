// src/cli/handlers/import.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::document::DocumentFormat,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Replaces the whole config document with a YAML or JSON file."
)]
struct ImportArgs {
    /// File to import, or `-` for stdin.
    file: PathBuf,
    /// Force the format (yaml, json). Guessed from the extension or content otherwise.
    #[arg(long, short)]
    format: Option<DocumentFormat>,
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let import_args = ImportArgs::try_parse_from(&args)?;

    let from_stdin = import_args.file.as_os_str() == "-";
    let text = if from_stdin {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context(t!("import.error.stdin"))?;
        buffer
    } else {
        fs::read_to_string(&import_args.file).with_context(|| {
            format!(t!("import.error.read"), path = import_args.file.display())
        })?
    };

    let format = match import_args.format {
        Some(format) => Some(format),
        None if from_stdin => None,
        None => Some(DocumentFormat::from_path(&import_args.file)),
    };

    let prompt = format!(
        t!("import.prompt.replace"),
        services = ctx.store.config().services.len()
    );
    if !commons::confirm(&prompt, import_args.yes || from_stdin)? {
        return Ok(());
    }

    ctx.store.import_document(&text, format)?;

    let config = ctx.store.config();
    commons::print_success(&format!(
        t!("import.success"),
        services = config.services.len().to_string().cyan(),
        columns = config.columns.len(),
        environments = config.environments.len()
    ));
    Ok(())
}
