// src/cli/handlers/export.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::document::DocumentFormat,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Writes the config document as YAML or JSON."
)]
struct ExportArgs {
    /// Output format (yaml, json). Taken from the output extension when omitted.
    #[arg(long, short)]
    format: Option<DocumentFormat>,
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let export_args = ExportArgs::try_parse_from(&args)?;

    let format = export_args.format.unwrap_or_else(|| {
        export_args
            .output
            .as_deref()
            .map(DocumentFormat::from_path)
            .unwrap_or_default()
    });
    let text = ctx.store.export_document(format)?;

    match export_args.output {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!(t!("export.error.write"), path = path.display()))?;
            commons::print_success(&format!(t!("export.success"), path = path.display()));
        }
        None => print!("{}", text),
    }
    Ok(())
}
