// src/cli/handlers/check.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::integrity,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Lists dangling references in the config document."
)]
struct CheckArgs {
    /// Exit with an error when anything is found.
    #[arg(long)]
    strict: bool,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let check_args = CheckArgs::try_parse_from(&args)?;
    let findings = integrity::check_references(ctx.store.config());

    if findings.is_empty() {
        commons::print_success(t!("check.success.clean"));
        return Ok(());
    }

    println!(
        "\n{}",
        format!(t!("check.warning.header"), count = findings.len())
            .yellow()
            .bold()
    );
    for finding in &findings {
        println!("  - {}", finding);
    }

    if check_args.strict {
        anyhow::bail!(t!("check.error.strict"), count = findings.len());
    }
    Ok(())
}
