// src/cli/handlers/title.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::cli::{dispatcher::CliContext, handlers::commons};

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows or changes the matrix title.")]
struct TitleArgs {
    /// The new title. Prints the current one when omitted.
    title: Option<String>,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let title_args = TitleArgs::try_parse_from(&args)?;
    match title_args.title {
        Some(title) => {
            ctx.store.set_title(&title)?;
            commons::print_success(&format!(t!("title.success"), title = title.cyan()));
        }
        None => println!("{}", ctx.store.config().title),
    }
    Ok(())
}
