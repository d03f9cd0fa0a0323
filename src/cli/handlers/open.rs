// src/cli/handlers/open.rs

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use colored::*;
use std::process::{Command, Stdio};

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::url_resolver,
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Resolves the URL of a service under a column and optionally opens it."
)]
struct OpenArgs {
    /// Service id.
    service: String,
    /// Column id.
    column: String,
    /// Environment to resolve for. Defaults to the selected one.
    #[arg(long, short)]
    env: Option<String>,
    /// Pick one explicit link by id when the column has several.
    #[arg(long)]
    link: Option<String>,
    /// Launch the URL with the system's default handler.
    #[arg(long, short)]
    launch: bool,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let open_args = OpenArgs::try_parse_from(&args)?;
    let env = commons::resolve_env(ctx, open_args.env)?;

    let url = {
        let config = ctx.store.config();
        let service = config
            .service(&open_args.service)
            .ok_or_else(|| anyhow!(t!("service.error.not_found"), id = open_args.service))?;
        let column = config
            .column(&open_args.column)
            .ok_or_else(|| anyhow!(t!("column.error.not_found"), id = open_args.column))?;

        let templated = match &open_args.link {
            Some(_) => None,
            None => url_resolver::resolve(service, column, &env, &ctx.settings.vars),
        };
        match templated {
            Some(url) => url,
            None => {
                let link = service
                    .links
                    .iter()
                    .filter(|l| l.column_id == column.id && l.is_visible_in(&env))
                    .find(|l| open_args.link.as_ref().is_none_or(|id| &l.id == id))
                    .ok_or_else(|| {
                        anyhow!(
                            t!("open.error.no_target"),
                            service = service.id,
                            column = column.id,
                            env = env
                        )
                    })?;
                url_resolver::resolve_link(
                    service,
                    link,
                    &env,
                    &ctx.settings.vars,
                    ctx.settings.link_url_mode(),
                )
            }
        }
    };

    println!("\n> {}", url.green());

    ctx.store.record_link_visit(&open_args.service, &open_args.column)?;
    ctx.store.record_service_visit(&open_args.service)?;

    if open_args.launch {
        launch(&url).with_context(|| format!(t!("open.error.launch_failed"), url = url))?;
    }
    Ok(())
}

/// Hands the URL to the platform's default handler without waiting for it.
fn launch(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg(url);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(url);
        c
    };
    log::debug!("Launching: {:?}", command);
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}
