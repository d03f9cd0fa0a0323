// src/cli/handlers/visibility.rs

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::visibility,
    models::ViewMode,
};

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Controls which services and columns an environment shows."
)]
struct VisibilityArgs {
    #[command(subcommand)]
    command: Option<VisibilityCommand>,
}

/// A selection: explicit ids, everything (`--all`, the default state) or nothing (`--none`).
#[derive(Args, Debug)]
struct Selection {
    /// Environment to change. Defaults to the selected one.
    #[arg(long, short)]
    env: Option<String>,
    /// Ids to show (repeatable or comma-separated).
    ids: Vec<String>,
    /// Show everything again (removes the selection).
    #[arg(long, conflicts_with_all = ["ids", "none"])]
    all: bool,
    /// Show nothing.
    #[arg(long, conflicts_with = "ids")]
    none: bool,
}

impl Selection {
    fn into_option(self) -> Option<Vec<String>> {
        if self.all {
            None
        } else if self.none {
            Some(Vec::new())
        } else {
            Some(commons::split_list(self.ids))
        }
    }
}

#[derive(Subcommand, Debug)]
enum VisibilityCommand {
    /// Shows the visibility settings of an environment.
    Show {
        #[arg(long, short)]
        env: Option<String>,
    },
    /// Sets which services are visible.
    Services(Selection),
    /// Sets which columns are visible.
    Columns(Selection),
    /// Sets the view mode (grid, table, list).
    Mode {
        mode: ViewMode,
        /// Store it for this environment instead of the selected one.
        #[arg(long, short)]
        env: Option<String>,
    },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let vis_args = VisibilityArgs::try_parse_from(&args)?;

    match vis_args.command.unwrap_or(VisibilityCommand::Show { env: None }) {
        VisibilityCommand::Show { env } => {
            let env = commons::resolve_env(ctx, env)?;
            print_visibility(ctx, &env);
        }
        VisibilityCommand::Services(selection) => {
            let env = commons::resolve_env(ctx, selection.env.clone())?;
            ctx.store.set_visible_services(&env, selection.into_option())?;
            print_visibility(ctx, &env);
        }
        VisibilityCommand::Columns(selection) => {
            let env = commons::resolve_env(ctx, selection.env.clone())?;
            ctx.store.set_visible_columns(&env, selection.into_option())?;
            print_visibility(ctx, &env);
        }
        VisibilityCommand::Mode { mode, env } => {
            match env {
                Some(env) => {
                    let env = commons::resolve_env(ctx, Some(env))?;
                    ctx.store.set_env_view_mode(&env, Some(mode))?;
                }
                None => {
                    commons::resolve_env(ctx, None)?;
                    ctx.store.set_view_mode(mode)?;
                }
            }
            commons::print_success(&format!(t!("visibility.success.mode"), mode = mode));
        }
    }
    Ok(())
}

fn print_visibility(ctx: &CliContext<'_>, env: &str) {
    let config = ctx.store.config();
    let env_config = config.env_config(env);
    let all = t!("visibility.label.all");

    println!("\n--- {} '{}' ---", t!("visibility.header"), env.green());

    let services = visibility::visible_services(config, env);
    let services_label = match env_config.and_then(|c| c.visible_services.as_ref()) {
        None => all.to_string(),
        Some(_) => format!("{}/{}", services.len(), config.services.len()),
    };
    commons::print_field(t!("visibility.label.services"), services_label);
    for service in &services {
        println!("      {}", service.id.dimmed());
    }

    let columns = visibility::visible_columns(config, env);
    let columns_label = match env_config.and_then(|c| c.visible_columns.as_ref()) {
        None => all.to_string(),
        Some(_) => format!("{}/{}", columns.len(), config.columns.len()),
    };
    commons::print_field(t!("visibility.label.columns"), columns_label);
    for column in &columns {
        println!("      {}", column.id.dimmed());
    }

    let mode = visibility::view_mode_for(config, env, ctx.store.default_view_mode());
    commons::print_field(t!("visibility.label.mode"), mode);
}
