// src/cli/handlers/env.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::env_grouping,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages environments.")]
struct EnvArgs {
    #[command(subcommand)]
    command: Option<EnvCommand>,
}

#[derive(Subcommand, Debug)]
enum EnvCommand {
    /// Lists environments by group (the default).
    #[command(alias = "ls")]
    List,
    /// Adds an environment.
    Add { name: String },
    /// Removes an environment and its settings.
    #[command(alias = "rm")]
    Remove {
        name: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Renames an environment everywhere it is referenced.
    Rename { old: String, new: String },
    /// Moves an environment to a new position (0-based).
    Move { name: String, index: usize },
    /// Selects the active environment.
    Use { name: String },
    /// Toggles an environment as favorite.
    #[command(alias = "fav")]
    Favorite { name: String },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let env_args = EnvArgs::try_parse_from(&args)?;

    match env_args.command.unwrap_or(EnvCommand::List) {
        EnvCommand::List => print_environments(ctx),
        EnvCommand::Add { name } => {
            ctx.store
                .add_environment(&name)
                .with_context(|| format!(t!("env.error.add_failed"), name = name))?;
            commons::print_success(&format!(t!("env.success.added"), name = name.cyan()));
        }
        EnvCommand::Remove { name, yes } => {
            let prompt = format!(t!("env.prompt.remove"), name = name);
            if !commons::confirm(&prompt, yes)? {
                return Ok(());
            }
            ctx.store.remove_environment(&name)?;
            commons::print_success(&format!(t!("env.success.removed"), name = name));
        }
        EnvCommand::Rename { old, new } => {
            ctx.store.rename_environment(&old, &new)?;
            commons::print_success(&format!(
                t!("env.success.renamed"),
                old = old.yellow(),
                new = new.cyan()
            ));
        }
        EnvCommand::Move { name, index } => {
            ctx.store.move_environment(&name, index)?;
            print_environments(ctx);
        }
        EnvCommand::Use { name } => {
            ctx.store.set_env(&name)?;
            commons::print_success(&format!(
                t!("env.success.selected"),
                name = name.cyan(),
                mode = ctx.store.view_mode()
            ));
        }
        EnvCommand::Favorite { name } => {
            let key = if ctx.store.toggle_favorite_env(&name)? {
                t!("env.success.favorited")
            } else {
                t!("env.success.unfavorited")
            };
            commons::print_success(&format!("{} '{}'", key, name));
        }
    }
    Ok(())
}

fn print_environments(ctx: &CliContext<'_>) {
    let config = ctx.store.config();
    if config.environments.is_empty() {
        println!("\n{}", t!("env.info.none").dimmed());
        return;
    }

    let current = ctx.store.current_env();
    println!("\n--- {} ---", t!("env.header").yellow());
    for group in env_grouping::group_environments(&config.environments, &config.env_groups) {
        println!(
            "\n  {} {}",
            group.icon.as_deref().unwrap_or_default(),
            group.name.bold()
        );
        for env in &group.environments {
            let marker = if env == current {
                "●".green()
            } else {
                " ".normal()
            };
            let star = if config.favorite_envs.contains(env) {
                " ★".yellow()
            } else {
                "".normal()
            };
            let name = if env == current {
                env.green().bold()
            } else {
                env.normal()
            };
            println!("    {} {}{}", marker, name, star);
        }
    }

    if !ctx.store.recent_envs().is_empty() {
        println!(
            "\n  {} {}",
            t!("env.label.recent").blue(),
            ctx.store.recent_envs().join(", ").dimmed()
        );
    }
}
