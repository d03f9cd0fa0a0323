// src/cli/handlers/group.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::env_grouping,
    models::EnvGroup,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages environment groups.")]
struct GroupArgs {
    #[command(subcommand)]
    command: Option<GroupCommand>,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    /// Shows how the current environments are grouped.
    #[command(alias = "ls")]
    List,
    /// Adds a group (replaces one with the same id).
    Add {
        id: String,
        name: String,
        /// Glob over environment names (`*` and `?`). Wins over `--env`.
        #[arg(long)]
        pattern: Option<String>,
        /// Explicit members (repeatable or comma-separated).
        #[arg(long = "env")]
        environments: Vec<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Changes fields of an existing group.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_pattern")]
        pattern: Option<String>,
        #[arg(long)]
        clear_pattern: bool,
        #[arg(long = "env")]
        environments: Vec<String>,
        #[arg(long)]
        icon: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Removes a group. Its environments fall back to the remaining groups.
    #[command(alias = "rm")]
    Remove { id: String },
    /// Previews which environments a glob pattern matches.
    Test { pattern: String },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let group_args = GroupArgs::try_parse_from(&args)?;

    match group_args.command.unwrap_or(GroupCommand::List) {
        GroupCommand::List => print_groups(ctx),
        GroupCommand::Add {
            id,
            name,
            pattern,
            environments,
            icon,
            color,
        } => {
            let group = EnvGroup {
                id: id.clone(),
                name,
                pattern,
                environments: commons::split_list(environments),
                icon,
                color,
            };
            ctx.store.add_env_group(group)?;
            commons::print_success(&format!(t!("group.success.saved"), id = id.cyan()));
            print_groups(ctx);
        }
        GroupCommand::Update {
            id,
            name,
            pattern,
            clear_pattern,
            environments,
            icon,
            color,
        } => {
            let mut group = ctx
                .store
                .config()
                .env_group(&id)
                .cloned()
                .ok_or_else(|| anyhow!(t!("group.error.not_found"), id = id))?;
            if let Some(name) = name {
                group.name = name;
            }
            if clear_pattern {
                group.pattern = None;
            } else if pattern.is_some() {
                group.pattern = pattern;
            }
            if !environments.is_empty() {
                group.environments = commons::split_list(environments);
            }
            if icon.is_some() {
                group.icon = icon;
            }
            if color.is_some() {
                group.color = color;
            }
            ctx.store.update_env_group(&id, group)?;
            commons::print_success(&format!(t!("group.success.saved"), id = id.cyan()));
            print_groups(ctx);
        }
        GroupCommand::Remove { id } => {
            ctx.store.remove_env_group(&id)?;
            commons::print_success(&format!(t!("group.success.removed"), id = id));
        }
        GroupCommand::Test { pattern } => {
            println!(
                "\n  {} {}",
                t!("group.label.regex").blue(),
                env_grouping::glob_to_regex(&pattern)
            );
            let matches: Vec<&String> = ctx
                .store
                .config()
                .environments
                .iter()
                .filter(|e| env_grouping::matches_pattern(&pattern, e))
                .collect();
            if matches.is_empty() {
                println!("  {}", t!("group.info.no_matches").dimmed());
            }
            for env in matches {
                println!("    • {}", env.green());
            }
        }
    }
    Ok(())
}

fn print_groups(ctx: &CliContext<'_>) {
    let config = ctx.store.config();
    let mode = if config.env_groups.is_empty() {
        t!("group.label.automatic")
    } else {
        t!("group.label.manual")
    };
    println!("\n--- {} ({}) ---", t!("group.header").yellow(), mode.dimmed());

    for group in env_grouping::group_environments(&config.environments, &config.env_groups) {
        let rule = group
            .pattern
            .as_deref()
            .map(|p| format!("pattern '{}'", p))
            .unwrap_or_default();
        println!(
            "  {} {:<24} {}",
            group.icon.as_deref().unwrap_or_default(),
            group.name.bold(),
            rule.dimmed()
        );
        println!("      {}", group.environments.join(", "));
    }
}
