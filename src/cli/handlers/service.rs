// src/cli/handlers/service.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::{
        icons,
        url_resolver::{self, CellValue},
        visibility,
    },
    models::ServiceDefinition,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages the service catalog.")]
struct ServiceArgs {
    #[command(subcommand)]
    command: Option<ServiceCommand>,
}

#[derive(Subcommand, Debug)]
enum ServiceCommand {
    /// Lists services, optionally filtered.
    #[command(alias = "ls")]
    List {
        /// Case-insensitive text filter over name, id, description and link names.
        #[arg(long, short)]
        query: Option<String>,
        /// Only services of this group.
        #[arg(long, short)]
        group: Option<String>,
    },
    /// Shows one service with its resolved links for the current environment.
    Show {
        id: String,
        #[arg(long, short)]
        env: Option<String>,
    },
    /// Adds a service (replaces one with the same id).
    Add {
        id: String,
        name: String,
        #[arg(long, short)]
        group: Option<String>,
        #[arg(long, short)]
        description: Option<String>,
        /// Tags, repeatable or comma-separated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Changes fields of an existing service.
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Gives the service a new id.
        #[arg(long)]
        new_id: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Turns maintenance mode on or off.
        #[arg(long)]
        maintenance: Option<bool>,
    },
    /// Removes a service.
    #[command(alias = "rm")]
    Remove {
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Moves a service to a new position (0-based).
    Move { id: String, index: usize },
    /// Sets the URL override of a service for one column.
    Override {
        id: String,
        column: String,
        url: Option<String>,
        /// Removes the override instead.
        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },
    /// Sets a template variable on a service.
    Var {
        id: String,
        name: String,
        value: Option<String>,
        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },
    /// Records the deployed version of a service in an environment.
    Version {
        id: String,
        env: String,
        version: Option<String>,
        #[arg(long, conflicts_with = "version")]
        clear: bool,
    },
    /// Toggles a service as favorite.
    #[command(alias = "fav")]
    Favorite { id: String },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let service_args = ServiceArgs::try_parse_from(&args)?;

    let command = service_args.command.unwrap_or(ServiceCommand::List {
        query: None,
        group: None,
    });
    match command {
        ServiceCommand::List { query, group } => list_services(ctx, query, group),
        ServiceCommand::Show { id, env } => {
            let env = commons::resolve_env(ctx, env)?;
            show_service(ctx, &id, &env)?;
            ctx.store.record_service_visit(&id)?;
        }
        ServiceCommand::Add {
            id,
            name,
            group,
            description,
            tags,
        } => {
            let service = ServiceDefinition {
                group,
                description,
                tags: commons::split_list(tags),
                ..ServiceDefinition::new(id.clone(), name)
            };
            ctx.store.add_service(service)?;
            commons::print_success(&format!(t!("service.success.saved"), id = id.cyan()));
        }
        ServiceCommand::Update {
            id,
            name,
            new_id,
            group,
            description,
            status,
            maintenance,
        } => {
            let mut service = existing(ctx, &id)?;
            if let Some(name) = name {
                service.name = name;
            }
            if let Some(new_id) = new_id {
                service.id = new_id;
            }
            if group.is_some() {
                service.group = group;
            }
            if description.is_some() {
                service.description = description;
            }
            if status.is_some() {
                service.status = status;
            }
            if maintenance.is_some() {
                service.maintenance_mode = maintenance;
            }
            let saved_id = service.id.clone();
            ctx.store.update_service(&id, service)?;
            commons::print_success(&format!(t!("service.success.saved"), id = saved_id.cyan()));
        }
        ServiceCommand::Remove { id, yes } => {
            existing(ctx, &id)?;
            let prompt = format!(t!("service.prompt.remove"), id = id);
            if !commons::confirm(&prompt, yes)? {
                return Ok(());
            }
            ctx.store.remove_service(&id)?;
            commons::print_success(&format!(t!("service.success.removed"), id = id));
        }
        ServiceCommand::Move { id, index } => {
            ctx.store.move_service(&id, index)?;
            list_services(ctx, None, None);
        }
        ServiceCommand::Override {
            id,
            column,
            url,
            clear,
        } => {
            let url = required_unless_cleared(url, clear, "url")?;
            ctx.store.set_service_override(&id, &column, url)?;
            commons::print_success(&format!(
                t!("service.success.override"),
                id = id.cyan(),
                column = column
            ));
        }
        ServiceCommand::Var {
            id,
            name,
            value,
            clear,
        } => {
            let value = required_unless_cleared(value, clear, "value")?;
            ctx.store.set_service_variable(&id, &name, value)?;
            commons::print_success(&format!(
                t!("service.success.variable"),
                id = id.cyan(),
                name = name
            ));
        }
        ServiceCommand::Version {
            id,
            env,
            version,
            clear,
        } => {
            let version = required_unless_cleared(version, clear, "version")?;
            let env = commons::resolve_env(ctx, Some(env))?;
            let mut service = existing(ctx, &id)?;
            match version {
                Some(v) => service.versions.insert(env.clone(), v),
                None => service.versions.remove(&env),
            };
            ctx.store.update_service(&id, service)?;
            commons::print_success(&format!(
                t!("service.success.version"),
                id = id.cyan(),
                env = env
            ));
        }
        ServiceCommand::Favorite { id } => {
            let key = if ctx.store.toggle_favorite_service(&id)? {
                t!("service.success.favorited")
            } else {
                t!("service.success.unfavorited")
            };
            commons::print_success(&format!("{} '{}'", key, id));
        }
    }
    Ok(())
}

fn existing(ctx: &CliContext<'_>, id: &str) -> Result<ServiceDefinition> {
    ctx.store
        .config()
        .service(id)
        .cloned()
        .ok_or_else(|| anyhow!(t!("service.error.not_found"), id = id))
}

/// `--clear` means `None`; otherwise the positional value is required.
fn required_unless_cleared(
    value: Option<String>,
    clear: bool,
    what: &str,
) -> Result<Option<String>> {
    match (value, clear) {
        (_, true) => Ok(None),
        (Some(v), false) => Ok(Some(v)),
        (None, false) => Err(anyhow!(t!("error.value_or_clear"), what = what)),
    }
}

fn list_services(ctx: &CliContext<'_>, query: Option<String>, group: Option<String>) {
    let config = ctx.store.config();
    let all: Vec<&ServiceDefinition> = config.services.iter().collect();
    let services = visibility::filtered_services(&all, query.as_deref(), group.as_deref());

    println!(
        "\n--- {} ({}) ---",
        t!("service.header.list").yellow(),
        services.len()
    );
    if services.is_empty() {
        println!("  {}", t!("service.info.none").dimmed());
        return;
    }
    for service in services {
        let star = if config.favorite_services.contains(&service.id) {
            "★ ".yellow()
        } else {
            "  ".normal()
        };
        let group = service
            .group
            .as_deref()
            .map(|g| format!("[{}]", g))
            .unwrap_or_default();
        println!(
            "  {}{:<20} {:<28} {}",
            star,
            service.id.cyan(),
            service.name,
            group.dimmed()
        );
    }
}

fn show_service(ctx: &CliContext<'_>, id: &str, env: &str) -> Result<()> {
    let config = ctx.store.config();
    let service = config
        .service(id)
        .ok_or_else(|| anyhow!(t!("service.error.not_found"), id = id))?;

    println!("\n--- {} '{}' ---", t!("service.header.show"), service.name.yellow());
    commons::print_field(t!("service.label.id"), &service.id);
    if let Some(group) = &service.group {
        commons::print_field(t!("service.label.group"), group);
    }
    if let Some(description) = &service.description {
        commons::print_field(t!("service.label.description"), description);
    }
    if !service.tags.is_empty() {
        commons::print_field(t!("service.label.tags"), service.tags.join(", "));
    }
    if let Some(version) = service.versions.get(env) {
        commons::print_field(t!("service.label.version"), version);
    }
    if service.maintenance_mode == Some(true) {
        commons::print_field(t!("service.label.status"), "maintenance".yellow());
    } else if let Some(status) = &service.status {
        commons::print_field(t!("service.label.status"), status);
    }

    println!("\n  {} ({})", t!("service.label.links").blue(), env.green());
    let mode = ctx.settings.link_url_mode();
    for column in visibility::visible_columns(config, env) {
        let glyph = icons::glyph_for(column.icon.as_deref());
        match url_resolver::resolve_cell(service, column, env, &ctx.settings.vars) {
            CellValue::Url(url) => {
                println!("    {} {:<14} {}", glyph, column.title, url.underline());
            }
            CellValue::Text(text) | CellValue::Status(text) => {
                println!("    {} {:<14} {}", glyph, column.title, text);
            }
            CellValue::Empty => {}
        }
        for link in service
            .links
            .iter()
            .filter(|l| l.column_id == column.id && l.is_visible_in(env))
        {
            let url = url_resolver::resolve_link(service, link, env, &ctx.settings.vars, mode);
            println!(
                "    {} {:<14} {} {}",
                glyph,
                column.title,
                link.name.dimmed(),
                url.underline()
            );
        }
    }
    Ok(())
}
