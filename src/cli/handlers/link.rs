// src/cli/handlers/link.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use uuid::Uuid;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    models::ServiceLink,
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages explicit links owned by a service.")]
struct LinkArgs {
    #[command(subcommand)]
    command: LinkCommand,
}

#[derive(Subcommand, Debug)]
enum LinkCommand {
    /// Lists the explicit links of a service.
    #[command(alias = "ls")]
    List { service: String },
    /// Adds a link to a service (replaces one with the same id).
    Add {
        service: String,
        column: String,
        name: String,
        url: String,
        /// Link id. A random one is generated when omitted.
        #[arg(long)]
        id: Option<String>,
        /// Restricts the link to these environments (repeatable or comma-separated).
        #[arg(long = "env")]
        environments: Vec<String>,
    },
    /// Changes fields of an existing link.
    Update {
        service: String,
        link: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        column: Option<String>,
        /// Replaces the environment allow-list.
        #[arg(long = "env", conflicts_with = "all_envs")]
        environments: Vec<String>,
        /// Makes the link visible in every environment.
        #[arg(long)]
        all_envs: bool,
    },
    /// Removes a link.
    #[command(alias = "rm")]
    Remove { service: String, link: String },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let link_args = LinkArgs::try_parse_from(&args)?;

    match link_args.command {
        LinkCommand::List { service } => list_links(ctx, &service)?,
        LinkCommand::Add {
            service,
            column,
            name,
            url,
            id,
            environments,
        } => {
            let id = id.unwrap_or_else(|| Uuid::new_v4().to_string());
            let link = ServiceLink {
                id: id.clone(),
                column_id: column,
                name,
                url,
                environments: commons::split_list(environments),
            };
            ctx.store.add_link(&service, link)?;
            commons::print_success(&format!(
                t!("link.success.saved"),
                id = id.cyan(),
                service = service
            ));
        }
        LinkCommand::Update {
            service,
            link: link_id,
            name,
            url,
            column,
            environments,
            all_envs,
        } => {
            let mut link = ctx
                .store
                .config()
                .service(&service)
                .and_then(|s| s.link(&link_id))
                .cloned()
                .ok_or_else(|| {
                    anyhow!(t!("link.error.not_found"), id = link_id, service = service)
                })?;
            if let Some(name) = name {
                link.name = name;
            }
            if let Some(url) = url {
                link.url = url;
            }
            if let Some(column) = column {
                link.column_id = column;
            }
            if all_envs {
                link.environments.clear();
            } else if !environments.is_empty() {
                link.environments = commons::split_list(environments);
            }
            ctx.store.update_link(&service, &link_id, link)?;
            commons::print_success(&format!(
                t!("link.success.saved"),
                id = link_id.cyan(),
                service = service
            ));
        }
        LinkCommand::Remove {
            service,
            link: link_id,
        } => {
            ctx.store.remove_link(&service, &link_id)?;
            commons::print_success(&format!(
                t!("link.success.removed"),
                id = link_id,
                service = service
            ));
        }
    }
    Ok(())
}

fn list_links(ctx: &CliContext<'_>, service_id: &str) -> Result<()> {
    let service = ctx
        .store
        .config()
        .service(service_id)
        .ok_or_else(|| anyhow!(t!("service.error.not_found"), id = service_id))?;

    println!("\n--- {} '{}' ---", t!("link.header"), service.name.yellow());
    if service.links.is_empty() {
        println!("  {}", t!("link.info.none").dimmed());
        return Ok(());
    }
    for link in &service.links {
        let scope = if link.environments.is_empty() {
            t!("link.label.all_envs").to_string()
        } else {
            link.environments.join(", ")
        };
        println!(
            "  {:<38} {:<10} {:<20} {}",
            link.id.cyan(),
            link.column_id,
            link.name,
            link.url.underline()
        );
        println!("  {:<38} {}", "", scope.dimmed());
    }
    Ok(())
}
