// src/cli/handlers/status.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::cli::{dispatcher::CliContext, handlers::commons};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows the backend, its health and the local session."
)]
struct StatusArgs {}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let _status_args = StatusArgs::try_parse_from(&args)?;

    let healthy = ctx.runtime.block_on(ctx.store.health());
    let store = &*ctx.store;
    let config = store.config();

    println!("\n--- {} '{}' ---", t!("status.header"), config.title.yellow());
    commons::print_field(t!("status.label.backend"), store.service_description());
    let health = if healthy {
        t!("status.value.healthy").green()
    } else {
        t!("status.value.unreachable").red()
    };
    commons::print_field(t!("status.label.health"), health);

    let current = if store.current_env().is_empty() {
        "-".dimmed()
    } else {
        store.current_env().green()
    };
    commons::print_field(t!("status.label.env"), current);
    commons::print_field(t!("status.label.mode"), store.view_mode());
    if !store.recent_envs().is_empty() {
        commons::print_field(t!("status.label.recent"), store.recent_envs().join(", "));
    }

    commons::print_field(
        t!("status.label.catalog"),
        format!(
            t!("status.value.catalog"),
            services = config.services.len(),
            columns = config.columns.len(),
            environments = config.environments.len(),
            groups = config.env_groups.len()
        ),
    );
    commons::print_field(
        t!("status.label.link_urls"),
        format!("{:?}", ctx.settings.link_url_mode()).to_lowercase(),
    );

    let persist = store.persist_status();
    commons::print_field(
        t!("status.label.saves"),
        format!(
            t!("status.value.saves"),
            saves = persist.saves,
            patches = persist.patches
        ),
    );
    if let Some(error) = store.error() {
        commons::print_field(t!("status.label.error"), error.red());
    }
    Ok(())
}
