// src/cli/handlers/column.rs

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::icons,
    models::{ColumnDefinition, ColumnType},
};

#[derive(Parser, Debug)]
#[command(no_binary_name = true, about = "Manages the matrix columns.")]
struct ColumnArgs {
    #[command(subcommand)]
    command: Option<ColumnCommand>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Link,
    Text,
    Status,
}

impl From<KindArg> for ColumnType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Link => ColumnType::Link,
            KindArg::Text => ColumnType::Text,
            KindArg::Status => ColumnType::Status,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ColumnCommand {
    /// Lists columns.
    #[command(alias = "ls")]
    List,
    /// Adds a column (replaces one with the same id).
    Add {
        id: String,
        title: String,
        #[arg(long = "type", value_enum, default_value = "link")]
        kind: KindArg,
        /// URL template, e.g. `https://logs.{{env}}.example.com/{{service_id}}`.
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Changes fields of an existing column.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Gives the column a new id; links and overrides follow.
        #[arg(long)]
        new_id: Option<String>,
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        #[arg(long, conflicts_with = "clear_template")]
        template: Option<String>,
        #[arg(long)]
        clear_template: bool,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Removes a column and every service override for it.
    #[command(alias = "rm")]
    Remove {
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Moves a column to a new position (0-based).
    Move { id: String, index: usize },
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let column_args = ColumnArgs::try_parse_from(&args)?;

    match column_args.command.unwrap_or(ColumnCommand::List) {
        ColumnCommand::List => list_columns(ctx),
        ColumnCommand::Add {
            id,
            title,
            kind,
            template,
            icon,
        } => {
            let column = ColumnDefinition {
                kind: kind.into(),
                template,
                icon,
                ..ColumnDefinition::new(id.clone(), title)
            };
            ctx.store.add_column(column)?;
            commons::print_success(&format!(t!("column.success.saved"), id = id.cyan()));
        }
        ColumnCommand::Update {
            id,
            title,
            new_id,
            kind,
            template,
            clear_template,
            icon,
        } => {
            let mut column = ctx
                .store
                .config()
                .column(&id)
                .cloned()
                .ok_or_else(|| anyhow!(t!("column.error.not_found"), id = id))?;
            if let Some(title) = title {
                column.title = title;
            }
            if let Some(new_id) = new_id {
                column.id = new_id;
            }
            if let Some(kind) = kind {
                column.kind = kind.into();
            }
            if clear_template {
                column.template = None;
            } else if template.is_some() {
                column.template = template;
            }
            if icon.is_some() {
                column.icon = icon;
            }
            let saved_id = column.id.clone();
            ctx.store.update_column(&id, column)?;
            commons::print_success(&format!(t!("column.success.saved"), id = saved_id.cyan()));
        }
        ColumnCommand::Remove { id, yes } => {
            let overrides = ctx
                .store
                .config()
                .services
                .iter()
                .filter(|s| s.overrides.contains_key(&id))
                .count();
            let prompt = format!(t!("column.prompt.remove"), id = id, overrides = overrides);
            if !commons::confirm(&prompt, yes)? {
                return Ok(());
            }
            ctx.store.remove_column(&id)?;
            commons::print_success(&format!(t!("column.success.removed"), id = id));
        }
        ColumnCommand::Move { id, index } => {
            ctx.store.move_column(&id, index)?;
            list_columns(ctx);
        }
    }
    Ok(())
}

fn list_columns(ctx: &CliContext<'_>) {
    let columns = &ctx.store.config().columns;
    println!("\n--- {} ({}) ---", t!("column.header").yellow(), columns.len());
    if columns.is_empty() {
        println!("  {}", t!("column.info.none").dimmed());
        return;
    }
    for column in columns {
        let kind = match column.kind {
            ColumnType::Link => "link",
            ColumnType::Text => "text",
            ColumnType::Status => "status",
        };
        println!(
            "  {} {:<14} {:<20} {:<7} {}",
            icons::glyph_for(column.icon.as_deref()),
            column.id.cyan(),
            column.title,
            kind.dimmed(),
            column.template.as_deref().unwrap_or("-").dimmed()
        );
    }
}
