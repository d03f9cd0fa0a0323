// src/cli/handlers/matrix.rs

use anyhow::Result;
use clap::Parser;
use colored::*;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    core::{
        icons,
        url_resolver::{self, CellValue, LinkUrlMode},
        visibility::{self, MatrixView},
    },
    models::{AnnouncementLevel, OpsMatrixConfig, ServiceDefinition, ViewMode},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Shows the service matrix for an environment."
)]
struct MatrixArgs {
    /// Environment to show. Defaults to the selected one.
    #[arg(long, short)]
    env: Option<String>,
    /// Case-insensitive text filter.
    #[arg(long, short)]
    query: Option<String>,
    /// Only services of this group.
    #[arg(long, short)]
    group: Option<String>,
    /// Render with this view mode instead of the saved one (grid, table, list).
    #[arg(long, short)]
    mode: Option<ViewMode>,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let matrix_args = MatrixArgs::try_parse_from(&args)?;
    let config = ctx.store.config();

    print_header(config);
    if config.environments.is_empty() {
        println!("\n  {}", t!("matrix.info.no_environments").dimmed());
        return Ok(());
    }

    let env = commons::resolve_env(ctx, matrix_args.env)?;
    let mode = match matrix_args.mode {
        Some(mode) => mode,
        None if env == ctx.store.current_env() => ctx.store.view_mode(),
        None => visibility::view_mode_for(config, &env, ctx.store.default_view_mode()),
    };

    let view = MatrixView::build(
        config,
        &env,
        matrix_args.query.as_deref(),
        matrix_args.group.as_deref(),
    );
    println!(
        "\n  {} {}   {}",
        t!("matrix.label.env").blue(),
        env.green().bold(),
        format!(
            t!("matrix.label.counts"),
            services = view.service_count(),
            links = view.total_links(),
            mode = mode
        )
        .dimmed()
    );

    if view.services.is_empty() {
        println!("\n  {}", t!("matrix.info.no_services").dimmed());
        return Ok(());
    }

    let renderer = Renderer {
        config,
        view: &view,
        env: &env,
        vars: &ctx.settings.vars,
        link_mode: ctx.settings.link_url_mode(),
    };
    match mode {
        ViewMode::Grid => renderer.grid(),
        ViewMode::Table => renderer.table(),
        ViewMode::List => renderer.list(),
    }
    Ok(())
}

fn print_header(config: &OpsMatrixConfig) {
    println!("\n--- {} ---", config.title.yellow().bold());
    if let Some(announcement) = &config.announcement {
        let text = match &announcement.link {
            Some(link) => format!("{} ({})", announcement.message, link),
            None => announcement.message.clone(),
        };
        let styled = match announcement.level {
            AnnouncementLevel::Info => text.cyan(),
            AnnouncementLevel::Warning => text.yellow().bold(),
            AnnouncementLevel::Critical => text.red().bold(),
        };
        println!("  {}", styled);
    }
}

struct Renderer<'a> {
    config: &'a OpsMatrixConfig,
    view: &'a MatrixView<'a>,
    env: &'a str,
    vars: &'a std::collections::BTreeMap<String, String>,
    link_mode: LinkUrlMode,
}

impl Renderer<'_> {
    /// Every (label, target) pair a service shows under a column: the template cell
    /// first, then its explicit links.
    fn cells(
        &self,
        service: &ServiceDefinition,
        column_index: usize,
    ) -> Vec<(String, String)> {
        let Some(column_links) = self.view.columns.get(column_index) else {
            return Vec::new();
        };
        let column = column_links.column;
        let mut cells = Vec::new();
        match url_resolver::resolve_cell(service, column, self.env, self.vars) {
            CellValue::Url(url) => cells.push((column.title.clone(), url)),
            CellValue::Text(text) | CellValue::Status(text) => {
                cells.push((column.title.clone(), text));
            }
            CellValue::Empty => {}
        }
        for entry in column_links
            .links
            .iter()
            .filter(|entry| entry.service.id == service.id)
        {
            let url = url_resolver::resolve_link(
                service,
                entry.link,
                self.env,
                self.vars,
                self.link_mode,
            );
            cells.push((entry.link.name.clone(), url));
        }
        cells
    }

    fn service_label(&self, service: &ServiceDefinition) -> String {
        let star = if self.config.favorite_services.contains(&service.id) {
            "★ "
        } else {
            ""
        };
        format!("{}{}", star, service.name)
    }

    fn grid(&self) {
        for service in &self.view.services {
            let version = service
                .versions
                .get(self.env)
                .map(|v| format!(" v{}", v))
                .unwrap_or_default();
            let maintenance = if service.maintenance_mode == Some(true) {
                " [maintenance]".yellow()
            } else {
                "".normal()
            };
            println!(
                "\n  {} {}{}{}",
                self.service_label(service).bold(),
                format!("({})", service.id).dimmed(),
                version.dimmed(),
                maintenance
            );
            for (index, column_links) in self.view.columns.iter().enumerate() {
                let glyph = icons::glyph_for(column_links.column.icon.as_deref());
                for (label, target) in self.cells(service, index) {
                    println!("    {} {:<16} {}", glyph, label, target.underline());
                }
            }
        }
    }

    fn table(&self) {
        let mut header = format!("  {:<28}", "");
        for column_links in &self.view.columns {
            header.push_str(&format!(" {:<12}", truncate(&column_links.column.title, 12)));
        }
        println!("\n{}", header.bold());

        for service in &self.view.services {
            let mut row = format!("  {:<28}", truncate(&self.service_label(service), 28));
            for index in 0..self.view.columns.len() {
                let count = self.cells(service, index).len();
                let cell = match count {
                    0 => "·".to_string(),
                    1 => "●".to_string(),
                    n => format!("●×{}", n),
                };
                row.push_str(&format!(" {:<12}", cell));
            }
            println!("{}", row);
        }
    }

    fn list(&self) {
        for (index, column_links) in self.view.columns.iter().enumerate() {
            let glyph = icons::glyph_for(column_links.column.icon.as_deref());
            let entries: Vec<(String, String, String)> = self
                .view
                .services
                .iter()
                .flat_map(|service| {
                    self.cells(service, index)
                        .into_iter()
                        .map(move |(label, target)| (service.name.clone(), label, target))
                })
                .collect();
            if entries.is_empty() {
                continue;
            }
            println!(
                "\n  {} {} ({})",
                glyph,
                column_links.column.title.bold(),
                entries.len()
            );
            for (service, label, target) in entries {
                println!("    {:<24} {:<16} {}", service, label.dimmed(), target.underline());
            }
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
