// src/cli/mod.rs

use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// Markup tags used in the help template and the ANSI sequence each one opens.
const HELP_TAGS: &[(&str, &str)] = &[
    ("title", "\x1b[1;33m"),
    ("hl", "\x1b[1;36m"),
    ("cmd", "\x1b[36m"),
    ("group", "\x1b[1;32m"),
    ("err", "\x1b[91m"),
    ("dim", "\x1b[2m"),
];

/// Renders the catalog's help template, with colors only when the terminal takes them.
fn render_help(template: &str, use_colors: bool) -> String {
    HELP_TAGS
        .iter()
        .fold(template.to_string(), |text, (tag, style)| {
            let (open, close) = if use_colors { (*style, "\x1b[0m") } else { ("", "") };
            text.replace(&format!("<{}>", tag), open)
                .replace(&format!("</{}>", tag), close)
        })
}

fn help_template() -> &'static str {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();
    Box::leak(render_help(t!("cli.help.template"), use_colors).into_boxed_str())
}

/// opsmatrix: per-environment links to every service's dashboards, logs and consoles.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { help_template() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
#[command(trailing_var_arg = true)]
pub struct Cli {
    /// Work on an in-memory copy of the document; nothing is written back.
    #[arg(long)]
    pub dry_run: bool,

    /// The command and its arguments. Each handler parses its own flags.
    #[arg(allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_help_without_colors_strips_tags() {
        let text = render_help("<title>opsmatrix</title> <cmd>env</cmd> <COMMAND>", false);
        assert_eq!(text, "opsmatrix env <COMMAND>");
    }

    #[test]
    fn test_render_help_with_colors() {
        let text = render_help("<err>x</err>", true);
        assert_eq!(text, "\x1b[91mx\x1b[0m");
    }
}
