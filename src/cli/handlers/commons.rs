// src/cli/handlers/commons.rs

// Shared helpers for the handlers.

use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::cli::dispatcher::CliContext;

/// Asks for confirmation before a destructive change. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()?
    {
        println!("\n{}", t!("common.info.operation_cancelled"));
        return Ok(false);
    }
    Ok(true)
}

/// The environment a command works on: the explicit one (which must exist) or the
/// currently selected one.
pub fn resolve_env(ctx: &CliContext<'_>, explicit: Option<String>) -> Result<String> {
    match explicit {
        Some(env) => {
            if ctx.store.config().has_environment(&env) {
                Ok(env)
            } else {
                Err(anyhow!(t!("error.unknown_environment"), name = env))
            }
        }
        None => {
            let current = ctx.store.current_env();
            if current.is_empty() {
                Err(anyhow!(t!("error.no_environment")))
            } else {
                Ok(current.to_string())
            }
        }
    }
}

/// Flattens `["a,b", "c"]` into `["a", "b", "c"]`, dropping blanks.
pub fn split_list(values: Vec<String>) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn print_success(message: &str) {
    println!("\n{} {}", t!("common.success").green().bold(), message);
}

/// Prints a `label: value` line aligned like the other detail views.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<16} {}", format!("{}:", label).blue(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(vec!["api, web".into(), "".into(), "db".into()]),
            vec!["api".to_string(), "web".to_string(), "db".to_string()]
        );
        assert!(split_list(vec![]).is_empty());
    }
}
