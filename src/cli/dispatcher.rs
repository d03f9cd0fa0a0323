use anyhow::{Result, anyhow};
use tokio::runtime::Runtime;

use crate::{cli::handlers, core::settings::AppSettings, state::ConfigStore};

/// Everything a handler may touch: the store, the local settings and the runtime that
/// drives the persistence task (for the few handlers that await the config service).
#[derive(Debug)]
pub struct CliContext<'a> {
    pub store: &'a mut ConfigStore,
    pub settings: &'a AppSettings,
    pub runtime: &'a Runtime,
}

/// A command, its aliases and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &mut CliContext<'_>) -> Result<()>,
}

/// The single source of truth for all commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "announce",
        aliases: &[],
        handler: handlers::announce::handle,
    },
    CommandDefinition {
        name: "check",
        aliases: &[],
        handler: handlers::check::handle,
    },
    CommandDefinition {
        name: "column",
        aliases: &["col"],
        handler: handlers::column::handle,
    },
    CommandDefinition {
        name: "env",
        aliases: &[],
        handler: handlers::env::handle,
    },
    CommandDefinition {
        name: "export",
        aliases: &[],
        handler: handlers::export::handle,
    },
    CommandDefinition {
        name: "group",
        aliases: &[],
        handler: handlers::group::handle,
    },
    CommandDefinition {
        name: "import",
        aliases: &[],
        handler: handlers::import::handle,
    },
    CommandDefinition {
        name: "link",
        aliases: &[],
        handler: handlers::link::handle,
    },
    CommandDefinition {
        name: "matrix",
        aliases: &["ls"],
        handler: handlers::matrix::handle,
    },
    CommandDefinition {
        name: "open",
        aliases: &[],
        handler: handlers::open::handle,
    },
    CommandDefinition {
        name: "service",
        aliases: &["svc"],
        handler: handlers::service::handle,
    },
    CommandDefinition {
        name: "status",
        aliases: &[],
        handler: handlers::status::handle,
    },
    CommandDefinition {
        name: "title",
        aliases: &[],
        handler: handlers::title::handle,
    },
    CommandDefinition {
        name: "visibility",
        aliases: &["vis"],
        handler: handlers::visibility::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Routes `opsmatrix <command> [args...]`. With no command, the matrix is shown.
pub fn dispatch(all_args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    log::debug!("Dispatching args: {:?}", all_args);

    let mut args = all_args.into_iter();
    let Some(name) = args.next() else {
        return handlers::matrix::handle(Vec::new(), ctx);
    };

    let command =
        find_command(&name).ok_or_else(|| anyhow!(t!("error.unknown_command"), name = name))?;
    (command.handler)(args.collect(), ctx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve() {
        assert_eq!(find_command("svc").map(|c| c.name), Some("service"));
        assert_eq!(find_command("ls").map(|c| c.name), Some("matrix"));
        assert_eq!(find_command("vis").map(|c| c.name), Some("visibility"));
        assert!(find_command("deploy").is_none());
    }

    #[test]
    fn test_registry_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for cmd in COMMAND_REGISTRY {
            assert!(seen.insert(cmd.name), "duplicate command {}", cmd.name);
            for alias in cmd.aliases {
                assert!(seen.insert(*alias), "duplicate alias {}", alias);
            }
        }
    }
}
