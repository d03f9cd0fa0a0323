// src/cli/handlers/announce.rs

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::{
    cli::{dispatcher::CliContext, handlers::commons},
    models::{Announcement, AnnouncementLevel},
};

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Sets or clears the banner shown above the matrix."
)]
struct AnnounceArgs {
    /// The message. Required unless `--clear` is given.
    message: Option<String>,
    /// info, warning or critical.
    #[arg(long, short, default_value = "info")]
    level: AnnouncementLevel,
    /// A link shown next to the message.
    #[arg(long)]
    link: Option<String>,
    /// Removes the current announcement.
    #[arg(long, conflicts_with_all = ["message", "link"])]
    clear: bool,
}

pub fn handle(args: Vec<String>, ctx: &mut CliContext<'_>) -> Result<()> {
    let announce_args = AnnounceArgs::try_parse_from(&args)?;

    if announce_args.clear {
        ctx.store.set_announcement(None)?;
        commons::print_success(t!("announce.success.cleared"));
        return Ok(());
    }

    let message = announce_args
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| anyhow!(t!("announce.error.message_required")))?;
    ctx.store.set_announcement(Some(Announcement {
        message,
        level: announce_args.level,
        link: announce_args.link,
    }))?;
    commons::print_success(t!("announce.success.set"));
    Ok(())
}
