// src/bin/opsmatrix.rs

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;

use opsmatrix::{
    cli::{
        Cli,
        dispatcher::{self, CliContext},
    },
    core::{paths, session_cache, settings::AppSettings},
    state::ConfigStore,
    system::memory_service::MemoryConfigService,
    t,
};

/// Sets up logging, runs one command and reports any error.
fn main() {
    env_logger::init();

    if let Err(e) = run(Cli::parse()) {
        // Help and usage errors from a handler's own parser keep clap's formatting.
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            clap_err.exit();
        }
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// The composition root: settings, backend, store, session, dispatch, then flush.
fn run(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let settings = AppSettings::load().context(t!("main.error.settings"))?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context(t!("main.error.runtime"))?;

    let mut service = settings.open_service()?;
    let backend = service.describe();
    if cli.dry_run {
        let seed = runtime
            .block_on(service.fetch_config())
            .with_context(|| format!(t!("main.error.load_failed"), backend = backend))?;
        println!("{}", t!("main.info.dry_run").dimmed());
        service = Arc::new(MemoryConfigService::with_config(seed));
    }

    // The persistence task is spawned on the runtime, so the store is built inside it.
    let mut store =
        runtime.block_on(async { ConfigStore::new(service, settings.store_options()) });
    runtime
        .block_on(store.load())
        .with_context(|| format!(t!("main.error.load_failed"), backend = backend))?;

    let session_path = paths::session_cache_path()?;
    store.restore_session(session_cache::load_session(&session_path));

    let outcome = {
        let mut ctx = CliContext {
            store: &mut store,
            settings: &settings,
            runtime: &runtime,
        };
        dispatcher::dispatch(cli.args, &mut ctx)
    };

    runtime.block_on(store.flush());
    if let Some(error) = store.persist_status().last_error {
        eprintln!(
            "\n{}",
            format!(t!("main.warning.save_failed"), error = error).yellow()
        );
    }
    if !cli.dry_run {
        if let Err(e) = session_cache::write_session(&session_path, &store.session()) {
            log::warn!("Could not write session cache: {}", e);
        }
    }

    outcome
}
