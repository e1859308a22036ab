pub mod chart;
pub mod cli;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod render;
pub mod session;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub async fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        "starting taskdeck CLI"
    );

    let mut cfg = config::Config::load(cli.deckrc.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));
    if let Some(url) = cli.url {
        cfg.apply_overrides([("gateway.url".to_string(), url)]);
    }

    let mut renderer = render::Renderer::new(&cfg)?;
    let gateway = gateway::HttpGateway::from_config(&cfg)
        .context("failed to configure the task gateway")?;

    let command = cli
        .command
        .unwrap_or_else(|| commands::default_command(&cfg));
    debug!(command = ?command, "resolved command");

    commands::dispatch(gateway, &cfg, &mut renderer, command).await?;

    info!("done");
    Ok(())
}
