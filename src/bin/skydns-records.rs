//! SkyDNS Records CLI Binary
//!
//! Command-line interface for managing SkyDNS records stored in etcd.

use anyhow::Context;
use clap::Parser;
use skydns_records::config::ConfigLoader;
use skydns_records::logging::init_logging;
use skydns_records::tooling::cli::{render_path, Cli, CliContext, Commands};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    init_logging(Some(&config.logging)).context("Failed to initialize logging")?;

    // `path` is pure; no endpoint needed.
    if let Commands::Path { name } = &cli.command {
        return Ok(render_path(name, &config.prefix())?);
    }

    let context = CliContext::connect(&config).context("Failed to open etcd client")?;
    Ok(context.execute(&cli.command).await?)
}
