// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::let_and_return,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools
)]

use std::path::PathBuf;

use anyhow::{Context, Result};

mod internal;
mod settings;

// Subcommands
mod device_group;
mod scheduled_job;

async fn try_main(options: Options) -> Result<()> {
    let settings = settings::Settings::load(options.config.as_deref())?;
    let mut stdout = std::io::stdout().lock();

    match options.command {
        Command::DeviceGroup(cfg) => device_group::run(cfg, &settings, &mut stdout).await?,
        Command::ScheduledJob(cfg) => scheduled_job::run(cfg, &settings, &mut stdout).await?,
    }

    Ok(())
}

fn main() {
    let options: Options = clap::Parser::parse();

    let log_level = if options.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let _ = logger::try_init(log_level);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("could not start async runtime")
        .and_then(|runtime| runtime.block_on(try_main(options)));

    if let Err(err) = result {
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

#[derive(clap::Parser)]
#[command(name = "iotcctl", version, about = "Manage Azure IoT Central applications")]
struct Options {
    /// Settings file. Defaults to $IOTCCTL_CONFIG, then ~/.config/iotcctl/config.toml.
    /// Files in "<settings file>.d/*.toml" are merged over it.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log requests and responses.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Work with the device groups of an application.
    #[command(subcommand)]
    DeviceGroup(device_group::Options),

    /// Work with the scheduled jobs of an application.
    #[command(subcommand)]
    ScheduledJob(scheduled_job::Options),
}
