//
// Copyright (c) The confd Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

mod config;
mod daemon;
mod schema;

use clap::{App, Arg};
use config::{Config, Logging, LoggingFmtStyle};
use daemon::SessionManager;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Layer;

fn init_tracing(config: &Logging) {
    let stdout = config.stdout.enabled.then(|| {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_ansi(config.stdout.colors);
        match config.stdout.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        }
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive("confd=debug".parse().unwrap())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout)
        .init();
}

fn main() {
    let matches = App::new("confd")
        .version(clap::crate_version!())
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("file")
                .help("Specify an alternative configuration file."),
        )
        .get_matches();

    let config_file = matches.value_of("config");
    let config = Config::load(config_file);

    init_tracing(&config.logging);

    // Set panic handler to abort the process if any child task panics.
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    let journal = confd_commit::Journal::open(&config.database_path)
        .expect("failed to open commit journal");
    let schema = schema::bootstrap();
    // The running tree lives only in memory (spec §1 Non-goals: on-disk
    // config file formats are out of scope); only the commit journal
    // persists across restarts.
    // Client connection handling is a transport concern out of scope here
    // (spec §1); a front-end hands accepted connections to
    // `_manager.spawn_session(uid)`.
    let _manager = SessionManager::new(schema, journal, false);

    info!("starting up");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create async runtime")
        .block_on(async {
            tokio::signal::ctrl_c().await.expect("failed to listen for shutdown signal");
            info!("shutting down");
        });
}
