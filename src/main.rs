#[macro_use]
extern crate fomat_macros;

#[macro_use]
extern crate log;

mod cli;

use anyhow::Context;
use app_upgrade::{config::Config, logging::setup_logging};
use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use std::process::exit;

use crate::cli::colors::{color_error, color_error_desc};

pub fn main() {
    let clap = Command::new("app-upgrade")
        .about("Application Upgrade Orchestrator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .help("increase logging verbosity; may be given twice")
                .short('v')
                .long("verbose")
                .multiple_occurrences(true)
                .global(true),
        )
        .subcommand(
            Command::new("replay")
                .about("replay a scenario script of backend events and user actions")
                .arg(
                    Arg::new("FILE")
                        .help("script to replay, one JSON object per line; reads stdin if omitted"),
                )
                .arg(
                    Arg::new("blocked")
                        .help("start with the connection blocked by the firewall")
                        .long("blocked"),
                )
                .arg(
                    Arg::new("manual-install")
                        .help("start with a manual install required")
                        .long("manual-install"),
                )
                .arg(
                    Arg::new("never-auto-launch")
                        .help("verified installers wait for the user to start them")
                        .long("never-auto-launch"),
                ),
        )
        .subcommand(
            Command::new("explain")
                .about("describe upgrade errors, and how each one may be retried")
                .arg(
                    Arg::new("ERROR")
                        .help("error name or code; describes every error if omitted"),
                ),
        );

    if let Err(why) = main_(&clap.get_matches()) {
        eprintln!("{}: {}", color_error("error"), color_error_desc(format!("{:#}", why)));
        exit(1);
    }
}

fn main_(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let level = match matches.occurrences_of("verbose") {
        0 => config.log_level,
        1 => config.log_level.max(LevelFilter::Debug),
        _ => LevelFilter::Trace,
    };

    setup_logging(level).context("failed to initialize logging")?;
    debug!("loaded configuration: {:?}", config);

    match matches.subcommand() {
        Some(("replay", matches)) => cli::replay(config, matches),
        Some(("explain", matches)) => cli::explain(matches),
        _ => unreachable!("clap argument parsing failed"),
    }
}
